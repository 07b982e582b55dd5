//! Abstract Syntax Tree for Ahoy
//!
//! The tree is immutable after parsing: the analyzer and the code
//! generator annotate via side tables, never the nodes. Every node
//! carries the 1-based source line of the token that introduced it.

use crate::types::AhoyType;

/// A whole parsed program: the ordered top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            statements: Vec::new(),
        }
    }

    /// Find a top-level function definition by name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionDef> {
        self.statements.iter().find_map(|s| match s {
            Stmt::Function(f) if f.name == name => Some(f),
            _ => None,
        })
    }

    /// All top-level function definitions in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.statements.iter().filter_map(|s| match s {
            Stmt::Function(f) => Some(f),
            _ => None,
        })
    }
}

/// A function parameter. An untyped parameter is `generic` (pointer-wide
/// integer at the C level).
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<AhoyType>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    /// Declared return types. Empty means void; a single `Infer` means
    /// the analyzer infers from the first `return` statement.
    pub returns: Vec<AhoyType>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// A struct field with its mapped type and optional default value.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: AhoyType,
    pub default: Option<Expr>,
}

/// A struct declaration. Nested `type` blocks declare variants that
/// inherit the parent's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
    pub variants: Vec<StructDef>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Expr>,
    /// `mut` members of value-backed enums drop `const` in the output
    pub mutable: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    /// Declared backing type (`int|string|float|color|vector2|array|dict`),
    /// or `None` when it must be derived from the member values.
    pub backing: Option<AhoyType>,
    pub members: Vec<EnumMember>,
    pub line: usize,
}

/// One case label of a `switch` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Value(Expr),
    /// Inclusive range `a..b`
    Range(Expr, Expr),
    /// The `_` default case
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub scrutinee: Expr,
    pub cases: Vec<SwitchCase>,
    pub line: usize,
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// Plain name; declaration vs mutation is decided by the generator
    Name(String),
    /// `d{"k"}` - hash map put
    DictKey { name: String, key: Expr },
    /// `obj<'field'>` - dict put or struct field store by receiver type
    ObjectField { object: Expr, field: String },
    /// `a[i]` - array element store
    Index { name: String, index: Expr },
    /// `^p` - store through a pointer
    Deref(String),
    /// `p.x` - struct member store
    Member { object: Expr, field: String },
}

/// Right-hand side of an assignment: an expression, or a switch used as
/// an expression (the generator declares the target first, then assigns
/// it from every case).
#[derive(Debug, Clone, PartialEq)]
pub enum AssignValue {
    Expr(Expr),
    Switch(Box<SwitchStmt>),
}

/// The six loop forms, disambiguated at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopStmt {
    /// `loop`
    Infinite { body: Vec<Stmt>, line: usize },
    /// `loop i` / `loop i from X` - count up forever unless broken
    Count {
        var: String,
        from: Option<Expr>,
        body: Vec<Stmt>,
        line: usize,
    },
    /// `loop till C` / `loop i till C` / `loop i from X till C`
    Till {
        var: Option<String>,
        from: Option<Expr>,
        cond: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    /// `loop i from X to Y` - half-open integer range
    Range {
        var: String,
        from: Expr,
        to: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    /// `loop elem in expr` - array or string iteration
    InArray {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    /// `loop k,v in expr` - hash map iteration
    InDict {
        key: String,
        value: String,
        iterable: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
}

impl LoopStmt {
    pub fn body(&self) -> &[Stmt] {
        match self {
            LoopStmt::Infinite { body, .. }
            | LoopStmt::Count { body, .. }
            | LoopStmt::Till { body, .. }
            | LoopStmt::Range { body, .. }
            | LoopStmt::InArray { body, .. }
            | LoopStmt::InDict { body, .. } => body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfArm {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Function(FunctionDef),
    Assignment {
        target: AssignTarget,
        /// Explicit `name: type: expr` annotation, if any
        declared: Option<AhoyType>,
        value: AssignValue,
        line: usize,
    },
    /// `a, b: x, y` or `a, b: call||` - multi-name binding
    TupleAssignment {
        names: Vec<String>,
        values: Vec<Expr>,
        line: usize,
    },
    /// `NAME :: expr` - redeclaration is a hard error
    ConstDecl {
        name: String,
        value: Expr,
        line: usize,
    },
    Struct(StructDef),
    Enum(EnumDef),
    Import {
        path: String,
        namespace: Option<String>,
        line: usize,
    },
    If {
        arms: Vec<IfArm>,
        else_body: Option<Vec<Stmt>>,
        line: usize,
    },
    /// Single-branch conditional
    When {
        cond: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    Switch(SwitchStmt),
    Loop(LoopStmt),
    Return {
        values: Vec<Expr>,
        line: usize,
    },
    Assert {
        cond: Expr,
        line: usize,
    },
    /// Execution postponed to every exit point of the enclosing function
    Defer {
        stmt: Box<Stmt>,
        line: usize,
    },
    /// Break out of the innermost loop
    Halt { line: usize },
    /// Continue with the next iteration
    Next { line: usize },
    Expr {
        expr: Expr,
        line: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// The C spelling of this operator.
    pub fn c_op(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    /// `^p` - pointer dereference
    Deref,
    /// `&x` - address-of
    AddrOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer or float literal; a `.` in the lexeme makes it float
    Number { text: String, line: usize },
    Str { text: String, line: usize },
    /// String with `{name}` placeholders
    FString { text: String, line: usize },
    CharLit { text: String, line: usize },
    Bool { value: bool, line: usize },
    Ident { name: String, line: usize },
    /// `?` in expression position: the innermost loop counter
    LoopCounter { line: usize },
    /// `<a, b, c>` or `[a, b, c]`
    Array { elems: Vec<Expr>, line: usize },
    /// `{k: v, ...}` - keys are bare identifiers or string literals
    Dict {
        entries: Vec<(String, Expr)>,
        line: usize,
    },
    /// `Name{field: v, ...}`
    ObjectLit {
        type_name: String,
        fields: Vec<(String, Expr)>,
        line: usize,
    },
    /// `name|args|`
    Call {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
    /// `recv.name|args|`
    MethodCall {
        recv: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        line: usize,
    },
    /// `recv.field`
    Member {
        recv: Box<Expr>,
        field: String,
        line: usize,
    },
    /// `recv<'field'>`
    ObjectField {
        recv: Box<Expr>,
        field: String,
        line: usize,
    },
    /// `recv[index]`
    Index {
        recv: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },
    /// `recv{"key"}`
    DictKey {
        recv: Box<Expr>,
        key: Box<Expr>,
        line: usize,
    },
    /// `recv.type`
    TypeProbe { recv: Box<Expr>, line: usize },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        line: usize,
    },
    Ternary {
        cond: Box<Expr>,
        then_val: Box<Expr>,
        else_val: Box<Expr>,
        line: usize,
    },
    /// `x: expr` or `(a, b): expr` in argument position
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
        line: usize,
    },
    /// `name: value` inside a call's argument list; the generator
    /// reorders these against the callee's parameter list
    NamedArg {
        name: String,
        value: Box<Expr>,
        line: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Number { line, .. }
            | Expr::Str { line, .. }
            | Expr::FString { line, .. }
            | Expr::CharLit { line, .. }
            | Expr::Bool { line, .. }
            | Expr::Ident { line, .. }
            | Expr::LoopCounter { line }
            | Expr::Array { line, .. }
            | Expr::Dict { line, .. }
            | Expr::ObjectLit { line, .. }
            | Expr::Call { line, .. }
            | Expr::MethodCall { line, .. }
            | Expr::Member { line, .. }
            | Expr::ObjectField { line, .. }
            | Expr::Index { line, .. }
            | Expr::DictKey { line, .. }
            | Expr::TypeProbe { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Ternary { line, .. }
            | Expr::Lambda { line, .. }
            | Expr::NamedArg { line, .. } => *line,
        }
    }

    /// True for a number literal whose lexeme contains a `.`.
    pub fn is_float_literal(&self) -> bool {
        matches!(self, Expr::Number { text, .. } if text.contains('.'))
    }
}
