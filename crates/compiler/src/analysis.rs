//! Pre-codegen analysis passes
//!
//! Three ordered scans over the AST run before any output is written:
//!
//! 1. **Function discovery** - every user function name and signature,
//!    with `main` marked so it can be emitted as `ahoy_main` behind a
//!    thin C `main` wrapper.
//! 2. **Return-type inference** - functions declared `infer` (or with
//!    no annotation) take their return tuple from the first `return`
//!    statement in the body; a nested scan of prior local assignments
//!    feeds identifier lookups.
//! 3. **Helper discovery** - every method call is classified by its
//!    receiver type so the generator emits only the runtime helper
//!    families a program actually uses.
//!
//! The passes annotate side tables, never the tree.

use crate::ast::{AssignTarget, AssignValue, Expr, FunctionDef, LoopStmt, Program, Stmt};
use crate::types::AhoyType;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Method names that always route to the hash map helpers, regardless
/// of what the receiver type looks like.
pub const DICT_ONLY_METHODS: &[&str] = &[
    "size",
    "clear",
    "has_all",
    "keys",
    "values",
    "merge",
    "stable_sort",
];

/// Method names that always route to the string helpers.
pub const STRING_ONLY_METHODS: &[&str] = &[
    "upper",
    "lower",
    "replace",
    "contains",
    "strip",
    "count",
    "split",
    "snake_case",
    "camel_case",
    "pascal_case",
    "kebab_case",
    "title_case",
    "lpad",
    "rpad",
    "pad",
    "match",
    "get_file",
];

/// Ambiguous method names resolved by the receiver's inferred type.
pub const SHARED_METHODS: &[&str] = &["length", "sort", "has", "reverse"];

/// Everything the generator needs to know before emitting a line of C.
#[derive(Debug, Default)]
pub struct ProgramInfo {
    /// User-defined function names; never renamed to PascalCase at call
    /// sites
    pub user_functions: HashSet<String>,
    pub has_main: bool,
    /// Declared or inferred return tuple per function (empty = void)
    pub function_return_types: HashMap<String, Vec<AhoyType>>,
    pub function_param_names: HashMap<String, Vec<String>>,
    pub function_param_types: HashMap<String, Vec<AhoyType>>,
    pub function_param_defaults: HashMap<String, Vec<Option<Expr>>>,
    /// Runtime helper families observed in use
    pub array_methods: BTreeSet<String>,
    pub dict_methods: BTreeSet<String>,
    pub string_methods: BTreeSet<String>,
    /// `read_json` / `write_json` seen anywhere
    pub use_json: bool,
    /// Any array literal, typed-array annotation, or array method seen
    pub use_arrays: bool,
}

/// Read-only view of the symbol tables used by expression type
/// inference. The generator constructs one from its own context; the
/// analyzer builds temporary ones during its scans.
pub struct TypeView<'a> {
    pub globals: &'a HashMap<String, AhoyType>,
    pub locals: Option<&'a HashMap<String, AhoyType>>,
    pub array_elem_types: &'a HashMap<String, AhoyType>,
    pub structs: &'a HashMap<String, Vec<(String, AhoyType)>>,
    pub function_returns: &'a HashMap<String, Vec<AhoyType>>,
    /// `Enum.member` -> member type
    pub enum_member_types: &'a HashMap<String, AhoyType>,
}

impl<'a> TypeView<'a> {
    fn lookup(&self, name: &str) -> Option<&AhoyType> {
        self.locals
            .and_then(|l| l.get(name))
            .or_else(|| self.globals.get(name))
    }
}

/// Canonical expression type inference (spec rules):
/// numbers split on `.`, untyped array literals stay element-mixed,
/// dict indexing is `float` because the accessor returns a double.
pub fn infer_expr_type(expr: &Expr, view: &TypeView) -> AhoyType {
    match expr {
        Expr::Number { text, .. } => {
            if text.contains('.') {
                AhoyType::Float
            } else {
                AhoyType::Int
            }
        }
        Expr::Str { .. } | Expr::FString { .. } => AhoyType::Str,
        Expr::Bool { .. } => AhoyType::Bool,
        Expr::CharLit { .. } => AhoyType::Char,
        Expr::Array { .. } => AhoyType::Array(None),
        Expr::Dict { .. } => AhoyType::Dict(None),
        Expr::ObjectLit { type_name, .. } => AhoyType::Named(type_name.clone()),
        Expr::Ident { name, .. } => view.lookup(name).cloned().unwrap_or(AhoyType::Int),
        Expr::LoopCounter { .. } => AhoyType::Int,
        Expr::Index { recv, .. } => {
            if let Expr::Ident { name, .. } = recv.as_ref() {
                if let Some(elem) = view.array_elem_types.get(name) {
                    return elem.clone();
                }
                if let Some(AhoyType::Str) = view.lookup(name) {
                    return AhoyType::Char;
                }
            }
            AhoyType::Int
        }
        // The hash map accessor returns a double-width value; casts are
        // applied on demand at use sites
        Expr::DictKey { .. } | Expr::ObjectField { .. } => AhoyType::Float,
        Expr::Member { recv, field, .. } => {
            let recv_ty = infer_expr_type(recv, view);
            if let AhoyType::Named(struct_name) = &recv_ty {
                if let Some(fields) = view.structs.get(struct_name) {
                    if let Some((_, fty)) = fields.iter().find(|(fname, _)| fname == field) {
                        return fty.clone();
                    }
                }
            }
            if let Expr::Ident { name, .. } = recv.as_ref() {
                // `Enum.member` type recorded by the enum declaration
                let key = format!("{}.{}", name, field);
                if let Some(ty) = view.enum_member_types.get(&key) {
                    return ty.clone();
                }
            }
            // A member read that is really a zero-argument method
            if is_known_method(field) {
                return method_return_type(&recv_ty, field);
            }
            AhoyType::Int
        }
        Expr::TypeProbe { .. } => AhoyType::Str,
        Expr::MethodCall { recv, method, .. } => {
            let recv_ty = infer_expr_type(recv, view);
            method_return_type(&recv_ty, method)
        }
        Expr::Call { name, .. } => match name.as_str() {
            "int" => AhoyType::Int,
            "float" => AhoyType::Float,
            "char" => AhoyType::Char,
            "string" | "sprintf" => AhoyType::Str,
            "read_json" => AhoyType::Json,
            _ => view
                .function_returns
                .get(name)
                .and_then(|rets| rets.first())
                .cloned()
                .unwrap_or(AhoyType::Int),
        },
        Expr::Binary { op, lhs, rhs, .. } => {
            use crate::ast::BinOp::*;
            match op {
                Eq | Ne | Lt | Gt | Le | Ge | And | Or => AhoyType::Bool,
                Add | Sub | Mul | Div | Mod => {
                    let lt = infer_expr_type(lhs, view);
                    let rt = infer_expr_type(rhs, view);
                    if lt == AhoyType::Str || rt == AhoyType::Str {
                        AhoyType::Str
                    } else if lt == AhoyType::Float || rt == AhoyType::Float {
                        AhoyType::Float
                    } else {
                        AhoyType::Int
                    }
                }
            }
        }
        Expr::Unary { op, operand, .. } => match op {
            crate::ast::UnOp::Not => AhoyType::Bool,
            crate::ast::UnOp::Neg => infer_expr_type(operand, view),
            crate::ast::UnOp::Deref => infer_expr_type(operand, view),
            crate::ast::UnOp::AddrOf => AhoyType::Generic,
        },
        Expr::Ternary { then_val, .. } => infer_expr_type(then_val, view),
        Expr::Lambda { .. } => AhoyType::Generic,
        Expr::NamedArg { value, .. } => infer_expr_type(value, view),
    }
}

/// True when the name appears in any of the closed method tables.
pub fn is_known_method(name: &str) -> bool {
    DICT_ONLY_METHODS.contains(&name)
        || STRING_ONLY_METHODS.contains(&name)
        || SHARED_METHODS.contains(&name)
        || matches!(
            name,
            "push"
                | "pop"
                | "shift"
                | "insert"
                | "remove"
                | "index_of"
                | "sum"
                | "min"
                | "max"
                | "avg"
                | "first"
                | "last"
                | "join"
                | "map"
                | "filter"
        )
}

/// Result type of a routed method call.
pub fn method_return_type(recv: &AhoyType, method: &str) -> AhoyType {
    if STRING_ONLY_METHODS.contains(&method) || (recv.is_string() && SHARED_METHODS.contains(&method))
    {
        return match method {
            "contains" | "match" | "has" => AhoyType::Bool,
            "count" | "length" => AhoyType::Int,
            "split" => AhoyType::Array(Some(Box::new(AhoyType::Str))),
            _ => AhoyType::Str,
        };
    }
    if DICT_ONLY_METHODS.contains(&method) || recv.is_dict() {
        return match method {
            "size" | "length" => AhoyType::Int,
            "has" | "has_all" => AhoyType::Bool,
            "keys" | "values" => AhoyType::Array(None),
            _ => AhoyType::Void,
        };
    }
    match method {
        "length" | "index_of" | "pop" | "shift" => AhoyType::Int,
        "sum" | "min" | "max" | "first" | "last" => recv
            .element_type()
            .cloned()
            .unwrap_or(AhoyType::Int),
        "avg" => AhoyType::Float,
        "has" => AhoyType::Bool,
        "join" => AhoyType::Str,
        "map" | "filter" => AhoyType::Array(None),
        _ => AhoyType::Void,
    }
}

/// Run all three scans.
pub fn analyze(program: &Program) -> ProgramInfo {
    let mut info = ProgramInfo::default();
    discover_functions(program, &mut info);
    infer_return_types(program, &mut info);
    discover_helpers(program, &mut info);
    info
}

// ---- pass 1: function discovery -----------------------------------------

fn discover_functions(program: &Program, info: &mut ProgramInfo) {
    for func in program.functions() {
        info.user_functions.insert(func.name.clone());
        if func.name == "main" {
            info.has_main = true;
        }
        info.function_param_names.insert(
            func.name.clone(),
            func.params.iter().map(|p| p.name.clone()).collect(),
        );
        info.function_param_types.insert(
            func.name.clone(),
            func.params
                .iter()
                .map(|p| p.ty.clone().unwrap_or(AhoyType::Generic))
                .collect(),
        );
        info.function_param_defaults.insert(
            func.name.clone(),
            func.params.iter().map(|p| p.default.clone()).collect(),
        );
        if !func.returns.is_empty() && func.returns != [AhoyType::Infer] {
            info.function_return_types
                .insert(func.name.clone(), func.returns.clone());
        }
    }
}

// ---- pass 2: return-type inference --------------------------------------

fn infer_return_types(program: &Program, info: &mut ProgramInfo) {
    for func in program.functions() {
        if info.function_return_types.contains_key(&func.name) {
            continue;
        }
        // Record parameter and local assignment types so a returned
        // identifier can be resolved
        let mut locals: HashMap<String, AhoyType> = HashMap::new();
        for param in &func.params {
            locals.insert(
                param.name.clone(),
                param.ty.clone().unwrap_or(AhoyType::Generic),
            );
        }
        let inferred = first_return_types(&func.body, &mut locals, info);
        info.function_return_types
            .insert(func.name.clone(), inferred.unwrap_or_default());
    }
}

/// Depth-first walk to the first `return`; assignment types seen on the
/// way populate `locals`.
fn first_return_types(
    body: &[Stmt],
    locals: &mut HashMap<String, AhoyType>,
    info: &ProgramInfo,
) -> Option<Vec<AhoyType>> {
    let empty_globals = HashMap::new();
    let empty_elems = HashMap::new();
    let empty_structs = HashMap::new();
    let empty_enums = HashMap::new();

    for stmt in body {
        match stmt {
            Stmt::Assignment {
                target: AssignTarget::Name(name),
                declared,
                value: AssignValue::Expr(expr),
                ..
            } => {
                let ty = declared.clone().unwrap_or_else(|| {
                    let view = TypeView {
                        globals: &empty_globals,
                        locals: Some(locals),
                        array_elem_types: &empty_elems,
                        structs: &empty_structs,
                        function_returns: &info.function_return_types,
                        enum_member_types: &empty_enums,
                    };
                    infer_expr_type(expr, &view)
                });
                locals.insert(name.clone(), ty);
            }
            Stmt::Return { values, .. } => {
                if values.is_empty() {
                    return Some(Vec::new());
                }
                let view = TypeView {
                    globals: &empty_globals,
                    locals: Some(locals),
                    array_elem_types: &empty_elems,
                    structs: &empty_structs,
                    function_returns: &info.function_return_types,
                    enum_member_types: &empty_enums,
                };
                return Some(values.iter().map(|v| infer_expr_type(v, &view)).collect());
            }
            Stmt::If {
                arms, else_body, ..
            } => {
                for arm in arms {
                    if let Some(found) = first_return_types(&arm.body, locals, info) {
                        return Some(found);
                    }
                }
                if let Some(else_body) = else_body {
                    if let Some(found) = first_return_types(else_body, locals, info) {
                        return Some(found);
                    }
                }
            }
            Stmt::When { body, .. } => {
                if let Some(found) = first_return_types(body, locals, info) {
                    return Some(found);
                }
            }
            Stmt::Switch(sw) => {
                for case in &sw.cases {
                    if let Some(found) = first_return_types(&case.body, locals, info) {
                        return Some(found);
                    }
                }
            }
            Stmt::Loop(l) => {
                if let Some(found) = first_return_types(l.body(), locals, info) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

// ---- pass 3: helper discovery --------------------------------------------

struct HelperScan<'a> {
    info: &'a mut ProgramInfo,
    globals: HashMap<String, AhoyType>,
    locals: Option<HashMap<String, AhoyType>>,
    array_elems: HashMap<String, AhoyType>,
    empty_structs: HashMap<String, Vec<(String, AhoyType)>>,
    empty_enums: HashMap<String, AhoyType>,
}

fn discover_helpers(program: &Program, info: &mut ProgramInfo) {
    let mut scan = HelperScan {
        info,
        globals: HashMap::new(),
        locals: None,
        array_elems: HashMap::new(),
        empty_structs: HashMap::new(),
        empty_enums: HashMap::new(),
    };
    scan.walk_body(&program.statements);
}

impl<'a> HelperScan<'a> {
    fn view(&self) -> TypeView<'_> {
        TypeView {
            globals: &self.globals,
            locals: self.locals.as_ref(),
            array_elem_types: &self.array_elems,
            structs: &self.empty_structs,
            function_returns: &self.info.function_return_types,
            enum_member_types: &self.empty_enums,
        }
    }

    fn record_var(&mut self, name: &str, ty: AhoyType) {
        if let AhoyType::Array(Some(elem)) = &ty {
            self.array_elems.insert(name.to_string(), (**elem).clone());
        }
        match &mut self.locals {
            Some(locals) => {
                locals.insert(name.to_string(), ty);
            }
            None => {
                self.globals.insert(name.to_string(), ty);
            }
        }
    }

    fn walk_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(f) => self.walk_function(f),
            Stmt::Assignment {
                target,
                declared,
                value,
                ..
            } => {
                if let AssignValue::Expr(expr) = value {
                    self.walk_expr(expr);
                    if let AssignTarget::Name(name) = target {
                        let ty = declared
                            .clone()
                            .unwrap_or_else(|| infer_expr_type(expr, &self.view()));
                        if matches!(expr, Expr::Array { .. }) || ty.is_array() {
                            self.info.use_arrays = true;
                        }
                        self.record_var(name, ty);
                    }
                }
                if let AssignValue::Switch(sw) = value {
                    self.walk_expr(&sw.scrutinee);
                    for case in &sw.cases {
                        self.walk_body(&case.body);
                    }
                }
            }
            Stmt::TupleAssignment { names, values, .. } => {
                for v in values {
                    self.walk_expr(v);
                }
                if values.len() == 1 {
                    if let Expr::Call { name: fname, .. } = &values[0] {
                        let rets = self
                            .info
                            .function_return_types
                            .get(fname)
                            .cloned()
                            .unwrap_or_default();
                        for (name, ty) in names.iter().zip(rets) {
                            self.record_var(name, ty);
                        }
                    }
                } else {
                    let types: Vec<AhoyType> = values
                        .iter()
                        .map(|v| infer_expr_type(v, &self.view()))
                        .collect();
                    for (name, ty) in names.iter().zip(types) {
                        self.record_var(name, ty);
                    }
                }
            }
            Stmt::ConstDecl { name, value, .. } => {
                self.walk_expr(value);
                let ty = infer_expr_type(value, &self.view());
                self.record_var(name, ty);
            }
            Stmt::If {
                arms, else_body, ..
            } => {
                for arm in arms {
                    self.walk_expr(&arm.cond);
                    self.walk_body(&arm.body);
                }
                if let Some(else_body) = else_body {
                    self.walk_body(else_body);
                }
            }
            Stmt::When { cond, body, .. } => {
                self.walk_expr(cond);
                self.walk_body(body);
            }
            Stmt::Switch(sw) => {
                self.walk_expr(&sw.scrutinee);
                for case in &sw.cases {
                    self.walk_body(&case.body);
                }
            }
            Stmt::Loop(l) => self.walk_loop(l),
            Stmt::Return { values, .. } => {
                for v in values {
                    self.walk_expr(v);
                }
            }
            Stmt::Assert { cond, .. } => self.walk_expr(cond),
            Stmt::Defer { stmt, .. } => self.walk_stmt(stmt),
            Stmt::Expr { expr, .. } => self.walk_expr(expr),
            Stmt::Struct(_) | Stmt::Enum(_) | Stmt::Import { .. } => {}
            Stmt::Halt { .. } | Stmt::Next { .. } => {}
        }
    }

    fn walk_function(&mut self, f: &FunctionDef) {
        let saved = self.locals.take();
        let mut locals = HashMap::new();
        for p in &f.params {
            let ty = p.ty.clone().unwrap_or(AhoyType::Generic);
            if let AhoyType::Array(Some(elem)) = &ty {
                self.array_elems.insert(p.name.clone(), (**elem).clone());
            }
            locals.insert(p.name.clone(), ty);
        }
        self.locals = Some(locals);
        self.walk_body(&f.body);
        self.locals = saved;
    }

    fn walk_loop(&mut self, l: &LoopStmt) {
        match l {
            LoopStmt::Infinite { body, .. } => self.walk_body(body),
            LoopStmt::Count {
                var, from, body, ..
            } => {
                if let Some(from) = from {
                    self.walk_expr(from);
                }
                self.record_var(var, AhoyType::Int);
                self.walk_body(body);
            }
            LoopStmt::Till {
                var,
                from,
                cond,
                body,
                ..
            } => {
                if let Some(var) = var {
                    self.record_var(var, AhoyType::Int);
                }
                if let Some(from) = from {
                    self.walk_expr(from);
                }
                self.walk_expr(cond);
                self.walk_body(body);
            }
            LoopStmt::Range {
                var,
                from,
                to,
                body,
                ..
            } => {
                self.walk_expr(from);
                self.walk_expr(to);
                self.record_var(var, AhoyType::Int);
                self.walk_body(body);
            }
            LoopStmt::InArray {
                var,
                iterable,
                body,
                ..
            } => {
                self.walk_expr(iterable);
                let iter_ty = infer_expr_type(iterable, &self.view());
                let elem_ty = if iter_ty.is_string() {
                    AhoyType::Char
                } else {
                    self.info.use_arrays = true;
                    match &iterable {
                        Expr::Ident { name, .. } => self
                            .array_elems
                            .get(name.as_str())
                            .cloned()
                            .unwrap_or(AhoyType::Int),
                        _ => AhoyType::Int,
                    }
                };
                self.record_var(var, elem_ty);
                self.walk_body(body);
            }
            LoopStmt::InDict {
                key,
                value,
                iterable,
                body,
                ..
            } => {
                self.walk_expr(iterable);
                self.record_var(key, AhoyType::Str);
                self.record_var(value, AhoyType::Float);
                self.walk_body(body);
            }
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::MethodCall {
                recv, method, args, ..
            } => {
                self.walk_expr(recv);
                for a in args {
                    self.walk_expr(a);
                }
                // Unknown names are external (namespaced) calls, not
                // runtime helpers
                if is_known_method(method) {
                    let recv_ty = infer_expr_type(recv, &self.view());
                    self.route_method(&recv_ty, method);
                }
            }
            Expr::Member { recv, field, .. } => {
                self.walk_expr(recv);
                if is_known_method(field) {
                    let recv_ty = infer_expr_type(recv, &self.view());
                    self.route_method(&recv_ty, field);
                }
            }
            Expr::Call { name, args, .. } => {
                if name == "read_json" || name == "write_json" {
                    self.info.use_json = true;
                }
                for a in args {
                    self.walk_expr(a);
                }
            }
            Expr::Array { elems, .. } => {
                self.info.use_arrays = true;
                for e in elems {
                    self.walk_expr(e);
                }
            }
            Expr::Dict { entries, .. } => {
                for (_, v) in entries {
                    self.walk_expr(v);
                }
            }
            Expr::ObjectLit { fields, .. } => {
                for (_, v) in fields {
                    self.walk_expr(v);
                }
            }
            Expr::Index { recv, index, .. } => {
                self.walk_expr(recv);
                self.walk_expr(index);
            }
            Expr::DictKey { recv, key, .. } => {
                self.walk_expr(recv);
                self.walk_expr(key);
            }
            Expr::ObjectField { recv, .. } | Expr::TypeProbe { recv, .. } => {
                self.walk_expr(recv);
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.walk_expr(lhs);
                self.walk_expr(rhs);
            }
            Expr::Unary { operand, .. } => self.walk_expr(operand),
            Expr::Ternary {
                cond,
                then_val,
                else_val,
                ..
            } => {
                self.walk_expr(cond);
                self.walk_expr(then_val);
                self.walk_expr(else_val);
            }
            Expr::Lambda { body, .. } => self.walk_expr(body),
            Expr::NamedArg { value, .. } => self.walk_expr(value),
            _ => {}
        }
    }

    /// Mark the helper family a method call needs. Routing: dict-only
    /// names force dict, string-only names force string, shared names
    /// resolve by receiver, everything else is an array helper.
    fn route_method(&mut self, recv_ty: &AhoyType, method: &str) {
        if DICT_ONLY_METHODS.contains(&method) {
            self.info.dict_methods.insert(method.to_string());
        } else if STRING_ONLY_METHODS.contains(&method) {
            self.info.string_methods.insert(method.to_string());
        } else if SHARED_METHODS.contains(&method) {
            if recv_ty.is_dict() {
                self.info.dict_methods.insert(method.to_string());
            } else if recv_ty.is_string() {
                self.info.string_methods.insert(method.to_string());
            } else {
                self.info.use_arrays = true;
                self.info.array_methods.insert(method.to_string());
            }
        } else {
            self.info.use_arrays = true;
            self.info.array_methods.insert(method.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_function_discovery_marks_main() {
        let program = parse("func main ||\n    x: 1\n").unwrap();
        let info = analyze(&program);
        assert!(info.has_main);
        assert!(info.user_functions.contains("main"));
    }

    #[test]
    fn test_declared_return_types_kept() {
        let program = parse("func divmod |a: int, b: int| int, int\n    return a / b, a % b\n")
            .unwrap();
        let info = analyze(&program);
        assert_eq!(
            info.function_return_types["divmod"],
            vec![AhoyType::Int, AhoyType::Int]
        );
    }

    #[test]
    fn test_infer_return_from_first_return() {
        let program = parse("func half |x: int| infer\n    y: x / 2.0\n    return y\n").unwrap();
        let info = analyze(&program);
        assert_eq!(info.function_return_types["half"], vec![AhoyType::Float]);
    }

    #[test]
    fn test_infer_no_return_is_void() {
        let program = parse("func log |msg: string| infer\n    print|msg|\n").unwrap();
        let info = analyze(&program);
        assert!(info.function_return_types["log"].is_empty());
    }

    #[test]
    fn test_unannotated_return_inferred() {
        let program = parse("func greet ||\n    return \"ahoy\"\n").unwrap();
        let info = analyze(&program);
        assert_eq!(info.function_return_types["greet"], vec![AhoyType::Str]);
    }

    #[test]
    fn test_helper_discovery_routes_by_receiver() {
        let source = "\
a: <1, 2, 3>
a.push|4|
d: {x: 1}
d.keys||
s: \"ahoy\"
s.upper||
";
        let program = parse(source).unwrap();
        let info = analyze(&program);
        assert!(info.array_methods.contains("push"));
        assert!(info.dict_methods.contains("keys"));
        assert!(info.string_methods.contains("upper"));
        assert!(info.use_arrays);
    }

    #[test]
    fn test_shared_method_resolves_by_type() {
        let source = "\
d: {x: 1}
n: d.length||
s: \"ahoy\"
m: s.length||
";
        let program = parse(source).unwrap();
        let info = analyze(&program);
        assert!(info.dict_methods.contains("length"));
        assert!(info.string_methods.contains("length"));
        assert!(!info.array_methods.contains("length"));
    }

    #[test]
    fn test_json_flag() {
        let program = parse("j, err: read_json|\"data.json\"|\n").unwrap();
        let info = analyze(&program);
        assert!(info.use_json);
    }

    #[test]
    fn test_number_literal_inference() {
        let globals = HashMap::new();
        let elems = HashMap::new();
        let structs = HashMap::new();
        let enums = HashMap::new();
        let rets = HashMap::new();
        let view = TypeView {
            globals: &globals,
            locals: None,
            array_elem_types: &elems,
            structs: &structs,
            function_returns: &rets,
            enum_member_types: &enums,
        };
        let int_lit = Expr::Number {
            text: "5".into(),
            line: 1,
        };
        let float_lit = Expr::Number {
            text: "5.0".into(),
            line: 1,
        };
        assert_eq!(infer_expr_type(&int_lit, &view), AhoyType::Int);
        assert_eq!(infer_expr_type(&float_lit, &view), AhoyType::Float);
    }

    #[test]
    fn test_arithmetic_widening() {
        let program = parse("x: 1\ny: 2.5\n").unwrap();
        let info = analyze(&program);
        let _ = info;
        let mut globals = HashMap::new();
        globals.insert("x".to_string(), AhoyType::Int);
        globals.insert("y".to_string(), AhoyType::Float);
        let elems = HashMap::new();
        let structs = HashMap::new();
        let enums = HashMap::new();
        let rets = HashMap::new();
        let view = TypeView {
            globals: &globals,
            locals: None,
            array_elem_types: &elems,
            structs: &structs,
            function_returns: &rets,
            enum_member_types: &enums,
        };
        let sum = Expr::Binary {
            op: crate::ast::BinOp::Add,
            lhs: Box::new(Expr::Ident {
                name: "x".into(),
                line: 1,
            }),
            rhs: Box::new(Expr::Ident {
                name: "y".into(),
                line: 1,
            }),
            line: 1,
        };
        assert_eq!(infer_expr_type(&sum, &view), AhoyType::Float);
    }

    #[test]
    fn test_dict_index_is_float() {
        let program = parse("d: {a: 1}\nv: d{\"a\"}\n").unwrap();
        let _ = analyze(&program);
        let mut globals = HashMap::new();
        globals.insert("d".to_string(), AhoyType::Dict(None));
        let elems = HashMap::new();
        let structs = HashMap::new();
        let enums = HashMap::new();
        let rets = HashMap::new();
        let view = TypeView {
            globals: &globals,
            locals: None,
            array_elem_types: &elems,
            structs: &structs,
            function_returns: &rets,
            enum_member_types: &enums,
        };
        let access = Expr::DictKey {
            recv: Box::new(Expr::Ident {
                name: "d".into(),
                line: 1,
            }),
            key: Box::new(Expr::Str {
                text: "a".into(),
                line: 1,
            }),
            line: 1,
        };
        assert_eq!(infer_expr_type(&access, &view), AhoyType::Float);
    }
}
