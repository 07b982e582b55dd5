//! Recursive-descent parser for Ahoy syntax
//!
//! ```text
//! func divmod |a: int, b: int| int, int
//!     return a / b, a % b
//!
//! q, r: divmod|7, 3|
//! print|"q={q} r={r}"|
//! ```
//!
//! The parser consumes the token stream produced by [`crate::token`],
//! with block structure already reified as `Indent`/`Dedent` tokens.
//! One token of explicit lookahead plus three mode flags
//! (`in_function_call`, `in_array_literal`, `in_dict_literal`)
//! disambiguate `|` (call brackets vs. closing pipe) and `<` `>`
//! (array brackets vs. relational operators).
//!
//! The first mismatch aborts with a line-annotated error. No recovery.

use crate::ast::{
    AssignTarget, AssignValue, BinOp, CaseLabel, EnumDef, EnumMember, Expr, FunctionDef, IfArm,
    LoopStmt, Param, Program, Stmt, StructDef, StructField, SwitchCase, SwitchStmt, UnOp,
};
use crate::token::{Token, TokenKind, tokenize};
use crate::types::AhoyType;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Inside `name|...|` argument list: a bare `|` closes the call
    in_function_call: bool,
    /// Inside `<...>`: `<` and `>` are brackets, not comparisons
    in_array_literal: bool,
    /// Inside `{...}`: reserved for key/value disambiguation
    in_dict_literal: bool,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, String> {
        let tokens = tokenize(source)?;
        Ok(Parser {
            tokens,
            pos: 0,
            in_function_call: false,
            in_array_literal: false,
            in_dict_literal: false,
        })
    }

    pub fn parse(&mut self) -> Result<Program, String> {
        let mut program = Program::new();
        loop {
            self.skip_noise();
            if self.at_end() {
                break;
            }
            let stmt = self.parse_statement()?;
            program.statements.push(stmt);
        }
        Ok(program)
    }

    // ---- token plumbing -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn check_punct(&self, p: &str) -> bool {
        self.peek().is_punct(p)
    }

    fn check_keyword(&self, kw: &str) -> bool {
        self.peek().is_keyword(kw)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.check_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<Token, String> {
        if self.check_punct(p) {
            Ok(self.advance())
        } else {
            Err(format!(
                "at line {}: expected '{}', found {}",
                self.line(),
                p,
                self.peek()
            ))
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Result<Token, String> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(format!(
                "at line {}: expected {}, found {}",
                self.line(),
                what,
                self.peek()
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, String> {
        Ok(self.expect_kind(TokenKind::Ident, "identifier")?.lexeme)
    }

    /// Skip newlines and block-end sentinel lines between statements.
    fn skip_noise(&mut self) {
        loop {
            match self.peek() {
                t if t.kind == TokenKind::Newline => {
                    self.advance();
                }
                t if t.is_punct("$") || t.is_punct("⚓") => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    /// Consume the statement terminator: newline, or nothing when the
    /// block is ending anyway.
    fn end_statement(&mut self) -> Result<(), String> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Dedent | TokenKind::Eof => Ok(()),
            _ => Err(format!(
                "at line {}: expected end of statement, found {}",
                self.line(),
                self.peek()
            )),
        }
    }

    // ---- blocks ---------------------------------------------------------

    /// Parse `NEWLINE INDENT stmt* DEDENT`.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, String> {
        self.expect_kind(TokenKind::Newline, "newline")?;
        self.skip_newlines();
        self.expect_kind(TokenKind::Indent, "indented block")?;
        let mut body = Vec::new();
        loop {
            self.skip_noise();
            if self.peek().kind == TokenKind::Dedent || self.at_end() {
                break;
            }
            body.push(self.parse_statement()?);
        }
        if self.peek().kind == TokenKind::Dedent {
            self.advance();
        }
        Ok(body)
    }

    /// A body is either an indented block or, after `then`/`do`, a
    /// single statement on the same line.
    fn parse_body(&mut self) -> Result<Vec<Stmt>, String> {
        if self.peek().kind == TokenKind::Newline {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    // ---- statements -----------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt, String> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Keyword => match tok.lexeme.as_str() {
                "func" => self.parse_function(),
                "if" => self.parse_if(),
                "when" => self.parse_when(),
                "switch" => Ok(Stmt::Switch(self.parse_switch()?)),
                "loop" => self.parse_loop(),
                "struct" => self.parse_struct(),
                "enum" => self.parse_enum(),
                "import" => self.parse_import(),
                "return" => self.parse_return(),
                "assert" => self.parse_assert(),
                "defer" => self.parse_defer(),
                "halt" => {
                    let line = self.advance().line;
                    self.end_statement()?;
                    Ok(Stmt::Halt { line })
                }
                "next" => {
                    let line = self.advance().line;
                    self.end_statement()?;
                    Ok(Stmt::Next { line })
                }
                _ => Err(format!(
                    "at line {}: unexpected keyword '{}'",
                    tok.line, tok.lexeme
                )),
            },
            _ => self.parse_simple_statement(),
        }
    }

    /// Assignments, tuple assignments, constant declarations, and bare
    /// expression statements.
    fn parse_simple_statement(&mut self) -> Result<Stmt, String> {
        let line = self.line();

        // Constant declaration: NAME :: expr
        if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_punct("::") {
            let name = self.expect_ident()?;
            self.expect_punct("::")?;
            let value = self.parse_expr()?;
            self.end_statement()?;
            return Ok(Stmt::ConstDecl { name, value, line });
        }

        // Tuple assignment: NAME , NAME ... : expr [, expr ...]
        if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_punct(",") {
            if let Some(stmt) = self.try_parse_tuple_assignment()? {
                return Ok(stmt);
            }
        }

        let expr = self.parse_expr()?;

        if self.check_punct(":") {
            let target = Self::expr_to_target(expr).ok_or_else(|| {
                format!("at line {}: invalid assignment target", line)
            })?;
            self.advance(); // ':'

            // Optional declared type: `name: int: 5`
            let mut declared = None;
            if let Some(ty) = self.try_parse_type_annotation() {
                if self.eat_punct(":") {
                    declared = Some(ty);
                } else {
                    // Not a type after all; re-parse as an expression
                    return Err(format!(
                        "at line {}: expected ':' after type annotation",
                        line
                    ));
                }
            }

            let value = if self.check_keyword("switch") {
                AssignValue::Switch(Box::new(self.parse_switch()?))
            } else {
                let v = AssignValue::Expr(self.parse_expr()?);
                self.end_statement()?;
                v
            };
            return Ok(Stmt::Assignment {
                target,
                declared,
                value,
                line,
            });
        }

        self.end_statement()?;
        Ok(Stmt::Expr { expr, line })
    }

    /// `a, b, c: x, y, z` - returns None (after rewinding) when the
    /// comma list turns out not to be an assignment head.
    fn try_parse_tuple_assignment(&mut self) -> Result<Option<Stmt>, String> {
        let saved = self.pos;
        let line = self.line();
        let mut names = Vec::new();
        loop {
            if self.peek().kind != TokenKind::Ident {
                self.pos = saved;
                return Ok(None);
            }
            names.push(self.advance().lexeme);
            if !self.eat_punct(",") {
                break;
            }
        }
        if !self.eat_punct(":") {
            self.pos = saved;
            return Ok(None);
        }
        let mut values = vec![self.parse_expr()?];
        while self.eat_punct(",") {
            values.push(self.parse_expr()?);
        }
        self.end_statement()?;
        Ok(Some(Stmt::TupleAssignment {
            names,
            values,
            line,
        }))
    }

    /// Convert a parsed postfix expression into an assignment target.
    fn expr_to_target(expr: Expr) -> Option<AssignTarget> {
        match expr {
            Expr::Ident { name, .. } => Some(AssignTarget::Name(name)),
            Expr::Index { recv, index, .. } => match *recv {
                Expr::Ident { name, .. } => Some(AssignTarget::Index {
                    name,
                    index: *index,
                }),
                _ => None,
            },
            Expr::DictKey { recv, key, .. } => match *recv {
                Expr::Ident { name, .. } => Some(AssignTarget::DictKey { name, key: *key }),
                _ => None,
            },
            Expr::ObjectField { recv, field, .. } => Some(AssignTarget::ObjectField {
                object: *recv,
                field,
            }),
            Expr::Member { recv, field, .. } => Some(AssignTarget::Member {
                object: *recv,
                field,
            }),
            Expr::Unary {
                op: UnOp::Deref,
                operand,
                ..
            } => match *operand {
                Expr::Ident { name, .. } => Some(AssignTarget::Deref(name)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Try to read a type annotation (`int`, `array[int]`,
    /// `dict<string,int>`, a user type name followed by `:`). Rewinds
    /// and returns None when the tokens are not a type.
    fn try_parse_type_annotation(&mut self) -> Option<AhoyType> {
        let saved = self.pos;
        if self.peek().kind != TokenKind::Ident {
            return None;
        }
        let head = self.advance().lexeme;
        let spelled = match head.as_str() {
            "array" if self.check_punct("[") => {
                self.advance();
                let elem = if self.peek().kind == TokenKind::Ident {
                    self.advance().lexeme
                } else {
                    self.pos = saved;
                    return None;
                };
                if !self.eat_punct("]") {
                    self.pos = saved;
                    return None;
                }
                format!("array[{}]", elem)
            }
            "dict" if self.check_punct("<") => {
                self.advance();
                let k = if self.peek().kind == TokenKind::Ident {
                    self.advance().lexeme
                } else {
                    self.pos = saved;
                    return None;
                };
                if !self.eat_punct(",") {
                    self.pos = saved;
                    return None;
                }
                let v = if self.peek().kind == TokenKind::Ident {
                    self.advance().lexeme
                } else {
                    self.pos = saved;
                    return None;
                };
                if !self.eat_punct(">") {
                    self.pos = saved;
                    return None;
                }
                format!("dict<{},{}>", k, v)
            }
            _ => head,
        };
        // Only a real annotation when a ':' follows (otherwise this was
        // the start of the value expression)
        if !self.check_punct(":") {
            self.pos = saved;
            return None;
        }
        match AhoyType::parse(&spelled) {
            Some(ty) => Some(ty),
            None => {
                self.pos = saved;
                None
            }
        }
    }

    // ---- declarations ---------------------------------------------------

    fn parse_function(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'func'
        let name = self.expect_ident()?;

        self.expect_punct("|")?;
        let mut params = Vec::new();
        if !self.check_punct("|") {
            loop {
                params.push(self.parse_param()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.expect_punct("|")?;

        // Return type list: absent, single, comma-separated, or `infer`
        let mut returns = Vec::new();
        while self.peek().kind == TokenKind::Ident {
            let spelled = self.read_type_spelling()?;
            let ty = AhoyType::parse(&spelled).ok_or_else(|| {
                format!("at line {}: unknown return type '{}'", line, spelled)
            })?;
            returns.push(ty);
            if !self.eat_punct(",") {
                break;
            }
        }

        // Optional ':' before the block
        self.eat_punct(":");

        let body = if self.eat_keyword("do") || self.eat_keyword("then") {
            let b = self.parse_body()?;
            self.skip_noise();
            b
        } else {
            self.parse_block()?
        };

        Ok(Stmt::Function(FunctionDef {
            name,
            params,
            returns,
            body,
            line,
        }))
    }

    /// Read a type spelling at the cursor, including `array[...]` and
    /// `dict<...>` forms. Errors when the cursor is not on a name.
    fn read_type_spelling(&mut self) -> Result<String, String> {
        let head = self.expect_ident()?;
        if head == "array" && self.eat_punct("[") {
            let elem = self.read_type_spelling()?;
            self.expect_punct("]")?;
            return Ok(format!("array[{}]", elem));
        }
        if head == "dict" && self.eat_punct("<") {
            let k = self.read_type_spelling()?;
            self.expect_punct(",")?;
            let v = self.read_type_spelling()?;
            self.expect_punct(">")?;
            return Ok(format!("dict<{},{}>", k, v));
        }
        Ok(head)
    }

    /// `name`, `name: type`, `name: type: default`, `name: default`
    fn parse_param(&mut self) -> Result<Param, String> {
        let line = self.line();
        let name = self.expect_ident()?;
        let mut ty = None;
        let mut default = None;
        if self.eat_punct(":") {
            let saved = self.pos;
            if self.peek().kind == TokenKind::Ident {
                let spelled = self.read_type_spelling()?;
                match AhoyType::parse(&spelled) {
                    Some(parsed)
                        if !matches!(parsed, AhoyType::Named(_))
                            || spelled.chars().next().is_some_and(char::is_uppercase) =>
                    {
                        ty = Some(parsed);
                        if self.eat_punct(":") {
                            default = Some(self.parse_expr()?);
                        }
                    }
                    _ => {
                        // Lowercase non-type word: it was a default value
                        self.pos = saved;
                        default = Some(self.parse_expr()?);
                    }
                }
            } else {
                default = Some(self.parse_expr()?);
            }
        }
        let _ = line;
        Ok(Param { name, ty, default })
    }

    fn parse_struct(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'struct'
        let name = self.expect_ident()?;
        let (fields, variants) = self.parse_struct_body()?;
        Ok(Stmt::Struct(StructDef {
            name,
            fields,
            variants,
            line,
        }))
    }

    fn parse_struct_body(&mut self) -> Result<(Vec<StructField>, Vec<StructDef>), String> {
        self.expect_kind(TokenKind::Newline, "newline")?;
        self.skip_newlines();
        self.expect_kind(TokenKind::Indent, "indented struct body")?;
        let mut fields = Vec::new();
        let mut variants = Vec::new();
        loop {
            self.skip_noise();
            if self.peek().kind == TokenKind::Dedent || self.at_end() {
                break;
            }
            if self.check_keyword("type") {
                let vline = self.advance().line;
                let vname = self.expect_ident()?;
                let (vfields, nested) = self.parse_struct_body()?;
                variants.push(StructDef {
                    name: vname,
                    fields: vfields,
                    variants: nested,
                    line: vline,
                });
                continue;
            }
            let fname = self.expect_ident()?;
            self.expect_punct(":")?;
            let spelled = self.read_type_spelling()?;
            let ty = AhoyType::parse(&spelled).ok_or_else(|| {
                format!(
                    "at line {}: unknown field type '{}'",
                    self.line(),
                    spelled
                )
            })?;
            let default = if self.eat_punct(":") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            fields.push(StructField {
                name: fname,
                ty,
                default,
            });
            self.end_statement()?;
        }
        if self.peek().kind == TokenKind::Dedent {
            self.advance();
        }
        Ok((fields, variants))
    }

    fn parse_enum(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'enum'
        let name = self.expect_ident()?;
        let backing = if self.peek().kind == TokenKind::Ident {
            let spelled = self.advance().lexeme;
            Some(AhoyType::parse(&spelled).ok_or_else(|| {
                format!("at line {}: unknown enum backing type '{}'", line, spelled)
            })?)
        } else {
            None
        };
        self.expect_kind(TokenKind::Newline, "newline")?;
        self.skip_newlines();
        self.expect_kind(TokenKind::Indent, "indented enum body")?;
        let mut members = Vec::new();
        loop {
            self.skip_noise();
            if self.peek().kind == TokenKind::Dedent || self.at_end() {
                break;
            }
            let mline = self.line();
            let mutable = self.eat_keyword("mut");
            let mname = self.expect_ident()?;
            let value = if self.eat_punct(":") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            members.push(EnumMember {
                name: mname,
                value,
                mutable,
                line: mline,
            });
            self.end_statement()?;
        }
        if self.peek().kind == TokenKind::Dedent {
            self.advance();
        }
        Ok(Stmt::Enum(EnumDef {
            name,
            backing,
            members,
            line,
        }))
    }

    fn parse_import(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'import'
        let path = self
            .expect_kind(TokenKind::Str, "import path string")?
            .lexeme;
        let namespace = if self.eat_keyword("as") {
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.end_statement()?;
        Ok(Stmt::Import {
            path,
            namespace,
            line,
        })
    }

    // ---- control flow ---------------------------------------------------

    fn parse_if(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'if'
        let mut arms = Vec::new();
        let cond = self.parse_expr()?;
        if !self.eat_keyword("then") {
            self.eat_keyword("do");
        }
        let body = self.parse_body()?;
        arms.push(IfArm { cond, body });

        let mut else_body = None;
        loop {
            let saved = self.pos;
            self.skip_noise();
            if self.check_keyword("elseif") {
                self.advance();
                let cond = self.parse_expr()?;
                if !self.eat_keyword("then") {
                    self.eat_keyword("do");
                }
                let body = self.parse_body()?;
                arms.push(IfArm { cond, body });
            } else if self.check_keyword("else") {
                self.advance();
                self.eat_keyword("then");
                else_body = Some(self.parse_body()?);
                break;
            } else {
                self.pos = saved;
                break;
            }
        }

        Ok(Stmt::If {
            arms,
            else_body,
            line,
        })
    }

    fn parse_when(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'when'
        let cond = self.parse_expr()?;
        if !self.eat_keyword("then") {
            self.eat_keyword("do");
        }
        let body = self.parse_body()?;
        Ok(Stmt::When { cond, body, line })
    }

    fn parse_switch(&mut self) -> Result<SwitchStmt, String> {
        let line = self.advance().line; // 'switch'
        let scrutinee = self.parse_expr()?;
        if !self.eat_keyword("on") {
            self.eat_keyword("then");
        }
        self.expect_kind(TokenKind::Newline, "newline")?;
        self.skip_newlines();
        self.expect_kind(TokenKind::Indent, "indented switch cases")?;

        let mut cases = Vec::new();
        loop {
            self.skip_noise();
            if self.peek().kind == TokenKind::Dedent || self.at_end() {
                break;
            }
            cases.push(self.parse_switch_case()?);
        }
        if self.peek().kind == TokenKind::Dedent {
            self.advance();
        }

        Ok(SwitchStmt {
            scrutinee,
            cases,
            line,
        })
    }

    fn parse_switch_case(&mut self) -> Result<SwitchCase, String> {
        let line = self.line();
        let mut labels = Vec::new();
        loop {
            if self.peek().kind == TokenKind::Ident && self.peek().lexeme == "_" {
                self.advance();
                labels.push(CaseLabel::Default);
            } else {
                let value = self.parse_expr()?;
                if self.eat_punct("..") {
                    let end = self.parse_expr()?;
                    labels.push(CaseLabel::Range(value, end));
                } else {
                    labels.push(CaseLabel::Value(value));
                }
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        if !self.eat_keyword("then") {
            self.eat_keyword("do");
        }
        let body = self.parse_body()?;
        Ok(SwitchCase { labels, body, line })
    }

    fn parse_loop(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'loop'

        // `loop` / `loop do ...` - infinite
        if self.peek().kind == TokenKind::Newline || self.check_keyword("do") {
            self.eat_keyword("do");
            let body = self.parse_body()?;
            return Ok(Stmt::Loop(LoopStmt::Infinite { body, line }));
        }

        // `loop till COND`
        if self.eat_keyword("till") {
            let cond = self.parse_expr()?;
            self.eat_keyword("do");
            let body = self.parse_body()?;
            return Ok(Stmt::Loop(LoopStmt::Till {
                var: None,
                from: None,
                cond,
                body,
                line,
            }));
        }

        let var = self.expect_ident()?;

        // `loop k, v in expr`
        if self.eat_punct(",") {
            let value = self.expect_ident()?;
            if !self.eat_keyword("in") {
                return Err(format!(
                    "at line {}: expected 'in' after loop key/value names",
                    line
                ));
            }
            let iterable = self.parse_expr()?;
            self.eat_keyword("do");
            let body = self.parse_body()?;
            return Ok(Stmt::Loop(LoopStmt::InDict {
                key: var,
                value,
                iterable,
                body,
                line,
            }));
        }

        // `loop elem in expr`
        if self.eat_keyword("in") {
            let iterable = self.parse_expr()?;
            self.eat_keyword("do");
            let body = self.parse_body()?;
            return Ok(Stmt::Loop(LoopStmt::InArray {
                var,
                iterable,
                body,
                line,
            }));
        }

        // `loop i from X ...`
        if self.eat_keyword("from") {
            let from = self.parse_expr()?;
            if self.eat_keyword("to") {
                let to = self.parse_expr()?;
                self.eat_keyword("do");
                let body = self.parse_body()?;
                return Ok(Stmt::Loop(LoopStmt::Range {
                    var,
                    from,
                    to,
                    body,
                    line,
                }));
            }
            if self.eat_keyword("till") {
                let cond = self.parse_expr()?;
                self.eat_keyword("do");
                let body = self.parse_body()?;
                return Ok(Stmt::Loop(LoopStmt::Till {
                    var: Some(var),
                    from: Some(from),
                    cond,
                    body,
                    line,
                }));
            }
            self.eat_keyword("do");
            let body = self.parse_body()?;
            return Ok(Stmt::Loop(LoopStmt::Count {
                var,
                from: Some(from),
                body,
                line,
            }));
        }

        // `loop i till COND`
        if self.eat_keyword("till") {
            let cond = self.parse_expr()?;
            self.eat_keyword("do");
            let body = self.parse_body()?;
            return Ok(Stmt::Loop(LoopStmt::Till {
                var: Some(var),
                from: None,
                cond,
                body,
                line,
            }));
        }

        // `loop i` - count up forever
        self.eat_keyword("do");
        let body = self.parse_body()?;
        Ok(Stmt::Loop(LoopStmt::Count {
            var,
            from: None,
            body,
            line,
        }))
    }

    fn parse_return(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'return'
        let mut values = Vec::new();
        if !matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            values.push(self.parse_expr()?);
            while self.eat_punct(",") {
                values.push(self.parse_expr()?);
            }
        }
        self.end_statement()?;
        Ok(Stmt::Return { values, line })
    }

    fn parse_assert(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'assert'
        // Both `assert cond` and `assert|cond|` forms
        let cond = if self.eat_punct("|") {
            let was = self.in_function_call;
            self.in_function_call = true;
            let c = self.parse_expr()?;
            self.in_function_call = was;
            self.expect_punct("|")?;
            c
        } else {
            self.parse_expr()?
        };
        self.end_statement()?;
        Ok(Stmt::Assert { cond, line })
    }

    fn parse_defer(&mut self) -> Result<Stmt, String> {
        let line = self.advance().line; // 'defer'
        let stmt = self.parse_simple_statement()?;
        Ok(Stmt::Defer {
            stmt: Box::new(stmt),
            line,
        })
    }

    // ---- expressions ----------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, String> {
        let cond = self.parse_or()?;
        if self.check_punct("?") {
            let line = self.advance().line;
            let then_val = self.parse_or()?;
            self.expect_punct(":")?;
            let else_val = self.parse_or()?;
            return Ok(Expr::Ternary {
                cond: Box::new(cond),
                then_val: Box::new(then_val),
                else_val: Box::new(else_val),
                line,
            });
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_and()?;
        while self.check_keyword("or") {
            let line = self.advance().line;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_equality()?;
        while self.check_keyword("and") {
            let line = self.advance().line;
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_relational()?;
        loop {
            if self.check_keyword("is") {
                let line = self.advance().line;
                let op = if self.eat_keyword("not") {
                    BinOp::Ne
                } else {
                    BinOp::Eq
                };
                let rhs = self.parse_relational()?;
                lhs = Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    line,
                };
            } else if self.check_punct("!=") {
                let line = self.advance().line;
                let rhs = self.parse_relational()?;
                lhs = Expr::Binary {
                    op: BinOp::Ne,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                    line,
                };
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = if self.check_punct("<=") {
                Some(BinOp::Le)
            } else if self.check_punct(">=") {
                Some(BinOp::Ge)
            } else if self.check_punct("<") && !self.in_array_literal {
                Some(BinOp::Lt)
            } else if self.check_punct(">") && !self.in_array_literal {
                Some(BinOp::Gt)
            } else if self.check_keyword("greater_than") {
                Some(BinOp::Gt)
            } else if self.check_keyword("lesser_than") {
                Some(BinOp::Lt)
            } else {
                None
            };
            let Some(op) = op else { break };
            let line = self.advance().line;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = if self.check_punct("+") {
                Some(BinOp::Add)
            } else if self.check_punct("-") {
                Some(BinOp::Sub)
            } else {
                None
            };
            let Some(op) = op else { break };
            let line = self.advance().line;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.check_punct("*") {
                Some(BinOp::Mul)
            } else if self.check_punct("/") {
                Some(BinOp::Div)
            } else if self.check_punct("%") {
                Some(BinOp::Mod)
            } else {
                None
            };
            let Some(op) = op else { break };
            let line = self.advance().line;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let op = if self.check_keyword("not") {
            Some(UnOp::Not)
        } else if self.check_punct("-") {
            Some(UnOp::Neg)
        } else if self.check_punct("^") {
            Some(UnOp::Deref)
        } else if self.check_punct("&") {
            Some(UnOp::AddrOf)
        } else {
            None
        };
        if let Some(op) = op {
            let line = self.advance().line;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                line,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check_punct(".") {
                // `x.type` probe, `x.field`, `x.method|args|`
                let line = self.advance().line;
                if self.check_keyword("type") {
                    self.advance();
                    expr = Expr::TypeProbe {
                        recv: Box::new(expr),
                        line,
                    };
                    continue;
                }
                let name = self.expect_ident()?;
                if self.check_punct("|") && !self.in_function_call {
                    let args = self.parse_call_args(true)?;
                    expr = Expr::MethodCall {
                        recv: Box::new(expr),
                        method: name,
                        args,
                        line,
                    };
                } else {
                    expr = Expr::Member {
                        recv: Box::new(expr),
                        field: name,
                        line,
                    };
                }
                continue;
            }
            if self.check_punct("[") {
                let line = self.advance().line;
                let index = self.parse_expr()?;
                self.expect_punct("]")?;
                expr = Expr::Index {
                    recv: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
                continue;
            }
            if self.check_punct("{") {
                // `Name{field: v}` object literal vs `d{"k"}` dict access
                if matches!(&expr, Expr::Ident { name, .. }
                    if name.chars().next().is_some_and(char::is_uppercase))
                    && self.peek_at(1).kind == TokenKind::Ident
                    && self.peek_at(2).is_punct(":")
                {
                    let type_name = match &expr {
                        Expr::Ident { name, .. } => name.clone(),
                        _ => unreachable!(),
                    };
                    expr = self.parse_object_literal(type_name)?;
                    continue;
                }
                let line = self.advance().line;
                let key = self.parse_expr()?;
                self.expect_punct("}")?;
                expr = Expr::DictKey {
                    recv: Box::new(expr),
                    key: Box::new(key),
                    line,
                };
                continue;
            }
            if self.check_punct("<")
                && matches!(
                    self.peek_at(1).kind,
                    TokenKind::Char | TokenKind::Str
                )
                && self.peek_at(2).is_punct(">")
            {
                // `obj<'field'>` object-field access
                let line = self.advance().line;
                let field = self.advance().lexeme;
                self.expect_punct(">")?;
                expr = Expr::ObjectField {
                    recv: Box::new(expr),
                    field,
                    line,
                };
                continue;
            }
            if self.check_punct("|") && !self.in_function_call {
                if let Expr::Ident { name, line } = &expr {
                    let name = name.clone();
                    let line = *line;
                    let args = self.parse_call_args(false)?;
                    expr = Expr::Call { name, args, line };
                    continue;
                }
            }
            break;
        }
        Ok(expr)
    }

    /// Parse `|arg, arg, ...|`. Named arguments (`name: value`) are
    /// allowed in plain calls; in method calls an `ident:` head is a
    /// lambda parameter list instead.
    fn parse_call_args(&mut self, method: bool) -> Result<Vec<Expr>, String> {
        self.expect_punct("|")?;
        let was = self.in_function_call;
        self.in_function_call = true;
        let mut args = Vec::new();
        let result: Result<(), String> = (|| {
            if self.check_punct("|") {
                return Ok(());
            }
            loop {
                args.push(self.parse_arg(method)?);
                if !self.eat_punct(",") {
                    break;
                }
            }
            Ok(())
        })();
        self.in_function_call = was;
        result?;
        self.expect_punct("|")?;
        Ok(args)
    }

    fn parse_arg(&mut self, method: bool) -> Result<Expr, String> {
        // `(a, b): expr` - multi-parameter lambda
        if self.check_punct("(") {
            let saved = self.pos;
            if let Some(lambda) = self.try_parse_paren_lambda()? {
                return Ok(lambda);
            }
            self.pos = saved;
        }
        // `name: expr` - lambda in method args, named arg in plain calls
        if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_punct(":") {
            let line = self.line();
            let name = self.advance().lexeme;
            self.advance(); // ':'
            let value = self.parse_expr()?;
            if method {
                return Ok(Expr::Lambda {
                    params: vec![name],
                    body: Box::new(value),
                    line,
                });
            }
            return Ok(Expr::NamedArg {
                name,
                value: Box::new(value),
                line,
            });
        }
        self.parse_expr()
    }

    fn try_parse_paren_lambda(&mut self) -> Result<Option<Expr>, String> {
        let line = self.line();
        self.expect_punct("(")?;
        let mut params = Vec::new();
        loop {
            if self.peek().kind != TokenKind::Ident {
                return Ok(None);
            }
            params.push(self.advance().lexeme);
            if self.eat_punct(",") {
                continue;
            }
            break;
        }
        if !self.eat_punct(")") || !self.eat_punct(":") {
            return Ok(None);
        }
        let body = self.parse_expr()?;
        Ok(Some(Expr::Lambda {
            params,
            body: Box::new(body),
            line,
        }))
    }

    fn parse_object_literal(&mut self, type_name: String) -> Result<Expr, String> {
        let line = self.expect_punct("{")?.line;
        let was = self.in_dict_literal;
        self.in_dict_literal = true;
        let mut fields = Vec::new();
        if !self.check_punct("}") {
            loop {
                let fname = self.expect_ident()?;
                self.expect_punct(":")?;
                let value = self.parse_expr()?;
                fields.push((fname, value));
                if !self.eat_punct(",") {
                    break;
                }
            }
        }
        self.in_dict_literal = was;
        self.expect_punct("}")?;
        Ok(Expr::ObjectLit {
            type_name,
            fields,
            line,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Number {
                    text: tok.lexeme,
                    line: tok.line,
                })
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Str {
                    text: tok.lexeme,
                    line: tok.line,
                })
            }
            TokenKind::FString => {
                self.advance();
                Ok(Expr::FString {
                    text: tok.lexeme,
                    line: tok.line,
                })
            }
            TokenKind::Char => {
                self.advance();
                Ok(Expr::CharLit {
                    text: tok.lexeme,
                    line: tok.line,
                })
            }
            TokenKind::Keyword if tok.lexeme == "true" || tok.lexeme == "false" => {
                self.advance();
                Ok(Expr::Bool {
                    value: tok.lexeme == "true",
                    line: tok.line,
                })
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expr::Ident {
                    name: tok.lexeme,
                    line: tok.line,
                })
            }
            TokenKind::Punct => match tok.lexeme.as_str() {
                "(" => {
                    self.advance();
                    // Parentheses reset call/bracket context
                    let was_call = self.in_function_call;
                    let was_array = self.in_array_literal;
                    self.in_function_call = false;
                    self.in_array_literal = false;
                    let inner = self.parse_expr();
                    self.in_function_call = was_call;
                    self.in_array_literal = was_array;
                    let inner = inner?;
                    self.expect_punct(")")?;
                    Ok(inner)
                }
                "[" => self.parse_array_literal("[", "]"),
                "<" => self.parse_array_literal("<", ">"),
                "{" => self.parse_dict_literal(),
                "?" => {
                    self.advance();
                    Ok(Expr::LoopCounter { line: tok.line })
                }
                _ => Err(format!(
                    "at line {}: unexpected token {} in expression",
                    tok.line,
                    self.peek()
                )),
            },
            _ => Err(format!(
                "at line {}: unexpected token {} in expression",
                tok.line,
                self.peek()
            )),
        }
    }

    fn parse_array_literal(&mut self, open: &str, close: &str) -> Result<Expr, String> {
        let line = self.expect_punct(open)?.line;
        let was = self.in_array_literal;
        self.in_array_literal = true;
        let mut elems = Vec::new();
        let result: Result<(), String> = (|| {
            if self.check_punct(close) {
                return Ok(());
            }
            loop {
                elems.push(self.parse_expr()?);
                if !self.eat_punct(",") {
                    break;
                }
            }
            Ok(())
        })();
        self.in_array_literal = was;
        result?;
        self.expect_punct(close)?;
        Ok(Expr::Array { elems, line })
    }

    fn parse_dict_literal(&mut self) -> Result<Expr, String> {
        let line = self.expect_punct("{")?.line;
        let was = self.in_dict_literal;
        self.in_dict_literal = true;
        let mut entries = Vec::new();
        let result: Result<(), String> = (|| {
            self.skip_newlines();
            if self.check_punct("}") {
                return Ok(());
            }
            loop {
                self.skip_newlines();
                let key = match self.peek().kind {
                    TokenKind::Ident => self.advance().lexeme,
                    TokenKind::Str => self.advance().lexeme,
                    _ => {
                        return Err(format!(
                            "at line {}: expected dict key, found {}",
                            self.line(),
                            self.peek()
                        ));
                    }
                };
                self.expect_punct(":")?;
                let value = self.parse_expr()?;
                entries.push((key, value));
                self.skip_newlines();
                if !self.eat_punct(",") {
                    break;
                }
                self.skip_newlines();
            }
            Ok(())
        })();
        self.in_dict_literal = was;
        result?;
        self.skip_newlines();
        self.expect_punct("}")?;
        Ok(Expr::Dict { entries, line })
    }
}

/// Parse a source string straight to a [`Program`].
pub fn parse(source: &str) -> Result<Program, String> {
    Parser::new(source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let program = parse("x: 5\n").unwrap();
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Assignment { target, value, .. } => {
                assert_eq!(*target, AssignTarget::Name("x".to_string()));
                assert!(matches!(
                    value,
                    AssignValue::Expr(Expr::Number { text, .. }) if text == "5"
                ));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_typed_assignment() {
        let program = parse("x: int: 5\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment { declared, .. } => {
                assert_eq!(*declared, Some(AhoyType::Int));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_constant() {
        let program = parse("PI :: 3.14\n").unwrap();
        match &program.statements[0] {
            Stmt::ConstDecl { name, value, .. } => {
                assert_eq!(name, "PI");
                assert!(value.is_float_literal());
            }
            other => panic!("expected constant, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_multi_return() {
        let source = "func divmod |a: int, b: int| int, int\n    return a / b, a % b\n";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Function(f) => {
                assert_eq!(f.name, "divmod");
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.params[0].ty, Some(AhoyType::Int));
                assert_eq!(f.returns, vec![AhoyType::Int, AhoyType::Int]);
                assert_eq!(f.body.len(), 1);
                match &f.body[0] {
                    Stmt::Return { values, .. } => assert_eq!(values.len(), 2),
                    other => panic!("expected return, got {:?}", other),
                }
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_default_param() {
        let source = "func greet |name: string: \"sailor\"|\n    print|name|\n";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Function(f) => {
                assert_eq!(f.params[0].ty, Some(AhoyType::Str));
                assert!(f.params[0].default.is_some());
                assert!(f.returns.is_empty());
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_one_line_function() {
        let program = parse("func inc |x: int| int do return x + 1\n").unwrap();
        match &program.statements[0] {
            Stmt::Function(f) => {
                assert_eq!(f.name, "inc");
                assert_eq!(f.body.len(), 1);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_call_brackets() {
        let program = parse("print|\"Result: %d\\n\", result|\n").unwrap();
        match &program.statements[0] {
            Stmt::Expr {
                expr: Expr::Call { name, args, .. },
                ..
            } => {
                assert_eq!(name, "print");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elseif_else() {
        let source = "\
if x is 1 then
    a: 1
elseif x is 2 then
    a: 2
else
    a: 3
";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::If {
                arms, else_body, ..
            } => {
                assert_eq!(arms.len(), 2);
                assert!(else_body.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_one_line_if() {
        let program = parse("if flag and not false then x: 1\n").unwrap();
        match &program.statements[0] {
            Stmt::If { arms, .. } => {
                assert_eq!(arms.len(), 1);
                assert!(matches!(
                    arms[0].cond,
                    Expr::Binary {
                        op: BinOp::And,
                        ..
                    }
                ));
                assert_eq!(arms[0].body.len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_switch_with_ranges() {
        let source = "\
switch x on
    1 then
        a: 1
    2, 3 then
        a: 2
    4..9 then
        a: 3
    _ then
        a: 4
";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Switch(sw) => {
                assert_eq!(sw.cases.len(), 4);
                assert_eq!(sw.cases[1].labels.len(), 2);
                assert!(matches!(sw.cases[2].labels[0], CaseLabel::Range(..)));
                assert!(matches!(sw.cases[3].labels[0], CaseLabel::Default));
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_switch_as_expression() {
        let source = "\
y: switch x on
    1 then
        \"one\"
    _ then
        \"many\"
";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Assignment { value, .. } => {
                assert!(matches!(value, AssignValue::Switch(_)));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_loop_forms() {
        let cases: &[(&str, fn(&LoopStmt) -> bool)] = &[
            ("loop\n    x: 1\n", |l| {
                matches!(l, LoopStmt::Infinite { .. })
            }),
            ("loop i\n    x: 1\n", |l| {
                matches!(l, LoopStmt::Count { from: None, .. })
            }),
            ("loop i from 5\n    x: 1\n", |l| {
                matches!(l, LoopStmt::Count { from: Some(_), .. })
            }),
            ("loop till x is 3\n    x: 1\n", |l| {
                matches!(l, LoopStmt::Till { var: None, .. })
            }),
            ("loop i till i is 3\n    x: 1\n", |l| {
                matches!(l, LoopStmt::Till { var: Some(_), .. })
            }),
            ("loop i from 0 to 10\n    x: 1\n", |l| {
                matches!(l, LoopStmt::Range { .. })
            }),
            ("loop elem in items\n    x: 1\n", |l| {
                matches!(l, LoopStmt::InArray { .. })
            }),
            ("loop k, v in d\n    x: 1\n", |l| {
                matches!(l, LoopStmt::InDict { .. })
            }),
        ];
        for (source, pred) in cases {
            let program = parse(source).unwrap();
            match &program.statements[0] {
                Stmt::Loop(l) => assert!(pred(l), "wrong loop form for {:?}", source),
                other => panic!("expected loop for {:?}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_parse_one_line_dict_loop() {
        let program = parse("loop k, v in d do print|k, v|\n").unwrap();
        match &program.statements[0] {
            Stmt::Loop(LoopStmt::InDict { key, value, .. }) => {
                assert_eq!(key, "k");
                assert_eq!(value, "v");
            }
            other => panic!("expected dict loop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_array_literals_both_brackets() {
        for source in ["a: <1, 2, 3>\n", "a: [1, 2, 3]\n"] {
            let program = parse(source).unwrap();
            match &program.statements[0] {
                Stmt::Assignment {
                    value: AssignValue::Expr(Expr::Array { elems, .. }),
                    ..
                } => assert_eq!(elems.len(), 3),
                other => panic!("expected array assignment, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_angle_brackets_relational_outside_literal() {
        let program = parse("b: x < y\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::Binary { op, .. }),
                ..
            } => assert_eq!(*op, BinOp::Lt),
            other => panic!("expected relational, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_dict_literal_and_access() {
        let program = parse("d: {a: 1, b: 2}\nx: d{\"a\"}\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::Dict { entries, .. }),
                ..
            } => assert_eq!(entries.len(), 2),
            other => panic!("expected dict literal, got {:?}", other),
        }
        match &program.statements[1] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::DictKey { .. }),
                ..
            } => {}
            other => panic!("expected dict access, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_object_literal() {
        let program = parse("p: Point{x: 1, y: 2}\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::ObjectLit {
                    type_name, fields, ..
                }),
                ..
            } => {
                assert_eq!(type_name, "Point");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected object literal, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_tuple_assignment_from_call() {
        let program = parse("q, r: divmod|7, 3|\n").unwrap();
        match &program.statements[0] {
            Stmt::TupleAssignment { names, values, .. } => {
                assert_eq!(names, &["q".to_string(), "r".to_string()]);
                assert_eq!(values.len(), 1);
                assert!(matches!(values[0], Expr::Call { .. }));
            }
            other => panic!("expected tuple assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_method_chain() {
        let program = parse("a.push|4|\n").unwrap();
        match &program.statements[0] {
            Stmt::Expr {
                expr: Expr::MethodCall { method, args, .. },
                ..
            } => {
                assert_eq!(method, "push");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_lambda_in_method_args() {
        let program = parse("b: a.map|x: x * 2|\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::MethodCall { args, .. }),
                ..
            } => {
                assert!(matches!(&args[0], Expr::Lambda { params, .. } if params.len() == 1));
            }
            other => panic!("expected map call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_named_args() {
        let program = parse("connect|host: \"localhost\", 8080|\n").unwrap();
        match &program.statements[0] {
            Stmt::Expr {
                expr: Expr::Call { args, .. },
                ..
            } => {
                assert!(matches!(&args[0], Expr::NamedArg { name, .. } if name == "host"));
                assert!(matches!(&args[1], Expr::Number { .. }));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_struct_with_variant() {
        let source = "\
struct Point
    x: int
    y: int: 0
    type Point3
        z: int
";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Struct(s) => {
                assert_eq!(s.fields.len(), 2);
                assert!(s.fields[1].default.is_some());
                assert_eq!(s.variants.len(), 1);
                assert_eq!(s.variants[0].name, "Point3");
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_enum_with_backing_type() {
        let source = "\
enum Color string
    red: \"FF0000\"
    mut green: \"00FF00\"
    blue: \"0000FF\"
";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Enum(e) => {
                assert_eq!(e.backing, Some(AhoyType::Str));
                assert_eq!(e.members.len(), 3);
                assert!(e.members[1].mutable);
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_import_with_namespace() {
        let program = parse("import \"raylib.h\" as rl\n").unwrap();
        match &program.statements[0] {
            Stmt::Import {
                path, namespace, ..
            } => {
                assert_eq!(path, "raylib.h");
                assert_eq!(namespace.as_deref(), Some("rl"));
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_defer_and_halt() {
        let source = "\
func cleanup ||
    defer close|f|
    loop
        halt
";
        let program = parse(source).unwrap();
        match &program.statements[0] {
            Stmt::Function(f) => {
                assert!(matches!(f.body[0], Stmt::Defer { .. }));
                match &f.body[1] {
                    Stmt::Loop(LoopStmt::Infinite { body, .. }) => {
                        assert!(matches!(body[0], Stmt::Halt { .. }));
                    }
                    other => panic!("expected loop, got {:?}", other),
                }
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ternary_and_loop_counter() {
        let program = parse("loop i from 0 to 4\n    x: ? % 2 is 0 ? 1 : 0\n").unwrap();
        match &program.statements[0] {
            Stmt::Loop(LoopStmt::Range { body, .. }) => match &body[0] {
                Stmt::Assignment {
                    value: AssignValue::Expr(Expr::Ternary { cond, .. }),
                    ..
                } => {
                    assert!(matches!(
                        **cond,
                        Expr::Binary { op: BinOp::Eq, .. }
                    ));
                }
                other => panic!("expected ternary assignment, got {:?}", other),
            },
            other => panic!("expected range loop, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_pointer_forms() {
        let program = parse("^p: 5\nq: &x\n").unwrap();
        assert!(matches!(
            &program.statements[0],
            Stmt::Assignment {
                target: AssignTarget::Deref(name),
                ..
            } if name == "p"
        ));
        assert!(matches!(
            &program.statements[1],
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::Unary {
                    op: UnOp::AddrOf,
                    ..
                }),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_fstring() {
        let program = parse("print|\"hello {name}\"|\n").unwrap();
        match &program.statements[0] {
            Stmt::Expr {
                expr: Expr::Call { args, .. },
                ..
            } => assert!(matches!(args[0], Expr::FString { .. })),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_type_probe() {
        let program = parse("t: x.type\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::TypeProbe { .. }),
                ..
            } => {}
            other => panic!("expected type probe, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_object_field_access() {
        let program = parse("v: obj<'speed'>\n").unwrap();
        match &program.statements[0] {
            Stmt::Assignment {
                value: AssignValue::Expr(Expr::ObjectField { field, .. }),
                ..
            } => assert_eq!(field, "speed"),
            other => panic!("expected object field access, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_has_line() {
        let err = parse("x: )\n").unwrap_err();
        assert!(err.contains("at line 1"), "error was: {}", err);
    }

    #[test]
    fn test_mismatch_aborts() {
        let err = parse("func broken |a: int\n    return a\n").unwrap_err();
        assert!(err.contains("at line"), "error was: {}", err);
    }

    #[test]
    fn test_sentinel_lines_ignored() {
        let source = "if x then\n    y: 1\n$\nz: 2\n";
        let program = parse(source).unwrap();
        assert_eq!(program.statements.len(), 2);
    }
}
