//! Statement emission
//!
//! Writes C statements into a body buffer, tracking scope so the first
//! assignment to a name declares it and later ones mutate it. Loops and
//! conditionals open nested block scopes; names declared inside drop
//! out when the block closes so re-entry can declare them again.

use super::{CodeGen, CodeGenError};
use crate::ast::{
    AssignTarget, AssignValue, CaseLabel, Expr, LoopStmt, Stmt, SwitchStmt,
};
use crate::types::AhoyType;
use std::fmt::Write as _;

impl CodeGen {
    pub(super) fn emit_stmt(&mut self, out: &mut String, stmt: &Stmt) -> Result<(), CodeGenError> {
        match stmt {
            // Declarations are lifted out by the program pass
            Stmt::Function(_) | Stmt::Struct(_) | Stmt::Enum(_) | Stmt::Import { .. } => Ok(()),
            Stmt::Assignment {
                target,
                declared,
                value,
                line,
            } => self.emit_assignment(out, target, declared.as_ref(), value, *line),
            Stmt::TupleAssignment { names, values, line } => {
                self.emit_tuple_assignment(out, names, values, *line)
            }
            Stmt::ConstDecl { name, value, line } => {
                self.register_constant(name, *line)?;
                let ty = self.infer_type(value);
                let value_c = self.emit_expr(value)?;
                writeln!(
                    out,
                    "{}const {} {} = {};",
                    self.pad(),
                    ty.c_type(),
                    name,
                    value_c
                )?;
                self.declare_var(name, ty);
                Ok(())
            }
            Stmt::If {
                arms, else_body, ..
            } => {
                for (idx, arm) in arms.iter().enumerate() {
                    let cond = self.emit_expr(&arm.cond)?;
                    if idx == 0 {
                        writeln!(out, "{}if ({}) {{", self.pad(), cond)?;
                    } else {
                        writeln!(out, "{}}} else if ({}) {{", self.pad(), cond)?;
                    }
                    self.emit_block(out, &arm.body)?;
                }
                if let Some(else_body) = else_body {
                    writeln!(out, "{}}} else {{", self.pad())?;
                    self.emit_block(out, else_body)?;
                }
                writeln!(out, "{}}}", self.pad())?;
                Ok(())
            }
            Stmt::When { cond, body, .. } => {
                let cond = self.emit_expr(cond)?;
                writeln!(out, "{}if ({}) {{", self.pad(), cond)?;
                self.emit_block(out, body)?;
                writeln!(out, "{}}}", self.pad())?;
                Ok(())
            }
            Stmt::Switch(sw) => self.emit_switch(out, sw, None),
            Stmt::Loop(l) => self.emit_loop(out, l),
            Stmt::Return { values, .. } => self.emit_return(out, values),
            Stmt::Assert { cond, .. } => {
                self.uses_assert = true;
                let cond = self.emit_expr(cond)?;
                writeln!(out, "{}assert({});", self.pad(), cond)?;
                Ok(())
            }
            Stmt::Defer { stmt, .. } => {
                self.deferred.push((**stmt).clone());
                Ok(())
            }
            Stmt::Halt { .. } => {
                writeln!(out, "{}break;", self.pad())?;
                Ok(())
            }
            Stmt::Next { .. } => {
                writeln!(out, "{}continue;", self.pad())?;
                Ok(())
            }
            Stmt::Expr { expr, .. } => {
                if let Expr::Call { name, args, .. } = expr {
                    if name == "print" {
                        return self.emit_print(out, args);
                    }
                }
                let text = self.emit_expr(expr)?;
                writeln!(out, "{}{};", self.pad(), text)?;
                Ok(())
            }
        }
    }

    /// Emit a nested body with its own block scope.
    pub(super) fn emit_block(&mut self, out: &mut String, body: &[Stmt]) -> Result<(), CodeGenError> {
        self.push_block_scope();
        self.indent += 1;
        let result: Result<(), CodeGenError> = (|| {
            for stmt in body {
                self.emit_stmt(out, stmt)?;
            }
            Ok(())
        })();
        self.indent -= 1;
        self.pop_block_scope();
        result
    }

    /// Constant redeclaration is the one hard semantic error.
    pub(super) fn register_constant(&mut self, name: &str, line: usize) -> Result<(), CodeGenError> {
        if !self.constants.insert(name.to_string()) {
            return Err(CodeGenError::Logic(format!(
                "at line {}: constant '{}' is already declared",
                line, name
            )));
        }
        Ok(())
    }

    // ---- assignments ----------------------------------------------------

    fn emit_assignment(
        &mut self,
        out: &mut String,
        target: &AssignTarget,
        declared: Option<&AhoyType>,
        value: &AssignValue,
        line: usize,
    ) -> Result<(), CodeGenError> {
        match (target, value) {
            (AssignTarget::Name(name), AssignValue::Switch(sw)) => {
                self.emit_switch_assignment(out, name, declared, sw)
            }
            (AssignTarget::Name(name), AssignValue::Expr(expr)) => {
                self.emit_name_assignment(out, name, declared, expr, line)
            }
            (AssignTarget::DictKey { name, key }, AssignValue::Expr(expr)) => {
                let key_c = self.emit_expr(key)?;
                let (boxed, tag) = self.emit_boxed(expr)?;
                writeln!(
                    out,
                    "{}ahoy_map_put(&{}, {}, {}, {});",
                    self.pad(),
                    name,
                    key_c,
                    boxed,
                    tag
                )?;
                Ok(())
            }
            (AssignTarget::ObjectField { object, field }, AssignValue::Expr(expr)) => {
                let obj_ty = self.infer_type(object);
                let obj_c = self.emit_expr(object)?;
                match obj_ty {
                    AhoyType::Named(_) => {
                        let value_c = self.emit_expr(expr)?;
                        writeln!(out, "{}{}.{} = {};", self.pad(), obj_c, field, value_c)?;
                    }
                    _ => {
                        let (boxed, tag) = self.emit_boxed(expr)?;
                        writeln!(
                            out,
                            "{}ahoy_map_put(&{}, \"{}\", {}, {});",
                            self.pad(),
                            obj_c,
                            field,
                            boxed,
                            tag
                        )?;
                    }
                }
                Ok(())
            }
            (AssignTarget::Index { name, index }, AssignValue::Expr(expr)) => {
                let target_ty = self.var_type(name).cloned().unwrap_or(AhoyType::Int);
                let index_c = self.emit_expr(index)?;
                if target_ty.is_array() {
                    let (boxed, tag) = self.emit_boxed(expr)?;
                    writeln!(
                        out,
                        "{pad}{name}.data[{index_c}] = {boxed}; {name}.types[{index_c}] = {tag};",
                        pad = self.pad()
                    )?;
                } else {
                    let value_c = self.emit_expr(expr)?;
                    writeln!(out, "{}{}[{}] = {};", self.pad(), name, index_c, value_c)?;
                }
                Ok(())
            }
            (AssignTarget::Deref(name), AssignValue::Expr(expr)) => {
                let value_c = self.emit_expr(expr)?;
                writeln!(out, "{}*{} = {};", self.pad(), name, value_c)?;
                Ok(())
            }
            (AssignTarget::Member { object, field }, AssignValue::Expr(expr)) => {
                let obj_c = self.emit_expr(object)?;
                let value_c = self.emit_expr(expr)?;
                writeln!(out, "{}{}.{} = {};", self.pad(), obj_c, field, value_c)?;
                Ok(())
            }
            _ => Err(CodeGenError::Logic(format!(
                "at line {}: unsupported assignment form",
                line
            ))),
        }
    }

    fn emit_name_assignment(
        &mut self,
        out: &mut String,
        name: &str,
        declared: Option<&AhoyType>,
        expr: &Expr,
        _line: usize,
    ) -> Result<(), CodeGenError> {
        let ty = declared.cloned().unwrap_or_else(|| self.infer_type(expr));

        // Array literals honor the declared element type
        let value_c = match (expr, &ty) {
            (Expr::Array { elems, .. }, AhoyType::Array(Some(elem))) => {
                let elem = (**elem).clone();
                self.emit_array_literal(elems, Some(&elem))?
            }
            _ => self.emit_expr(expr)?,
        };

        if self.is_declaration(name) {
            writeln!(out, "{}{} {} = {};", self.pad(), ty.c_type(), name, value_c)?;
            self.declare_var(name, ty);
        } else {
            writeln!(out, "{}{} = {};", self.pad(), name, value_c)?;
        }

        // Remember dict-sourced values for the tag-aware print path
        if let Expr::DictKey { recv, key, .. } = expr {
            if let (Expr::Ident { name: dict, .. }, Expr::Str { text, .. }) =
                (recv.as_ref(), key.as_ref())
            {
                self.dict_sourced
                    .insert(name.to_string(), (dict.clone(), format!("\"{}\"", text)));
            }
        }
        Ok(())
    }

    fn emit_tuple_assignment(
        &mut self,
        out: &mut String,
        names: &[String],
        values: &[Expr],
        line: usize,
    ) -> Result<(), CodeGenError> {
        // Single call on the right: unpack its multi-return record.
        // Fewer returns than targets leaves the trailing names
        // undeclared; the C compiler reports any later use.
        if values.len() == 1 && names.len() > 1 {
            if let Expr::Call { name: fname, .. } = &values[0] {
                if fname == "read_json" {
                    return self.emit_read_json_unpack(out, names, &values[0]);
                }
                if self.info.user_functions.contains(fname) {
                    let returns = self
                        .info
                        .function_return_types
                        .get(fname)
                        .cloned()
                        .unwrap_or_default();
                    if returns.len() > 1 {
                        let tmp = self.fresh_temp();
                        let call_c = self.emit_expr(&values[0])?;
                        writeln!(
                            out,
                            "{}{}_return {} = {};",
                            self.pad(),
                            fname,
                            tmp,
                            call_c
                        )?;
                        for (idx, (target, ret_ty)) in
                            names.iter().zip(returns.iter()).enumerate()
                        {
                            let slot = format!("{}.ret{}", tmp, idx);
                            if self.is_declaration(target) {
                                writeln!(
                                    out,
                                    "{}{} {} = {};",
                                    self.pad(),
                                    ret_ty.c_type(),
                                    target,
                                    slot
                                )?;
                                self.declare_var(target, ret_ty.clone());
                            } else {
                                writeln!(out, "{}{} = {};", self.pad(), target, slot)?;
                            }
                        }
                        return Ok(());
                    }
                    // Single-return callee: first target only
                    let stmt = Stmt::Assignment {
                        target: AssignTarget::Name(names[0].clone()),
                        declared: None,
                        value: AssignValue::Expr(values[0].clone()),
                        line,
                    };
                    return self.emit_stmt(out, &stmt);
                }
            }
        }

        for (target, value) in names.iter().zip(values.iter()) {
            let stmt = Stmt::Assignment {
                target: AssignTarget::Name(target.clone()),
                declared: None,
                value: AssignValue::Expr(value.clone()),
                line,
            };
            self.emit_stmt(out, &stmt)?;
        }
        Ok(())
    }

    fn emit_read_json_unpack(
        &mut self,
        out: &mut String,
        names: &[String],
        call: &Expr,
    ) -> Result<(), CodeGenError> {
        let Expr::Call { args, .. } = call else {
            unreachable!("caller matched a call");
        };
        let path_arg = args.first().ok_or_else(|| {
            CodeGenError::Logic("read_json needs a path argument".to_string())
        })?;
        let path = self.emit_expr(path_arg)?;
        let tmp = self.fresh_temp();
        writeln!(
            out,
            "{}read_json_return {} = ahoy_read_json({});",
            self.pad(),
            tmp,
            path
        )?;
        let slots = [
            (AhoyType::Json, "ret0"),
            (AhoyType::Str, "ret1"),
        ];
        for (target, (ty, slot)) in names.iter().zip(slots.iter()) {
            if self.is_declaration(target) {
                writeln!(
                    out,
                    "{}{} {} = {}.{};",
                    self.pad(),
                    ty.c_type(),
                    target,
                    tmp,
                    slot
                )?;
                self.declare_var(target, ty.clone());
            } else {
                writeln!(out, "{}{} = {}.{};", self.pad(), target, tmp, slot)?;
            }
        }
        Ok(())
    }

    // ---- switch ---------------------------------------------------------

    /// Switch as a statement, or as the right side of an assignment
    /// when `assign_to` names the already-declared target.
    pub(super) fn emit_switch(
        &mut self,
        out: &mut String,
        sw: &SwitchStmt,
        assign_to: Option<&str>,
    ) -> Result<(), CodeGenError> {
        let scrut_ty = self.infer_type(&sw.scrutinee);
        if scrut_ty.is_string() {
            return self.emit_string_switch(out, sw, assign_to);
        }

        let scrut_c = self.emit_expr(&sw.scrutinee)?;
        writeln!(out, "{}switch ({}) {{", self.pad(), scrut_c)?;
        self.indent += 1;
        for case in &sw.cases {
            for label in &case.labels {
                match label {
                    CaseLabel::Value(v) => {
                        let v_c = self.emit_expr(v)?;
                        writeln!(out, "{}case {}:", self.pad(), v_c)?;
                    }
                    CaseLabel::Range(a, b) => {
                        let a_c = self.emit_expr(a)?;
                        let b_c = self.emit_expr(b)?;
                        writeln!(out, "{}case {} ... {}:", self.pad(), a_c, b_c)?;
                    }
                    CaseLabel::Default => {
                        writeln!(out, "{}default:", self.pad())?;
                    }
                }
            }
            writeln!(out, "{}{{", self.pad())?;
            self.emit_case_body(out, &case.body, assign_to)?;
            self.indent += 1;
            writeln!(out, "{}break;", self.pad())?;
            self.indent -= 1;
            writeln!(out, "{}}}", self.pad())?;
        }
        self.indent -= 1;
        writeln!(out, "{}}}", self.pad())?;
        Ok(())
    }

    /// C cannot switch on strings: chained strcmp if/else instead.
    fn emit_string_switch(
        &mut self,
        out: &mut String,
        sw: &SwitchStmt,
        assign_to: Option<&str>,
    ) -> Result<(), CodeGenError> {
        if sw.cases.is_empty() {
            return Ok(());
        }
        let tmp = self.fresh_temp();
        let scrut_c = self.emit_expr(&sw.scrutinee)?;
        writeln!(out, "{}const char* {} = {};", self.pad(), tmp, scrut_c)?;

        let mut first = true;
        let mut default_case: Option<&crate::ast::SwitchCase> = None;
        for case in &sw.cases {
            if case.labels.iter().any(|l| matches!(l, CaseLabel::Default)) {
                default_case = Some(case);
                continue;
            }
            let mut conds = Vec::new();
            for label in &case.labels {
                if let CaseLabel::Value(v) = label {
                    let v_c = self.emit_expr(v)?;
                    conds.push(format!("strcmp({}, {}) == 0", tmp, v_c));
                }
            }
            let keyword = if first { "if" } else { "} else if" };
            first = false;
            writeln!(out, "{}{} ({}) {{", self.pad(), keyword, conds.join(" || "))?;
            self.emit_case_body(out, &case.body, assign_to)?;
        }
        if let Some(case) = default_case {
            if first {
                writeln!(out, "{}{{", self.pad())?;
            } else {
                writeln!(out, "{}}} else {{", self.pad())?;
            }
            self.emit_case_body(out, &case.body, assign_to)?;
        }
        writeln!(out, "{}}}", self.pad())?;
        Ok(())
    }

    /// A case body; with `assign_to`, the final expression statement
    /// becomes an assignment to the switch target.
    fn emit_case_body(
        &mut self,
        out: &mut String,
        body: &[Stmt],
        assign_to: Option<&str>,
    ) -> Result<(), CodeGenError> {
        match assign_to {
            None => self.emit_block(out, body),
            Some(target) => {
                self.push_block_scope();
                self.indent += 1;
                let result: Result<(), CodeGenError> = (|| {
                    let split = body.len().saturating_sub(1);
                    for stmt in &body[..split] {
                        self.emit_stmt(out, stmt)?;
                    }
                    match body.last() {
                        Some(Stmt::Expr { expr, .. }) => {
                            let value_c = self.emit_expr(expr)?;
                            writeln!(out, "{}{} = {};", self.pad(), target, value_c)?;
                        }
                        Some(other) => self.emit_stmt(out, other)?,
                        None => {}
                    }
                    Ok(())
                })();
                self.indent -= 1;
                self.pop_block_scope();
                result
            }
        }
    }

    /// Assignment whose right side is a switch: declare the target,
    /// then assign it from every case.
    fn emit_switch_assignment(
        &mut self,
        out: &mut String,
        name: &str,
        declared: Option<&AhoyType>,
        sw: &SwitchStmt,
    ) -> Result<(), CodeGenError> {
        let ty = declared.cloned().unwrap_or_else(|| {
            sw.cases
                .first()
                .and_then(|c| c.body.last())
                .map(|stmt| match stmt {
                    Stmt::Expr { expr, .. } => self.infer_type(expr),
                    _ => AhoyType::Int,
                })
                .unwrap_or(AhoyType::Int)
        });
        if self.is_declaration(name) {
            writeln!(out, "{}{} {};", self.pad(), ty.c_type(), name)?;
            self.declare_var(name, ty);
        }
        self.emit_switch(out, sw, Some(name))
    }

    // ---- loops ----------------------------------------------------------

    fn emit_loop(&mut self, out: &mut String, l: &LoopStmt) -> Result<(), CodeGenError> {
        match l {
            LoopStmt::Infinite { body, .. } => {
                writeln!(out, "{}while (1) {{", self.pad())?;
                self.emit_loop_body(out, body, None)?;
                writeln!(out, "{}}}", self.pad())?;
                Ok(())
            }
            LoopStmt::Count {
                var, from, body, ..
            } => {
                let start = match from {
                    Some(e) => self.emit_expr(e)?,
                    None => "0".to_string(),
                };
                writeln!(
                    out,
                    "{}for (int {var} = {start}; ; {var}++) {{",
                    self.pad()
                )?;
                self.emit_loop_body_with_var(out, body, var)?;
                writeln!(out, "{}}}", self.pad())?;
                Ok(())
            }
            LoopStmt::Till {
                var,
                from,
                cond,
                body,
                ..
            } => match var {
                Some(var) => {
                    let start = match from {
                        Some(e) => self.emit_expr(e)?,
                        None => "0".to_string(),
                    };
                    // Declare the induction variable before the
                    // condition so the stop expression can see it
                    self.push_block_scope();
                    self.declare_var(var, AhoyType::Int);
                    let cond_c = self.emit_expr(cond)?;
                    writeln!(
                        out,
                        "{}for (int {var} = {start}; !({cond_c}); {var}++) {{",
                        self.pad()
                    )?;
                    self.loop_counters.push(var.clone());
                    let result = self.emit_loop_statements(out, body);
                    self.loop_counters.pop();
                    self.pop_block_scope();
                    result?;
                    writeln!(out, "{}}}", self.pad())?;
                    Ok(())
                }
                None => {
                    let cond_c = self.emit_expr(cond)?;
                    writeln!(out, "{}while (!({})) {{", self.pad(), cond_c)?;
                    self.emit_loop_body(out, body, None)?;
                    writeln!(out, "{}}}", self.pad())?;
                    Ok(())
                }
            },
            LoopStmt::Range {
                var,
                from,
                to,
                body,
                ..
            } => {
                let from_c = self.emit_expr(from)?;
                let to_c = self.emit_expr(to)?;
                writeln!(
                    out,
                    "{}for (int {var} = {from_c}; {var} < {to_c}; {var}++) {{",
                    self.pad()
                )?;
                self.emit_loop_body_with_var(out, body, var)?;
                writeln!(out, "{}}}", self.pad())?;
                Ok(())
            }
            LoopStmt::InArray {
                var,
                iterable,
                body,
                ..
            } => self.emit_array_loop(out, var, iterable, body),
            LoopStmt::InDict {
                key,
                value,
                iterable,
                body,
                ..
            } => self.emit_dict_loop(out, key, value, iterable, body),
        }
    }

    fn emit_loop_body(
        &mut self,
        out: &mut String,
        body: &[Stmt],
        counter: Option<&str>,
    ) -> Result<(), CodeGenError> {
        if let Some(counter) = counter {
            self.loop_counters.push(counter.to_string());
        }
        let result = self.emit_block(out, body);
        if counter.is_some() {
            self.loop_counters.pop();
        }
        result
    }

    /// Loop body whose induction variable is visible inside.
    fn emit_loop_body_with_var(
        &mut self,
        out: &mut String,
        body: &[Stmt],
        var: &str,
    ) -> Result<(), CodeGenError> {
        self.push_block_scope();
        self.declare_var(var, AhoyType::Int);
        self.loop_counters.push(var.to_string());
        let result = self.emit_loop_statements(out, body);
        self.loop_counters.pop();
        self.pop_block_scope();
        result
    }

    /// Body statements at one deeper indent, without opening another
    /// variable scope (the caller already did).
    fn emit_loop_statements(&mut self, out: &mut String, body: &[Stmt]) -> Result<(), CodeGenError> {
        self.indent += 1;
        let result: Result<(), CodeGenError> = (|| {
            for stmt in body {
                self.emit_stmt(out, stmt)?;
            }
            Ok(())
        })();
        self.indent -= 1;
        result
    }

    fn emit_array_loop(
        &mut self,
        out: &mut String,
        var: &str,
        iterable: &Expr,
        body: &[Stmt],
    ) -> Result<(), CodeGenError> {
        let iter_ty = self.infer_type(iterable);
        let iter_c = self.emit_expr(iterable)?;
        let idx = self.fresh_temp();

        self.push_block_scope();
        if iter_ty.is_string() {
            writeln!(
                out,
                "{}for (int {idx} = 0; {iter_c}[{idx}] != '\\0'; {idx}++) {{",
                self.pad()
            )?;
            self.declare_var(var, AhoyType::Char);
            self.indent += 1;
            writeln!(out, "{}char {} = {}[{}];", self.pad(), var, iter_c, idx)?;
            self.indent -= 1;
        } else {
            let elem_ty = match iterable {
                Expr::Ident { name, .. } => self
                    .array_element_types
                    .get(name)
                    .cloned()
                    .unwrap_or(AhoyType::Int),
                _ => AhoyType::Int,
            };
            writeln!(
                out,
                "{}for (int {idx} = 0; {idx} < {iter_c}.length; {idx}++) {{",
                self.pad()
            )?;
            self.declare_var(var, elem_ty.clone());
            self.indent += 1;
            let slot = format!("{}.data[{}]", iter_c, idx);
            writeln!(
                out,
                "{}{} {} = {};",
                self.pad(),
                elem_ty.c_type(),
                var,
                Self::unbox(&slot, &elem_ty)
            )?;
            self.indent -= 1;
        }
        self.loop_counters.push(idx.clone());
        let result = self.emit_loop_statements(out, body);
        self.loop_counters.pop();
        self.pop_block_scope();
        result?;
        writeln!(out, "{}}}", self.pad())?;
        Ok(())
    }

    /// Hash iteration traverses the bucket array and each bucket's
    /// chain, materializing key/value locals.
    fn emit_dict_loop(
        &mut self,
        out: &mut String,
        key: &str,
        value: &str,
        iterable: &Expr,
        body: &[Stmt],
    ) -> Result<(), CodeGenError> {
        let iter_c = self.emit_expr(iterable)?;
        let bucket = self.fresh_temp();
        let entry = self.fresh_temp();

        writeln!(
            out,
            "{}for (int {bucket} = 0; {bucket} < AHOY_MAP_BUCKETS; {bucket}++) {{",
            self.pad()
        )?;
        self.indent += 1;
        writeln!(
            out,
            "{}for (HashMapEntry* {entry} = {iter_c}.buckets[{bucket}]; {entry}; {entry} = {entry}->next) {{",
            self.pad()
        )?;

        self.push_block_scope();
        self.declare_var(key, AhoyType::Str);
        self.declare_var(value, AhoyType::Float);
        self.dict_entry_vars
            .insert(value.to_string(), entry.clone());
        self.indent += 1;
        writeln!(out, "{}char* {} = {}->key;", self.pad(), key, entry)?;
        writeln!(
            out,
            "{}double {} = ahoy_entry_number({});",
            self.pad(),
            value,
            entry
        )?;
        self.indent -= 1;
        let result = self.emit_loop_statements(out, body);
        self.dict_entry_vars.remove(value);
        self.pop_block_scope();
        result?;

        writeln!(out, "{}}}", self.pad())?;
        self.indent -= 1;
        writeln!(out, "{}}}", self.pad())?;
        Ok(())
    }

    // ---- return ---------------------------------------------------------

    /// Deferred statements run LIFO before every return.
    pub(super) fn flush_deferred(&mut self, out: &mut String) -> Result<(), CodeGenError> {
        let deferred: Vec<Stmt> = self.deferred.clone();
        for stmt in deferred.iter().rev() {
            writeln!(out, "{}{{", self.pad())?;
            self.indent += 1;
            self.emit_stmt(out, stmt)?;
            self.indent -= 1;
            writeln!(out, "{}}}", self.pad())?;
        }
        Ok(())
    }

    fn emit_return(&mut self, out: &mut String, values: &[Expr]) -> Result<(), CodeGenError> {
        self.flush_deferred(out)?;
        let fname = self.current_function.clone().unwrap_or_default();
        let returns = self
            .info
            .function_return_types
            .get(&fname)
            .cloned()
            .unwrap_or_default();

        if returns.len() > 1 {
            let mut inits = Vec::new();
            for (idx, value) in values.iter().enumerate() {
                let value_c = self.emit_expr(value)?;
                inits.push(format!(".ret{} = {}", idx, value_c));
            }
            writeln!(
                out,
                "{}return ({}_return){{ {} }};",
                self.pad(),
                fname,
                inits.join(", ")
            )?;
        } else if let Some(value) = values.first() {
            let value_c = self.emit_expr(value)?;
            writeln!(out, "{}return {};", self.pad(), value_c)?;
        } else {
            writeln!(out, "{}return;", self.pad())?;
        }
        Ok(())
    }

    // ---- print ----------------------------------------------------------

    /// `print` with a leading literal containing `{}` or `%` uses it as
    /// the format verbatim; otherwise a format is synthesized from the
    /// argument types with single-space separators and a trailing
    /// newline. Containers, structs, colors, vectors and JSON go
    /// through their helpers.
    pub(super) fn emit_print(&mut self, out: &mut String, args: &[Expr]) -> Result<(), CodeGenError> {
        if args.is_empty() {
            writeln!(out, "{}printf(\"\\n\");", self.pad())?;
            return Ok(());
        }
        if let Expr::Str { text, .. } = &args[0] {
            if text.contains("{}") || text.contains('%') {
                let (format, rendered) = self.build_print_format(args)?;
                write!(out, "{}printf(\"{}\"", self.pad(), format)?;
                for arg in &rendered {
                    write!(out, ", {}", arg)?;
                }
                writeln!(out, ");")?;
                return Ok(());
            }
        }

        // Synthesized mode
        let mut pending_format = String::new();
        let mut pending_args: Vec<String> = Vec::new();
        let mut flush =
            |cg: &CodeGen, out: &mut String, fmt: &mut String, args: &mut Vec<String>| -> Result<(), CodeGenError> {
                if fmt.is_empty() && args.is_empty() {
                    return Ok(());
                }
                write!(out, "{}printf(\"{}\"", cg.pad(), fmt)?;
                for a in args.iter() {
                    write!(out, ", {}", a)?;
                }
                writeln!(out, ");")?;
                fmt.clear();
                args.clear();
                Ok(())
            };

        for (idx, argx) in args.iter().enumerate() {
            if idx > 0 {
                pending_format.push(' ');
            }
            // Tag-aware path for dict-sourced locals
            if let Expr::Ident { name, .. } = argx {
                if let Some(entry) = self.dict_entry_vars.get(name).cloned() {
                    flush(self, out, &mut pending_format, &mut pending_args)?;
                    writeln!(
                        out,
                        "{}ahoy_print_value({e}->value, {e}->type);",
                        self.pad(),
                        e = entry
                    )?;
                    continue;
                }
                if let Some((dict, key)) = self.dict_sourced.get(name).cloned() {
                    flush(self, out, &mut pending_format, &mut pending_args)?;
                    writeln!(
                        out,
                        "{}ahoy_map_print_value(&{}, {});",
                        self.pad(),
                        dict,
                        key
                    )?;
                    continue;
                }
            }
            let ty = self.infer_type(argx);
            match &ty {
                AhoyType::Array(_) => {
                    flush(self, out, &mut pending_format, &mut pending_args)?;
                    self.uses_print_array = true;
                    self.emit_container_print(out, argx, "AhoyArray", "ahoy_print_array")?;
                }
                AhoyType::Dict(_) => {
                    flush(self, out, &mut pending_format, &mut pending_args)?;
                    self.uses_print_dict = true;
                    self.emit_container_print(out, argx, "HashMap", "ahoy_print_dict")?;
                }
                AhoyType::Named(struct_name) if self.structs.contains_key(struct_name) => {
                    flush(self, out, &mut pending_format, &mut pending_args)?;
                    self.printed_structs.insert(struct_name.clone());
                    let helper = format!("ahoy_print_struct_{}", struct_name);
                    self.emit_container_print(out, argx, &struct_name.clone(), &helper)?;
                }
                AhoyType::Color => {
                    let value = self.emit_expr(argx)?;
                    pending_format.push_str("%s");
                    pending_args.push(format!("ahoy_color_to_string({})", value));
                }
                AhoyType::Vector2 => {
                    let value = self.emit_expr(argx)?;
                    pending_format.push_str("%s");
                    pending_args.push(format!("ahoy_vector2_to_string({})", value));
                }
                AhoyType::Json => {
                    let value = self.emit_expr(argx)?;
                    pending_format.push_str("%s");
                    pending_args.push(format!("ahoy_json_stringify({})", value));
                }
                AhoyType::Bool => {
                    let value = self.emit_expr(argx)?;
                    pending_format.push_str("%s");
                    pending_args.push(format!("(({}) ? \"true\" : \"false\")", value));
                }
                other => {
                    // F-strings inline their placeholders
                    if let Expr::FString { text, .. } = argx {
                        let text = text.clone();
                        let (fmt, rendered) = self.fstring_format(&text)?;
                        pending_format.push_str(&fmt);
                        pending_args.extend(rendered);
                    } else {
                        let value = self.emit_expr(argx)?;
                        pending_format.push_str(other.format_spec());
                        pending_args.push(value);
                    }
                }
            }
        }
        pending_format.push_str("\\n");
        flush(self, out, &mut pending_format, &mut pending_args)?;
        Ok(())
    }

    /// Print a container through its helper; non-lvalue receivers get a
    /// block-local temporary.
    fn emit_container_print(
        &mut self,
        out: &mut String,
        expr: &Expr,
        c_type: &str,
        helper: &str,
    ) -> Result<(), CodeGenError> {
        match expr {
            Expr::Ident { .. } | Expr::Member { .. } => {
                let value = self.emit_expr(expr)?;
                writeln!(out, "{}{}(&{});", self.pad(), helper, value)?;
            }
            _ => {
                let tmp = self.fresh_temp();
                let value = self.emit_expr(expr)?;
                writeln!(
                    out,
                    "{}{{ {} {} = {}; {}(&{}); }}",
                    self.pad(),
                    c_type,
                    tmp,
                    value,
                    helper,
                    tmp
                )?;
            }
        }
        Ok(())
    }

    /// Format-mode print: the leading literal is the format; `{}` slots
    /// take the inferred conversion of each following argument.
    fn build_print_format(&mut self, args: &[Expr]) -> Result<(String, Vec<String>), CodeGenError> {
        let Expr::Str { text, .. } = &args[0] else {
            unreachable!("caller checked the literal head");
        };
        let text = text.clone();
        let rest = &args[1..];
        if text.contains("{}") {
            let mut format = String::new();
            let mut rendered = Vec::new();
            let mut remaining = rest.iter();
            let mut pieces = text.split("{}").peekable();
            while let Some(piece) = pieces.next() {
                format.push_str(piece);
                if pieces.peek().is_some() {
                    if let Some(arg) = remaining.next() {
                        let ty = self.infer_type(arg);
                        format.push_str(ty.format_spec());
                        let value = self.emit_expr(arg)?;
                        rendered.push(match ty {
                            AhoyType::Bool => format!("(({}) ? \"true\" : \"false\")", value),
                            _ => value,
                        });
                    }
                }
            }
            return Ok((format, rendered));
        }
        let mut rendered = Vec::new();
        for arg in rest {
            rendered.push(self.emit_expr(arg)?);
        }
        Ok((text, rendered))
    }
}
