//! Program code generation
//!
//! Drives the passes over the AST and assembles the final C translation
//! unit in fixed order: includes (import order preserved), runtime core,
//! conditional runtime helpers, enum declarations, user structs and
//! their printers, multi-return records, user function forward
//! declarations, function bodies, then `main`.
//!
//! `main` calls the array/dict enum initializers, runs any top-level
//! statements, then calls `ahoy_main` when the program defines `main`.

use super::runtime;
use super::{CodeGen, CodeGenError};
use crate::ast::{AssignTarget, AssignValue, Expr, Program, Stmt};
use crate::types::AhoyType;
use std::fmt::Write as _;

impl CodeGen {
    /// Generate the complete C source for a program.
    pub fn generate(&mut self, program: &Program) -> Result<String, CodeGenError> {
        // Pass 1: declarations fill the symbol tables and their buffers
        let mut enum_decls = String::new();
        let mut struct_decls = String::new();
        let mut globals = String::new();
        let mut runtime_const_inits: Vec<String> = Vec::new();

        self.indent = 0;
        for stmt in &program.statements {
            match stmt {
                Stmt::Import {
                    path, namespace, ..
                } => self.process_import(path, namespace.as_deref()),
                Stmt::Enum(e) => self.emit_enum_declaration(&mut enum_decls, e)?,
                Stmt::Struct(s) => self.emit_struct_declaration(&mut struct_decls, s)?,
                Stmt::ConstDecl { name, value, line } => {
                    self.register_constant(name, *line)?;
                    let ty = self.infer_type(value);
                    if is_static_initializer(value) {
                        let value_c = self.emit_expr(value)?;
                        writeln!(
                            globals,
                            "static const {} {} = {};",
                            ty.c_type(),
                            name,
                            value_c
                        )?;
                    } else {
                        writeln!(globals, "static {} {};", ty.c_type(), name)?;
                        let value_c = self.emit_expr(value)?;
                        runtime_const_inits.push(format!("{} = {};", name, value_c));
                    }
                    self.declare_var(name, ty);
                }
                _ => {}
            }
        }

        // Pass 2: top-level variables become C globals so function
        // bodies can reach them; their initializers run in main
        self.pre_declare_top_level(program, &mut globals)?;

        // Pass 3: function bodies
        let mut bodies = String::new();
        for f in program.functions() {
            self.emit_function(&mut bodies, f)?;
        }

        // Pass 4: top-level statements into main
        let mut main_body = String::new();
        self.indent = 1;
        self.deferred.clear();
        for stmt in &program.statements {
            match stmt {
                Stmt::Function(_)
                | Stmt::Struct(_)
                | Stmt::Enum(_)
                | Stmt::Import { .. }
                | Stmt::ConstDecl { .. } => {}
                other => self.emit_stmt(&mut main_body, other)?,
            }
        }
        self.flush_deferred(&mut main_body)?;

        // Supporting sections
        let mut records = String::new();
        for f in program.functions() {
            self.emit_multi_return_struct(&mut records, &f.name)?;
        }

        let mut forward_decls = String::new();
        for f in program.functions() {
            writeln!(forward_decls, "{};", self.function_signature(f))?;
        }

        let mut struct_printers = String::new();
        for name in self.struct_order.clone() {
            if self.printed_structs.contains(&name) {
                self.emit_struct_print_helper(&mut struct_printers, &name)?;
            }
        }

        self.assemble(
            &enum_decls,
            &struct_decls,
            &struct_printers,
            &records,
            &globals,
            &forward_decls,
            &bodies,
            &main_body,
            &runtime_const_inits,
        )
    }

    /// Record an import: ordered include line plus namespace routing.
    fn process_import(&mut self, path: &str, namespace: Option<&str>) {
        let line = if path.starts_with('/') || path.starts_with('.') {
            format!("#include \"{}\"", path)
        } else {
            format!("#include <{}>", path)
        };
        if !self.includes.contains(&line) {
            self.includes.push(line);
        }
        if let Some(ns) = namespace {
            self.c_namespaces.entry(ns.to_string()).or_default();
        }
    }

    /// Register externally discovered C function names (header scan).
    pub fn register_c_functions(
        &mut self,
        namespace: Option<&str>,
        names: impl IntoIterator<Item = (String, String)>,
    ) {
        match namespace {
            Some(ns) => {
                let table = self.c_namespaces.entry(ns.to_string()).or_default();
                table.extend(names);
            }
            None => self.c_function_names.extend(names),
        }
    }

    fn pre_declare_top_level(
        &mut self,
        program: &Program,
        globals: &mut String,
    ) -> Result<(), CodeGenError> {
        for stmt in &program.statements {
            match stmt {
                Stmt::Assignment {
                    target: AssignTarget::Name(name),
                    declared,
                    value,
                    ..
                } => {
                    if !self.is_declaration(name) {
                        continue;
                    }
                    let ty = match (declared, value) {
                        (Some(ty), _) => ty.clone(),
                        (None, AssignValue::Expr(expr)) => self.infer_type(expr),
                        (None, AssignValue::Switch(sw)) => sw
                            .cases
                            .first()
                            .and_then(|c| c.body.last())
                            .map(|s| match s {
                                Stmt::Expr { expr, .. } => self.infer_type(expr),
                                _ => AhoyType::Int,
                            })
                            .unwrap_or(AhoyType::Int),
                    };
                    writeln!(globals, "static {} {};", ty.c_type(), name)?;
                    self.declare_var(name, ty);
                }
                Stmt::TupleAssignment { names, values, .. } => {
                    let slot_types = self.tuple_slot_types(names, values);
                    for (name, ty) in names.iter().zip(slot_types) {
                        if !self.is_declaration(name) {
                            continue;
                        }
                        writeln!(globals, "static {} {};", ty.c_type(), name)?;
                        self.declare_var(name, ty);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Types bound by a tuple assignment, honoring multi-return calls.
    fn tuple_slot_types(&self, names: &[String], values: &[Expr]) -> Vec<AhoyType> {
        if values.len() == 1 && names.len() > 1 {
            if let Expr::Call { name: fname, .. } = &values[0] {
                if fname == "read_json" {
                    return vec![AhoyType::Json, AhoyType::Str];
                }
                if let Some(returns) = self.info.function_return_types.get(fname) {
                    return returns.clone();
                }
            }
        }
        values.iter().map(|v| self.infer_type(v)).collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &mut self,
        enum_decls: &str,
        struct_decls: &str,
        struct_printers: &str,
        records: &str,
        globals: &str,
        forward_decls: &str,
        bodies: &str,
        main_body: &str,
        runtime_const_inits: &[String],
    ) -> Result<String, CodeGenError> {
        let mut out = String::new();

        // Includes: fixed preamble, then user imports in source order
        for header in ["stdio.h", "stdlib.h", "string.h", "stdbool.h", "stdint.h"] {
            writeln!(out, "#include <{}>", header)?;
        }
        if self.uses_assert {
            writeln!(out, "#include <assert.h>")?;
        }
        for include in &self.includes {
            writeln!(out, "{}", include)?;
        }
        writeln!(out)?;

        // Runtime core: tags and the hash map are unconditional
        writeln!(out, "{}", runtime::VALUE_CORE)?;
        writeln!(out, "{}", runtime::HASHMAP_CORE)?;

        let needs_arrays = self.info.use_arrays
            || self.uses_print_array
            || ["keys", "values", "has_all"]
                .iter()
                .any(|m| self.info.dict_methods.contains(*m))
            || self.info.string_methods.contains("split");
        if needs_arrays {
            writeln!(out, "{}", runtime::ARRAY_CORE)?;
            runtime::emit_helpers(&mut out, &runtime::ARRAY_HELPERS, &self.info.array_methods)?;
        }
        runtime::emit_helpers(&mut out, &runtime::DICT_HELPERS, &self.info.dict_methods)?;
        runtime::emit_helpers(&mut out, &runtime::STRING_HELPERS, &self.info.string_methods)?;

        if self.uses_color {
            writeln!(out, "{}", runtime::COLOR_CORE)?;
        }
        if self.uses_vector2 {
            writeln!(out, "{}", runtime::VECTOR2_CORE)?;
        }
        if self.info.use_json {
            writeln!(out, "{}", runtime::JSON_RUNTIME)?;
        }
        if self.uses_print_array {
            writeln!(out, "{}", runtime::PRINT_ARRAY_HELPER)?;
        }
        if self.uses_print_dict {
            writeln!(out, "{}", runtime::PRINT_DICT_HELPER)?;
        }

        // Type declarations, records, globals, forward decls, bodies
        out.push_str(enum_decls);
        out.push_str(struct_decls);
        out.push_str(struct_printers);
        out.push_str(records);
        if !globals.is_empty() {
            out.push_str(globals);
            writeln!(out)?;
        }
        out.push_str(forward_decls);
        writeln!(out)?;
        out.push_str(bodies);

        // main: enum init, top-level statements, ahoy_main
        writeln!(out, "int main(void) {{")?;
        for init in &self.enum_inits {
            writeln!(out, "    {}();", init)?;
        }
        for init in runtime_const_inits {
            writeln!(out, "    {}", init)?;
        }
        out.push_str(main_body);
        let main_returns_int = self.info.has_main
            && self
                .info
                .function_return_types
                .get("main")
                .is_some_and(|r| r.len() == 1 && r[0] == AhoyType::Int);
        if main_returns_int {
            writeln!(out, "    return ahoy_main();")?;
        } else {
            if self.info.has_main {
                writeln!(out, "    ahoy_main();")?;
            }
            writeln!(out, "    return 0;")?;
        }
        writeln!(out, "}}")?;

        Ok(out)
    }
}

/// Values C will accept as a static initializer.
fn is_static_initializer(expr: &Expr) -> bool {
    match expr {
        Expr::Number { .. } | Expr::Str { .. } | Expr::CharLit { .. } | Expr::Bool { .. } => true,
        Expr::Unary {
            op: crate::ast::UnOp::Neg,
            operand,
            ..
        } => is_static_initializer(operand),
        _ => false,
    }
}
