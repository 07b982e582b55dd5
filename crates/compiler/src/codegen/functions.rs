//! Function emission
//!
//! Every user function becomes one C function; `main` is renamed
//! `ahoy_main` and wrapped by the generated C `main`. A function whose
//! declared or inferred return is a tuple gets a `NAME_return` record
//! struct and returns an initialized record literal. Deferred
//! statements flush LIFO at the natural end of the body (returns flush
//! their own copies).

use super::{CodeGen, CodeGenError};
use crate::ast::{FunctionDef, Stmt};
use crate::types::AhoyType;
use std::fmt::Write as _;

impl CodeGen {
    /// The C return type of a user function.
    pub(super) fn return_c_type(&self, name: &str) -> String {
        let returns = self
            .info
            .function_return_types
            .get(name)
            .cloned()
            .unwrap_or_default();
        match returns.len() {
            0 => "void".to_string(),
            1 => returns[0].c_type(),
            _ => format!("{}_return", name),
        }
    }

    /// `NAME_return` record for a tuple-returning function.
    pub(super) fn emit_multi_return_struct(
        &self,
        out: &mut String,
        name: &str,
    ) -> Result<(), CodeGenError> {
        let returns = self
            .info
            .function_return_types
            .get(name)
            .cloned()
            .unwrap_or_default();
        if returns.len() < 2 {
            return Ok(());
        }
        writeln!(out, "typedef struct {{")?;
        for (idx, ty) in returns.iter().enumerate() {
            writeln!(out, "    {} ret{};", ty.c_type(), idx)?;
        }
        writeln!(out, "}} {}_return;", name)?;
        writeln!(out)?;
        Ok(())
    }

    /// C signature text, shared by forward declarations and bodies.
    pub(super) fn function_signature(&self, f: &FunctionDef) -> String {
        let ret = self.return_c_type(&f.name);
        let c_name = Self::c_function_name(&f.name);
        if f.params.is_empty() {
            return format!("{} {}(void)", ret, c_name);
        }
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| {
                let ty = p.ty.clone().unwrap_or(AhoyType::Generic);
                format!("{} {}", ty.c_type(), p.name)
            })
            .collect();
        format!("{} {}({})", ret, c_name, params.join(", "))
    }

    pub(super) fn emit_function(
        &mut self,
        out: &mut String,
        f: &FunctionDef,
    ) -> Result<(), CodeGenError> {
        self.enter_function(&f.name);
        for param in &f.params {
            let ty = param.ty.clone().unwrap_or(AhoyType::Generic);
            if let AhoyType::Array(Some(elem)) = &ty {
                self.array_element_types
                    .insert(param.name.clone(), (**elem).clone());
            }
            self.function_vars.insert(param.name.clone(), ty);
        }

        writeln!(out, "{} {{", self.function_signature(f))?;
        let result: Result<(), CodeGenError> = (|| {
            for stmt in &f.body {
                self.emit_stmt(out, stmt)?;
            }
            // Implicit exit point
            if !matches!(f.body.last(), Some(Stmt::Return { .. })) {
                self.flush_deferred(out)?;
            }
            Ok(())
        })();
        writeln!(out, "}}")?;
        writeln!(out)?;
        self.leave_function();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse;

    fn generator_for(source: &str) -> (CodeGen, crate::ast::Program) {
        let program = parse(source).unwrap();
        let info = analyze(&program);
        (CodeGen::new(info), program)
    }

    #[test]
    fn test_multi_return_struct_emitted() {
        let (cg, _) =
            generator_for("func divmod |a: int, b: int| int, int\n    return a / b, a % b\n");
        let mut out = String::new();
        cg.emit_multi_return_struct(&mut out, "divmod").unwrap();
        assert!(out.contains("typedef struct {"));
        assert!(out.contains("int ret0;"));
        assert!(out.contains("int ret1;"));
        assert!(out.contains("} divmod_return;"));
    }

    #[test]
    fn test_single_return_has_no_record() {
        let (cg, _) = generator_for("func inc |x: int| int\n    return x + 1\n");
        let mut out = String::new();
        cg.emit_multi_return_struct(&mut out, "inc").unwrap();
        assert!(out.is_empty());
        assert_eq!(cg.return_c_type("inc"), "int");
    }

    #[test]
    fn test_signature_renames_main() {
        let (cg, program) = generator_for("func main ||\n    x: 1\n");
        let f = program.find_function("main").unwrap();
        assert_eq!(cg.function_signature(f), "void ahoy_main(void)");
    }

    #[test]
    fn test_generic_params_are_pointer_wide() {
        let (cg, program) = generator_for("func poke |target|\n    print|target|\n");
        let f = program.find_function("poke").unwrap();
        assert_eq!(cg.function_signature(f), "void poke(intptr_t target)");
    }

    #[test]
    fn test_body_returns_record_literal() {
        let (mut cg, program) =
            generator_for("func divmod |a: int, b: int| int, int\n    return a / b, a % b\n");
        let f = program.find_function("divmod").unwrap();
        let mut out = String::new();
        cg.emit_function(&mut out, f).unwrap();
        assert!(out.contains("divmod_return divmod(int a, int b) {"));
        assert!(out.contains("return (divmod_return){ .ret0 = (a / b), .ret1 = (a % b) };"));
    }

    #[test]
    fn test_deferred_statements_flush_in_reverse() {
        let source = "\
func work ||
    defer print|\"first registered\"|
    defer print|\"second registered\"|
    x: 1
";
        let (mut cg, program) = generator_for(source);
        let f = program.find_function("work").unwrap();
        let mut out = String::new();
        cg.emit_function(&mut out, f).unwrap();
        let second = out.find("second registered").unwrap();
        let first = out.find("first registered").unwrap();
        assert!(second < first, "defers must flush LIFO:\n{}", out);
    }
}
