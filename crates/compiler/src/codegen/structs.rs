//! User struct emission
//!
//! Structs become plain C typedef structs. Nested `type` variants are
//! flattened: a variant repeats its parent's fields before its own.
//! Field defaults are rendered once and reused by object literals that
//! leave the field out.

use super::state::FieldInfo;
use super::{CodeGen, CodeGenError};
use crate::ast::StructDef;
use crate::types::AhoyType;
use std::fmt::Write as _;

impl CodeGen {
    pub(super) fn emit_struct_declaration(
        &mut self,
        out: &mut String,
        s: &StructDef,
    ) -> Result<(), CodeGenError> {
        self.register_struct(s, &[])?;
        self.write_struct_tree(out, s)
    }

    fn write_struct_tree(&mut self, out: &mut String, s: &StructDef) -> Result<(), CodeGenError> {
        self.write_struct(out, s)?;
        for variant in &s.variants {
            self.write_struct_tree(out, variant)?;
        }
        Ok(())
    }

    /// Record fields (parents first for variants) so literals and
    /// member access can resolve them.
    fn register_struct(
        &mut self,
        s: &StructDef,
        inherited: &[FieldInfo],
    ) -> Result<(), CodeGenError> {
        let mut fields: Vec<FieldInfo> = inherited.to_vec();
        for field in &s.fields {
            let default_c = match &field.default {
                Some(expr) => Some(self.emit_expr(expr)?),
                None => None,
            };
            fields.push(FieldInfo {
                name: field.name.clone(),
                c_type: field.ty.c_type(),
                ahoy: field.ty.clone(),
                default_c,
            });
        }
        self.structs.insert(s.name.clone(), fields.clone());
        self.struct_order.push(s.name.clone());
        for variant in &s.variants {
            self.register_struct(variant, &fields)?;
        }
        Ok(())
    }

    fn write_struct(&mut self, out: &mut String, s: &StructDef) -> Result<(), CodeGenError> {
        let fields = self.structs.get(&s.name).cloned().unwrap_or_default();
        writeln!(out, "typedef struct {{")?;
        for field in &fields {
            writeln!(out, "    {} {};", field.c_type, field.name)?;
        }
        writeln!(out, "}} {};", s.name)?;
        writeln!(out)?;
        Ok(())
    }

    /// Per-type printer, emitted only for struct types that reach
    /// `print`.
    pub(super) fn emit_struct_print_helper(
        &self,
        out: &mut String,
        name: &str,
    ) -> Result<(), CodeGenError> {
        let Some(fields) = self.structs.get(name) else {
            return Ok(());
        };
        writeln!(
            out,
            "static void ahoy_print_struct_{}({}* s) {{",
            name, name
        )?;
        let mut format = String::new();
        let mut args = Vec::new();
        write!(format, "{}{{", name)?;
        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                format.push_str(", ");
            }
            write!(format, "{}: {}", field.name, field.ahoy.format_spec())?;
            match field.ahoy {
                AhoyType::Bool => args.push(format!(
                    "(s->{} ? \"true\" : \"false\")",
                    field.name
                )),
                _ => args.push(format!("s->{}", field.name)),
            }
        }
        format.push('}');
        write!(out, "    printf(\"{}\"", format)?;
        for arg in &args {
            write!(out, ", {}", arg)?;
        }
        writeln!(out, ");")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse;

    #[test]
    fn test_nested_variant_inherits_parent_fields() {
        let source = "\
struct Point
    x: int
    y: int
    type Point3
        z: int
";
        let program = parse(source).unwrap();
        let info = analyze(&program);
        let mut cg = CodeGen::new(info);
        let mut out = String::new();
        for stmt in &program.statements {
            if let crate::ast::Stmt::Struct(s) = stmt {
                cg.emit_struct_declaration(&mut out, s).unwrap();
            }
        }
        assert!(out.contains("} Point;"));
        assert!(out.contains("} Point3;"));
        // The variant carries x and y before z
        let p3 = out.find("} Point;").unwrap();
        let tail = &out[p3..];
        assert!(tail.contains("int x;"));
        assert!(tail.contains("int z;"));
        assert_eq!(cg.structs["Point3"].len(), 3);
    }

    #[test]
    fn test_field_defaults_recorded() {
        let source = "struct Config\n    retries: int: 3\n    host: string\n";
        let program = parse(source).unwrap();
        let info = analyze(&program);
        let mut cg = CodeGen::new(info);
        let mut out = String::new();
        for stmt in &program.statements {
            if let crate::ast::Stmt::Struct(s) = stmt {
                cg.emit_struct_declaration(&mut out, s).unwrap();
            }
        }
        assert_eq!(cg.structs["Config"][0].default_c.as_deref(), Some("3"));
        assert!(cg.structs["Config"][1].default_c.is_none());
    }

    #[test]
    fn test_print_helper_formats_fields() {
        let source = "struct Point\n    x: int\n    y: float\n";
        let program = parse(source).unwrap();
        let info = analyze(&program);
        let mut cg = CodeGen::new(info);
        let mut decls = String::new();
        for stmt in &program.statements {
            if let crate::ast::Stmt::Struct(s) = stmt {
                cg.emit_struct_declaration(&mut decls, s).unwrap();
            }
        }
        let mut out = String::new();
        cg.emit_struct_print_helper(&mut out, "Point").unwrap();
        assert!(out.contains("ahoy_print_struct_Point"));
        assert!(out.contains("Point{x: %d, y: %g}"));
    }
}
