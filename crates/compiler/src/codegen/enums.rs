//! Enum emission
//!
//! Five strategies, chosen by the declared (or derived) backing type:
//!
//! - `int`: a C enum of `Name_member` constants plus a companion struct
//!   instance so `Name.member` works in expressions, and a name printer.
//! - `string` / `float` / `color` / `vector2`: a struct typedef with one
//!   field per member and a single global instance initialized from the
//!   declared values; `mut` members drop `const`.
//! - `array` / `dict`: a struct of pointers whose storage is filled by
//!   an init function called at program start.
//! - mixed/custom: per-member field types from the literal values,
//!   recorded so the `.type` probe answers correctly.

use super::{CodeGen, CodeGenError};
use crate::ast::{EnumDef, Expr};
use crate::types::AhoyType;
use std::fmt::Write as _;

impl CodeGen {
    pub(super) fn emit_enum_declaration(
        &mut self,
        out: &mut String,
        e: &EnumDef,
    ) -> Result<(), CodeGenError> {
        let backing = e.backing.clone().unwrap_or_else(|| derive_backing(e));
        self.enums.insert(
            e.name.clone(),
            e.members.iter().map(|m| m.name.clone()).collect(),
        );
        self.enum_types.insert(e.name.clone(), backing.clone());

        match backing {
            AhoyType::Int => self.emit_int_enum(out, e),
            AhoyType::Str => self.emit_value_enum(out, e, &AhoyType::Str),
            AhoyType::Float => self.emit_value_enum(out, e, &AhoyType::Float),
            AhoyType::Color => {
                self.uses_color = true;
                self.emit_value_enum(out, e, &AhoyType::Color)
            }
            AhoyType::Vector2 => {
                self.uses_vector2 = true;
                self.emit_value_enum(out, e, &AhoyType::Vector2)
            }
            AhoyType::Array(_) => self.emit_container_enum(out, e, true),
            AhoyType::Dict(_) => self.emit_container_enum(out, e, false),
            _ => self.emit_mixed_enum(out, e),
        }
    }

    /// `typedef enum` constants plus a companion struct of int values.
    fn emit_int_enum(&mut self, out: &mut String, e: &EnumDef) -> Result<(), CodeGenError> {
        let mut values = Vec::new();
        let mut next = 0i64;
        for member in &e.members {
            let value = match &member.value {
                Some(Expr::Number { text, .. }) => text.parse::<i64>().unwrap_or(next),
                _ => next,
            };
            next = value + 1;
            values.push((member.name.clone(), value));
            self.enum_member_types
                .insert(format!("{}.{}", e.name, member.name), AhoyType::Int);
        }

        writeln!(out, "typedef enum {{")?;
        for (name, value) in &values {
            writeln!(out, "    {}_{} = {},", e.name, name, value)?;
        }
        writeln!(out, "}} {}_enum;", e.name)?;
        writeln!(out)?;

        writeln!(out, "typedef struct {{")?;
        for (name, _) in &values {
            writeln!(out, "    const int {};", name)?;
        }
        writeln!(out, "}} {}_members;", e.name)?;
        let inits: Vec<String> = values
            .iter()
            .map(|(name, value)| format!(".{} = {}", name, value))
            .collect();
        writeln!(
            out,
            "static const {}_members {} = {{ {} }};",
            e.name,
            e.name,
            inits.join(", ")
        )?;
        writeln!(out)?;

        writeln!(
            out,
            "static const char* {}_enum_name(int value) {{",
            e.name
        )?;
        writeln!(out, "    switch (value) {{")?;
        let mut seen = std::collections::HashSet::new();
        for (name, value) in &values {
            if seen.insert(*value) {
                writeln!(out, "        case {}: return \"{}\";", value, name)?;
            }
        }
        writeln!(out, "        default: return \"unknown\";")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        Ok(())
    }

    /// One typed field per member, a single initialized instance.
    fn emit_value_enum(
        &mut self,
        out: &mut String,
        e: &EnumDef,
        backing: &AhoyType,
    ) -> Result<(), CodeGenError> {
        writeln!(out, "typedef struct {{")?;
        for member in &e.members {
            let base = backing.c_type();
            let field_type = match backing {
                AhoyType::Str if member.mutable => "char*".to_string(),
                AhoyType::Str => "const char*".to_string(),
                _ if member.mutable => base,
                _ => format!("const {}", base),
            };
            writeln!(out, "    {} {};", field_type, member.name)?;
            self.enum_member_types
                .insert(format!("{}.{}", e.name, member.name), backing.clone());
        }
        writeln!(out, "}} {}_enum;", e.name)?;

        let mut inits = Vec::new();
        for member in &e.members {
            let value = match (&member.value, backing) {
                (Some(expr), AhoyType::Color) => self.color_initializer(expr)?,
                (Some(expr), AhoyType::Vector2) => self.vector2_initializer(expr)?,
                (Some(expr), _) => self.emit_expr(expr)?,
                (None, AhoyType::Str) => "\"\"".to_string(),
                (None, _) => "0".to_string(),
            };
            inits.push(format!(".{} = {}", member.name, value));
        }
        writeln!(
            out,
            "static {}_enum {} = {{ {} }};",
            e.name,
            e.name,
            inits.join(", ")
        )?;
        writeln!(out)?;
        Ok(())
    }

    /// `{r: 255, g: 0, b: 0}` -> `{ .r = 255, .g = 0, .b = 0, .a = 255 }`
    fn color_initializer(&mut self, expr: &Expr) -> Result<String, CodeGenError> {
        let Expr::Dict { entries, .. } = expr else {
            return self.emit_expr(expr);
        };
        let mut parts = Vec::new();
        let mut has_alpha = false;
        for (key, value) in entries {
            if key == "a" {
                has_alpha = true;
            }
            let value_c = self.emit_expr(value)?;
            parts.push(format!(".{} = {}", key, value_c));
        }
        if !has_alpha {
            parts.push(".a = 255".to_string());
        }
        Ok(format!("{{ {} }}", parts.join(", ")))
    }

    fn vector2_initializer(&mut self, expr: &Expr) -> Result<String, CodeGenError> {
        let Expr::Dict { entries, .. } = expr else {
            return self.emit_expr(expr);
        };
        let mut parts = Vec::new();
        for (key, value) in entries {
            let value_c = self.emit_expr(value)?;
            parts.push(format!(".{} = {}", key, value_c));
        }
        Ok(format!("{{ {} }}", parts.join(", ")))
    }

    /// Array/dict members: struct of pointers, storage initialized at
    /// program start because literal construction needs statements.
    fn emit_container_enum(
        &mut self,
        out: &mut String,
        e: &EnumDef,
        is_array: bool,
    ) -> Result<(), CodeGenError> {
        let c_type = if is_array { "AhoyArray" } else { "HashMap" };
        let member_ty = if is_array {
            AhoyType::Array(None)
        } else {
            AhoyType::Dict(None)
        };

        writeln!(out, "typedef struct {{")?;
        for member in &e.members {
            writeln!(out, "    {}* {};", c_type, member.name)?;
            self.enum_member_types
                .insert(format!("{}.{}", e.name, member.name), member_ty.clone());
        }
        writeln!(out, "}} {}_enum;", e.name)?;
        writeln!(out, "static {}_enum {};", e.name, e.name)?;
        for member in &e.members {
            writeln!(
                out,
                "static {} {}_{}_storage;",
                c_type, e.name, member.name
            )?;
        }

        let init_name = format!("{}_enum_init", e.name);
        writeln!(out, "static void {}(void) {{", init_name)?;
        for member in &e.members {
            let value = match &member.value {
                Some(expr) => self.emit_expr(expr)?,
                None if is_array => "ahoy_array_new()".to_string(),
                None => "ahoy_map_new()".to_string(),
            };
            writeln!(
                out,
                "    {}_{}_storage = {};",
                e.name, member.name, value
            )?;
            writeln!(
                out,
                "    {}.{} = &{}_{}_storage;",
                e.name, member.name, e.name, member.name
            )?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;
        self.enum_inits.push(init_name);
        Ok(())
    }

    /// Mixed/custom: each field takes the type its literal infers to.
    fn emit_mixed_enum(&mut self, out: &mut String, e: &EnumDef) -> Result<(), CodeGenError> {
        let mut field_types = Vec::new();
        for member in &e.members {
            let ty = match &member.value {
                Some(expr) => self.infer_type(expr),
                None => AhoyType::Int,
            };
            self.enum_member_types
                .insert(format!("{}.{}", e.name, member.name), ty.clone());
            field_types.push(ty);
        }

        writeln!(out, "typedef struct {{")?;
        for (member, ty) in e.members.iter().zip(&field_types) {
            let base = match ty {
                AhoyType::Str if !member.mutable => "const char*".to_string(),
                _ => ty.c_type(),
            };
            writeln!(out, "    {} {};", base, member.name)?;
        }
        writeln!(out, "}} {}_enum;", e.name)?;

        let mut inits = Vec::new();
        for member in &e.members {
            let value = match &member.value {
                Some(expr) => self.emit_expr(expr)?,
                None => "0".to_string(),
            };
            inits.push(format!(".{} = {}", member.name, value));
        }
        writeln!(
            out,
            "static {}_enum {} = {{ {} }};",
            e.name,
            e.name,
            inits.join(", ")
        )?;
        writeln!(out)?;
        Ok(())
    }
}

/// No declared backing type: all-integer members make an int enum,
/// otherwise the first member's literal decides, falling back to mixed.
fn derive_backing(e: &EnumDef) -> AhoyType {
    let all_int = e.members.iter().all(|m| match &m.value {
        None => true,
        Some(Expr::Number { text, .. }) => !text.contains('.'),
        _ => false,
    });
    if all_int {
        return AhoyType::Int;
    }
    let first = e.members.iter().find_map(|m| m.value.as_ref());
    let first_ty = match first {
        Some(Expr::Str { .. }) | Some(Expr::FString { .. }) => AhoyType::Str,
        Some(Expr::Number { text, .. }) if text.contains('.') => AhoyType::Float,
        Some(Expr::Number { .. }) => AhoyType::Int,
        Some(Expr::Array { .. }) => AhoyType::Array(None),
        Some(Expr::Dict { .. }) => AhoyType::Dict(None),
        _ => AhoyType::Mixed,
    };
    let uniform = e.members.iter().all(|m| match (&m.value, &first_ty) {
        (None, _) => true,
        (Some(Expr::Str { .. }), AhoyType::Str) => true,
        (Some(Expr::Number { text, .. }), AhoyType::Float) => text.contains('.'),
        (Some(Expr::Number { text, .. }), AhoyType::Int) => !text.contains('.'),
        (Some(Expr::Array { .. }), AhoyType::Array(_)) => true,
        (Some(Expr::Dict { .. }), AhoyType::Dict(_)) => true,
        _ => false,
    });
    if uniform { first_ty } else { AhoyType::Mixed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse;

    fn emit(source: &str) -> (CodeGen, String) {
        let program = parse(source).unwrap();
        let info = analyze(&program);
        let mut cg = CodeGen::new(info);
        let mut out = String::new();
        for stmt in &program.statements {
            if let crate::ast::Stmt::Enum(e) = stmt {
                cg.emit_enum_declaration(&mut out, e).unwrap();
            }
        }
        (cg, out)
    }

    #[test]
    fn test_int_enum_strategy() {
        let (cg, out) = emit("enum Status int\n    ok: 0\n    failed: 1\n");
        assert!(out.contains("Status_ok = 0,"));
        assert!(out.contains("Status_failed = 1,"));
        assert!(out.contains("} Status_enum;"));
        assert!(out.contains("static const Status_members Status"));
        assert!(out.contains("Status_enum_name"));
        assert_eq!(cg.enum_types["Status"], AhoyType::Int);
    }

    #[test]
    fn test_int_enum_derived_without_annotation() {
        let (cg, out) = emit("enum Level\n    low\n    high\n");
        assert!(out.contains("Level_low = 0,"));
        assert!(out.contains("Level_high = 1,"));
        assert_eq!(cg.enum_types["Level"], AhoyType::Int);
    }

    #[test]
    fn test_string_enum_strategy() {
        let (cg, out) = emit(
            "enum Color string\n    red: \"FF0000\"\n    mut green: \"00FF00\"\n    blue: \"0000FF\"\n",
        );
        assert!(out.contains("const char* red;"));
        // mut member drops const
        assert!(out.contains("    char* green;"));
        assert!(out.contains(".red = \"FF0000\""));
        assert_eq!(cg.enum_types["Color"], AhoyType::Str);
        assert_eq!(
            cg.enum_member_types["Color.red"],
            AhoyType::Str
        );
    }

    #[test]
    fn test_float_enum_strategy() {
        let (_, out) = emit("enum Gravity float\n    earth: 9.81\n    moon: 1.62\n");
        assert!(out.contains("const double earth;"));
        assert!(out.contains(".moon = 1.62"));
    }

    #[test]
    fn test_color_enum_fills_alpha() {
        let (_, out) = emit("enum Palette color\n    red: {r: 255, g: 0, b: 0}\n");
        assert!(out.contains(".red = { .r = 255, .g = 0, .b = 0, .a = 255 }"));
    }

    #[test]
    fn test_array_enum_initialized_at_start() {
        let (cg, out) = emit("enum Data array\n    primes: <2, 3, 5>\n");
        assert!(out.contains("AhoyArray* primes;"));
        assert!(out.contains("static void Data_enum_init(void)"));
        assert!(out.contains("Data.primes = &Data_primes_storage;"));
        assert_eq!(cg.enum_inits, vec!["Data_enum_init".to_string()]);
    }

    #[test]
    fn test_mixed_enum_records_member_types() {
        let (cg, out) = emit("enum Info mixed\n    code: 1\n    label: \"up\"\n");
        assert!(out.contains("int code;"));
        assert!(out.contains("const char* label;"));
        assert_eq!(cg.enum_member_types["Info.code"], AhoyType::Int);
        assert_eq!(cg.enum_member_types["Info.label"], AhoyType::Str);
    }
}
