//! Expression emission
//!
//! Every function here returns the C expression text for a node. Complex
//! constructs (array and dict literals, f-strings, map/filter pipelines)
//! lean on GCC statement expressions so they stay usable in expression
//! position.

use super::{CodeGen, CodeGenError};
use crate::ast::{BinOp, Expr, UnOp};
use crate::types::AhoyType;
use std::fmt::Write as _;

/// A parsed f-string segment.
pub(super) enum FStringPart {
    Text(String),
    Var(String),
}

/// Split `"a {x} b"` into literal text and placeholder names.
pub(super) fn split_fstring(text: &str) -> Vec<FStringPart> {
    let mut parts = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' {
            let mut j = i + 1;
            let mut name = String::new();
            while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                name.push(chars[j]);
                j += 1;
            }
            if !name.is_empty() && j < chars.len() && chars[j] == '}' {
                if !literal.is_empty() {
                    parts.push(FStringPart::Text(std::mem::take(&mut literal)));
                }
                parts.push(FStringPart::Var(name));
                i = j + 1;
                continue;
            }
        }
        literal.push(chars[i]);
        i += 1;
    }
    if !literal.is_empty() {
        parts.push(FStringPart::Text(literal));
    }
    parts
}

impl CodeGen {
    pub(super) fn emit_expr(&mut self, expr: &Expr) -> Result<String, CodeGenError> {
        match expr {
            Expr::Number { text, .. } => Ok(text.clone()),
            Expr::Str { text, .. } => Ok(format!("\"{}\"", text)),
            Expr::FString { text, .. } => self.emit_fstring(text),
            Expr::CharLit { text, .. } => Ok(format!("'{}'", text)),
            Expr::Bool { value, .. } => Ok(if *value { "true" } else { "false" }.to_string()),
            Expr::Ident { name, .. } => {
                // Declared names win over unqualified enum members
                if self.var_type(name).is_none() {
                    if let Some(rewritten) = self.resolve_enum_member(name) {
                        return Ok(rewritten);
                    }
                }
                Ok(name.clone())
            }
            Expr::LoopCounter { .. } => Ok(self
                .loop_counters
                .last()
                .cloned()
                .unwrap_or_else(|| "0".to_string())),
            Expr::Array { elems, .. } => self.emit_array_literal(elems, None),
            Expr::Dict { entries, .. } => self.emit_dict_literal(entries),
            Expr::ObjectLit {
                type_name, fields, ..
            } => self.emit_object_literal(type_name, fields),
            Expr::Call { name, args, line } => self.emit_call(name, args, *line),
            Expr::MethodCall {
                recv, method, args, ..
            } => self.emit_method_call(recv, method, args),
            Expr::Member { recv, field, .. } => self.emit_member(recv, field),
            Expr::ObjectField { recv, field, .. } => {
                let recv_ty = self.infer_type(recv);
                let recv_c = self.emit_expr(recv)?;
                match recv_ty {
                    AhoyType::Named(_) => Ok(format!("{}.{}", recv_c, field)),
                    _ => Ok(format!("ahoy_map_get(&{}, \"{}\")", recv_c, field)),
                }
            }
            Expr::Index { recv, index, .. } => self.emit_index(recv, index),
            Expr::DictKey { recv, key, .. } => {
                let recv_c = self.emit_expr(recv)?;
                let key_c = self.emit_expr(key)?;
                Ok(format!("ahoy_map_get(&{}, {})", recv_c, key_c))
            }
            Expr::TypeProbe { recv, .. } => Ok(format!("\"{}\"", self.type_probe_string(recv))),
            Expr::Binary { op, lhs, rhs, .. } => self.emit_binary(*op, lhs, rhs),
            Expr::Unary { op, operand, .. } => {
                let inner = self.emit_expr(operand)?;
                Ok(match op {
                    UnOp::Not => format!("!({})", inner),
                    UnOp::Neg => format!("-({})", inner),
                    UnOp::Deref => format!("(*{})", inner),
                    UnOp::AddrOf => format!("(&{})", inner),
                })
            }
            Expr::Ternary {
                cond,
                then_val,
                else_val,
                ..
            } => {
                let c = self.emit_expr(cond)?;
                let t = self.emit_expr(then_val)?;
                let e = self.emit_expr(else_val)?;
                Ok(format!("(({}) ? ({}) : ({}))", c, t, e))
            }
            Expr::Lambda { line, .. } => Err(CodeGenError::Logic(format!(
                "at line {}: lambda outside a map/filter pipeline",
                line
            ))),
            Expr::NamedArg { value, .. } => self.emit_expr(value),
        }
    }

    /// Box a value for container storage: `(value-as-intptr, tag)`.
    pub(super) fn emit_boxed(&mut self, expr: &Expr) -> Result<(String, &'static str), CodeGenError> {
        let ty = self.infer_type(expr);
        let value = self.emit_expr(expr)?;
        Ok(match ty {
            AhoyType::Float => (format!("(intptr_t)ahoy_box_double({})", value), "AHOY_FLOAT"),
            AhoyType::Str => (format!("(intptr_t)({})", value), "AHOY_STRING"),
            AhoyType::Char => (format!("(intptr_t)({})", value), "AHOY_CHAR"),
            _ => (format!("(intptr_t)({})", value), "AHOY_INT"),
        })
    }

    /// Read one container slot back at the given element type.
    pub(super) fn unbox(slot: &str, ty: &AhoyType) -> String {
        match ty {
            AhoyType::Float => format!("*(double*)({})", slot),
            AhoyType::Str => format!("(char*)({})", slot),
            AhoyType::Char => format!("(char)({})", slot),
            AhoyType::Generic | AhoyType::Mixed => format!("({})", slot),
            _ => format!("(int)({})", slot),
        }
    }

    pub(super) fn emit_array_literal(
        &mut self,
        elems: &[Expr],
        elem_ty: Option<&AhoyType>,
    ) -> Result<String, CodeGenError> {
        let tmp = self.fresh_temp();
        let mut out = String::new();
        write!(out, "({{ AhoyArray {} = ahoy_array_new(); ", tmp)?;
        if let Some(elem_ty) = elem_ty {
            write!(
                out,
                "{}.is_typed = true; {}.element_type = {}; ",
                tmp,
                tmp,
                elem_ty.value_tag()
            )?;
        }
        for elem in elems {
            let (value, tag) = self.emit_boxed(elem)?;
            write!(out, "ahoy_array_push(&{}, {}, {}); ", tmp, value, tag)?;
        }
        write!(out, "{}; }})", tmp)?;
        Ok(out)
    }

    pub(super) fn emit_dict_literal(
        &mut self,
        entries: &[(String, Expr)],
    ) -> Result<String, CodeGenError> {
        let tmp = self.fresh_temp();
        let mut out = String::new();
        write!(out, "({{ HashMap {} = ahoy_map_new(); ", tmp)?;
        for (key, value) in entries {
            let (boxed, tag) = self.emit_boxed(value)?;
            write!(
                out,
                "ahoy_map_put(&{}, \"{}\", {}, {}); ",
                tmp, key, boxed, tag
            )?;
        }
        write!(out, "{}; }})", tmp)?;
        Ok(out)
    }

    /// Typed object literal: compound literal with declared defaults
    /// filling the fields the source leaves out.
    fn emit_object_literal(
        &mut self,
        type_name: &str,
        fields: &[(String, Expr)],
    ) -> Result<String, CodeGenError> {
        let mut inits = Vec::new();
        let declared = self.structs.get(type_name).cloned().unwrap_or_default();
        for field in &declared {
            if let Some((_, value)) = fields.iter().find(|(name, _)| name == &field.name) {
                let value_c = self.emit_expr(value)?;
                inits.push(format!(".{} = {}", field.name, value_c));
            } else if let Some(default_c) = &field.default_c {
                inits.push(format!(".{} = {}", field.name, default_c));
            }
        }
        if declared.is_empty() {
            // Unknown struct: trust the source field order
            for (name, value) in fields {
                let value_c = self.emit_expr(value)?;
                inits.push(format!(".{} = {}", name, value_c));
            }
        }
        Ok(format!("({}){{ {} }}", type_name, inits.join(", ")))
    }

    fn emit_member(&mut self, recv: &Expr, field: &str) -> Result<String, CodeGenError> {
        // A member read that is really a pipeless zero-argument method
        let recv_ty = self.infer_type(recv);
        if crate::analysis::is_known_method(field)
            && !matches!(recv_ty, AhoyType::Named(_))
        {
            return self.emit_method_call(recv, field, &[]);
        }
        if recv_ty == AhoyType::Json {
            let recv_c = self.emit_expr(recv)?;
            return Ok(format!("ahoy_json_get({}, \"{}\")", recv_c, field));
        }
        // Array/dict enum members are stored behind pointers
        if let Expr::Ident { name, .. } = recv {
            if self.enums.contains_key(name) {
                let key = format!("{}.{}", name, field);
                if matches!(
                    self.enum_member_types.get(&key),
                    Some(AhoyType::Array(_)) | Some(AhoyType::Dict(_))
                ) {
                    return Ok(format!("(*{}.{})", name, field));
                }
            }
        }
        let recv_c = self.emit_expr(recv)?;
        Ok(format!("{}.{}", recv_c, field))
    }

    fn emit_index(&mut self, recv: &Expr, index: &Expr) -> Result<String, CodeGenError> {
        let recv_ty = self.infer_type(recv);
        let recv_c = self.emit_expr(recv)?;
        let index_c = self.emit_expr(index)?;
        if recv_ty.is_array() {
            let elem_ty = match recv {
                Expr::Ident { name, .. } => self
                    .array_element_types
                    .get(name)
                    .cloned()
                    .unwrap_or(AhoyType::Int),
                _ => AhoyType::Int,
            };
            let slot = format!("{}.data[{}]", recv_c, index_c);
            return Ok(Self::unbox(&slot, &elem_ty));
        }
        if recv_ty.is_string() {
            return Ok(format!("{}[{}]", recv_c, index_c));
        }
        if recv_ty == AhoyType::Json {
            return Ok(format!("ahoy_json_index({}, {})", recv_c, index_c));
        }
        Ok(format!("{}[{}]", recv_c, index_c))
    }

    fn emit_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<String, CodeGenError> {
        let lhs_ty = self.infer_type(lhs);
        let rhs_ty = self.infer_type(rhs);
        let l = self.emit_expr(lhs)?;
        let r = self.emit_expr(rhs)?;
        // C cannot compare strings with operators
        if lhs_ty.is_string() && rhs_ty.is_string() {
            match op {
                BinOp::Eq => return Ok(format!("(strcmp({}, {}) == 0)", l, r)),
                BinOp::Ne => return Ok(format!("(strcmp({}, {}) != 0)", l, r)),
                BinOp::Lt => return Ok(format!("(strcmp({}, {}) < 0)", l, r)),
                BinOp::Gt => return Ok(format!("(strcmp({}, {}) > 0)", l, r)),
                _ => {}
            }
        }
        Ok(format!("({} {} {})", l, op.c_op(), r))
    }

    /// F-string in expression position: snprintf into a fresh buffer.
    fn emit_fstring(&mut self, text: &str) -> Result<String, CodeGenError> {
        let (format, args) = self.fstring_format(text)?;
        let tmp = self.fresh_temp();
        let mut out = String::new();
        write!(
            out,
            "({{ char* {tmp} = malloc(256); snprintf({tmp}, 256, \"{format}\"",
        )?;
        for arg in &args {
            write!(out, ", {}", arg)?;
        }
        write!(out, "); {tmp}; }})")?;
        Ok(out)
    }

    /// Expand f-string placeholders into a printf format plus argument
    /// expressions, using the inferred type of each named variable.
    pub(super) fn fstring_format(
        &mut self,
        text: &str,
    ) -> Result<(String, Vec<String>), CodeGenError> {
        let mut format = String::new();
        let mut args = Vec::new();
        for part in split_fstring(text) {
            match part {
                FStringPart::Text(t) => format.push_str(&t.replace('%', "%%")),
                FStringPart::Var(name) => {
                    let ident = Expr::Ident {
                        name: name.clone(),
                        line: 0,
                    };
                    let ty = self.infer_type(&ident);
                    match ty {
                        AhoyType::Bool => {
                            format.push_str("%s");
                            args.push(format!("({} ? \"true\" : \"false\")", name));
                        }
                        AhoyType::Float => {
                            format.push_str("%g");
                            args.push(name);
                        }
                        AhoyType::Str => {
                            format.push_str("%s");
                            args.push(name);
                        }
                        AhoyType::Char => {
                            format.push_str("%c");
                            args.push(name);
                        }
                        _ => {
                            format.push_str("%d");
                            args.push(name);
                        }
                    }
                }
            }
        }
        Ok((format, args))
    }

    /// The compile-time string the `.type` probe yields.
    pub(super) fn type_probe_string(&self, recv: &Expr) -> String {
        if let Expr::Ident { name, .. } = recv {
            if let Some(backing) = self.enum_types.get(name) {
                return format!("enum:{}", backing);
            }
        }
        if let Expr::Member { recv: inner, field, .. } = recv {
            if let Expr::Ident { name, .. } = inner.as_ref() {
                let key = format!("{}.{}", name, field);
                if let Some(ty) = self.enum_member_types.get(&key) {
                    return ty.to_string();
                }
                if let Some(backing) = self.enum_types.get(name) {
                    return backing.to_string();
                }
            }
        }
        self.infer_type(recv).to_string()
    }
}
