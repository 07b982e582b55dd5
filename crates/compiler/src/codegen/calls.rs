//! Call emission
//!
//! Routes every call site: built-ins (`print`, casts, `sprintf`, JSON),
//! user functions (positional and named arguments, defaults filled from
//! the declaration), external C functions discovered from imported
//! headers (PascalCase fallback otherwise), and method calls dispatched
//! by the receiver's inferred type through a closed routing table.

use super::{CodeGen, CodeGenError};
use crate::analysis::{DICT_ONLY_METHODS, SHARED_METHODS, STRING_ONLY_METHODS};
use crate::ast::Expr;
use crate::types::AhoyType;
use std::fmt::Write as _;

impl CodeGen {
    pub(super) fn emit_call(
        &mut self,
        name: &str,
        args: &[Expr],
        line: usize,
    ) -> Result<String, CodeGenError> {
        match name {
            "print" => Err(CodeGenError::Logic(format!(
                "at line {}: print is a statement, not an expression",
                line
            ))),
            "int" | "float" | "char" | "string" if args.len() == 1 => {
                self.emit_cast(name, &args[0])
            }
            "sprintf" => self.emit_sprintf(args),
            "read_json" if args.len() == 1 => {
                let path = self.emit_expr(&args[0])?;
                Ok(format!("ahoy_read_json({}).ret0", path))
            }
            "write_json" if args.len() == 2 => {
                let path = self.emit_expr(&args[0])?;
                let json = self.emit_expr(&args[1])?;
                Ok(format!("ahoy_write_json({}, {})", path, json))
            }
            _ if self.info.user_functions.contains(name) => self.emit_user_call(name, args),
            _ => {
                // External C call: original casing from an imported
                // header, PascalCase as the legacy fallback
                let c_name = self
                    .c_function_names
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Self::pascal_case(name));
                let arg_list = self.emit_args(args)?;
                Ok(format!("{}({})", c_name, arg_list))
            }
        }
    }

    fn emit_args(&mut self, args: &[Expr]) -> Result<String, CodeGenError> {
        let mut parts = Vec::new();
        for arg in args {
            parts.push(self.emit_expr(arg)?);
        }
        Ok(parts.join(", "))
    }

    /// User function call. Named arguments are reordered against the
    /// callee's parameter list; parameters left unfilled take their
    /// declared defaults.
    fn emit_user_call(&mut self, name: &str, args: &[Expr]) -> Result<String, CodeGenError> {
        let param_names = self
            .info
            .function_param_names
            .get(name)
            .cloned()
            .unwrap_or_default();
        let param_types = self
            .info
            .function_param_types
            .get(name)
            .cloned()
            .unwrap_or_default();
        let defaults = self
            .info
            .function_param_defaults
            .get(name)
            .cloned()
            .unwrap_or_default();

        let has_named = args.iter().any(|a| matches!(a, Expr::NamedArg { .. }));
        let mut slots: Vec<Option<String>> = vec![None; param_names.len()];

        if has_named {
            let mut positional = Vec::new();
            for arg in args {
                match arg {
                    Expr::NamedArg { name: pname, value, .. } => {
                        if let Some(idx) = param_names.iter().position(|p| p == pname) {
                            slots[idx] = Some(self.emit_expr(value)?);
                        }
                    }
                    other => positional.push(other),
                }
            }
            let mut queue = positional.into_iter();
            for slot in slots.iter_mut() {
                if slot.is_none() {
                    if let Some(arg) = queue.next() {
                        *slot = Some(self.emit_expr(arg)?);
                    }
                }
            }
        } else {
            for (idx, arg) in args.iter().enumerate() {
                if idx < slots.len() {
                    slots[idx] = Some(self.emit_expr(arg)?);
                } else {
                    // Extra arguments pass through untouched
                    slots.push(Some(self.emit_expr(arg)?));
                }
            }
        }

        let mut rendered = Vec::new();
        for (idx, slot) in slots.into_iter().enumerate() {
            let value = match slot {
                Some(v) => v,
                None => match defaults.get(idx).and_then(|d| d.clone()) {
                    Some(default) => self.emit_expr(&default)?,
                    None => "0".to_string(),
                },
            };
            // Pointer-wide cast for generic slots
            if param_types.get(idx) == Some(&AhoyType::Generic) {
                rendered.push(format!("(intptr_t)({})", value));
            } else {
                rendered.push(value);
            }
        }

        Ok(format!(
            "{}({})",
            Self::c_function_name(name),
            rendered.join(", ")
        ))
    }

    /// Built-in type casts: C cast or sprintf conversion by source type.
    fn emit_cast(&mut self, target: &str, arg: &Expr) -> Result<String, CodeGenError> {
        let from = self.infer_type(arg);
        let value = self.emit_expr(arg)?;
        Ok(match (target, &from) {
            ("int", AhoyType::Str) => format!("atoi({})", value),
            ("int", _) => format!("(int)({})", value),
            ("float", AhoyType::Str) => format!("atof({})", value),
            ("float", _) => format!("(double)({})", value),
            ("char", AhoyType::Str) => format!("({})[0]", value),
            ("char", _) => format!("(char)({})", value),
            ("string", AhoyType::Int) => format!("ahoy_int_to_string({})", value),
            ("string", AhoyType::Float) => format!("ahoy_float_to_string({})", value),
            ("string", AhoyType::Char) => format!("ahoy_char_to_string({})", value),
            ("string", AhoyType::Bool) => format!("(({}) ? \"true\" : \"false\")", value),
            ("string", _) => value,
            _ => value,
        })
    }

    fn emit_sprintf(&mut self, args: &[Expr]) -> Result<String, CodeGenError> {
        let tmp = self.fresh_temp();
        let (format, rendered) = self.build_format(args)?;
        let mut out = String::new();
        write!(
            out,
            "({{ char* {tmp} = malloc(256); snprintf({tmp}, 256, \"{format}\""
        )?;
        for arg in &rendered {
            write!(out, ", {}", arg)?;
        }
        write!(out, "); {tmp}; }})")?;
        Ok(out)
    }

    /// Build a printf format from a leading literal (with `{}` slots or
    /// `%` conversions) plus trailing arguments.
    fn build_format(&mut self, args: &[Expr]) -> Result<(String, Vec<String>), CodeGenError> {
        if args.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        let (head, rest) = args.split_first().unwrap();
        match head {
            Expr::Str { text, .. } if text.contains("{}") => {
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
                            rendered.push(self.format_arg(arg, &ty)?);
                        }
                    }
                }
                for arg in remaining {
                    let ty = self.infer_type(arg);
                    format.push(' ');
                    format.push_str(ty.format_spec());
                    rendered.push(self.format_arg(arg, &ty)?);
                }
                Ok((format, rendered))
            }
            Expr::Str { text, .. } => {
                let mut rendered = Vec::new();
                for arg in rest {
                    rendered.push(self.emit_expr(arg)?);
                }
                Ok((text.clone(), rendered))
            }
            Expr::FString { text, .. } => {
                let text = text.clone();
                self.fstring_format(&text)
            }
            _ => {
                let mut format = String::new();
                let mut rendered = Vec::new();
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        format.push(' ');
                    }
                    let ty = self.infer_type(arg);
                    format.push_str(ty.format_spec());
                    rendered.push(self.format_arg(arg, &ty)?);
                }
                Ok((format, rendered))
            }
        }
    }

    fn format_arg(&mut self, arg: &Expr, ty: &AhoyType) -> Result<String, CodeGenError> {
        let value = self.emit_expr(arg)?;
        Ok(match ty {
            AhoyType::Bool => format!("(({}) ? \"true\" : \"false\")", value),
            _ => value,
        })
    }

    // ---- method routing -------------------------------------------------

    pub(super) fn emit_method_call(
        &mut self,
        recv: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, CodeGenError> {
        // Namespaced external call: `rl.init_window|w, h|`
        if let Expr::Ident { name, .. } = recv {
            if let Some(ns_table) = self.c_namespaces.get(name) {
                let c_name = ns_table
                    .get(method)
                    .cloned()
                    .unwrap_or_else(|| Self::pascal_case(method));
                let arg_list = self.emit_args(args)?;
                return Ok(format!("{}({})", c_name, arg_list));
            }
        }

        let recv_ty = self.infer_type(recv);

        if (method == "map" || method == "filter") && args.len() == 1 {
            if let Expr::Lambda { params, body, .. } = &args[0] {
                let params = params.clone();
                let body = (**body).clone();
                return self.emit_pipeline(recv, method, &params, &body);
            }
        }

        if STRING_ONLY_METHODS.contains(&method)
            || (recv_ty.is_string() && SHARED_METHODS.contains(&method))
        {
            return self.emit_string_method(recv, method, args);
        }
        if DICT_ONLY_METHODS.contains(&method)
            || (recv_ty.is_dict() && (SHARED_METHODS.contains(&method) || method == "merge"))
        {
            return self.emit_dict_method(recv, method, args);
        }
        self.emit_array_method(recv, method, args)
    }

    /// `&receiver` for helper calls; non-lvalue receivers get a
    /// statement-expression temporary.
    fn recv_ref(
        &mut self,
        recv: &Expr,
        c_type: &str,
    ) -> Result<(String, Option<(String, String)>), CodeGenError> {
        match recv {
            Expr::Ident { .. } | Expr::Member { .. } => {
                let c = self.emit_expr(recv)?;
                Ok((format!("&{}", c), None))
            }
            _ => {
                let tmp = self.fresh_temp();
                let value = self.emit_expr(recv)?;
                let prologue = format!("{} {} = {};", c_type, tmp, value);
                Ok((format!("&{}", tmp), Some((tmp, prologue))))
            }
        }
    }

    /// Wrap a call needing a receiver temporary in a statement expr.
    fn with_recv(
        &mut self,
        recv: &Expr,
        c_type: &str,
        build: impl FnOnce(&mut Self, &str) -> Result<String, CodeGenError>,
    ) -> Result<String, CodeGenError> {
        let (reference, prologue) = self.recv_ref(recv, c_type)?;
        let call = build(self, &reference)?;
        match prologue {
            None => Ok(call),
            Some((_, decl)) => Ok(format!("({{ {} {}; }})", decl, call)),
        }
    }

    fn emit_string_method(
        &mut self,
        recv: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, CodeGenError> {
        let r = self.emit_expr(recv)?;
        let rendered = self
            .emit_args(args)?;
        Ok(match method {
            "length" => format!("(int)strlen({})", r),
            "has" | "contains" => format!("ahoy_str_contains({}, {})", r, rendered),
            "match" => format!("ahoy_str_match({}, {})", r, rendered),
            "upper" => format!("ahoy_str_upper({})", r),
            "lower" => format!("ahoy_str_lower({})", r),
            "strip" => format!("ahoy_str_strip({})", r),
            "reverse" => format!("ahoy_str_reverse({})", r),
            "replace" => format!("ahoy_str_replace({}, {})", r, rendered),
            "count" => format!("ahoy_str_count({}, {})", r, rendered),
            "split" => format!("ahoy_str_split({}, {})", r, rendered),
            "snake_case" => format!("ahoy_str_snake_case({})", r),
            "camel_case" => format!("ahoy_str_camel_case({})", r),
            "pascal_case" => format!("ahoy_str_pascal_case({})", r),
            "kebab_case" => format!("ahoy_str_kebab_case({})", r),
            "title_case" => format!("ahoy_str_title_case({})", r),
            "lpad" | "rpad" | "pad" => {
                let fill = if args.len() > 1 {
                    String::new()
                } else {
                    ", \" \"".to_string()
                };
                format!("ahoy_str_{}({}, {}{})", method, r, rendered, fill)
            }
            "get_file" => format!("ahoy_str_get_file({})", r),
            "sort" => r,
            _ => format!("{}({})", Self::pascal_case(method), r),
        })
    }

    fn emit_dict_method(
        &mut self,
        recv: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, CodeGenError> {
        let method = method.to_string();
        let args = args.to_vec();
        self.with_recv(recv, "HashMap", |cg, r| {
            Ok(match method.as_str() {
                "size" | "length" => format!("({}).count", strip_amp(r)),
                "clear" => format!("ahoy_map_clear({})", r),
                "has" => {
                    let key = cg.emit_expr(arg(&args, 0, &method)?)?;
                    format!("ahoy_map_has({}, {})", r, key)
                }
                "has_all" => {
                    let keys = cg.emit_expr(arg(&args, 0, &method)?)?;
                    match &args[0] {
                        Expr::Ident { name, .. } => format!("ahoy_map_has_all({}, &{})", r, name),
                        _ => {
                            let tmp = cg.fresh_temp();
                            format!(
                                "({{ AhoyArray {tmp} = {keys}; ahoy_map_has_all({r}, &{tmp}); }})"
                            )
                        }
                    }
                }
                "keys" => format!("ahoy_map_keys({})", r),
                "values" => format!("ahoy_map_values({})", r),
                "merge" => {
                    let other = cg.emit_expr(arg(&args, 0, &method)?)?;
                    match &args[0] {
                        Expr::Ident { name, .. } => format!("ahoy_map_merge({}, &{})", r, name),
                        _ => {
                            let tmp = cg.fresh_temp();
                            format!(
                                "({{ HashMap {tmp} = {other}; ahoy_map_merge({r}, &{tmp}); }})"
                            )
                        }
                    }
                }
                "sort" => format!("ahoy_map_sort({})", r),
                "stable_sort" => format!("ahoy_map_stable_sort({})", r),
                _ => format!("ahoy_map_{}({})", method, r),
            })
        })
    }

    fn emit_array_method(
        &mut self,
        recv: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, CodeGenError> {
        let elem_ty = match recv {
            Expr::Ident { name, .. } => self
                .array_element_types
                .get(name)
                .cloned()
                .unwrap_or(AhoyType::Int),
            _ => AhoyType::Int,
        };
        let method = method.to_string();
        let args = args.to_vec();
        self.with_recv(recv, "AhoyArray", |cg, r| {
            let plain = strip_amp(r);
            Ok(match method.as_str() {
                "push" => {
                    let (value, tag) = cg.emit_boxed(arg(&args, 0, &method)?)?;
                    format!("ahoy_array_push({}, {}, {})", r, value, tag)
                }
                "pop" => Self::unbox(&format!("ahoy_array_pop({})", r), &elem_ty),
                "shift" => Self::unbox(&format!("ahoy_array_shift({})", r), &elem_ty),
                "length" => format!("({}).length", plain),
                "first" => Self::unbox(&format!("({}).data[0]", plain), &elem_ty),
                "last" => Self::unbox(
                    &format!("({p}).data[({p}).length - 1]", p = plain),
                    &elem_ty,
                ),
                "sum" => {
                    if elem_ty == AhoyType::Float {
                        format!("ahoy_array_sum_double({})", r)
                    } else {
                        format!("(int)ahoy_array_sum({})", r)
                    }
                }
                "min" => Self::unbox(&format!("ahoy_array_min({})", r), &elem_ty),
                "max" => Self::unbox(&format!("ahoy_array_max({})", r), &elem_ty),
                "avg" => format!("ahoy_array_avg({})", r),
                "has" => {
                    let (value, tag) = cg.emit_boxed(arg(&args, 0, &method)?)?;
                    format!("ahoy_array_has({}, {}, {})", r, value, tag)
                }
                "index_of" => {
                    let (value, tag) = cg.emit_boxed(arg(&args, 0, &method)?)?;
                    format!("ahoy_array_index_of({}, {}, {})", r, value, tag)
                }
                "insert" => {
                    let index = cg.emit_expr(arg(&args, 0, &method)?)?;
                    let (value, tag) = cg.emit_boxed(arg(&args, 1, &method)?)?;
                    format!("ahoy_array_insert({}, {}, {}, {})", r, index, value, tag)
                }
                "remove" => {
                    let index = cg.emit_expr(arg(&args, 0, &method)?)?;
                    format!("ahoy_array_remove({}, {})", r, index)
                }
                "join" => {
                    let sep = if args.is_empty() {
                        "\", \"".to_string()
                    } else {
                        cg.emit_expr(&args[0])?
                    };
                    format!("ahoy_array_join({}, {})", r, sep)
                }
                "sort" => format!("ahoy_array_sort({})", r),
                "reverse" => format!("ahoy_array_reverse({})", r),
                "clear" => format!("ahoy_array_clear({})", r),
                other => {
                    let arg_list = cg.emit_args(&args)?;
                    if arg_list.is_empty() {
                        format!("ahoy_array_{}({})", other, r)
                    } else {
                        format!("ahoy_array_{}({}, {})", other, r, arg_list)
                    }
                }
            })
        })
    }

    /// `map`/`filter` with a lambda body, inlined as a statement
    /// expression over a fresh result array. A lambda with more than one
    /// parameter destructures sub-array elements.
    fn emit_pipeline(
        &mut self,
        recv: &Expr,
        method: &str,
        params: &[String],
        body: &Expr,
    ) -> Result<String, CodeGenError> {
        let recv_c = self.emit_expr(recv)?;
        let elem_ty = match recv {
            Expr::Ident { name, .. } => self
                .array_element_types
                .get(name)
                .cloned()
                .unwrap_or(AhoyType::Int),
            _ => AhoyType::Int,
        };
        let out = self.fresh_temp();
        let idx = self.fresh_temp();
        let src = self.fresh_temp();

        // Lambda parameters become typed locals for body inference
        let mut shadowed = Vec::new();
        if params.len() == 1 {
            shadowed.push((params[0].clone(), self.function_vars.get(&params[0]).cloned()));
            self.function_vars.insert(params[0].clone(), elem_ty.clone());
        } else {
            for p in params {
                shadowed.push((p.clone(), self.function_vars.get(p).cloned()));
                self.function_vars.insert(p.clone(), AhoyType::Int);
            }
        }
        let body_result = (|| {
            let mut text = String::new();
            write!(
                text,
                "({{ AhoyArray {out} = ahoy_array_new(); AhoyArray {src} = {recv_c}; \
                 for (int {idx} = 0; {idx} < {src}.length; {idx}++) {{ "
            )?;
            if params.len() == 1 {
                let slot = format!("{}.data[{}]", src, idx);
                write!(
                    text,
                    "{} {} = {}; ",
                    elem_ty.c_type(),
                    params[0],
                    Self::unbox(&slot, &elem_ty)
                )?;
            } else {
                // Elements are sub-arrays; destructure positionally
                let sub = format!("((AhoyArray*){}.data[{}])", src, idx);
                for (pos, p) in params.iter().enumerate() {
                    write!(
                        text,
                        "int {} = (int){}->data[{}]; ",
                        p, sub, pos
                    )?;
                }
            }
            if method == "map" {
                let (value, tag) = self.emit_boxed(body)?;
                write!(text, "ahoy_array_push(&{out}, {value}, {tag}); ")?;
            } else {
                let cond = self.emit_expr(body)?;
                write!(
                    text,
                    "if ({cond}) ahoy_array_push(&{out}, {src}.data[{idx}], {src}.types[{idx}]); "
                )?;
            }
            write!(text, "}} {out}; }})")?;
            Ok::<String, CodeGenError>(text)
        })();
        for (name, old) in shadowed {
            match old {
                Some(ty) => {
                    self.function_vars.insert(name, ty);
                }
                None => {
                    self.function_vars.remove(&name);
                }
            }
        }
        body_result
    }
}

/// `&x` -> `x` for field access on a reference we just built.
fn strip_amp(r: &str) -> &str {
    r.strip_prefix('&').unwrap_or(r)
}

fn arg<'e>(args: &'e [Expr], index: usize, method: &str) -> Result<&'e Expr, CodeGenError> {
    args.get(index)
        .ok_or_else(|| CodeGenError::Logic(format!("method '{}' is missing an argument", method)))
}
