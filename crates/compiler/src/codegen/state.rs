//! CodeGen state and core types
//!
//! One mutable context bag owns every symbol table and output buffer for
//! a single compilation. Sub-passes take `&mut CodeGen`; nothing outside
//! the generator mutates it, and it is discarded when the C text has
//! been assembled.

use crate::analysis::{ProgramInfo, TypeView, infer_expr_type};
use crate::ast::{Expr, Stmt};
use crate::types::AhoyType;
use std::collections::{HashMap, HashSet};

/// A struct field as tracked for emission: name, mapped C type, the
/// Ahoy type it came from, and an optional default-value C fragment.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub c_type: String,
    pub ahoy: AhoyType,
    pub default_c: Option<String>,
}

pub struct CodeGen {
    pub(super) info: ProgramInfo,

    // Symbol tables
    /// Global-scope name -> Ahoy type
    pub(super) variables: HashMap<String, AhoyType>,
    /// Current-function-scope name -> Ahoy type
    pub(super) function_vars: HashMap<String, AhoyType>,
    /// Names introduced inside nested blocks; re-declaration on
    /// re-entry is permitted
    pub(super) nested_scope_vars: HashSet<String>,
    /// Declared constant names; a second declaration is a hard error
    pub(super) constants: HashSet<String>,
    /// Enum name -> member names
    pub(super) enums: HashMap<String, Vec<String>>,
    /// Enum name -> declared backing type
    pub(super) enum_types: HashMap<String, AhoyType>,
    /// `Enum.member` -> member type (mixed/custom enums)
    pub(super) enum_member_types: HashMap<String, AhoyType>,
    /// Struct name -> ordered field list (append-only per compilation)
    pub(super) structs: HashMap<String, Vec<FieldInfo>>,
    /// Struct emission order
    pub(super) struct_order: Vec<String>,
    /// Variable name -> element Ahoy type for annotated arrays
    pub(super) array_element_types: HashMap<String, AhoyType>,
    /// Variables whose value came from `dict["key"]`: var -> (dict, key C expr)
    pub(super) dict_sourced: HashMap<String, (String, String)>,
    /// Hash-iteration value vars -> entry pointer C name, for the
    /// per-value-type print formatter
    pub(super) dict_entry_vars: HashMap<String, String>,
    /// Variables bound to the JSON runtime type
    pub(super) json_variables: HashSet<String>,
    /// Ordered user `#include` lines (import order preserved)
    pub(super) includes: Vec<String>,
    /// snake_case -> original C name, from imported headers
    pub(super) c_function_names: HashMap<String, String>,
    /// namespace -> snake_case -> original C name
    pub(super) c_namespaces: HashMap<String, HashMap<String, String>>,

    // Per-function state
    /// Name of the function being generated, if any
    pub(super) current_function: Option<String>,
    /// Deferred statements, flushed LIFO at every exit point
    pub(super) deferred: Vec<Stmt>,
    /// Induction variable of each enclosing loop (innermost last)
    pub(super) loop_counters: Vec<String>,
    /// Names declared per open nested block, popped on block exit
    pub(super) block_scopes: Vec<Vec<String>>,

    // Output state
    pub(super) temp_counter: usize,
    pub(super) indent: usize,
    /// `assert` seen anywhere (adds `<assert.h>` to the preamble)
    pub(super) uses_assert: bool,
    /// Struct types that need a print helper
    pub(super) printed_structs: HashSet<String>,
    /// color/vector2 literals seen (emit those runtime types)
    pub(super) uses_color: bool,
    pub(super) uses_vector2: bool,
    /// Container printers referenced by emitted bodies
    pub(super) uses_print_array: bool,
    pub(super) uses_print_dict: bool,
    /// Init functions for array/dict-backed enums, called at the top
    /// of the generated main
    pub(super) enum_inits: Vec<String>,
}

impl CodeGen {
    pub fn new(info: ProgramInfo) -> Self {
        CodeGen {
            info,
            variables: HashMap::new(),
            function_vars: HashMap::new(),
            nested_scope_vars: HashSet::new(),
            constants: HashSet::new(),
            enums: HashMap::new(),
            enum_types: HashMap::new(),
            enum_member_types: HashMap::new(),
            structs: HashMap::new(),
            struct_order: Vec::new(),
            array_element_types: HashMap::new(),
            dict_sourced: HashMap::new(),
            dict_entry_vars: HashMap::new(),
            json_variables: HashSet::new(),
            includes: Vec::new(),
            c_function_names: HashMap::new(),
            c_namespaces: HashMap::new(),
            current_function: None,
            deferred: Vec::new(),
            loop_counters: Vec::new(),
            block_scopes: Vec::new(),
            temp_counter: 0,
            indent: 1,
            uses_assert: false,
            printed_structs: HashSet::new(),
            uses_color: false,
            uses_vector2: false,
            uses_print_array: false,
            uses_print_dict: false,
            enum_inits: Vec::new(),
        }
    }

    /// Fresh temporary C identifier.
    pub(super) fn fresh_temp(&mut self) -> String {
        let name = format!("__ahoy_t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Current indentation prefix (4 spaces per level).
    pub(super) fn pad(&self) -> String {
        "    ".repeat(self.indent)
    }

    // ---- scope bookkeeping ----------------------------------------------

    pub(super) fn in_function(&self) -> bool {
        self.current_function.is_some()
    }

    /// Look up a variable's Ahoy type in function scope, then global.
    pub(super) fn var_type(&self, name: &str) -> Option<&AhoyType> {
        self.function_vars
            .get(name)
            .or_else(|| self.variables.get(name))
    }

    /// True when an assignment to `name` is its first occurrence in the
    /// current scope and must be emitted as a declaration.
    pub(super) fn is_declaration(&self, name: &str) -> bool {
        if self.in_function() {
            !self.function_vars.contains_key(name)
        } else {
            !self.variables.contains_key(name)
        }
    }

    /// Record a declared variable in the current scope. Inside a nested
    /// block, the name is also remembered so it can be re-declared when
    /// the block is entered again.
    pub(super) fn declare_var(&mut self, name: &str, ty: AhoyType) {
        if let AhoyType::Array(Some(elem)) = &ty {
            self.array_element_types
                .insert(name.to_string(), (**elem).clone());
        }
        if ty == AhoyType::Json {
            self.json_variables.insert(name.to_string());
        }
        if self.in_function() {
            self.function_vars.insert(name.to_string(), ty);
        } else {
            self.variables.insert(name.to_string(), ty);
        }
        if let Some(block) = self.block_scopes.last_mut() {
            block.push(name.to_string());
            self.nested_scope_vars.insert(name.to_string());
        }
    }

    /// Enter a nested block (loop or conditional body).
    pub(super) fn push_block_scope(&mut self) {
        self.block_scopes.push(Vec::new());
    }

    /// Leave a nested block: names declared inside drop out of scope so
    /// a re-entry can declare them afresh.
    pub(super) fn pop_block_scope(&mut self) {
        if let Some(names) = self.block_scopes.pop() {
            for name in names {
                if self.in_function() {
                    self.function_vars.remove(&name);
                } else {
                    self.variables.remove(&name);
                }
            }
        }
    }

    /// Enter a function body: fresh local table, empty defer stack.
    pub(super) fn enter_function(&mut self, name: &str) {
        self.current_function = Some(name.to_string());
        self.function_vars.clear();
        self.deferred.clear();
        self.indent = 1;
    }

    pub(super) fn leave_function(&mut self) {
        self.current_function = None;
        self.function_vars.clear();
        self.deferred.clear();
    }

    // ---- type inference bridge ------------------------------------------

    /// Struct field tables in the shape the inference view wants.
    pub(super) fn struct_field_types(&self) -> HashMap<String, Vec<(String, AhoyType)>> {
        self.structs
            .iter()
            .map(|(name, fields)| {
                (
                    name.clone(),
                    fields
                        .iter()
                        .map(|f| (f.name.clone(), f.ahoy.clone()))
                        .collect(),
                )
            })
            .collect()
    }

    /// Infer the Ahoy type of an expression against the current tables.
    pub(super) fn infer_type(&self, expr: &Expr) -> AhoyType {
        let structs = self.struct_field_types();
        let view = TypeView {
            globals: &self.variables,
            locals: if self.in_function() {
                Some(&self.function_vars)
            } else {
                None
            },
            array_elem_types: &self.array_element_types,
            structs: &structs,
            function_returns: &self.info.function_return_types,
            enum_member_types: &self.enum_member_types,
        };
        infer_expr_type(expr, &view)
    }

    /// Resolve an unqualified identifier against the int-backed enums.
    /// A unique match rewrites to `Enum_member`; ambiguity declines
    /// silently and the identifier is left as-is.
    pub(super) fn resolve_enum_member(&self, name: &str) -> Option<String> {
        let mut hit: Option<&str> = None;
        for (enum_name, members) in &self.enums {
            if self.enum_types.get(enum_name) != Some(&AhoyType::Int) {
                continue;
            }
            if members.iter().any(|m| m == name) {
                if hit.is_some() {
                    return None;
                }
                hit = Some(enum_name);
            }
        }
        hit.map(|e| format!("{}_{}", e, name))
    }

    /// The C name a user function is emitted under. `main` becomes
    /// `ahoy_main` so the real C `main` can wrap it.
    pub(super) fn c_function_name(name: &str) -> String {
        if name == "main" {
            "ahoy_main".to_string()
        } else {
            name.to_string()
        }
    }

    /// snake_case -> PascalCase fallback for external calls that were
    /// never found in an imported header.
    pub(super) fn pascal_case(name: &str) -> String {
        name.split('_')
            .filter(|s| !s.is_empty())
            .map(|s| {
                let mut chars = s.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pascal_case() {
        assert_eq!(CodeGen::pascal_case("init_window"), "InitWindow");
        assert_eq!(CodeGen::pascal_case("close"), "Close");
        assert_eq!(CodeGen::pascal_case("get_frame_time"), "GetFrameTime");
    }

    #[test]
    fn test_main_is_renamed() {
        assert_eq!(CodeGen::c_function_name("main"), "ahoy_main");
        assert_eq!(CodeGen::c_function_name("helper"), "helper");
    }

    #[test]
    fn test_block_scope_reentry() {
        let mut cg = CodeGen::new(ProgramInfo::default());
        cg.enter_function("f");
        cg.push_block_scope();
        cg.declare_var("i", AhoyType::Int);
        assert!(!cg.is_declaration("i"));
        cg.pop_block_scope();
        // Re-entering the block may declare `i` again
        assert!(cg.is_declaration("i"));
        assert!(cg.nested_scope_vars.contains("i"));
    }

    #[test]
    fn test_enum_member_resolution_unique_and_ambiguous() {
        let mut cg = CodeGen::new(ProgramInfo::default());
        cg.enums
            .insert("Color".to_string(), vec!["red".to_string(), "green".to_string()]);
        cg.enum_types.insert("Color".to_string(), AhoyType::Int);
        cg.enums
            .insert("Mood".to_string(), vec!["blue".to_string(), "green".to_string()]);
        cg.enum_types.insert("Mood".to_string(), AhoyType::Int);

        assert_eq!(cg.resolve_enum_member("red"), Some("Color_red".to_string()));
        // `green` is in two int-backed enums: declined
        assert_eq!(cg.resolve_enum_member("green"), None);
        assert_eq!(cg.resolve_enum_member("missing"), None);
    }
}
