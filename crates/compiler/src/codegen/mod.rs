//! C code generation
//!
//! Turns the analyzed AST into a single self-contained C translation
//! unit. The emission is split into focused submodules:
//!
//! - `state.rs`: the `CodeGen` context bag (symbol tables, buffers,
//!   per-function state)
//! - `error.rs`: `CodeGenError`
//! - `program.rs`: pass ordering and final section assembly
//! - `statements.rs`: statement dispatch, assignments, control flow,
//!   loops, `print`
//! - `expressions.rs`: expression text, literals, f-strings
//! - `calls.rs`: built-ins, user calls, named arguments, method routing,
//!   map/filter pipelines, external C names
//! - `functions.rs`: function bodies, multi-return records, defer flush
//! - `enums.rs`: the five enum emission strategies
//! - `structs.rs`: user structs with variant flattening and printers
//! - `runtime.rs`: the synthesized C runtime (hash map, dynamic array,
//!   string helpers, JSON) as data-driven templates
//!
//! # Output shape
//!
//! The generated C requires GCC statement expressions, designated
//! initializers and `intptr_t`. Section order is fixed so every
//! identifier is declared before use, and two runs over the same input
//! produce byte-identical output.

mod calls;
mod enums;
mod error;
mod expressions;
mod functions;
mod program;
mod runtime;
mod state;
mod statements;
mod structs;

pub use error::CodeGenError;
pub use state::CodeGen;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::parser::parse;

    fn compile(source: &str) -> Result<String, String> {
        let program = parse(source)?;
        let info = analyze(&program);
        let mut codegen = CodeGen::new(info);
        codegen.generate(&program).map_err(|e| e.to_string())
    }

    #[test]
    fn test_arithmetic_and_print_format() {
        let source = "\
x: 5
y: 10
result: x + y
print|\"Result: %d\\n\", result|
";
        let c = compile(source).unwrap();
        assert!(c.contains("static int x;"));
        assert!(c.contains("x = 5;"));
        assert!(c.contains("result = (x + y);"));
        assert!(c.contains("printf(\"Result: %d\\n\", result);"));
    }

    #[test]
    fn test_conditional_uses_c_operators() {
        let source = "\
flag: true
if flag and not false then x: 1
";
        let c = compile(source).unwrap();
        assert!(c.contains("static bool flag;"));
        assert!(c.contains("if ((flag && !(false)))"));
    }

    #[test]
    fn test_tuple_unpack_of_multi_return() {
        let source = "\
func divmod |a: int, b: int| int, int
    return a / b, a % b

q, r: divmod|7, 3|
";
        let c = compile(source).unwrap();
        assert!(c.contains("} divmod_return;"));
        assert!(c.contains("divmod_return divmod(int a, int b);"));
        assert!(c.contains("= divmod(7, 3);"));
        assert!(c.contains("q = "));
        assert!(c.contains(".ret0;"));
        assert!(c.contains(".ret1;"));
    }

    #[test]
    fn test_array_methods_and_print() {
        let source = "\
a: <1, 2, 3>
a.push|4|
print|a|
total: a.sum||
";
        let c = compile(source).unwrap();
        assert!(c.contains("ahoy_array_push"));
        assert!(c.contains("ahoy_print_array(&a);"));
        assert!(c.contains("ahoy_array_sum"));
        assert!(c.contains("typedef struct {\n    intptr_t* data;"));
    }

    #[test]
    fn test_dict_iteration_traverses_buckets() {
        let source = "\
d: {a: 1, b: 2}
loop k, v in d do print|k, v|
";
        let c = compile(source).unwrap();
        assert!(c.contains("AHOY_MAP_BUCKETS"));
        assert!(c.contains("->next"));
        assert!(c.contains("char* k = "));
        assert!(c.contains("ahoy_entry_number"));
        // The value prints through the per-value-type formatter
        assert!(c.contains("ahoy_print_value"));
    }

    #[test]
    fn test_string_enum_and_type_probe() {
        let source = "\
enum Color string
    red: \"FF0000\"
    green: \"00FF00\"
    blue: \"0000FF\"

t: Color.type
name: Color.red
";
        let c = compile(source).unwrap();
        assert!(c.contains("static Color_enum Color"));
        assert!(c.contains("\"enum:string\""));
        assert!(c.contains("Color.red"));
    }

    #[test]
    fn test_empty_program_is_valid() {
        let c = compile("").unwrap();
        assert!(c.contains("int main(void) {"));
        assert!(c.contains("return 0;"));
        assert_eq!(c.matches("int main(void)").count(), 1);
    }

    #[test]
    fn test_main_renamed_and_wrapped() {
        let source = "func main ||\n    print|\"ahoy\"|\n";
        let c = compile(source).unwrap();
        assert!(c.contains("void ahoy_main(void)"));
        assert!(c.contains("ahoy_main();"));
        assert_eq!(c.matches("int main(void)").count(), 1);
    }

    #[test]
    fn test_constant_redeclaration_fails_with_no_output() {
        let source = "PI :: 3.14\nPI :: 3.15\n";
        let err = compile(source).unwrap_err();
        assert!(err.contains("PI"), "error was: {}", err);
        assert!(err.contains("already declared"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let source = "\
func main ||
    a: <1, 2, 3>
    a.push|4|
    d: {x: 1}
    print|a|
    print|d|
";
        let first = compile(source).unwrap();
        let second = compile(source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unqualified_enum_member_rewrite() {
        let source = "\
enum Status int
    ok: 0
    failed: 1

s: failed
";
        let c = compile(source).unwrap();
        assert!(c.contains("s = Status_failed;"));
    }

    #[test]
    fn test_ambiguous_enum_member_left_alone() {
        let source = "\
enum A int
    shared: 0

enum B int
    shared: 1

s: shared
";
        let c = compile(source).unwrap();
        assert!(c.contains("s = shared;"));
    }

    #[test]
    fn test_switch_statement_int_and_ranges() {
        let source = "\
x: 5
switch x on
    1 then
        y: 1
    2, 3 then
        y: 2
    4..9 then
        y: 3
    _ then
        y: 0
";
        let c = compile(source).unwrap();
        assert!(c.contains("switch (x) {"));
        assert!(c.contains("case 2:"));
        assert!(c.contains("case 3:"));
        assert!(c.contains("case 4 ... 9:"));
        assert!(c.contains("default:"));
    }

    #[test]
    fn test_string_switch_uses_strcmp_chain() {
        let source = "\
cmd: \"start\"
switch cmd on
    \"start\" then
        x: 1
    \"stop\" then
        x: 2
    _ then
        x: 0
";
        let c = compile(source).unwrap();
        assert!(c.contains("strcmp"));
        assert!(!c.contains("switch (cmd)"));
    }

    #[test]
    fn test_switch_as_expression_assigns_target() {
        let source = "\
x: 2
label: switch x on
    1 then
        \"one\"
    _ then
        \"many\"
";
        let c = compile(source).unwrap();
        assert!(c.contains("static char* label;"));
        assert!(c.contains("label = \"one\";"));
        assert!(c.contains("label = \"many\";"));
    }

    #[test]
    fn test_loop_forms_compile_to_c_loops() {
        let source = "\
loop i from 0 to 10
    print|i|
loop till x is 3
    x: 1
loop
    halt
";
        let c = compile(source).unwrap();
        assert!(c.contains("for (int i = 0; i < 10; i++)"));
        assert!(c.contains("while (!("));
        assert!(c.contains("while (1) {"));
        assert!(c.contains("break;"));
    }

    #[test]
    fn test_infer_function_with_no_return_is_void() {
        let source = "func log_it |msg: string| infer\n    print|msg|\n";
        let c = compile(source).unwrap();
        assert!(c.contains("void log_it(char* msg)"));
    }

    #[test]
    fn test_named_arguments_reordered_with_defaults() {
        let source = "\
func connect |host: string: \"localhost\", port: int: 8080|
    print|host, port|

connect|port: 9000|
";
        let c = compile(source).unwrap();
        assert!(c.contains("connect(\"localhost\", 9000);"));
    }

    #[test]
    fn test_dict_access_compiles_to_map_get_and_put() {
        let source = "\
d: {a: 1}
d{\"b\"}: 2
v: d{\"a\"}
";
        let c = compile(source).unwrap();
        assert!(c.contains("ahoy_map_put(&d, \"b\""));
        assert!(c.contains("ahoy_map_get(&d, \"a\")"));
        assert!(c.contains("static double v;"));
    }

    #[test]
    fn test_dict_sourced_print_uses_tag_formatter() {
        let source = "\
d: {a: 1}
v: d{\"a\"}
print|v|
";
        let c = compile(source).unwrap();
        assert!(c.contains("ahoy_map_print_value(&d, \"a\");"));
    }

    #[test]
    fn test_fstring_print() {
        let source = "\
name: \"sailor\"
print|\"ahoy {name}\"|
";
        let c = compile(source).unwrap();
        assert!(c.contains("printf(\"ahoy %s\\n\", name);"));
    }

    #[test]
    fn test_map_pipeline_inlines_statement_expression() {
        let source = "\
a: <1, 2, 3>
b: a.map|x: x * 2|
";
        let c = compile(source).unwrap();
        assert!(c.contains("({ AhoyArray"));
        assert!(c.contains("(x * 2)"));
    }

    #[test]
    fn test_json_runtime_emitted_on_demand() {
        let with_json = compile("j, err: read_json|\"data.json\"|\n").unwrap();
        assert!(with_json.contains("ahoy_read_json"));
        assert!(with_json.contains("AhoyJSON"));

        let without = compile("x: 1\n").unwrap();
        assert!(!without.contains("AhoyJSON"));
    }

    #[test]
    fn test_imports_preserve_order_and_bracket_style() {
        let source = "\
import \"raylib.h\"
import \"./local_util.h\"
x: 1
";
        let c = compile(source).unwrap();
        let sys = c.find("#include <raylib.h>").unwrap();
        let local = c.find("#include \"./local_util.h\"").unwrap();
        assert!(sys < local);
    }

    #[test]
    fn test_unknown_external_call_pascal_cased() {
        let c = compile("init_window|800, 600|\n").unwrap();
        assert!(c.contains("InitWindow(800, 600);"));
    }

    #[test]
    fn test_assert_adds_header() {
        let c = compile("assert 1 < 2\n").unwrap();
        assert!(c.contains("#include <assert.h>"));
        assert!(c.contains("assert((1 < 2));"));
    }

    #[test]
    fn test_struct_object_literal_with_defaults() {
        let source = "\
struct Point
    x: int
    y: int: 7

p: Point{x: 1}
print|p|
";
        let c = compile(source).unwrap();
        assert!(c.contains("} Point;"));
        assert!(c.contains("(Point){ .x = 1, .y = 7 }"));
        assert!(c.contains("ahoy_print_struct_Point"));
    }

    #[test]
    fn test_pointer_deref_assignment() {
        let source = "^p: 5\n";
        let c = compile(source).unwrap();
        assert!(c.contains("*p = 5;"));
    }

    #[test]
    fn test_runtime_helpers_only_when_used() {
        let c = compile("x: 1\n").unwrap();
        // The hash map core is unconditional
        assert!(c.contains("ahoy_map_put"));
        // Arrays and their helpers are not
        assert!(!c.contains("ahoy_array_new"));
        assert!(!c.contains("ahoy_str_upper"));
    }
}
