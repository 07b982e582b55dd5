//! Ahoy Compiler Library
//!
//! Whole-program transpilation from `.ahoy` source to a single
//! self-contained C translation unit, plus the surrounding plumbing:
//! source normalization, C header discovery for imports, and invocation
//! of the system C compiler.
//!
//! # Pipeline
//!
//! ```text
//! source text -> tokens -> AST -> analysis -> C text
//! ```
//!
//! Each stage runs to completion before the next starts; the pipeline
//! is synchronous, single-threaded, and deterministic - identical input
//! produces byte-identical C.
//!
//! ```rust
//! let c = ahoyc::compile_to_c("x: 5\nprint|\"x is %d\\n\", x|\n").unwrap();
//! assert!(c.contains("int main(void)"));
//! ```

pub mod analysis;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod formatter;
pub mod headers;
pub mod parser;
pub mod token;
pub mod types;

pub use analysis::{ProgramInfo, analyze};
pub use ast::Program;
pub use codegen::{CodeGen, CodeGenError};
pub use config::CompilerConfig;
pub use parser::Parser;
pub use token::{Token, TokenKind, Tokenizer};
pub use types::AhoyType;

use ast::Stmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Compile a source string to C with default configuration.
pub fn compile_to_c(source: &str) -> Result<String, String> {
    compile_to_c_with_config(source, None, &CompilerConfig::default())
}

/// Compile a source string to C.
///
/// `source_dir` anchors relative header lookups for `import`
/// statements; pass `None` when the source did not come from a file.
pub fn compile_to_c_with_config(
    source: &str,
    source_dir: Option<&Path>,
    config: &CompilerConfig,
) -> Result<String, String> {
    debug!(bytes = source.len(), "tokenize+parse");
    let program = parser::parse(source)?;

    debug!(statements = program.statements.len(), "analyze");
    let info = analysis::analyze(&program);
    let mut codegen = CodeGen::new(info);

    // Header discovery: imported headers contribute original C names
    for stmt in &program.statements {
        if let Stmt::Import {
            path, namespace, ..
        } = stmt
        {
            if let Some(text) = headers::locate_and_read(path, source_dir, &config.include_paths) {
                let names = headers::scan_header(&text);
                debug!(header = %path, functions = names.len(), "header scan");
                codegen.register_c_functions(namespace.as_deref(), names);
            }
        }
    }

    debug!("generate C");
    codegen.generate(&program).map_err(|e| e.to_string())
}

/// Normalize, compile, and write the C file for one program. Returns
/// the path of the written `.c` file.
pub fn emit_c_file(
    input: &Path,
    output: Option<&Path>,
    config: &CompilerConfig,
) -> Result<PathBuf, String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    let normalized = formatter::format_source(&source);
    let c_text = compile_to_c_with_config(&normalized, input.parent(), config)?;
    let c_path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("c"),
    };
    fs::write(&c_path, c_text)
        .map_err(|e| format!("Failed to write {}: {}", c_path.display(), e))?;
    Ok(c_path)
}

/// Compile a `.ahoy` file to an executable: emit the C next to the
/// output, then hand it to the configured C compiler.
pub fn compile_file(
    input: &Path,
    output: Option<&Path>,
    config: &CompilerConfig,
) -> Result<PathBuf, String> {
    let exe_path = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension(""),
    };
    let c_path = emit_c_file(input, Some(&exe_path.with_extension("c")), config)?;

    // The generated C needs GCC statement expressions; gcc and clang
    // both accept them
    let result = Command::new(&config.cc)
        .arg(&c_path)
        .arg("-o")
        .arg(&exe_path)
        .output()
        .map_err(|e| {
            format!(
                "Failed to run {}: {}. Install a C compiler or set `cc` in {}.",
                config.cc,
                e,
                config::MANIFEST_NAME
            )
        })?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(format!("{} failed:\n{}", config.cc, stderr));
    }

    if !config.keep_c {
        fs::remove_file(&c_path).ok();
    }
    Ok(exe_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_to_c_happy_path() {
        let c = compile_to_c("x: 5\n").unwrap();
        assert!(c.contains("#include <stdio.h>"));
        assert!(c.contains("int main(void)"));
    }

    #[test]
    fn test_compile_to_c_parse_error() {
        let err = compile_to_c("func |\n").unwrap_err();
        assert!(err.contains("at line 1"));
    }

    #[test]
    fn test_emit_c_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("hello.ahoy");
        fs::write(&input, "print|\"ahoy\"|\n").unwrap();
        let c_path = emit_c_file(&input, None, &CompilerConfig::default()).unwrap();
        assert_eq!(c_path, dir.path().join("hello.c"));
        let c = fs::read_to_string(&c_path).unwrap();
        assert!(c.contains("printf"));
    }

    #[test]
    fn test_emit_c_is_deterministic_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("p.ahoy");
        fs::write(&input, "a: <1, 2>\nprint|a|\n").unwrap();
        let first = emit_c_file(&input, None, &CompilerConfig::default()).unwrap();
        let first_text = fs::read_to_string(&first).unwrap();
        let second_text = fs::read_to_string(
            &emit_c_file(&input, None, &CompilerConfig::default()).unwrap(),
        )
        .unwrap();
        assert_eq!(first_text, second_text);
    }

    #[test]
    fn test_import_discovers_header_names() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("gfx.h");
        fs::write(&header, "void OpenCanvas(int w, int h);\n").unwrap();
        let input = dir.path().join("app.ahoy");
        fs::write(&input, "import \"gfx.h\"\nopen_canvas|800, 600|\n").unwrap();
        let c_path = emit_c_file(&input, None, &CompilerConfig::default()).unwrap();
        let c = fs::read_to_string(&c_path).unwrap();
        assert!(c.contains("OpenCanvas(800, 600);"));
    }

    #[test]
    fn test_namespaced_import_routes_calls() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("gfx.h");
        fs::write(&header, "void OpenCanvas(int w, int h);\n").unwrap();
        let input = dir.path().join("app.ahoy");
        fs::write(
            &input,
            "import \"gfx.h\" as gfx\ngfx.open_canvas|800, 600|\n",
        )
        .unwrap();
        let c_path = emit_c_file(&input, None, &CompilerConfig::default()).unwrap();
        let c = fs::read_to_string(&c_path).unwrap();
        assert!(c.contains("OpenCanvas(800, 600);"));
    }
}
