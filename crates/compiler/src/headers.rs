//! C header discovery for imports
//!
//! `import "raylib.h"` makes the generator try to locate the header
//! (beside the source file, then on the configured include paths) and
//! scan it for declared function names. Each name is recorded under its
//! snake_case spelling so Ahoy call sites written snake_case resolve to
//! the original C casing. A header that cannot be found is skipped
//! silently; call sites then fall back to the snake_case to PascalCase
//! rule.
//!
//! The scanner is a line-oriented text scan, not a C parser: it looks
//! for `ReturnType Name(args);`-shaped declarations and ignores
//! preprocessor lines, typedefs and comments. That is enough for the
//! flat function lists real C API headers carry.

use std::fs;
use std::path::{Path, PathBuf};

/// Locate an imported header and return its text.
///
/// Absolute and `./`-relative paths are tried as given (relative to the
/// importing file's directory); bare names are tried against the search
/// paths and the common system include root.
pub fn locate_and_read(
    import_path: &str,
    source_dir: Option<&Path>,
    search_paths: &[PathBuf],
) -> Option<String> {
    let mut candidates = Vec::new();
    let as_path = Path::new(import_path);
    if as_path.is_absolute() {
        candidates.push(as_path.to_path_buf());
    } else {
        if let Some(dir) = source_dir {
            candidates.push(dir.join(import_path));
        }
        for base in search_paths {
            candidates.push(base.join(import_path));
        }
        candidates.push(PathBuf::from("/usr/include").join(import_path));
        candidates.push(PathBuf::from("/usr/local/include").join(import_path));
    }
    for candidate in candidates {
        if let Ok(text) = fs::read_to_string(&candidate) {
            return Some(text);
        }
    }
    None
}

/// Scan header text for declared function names. Returns
/// `(snake_case, original)` pairs.
pub fn scan_header(text: &str) -> Vec<(String, String)> {
    let mut names = Vec::new();
    let mut in_block_comment = false;
    for raw_line in text.lines() {
        let mut line = raw_line.trim();
        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    line = line[end + 2..].trim();
                    in_block_comment = false;
                }
                None => continue,
            }
        }
        if let Some(start) = line.find("/*") {
            if let Some(end) = line[start..].find("*/") {
                // Comment closed on the same line; keep what surrounds it
                let head = &line[..start];
                let tail = &line[start + end + 2..];
                if let Some(name) = declaration_name(&format!("{} {}", head, tail)) {
                    push_name(&mut names, name);
                }
                continue;
            }
            in_block_comment = true;
            line = line[..start].trim();
        }
        if let Some(cut) = line.find("//") {
            line = line[..cut].trim();
        }
        if let Some(name) = declaration_name(line) {
            push_name(&mut names, name);
        }
    }
    names
}

fn push_name(names: &mut Vec<(String, String)>, name: String) {
    let snake = to_snake_case(&name);
    if !names.iter().any(|(s, _)| s == &snake) {
        names.push((snake, name));
    }
}

/// Extract a declared function name from one header line, if the line
/// is a function declaration.
fn declaration_name(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty()
        || line.starts_with('#')
        || line.starts_with("typedef")
        || line.starts_with('{')
        || line.starts_with('}')
        || line.starts_with('*')
    {
        return None;
    }
    // A declaration ends its parameter list with `);`
    if !line.contains("(") || !line.contains(");") {
        return None;
    }
    let before_paren = line.split('(').next()?;
    let name = before_paren
        .split_whitespace()
        .last()?
        .trim_start_matches('*');
    if name.is_empty() {
        return None;
    }
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    // A name alone on the line is a macro invocation, not a declaration
    if before_paren.split_whitespace().count() < 2 {
        return None;
    }
    Some(name.to_string())
}

/// `InitWindow` -> `init_window`, `GetFPS` -> `get_fps`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if i > 0 && (prev_lower || next_lower) && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_simple_declarations() {
        let header = "\
void InitWindow(int width, int height, const char *title);
void CloseWindow(void);
bool WindowShouldClose(void);
";
        let names = scan_header(header);
        assert!(names.contains(&("init_window".to_string(), "InitWindow".to_string())));
        assert!(names.contains(&("close_window".to_string(), "CloseWindow".to_string())));
        assert!(names.contains(&(
            "window_should_close".to_string(),
            "WindowShouldClose".to_string()
        )));
    }

    #[test]
    fn test_scan_skips_preprocessor_and_typedefs() {
        let header = "\
#define RLAPI
#include <stdarg.h>
typedef struct Color { int r; } Color;
RLAPI void DrawText(const char *text, int x, int y, int size, Color color);
";
        let names = scan_header(header);
        assert_eq!(names.len(), 1);
        assert_eq!(names[0], ("draw_text".to_string(), "DrawText".to_string()));
    }

    #[test]
    fn test_scan_skips_comments() {
        let header = "\
// void NotReal(int x);
/* void AlsoNotReal(void); */
void Real(void);
";
        let names = scan_header(header);
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].1, "Real");
    }

    #[test]
    fn test_pointer_return_types() {
        let header = "char *TextFormat(const char *text);\n";
        let names = scan_header(header);
        assert_eq!(names[0], ("text_format".to_string(), "TextFormat".to_string()));
    }

    #[test]
    fn test_snake_case_conversion() {
        assert_eq!(to_snake_case("InitWindow"), "init_window");
        assert_eq!(to_snake_case("GetFPS"), "get_fps");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("DrawFPSCounter"), "draw_fps_counter");
    }

    #[test]
    fn test_locate_reads_relative_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let header_path = dir.path().join("mylib.h");
        std::fs::write(&header_path, "void MyFunc(void);\n").unwrap();
        let text = locate_and_read("mylib.h", Some(dir.path()), &[]).unwrap();
        assert!(text.contains("MyFunc"));
        assert!(locate_and_read("missing.h", Some(dir.path()), &[]).is_none());
    }
}
