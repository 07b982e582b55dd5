//! Source normalizer
//!
//! The compiler core expects normalized input: tabs expanded to spaces,
//! no trailing whitespace, block-end sentinels (`$`, `⚓`) on their own
//! lines. Single-line constructs are left unwrapped. Formatting is
//! idempotent, and compiling formatted input produces the same C as
//! compiling the original.

/// Spaces per tab stop.
const TAB_WIDTH: usize = 4;

/// Normalize a whole source string.
pub fn format_source(source: &str) -> String {
    let mut out = String::new();
    for line in source.lines() {
        for piece in split_sentinel(line) {
            let expanded = expand_tabs(&piece);
            out.push_str(expanded.trim_end());
            out.push('\n');
        }
    }
    out
}

/// Move a trailing block-end sentinel onto its own line, keeping the
/// line's indentation. Comment lines are left untouched.
fn split_sentinel(line: &str) -> Vec<String> {
    let trimmed = line.trim_end();
    let body = trimmed.trim_start();
    if body.starts_with('?') {
        return vec![line.to_string()];
    }
    for sentinel in ["$", "⚓"] {
        if body != sentinel && body.ends_with(sentinel) {
            let head = trimmed
                .strip_suffix(sentinel)
                .unwrap_or(trimmed)
                .trim_end();
            let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            return vec![head.to_string(), format!("{}{}", indent, sentinel)];
        }
    }
    vec![line.to_string()]
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::new();
    let mut col = 0;
    for c in line.chars() {
        if c == '\t' {
            let next_stop = (col / TAB_WIDTH + 1) * TAB_WIDTH;
            while col < next_stop {
                out.push(' ');
                col += 1;
            }
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_expanded() {
        assert_eq!(format_source("\tx: 1\n"), "    x: 1\n");
        assert_eq!(format_source("if a then\n\t\tb: 2\n"), "if a then\n        b: 2\n");
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        assert_eq!(format_source("x: 1   \ny: 2\t\n"), "x: 1\ny: 2\n");
    }

    #[test]
    fn test_sentinel_moved_to_own_line() {
        assert_eq!(format_source("    y: 1 $\n"), "    y: 1\n    $\n");
        assert_eq!(format_source("y: 1 ⚓\n"), "y: 1\n⚓\n");
    }

    #[test]
    fn test_sentinel_already_alone_untouched() {
        assert_eq!(format_source("$\n"), "$\n");
        assert_eq!(format_source("    ⚓\n"), "    ⚓\n");
    }

    #[test]
    fn test_comment_lines_untouched() {
        assert_eq!(format_source("? keep this $\n"), "? keep this $\n");
    }

    #[test]
    fn test_idempotent() {
        let source = "\tx: 1   \n    y: 2 $\n? note\n";
        let once = format_source(source);
        let twice = format_source(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_formatting_preserves_compilation() {
        let source = "x: 5\t\ny: 10   \nresult: x + y\n";
        let formatted = format_source(source);
        let direct = crate::compile_to_c(source).unwrap();
        let via_formatter = crate::compile_to_c(&formatted).unwrap();
        assert_eq!(direct, via_formatter);
    }
}
