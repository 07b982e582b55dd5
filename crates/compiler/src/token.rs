//! Tokenizer for Ahoy source
//!
//! Produces a flat token stream from source text. Block structure is
//! surfaced as synthetic `Indent`/`Dedent` tokens derived from a stack of
//! indentation columns, so the parser never looks at whitespace itself.
//!
//! Newlines are significant and become `Newline` tokens; a semicolon on
//! the same physical line is tokenized as a newline-equivalent. Lines
//! whose first non-space character is `?` are comments and are consumed
//! entirely. Blank lines and comment lines never change the indentation
//! stack.

use std::fmt;

/// Token kinds. `Indent` and `Dedent` are synthesized from the
/// indentation stack and never come from the raw scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    /// String literal containing `{ident}` placeholders
    FString,
    Char,
    Keyword,
    Punct,
    Newline,
    Indent,
    Dedent,
    Eof,
}

/// A token with its lexeme and 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// True when this token is the given keyword.
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.lexeme == kw
    }

    /// True when this token is the given punctuation.
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.lexeme == p
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

/// Fixed keyword table. Identifiers matching an entry are re-kinded.
const KEYWORDS: &[&str] = &[
    "func", "if", "elseif", "else", "then", "do", "on", "switch", "loop", "till", "from", "to",
    "in", "struct", "enum", "type", "import", "as", "return", "assert", "defer", "halt", "next",
    "when", "is", "and", "or", "not", "true", "false", "greater_than", "lesser_than", "mut",
];

/// Multi-character punctuation, longest first so the scanner can match
/// greedily.
const MULTI_PUNCT: &[&str] = &["::", "..", "<=", ">=", "!="];

const SINGLE_PUNCT: &str = "|:<>[]{}(),;.^&$?+-*/%=";

pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    /// Current 1-based line
    line: usize,
    /// Stack of indentation columns; always starts with column 0
    indent_stack: Vec<usize>,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        Tokenizer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            indent_stack: vec![0],
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole source. The result always ends with `Eof`, and
    /// every `Indent` has a matching `Dedent` before it.
    pub fn tokenize(mut self) -> Result<Vec<Token>, String> {
        // Leading indentation of the very first line
        self.handle_line_start()?;

        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            match ch {
                '\n' => {
                    self.push(TokenKind::Newline, "\n");
                    self.pos += 1;
                    self.line += 1;
                    self.handle_line_start()?;
                }
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                }
                '?' if self.at_line_start() => {
                    // Comment line: consume through end of line
                    self.skip_to_eol();
                }
                '"' => self.scan_string()?,
                '\'' => self.scan_char()?,
                '⚓' => {
                    self.push(TokenKind::Punct, "⚓");
                    self.pos += 1;
                }
                c if c.is_ascii_digit() => self.scan_number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(),
                _ => self.scan_punct()?,
            }
        }

        // Flush open blocks at end of input
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "");
        }
        self.push(TokenKind::Eof, "");
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>) {
        let line = self.line;
        self.tokens.push(Token::new(kind, lexeme, line));
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// True when only whitespace precedes the cursor on this line.
    fn at_line_start(&self) -> bool {
        let mut i = self.pos;
        while i > 0 {
            i -= 1;
            match self.chars[i] {
                ' ' | '\t' | '\r' => continue,
                '\n' => return true,
                _ => return false,
            }
        }
        true
    }

    fn skip_to_eol(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Measure the indentation of the line starting at the cursor and
    /// emit `Indent`/`Dedent` tokens against the stack. Blank lines and
    /// comment lines are consumed without touching the stack.
    fn handle_line_start(&mut self) -> Result<(), String> {
        loop {
            let mut col = 0;
            let mut i = self.pos;
            while let Some(&c) = self.chars.get(i) {
                match c {
                    ' ' => col += 1,
                    '\t' => col += 4,
                    '\r' => {}
                    _ => break,
                }
                i += 1;
            }
            match self.chars.get(i) {
                // Blank line: swallow it, no tokens
                Some('\n') => {
                    self.pos = i + 1;
                    self.line += 1;
                    continue;
                }
                None => {
                    self.pos = i;
                    return Ok(());
                }
                // Comment line: swallow through the newline
                Some('?') => {
                    self.pos = i;
                    self.skip_to_eol();
                    if self.peek() == Some('\n') {
                        self.pos += 1;
                        self.line += 1;
                        continue;
                    }
                    return Ok(());
                }
                Some(_) => {
                    self.pos = i;
                    let current = *self.indent_stack.last().unwrap_or(&0);
                    if col > current {
                        self.indent_stack.push(col);
                        self.push(TokenKind::Indent, "");
                    } else if col < current {
                        while col < *self.indent_stack.last().unwrap_or(&0) {
                            self.indent_stack.pop();
                            self.push(TokenKind::Dedent, "");
                        }
                        if col != *self.indent_stack.last().unwrap_or(&0) {
                            return Err(format!(
                                "at line {}: dedent to column {} matches no enclosing block",
                                self.line, col
                            ));
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    fn scan_word(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        if KEYWORDS.contains(&word.as_str()) {
            self.push(TokenKind::Keyword, word);
        } else {
            self.push(TokenKind::Ident, word);
        }
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' {
                // `1..5` is a range, not a float
                if self.peek_at(1) == Some('.') {
                    break;
                }
                if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                    self.pos += 1;
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.push(TokenKind::Number, text);
    }

    fn scan_string(&mut self) -> Result<(), String> {
        let start_line = self.line;
        self.pos += 1; // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(format!(
                        "at line {}: unterminated string literal",
                        start_line
                    ));
                }
                Some('\\') => {
                    // Escape passthrough: keep the sequence verbatim
                    text.push('\\');
                    self.pos += 1;
                    if let Some(c) = self.peek() {
                        text.push(c);
                        self.pos += 1;
                    }
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        let kind = if has_placeholder(&text) {
            TokenKind::FString
        } else {
            TokenKind::Str
        };
        self.push(kind, text);
        Ok(())
    }

    fn scan_char(&mut self) -> Result<(), String> {
        let start_line = self.line;
        self.pos += 1; // opening quote
        let mut text = String::new();
        match self.peek() {
            Some('\\') => {
                text.push('\\');
                self.pos += 1;
                if let Some(c) = self.peek() {
                    text.push(c);
                    self.pos += 1;
                }
            }
            Some(c) if c != '\'' => {
                text.push(c);
                self.pos += 1;
            }
            _ => {}
        }
        if self.peek() != Some('\'') {
            return Err(format!(
                "at line {}: unterminated char literal",
                start_line
            ));
        }
        self.pos += 1;
        self.push(TokenKind::Char, text);
        Ok(())
    }

    fn scan_punct(&mut self) -> Result<(), String> {
        for multi in MULTI_PUNCT {
            let m: Vec<char> = multi.chars().collect();
            if self.chars[self.pos..].starts_with(&m) {
                self.push(TokenKind::Punct, *multi);
                self.pos += m.len();
                return Ok(());
            }
        }
        let ch = self.chars[self.pos];
        if ch == ';' {
            // Newline-equivalent on the same physical line
            self.push(TokenKind::Newline, ";");
            self.pos += 1;
            return Ok(());
        }
        if SINGLE_PUNCT.contains(ch) {
            self.push(TokenKind::Punct, ch.to_string());
            self.pos += 1;
            return Ok(());
        }
        Err(format!(
            "at line {}: unexpected character '{}'",
            self.line, ch
        ))
    }

}

/// True when the string body contains an `{identifier}` placeholder.
fn has_placeholder(text: &str) -> bool {
    let bytes: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == '{' {
            let mut j = i + 1;
            let mut saw_ident = false;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == '_') {
                saw_ident = true;
                j += 1;
            }
            if saw_ident && j < bytes.len() && bytes[j] == '}' {
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Convenience wrapper over [`Tokenizer`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    Tokenizer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_assignment() {
        let tokens = tokenize("x: 5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].lexeme, "x");
        assert!(tokens[1].is_punct(":"));
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].lexeme, "5");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_indent_dedent_balance() {
        let source = "if x then\n    y: 1\n    if y then\n        z: 2\nw: 3\n";
        let tokens = tokenize(source).unwrap();
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(indents, dedents);
    }

    #[test]
    fn test_blank_and_comment_lines_do_not_change_stack() {
        let source = "if x then\n    y: 1\n\n? a comment\n    z: 2\n";
        let tokens = tokenize(source).unwrap();
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_comment_consumed_entirely() {
        let tokens = tokenize("? this is a comment\nx: 1\n").unwrap();
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_semicolon_is_newline_equivalent() {
        let tokens = tokenize("x: 1; y: 2").unwrap();
        let newline_like = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .count();
        assert_eq!(newline_like, 1);
        assert_eq!(tokens[3].lexeme, ";");
    }

    #[test]
    fn test_float_and_int_literals() {
        let tokens = tokenize("a: 3.14\nb: 42").unwrap();
        assert_eq!(tokens[2].lexeme, "3.14");
        assert_eq!(tokens[6].lexeme, "42");
    }

    #[test]
    fn test_range_not_a_float() {
        let tokens = tokenize("1..5").unwrap();
        assert_eq!(tokens[0].lexeme, "1");
        assert!(tokens[1].is_punct(".."));
        assert_eq!(tokens[2].lexeme, "5");
    }

    #[test]
    fn test_fstring_detection() {
        let tokens = tokenize("s: \"hello {name}\"\nt: \"plain\"").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::FString);
        assert_eq!(tokens[6].kind, TokenKind::Str);
    }

    #[test]
    fn test_escapes_kept_verbatim() {
        let tokens = tokenize(r#"s: "a\nb\"c""#).unwrap();
        assert_eq!(tokens[2].lexeme, r#"a\nb\"c"#);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("s: \"oops\n").unwrap_err();
        assert!(err.contains("unterminated string"));
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_char_literal() {
        let tokens = tokenize("c: 'x'").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Char);
        assert_eq!(tokens[2].lexeme, "x");
    }

    #[test]
    fn test_call_brackets_and_double_colon() {
        let tokens = tokenize("PI :: 3.14\nprint|x|").unwrap();
        assert!(tokens[1].is_punct("::"));
        let pipes = tokens.iter().filter(|t| t.is_punct("|")).count();
        assert_eq!(pipes, 2);
    }

    #[test]
    fn test_keywords_recognized() {
        let tokens = tokenize("loop i from 0 to 10").unwrap();
        assert!(tokens[0].is_keyword("loop"));
        assert!(tokens[2].is_keyword("from"));
        assert!(tokens[4].is_keyword("to"));
    }

    #[test]
    fn test_bad_dedent() {
        let source = "if x then\n        y: 1\n    z: 2\n";
        let err = tokenize(source).unwrap_err();
        assert!(err.contains("matches no enclosing block"));
    }

    #[test]
    fn test_eof_flushes_dedents() {
        let source = "if x then\n    if y then\n        z: 1";
        let tokens = tokenize(source).unwrap();
        let trailing: Vec<TokenKind> = kinds(&tokens[tokens.len() - 3..]);
        assert_eq!(
            trailing,
            vec![TokenKind::Dedent, TokenKind::Dedent, TokenKind::Eof]
        );
    }

    #[test]
    fn test_anchor_sentinel() {
        let tokens = tokenize("x: 1\n⚓\n").unwrap();
        assert!(tokens.iter().any(|t| t.is_punct("⚓")));
    }

    #[test]
    fn test_lines_are_one_based() {
        let tokens = tokenize("a: 1\nb: 2\n").unwrap();
        assert_eq!(tokens[0].line, 1);
        let b = tokens.iter().find(|t| t.lexeme == "b").unwrap();
        assert_eq!(b.line, 2);
    }
}
