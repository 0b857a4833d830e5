//! Lexer family for the event DSL
//!
//! Four tokenizers share the cursor primitives in this module: the block
//! tokenizer ([`block`]), the call/modifier splitter ([`call`]), the
//! condition tokenizer ([`cond`]) and the arithmetic tokenizer ([`arith`]).
//! Each specialization decides which characters are meaningful; the cursor
//! only knows how to walk the source one char at a time.

use crate::error::{Result, ScriptError};
use std::iter::Peekable;
use std::str::Chars;

pub mod arith;
pub mod block;
pub mod call;
pub mod cond;

pub use arith::ArithLexer;
pub use block::{BlockLexer, BlockToken};
pub use cond::CondLexer;

use call::split_top_level;

/// Token types shared by the condition and arithmetic tokenizers
#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken {
    Number(f64),

    /// Bare symbol: `true`/`false` literal or a zero-argument host call
    Ident(String),

    /// Symbol followed by a parenthesized argument list; args are raw text
    Call { name: String, args: Vec<String> },

    // Logical
    Or,             // ||
    And,            // &&
    Not,            // !

    // Comparison
    Cmp(CmpOp),

    // Arithmetic
    Plus,           // +
    Minus,          // -
    Star,           // *
    Slash,          // /

    // Grouping
    LParen,         // (
    RParen,         // )

    // End of input
    Eof,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Le,             // <=
    Ge,             // >=
    Lt,             // <
    Gt,             // >
    Eq,             // ==
}

/// Characters allowed in expression-level symbols (function names and
/// opaque selector tokens like `@l` or `#f`)
pub fn is_expr_symbol_char(ch: char) -> bool {
    ch.is_alphabetic() || ch == '@' || ch == '#' || ch == '_'
}

/// Characters allowed in block-level symbols; the wider alphabet lets an
/// event header like `[OnHit]` lex as a single symbol
pub fn is_block_symbol_char(ch: char) -> bool {
    is_expr_symbol_char(ch) || ch == '[' || ch == ']' || ch == '='
}

/// Single forward cursor over an immutable source slice
pub struct Cursor<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    ch: Option<char>,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let ch = chars.next();
        Self {
            input: chars,
            line: 1,
            ch,
        }
    }

    /// Current character, `None` at end of input
    pub fn ch(&self) -> Option<char> {
        self.ch
    }

    /// Current line number (1-based)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Advance to the next character
    pub fn advance(&mut self) {
        if self.ch == Some('\n') {
            self.line += 1;
        }
        self.ch = self.input.next();
    }

    /// Skip whitespace, newlines included
    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip the remainder of the current line, consuming the newline
    pub fn skip_line(&mut self) {
        while let Some(ch) = self.ch {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Read a numeric literal; a leading dot is allowed (`.5`)
    pub fn read_number(&mut self) -> Result<f64> {
        let line = self.line;
        let mut num_str = String::new();

        while let Some(ch) = self.ch {
            if ch.is_ascii_digit() || ch == '.' {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        num_str.parse().map_err(|_| ScriptError::ParseError {
            line,
            message: format!("Invalid number: {}", num_str),
        })
    }

    /// Read a symbol over the given alphabet
    pub fn read_symbol(&mut self, is_symbol_char: fn(char) -> bool) -> String {
        let mut symbol = String::new();

        while let Some(ch) = self.ch {
            if is_symbol_char(ch) {
                symbol.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        symbol
    }

    /// Read a quoted string; backslash escapes the delimiter. The cursor
    /// must sit on the opening quote.
    pub fn read_quoted(&mut self) -> Result<String> {
        let line = self.line;
        self.advance(); // Skip opening quote

        let mut s = String::new();

        while let Some(ch) = self.ch {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(s);
                }
                '\\' => {
                    self.advance();
                    match self.ch {
                        Some('"') => {
                            s.push('"');
                            self.advance();
                        }
                        Some('\\') => {
                            s.push('\\');
                            self.advance();
                        }
                        Some(other) => {
                            s.push('\\');
                            s.push(other);
                            self.advance();
                        }
                        None => break,
                    }
                }
                _ => {
                    s.push(ch);
                    self.advance();
                }
            }
        }

        Err(ScriptError::ParseError {
            line,
            message: "Unterminated string".into(),
        })
    }

    /// Capture the raw text between a balanced delimiter pair. The cursor
    /// must sit on the opening delimiter; nesting and quoted strings are
    /// respected, and the closing delimiter is consumed.
    pub fn capture_balanced(&mut self, open: char, close: char) -> Result<String> {
        let line = self.line;
        self.advance(); // Skip opening delimiter

        let mut out = String::new();
        let mut depth = 1usize;
        let mut in_quotes = false;

        while let Some(ch) = self.ch {
            if in_quotes {
                if ch == '\\' {
                    out.push(ch);
                    self.advance();
                    if let Some(escaped) = self.ch {
                        out.push(escaped);
                        self.advance();
                    }
                    continue;
                }
                if ch == '"' {
                    in_quotes = false;
                }
                out.push(ch);
                self.advance();
                continue;
            }

            if ch == '"' {
                in_quotes = true;
            } else if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    return Ok(out);
                }
            }

            out.push(ch);
            self.advance();
        }

        Err(ScriptError::ParseError {
            line,
            message: format!("Unterminated '{}'", open),
        })
    }
}

/// Read a symbol in expression position; if a parenthesized argument list
/// follows, capture it raw and split into top-level arguments.
pub(crate) fn symbol_or_call(cursor: &mut Cursor<'_>) -> Result<ExprToken> {
    let name = cursor.read_symbol(is_expr_symbol_char);
    cursor.skip_whitespace();

    if cursor.ch() == Some('(') {
        let raw = cursor.capture_balanced('(', ')')?;
        Ok(ExprToken::Call {
            name,
            args: split_top_level(&raw),
        })
    } else {
        Ok(ExprToken::Ident(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_number() {
        let mut cursor = Cursor::new("123 45.67 .5");

        assert_eq!(cursor.read_number().unwrap(), 123.0);
        cursor.skip_whitespace();
        assert_eq!(cursor.read_number().unwrap(), 45.67);
        cursor.skip_whitespace();
        assert_eq!(cursor.read_number().unwrap(), 0.5);
    }

    #[test]
    fn test_read_number_invalid() {
        let mut cursor = Cursor::new("1.2.3");
        assert!(cursor.read_number().is_err());
    }

    #[test]
    fn test_read_quoted() {
        let mut cursor = Cursor::new(r#""hello world""#);
        assert_eq!(cursor.read_quoted().unwrap(), "hello world");
    }

    #[test]
    fn test_read_quoted_escaped_delimiter() {
        let mut cursor = Cursor::new(r#""say \"hi\"""#);
        assert_eq!(cursor.read_quoted().unwrap(), r#"say "hi""#);
    }

    #[test]
    fn test_read_quoted_unterminated() {
        let mut cursor = Cursor::new("\"oops");
        assert!(cursor.read_quoted().is_err());
    }

    #[test]
    fn test_read_symbol_alphabets() {
        let mut cursor = Cursor::new("@l#f_x");
        assert_eq!(cursor.read_symbol(is_expr_symbol_char), "@l#f_x");

        let mut cursor = Cursor::new("[OnHit] rest");
        assert_eq!(cursor.read_symbol(is_block_symbol_char), "[OnHit]");
    }

    #[test]
    fn test_symbols_stop_at_digits() {
        let mut cursor = Cursor::new("Buff2");
        assert_eq!(cursor.read_symbol(is_expr_symbol_char), "Buff");
        assert_eq!(cursor.ch(), Some('2'));
    }

    #[test]
    fn test_capture_balanced_nested() {
        let mut cursor = Cursor::new("(Min(1, 2), 3)");
        assert_eq!(cursor.capture_balanced('(', ')').unwrap(), "Min(1, 2), 3");
        assert_eq!(cursor.ch(), None);
    }

    #[test]
    fn test_capture_balanced_quotes() {
        let mut cursor = Cursor::new(r#"{Say("}")};"#);
        assert_eq!(cursor.capture_balanced('{', '}').unwrap(), r#"Say("}")"#);
        assert_eq!(cursor.ch(), Some(';'));
    }

    #[test]
    fn test_capture_balanced_unterminated() {
        let mut cursor = Cursor::new("(1, 2");
        assert!(cursor.capture_balanced('(', ')').is_err());
    }

    #[test]
    fn test_line_tracking() {
        let mut cursor = Cursor::new("a\nb\nc");
        assert_eq!(cursor.line(), 1);
        cursor.skip_line();
        assert_eq!(cursor.line(), 2);
        cursor.skip_line();
        assert_eq!(cursor.ch(), Some('c'));
        assert_eq!(cursor.line(), 3);
    }
}
