//! Arithmetic-syntax tokenizer
//!
//! Subset of the condition tokenizer for interval/period/argument
//! sub-expressions: numbers, host calls, `+ - * /` and grouping parens.
//! Boolean operator characters fail the lexical unit here.

use crate::error::{Result, ScriptError};
use crate::lexer::{is_expr_symbol_char, symbol_or_call, Cursor, ExprToken};

/// Arithmetic tokenizer
pub struct ArithLexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> ArithLexer<'a> {
    /// Create a new arithmetic tokenizer
    pub fn new(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input),
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<ExprToken> {
        self.cursor.skip_whitespace();
        let line = self.cursor.line();

        match self.cursor.ch() {
            None => Ok(ExprToken::Eof),

            Some(ch) if ch.is_ascii_digit() || ch == '.' => {
                Ok(ExprToken::Number(self.cursor.read_number()?))
            }

            Some(ch) if is_expr_symbol_char(ch) => symbol_or_call(&mut self.cursor),

            Some('+') => {
                self.cursor.advance();
                Ok(ExprToken::Plus)
            }
            Some('-') => {
                self.cursor.advance();
                Ok(ExprToken::Minus)
            }
            Some('*') => {
                self.cursor.advance();
                Ok(ExprToken::Star)
            }
            Some('/') => {
                self.cursor.advance();
                Ok(ExprToken::Slash)
            }

            Some('(') => {
                self.cursor.advance();
                Ok(ExprToken::LParen)
            }
            Some(')') => {
                self.cursor.advance();
                Ok(ExprToken::RParen)
            }

            Some(ch) => {
                self.cursor.advance();
                Err(ScriptError::ParseError {
                    line,
                    message: format!("Unexpected character in arithmetic expression: {}", ch),
                })
            }
        }
    }
}
