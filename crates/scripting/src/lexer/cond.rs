//! Condition-syntax tokenizer
//!
//! Full expression token set: boolean operators, comparisons, arithmetic,
//! numbers and host calls.

use crate::error::{Result, ScriptError};
use crate::lexer::{is_expr_symbol_char, symbol_or_call, CmpOp, Cursor, ExprToken};

/// Condition tokenizer
pub struct CondLexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> CondLexer<'a> {
    /// Create a new condition tokenizer
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

            Some('|') => {
                self.cursor.advance();
                if self.cursor.ch() == Some('|') {
                    self.cursor.advance();
                    Ok(ExprToken::Or)
                } else {
                    Err(ScriptError::ParseError {
                        line,
                        message: "Expected '||'".into(),
                    })
                }
            }

            Some('&') => {
                self.cursor.advance();
                if self.cursor.ch() == Some('&') {
                    self.cursor.advance();
                    Ok(ExprToken::And)
                } else {
                    Err(ScriptError::ParseError {
                        line,
                        message: "Expected '&&'".into(),
                    })
                }
            }

            Some('!') => {
                self.cursor.advance();
                Ok(ExprToken::Not)
            }

            Some('<') => {
                self.cursor.advance();
                if self.cursor.ch() == Some('=') {
                    self.cursor.advance();
                    Ok(ExprToken::Cmp(CmpOp::Le))
                } else {
                    Ok(ExprToken::Cmp(CmpOp::Lt))
                }
            }

            Some('>') => {
                self.cursor.advance();
                if self.cursor.ch() == Some('=') {
                    self.cursor.advance();
                    Ok(ExprToken::Cmp(CmpOp::Ge))
                } else {
                    Ok(ExprToken::Cmp(CmpOp::Gt))
                }
            }

            Some('=') => {
                self.cursor.advance();
                if self.cursor.ch() == Some('=') {
                    self.cursor.advance();
                    Ok(ExprToken::Cmp(CmpOp::Eq))
                } else {
                    Err(ScriptError::ParseError {
                        line,
                        message: "Expected '=='".into(),
                    })
                }
            }

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
                    message: format!("Unexpected character: {}", ch),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators() {
        let mut lexer = CondLexer::new("|| && ! <= >= < > == + - * /");

        assert_eq!(lexer.next_token().unwrap(), ExprToken::Or);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::And);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Not);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Cmp(CmpOp::Le));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Cmp(CmpOp::Ge));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Cmp(CmpOp::Lt));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Cmp(CmpOp::Gt));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Cmp(CmpOp::Eq));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Plus);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Minus);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Star);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Slash);
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Eof);
    }

    #[test]
    fn test_call_with_raw_args() {
        let mut lexer = CondLexer::new("Clamp(HpMin(), 0, 100) <= 50");

        assert_eq!(
            lexer.next_token().unwrap(),
            ExprToken::Call {
                name: "Clamp".into(),
                args: vec!["HpMin()".into(), "0".into(), "100".into()],
            }
        );
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Cmp(CmpOp::Le));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Number(50.0));
    }

    #[test]
    fn test_bare_ident() {
        let mut lexer = CondLexer::new("true @l");

        assert_eq!(lexer.next_token().unwrap(), ExprToken::Ident("true".into()));
        assert_eq!(lexer.next_token().unwrap(), ExprToken::Ident("@l".into()));
    }

    #[test]
    fn test_single_ampersand_fails() {
        let mut lexer = CondLexer::new("1 & 2");

        assert_eq!(lexer.next_token().unwrap(), ExprToken::Number(1.0));
        assert!(lexer.next_token().is_err());
    }
}
