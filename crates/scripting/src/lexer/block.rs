//! Block-syntax tokenizer
//!
//! Tokenizes the top-level document structure: event headers, the
//! `if`/`else`/`act`/`mod` keywords, braces and statement terminators.
//! Keywords are classified post-hoc from symbol text, so they are not
//! reserved at the character level; a function literally named `act`
//! would misparse (documented limitation).

use crate::error::{Result, ScriptError};
use crate::lexer::{is_block_symbol_char, Cursor};

/// Block-level token types
#[derive(Debug, Clone, PartialEq)]
pub enum BlockToken {
    /// `[Name]` event header, brackets stripped
    Event(String),

    // Keywords
    If,
    Else,
    Act,
    Mod,

    /// Any other symbol
    Ident(String),

    // Delimiters
    LBrace,         // {
    RBrace,         // }
    Semicolon,      // ;

    // End of input
    Eof,
}

/// Block tokenizer
pub struct BlockLexer<'a> {
    cursor: Cursor<'a>,
    token_line: usize,
}

impl<'a> BlockLexer<'a> {
    /// Create a new block tokenizer
    pub fn new(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input),
            token_line: 1,
        }
    }

    /// Current line number
    pub fn line(&self) -> usize {
        self.cursor.line()
    }

    /// Line on which the most recent token started
    pub fn token_line(&self) -> usize {
        self.token_line
    }

    /// Skip the remainder of the current line (parse recovery)
    pub fn skip_to_next_line(&mut self) {
        self.cursor.skip_line();
    }

    /// Get the next token; `#`-prefixed comments are skipped to end of line
    pub fn next_token(&mut self) -> Result<BlockToken> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.ch() == Some('#') {
                self.cursor.skip_line();
            } else {
                break;
            }
        }
        self.token_line = self.cursor.line();

        match self.cursor.ch() {
            None => Ok(BlockToken::Eof),

            Some('{') => {
                self.cursor.advance();
                Ok(BlockToken::LBrace)
            }
            Some('}') => {
                self.cursor.advance();
                Ok(BlockToken::RBrace)
            }
            Some(';') => {
                self.cursor.advance();
                Ok(BlockToken::Semicolon)
            }

            Some(ch) if is_block_symbol_char(ch) => {
                let symbol = self.cursor.read_symbol(is_block_symbol_char);
                Ok(classify(symbol))
            }

            Some(ch) => {
                let line = self.cursor.line();
                self.cursor.advance();
                Err(ScriptError::ParseError {
                    line,
                    message: format!("Unexpected character: {}", ch),
                })
            }
        }
    }

    /// Capture a parenthesized condition span following `if`/`else if`
    pub fn capture_condition(&mut self) -> Result<String> {
        self.cursor.skip_whitespace();
        if self.cursor.ch() != Some('(') {
            return Err(ScriptError::ParseError {
                line: self.cursor.line(),
                message: "Expected '(' after 'if'".into(),
            });
        }
        Ok(self.cursor.capture_balanced('(', ')')?.trim().to_string())
    }

    /// Capture a braced body span following `act`/`mod`
    pub fn capture_block_body(&mut self) -> Result<String> {
        self.cursor.skip_whitespace();
        if self.cursor.ch() != Some('{') {
            return Err(ScriptError::ParseError {
                line: self.cursor.line(),
                message: "Expected '{'".into(),
            });
        }
        self.cursor.capture_balanced('{', '}')
    }
}

/// Classify symbol text into keywords, event headers and plain identifiers
fn classify(symbol: String) -> BlockToken {
    match symbol.as_str() {
        "if" => BlockToken::If,
        "else" => BlockToken::Else,
        "act" => BlockToken::Act,
        "mod" => BlockToken::Mod,
        _ => {
            if symbol.len() > 2 && symbol.starts_with('[') && symbol.ends_with(']') {
                BlockToken::Event(symbol[1..symbol.len() - 1].trim().to_string())
            } else {
                BlockToken::Ident(symbol)
            }
        }
    }
}
