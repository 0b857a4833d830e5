//! Script data model and block parser
//!
//! Parses a DSL document into an event → actions map. Parsing is
//! resilient: a malformed statement is skipped with a warning and parsing
//! resumes at the next line, so one bad statement cannot lose the rest of
//! a document.

use crate::action::parse_action_block;
use crate::error::{Result, ScriptError};
use crate::lexer::{BlockLexer, BlockToken};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum `if` nesting depth accepted by the block parser
const MAX_NESTING: usize = 64;

/// Parsed scripts indexed by event name
pub type EventMap = HashMap<String, ParsedEvent>;

/// A named event section and its actions, in declaration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEvent {
    /// Event name (unique key)
    pub name: String,

    /// Actions in declaration order
    pub actions: Vec<ParsedAction>,
}

impl ParsedEvent {
    /// Create a new empty event
    pub fn new(name: String) -> Self {
        Self {
            name,
            actions: Vec::new(),
        }
    }
}

/// A single parsed action statement, immutable after parse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedAction {
    /// Host action name
    pub function_name: String,

    /// Raw argument text, resolved lazily at call time
    pub args: Vec<String>,

    /// Boolean expression derived from enclosing if/else nesting
    pub condition: Option<String>,

    /// Per-tick execution gate
    pub can_execute_raw: Option<String>,

    /// Per-tick continuation condition; false cancels the task
    pub while_raw: Option<String>,

    /// Tick interval in seconds; 0 means unset
    pub interval: f64,

    /// Raw interval expression, re-evaluated every tick
    pub interval_func_raw: Option<String>,

    /// Total lifetime in seconds; 0 means unset
    pub period: f64,

    /// Raw period expression, evaluated once at schedule time
    pub period_func_raw: Option<String>,

    /// Maximum executions; 0 means unlimited
    pub max_count: u32,
}

impl ParsedAction {
    /// Create an action with no condition and no modifiers
    pub fn new(function_name: String, args: Vec<String>) -> Self {
        Self {
            function_name,
            args,
            condition: None,
            can_execute_raw: None,
            while_raw: None,
            interval: 0.0,
            interval_func_raw: None,
            period: 0.0,
            period_func_raw: None,
            max_count: 0,
        }
    }

    /// Whether this action is handed to the scheduler when triggered
    pub fn is_timed(&self) -> bool {
        self.interval > 0.0 || self.interval_func_raw.is_some()
    }
}

/// Parse-time stack of active condition strings, one per open
/// `if`/`else` scope
#[derive(Debug, Default)]
pub struct ConditionStack {
    entries: Vec<String>,
}

impl ConditionStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Push a condition entry for an opened scope
    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
    }

    /// Pop the entry for a closed scope
    pub fn pop(&mut self) {
        self.entries.pop();
    }

    /// AND of every entry on the stack, each clause parenthesized;
    /// `None` when no scope is open
    pub fn compose(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|entry| format!("({})", entry))
                .collect::<Vec<_>>()
                .join(" && "),
        )
    }
}

/// Parse a DSL document into an event map. Never fails: malformed input
/// is skipped line by line with diagnostics.
pub fn parse_script(text: &str) -> EventMap {
    BlockParser::new(text).parse()
}

/// Block parser with one-token lookahead
struct BlockParser<'a> {
    lexer: BlockLexer<'a>,
    current: BlockToken,
    stack: ConditionStack,
    events: EventMap,
    current_event: Option<String>,
}

impl<'a> BlockParser<'a> {
    fn new(text: &'a str) -> Self {
        let mut lexer = BlockLexer::new(text);
        let current = Self::next_or_skip(&mut lexer);
        Self {
            lexer,
            current,
            stack: ConditionStack::new(),
            events: HashMap::new(),
            current_event: None,
        }
    }

    /// Next token, skipping lines the tokenizer cannot read
    fn next_or_skip(lexer: &mut BlockLexer<'a>) -> BlockToken {
        loop {
            match lexer.next_token() {
                Ok(token) => return token,
                Err(err) => {
                    tracing::debug!("Skipping unreadable input: {}", err);
                    lexer.skip_to_next_line();
                }
            }
        }
    }

    fn advance(&mut self) {
        self.current = Self::next_or_skip(&mut self.lexer);
    }

    /// Statement-level recovery. Sync tokens (event headers, closing
    /// braces, semicolons) are kept; a lookahead token already taken from
    /// a later line is kept too, so a failure near a line end does not eat
    /// the following statement. Otherwise the offending line is dropped.
    fn recover(&mut self, stmt_line: usize) {
        match self.current {
            BlockToken::Event(_)
            | BlockToken::RBrace
            | BlockToken::Semicolon
            | BlockToken::Eof => return,
            _ => {}
        }
        if self.lexer.token_line() > stmt_line {
            return;
        }
        self.lexer.skip_to_next_line();
        self.advance();
    }

    fn parse(mut self) -> EventMap {
        loop {
            match self.current.clone() {
                BlockToken::Eof => break,

                BlockToken::Event(name) => {
                    self.events
                        .entry(name.clone())
                        .or_insert_with(|| ParsedEvent::new(name.clone()));
                    self.current_event = Some(name);
                    self.advance();
                }

                BlockToken::If | BlockToken::Act if self.current_event.is_some() => {
                    let stmt_line = self.lexer.token_line();
                    if let Err(err) = self.parse_statement() {
                        tracing::warn!("Skipping malformed statement: {}", err);
                        self.recover(stmt_line);
                    }
                }

                BlockToken::Semicolon | BlockToken::RBrace => {
                    tracing::debug!("Skipping stray token at line {}", self.lexer.token_line());
                    self.advance();
                }

                other => {
                    tracing::debug!(
                        "Skipping stray input at line {}: {:?}",
                        self.lexer.token_line(),
                        other
                    );
                    self.lexer.skip_to_next_line();
                    self.advance();
                }
            }
        }
        self.events
    }

    fn parse_statement(&mut self) -> Result<()> {
        match self.current {
            BlockToken::If => self.parse_if(),
            BlockToken::Act => self.parse_act(),
            _ => Err(ScriptError::ParseError {
                line: self.lexer.token_line(),
                message: format!("Unexpected token: {:?}", self.current),
            }),
        }
    }

    fn parse_if(&mut self) -> Result<()> {
        if self.stack.depth() >= MAX_NESTING {
            return Err(ScriptError::ParseError {
                line: self.lexer.token_line(),
                message: format!("If nesting exceeds {} levels", MAX_NESTING),
            });
        }

        let first = self.lexer.capture_condition()?;
        self.advance();

        let mut accum = first.clone();
        self.stack.push(first);
        let body = self.parse_body();
        self.stack.pop();
        body?;

        while self.current == BlockToken::Else {
            self.advance();

            if self.current == BlockToken::If {
                let cond = self.lexer.capture_condition()?;
                self.advance();

                self.stack.push(format!("!({}) && ({})", accum, cond));
                let body = self.parse_body();
                self.stack.pop();
                body?;

                accum = format!("({}) || ({})", accum, cond);
            } else {
                self.stack.push(format!("!({})", accum));
                let body = self.parse_body();
                self.stack.pop();
                body?;
                break;
            }
        }

        Ok(())
    }

    fn parse_body(&mut self) -> Result<()> {
        if self.current != BlockToken::LBrace {
            return Err(ScriptError::ParseError {
                line: self.lexer.token_line(),
                message: "Expected '{'".into(),
            });
        }
        self.advance();

        loop {
            match self.current.clone() {
                BlockToken::RBrace => {
                    self.advance();
                    return Ok(());
                }

                BlockToken::Eof => {
                    return Err(ScriptError::ParseError {
                        line: self.lexer.token_line(),
                        message: "Unterminated block".into(),
                    });
                }

                BlockToken::Semicolon => {
                    self.advance();
                }

                BlockToken::If | BlockToken::Act => {
                    let stmt_line = self.lexer.token_line();
                    if let Err(err) = self.parse_statement() {
                        tracing::warn!("Skipping malformed statement: {}", err);
                        self.recover(stmt_line);
                    }
                }

                other => {
                    return Err(ScriptError::ParseError {
                        line: self.lexer.token_line(),
                        message: format!("Unexpected token in block: {:?}", other),
                    });
                }
            }
        }
    }

    fn parse_act(&mut self) -> Result<()> {
        let act_body = self.lexer.capture_block_body()?;
        self.advance();

        let mod_body = if self.current == BlockToken::Mod {
            let body = self.lexer.capture_block_body()?;
            self.advance();
            Some(body)
        } else {
            None
        };

        if self.current != BlockToken::Semicolon {
            return Err(ScriptError::ParseError {
                line: self.lexer.token_line(),
                message: "Expected ';' after act statement".into(),
            });
        }

        let actions = parse_action_block(&act_body, mod_body.as_deref(), self.stack.compose())?;
        self.advance();

        if let Some(name) = self.current_event.clone() {
            if let Some(event) = self.events.get_mut(&name) {
                event.actions.extend(actions);
            }
        }
        Ok(())
    }
}
