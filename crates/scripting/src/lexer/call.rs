//! Call and modifier list splitting
//!
//! `act{...}` and `mod{...}` bodies are comma-separated lists whose items
//! may contain nested calls and quoted strings. Splitting tracks bracket
//! depth and quote state so a comma inside `Min(1, 2)` or `"a, b"` never
//! splits an item.

use crate::error::{Result, ScriptError};
use crate::lexer::{is_expr_symbol_char, Cursor};

/// Split text on top-level commas, trimming items and dropping empties
pub fn split_top_level(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            current.push(ch);
            continue;
        }

        match ch {
            '"' => {
                in_quotes = true;
                current.push(ch);
            }
            '(' | '{' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | '}' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    items.push(current);
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a modifier item at its first top-level `=` into key and value
pub fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                return Some((text[..i].trim(), text[i + 1..].trim()));
            }
            _ => {}
        }
    }

    None
}

/// Parse one action item into its call name and raw argument list.
/// A bare symbol is a call with no arguments.
pub fn parse_call(text: &str) -> Result<(String, Vec<String>)> {
    let mut cursor = Cursor::new(text);
    cursor.skip_whitespace();

    let line = cursor.line();
    let name = cursor.read_symbol(is_expr_symbol_char);
    if name.is_empty() {
        return Err(ScriptError::ParseError {
            line,
            message: format!("Expected call name in '{}'", text.trim()),
        });
    }

    cursor.skip_whitespace();
    let args = match cursor.ch() {
        Some('(') => split_top_level(&cursor.capture_balanced('(', ')')?),
        _ => Vec::new(),
    };

    cursor.skip_whitespace();
    if let Some(ch) = cursor.ch() {
        return Err(ScriptError::ParseError {
            line: cursor.line(),
            message: format!("Unexpected character '{}' after call", ch),
        });
    }

    Ok((name, args))
}

/// Strip a surrounding quote pair, resolving delimiter escapes. Returns
/// `None` when the text is not a single quoted literal.
pub fn unquote(text: &str) -> Option<String> {
    let mut cursor = Cursor::new(text.trim());
    if cursor.ch() != Some('"') {
        return None;
    }

    let unquoted = cursor.read_quoted().ok()?;
    cursor.skip_whitespace();
    if cursor.ch().is_none() {
        Some(unquoted)
    } else {
        None
    }
}
