//! Action list and modifier parsing
//!
//! An `act{...}` body holds one or more host calls; the optional
//! `mod{...}` body holds `key = value` scheduling modifiers shared by
//! every call in the statement. Modifier parsing is permissive: unknown
//! keys and unreadable values are logged and ignored.

use crate::error::Result;
use crate::lexer::call::{parse_call, split_key_value, split_top_level};
use crate::script::ParsedAction;

/// Scheduling modifiers parsed from a `mod{...}` body
#[derive(Debug, Default)]
struct ParsedModifiers {
    can_execute_raw: Option<String>,
    while_raw: Option<String>,
    interval: f64,
    interval_func_raw: Option<String>,
    period: f64,
    period_func_raw: Option<String>,
    max_count: u32,
}

impl ParsedModifiers {
    fn apply(&self, action: &mut ParsedAction) {
        action.can_execute_raw = self.can_execute_raw.clone();
        action.while_raw = self.while_raw.clone();
        action.interval = self.interval;
        action.interval_func_raw = self.interval_func_raw.clone();
        action.period = self.period;
        action.period_func_raw = self.period_func_raw.clone();
        action.max_count = self.max_count;
    }
}

/// A numeric value is a literal number of seconds; anything else is kept
/// as a raw expression to evaluate later
fn set_timing(value: &str, literal: &mut f64, func: &mut Option<String>) {
    if let Ok(seconds) = value.parse::<f64>() {
        if seconds.is_finite() {
            *literal = seconds;
            *func = None;
            return;
        }
    }
    if value.is_empty() {
        tracing::debug!("Ignoring empty timing modifier");
        return;
    }
    *literal = 0.0;
    *func = Some(value.to_string());
}

fn parse_modifiers(body: &str) -> ParsedModifiers {
    let mut modifiers = ParsedModifiers::default();

    for item in split_top_level(body) {
        let (key, value) = match split_key_value(&item) {
            Some(pair) => pair,
            None => {
                tracing::debug!("Ignoring modifier without '=': {}", item);
                continue;
            }
        };

        match key {
            "interval" => {
                set_timing(value, &mut modifiers.interval, &mut modifiers.interval_func_raw)
            }
            "period" => set_timing(value, &mut modifiers.period, &mut modifiers.period_func_raw),
            "canExecute" => {
                if !value.is_empty() {
                    modifiers.can_execute_raw = Some(value.to_string());
                }
            }
            "while" => {
                if !value.is_empty() {
                    modifiers.while_raw = Some(value.to_string());
                }
            }
            "maxCount" => match value.parse::<u32>() {
                Ok(count) if count > 0 => modifiers.max_count = count,
                _ => tracing::debug!("Ignoring invalid maxCount: {}", value),
            },
            _ => tracing::debug!("Ignoring unknown modifier key: {}", key),
        }
    }

    modifiers
}

/// Parse an `act{...}` body and its optional `mod{...}` body into
/// finished actions. Every call in the list shares the same condition and
/// modifiers.
pub(crate) fn parse_action_block(
    act_body: &str,
    mod_body: Option<&str>,
    condition: Option<String>,
) -> Result<Vec<ParsedAction>> {
    let modifiers = mod_body.map(parse_modifiers).unwrap_or_default();

    let mut actions = Vec::new();
    for item in split_top_level(act_body) {
        let (name, args) = parse_call(&item)?;
        let mut action = ParsedAction::new(name, args);
        action.condition = condition.clone();
        modifiers.apply(&mut action);
        actions.push(action);
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(body: &str, modifiers: &str) -> ParsedAction {
        let mut actions = parse_action_block(body, Some(modifiers), None).unwrap();
        assert_eq!(actions.len(), 1);
        actions.remove(0)
    }

    #[test]
    fn test_literal_modifiers() {
        let action = single("Fire()", "interval=2, maxCount=5");

        assert_eq!(action.interval, 2.0);
        assert_eq!(action.max_count, 5);
        assert_eq!(action.period, 0.0);
        assert_eq!(action.interval_func_raw, None);
        assert_eq!(action.can_execute_raw, None);
        assert_eq!(action.while_raw, None);
        assert!(action.is_timed());
    }

    #[test]
    fn test_dynamic_interval() {
        let action = single("Fire()", "interval=RandFloat(1, 3)");

        assert_eq!(action.interval, 0.0);
        assert_eq!(action.interval_func_raw.as_deref(), Some("RandFloat(1, 3)"));
        assert!(action.is_timed());
    }

    #[test]
    fn test_gate_modifiers() {
        let action = single("Fire()", "while=HpMin()>0, canExecute=IsReady()");

        assert_eq!(action.while_raw.as_deref(), Some("HpMin()>0"));
        assert_eq!(action.can_execute_raw.as_deref(), Some("IsReady()"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let action = single("Fire()", "speed=9, maxCount=2, interval");

        assert_eq!(action.max_count, 2);
        assert_eq!(action.interval, 0.0);
    }

    #[test]
    fn test_invalid_max_count_ignored() {
        for bad in ["maxCount=0", "maxCount=-3", "maxCount=abc"] {
            assert_eq!(single("Fire()", bad).max_count, 0);
        }
    }

    #[test]
    fn test_modifiers_shared_across_actions() {
        let actions =
            parse_action_block("A(1), B(\"x,y\")", Some("period=7"), Some("(C())".into()))
                .unwrap();

        assert_eq!(actions.len(), 2);
        for action in &actions {
            assert_eq!(action.period, 7.0);
            assert_eq!(action.condition.as_deref(), Some("(C())"));
        }
        assert_eq!(actions[0].args, vec!["1"]);
        assert_eq!(actions[1].args, vec!["\"x,y\""]);
    }

    #[test]
    fn test_bare_name_call() {
        let actions = parse_action_block("Explode", None, None).unwrap();

        assert_eq!(actions[0].function_name, "Explode");
        assert!(actions[0].args.is_empty());
    }

    #[test]
    fn test_malformed_call_errors() {
        assert!(parse_action_block("123()", None, None).is_err());
    }

    #[test]
    fn test_empty_body_yields_no_actions() {
        assert!(parse_action_block("", None, None).unwrap().is_empty());
    }
}
