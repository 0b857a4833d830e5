//! Direct expression evaluation
//!
//! Conditions and arithmetic are evaluated straight off the token stream
//! with precedence climbing; no syntax tree is built. Booleans are floats:
//! anything within EPSILON of zero is false, everything else is true.
//! Both sides of `&&` and `||` are always evaluated, so host calls in a
//! condition run regardless of the other side.
//!
//! Failures never escape the public entry points: a condition that cannot
//! be evaluated is false, an arithmetic expression that cannot be
//! evaluated is zero. Diagnostics go to the log.

use crate::error::{Result, ScriptError};
use crate::lexer::call::unquote;
use crate::lexer::{ArithLexer, CmpOp, CondLexer, ExprToken};
use crate::registry::HostRegistry;
use std::mem;

/// Tolerance used for float equality and truthiness
pub const EPSILON: f64 = 1e-6;

/// Maximum expression nesting accepted by the evaluator. The budget is
/// shared across parentheses, unary operators and nested call arguments.
const MAX_DEPTH: usize = 64;

/// Anything farther than [`EPSILON`] from zero is true
pub fn is_truthy(value: f64) -> bool {
    value.abs() > EPSILON
}

fn bool_to_float(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Token stream abstraction over the two expression tokenizers
pub(crate) trait TokenSource {
    fn next_token(&mut self) -> Result<ExprToken>;
}

impl TokenSource for CondLexer<'_> {
    fn next_token(&mut self) -> Result<ExprToken> {
        CondLexer::next_token(self)
    }
}

impl TokenSource for ArithLexer<'_> {
    fn next_token(&mut self) -> Result<ExprToken> {
        ArithLexer::next_token(self)
    }
}

/// Evaluate a boolean condition against the registry. Any failure is
/// logged and degrades to false.
pub fn eval_bool(expr: &str, registry: &HostRegistry) -> bool {
    match ExprParser::new(CondLexer::new(expr), registry, 0).and_then(|p| p.parse()) {
        Ok(value) => is_truthy(value),
        Err(err) => {
            tracing::debug!("Condition '{}' failed to evaluate: {}", expr, err);
            false
        }
    }
}

/// Evaluate an arithmetic expression against the registry. Any failure is
/// logged and degrades to zero.
pub fn eval_float(expr: &str, registry: &HostRegistry) -> f64 {
    eval_float_at(expr, registry, 0)
}

/// Evaluation entry for nested call arguments: the caller's nesting depth
/// carries over, so call chains draw on the shared [`MAX_DEPTH`] budget.
fn eval_float_at(expr: &str, registry: &HostRegistry, depth: usize) -> f64 {
    match ExprParser::new(ArithLexer::new(expr), registry, depth).and_then(|p| p.parse()) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("Expression '{}' failed to evaluate: {}", expr, err);
            0.0
        }
    }
}

/// Resolve raw argument text into call-time strings. A quoted argument
/// becomes its content; a plain numeral or bare word passes through
/// verbatim; an argument containing a call or an arithmetic operator is
/// evaluated and stringified.
pub(crate) fn resolve_args(args: &[String], registry: &HostRegistry) -> Vec<String> {
    resolve_args_at(args, registry, 0)
}

fn resolve_args_at(args: &[String], registry: &HostRegistry, depth: usize) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if let Some(unquoted) = unquote(arg) {
                unquoted
            } else if arg.parse::<f64>().is_ok() {
                // signed literals stay verbatim; the arithmetic lexer has
                // no unary minus
                arg.clone()
            } else if arg.chars().any(is_expr_operator) {
                eval_float_at(arg, registry, depth).to_string()
            } else {
                arg.clone()
            }
        })
        .collect()
}

fn is_expr_operator(ch: char) -> bool {
    matches!(ch, '(' | '+' | '-' | '*' | '/')
}

/// Precedence-climbing evaluator over a one-token-lookahead stream.
///
/// Levels from loosest to tightest binding: `||`, `&&`, `!`, comparison,
/// additive, multiplicative, factor. Note that `!` binds looser than
/// comparison, so `!3<=5` is `!(3<=5)`.
struct ExprParser<'a, S: TokenSource> {
    source: S,
    current: ExprToken,
    registry: &'a HostRegistry,
    depth: usize,
}

impl<'a, S: TokenSource> ExprParser<'a, S> {
    fn new(mut source: S, registry: &'a HostRegistry, depth: usize) -> Result<Self> {
        let current = source.next_token()?;
        Ok(Self {
            source,
            current,
            registry,
            depth,
        })
    }

    /// Consume the current token and return it
    fn advance(&mut self) -> Result<ExprToken> {
        let next = self.source.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn parse(mut self) -> Result<f64> {
        let value = self.or_level()?;
        if self.current != ExprToken::Eof {
            return Err(ScriptError::EvalError(format!(
                "Unexpected token after expression: {:?}",
                self.current
            )));
        }
        Ok(value)
    }

    fn or_level(&mut self) -> Result<f64> {
        let mut value = self.and_level()?;
        while self.current == ExprToken::Or {
            self.advance()?;
            let rhs = self.and_level()?;
            value = bool_to_float(is_truthy(value) || is_truthy(rhs));
        }
        Ok(value)
    }

    fn and_level(&mut self) -> Result<f64> {
        let mut value = self.unary_level()?;
        while self.current == ExprToken::And {
            self.advance()?;
            let rhs = self.unary_level()?;
            value = bool_to_float(is_truthy(value) && is_truthy(rhs));
        }
        Ok(value)
    }

    fn unary_level(&mut self) -> Result<f64> {
        if self.current == ExprToken::Not {
            self.descend()?;
            self.advance()?;
            let value = self.unary_level()?;
            self.ascend();
            return Ok(bool_to_float(!is_truthy(value)));
        }
        self.comparison_level()
    }

    fn comparison_level(&mut self) -> Result<f64> {
        let lhs = self.additive_level()?;
        let op = match self.current {
            ExprToken::Cmp(op) => op,
            _ => return Ok(lhs),
        };
        self.advance()?;
        let rhs = self.additive_level()?;

        let result = match op {
            CmpOp::Le => lhs <= rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Eq => (lhs - rhs).abs() <= EPSILON,
        };
        Ok(bool_to_float(result))
    }

    fn additive_level(&mut self) -> Result<f64> {
        let mut value = self.term_level()?;
        loop {
            match self.current {
                ExprToken::Plus => {
                    self.advance()?;
                    value += self.term_level()?;
                }
                ExprToken::Minus => {
                    self.advance()?;
                    value -= self.term_level()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term_level(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        loop {
            match self.current {
                ExprToken::Star => {
                    self.advance()?;
                    value *= self.factor()?;
                }
                ExprToken::Slash => {
                    self.advance()?;
                    // IEEE division: zero divisors produce inf/NaN values
                    value /= self.factor()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64> {
        match self.advance()? {
            ExprToken::Number(value) => Ok(value),

            // A bare identifier is a boolean literal or a zero-arg call
            ExprToken::Ident(name) => {
                if name.eq_ignore_ascii_case("true") {
                    Ok(1.0)
                } else if name.eq_ignore_ascii_case("false") {
                    Ok(0.0)
                } else {
                    self.registry.call_function(&name, &[])
                }
            }

            ExprToken::Call { name, args } => {
                self.descend()?;
                let resolved = resolve_args_at(&args, self.registry, self.depth);
                self.ascend();
                self.registry.call_function(&name, &resolved)
            }

            ExprToken::LParen => {
                self.descend()?;
                let value = self.or_level()?;
                self.ascend();
                if self.advance()? != ExprToken::RParen {
                    return Err(ScriptError::EvalError("Expected ')'".into()));
                }
                Ok(value)
            }

            other => Err(ScriptError::EvalError(format!(
                "Unexpected token in expression: {:?}",
                other
            ))),
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ScriptError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }
}
