//! Built-in host functions
//!
//! A small numeric core every host gets for free: min/max/clamp,
//! rounding and a random range. Hosts layer their own domain functions
//! on top with [`HostRegistry::register_function`].

use crate::error::{Result, ScriptError};
use crate::registry::HostRegistry;
use rand::Rng;

/// Register the built-in function set
pub fn register_builtins(registry: &mut HostRegistry) {
    register_math_functions(registry);
    register_rounding_functions(registry);
    register_random_functions(registry);
}

fn register_math_functions(registry: &mut HostRegistry) {
    registry.register_function("Min", builtin_min);
    registry.register_function("Max", builtin_max);
    registry.register_function("Abs", builtin_abs);
    registry.register_function("Clamp", builtin_clamp);
}

fn register_rounding_functions(registry: &mut HostRegistry) {
    registry.register_function("Floor", builtin_floor);
    registry.register_function("Round", builtin_round);
    registry.register_function("Sqrt", builtin_sqrt);
}

fn register_random_functions(registry: &mut HostRegistry) {
    registry.register_function("Random", builtin_random);
}

/// Parse argument `index` as a float
fn arg_float(name: &str, args: &[String], index: usize) -> Result<f64> {
    let raw = args.get(index).ok_or_else(|| {
        ScriptError::InvalidCall(format!("{} expects at least {} arguments", name, index + 1))
    })?;
    raw.parse().map_err(|_| {
        ScriptError::InvalidCall(format!("{}: argument '{}' is not a number", name, raw))
    })
}

fn builtin_min(args: &[String]) -> Result<f64> {
    Ok(arg_float("Min", args, 0)?.min(arg_float("Min", args, 1)?))
}

fn builtin_max(args: &[String]) -> Result<f64> {
    Ok(arg_float("Max", args, 0)?.max(arg_float("Max", args, 1)?))
}

fn builtin_abs(args: &[String]) -> Result<f64> {
    Ok(arg_float("Abs", args, 0)?.abs())
}

fn builtin_clamp(args: &[String]) -> Result<f64> {
    let value = arg_float("Clamp", args, 0)?;
    let lo = arg_float("Clamp", args, 1)?;
    let hi = arg_float("Clamp", args, 2)?;
    // also rejects NaN bounds, which f64::clamp would panic on
    if !(lo <= hi) {
        return Err(ScriptError::InvalidCall(format!(
            "Clamp: empty range {}..{}",
            lo, hi
        )));
    }
    Ok(value.clamp(lo, hi))
}

fn builtin_floor(args: &[String]) -> Result<f64> {
    Ok(arg_float("Floor", args, 0)?.floor())
}

fn builtin_round(args: &[String]) -> Result<f64> {
    Ok(arg_float("Round", args, 0)?.round())
}

fn builtin_sqrt(args: &[String]) -> Result<f64> {
    let value = arg_float("Sqrt", args, 0)?;
    if value < 0.0 {
        return Err(ScriptError::InvalidCall(format!(
            "Sqrt: negative argument {}",
            value
        )));
    }
    Ok(value.sqrt())
}

/// Uniform random float in `[lo, hi]`; reversed bounds are swapped
fn builtin_random(args: &[String]) -> Result<f64> {
    let a = arg_float("Random", args, 0)?;
    let b = arg_float("Random", args, 1)?;
    if !a.is_finite() || !b.is_finite() {
        return Err(ScriptError::InvalidCall(
            "Random: bounds must be finite".into(),
        ));
    }
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return Ok(lo);
    }
    Ok(rand::thread_rng().gen_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval_float;

    fn registry() -> HostRegistry {
        let mut registry = HostRegistry::new();
        register_builtins(&mut registry);
        registry
    }

    fn call(registry: &HostRegistry, name: &str, args: &[&str]) -> Result<f64> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        registry.call_function(name, &args)
    }

    #[test]
    fn test_math_builtins() {
        let registry = registry();
        assert_eq!(call(&registry, "Min", &["3", "7"]).unwrap(), 3.0);
        assert_eq!(call(&registry, "Max", &["3", "7"]).unwrap(), 7.0);
        assert_eq!(call(&registry, "Abs", &["-4.5"]).unwrap(), 4.5);
        assert_eq!(
            call(&registry, "Clamp", &["150", "0", "100"]).unwrap(),
            100.0
        );
        assert!(call(&registry, "Clamp", &["1", "5", "2"]).is_err());
    }

    #[test]
    fn test_rounding_builtins() {
        let registry = registry();
        assert_eq!(call(&registry, "Floor", &["2.7"]).unwrap(), 2.0);
        assert_eq!(call(&registry, "Round", &["2.5"]).unwrap(), 3.0);
        assert_eq!(call(&registry, "Sqrt", &["9"]).unwrap(), 3.0);
        assert!(call(&registry, "Sqrt", &["-1"]).is_err());
    }

    #[test]
    fn test_random_stays_in_range() {
        let registry = registry();
        for _ in 0..100 {
            let value = call(&registry, "Random", &["1", "3"]).unwrap();
            assert!((1.0..=3.0).contains(&value));

            let swapped = call(&registry, "Random", &["3", "1"]).unwrap();
            assert!((1.0..=3.0).contains(&swapped));
        }
        assert_eq!(call(&registry, "Random", &["5", "5"]).unwrap(), 5.0);
    }

    #[test]
    fn test_argument_errors() {
        let registry = registry();
        assert!(call(&registry, "Min", &["1"]).is_err());
        assert!(call(&registry, "Min", &["a", "b"]).is_err());
    }

    #[test]
    fn test_builtins_compose_in_expressions() {
        let registry = registry();
        assert_eq!(eval_float("Min(3, Max(1, 2))+1", &registry), 3.0);
        assert_eq!(eval_float("Clamp(2*60, 0, 100)", &registry), 100.0);
    }
}
