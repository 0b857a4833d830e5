//! Host function and action registry

use crate::error::Result;
use std::collections::HashMap;

type HostFunction = Box<dyn Fn(&[String]) -> Result<f64> + Send + Sync>;
type HostAction = Box<dyn Fn(&[String]) -> Result<()> + Send + Sync>;

/// Named host callbacks available to scripts.
///
/// Functions return a float and are called from conditions and
/// arithmetic; actions perform effects and are called from `act`
/// statements. Unknown names are not errors: a missing function
/// evaluates to zero and a missing action is a no-op, each with a
/// warning, so a script referencing an unregistered name degrades
/// instead of failing.
#[derive(Default)]
pub struct HostRegistry {
    functions: HashMap<String, HostFunction>,
    actions: HashMap<String, HostAction>,
}

impl HostRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value-returning host function
    pub fn register_function<N, F>(&mut self, name: N, func: F)
    where
        N: Into<String>,
        F: Fn(&[String]) -> Result<f64> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(func));
    }

    /// Register an effectful host action
    pub fn register_action<N, F>(&mut self, name: N, action: F)
    where
        N: Into<String>,
        F: Fn(&[String]) -> Result<()> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Box::new(action));
    }

    /// Call a host function by name
    pub fn call_function(&self, name: &str, args: &[String]) -> Result<f64> {
        match self.functions.get(name) {
            Some(func) => func(args),
            None => {
                tracing::warn!("Unknown host function: {}", name);
                Ok(0.0)
            }
        }
    }

    /// Call a host action by name
    pub fn call_action(&self, name: &str, args: &[String]) -> Result<()> {
        match self.actions.get(name) {
            Some(action) => action(args),
            None => {
                tracing::warn!("Unknown host action: {}", name);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_register_and_call() {
        let mut registry = HostRegistry::new();
        registry.register_function("Double", |args| {
            let value: f64 = args[0]
                .parse()
                .map_err(|_| ScriptError::InvalidCall("Double".into()))?;
            Ok(value * 2.0)
        });

        let result = registry.call_function("Double", &["4".into()]).unwrap();
        assert_eq!(result, 8.0);
    }

    #[test]
    fn test_unknown_names_degrade() {
        let registry = HostRegistry::new();
        assert_eq!(registry.call_function("Missing", &[]).unwrap(), 0.0);
        assert!(registry.call_action("Missing", &[]).is_ok());
    }

    #[test]
    fn test_action_side_effects() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = HostRegistry::new();
        {
            let count = count.clone();
            registry.register_action("Tick", move |_args| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        registry.call_action("Tick", &[]).unwrap();
        registry.call_action("Tick", &[]).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_host_errors_pass_through() {
        let mut registry = HostRegistry::new();
        registry.register_function("Fail", |_args| {
            Err(ScriptError::HostError("bad state".into()))
        });

        assert!(registry.call_function("Fail", &[]).is_err());
    }
}
