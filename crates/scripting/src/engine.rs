//! Script engine
//!
//! Owns the registry, the parsed event map and the live task table. An
//! event trigger walks the event's actions in declaration order,
//! evaluates each condition against the registry and either runs the
//! action inline or hands it to the scheduler.

use crate::error::Result;
use crate::eval::{eval_bool, resolve_args};
use crate::registry::HostRegistry;
use crate::scheduler::{spawn, ScheduledAction};
use crate::script::{parse_script, EventMap};
use dashmap::DashMap;
use reflex_core::{IdGenerator, TaskId};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reactive script engine
pub struct ScriptEngine {
    registry: Arc<HostRegistry>,
    events: EventMap,
    tasks: Arc<DashMap<TaskId, CancellationToken>>,
    ids: IdGenerator,
}

impl ScriptEngine {
    /// Create an engine around a prepared registry
    pub fn new(registry: HostRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            events: EventMap::new(),
            tasks: Arc::new(DashMap::new()),
            ids: IdGenerator::new(),
        }
    }

    /// Host registry backing this engine
    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    /// Events currently loaded
    pub fn events(&self) -> &EventMap {
        &self.events
    }

    /// Parse a document and merge its events into the engine. An event
    /// declared in an earlier load appends its new actions rather than
    /// being replaced.
    pub fn load_script(&mut self, text: &str) {
        let parsed = parse_script(text);
        let action_count: usize = parsed.values().map(|e| e.actions.len()).sum();
        tracing::info!("Loaded {} events with {} actions", parsed.len(), action_count);

        for (name, event) in parsed {
            match self.events.entry(name) {
                Entry::Occupied(mut slot) => slot.get_mut().actions.extend(event.actions),
                Entry::Vacant(slot) => {
                    slot.insert(event);
                }
            }
        }
    }

    /// Trigger an event. Untimed actions run inline in declaration
    /// order; timed actions are spawned and their handles returned.
    /// Triggering an event no script declares is a logged no-op.
    ///
    /// An inline action failure stops the remaining actions of this
    /// trigger; effects already performed stand.
    pub fn execute_event(&self, name: &str) -> Result<Vec<ScheduledAction>> {
        let event = match self.events.get(name) {
            Some(event) => event,
            None => {
                tracing::debug!("Ignoring unknown event: {}", name);
                return Ok(Vec::new());
            }
        };

        tracing::debug!("Executing event {} with {} actions", name, event.actions.len());
        let mut scheduled = Vec::new();

        for action in &event.actions {
            if let Some(condition) = &action.condition {
                if !eval_bool(condition, &self.registry) {
                    continue;
                }
            }

            if action.is_timed() {
                let id = self.ids.get_available_id();
                scheduled.push(spawn(
                    id,
                    action.clone(),
                    self.registry.clone(),
                    self.tasks.clone(),
                ));
            } else {
                let args = resolve_args(&action.args, &self.registry);
                self.registry.call_action(&action.function_name, &args)?;
            }
        }

        Ok(scheduled)
    }

    /// Number of live scheduled tasks
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel every live scheduled task
    pub fn cancel_all(&self) {
        tracing::info!("Cancelling {} scheduled tasks", self.tasks.len());
        for entry in self.tasks.iter() {
            entry.value().cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use crate::scheduler::Outcome;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        hp: AtomicU32,
        combo: AtomicU32,
        heal: AtomicU32,
        burst: AtomicU32,
        idle: AtomicU32,
    }

    fn partition_engine() -> (ScriptEngine, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let mut registry = HostRegistry::new();

        {
            let c = counters.clone();
            registry.register_function("HpMin", move |_| Ok(c.hp.load(Ordering::SeqCst) as f64));
        }
        {
            let c = counters.clone();
            registry
                .register_function("ComboCount", move |_| Ok(c.combo.load(Ordering::SeqCst) as f64));
        }
        {
            let c = counters.clone();
            registry.register_action("UseHeal", move |_| {
                c.heal.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        {
            let c = counters.clone();
            registry.register_action("UseBurst", move |_| {
                c.burst.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        {
            let c = counters.clone();
            registry.register_action("UseIdle", move |_| {
                c.idle.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let mut engine = ScriptEngine::new(registry);
        engine.load_script(
            "[OnHpCheck]\nif(HpMin()<=100){\n act{UseHeal()};\n} else if(ComboCount()>=5){\n act{UseBurst()};\n} else {\n act{UseIdle()};\n}\n",
        );
        (engine, counters)
    }

    #[test]
    fn test_event_partition_behavior() {
        let (engine, counters) = partition_engine();

        counters.hp.store(50, Ordering::SeqCst);
        engine.execute_event("OnHpCheck").unwrap();
        assert_eq!(counters.heal.load(Ordering::SeqCst), 1);
        assert_eq!(counters.burst.load(Ordering::SeqCst), 0);
        assert_eq!(counters.idle.load(Ordering::SeqCst), 0);

        counters.hp.store(200, Ordering::SeqCst);
        counters.combo.store(10, Ordering::SeqCst);
        engine.execute_event("OnHpCheck").unwrap();
        assert_eq!(counters.heal.load(Ordering::SeqCst), 1);
        assert_eq!(counters.burst.load(Ordering::SeqCst), 1);
        assert_eq!(counters.idle.load(Ordering::SeqCst), 0);

        counters.combo.store(0, Ordering::SeqCst);
        engine.execute_event("OnHpCheck").unwrap();
        assert_eq!(counters.heal.load(Ordering::SeqCst), 1);
        assert_eq!(counters.burst.load(Ordering::SeqCst), 1);
        assert_eq!(counters.idle.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_event_is_noop() {
        let engine = ScriptEngine::new(HostRegistry::new());
        let handles = engine.execute_event("Nope").unwrap();
        assert!(handles.is_empty());
    }

    #[test]
    fn test_actions_run_in_declaration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HostRegistry::new();
        {
            let order = order.clone();
            registry.register_action("Record", move |args| {
                order.lock().unwrap().push(args[0].clone());
                Ok(())
            });
        }

        let mut engine = ScriptEngine::new(registry);
        engine.load_script("[E]\nact{Record(1)};\nact{Record(2), Record(3)};\n");
        engine.execute_event("E").unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_load_script_appends_across_loads() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = HostRegistry::new();
        {
            let count = count.clone();
            registry.register_action("Hit", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let mut engine = ScriptEngine::new(registry);
        engine.load_script("[E]\nact{Hit()};\n");
        engine.load_script("[E]\nact{Hit()};\n");
        engine.execute_event("E").unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn test_inline_error_stops_trigger() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = HostRegistry::new();
        registry.register_action("Boom", |_| Err(ScriptError::HostError("bad".into())));
        {
            let count = count.clone();
            registry.register_action("After", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let mut engine = ScriptEngine::new(registry);
        engine.load_script("[E]\nact{Boom()};\nact{After()};\n");

        assert!(engine.execute_event("E").is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_actions_spawn_and_cancel() {
        let count = Arc::new(AtomicU32::new(0));
        let mut registry = HostRegistry::new();
        {
            let count = count.clone();
            registry.register_action("Pulse", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let mut engine = ScriptEngine::new(registry);
        engine.load_script("[E]\nact{Pulse()} mod{interval=1};\n");

        let mut handles = engine.execute_event("E").unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(engine.active_tasks(), 1);

        tokio::time::sleep(Duration::from_secs_f64(2.5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        engine.cancel_all();
        let outcome = handles.remove(0).join().await.unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(engine.active_tasks(), 0);
    }
}
