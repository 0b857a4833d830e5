//! Timed action scheduling
//!
//! Every timed action runs as its own tokio task, ticking on an additive
//! deadline: each round extends the previous deadline by the interval
//! instead of re-anchoring on the current time, so long-running schedules
//! do not drift.
//!
//! Per tick, checks run in a fixed order: lifetime period, execution
//! count limit, `while` continuation, `canExecute` gate, then the host
//! action itself. A false gate skips the tick without counting it; a
//! false `while` cancels the task.

use crate::error::{Result, ScriptError};
use crate::eval::{eval_bool, eval_float, resolve_args};
use crate::registry::HostRegistry;
use crate::script::ParsedAction;
use dashmap::DashMap;
use parking_lot::Mutex;
use reflex_core::TaskId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Spawned, first tick not reached yet
    Armed,
    /// Sleeping until the next deadline
    Waiting,
    /// Deadline reached, running the per-tick checks
    Checking,
    /// Ended by period or maxCount
    Completed,
    /// Ended by cancellation or a false `while`
    Cancelled,
}

/// How a finished task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Handle to a spawned timed action
pub struct ScheduledAction {
    id: TaskId,
    state: Arc<Mutex<TaskState>>,
    token: CancellationToken,
    handle: JoinHandle<Result<Outcome>>,
}

impl ScheduledAction {
    /// Task id
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    /// Whether the underlying task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request cancellation; the task notices at its next await point
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the task and return how it ended
    pub async fn join(self) -> Result<Outcome> {
        self.handle.await.map_err(|err| {
            ScriptError::HostError(format!("scheduled task {}: {}", self.id, err))
        })?
    }
}

/// Spawn a timed action. The task registers itself in `tasks` for
/// engine-wide cancellation and removes itself when it ends.
pub(crate) fn spawn(
    id: TaskId,
    action: ParsedAction,
    registry: Arc<HostRegistry>,
    tasks: Arc<DashMap<TaskId, CancellationToken>>,
) -> ScheduledAction {
    let state = Arc::new(Mutex::new(TaskState::Armed));
    let token = CancellationToken::new();
    tasks.insert(id, token.clone());

    let task_state = state.clone();
    let task_token = token.clone();
    let handle = tokio::spawn(async move {
        let result = run_schedule(&action, &registry, &task_state, &task_token).await;
        tasks.remove(&id);
        match &result {
            Ok(outcome) => tracing::debug!("Task {} finished: {:?}", id, outcome),
            Err(err) => tracing::warn!("Task {} failed: {}", id, err),
        }
        result
    });

    ScheduledAction {
        id,
        state,
        token,
        handle,
    }
}

async fn run_schedule(
    action: &ParsedAction,
    registry: &HostRegistry,
    state: &Mutex<TaskState>,
    token: &CancellationToken,
) -> Result<Outcome> {
    // period is fixed at spawn time, even when given as an expression
    let period = if action.period > 0.0 {
        action.period
    } else if let Some(raw) = &action.period_func_raw {
        eval_float(raw, registry)
    } else {
        0.0
    };

    let mut interval = if action.interval > 0.0 {
        action.interval
    } else if let Some(raw) = &action.interval_func_raw {
        eval_float(raw, registry)
    } else {
        0.0
    };

    let start = Instant::now();
    let mut deadline = start;
    let mut executed: u32 = 0;

    loop {
        deadline += to_duration(interval);
        *state.lock() = TaskState::Waiting;

        tokio::select! {
            _ = token.cancelled() => {
                *state.lock() = TaskState::Cancelled;
                return Ok(Outcome::Cancelled);
            }
            _ = time::sleep_until(deadline) => {}
        }

        *state.lock() = TaskState::Checking;

        if period > 0.0 && start.elapsed() >= to_duration(period) {
            *state.lock() = TaskState::Completed;
            return Ok(Outcome::Completed);
        }

        if action.max_count > 0 && executed >= action.max_count {
            *state.lock() = TaskState::Completed;
            return Ok(Outcome::Completed);
        }

        if let Some(raw) = &action.while_raw {
            if !eval_bool(raw, registry) {
                *state.lock() = TaskState::Cancelled;
                return Ok(Outcome::Cancelled);
            }
        }

        let can_execute = action
            .can_execute_raw
            .as_deref()
            .map(|raw| eval_bool(raw, registry))
            .unwrap_or(true);

        if can_execute {
            let args = resolve_args(&action.args, registry);
            registry.call_action(&action.function_name, &args)?;
            executed += 1;
        }

        if let Some(raw) = &action.interval_func_raw {
            interval = eval_float(raw, registry);
        }
    }
}

/// Seconds to a duration; non-positive and non-finite values clamp to zero
fn to_duration(seconds: f64) -> Duration {
    if !(seconds > 0.0) {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
}
