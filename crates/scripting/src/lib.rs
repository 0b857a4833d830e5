//! # Reflex Scripting System
//!
//! This crate implements the reactive event DSL: documents declare named
//! events whose actions call back into host-registered functions, either
//! inline or on a timed schedule.
//!
//! ## Features
//! - Resilient block parser (event headers, if/else nesting, act/mod statements)
//! - Direct expression evaluation over the token stream, no syntax tree
//! - Host function and action registry with a built-in numeric core
//! - Additive-deadline scheduler with per-task cancellation
//!
//! ## Pipeline
//!
//! [`parse_script`] turns a document into an [`EventMap`]. A
//! [`ScriptEngine`] owns the map together with a [`HostRegistry`];
//! triggering an event walks its actions in declaration order, gates each
//! on its composed condition and spawns timed ones as [`ScheduledAction`]
//! tasks.

pub mod error;
pub mod lexer;
pub mod script;
mod action;
pub mod eval;
pub mod registry;
pub mod builtins;
pub mod scheduler;
pub mod engine;

pub use builtins::register_builtins;
pub use engine::ScriptEngine;
pub use error::{Result, ScriptError};
pub use eval::{eval_bool, eval_float, EPSILON};
pub use registry::HostRegistry;
pub use scheduler::{Outcome, ScheduledAction, TaskState};
pub use script::{parse_script, EventMap, ParsedAction, ParsedEvent};
