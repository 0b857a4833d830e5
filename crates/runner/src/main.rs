//! Reflex - reactive event script runner
//!
//! Loads every script document from the configured directory, triggers
//! the autostart events and keeps the engine alive until Ctrl-C.

use reflex_config::EngineConfig;
use reflex_scripting::{register_builtins, HostRegistry, Outcome, ScriptEngine};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🚀 Reflex engine starting up...");

    let config = EngineConfig::load_default();
    config.display();

    let mut engine = ScriptEngine::new(build_registry());
    let loaded = load_scripts(&mut engine, &config);
    info!("✓ {} script files loaded", loaded);

    if config.dump_parsed {
        match serde_json::to_string_pretty(engine.events()) {
            Ok(json) => info!("Parsed event map:\n{}", json),
            Err(err) => warn!("Failed to serialize event map: {}", err),
        }
    }

    let mut handles = Vec::new();
    for event in &config.autostart {
        info!("Triggering {}", event);
        match engine.execute_event(event) {
            Ok(spawned) => handles.extend(spawned),
            Err(err) => error!("Event {} failed: {}", event, err),
        }
    }
    info!("✓ {} scheduled tasks running", engine.active_tasks());
    info!("Press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, initiating shutdown");

    engine.cancel_all();
    let drain = futures::future::join_all(handles.into_iter().map(|h| h.join()));
    match tokio::time::timeout(Duration::from_secs_f64(config.grace_period), drain).await {
        Ok(results) => {
            let mut completed = 0usize;
            let mut cancelled = 0usize;
            let mut failed = 0usize;
            for result in results {
                match result {
                    Ok(Outcome::Completed) => completed += 1,
                    Ok(Outcome::Cancelled) => cancelled += 1,
                    Err(_) => failed += 1,
                }
            }
            info!(
                "Tasks drained: {} completed, {} cancelled, {} failed",
                completed, cancelled, failed
            );
        }
        Err(_) => warn!(
            "Grace period of {}s elapsed with tasks still running",
            config.grace_period
        ),
    }

    info!("👋 Engine shut down gracefully");
    Ok(())
}

/// Builtins plus the runner's own host surface: logging actions and an
/// uptime clock
fn build_registry() -> HostRegistry {
    let mut registry = HostRegistry::new();
    register_builtins(&mut registry);

    let start = std::time::Instant::now();
    registry.register_function("Now", move |_args| Ok(start.elapsed().as_secs_f64()));

    registry.register_action("Log", |args| {
        info!("[script] {}", args.join(" "));
        Ok(())
    });
    registry.register_action("Trace", |args| {
        tracing::debug!("[script] {}", args.join(" "));
        Ok(())
    });

    registry
}

/// Load every script file from the configured directory in path order.
/// Missing directories and unreadable files are skipped with a warning.
fn load_scripts(engine: &mut ScriptEngine, config: &EngineConfig) -> usize {
    let entries = match fs::read_dir(&config.script_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Script directory '{}' unavailable: {}", config.script_dir, err);
            return 0;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|name| name.to_string_lossy().ends_with(&config.extension))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut loaded = 0;
    for path in &paths {
        match fs::read_to_string(path) {
            Ok(content) => {
                info!("Loading {}", path.display());
                engine.load_script(&content);
                loaded += 1;
            }
            Err(err) => warn!("Skipping {}: {}", path.display(), err),
        }
    }
    loaded
}
