//! Reflex Configuration Management
//!
//! Loads runner configuration from a `key = value` file. Parsing is
//! permissive: unknown keys and unreadable values fall back to defaults
//! with a log line, never an error.

use std::fs;
use std::path::Path;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory scanned for script documents (from "scriptdir" option)
    pub script_dir: String,
    /// Script file extension (from "extension" option)
    pub extension: String,
    /// Events triggered after loading, in order (from "autostart" option)
    pub autostart: Vec<String>,
    /// Dump the parsed event map as JSON after loading (from "dumpparsed" option)
    pub dump_parsed: bool,
    /// Seconds to wait for scheduled tasks to drain at shutdown
    /// (from "graceperiod" option)
    pub grace_period: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script_dir: "scripts".into(),
            extension: ".rfx".into(),
            autostart: vec!["OnStartup".into()],
            dump_parsed: false,
            grace_period: 5.0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load `reflex.conf` from the working directory, falling back to
    /// defaults when it does not exist
    pub fn load_default() -> Self {
        match Self::load_from_file("reflex.conf") {
            Ok(config) => config,
            Err(_) => {
                tracing::info!("No reflex.conf found, using defaults");
                Self::default()
            }
        }
    }

    /// Parse configuration file content
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();
                config.parse_option(key, value);
            }
        }

        config
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "scriptdir" => self.script_dir = value.into(),
            "extension" => {
                self.extension = if value.starts_with('.') {
                    value.into()
                } else {
                    format!(".{}", value)
                };
            }
            "autostart" => {
                self.autostart = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "dumpparsed" => {
                self.dump_parsed = value.parse().unwrap_or(false);
            }
            "graceperiod" => {
                match value.parse::<f64>() {
                    Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => {
                        self.grace_period = seconds;
                    }
                    _ => tracing::debug!("Ignoring invalid graceperiod: {}", value),
                }
            }
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  Script dir: {}", self.script_dir);
        tracing::info!("  Extension: {}", self.extension);
        tracing::info!("  Autostart: {}", self.autostart.join(", "));
        tracing::info!("  Dump parsed: {}", self.dump_parsed);
        tracing::info!("  Grace period: {}s", self.grace_period);
    }
}
