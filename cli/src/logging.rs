//! Tracing initialisation for the CLI.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log settings: an optional JSON file, overridden by the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directives: "warn", "errwire_core=trace", ...
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid log config")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading log config {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Start from the file named by `ERRWIRE_LOG_CONFIG` (or the defaults),
    /// then apply `ERRWIRE_LOG` and `ERRWIRE_LOG_JSON`.
    pub fn load() -> anyhow::Result<Self> {
        let config = match std::env::var_os("ERRWIRE_LOG_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        Ok(config.with_overrides(
            std::env::var("ERRWIRE_LOG").ok(),
            std::env::var("ERRWIRE_LOG_JSON").ok(),
        ))
    }

    fn with_overrides(mut self, level: Option<String>, json: Option<String>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(json) = json {
            self.json = matches!(json.as_str(), "1" | "true");
        }
        self
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for command output.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
