//! Structured logging setup.
//!
//! Logs go to stderr so stdout stays free for results and JSON summaries.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include the event target
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Level for a `-v` count: 0 keeps the configured level, then info, debug, trace
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.log_level = "info".to_string(),
            2 => self.log_level = "debug".to_string(),
            _ => self.log_level = "trace".to_string(),
        }
        self
    }
}

/// Install the global subscriber.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(TelemetryConfig::default().log_level, "warn");
    }

    #[test]
    fn test_verbosity_raises_level() {
        let base = TelemetryConfig::default();
        assert_eq!(base.clone().with_verbosity(0).log_level, "warn");
        assert_eq!(base.clone().with_verbosity(1).log_level, "info");
        assert_eq!(base.clone().with_verbosity(2).log_level, "debug");
        assert_eq!(base.with_verbosity(9).log_level, "trace");
    }
}
