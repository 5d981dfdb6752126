//! Tracing subscriber bootstrap.
//!
//! Library code only emits `tracing` events; binaries and tests call
//! [`init_tracing`] once to get them printed. `RUST_LOG` overrides the
//! configured level.

use tracing_subscriber::EnvFilter;

use crate::config::GeneralConfig;
use crate::error::{QuestError, Result};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Install a global `fmt` subscriber for the configured level.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// repeated calls are harmless.
///
/// # Errors
/// Returns [`QuestError::Config`] for an unsupported level name.
pub fn init_tracing(config: &GeneralConfig) -> Result<bool> {
    let level = normalize_level(&config.log_level)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json_logs {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };
    Ok(installed)
}

fn normalize_level(level: &str) -> Result<&'static str> {
    let lowered = level.trim().to_ascii_lowercase();
    let lowered = if lowered == "warning" { "warn".to_string() } else { lowered };
    LEVELS
        .iter()
        .copied()
        .find(|l| *l == lowered)
        .ok_or_else(|| {
            QuestError::Config(format!(
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ))
        })
}
