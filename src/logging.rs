//! Logging initialisation.
//!
//! Built on `tracing-subscriber`: an [`EnvFilter`] (so `RUST_LOG` always
//! wins) plus either a human-readable or a JSON formatting layer. Logs go to
//! stderr; stdout is reserved for command output such as `--json` reports.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// `level` is the default filter directive used when `RUST_LOG` is unset.
/// Calling this twice is harmless: the second call leaves the first
/// subscriber in place.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(console::colors_enabled_stderr()),
            )
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
}

/// Initialise from the `[logging]` config section, with CLI overrides.
pub fn init_from_config(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    init(
        effective_level(config, verbose),
        json_logs || config.format == LogFormat::Json,
    );
}

/// `--verbose` raises the level to at least `debug`.
fn effective_level(config: &LoggingConfig, verbose: bool) -> &str {
    if verbose && config.level != "trace" {
        "debug"
    } else {
        &config.level
    }
}
