//! Logging bootstrap.
//!
//! Everything logs to stderr; stdout is reserved for the JSON report. The
//! config file sets the baseline level and format, the CLI flags bump them,
//! and `RUST_LOG` overrides the level outright.

use imgpress_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(logging: &LoggingConfig, verbose: bool, json_logs: bool) {
    let level = if verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_logs || logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
