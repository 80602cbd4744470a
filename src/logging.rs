//! Logging setup for binaries embedding the engine.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the host's call. The CLI uses [`init`], which reads the
//! `MECHREDUCE_LOG` environment variable:
//!
//! - `MECHREDUCE_LOG=debug` — verbose engine logging
//! - `MECHREDUCE_LOG=mechreduce::reduce=trace` — module-specific
//! - `MECHREDUCE_LOG=warn,mechreduce::facade=debug` — combined filters

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "MECHREDUCE_LOG";

/// Initialises the global subscriber with an `info` default level.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    init_with_default("info");
}

/// Initialises the global subscriber with a caller-chosen default level,
/// used when `MECHREDUCE_LOG` is unset.
pub fn init_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // Ignore the error if a subscriber is already installed.
    let _ = subscriber.try_init();
}
