// src/telemetry/tracing.rs
//! Logging setup.
//!
//! One `tracing_subscriber` registry with an `EnvFilter` (RUST_LOG wins over
//! the configured level) and a fmt layer, human-readable or JSON.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use crate::config::app_config::LoggingConfig;

/// Installs the global subscriber. Calling it twice returns an error.
pub fn init_tracing(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("invalid log level '{}'", cfg.level))?;

    let fmt_layer = if cfg.json {
        fmt::layer().json().with_current_span(false).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")?;
    Ok(())
}
