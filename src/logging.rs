// ABOUTME: Structured logging setup for the server process
// ABOUTME: Filter comes from RUST_LOG, output format from LOG_FORMAT

// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

use anyhow::{anyhow, Result};
use std::env;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// The filter honors `RUST_LOG` (falling back to `info`); `LOG_FORMAT=json`
/// selects machine-readable output for production log shipping and
/// `LOG_FORMAT=compact` a terse single-line form, anything else the default
/// human-readable formatter.
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub fn init_from_env() -> Result<()> {
    let filter = env::var("RUST_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        Ok("compact") => builder.compact().try_init(),
        _ => builder.try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
