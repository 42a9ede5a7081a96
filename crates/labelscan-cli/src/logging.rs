// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn default_log_path() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir()
        .ok_or_else(|| anyhow!("cannot resolve cache directory for the log file"))?;
    Ok(cache_root.join(crate::config::APP_NAME).join("labelscan.log"))
}

/// `RUST_LOG` wins over the configured level when it is set and non-empty.
pub fn filter_directive(configured: &str) -> String {
    match env::var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => configured.to_owned(),
    }
}

/// Logs go to a file; the terminal belongs to the UI.
pub fn initialize(path: &Path, configured_level: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {} -- check directory permissions", path.display()))?;

    let directive = filter_directive(configured_level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?} -- fix RUST_LOG or [log].level"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))?;

    tracing::debug!(log = %path.display(), %directive, "logging initialized");
    Ok(())
}
