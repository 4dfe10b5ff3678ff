//! Logging collaborator.
//!
//! The engine itself only emits `tracing` events; this module owns bringing
//! the backend up and down. Engine events carry `rayengine::*` targets while
//! host code logs under its own crate targets, which keeps the "core" and
//! "client" channels apart in the output.

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Filter used when neither the config nor `RUST_LOG` provide one.
pub fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "trace"
    } else {
        "warn"
    }
}

#[derive(Debug)]
pub struct Logging {
    config: LogConfig,
    active: bool,
}

impl Logging {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Resolves the filter: explicit config first, then `RUST_LOG`, then the
    /// build default.
    pub fn build_filter(&self) -> Result<EnvFilter, LogError> {
        if let Some(filter) = &self.config.filter {
            return EnvFilter::try_new(filter).map_err(|err| LogError::Filter {
                filter: filter.clone(),
                reason: err.to_string(),
            });
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter())))
    }

    /// Brings the backend up. With `enabled = false` only the filter is
    /// validated and events go to whatever subscriber the host installed.
    pub fn init(&mut self) -> Result<(), LogError> {
        let filter = self.build_filter()?;
        if self.config.enabled {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(self.config.ansi)
                .with_target(self.config.with_target)
                .try_init()
                .map_err(|err| LogError::Install(err.to_string()))?;
        }
        self.active = true;
        info!("logging initialised");
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        info!("logging shut down");
        self.active = false;
    }
}
