// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon paths and tuning, resolved from the environment

use dr_engine::{EngineConfig, DEFAULT_STEP_DELAY};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// State directory override
pub const ENV_STATE_DIR: &str = "DR_STATE_DIR";
/// Socket path override
pub const ENV_SOCKET_PATH: &str = "DR_SOCKET_PATH";
/// Maximum concurrently executing runs
pub const ENV_CONCURRENCY: &str = "DR_CONCURRENCY";
/// Delay of the default simulated step handlers
pub const ENV_STEP_DELAY_MS: &str = "DR_STEP_DELAY_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding all daemon state
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the run WAL
    pub wal_path: PathBuf,
    pub concurrency: usize,
    pub step_delay: Duration,
}

impl Config {
    /// Default layout under `state_dir`
    pub fn for_state_dir(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("runs.wal"),
            concurrency: 1,
            step_delay: DEFAULT_STEP_DELAY,
            state_dir,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` in place of the process environment
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let state_dir = match lookup(ENV_STATE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir(&lookup)?,
        };

        let mut config = Self::for_state_dir(state_dir);
        if let Some(path) = lookup(ENV_SOCKET_PATH) {
            config.socket_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(ENV_CONCURRENCY) {
            config.concurrency = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: ENV_CONCURRENCY,
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup(ENV_STEP_DELAY_MS) {
            let ms = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidVar {
                    name: ENV_STEP_DELAY_MS,
                    value: value.clone(),
                })?;
            config.step_delay = Duration::from_millis(ms);
        }
        Ok(config)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            concurrency: self.concurrency,
            default_step_delay: self.step_delay,
        }
    }
}

/// `$XDG_STATE_HOME/dataroom`, else `~/.local/state/dataroom`
fn default_state_dir(lookup: &impl Fn(&str) -> Option<String>) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = lookup("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("dataroom"));
    }

    let home = lookup("HOME").ok_or(ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/dataroom"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
