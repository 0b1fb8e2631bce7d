// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, single-instance lock, signal loop.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fleet_config::ConfigError;
use fleet_engine::{default_state_dir, FleetError, FleetManager, FleetManagerOptions, StopOptions};
use fs2::FileExt;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::sink::LogSink;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Resolved fleet definition file
    pub config_path: PathBuf,
    /// Root state directory
    pub state_dir: PathBuf,
    /// Exclusive lock held while the daemon runs
    pub lock_path: PathBuf,
    /// Directory for `fleetd.log`
    pub log_dir: PathBuf,
    pub tick_interval: Duration,
    pub drain_timeout: Duration,
    pub cancel_timeout: Duration,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let config_path = fleet_config::find_config(&crate::env::config_path())?;
        let state_dir =
            crate::env::state_dir().unwrap_or_else(|| default_state_dir(&config_path));
        Ok(Self {
            lock_path: state_dir.join("fleetd.lock"),
            log_dir: state_dir.join("logs"),
            state_dir,
            config_path,
            tick_interval: crate::env::tick_interval(),
            drain_timeout: crate::env::drain_timeout(),
            cancel_timeout: crate::env::cancel_timeout(),
        })
    }

    pub fn manager_options(&self) -> FleetManagerOptions {
        FleetManagerOptions::new(&self.config_path)
            .state_dir(&self.state_dir)
            .tick_interval(self.tick_interval)
            .cancel_timeout(self.cancel_timeout)
    }

    pub fn stop_options(&self) -> StopOptions {
        StopOptions::default()
            .timeout(self.drain_timeout)
            .cancel_on_timeout(true)
            .cancel_timeout(self.cancel_timeout)
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: fleetd already running for this fleet?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to set up logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Take the exclusive lock at `path` and record our pid in it.
///
/// The lock is released when the returned file is dropped.
pub fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Open without truncating so a running daemon's pid survives a failed attempt.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Run the fleet until SIGINT or SIGTERM. SIGHUP reloads the definition.
pub async fn run(config: &Config) -> Result<(), LifecycleError> {
    let manager = FleetManager::new(config.manager_options());
    let sink = manager.register_sink(Arc::new(LogSink));

    manager.initialize()?;
    manager.start()?;

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    loop {
        tokio::select! {
            _ = hangup.recv() => {
                info!("SIGHUP received, reloading");
                if let Err(e) = manager.reload() {
                    warn!(error = %e, "reload rejected");
                }
            }
            _ = terminate.recv() => {
                info!("SIGTERM received");
                break;
            }
            _ = interrupt.recv() => {
                info!("SIGINT received");
                break;
            }
        }
    }

    let result = manager.stop(config.stop_options()).await;
    // Let the sink log the final events before the runtime goes away.
    tokio::task::yield_now().await;
    sink.abort();
    result?;
    info!("fleetd shutdown complete");
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
