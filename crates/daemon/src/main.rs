// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fleetd: runs one fleet until signalled.

use std::process::ExitCode;

use fleet_daemon::{acquire_lock, env, logging, Config, LifecycleError};
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fleetd: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    // NOTE(lifetime): held until exit to keep the fleet single-instance
    let _lock = acquire_lock(&config.lock_path)?;
    let _log_guard = logging::init(&config.log_dir, &env::log_filter())?;

    info!(
        config = %config.config_path.display(),
        state_dir = %config.state_dir.display(),
        pid = std::process::id(),
        "fleetd starting"
    );
    fleet_daemon::run(&config).await
}
