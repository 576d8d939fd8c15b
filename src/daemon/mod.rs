//! Daemon loop.
//!
//! Runs detection cycles forever: cycle, sleep, repeat. A failed cycle is
//! logged and retried on a shorter delay; it never kills the loop. Shutdown
//! waits for the cycle in flight, so a commit is never cancelled halfway.

pub mod lock;

pub use lock::InstanceLock;

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::engine::cycle::{CycleOutcome, Engine};
use crate::error::DaemonError;
use crate::git::process::check_git_installed;

/// Sleep before the next pass after a failed cycle.
const RETRY_DELAY_SECS: u64 = 60;

/// Run the daemon against `dir` until a shutdown signal arrives.
pub async fn run(dir: &Path, config: EngineConfig) -> Result<(), DaemonError> {
    // The listener task starts before the first cycle so a signal arriving
    // mid-cycle is caught and observed at the next loop check.
    let shutdown = tokio::spawn(shutdown_signal());
    run_until(dir, config, shutdown).await
}

/// Wait for Ctrl-C. If the listener itself cannot be set up, the daemon
/// keeps running and can only be stopped by killing the process.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Shutdown listener failed ({}), daemon runs until killed", e);
        std::future::pending::<()>().await;
    }
}

/// Run the daemon until `shutdown` resolves.
///
/// A cycle in flight always completes first; the shutdown is observed
/// between cycles and during the inter-cycle sleep.
pub async fn run_until<S: Future>(
    dir: &Path,
    config: EngineConfig,
    shutdown: S,
) -> Result<(), DaemonError> {
    check_git_installed().await?;
    let _lock = InstanceLock::acquire(dir)?;
    let engine = Engine::new(dir, config.clone())?;

    info!(
        "Watching {} (interval {}s, threshold {})",
        dir.display(),
        config.interval_secs,
        config.threshold
    );

    tokio::pin!(shutdown);

    loop {
        let delay = match engine.run_cycle().await {
            // The engine logs the commit itself.
            Ok(CycleOutcome::Committed { .. }) => config.interval_secs,
            Ok(CycleOutcome::NothingToCommit) => {
                info!("Changes were classified but git recorded nothing");
                config.interval_secs
            }
            Ok(CycleOutcome::BelowThreshold { total, threshold }) => {
                info!(
                    "{} change(s) waiting, below commit threshold {}",
                    total, threshold
                );
                config.interval_secs
            }
            Ok(CycleOutcome::NoChanges) => {
                debug!("No changes detected");
                config.interval_secs
            }
            Err(e) => {
                error!("Cycle failed: {}", e);
                RETRY_DELAY_SECS
            }
        };

        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
        }
    }
}
