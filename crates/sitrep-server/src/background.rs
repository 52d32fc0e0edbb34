//! Background tasks for the Sitrep server.
//!
//! Includes:
//! - Pruning expired sessions.

use crate::AppState;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Interval between expired-session sweeps.
const PRUNE_INTERVAL_SECS: u64 = 15 * 60;

/// Starts the session pruning task.
///
/// Runs indefinitely, periodically deleting sessions whose expiry has
/// passed. Expired sessions are already rejected at lookup time; this task
/// only keeps the table from growing without bound.
pub async fn start_session_pruning_task(state: Arc<AppState>) {
    let interval = Duration::from_secs(PRUNE_INTERVAL_SECS);
    tracing::info!(interval_secs = PRUNE_INTERVAL_SECS, "starting session pruning task");

    loop {
        sleep(interval).await;

        let pool = state.pool.clone();
        let res = tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| e.to_string())?;
            sitrep_auth::prune_expired_sessions(&conn).map_err(|e| e.to_string())
        })
        .await;

        match res {
            Ok(Ok(pruned)) => {
                if pruned > 0 {
                    tracing::info!(count = pruned, "pruned expired sessions");
                }
            }
            Ok(Err(e)) => {
                tracing::error!("failed to prune expired sessions: {}", e);
            }
            Err(e) => {
                tracing::error!("session pruning task join error: {}", e);
            }
        }
    }
}
