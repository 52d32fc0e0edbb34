//! Live subscription layer: full-snapshot delivery over a cancellable handle.

use crate::records::query_matching;
use sitrep_db::DbPool;
use sitrep_types::{FeedFilter, IncidentRecord};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Per-subscription delivery buffer. Delivery applies backpressure: if a
/// subscriber stops consuming, its task parks on `send` rather than
/// accumulating snapshots.
const DELIVERY_BUFFER: usize = 8;

/// A delivery from a live subscription.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The complete current matching set. Replaces everything a subscriber
    /// previously held; no diffing against earlier snapshots is meaningful.
    Snapshot(Vec<IncidentRecord>),
    /// The subscription failed and will deliver nothing further. Subscribers
    /// should surface a terminal "feed unavailable" state rather than keep
    /// showing stale data.
    Lost,
}

/// Handle to a live feed subscription.
///
/// Each subscription owns a delivery task that re-queries the matching set
/// after every store change. Dropping the handle cancels the task;
/// [`Subscription::cancel`] does the same explicitly and is idempotent.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<FeedEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Waits for the next delivery. Returns `None` once the subscription has
    /// been cancelled or has ended after a terminal [`FeedEvent::Lost`].
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    /// Cancels the subscription. Safe to call repeatedly, and safe to call
    /// on a subscription whose delivery task already ended.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawns the delivery task for a new subscription.
///
/// The task sends the initial snapshot immediately, then waits on the change
/// bus. A lagged bus receiver is treated the same as a single change notice:
/// snapshots are total, so coalescing missed notices into one redelivery
/// loses nothing.
pub(crate) fn spawn_subscription(
    pool: DbPool,
    mut changed_rx: broadcast::Receiver<()>,
    filter: FeedFilter,
) -> Subscription {
    let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);

    let task = tokio::spawn(async move {
        if !deliver_snapshot(&pool, &filter, &tx).await {
            return;
        }

        loop {
            match changed_rx.recv().await {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if !deliver_snapshot(&pool, &filter, &tx).await {
                        return;
                    }
                }
                // Store dropped; nothing further can change.
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    Subscription {
        rx,
        task: Some(task),
    }
}

/// Queries the matching set and delivers it. Returns `false` when the task
/// should end: either the subscriber went away or the query failed (in which
/// case a terminal [`FeedEvent::Lost`] is delivered first).
async fn deliver_snapshot(
    pool: &DbPool,
    filter: &FeedFilter,
    tx: &mpsc::Sender<FeedEvent>,
) -> bool {
    let query_pool = pool.clone();
    let query_filter = filter.clone();
    let result = tokio::task::spawn_blocking(
        move || -> Result<Vec<IncidentRecord>, crate::StoreError> {
            let conn = query_pool.get()?;
            Ok(query_matching(&conn, &query_filter)?)
        },
    )
    .await;

    match result {
        Ok(Ok(records)) => tx.send(FeedEvent::Snapshot(records)).await.is_ok(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, ?filter, "feed snapshot query failed, ending subscription");
            let _ = tx.send(FeedEvent::Lost).await;
            false
        }
        Err(e) => {
            tracing::error!(error = %e, ?filter, "feed snapshot task failed, ending subscription");
            let _ = tx.send(FeedEvent::Lost).await;
            false
        }
    }
}
