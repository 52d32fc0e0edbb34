//! Record store for the Sitrep platform.
//!
//! Implements incident report persistence, filter-scoped matching-set
//! queries, and live subscriptions with full-snapshot delivery.
//!
//! The store is the single owner of the `incident_reports` table. Records
//! are append-only: once inserted they are never updated or deleted, so a
//! snapshot of the matching set is always authoritative and total.
//!
//! Live delivery works on a change-notification bus: every successful
//! [`RecordStore::append`] publishes a notice, and each [`Subscription`]
//! re-queries its own matching set and re-delivers the complete result.
//! Subscribers never receive diffs.

mod live;
mod records;

use sitrep_db::DbPool;
use sitrep_types::{FeedFilter, IncidentRecord, NewIncident, ValidationError};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use live::{FeedEvent, Subscription};
pub use records::{insert_report, query_matching};

/// Capacity of the change-notification bus. Notices carry no payload, and
/// subscriptions coalesce on lag, so a small buffer is sufficient.
const CHANGE_BUS_CAPACITY: usize = 64;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("invalid incident: {0}")]
    Validation(#[from] ValidationError),
    #[error("store worker task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Handle to the incident record store.
///
/// Cheap to clone; all clones share the same connection pool and
/// change-notification bus.
#[derive(Clone)]
pub struct RecordStore {
    pool: DbPool,
    changed_tx: broadcast::Sender<()>,
}

impl RecordStore {
    /// Creates a store over an already-migrated connection pool.
    pub fn new(pool: DbPool) -> Self {
        let (changed_tx, _) = broadcast::channel(CHANGE_BUS_CAPACITY);
        Self { pool, changed_tx }
    }

    /// Appends a new incident report.
    ///
    /// Validates the fields, assigns a fresh opaque id and a server-side
    /// creation timestamp, and publishes a change notice so live
    /// subscriptions redeliver their snapshots. The appended record is
    /// returned as stored.
    pub async fn append(&self, new: NewIncident) -> Result<IncidentRecord, StoreError> {
        new.validate()?;

        let pool = self.pool.clone();
        let report_id = Uuid::new_v4().to_string();
        let record = tokio::task::spawn_blocking(move || -> Result<IncidentRecord, StoreError> {
            let conn = pool.get()?;
            Ok(insert_report(&conn, &report_id, &new)?)
        })
        .await??;

        // No receivers is fine: nobody is watching the feed right now.
        let _ = self.changed_tx.send(());

        Ok(record)
    }

    /// Returns the current matching set for a filter.
    ///
    /// Unfiltered feeds are ordered by incident date descending. Unit-scoped
    /// feeds request no ordering and come back in the store's natural
    /// insertion order.
    pub async fn matching(&self, filter: &FeedFilter) -> Result<Vec<IncidentRecord>, StoreError> {
        let pool = self.pool.clone();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<IncidentRecord>, StoreError> {
            let conn = pool.get()?;
            Ok(query_matching(&conn, &filter)?)
        })
        .await?
    }

    /// Establishes a live subscription scoped to `filter`.
    ///
    /// The subscription immediately delivers the current matching set as its
    /// first snapshot, then redelivers the full set after every store
    /// change. See [`Subscription`] for delivery and cancellation semantics.
    pub fn subscribe(&self, filter: FeedFilter) -> Subscription {
        live::spawn_subscription(self.pool.clone(), self.changed_tx.subscribe(), filter)
    }
}
