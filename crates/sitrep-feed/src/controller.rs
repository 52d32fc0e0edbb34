//! Live feed controller: one subscription, one cached list, one view phase.

use sitrep_store::{FeedEvent, RecordStore, Subscription};
use sitrep_types::{FeedFilter, IncidentRecord};

/// Lifecycle phase of a feed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// Subscription established, first snapshot not yet delivered.
    Loading,
    /// At least one snapshot delivered; the cached list is current.
    Ready,
    /// The subscription failed. Terminal: the view must say so instead of
    /// presenting a stale list as live.
    Unavailable,
}

/// What a feed view should render right now.
#[derive(Debug, PartialEq)]
pub enum FeedView<'a> {
    Loading,
    Unavailable,
    /// Loading finished and the matching set is empty. Rendered as an
    /// explicit "no records" indicator, never as an empty table body.
    Empty,
    Records(&'a [IncidentRecord]),
}

/// Presents a continuously up-to-date, optionally unit-filtered list of
/// incident records.
///
/// Each snapshot from the store replaces the cached list wholesale; the
/// controller never diffs. Ordering is whatever the store delivered:
/// date-descending for the global feed, insertion order for unit feeds.
pub struct FeedController {
    filter: FeedFilter,
    records: Vec<IncidentRecord>,
    phase: FeedPhase,
    subscription: Option<Subscription>,
}

impl FeedController {
    /// Establishes a live subscription scoped to `filter` and returns the
    /// controller in the `Loading` phase.
    pub fn attach(store: &RecordStore, filter: FeedFilter) -> Self {
        let subscription = store.subscribe(filter.clone());
        Self {
            filter,
            records: Vec::new(),
            phase: FeedPhase::Loading,
            subscription: Some(subscription),
        }
    }

    /// Waits for the next delivery and applies it.
    ///
    /// Returns `true` while the feed remains live. Returns `false` once no
    /// further deliveries can arrive: after teardown, after the subscription
    /// ended, or after a terminal `Lost` event (which also flips the phase
    /// to `Unavailable`).
    pub async fn next_delivery(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };

        match subscription.next_event().await {
            Some(FeedEvent::Snapshot(records)) => {
                self.records = records;
                self.phase = FeedPhase::Ready;
                true
            }
            Some(FeedEvent::Lost) => {
                tracing::warn!(filter = ?self.filter, "feed subscription lost");
                self.phase = FeedPhase::Unavailable;
                self.teardown();
                false
            }
            None => {
                // Delivery channel closed without a Lost marker: the store
                // itself went away. Same terminal surface for the view.
                if self.phase == FeedPhase::Loading {
                    self.phase = FeedPhase::Unavailable;
                }
                self.teardown();
                false
            }
        }
    }

    /// The filter this controller was attached with.
    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    /// Current phase of the feed.
    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// The cached record list from the most recent snapshot.
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// What the view should render for the current state.
    pub fn view(&self) -> FeedView<'_> {
        match self.phase {
            FeedPhase::Loading => FeedView::Loading,
            FeedPhase::Unavailable => FeedView::Unavailable,
            FeedPhase::Ready if self.records.is_empty() => FeedView::Empty,
            FeedPhase::Ready => FeedView::Records(&self.records),
        }
    }

    /// Cancels the live subscription.
    ///
    /// Must be called when the view unmounts so delivery tasks do not
    /// accumulate. Idempotent, and safe on a controller whose subscription
    /// already ended or was never established.
    pub fn teardown(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.teardown();
    }
}
