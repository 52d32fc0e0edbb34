//! SSE feed stream handlers.
//!
//! Each connected client gets its own live subscription against the record
//! store. Every delivery is a complete snapshot of the feed's matching set;
//! a terminal `lost` event tells the client the feed is unavailable rather
//! than leaving it silently stale. Closing the HTTP stream drops the
//! subscription, which cancels its delivery task.

use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::{sse::Event, Sse},
};
use futures_util::{Stream, StreamExt};
use sitrep_store::{FeedEvent, Subscription};
use sitrep_types::FeedFilter;
use std::{convert::Infallible, sync::Arc};

/// Handler for `GET /events/reports`.
///
/// Streams live snapshots of the global feed, ordered by date descending.
pub async fn global_feed_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    feed_sse(state.store.subscribe(FeedFilter::All))
}

/// Handler for `GET /events/units/:unitName`.
///
/// Streams live snapshots of one unit's feed, in natural insertion order.
pub async fn unit_feed_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(unit_name): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    feed_sse(state.store.subscribe(FeedFilter::Unit(unit_name)))
}

fn feed_sse(subscription: Subscription) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = futures_util::stream::unfold(subscription, |mut sub| async move {
        sub.next_event().await.map(|event| (event, sub))
    });

    let mapped = events.filter_map(|event| async move {
        match event {
            FeedEvent::Snapshot(records) => match serde_json::to_string(&records) {
                Ok(data) => Some(Ok(Event::default().event("snapshot").data(data))),
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize feed snapshot");
                    None
                }
            },
            FeedEvent::Lost => Some(Ok(Event::default().event("lost").data("{}"))),
        }
    });

    Sse::new(mapped).keep_alive(axum::response::sse::KeepAlive::default())
}
