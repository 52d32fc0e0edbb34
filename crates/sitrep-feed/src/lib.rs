//! View controllers for the Sitrep platform.
//!
//! Two controllers sit between the record store and whatever renders the
//! dashboard:
//!
//! - [`FeedController`] owns one live subscription, its cached record list,
//!   and the loading/ready/unavailable phase for a single feed view.
//! - [`ReportForm`] owns the transient field state for one submission form
//!   and the submit/reset cycle.
//!
//! Controllers are independent: mounting the global feed and a unit feed at
//! the same time means two controllers, two subscriptions, and two cached
//! lists. Tearing a controller down cancels only its own subscription.

mod controller;
mod form;

pub use controller::{FeedController, FeedPhase, FeedView};
pub use form::{FormError, ReportForm};
