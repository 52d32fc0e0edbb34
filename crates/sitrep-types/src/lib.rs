//! Shared types, error definitions, and constants for the Sitrep platform.
//!
//! This crate provides the foundational types used across all Sitrep crates:
//! the incident record domain entity, the severity scale, feed filters, and
//! the authenticated session user. No crate in the workspace depends on
//! anything *except* `sitrep-types` for cross-cutting type definitions,
//! which keeps the dependency graph clean and prevents circular dependencies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of an incident report.
///
/// Serialized in lowercase both over the wire and in the database
/// (`"low"`, `"medium"`, `"high"`, `"critical"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Low
    }
}

impl Severity {
    /// Returns the lowercase string label used for storage and display.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parses a lowercase severity label.
    ///
    /// Returns `None` for unrecognized labels.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// A persisted incident report.
///
/// Records are immutable once created; there is no update or delete
/// operation anywhere in the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentRecord {
    /// Opaque unique identifier assigned by the store on append.
    pub id: String,
    /// Calendar date of the incident (ISO 8601, user-supplied).
    pub date: String,
    /// Short incident code.
    pub code: String,
    /// Organizational unit the incident belongs to; the feed filter key.
    pub unit: String,
    /// Free-text description.
    pub description: String,
    /// Severity classification.
    pub severity: Severity,
    /// Server-assigned insertion timestamp (ISO 8601). Audit only;
    /// display ordering uses `date`, never this field.
    pub created_at: String,
}

/// Fields for a new incident report, prior to append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIncident {
    pub date: String,
    pub code: String,
    pub unit: String,
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
}

/// Validation failures for a [`NewIncident`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("date is not a valid ISO 8601 calendar date: {0}")]
    InvalidDate(String),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

impl NewIncident {
    /// Checks the record invariants: non-empty `code`, `unit`, and
    /// `description`, and a parseable calendar date.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::EmptyField("code"));
        }
        if self.unit.trim().is_empty() {
            return Err(ValidationError::EmptyField("unit"));
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyField("description"));
        }
        if chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err() {
            return Err(ValidationError::InvalidDate(self.date.clone()));
        }
        Ok(())
    }
}

/// Scope of a live feed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedFilter {
    /// All records, ordered by incident date descending.
    All,
    /// Records whose `unit` equals the given name. No ordering is requested
    /// for unit-scoped feeds; delivery preserves the store's natural
    /// insertion order.
    Unit(String),
}

/// The authenticated identity attached to a request after sign-in.
///
/// Passed explicitly to each view rather than held as ambient global state;
/// its lifecycle is bounded by sign-in and sign-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub email: String,
}
