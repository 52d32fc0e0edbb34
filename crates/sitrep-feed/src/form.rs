//! Report form controller: field state and the submit/reset cycle.

use sitrep_store::{RecordStore, StoreError};
use sitrep_types::{IncidentRecord, NewIncident, Severity};
use thiserror::Error;

/// Errors surfaced by a form submission.
#[derive(Debug, Error)]
pub enum FormError {
    /// A previous submission from this form has not completed yet.
    /// Submissions are serialized per form instance.
    #[error("a submission is already in flight")]
    SubmitInFlight,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Transient input state for one new incident report.
///
/// Fields are plain mutable state; presence requirements are enforced at
/// submission time by the store's validation, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportForm {
    pub date: String,
    pub code: String,
    pub description: String,
    pub severity: Severity,
    pub unit: String,
    in_flight: bool,
}

impl ReportForm {
    /// Creates a form with default fields: today's date, empty text fields,
    /// low severity.
    pub fn new() -> Self {
        Self {
            date: today(),
            code: String::new(),
            description: String::new(),
            severity: Severity::Low,
            unit: String::new(),
            in_flight: false,
        }
    }

    /// Resets every field to its default, clearing the form for the next
    /// entry. The date resets to the current date, not the date the form
    /// was created with.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Submits the current fields to the record store.
    ///
    /// On success the form resets to defaults and the stored record is
    /// returned. On failure the fields are left untouched so the operator
    /// can correct and resubmit; the error is logged and also returned to
    /// the caller so the view can say something went wrong.
    ///
    /// Dropping the returned future mid-submission leaves the form usable
    /// again, though the dispatched append may still complete in the store.
    ///
    /// The submitted record is not inserted into any feed optimistically:
    /// it becomes visible when the live subscription redelivers a snapshot
    /// that includes it.
    pub async fn submit(&mut self, store: &RecordStore) -> Result<IncidentRecord, FormError> {
        if self.in_flight {
            return Err(FormError::SubmitInFlight);
        }

        let new = NewIncident {
            date: self.date.clone(),
            code: self.code.clone(),
            unit: self.unit.clone(),
            description: self.description.clone(),
            severity: self.severity,
        };

        self.in_flight = true;
        let form = InFlight(self);
        let result = store.append(new).await;

        match result {
            Ok(record) => {
                form.0.reset();
                Ok(record)
            }
            Err(e) => {
                tracing::error!(error = %e, "incident submission failed");
                Err(e.into())
            }
        }
    }
}

/// Clears the in-flight flag when the submit future finishes or is dropped
/// at the append await point, so a cancelled submission does not leave the
/// form stuck rejecting every later submit.
struct InFlight<'a>(&'a mut ReportForm);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight = false;
    }
}

impl Default for ReportForm {
    fn default() -> Self {
        Self::new()
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
