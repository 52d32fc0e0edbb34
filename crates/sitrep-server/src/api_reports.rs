//! Incident report REST handlers.

use crate::middleware::SessionContext;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use sitrep_store::StoreError;
use sitrep_types::{FeedFilter, IncidentRecord, NewIncident};
use std::sync::Arc;

/// Maps a [`StoreError`] to the correct HTTP status code.
///
/// Validation failures → 400, everything else → 500 (with error logged).
fn store_err_to_status(e: StoreError) -> StatusCode {
    match e {
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        ref err => {
            tracing::error!(error = %err, "record store operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// GET /api/reports
///
/// The full matching set of the global feed, ordered by incident date
/// descending.
pub async fn list_reports_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(_user)): Extension<SessionContext>,
) -> Result<Json<Vec<IncidentRecord>>, StatusCode> {
    let reports = state
        .store
        .matching(&FeedFilter::All)
        .await
        .map_err(store_err_to_status)?;
    Ok(Json(reports))
}

/// POST /api/reports
///
/// Appends a new incident report. The record becomes visible in feeds only
/// once their subscriptions redeliver a snapshot that includes it.
pub async fn submit_report_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(user)): Extension<SessionContext>,
    Json(payload): Json<NewIncident>,
) -> Result<(StatusCode, Json<IncidentRecord>), StatusCode> {
    let record = state
        .store
        .append(payload)
        .await
        .map_err(store_err_to_status)?;

    tracing::info!(
        report_id = %record.id,
        unit = %record.unit,
        severity = record.severity.as_str(),
        submitted_by = %user.email,
        "incident report submitted"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Serialize)]
pub struct UnitReportsResponse {
    pub unit_name: String,
    pub reports: Vec<IncidentRecord>,
}

/// GET /api/units/:unitName/reports
///
/// The matching set for one unit, in the store's natural insertion order.
/// The unit name is echoed back so an empty result can be rendered as
/// "no incidents reported for {unit}" rather than a bare empty table.
pub async fn unit_reports_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(SessionContext(_user)): Extension<SessionContext>,
    Path(unit_name): Path<String>,
) -> Result<Json<UnitReportsResponse>, StatusCode> {
    let reports = state
        .store
        .matching(&FeedFilter::Unit(unit_name.clone()))
        .await
        .map_err(store_err_to_status)?;

    Ok(Json(UnitReportsResponse { unit_name, reports }))
}
