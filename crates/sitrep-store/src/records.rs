//! Synchronous SQL layer for incident reports.
//!
//! These functions take a plain connection so they can run inside
//! `spawn_blocking` from the async store handle or directly from tests.

use rusqlite::{params, Connection, Row};
use sitrep_types::{FeedFilter, IncidentRecord, NewIncident, Severity};

/// Inserts a new incident report and returns it as stored.
///
/// `report_id` is the caller-supplied opaque public id (a fresh UUID);
/// `created_at` is assigned by SQLite at insertion time.
pub fn insert_report(
    conn: &Connection,
    report_id: &str,
    new: &NewIncident,
) -> rusqlite::Result<IncidentRecord> {
    conn.query_row(
        "INSERT INTO incident_reports (report_id, date, code, unit, description, severity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING report_id, date, code, unit, description, severity, created_at",
        params![
            report_id,
            new.date,
            new.code,
            new.unit,
            new.description,
            new.severity.as_str(),
        ],
        map_row_to_record,
    )
}

/// Returns the full matching set for a filter.
///
/// `FeedFilter::All` asks the store to order by incident date descending.
/// `FeedFilter::Unit` requests no ordering at all: rows come back in natural
/// (insertion) order. The asymmetry is intentional; the unit view shows
/// records in the order they were filed, not chronologically.
pub fn query_matching(
    conn: &Connection,
    filter: &FeedFilter,
) -> rusqlite::Result<Vec<IncidentRecord>> {
    let mut records = Vec::new();

    match filter {
        FeedFilter::All => {
            let mut stmt = conn.prepare(
                "SELECT report_id, date, code, unit, description, severity, created_at
                 FROM incident_reports
                 ORDER BY date DESC",
            )?;
            let rows = stmt.query_map([], map_row_to_record)?;
            for row in rows {
                records.push(row?);
            }
        }
        FeedFilter::Unit(unit) => {
            let mut stmt = conn.prepare(
                "SELECT report_id, date, code, unit, description, severity, created_at
                 FROM incident_reports
                 WHERE unit = ?1",
            )?;
            let rows = stmt.query_map([unit], map_row_to_record)?;
            for row in rows {
                records.push(row?);
            }
        }
    }

    Ok(records)
}

fn map_row_to_record(row: &Row) -> rusqlite::Result<IncidentRecord> {
    let severity_str: String = row.get(5)?;
    let severity = Severity::parse(&severity_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown severity: {severity_str}").into(),
        )
    })?;

    Ok(IncidentRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        code: row.get(2)?,
        unit: row.get(3)?,
        description: row.get(4)?,
        severity,
        created_at: row.get(6)?,
    })
}
