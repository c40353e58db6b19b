use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use super::parse_datetime;
use crate::db::DatabaseError;
use crate::models::enums::Severity;
use crate::models::{NewReport, Report};

const REPORT_COLUMNS: &str =
    "id, filename, disease, confidence, severity, recommendations, created_at";

type ReportRow = (i64, Option<String>, String, f64, String, Option<String>, String);

/// Insert a report row and return it as stored.
pub fn insert_report(conn: &Connection, report: &NewReport) -> Result<Report, DatabaseError> {
    let recommendations = serde_json::to_string(&report.recommendations)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT INTO reports (filename, disease, confidence, severity, recommendations)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            report.filename,
            report.disease,
            report.confidence,
            report.severity.as_str(),
            recommendations,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_report(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Report".into(),
        id: id.to_string(),
    })
}

pub fn get_report(conn: &Connection, id: i64) -> Result<Option<Report>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;

    row.map(row_to_report).transpose()
}

/// All reports, newest first.
pub fn list_reports(conn: &Connection) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], read_row)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(row_to_report(row?)?);
    }
    Ok(reports)
}

/// Delete a report row. Returns `false` if no such report existed.
pub fn delete_report(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM reports WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

pub fn count_reports(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
    Ok(count)
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn row_to_report(row: ReportRow) -> Result<Report, DatabaseError> {
    let (id, filename, disease, confidence, severity, recommendations, created_at) = row;
    let recommendations = match recommendations.as_deref() {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| DatabaseError::ConstraintViolation(format!("recommendations: {e}")))?,
    };
    Ok(Report {
        id,
        filename,
        disease,
        confidence,
        severity: Severity::from_str(&severity)?,
        recommendations,
        created_at: parse_datetime(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn new_report(disease: &str, severity: Severity) -> NewReport {
        NewReport {
            filename: Some("leaf.jpg".into()),
            disease: disease.into(),
            confidence: 0.82,
            severity,
            recommendations: vec!["Apply rust-targeted fungicide.".into(), "Scout nearby fields.".into()],
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let stored = insert_report(&conn, &new_report("Rust", Severity::High)).unwrap();
        assert!(stored.id > 0);

        let fetched = get_report(&conn, stored.id).unwrap().unwrap();
        assert_eq!(fetched.disease, "Rust");
        assert_eq!(fetched.severity, Severity::High);
        assert_eq!(fetched.filename.as_deref(), Some("leaf.jpg"));
        assert_eq!(fetched.recommendations.len(), 2);
        assert!((fetched.confidence - 0.82).abs() < 1e-9);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_report(&conn, 404).unwrap().is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let conn = open_memory_database().unwrap();
        let a = insert_report(&conn, &new_report("Rust", Severity::High)).unwrap();
        let b = insert_report(&conn, &new_report("Scab", Severity::Moderate)).unwrap();
        // Same-second inserts fall back to id ordering.
        conn.execute(
            "UPDATE reports SET created_at = '2024-01-01 00:00:00' WHERE id = ?1",
            params![a.id],
        )
        .unwrap();

        let reports = list_reports(&conn).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, b.id);
        assert_eq!(reports[1].id, a.id);
    }

    #[test]
    fn delete_removes_row() {
        let conn = open_memory_database().unwrap();
        let stored = insert_report(&conn, &new_report("Rust", Severity::Low)).unwrap();
        assert!(delete_report(&conn, stored.id).unwrap());
        assert!(!delete_report(&conn, stored.id).unwrap());
        assert_eq!(count_reports(&conn).unwrap(), 0);
    }

    #[test]
    fn null_recommendations_read_as_empty() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO reports (disease, confidence, severity) VALUES ('Scab', 0.6, 'Moderate')",
            [],
        )
        .unwrap();
        let reports = list_reports(&conn).unwrap();
        assert!(reports[0].recommendations.is_empty());
        assert!(reports[0].filename.is_none());
    }

    #[test]
    fn invalid_severity_surfaces_enum_error() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
        conn.execute(
            "INSERT INTO reports (disease, confidence, severity) VALUES ('Scab', 0.6, 'Severe')",
            [],
        )
        .unwrap();
        let err = list_reports(&conn).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }
}
