//! Discharge context resolution.
//!
//! One discharge lookup per subject yields the disposition and combined
//! discharge time that tier 2 and tier 3 extractors depend on.

use rusqlite::Connection;

use super::error::VisitError;
use super::types::DischargeContext;
use crate::db::repository::get_discharge_records;
use crate::models::{DischargeRecord, SubjectId};

const DISCHARGE_ENTITY: &str = "discharge";

/// Resolve the discharge context. Exactly one discharge row must exist.
pub fn resolve_discharge_context(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<DischargeContext, VisitError> {
    let record = load_single_discharge(conn, subject)?;
    Ok(DischargeContext::new(record.dispo, &record.date, &record.time))
}

/// Fetch the subject's only discharge row.
pub(crate) fn load_single_discharge(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<DischargeRecord, VisitError> {
    let mut rows = get_discharge_records(conn, subject)?;
    match rows.len() {
        0 => Err(VisitError::MissingRecord {
            entity: DISCHARGE_ENTITY,
            subject: subject.to_string(),
        }),
        1 => Ok(rows.remove(0)),
        count => Err(VisitError::AmbiguousRecord {
            entity: DISCHARGE_ENTITY,
            subject: subject.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn combines_date_and_time() {
        let conn = open_memory_database().unwrap();
        conn.execute("INSERT INTO discharges VALUES ('ABC123', 'home', '2023-01-01', '14:30')", [])
            .unwrap();

        let ctx = resolve_discharge_context(&conn, &SubjectId::new("ABC123")).unwrap();
        assert_eq!(ctx.dc_time(), "2023-01-01 14:30");
        assert_eq!(ctx.dispo(), "home");
    }

    #[test]
    fn missing_discharge_is_an_error() {
        let conn = open_memory_database().unwrap();
        let err = resolve_discharge_context(&conn, &SubjectId::new("X")).unwrap_err();
        match err {
            VisitError::MissingRecord { entity, subject } => {
                assert_eq!(entity, "discharge");
                assert_eq!(subject, "X");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_discharge_rows_are_an_error() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO discharges VALUES ('S1', 'home', '2023-01-01', '14:30');
             INSERT INTO discharges VALUES ('S1', 'admitted', '2023-01-01', '16:00');",
        )
        .unwrap();
        let err = resolve_discharge_context(&conn, &SubjectId::new("S1")).unwrap_err();
        assert!(matches!(err, VisitError::AmbiguousRecord { count: 2, .. }));
    }
}
