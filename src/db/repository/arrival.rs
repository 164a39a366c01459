use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{ArrivalMode, ArrivalRecord, SubjectId};

/// Earliest arrival row for a subject.
pub fn get_arrival(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Option<ArrivalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT arrival_date, arrival_time, arrival_mode, chief_complaint
         FROM arrivals
         WHERE study_id = ?1
         ORDER BY arrival_date ASC, arrival_time ASC
         LIMIT 1",
    )?;
    let mut rows = stmt.query_map(params![subject.query_key()], |row| {
        let mode: Option<String> = row.get(2)?;
        Ok(ArrivalRecord {
            date: row.get(0)?,
            time: row.get(1)?,
            // Unrecognised modes fall into Other rather than failing the visit
            mode: mode.map(|m| m.parse().unwrap_or(ArrivalMode::Other)),
            chief_complaint: row.get(3)?,
        })
    })?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}
