use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{DischargeRecord, SubjectId};

/// Discharge rows for a subject. Callers decide how many rows are acceptable.
pub fn get_discharge_records(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<DischargeRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT dispo, discharge_date, discharge_time
         FROM discharges
         WHERE study_id = ?1
         ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![subject.query_key()], |row| {
        Ok(DischargeRecord {
            dispo: row.get(0)?,
            date: row.get(1)?,
            time: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
