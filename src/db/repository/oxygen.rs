use rusqlite::{params, Connection};

use super::timestamp_column;
use crate::db::DatabaseError;
use crate::models::{OxygenTherapy, SubjectId};

/// Supplemental oxygen episodes for a subject, earliest first.
pub fn get_oxygen_therapy(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<OxygenTherapy>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT started_at, device, flow_rate_lpm
         FROM oxygen_therapy
         WHERE study_id = ?1
         ORDER BY started_at ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key()], |row| {
        Ok(OxygenTherapy {
            started_at: timestamp_column(row, 0)?,
            device: row.get(1)?,
            flow_rate_lpm: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
