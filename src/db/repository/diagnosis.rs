use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{Diagnosis, SubjectId};

/// ED diagnoses for a subject in coded sequence order (primary first).
pub fn get_diagnoses(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT seq, icd_code, description
         FROM diagnoses
         WHERE study_id = ?1
         ORDER BY seq ASC",
    )?;

    let rows = stmt.query_map(params![subject.query_key()], |row| {
        Ok(Diagnosis {
            seq: row.get(0)?,
            icd_code: row.get(1)?,
            description: row.get(2)?,
        })
    })?;

    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
