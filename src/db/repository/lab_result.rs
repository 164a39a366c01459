use rusqlite::{params, Connection};

use super::timestamp_column;
use crate::db::DatabaseError;
use crate::models::{LabResult, SubjectId};

/// Lab results for a subject, ordered by collection time ascending.
pub fn get_lab_results(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT collected_at, test_name, value, unit
         FROM lab_results
         WHERE study_id = ?1
         ORDER BY collected_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key()], |row| {
        Ok(LabResult {
            collected_at: timestamp_column(row, 0)?,
            test_name: row.get(1)?,
            value: row.get(2)?,
            unit: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
