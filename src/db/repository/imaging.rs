use rusqlite::{params, Connection};

use super::timestamp_column;
use crate::db::DatabaseError;
use crate::models::{ImagingStudy, SubjectId};

pub fn get_imaging_studies(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<ImagingStudy>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT performed_at, modality, body_site, impression
         FROM imaging_studies
         WHERE study_id = ?1
         ORDER BY performed_at ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key()], |row| {
        Ok(ImagingStudy {
            performed_at: timestamp_column(row, 0)?,
            modality: row.get(1)?,
            body_site: row.get(2)?,
            impression: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
