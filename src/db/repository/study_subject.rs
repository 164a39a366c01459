use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{PullRequest, SubjectId};

/// All subjects listed for pulling, with their completion status, in table order.
pub fn get_pull_requests(conn: &Connection) -> Result<Vec<PullRequest>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT study_id, data_pull_complete FROM study_ids_to_pull ORDER BY rowid",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PullRequest {
            subject: SubjectId::new(row.get::<_, String>(0)?),
            status: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Set a subject's pull status.
pub fn set_pull_status(
    conn: &Connection,
    subject: &SubjectId,
    status: &str,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE study_ids_to_pull SET data_pull_complete = ?1 WHERE study_id = ?2",
        params![status, subject.query_key()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "study_subject".into(),
            id: subject.to_string(),
        });
    }
    Ok(())
}
