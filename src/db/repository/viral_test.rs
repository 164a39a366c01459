use rusqlite::{params, Connection};

use super::{enum_column, timestamp_column};
use crate::db::DatabaseError;
use crate::models::{SubjectId, ViralTest};

/// Viral test results (influenza and other pathogens), earliest first.
pub fn get_viral_tests(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<ViralTest>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT collected_at, test_name, pathogen, result
         FROM viral_tests
         WHERE study_id = ?1
         ORDER BY collected_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key()], |row| {
        Ok(ViralTest {
            collected_at: timestamp_column(row, 0)?,
            test_name: row.get(1)?,
            pathogen: row.get(2)?,
            result: enum_column(row, 3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestResult;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn parses_results() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO viral_tests VALUES ('S1', '2023-01-01 10:30', 'Flu PCR', 'Influenza A', 'positive')",
            [],
        )
        .unwrap();
        let tests = get_viral_tests(&conn, &SubjectId::new("S1")).unwrap();
        assert_eq!(tests[0].result, TestResult::Positive);
    }

    #[test]
    fn unknown_result_fails() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO viral_tests VALUES ('S1', '2023-01-01 10:30', 'Flu PCR', 'Influenza A', 'pending')",
            [],
        )
        .unwrap();
        assert!(get_viral_tests(&conn, &SubjectId::new("S1")).is_err());
    }
}
