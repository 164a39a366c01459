use rusqlite::{params, Connection};

use super::timestamp_column;
use crate::db::DatabaseError;
use crate::models::{SubjectId, VitalSigns};

/// All vital sign sets for a subject, ordered by taken_at ascending.
pub fn get_vital_signs(
    conn: &Connection,
    subject: &SubjectId,
) -> Result<Vec<VitalSigns>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT taken_at, temperature_c, heart_rate, resp_rate, systolic_bp, diastolic_bp, o2_sat
         FROM vitals
         WHERE study_id = ?1
         ORDER BY taken_at ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key()], row_to_vital_signs)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_vital_signs(row: &rusqlite::Row) -> Result<VitalSigns, rusqlite::Error> {
    Ok(VitalSigns {
        taken_at: timestamp_column(row, 0)?,
        temperature_c: row.get(1)?,
        heart_rate: row.get(2)?,
        resp_rate: row.get(3)?,
        systolic_bp: row.get(4)?,
        diastolic_bp: row.get(5)?,
        o2_sat: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn ordered_by_time() {
        let conn = open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO vitals VALUES ('S1', '2023-01-01 12:00', 37.0, 80, 16, 120, 80, 98);
             INSERT INTO vitals VALUES ('S1', '2023-01-01 10:05', 38.4, 110, 22, 100, 60, 91);",
        )
        .unwrap();
        let vitals = get_vital_signs(&conn, &SubjectId::new("S1")).unwrap();
        assert_eq!(vitals.len(), 2);
        assert_eq!(vitals[0].heart_rate, Some(110));
        assert!((vitals[0].temperature_c.unwrap() - 38.4).abs() < 0.01);
    }

    #[test]
    fn nullable_measurements() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO vitals (study_id, taken_at, heart_rate) VALUES ('S1', '2023-01-01 10:05', 72)",
            [],
        )
        .unwrap();
        let vitals = get_vital_signs(&conn, &SubjectId::new("S1")).unwrap();
        assert_eq!(vitals[0].temperature_c, None);
        assert_eq!(vitals[0].o2_sat, None);
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO vitals (study_id, taken_at) VALUES ('S1', 'not a time')",
            [],
        )
        .unwrap();
        let result = get_vital_signs(&conn, &SubjectId::new("S1"));
        assert!(matches!(result, Err(DatabaseError::Sqlite(_))));
    }
}
