//! Shared test data: a complete ED visit for one subject.

use rusqlite::Connection;

use crate::db::sqlite::open_memory_database;

pub const SUBJECT: &str = "ABC123";

/// Empty in-memory store with the schema applied.
pub fn test_db() -> Connection {
    open_memory_database().expect("Failed to open in-memory DB")
}

/// Store holding the full `ABC123` visit, discharged home at 2023-01-01 14:30.
pub fn visit_db() -> Connection {
    let conn = test_db();
    seed_visit(&conn, SUBJECT, "home");
    conn
}

/// Insert a complete visit. Some events are timed after the 14:30 discharge
/// so time-window filtering is exercised.
pub fn seed_visit(conn: &Connection, id: &str, dispo: &str) {
    conn.execute(
        "INSERT INTO study_ids_to_pull (study_id, data_pull_complete) VALUES (?1, 'No')",
        [id],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO discharges VALUES (?1, ?2, '2023-01-01', '14:30')",
        [id, dispo],
    )
    .unwrap();

    let sql = "
        INSERT INTO arrivals VALUES ('{id}', '2023-01-01', '09:15', 'ambulance', 'fever and cough');

        INSERT INTO vitals VALUES ('{id}', '2023-01-01 09:20', 38.6, 112, 24, 118, 72, 91);
        INSERT INTO vitals VALUES ('{id}', '2023-01-01 12:00', 37.4, 96, 18, 124, 78, 96);

        INSERT INTO oxygen_therapy VALUES ('{id}', '2023-01-01 09:40', 'nasal cannula', 2.0);
        INSERT INTO oxygen_therapy VALUES ('{id}', '2023-01-01 10:30', 'nasal cannula', 4.0);

        INSERT INTO lab_results VALUES ('{id}', '2023-01-01 09:45', 'WBC', '12.4', 'K/uL');
        INSERT INTO lab_results VALUES ('{id}', '2023-01-01 09:45', 'Creatinine', '1.1', 'mg/dL');
        INSERT INTO lab_results VALUES ('{id}', '2023-01-01 13:00', 'WBC', '11.0', 'K/uL');

        INSERT INTO imaging_studies VALUES ('{id}', '2023-01-01 10:00', 'XR', 'Chest', 'No acute infiltrate');

        INSERT INTO diagnoses VALUES ('{id}', 1, 'J10.1', 'Influenza with other respiratory manifestations');
        INSERT INTO diagnoses VALUES ('{id}', 2, 'R50.9', 'Fever, unspecified');

        INSERT INTO viral_tests VALUES ('{id}', '2023-01-01 09:50', 'Flu A/B PCR', 'Influenza A', 'positive');
        INSERT INTO viral_tests VALUES ('{id}', '2023-01-01 09:50', 'RSV PCR', 'RSV', 'negative');
        INSERT INTO viral_tests VALUES ('{id}', '2023-01-01 15:00', 'Resp panel', 'Rhinovirus', 'positive');

        INSERT INTO medication_administrations VALUES ('{id}', '2023-01-01 11:00', 'oseltamivir', 'antiviral', 'PO');
        INSERT INTO medication_administrations VALUES ('{id}', '2023-01-01 15:30', 'ceftriaxone', 'antibiotic', 'IV');

        INSERT INTO discharge_prescriptions VALUES ('{id}', '2023-01-01 14:20', 'oseltamivir', 'antiviral', 5);
    ";
    conn.execute_batch(&sql.replace("{id}", id)).unwrap();
}
