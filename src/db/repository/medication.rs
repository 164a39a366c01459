use rusqlite::{params, Connection};

use super::{enum_column, timestamp_column};
use crate::db::DatabaseError;
use crate::models::{DischargePrescription, DrugClass, MedicationAdministration, SubjectId};

/// Medications of one class given in the ED, in administration order.
pub fn get_medication_administrations(
    conn: &Connection,
    subject: &SubjectId,
    class: DrugClass,
) -> Result<Vec<MedicationAdministration>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT given_at, drug_name, drug_class, route
         FROM medication_administrations
         WHERE study_id = ?1 AND drug_class = ?2
         ORDER BY given_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key(), class.as_str()], |row| {
        Ok(MedicationAdministration {
            given_at: timestamp_column(row, 0)?,
            drug_name: row.get(1)?,
            drug_class: enum_column(row, 2)?,
            route: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Discharge prescriptions of one class, in prescribing order.
pub fn get_discharge_prescriptions(
    conn: &Connection,
    subject: &SubjectId,
    class: DrugClass,
) -> Result<Vec<DischargePrescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT prescribed_at, drug_name, drug_class, duration_days
         FROM discharge_prescriptions
         WHERE study_id = ?1 AND drug_class = ?2
         ORDER BY prescribed_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![subject.query_key(), class.as_str()], |row| {
        Ok(DischargePrescription {
            prescribed_at: timestamp_column(row, 0)?,
            drug_name: row.get(1)?,
            drug_class: enum_column(row, 2)?,
            duration_days: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}
