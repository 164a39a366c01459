//! Repository layer: read-only, subject-scoped queries over the ED visit tables.
//!
//! One sub-module per clinical domain. All public functions are re-exported here.

mod arrival;
mod diagnosis;
mod discharge;
mod imaging;
mod lab_result;
mod medication;
mod oxygen;
mod study_subject;
mod viral_test;
mod vital_sign;

use std::str::FromStr;

use chrono::NaiveDateTime;

use super::DatabaseError;
use crate::models::parse_timestamp;

pub use arrival::*;
pub use diagnosis::*;
pub use discharge::*;
pub use imaging::*;
pub use lab_result::*;
pub use medication::*;
pub use oxygen::*;
pub use study_subject::*;
pub use viral_test::*;
pub use vital_sign::*;

/// Read a TEXT timestamp column, failing the row on an unparseable value.
fn timestamp_column(row: &rusqlite::Row, idx: usize) -> Result<NaiveDateTime, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}

/// Read a TEXT column holding a `str_enum!` value.
fn enum_column<T>(row: &rusqlite::Row, idx: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
