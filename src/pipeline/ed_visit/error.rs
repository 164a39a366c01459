//! Error types for the ED visit pull.
//!
//! `VisitError` covers one subject's aggregation; `BatchError` covers the
//! batch driver and file exports.

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum VisitError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("No {entity} record for subject {subject}")]
    MissingRecord { entity: &'static str, subject: String },

    #[error("Expected one {entity} record for subject {subject}, found {count}")]
    AmbiguousRecord {
        entity: &'static str,
        subject: String,
        count: usize,
    },

    #[error("Extractor {extractor} failed: {source}")]
    Extractor {
        extractor: &'static str,
        #[source]
        source: Box<VisitError>,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Subject {subject} failed: {source}")]
    Visit {
        subject: String,
        #[source]
        source: VisitError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Header file {path}: {reason}")]
    HeaderFile { path: String, reason: String },
}
