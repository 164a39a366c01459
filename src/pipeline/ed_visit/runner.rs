//! Batch driver. Pulls every pending subject and writes the exports.
//!
//! Subjects are processed one at a time in table order. Each processed
//! subject gets a coordinator text file; label and raw records are collected
//! and written as two REDCap CSVs once all subjects are done.

use std::time::Instant;

use rusqlite::Connection;
use serde::Serialize;

use super::aggregator::VisitAggregator;
use super::error::BatchError;
use super::export::{read_header_fields, write_coordinator_file, write_redcap_csv_file};
use super::types::OutputRecord;
use crate::config::DataPullConfig;
use crate::db::repository::{get_pull_requests, set_pull_status};
use crate::models::{SubjectId, PULL_COMPLETE};

/// A subject whose aggregation failed under `continue_on_error`.
#[derive(Debug, Clone, Serialize)]
pub struct FailedSubject {
    pub subject: String,
    pub error: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// File-safe ids of subjects written to the exports, in order.
    pub processed: Vec<String>,
    /// Subjects whose status was not "No".
    pub skipped: u32,
    pub failed: Vec<FailedSubject>,
    pub duration_ms: u64,
}

/// Runs the aggregator over every pending subject.
pub struct BatchRunner {
    aggregator: VisitAggregator,
    config: DataPullConfig,
}

impl BatchRunner {
    pub fn new(aggregator: VisitAggregator, config: DataPullConfig) -> Self {
        Self { aggregator, config }
    }

    pub fn run(&self, conn: &Connection) -> Result<BatchSummary, BatchError> {
        let start = Instant::now();
        let headers = read_header_fields(&self.config.header_path())?;
        let requests = get_pull_requests(conn)?;

        let mut summary = BatchSummary::default();
        let mut completed: Vec<SubjectId> = Vec::new();
        let mut label_rows: Vec<OutputRecord> = Vec::new();
        let mut raw_rows: Vec<OutputRecord> = Vec::new();

        for request in requests {
            if !request.is_pending() {
                summary.skipped += 1;
                continue;
            }
            let subject = request.subject;
            let file_id = subject.file_safe();

            tracing::info!("Writing coordinator data file for subject {file_id}");
            let records = match self.aggregator.aggregate(conn, &subject) {
                Ok(records) => records,
                Err(e) if self.config.continue_on_error => {
                    tracing::warn!(
                        subject = %subject,
                        error = %e,
                        "Subject failed, continuing batch"
                    );
                    summary.failed.push(FailedSubject {
                        subject: subject.to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    return Err(BatchError::Visit {
                        subject: subject.to_string(),
                        source: e,
                    })
                }
            };

            write_coordinator_file(self.config.patient_data_dir(), &subject, &records.readable)?;
            label_rows.push(records.label);
            raw_rows.push(records.raw);
            summary.processed.push(file_id);
            completed.push(subject);
        }
        tracing::info!("Finished writing all coordinator files");

        tracing::info!("Starting write to REDCap data files");
        write_redcap_csv_file(&self.config.label_export_path(), &headers, &label_rows)?;
        tracing::info!("Finished writing labeled REDCap data file");
        write_redcap_csv_file(&self.config.raw_export_path(), &headers, &raw_rows)?;
        tracing::info!("Finished writing raw REDCap data file");

        if self.config.mark_complete {
            for subject in &completed {
                set_pull_status(conn, subject, PULL_COMPLETE)?;
            }
            tracing::info!(count = completed.len(), "Marked subjects as pulled");
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            processed = summary.processed.len(),
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "All done"
        );
        Ok(summary)
    }
}

/// Run a full batch with the standard extractor set.
pub fn run_full_batch(
    conn: &Connection,
    config: &DataPullConfig,
) -> Result<BatchSummary, BatchError> {
    BatchRunner::new(VisitAggregator::standard(), config.clone()).run(conn)
}
