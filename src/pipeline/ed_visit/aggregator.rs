//! VisitAggregator: builds the three output records for one subject.
//!
//! Seeds the records, resolves the discharge context once, then runs the
//! three extractor stages in order:
//! ```text
//! seed → discharge context → tier 1 (subject) → tier 2 (timed) → tier 3 (disposition)
//! ```
//! Extractor failures are not caught here; they propagate with the
//! extractor's name attached.

use rusqlite::Connection;

use super::context::resolve_discharge_context;
use super::error::VisitError;
use super::extractors::{disposition_stage, subject_stage, timed_stage};
use super::traits::*;
use super::types::{DischargeContext, ExtractorTier, VisitRecords};
use crate::models::SubjectId;

/// Ordered extractor stages for one deployment.
pub struct VisitAggregator {
    subject_stage: Vec<Box<dyn SubjectExtractor>>,
    timed_stage: Vec<Box<dyn TimedExtractor>>,
    disposition_stage: Vec<Box<dyn DispositionExtractor>>,
}

impl VisitAggregator {
    pub fn new(
        subject_stage: Vec<Box<dyn SubjectExtractor>>,
        timed_stage: Vec<Box<dyn TimedExtractor>>,
        disposition_stage: Vec<Box<dyn DispositionExtractor>>,
    ) -> Self {
        Self {
            subject_stage,
            timed_stage,
            disposition_stage,
        }
    }

    /// The fixed ED enrollment extractor set.
    pub fn standard() -> Self {
        Self::new(subject_stage(), timed_stage(), disposition_stage())
    }

    /// Extractor names with their tier, in execution order.
    pub fn extractor_names(&self) -> Vec<(ExtractorTier, &'static str)> {
        let t1 = self.subject_stage.iter().map(|e| (ExtractorTier::Subject, e.name()));
        let t2 = self.timed_stage.iter().map(|e| (ExtractorTier::Timed, e.name()));
        let t3 = self
            .disposition_stage
            .iter()
            .map(|e| (ExtractorTier::Disposition, e.name()));
        t1.chain(t2).chain(t3).collect()
    }

    /// Build the readable, label and raw records for one subject.
    pub fn aggregate(
        &self,
        conn: &Connection,
        subject: &SubjectId,
    ) -> Result<VisitRecords, VisitError> {
        let mut records = VisitRecords::seeded(subject);
        let discharge = resolve_discharge_context(conn, subject)?;
        let scope = SubjectScope { conn, subject };

        self.run_subject_stage(scope, &mut records)?;
        self.run_timed_stage(scope, discharge.dc_time(), &mut records)?;
        self.run_disposition_stage(scope, &discharge, &mut records)?;

        tracing::debug!(
            subject = %subject,
            fields = records.label.len(),
            "Visit aggregated"
        );
        Ok(records)
    }

    pub fn run_subject_stage(
        &self,
        scope: SubjectScope<'_>,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        for extractor in &self.subject_stage {
            log_step(ExtractorTier::Subject, extractor.name(), scope.subject);
            extractor
                .apply(scope, records)
                .map_err(|e| extractor_failed(extractor.name(), e))?;
        }
        Ok(())
    }

    pub fn run_timed_stage(
        &self,
        scope: SubjectScope<'_>,
        dc_time: &str,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        for extractor in &self.timed_stage {
            log_step(ExtractorTier::Timed, extractor.name(), scope.subject);
            extractor
                .apply(scope, dc_time, records)
                .map_err(|e| extractor_failed(extractor.name(), e))?;
        }
        Ok(())
    }

    pub fn run_disposition_stage(
        &self,
        scope: SubjectScope<'_>,
        discharge: &DischargeContext,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        for extractor in &self.disposition_stage {
            log_step(ExtractorTier::Disposition, extractor.name(), scope.subject);
            extractor
                .apply(scope, discharge, records)
                .map_err(|e| extractor_failed(extractor.name(), e))?;
        }
        Ok(())
    }
}

impl Default for VisitAggregator {
    fn default() -> Self {
        Self::standard()
    }
}

fn log_step(tier: ExtractorTier, name: &'static str, subject: &SubjectId) {
    tracing::debug!(
        tier = tier.as_str(),
        extractor = name,
        subject = %subject,
        "Running extractor"
    );
}

fn extractor_failed(extractor: &'static str, source: VisitError) -> VisitError {
    VisitError::Extractor {
        extractor,
        source: Box::new(source),
    }
}
