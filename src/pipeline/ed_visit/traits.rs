//! Extractor traits, one per tier.
//!
//! The trait an extractor implements fixes what context it receives:
//! - SubjectExtractor: subject id + store
//! - TimedExtractor: also the discharge time string
//! - DispositionExtractor: also the disposition
//!
//! Extractors hold no per-subject state and only read from the store.

use rusqlite::Connection;

use super::error::VisitError;
use super::types::{DischargeContext, VisitRecords};
use crate::models::SubjectId;

/// Store handle and subject shared by every extractor call.
#[derive(Clone, Copy)]
pub struct SubjectScope<'a> {
    pub conn: &'a Connection,
    pub subject: &'a SubjectId,
}

/// Tier 1: needs nothing beyond the subject.
pub trait SubjectExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError>;
}

/// Tier 2: checks events against the discharge time.
pub trait TimedExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        scope: SubjectScope<'_>,
        dc_time: &str,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError>;
}

/// Tier 3: depends on discharge time and where the patient went.
pub trait DispositionExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        scope: SubjectScope<'_>,
        discharge: &DischargeContext,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify traits are object-safe (can be used as `dyn Trait`)
    #[test]
    fn traits_are_object_safe() {
        fn _assert_subject(_: &dyn SubjectExtractor) {}
        fn _assert_timed(_: &dyn TimedExtractor) {}
        fn _assert_disposition(_: &dyn DispositionExtractor) {}
    }
}
