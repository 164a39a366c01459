//! ED Visit Data Pull
//!
//! Turns each pending study subject's ED visit into three parallel records
//! (coordinator text, REDCap labels, REDCap raw codes) and writes them out.
//!
//! ## Architecture
//!
//! Extractors are grouped by the context they need, run in tier order:
//! ```text
//! subject stage → discharge context → timed stage → disposition stage
//! ```
//! The discharge context (disposition + discharge time) is resolved once per
//! subject. A subject without exactly one discharge row fails before any
//! time-dependent extractor runs.

pub mod error;
pub mod types;
pub mod traits;
pub mod context;
pub mod extractors;
pub mod aggregator;
pub mod export;
pub mod runner;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{BatchError, VisitError};
pub use types::*;
pub use traits::*;
pub use context::resolve_discharge_context;
pub use aggregator::VisitAggregator;
pub use export::{
    coordinator_file_path, read_header_fields, write_coordinator_file, write_readable,
    write_redcap_csv, write_redcap_csv_file,
};
pub use runner::{run_full_batch, BatchRunner, BatchSummary, FailedSubject};
