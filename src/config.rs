use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "ed-datapull";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default SQLite file, relative to the working directory
pub const DEFAULT_DATABASE_FILE: &str = "test.db";
/// Default directory holding the header file and all outputs
pub const PATIENT_DATA_DIR_NAME: &str = "Patient_Data";

pub const HEADER_FILE_NAME: &str = "ed_enrollment_headers.csv";
pub const LABEL_EXPORT_FILE_NAME: &str = "redcap_label_data.csv";
pub const RAW_EXPORT_FILE_NAME: &str = "redcap_raw_data.csv";

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "ed_datapull=info"
}

/// Batch run settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct DataPullConfig {
    pub database_path: PathBuf,
    pub patient_data_dir: PathBuf,
    /// Log and skip a failing subject instead of aborting the batch.
    pub continue_on_error: bool,
    /// Flip processed subjects to "Yes" once both CSVs are written.
    pub mark_complete: bool,
}

impl DataPullConfig {
    pub fn new(database_path: impl Into<PathBuf>, patient_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            patient_data_dir: patient_data_dir.into(),
            continue_on_error: false,
            mark_complete: false,
        }
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn header_path(&self) -> PathBuf {
        self.patient_data_dir.join(HEADER_FILE_NAME)
    }

    pub fn label_export_path(&self) -> PathBuf {
        self.patient_data_dir.join(LABEL_EXPORT_FILE_NAME)
    }

    pub fn raw_export_path(&self) -> PathBuf {
        self.patient_data_dir.join(RAW_EXPORT_FILE_NAME)
    }
}

impl Default for DataPullConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_FILE, PATIENT_DATA_DIR_NAME)
    }
}
