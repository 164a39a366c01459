use serde::{Deserialize, Serialize};

/// Status literal marking a subject whose data has not been pulled yet.
pub const PULL_PENDING: &str = "No";
/// Status written back once a subject's exports are on disk.
pub const PULL_COMPLETE: &str = "Yes";

/// Study subject identifier.
///
/// Holds the identifier exactly as stored, whitespace included, so lookups
/// bind the same value the row was keyed with. Only an exactly quoted legacy
/// input (`'ABC123'`) is unquoted on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        match id.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            Some(unquoted) => Self(unquoted.to_string()),
            None => Self(id),
        }
    }

    /// Value bound to `study_id = ?` parameters.
    pub fn query_key(&self) -> &str {
        &self.0
    }

    /// Quote-free, trimmed, lower-cased form used for file names and record keys.
    pub fn file_safe(&self) -> String {
        self.0.replace('\'', "").trim().to_lowercase()
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of `study_ids_to_pull`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub subject: SubjectId,
    pub status: String,
}

impl PullRequest {
    pub fn is_pending(&self) -> bool {
        self.status == PULL_PENDING
    }
}
