//! Output records and per-subject context for the ED visit pull.
//!
//! Every subject produces three parallel records that share field order:
//! ```text
//! readable: display label → human text     (coordinator .txt file)
//! label:    REDCap field  → choice label   (labeled import CSV)
//! raw:      REDCap field  → choice code    (raw import CSV)
//! ```

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::VisitError;
use crate::models::{parse_timestamp, Disposition, SubjectId};

/// Readable-record key holding the subject id.
pub const STUDY_ID_KEY: &str = "Study ID";
/// REDCap record id field.
pub const RECORD_ID_FIELD: &str = "ec_id";
/// REDCap flag set for every subject reaching the pipeline.
pub const ENROLLED_FIELD: &str = "edenrollchart_enrolledined";

/// Readable value written when a domain has no data for the subject.
pub const NOT_DOCUMENTED: &str = "Not documented";

// ═══════════════════════════════════════════
// Output Record
// ═══════════════════════════════════════════

/// Insertion-ordered field map. Overwriting a key keeps its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRecord(IndexMap<String, String>);

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value if the key already existed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Read a field, inserting an empty value at the end if it is missing.
    pub fn get_or_default(&mut self, key: &str) -> &mut String {
        self.0.entry(key.to_string()).or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn first(&self) -> Option<(&str, &str)> {
        self.0.first().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Values in `columns` order; missing columns yield "". Keys outside
    /// `columns` are left out.
    pub fn project<'a>(&'a self, columns: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
        columns.iter().map(move |c| self.get(c).unwrap_or(""))
    }
}

// ═══════════════════════════════════════════
// Visit Records (the accumulator)
// ═══════════════════════════════════════════

/// The three records for one subject, mutated in place by every extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecords {
    pub readable: OutputRecord,
    pub label: OutputRecord,
    pub raw: OutputRecord,
}

impl VisitRecords {
    /// Records seeded with the subject id and the ED enrollment flag.
    pub fn seeded(subject: &SubjectId) -> Self {
        let id = subject.file_safe();
        let mut records = Self::default();
        records.readable.set(STUDY_ID_KEY, id.clone());
        records.label.set(RECORD_ID_FIELD, id.clone());
        records.label.set(ENROLLED_FIELD, "yes");
        records.raw.set(RECORD_ID_FIELD, id);
        records.raw.set(ENROLLED_FIELD, "1");
        records
    }

    /// Write one field across all three records.
    pub fn put(
        &mut self,
        display: &str,
        readable: impl Into<String>,
        field: &str,
        label: impl Into<String>,
        raw: impl Into<String>,
    ) {
        self.put_readable(display, readable);
        let label_prev = self.label.set(field, label);
        let raw_prev = self.raw.set(field, raw);
        if label_prev.is_some() || raw_prev.is_some() {
            tracing::warn!(field, "REDCap field overwritten by a later extractor");
        }
    }

    /// Same free-text value in all three records.
    pub fn put_text(&mut self, display: &str, field: &str, value: impl Into<String>) {
        let value = value.into();
        self.put(display, value.clone(), field, value.clone(), value);
    }

    /// Coded choice: readable and label show the label, raw holds the code.
    pub fn put_choice(&mut self, display: &str, field: &str, label: &str, code: &str) {
        self.put(display, label, field, label, code);
    }

    /// yes/no checkbox.
    pub fn put_flag(&mut self, display: &str, field: &str, value: bool) {
        let (readable, label, raw) = if value {
            ("Yes", "yes", "1")
        } else {
            ("No", "no", "0")
        };
        self.put(display, readable, field, label, raw);
    }

    /// Field that does not apply to this visit (REDCap choice 2 = n/a).
    pub fn put_not_applicable(&mut self, display: &str, field: &str, reason: &str) {
        self.put(display, format!("N/A ({reason})"), field, "n/a", "2");
    }

    /// Free text when present; otherwise only the readable record notes the gap.
    pub fn put_optional(&mut self, display: &str, field: &str, value: Option<String>) {
        match value {
            Some(v) => self.put_text(display, field, v),
            None => self.put_readable(display, NOT_DOCUMENTED),
        }
    }

    /// Coordinator-only detail with no REDCap field.
    pub fn put_readable(&mut self, key: &str, value: impl Into<String>) {
        if self.readable.set(key, value).is_some() {
            tracing::warn!(key, "readable field overwritten by a later extractor");
        }
    }
}

// ═══════════════════════════════════════════
// Discharge Context
// ═══════════════════════════════════════════

/// Disposition and discharge time, resolved once per subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DischargeContext {
    dispo: String,
    dc_time: String,
}

impl DischargeContext {
    pub fn new(dispo: impl Into<String>, date: &str, time: &str) -> Self {
        Self {
            dispo: dispo.into(),
            dc_time: format!("{date} {time}"),
        }
    }

    pub fn dispo(&self) -> &str {
        &self.dispo
    }

    /// `"<date> <time>"` as stored.
    pub fn dc_time(&self) -> &str {
        &self.dc_time
    }

    pub fn disposition(&self) -> Option<Disposition> {
        self.dispo.trim().to_lowercase().parse().ok()
    }
}

/// Parse a `"<date> <time>"` discharge string for time-window checks.
pub fn parse_dc_time(dc_time: &str) -> Result<NaiveDateTime, VisitError> {
    parse_timestamp(dc_time).ok_or_else(|| VisitError::InvalidTimestamp(dc_time.to_string()))
}

// ═══════════════════════════════════════════
// Extractor Tier
// ═══════════════════════════════════════════

/// Which derived context an extractor needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorTier {
    /// Subject id and store only.
    Subject,
    /// Also the discharge time.
    Timed,
    /// Also the discharge time and disposition.
    Disposition,
}

impl ExtractorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Timed => "timed",
            Self::Disposition => "disposition",
        }
    }
}

impl std::fmt::Display for ExtractorTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_first_position() {
        let mut rec = OutputRecord::new();
        rec.set("a", "1");
        rec.set("b", "2");
        assert_eq!(rec.set("a", "3"), Some("1".to_string()));
        let keys: Vec<&str> = rec.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(rec.get("a"), Some("3"));
    }

    #[test]
    fn get_or_default_inserts_empty_value() {
        let mut rec = OutputRecord::new();
        rec.set("a", "1");
        assert_eq!(rec.get("missing"), None);
        assert!(!rec.contains_key("missing"));

        assert_eq!(rec.get_or_default("missing").as_str(), "");
        assert!(rec.contains_key("missing"));
        assert_eq!(rec.keys().last(), Some("missing"));

        rec.get_or_default("missing").push_str("filled");
        assert_eq!(rec.get("missing"), Some("filled"));
    }

    #[test]
    fn project_fills_blanks_and_drops_extras() {
        let mut rec = OutputRecord::new();
        rec.set("ec_id", "abc123");
        rec.set("not_in_header", "x");
        let columns = vec!["extra".to_string(), "ec_id".to_string()];
        let row: Vec<&str> = rec.project(&columns).collect();
        assert_eq!(row, vec!["", "abc123"]);
    }

    #[test]
    fn seeded_records_start_with_subject_id() {
        let records = VisitRecords::seeded(&SubjectId::new("ABC123"));
        assert_eq!(records.readable.first(), Some((STUDY_ID_KEY, "abc123")));
        assert_eq!(records.label.first(), Some((RECORD_ID_FIELD, "abc123")));
        assert_eq!(records.raw.first(), Some((RECORD_ID_FIELD, "abc123")));
        assert_eq!(records.label.get(ENROLLED_FIELD), Some("yes"));
        assert_eq!(records.raw.get(ENROLLED_FIELD), Some("1"));
        assert_eq!(records.readable.len(), 1);
    }

    #[test]
    fn flag_and_choice_encodings() {
        let mut records = VisitRecords::default();
        records.put_flag("Fever", "edenrollchart_fever", true);
        records.put_choice("Disposition", "edenrollchart_dispo", "Admitted", "2");
        records.put_not_applicable("Discharge Antibiotics", "edenrollchart_dcabx", "admitted");

        assert_eq!(records.readable.get("Fever"), Some("Yes"));
        assert_eq!(records.label.get("edenrollchart_fever"), Some("yes"));
        assert_eq!(records.raw.get("edenrollchart_fever"), Some("1"));
        assert_eq!(records.label.get("edenrollchart_dispo"), Some("Admitted"));
        assert_eq!(records.raw.get("edenrollchart_dispo"), Some("2"));
        assert_eq!(records.readable.get("Discharge Antibiotics"), Some("N/A (admitted)"));
        assert_eq!(records.raw.get("edenrollchart_dcabx"), Some("2"));
    }

    #[test]
    fn readable_overwrite_keeps_latest_value() {
        let mut records = VisitRecords::default();
        records.put_readable("Arrival Mode", NOT_DOCUMENTED);
        records.put_readable("Arrival Mode", "Ambulance");
        assert_eq!(records.readable.get("Arrival Mode"), Some("Ambulance"));
        assert_eq!(records.readable.len(), 1);
    }

    #[test]
    fn optional_missing_only_touches_readable() {
        let mut records = VisitRecords::default();
        records.put_optional("Chief Complaint", "edenrollchart_chiefcomplaint", None);
        assert_eq!(records.readable.get("Chief Complaint"), Some(NOT_DOCUMENTED));
        assert!(records.label.is_empty());
        assert!(records.raw.is_empty());
    }

    #[test]
    fn discharge_context_combines_date_and_time() {
        let ctx = DischargeContext::new("home", "2023-01-01", "14:30");
        assert_eq!(ctx.dc_time(), "2023-01-01 14:30");
        assert_eq!(ctx.dispo(), "home");
        assert_eq!(ctx.disposition(), Some(Disposition::Home));
        assert!(parse_dc_time(ctx.dc_time()).is_ok());
    }

    #[test]
    fn unknown_disposition_has_no_parsed_value() {
        let ctx = DischargeContext::new("Observation Unit", "2023-01-01", "14:30");
        assert_eq!(ctx.disposition(), None);
    }

    #[test]
    fn bad_dc_time_is_reported() {
        let err = parse_dc_time("2023-01-01 ").unwrap_err();
        assert!(matches!(err, VisitError::InvalidTimestamp(_)));
    }

    #[test]
    fn records_serialize_in_field_order() {
        let records = VisitRecords::seeded(&SubjectId::new("S1"));
        let json = serde_json::to_string(&records.label).unwrap();
        assert_eq!(json, r#"{"ec_id":"s1","edenrollchart_enrolledined":"yes"}"#);
    }
}
