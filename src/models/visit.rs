//! Per-domain rows read from the ED visit tables.

use chrono::NaiveDateTime;

use super::enums::{ArrivalMode, DrugClass, TestResult};

/// Accepted timestamp layouts. Seconds are optional in source extracts.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a store timestamp (`YYYY-MM-DD HH:MM[:SS]`).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Render a timestamp the way coordinators read it (minute precision).
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalRecord {
    pub date: String,
    pub time: String,
    pub mode: Option<ArrivalMode>,
    pub chief_complaint: Option<String>,
}

/// Discharge row: disposition plus the separate date and time columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DischargeRecord {
    pub dispo: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VitalSigns {
    pub taken_at: NaiveDateTime,
    pub temperature_c: Option<f64>,
    pub heart_rate: Option<i64>,
    pub resp_rate: Option<i64>,
    pub systolic_bp: Option<i64>,
    pub diastolic_bp: Option<i64>,
    pub o2_sat: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OxygenTherapy {
    pub started_at: NaiveDateTime,
    pub device: String,
    pub flow_rate_lpm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabResult {
    pub collected_at: NaiveDateTime,
    pub test_name: String,
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagingStudy {
    pub performed_at: NaiveDateTime,
    pub modality: String,
    pub body_site: String,
    pub impression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub seq: i64,
    pub icd_code: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViralTest {
    pub collected_at: NaiveDateTime,
    pub test_name: String,
    pub pathogen: String,
    pub result: TestResult,
}

impl ViralTest {
    pub fn is_influenza(&self) -> bool {
        self.pathogen.to_lowercase().starts_with("influenza")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicationAdministration {
    pub given_at: NaiveDateTime,
    pub drug_name: String,
    pub drug_class: DrugClass,
    pub route: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DischargePrescription {
    pub prescribed_at: NaiveDateTime,
    pub drug_name: String,
    pub drug_class: DrugClass,
    pub duration_days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minute_and_second_precision() {
        let a = parse_timestamp("2023-01-01 14:30").unwrap();
        let b = parse_timestamp("2023-01-01 14:30:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(format_timestamp(&a), "2023-01-01 14:30");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2023-01-01").is_none());
        assert!(parse_timestamp("yesterday 14:30").is_none());
    }

    #[test]
    fn influenza_detection_is_case_insensitive() {
        let mut t = ViralTest {
            collected_at: parse_timestamp("2023-01-01 10:00").unwrap(),
            test_name: "Resp panel".into(),
            pathogen: "Influenza A".into(),
            result: TestResult::Positive,
        };
        assert!(t.is_influenza());
        t.pathogen = "RSV".into();
        assert!(!t.is_influenza());
    }
}
