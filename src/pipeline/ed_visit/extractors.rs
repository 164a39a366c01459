//! Domain extractors for the ED visit pull.
//!
//! Each extractor reads one clinical domain for the subject and writes the
//! same fields into all three records:
//! - tier 1 (subject): arrival, discharge, disposition, vitals, oxygen, labs,
//!   imaging, diagnoses
//! - tier 2 (timed): influenza testing, other viral testing, ED antivirals,
//!   ED antibiotics. Events after the discharge time are ignored.
//! - tier 3 (disposition): discharge antibiotics, discharge antivirals. Only
//!   apply when the patient left the ED for the community.
//!
//! The discharge and disposition extractors read the discharge row themselves
//! rather than taking the resolved context, so tier 1 stays context-free.

use chrono::{Duration, NaiveDateTime};

use super::context::load_single_discharge;
use super::error::VisitError;
use super::traits::{DispositionExtractor, SubjectExtractor, SubjectScope, TimedExtractor};
use super::types::{parse_dc_time, DischargeContext, VisitRecords, NOT_DOCUMENTED};
use crate::db::repository::{
    get_arrival, get_diagnoses, get_discharge_prescriptions, get_imaging_studies,
    get_lab_results, get_medication_administrations, get_oxygen_therapy, get_viral_tests,
    get_vital_signs,
};
use crate::models::{format_timestamp, Disposition, DrugClass, TestResult, ViralTest};

/// Temperature at or above which a visit counts as febrile.
pub const FEVER_THRESHOLD_C: f64 = 38.0;
/// SpO2 below this is recorded as hypoxia.
pub const HYPOXIA_THRESHOLD_PCT: i64 = 92;
/// Diagnosis slots exported to REDCap.
pub const MAX_DIAGNOSES: usize = 5;
/// Prescriptions signed shortly after the patient leaves still count.
const DISCHARGE_RX_GRACE_HOURS: i64 = 2;

/// Labs exported per visit: (store test name, display label, REDCap field).
const LAB_PANEL: &[(&str, &str, &str)] = &[
    ("wbc", "WBC", "edenrollchart_wbc"),
    ("lymphocytes", "Lymphocytes", "edenrollchart_lymph"),
    ("platelets", "Platelets", "edenrollchart_plt"),
    ("sodium", "Sodium", "edenrollchart_na"),
    ("bun", "BUN", "edenrollchart_bun"),
    ("creatinine", "Creatinine", "edenrollchart_creat"),
    ("lactate", "Lactate", "edenrollchart_lactate"),
];

/// ICD-10 influenza chapters (J09-J11).
const INFLUENZA_ICD_PREFIXES: &[&str] = &["J09", "J10", "J11"];

// ═══════════════════════════════════════════
// Stage builders
// ═══════════════════════════════════════════

/// Tier 1 extractors in export order.
pub fn subject_stage() -> Vec<Box<dyn SubjectExtractor>> {
    vec![
        Box::new(ArrivalExtractor),
        Box::new(DischargeExtractor),
        Box::new(DispoExtractor),
        Box::new(VitalsExtractor),
        Box::new(OxygenExtractor),
        Box::new(LabExtractor),
        Box::new(ImagingExtractor),
        Box::new(DiagnosisExtractor),
    ]
}

/// Tier 2 extractors in export order.
pub fn timed_stage() -> Vec<Box<dyn TimedExtractor>> {
    vec![
        Box::new(FluTestingExtractor),
        Box::new(OtherVirusExtractor),
        Box::new(EdMedicationExtractor::antivirals()),
        Box::new(EdMedicationExtractor::antibiotics()),
    ]
}

/// Tier 3 extractors in export order.
pub fn disposition_stage() -> Vec<Box<dyn DispositionExtractor>> {
    vec![
        Box::new(DischargeMedicationExtractor::antibiotics()),
        Box::new(DischargeMedicationExtractor::antivirals()),
    ]
}

// ═══════════════════════════════════════════
// Shared helpers
// ═══════════════════════════════════════════

/// Distinct values in first-seen order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

fn max_f64(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

// ═══════════════════════════════════════════
// Tier 1
// ═══════════════════════════════════════════

pub struct ArrivalExtractor;

impl SubjectExtractor for ArrivalExtractor {
    fn name(&self) -> &'static str {
        "arrival"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let Some(arrival) = get_arrival(scope.conn, scope.subject)? else {
            for display in ["Arrival Date", "Arrival Time", "Arrival Mode", "Chief Complaint"] {
                records.put_readable(display, NOT_DOCUMENTED);
            }
            return Ok(());
        };

        records.put_text("Arrival Date", "edenrollchart_arrivaldate", arrival.date);
        records.put_text("Arrival Time", "edenrollchart_arrivaltime", arrival.time);
        match arrival.mode {
            Some(mode) => records.put_choice(
                "Arrival Mode",
                "edenrollchart_arrivalmode",
                mode.label(),
                mode.code(),
            ),
            None => records.put_readable("Arrival Mode", NOT_DOCUMENTED),
        }
        records.put_optional(
            "Chief Complaint",
            "edenrollchart_chiefcomplaint",
            arrival.chief_complaint,
        );
        Ok(())
    }
}

pub struct DischargeExtractor;

impl SubjectExtractor for DischargeExtractor {
    fn name(&self) -> &'static str {
        "discharge"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let discharge = load_single_discharge(scope.conn, scope.subject)?;
        records.put_text("ED Discharge Date", "edenrollchart_dcdate", discharge.date);
        records.put_text("ED Discharge Time", "edenrollchart_dctime", discharge.time);
        Ok(())
    }
}

pub struct DispoExtractor;

impl SubjectExtractor for DispoExtractor {
    fn name(&self) -> &'static str {
        "disposition"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let discharge = load_single_discharge(scope.conn, scope.subject)?;
        let parsed = discharge.dispo.trim().to_lowercase().parse::<Disposition>();
        match parsed {
            Ok(dispo) => records.put_choice(
                "Disposition",
                "edenrollchart_dispo",
                dispo.label(),
                dispo.code(),
            ),
            Err(_) => {
                tracing::warn!(
                    subject = %scope.subject,
                    dispo = discharge.dispo.as_str(),
                    "Unrecognised disposition, exporting without a code"
                );
                records.put(
                    "Disposition",
                    discharge.dispo.clone(),
                    "edenrollchart_dispo",
                    discharge.dispo,
                    "",
                );
            }
        }
        Ok(())
    }
}

pub struct VitalsExtractor;

impl SubjectExtractor for VitalsExtractor {
    fn name(&self) -> &'static str {
        "vitals"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let vitals = get_vital_signs(scope.conn, scope.subject)?;
        let Some(triage) = vitals.first() else {
            records.put_readable("Triage Vitals", NOT_DOCUMENTED);
            return Ok(());
        };

        records.put_readable("Triage Vitals Time", format_timestamp(&triage.taken_at));
        records.put_optional(
            "Triage Temperature (C)",
            "edenrollchart_triagetemp",
            triage.temperature_c.map(|t| format!("{t:.1}")),
        );
        records.put_optional(
            "Triage Heart Rate",
            "edenrollchart_triagehr",
            triage.heart_rate.map(|v| v.to_string()),
        );
        records.put_optional(
            "Triage Respiratory Rate",
            "edenrollchart_triagerr",
            triage.resp_rate.map(|v| v.to_string()),
        );
        records.put_optional(
            "Triage Systolic BP",
            "edenrollchart_triagesbp",
            triage.systolic_bp.map(|v| v.to_string()),
        );
        records.put_optional(
            "Triage Diastolic BP",
            "edenrollchart_triagedbp",
            triage.diastolic_bp.map(|v| v.to_string()),
        );
        records.put_optional(
            "Triage O2 Saturation (%)",
            "edenrollchart_triageo2sat",
            triage.o2_sat.map(|v| v.to_string()),
        );

        let max_temp = max_f64(vitals.iter().filter_map(|v| v.temperature_c));
        records.put_optional(
            "Maximum Temperature (C)",
            "edenrollchart_maxtemp",
            max_temp.map(|t| format!("{t:.1}")),
        );
        if let Some(t) = max_temp {
            records.put_flag("Fever in ED", "edenrollchart_fever", t >= FEVER_THRESHOLD_C);
        }

        if let Some(min_sat) = vitals.iter().filter_map(|v| v.o2_sat).min() {
            records.put_flag(
                "Hypoxia in ED",
                "edenrollchart_hypoxia",
                min_sat < HYPOXIA_THRESHOLD_PCT,
            );
        }
        Ok(())
    }
}

pub struct OxygenExtractor;

impl SubjectExtractor for OxygenExtractor {
    fn name(&self) -> &'static str {
        "oxygen"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let episodes = get_oxygen_therapy(scope.conn, scope.subject)?;
        records.put_flag("Supplemental Oxygen", "edenrollchart_suppo2", !episodes.is_empty());

        if let Some(first) = episodes.first() {
            records.put_text("Oxygen Device", "edenrollchart_o2device", first.device.clone());
            records.put_optional(
                "Maximum O2 Flow (L/min)",
                "edenrollchart_o2maxflow",
                max_f64(episodes.iter().filter_map(|e| e.flow_rate_lpm)).map(|f| format!("{f:.1}")),
            );
        }
        Ok(())
    }
}

/// First (earliest) result for each test in the exported panel.
pub struct LabExtractor;

impl SubjectExtractor for LabExtractor {
    fn name(&self) -> &'static str {
        "labs"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let labs = get_lab_results(scope.conn, scope.subject)?;

        for &(test, display, field) in LAB_PANEL {
            match labs.iter().find(|l| l.test_name.trim().eq_ignore_ascii_case(test)) {
                Some(lab) => {
                    let readable = match &lab.unit {
                        Some(unit) => format!("{} {unit}", lab.value),
                        None => lab.value.clone(),
                    };
                    records.put(display, readable, field, lab.value.clone(), lab.value.clone());
                }
                None => records.put_readable(display, NOT_DOCUMENTED),
            }
        }
        Ok(())
    }
}

pub struct ImagingExtractor;

impl SubjectExtractor for ImagingExtractor {
    fn name(&self) -> &'static str {
        "imaging"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let studies = get_imaging_studies(scope.conn, scope.subject)?;
        let is_chest = |site: &str| site.to_lowercase().contains("chest");

        let chest_xray = studies.iter().find(|s| {
            ["XR", "CR", "DX"]
                .iter()
                .any(|m| s.modality.eq_ignore_ascii_case(m))
                && is_chest(s.body_site.as_str())
        });
        records.put_flag("Chest X-ray", "edenrollchart_cxr", chest_xray.is_some());
        if let Some(study) = chest_xray {
            records.put_readable(
                "Chest X-ray Impression",
                study.impression.clone().unwrap_or_else(|| NOT_DOCUMENTED.to_string()),
            );
        }

        let chest_ct = studies
            .iter()
            .any(|s| s.modality.eq_ignore_ascii_case("CT") && is_chest(s.body_site.as_str()));
        records.put_flag("CT Chest", "edenrollchart_ctchest", chest_ct);
        Ok(())
    }
}

pub struct DiagnosisExtractor;

impl SubjectExtractor for DiagnosisExtractor {
    fn name(&self) -> &'static str {
        "diagnoses"
    }

    fn apply(&self, scope: SubjectScope<'_>, records: &mut VisitRecords) -> Result<(), VisitError> {
        let diagnoses = get_diagnoses(scope.conn, scope.subject)?;
        records.put_text(
            "Number of ED Diagnoses",
            "edenrollchart_dxcount",
            diagnoses.len().to_string(),
        );

        for (i, dx) in diagnoses.iter().take(MAX_DIAGNOSES).enumerate() {
            let n = i + 1;
            records.put(
                &format!("Diagnosis {n}"),
                format!("{} - {}", dx.icd_code, dx.description),
                &format!("edenrollchart_dx{n}"),
                dx.description.clone(),
                dx.icd_code.clone(),
            );
        }
        if diagnoses.len() > MAX_DIAGNOSES {
            tracing::debug!(
                subject = %scope.subject,
                count = diagnoses.len(),
                "Diagnoses beyond the exported slots omitted"
            );
        }

        let flu_dx = diagnoses.iter().any(|dx| {
            let code = dx.icd_code.trim().to_uppercase();
            INFLUENZA_ICD_PREFIXES.iter().any(|p| code.starts_with(p))
        });
        records.put_flag("Influenza Diagnosis", "edenrollchart_fludx", flu_dx);
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Tier 2
// ═══════════════════════════════════════════

/// Viral tests collected up to discharge.
fn tests_before_discharge(
    scope: SubjectScope<'_>,
    dc: NaiveDateTime,
) -> Result<Vec<ViralTest>, VisitError> {
    Ok(get_viral_tests(scope.conn, scope.subject)?
        .into_iter()
        .filter(|t| t.collected_at <= dc)
        .collect())
}

/// Any positive wins; otherwise any negative; otherwise indeterminate.
fn overall_result(tests: &[&ViralTest]) -> TestResult {
    if tests.iter().any(|t| t.result == TestResult::Positive) {
        TestResult::Positive
    } else if tests.iter().any(|t| t.result == TestResult::Negative) {
        TestResult::Negative
    } else {
        TestResult::Indeterminate
    }
}

pub struct FluTestingExtractor;

impl TimedExtractor for FluTestingExtractor {
    fn name(&self) -> &'static str {
        "flu_testing"
    }

    fn apply(
        &self,
        scope: SubjectScope<'_>,
        dc_time: &str,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        let dc = parse_dc_time(dc_time)?;
        let tests = tests_before_discharge(scope, dc)?;
        let flu: Vec<&ViralTest> = tests.iter().filter(|t| t.is_influenza()).collect();

        records.put_flag("Influenza Testing in ED", "edenrollchart_flutest", !flu.is_empty());
        if let Some(first) = flu.first() {
            let result = overall_result(&flu);
            records.put_choice(
                "Influenza Result",
                "edenrollchart_fluresult",
                result.label(),
                result.code(),
            );
            records.put_text(
                "Influenza Test Type",
                "edenrollchart_flutesttype",
                first.test_name.clone(),
            );
            records.put_readable("Influenza Test Time", format_timestamp(&first.collected_at));
        }
        Ok(())
    }
}

pub struct OtherVirusExtractor;

impl TimedExtractor for OtherVirusExtractor {
    fn name(&self) -> &'static str {
        "other_virus_testing"
    }

    fn apply(
        &self,
        scope: SubjectScope<'_>,
        dc_time: &str,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        let dc = parse_dc_time(dc_time)?;
        let tests = tests_before_discharge(scope, dc)?;
        let other: Vec<&ViralTest> = tests.iter().filter(|t| !t.is_influenza()).collect();

        records.put_flag("Other Viral Testing in ED", "edenrollchart_othervir", !other.is_empty());
        if !other.is_empty() {
            let positives = distinct(
                other
                    .iter()
                    .filter(|t| t.result == TestResult::Positive)
                    .map(|t| t.pathogen.as_str()),
            );
            let detected = if positives.is_empty() {
                "none".to_string()
            } else {
                positives.join(", ")
            };
            records.put_text("Other Viruses Detected", "edenrollchart_othervirpos", detected);
        }
        Ok(())
    }
}

/// Medications of one class administered in the ED before discharge.
pub struct EdMedicationExtractor {
    name: &'static str,
    class: DrugClass,
    display: &'static str,
    field: &'static str,
}

impl EdMedicationExtractor {
    pub fn antivirals() -> Self {
        Self {
            name: "ed_antiviral",
            class: DrugClass::Antiviral,
            display: "ED Antiviral",
            field: "edenrollchart_edantiviral",
        }
    }

    pub fn antibiotics() -> Self {
        Self {
            name: "ed_antibiotic",
            class: DrugClass::Antibiotic,
            display: "ED Antibiotic",
            field: "edenrollchart_edabx",
        }
    }
}

impl TimedExtractor for EdMedicationExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(
        &self,
        scope: SubjectScope<'_>,
        dc_time: &str,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        let dc = parse_dc_time(dc_time)?;
        let given: Vec<_> = get_medication_administrations(scope.conn, scope.subject, self.class)?
            .into_iter()
            .filter(|m| m.given_at <= dc)
            .collect();

        records.put_flag(self.display, self.field, !given.is_empty());
        if let Some(first) = given.first() {
            let names = distinct(given.iter().map(|m| m.drug_name.as_str())).join(", ");
            records.put_text(
                &format!("{} Name(s)", self.display),
                &format!("{}name", self.field),
                names,
            );
            records.put_text(
                &format!("{} First Dose Time", self.display),
                &format!("{}time", self.field),
                format_timestamp(&first.given_at),
            );
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Tier 3
// ═══════════════════════════════════════════

/// Discharge prescriptions of one class for patients leaving to the community.
pub struct DischargeMedicationExtractor {
    name: &'static str,
    class: DrugClass,
    display: &'static str,
    field: &'static str,
}

impl DischargeMedicationExtractor {
    pub fn antibiotics() -> Self {
        Self {
            name: "discharge_antibiotic",
            class: DrugClass::Antibiotic,
            display: "Discharge Antibiotic",
            field: "edenrollchart_dcabx",
        }
    }

    pub fn antivirals() -> Self {
        Self {
            name: "discharge_antiviral",
            class: DrugClass::Antiviral,
            display: "Discharge Antiviral",
            field: "edenrollchart_dcantiviral",
        }
    }
}

impl DispositionExtractor for DischargeMedicationExtractor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(
        &self,
        scope: SubjectScope<'_>,
        discharge: &DischargeContext,
        records: &mut VisitRecords,
    ) -> Result<(), VisitError> {
        let leaves = discharge
            .disposition()
            .is_some_and(|d| d.leaves_to_community());
        if !leaves {
            records.put_not_applicable(self.display, self.field, discharge.dispo());
            return Ok(());
        }

        let cutoff =
            parse_dc_time(discharge.dc_time())? + Duration::hours(DISCHARGE_RX_GRACE_HOURS);
        let prescribed: Vec<_> = get_discharge_prescriptions(scope.conn, scope.subject, self.class)?
            .into_iter()
            .filter(|rx| rx.prescribed_at <= cutoff)
            .collect();

        records.put_flag(self.display, self.field, !prescribed.is_empty());
        if let Some(first) = prescribed.first() {
            let names = distinct(prescribed.iter().map(|rx| rx.drug_name.as_str())).join(", ");
            records.put_text(
                &format!("{} Name(s)", self.display),
                &format!("{}name", self.field),
                names,
            );
            records.put_optional(
                &format!("{} Duration (days)", self.display),
                &format!("{}days", self.field),
                first.duration_days.map(|d| d.to_string()),
            );
        }
        Ok(())
    }
}
