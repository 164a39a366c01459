//! File outputs: coordinator text files and REDCap import CSVs.
//!
//! CSV columns come from the header file, not from the records. Header
//! fields a record never set are written empty; record fields missing from
//! the header are dropped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::BatchError;
use super::types::OutputRecord;
use crate::models::SubjectId;

/// Column names from the first row of the header file.
pub fn read_header_fields(path: &Path) -> Result<Vec<String>, BatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| BatchError::HeaderFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let fields: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    if fields.iter().all(|f| f.trim().is_empty()) {
        return Err(BatchError::HeaderFile {
            path: path.display().to_string(),
            reason: "no column names in first row".into(),
        });
    }
    Ok(fields)
}

/// `<dir>/<file_safe_id>_data.txt`
pub fn coordinator_file_path(dir: &Path, subject: &SubjectId) -> PathBuf {
    dir.join(format!("{}_data.txt", subject.file_safe()))
}

/// Write `key: value` lines in record order.
pub fn write_readable<W: Write>(mut out: W, record: &OutputRecord) -> std::io::Result<()> {
    for (key, value) in record.iter() {
        writeln!(out, "{key}: {value}")?;
    }
    out.flush()
}

/// Write the coordinator file for one subject, returning its path.
pub fn write_coordinator_file(
    dir: &Path,
    subject: &SubjectId,
    record: &OutputRecord,
) -> Result<PathBuf, BatchError> {
    let path = coordinator_file_path(dir, subject);
    let file = File::create(&path)?;
    write_readable(BufWriter::new(file), record)?;
    Ok(path)
}

/// Write header row plus one row per record, `\n`-terminated.
pub fn write_redcap_csv<W: Write>(
    out: W,
    headers: &[String],
    rows: &[OutputRecord],
) -> Result<(), BatchError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(headers)?;
    for row in rows {
        let dropped = row
            .keys()
            .filter(|k| !headers.iter().any(|h| h.as_str() == *k))
            .count();
        if dropped > 0 {
            tracing::debug!(
                record = row.first().map(|(_, v)| v).unwrap_or(""),
                dropped,
                "Fields not in header left out of export"
            );
        }
        writer.write_record(row.project(headers))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a REDCap CSV to `path`.
pub fn write_redcap_csv_file(
    path: &Path,
    headers: &[String],
    rows: &[OutputRecord],
) -> Result<(), BatchError> {
    let file = File::create(path)?;
    write_redcap_csv(BufWriter::new(file), headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn label_record() -> OutputRecord {
        let mut rec = OutputRecord::new();
        rec.set("ec_id", "abc123");
        rec.set("edenrollchart_enrolledined", "yes");
        rec
    }

    #[test]
    fn missing_header_field_written_empty() {
        let cols = headers(&["ec_id", "edenrollchart_enrolledined", "extra_field"]);
        let mut buf = Vec::new();
        write_redcap_csv(&mut buf, &cols, &[label_record()]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "ec_id,edenrollchart_enrolledined,extra_field\nabc123,yes,\n"
        );
    }

    #[test]
    fn fields_outside_header_dropped() {
        let cols = headers(&["ec_id"]);
        let mut rec = label_record();
        rec.set("edenrollchart_dx1", "Cough");
        let mut buf = Vec::new();
        write_redcap_csv(&mut buf, &cols, &[rec]).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), "ec_id\nabc123\n");
    }

    #[test]
    fn columns_follow_header_not_record_order() {
        let cols = headers(&["edenrollchart_enrolledined", "ec_id"]);
        let mut buf = Vec::new();
        write_redcap_csv(&mut buf, &cols, &[label_record()]).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "edenrollchart_enrolledined,ec_id\nyes,abc123\n"
        );
    }

    #[test]
    fn values_with_commas_are_quoted() {
        let cols = headers(&["ec_id", "edenrollchart_dx1"]);
        let mut rec = label_record();
        rec.set("edenrollchart_dx1", "Fever, unspecified");
        let mut buf = Vec::new();
        write_redcap_csv(&mut buf, &cols, &[rec]).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "ec_id,edenrollchart_dx1\nabc123,\"Fever, unspecified\"\n"
        );
    }

    #[test]
    fn readable_lines_in_record_order() {
        let mut rec = OutputRecord::new();
        rec.set("Study ID", "abc123");
        rec.set("Arrival Date", "2023-01-01");
        let mut buf = Vec::new();
        write_readable(&mut buf, &rec).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Study ID: abc123\nArrival Date: 2023-01-01\n"
        );
    }

    #[test]
    fn reads_header_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ed_enrollment_headers.csv");
        std::fs::write(&path, "ec_id,edenrollchart_enrolledined,extra_field\n").unwrap();

        let fields = read_header_fields(&path).unwrap();
        assert_eq!(fields, headers(&["ec_id", "edenrollchart_enrolledined", "extra_field"]));
    }

    #[test]
    fn missing_header_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_header_fields(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(BatchError::HeaderFile { .. })));
    }

    #[test]
    fn coordinator_file_uses_file_safe_id() {
        let dir = tempfile::tempdir().unwrap();
        let subject = SubjectId::new("ABC123");
        let mut rec = OutputRecord::new();
        rec.set("Study ID", "abc123");

        let path = write_coordinator_file(dir.path(), &subject, &rec).unwrap();

        assert_eq!(path, dir.path().join("abc123_data.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Study ID: abc123\n");
    }
}
