//! Output formatting and persistence for comparison runs.
//!
//! Supports plain-text and JSON rendering, structured logging, and CSV append
//! of run summaries.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::compare::ComparisonResult;

/// Context of a single comparison run, appended to the history CSV.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub reference_file: String,
    pub candidate_file: String,
    pub reference_rows: usize,
    pub candidate_rows: usize,
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn new(
        reference_file: &str,
        candidate_file: &str,
        reference_rows: usize,
        candidate_rows: usize,
        result: &ComparisonResult,
        elapsed: Duration,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            reference_file: reference_file.to_string(),
            candidate_file: candidate_file.to_string(),
            reference_rows,
            candidate_rows,
            total: result.total,
            matched: result.matched,
            mismatched: result.mismatched,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    reference_file: &'a str,
    candidate_file: &'a str,
    #[serde(flatten)]
    result: &'a ComparisonResult,
}

/// Formats a duration as `N min M sec`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{} min {} sec", secs / 60, secs % 60)
}

/// Renders the counts followed by every detail entry.
pub fn render_text(result: &ComparisonResult) -> String {
    let mut out = format!(
        "Listings checked: {}\nMatched: {}\nMismatched / not found: {}\n",
        result.total, result.matched, result.mismatched
    );
    if !result.details.is_empty() {
        out.push('\n');
        for detail in &result.details {
            out.push_str(detail);
            out.push('\n');
        }
    }
    out
}

/// Renders the result as pretty-printed JSON, tagged with the file names.
pub fn render_json(
    reference_file: &str,
    candidate_file: &str,
    result: &ComparisonResult,
) -> Result<String> {
    let report = JsonReport {
        reference_file,
        candidate_file,
        result,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Writes the run summary and each detail entry to the log.
pub fn log_result(summary: &RunSummary, result: &ComparisonResult) {
    info!(
        reference_file = %summary.reference_file,
        reference_rows = summary.reference_rows,
        candidate_file = %summary.candidate_file,
        candidate_rows = summary.candidate_rows,
        total = summary.total,
        matched = summary.matched,
        mismatched = summary.mismatched,
        elapsed = %format_elapsed(Duration::from_secs_f64(summary.elapsed_secs)),
        "Comparison finished"
    );
    for detail in &result.details {
        warn!(detail = %detail, "Listing discrepancy");
    }
}

/// Appends a record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_result() -> ComparisonResult {
        ComparisonResult {
            total: 3,
            matched: 1,
            mismatched: 2,
            details: vec![
                "[not found] b".to_string(),
                "[mismatch] c:\n    floor: reference=2, found=3".to_string(),
            ],
        }
    }

    fn sample_summary() -> RunSummary {
        RunSummary::new(
            "ref.xlsx",
            "raw.xlsx",
            3,
            4,
            &sample_result(),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0 min 0 sec");
        assert_eq!(format_elapsed(Duration::from_millis(125_900)), "2 min 5 sec");
    }

    #[test]
    fn test_render_text_includes_counts_and_details() {
        let text = render_text(&sample_result());
        assert!(text.contains("Listings checked: 3"));
        assert!(text.contains("Matched: 1"));
        assert!(text.contains("Mismatched / not found: 2"));
        assert!(text.contains("[not found] b"));
        assert!(text.contains("floor: reference=2, found=3"));
    }

    #[test]
    fn test_render_json_flattens_result() {
        let json = render_json("ref.xlsx", "raw.xlsx", &sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["reference_file"], "ref.xlsx");
        assert_eq!(value["total"], 3);
        assert_eq!(value["matched"], 1);
        assert_eq!(value["mismatched"], 2);
        assert_eq!(value["details"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_log_result_does_not_panic() {
        log_result(&sample_summary(), &sample_result());
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("listing_tools_test_history.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &sample_summary()).unwrap();
        append_record(&path, &sample_summary()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            content.lines().filter(|l| l.starts_with("timestamp")).count(),
            1
        );

        fs::remove_file(&path).unwrap();
    }
}
