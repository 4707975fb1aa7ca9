//! Merges spreadsheet exports into a single workbook.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::files::list_spreadsheets;
use crate::sheet::{Cell, Table, read_table, write_xlsx};

/// Column added to every merged row naming the file it came from.
pub const SOURCE_COLUMN: &str = "source_file";

#[derive(Debug)]
pub struct MergeOutcome {
    /// Files that were read and merged.
    pub merged_files: Vec<String>,
    /// Files that could not be read, with the reason.
    pub skipped_files: Vec<(String, String)>,
    pub rows: usize,
    /// `None` when no file could be read and nothing was written.
    pub output: Option<PathBuf>,
}

/// Reads every `.xlsx` in `input_dir` except `output_name`, tags rows with
/// their source file, and writes the union to `output_dir/output_name`.
///
/// Unreadable files are skipped with a warning.
#[tracing::instrument(
    skip(input_dir, output_dir),
    fields(input = %input_dir.display(), output = %output_dir.display())
)]
pub fn merge_dir(input_dir: &Path, output_dir: &Path, output_name: &str) -> Result<MergeOutcome> {
    let files = list_spreadsheets(input_dir, Some(output_name))?;
    info!(count = files.len(), "Spreadsheets found");

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} files")?.progress_chars("=> "),
    );
    pb.set_message("Merging");

    let mut tables = Vec::new();
    let mut merged_files = Vec::new();
    let mut skipped_files = Vec::new();

    for file in files {
        match read_table(&input_dir.join(&file)) {
            Ok(mut table) => {
                table.push_column(SOURCE_COLUMN, Cell::Text(file.clone()));
                tables.push(table);
                merged_files.push(file);
            }
            Err(e) => {
                warn!(file = %file, error = %format!("{e:#}"), "Skipping unreadable file");
                skipped_files.push((file, format!("{e:#}")));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if tables.is_empty() {
        return Ok(MergeOutcome {
            merged_files,
            skipped_files,
            rows: 0,
            output: None,
        });
    }

    let merged = Table::concat(tables);
    let output = output_dir.join(output_name);
    write_xlsx(&output, &merged)?;
    info!(output = %output.display(), rows = merged.len(), "Merged workbook written");

    Ok(MergeOutcome {
        merged_files,
        skipped_files,
        rows: merged.len(),
        output: Some(output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn sheet(headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_merge_dir_tags_rows_and_skips_broken_files() {
        let dir = env::temp_dir().join("listing_tools_test_merge");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        write_xlsx(
            &dir.join("a.xlsx"),
            &sheet(&["url", "price"], vec![vec![Cell::Text("u1".into()), Cell::Int(10)]]),
        )
        .unwrap();
        write_xlsx(
            &dir.join("b.xlsx"),
            &sheet(&["url", "floor"], vec![vec![Cell::Text("u2".into()), Cell::Int(4)]]),
        )
        .unwrap();
        fs::write(dir.join("broken.xlsx"), b"not a workbook").unwrap();

        let final_dir = dir.join("final");
        let outcome = merge_dir(&dir, &final_dir, "merged_data.xlsx").unwrap();

        assert_eq!(outcome.merged_files, vec!["a.xlsx", "b.xlsx"]);
        assert_eq!(outcome.skipped_files.len(), 1);
        assert_eq!(outcome.skipped_files[0].0, "broken.xlsx");
        assert_eq!(outcome.rows, 2);

        let merged = read_table(&final_dir.join("merged_data.xlsx")).unwrap();
        assert_eq!(merged.headers, vec!["url", "price", SOURCE_COLUMN, "floor"]);
        let source = merged.column(SOURCE_COLUMN).unwrap();
        assert_eq!(merged.cell(0, source), &Cell::Text("a.xlsx".into()));
        assert_eq!(merged.cell(1, source), &Cell::Text("b.xlsx".into()));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_merge_dir_writes_nothing_without_readable_files() {
        let dir = env::temp_dir().join("listing_tools_test_merge_empty");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let outcome = merge_dir(&dir, &dir.join("final"), "merged_data.xlsx").unwrap();

        assert!(outcome.output.is_none());
        assert!(!dir.join("final").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
