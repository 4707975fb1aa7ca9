//! Charts and a text summary over a merged listings spreadsheet.

pub mod chart;
pub mod filters;
pub mod format;
pub mod tasks;
pub mod types;
pub mod utility;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::sheet::read_table;
use filters::Filters;
use tasks::{TASKS, TaskReport};
use types::flats_from_table;

pub const README_NAME: &str = "readME.txt";
pub const README_HEADER: &str = "Real-estate analysis results";

#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub flats: usize,
    pub completed: Vec<u32>,
    pub failed: Vec<(u32, String)>,
    pub charts_failed: Vec<(u32, String)>,
    pub readme: PathBuf,
}

/// Runs every task over `input` and writes `task_N.png` charts plus the
/// readme into `out_dir`. A task that fails is logged and skipped; a chart
/// that fails to render still gets its description written.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
pub fn run(input: &Path, filters_path: &Path, out_dir: &Path) -> Result<ReportOutcome> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let readme = out_dir.join(README_NAME);
    fs::write(&readme, format!("{README_HEADER}\n{}\n\n", "=".repeat(50)))
        .with_context(|| format!("failed to write {}", readme.display()))?;

    let table = read_table(input)?;
    let mut flats = flats_from_table(&table)
        .with_context(|| format!("failed to load flats from {}", input.display()))?;
    info!(rows = table.len(), flats = flats.len(), "Flats loaded");

    if let Some(filters) = Filters::load(filters_path)? {
        flats = filters.apply(flats);
    }

    let mut outcome = ReportOutcome {
        flats: flats.len(),
        readme: readme.clone(),
        ..Default::default()
    };

    for (i, task) in TASKS.iter().enumerate() {
        let number = i as u32 + 1;
        let report = match task(&flats) {
            Ok(report) => report,
            Err(e) => {
                error!(task = number, error = %e, "Task failed");
                outcome.failed.push((number, format!("{e:#}")));
                continue;
            }
        };

        if let Err(e) = save(&report, out_dir, &readme) {
            warn!(task = number, error = %e, "Chart not saved");
            outcome.charts_failed.push((number, format!("{e:#}")));
        }
        outcome.completed.push(number);
    }

    info!(
        completed = outcome.completed.len(),
        failed = outcome.failed.len(),
        "Report finished"
    );
    Ok(outcome)
}

fn save(report: &TaskReport, out_dir: &Path, readme: &Path) -> Result<()> {
    let chart_path = out_dir.join(format!("task_{}.png", report.number));
    let rendered = chart::render(&report.chart, &chart_path);

    let mut file = OpenOptions::new()
        .append(true)
        .open(readme)
        .with_context(|| format!("failed to open {}", readme.display()))?;
    write!(file, "Task {}:\n{}\n\n", report.number, report.description)?;

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Cell, Table, write_xlsx};

    #[test]
    fn test_run_writes_readme_for_each_task() {
        let dir = std::env::temp_dir().join("listing_tools_report_run");
        let _ = fs::remove_dir_all(&dir);

        let mut table = Table::new(
            ["price", "total_meters", "district", "street", "rooms_count", "type_property"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        table.push_row(vec![
            Cell::Int(10_000_000),
            Cell::Float(50.0),
            Cell::Text("A".into()),
            Cell::Text("S".into()),
            Cell::Int(2),
            Cell::Text("Secondary".into()),
        ]);
        table.push_row(vec![
            Cell::Int(6_000_000),
            Cell::Float(30.0),
            Cell::Text("B".into()),
            Cell::Text("T".into()),
            Cell::Int(1),
            Cell::Text("New build".into()),
        ]);
        let input = dir.join("merged.xlsx");
        write_xlsx(&input, &table).unwrap();
        fs::write(dir.join("filters.txt"), "# Task 5\nB\n").unwrap();

        let outcome = run(&input, &dir.join("filters.txt"), &dir.join("figures")).unwrap();

        assert_eq!(outcome.flats, 1);
        // No floors column, and a single type after filtering.
        assert_eq!(outcome.completed, vec![1, 3, 5, 6, 7]);
        assert_eq!(
            outcome.failed.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
            vec![2, 4]
        );

        let readme = fs::read_to_string(&outcome.readme).unwrap();
        assert!(readme.starts_with(&format!("{README_HEADER}\n{}\n\n", "=".repeat(50))));
        assert!(readme.contains("Task 1:\nTop 5 districts"));
        assert!(readme.contains("Task 7:\n"));
        assert!(!readme.contains("Task 2:"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_fails_on_missing_input() {
        let dir = std::env::temp_dir().join("listing_tools_report_missing");
        let result = run(&dir.join("nope.xlsx"), &dir.join("filters.txt"), &dir);
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
