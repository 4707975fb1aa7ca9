//! Spreadsheet I/O.
//!
//! A [`Table`] is a header row plus rows of loosely typed [`Cell`]s. Tables are
//! read from `.xlsx`/`.xls`/`.ods` workbooks (first worksheet) or `.csv` files
//! and written back out as `.xlsx`.

mod delimited;
mod xlsx;

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

static EMPTY_CELL: Cell = Cell::Empty;

/// A single spreadsheet value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Infers a typed cell from raw text, as found in CSV files.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Cell::Int(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            if v.is_finite() {
                return Cell::Float(v);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Float(v) => v.is_nan(),
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed leniently, `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) if !v.is_nan() => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Text view of the cell; `None` when empty.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Header row plus data rows. Rows may be shorter than the header; missing
/// trailing cells read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Names from `required` that have no column in this table.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.column(name).is_none())
            .collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Appends a column holding `value` in every row.
    pub fn push_column(&mut self, name: &str, value: Cell) {
        let width = self.headers.len();
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.resize(width, Cell::Empty);
            row.push(value.clone());
        }
    }

    /// Stacks tables vertically. The result has the union of all columns in
    /// first-seen order; cells a table doesn't have are left empty.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let mut headers: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut rows = Vec::new();

        for table in tables {
            let mapping: Vec<usize> = table
                .headers
                .iter()
                .map(|h| {
                    *positions.entry(h.clone()).or_insert_with(|| {
                        headers.push(h.clone());
                        headers.len() - 1
                    })
                })
                .collect();

            for row in table.rows {
                let mut merged = vec![Cell::Empty; headers.len()];
                for (cell, &col) in row.into_iter().zip(&mapping) {
                    merged[col] = cell;
                }
                rows.push(merged);
            }
        }

        for row in &mut rows {
            row.resize(headers.len(), Cell::Empty);
        }

        Table { headers, rows }
    }
}

/// Reads the first worksheet of a workbook, or a CSV file, into a [`Table`].
///
/// The format is picked from the file extension. The first row is the header.
pub fn read_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let table = match ext.as_deref() {
        Some("xlsx" | "xlsm" | "xls" | "ods") => xlsx::read(path),
        Some("csv") => delimited::read(path),
        _ => bail!("unsupported spreadsheet format: {}", path.display()),
    }
    .with_context(|| format!("failed to read {}", path.display()))?;

    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        "Table loaded"
    );
    Ok(table)
}

/// Writes `table` as a single-sheet `.xlsx` workbook, creating parent
/// directories as needed.
pub fn write_xlsx(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    xlsx::write(path, table).with_context(|| format!("failed to write {}", path.display()))
}
