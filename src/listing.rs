//! Listing records and datasets loaded from spreadsheets.

use anyhow::{Result, bail};
use std::collections::HashMap;
use std::path::Path;

use crate::sheet::{Cell, Table, read_table};

/// Columns every dataset must carry to be comparable.
pub const REQUIRED_COLUMNS: [&str; 5] = ["url", "floor", "price", "total_meters", "rooms_count"];

/// One property advertisement, keyed by its source URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub url: String,
    pub floor: Option<i64>,
    pub price: Option<i64>,
    pub total_meters: Option<f64>,
    pub rooms_count: Option<i64>,
}

/// Listings in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub listings: Vec<Listing>,
}

impl Dataset {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Loads and validates a dataset from a `.xlsx` or `.csv` file.
    pub fn load(path: &Path) -> Result<Self> {
        let table = read_table(path)?;
        Self::from_table(&table)
            .map_err(|e| e.context(format!("invalid dataset {}", path.display())))
    }

    /// Builds a dataset from a table, rejecting it when a required column is
    /// missing or a tracked field holds a non-numeric value.
    pub fn from_table(table: &Table) -> Result<Self> {
        let missing = table.missing_columns(&REQUIRED_COLUMNS);
        if !missing.is_empty() {
            bail!("missing required columns: {}", missing.join(", "));
        }

        let col = |name: &str| table.column(name).unwrap_or_default();
        let (url, floor, price, meters, rooms) = (
            col("url"),
            col("floor"),
            col("price"),
            col("total_meters"),
            col("rooms_count"),
        );

        let mut listings = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let line = row + 2; // 1-based, after the header row
            listings.push(Listing {
                url: table.cell(row, url).to_string(),
                floor: read_int(table.cell(row, floor), line, "floor")?,
                price: read_int(table.cell(row, price), line, "price")?,
                total_meters: read_float(table.cell(row, meters), line, "total_meters")?,
                rooms_count: read_int(table.cell(row, rooms), line, "rooms_count")?,
            });
        }

        Ok(Self { listings })
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listing> {
        self.listings.iter()
    }

    /// Indexes listings by URL. A repeated URL keeps its last occurrence.
    pub fn index_by_url(&self) -> HashMap<&str, &Listing> {
        self.listings.iter().map(|l| (l.url.as_str(), l)).collect()
    }
}

fn read_float(cell: &Cell, line: usize, column: &str) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    match cell.as_f64() {
        Some(v) => Ok(Some(v)),
        None => bail!("row {line}, column {column}: expected a number, got '{cell}'"),
    }
}

fn read_int(cell: &Cell, line: usize, column: &str) -> Result<Option<i64>> {
    match read_float(cell, line, column)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 => Ok(Some(v as i64)),
        Some(v) => bail!("row {line}, column {column}: expected a whole number, got {v}"),
    }
}
