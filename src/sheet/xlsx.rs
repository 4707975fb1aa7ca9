use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use std::path::Path;

use super::{Cell, Table};

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Int(*v),
            Data::Float(v) if v.is_nan() => Cell::Empty,
            Data::Float(v) => Cell::Float(*v),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

pub(super) fn read(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };

    let headers = header_row
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();
    let rows = rows.map(|r| r.iter().map(Cell::from).collect()).collect();

    Ok(Table { headers, rows })
}

pub(super) fn write(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .with_context(|| format!("failed to write header '{header}'"))?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Empty => continue,
                Cell::Int(v) => worksheet.write_number(r, c, *v as f64),
                Cell::Float(v) => worksheet.write_number(r, c, *v),
                Cell::Text(s) => worksheet.write_string(r, c, s),
                Cell::Bool(b) => worksheet.write_boolean(r, c, *b),
            }
            .with_context(|| format!("failed to write cell at row {r}, column {c}"))?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
