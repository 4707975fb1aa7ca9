use anyhow::Result;
use csv::ReaderBuilder;
use std::path::Path;

use super::{Cell, Table};

pub(super) fn read(path: &Path) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut table = Table::new(headers);

    for record in rdr.records() {
        let record = record?;
        table.push_row(record.iter().map(Cell::parse).collect());
    }

    Ok(table)
}
