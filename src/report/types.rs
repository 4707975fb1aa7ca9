//! Data types used by the report pipeline.

use anyhow::{Result, bail};

use crate::sheet::Table;

/// One flat with a known price and area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flat {
    pub price: f64,
    pub total_meters: f64,
    pub price_per_m2: f64,
    pub rooms_count: Option<i64>,
    pub floor: Option<i64>,
    pub floors_count: Option<i64>,
    pub district: Option<String>,
    pub underground: Option<String>,
    pub street: Option<String>,
    pub type_property: Option<String>,
    pub address: Option<String>,
}

impl Flat {
    pub fn new(price: f64, total_meters: f64) -> Self {
        Self {
            price,
            total_meters,
            price_per_m2: price / total_meters,
            ..Default::default()
        }
    }
}

/// Builds flats from a merged table. Rows without a price or a positive
/// area are dropped; descriptive columns are optional.
pub fn flats_from_table(table: &Table) -> Result<Vec<Flat>> {
    let missing = table.missing_columns(&["price", "total_meters"]);
    if !missing.is_empty() {
        bail!("missing required columns: {}", missing.join(", "));
    }

    let col = |name: &str| table.column(name);
    let price_col = col("price").unwrap_or_default();
    let meters_col = col("total_meters").unwrap_or_default();

    let text = |row: usize, column: Option<usize>| column.and_then(|c| table.cell(row, c).as_text());
    let int = |row: usize, column: Option<usize>| {
        column
            .and_then(|c| table.cell(row, c).as_f64())
            .map(|v| v as i64)
    };

    let mut flats = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let (Some(price), Some(meters)) = (
            table.cell(row, price_col).as_f64(),
            table.cell(row, meters_col).as_f64(),
        ) else {
            continue;
        };
        if meters <= 0.0 {
            continue;
        }

        flats.push(Flat {
            rooms_count: int(row, col("rooms_count")),
            floor: int(row, col("floor")),
            floors_count: int(row, col("floors_count")),
            district: text(row, col("district")),
            underground: text(row, col("underground")),
            street: text(row, col("street")),
            type_property: text(row, col("type_property")),
            address: text(row, col("address")),
            ..Flat::new(price, meters)
        });
    }

    Ok(flats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    #[test]
    fn test_flats_from_table_drops_incomplete_rows() {
        let table = Table {
            headers: vec!["price".into(), "total_meters".into(), "district".into()],
            rows: vec![
                vec![Cell::Int(10_000_000), Cell::Float(50.0), Cell::Text("Арбат".into())],
                vec![Cell::Empty, Cell::Float(40.0)],
                vec![Cell::Int(5_000_000), Cell::Empty],
                vec![Cell::Int(5_000_000), Cell::Int(0)],
            ],
        };

        let flats = flats_from_table(&table).unwrap();

        assert_eq!(flats.len(), 1);
        assert_eq!(flats[0].price_per_m2, 200_000.0);
        assert_eq!(flats[0].district.as_deref(), Some("Арбат"));
        assert_eq!(flats[0].street, None);
    }

    #[test]
    fn test_flats_from_table_requires_price_and_area() {
        let table = Table::new(vec!["price".into()]);
        assert!(flats_from_table(&table).is_err());
    }
}
