use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::sheet::{Sheet, Workbook};
use crate::domain::entities::value::CellValue;

/// Reads a CSV file as a one-sheet workbook named after the file stem. The
/// first record is the header row.
pub fn read_csv_workbook(csv_path: &Path) -> Result<Workbook> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        rows.push(record.iter().map(CellValue::from).collect::<Vec<_>>());
    }

    if rows
        .first()
        .map_or(true, |header| header.iter().all(CellValue::is_empty)) {
        anyhow::bail!("csv header is required")
    }

    let sheet_name = csv_path
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("sheet")
        .to_string();

    Ok(Workbook::new(vec![Sheet::new(sheet_name, rows)]))
}
