use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use crate::domain::entities::sheet::{Sheet, Workbook};
use crate::domain::entities::value::CellValue;
use crate::infra::import::hyperlinks::{has_hyperlink_parts, read_sheet_hyperlinks, CellLink};

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(v) => CellValue::from(v.as_str()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => CellValue::DateTime(v.as_f64()),
        Data::DateTimeIso(v) => CellValue::Text(v.to_string()),
        Data::DurationIso(v) => CellValue::Text(v.to_string()),
        Data::Error(v) => CellValue::Text(format!("{v:?}")),
        Data::Empty => CellValue::Empty,
    }
}

/// Converts a used range into sheet rows anchored at A1, so row 1 is always
/// the header row even when the used range starts further down or right.
pub fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut rows = vec![Vec::new(); row_offset];
    for source in range.rows() {
        let mut row = vec![CellValue::Empty; col_offset];
        row.extend(source.iter().map(cell_to_value));
        rows.push(row);
    }
    rows
}

pub fn read_xlsx_workbook(xlsx_path: &Path) -> Result<Workbook> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open workbook: {}", xlsx_path.display()))?;

    let mut links = if has_hyperlink_parts(xlsx_path) {
        read_sheet_hyperlinks(xlsx_path)?
    } else {
        Default::default()
    };

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet: {sheet_name}"))?;
        let rows = range_to_rows(&range);
        debug!(sheet = %sheet_name, rows = rows.len(), "read sheet");
        let mut sheet = Sheet::new(sheet_name, rows);
        if let Some(sheet_links) = links.remove(sheet.name()) {
            apply_links(&mut sheet, sheet_links);
        }
        sheets.push(sheet);
    }

    Ok(Workbook::new(sheets))
}

/// Turns linked cells into `Hyperlink` values. A linked cell with no value
/// shows the link's display text, or the target itself.
fn apply_links(sheet: &mut Sheet, links: Vec<CellLink>) {
    for link in links {
        let row_number = link.row + 1;
        let text = match sheet.cell(row_number, link.col) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => link.display.unwrap_or_else(|| link.target.clone()),
        };
        sheet.set_cell(
            row_number,
            link.col,
            CellValue::Hyperlink {
                text,
                hyperlink: link.target,
            },
        );
    }
}
