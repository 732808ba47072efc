use tracing::debug;

use crate::domain::entities::record::{Record, IDENTITY_COLUMNS};
use crate::domain::entities::sheet::{Sheet, HEADER_ROW};
use crate::domain::entities::value::CellValue;
use crate::domain::error::SessionError;

/// What folding one record into one target row changed.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    pub before: Vec<CellValue>,
    pub after: Vec<CellValue>,
    pub header_width_before: usize,
    /// First column index a new column could take; nothing in the sheet sat at
    /// or past it before the fold.
    pub appended_from: usize,
    pub added_columns: Vec<String>,
}

/// Folds `record` into row `target_row` of `target`.
///
/// Source values win for every shared column except the identity columns.
/// Fields the target does not have yet become new columns, allocated from a
/// cursor that starts past the widest row of the sheet, so a new column never
/// lands on an existing unheaded cell and no two new columns of one merge share
/// an index.
pub fn fold_record(
    target: &mut Sheet,
    target_row: usize,
    record: &Record,
) -> Result<FoldResult, SessionError> {
    if target_row <= HEADER_ROW {
        return Err(SessionError::NoSuchSheetRow {
            sheet: target.name().to_string(),
            row_number: target_row,
        });
    }
    let before = target
        .row(target_row)
        .map(<[CellValue]>::to_vec)
        .ok_or_else(|| SessionError::NoSuchSheetRow {
            sheet: target.name().to_string(),
            row_number: target_row,
        })?;

    let mut headers = target.headers();
    let header_width_before = headers.len();
    let appended_from = target.max_row_width();
    let mut next_free_col = appended_from;
    let mut added_columns = Vec::new();

    for (column, value) in record.iter() {
        if IDENTITY_COLUMNS.contains(&column) {
            continue;
        }
        match headers.iter().position(|header| header == column) {
            Some(col_idx) => target.set_cell(target_row, col_idx, value.clone()),
            None => {
                let col_idx = next_free_col;
                next_free_col += 1;
                debug!(column, col_idx, sheet = target.name(), "appending merge column");
                target.set_cell(HEADER_ROW, col_idx, CellValue::text(column));
                target.set_cell(target_row, col_idx, value.clone());
                if headers.len() <= col_idx {
                    headers.resize(col_idx + 1, String::new());
                }
                headers[col_idx] = column.to_string();
                added_columns.push(column.to_string());
            }
        }
    }

    let after = target.row(target_row).map(<[CellValue]>::to_vec).unwrap_or_default();
    Ok(FoldResult {
        before,
        after,
        header_width_before,
        appended_from,
        added_columns,
    })
}

/// Reverts a fold: puts the row back and drops appended header cells once no
/// data row holds a value in the appended columns.
pub fn unfold(
    target: &mut Sheet,
    target_row: usize,
    before: Vec<CellValue>,
    header_width_before: usize,
    appended_from: usize,
) {
    target.replace_row(target_row, before);
    let in_use = target
        .data_rows()
        .any(|(_, cells)| cells.iter().skip(appended_from).any(|cell| !cell.is_empty()));
    if !in_use {
        target.truncate_headers(header_width_before);
    }
}
