use tracing::{debug, info};

use crate::domain::entities::record::FULL_NAME;
use crate::domain::entities::sheet::Sheet;
use crate::domain::entities::undo::RemovedRow;
use crate::domain::error::SessionError;

/// Tabs come in pairs: 0↔1, 2↔3, and so on. A tab without a partner yields `None`.
pub fn paired_sheet_index(origin: usize, sheet_count: usize) -> Option<usize> {
    let pair = if origin % 2 == 0 {
        origin.checked_add(1)?
    } else {
        origin - 1
    };
    (pair < sheet_count).then_some(pair)
}

/// Row numbers in `sheet` whose `fullName` cell equals `identity`, ascending.
pub fn matching_rows(sheet: &Sheet, identity: &str) -> Result<Vec<usize>, SessionError> {
    let col_idx = sheet
        .column_index(FULL_NAME)
        .ok_or_else(|| SessionError::MissingColumn {
            sheet: sheet.name().to_string(),
            column: FULL_NAME.to_string(),
        })?;

    let rows = sheet
        .data_rows()
        .filter(|(_, cells)| {
            cells
                .get(col_idx)
                .is_some_and(|cell| cell.normalized() == identity)
        })
        .map(|(row_number, _)| row_number)
        .collect::<Vec<_>>();

    for row_number in &rows {
        debug!(row_number, identity, sheet = sheet.name(), "found paired row");
    }
    Ok(rows)
}

/// Removes `rows` from the bottom up so earlier removals never shift a row that
/// is still pending. The returned rows are ascending and carry their original
/// numbers.
pub fn delete_rows_descending(sheet: &mut Sheet, rows: &[usize]) -> Vec<RemovedRow> {
    let mut ordered = rows.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    let mut removed = Vec::with_capacity(ordered.len());
    for &row_number in ordered.iter().rev() {
        if let Some(cells) = sheet.remove_row(row_number) {
            info!(row_number, sheet = sheet.name(), "deleted paired row");
            removed.push(RemovedRow { row_number, cells });
        }
    }
    removed.reverse();
    removed
}
