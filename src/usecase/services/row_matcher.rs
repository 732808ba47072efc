use tracing::debug;

use crate::domain::entities::matching::{MergeCandidate, MergeCandidateSet, RowMatch};
use crate::domain::entities::record::{Record, FIRST_NAME, LAST_NAME};
use crate::domain::entities::sheet::Sheet;
use crate::domain::error::SessionError;

/// Column positions of the name fields in a target sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameColumns {
    pub first: usize,
    pub last: usize,
}

impl NameColumns {
    pub fn resolve(sheet: &Sheet) -> Result<Self, SessionError> {
        let lookup = |column: &str| {
            sheet
                .column_index(column)
                .ok_or_else(|| SessionError::MissingColumn {
                    sheet: sheet.name().to_string(),
                    column: column.to_string(),
                })
        };
        Ok(Self {
            first: lookup(FIRST_NAME)?,
            last: lookup(LAST_NAME)?,
        })
    }
}

/// First and last token of the record's full name, lower-cased. Middle names
/// are ignored.
pub fn name_parts(record: &Record) -> Option<(String, String)> {
    let full_name = record.display_full_name().to_lowercase();
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next()?.to_string();
    let last = tokens.last().map(str::to_string).unwrap_or_else(|| first.clone());
    Some((first, last))
}

/// Finds the target row denoting the same person as `record`.
///
/// The whole sheet is scanned and the last matching row wins. When nothing
/// matches, every data row is returned as a candidate for manual selection.
pub fn find_match(record: &Record, target: &Sheet) -> Result<RowMatch, SessionError> {
    let columns = NameColumns::resolve(target)?;
    let (first, last) = name_parts(record).ok_or(SessionError::EmptyIdentity)?;

    match last_match(&first, &last, target, columns) {
        Some(row_number) => {
            debug!(%first, %last, row_number, sheet = target.name(), "matched target row");
            Ok(RowMatch::Found(row_number))
        }
        None => {
            debug!(%first, %last, sheet = target.name(), "no automatic match, offering candidates");
            Ok(RowMatch::Unmatched(candidates(target, columns)))
        }
    }
}

/// Row number of the last target row whose first and last name equal the
/// given lower-cased parts.
pub(crate) fn last_match(first: &str, last: &str, target: &Sheet, columns: NameColumns) -> Option<usize> {
    let mut matched = None;
    for (row_number, cells) in target.data_rows() {
        let row_first = cells.get(columns.first).map(|c| c.normalized()).unwrap_or_default();
        let row_last = cells.get(columns.last).map(|c| c.normalized()).unwrap_or_default();
        if row_first == first && row_last == last {
            matched = Some(row_number);
        }
    }
    matched
}

pub fn candidates(target: &Sheet, columns: NameColumns) -> MergeCandidateSet {
    let headers = target.headers();
    target
        .data_rows()
        .map(|(row_number, cells)| MergeCandidate {
            row_number,
            record: Record::from_cells(&headers, cells),
            first_name: cells.get(columns.first).map(ToString::to_string).unwrap_or_default(),
            last_name: cells.get(columns.last).map(ToString::to_string).unwrap_or_default(),
        })
        .collect()
}
