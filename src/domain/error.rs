use thiserror::Error;

/// Reasons a session operation was refused. Every variant leaves the workbook,
/// the record cache and the undo log exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("record has no first or last name")]
    EmptyIdentity,
    #[error("column `{column}` not found in sheet `{sheet}`")]
    MissingColumn { sheet: String, column: String },
    #[error("sheet index {0} does not exist")]
    NoSuchSheet(usize),
    #[error("row {index} is out of range ({len} rows loaded)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("row {row_number} does not exist in sheet `{sheet}`")]
    NoSuchSheetRow { sheet: String, row_number: usize },
    #[error("sheet `{0}` has no header row")]
    NoHeaderRow(String),
    #[error("cannot merge sheet `{0}` into itself")]
    SameSheet(String),
}
