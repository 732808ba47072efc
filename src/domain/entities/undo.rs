use crate::domain::entities::record::Record;
use crate::domain::entities::value::CellValue;

/// A sheet row captured before it was removed, so it can be put back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedRow {
    pub row_number: usize,
    pub cells: Vec<CellValue>,
}

/// Rows a sync delete took out of the paired tab.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedRemoval {
    pub sheet: usize,
    /// Ascending by row number, each number as it was before any removal.
    pub rows: Vec<RemovedRow>,
}

/// One source record folded into one target row.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStep {
    pub target_sheet: usize,
    pub target_row: usize,
    pub target_before: Vec<CellValue>,
    pub target_after: Vec<CellValue>,
    pub header_width_before: usize,
    pub appended_from: usize,
    pub added_columns: Vec<String>,
    /// Cache index of the absorbed record before any record of the batch was removed.
    pub source_index: usize,
    pub source_row: RemovedRow,
    pub source_record: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    Delete {
        sheet: usize,
        index: usize,
        record: Record,
        row: RemovedRow,
        paired: Option<PairedRemoval>,
    },
    Edit {
        sheet: usize,
        index: usize,
        row_number: usize,
        previous: Record,
    },
    /// A single merge or a whole merge-all batch, in application order.
    Merge {
        source_sheet: usize,
        steps: Vec<MergeStep>,
    },
    Insert {
        sheet: usize,
        index: usize,
        row_number: usize,
    },
}

impl UndoEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            UndoEntry::Delete { .. } => "delete",
            UndoEntry::Edit { .. } => "edit",
            UndoEntry::Merge { .. } => "merge",
            UndoEntry::Insert { .. } => "insert",
        }
    }
}
