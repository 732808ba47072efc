use crate::domain::entities::record::Record;

/// A target row offered for manual selection when automatic matching fails.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCandidate {
    pub row_number: usize,
    pub record: Record,
    pub first_name: String,
    pub last_name: String,
}

impl MergeCandidate {
    pub fn label(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub type MergeCandidateSet = Vec<MergeCandidate>;

#[derive(Debug, Clone, PartialEq)]
pub enum RowMatch {
    Found(usize),
    Unmatched(MergeCandidateSet),
}

/// Result of a single-row merge request.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged { target_row: usize },
    NeedsSelection(MergeCandidateSet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeAllSummary {
    pub merged: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub paired_sheet: Option<usize>,
    pub paired_rows_deleted: usize,
}

impl DeleteOutcome {
    pub fn deleted_in_pair(&self) -> bool {
        self.paired_rows_deleted > 0
    }
}
