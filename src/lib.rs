pub mod config;
pub mod domain;
pub mod infra;
pub mod usecase;


pub use domain::entities::matching::{
    DeleteOutcome, MergeAllSummary, MergeCandidate, MergeCandidateSet, MergeOutcome, RowMatch,
};
pub use domain::entities::record::Record;
pub use domain::entities::sheet::{Sheet, Workbook};
pub use domain::entities::value::CellValue;
pub use domain::error::SessionError;
pub use usecase::services::table_store::TableStore;

pub fn default_output_name_mmdd() -> String {
    format!("output_{}.xlsx", chrono::Local::now().format("%m%d"))
}
