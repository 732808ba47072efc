use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::domain::entities::sheet::Workbook;
use crate::infra::import::csv::read_csv_workbook;
use crate::infra::import::xlsx::read_xlsx_workbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

pub fn file_kind(path: &Path) -> FileKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    if ext == "csv" {
        FileKind::Csv
    } else {
        FileKind::Spreadsheet
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<Workbook> {
        let workbook = match file_kind(path) {
            FileKind::Csv => read_csv_workbook(path)?,
            FileKind::Spreadsheet => read_xlsx_workbook(path)?,
        };
        info!(
            path = %path.display(),
            sheets = workbook.sheet_count(),
            "loaded workbook"
        );
        Ok(workbook)
    }
}
