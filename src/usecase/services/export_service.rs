use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::default_output_name_mmdd;
use crate::domain::entities::sheet::Workbook;
use crate::infra::export::csv::write_csv_sheet;
use crate::infra::export::xlsx::write_xlsx_workbook;
use crate::usecase::services::import_service::{file_kind, FileKind};

#[derive(Debug, Clone, Default)]
pub struct ExportService {
    output_dir: Option<PathBuf>,
}

impl ExportService {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    /// Where a save lands when no explicit path is given.
    pub fn default_output_path(&self) -> PathBuf {
        let name = default_output_name_mmdd();
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Saves the workbook; a `.csv` target receives only `active_sheet`.
    pub fn save(&self, workbook: &Workbook, active_sheet: usize, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output dir: {}", parent.display()))?;
        }

        match file_kind(path) {
            FileKind::Csv => {
                let sheet = workbook
                    .sheet(active_sheet)
                    .with_context(|| format!("sheet #{active_sheet} does not exist"))?;
                write_csv_sheet(sheet, path)?;
            }
            FileKind::Spreadsheet => write_xlsx_workbook(workbook, path)?,
        }
        info!(path = %path.display(), "saved workbook");
        Ok(())
    }
}
