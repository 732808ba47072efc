use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::sheet::Sheet;

/// Writes one sheet as CSV. Rows are padded to the widest row so every record
/// has the same field count.
pub fn write_csv_sheet(sheet: &Sheet, csv_path: &Path) -> Result<()> {
    let width = sheet.rows().iter().map(Vec::len).max().unwrap_or(0);
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to create csv: {}", csv_path.display()))?;

    for row in sheet.rows() {
        let mut fields = row.iter().map(ToString::to_string).collect::<Vec<_>>();
        fields.resize(width, String::new());
        writer
            .write_record(&fields)
            .context("failed to write csv record")?;
    }

    writer.flush().context("failed to flush csv")?;
    Ok(())
}
