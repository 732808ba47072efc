use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{ColNum, Format, RowNum};

use crate::domain::entities::sheet::Workbook;
use crate::domain::entities::value::CellValue;

/// Writes every sheet of the workbook to a new `.xlsx` file.
pub fn write_xlsx_workbook(workbook: &Workbook, xlsx_path: &Path) -> Result<()> {
    let mut output = rust_xlsxwriter::Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for sheet in workbook.sheets() {
        let worksheet = output.add_worksheet();
        worksheet
            .set_name(sheet.name())
            .with_context(|| format!("invalid sheet name: {}", sheet.name()))?;

        for (row_idx, row) in sheet.rows().iter().enumerate() {
            let row_num = RowNum::try_from(row_idx)
                .with_context(|| format!("too many rows in sheet: {}", sheet.name()))?;
            for (col_idx, cell) in row.iter().enumerate() {
                let col_num = ColNum::try_from(col_idx)
                    .with_context(|| format!("too many columns in sheet: {}", sheet.name()))?;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(text) => {
                        worksheet
                            .write_string(row_num, col_num, text)
                            .context("failed to write text cell")?;
                    }
                    CellValue::Number(value) => {
                        worksheet
                            .write_number(row_num, col_num, *value)
                            .context("failed to write number cell")?;
                    }
                    CellValue::Bool(value) => {
                        worksheet
                            .write_boolean(row_num, col_num, *value)
                            .context("failed to write boolean cell")?;
                    }
                    CellValue::DateTime(serial) => {
                        let format = if serial.fract() == 0.0 {
                            &date_format
                        } else {
                            &datetime_format
                        };
                        worksheet
                            .write_number_with_format(row_num, col_num, *serial, format)
                            .context("failed to write date cell")?;
                    }
                    CellValue::Hyperlink { text, hyperlink } => {
                        worksheet
                            .write_url_with_text(row_num, col_num, hyperlink.as_str(), text)
                            .context("failed to write hyperlink cell")?;
                    }
                }
            }
        }
    }

    output
        .save(xlsx_path)
        .with_context(|| format!("failed to save workbook: {}", xlsx_path.display()))?;
    Ok(())
}
