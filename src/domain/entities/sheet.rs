use crate::domain::entities::value::CellValue;

/// Row number of the header row. Data rows start right after it.
pub const HEADER_ROW: usize = 1;
pub const FIRST_DATA_ROW: usize = 2;

/// One tab of a workbook. Rows are addressed by 1-based row number, columns by
/// 0-based index into the row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows including the header row.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(HEADER_ROW)
    }

    /// Header names in column order, read from row 1 every time.
    pub fn headers(&self) -> Vec<String> {
        self.row(HEADER_ROW)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn header_width(&self) -> usize {
        self.row(HEADER_ROW).map(<[CellValue]>::len).unwrap_or(0)
    }

    /// Width of the widest row, header included.
    pub fn max_row_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.row(HEADER_ROW)?
            .iter()
            .position(|cell| cell.to_string() == name)
    }

    pub fn row(&self, row_number: usize) -> Option<&[CellValue]> {
        row_number
            .checked_sub(1)
            .and_then(|idx| self.rows.get(idx))
            .map(Vec::as_slice)
    }

    pub fn cell(&self, row_number: usize, col_idx: usize) -> Option<&CellValue> {
        self.row(row_number).and_then(|row| row.get(col_idx))
    }

    /// Writes a cell, growing the sheet and the row as needed.
    pub fn set_cell(&mut self, row_number: usize, col_idx: usize, value: CellValue) {
        let Some(idx) = row_number.checked_sub(1) else {
            return;
        };
        if self.rows.len() <= idx {
            self.rows.resize_with(idx + 1, Vec::new);
        }
        let row = &mut self.rows[idx];
        if row.len() <= col_idx {
            row.resize(col_idx + 1, CellValue::Empty);
        }
        row[col_idx] = value;
    }

    /// Replaces a whole row and returns the previous cells.
    pub fn replace_row(&mut self, row_number: usize, cells: Vec<CellValue>) -> Option<Vec<CellValue>> {
        let idx = row_number.checked_sub(1)?;
        let row = self.rows.get_mut(idx)?;
        Some(std::mem::replace(row, cells))
    }

    /// Appends a row after the last one and returns its row number.
    pub fn append_row(&mut self, cells: Vec<CellValue>) -> usize {
        self.rows.push(cells);
        self.rows.len()
    }

    /// Inserts a row so that it ends up at `row_number`, shifting later rows down.
    pub fn insert_row(&mut self, row_number: usize, cells: Vec<CellValue>) -> usize {
        let idx = row_number.saturating_sub(1).min(self.rows.len());
        self.rows.insert(idx, cells);
        idx + 1
    }

    pub fn remove_row(&mut self, row_number: usize) -> Option<Vec<CellValue>> {
        let idx = row_number.checked_sub(1)?;
        if idx >= self.rows.len() {
            return None;
        }
        Some(self.rows.remove(idx))
    }

    pub fn truncate_headers(&mut self, width: usize) {
        if let Some(header) = self.rows.first_mut() {
            header.truncate(width);
        }
    }

    /// Iterates data rows as `(row_number, cells)`.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[CellValue])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .skip(HEADER_ROW)
            .map(|(idx, row)| (idx + 1, row.as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }
}
