use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::domain::entities::matching::{DeleteOutcome, MergeAllSummary, MergeOutcome, RowMatch};
use crate::domain::entities::record::Record;
use crate::domain::entities::sheet::{Sheet, Workbook, HEADER_ROW};
use crate::domain::entities::undo::{MergeStep, PairedRemoval, RemovedRow, UndoEntry};
use crate::domain::entities::value::CellValue;
use crate::domain::error::SessionError;
use crate::usecase::services::merge_engine::{self, FoldResult};
use crate::usecase::services::row_matcher::{self, NameColumns};
use crate::usecase::services::sync_delete;
use crate::usecase::services::undo_log::UndoLog;

/// A cached record and the sheet row backing it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub row_number: usize,
    pub record: Record,
}

/// Projects every non-blank data row of `sheet` into a record.
pub fn load_rows(sheet: &Sheet) -> Vec<TableRow> {
    let headers = sheet.headers();
    sheet
        .data_rows()
        .map(|(row_number, cells)| TableRow {
            row_number,
            record: Record::from_cells(&headers, cells),
        })
        .filter(|row| !row.record.is_blank())
        .collect()
}

/// Case-insensitive substring search over every field. Each hit keeps its
/// cache index so callers never act on a view position by mistake.
pub fn filter_rows<'a>(rows: &'a [TableRow], query: &str) -> Vec<(usize, &'a Record)> {
    let needle = query.to_lowercase();
    let show_all = query.trim().is_empty();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| show_all || row.record.matches_search(&needle))
        .map(|(index, row)| (index, &row.record))
        .collect()
}

/// Session state for one loaded workbook: the active sheet's record cache, the
/// search text, the new-row draft and the undo log. Every mutation goes
/// through here so the cache and the sheet never drift apart.
#[derive(Debug, Clone)]
pub struct TableStore {
    workbook: Workbook,
    active_sheet: usize,
    rows: Vec<TableRow>,
    search_text: String,
    draft: BTreeMap<String, CellValue>,
    undo_log: UndoLog,
}

impl TableStore {
    pub fn new(workbook: Workbook) -> Self {
        let rows = workbook.sheet(0).map(load_rows).unwrap_or_default();
        Self {
            workbook,
            active_sheet: 0,
            rows,
            search_text: String::new(),
            draft: BTreeMap::new(),
            undo_log: UndoLog::new(),
        }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    pub fn active_sheet_name(&self) -> &str {
        self.workbook
            .sheet(self.active_sheet)
            .map(Sheet::name)
            .unwrap_or_default()
    }

    /// Current header order of the active sheet, including merge-added columns.
    pub fn headers(&self) -> Vec<String> {
        self.workbook
            .sheet(self.active_sheet)
            .map(Sheet::headers)
            .unwrap_or_default()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn records(&self) -> Vec<Record> {
        self.rows.iter().map(|row| row.record.clone()).collect()
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.rows.get(index).map(|row| &row.record)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn select_sheet(&mut self, index: usize) -> Result<(), SessionError> {
        let sheet = self
            .workbook
            .sheet(index)
            .ok_or(SessionError::NoSuchSheet(index))?;
        self.rows = load_rows(sheet);
        self.active_sheet = index;
        self.draft.clear();
        debug!(sheet = index, rows = self.rows.len(), "selected sheet");
        Ok(())
    }

    pub fn reload(&mut self) {
        self.rows = self
            .workbook
            .sheet(self.active_sheet)
            .map(load_rows)
            .unwrap_or_default();
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_text = query.into();
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn visible_rows(&self) -> Vec<(usize, &Record)> {
        filter_rows(&self.rows, &self.search_text)
    }

    pub fn is_undo_disabled(&self) -> bool {
        self.undo_log.is_disabled()
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo_log
    }

    pub fn edit_field(
        &mut self,
        index: usize,
        column: &str,
        value: CellValue,
    ) -> Result<(), SessionError> {
        self.check_index(index)?;
        let row_number = self.rows[index].row_number;
        let sheet = self.sheet(self.active_sheet)?;
        let col_idx = sheet
            .column_index(column)
            .ok_or_else(|| SessionError::MissingColumn {
                sheet: sheet.name().to_string(),
                column: column.to_string(),
            })?;
        self.ensure_backing_row(index)?;

        let previous = self.rows[index].record.clone();
        debug!(index, row_number, col_idx, column, "saving edit");
        self.sheet_mut(self.active_sheet)?
            .set_cell(row_number, col_idx, value.clone());
        self.rows[index].record.set(column, value);

        self.undo_log.push(UndoEntry::Edit {
            sheet: self.active_sheet,
            index,
            row_number,
            previous,
        });
        Ok(())
    }

    pub fn set_draft_field(&mut self, column: impl Into<String>, value: CellValue) {
        self.draft.insert(column.into(), value);
    }

    pub fn draft(&self) -> &BTreeMap<String, CellValue> {
        &self.draft
    }

    /// Appends the draft as a new row holding every header column; columns the
    /// draft leaves out become empty strings. Returns the new cache index.
    pub fn commit_new_row(&mut self) -> Result<usize, SessionError> {
        let sheet = self.sheet(self.active_sheet)?;
        if sheet.header_width() == 0 {
            return Err(SessionError::NoHeaderRow(sheet.name().to_string()));
        }
        let headers = sheet.headers();
        let mut record = Record::new();
        let mut cells = Vec::with_capacity(headers.len());
        for header in &headers {
            if header.is_empty() {
                cells.push(CellValue::Empty);
                continue;
            }
            let value = self
                .draft
                .get(header)
                .cloned()
                .unwrap_or_else(|| CellValue::Text(String::new()));
            record.set(header, value.clone());
            cells.push(value);
        }

        let row_number = self.sheet_mut(self.active_sheet)?.append_row(cells);
        self.rows.push(TableRow { row_number, record });
        let index = self.rows.len() - 1;
        self.draft.clear();
        info!(index, row_number, "committed new row");

        self.undo_log.push(UndoEntry::Insert {
            sheet: self.active_sheet,
            index,
            row_number,
        });
        Ok(index)
    }

    /// Deletes a record and every row with the same full name in the paired tab.
    ///
    /// Identity and the paired tab's `fullName` column are checked before
    /// anything is touched.
    pub fn delete_row(&mut self, index: usize) -> Result<DeleteOutcome, SessionError> {
        self.check_index(index)?;
        let record = self.rows[index].record.clone();
        let identity = record.identity_key();
        if identity.is_empty() {
            warn!(index, "refusing delete: record has no name");
            return Err(SessionError::EmptyIdentity);
        }

        let paired_sheet =
            sync_delete::paired_sheet_index(self.active_sheet, self.workbook.sheet_count());
        let paired_rows = match paired_sheet {
            Some(pair) => Some((pair, sync_delete::matching_rows(self.sheet(pair)?, &identity)?)),
            None => {
                debug!(sheet = self.active_sheet, "no paired sheet to synchronize with");
                None
            }
        };
        self.ensure_backing_row(index)?;

        let row = self.remove_sheet_row(self.active_sheet, self.rows[index].row_number)?;
        info!(index, row_number = row.row_number, %identity, "deleted row");

        let paired = match paired_rows {
            Some((pair, rows)) => {
                let removed = sync_delete::delete_rows_descending(self.sheet_mut(pair)?, &rows);
                if removed.is_empty() {
                    debug!(%identity, "no matching row in paired sheet, deleted from this sheet only");
                }
                Some(PairedRemoval {
                    sheet: pair,
                    rows: removed,
                })
            }
            None => None,
        };

        let outcome = DeleteOutcome {
            paired_sheet,
            paired_rows_deleted: paired.as_ref().map(|p| p.rows.len()).unwrap_or(0),
        };
        self.undo_log.push(UndoEntry::Delete {
            sheet: self.active_sheet,
            index,
            record,
            row,
            paired,
        });
        Ok(outcome)
    }

    /// Merges record `index` into the matching row of sheet `target`, or hands
    /// back the candidate list when no row matches.
    pub fn merge_row(&mut self, index: usize, target: usize) -> Result<MergeOutcome, SessionError> {
        self.check_merge_target(target)?;
        self.check_index(index)?;
        let found = row_matcher::find_match(&self.rows[index].record, self.sheet(target)?)?;
        match found {
            RowMatch::Found(target_row) => {
                self.merge_row_into(index, target, target_row)?;
                Ok(MergeOutcome::Merged { target_row })
            }
            RowMatch::Unmatched(candidates) => Ok(MergeOutcome::NeedsSelection(candidates)),
        }
    }

    /// Merges record `index` into an explicitly chosen target row.
    pub fn merge_row_into(
        &mut self,
        index: usize,
        target: usize,
        target_row: usize,
    ) -> Result<(), SessionError> {
        self.check_merge_target(target)?;
        self.check_index(index)?;
        self.ensure_backing_row(index)?;

        let source_record = self.rows[index].record.clone();
        let fold = merge_engine::fold_record(self.sheet_mut(target)?, target_row, &source_record)?;
        let source_row = self.remove_sheet_row(self.active_sheet, self.rows[index].row_number)?;
        info!(index, target, target_row, added = fold.added_columns.len(), "merged row");

        let step = merge_step(target, target_row, fold, index, source_row, source_record);
        self.undo_log.push(UndoEntry::Merge {
            source_sheet: self.active_sheet,
            steps: vec![step],
        });
        Ok(())
    }

    /// Merges every record that has an automatic match in `target`.
    ///
    /// Absorbed records are only removed after the whole scan, bottom-up, so
    /// indices collected during the scan stay valid. The batch is undone as one.
    pub fn merge_all(&mut self, target: usize) -> Result<MergeAllSummary, SessionError> {
        self.check_merge_target(target)?;
        let columns = NameColumns::resolve(self.sheet(target)?)?;
        for index in 0..self.rows.len() {
            self.ensure_backing_row(index)?;
        }

        let mut summary = MergeAllSummary::default();
        let mut folded: Vec<(usize, usize, FoldResult)> = Vec::new();
        let target_sheet = self
            .workbook
            .sheet_mut(target)
            .ok_or(SessionError::NoSuchSheet(target))?;
        for (index, row) in self.rows.iter().enumerate() {
            let Some((first, last)) = row_matcher::name_parts(&row.record) else {
                debug!(index, "skipping record without a name");
                summary.unmatched += 1;
                continue;
            };
            match row_matcher::last_match(&first, &last, target_sheet, columns) {
                Some(target_row) => {
                    let fold = merge_engine::fold_record(target_sheet, target_row, &row.record)?;
                    folded.push((index, target_row, fold));
                    summary.merged += 1;
                }
                None => summary.unmatched += 1,
            }
        }

        let mut steps = Vec::with_capacity(folded.len());
        for (index, target_row, fold) in folded.into_iter().rev() {
            let source_record = self.rows[index].record.clone();
            let source_row = self.remove_sheet_row(self.active_sheet, self.rows[index].row_number)?;
            steps.push(merge_step(target, target_row, fold, index, source_row, source_record));
        }
        steps.reverse();

        info!(target, merged = summary.merged, unmatched = summary.unmatched, "merge all finished");
        if !steps.is_empty() {
            self.undo_log.push(UndoEntry::Merge {
                source_sheet: self.active_sheet,
                steps,
            });
        }
        Ok(summary)
    }

    /// Reverses the most recent mutation. Returns `false` when the log is empty.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        let Some(entry) = self.undo_log.pop() else {
            debug!("undo log is empty");
            return Ok(false);
        };
        info!(kind = entry.kind(), "undoing last action");

        match entry {
            UndoEntry::Delete {
                sheet,
                index,
                record,
                row,
                paired,
            } => {
                if let Some(paired) = paired {
                    for removed in paired.rows {
                        self.restore_sheet_row(paired.sheet, removed, None)?;
                    }
                }
                debug!(index, row_number = row.row_number, "restoring deleted row");
                self.restore_sheet_row(sheet, row, Some(record))?;
            }
            UndoEntry::Edit {
                sheet,
                index,
                row_number,
                previous,
            } => {
                let target = self.sheet_mut(sheet)?;
                for (column, value) in previous.iter() {
                    match target.column_index(column) {
                        Some(col_idx) => target.set_cell(row_number, col_idx, value.clone()),
                        None => warn!(column, "column vanished, cannot restore edit"),
                    }
                }
                if sheet == self.active_sheet {
                    if let Some(cached) = self.rows.iter_mut().find(|r| r.row_number == row_number) {
                        cached.record = previous;
                    }
                }
                debug!(index, row_number, "restored edited row");
            }
            UndoEntry::Merge {
                source_sheet,
                steps,
            } => {
                let mut touched_active = false;
                for step in steps.iter().rev() {
                    merge_engine::unfold(
                        self.sheet_mut(step.target_sheet)?,
                        step.target_row,
                        step.target_before.clone(),
                        step.header_width_before,
                        step.appended_from,
                    );
                    touched_active |= step.target_sheet == self.active_sheet;
                }
                for step in steps {
                    debug!(index = step.source_index, "restoring merged record");
                    self.restore_sheet_row(source_sheet, step.source_row, Some(step.source_record))?;
                }
                if touched_active {
                    self.reload();
                }
            }
            UndoEntry::Insert {
                sheet,
                index,
                row_number,
            } => {
                self.remove_sheet_row(sheet, row_number)?;
                debug!(index, row_number, "removed committed row");
            }
        }
        Ok(true)
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(SessionError::RowOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    fn check_merge_target(&self, target: usize) -> Result<(), SessionError> {
        let sheet = self.sheet(target)?;
        if target == self.active_sheet {
            return Err(SessionError::SameSheet(sheet.name().to_string()));
        }
        Ok(())
    }

    fn ensure_backing_row(&self, index: usize) -> Result<(), SessionError> {
        let row_number = self.rows[index].row_number;
        let sheet = self.sheet(self.active_sheet)?;
        if row_number > HEADER_ROW && sheet.row(row_number).is_some() {
            Ok(())
        } else {
            Err(SessionError::NoSuchSheetRow {
                sheet: sheet.name().to_string(),
                row_number,
            })
        }
    }

    fn sheet(&self, index: usize) -> Result<&Sheet, SessionError> {
        self.workbook
            .sheet(index)
            .ok_or(SessionError::NoSuchSheet(index))
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut Sheet, SessionError> {
        self.workbook
            .sheet_mut(index)
            .ok_or(SessionError::NoSuchSheet(index))
    }

    /// Removes a sheet row and, on the active sheet, its cache entry, re-basing
    /// the row numbers of every cached row below it.
    fn remove_sheet_row(&mut self, sheet: usize, row_number: usize) -> Result<RemovedRow, SessionError> {
        let target = self.sheet_mut(sheet)?;
        let cells = target
            .remove_row(row_number)
            .ok_or_else(|| SessionError::NoSuchSheetRow {
                sheet: target.name().to_string(),
                row_number,
            })?;

        if sheet == self.active_sheet {
            self.rows.retain(|row| row.row_number != row_number);
            for row in &mut self.rows {
                if row.row_number > row_number {
                    row.row_number -= 1;
                }
            }
        }
        Ok(RemovedRow { row_number, cells })
    }

    /// Re-inserts a removed row. On the active sheet the cache gets the record
    /// back at the position matching its sheet order; rows without a record are
    /// projected from their cells.
    fn restore_sheet_row(
        &mut self,
        sheet: usize,
        removed: RemovedRow,
        record: Option<Record>,
    ) -> Result<(), SessionError> {
        let target = self.sheet_mut(sheet)?;
        let headers = target.headers();
        let record = record.unwrap_or_else(|| Record::from_cells(&headers, &removed.cells));
        let row_number = target.insert_row(removed.row_number, removed.cells);

        if sheet == self.active_sheet {
            for row in &mut self.rows {
                if row.row_number >= row_number {
                    row.row_number += 1;
                }
            }
            if !record.is_blank() {
                let at = self.rows.partition_point(|row| row.row_number < row_number);
                self.rows.insert(at, TableRow { row_number, record });
            }
        }
        Ok(())
    }
}

fn merge_step(
    target_sheet: usize,
    target_row: usize,
    fold: FoldResult,
    source_index: usize,
    source_row: RemovedRow,
    source_record: Record,
) -> MergeStep {
    MergeStep {
        target_sheet,
        target_row,
        target_before: fold.before,
        target_after: fold.after,
        header_width_before: fold.header_width_before,
        appended_from: fold.appended_from,
        added_columns: fold.added_columns,
        source_index,
        source_row,
        source_record,
    }
}
