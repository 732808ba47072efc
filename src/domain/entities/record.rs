use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::entities::value::CellValue;

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const FULL_NAME: &str = "fullName";

/// Columns that identify a person and are never overwritten by a merge.
pub const IDENTITY_COLUMNS: [&str; 3] = [FIRST_NAME, LAST_NAME, FULL_NAME];

/// One data row projected into named fields, in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, CellValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects sheet cells onto header names. Columns with a blank header are
    /// skipped; a repeated header keeps its first position and its last value.
    pub fn from_cells(headers: &[String], cells: &[CellValue]) -> Self {
        let mut record = Record::new();
        for (col_idx, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = cells.get(col_idx).cloned().unwrap_or_default();
            record.set(header, value);
        }
        record
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Display text of a field, empty when the field is missing.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(ToString::to_string).unwrap_or_default()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// Sets a field and returns the previous value, if the field existed.
    pub fn set(&mut self, column: &str, value: CellValue) -> Option<CellValue> {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((column.to_string(), value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field is empty; such rows are dropped on load.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_empty())
    }

    /// `firstName lastName`, trimmed and lower-cased. Empty when neither is set.
    pub fn identity_key(&self) -> String {
        format!("{} {}", self.text(FIRST_NAME), self.text(LAST_NAME))
            .trim()
            .to_lowercase()
    }

    /// The name used to look this record up in another sheet: the `fullName`
    /// field when present, otherwise first and last name joined.
    pub fn display_full_name(&self) -> String {
        let full_name = self.text(FULL_NAME);
        if full_name.trim().is_empty() {
            format!("{} {}", self.text(FIRST_NAME), self.text(LAST_NAME))
        } else {
            full_name
        }
    }

    /// Whether any field contains `needle`, which must already be lower-cased.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.fields
            .iter()
            .any(|(_, value)| value.to_string().to_lowercase().contains(needle))
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: AsRef<str>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name.as_ref(), value.into());
        }
        record
    }
}
