use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};

/// A single spreadsheet cell as the session sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel date serial (days since 1899-12-30, fraction = time of day).
    #[serde(serialize_with = "serialize_date")]
    DateTime(f64),
    Hyperlink { text: String, hyperlink: String },
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) | CellValue::DateTime(_) => false,
            CellValue::Hyperlink { text, hyperlink } => text.is_empty() && hyperlink.is_empty(),
        }
    }

    /// Trimmed, lower-cased display text used for name comparisons.
    pub fn normalized(&self) -> String {
        self.to_string().trim().to_lowercase()
    }

    /// Where a front-end should navigate when the cell is activated.
    pub fn link_url(&self) -> Option<&str> {
        match self {
            CellValue::Hyperlink { hyperlink, .. } if !hyperlink.is_empty() => {
                Some(hyperlink.as_str())
            }
            CellValue::Text(text) if text.starts_with("http") => Some(text.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(value) => {
                if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value}")
                }
            }
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(datetime) if datetime.time() == chrono::NaiveTime::MIN => {
                    write!(f, "{}", datetime.format("%Y-%m-%d"))
                }
                Some(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{serial}"),
            },
            CellValue::Hyperlink { text, .. } => f.write_str(text),
        }
    }
}

/// Converts an Excel 1900-system serial to a calendar date and time. Serials
/// below 60 predate Excel's phantom 1900-02-29 and use a one-day-later epoch.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch_day = if serial < 60.0 { 31 } else { 30 };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, epoch_day)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn serialize_date<S>(serial: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&CellValue::DateTime(*serial))
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}
