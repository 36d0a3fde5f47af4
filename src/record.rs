//! Record types flowing through the pipeline.
//!
//! ```text
//! Sheet row ──▶ RawRecord ──▶ DisplayRecord ──▶ Batch
//!  (cells)      (3 fields)     (formatted)       (1..=row_limit)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One spreadsheet cell, decoupled from the decoder's own value type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    /// A spreadsheet error value such as `#DIV/0!`.
    Error(String),
}

impl Cell {
    /// `true` for cells that hold nothing at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            // Integral floats print without a trailing ".0".
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Bool(true) => f.write_str("TRUE"),
            Cell::Bool(false) => f.write_str("FALSE"),
            Cell::Error(e) => f.write_str(e),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// One input row, as read. Values are untouched until normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based spreadsheet row number (header is row 1).
    pub row: usize,
    pub payee_name: Cell,
    pub amount: Cell,
    pub work: Cell,
}

/// A receipt ready for the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    /// Spreadsheet row this receipt came from.
    pub row: usize,
    pub payee: String,
    /// Parsed, non-negative amount.
    pub amount: f64,
    /// Grouped with two decimals, e.g. `"12,345.50"`.
    pub amount_formatted: String,
    /// Title-cased words without the trailing `" Only"`.
    pub amount_words: String,
    pub work: String,
}

/// The receipts destined for one document, in input order.
///
/// Never empty: [`Batch::new`] refuses an empty list so the renderer can rely
/// on at least one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    records: Vec<DisplayRecord>,
}

impl Batch {
    /// Wrap normalised records, or `None` if there are none.
    pub fn new(records: Vec<DisplayRecord>) -> Option<Self> {
        if records.is_empty() {
            None
        } else {
            Some(Self { records })
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<DisplayRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a DisplayRecord;
    type IntoIter = std::slice::Iter<'a, DisplayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
