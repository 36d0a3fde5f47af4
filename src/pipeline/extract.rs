//! Record extraction: [`Sheet`] → ordered [`RawRecord`]s.
//!
//! The header row is checked for the three required columns before anything
//! else, so a sheet with the wrong columns fails with a schema error even when
//! it has no data rows. Blank rows are dropped, then the remainder is cut to
//! the configured row limit.

use crate::error::ReceiptError;
use crate::pipeline::input::Sheet;
use crate::record::{Cell, RawRecord};
use tracing::{info, warn};

/// Header names every input must carry, in display order.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Payee Name", "Amount", "Work"];

/// Records pulled from a sheet, plus what was left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// At most `row_limit` records, in sheet order.
    pub records: Vec<RawRecord>,
    /// Non-blank data rows found in the sheet.
    pub rows_available: usize,
    /// Non-blank rows dropped by the row limit.
    pub rows_truncated: usize,
}

/// Positions of the required columns inside a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    payee: usize,
    amount: usize,
    work: usize,
}

/// Extract up to `row_limit` records from `sheet`.
///
/// # Errors
/// * [`ReceiptError::Schema`] when a required column is missing
/// * [`ReceiptError::EmptyInput`] when no non-blank data row exists
pub fn extract_records(sheet: &Sheet, row_limit: usize) -> Result<Extraction, ReceiptError> {
    let columns = map_columns(&sheet.header)?;

    let mut records = Vec::new();
    let mut rows_available = 0;

    for (i, cells) in sheet.rows.iter().enumerate() {
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        rows_available += 1;
        if records.len() >= row_limit {
            continue;
        }
        let cell = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
        records.push(RawRecord {
            row: sheet.header_row + 1 + i,
            payee_name: cell(columns.payee),
            amount: cell(columns.amount),
            work: cell(columns.work),
        });
    }

    if records.is_empty() {
        return Err(ReceiptError::EmptyInput);
    }

    let rows_truncated = rows_available - records.len();
    if rows_truncated > 0 {
        warn!(
            "Sheet '{}' has {} data rows; only the first {} are used",
            sheet.name, rows_available, row_limit
        );
    }
    info!(
        "Extracted {} record(s) from sheet '{}'",
        records.len(),
        sheet.name
    );

    Ok(Extraction {
        records,
        rows_available,
        rows_truncated,
    })
}

fn map_columns(header: &[String]) -> Result<ColumnMap, ReceiptError> {
    let find = |name: &str| header.iter().position(|h| h.trim() == name);

    let found: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|c| find(*c)).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .zip(&found)
        .filter(|(_, pos)| pos.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

    match found.as_slice() {
        [Some(payee), Some(amount), Some(work)] => Ok(ColumnMap {
            payee: *payee,
            amount: *amount,
            work: *work,
        }),
        _ => Err(ReceiptError::Schema {
            missing,
            required: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(header: &[&str], rows: Vec<Vec<Cell>>) -> Sheet {
        Sheet {
            name: "Sheet1".into(),
            header_row: 1,
            header: header.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn row(payee: &str, amount: f64, work: &str) -> Vec<Cell> {
        vec![Cell::from(payee), Cell::Number(amount), Cell::from(work)]
    }

    #[test]
    fn records_keep_sheet_order_and_row_numbers() {
        let s = sheet(
            &["Payee Name", "Amount", "Work"],
            vec![row("A", 1.0, "w1"), row("B", 2.0, "w2")],
        );
        let ex = extract_records(&s, 10).unwrap();
        assert_eq!(ex.records.len(), 2);
        assert_eq!(ex.records[0].row, 2);
        assert_eq!(ex.records[1].row, 3);
        assert_eq!(ex.records[1].payee_name, Cell::from("B"));
        assert_eq!(ex.rows_truncated, 0);
    }

    #[test]
    fn columns_are_found_in_any_order_with_extras() {
        let s = sheet(
            &["S.No", " Work ", "Amount", "Payee Name"],
            vec![vec![
                Cell::Int(1),
                Cell::from("Wiring"),
                Cell::Number(5.0),
                Cell::from("X"),
            ]],
        );
        let ex = extract_records(&s, 10).unwrap();
        let r = &ex.records[0];
        assert_eq!(r.payee_name, Cell::from("X"));
        assert_eq!(r.amount, Cell::Number(5.0));
        assert_eq!(r.work, Cell::from("Wiring"));
    }

    #[test]
    fn only_first_rows_up_to_limit_are_used() {
        let rows = (0..25).map(|i| row(&format!("P{i}"), i as f64, "w")).collect();
        let s = sheet(&["Payee Name", "Amount", "Work"], rows);
        let ex = extract_records(&s, 10).unwrap();
        assert_eq!(ex.records.len(), 10);
        assert_eq!(ex.records[9].payee_name, Cell::from("P9"));
        assert_eq!(ex.rows_available, 25);
        assert_eq!(ex.rows_truncated, 15);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let s = sheet(&["Payee Name", "Amount"], vec![row("A", 1.0, "w")]);
        match extract_records(&s, 10).unwrap_err() {
            ReceiptError::Schema { missing, required } => {
                assert_eq!(missing, vec!["Work".to_string()]);
                assert_eq!(required.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn schema_is_checked_before_emptiness() {
        let s = sheet(&["Name", "Value"], Vec::new());
        assert!(matches!(
            extract_records(&s, 10),
            Err(ReceiptError::Schema { .. })
        ));
    }

    #[test]
    fn header_only_sheet_is_empty_input() {
        let s = sheet(&["Payee Name", "Amount", "Work"], Vec::new());
        assert!(matches!(
            extract_records(&s, 10),
            Err(ReceiptError::EmptyInput)
        ));
    }

    #[test]
    fn blank_rows_are_skipped_and_not_counted() {
        let s = sheet(
            &["Payee Name", "Amount", "Work"],
            vec![
                vec![Cell::Empty, Cell::Empty, Cell::Empty],
                row("A", 1.0, "w"),
                Vec::new(),
                row("B", 2.0, "w"),
            ],
        );
        let ex = extract_records(&s, 1).unwrap();
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].row, 3);
        assert_eq!(ex.rows_available, 2);
        assert_eq!(ex.rows_truncated, 1);
    }

    #[test]
    fn short_rows_yield_empty_cells() {
        let s = sheet(
            &["Payee Name", "Amount", "Work"],
            vec![vec![Cell::from("A"), Cell::Number(3.0)]],
        );
        let ex = extract_records(&s, 10).unwrap();
        assert_eq!(ex.records[0].work, Cell::Empty);
    }

    #[test]
    fn header_row_offset_is_applied() {
        let mut s = sheet(&["Payee Name", "Amount", "Work"], vec![row("A", 1.0, "w")]);
        s.header_row = 4;
        let ex = extract_records(&s, 10).unwrap();
        assert_eq!(ex.records[0].row, 5);
    }
}
