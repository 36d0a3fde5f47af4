//! Record normalisation: `RawRecord` → `DisplayRecord`, or a skip.
//!
//! A bad amount on one row is not a reason to refuse the whole sheet: the
//! row is reported as a [`RowError`], logged at WARN, and the remaining rows
//! carry on. Only when *no* row survives does the caller escalate to
//! [`crate::ReceiptError::EmptyBatch`].

use crate::error::RowError;
use crate::pipeline::words::{amount_to_words, MAX_WORDABLE};
use crate::progress::ProgressCallback;
use crate::record::{Cell, DisplayRecord, RawRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Outcome of normalising a list of raw records.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Accepted receipts, in input order.
    pub records: Vec<DisplayRecord>,
    /// Rows left out, in input order.
    pub skipped: Vec<RowError>,
}

/// Normalise every record, collecting skips instead of failing.
pub fn normalize_all(raw: &[RawRecord], progress: Option<&ProgressCallback>) -> Normalized {
    let mut out = Normalized::default();

    for record in raw {
        match normalize_record(record) {
            Ok(accepted) => {
                debug!(
                    "Row {}: {} → Rs. {}",
                    accepted.row, accepted.payee, accepted.amount_formatted
                );
                if let Some(cb) = progress {
                    cb.on_row_accepted(&accepted);
                }
                out.records.push(accepted);
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(cb) = progress {
                    cb.on_row_skipped(&e);
                }
                out.skipped.push(e);
            }
        }
    }

    out
}

/// Convert one raw record into its display form.
pub fn normalize_record(raw: &RawRecord) -> Result<DisplayRecord, RowError> {
    let amount = parse_amount(&raw.amount, raw.row)?;
    let amount_words = amount_to_words(amount).ok_or_else(|| RowError::AmountTooLarge {
        row: raw.row,
        raw: raw.amount.to_string(),
    })?;

    Ok(DisplayRecord {
        row: raw.row,
        payee: raw.payee_name.to_string(),
        amount,
        amount_formatted: format_amount(amount),
        amount_words,
        work: raw.work.to_string(),
    })
}

/// Digits with optional single `_` separators, optional fraction and
/// exponent — the literal syntax spreadsheet users paste from scripts.
static RE_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[+-]?(?:(?:\d(?:_?\d)*)?\.\d(?:_?\d)*|\d(?:_?\d)*\.?)(?:[eE][+-]?\d(?:_?\d)*)?$",
    )
    .unwrap()
});

static RE_NON_FINITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[+-]?(?:inf|infinity|nan)$").unwrap());

/// Parse an Amount cell into a non-negative, finite number.
pub fn parse_amount(cell: &Cell, row: usize) -> Result<f64, RowError> {
    let raw = || cell.to_string();

    let value = match cell {
        Cell::Empty => return Err(RowError::MissingAmount { row }),
        Cell::Number(n) => *n,
        Cell::Int(i) => *i as f64,
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return Err(RowError::MissingAmount { row });
            }
            if RE_NON_FINITE.is_match(t) {
                return Err(RowError::NonFiniteAmount { row, raw: raw() });
            }
            if !RE_DECIMAL.is_match(t) {
                return Err(RowError::InvalidAmount { row, raw: raw() });
            }
            t.replace('_', "")
                .parse::<f64>()
                .map_err(|_| RowError::InvalidAmount { row, raw: raw() })?
        }
        Cell::Bool(_) | Cell::Error(_) => {
            return Err(RowError::InvalidAmount { row, raw: raw() })
        }
    };

    if !value.is_finite() {
        return Err(RowError::NonFiniteAmount { row, raw: raw() });
    }
    if value < 0.0 {
        return Err(RowError::NegativeAmount { row, raw: raw() });
    }
    if value >= MAX_WORDABLE as f64 {
        return Err(RowError::AmountTooLarge { row, raw: raw() });
    }

    // Folds -0.0 into 0.0 so it never prints as "-0.00".
    Ok(if value == 0.0 { 0.0 } else { value })
}

/// Thousands-grouped amount with exactly two decimals: `12345.5` → `"12,345.50"`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(d) => ("-", d),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(row: usize, amount: Cell) -> RawRecord {
        RawRecord {
            row,
            payee_name: Cell::from("M/s Sharma Electricals"),
            amount,
            work: Cell::from("Repair of street lights"),
        }
    }

    #[test]
    fn formats_with_grouping_and_two_decimals() {
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(12345.5), "12,345.50");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(100.0), "100.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
    }

    #[test]
    fn numeric_cells_pass_through() {
        assert_eq!(parse_amount(&Cell::Number(12.5), 2).unwrap(), 12.5);
        assert_eq!(parse_amount(&Cell::Int(40), 2).unwrap(), 40.0);
    }

    #[test]
    fn text_cells_accept_decimal_literals() {
        assert_eq!(parse_amount(&Cell::from(" 1500 "), 2).unwrap(), 1500.0);
        assert_eq!(parse_amount(&Cell::from("1_000.25"), 2).unwrap(), 1000.25);
        assert_eq!(parse_amount(&Cell::from("1e3"), 2).unwrap(), 1000.0);
        assert_eq!(parse_amount(&Cell::from(".5"), 2).unwrap(), 0.5);
        assert_eq!(parse_amount(&Cell::from("+7."), 2).unwrap(), 7.0);
        assert_eq!(parse_amount(&Cell::from("-0"), 2).unwrap().to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn text_cells_reject_garbage() {
        for bad in ["abc", "1,234", "Rs. 100", "1__0", "_1", "12.3.4", "--5"] {
            let err = parse_amount(&Cell::from(bad), 5).unwrap_err();
            assert_eq!(
                err,
                RowError::InvalidAmount {
                    row: 5,
                    raw: bad.to_string()
                },
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn special_values_are_rejected() {
        assert!(matches!(
            parse_amount(&Cell::from("nan"), 2),
            Err(RowError::NonFiniteAmount { .. })
        ));
        assert!(matches!(
            parse_amount(&Cell::from("-Infinity"), 2),
            Err(RowError::NonFiniteAmount { .. })
        ));
        assert!(matches!(
            parse_amount(&Cell::from("1e400"), 2),
            Err(RowError::NonFiniteAmount { .. })
        ));
        assert!(matches!(
            parse_amount(&Cell::Number(-5.0), 2),
            Err(RowError::NegativeAmount { .. })
        ));
        assert!(matches!(
            parse_amount(&Cell::Number(1e37), 2),
            Err(RowError::AmountTooLarge { .. })
        ));
        assert_eq!(
            parse_amount(&Cell::Empty, 9),
            Err(RowError::MissingAmount { row: 9 })
        );
        assert!(matches!(
            parse_amount(&Cell::Bool(true), 2),
            Err(RowError::InvalidAmount { .. })
        ));
        assert!(matches!(
            parse_amount(&Cell::Error("#DIV/0!".into()), 2),
            Err(RowError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn record_is_fully_normalised() {
        let display = normalize_record(&raw(2, Cell::Number(12345.5))).unwrap();
        assert_eq!(display.row, 2);
        assert_eq!(display.payee, "M/s Sharma Electricals");
        assert_eq!(display.amount_formatted, "12,345.50");
        assert_eq!(
            display.amount_words,
            "Twelve Thousand, Three Hundred And Forty-Five Point Five"
        );
        assert_eq!(display.work, "Repair of street lights");
    }

    #[test]
    fn text_fields_are_kept_verbatim() {
        let mut r = raw(3, Cell::Number(1.0));
        r.payee_name = Cell::Text("  A & B <Co>  ".into());
        r.work = Cell::Number(42.0);
        let display = normalize_record(&r).unwrap();
        assert_eq!(display.payee, "  A & B <Co>  ");
        assert_eq!(display.work, "42");
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let rows = vec![
            raw(2, Cell::Number(100.0)),
            raw(3, Cell::from("abc")),
            raw(4, Cell::Number(0.0)),
        ];
        let out = normalize_all(&rows, None);
        let kept: Vec<usize> = out.records.iter().map(|r| r.row).collect();
        assert_eq!(kept, vec![2, 4]);
        assert_eq!(
            out.skipped,
            vec![RowError::InvalidAmount {
                row: 3,
                raw: "abc".into()
            }]
        );
        assert_eq!(out.records[0].amount_words, "One Hundred");
        assert_eq!(out.records[1].amount_words, "Zero");
    }

    #[test]
    fn accepted_rows_are_logged_and_reported() {
        use crate::progress::GenerationProgressCallback;
        use std::sync::{Arc, Mutex};

        #[derive(Default)]
        struct Seen(Mutex<Vec<String>>);
        impl GenerationProgressCallback for Seen {
            fn on_row_accepted(&self, record: &DisplayRecord) {
                self.0.lock().unwrap().push(record.amount_formatted.clone());
            }
        }

        let seen = Arc::new(Seen::default());
        let callback: ProgressCallback = seen.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        let out = tracing::subscriber::with_default(subscriber, || {
            normalize_all(
                &[raw(2, Cell::Number(1234.5)), raw(3, Cell::Int(7))],
                Some(&callback),
            )
        });

        assert_eq!(out.records.len(), 2);
        assert_eq!(*seen.0.lock().unwrap(), vec!["1,234.50", "7.00"]);
    }
}
