//! Error types for the hand-receipts library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReceiptError`] — **Fatal**: the request cannot produce a document
//!   (unreadable file, missing columns, no engine, engine failure). Returned
//!   as `Err(ReceiptError)` from the top-level `generate*` functions. The
//!   caller never receives a partial PDF alongside one of these.
//!
//! * [`RowError`] — **Non-fatal**: one spreadsheet row has an unusable
//!   amount. The row is left out of the batch, a warning is logged, and the
//!   error is returned in [`crate::output::GenerationOutput::skipped`] so
//!   callers can show which rows were dropped.

use crate::progress::Stage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the hand-receipts library.
#[derive(Debug, Error)]
pub enum ReceiptError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// File extension is not a spreadsheet format we can decode.
    #[error(
        "Unsupported input format '{extension}' for '{path}'\n\
Supported: .xlsx, .xlsm, .xlsb, .xls, .ods, .csv"
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The decoder rejected the file (corrupt, mislabelled, encrypted …).
    #[error("Could not read spreadsheet '{path}': {detail}")]
    SpreadsheetUnreadable { path: PathBuf, detail: String },

    /// The requested worksheet does not exist in the workbook.
    #[error("Worksheet '{sheet}' not found. Available: {}", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    // ── Data errors ───────────────────────────────────────────────────────
    /// One or more required header columns are absent.
    #[error(
        "Missing required column(s): {}\nPlease ensure the header row has: {}",
        .missing.join(", "),
        .required.join(", ")
    )]
    Schema {
        missing: Vec<String>,
        required: Vec<String>,
    },

    /// The sheet has a header row but no data rows.
    #[error("The uploaded spreadsheet has no data rows below the header.")]
    EmptyInput,

    /// Every row was rejected during normalisation.
    #[error(
        "No valid receipt data could be processed: all {rows} row(s) had an invalid 'Amount'."
    )]
    EmptyBatch { rows: usize },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The render engine could not be resolved or is unusable.
    #[error("Render engine is not configured: {detail}\n{hint}")]
    Configuration { detail: String, hint: String },

    /// The render engine ran but failed. `detail` carries the engine's own
    /// diagnostic text verbatim.
    #[error("PDF generation failed: {detail}")]
    RenderEngine { detail: String },

    /// The render engine did not finish within the caller-imposed limit.
    #[error("PDF generation timed out after {secs}s")]
    RenderTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReceiptError {
    /// The pipeline stage this error aborts.
    pub fn stage(&self) -> Stage {
        match self {
            ReceiptError::InputNotFound { .. }
            | ReceiptError::PermissionDenied { .. }
            | ReceiptError::UnsupportedFormat { .. }
            | ReceiptError::SpreadsheetUnreadable { .. }
            | ReceiptError::SheetNotFound { .. }
            | ReceiptError::Schema { .. }
            | ReceiptError::EmptyInput => Stage::Extracting,
            ReceiptError::EmptyBatch { .. } => Stage::Normalizing,
            ReceiptError::Configuration { .. }
            | ReceiptError::RenderEngine { .. }
            | ReceiptError::RenderTimeout { .. } => Stage::Rendering,
            ReceiptError::OutputWriteFailed { .. } => Stage::Delivering,
            ReceiptError::InvalidConfig(_) | ReceiptError::Internal(_) => Stage::Idle,
        }
    }
}

/// A non-fatal error for a single spreadsheet row.
///
/// `row` is the 1-based row number as shown in a spreadsheet application,
/// with the header on row 1.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RowError {
    /// The Amount cell is blank.
    #[error("Skipping row {row}: 'Amount' is empty")]
    MissingAmount { row: usize },

    /// The Amount cell is not a number.
    #[error("Skipping row {row} due to invalid 'Amount': {raw}")]
    InvalidAmount { row: usize, raw: String },

    /// The Amount parsed as infinity or NaN.
    #[error("Skipping row {row}: 'Amount' is not a finite number: {raw}")]
    NonFiniteAmount { row: usize, raw: String },

    /// The Amount is below zero.
    #[error("Skipping row {row}: 'Amount' must not be negative: {raw}")]
    NegativeAmount { row: usize, raw: String },

    /// The Amount is beyond what can be spelled out in words.
    #[error("Skipping row {row}: 'Amount' is too large to express in words: {raw}")]
    AmountTooLarge { row: usize, raw: String },
}

impl RowError {
    /// Spreadsheet row number of the offending record.
    pub fn row(&self) -> usize {
        match self {
            RowError::MissingAmount { row }
            | RowError::InvalidAmount { row, .. }
            | RowError::NonFiniteAmount { row, .. }
            | RowError::NegativeAmount { row, .. }
            | RowError::AmountTooLarge { row, .. } => *row,
        }
    }
}
