//! # hand-receipts
//!
//! Turn a small payee spreadsheet into a printable batch of RPWA 28 hand
//! receipts, one A4 page per payee.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Spreadsheet (.xlsx / .xls / .ods / .csv)
//!  │
//!  ├─ 1. Extract    header check, first 10 non-blank rows
//!  ├─ 2. Normalize  "1234.5" → "1,234.50" + "One Thousand, Two Hundred …"
//!  ├─ 3. Markup     fixed HTML template, one section per receipt
//!  ├─ 4. Render     wkhtmltopdf (external process, stdin → stdout)
//!  └─ 5. Deliver    generated_receipts.pdf, application/pdf
//! ```
//!
//! Rows whose `Amount` cannot be used are skipped with a warning and reported
//! in [`GenerationOutput::skipped`]; everything else that goes wrong is a
//! [`ReceiptError`] and no document is produced.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hand_receipts::{generate_to_file, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::default();
//!     let output = generate_to_file("payees.xlsx", "generated_receipts.pdf", &config).await?;
//!     eprintln!(
//!         "{} receipt(s), {} row(s) skipped",
//!         output.stats.receipts_rendered, output.stats.rows_skipped
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Render Engine
//!
//! PDFs are produced by [wkhtmltopdf](https://wkhtmltopdf.org/). The
//! executable is taken from [`GenerationConfig::engine_path`], then
//! `WKHTMLTOPDF_PATH`, then the platform default install path, then `PATH`.
//! Supply your own [`RenderEngine`] to the `*_with_engine` functions to
//! render some other way.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `receipts` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! hand-receipts = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod delivery;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    GenerationConfig, GenerationConfigBuilder, ReceiptLayout, SheetSelection, DEFAULT_FILENAME,
    DEFAULT_ROW_LIMIT, MAX_ROW_LIMIT,
};
pub use delivery::{GeneratedDocument, PDF_MEDIA_TYPE};
pub use error::{ReceiptError, RowError};
pub use generate::{
    generate, generate_from_bytes, generate_from_bytes_with_engine, generate_sync,
    generate_to_file, generate_to_file_with_engine, generate_with_engine, prepare,
    prepare_from_bytes,
};
pub use output::{GenerationOutput, GenerationStats, PreparedBatch};
pub use pipeline::engine::{RenderEngine, RenderOptions, WkhtmltopdfEngine, PAGE_SIZE};
pub use pipeline::input::InputFormat;
pub use pipeline::markup::Markup;
pub use pipeline::verify::DocumentSummary;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use record::{Batch, Cell, DisplayRecord, RawRecord};
