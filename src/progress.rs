//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages and decides on each row.
//!
//! # Example
//!
//! ```rust
//! use hand_receipts::{GenerationConfig, GenerationProgressCallback, RowError};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct SkipCounter {
//!     skipped: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for SkipCounter {
//!     fn on_row_skipped(&self, error: &RowError) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{error}");
//!     }
//! }
//!
//! let counter = Arc::new(SkipCounter { skipped: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::RowError;
use crate::record::DisplayRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a generation request currently is.
///
/// Requests move strictly forward:
/// `Idle → Extracting → Normalizing → Rendering → Delivering → Delivered`.
/// A fatal error at any stage ends the request; [`crate::ReceiptError::stage`]
/// reports which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Idle,
    Extracting,
    Normalizing,
    Rendering,
    Delivering,
    Delivered,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Extracting => "extracting",
            Stage::Normalizing => "normalizing",
            Stage::Rendering => "rendering",
            Stage::Delivering => "delivering",
            Stage::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it processes a spreadsheet.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in pipeline order from a single task.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called when the pipeline enters a new stage.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the extractor knows how many rows will be processed.
    ///
    /// # Arguments
    /// * `rows`      — data rows that made it under the row limit
    /// * `truncated` — rows dropped because of the row limit
    fn on_rows_extracted(&self, rows: usize, truncated: usize) {
        let _ = (rows, truncated);
    }

    /// Called for every row that became a receipt.
    fn on_row_accepted(&self, record: &DisplayRecord) {
        let _ = record;
    }

    /// Called for every row left out of the batch.
    fn on_row_skipped(&self, error: &RowError) {
        let _ = error;
    }

    /// Called after the document has been rendered.
    ///
    /// # Arguments
    /// * `receipts` — receipts in the document
    /// * `bytes`    — size of the PDF
    fn on_generation_complete(&self, receipts: usize, bytes: usize) {
        let _ = (receipts, bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
