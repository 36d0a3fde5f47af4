//! Result types returned by the generation entry points.

use crate::delivery::GeneratedDocument;
use crate::error::RowError;
use crate::pipeline::markup::Markup;
use crate::pipeline::verify::DocumentSummary;
use crate::record::{Batch, DisplayRecord};
use serde::Serialize;

/// Everything a successful generation produced.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// The PDF, ready to download or write.
    pub document: GeneratedDocument,
    /// Receipts in the document, in page order.
    pub records: Vec<DisplayRecord>,
    /// Rows left out because of an unusable amount.
    pub skipped: Vec<RowError>,
    pub summary: DocumentSummary,
    pub stats: GenerationStats,
}

/// A validated batch and its markup, before any engine is involved.
///
/// Returned by [`crate::prepare`]; useful for dry runs and for writing the
/// HTML out for inspection.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub batch: Batch,
    pub markup: Markup,
    pub skipped: Vec<RowError>,
    /// Non-blank data rows found in the sheet.
    pub rows_available: usize,
    /// Rows dropped by the row limit.
    pub rows_truncated: usize,
}

/// Counters and timings for one generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Non-blank data rows found in the sheet.
    pub rows_available: usize,
    /// Rows dropped by the row limit.
    pub rows_truncated: usize,
    /// Rows left out because of an unusable amount.
    pub rows_skipped: usize,
    pub receipts_rendered: usize,
    /// Pages in the rendered PDF; equals `receipts_rendered` for a well-formed run.
    pub page_count: usize,
    pub pdf_bytes: usize,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
}
