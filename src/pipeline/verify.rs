//! Post-render check: make sure the engine output is a loadable PDF.
//!
//! wkhtmltopdf can exit successfully and still write a truncated document
//! when it is killed mid-stream or runs out of memory. Parsing the bytes with
//! lopdf before handing them to the caller turns that into a fatal render
//! error instead of a broken download.

use crate::error::ReceiptError;
use lopdf::Document;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structural facts about a rendered PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub page_count: usize,
    /// Header version, e.g. `"1.4"`.
    pub pdf_version: String,
    pub byte_len: usize,
}

/// Parse `bytes` and report page count and version.
///
/// # Errors
/// [`ReceiptError::RenderEngine`] if the bytes are not a valid PDF or the
/// document has no pages.
pub fn inspect_pdf(bytes: &[u8]) -> Result<DocumentSummary, ReceiptError> {
    let doc = Document::load_mem(bytes).map_err(|e| ReceiptError::RenderEngine {
        detail: format!("engine output is not a valid PDF: {e}"),
    })?;

    let page_count = doc.get_pages().len();
    if page_count == 0 {
        return Err(ReceiptError::RenderEngine {
            detail: "engine output contains no pages".to_string(),
        });
    }

    debug!(
        "Rendered PDF {}: {} page(s), {} bytes",
        doc.version,
        page_count,
        bytes.len()
    );

    Ok(DocumentSummary {
        page_count,
        pdf_version: doc.version.clone(),
        byte_len: bytes.len(),
    })
}
