//! Delivery: hand the rendered PDF to the caller under a fixed name and type.
//!
//! A [`GeneratedDocument`] is only ever built from bytes that passed the
//! render-stage checks, so a caller holding one always holds a complete PDF.

use crate::error::ReceiptError;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Media type of every generated document.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// The downloadable result of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    /// Suggested file name, `generated_receipts.pdf` unless configured.
    pub filename: String,
    /// Always [`PDF_MEDIA_TYPE`].
    pub media_type: &'static str,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl GeneratedDocument {
    pub(crate) fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: PDF_MEDIA_TYPE,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `Content-Disposition` header value offering the document as a download.
    pub fn content_disposition(&self) -> String {
        let name = self.filename.replace(['"', '\\'], "_");
        format!("attachment; filename=\"{name}\"")
    }

    /// Write the PDF to `path`.
    ///
    /// Writes to a sibling temp file and renames it into place, so `path`
    /// never holds a partial document.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ReceiptError> {
        let path = path.as_ref();
        let write_err = |source| ReceiptError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        info!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}
