//! Configuration types for receipt generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The config is an explicit value passed
//! to every entry point; nothing is read from process-wide mutable state.

use crate::error::ReceiptError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Rows consumed from the top of the sheet when nothing else is configured.
pub const DEFAULT_ROW_LIMIT: usize = 10;

/// Upper bound on [`GenerationConfig::row_limit`]; a batch never holds more.
pub const MAX_ROW_LIMIT: usize = 10;

/// Suggested download/output name of the generated document.
pub const DEFAULT_FILENAME: &str = "generated_receipts.pdf";

/// Configuration for one generation request.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use hand_receipts::{GenerationConfig, SheetSelection};
///
/// let config = GenerationConfig::builder()
///     .row_limit(10)
///     .sheet(SheetSelection::Named("Payees".into()))
///     .render_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Maximum number of data rows read from the sheet, `1..=MAX_ROW_LIMIT`.
    /// Default: 10.
    ///
    /// Rows past the limit are dropped before normalisation and reported in
    /// [`crate::output::GenerationStats::rows_truncated`].
    pub row_limit: usize,

    /// Which worksheet to read. Default: the first one.
    pub sheet: SheetSelection,

    /// Explicit path to the wkhtmltopdf executable.
    ///
    /// If None, the engine is discovered via `WKHTMLTOPDF_PATH`, the platform
    /// default install path and `PATH`.
    pub engine_path: Option<PathBuf>,

    /// Let the engine read local files referenced by the markup. Default: true.
    pub enable_local_file_access: bool,

    /// Abort rendering after this many seconds. Default: no limit.
    pub render_timeout_secs: Option<u64>,

    /// Office-specific text printed on every receipt.
    pub layout: ReceiptLayout,

    /// File name offered for the generated PDF. Default: `generated_receipts.pdf`.
    pub filename: String,

    /// Receives stage and row events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            sheet: SheetSelection::default(),
            engine_path: None,
            enable_local_file_access: true,
            render_timeout_secs: None,
            layout: ReceiptLayout::default(),
            filename: DEFAULT_FILENAME.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("row_limit", &self.row_limit)
            .field("sheet", &self.sheet)
            .field("engine_path", &self.engine_path)
            .field("enable_local_file_access", &self.enable_local_file_access)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("layout", &self.layout)
            .field("filename", &self.filename)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn row_limit(mut self, n: usize) -> Self {
        self.config.row_limit = n;
        self
    }

    pub fn sheet(mut self, sheet: SheetSelection) -> Self {
        self.config.sheet = sheet;
        self
    }

    pub fn engine_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine_path = Some(path.into());
        self
    }

    pub fn enable_local_file_access(mut self, v: bool) -> Self {
        self.config.enable_local_file_access = v;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = Some(secs);
        self
    }

    pub fn layout(mut self, layout: ReceiptLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.config.filename = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, ReceiptError> {
        let c = &self.config;
        if !(1..=MAX_ROW_LIMIT).contains(&c.row_limit) {
            return Err(ReceiptError::InvalidConfig(format!(
                "Row limit must be between 1 and {MAX_ROW_LIMIT}, got {}",
                c.row_limit
            )));
        }
        if c.render_timeout_secs == Some(0) {
            return Err(ReceiptError::InvalidConfig("Render timeout must be ≥ 1 second".into()));
        }
        if c.filename.trim().is_empty() || !c.filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ReceiptError::InvalidConfig(format!(
                "Output filename must end in .pdf, got '{}'",
                c.filename
            )));
        }
        if c.filename.contains(['/', '\\']) {
            return Err(ReceiptError::InvalidConfig(format!(
                "Output filename must not contain a path separator, got '{}'",
                c.filename
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which worksheet of a workbook to read. CSV input has exactly one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetSelection {
    /// The first worksheet (default).
    #[default]
    First,
    /// A worksheet by its tab name.
    Named(String),
    /// A worksheet by zero-based position.
    Index(usize),
}

impl SheetSelection {
    /// Interpret a CLI value: all digits selects by index, anything else by name.
    pub fn parse(value: &str) -> Self {
        let v = value.trim();
        match v.parse::<usize>() {
            Ok(i) => SheetSelection::Index(i),
            Err(_) if v.is_empty() => SheetSelection::First,
            Err(_) => SheetSelection::Named(v.to_string()),
        }
    }
}

/// Office-specific text printed on every receipt page.
///
/// Defaults reproduce the PWD Electric Division, Udaipur EMD-refund receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLayout {
    /// Shown in brackets after the payee name, e.g. "Electric Contractor".
    pub payee_designation: String,
    /// Division named under the form title.
    pub division: String,
    /// Officer the payee acknowledges receiving the sum from (clause 5).
    pub disbursing_officer: String,
    /// Budget head the payment is chargeable to.
    pub chargeable_head: String,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self {
            payee_designation: "Electric Contractor".to_string(),
            division: "PWD Electric Division, Udaipur".to_string(),
            disbursing_officer: "The Executive Engineer PWD Electric Division, Udaipur"
                .to_string(),
            chargeable_head: "8443 [EMD- Refund]".to_string(),
        }
    }
}
