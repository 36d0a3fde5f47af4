//! Generation entry points: spreadsheet in, receipt PDF out.
//!
//! Each request walks the stages in order:
//!
//! ```text
//! Idle ─▶ Extracting ─▶ Normalizing ─▶ Rendering ─▶ Delivering ─▶ Delivered
//! ```
//!
//! and stops at the first fatal error, reporting nothing partial. Rows with
//! an unusable amount are not fatal; they are collected in
//! [`GenerationOutput::skipped`].
//!
//! Requests share no mutable state, so any number may run concurrently.

use crate::config::GenerationConfig;
use crate::delivery::GeneratedDocument;
use crate::error::ReceiptError;
use crate::output::{GenerationOutput, GenerationStats, PreparedBatch};
use crate::pipeline::engine::{RenderEngine, RenderOptions, WkhtmltopdfEngine};
use crate::pipeline::input::{self, InputFormat, Sheet};
use crate::pipeline::{extract, markup, normalize, verify};
use crate::progress::Stage;
use crate::record::Batch;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where the spreadsheet comes from.
enum Source {
    File(PathBuf),
    Buffer { bytes: Vec<u8>, format: InputFormat },
}

/// Generate the receipts PDF for a spreadsheet file.
///
/// The render engine is resolved from `config` before the input is read, so
/// a missing wkhtmltopdf is reported without touching the file.
///
/// # Errors
/// Returns `Err(ReceiptError)` for fatal errors only:
/// - file missing, unreadable or in an unsupported format
/// - required columns missing, or no data rows
/// - every row rejected ([`ReceiptError::EmptyBatch`])
/// - engine missing, failing or timing out
///
/// # Example
/// ```rust,no_run
/// use hand_receipts::{generate, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = generate("payees.xlsx", &GenerationConfig::default()).await?;
/// std::fs::write(&output.document.filename, &output.document.bytes)?;
/// for skip in &output.skipped {
///     eprintln!("{skip}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn generate(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, ReceiptError> {
    let engine = WkhtmltopdfEngine::from_config(config)?;
    generate_with_engine(input, config, &engine).await
}

/// Like [`generate`], with a caller-supplied render engine.
pub async fn generate_with_engine<E: RenderEngine>(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
    engine: &E,
) -> Result<GenerationOutput, ReceiptError> {
    let source = Source::File(input.as_ref().to_path_buf());
    run(source, config, engine, None).await
}

/// Generate the PDF and write it to `output_path` atomically.
pub async fn generate_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, ReceiptError> {
    let engine = WkhtmltopdfEngine::from_config(config)?;
    generate_to_file_with_engine(input, output_path, config, &engine).await
}

/// Like [`generate_to_file`], with a caller-supplied render engine.
pub async fn generate_to_file_with_engine<E: RenderEngine>(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
    engine: &E,
) -> Result<GenerationOutput, ReceiptError> {
    let source = Source::File(input.as_ref().to_path_buf());
    run(source, config, engine, Some(output_path.as_ref())).await
}

/// Generate the PDF from an in-memory spreadsheet, e.g. an upload buffer.
///
/// # Example
/// ```rust,no_run
/// use hand_receipts::{generate_from_bytes, GenerationConfig, InputFormat};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("payees.xlsx")?;
/// let output = generate_from_bytes(bytes, InputFormat::Xlsx, &GenerationConfig::default()).await?;
/// assert_eq!(output.document.media_type, "application/pdf");
/// # Ok(())
/// # }
/// ```
pub async fn generate_from_bytes(
    bytes: Vec<u8>,
    format: InputFormat,
    config: &GenerationConfig,
) -> Result<GenerationOutput, ReceiptError> {
    let engine = WkhtmltopdfEngine::from_config(config)?;
    generate_from_bytes_with_engine(bytes, format, config, &engine).await
}

/// Like [`generate_from_bytes`], with a caller-supplied render engine.
pub async fn generate_from_bytes_with_engine<E: RenderEngine>(
    bytes: Vec<u8>,
    format: InputFormat,
    config: &GenerationConfig,
    engine: &E,
) -> Result<GenerationOutput, ReceiptError> {
    run(Source::Buffer { bytes, format }, config, engine, None).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally; do not call from within an
/// async context.
pub fn generate_sync(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, ReceiptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReceiptError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input, config))
}

/// Read, validate and template a spreadsheet without rendering it.
///
/// Runs the Extracting and Normalizing stages only; no engine is needed.
pub async fn prepare(
    input: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<PreparedBatch, ReceiptError> {
    prepare_source(Source::File(input.as_ref().to_path_buf()), config).await
}

/// Like [`prepare`], for an in-memory spreadsheet.
pub async fn prepare_from_bytes(
    bytes: Vec<u8>,
    format: InputFormat,
    config: &GenerationConfig,
) -> Result<PreparedBatch, ReceiptError> {
    prepare_source(Source::Buffer { bytes, format }, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run<E: RenderEngine>(
    source: Source,
    config: &GenerationConfig,
    engine: &E,
    sink: Option<&Path>,
) -> Result<GenerationOutput, ReceiptError> {
    let total_start = Instant::now();

    // ── Step 1-2: Extract and normalise ──────────────────────────────────
    let prepared = prepare_source(source, config).await?;
    let PreparedBatch {
        batch,
        markup,
        skipped,
        rows_available,
        rows_truncated,
    } = prepared;

    // ── Step 3: Render ───────────────────────────────────────────────────
    notify_stage(config, Stage::Rendering);
    let options = RenderOptions::from_config(config);
    let render_start = Instant::now();
    let bytes = match config.render_timeout_secs {
        Some(secs) => tokio::time::timeout(
            Duration::from_secs(secs),
            engine.render(&markup, &options),
        )
        .await
        .map_err(|_| ReceiptError::RenderTimeout { secs })??,
        None => engine.render(&markup, &options).await?,
    };
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let summary = verify::inspect_pdf(&bytes)?;
    if summary.page_count != batch.len() {
        warn!(
            "Rendered PDF has {} page(s) for {} receipt(s); check the page size",
            summary.page_count,
            batch.len()
        );
    }
    info!(
        "Rendered {} receipt(s) into {} page(s) in {}ms",
        batch.len(),
        summary.page_count,
        render_duration_ms
    );

    // ── Step 4: Deliver ──────────────────────────────────────────────────
    notify_stage(config, Stage::Delivering);
    let document = GeneratedDocument::new(config.filename.clone(), bytes);
    if let Some(path) = sink {
        document.write_to(path).await?;
    }

    let stats = GenerationStats {
        rows_available,
        rows_truncated,
        rows_skipped: skipped.len(),
        receipts_rendered: batch.len(),
        page_count: summary.page_count,
        pdf_bytes: document.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(batch.len(), document.len());
    }
    notify_stage(config, Stage::Delivered);

    Ok(GenerationOutput {
        document,
        records: batch.into_records(),
        skipped,
        summary,
        stats,
    })
}

async fn prepare_source(
    source: Source,
    config: &GenerationConfig,
) -> Result<PreparedBatch, ReceiptError> {
    // ── Extracting ───────────────────────────────────────────────────────
    notify_stage(config, Stage::Extracting);
    let sheet = load(source, config).await?;
    let extraction = extract::extract_records(&sheet, config.row_limit)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_rows_extracted(extraction.records.len(), extraction.rows_truncated);
    }

    // ── Normalizing ──────────────────────────────────────────────────────
    notify_stage(config, Stage::Normalizing);
    let rows = extraction.records.len();
    let normalized =
        normalize::normalize_all(&extraction.records, config.progress_callback.as_ref());
    let batch = Batch::new(normalized.records).ok_or(ReceiptError::EmptyBatch { rows })?;
    info!(
        "{} receipt(s) ready, {} row(s) skipped",
        batch.len(),
        normalized.skipped.len()
    );

    let markup = markup::render_markup(&batch, &config.layout);
    debug!("Markup is {} bytes", markup.as_str().len());

    Ok(PreparedBatch {
        batch,
        markup,
        skipped: normalized.skipped,
        rows_available: extraction.rows_available,
        rows_truncated: extraction.rows_truncated,
    })
}

/// Decode the spreadsheet on the blocking pool; calamine and csv are synchronous.
async fn load(source: Source, config: &GenerationConfig) -> Result<Sheet, ReceiptError> {
    let selection = config.sheet.clone();
    tokio::task::spawn_blocking(move || match source {
        Source::File(path) => {
            info!("Reading spreadsheet: {}", path.display());
            input::load_sheet(&path, &selection)
        }
        Source::Buffer { bytes, format } => {
            info!("Reading {} bytes of {} input", bytes.len(), format.as_str());
            input::load_sheet_from_bytes(bytes, format, &selection, "<upload>")
        }
    })
    .await
    .map_err(|e| ReceiptError::Internal(format!("Input task panicked: {}", e)))?
}

fn notify_stage(config: &GenerationConfig, stage: Stage) {
    debug!("Stage: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage(stage);
    }
}
