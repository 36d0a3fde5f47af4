//! CLI binary for hand-receipts.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use hand_receipts::{
    generate_to_file, prepare, DisplayRecord, GenerationConfig, GenerationProgressCallback,
    ProgressCallback, ReceiptLayout, RowError, SheetSelection, Stage, DEFAULT_FILENAME,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner naming the current stage, plus one line per
/// accepted or skipped row.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        let (prefix, msg) = match stage {
            Stage::Extracting => ("Reading", "spreadsheet…"),
            Stage::Normalizing => ("Checking", "amounts…"),
            Stage::Rendering => ("Rendering", "PDF via wkhtmltopdf…"),
            Stage::Delivering => ("Saving", "document…"),
            Stage::Idle | Stage::Delivered => return,
        };
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
    }

    fn on_rows_extracted(&self, rows: usize, truncated: usize) {
        if truncated > 0 {
            self.bar.println(format!(
                "  {} using the first {rows} rows; {truncated} more ignored",
                yellow("⚠")
            ));
        }
    }

    fn on_row_accepted(&self, record: &DisplayRecord) {
        self.bar.println(format!(
            "  {} Row {:>3}  {:<32}  Rs. {}",
            green("✓"),
            record.row,
            record.payee,
            record.amount_formatted
        ));
    }

    fn on_row_skipped(&self, error: &RowError) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("⚠"), error));
    }

    fn on_generation_complete(&self, _receipts: usize, _bytes: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate generated_receipts.pdf from a workbook
  receipts payees.xlsx

  # Pick the worksheet and output path
  receipts --sheet Payees payees.xlsx -o out/receipts.pdf

  # Validate the sheet and show what would be printed
  receipts --check payees.xlsx

  # Write the HTML instead of rendering (no wkhtmltopdf needed)
  receipts --html payees.csv -o receipts.html

  # Another division
  receipts --division "PWD City Division, Jaipur" \
           --disbursing-officer "The Executive Engineer PWD City Division, Jaipur" payees.xlsx

INPUT:
  The first row must contain the headers "Payee Name", "Amount" and "Work"
  (any order, extra columns ignored). Only the first 10 data rows are used.
  Rows with a non-numeric or negative Amount are skipped with a warning.
  Supported: .xlsx .xlsm .xlsb .xls .ods .csv

ENVIRONMENT VARIABLES:
  WKHTMLTOPDF_PATH   Path to the wkhtmltopdf executable
  RUST_LOG           Override the log filter (e.g. hand_receipts=debug)

SETUP:
  Debian/Ubuntu:  apt-get install wkhtmltopdf
  macOS:          brew install --cask wkhtmltopdf
  Windows:        install to C:/Program Files/wkhtmltopdf (default path)
"#;

/// Generate RPWA 28 hand-receipt PDFs from a payee spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "receipts",
    version,
    about = "Generate RPWA 28 hand-receipt PDFs from a payee spreadsheet",
    long_about = "Read a spreadsheet with 'Payee Name', 'Amount' and 'Work' columns and \
render one hand receipt (RPWA 28) page per payee into a single PDF using wkhtmltopdf.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Spreadsheet file (.xlsx, .xlsm, .xlsb, .xls, .ods, .csv).
    input: PathBuf,

    /// Output file. Default: generated_receipts.pdf (or .html with --html).
    #[arg(short, long, env = "RECEIPTS_OUTPUT")]
    output: Option<PathBuf>,

    /// Path to the wkhtmltopdf executable.
    #[arg(long, value_name = "PATH")]
    wkhtmltopdf: Option<PathBuf>,

    /// Worksheet name or zero-based index. Default: first sheet.
    #[arg(long, value_name = "NAME|INDEX")]
    sheet: Option<String>,

    /// Maximum number of data rows to use (1-10).
    #[arg(long, env = "RECEIPTS_ROW_LIMIT",
          default_value_t = hand_receipts::DEFAULT_ROW_LIMIT as u64,
          value_parser = clap::value_parser!(u64).range(1..=hand_receipts::MAX_ROW_LIMIT as u64))]
    row_limit: u64,

    /// Abort rendering after this many seconds.
    #[arg(long, env = "RECEIPTS_RENDER_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    render_timeout: u64,

    /// Division named under the form title.
    #[arg(long, env = "RECEIPTS_DIVISION")]
    division: Option<String>,

    /// Designation shown after the payee name.
    #[arg(long, env = "RECEIPTS_PAYEE_DESIGNATION")]
    payee_designation: Option<String>,

    /// Officer the payee receives the sum from.
    #[arg(long, env = "RECEIPTS_DISBURSING_OFFICER")]
    disbursing_officer: Option<String>,

    /// Budget head the payment is chargeable to.
    #[arg(long, env = "RECEIPTS_CHARGEABLE_HEAD")]
    chargeable_head: Option<String>,

    /// Write the receipt HTML instead of a PDF.
    #[arg(long, conflicts_with = "check")]
    html: bool,

    /// Validate the spreadsheet and list the receipts; write nothing.
    #[arg(long)]
    check: bool,

    /// Print a JSON summary on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "RECEIPTS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RECEIPTS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RECEIPTS_QUIET")]
    quiet: bool,
}

/// `--check --json` output.
#[derive(Serialize)]
struct CheckReport<'a> {
    receipts: &'a [DisplayRecord],
    skipped: &'a [RowError],
    rows_available: usize,
    rows_truncated: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already shows skipped rows; keep library WARN lines out of
    // its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Dry run / HTML only ──────────────────────────────────────────────
    if cli.check || cli.html {
        let prepared = prepare(&cli.input, &config)
            .await
            .with_context(|| format!("Failed to read {}", cli.input.display()))?;

        if cli.html {
            let path = cli
                .output
                .clone()
                .unwrap_or_else(|| Path::new(DEFAULT_FILENAME).with_extension("html"));
            tokio::fs::write(&path, prepared.markup.as_str())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} receipt(s)  →  {}",
                    green("✔"),
                    prepared.batch.len(),
                    bold(&path.display().to_string())
                );
            }
            return Ok(());
        }

        if cli.json {
            let report = CheckReport {
                receipts: prepared.batch.records(),
                skipped: &prepared.skipped,
                rows_available: prepared.rows_available,
                rows_truncated: prepared.rows_truncated,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            print_records(prepared.batch.records());
            for skip in &prepared.skipped {
                println!("{} {}", yellow("⚠"), skip);
            }
        }
        return Ok(());
    }

    // ── Render ───────────────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.filename));

    let output = generate_to_file(&cli.input, &output_path, &config)
        .await
        .context("Receipt generation failed")?;

    if cli.json {
        let json = serde_json::json!({
            "output": output_path,
            "document": output.document,
            "summary": output.summary,
            "stats": output.stats,
            "skipped": output.skipped,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        if !show_progress {
            for skip in &output.skipped {
                eprintln!("{} {}", yellow("⚠"), skip);
            }
        }
        eprintln!(
            "{}  {} receipt(s), {} page(s)  {}ms  →  {}",
            green("✔"),
            output.stats.receipts_rendered,
            output.stats.page_count,
            output.stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        if output.stats.rows_skipped > 0 || output.stats.rows_truncated > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} row(s) skipped, {} row(s) beyond the limit",
                    output.stats.rows_skipped, output.stats.rows_truncated
                ))
            );
        }
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let defaults = ReceiptLayout::default();
    let layout = ReceiptLayout {
        payee_designation: cli
            .payee_designation
            .clone()
            .unwrap_or(defaults.payee_designation),
        division: cli.division.clone().unwrap_or(defaults.division),
        disbursing_officer: cli
            .disbursing_officer
            .clone()
            .unwrap_or(defaults.disbursing_officer),
        chargeable_head: cli
            .chargeable_head
            .clone()
            .unwrap_or(defaults.chargeable_head),
    };

    let mut builder = GenerationConfig::builder()
        .row_limit(cli.row_limit as usize)
        .render_timeout_secs(cli.render_timeout)
        .layout(layout);

    if let Some(ref sheet) = cli.sheet {
        builder = builder.sheet(SheetSelection::parse(sheet));
    }
    if let Some(ref path) = cli.wkhtmltopdf {
        builder = builder.engine_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_records(records: &[DisplayRecord]) {
    println!(
        "{}",
        bold(&format!(
            "{:>4}  {:<32}  {:>16}  {}",
            "Row", "Payee Name", "Amount", "In Words"
        ))
    );
    for r in records {
        println!(
            "{:>4}  {:<32}  {:>16}  {} Only",
            r.row, r.payee, r.amount_formatted, r.amount_words
        );
    }
}
