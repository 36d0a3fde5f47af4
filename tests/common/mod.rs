//! Shared helpers for integration tests: fixture files and stand-in engines.

#![allow(dead_code)]

use hand_receipts::{
    DisplayRecord, GenerationProgressCallback, Markup, ReceiptError, RenderEngine, RenderOptions,
    RowError, Stage,
};
use lopdf::{dictionary, Document, Object};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const HEADER: &str = "Payee Name,Amount,Work";

/// Write `content` to `name` inside `dir` and return the path.
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

/// CSV with the standard header and the given data lines.
pub fn csv(lines: &[&str]) -> String {
    let mut s = String::from(HEADER);
    for line in lines {
        s.push('\n');
        s.push_str(line);
    }
    s.push('\n');
    s
}

/// A blank PDF with `pages` A4 pages.
pub fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save pdf");
    out
}

/// In-process engine: one blank page per receipt section in the markup.
#[derive(Default)]
pub struct FakeEngine {
    pub calls: AtomicUsize,
    pub last_markup: Mutex<Option<String>>,
    pub last_options: Mutex<Option<RenderOptions>>,
}

impl FakeEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_markup(&self) -> String {
        self.last_markup.lock().unwrap().clone().unwrap_or_default()
    }
}

impl RenderEngine for FakeEngine {
    async fn render(
        &self,
        markup: &Markup,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, ReceiptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_markup.lock().unwrap() = Some(markup.as_str().to_string());
        *self.last_options.lock().unwrap() = Some(options.clone());
        Ok(blank_pdf(markup.receipt_count()))
    }
}

/// Engine that always fails the way wkhtmltopdf does on a bad install.
pub struct FailingEngine {
    pub detail: String,
}

impl RenderEngine for FailingEngine {
    async fn render(
        &self,
        _markup: &Markup,
        _options: &RenderOptions,
    ) -> Result<Vec<u8>, ReceiptError> {
        Err(ReceiptError::RenderEngine {
            detail: self.detail.clone(),
        })
    }
}

/// Engine that never finishes within a test's patience.
pub struct StalledEngine;

impl RenderEngine for StalledEngine {
    async fn render(
        &self,
        _markup: &Markup,
        _options: &RenderOptions,
    ) -> Result<Vec<u8>, ReceiptError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Engine that returns something other than a PDF.
pub struct GarbageEngine;

impl RenderEngine for GarbageEngine {
    async fn render(
        &self,
        _markup: &Markup,
        _options: &RenderOptions,
    ) -> Result<Vec<u8>, ReceiptError> {
        Ok(b"%PDF-1.4 truncated".to_vec())
    }
}

/// Progress callback that records every event.
#[derive(Default)]
pub struct Recorder {
    pub stages: Mutex<Vec<Stage>>,
    pub accepted: Mutex<Vec<usize>>,
    pub skipped: Mutex<Vec<usize>>,
    pub extracted: Mutex<Option<(usize, usize)>>,
    pub completed: Mutex<Option<(usize, usize)>>,
}

impl GenerationProgressCallback for Recorder {
    fn on_stage(&self, stage: Stage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_rows_extracted(&self, rows: usize, truncated: usize) {
        *self.extracted.lock().unwrap() = Some((rows, truncated));
    }

    fn on_row_accepted(&self, record: &DisplayRecord) {
        self.accepted.lock().unwrap().push(record.row);
    }

    fn on_row_skipped(&self, error: &RowError) {
        self.skipped.lock().unwrap().push(error.row());
    }

    fn on_generation_complete(&self, receipts: usize, bytes: usize) {
        *self.completed.lock().unwrap() = Some((receipts, bytes));
    }
}

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
