//! Helpers shared by the integration and unit test binaries.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ghostwriter::config::Config;
use ghostwriter::error::AppResult;
use ghostwriter::inference::{AiDetector, ChunkSummarizer};
use ghostwriter::models::ScoreResult;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Builds a PDF with one text line per page, Courier/WinAnsi, ASCII only.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    pdf_with_info(pages, None)
}

pub fn pdf_with_info(pages: &[&str], title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![40.into(), 800.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Test Author"),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("pdf serializes");
    buf
}

pub fn stub_config() -> Config {
    config_with(&[])
}

/// Stub-backend configuration with the given overrides.
pub fn config_with(overrides: &[(&str, &str)]) -> Config {
    let overrides: Vec<(String, String)> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| {
        overrides
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| (key == "MODEL_BACKEND").then(|| "stub".to_string()))
    })
    .expect("test config is valid")
}

/// Detector that returns a fixed score and counts its calls.
pub struct CountingDetector {
    pub calls: Arc<AtomicUsize>,
    pub inputs: Arc<Mutex<Vec<String>>>,
    pub ai_probability: f64,
}

impl CountingDetector {
    pub fn new(ai_probability: f64) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
            ai_probability,
        }
    }
}

impl AiDetector for CountingDetector {
    fn name(&self) -> &str {
        "counting"
    }

    fn score(&self, text: &str) -> AppResult<ScoreResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(ScoreResult::from_ai_probability(self.ai_probability))
    }
}

/// Detector that blocks for `delay` per call and records the highest number
/// of calls running at the same time.
pub struct SlowDetector {
    pub delay: Duration,
    pub active: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl SlowDetector {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl AiDetector for SlowDetector {
    fn name(&self) -> &str {
        "slow"
    }

    fn score(&self, _text: &str) -> AppResult<ScoreResult> {
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ScoreResult::from_ai_probability(0.5))
    }
}

/// Summarizer that records every chunk and answers `S<n> ` (trailing space
/// on purpose).
#[derive(Default)]
pub struct RecordingSummarizer {
    pub chunks: Arc<Mutex<Vec<String>>>,
}

impl ChunkSummarizer for RecordingSummarizer {
    fn name(&self) -> &str {
        "recording"
    }

    fn summarize(&self, chunk: &str) -> AppResult<String> {
        let mut chunks = self.chunks.lock().unwrap();
        chunks.push(chunk.to_string());
        Ok(format!("S{} ", chunks.len()))
    }
}
