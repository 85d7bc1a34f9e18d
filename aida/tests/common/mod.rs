#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use aida::config::{ExtractionConfig, OcrConfig};
use aida::error::{AidaError, Result};
use aida::extraction::StructuredExtractor;
use aida::llm::{CompletionOptions, TextGeneration};
use aida::ocr::{LocalOcr, VisionOcr};
use aida::processing::extractors::ImageExtractor;
use aida::processing::DocumentPipeline;

type Responder = dyn Fn(&str, Option<&str>, &CompletionOptions) -> Result<String> + Send + Sync;

/// In-process text-generation backend with a call counter.
pub struct ScriptedLlm {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, Option<&str>, &CompletionOptions) -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        })
    }

    /// Every call fails as if the service were down.
    pub fn failing() -> Arc<Self> {
        Self::new(|_, _, _| Err(AidaError::Llm("service unavailable".to_string())))
    }

    /// Plausible answers for each operation, recognised by the system
    /// instruction, in the language the instruction is written in.
    pub fn clinical() -> Arc<Self> {
        Self::new(|_, system, _| {
            let system = system.unwrap_or_default();
            let reply = if system.contains("patient") {
                r#"{"name": "Jean Dupont", "date_of_birth": "01/01/1980", "address": null}"#
            } else if system.contains("valeurs médicales") {
                r#"{"Tension artérielle": "130/85 mmHg"}"#
            } else if system.contains("medical values") {
                r#"{"Hemoglobin": "13.5 g/dL", "Glucose": "5.4 mmol/L"}"#
            } else if system.starts_with("Catégoriser") {
                "Note de Consultation"
            } else if system.starts_with("Categorize") {
                "Lab Report"
            } else if system.starts_with("Résumer") {
                "Patient suivi pour une hypertension artérielle stable."
            } else {
                "Routine laboratory panel within normal limits."
            };
            Ok(reply.to_string())
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGeneration for ScriptedLlm {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(prompt, system_prompt, options)
    }
}

/// Local OCR that always answers the same text (or fails when `None`).
pub struct FixedLocalOcr {
    text: Option<String>,
    calls: AtomicUsize,
}

impl FixedLocalOcr {
    pub fn new(text: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            text: text.map(String::from),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalOcr for FixedLocalOcr {
    async fn recognize(&self, _image_bytes: &[u8], _languages: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| AidaError::Ocr("tesseract failed".to_string()))
    }
}

pub struct FixedVision {
    text: Option<String>,
    calls: AtomicUsize,
}

impl FixedVision {
    pub fn new(text: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            text: text.map(String::from),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionOcr for FixedVision {
    async fn extract_text(&self, _image_bytes: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.text
            .clone()
            .ok_or_else(|| AidaError::Ocr("vision service error".to_string()))
    }
}

pub fn pipeline(
    llm: Arc<ScriptedLlm>,
    local: Arc<FixedLocalOcr>,
    vision: Option<Arc<FixedVision>>,
) -> DocumentPipeline {
    let vision = vision.map(|v| v as Arc<dyn VisionOcr>);
    DocumentPipeline::new(
        StructuredExtractor::new(llm, ExtractionConfig::default()),
        ImageExtractor::new(local, vision, &OcrConfig::default()),
    )
}

/// Pipeline whose image stage is never expected to run.
pub fn text_pipeline(llm: Arc<ScriptedLlm>) -> DocumentPipeline {
    pipeline(llm, FixedLocalOcr::new(None), None)
}

/// Single-page PDF drawing each line with Helvetica. Lines must be plain
/// ASCII without parentheses.
pub fn make_test_pdf(lines: &[&str]) -> Vec<u8> {
    make_test_pdf_pages(&[lines])
}

/// One PDF page per entry, each with its own lines of Helvetica text.
pub fn make_test_pdf_pages(pages: &[&[&str]]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, ObjectId, Stream};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let page_ids: Vec<ObjectId> = pages
        .iter()
        .map(|lines| {
            let mut content = String::from("BT /F1 12 Tf 72 720 Td 14 TL");
            for line in lines.iter() {
                content.push_str(&format!(" ({line}) Tj T*"));
            }
            content.push_str(" ET");

            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! {
                        "F1" => font_id,
                    },
                },
            })
        })
        .collect();

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
        "Count" => page_ids.len() as i64,
    });

    for page_id in &page_ids {
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(*page_id) {
            page.set("Parent", pages_id);
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to save PDF");
    buffer
}

pub fn create_test_docx<F>(builder_fn: F) -> Vec<u8>
where
    F: FnOnce(docx_rs::Docx) -> docx_rs::Docx,
{
    let docx = builder_fn(docx_rs::Docx::new());
    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

/// Lab report: two paragraphs around a 2x2 results table.
pub fn lab_report_docx() -> Vec<u8> {
    use docx_rs::*;

    let cell = |text: &str| {
        TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
    };

    create_test_docx(|docx| {
        docx.add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("Laboratory results for John Smith")),
        )
        .add_table(Table::new(vec![
            TableRow::new(vec![cell("Hemoglobin"), cell("13.5 g/dL")]),
            TableRow::new(vec![cell("Glucose"), cell("5.4 mmol/L")]),
        ]))
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("Validated by the laboratory")),
        )
    })
}

pub const FRENCH_CONSULTATION: &[&str] = &[
    "Patient: Jean Dupont, DOB 01/01/1980",
    "Le patient est suivi pour une hypertension et la tension arterielle est de 130/85 mmHg",
];
