use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

mod common;
use common::{
    lab_report_docx, make_test_pdf, pipeline, text_pipeline, FixedLocalOcr, FixedVision,
    ScriptedLlm, FRENCH_CONSULTATION,
};

use aida::error::AidaError;
use aida::extraction::prompts;
use aida::models::{AnalysisResult, FileType};
use aida::processing::{ExtractionField, Language};

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("Failed to write test file");
    path
}

#[tokio::test]
async fn test_unsupported_extension_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "notes.TXT", b"Plenty of text that would pass the length gate.");
    let llm = ScriptedLlm::clinical();

    let result = text_pipeline(llm.clone()).process(&path).await;

    assert!(matches!(result, Err(AidaError::UnsupportedFormat(ext)) if ext == ".txt"));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_missing_file_is_reported_before_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.gif");
    let llm = ScriptedLlm::clinical();
    let pipeline = text_pipeline(llm.clone());

    let result = pipeline.process(&path).await;
    assert!(matches!(result, Err(AidaError::FileNotFound(_))));

    match pipeline.analyze_document(&path).await {
        AnalysisResult::Failed(failed) => {
            assert!(failed.error);
            assert_eq!(failed.file_name, "missing.gif");
            assert!(failed.message.starts_with("File not found: "));
        }
        AnalysisResult::Processed(_) => panic!("Expected an error record"),
    }
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_whitespace_pdf_yields_error_record() {
    let dir = TempDir::new().unwrap();
    let empty = write_file(&dir, "empty.pdf", b"");
    let blank = write_file(&dir, "blank.pdf", b"   \n\t  ");
    let llm = ScriptedLlm::clinical();
    let pipeline = text_pipeline(llm.clone());

    for path in [empty, blank] {
        let result = pipeline.analyze_document(&path).await;
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["error"], true);
        assert!(value["message"]
            .as_str()
            .unwrap()
            .contains("No text extracted"));
        assert_eq!(
            value["file_name"].as_str(),
            path.file_name().and_then(|n| n.to_str())
        );
    }
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_truncated_pdf_upload_is_a_processing_error() {
    let llm = ScriptedLlm::clinical();
    let bytes = make_test_pdf(FRENCH_CONSULTATION);
    let truncated = bytes[..40].to_vec();

    let result = text_pipeline(llm.clone())
        .process_bytes("consultation.pdf", truncated)
        .await;

    assert!(matches!(result, Err(AidaError::Processing(_))));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_short_text_is_rejected_without_extraction_calls() {
    let llm = ScriptedLlm::clinical();
    let docx = common::create_test_docx(|docx| {
        docx.add_paragraph(
            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("  Dr. X  ")),
        )
    });

    let result = text_pipeline(llm.clone())
        .process_bytes("short.docx", docx)
        .await;

    assert!(matches!(result, Err(AidaError::InsufficientText)));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_french_pdf_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "consultation.pdf", &make_test_pdf(FRENCH_CONSULTATION));
    let llm = ScriptedLlm::clinical();

    let outcome = text_pipeline(llm.clone())
        .process(&path)
        .await
        .expect("French consultation should be processed");
    let document = &outcome.document;

    assert_eq!(outcome.language, Language::French);
    assert!(outcome.is_complete());
    assert_eq!(llm.calls(), 4);

    assert_eq!(document.patient_info.name.as_deref(), Some("Jean Dupont"));
    assert_eq!(
        document.patient_info.date_of_birth.as_deref(),
        Some("01/01/1980")
    );
    assert_eq!(document.patient_info.address, None);
    assert!(prompts::categories(Language::French).contains(&document.metadata.category.as_str()));
    assert!(document
        .extracted_values
        .values()
        .any(|value| value.contains("130/85")));

    assert_eq!(document.metadata.file_type, FileType::Pdf);
    assert_eq!(document.metadata.num_pages, 1);
    assert_eq!(document.metadata.file_name, "consultation.pdf");
    assert!(document.raw_text.contains("Jean Dupont"));

    let date = &document.metadata.creation_date;
    assert_eq!(date.len(), 10);
    assert_eq!(&date[2..3], "/");
    assert_eq!(&date[5..6], "/");
}

#[tokio::test]
async fn test_docx_lab_report_in_english() {
    let llm = ScriptedLlm::clinical();

    let outcome = text_pipeline(llm)
        .process_bytes("results.docx", lab_report_docx())
        .await
        .expect("DOCX should be processed");
    let document = outcome.document;

    assert_eq!(outcome.language, Language::English);
    assert_eq!(document.metadata.file_type, FileType::Docx);
    assert_eq!(document.metadata.num_pages, 1);
    assert_eq!(document.metadata.category, "Lab Report");
    assert_eq!(
        document.extracted_values.get("Hemoglobin").map(String::as_str),
        Some("13.5 g/dL")
    );

    let text = &document.raw_text;
    let position = |needle: &str| {
        text.find(needle)
            .unwrap_or_else(|| panic!("{needle:?} missing from {text:?}"))
    };
    // Paragraphs first, then table cells in row-major order.
    assert!(position("Laboratory results") < position("Validated by the laboratory"));
    assert!(position("Validated by the laboratory") < position("Hemoglobin"));
    assert!(position("Hemoglobin") < position("13.5 g/dL"));
    assert!(position("13.5 g/dL") < position("Glucose"));
}

#[tokio::test]
async fn test_total_service_outage_still_produces_a_document() {
    let llm = ScriptedLlm::failing();

    let outcome = text_pipeline(llm.clone())
        .process_bytes("results.docx", lab_report_docx())
        .await
        .expect("Extraction failures must not abort the pipeline");
    let document = &outcome.document;

    assert_eq!(llm.calls(), 4);
    assert!(document.patient_info.is_empty());
    assert!(document.extracted_values.is_empty());
    assert_eq!(document.metadata.category, "Other");
    assert_eq!(document.summary, "Summary generation failed.");

    let mut fields: Vec<ExtractionField> = outcome.failures.iter().map(|f| f.field).collect();
    fields.sort_by_key(|field| field.to_string());
    assert_eq!(
        fields,
        vec![
            ExtractionField::Category,
            ExtractionField::MedicalValues,
            ExtractionField::PatientInfo,
            ExtractionField::Summary,
        ]
    );
}

#[tokio::test]
async fn test_image_with_good_local_ocr_skips_vision() {
    let local = FixedLocalOcr::new(Some(
        "Prescription: amoxicillin 500 mg three times daily for seven days.",
    ));
    let vision = FixedVision::new(Some("unused"));
    let llm = ScriptedLlm::clinical();

    let outcome = pipeline(llm, local.clone(), Some(vision.clone()))
        .process_bytes("scan.PNG", b"png bytes".to_vec())
        .await
        .expect("Image should be processed");

    assert_eq!(vision.calls(), 0);
    assert_eq!(local.calls(), 1);
    assert_eq!(outcome.document.metadata.file_type, FileType::Image);
    assert_eq!(outcome.document.metadata.num_pages, 1);
    assert!(outcome.document.raw_text.starts_with("Prescription"));
}

#[tokio::test]
async fn test_image_with_weak_local_ocr_uses_vision_once() {
    let local = FixedLocalOcr::new(Some("Rx amoxicillin 500mg"));
    let vision = FixedVision::new(Some(
        "Prescription: amoxicillin 500 mg three times daily for seven days.",
    ));
    let llm = ScriptedLlm::clinical();

    let outcome = pipeline(llm, local, Some(vision.clone()))
        .process_bytes("scan.jpg", b"jpeg bytes".to_vec())
        .await
        .expect("Image should be processed");

    assert_eq!(vision.calls(), 1);
    assert!(outcome.document.raw_text.contains("three times daily"));
}

#[tokio::test]
async fn test_unreadable_image_is_insufficient_text() {
    let local = FixedLocalOcr::new(None);
    let vision = FixedVision::new(None);
    let llm = ScriptedLlm::clinical();

    let result = pipeline(llm.clone(), local, Some(vision.clone()))
        .process_bytes("scan.jpeg", b"jpeg bytes".to_vec())
        .await;

    assert!(matches!(result, Err(AidaError::InsufficientText)));
    assert_eq!(vision.calls(), 1);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_analyze_many_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let pdf = write_file(&dir, "consultation.pdf", &make_test_pdf(FRENCH_CONSULTATION));
    let missing = dir.path().join("missing.pdf");
    let docx = write_file(&dir, "results.docx", &lab_report_docx());
    let unsupported = write_file(&dir, "photo.gif", b"GIF89a");

    let results = text_pipeline(ScriptedLlm::clinical())
        .analyze_many(&[pdf, missing, docx, unsupported])
        .await;

    let summary: Vec<(&str, bool)> = results
        .iter()
        .map(|result| (result.file_name(), result.is_error()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("consultation.pdf", false),
            ("missing.pdf", true),
            ("results.docx", false),
            ("photo.gif", true),
        ]
    );
}
