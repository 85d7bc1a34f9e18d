use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Free-text measurement label to free-text value-with-unit, exactly as the
/// model returned them. No canonical vocabulary.
pub type MedicalValues = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Pdf,
    Docx,
    Image,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Image => "image",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub file_type: FileType,
    pub category: String,
    /// Processing date (`DD/MM/YYYY`), not a date read from the document.
    pub creation_date: String,
    pub num_pages: u32,
    pub file_name: String,
}

/// Patient identity fields. Absent values are `None`, never empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
}

impl PatientInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.date_of_birth.is_none() && self.address.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub metadata: DocumentMetadata,
    pub patient_info: PatientInfo,
    pub extracted_values: MedicalValues,
    pub summary: String,
    pub raw_text: String,
}
