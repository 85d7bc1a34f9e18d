//! Localized prompt templates for the four extraction operations.
//!
//! Every template has an English and a French variant selected by the detected
//! document [`Language`]. Templates use plain `format!()` interpolation, the
//! caller is responsible for truncating `text` beforehand.

use crate::processing::Language;

/// A system instruction paired with its user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
}

const CATEGORIES_EN: &[&str] = &[
    "Lab Report",
    "Prescription",
    "Medical Record",
    "Imaging Report",
    "Consultation Note",
    "Other",
];

const CATEGORIES_FR: &[&str] = &[
    "Rapport de Laboratoire",
    "Ordonnance",
    "Dossier Médical",
    "Rapport d'Imagerie",
    "Note de Consultation",
    "Autre",
];

/// The fixed candidate labels, in prompt order. The last one is the default.
pub fn categories(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => CATEGORIES_EN,
        Language::French => CATEGORIES_FR,
    }
}

/// "Other" / "Autre".
pub fn default_category(language: Language) -> &'static str {
    match language {
        Language::English => "Other",
        Language::French => "Autre",
    }
}

/// Stands in for the summary when generation fails.
pub fn summary_failure_message(language: Language) -> &'static str {
    match language {
        Language::English => "Summary generation failed.",
        Language::French => "Échec de la génération du résumé.",
    }
}

/// Strict-JSON request for `name`, `date_of_birth` and `address`.
///
/// # Example
/// ```
/// use aida::extraction::prompts::patient_info_prompt;
/// use aida::processing::Language;
///
/// let prompt = patient_info_prompt("Patient: Jane Roe", Language::English);
/// assert!(prompt.user.contains("Jane Roe"));
/// assert!(prompt.user.contains("date_of_birth"));
/// ```
pub fn patient_info_prompt(text: &str, language: Language) -> Prompt {
    match language {
        Language::English => Prompt {
            system: "Extract patient info. Return only JSON.",
            user: format!(
                r#"Extract patient info from this medical document as JSON:
{{
    "name": "full name or null",
    "date_of_birth": "DD/MM/YYYY or null",
    "address": "full address or null"
}}

Text: {text}"#
            ),
        },
        Language::French => Prompt {
            system: "Extraire les informations du patient. Retourner uniquement du JSON.",
            user: format!(
                r#"Extraire les informations du patient de ce document médical en tant que JSON:
{{
    "name": "nom complet ou null",
    "date_of_birth": "date au format JJ/MM/AAAA ou null",
    "address": "adresse complète ou null"
}}

Texte: {text}"#
            ),
        },
    }
}

/// Strict-JSON request for a flat label to value-with-unit object.
pub fn medical_values_prompt(text: &str, language: Language) -> Prompt {
    match language {
        Language::English => Prompt {
            system: "Extract medical values. Return only JSON.",
            user: format!(
                r#"Extract medical measurements as a flat JSON object (with units):
Example: {{"Blood Pressure": "120/80 mmHg", "Heart Rate": "75 bpm"}}

Text: {text}"#
            ),
        },
        Language::French => Prompt {
            system: "Extraire les valeurs médicales. Retourner uniquement du JSON.",
            user: format!(
                r#"Extraire les mesures médicales en tant qu'objet JSON plat (avec unités):
Exemple: {{"Tension artérielle": "120/80 mmHg", "Fréquence cardiaque": "75 bpm"}}

Texte: {text}"#
            ),
        },
    }
}

/// Free-text request for exactly one label from [`categories`].
pub fn category_prompt(text: &str, language: Language) -> Prompt {
    let choices = categories(language)
        .iter()
        .map(|category| format!("- {category}"))
        .collect::<Vec<_>>()
        .join("\n");

    match language {
        Language::English => Prompt {
            system: "Categorize document.",
            user: format!(
                "Categorize this document. Choose ONE:\n{choices}\n\nReturn only category name.\nText: {text}"
            ),
        },
        Language::French => Prompt {
            system: "Catégoriser le document.",
            user: format!(
                "Catégoriser ce document. Choisir UNE catégorie:\n{choices}\n\nRetourner uniquement le nom de la catégorie.\nTexte: {text}"
            ),
        },
    }
}

pub fn summary_prompt(text: &str, language: Language, max_sentences: u32) -> Prompt {
    match language {
        Language::English => Prompt {
            system: "Summarize medical documents concisely.",
            user: format!(
                r#"You are a medical document summarization assistant.
Your task is to carefully read clinical/medical documents and generate a summary
in {max_sentences} sentences.

Guidelines:
- Focus strictly on key findings, diagnoses, and clinically relevant details.
- Write in clear, descriptive paragraphs (not overly short), using professional
medical language.
- Avoid unnecessary administrative details, repetitions, or irrelevant commentary.
- Ensure accuracy, conciseness, and a style similar to a physician's chart note
or discharge summary.

Text: {text}"#
            ),
        },
        Language::French => Prompt {
            system: "Résumer les documents médicaux de manière concise.",
            user: format!(
                r#"Vous êtes un assistant spécialisé dans la synthèse de documents médicaux.
Votre tâche est de lire attentivement les documents cliniques/médicaux et de
générer un résumé en {max_sentences} phrases.

Directives :
- Concentrez-vous strictement sur les constatations clés, les diagnostics et les
informations cliniquement pertinentes.
- Rédigez sous forme de paragraphes descriptifs complets (pas de phrases trop
courtes ni de listes simplifiées).
- Évitez les détails administratifs, les répétitions ou les informations
non pertinentes.
- Assurez l'exactitude, la clarté et un style professionnel semblable à celui
d'un compte rendu médical ou d'un résumé de sortie hospitalière.

Texte: {text}"#
            ),
        },
    }
}
