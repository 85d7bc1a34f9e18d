use serde::{Deserialize, Serialize};

/// The two languages prompts are written in. English is the primary language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::French => "fr",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Common French function words.
const FRENCH_MARKERS: &[&str] = &[
    "le", "la", "les", "du", "de", "à", "est", "et", "un", "une", "des",
];

/// More distinct markers than this classifies the text as French.
const FRENCH_THRESHOLD: usize = 3;

/// Number of distinct French marker words that appear with a space on both
/// sides. A marker repeated many times still counts once.
pub fn french_marker_count(text: &str) -> usize {
    let lowered = text.to_lowercase();
    FRENCH_MARKERS
        .iter()
        .filter(|marker| lowered.contains(&format!(" {marker} ")))
        .count()
}

/// Pick the prompting language for a document. Pure function of the text.
pub fn detect_language(text: &str) -> Language {
    if french_marker_count(text) > FRENCH_THRESHOLD {
        Language::French
    } else {
        Language::English
    }
}
