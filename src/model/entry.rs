use serde::{Deserialize, Serialize};

/// Which kind of file an entry was collected from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    #[serde(rename = "manifest")]
    Manifest,
    #[serde(rename = "lang")]
    LocaleFile,
    #[serde(rename = "ui")]
    UiDescriptor,
    #[serde(rename = "common_json")]
    NestedTranslationJson,
    #[serde(rename = "json")]
    GenericJson,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TextEntry {
    #[serde(rename = "type")]
    pub format: SourceFormat,

    pub file_rel: String,

    pub key: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub translated: Option<String>,
}

impl TextEntry {
    pub fn new(
        format: SourceFormat,
        file_rel: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        TextEntry {
            format,
            file_rel: file_rel.into(),
            key: key.into(),
            source: source.into(),
            translated: None,
        }
    }

    pub fn with_translation(mut self, translated: Option<String>) -> Self {
        self.translated = translated.filter(|t| !t.trim().is_empty());
        self
    }

    /// Trimmed translation, `None` when nothing usable was entered.
    pub fn translation(&self) -> Option<&str> {
        self.translated
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_translated(&self) -> bool {
        self.translation().is_some()
    }
}
