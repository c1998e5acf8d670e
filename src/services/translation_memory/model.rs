use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TmEntry {
    #[serde(default)]
    pub source_lang: String,
    pub target_lang: String,

    pub original: String,
    pub translation: String,

    /// SHA-256 of `original`, filled in on load when missing.
    #[serde(default)]
    pub hash: String,
}
