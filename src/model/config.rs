use serde::{Deserialize, Serialize};

fn default_source_lang() -> String {
    "en".to_string()
}

fn default_target_lang() -> String {
    "ru".to_string()
}

fn default_target_locale() -> String {
    "ru-RU".to_string()
}

fn default_default_locale() -> String {
    "en-US".to_string()
}

fn default_pacing_ms() -> u64 {
    200
}

fn default_output_suffix() -> String {
    "_rus".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub mods_path: String,

    #[serde(default = "default_source_lang", alias = "source_language")]
    pub source_lang: String,

    #[serde(default = "default_target_lang", alias = "target_language")]
    pub target_lang: String,

    /// Directory name of the target locale under `Server/Languages`.
    #[serde(default = "default_target_locale")]
    pub target_locale: String,

    #[serde(default = "default_default_locale")]
    pub default_locale: String,

    /// Delay between two backend calls.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default)]
    pub lang_spaced_separator: bool,

    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    #[serde(default)]
    pub backup_before_pack: bool,

    #[serde(default)]
    pub cleanup_after_pack: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mods_path: String::new(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            target_locale: default_target_locale(),
            default_locale: default_default_locale(),
            pacing_ms: default_pacing_ms(),
            lang_spaced_separator: false,
            output_suffix: default_output_suffix(),
            backup_before_pack: false,
            cleanup_after_pack: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"mods_path": "/games/mods"}"#).unwrap();
        assert_eq!(cfg.mods_path, "/games/mods");
        assert_eq!(cfg.target_locale, "ru-RU");
        assert_eq!(cfg.pacing_ms, 200);
    }

    #[test]
    fn legacy_language_aliases_are_accepted() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"source_language": "auto", "target_language": "uk"}"#)
                .unwrap();
        assert_eq!(cfg.source_lang, "auto");
        assert_eq!(cfg.target_lang, "uk");
    }
}
