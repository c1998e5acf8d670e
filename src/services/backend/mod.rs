//! Machine translation providers.
//!
//! Every provider answers one short string at a time. `FallbackTranslator`
//! chains two of them: the primary with the configured source language, the
//! primary with source auto-detection, then the secondary (on a shorter
//! excerpt) under the same two source languages.

pub mod google;
pub mod mock;
pub mod mymemory;

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::{CoreError, Result};

pub use google::GoogleTranslator;
pub use mock::{MockMode, MockTranslator};
pub use mymemory::MyMemoryTranslator;

pub const AUTO_SOURCE: &str = "auto";

const TIMEOUT_SECS: u64 = 30;

/// Longest text the primary provider receives.
pub const PRIMARY_MAX_CHARS: usize = 4500;
/// Longest text the secondary provider receives.
pub const SECONDARY_MAX_CHARS: usize = 500;

pub trait Translator {
    /// Short provider name for logs and error messages.
    fn name(&self) -> &str;

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        (**self).translate(text, source_lang, target_lang)
    }
}

pub struct FallbackTranslator {
    primary: Box<dyn Translator>,
    secondary: Box<dyn Translator>,
}

impl FallbackTranslator {
    pub fn new(primary: Box<dyn Translator>, secondary: Box<dyn Translator>) -> Self {
        FallbackTranslator { primary, secondary }
    }

    /// Google first, MyMemory second.
    pub fn online() -> Result<Self> {
        let client = http_client()?;
        Ok(FallbackTranslator::new(
            Box::new(GoogleTranslator::new(client.clone())),
            Box::new(MyMemoryTranslator::new(client)),
        ))
    }
}

impl Translator for FallbackTranslator {
    fn name(&self) -> &str {
        "fallback"
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        let long = truncate_chars(text, PRIMARY_MAX_CHARS);
        let short = truncate_chars(long, SECONDARY_MAX_CHARS);

        let attempts: [(&dyn Translator, &str, &str); 4] = [
            (self.primary.as_ref(), long, source_lang),
            (self.primary.as_ref(), long, AUTO_SOURCE),
            (self.secondary.as_ref(), short, source_lang),
            (self.secondary.as_ref(), short, AUTO_SOURCE),
        ];

        let mut first_err: Option<CoreError> = None;

        for (n, (provider, input, source)) in attempts.into_iter().enumerate() {
            // Auto-detection is pointless when it was already the source.
            if n % 2 == 1 && source_lang == AUTO_SOURCE {
                continue;
            }

            match provider.translate(input, source, target_lang) {
                Ok(out) if !out.trim().is_empty() => return Ok(out.trim().to_string()),
                Ok(_) => {
                    tracing::debug!("{} returned nothing for {source}->{target_lang}", provider.name());
                }
                Err(e) => {
                    tracing::debug!("{} failed for {source}->{target_lang}: {e}", provider.name());
                    first_err.get_or_insert(e);
                }
            }
        }

        Err(first_err.unwrap_or_else(|| CoreError::backend(self.name(), "no provider produced a translation")))
    }
}

pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()?;
    Ok(client)
}

/// Prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    // Common shapes: { "error": { "message": "..." } } or { "message": "..." }
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
        if let Some(msg) = v
            .get("message")
            .or_else(|| v.get("responseDetails"))
            .and_then(|m| m.as_str())
        {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
    }

    let trimmed = body_text.trim();
    format!("HTTP {}: {}", status.as_u16(), truncate_chars(trimmed, 400))
}
