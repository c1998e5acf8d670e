use reqwest::blocking::Client;

use super::{extract_error_message, Translator};
use crate::error::{CoreError, Result};

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const NAME: &str = "google";

/// Keyless web endpoint used by the public translate widget.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(client: Client) -> Self {
        GoogleTranslator {
            client,
            endpoint: ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        GoogleTranslator {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        NAME
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;

        let status = resp.status();
        let body = resp.text()?;

        if !status.is_success() {
            return Err(CoreError::backend(NAME, extract_error_message(status, &body)));
        }

        parse_response(&body)
    }
}

/// The body is `[[["translated", "source", ...], ...], ...]`; long input
/// comes back split into several sentence chunks.
fn parse_response(body: &str) -> Result<String> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| CoreError::backend(NAME, "invalid JSON in response"))?;

    let chunks = v
        .get(0)
        .and_then(|c| c.as_array())
        .ok_or_else(|| CoreError::backend(NAME, "response has no sentence list"))?;

    let out: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(|t| t.as_str()))
        .collect();

    if out.trim().is_empty() {
        return Err(CoreError::backend(NAME, "empty translation"));
    }

    Ok(out)
}
