use reqwest::blocking::Client;

use super::{extract_error_message, Translator, AUTO_SOURCE};
use crate::error::{CoreError, Result};

const ENDPOINT: &str = "https://api.mymemory.translated.net/get";
const NAME: &str = "mymemory";

pub struct MyMemoryTranslator {
    client: Client,
    endpoint: String,
}

impl MyMemoryTranslator {
    pub fn new(client: Client) -> Self {
        MyMemoryTranslator {
            client,
            endpoint: ENDPOINT.to_string(),
        }
    }
}

impl Translator for MyMemoryTranslator {
    fn name(&self) -> &str {
        NAME
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let langpair = lang_pair(source_lang, target_lang);

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()?;

        let status = resp.status();
        let body = resp.text()?;

        if !status.is_success() {
            return Err(CoreError::backend(NAME, extract_error_message(status, &body)));
        }

        parse_response(&body)
    }
}

fn lang_pair(source_lang: &str, target_lang: &str) -> String {
    let source = if source_lang == AUTO_SOURCE {
        "Autodetect"
    } else {
        source_lang
    };
    format!("{source}|{target_lang}")
}

/// Quota and validation problems arrive with HTTP 200 and a non-200
/// `responseStatus`.
fn parse_response(body: &str) -> Result<String> {
    let v: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| CoreError::backend(NAME, "invalid JSON in response"))?;

    let status = v
        .get("responseStatus")
        .and_then(|s| s.as_u64().or_else(|| s.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(200);

    if status != 200 {
        let details = v
            .get("responseDetails")
            .and_then(|d| d.as_str())
            .unwrap_or("request rejected");
        return Err(CoreError::backend(NAME, format!("status {status}: {details}")));
    }

    v.get("responseData")
        .and_then(|d| d.get("translatedText"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::backend(NAME, "missing responseData.translatedText"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_source_maps_to_autodetect() {
        assert_eq!(lang_pair("auto", "ru"), "Autodetect|ru");
        assert_eq!(lang_pair("en", "ru"), "en|ru");
    }

    #[test]
    fn reads_translated_text() {
        let body = r#"{"responseData":{"translatedText":"Щит","match":1},"responseStatus":200}"#;
        assert_eq!(parse_response(body).unwrap(), "Щит");
    }

    #[test]
    fn quota_errors_are_failures() {
        let body = r#"{"responseData":{"translatedText":"MYMEMORY WARNING"},"responseStatus":"429","responseDetails":"daily limit"}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("daily limit"));
    }
}
