//! Translation of tagged text: only literal spans reach the translator,
//! markup is put back exactly where it was.

use crate::error::{CoreError, Result};
use crate::services::tokenizer::{self, Segment};

#[derive(Debug, Default)]
pub struct SmartOutcome {
    /// `None` only when nothing could be produced at all.
    pub text: Option<String>,
    /// First failure among the translated pieces.
    pub error: Option<CoreError>,
}

impl SmartOutcome {
    pub fn from_result(res: Result<String>) -> Self {
        match res {
            Ok(t) if !t.trim().is_empty() => SmartOutcome {
                text: Some(t),
                error: None,
            },
            Ok(_) => SmartOutcome::default(),
            Err(e) => SmartOutcome {
                text: None,
                error: Some(e),
            },
        }
    }
}

pub fn smart_translate<F>(text: &str, mut translate_one: F) -> SmartOutcome
where
    F: FnMut(&str) -> Result<String>,
{
    if text.trim().is_empty() {
        return SmartOutcome::default();
    }

    let segments = tokenizer::tokenize(text);

    if !segments.iter().any(|s| s.is_markup) {
        return SmartOutcome::from_result(translate_one(text));
    }

    if !segments.iter().any(Segment::has_words) {
        return SmartOutcome {
            text: Some(text.to_string()),
            error: None,
        };
    }

    let mut first_error: Option<CoreError> = None;
    let mut out = String::with_capacity(text.len() * 2);

    for seg in &segments {
        if !seg.has_words() {
            out.push_str(&seg.content);
            continue;
        }

        let core = seg.content.trim();
        match translate_one(core) {
            Ok(tr) if !tr.trim().is_empty() => {
                let (leading, trailing) = surrounding_whitespace(&seg.content);
                out.push_str(leading);
                out.push_str(&tr);
                out.push_str(trailing);
            }
            Ok(_) => out.push_str(&seg.content),
            Err(e) => {
                first_error.get_or_insert(e);
                out.push_str(&seg.content);
            }
        }
    }

    SmartOutcome {
        text: Some(out),
        error: first_error,
    }
}

fn surrounding_whitespace(s: &str) -> (&str, &str) {
    let start = s.len() - s.trim_start().len();
    let end = s.trim_end().len();
    (&s[..start], &s[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tokenizer::markup_of;
    use pretty_assertions::assert_eq;

    fn upper(s: &str) -> Result<String> {
        Ok(s.to_uppercase())
    }

    #[test]
    fn plain_text_goes_through_whole() {
        let mut seen = Vec::new();
        let out = smart_translate("Iron sword", |s| {
            seen.push(s.to_string());
            Ok("Железный меч".to_string())
        });
        assert_eq!(out.text.as_deref(), Some("Железный меч"));
        assert_eq!(seen, vec!["Iron sword"]);
    }

    #[test]
    fn only_literals_are_sent_and_spacing_is_kept() {
        let text = r#"Defeats <color is="red">Alive</color> in \n battle"#;
        let mut seen = Vec::new();
        let out = smart_translate(text, |s| {
            seen.push(s.to_string());
            upper(s)
        });

        assert_eq!(seen, vec!["Defeats", "Alive", "in", "battle"]);
        assert_eq!(
            out.text.as_deref(),
            Some(r#"DEFEATS <color is="red">ALIVE</color> IN \n BATTLE"#)
        );
        assert!(out.error.is_none());
    }

    #[test]
    fn markup_survives_in_order() {
        let text = r#"<item is="Ore"/> x [NEW]\nMined <b>deep</b>"#;
        let out = smart_translate(text, |_| Ok("zz".to_string()));
        let translated = out.text.unwrap();
        assert_eq!(markup_of(&translated), markup_of(text));
    }

    #[test]
    fn markup_only_is_returned_unchanged() {
        let mut called = false;
        let out = smart_translate("<br> [TMP] ", |s| {
            called = true;
            upper(s)
        });
        assert_eq!(out.text.as_deref(), Some("<br> [TMP] "));
        assert!(!called);
    }

    #[test]
    fn blank_text_yields_nothing() {
        let out = smart_translate("  ", upper);
        assert!(out.text.is_none());
        assert!(out.error.is_none());
    }

    #[test]
    fn partial_failure_keeps_successful_segments() {
        let text = "<b>one</b> two";
        let out = smart_translate(text, |s| {
            if s == "two" {
                Err(CoreError::backend("test", "quota exceeded"))
            } else {
                upper(s)
            }
        });
        assert_eq!(out.text.as_deref(), Some("<b>ONE</b> two"));
        assert!(out.error.unwrap().to_string().contains("quota exceeded"));
    }

    #[test]
    fn first_error_wins() {
        let mut n = 0;
        let out = smart_translate("a<b>b</b>c", |_| {
            n += 1;
            Err(CoreError::backend("test", format!("fail {n}")))
        });
        assert_eq!(out.text.as_deref(), Some("a<b>b</b>c"));
        assert_eq!(out.error.unwrap().to_string(), "test: fail 1");
    }

    #[test]
    fn whole_text_failure_is_reported() {
        let out = smart_translate("hello", |_| Err(CoreError::backend("test", "offline")));
        assert!(out.text.is_none());
        assert!(out.error.is_some());
    }
}
