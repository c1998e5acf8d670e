use std::sync::OnceLock;

use regex::{Captures, Regex};

/// `Text: "..."` or `@Text = "..."`; the quoted value is never escaped in
/// these files, so a value simply runs to the next quote.
fn text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)(?P<p1>Text:\s*")(?P<v1>[^"]*)(?P<s1>")|(?P<p2>@Text\s*=\s*")(?P<v2>[^"]*)(?P<s2>")"#,
        )
        .expect("ui text pattern compiles")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiString {
    /// Byte offset of the whole match in the file.
    pub offset: usize,
    pub value: String,
}

pub fn extract(content: &str) -> Vec<UiString> {
    text_re()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.name("v1").or_else(|| caps.name("v2"))?;
            Some(UiString {
                offset: whole.start(),
                value: value.as_str().to_string(),
            })
        })
        .collect()
}

/// Replaces quoted values that exactly equal a source in `replacements`.
/// The first pair with a non-empty translation wins.
pub fn apply(content: &str, replacements: &[(String, String)]) -> String {
    if replacements.is_empty() {
        return content.to_string();
    }

    text_re()
        .replace_all(content, |caps: &Captures| {
            let (prefix, value, suffix) = match (caps.name("p1"), caps.name("v1"), caps.name("s1")) {
                (Some(p), Some(v), Some(s)) => (p.as_str(), v.as_str(), s.as_str()),
                _ => (
                    caps.name("p2").map_or("", |m| m.as_str()),
                    caps.name("v2").map_or("", |m| m.as_str()),
                    caps.name("s2").map_or("", |m| m.as_str()),
                ),
            };

            match replacements
                .iter()
                .find(|(src, tr)| src == value && !tr.is_empty())
            {
                Some((_, tr)) => format!("{prefix}{tr}{suffix}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
