//! Decides whether a collected string is prose worth translating.
//!
//! Skipping real prose is cheaper than corrupting a template, so every rule
//! errs on the side of "not eligible".

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

fn interpolation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[a-zA-Z_%]").expect("interpolation pattern compiles"))
}

fn partial_placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_\s*\}|\{\s*_").expect("placeholder pattern compiles"))
}

pub fn is_eligible(text: &str) -> bool {
    skip_reason(text).is_none()
}

/// First rule that rejects `text`, if any.
pub fn skip_reason(text: &str) -> Option<SkipReason> {
    let s = text.trim();

    if s.is_empty() {
        return Some(SkipReason::Blank);
    }
    if s.contains('{') && s.contains('}') && interpolation_re().is_match(s) {
        return Some(SkipReason::Interpolation);
    }
    if s.contains("%s") || s.contains("%d") || s.contains("%(") {
        return Some(SkipReason::PrintfPlaceholder);
    }
    if partial_placeholder_re().is_match(s) {
        return Some(SkipReason::PartialPlaceholder);
    }
    if s.chars().all(|c| c == '_' || c == ' ' || c == '\n') {
        return Some(SkipReason::OnlySeparators);
    }

    let single_word = !s.contains(' ') && !s.contains('\n');

    if single_word && s.contains('_') && s.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Some(SkipReason::Identifier);
    }
    if single_word && s.chars().count() >= 2 && s.chars().all(char::is_alphabetic) && is_repetition(s)
    {
        return Some(SkipReason::RepeatedWord);
    }

    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Blank,
    Interpolation,
    PrintfPlaceholder,
    PartialPlaceholder,
    OnlySeparators,
    Identifier,
    RepeatedWord,
}

/// `AliveAlive`, `abab`, `xx`: the whole string is a shorter unit repeated.
fn is_repetition(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    (1..=len / 2)
        .filter(|n| len % n == 0)
        .any(|n| chars.chunks(n).all(|chunk| chunk == &chars[..n]))
}

/// Dotted identifiers such as `items.Iron_Sword.name` that show up where a
/// value is expected.
pub fn is_translation_key(text: &str) -> bool {
    let s = text.trim();
    if s.is_empty() || s.contains(' ') {
        return false;
    }

    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() < 2 {
        return false;
    }

    parts.iter().all(|p| {
        !p.is_empty()
            && p.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
            && p.chars().any(char::is_alphanumeric)
    })
}

/// Shared gate for everything but synthesized locale entries.
pub fn should_collect(text: &str) -> bool {
    !is_translation_key(text) && is_eligible(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prose_is_eligible() {
        assert!(is_eligible("Alive"));
        assert!(is_eligible("Test Sword"));
        assert!(is_eligible("A sharp blade.\nHandle with care"));
        assert!(is_eligible(r#"Defeats <color is="red">Alive</color>"#));
        assert!(is_eligible("Железный меч"));
    }

    #[test]
    fn rules_fire_in_order() {
        assert_eq!(skip_reason("   "), Some(SkipReason::Blank));
        assert_eq!(skip_reason("A {weapon} sword"), Some(SkipReason::Interpolation));
        assert_eq!(skip_reason("Deals {%0} damage"), Some(SkipReason::Interpolation));
        assert_eq!(skip_reason("Found %d coins"), Some(SkipReason::PrintfPlaceholder));
        assert_eq!(skip_reason("Hello %(name)s"), Some(SkipReason::PrintfPlaceholder));
        assert_eq!(skip_reason("value_ }"), Some(SkipReason::PartialPlaceholder));
        assert_eq!(skip_reason("{ _x"), Some(SkipReason::PartialPlaceholder));
        assert_eq!(skip_reason("__ _"), Some(SkipReason::OnlySeparators));
        assert_eq!(skip_reason("Item_Name_ID"), Some(SkipReason::Identifier));
        assert_eq!(skip_reason("AliveAlive"), Some(SkipReason::RepeatedWord));
    }

    #[test]
    fn braces_without_identifier_are_prose() {
        assert!(is_eligible("Use { and } carefully"));
        assert!(is_eligible("{1} apples"));
    }

    #[test]
    fn repetition_heuristic() {
        assert!(!is_eligible("TestTest"));
        assert!(!is_eligible("abab"));
        assert!(!is_eligible("oo"));
        assert!(is_eligible("Abc"));
        // Known limitation: short reduplicated words are rejected too.
        assert!(!is_eligible("bonbon"));
    }

    #[test]
    fn decision_is_stable() {
        for s in ["Alive", "AliveAlive", "x_y", "Hello world"] {
            assert_eq!(is_eligible(s), is_eligible(s));
        }
    }

    #[test]
    fn dotted_keys() {
        assert!(is_translation_key("items.Iron_Sword.name"));
        assert!(is_translation_key(" ui.main-menu.title "));
        assert!(!is_translation_key("Hello. World"));
        assert!(!is_translation_key("single"));
        assert!(!is_translation_key("end."));
        assert!(!is_translation_key("v1.2!"));
        assert!(!should_collect("server.items.Sword.name"));
        assert!(should_collect("Sword"));
    }
}
