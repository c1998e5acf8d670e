use super::hash;
use super::model::TmEntry;

/// Exact source match for one target language. Whitespace and case are
/// significant: a memory hit must be safe to reuse verbatim.
pub fn exact_match<'a>(entries: &'a [TmEntry], target_lang: &str, original: &str) -> Option<&'a TmEntry> {
    if original.trim().is_empty() {
        return None;
    }

    let h = hash::hash_source(original);

    entries.iter().find(|e| {
        e.target_lang == target_lang
            && e.hash == h
            && e.original == original
            && !e.translation.trim().is_empty()
    })
}
