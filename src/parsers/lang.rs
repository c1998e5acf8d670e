use std::collections::BTreeMap;

/// Locale file content, keys kept sorted for serialization.
pub type LangMap = BTreeMap<String, String>;

pub fn parse(text: &str) -> LangMap {
    let mut out = LangMap::new();

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            out.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    out
}

pub fn serialize(entries: &LangMap, spaced: bool) -> String {
    let sep = if spaced { " = " } else { "=" };

    entries
        .iter()
        .map(|(k, v)| format!("{k}{sep}{v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

const BENCH_LOWER: &str = "benchcategories.";
const BENCH_CAMEL: &str = "benchCategories.";

/// Other spelling of a key whose category prefix exists in two casings
/// across game versions; other keys map to themselves.
pub fn case_variant(key: &str) -> String {
    if !key.to_lowercase().contains(BENCH_LOWER) {
        return key.to_string();
    }
    if key.contains(BENCH_LOWER) {
        key.replacen(BENCH_LOWER, BENCH_CAMEL, 1)
    } else {
        key.replacen(BENCH_CAMEL, BENCH_LOWER, 1)
    }
}

/// Adds the other spelling of every aliased key that lacks one.
/// Returns whether anything was added.
pub fn add_case_aliases(entries: &mut LangMap) -> bool {
    let missing: Vec<(String, String)> = entries
        .iter()
        .filter_map(|(k, v)| {
            let alt = case_variant(k);
            (alt != *k && !entries.contains_key(&alt)).then(|| (alt, v.clone()))
        })
        .collect();

    let added = !missing.is_empty();
    for (k, v) in missing {
        entries.entry(k).or_insert(v);
    }
    added
}

/// Readable fallback name for a key nobody provided text for:
/// `items.Ingredient_Voidheart.name` becomes `Ingredient Voidheart`.
pub fn default_display_name(key: &str) -> String {
    let base = key.replace(".name", "").replace(".description", "");
    let last = base.rsplit('.').next().unwrap_or(key);
    let name = last.replace('_', " ");
    let name = name.trim();

    if name.is_empty() {
        return key.to_string();
    }

    let titled = title_case(name);
    if key.contains(".description") {
        format!("Description: {titled}")
    } else {
        titled
    }
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}
