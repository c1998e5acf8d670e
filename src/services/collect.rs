//! Builds the catalogue of translatable strings for one extracted package.
//!
//! Five scans run in a fixed order: manifest, locale files (plus keys
//! referenced from server JSON), structured translation JSON, UI
//! descriptors, generic JSON. Each scan is tolerant: a file that cannot be
//! read or parsed is logged and contributes nothing.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::Result;
use crate::model::config::AppConfig;
use crate::model::entry::{SourceFormat, TextEntry};
use crate::parsers::{json_path, lang, ui};
use crate::services::{encoding, filter};

pub const MANIFEST_NAMES: [&str; 2] = ["manifest.json", "pack.json"];

/// Field names whose string values are treated as display text in generic JSON.
pub const JSON_TEXT_KEYS: [&str; 12] = [
    "name",
    "description",
    "title",
    "text",
    "displayname",
    "message",
    "lore",
    "display_name",
    "desc",
    "label",
    "hint",
    "placeholder",
];

const LANGUAGES_DIR: &str = "Languages";
const TRANSLATIONS_DIR: &str = "Translations";
const SERVER_KEY_PREFIX: &str = "server.";

/// Where target-language files live, shared by collection and write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleLayout {
    /// `ru-RU`: locale directory under `Server/Languages`.
    pub target_locale: String,
    /// `en-US`: preferred source locale directory.
    pub default_locale: String,
    /// `ru_RU.json`: target file under `Common/Translations`.
    pub target_json: String,
    /// `ru`: structured JSON files starting with this are targets, not sources.
    pub target_prefix: String,
}

impl LocaleLayout {
    pub fn new(target_locale: &str, default_locale: &str) -> Self {
        let target_prefix = target_locale
            .split(['-', '_'])
            .next()
            .unwrap_or(target_locale)
            .to_lowercase();

        LocaleLayout {
            target_locale: target_locale.to_string(),
            default_locale: default_locale.to_string(),
            target_json: format!("{}.json", target_locale.replace('-', "_")),
            target_prefix,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        LocaleLayout::new(&cfg.target_locale, &cfg.default_locale)
    }

    /// Path of the target-locale counterpart of a locale file:
    /// `Server/Languages/en-US/x.lang` becomes `Server/Languages/ru-RU/x.lang`.
    pub fn target_lang_rel(&self, rel: &str) -> String {
        with_locale(rel, &self.target_locale)
    }

    /// Source locale actually used by a `Languages` directory: the default
    /// locale when present, else the first other locale in name order.
    pub fn source_locale(&self, languages_dir: &Path) -> Option<String> {
        let locales = locale_dirs(languages_dir);
        if locales.iter().any(|l| *l == self.default_locale) {
            return Some(self.default_locale.clone());
        }
        locales.into_iter().find(|l| *l != self.target_locale)
    }
}

impl Default for LocaleLayout {
    fn default() -> Self {
        LocaleLayout::from_config(&AppConfig::default())
    }
}

/// Replaces the path component following `Languages` with `locale`. Paths
/// without such a component have their parent directory replaced.
pub fn with_locale(rel: &str, locale: &str) -> String {
    let mut parts: Vec<&str> = rel.split('/').collect();
    if parts.len() < 2 {
        return rel.to_string();
    }

    // The locale directory must be followed by the file name.
    let idx = match parts.iter().position(|p| *p == LANGUAGES_DIR) {
        Some(i) if i + 2 < parts.len() => i + 1,
        _ => parts.len() - 2,
    };

    parts[idx] = locale;
    parts.join("/")
}

pub fn collect(root: &Path, layout: &LocaleLayout) -> Vec<TextEntry> {
    let mut out = Vec::new();

    let manifest_rel = collect_manifest(root, &mut out);
    collect_locale_files(root, layout, &mut out);
    collect_translation_json(root, layout, &mut out);
    collect_ui(root, &mut out);
    collect_generic_json(root, manifest_rel.as_deref(), &mut out);

    tracing::debug!("collected {} entries from {}", out.len(), root.display());
    out
}

// --- manifest ---

/// Returns the relative path of the manifest that was consumed, if any.
fn collect_manifest(root: &Path, out: &mut Vec<TextEntry>) -> Option<String> {
    let path = MANIFEST_NAMES
        .iter()
        .map(|n| root.join(n))
        .find(|p| p.is_file())?;
    let rel = rel_path(root, &path);

    let data = match read_json(&path) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("skipping manifest {rel}: {e}");
            return Some(rel);
        }
    };

    let mut push = |key: String, value: Option<&Value>| {
        if let Some(s) = value.and_then(Value::as_str) {
            if filter::should_collect(s) {
                out.push(TextEntry::new(SourceFormat::Manifest, rel.clone(), key, s));
            }
        }
    };

    push("Name".to_string(), data.get("Name"));
    push("Description".to_string(), data.get("Description"));

    if let Some(authors) = data.get("Authors").and_then(Value::as_array) {
        for (i, author) in authors.iter().enumerate() {
            push(format!("Authors[{i}].Name"), author.get("Name"));
        }
    }

    Some(rel)
}

// --- locale files ---

fn collect_locale_files(root: &Path, layout: &LocaleLayout, out: &mut Vec<TextEntry>) {
    let lang_root = root.join("Server").join(LANGUAGES_DIR);
    if !lang_root.is_dir() {
        return;
    }

    let target_dir = lang_root.join(&layout.target_locale);
    let target_files: BTreeMap<String, lang::LangMap> = lang_files(&target_dir)
        .into_iter()
        .filter_map(|p| {
            let name = p.file_name()?.to_string_lossy().into_owned();
            Some((name, read_lang(root, &p)?))
        })
        .collect();

    let Some(source_locale) = layout.source_locale(&lang_root) else {
        return;
    };

    // Source locale first, then the remaining ones by name.
    let mut locales = vec![source_locale.clone()];
    locales.extend(
        locale_dirs(&lang_root)
            .into_iter()
            .filter(|l| *l != source_locale && *l != layout.target_locale),
    );

    let mut seen: HashSet<(String, String)> = HashSet::new();

    for locale in &locales {
        for path in lang_files(&lang_root.join(locale)) {
            let Some(entries) = read_lang(root, &path) else {
                continue;
            };
            let rel = rel_path(root, &path);
            let target_rel = layout.target_lang_rel(&rel);
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let existing = target_files.get(&file_name);

            for (key, value) in entries {
                if !filter::should_collect(&value) {
                    continue;
                }
                if !seen.insert((target_rel.clone(), key.clone())) {
                    continue;
                }
                let translated = existing.and_then(|m| m.get(&key)).cloned();
                out.push(
                    TextEntry::new(SourceFormat::LocaleFile, rel.clone(), key, value)
                        .with_translation(translated),
                );
            }
        }
    }

    collect_server_keys(root, layout, &lang_root, &source_locale, &target_files, &seen, out);
}

/// Keys referenced as `"server.<key>"` from server JSON that the source
/// locale does not define yet. They are attached to the first source
/// locale file so the writer can backfill them.
fn collect_server_keys(
    root: &Path,
    layout: &LocaleLayout,
    lang_root: &Path,
    source_locale: &str,
    target_files: &BTreeMap<String, lang::LangMap>,
    seen: &HashSet<(String, String)>,
    out: &mut Vec<TextEntry>,
) {
    let source_files = lang_files(&lang_root.join(source_locale));
    let Some(first) = source_files.first() else {
        return;
    };
    let default_rel = rel_path(root, first);
    let default_target_rel = layout.target_lang_rel(&default_rel);

    let mut known = lang::LangMap::new();
    for path in &source_files {
        if let Some(entries) = read_lang(root, path) {
            for (k, v) in entries {
                known.entry(k).or_insert(v);
            }
        }
    }

    let lookup = |map: &lang::LangMap, key: &str| -> Option<String> {
        map.get(key)
            .or_else(|| map.get(&lang::case_variant(key)))
            .cloned()
    };
    let translated_for = |key: &str| -> Option<String> {
        target_files
            .values()
            .find_map(|m| m.get(key).cloned())
            .or_else(|| {
                let alt = lang::case_variant(key);
                target_files.values().find_map(|m| m.get(&alt).cloned())
            })
    };

    let mut added: HashSet<String> = HashSet::new();

    for path in files_with_ext(root, "json") {
        if in_locale_dirs(root, &path) {
            continue;
        }
        let data = match read_json(&path) {
            Ok(v) => v,
            Err(_) => continue,
        };

        for key in server_keys(&data) {
            if seen.contains(&(default_target_rel.clone(), key.clone())) || !added.insert(key.clone()) {
                continue;
            }

            let source = lookup(&known, &key).unwrap_or_else(|| lang::default_display_name(&key));
            if !filter::is_eligible(&source) {
                continue;
            }

            let translated = translated_for(&key);
            out.push(
                TextEntry::new(SourceFormat::LocaleFile, default_rel.clone(), key, source)
                    .with_translation(translated),
            );
        }
    }
}

/// Every object value of the form `server.<key>`, prefix stripped.
fn server_keys(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    walk_server_keys(value, &mut out);
    out
}

fn walk_server_keys(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for v in map.values() {
                match v {
                    Value::String(s) => {
                        if let Some(key) = s.strip_prefix(SERVER_KEY_PREFIX) {
                            out.push(key.to_string());
                        }
                    }
                    other => walk_server_keys(other, out),
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| walk_server_keys(v, out)),
        _ => {}
    }
}

// --- Common/Translations ---

fn collect_translation_json(root: &Path, layout: &LocaleLayout, out: &mut Vec<TextEntry>) {
    let dir = root.join("Common").join(TRANSLATIONS_DIR);
    if !dir.is_dir() {
        return;
    }

    for path in files_in(&dir, "json") {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.starts_with(&layout.target_prefix) {
            continue;
        }

        let rel = rel_path(root, &path);
        let data = match read_json(&path) {
            Ok(Value::Object(map)) => map,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("skipping {rel}: {e}");
                continue;
            }
        };

        let target_path = dir.join(&layout.target_json);
        let existing = if target_path.is_file() {
            read_json(&target_path).unwrap_or_else(|e| {
                tracing::warn!("ignoring unreadable {}: {e}", layout.target_json);
                Value::Null
            })
        } else {
            Value::Null
        };

        for (k, v) in &data {
            match v {
                Value::String(s) if filter::should_collect(s) => {
                    let translated = existing.get(k).and_then(Value::as_str).map(str::to_string);
                    out.push(
                        TextEntry::new(SourceFormat::NestedTranslationJson, rel.clone(), k.clone(), s.clone())
                            .with_translation(translated),
                    );
                }
                Value::Object(inner) => {
                    let existing_inner = existing.get(k).filter(|e| e.is_object());
                    for (k2, v2) in inner {
                        let Some(s) = v2.as_str() else { continue };
                        if !filter::should_collect(s) {
                            continue;
                        }
                        let translated = existing_inner
                            .and_then(|e| e.get(k2))
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        out.push(
                            TextEntry::new(
                                SourceFormat::NestedTranslationJson,
                                rel.clone(),
                                format!("{k}.{k2}"),
                                s,
                            )
                            .with_translation(translated),
                        );
                    }
                }
                _ => {}
            }
        }
    }
}

// --- UI descriptors ---

fn collect_ui(root: &Path, out: &mut Vec<TextEntry>) {
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for path in files_with_ext(root, "ui") {
        let rel = rel_path(root, &path);
        let content = match encoding::read_text(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("skipping {rel}: {e}");
                continue;
            }
        };

        for found in ui::extract(&content) {
            if !filter::should_collect(&found.value) {
                continue;
            }
            if !seen.insert((rel.clone(), found.value.clone())) {
                continue;
            }
            out.push(TextEntry::new(
                SourceFormat::UiDescriptor,
                rel.clone(),
                found.offset.to_string(),
                found.value,
            ));
        }
    }
}

// --- generic JSON ---

fn collect_generic_json(root: &Path, manifest_rel: Option<&str>, out: &mut Vec<TextEntry>) {
    for path in files_with_ext(root, "json") {
        if in_locale_dirs(root, &path) {
            continue;
        }
        let rel = rel_path(root, &path);
        if Some(rel.as_str()) == manifest_rel {
            continue;
        }

        let data = match read_json(&path) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("skipping {rel}: {e}");
                continue;
            }
        };

        for (at, value) in json_path::find_text_fields(&data, &JSON_TEXT_KEYS) {
            if filter::should_collect(value) {
                out.push(TextEntry::new(
                    SourceFormat::GenericJson,
                    rel.clone(),
                    at.to_string(),
                    value,
                ));
            }
        }
    }
}

// --- tree helpers ---

/// Forward-slash path of `path` relative to `root`.
pub fn rel_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn read_json(path: &Path) -> Result<Value> {
    let text = encoding::read_text(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn read_lang(root: &Path, path: &Path) -> Option<lang::LangMap> {
    match encoding::read_text(path) {
        Ok(text) => Some(lang::parse(&text)),
        Err(e) => {
            tracing::warn!("skipping {}: {e}", rel_path(root, path));
            None
        }
    }
}

/// Whether a file sits under a `Languages` or `Translations` directory.
fn in_locale_dirs(root: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.parent().is_some_and(|dir| {
        dir.components().any(|c| {
            let c = c.as_os_str();
            c == LANGUAGES_DIR || c == TRANSLATIONS_DIR
        })
    })
}

/// Every file below `root` with extension `ext`, in name order.
pub fn files_with_ext(root: &Path, ext: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("walk error under {}: {err}", root.display());
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_ext(e.path(), ext))
        .map(|e| e.into_path())
        .collect()
}

/// Files directly inside `dir` with extension `ext`, in name order.
fn files_in(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = read
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_ext(p, ext))
        .collect();
    files.sort();
    files
}

fn lang_files(dir: &Path) -> Vec<PathBuf> {
    files_in(dir, "lang")
}

/// Sorted names of the locale directories under `Languages`.
fn locale_dirs(languages_dir: &Path) -> Vec<String> {
    let Ok(read) = fs::read_dir(languages_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
