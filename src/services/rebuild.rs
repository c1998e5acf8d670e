//! Writes catalogue translations back into an extracted package.
//!
//! Every file is updated all-or-nothing: its changes are applied in memory,
//! serialized once and written through a temp file. Files whose bytes would
//! not change are left untouched.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::model::config::AppConfig;
use crate::model::entry::{SourceFormat, TextEntry};
use crate::parsers::json_path::JsonPath;
use crate::parsers::{lang, ui};
use crate::services::atomic::write_if_changed;
use crate::services::collect::{self, LocaleLayout};
use crate::services::encoding;

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Write `key = value` instead of `key=value` in locale files.
    pub spaced: bool,
}

impl WriteOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        WriteOptions {
            spaced: cfg.lang_spaced_separator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct WriteReport {
    /// Files whose content changed on disk.
    pub written: Vec<String>,
    /// Files that already held the expected content.
    pub unchanged: usize,
    pub failed: Vec<WriteFailure>,
}

impl WriteReport {
    fn record(&mut self, rel: &str, res: Result<bool>) {
        match res {
            Ok(true) => self.written.push(rel.to_string()),
            Ok(false) => self.unchanged += 1,
            Err(e) => {
                tracing::warn!("failed to write {rel}: {e}");
                self.failed.push(WriteFailure {
                    file: rel.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Locale-file updates grouped by target file.
#[derive(Default)]
struct LangTarget {
    updates: lang::LangMap,
    /// Source text of every collected key, for backfilling the source locale.
    sources: lang::LangMap,
}

type Pairs = Vec<(String, String)>;

pub fn write_back(
    root: &Path,
    entries: &[TextEntry],
    layout: &LocaleLayout,
    options: WriteOptions,
) -> Result<WriteReport> {
    if !root.is_dir() {
        return Err(CoreError::MissingPath(root.to_path_buf()));
    }

    let mut manifest: BTreeMap<&str, Pairs> = BTreeMap::new();
    let mut langs: BTreeMap<String, LangTarget> = BTreeMap::new();
    let mut uis: BTreeMap<&str, Pairs> = BTreeMap::new();
    let mut nested: BTreeMap<&str, Pairs> = BTreeMap::new();
    let mut generic: BTreeMap<&str, Pairs> = BTreeMap::new();

    for e in entries {
        let tr = e.translation();

        if e.format == SourceFormat::LocaleFile {
            let target = langs.entry(layout.target_lang_rel(&e.file_rel)).or_default();
            let source = e.source.trim();
            if !source.is_empty() {
                target.sources.insert(e.key.clone(), source.to_string());
            }
            if let Some(tr) = tr {
                target.updates.insert(e.key.clone(), tr.to_string());
            }
            continue;
        }

        let Some(tr) = tr else { continue };
        let group = match e.format {
            SourceFormat::Manifest => &mut manifest,
            SourceFormat::UiDescriptor => &mut uis,
            SourceFormat::NestedTranslationJson => &mut nested,
            SourceFormat::GenericJson => &mut generic,
            SourceFormat::LocaleFile => continue,
        };
        let pair = match e.format {
            SourceFormat::UiDescriptor => (e.source.clone(), tr.to_string()),
            _ => (e.key.clone(), tr.to_string()),
        };
        group.entry(e.file_rel.as_str()).or_default().push(pair);
    }

    let mut report = WriteReport::default();

    for (rel, pairs) in &manifest {
        report.record(rel, write_manifest(&root.join(rel), pairs));
    }

    for (target_rel, target) in &langs {
        if target.updates.is_empty() {
            continue;
        }
        report.record(
            target_rel,
            write_lang_target(&root.join(target_rel), &target.updates, options),
        );

        if let Some(source_rel) = source_counterpart(root, target_rel, layout) {
            report.record(
                &source_rel,
                backfill_source(&root.join(&source_rel), &target.sources, options),
            );
        }
    }

    for (rel, pairs) in &uis {
        report.record(rel, write_ui(&root.join(rel), pairs));
    }

    for (rel, pairs) in &nested {
        let source = root.join(rel);
        let target = source.with_file_name(&layout.target_json);
        let target_rel = collect::rel_path(root, &target);
        report.record(&target_rel, write_nested_json(&source, &target, pairs));
    }

    for (rel, pairs) in &generic {
        report.record(rel, write_generic_json(&root.join(rel), pairs));
    }

    tracing::info!(
        "write-back: {} written, {} unchanged, {} failed",
        report.written.len(),
        report.unchanged,
        report.failed.len()
    );

    Ok(report)
}

fn write_manifest(path: &Path, pairs: &Pairs) -> Result<bool> {
    let mut doc = read_existing_json(path)?;

    for (key, tr) in pairs {
        let at = JsonPath::parse(key);
        // Authors may have been edited since collection; skip vanished slots.
        if at.0.len() > 1 && at.get(&doc).is_none() {
            tracing::debug!("manifest key {key} no longer present");
            continue;
        }
        at.set(&mut doc, Value::String(tr.clone()))?;
    }

    write_json(path, &doc)
}

fn write_lang_target(path: &Path, updates: &lang::LangMap, options: WriteOptions) -> Result<bool> {
    let mut merged = if path.is_file() {
        lang::parse(&encoding::read_text(path)?)
    } else {
        lang::LangMap::new()
    };

    merged.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
    lang::add_case_aliases(&mut merged);

    write_text(path, &lang::serialize(&merged, options.spaced))
}

/// Adds source text for keys the source locale file lacks. The file is
/// only rewritten when it gained keys.
fn backfill_source(path: &Path, sources: &lang::LangMap, options: WriteOptions) -> Result<bool> {
    let mut existing = lang::parse(&encoding::read_text(path)?);
    let before = existing.len();

    for (k, v) in sources {
        existing.entry(k.clone()).or_insert_with(|| v.clone());
    }
    lang::add_case_aliases(&mut existing);

    if existing.len() == before {
        return Ok(false);
    }

    write_text(path, &lang::serialize(&existing, options.spaced))
}

/// The source-locale file matching a target locale file, when it exists
/// and is a different file.
fn source_counterpart(root: &Path, target_rel: &str, layout: &LocaleLayout) -> Option<String> {
    let target_path = root.join(target_rel);
    let languages_dir = target_path.parent()?.parent()?;
    let locale = layout.source_locale(languages_dir)?;

    let source_rel = collect::with_locale(target_rel, &locale);
    (source_rel != target_rel && root.join(&source_rel).is_file()).then_some(source_rel)
}

fn write_ui(path: &Path, pairs: &Pairs) -> Result<bool> {
    if !path.is_file() {
        return Err(CoreError::MissingPath(path.to_path_buf()));
    }
    let content = encoding::read_text(path)?;
    let updated = ui::apply(&content, pairs);
    write_text(path, &updated)
}

/// Merges into the target-language file beside `source`. `cat.sub` keys
/// land in nested objects unless the source file holds `cat.sub` as a
/// top-level key.
fn write_nested_json(source: &Path, target: &Path, pairs: &Pairs) -> Result<bool> {
    let source_doc = collect::read_json(source).unwrap_or(Value::Null);

    let mut doc = if target.is_file() {
        collect::read_json(target)?
    } else {
        Value::Object(Map::new())
    };
    let Value::Object(map) = &mut doc else {
        return Err(CoreError::JsonPath {
            path: String::new(),
            reason: "target translation file is not an object".to_string(),
        });
    };

    for (key, tr) in pairs {
        let flat = source_doc.get(key).is_some_and(Value::is_string);
        match key.split_once('.') {
            Some((cat, sub)) if !flat => {
                let slot = map
                    .entry(cat.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(inner) = slot {
                    inner.insert(sub.to_string(), Value::String(tr.clone()));
                }
            }
            _ => {
                map.insert(key.clone(), Value::String(tr.clone()));
            }
        }
    }

    write_json(target, &doc)
}

fn write_generic_json(path: &Path, pairs: &Pairs) -> Result<bool> {
    let mut doc = read_existing_json(path)?;

    for (key, tr) in pairs {
        JsonPath::parse(key).set(&mut doc, Value::String(tr.clone()))?;
    }

    write_json(path, &doc)
}

fn read_existing_json(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(CoreError::MissingPath(path.to_path_buf()));
    }
    collect::read_json(path)
}

fn write_json(path: &Path, doc: &Value) -> Result<bool> {
    let text = serde_json::to_string_pretty(doc)?;
    write_text(path, &text)
}

/// Keeps a UTF-8 byte order mark the file already had.
fn write_text(path: &Path, text: &str) -> Result<bool> {
    let bytes = encoding::with_bom(text, encoding::has_utf8_bom(path));
    write_if_changed(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    fn entry(format: SourceFormat, rel: &str, key: &str, source: &str, tr: Option<&str>) -> TextEntry {
        TextEntry::new(format, rel, key, source).with_translation(tr.map(str::to_string))
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let res = write_back(&dir.path().join("nope"), &[], &LocaleLayout::default(), WriteOptions::default());
        assert!(matches!(res, Err(CoreError::MissingPath(_))));
    }

    #[test]
    fn lang_merge_keeps_existing_target_keys() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Server/Languages/en-US/x.lang", "greeting=Hello\n");
        write(dir.path(), "Server/Languages/ru-RU/x.lang", "farewell=Пока\n");

        let entries = vec![entry(
            SourceFormat::LocaleFile,
            "Server/Languages/en-US/x.lang",
            "greeting",
            "Hello",
            Some("Привет"),
        )];
        let report = write_back(dir.path(), &entries, &LocaleLayout::default(), WriteOptions::default()).unwrap();

        assert_eq!(
            read(dir.path(), "Server/Languages/ru-RU/x.lang"),
            "farewell=Пока\ngreeting=Привет"
        );
        assert_eq!(report.written, vec!["Server/Languages/ru-RU/x.lang"]);
        // The source file had nothing to gain and keeps its original bytes.
        assert_eq!(read(dir.path(), "Server/Languages/en-US/x.lang"), "greeting=Hello\n");
    }

    #[test]
    fn lang_aliases_and_backfill() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Server/Languages/en-US/a.lang", "items.sword.name=Sword\n");

        let entries = vec![
            entry(
                SourceFormat::LocaleFile,
                "Server/Languages/en-US/a.lang",
                "benchCategories.Tools",
                "Tools",
                Some("Инструменты"),
            ),
            entry(
                SourceFormat::LocaleFile,
                "Server/Languages/en-US/a.lang",
                "items.sword.name",
                "Sword",
                None,
            ),
        ];
        let opts = WriteOptions { spaced: true };
        write_back(dir.path(), &entries, &LocaleLayout::default(), opts).unwrap();

        assert_eq!(
            read(dir.path(), "Server/Languages/ru-RU/a.lang"),
            "benchCategories.Tools = Инструменты\nbenchcategories.Tools = Инструменты"
        );
        assert_eq!(
            read(dir.path(), "Server/Languages/en-US/a.lang"),
            "benchCategories.Tools = Tools\nbenchcategories.Tools = Tools\nitems.sword.name = Sword"
        );
    }

    #[test]
    fn second_write_changes_nothing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "manifest.json", r#"{"Name": "Test Sword", "Version": "1.0"}"#);
        write(dir.path(), "Server/Item/a.json", r#"{"items": [{"name": "Axe"}]}"#);

        let entries = vec![
            entry(SourceFormat::Manifest, "manifest.json", "Name", "Test Sword", Some("Тестовый меч")),
            entry(SourceFormat::GenericJson, "Server/Item/a.json", "items[0].name", "Axe", Some("Топор")),
        ];
        let layout = LocaleLayout::default();

        let first = write_back(dir.path(), &entries, &layout, WriteOptions::default()).unwrap();
        assert_eq!(first.written.len(), 2);
        let manifest = read(dir.path(), "manifest.json");

        let second = write_back(dir.path(), &entries, &layout, WriteOptions::default()).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged, 2);
        assert_eq!(read(dir.path(), "manifest.json"), manifest);
        assert_eq!(
            manifest,
            "{\n  \"Name\": \"Тестовый меч\",\n  \"Version\": \"1.0\"\n}"
        );
    }

    #[test]
    fn ui_values_replaced_everywhere() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "UI/menu.ui",
            "A { Text: \"Close\"; }\nB { @Text = \"Close\"; }\nC { Text: \"Keep\"; }",
        );

        let entries = vec![entry(SourceFormat::UiDescriptor, "UI/menu.ui", "4", "Close", Some("Закрыть"))];
        write_back(dir.path(), &entries, &LocaleLayout::default(), WriteOptions::default()).unwrap();

        assert_eq!(
            read(dir.path(), "UI/menu.ui"),
            "A { Text: \"Закрыть\"; }\nB { @Text = \"Закрыть\"; }\nC { Text: \"Keep\"; }"
        );
    }

    #[test]
    fn nested_translation_json_merges() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Common/Translations/en_US.json",
            r#"{"title": "Welcome", "items": {"sword": "Iron sword"}, "ui.close": "Close"}"#,
        );
        write(dir.path(), "Common/Translations/ru_RU.json", r#"{"items": {"axe": "Топор"}}"#);

        let rel = "Common/Translations/en_US.json";
        let entries = vec![
            entry(SourceFormat::NestedTranslationJson, rel, "title", "Welcome", Some("Добро пожаловать")),
            entry(SourceFormat::NestedTranslationJson, rel, "items.sword", "Iron sword", Some("Железный меч")),
            entry(SourceFormat::NestedTranslationJson, rel, "ui.close", "Close", Some("Закрыть")),
        ];
        let report = write_back(dir.path(), &entries, &LocaleLayout::default(), WriteOptions::default()).unwrap();
        assert_eq!(report.written, vec!["Common/Translations/ru_RU.json"]);

        let doc: Value = serde_json::from_str(&read(dir.path(), "Common/Translations/ru_RU.json")).unwrap();
        assert_eq!(doc["items"]["axe"], "Топор");
        assert_eq!(doc["items"]["sword"], "Железный меч");
        assert_eq!(doc["title"], "Добро пожаловать");
        assert_eq!(doc["ui.close"], "Закрыть");
    }

    #[test]
    fn bad_path_fails_only_that_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"list": []}"#);
        write(dir.path(), "b.json", r#"{"title": "Old"}"#);

        let entries = vec![
            entry(SourceFormat::GenericJson, "a.json", "list[0].name", "Gone", Some("Нет")),
            entry(SourceFormat::GenericJson, "b.json", "title", "Old", Some("Старый")),
        ];
        let report = write_back(dir.path(), &entries, &LocaleLayout::default(), WriteOptions::default()).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, "a.json");
        assert_eq!(read(dir.path(), "a.json"), r#"{"list": []}"#);
        assert_eq!(report.written, vec!["b.json"]);
    }

    #[test]
    fn dotted_and_empty_json_keys_write_in_place() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Server/Item/sword.json",
            r#"{"Title": "Good Sword", "Variants": {"v1.gold": {"Name": "Gold Sword"}}, "": {"name": "Hidden Blade"}}"#,
        );

        let layout = LocaleLayout::default();
        let mut entries = collect::collect(dir.path(), &layout);
        assert_eq!(entries.len(), 3);
        for e in &mut entries {
            e.translated = Some(format!("ru {}", e.source));
        }

        let report = write_back(dir.path(), &entries, &layout, WriteOptions::default()).unwrap();
        assert!(report.failed.is_empty());

        let doc: Value = serde_json::from_str(&read(dir.path(), "Server/Item/sword.json")).unwrap();
        assert_eq!(doc["Title"], "ru Good Sword");
        assert_eq!(doc["Variants"]["v1.gold"]["Name"], "ru Gold Sword");
        assert_eq!(doc[""]["name"], "ru Hidden Blade");
        assert_eq!(doc.as_object().unwrap().len(), 3);
    }

    #[test]
    fn byte_order_marks_survive_rewrites() {
        let dir = TempDir::new().unwrap();
        let bom = "\u{feff}";
        write(dir.path(), "UI/menu.ui", &format!("{bom}A {{ Text: \"Close\"; }}"));
        write(dir.path(), "Server/Languages/en-US/x.lang", &format!("{bom}greeting=Hello\n"));
        write(dir.path(), "Server/Languages/ru-RU/x.lang", &format!("{bom}farewell=Пока\n"));

        let entries = vec![
            entry(SourceFormat::UiDescriptor, "UI/menu.ui", "0", "Close", Some("Закрыть")),
            entry(
                SourceFormat::LocaleFile,
                "Server/Languages/en-US/x.lang",
                "greeting",
                "Hello",
                Some("Привет"),
            ),
        ];
        let report = write_back(dir.path(), &entries, &LocaleLayout::default(), WriteOptions::default()).unwrap();
        assert_eq!(report.written.len(), 2);

        assert_eq!(read(dir.path(), "UI/menu.ui"), format!("{bom}A {{ Text: \"Закрыть\"; }}"));
        assert_eq!(
            read(dir.path(), "Server/Languages/ru-RU/x.lang"),
            format!("{bom}farewell=Пока\ngreeting=Привет")
        );
    }

    #[test]
    fn untranslated_entries_touch_nothing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", r#"{"title":"Old"}"#);

        let entries = vec![entry(SourceFormat::GenericJson, "b.json", "title", "Old", Some("  "))];
        let report = write_back(dir.path(), &entries, &LocaleLayout::default(), WriteOptions::default()).unwrap();

        assert!(report.written.is_empty());
        assert_eq!(read(dir.path(), "b.json"), r#"{"title":"Old"}"#);
    }
}
