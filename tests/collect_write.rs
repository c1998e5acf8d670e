//! Collect from an unpacked mod tree, fill translations, write them back.

use std::fs;
use std::path::Path;

use lingopak_core::model::entry::{SourceFormat, TextEntry};
use lingopak_core::services::collect::{self, LocaleLayout};
use lingopak_core::services::rebuild::{self, WriteOptions};
use lingopak_core::services::{qa, tokenizer};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn fill(entries: &mut [TextEntry], pairs: &[(&str, &str)]) {
    for e in entries.iter_mut() {
        if let Some((_, tr)) = pairs.iter().find(|(src, _)| *src == e.source) {
            e.translated = Some(tr.to_string());
        }
    }
}

#[test]
fn locale_round_trip_is_stable() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "Server/Languages/en-US/items.lang", "greeting=Hello\nfarewell=Bye\n");
    write(root, "Server/Languages/ru-RU/items.lang", "farewell=Пока\n");

    let layout = LocaleLayout::default();
    let mut entries = collect::collect(root, &layout);
    assert_eq!(entries.len(), 2);
    let farewell = entries.iter().find(|e| e.key == "farewell").unwrap();
    assert_eq!(farewell.translated.as_deref(), Some("Пока"));

    fill(&mut entries, &[("Hello", "Привет")]);
    let report = rebuild::write_back(root, &entries, &layout, WriteOptions::default()).unwrap();

    assert_eq!(report.written, vec!["Server/Languages/ru-RU/items.lang"]);
    assert!(report.failed.is_empty());
    assert_eq!(
        read(root, "Server/Languages/ru-RU/items.lang"),
        "farewell=Пока\ngreeting=Привет"
    );
    // Nothing was missing from the source locale.
    assert_eq!(
        read(root, "Server/Languages/en-US/items.lang"),
        "greeting=Hello\nfarewell=Bye\n"
    );

    let again = collect::collect(root, &layout);
    assert!(again.iter().all(TextEntry::is_translated));

    let second = rebuild::write_back(root, &again, &layout, WriteOptions::default()).unwrap();
    assert!(second.written.is_empty());
}

#[test]
fn every_format_is_written_in_place() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "manifest.json",
        r#"{"Name": "Ore Mod", "Version": "2.0", "Authors": [{"Name": "Smith", "Url": "x"}]}"#,
    );
    write(
        root,
        "Server/Item/pick.json",
        r#"{"Name": "Deep Pick", "Stats": {"Damage": 4}, "Tips": [{"text": "Mines <b>deep</b> ore"}]}"#,
    );
    write(root, "Common/UI/hud.ui", "Group {\n  Label { Text: \"Depth meter\"; }\n  @Text = \"Depth meter\";\n}\n");
    write(
        root,
        "Common/Translations/en_us.json",
        r#"{"hud": {"depth": "Current depth"}, "menu.title": "Ore menu"}"#,
    );

    let layout = LocaleLayout::default();
    let mut entries = collect::collect(root, &layout);

    let formats: Vec<SourceFormat> = entries.iter().map(|e| e.format).collect();
    assert!(formats.contains(&SourceFormat::Manifest));
    assert!(formats.contains(&SourceFormat::GenericJson));
    assert!(formats.contains(&SourceFormat::UiDescriptor));
    assert!(formats.contains(&SourceFormat::NestedTranslationJson));

    fill(
        &mut entries,
        &[
            ("Ore Mod", "Мод руды"),
            ("Smith", "Кузнец"),
            ("Deep Pick", "Глубокая кирка"),
            ("Mines <b>deep</b> ore", "Добывает <b>глубокую</b> руду"),
            ("Depth meter", "Глубиномер"),
            ("Current depth", "Текущая глубина"),
            ("Ore menu", "Меню руды"),
        ],
    );

    let report = rebuild::write_back(root, &entries, &layout, WriteOptions::default()).unwrap();
    assert!(report.failed.is_empty());

    let manifest: serde_json::Value = serde_json::from_str(&read(root, "manifest.json")).unwrap();
    assert_eq!(manifest["Name"], "Мод руды");
    assert_eq!(manifest["Authors"][0]["Name"], "Кузнец");
    assert_eq!(manifest["Authors"][0]["Url"], "x");
    assert_eq!(manifest["Version"], "2.0");

    let pick: serde_json::Value = serde_json::from_str(&read(root, "Server/Item/pick.json")).unwrap();
    assert_eq!(pick["Name"], "Глубокая кирка");
    assert_eq!(pick["Tips"][0]["text"], "Добывает <b>глубокую</b> руду");
    assert_eq!(pick["Stats"]["Damage"], 4);

    assert_eq!(
        read(root, "Common/UI/hud.ui"),
        "Group {\n  Label { Text: \"Глубиномер\"; }\n  @Text = \"Глубиномер\";\n}\n"
    );

    let ru: serde_json::Value =
        serde_json::from_str(&read(root, "Common/Translations/ru_RU.json")).unwrap();
    assert_eq!(ru["hud"]["depth"], "Текущая глубина");
    assert_eq!(ru["menu.title"], "Меню руды");

    assert!(qa::run(&entries).is_empty());
}

#[test]
fn markup_survives_tokenize_and_rebuild() {
    let text = r#"<item is="Ore"/> x3 [NEW]\nMined <color is="gold">deep</color>"#;
    let segments = tokenizer::tokenize(text);
    let rebuilt: String = segments.iter().map(|s| s.content.as_str()).collect();
    assert_eq!(rebuilt, text);
    assert!(segments.iter().any(|s| s.is_markup));
    assert!(segments.iter().any(|s| !s.is_markup && s.has_words()));
}
