use super::hash;
use super::model::TmEntry;
use crate::error::Result;
use crate::services::atomic::write_atomic;

use std::{collections::HashMap, fs, path::Path};

pub const TM_FILE: &str = "translation_memory.json";

/// Reads the memory file. A missing or unreadable file yields an empty
/// memory; the older flat `{ "source": "translation" }` layout is migrated
/// using `source_lang`/`target_lang`.
pub fn load(path: &Path, source_lang: &str, target_lang: &str) -> Vec<TmEntry> {
    if !path.exists() {
        return Vec::new();
    }

    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("[TM] failed to read {}: {e}", path.display());
            return Vec::new();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("[TM] failed to parse {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut entries: Vec<TmEntry> = match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter_map(|(original, translation)| {
                Some(TmEntry {
                    source_lang: source_lang.to_string(),
                    target_lang: target_lang.to_string(),
                    translation: translation.as_str()?.to_string(),
                    hash: hash::hash_source(&original),
                    original,
                })
            })
            .collect(),
        other => match serde_json::from_value(other) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("[TM] unexpected layout in {}: {e}", path.display());
                return Vec::new();
            }
        },
    };

    for e in entries.iter_mut() {
        ensure_hash(e);
    }

    let (mut deduped, removed) = dedup(entries);
    if removed > 0 {
        tracing::debug!("[TM] dropped {removed} duplicate entries");
    }
    sort_entries(&mut deduped);

    deduped
}

pub fn save(path: &Path, entries: &[TmEntry]) -> Result<()> {
    let v: Vec<TmEntry> = entries.to_vec();

    let (mut v, _removed) = dedup(v);
    sort_entries(&mut v);

    let json = serde_json::to_string_pretty(&v)?;

    write_atomic(path, json.as_bytes())?;

    Ok(())
}

fn ensure_hash(e: &mut TmEntry) -> bool {
    if e.hash.is_empty() {
        e.hash = hash::hash_source(&e.original);
        return true;
    }
    false
}

fn dedup(entries: Vec<TmEntry>) -> (Vec<TmEntry>, usize) {
    let mut map: HashMap<(String, String), TmEntry> = HashMap::new();
    let mut removed = 0usize;

    for mut e in entries {
        ensure_hash(&mut e);

        let key = (e.target_lang.clone(), e.hash.clone());

        match map.get_mut(&key) {
            None => {
                map.insert(key, e);
            }
            Some(existing) => {
                if pick_better(existing, &e) {
                    *existing = e;
                }
                removed += 1;
            }
        }
    }

    let out: Vec<TmEntry> = map.into_values().collect();
    (out, removed)
}

fn pick_better(current: &TmEntry, candidate: &TmEntry) -> bool {
    let cur_empty = current.translation.trim().is_empty();
    let cand_empty = candidate.translation.trim().is_empty();

    if cur_empty && !cand_empty {
        return true;
    }
    if !cur_empty && cand_empty {
        return false;
    }

    candidate.translation.len() > current.translation.len()
}

fn sort_entries(entries: &mut [TmEntry]) {
    entries.sort_by(|a, b| {
        (
            a.target_lang.as_str(),
            a.original.as_str(),
            a.translation.as_str(),
        )
            .cmp(&(
                b.target_lang.as_str(),
                b.original.as_str(),
                b.translation.as_str(),
            ))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(original: &str, translation: &str) -> TmEntry {
        TmEntry {
            source_lang: "en".into(),
            target_lang: "ru".into(),
            original: original.into(),
            translation: translation.into(),
            hash: String::new(),
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join(TM_FILE), "en", "ru").is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TM_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(load(&path, "en", "ru").is_empty());
    }

    #[test]
    fn migrates_flat_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TM_FILE);
        fs::write(&path, r#"{"Sword": "Меч", "Shield": "Щит", "Bad": 3}"#).unwrap();

        let entries = load(&path, "en", "ru");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].original, "Shield");
        assert_eq!(entries[0].hash, hash::hash_source("Shield"));
        assert_eq!(entries[1].translation, "Меч");
    }

    #[test]
    fn save_dedups_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TM_FILE);

        save(&path, &[entry("Sword", ""), entry("Sword", "Меч"), entry("Axe", "Топор")]).unwrap();
        let back = load(&path, "en", "ru");

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].original, "Axe");
        assert_eq!(back[1].translation, "Меч");
    }
}
