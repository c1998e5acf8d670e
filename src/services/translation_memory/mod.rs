//! Exact-match memory from source text to its translation, shared by every
//! package processed from one mods folder.

pub mod hash;
pub mod matcher;
pub mod model;
pub mod store;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::entry::TextEntry;
use model::TmEntry;

pub struct TranslationMemory {
    path: Option<PathBuf>,
    source_lang: String,
    target_lang: String,
    entries: Vec<TmEntry>,
}

impl TranslationMemory {
    /// Loads `<mods_path>/translation_memory.json` fresh from disk.
    pub fn open(mods_path: &Path, source_lang: &str, target_lang: &str) -> Self {
        let path = mods_path.join(store::TM_FILE);
        let entries = store::load(&path, source_lang, target_lang);
        tracing::debug!("[TM] loaded {} entries from {}", entries.len(), path.display());

        TranslationMemory {
            path: Some(path),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            entries,
        }
    }

    /// A memory that is never persisted.
    pub fn ephemeral(source_lang: &str, target_lang: &str) -> Self {
        TranslationMemory {
            path: None,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, original: &str) -> Option<&str> {
        matcher::exact_match(&self.entries, &self.target_lang, original)
            .map(|e| e.translation.as_str())
    }

    /// Remembers `translation` for `original`, replacing an older one.
    pub fn record(&mut self, original: &str, translation: &str) {
        if original.trim().is_empty() || translation.trim().is_empty() {
            return;
        }

        let h = hash::hash_source(original);
        let existing = self
            .entries
            .iter_mut()
            .find(|e| e.target_lang == self.target_lang && e.hash == h && e.original == original);

        match existing {
            Some(e) => e.translation = translation.to_string(),
            None => self.entries.push(TmEntry {
                source_lang: self.source_lang.clone(),
                target_lang: self.target_lang.clone(),
                original: original.to_string(),
                translation: translation.to_string(),
                hash: h,
            }),
        }
    }

    /// Fills `translated` from memory. Returns how many entries were hit.
    pub fn prefill(&self, entries: &mut [TextEntry]) -> usize {
        let mut hits = 0;
        for e in entries.iter_mut() {
            if let Some(tr) = self.lookup(&e.source) {
                e.translated = Some(tr.to_string());
                hits += 1;
            }
        }
        hits
    }

    /// Records every translated entry.
    pub fn absorb(&mut self, entries: &[TextEntry]) {
        for e in entries {
            if let Some(tr) = e.translation() {
                self.record(&e.source, tr);
            }
        }
    }

    /// Persists the whole memory. Callers treat failure as non-fatal.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => store::save(path, &self.entries),
            None => Ok(()),
        }
    }

    /// Saves and logs instead of failing.
    pub fn save_best_effort(&self) {
        if let Err(e) = self.save() {
            tracing::warn!("[TM] failed to save translation memory: {e}");
        }
    }
}
