use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::services::backend::Translator;
use crate::services::smart::{self, SmartOutcome};
use crate::services::tokenizer;
use crate::services::translation_memory::TranslationMemory;

/// Translations of single literal spans, keyed by their trimmed content.
#[derive(Debug, Default)]
pub struct SegmentCache {
    map: HashMap<String, String>,
}

impl SegmentCache {
    pub fn get(&self, segment: &str) -> Option<&str> {
        self.map.get(segment).map(String::as_str)
    }

    pub fn insert(&mut self, segment: &str, translation: &str) {
        self.map.insert(segment.to_string(), translation.to_string());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Everything one translation run needs: the language pair, the backend,
/// the segment cache and the pacing between backend calls.
pub struct TranslationSession<'a> {
    backend: &'a dyn Translator,
    source_lang: String,
    target_lang: String,
    pacing: Duration,
    cache: SegmentCache,
    backend_calls: usize,
}

impl<'a> TranslationSession<'a> {
    pub fn new(backend: &'a dyn Translator, source_lang: &str, target_lang: &str) -> Self {
        TranslationSession {
            backend,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            pacing: Duration::ZERO,
            cache: SegmentCache::default(),
            backend_calls: 0,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn cache(&self) -> &SegmentCache {
        &self.cache
    }

    /// Number of requests sent to the backend so far.
    pub fn backend_calls(&self) -> usize {
        self.backend_calls
    }

    pub fn auto_translate(&mut self, text: &str, memory: &mut TranslationMemory) -> SmartOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SmartOutcome::default();
        }

        if let Some(hit) = memory.lookup(text) {
            return SmartOutcome {
                text: Some(hit.to_string()),
                error: None,
            };
        }

        let outcome = if tokenizer::has_markup(text) {
            smart::smart_translate(text, |segment| {
                if let Some(hit) = self.cache.get(segment) {
                    return Ok(hit.to_string());
                }
                if let Some(hit) = memory.lookup(segment) {
                    let hit = hit.to_string();
                    self.cache.insert(segment, &hit);
                    return Ok(hit);
                }

                let out = self.call_backend(segment)?;
                self.cache.insert(segment, &out);
                memory.record(segment, &out);
                Ok(out)
            })
        } else {
            SmartOutcome::from_result(self.call_backend(text))
        };

        if outcome.error.is_none() {
            if let Some(done) = &outcome.text {
                memory.record(text, done);
            }
        }

        outcome
    }

    fn call_backend(&mut self, text: &str) -> crate::error::Result<String> {
        if self.backend_calls > 0 && !self.pacing.is_zero() {
            thread::sleep(self.pacing);
        }
        self.backend_calls += 1;

        self.backend
            .translate(text, &self.source_lang, &self.target_lang)
    }
}
