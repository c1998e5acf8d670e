use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::Translator;
use crate::error::{CoreError, Result};

const NAME: &str = "mock";

/// How a [`MockTranslator`] answers.
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Returns the prefix followed by the input.
    Prefix(String),
    /// Upper-cases the input.
    Uppercase,
    /// Looks the input up; unknown text is an error.
    Dictionary(HashMap<String, String>),
    /// Always fails with this message.
    Fail(String),
    /// Echoes the input when called with this source language, fails otherwise.
    FailUnlessSource(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub text: String,
    pub source: String,
    pub target: String,
}

/// Offline translator for tests and dry runs. Every call is logged.
pub struct MockTranslator {
    mode: MockMode,
    calls: Rc<RefCell<Vec<MockCall>>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        MockTranslator {
            mode,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Shared handle to the call log; stays valid after the translator is boxed.
    pub fn calls(&self) -> Rc<RefCell<Vec<MockCall>>> {
        Rc::clone(&self.calls)
    }
}

impl Translator for MockTranslator {
    fn name(&self) -> &str {
        NAME
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        self.calls.borrow_mut().push(MockCall {
            text: text.to_string(),
            source: source_lang.to_string(),
            target: target_lang.to_string(),
        });

        match &self.mode {
            MockMode::Prefix(prefix) => Ok(format!("{prefix}{text}")),
            MockMode::Uppercase => Ok(text.to_uppercase()),
            MockMode::Dictionary(map) => map
                .get(text)
                .cloned()
                .ok_or_else(|| CoreError::backend(NAME, format!("no entry for {text:?}"))),
            MockMode::Fail(msg) => Err(CoreError::backend(NAME, msg.clone())),
            MockMode::FailUnlessSource(wanted) if wanted == source_lang => Ok(text.to_string()),
            MockMode::FailUnlessSource(wanted) => Err(CoreError::backend(
                NAME,
                format!("source {source_lang} rejected, expected {wanted}"),
            )),
        }
    }
}
