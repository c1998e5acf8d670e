use crate::model::entry::TextEntry;
use crate::services::tokenizer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaIssue {
    pub file_rel: String,
    pub key: String,
    pub code: String,
    pub message: String,
}

impl QaIssue {
    fn new(e: &TextEntry, code: &str, message: impl Into<String>) -> Self {
        QaIssue {
            file_rel: e.file_rel.clone(),
            key: e.key.clone(),
            code: code.to_string(),
            message: message.into(),
        }
    }
}

pub fn run(entries: &[TextEntry]) -> Vec<QaIssue> {
    let mut issues: Vec<QaIssue> = Vec::new();

    for e in entries {
        let source = e.source.trim();

        let Some(translation) = e.translation() else {
            issues.push(QaIssue::new(e, "UNTRANSLATED", "No translation entered"));
            continue;
        };

        // Identical text is usually a backend that echoed its input.
        if translation == source {
            issues.push(QaIssue::new(e, "SAME_AS_SOURCE", "Translation is identical to the source"));
        }

        let expected = tokenizer::markup_of(source);
        let actual = tokenizer::markup_of(translation);
        if expected != actual {
            issues.push(QaIssue::new(
                e,
                "MARKUP_MISMATCH",
                format!(
                    "Markup differs: expected {:?}, found {:?}",
                    expected, actual
                ),
            ));
        }
    }

    issues
}
