use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::error::Result;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Serialize)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
    pub had_bom: bool,
    /// Replacement characters were substituted somewhere.
    pub lossy: bool,
}

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let decoded = decode(&bytes);

    if decoded.encoding != "utf-8" || decoded.lossy {
        tracing::debug!(
            "{} decoded as {} (lossy: {})",
            path.display(),
            decoded.encoding,
            decoded.lossy
        );
    }

    Ok(decoded.text)
}

/// Whether the file starts with a UTF-8 byte order mark. Unreadable or
/// missing files have none.
pub fn has_utf8_bom(path: &Path) -> bool {
    let mut head = [0u8; 3];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut head))
        .is_ok()
        && head == UTF8_BOM
}

/// UTF-8 bytes of `text`, behind a byte order mark when `bom` is set.
pub fn with_bom(text: &str, bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + UTF8_BOM.len());
    if bom {
        out.extend_from_slice(&UTF8_BOM);
    }
    out.extend_from_slice(text.as_bytes());
    out
}

pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some(rest) = bytes.strip_prefix(&UTF8_BOM) {
        let (text, lossy) = decode_with(UTF_8, rest);
        return DecodedText {
            text,
            encoding: "utf-8".into(),
            had_bom: true,
            lossy,
        };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "utf-8".into(),
            had_bom: false,
            lossy: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, lossy) = decode_with(encoding, bytes);

    DecodedText {
        text,
        encoding: encoding.name().to_lowercase(),
        had_bom: false,
        lossy,
    }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> (String, bool) {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    (text.into_owned(), had_errors)
}
