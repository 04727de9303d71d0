//! Text classification for file contents
//!
//! Decides whether a file's bytes are text and computes the encoding name and
//! line/word/character counts for the ones that are.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::tree::TextStats;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Classify raw bytes.
///
/// Returns `None` for bytes that are not valid UTF-8 and for input that
/// decodes to an empty string, so a zero-byte file is never text.
pub fn classify(bytes: &[u8]) -> Option<TextStats> {
    let decoded = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            log::trace!("utf-8 decode failed at byte {}", e.valid_up_to());
            return None;
        }
    };
    if decoded.is_empty() {
        return None;
    }

    let encoding = detect_encoding(bytes);
    let text = if encoding == "UTF-8-SIG" {
        &decoded[UTF8_BOM.len()..]
    } else {
        decoded
    };

    Some(TextStats {
        encoding: encoding.to_string(),
        line_count: text.matches('\n').count() + 1,
        word_count: text.split_whitespace().count(),
        character_count: text.chars().count(),
    })
}

/// Read a file and classify its contents.
///
/// Read failures are fatal; decode failures just mean the file is not text.
pub fn classify_file(path: &Path) -> Result<Option<TextStats>> {
    let bytes = fs::read(path).map_err(|e| Error::fs(path, e))?;
    Ok(classify(&bytes))
}

/// Name the encoding of bytes already known to be valid UTF-8.
fn detect_encoding(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(UTF8_BOM) {
        "UTF-8-SIG"
    } else if bytes.is_ascii() {
        "ascii"
    } else {
        "utf-8"
    }
}
