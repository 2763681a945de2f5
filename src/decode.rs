//! Frame-to-record decoding.
//!
//! A frame is split into lines; each non-blank line becomes exactly one
//! [`Record`]. Lines that are not JSON are kept as fallback records rather
//! than dropped, so a stray log line never aborts the stream. Bytes that are
//! not valid UTF-8 are replaced with U+FFFD in the fallback text.

use std::borrow::Cow;

use serde_json::Value;
use tracing::debug;

use crate::model::Record;
use crate::sse::strip_data_prefix;

/// Byte order mark some servers send at the start of a body.
const BOM: char = '\u{feff}';

/// A line that could not be turned into any record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// The offending line, lossily decoded
    pub text: String,
    /// Human readable description
    pub detail: String,
}

/// Result of decoding a single line.
///
/// [`decode_line`] only yields `Record`: its text fallback cannot fail once
/// the line is decoded lossily. `Diagnostic` is the `parse_error` payload for
/// lines a record cannot represent.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Record(Record),
    Diagnostic(ParseDiagnostic),
}

/// Trim a line with Unicode whitespace rules and drop a leading byte order mark.
fn normalize(text: &str) -> &str {
    text.trim().trim_start_matches(BOM).trim()
}

/// Decode one line. Returns `None` for lines that carry nothing.
pub fn decode_line(line: &[u8]) -> Option<Decoded> {
    let text = String::from_utf8_lossy(line);
    if matches!(text, Cow::Owned(_)) {
        debug!("Line is not valid UTF-8, decoding lossily");
    }
    let text = normalize(&text);
    if text.is_empty() {
        return None;
    }

    let record = match serde_json::from_str::<Value>(strip_data_prefix(text)) {
        Ok(value) => Record::Value(value),
        Err(parse_err) => {
            debug!("Line is not JSON ({}), keeping as raw text", parse_err);
            Record::raw(text)
        }
    };
    Some(Decoded::Record(record))
}

/// Decode every line of a frame, in line order.
pub fn decode_lines(frame: &[u8]) -> impl Iterator<Item = Decoded> + '_ {
    frame.split(|b| *b == b'\n').filter_map(decode_line)
}
