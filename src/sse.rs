//! Server-Sent Events line helpers.
//!
//! Only the `data: ` field is interpreted, one line at a time:
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//! ```
//! Consecutive `data:` lines are not joined into one event; each line is
//! decoded on its own.

/// The SSE data field prefix, including its separating space.
pub const DATA_PREFIX: &str = "data: ";

/// Strip the `data: ` prefix from an already trimmed line.
///
/// Returns the trimmed payload after the prefix, or the line itself when it
/// carries no prefix.
///
/// # Example
/// ```
/// use streamkit::sse::strip_data_prefix;
///
/// assert_eq!(strip_data_prefix("data: {\"key\": 1}"), "{\"key\": 1}");
/// assert_eq!(strip_data_prefix("{\"key\": 1}"), "{\"key\": 1}");
/// ```
pub fn strip_data_prefix(line: &str) -> &str {
    parse_data_line(line).unwrap_or(line)
}

/// Extract the payload of a `data: ` line.
///
/// # Example
/// ```
/// use streamkit::sse::parse_data_line;
///
/// assert_eq!(parse_data_line("data: hello"), Some("hello"));
/// assert_eq!(parse_data_line("event: ping"), None);
/// ```
pub fn parse_data_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX).map(|s| s.trim())
}
