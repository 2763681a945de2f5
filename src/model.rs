//! Data models shared by the session engine: the request identity and decoded records.

use serde::Serialize;
use serde_json::Value;

use crate::options::Method;

/// Identity of a streaming request. Immutable once a session is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamRequest {
    /// Target URL, absolute or relative to the transport's base URL
    pub url: String,

    /// Request method
    pub method: Method,

    /// Query parameters for `get`/`delete`, JSON body otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl StreamRequest {
    pub fn new(url: impl Into<String>, method: Method, payload: Option<Value>) -> Self {
        Self {
            url: url.into(),
            method,
            payload,
        }
    }
}

/// Wrapper for a line that could not be parsed as JSON.
///
/// Serializes as `{"raw": true, "message": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    raw: bool,
    pub message: String,
}

impl RawRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            raw: true,
            message: message.into(),
        }
    }
}

/// One decoded unit of the stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// A line that parsed as JSON
    Value(Value),

    /// A line that did not, kept verbatim
    Raw(RawRecord),
}

impl Record {
    pub fn raw(message: impl Into<String>) -> Self {
        Record::Raw(RawRecord::new(message))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Record::Raw(_))
    }

    /// The parsed value, if this record is structured.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Record::Value(value) => Some(value),
            Record::Raw(_) => None,
        }
    }

    /// The original text, if this is a fallback record.
    pub fn raw_message(&self) -> Option<&str> {
        match self {
            Record::Value(_) => None,
            Record::Raw(raw) => Some(&raw.message),
        }
    }

    /// The record as a JSON value, fallback records included.
    pub fn to_value(&self) -> Value {
        match self {
            Record::Value(value) => value.clone(),
            Record::Raw(raw) => serde_json::json!({ "raw": true, "message": raw.message }),
        }
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_serialization() {
        let record = Record::raw("plain text");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"raw": true, "message": "plain text"})
        );
        assert_eq!(record.to_value(), json!({"raw": true, "message": "plain text"}));
        assert_eq!(record.raw_message(), Some("plain text"));
        assert!(record.as_value().is_none());
    }

    #[test]
    fn test_value_record_serialization() {
        let record = Record::from(json!({"a": 1}));
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"a": 1}));
        assert!(!record.is_raw());
        assert_eq!(record.as_value(), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_request_omits_missing_payload() {
        let request = StreamRequest::new("/events", Method::Get, None);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"url": "/events", "method": "get"})
        );
    }
}
