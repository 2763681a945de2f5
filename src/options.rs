//! Configuration for streaming sessions and the HTTP transport.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::StreamError;

/// A secret string type for sensitive data like bearer tokens.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// HTTP method used to open a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
        }
    }

    /// Whether the request payload travels as query parameters rather than a body.
    pub fn payload_in_query(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                StreamError::Config(format!(
                    "unknown method '{}', expected one of {}",
                    s,
                    Method::ALL.iter().join("|")
                ))
            })
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// How records are laid out on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// `text/event-stream`: events separated by a blank line.
    #[default]
    EventStream,
    /// Chunked transfer of newline-delimited records.
    Chunked,
}

impl Framing {
    pub fn default_delimiter(&self) -> &'static str {
        match self {
            Framing::EventStream => "\n\n",
            Framing::Chunked => "\n",
        }
    }
}

/// Per-session options.
///
/// # Example
/// ```rust
/// use streamkit::options::{Framing, Method, StreamOptions};
/// use serde_json::json;
///
/// let options = StreamOptions::new()
///     .with_method(Method::Post)
///     .with_framing(Framing::Chunked)
///     .with_payload(json!({"topic": "logs"}));
///
/// assert_eq!(options.delimiter(), "\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Request method, `get` when unset
    pub method: Method,

    /// Wire framing, selects the default delimiter
    pub framing: Framing,

    /// Explicit record delimiter, overrides the framing default
    pub delimiter: Option<String>,

    /// Query parameters for `get`/`delete`, JSON body otherwise
    pub payload: Option<Value>,

    /// Caller-owned cancellation; the session cancels when this token does
    pub cancellation: Option<CancellationToken>,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a `text/event-stream` response.
    pub fn sse() -> Self {
        Self::new().with_framing(Framing::EventStream)
    }

    /// Options for newline-delimited chunked responses.
    pub fn chunked() -> Self {
        Self::new().with_framing(Framing::Chunked)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The delimiter in effect for these options.
    pub fn delimiter(&self) -> &str {
        self.delimiter
            .as_deref()
            .unwrap_or_else(|| self.framing.default_delimiter())
    }
}

/// Transport configuration: a generic timeout plus transport-specific settings.
///
/// # Example
/// ```rust
/// use streamkit::options::{HttpTransport, TransportOptions};
/// use std::time::Duration;
///
/// let options = TransportOptions::new(
///     HttpTransport::default().with_base_url("http://localhost:8080".to_string()),
/// )
/// .with_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransportOptions<T> {
    /// Whole-request timeout; expiry surfaces as a terminal `error`
    pub timeout: Option<Duration>,

    /// Transport-specific options
    pub provider: T,
}

impl<T> TransportOptions<T> {
    pub fn new(provider: T) -> Self {
        Self {
            timeout: None,
            provider,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP-specific transport options.
/// Used as the provider field in `TransportOptions<HttpTransport>`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer_token: Option<SecretString>,

    /// Prefix for relative request URLs
    pub base_url: Option<String>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl HttpTransport {
    pub fn with_bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Resolve a request URL against `base_url`. Absolute URLs pass through.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }
}
