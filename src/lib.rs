//! # streamkit - incremental decoding of streamed HTTP responses
//!
//! Turns a chunked or `text/event-stream` response body, delivered in
//! arbitrary fragments, into an ordered sequence of JSON records with
//! per-record notifications and a single terminal signal.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Configurable record delimiter (`"\n\n"` for SSE, `"\n"` for chunked)
//! - `data: ` prefix stripping for Server-Sent Events
//! - Non-JSON lines kept as `{"raw": true, "message": ...}` records
//! - Cooperative cancellation with a live view of decoded records
//! - Pluggable byte sources; reqwest-backed HTTP by default
//!
//! ## Architecture
//!
//! ```text
//! ByteSource -> FrameSplitter -> decode -> Session -> EventSink -> listeners
//! ```
//!
//! - **[`ByteSource`]**: yields raw body chunks ([`http::HttpSource`], [`client::ChunkSource`])
//! - **[`frame::FrameSplitter`]**: cuts the byte stream at the delimiter
//! - **[`decode`]**: turns each line of a frame into a [`Record`]
//! - **[`Session`]**: owns the buffer, the records and the lifecycle state
//! - **[`EventSink`]**: typed callbacks and channel subscribers
//!
//! ## Example
//! ```no_run
//! use streamkit::{EventSink, StreamClient};
//! use streamkit::options::{HttpTransport, Method, StreamOptions, TransportOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StreamClient::http(TransportOptions::new(
//!         HttpTransport::default().with_base_url("https://api.example.com".to_string()),
//!     ))?;
//!
//!     let handle = client.chunked(
//!         "/metrics",
//!         StreamOptions::new()
//!             .with_method(Method::Post)
//!             .with_payload(json!({"interval": "1s"})),
//!         EventSink::new()
//!             .on_message(|record| println!("metric: {:?}", record))
//!             .on_error(|err| eprintln!("stream failed: {}", err)),
//!     )?;
//!
//!     handle.finished().await;
//!     println!("{} records", handle.records().len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod decode;
pub mod event;
pub mod frame;
pub mod http;
pub mod model;
pub mod options;
pub mod session;
pub mod sse;

// Re-exports for convenience
pub use client::{ByteSource, StreamClient, StreamError};
pub use event::{EventSink, StreamEvent};
pub use model::{Record, StreamRequest};
pub use session::{Session, SessionOutcome, SessionState, StreamHandle};
