//! Error type, the byte source seam, and the high-level client.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use thiserror::Error;

use crate::event::EventSink;
use crate::http::HttpSource;
use crate::model::{Record, StreamRequest};
use crate::options::{Framing, HttpTransport, StreamOptions, TransportOptions};
use crate::session::{Session, SessionOutcome, StreamHandle};

/// Errors that can occur while opening or reading a stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    /// A failure also held by event subscribers.
    #[error(transparent)]
    Shared(Arc<StreamError>),
}

impl StreamError {
    /// The HTTP status of a rejected request, looking through [`Shared`](Self::Shared).
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            StreamError::Status { status, .. } => Some(*status),
            StreamError::Http(err) => err.status(),
            StreamError::Shared(inner) => inner.status(),
            _ => None,
        }
    }
}

/// Raw body chunks in arrival order.
///
/// `Some(Ok(_))` delivers a chunk, `Some(Err(_))` is a terminal transport
/// failure and `None` is a graceful end. Dropping the stream aborts it.
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// Supplies the body of a streaming request.
///
/// Implement this trait to drive sessions from a transport other than HTTP.
///
/// # Example
/// ```rust,ignore
/// struct FileSource(PathBuf);
///
/// #[async_trait]
/// impl ByteSource for FileSource {
///     async fn open(&self, _request: &StreamRequest) -> Result<ByteStream, StreamError> {
///         let file = tokio::fs::File::open(&self.0)
///             .await
///             .map_err(|e| StreamError::Transport(e.to_string()))?;
///         Ok(ReaderStream::new(file)
///             .map(|r| r.map_err(|e| StreamError::Transport(e.to_string())))
///             .boxed())
///     }
/// }
/// ```
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Start delivery for `request`.
    ///
    /// An `Err` here fails the session before any chunk is read.
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, StreamError>;
}

/// Replays a fixed list of chunks, optionally ending in a transport error.
#[derive(Debug, Clone, Default)]
pub struct ChunkSource {
    chunks: Vec<Bytes>,
    error: Option<String>,
}

impl ChunkSource {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            error: None,
        }
    }

    /// Fail with a transport error after the last chunk instead of ending.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

#[async_trait]
impl ByteSource for ChunkSource {
    async fn open(&self, _request: &StreamRequest) -> Result<ByteStream, StreamError> {
        let tail = self
            .error
            .clone()
            .map(|message| Err(StreamError::Transport(message)));
        Ok(stream::iter(self.chunks.clone().into_iter().map(Ok).chain(tail)).boxed())
    }
}

/// Entry point for starting streaming sessions over a [`ByteSource`].
///
/// # Example
/// ```no_run
/// use streamkit::client::StreamClient;
/// use streamkit::event::EventSink;
/// use streamkit::options::{HttpTransport, StreamOptions, TransportOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = StreamClient::http(TransportOptions::new(HttpTransport::default()))?;
///
///     let handle = client.sse(
///         "https://api.example.com/events",
///         StreamOptions::new(),
///         EventSink::new().on_message(|record| println!("{:?}", record)),
///     )?;
///
///     handle.finished().await;
///     println!("received {} records", handle.records().len());
///     Ok(())
/// }
/// ```
pub struct StreamClient<S = HttpSource> {
    source: Arc<S>,
}

impl<S> Clone for StreamClient<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl StreamClient<HttpSource> {
    /// Create a client backed by reqwest.
    pub fn http(transport_options: TransportOptions<HttpTransport>) -> Result<Self, StreamError> {
        Ok(Self::new(HttpSource::new(transport_options)?))
    }
}

impl<S: ByteSource + 'static> StreamClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Start a session on the tokio runtime and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(
        &self,
        url: impl Into<String>,
        options: StreamOptions,
        sink: EventSink,
    ) -> Result<StreamHandle, StreamError> {
        let session = Session::new(url, options, sink)?;
        let handle = session.handle();
        let source = self.source.clone();
        tokio::spawn(async move {
            session.run(source.as_ref()).await;
        });
        Ok(handle)
    }

    /// Start an event-stream session, records separated by a blank line.
    pub fn sse(
        &self,
        url: impl Into<String>,
        options: StreamOptions,
        sink: EventSink,
    ) -> Result<StreamHandle, StreamError> {
        self.create(url, with_framing(options, Framing::EventStream), sink)
    }

    /// Start a chunked session, one record per line.
    pub fn chunked(
        &self,
        url: impl Into<String>,
        options: StreamOptions,
        sink: EventSink,
    ) -> Result<StreamHandle, StreamError> {
        self.create(url, with_framing(options, Framing::Chunked), sink)
    }

    /// Start a line-delimited session for live page updates.
    ///
    /// Same framing as [`chunked`](Self::chunked).
    pub fn realtime(
        &self,
        url: impl Into<String>,
        options: StreamOptions,
        sink: EventSink,
    ) -> Result<StreamHandle, StreamError> {
        self.chunked(url, options, sink)
    }

    /// Run a session to its end on the current task and return all records.
    pub async fn collect(
        &self,
        url: impl Into<String>,
        options: StreamOptions,
        sink: EventSink,
    ) -> Result<Vec<Record>, StreamError> {
        let session = Session::new(url, options, sink)?;
        match session.run(self.source.as_ref()).await {
            SessionOutcome::Completed(records) => Ok(records),
            SessionOutcome::Cancelled(_) => Err(StreamError::Cancelled),
            SessionOutcome::Failed(err) => {
                Err(Arc::try_unwrap(err).unwrap_or_else(StreamError::Shared))
            }
        }
    }
}

/// Force a framing, dropping any explicit delimiter.
fn with_framing(mut options: StreamOptions, framing: Framing) -> StreamOptions {
    options.delimiter = None;
    options.with_framing(framing)
}
