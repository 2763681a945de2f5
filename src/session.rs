//! Session controller: one streaming request from connect to a terminal state.
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Completed
//!             |             |------> Cancelled
//!             |------------ +------> Failed
//! ```
//!
//! All buffer, record and state mutation happens inside the `on_*` handlers,
//! which a transport calls one at a time. [`Session::run`] is the async
//! driver for a [`ByteSource`]; callback-style transports can call the
//! handlers directly.

use futures::StreamExt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ByteSource, StreamError};
use crate::decode::{decode_lines, Decoded};
use crate::event::EventSink;
use crate::frame::FrameSplitter;
use crate::model::{Record, StreamRequest};
use crate::options::StreamOptions;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }
}

/// How a session ended.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Completed(Vec<Record>),
    /// Records decoded before the cancellation took effect
    Cancelled(Vec<Record>),
    Failed(Arc<StreamError>),
}

/// Append-only, shared view of a session's records.
///
/// Only the owning session appends; handles read.
#[derive(Debug, Clone, Default)]
pub struct RecordLog(Arc<RwLock<Vec<Record>>>);

impl RecordLog {
    pub fn len(&self) -> usize {
        self.read(|records| records.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Record> {
        self.read(|records| records.get(index).cloned())
    }

    /// Copy of every record so far.
    pub fn snapshot(&self) -> Vec<Record> {
        self.read(|records| records.to_vec())
    }

    fn push(&self, record: Record) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    fn read<T>(&self, f: impl FnOnce(&[Record]) -> T) -> T {
        f(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Caller-side handle to a running session.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    cancel: CancellationToken,
    records: RecordLog,
    state: watch::Receiver<SessionState>,
}

impl StreamHandle {
    /// Request cancellation. Idempotent, and a no-op once the session has ended.
    ///
    /// Takes effect before the next frame is processed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the session ended by cancellation.
    ///
    /// A `cancel` that arrives after the session completed or failed leaves
    /// this `false`.
    pub fn is_cancelled(&self) -> bool {
        self.state() == SessionState::Cancelled
    }

    /// Live view of the decoded records.
    pub fn records(&self) -> &RecordLog {
        &self.records
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Wait until the session reaches a terminal state.
    ///
    /// If the session is dropped first, returns the last state it reported.
    pub async fn finished(&self) -> SessionState {
        let mut state = self.state.clone();
        let result = state.wait_for(|s| s.is_terminal()).await.map(|s| *s);
        result.unwrap_or_else(|_| *state.borrow())
    }
}

/// One streaming session.
pub struct Session {
    request: StreamRequest,
    splitter: FrameSplitter,
    records: RecordLog,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
    sink: EventSink,
    error: Option<Arc<StreamError>>,
    bytes_received: usize,
}

impl Session {
    /// Create an idle session for `url`.
    ///
    /// Fails when the configured delimiter is empty.
    pub fn new(
        url: impl Into<String>,
        options: StreamOptions,
        sink: EventSink,
    ) -> Result<Self, StreamError> {
        let splitter = FrameSplitter::new(options.delimiter())?;
        let cancel = options
            .cancellation
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let (state, _) = watch::channel(SessionState::Idle);

        Ok(Self {
            request: StreamRequest::new(url, options.method, options.payload),
            splitter,
            records: RecordLog::default(),
            state,
            cancel,
            sink,
            error: None,
            bytes_received: 0,
        })
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn records(&self) -> &RecordLog {
        &self.records
    }

    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            cancel: self.cancel.clone(),
            records: self.records.clone(),
            state: self.state.subscribe(),
        }
    }

    /// `Idle -> Connecting`: the request is being issued.
    pub fn begin(&mut self) {
        if self.state() == SessionState::Idle {
            info!(
                "Opening stream: {} {}",
                self.request.method, self.request.url
            );
            self.transition(SessionState::Connecting);
        }
    }

    /// `Connecting -> Streaming`: the transport confirmed an open stream.
    pub fn on_open(&mut self) {
        self.begin();
        if self.state() == SessionState::Connecting {
            self.transition(SessionState::Streaming);
        }
    }

    /// Feed one body chunk. Returns the number of records appended.
    ///
    /// Ignored once the session is terminal or cancelled.
    pub fn on_chunk(&mut self, chunk: &[u8]) -> usize {
        if self.halted() {
            return 0;
        }
        self.on_open();

        self.bytes_received += chunk.len();
        let frames = self.splitter.feed(chunk);
        debug!(
            "Chunk received: {} bytes (total: {} bytes), {} frames, {} bytes buffered",
            chunk.len(),
            self.bytes_received,
            frames.len(),
            self.splitter.buffered()
        );

        let mut appended = 0;
        for frame in frames {
            if self.halted() {
                break;
            }
            appended += self.process_frame(&frame);
        }
        appended
    }

    /// Graceful end of stream: flush the remainder, then complete.
    pub fn on_end(&mut self) {
        if self.halted() {
            return;
        }
        self.on_open();

        if let Some(frame) = self.splitter.flush() {
            debug!("Flushing {} trailing bytes", frame.len());
            self.process_frame(&frame);
            if self.halted() {
                return;
            }
        }

        self.transition(SessionState::Completed);
        let records = self.records.snapshot();
        info!(
            "Stream completed: {} records, {} bytes",
            records.len(),
            self.bytes_received
        );
        self.sink.complete(records);
    }

    /// Transport failure: fail the session and report the error once.
    pub fn on_error(&mut self, error: StreamError) {
        if self.halted() {
            debug!("Ignoring transport error after session end: {}", error);
            return;
        }
        warn!("Stream failed: {}", error);
        self.transition(SessionState::Failed);
        let error = Arc::new(error);
        self.error = Some(error.clone());
        self.sink.error(&error);
    }

    /// Cancel the session. No `complete` or `error` event follows.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.halted();
    }

    /// How the session ended, or `None` while it is still live.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.state() {
            SessionState::Completed => Some(SessionOutcome::Completed(self.records.snapshot())),
            SessionState::Cancelled => Some(SessionOutcome::Cancelled(self.records.snapshot())),
            SessionState::Failed => self.error.clone().map(SessionOutcome::Failed),
            _ => None,
        }
    }

    /// Drive the session from `source` until it reaches a terminal state.
    ///
    /// Cancellation is observed while waiting for the transport; dropping
    /// the byte stream aborts it.
    pub async fn run<S: ByteSource + ?Sized>(mut self, source: &S) -> SessionOutcome {
        self.begin();
        let cancel = self.cancel.clone();

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = source.open(&self.request) => Some(opened),
        };
        let mut stream = match opened {
            Some(Ok(stream)) => stream,
            Some(Err(error)) => {
                self.on_error(error);
                return self.finish();
            }
            None => {
                self.halted();
                return self.finish();
            }
        };
        self.on_open();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };
            match next {
                Some(Some(Ok(chunk))) => {
                    self.on_chunk(&chunk);
                }
                Some(Some(Err(error))) => self.on_error(error),
                Some(None) => self.on_end(),
                None => {
                    self.halted();
                }
            }
            if self.state().is_terminal() {
                break;
            }
        }
        drop(stream);
        self.finish()
    }

    fn finish(self) -> SessionOutcome {
        match self.outcome() {
            Some(outcome) => outcome,
            None => SessionOutcome::Cancelled(self.records.snapshot()),
        }
    }

    fn process_frame(&mut self, frame: &[u8]) -> usize {
        let mut appended = 0;
        for decoded in decode_lines(frame) {
            match decoded {
                Decoded::Record(record) => {
                    if record.is_raw() {
                        debug!("Fallback record #{}", self.records.len());
                    }
                    self.records.push(record.clone());
                    self.sink.message(&record);
                    appended += 1;
                }
                Decoded::Diagnostic(diagnostic) => {
                    warn!("{}", diagnostic.detail);
                    self.sink.parse_error(&diagnostic);
                }
            }
        }
        appended
    }

    /// Whether processing must stop. Moves a cancelled, live session to `Cancelled`.
    fn halted(&mut self) -> bool {
        let state = self.state();
        if state.is_terminal() {
            return true;
        }
        if self.cancel.is_cancelled() {
            info!(
                "Stream cancelled after {} records, {} bytes",
                self.records.len(),
                self.bytes_received
            );
            self.transition(SessionState::Cancelled);
            return true;
        }
        false
    }

    fn transition(&mut self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!("Session state: {:?} -> {:?}", previous, next);
    }
}
