//! Typed event fan-out for a streaming session.
//!
//! Events are delivered synchronously, in the order the session produces
//! them, to two kinds of consumers: callbacks registered on the
//! [`EventSink`], and channel subscribers obtained with
//! [`EventSink::subscribe`].

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::client::StreamError;
use crate::decode::ParseDiagnostic;
use crate::model::Record;

/// One notification emitted by a session.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A record was decoded
    Message(Record),
    /// A line could not become a record; the stream continues
    ParseError(ParseDiagnostic),
    /// The transport failed; last event of the session
    Error(Arc<StreamError>),
    /// The stream ended normally; carries every record of the session
    Complete(Vec<Record>),
}

type MessageFn = Box<dyn FnMut(&Record) + Send>;
type ParseErrorFn = Box<dyn FnMut(&str, &str) + Send>;
type ErrorFn = Box<dyn FnMut(&StreamError) + Send>;
type CompleteFn = Box<dyn FnMut(&[Record]) + Send>;

/// Listener table for one session.
///
/// # Example
/// ```rust
/// use streamkit::event::EventSink;
///
/// let sink = EventSink::new()
///     .on_message(|record| println!("record: {:?}", record))
///     .on_complete(|all| println!("done, {} records", all.len()));
/// ```
#[derive(Default)]
pub struct EventSink {
    on_message: Vec<MessageFn>,
    on_parse_error: Vec<ParseErrorFn>,
    on_error: Vec<ErrorFn>,
    on_complete: Vec<CompleteFn>,
    subscribers: Vec<mpsc::UnboundedSender<StreamEvent>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message(mut self, f: impl FnMut(&Record) + Send + 'static) -> Self {
        self.on_message.push(Box::new(f));
        self
    }

    /// Called with the offending text and a description.
    pub fn on_parse_error(mut self, f: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on_parse_error.push(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error.push(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnMut(&[Record]) + Send + 'static) -> Self {
        self.on_complete.push(Box::new(f));
        self
    }

    /// Receive every event of the session on a channel.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn message(&mut self, record: &Record) {
        for f in &mut self.on_message {
            f(record);
        }
        if !self.subscribers.is_empty() {
            self.publish(StreamEvent::Message(record.clone()));
        }
    }

    pub(crate) fn parse_error(&mut self, diagnostic: &ParseDiagnostic) {
        for f in &mut self.on_parse_error {
            f(&diagnostic.text, &diagnostic.detail);
        }
        if !self.subscribers.is_empty() {
            self.publish(StreamEvent::ParseError(diagnostic.clone()));
        }
    }

    pub(crate) fn error(&mut self, error: &Arc<StreamError>) {
        for f in &mut self.on_error {
            f(error.as_ref());
        }
        self.publish(StreamEvent::Error(error.clone()));
    }

    pub(crate) fn complete(&mut self, records: Vec<Record>) {
        for f in &mut self.on_complete {
            f(&records);
        }
        self.publish(StreamEvent::Complete(records));
    }

    fn publish(&mut self, event: StreamEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
