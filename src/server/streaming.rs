//! SSE relay from upstream text deltas to notes stream events.
//!
//! A [`NotesRelay`] moves through three phases: not started, streaming and
//! terminated. Before commit ([`NotesRelay::prime`]) an upstream failure is
//! returned to the caller so it can still answer with an HTTP error status.
//! After commit ([`NotesRelay::into_events`]) every failure becomes a single
//! in-stream [`NotesStreamEvent::Error`].

use axum::response::sse::Event;
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use tracing::{debug, error, info};

use crate::upstream::client::{DeltaStream, UpstreamError};

/// Message sent to the client for any failure. Details stay in the logs.
pub const GENERIC_FAILURE: &str = "Failed to generate notes";

/// One event on the notes stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesStreamEvent {
    /// A fragment of generated text.
    Content { text: String },
    /// Generation finished; nothing follows.
    Done,
    /// Generation failed; nothing follows.
    Error { message: String },
}

impl NotesStreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// JSON payload carried in the `data:` field.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Content { text } => json!({ "content": text }),
            Self::Done => json!({ "done": true }),
            Self::Error { message } => json!({ "error": message }),
        }
    }

    pub fn to_sse_event(&self) -> Event {
        Event::default().data(self.to_json().to_string())
    }
}

/// Relay state for one request.
pub struct NotesRelay {
    request_id: String,
    deltas: DeltaStream,
    pending: Option<String>,
    committed: bool,
    terminated: bool,
    fragments: usize,
    chars: usize,
}

impl NotesRelay {
    pub fn new(request_id: impl Into<String>, deltas: DeltaStream) -> Self {
        Self {
            request_id: request_id.into(),
            deltas,
            pending: None,
            committed: false,
            terminated: false,
            fragments: 0,
            chars: 0,
        }
    }

    /// Pull increments until the first non-empty fragment or the end of the
    /// upstream stream. The fragment is held back and emitted first once the
    /// relay is committed.
    pub async fn prime(&mut self) -> Result<(), UpstreamError> {
        debug_assert!(!self.committed, "prime called after commit");
        while let Some(item) = self.deltas.next().await {
            let text = item?;
            if !text.is_empty() {
                self.pending = Some(text);
                break;
            }
        }
        Ok(())
    }

    /// Commit to the streaming protocol and yield events until a terminal one.
    pub fn into_events(mut self) -> impl Stream<Item = NotesStreamEvent> + Send + 'static {
        self.committed = true;
        stream::unfold(self, |mut relay| async move {
            let event = relay.next_event().await?;
            Some((event, relay))
        })
    }

    async fn next_event(&mut self) -> Option<NotesStreamEvent> {
        if self.terminated {
            return None;
        }
        let event = match self.pending.take() {
            Some(text) => self.content(text),
            None => self.pull_event().await,
        };
        if event.is_terminal() {
            self.terminated = true;
        }
        Some(event)
    }

    async fn pull_event(&mut self) -> NotesStreamEvent {
        loop {
            match self.deltas.next().await {
                Some(Ok(text)) if text.is_empty() => continue,
                Some(Ok(text)) => return self.content(text),
                Some(Err(e)) => {
                    error!(
                        request_id = %self.request_id,
                        fragments = self.fragments,
                        error = %e,
                        "Error generating notes mid-stream"
                    );
                    return NotesStreamEvent::Error {
                        message: GENERIC_FAILURE.to_string(),
                    };
                }
                None => {
                    info!(
                        request_id = %self.request_id,
                        fragments = self.fragments,
                        chars = self.chars,
                        "Notes generation complete"
                    );
                    return NotesStreamEvent::Done;
                }
            }
        }
    }

    fn content(&mut self, text: String) -> NotesStreamEvent {
        self.fragments += 1;
        self.chars += text.chars().count();
        debug!(request_id = %self.request_id, len = text.len(), "Forwarding fragment");
        NotesStreamEvent::Content { text }
    }
}

/// Map relay events onto SSE frames.
pub fn notes_to_sse_stream(
    events: impl Stream<Item = NotesStreamEvent> + Send + 'static,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>> + Send + 'static {
    events.map(|event| Ok(event.to_sse_event()))
}
