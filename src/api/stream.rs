//! Incremental reader for streamed chat replies
//!
//! The backend answers a streaming chat request with a body of
//! `data: {json}` lines separated by blank lines. Chunks arrive at arbitrary
//! byte boundaries, so the reader keeps both undecoded bytes (a multi-byte
//! character may be split across chunks) and the unfinished last line.

use crate::api::types::StreamEvent;
use crate::error::{GrowthError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// Stream of decoded reply events, ending after the first terminal event
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

// ---------------------------------------------------------------------------
// Line decoding
// ---------------------------------------------------------------------------

/// Turns arbitrary byte chunks into complete text lines
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
    line: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();

        let mut lines = Vec::new();
        while let Some(pos) = self.line.find('\n') {
            let mut line: String = self.line.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// Return the unterminated last line, if any, once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.line.push_str(&String::from_utf8_lossy(&rest));
        }
        let line = std::mem::take(&mut self.line);
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.line.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    // valid_up_to is always a char boundary
                    if let Ok(text) = std::str::from_utf8(&self.pending[..valid]) {
                        self.line.push_str(text);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(bad) => {
                            self.line.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }
}

/// Parse one line of the body into an event
///
/// Lines without a `data:` prefix and payloads that are not valid JSON are
/// skipped.
pub fn parse_event_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("Skipping malformed stream payload {:?}: {}", payload, e);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Event streams
// ---------------------------------------------------------------------------

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: LineDecoder,
    queue: VecDeque<StreamEvent>,
    ended: bool,
}

impl<S> DecodeState<S> {
    fn enqueue(&mut self, line: &str) {
        if let Some(event) = parse_event_line(line) {
            self.queue.push_back(event);
        }
    }
}

/// Decode a raw response body into reply events
///
/// The returned stream yields events in order, stops after the first `done`
/// or `error` event, and yields a [`GrowthError::Stream`] if the body fails
/// mid-way.
pub fn decode_events<S, E>(bytes: S) -> EventStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: LineDecoder::new(),
        queue: VecDeque::new(),
        ended: false,
    };

    let events = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.queue.pop_front() {
                if event.is_terminal() {
                    state.queue.clear();
                    state.ended = true;
                }
                return Some((Ok(event), state));
            }
            if state.ended {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for line in state.decoder.push(&chunk) {
                        state.enqueue(&line);
                    }
                }
                Some(Err(e)) => {
                    state.ended = true;
                    let err = GrowthError::Stream(e.to_string());
                    return Some((Err(err.into()), state));
                }
                None => {
                    state.ended = true;
                    if let Some(line) = state.decoder.finish() {
                        state.enqueue(&line);
                    }
                }
            }
        }
    });

    Box::pin(events)
}

/// Present a non-streamed reply as a one-chunk stream
pub fn single_reply(reply: Option<String>) -> EventStream {
    let mut events = Vec::new();
    if let Some(text) = reply.filter(|t| !t.is_empty()) {
        events.push(Ok(StreamEvent::content(&text)));
    }
    events.push(Ok(StreamEvent::done()));
    Box::pin(futures::stream::iter(events))
}
