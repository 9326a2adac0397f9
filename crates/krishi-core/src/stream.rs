//! Streamed reply decoding.
//!
//! A reply body is a sequence of newline-terminated `data: <json>` frames.
//! Network reads can split a frame anywhere (even inside a UTF-8 sequence),
//! so bytes are buffered until a full line is available. Lines that are
//! blank, lack the marker, or carry malformed JSON are skipped: the backend
//! stream is noisy and one bad frame must not abort the reply.

use futures::future::{select, Either};
use futures::StreamExt;
use krishi_types::{
    ChatError,
    message::ReplyMetadata,
    wire::{parse_confidence, Completion, StreamFrame},
};
use tokio_util::sync::CancellationToken;
use crate::ports::{ByteStream, StreamTransport};

/// Prefix of every payload-carrying line
pub const DATA_MARKER: &str = "data: ";

/// Reported when the body ends with neither `done` nor text
pub const UNTERMINATED_STREAM: &str = "Stream ended before completion";

/// Receives decoded stream events, in the order the bytes arrived.
/// At most one of `on_complete` / `on_error` fires per stream.
pub trait StreamHandler {
    fn on_chunk(&mut self, text: &str);
    fn on_complete(&mut self, completion: Completion);
    fn on_error(&mut self, error: ChatError);
}

/// How a stream stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    Failed,
    /// Stopped by the cancel token; no terminal callback fired
    Cancelled,
}

// ─── Line reassembly ─────────────────────────────────────────

/// Holds bytes until a newline completes the line
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one read and return every line it completed
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }

    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_suffix('\r').unwrap_or(&text).to_string()
}

/// Decode one line into a frame. `None` for anything that is not a
/// well-formed `data: ` frame.
pub fn parse_frame(line: &str) -> Option<StreamFrame> {
    let payload = line.strip_prefix(DATA_MARKER)?;
    match serde_json::from_str::<StreamFrame>(payload) {
        Ok(frame) => Some(frame),
        Err(e) => {
            log::debug!("Skipping malformed stream frame: {}", e);
            None
        }
    }
}

// ─── Frame dispatch ──────────────────────────────────────────

/// Per-stream dispatch state: the text accumulated from chunks so far
#[derive(Debug, Default)]
struct FrameDispatcher {
    accumulated: String,
}

impl FrameDispatcher {
    /// Returns the end state when the frame was terminal
    fn dispatch(&mut self, frame: StreamFrame, handler: &mut dyn StreamHandler) -> Option<StreamEnd> {
        if let Some(message) = non_empty(frame.error) {
            handler.on_error(ChatError::Stream(message));
            return Some(StreamEnd::Failed);
        }

        if let Some(chunk) = frame.chunk.as_deref().filter(|c| !c.is_empty()) {
            self.accumulated.push_str(chunk);
            handler.on_chunk(chunk);
        }

        if frame.done {
            let full_text =
                non_empty(frame.full_text).unwrap_or_else(|| self.accumulated.clone());
            handler.on_complete(Completion {
                full_text,
                meta: ReplyMetadata {
                    confidence: parse_confidence(frame.confidence.as_deref()),
                    intent: non_empty(frame.intent),
                    tokens_used: frame.tokens_used,
                },
                user_message_id: non_empty(frame.user_message_id),
                ai_message_id: non_empty(frame.ai_message_id),
            });
            return Some(StreamEnd::Completed);
        }

        None
    }

    /// The body ended without a terminal frame
    fn finish(self, handler: &mut dyn StreamHandler) -> StreamEnd {
        if self.accumulated.is_empty() {
            handler.on_error(ChatError::Stream(UNTERMINATED_STREAM.to_string()));
            StreamEnd::Failed
        } else {
            log::debug!("Stream ended without done frame; completing with accumulated text");
            handler.on_complete(Completion::text(self.accumulated));
            StreamEnd::Completed
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// ─── Readers ─────────────────────────────────────────────────

/// Read a reply body to its end, dispatching frames to `handler`.
///
/// The token is checked between reads and before every frame; once it
/// is observed as cancelled nothing else reaches the handler.
pub async fn read_stream(
    mut body: ByteStream,
    cancel: &CancellationToken,
    handler: &mut dyn StreamHandler,
) -> StreamEnd {
    let mut buffer = FrameBuffer::new();
    let mut dispatcher = FrameDispatcher::default();
    let mut cancelled = Box::pin(cancel.cancelled());

    loop {
        if cancel.is_cancelled() {
            return StreamEnd::Cancelled;
        }

        let bytes = match select(body.next(), cancelled.as_mut()).await {
            Either::Right(_) => return StreamEnd::Cancelled,
            Either::Left((None, _)) => break,
            Either::Left((Some(Err(e)), _)) => {
                if cancel.is_cancelled() {
                    return StreamEnd::Cancelled;
                }
                handler.on_error(e);
                return StreamEnd::Failed;
            }
            Either::Left((Some(Ok(bytes)), _)) => bytes,
        };

        for line in buffer.push(&bytes) {
            if cancel.is_cancelled() {
                return StreamEnd::Cancelled;
            }
            if let Some(frame) = parse_frame(&line) {
                if let Some(end) = dispatcher.dispatch(frame, handler) {
                    return end;
                }
            }
        }
    }

    if cancel.is_cancelled() {
        return StreamEnd::Cancelled;
    }
    if let Some(frame) = buffer.finish().as_deref().and_then(parse_frame) {
        if let Some(end) = dispatcher.dispatch(frame, handler) {
            return end;
        }
    }
    dispatcher.finish(handler)
}

/// Open a streaming POST and read it to the end.
///
/// Failures to open (network, non-success status, missing body) reach
/// `handler.on_error`; cancellation never does.
pub async fn stream_post(
    transport: &dyn StreamTransport,
    url: &str,
    body: &serde_json::Value,
    cancel: &CancellationToken,
    handler: &mut dyn StreamHandler,
) -> StreamEnd {
    if cancel.is_cancelled() {
        return StreamEnd::Cancelled;
    }

    let opened = {
        let mut cancelled = Box::pin(cancel.cancelled());
        match select(transport.open(url, body, cancel), cancelled.as_mut()).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => return StreamEnd::Cancelled,
        }
    };

    match opened {
        Ok(stream) => read_stream(stream, cancel, handler).await,
        Err(e) if e.is_cancellation() || cancel.is_cancelled() => StreamEnd::Cancelled,
        Err(e) => {
            log::warn!("Stream request to {} failed: {}", url, e);
            handler.on_error(e);
            StreamEnd::Failed
        }
    }
}
