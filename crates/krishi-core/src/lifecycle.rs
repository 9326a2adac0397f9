//! Request lifecycle: one outstanding send per session.
//!
//! The in-flight flag is set synchronously before any network call and
//! cleared synchronously by whichever terminal path runs first (success,
//! failure, cancellation). Starting a new request cancels the token of
//! the previous one.

use std::fmt;
use tokio_util::sync::CancellationToken;

/// Identifies one send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

impl StreamId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Handed to the caller of `begin`; everything a send needs to run
#[derive(Debug, Clone)]
pub struct Ticket {
    pub stream_id: StreamId,
    pub conversation_id: String,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct ActiveRequest {
    stream_id: StreamId,
    conversation_id: String,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RequestController {
    issued: u64,
    in_flight: bool,
    /// Most recent request; kept after it settles so the next one supersedes it
    last: Option<ActiveRequest>,
}

impl RequestController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request. `None` while another one is in flight (the
    /// caller's send is a no-op).
    pub fn begin(&mut self, conversation_id: &str) -> Option<Ticket> {
        if self.in_flight {
            log::debug!("Send ignored: a request is already in flight");
            return None;
        }
        if let Some(previous) = self.last.take() {
            previous.cancel.cancel();
        }

        self.issued += 1;
        let stream_id = StreamId(self.issued);
        let cancel = CancellationToken::new();
        self.in_flight = true;
        self.last = Some(ActiveRequest {
            stream_id,
            conversation_id: conversation_id.to_string(),
            cancel: cancel.clone(),
        });

        Some(Ticket {
            stream_id,
            conversation_id: conversation_id.to_string(),
            cancel,
        })
    }

    /// Clear the flag if `stream_id` is the request in flight.
    /// Returns false for a request that was already settled or superseded.
    pub fn finish(&mut self, stream_id: StreamId) -> bool {
        if self.in_flight && self.current() == Some(stream_id) {
            self.in_flight = false;
            true
        } else {
            false
        }
    }

    /// Cancel the request in flight, if any, and clear the flag
    pub fn cancel(&mut self) -> Option<StreamId> {
        if !self.in_flight {
            return None;
        }
        self.in_flight = false;
        self.last.as_ref().map(|req| {
            req.cancel.cancel();
            req.stream_id
        })
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Id of the request in flight
    pub fn current(&self) -> Option<StreamId> {
        self.last
            .as_ref()
            .filter(|_| self.in_flight)
            .map(|req| req.stream_id)
    }

    /// Conversation the request in flight targets
    pub fn conversation(&self) -> Option<&str> {
        self.last
            .as_ref()
            .filter(|_| self.in_flight)
            .map(|req| req.conversation_id.as_str())
    }
}
