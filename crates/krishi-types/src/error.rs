use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Response body is null")]
    EmptyBody,

    /// Failure reported by the backend inside the stream
    #[error("{0}")]
    Stream(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("No conversation selected")]
    NoConversation,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),
}

impl ChatError {
    /// Build an error from a non-success HTTP response body.
    ///
    /// Prefers the JSON `detail` field, then `message`, then a generic
    /// status line.
    pub fn from_http(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let message = field("detail")
            .or_else(|| field("message"))
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        ChatError::Http { status, message }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ChatError::Cancelled)
    }

    /// Rejected before any request was made
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::EmptyMessage | ChatError::NoConversation)
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}
