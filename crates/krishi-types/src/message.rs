use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Identifier generated on the client for a message the backend has not confirmed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

/// Message identity. Optimistic messages carry a `Pending` id until their
/// turn settles. A turn the backend completed without handing out ids
/// leaves its messages `Settled` until history is reloaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Pending(LocalId),
    Settled(LocalId),
    Confirmed(String),
}

impl MessageId {
    pub fn is_pending(&self) -> bool {
        matches!(self, MessageId::Pending(_))
    }

    pub fn local(&self) -> Option<LocalId> {
        match self {
            MessageId::Pending(id) | MessageId::Settled(id) => Some(*id),
            MessageId::Confirmed(_) => None,
        }
    }

    pub fn server(&self) -> Option<&str> {
        match self {
            MessageId::Confirmed(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Pending(id) | MessageId::Settled(id) => id.fmt(f),
            MessageId::Confirmed(id) => f.write_str(id),
        }
    }
}

/// Confidence the backend attaches to an agronomy answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn label(&self) -> &str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
        }
    }
}

impl FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ConfidenceLevel::Low),
            "medium" => Ok(ConfidenceLevel::Medium),
            "high" => Ok(ConfidenceLevel::High),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

/// Metadata the backend attaches to a finished reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyMetadata {
    pub confidence: Option<ConfidenceLevel>,
    pub intent: Option<String>,
    pub tokens_used: Option<u32>,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// RFC 3339
    pub created_at: String,
    pub tokens_used: Option<u32>,
    pub confidence: Option<ConfidenceLevel>,
    pub intent: Option<String>,
}

impl Message {
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            tokens_used: None,
            confidence: None,
            intent: None,
        }
    }

    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content)
    }

    pub fn assistant(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, content)
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_pending()
    }

    pub fn attach(&mut self, meta: &ReplyMetadata) {
        if meta.confidence.is_some() {
            self.confidence = meta.confidence;
        }
        if meta.intent.is_some() {
            self.intent = meta.intent.clone();
        }
        if meta.tokens_used.is_some() {
            self.tokens_used = meta.tokens_used;
        }
    }
}
