//! Request/response bodies exchanged with the chat backend.
//!
//! The REST surface uses camelCase. Stream frames are emitted by the
//! backend in snake_case (`full_text`), with optional camelCase ids.

use serde::{Deserialize, Serialize};

use crate::conversation::Conversation;
use crate::message::{ConfidenceLevel, Message, MessageId, ReplyMetadata, Role};

/// Farm details sent along with a Krishi-mode question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_size_acres: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irrigation_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_summary: Option<String>,
}

impl FarmContext {
    pub fn is_empty(&self) -> bool {
        *self == FarmContext::default()
    }
}

/// Body of both send endpoints (streaming and non-streaming)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub conversation_id: String,
    pub user_message: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<FarmContext>,
}

/// Response of the non-streaming send endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    #[serde(default)]
    pub user_message_id: Option<String>,
    #[serde(default)]
    pub ai_message_id: Option<String>,
    pub ai_response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTitleRequest {
    pub title: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConversationRequest {
    pub user_id: String,
}

/// Response of the create-conversation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedConversation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CreatedConversation {
    pub fn into_conversation(self, fallback_title: &str) -> Conversation {
        Conversation::new(
            self.id,
            self.title.unwrap_or_else(|| fallback_title.to_string()),
            self.created_at
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        )
    }
}

/// A persisted message as returned by the fetch-messages endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Message {
            id: MessageId::Confirmed(record.id),
            role: record.role,
            content: record.content,
            created_at: record.created_at,
            tokens_used: record.tokens_used,
            confidence: None,
            intent: None,
        }
    }
}

/// JSON payload of one `data: ` frame of a streamed reply.
///
/// Every field is optional: a frame is dispatched on which fields are
/// present, in the order error → chunk → done.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, alias = "userMessageId", skip_serializing_if = "Option::is_none")]
    pub user_message_id: Option<String>,
    #[serde(default, alias = "aiMessageId", skip_serializing_if = "Option::is_none")]
    pub ai_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "tokensUsed", skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// Terminal success of one exchange, from either send endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Authoritative reply text
    pub full_text: String,
    pub meta: ReplyMetadata,
    pub user_message_id: Option<String>,
    pub ai_message_id: Option<String>,
}

impl Completion {
    pub fn text(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            ..Self::default()
        }
    }

    /// Both server ids are known, so optimistic messages can be promoted in place
    pub fn has_server_ids(&self) -> bool {
        self.user_message_id.is_some() && self.ai_message_id.is_some()
    }
}

impl From<SendResponse> for Completion {
    fn from(resp: SendResponse) -> Self {
        Completion {
            full_text: resp.ai_response,
            meta: ReplyMetadata {
                confidence: None,
                intent: None,
                tokens_used: resp.tokens_used,
            },
            user_message_id: resp.user_message_id,
            ai_message_id: resp.ai_message_id,
        }
    }
}

/// Parse a backend confidence string, dropping values it does not know
pub fn parse_confidence(raw: Option<&str>) -> Option<ConfidenceLevel> {
    let raw = raw?;
    match raw.parse() {
        Ok(level) => Some(level),
        Err(e) => {
            log::debug!("Ignoring confidence value: {}", e);
            None
        }
    }
}
