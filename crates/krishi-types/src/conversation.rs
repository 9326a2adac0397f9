use serde::{Deserialize, Serialize};

/// Maximum length of the last-message preview shown in the conversation list
pub const PREVIEW_CHARS: usize = 100;

/// A named thread of messages between one user and the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(default)]
    pub message_count: u32,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: created_at.into(),
            updated_at: None,
            last_message: None,
            message_count: 0,
        }
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Account for one completed user/assistant exchange
    pub fn record_turn(&mut self, reply: &str) {
        self.last_message = Some(preview(reply));
        self.message_count += 2;
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }
}

/// First `PREVIEW_CHARS` characters of `text`, cut on a char boundary
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
