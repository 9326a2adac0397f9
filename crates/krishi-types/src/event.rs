use serde::{Deserialize, Serialize};

/// Externally observable status of the chat.
///
/// `Streaming` holds exactly while a stream session is open for the
/// active conversation. Only `Error` carries a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatStatus {
    Idle,
    Streaming,
    Error(String),
}

impl ChatStatus {
    pub fn is_streaming(&self) -> bool {
        matches!(self, ChatStatus::Streaming)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ChatStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl Default for ChatStatus {
    fn default() -> Self {
        ChatStatus::Idle
    }
}

/// Events emitted by the chat session and conversation directory.
/// The UI drains these to know when to re-read its snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// Status transition (idle / streaming / error)
    StatusChanged { status: ChatStatus },

    /// The active message list was mutated
    MessagesChanged { revision: u64 },

    /// A different conversation (or none) is now active
    ActiveConversationChanged { conversation_id: Option<String> },

    /// An exchange finished successfully
    TurnCompleted { conversation_id: String, reply: String },

    /// The conversation list was refreshed or edited
    ConversationsChanged,

    /// A directory operation failed (load, create, rename, delete)
    Error { message: String },
}
