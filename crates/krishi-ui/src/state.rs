//! UI-level state that drives rendering.
//! This is a read-only projection of the chat session and directory,
//! updated each frame by draining the EventBus. Events only mark what
//! changed; the app refreshes the stale parts from session snapshots.

use krishi_types::{
    conversation::Conversation,
    event::{ChatEvent, ChatStatus},
    message::{Message, Role},
    wire::FarmContext,
};

/// State visible to UI panels
pub struct UiState {
    /// Displayed messages of the active conversation
    pub messages: Vec<ChatEntry>,
    pub status: ChatStatus,
    pub conversations: Vec<ConversationEntry>,
    pub active_conversation: Option<String>,
    /// Input field content
    pub input_text: String,
    /// Last directory failure (load, create, rename, delete)
    pub notice: Option<String>,
    /// Conversation being renamed and its edit buffer
    pub renaming: Option<(String, String)>,
    /// Farm details edited in the settings panel
    pub farm_context: FarmContext,
    pub show_settings: bool,
    /// Message list must be re-read from the session
    pub messages_stale: bool,
    /// Conversation list must be re-read from the directory
    pub conversations_stale: bool,
}

/// A chat entry for display
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    /// Not yet confirmed by the backend
    pub pending: bool,
    pub confidence: Option<String>,
}

impl From<&Message> for ChatEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            pending: message.is_pending(),
            confidence: message.confidence.map(|c| c.label().to_string()),
        }
    }
}

/// A row of the conversation sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    pub id: String,
    pub title: String,
    pub preview: Option<String>,
    pub message_count: u32,
}

impl From<&Conversation> for ConversationEntry {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.clone(),
            title: conversation.title.clone(),
            preview: conversation.last_message.clone(),
            message_count: conversation.message_count,
        }
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            status: ChatStatus::Idle,
            conversations: Vec::new(),
            active_conversation: None,
            input_text: String::new(),
            notice: None,
            renaming: None,
            farm_context: FarmContext::default(),
            show_settings: false,
            messages_stale: false,
            conversations_stale: false,
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::StatusChanged { status } => {
                    self.status = status;
                }
                ChatEvent::MessagesChanged { .. } => {
                    self.messages_stale = true;
                }
                ChatEvent::ActiveConversationChanged { conversation_id } => {
                    self.active_conversation = conversation_id;
                    self.messages_stale = true;
                }
                ChatEvent::TurnCompleted { .. } | ChatEvent::ConversationsChanged => {
                    self.conversations_stale = true;
                }
                ChatEvent::Error { message } => {
                    self.notice = Some(message);
                }
            }
        }
    }

    pub fn set_messages(&mut self, messages: &[Message]) {
        self.messages = messages.iter().map(ChatEntry::from).collect();
        self.messages_stale = false;
    }

    pub fn set_conversations(&mut self, conversations: &[Conversation]) {
        self.conversations = conversations.iter().map(ConversationEntry::from).collect();
        self.conversations_stale = false;
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_streaming()
    }

    /// Submission is possible: a conversation is selected and nothing is streaming
    pub fn can_send(&self) -> bool {
        self.active_conversation.is_some() && !self.is_busy()
    }

    pub fn status_text(&self) -> &str {
        match &self.status {
            ChatStatus::Idle if self.active_conversation.is_none() => "No conversation",
            ChatStatus::Idle => "Ready",
            ChatStatus::Streaming => "Answering...",
            ChatStatus::Error(_) => "Error",
        }
    }

    pub fn active_title(&self) -> Option<&str> {
        let id = self.active_conversation.as_deref()?;
        self.conversations
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.title.as_str())
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
