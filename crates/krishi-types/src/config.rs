use serde::{Deserialize, Serialize};

/// Origin used when `KRISHI_API_URL` is not set at build time
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Client configuration. Every request targets `api_base`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base: String,
    pub user_id: String,
    pub mode: ChatMode,
    /// Use the streaming send endpoint
    pub streaming: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: option_env!("KRISHI_API_URL")
                .unwrap_or(DEFAULT_API_BASE)
                .to_string(),
            user_id: String::new(),
            mode: ChatMode::Krishi,
            streaming: true,
        }
    }
}

impl ClientConfig {
    pub fn endpoints(&self) -> Endpoints<'_> {
        Endpoints { config: self }
    }
}

/// Which assistant the chat talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode {
    /// General-purpose assistant
    General,
    /// Agronomy assistant with farm context
    Krishi,
}

impl ChatMode {
    fn send_path(&self) -> &str {
        match self {
            ChatMode::General => "/api/messages/send",
            ChatMode::Krishi => "/api/krishi/send",
        }
    }

    pub fn all() -> &'static [ChatMode] {
        &[ChatMode::General, ChatMode::Krishi]
    }

    pub fn label(&self) -> &str {
        match self {
            ChatMode::General => "General",
            ChatMode::Krishi => "KrishiGPT",
        }
    }

    /// Whether send requests carry a farm context
    pub fn uses_farm_context(&self) -> bool {
        matches!(self, ChatMode::Krishi)
    }
}

/// URL builder over a config
pub struct Endpoints<'a> {
    config: &'a ClientConfig,
}

impl Endpoints<'_> {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    pub fn send(&self) -> String {
        self.url(self.config.mode.send_path())
    }

    pub fn send_stream(&self) -> String {
        self.url(&format!("{}/stream", self.config.mode.send_path()))
    }

    pub fn conversations(&self) -> String {
        self.url("/api/conversations")
    }

    pub fn user_conversations(&self, user_id: &str) -> String {
        self.url(&format!("/api/conversations/user/{}", user_id))
    }

    pub fn conversation(&self, id: &str) -> String {
        self.url(&format!("/api/conversations/{}", id))
    }

    pub fn conversation_messages(&self, id: &str) -> String {
        self.url(&format!("/api/conversations/{}/messages", id))
    }
}
