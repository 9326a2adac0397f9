//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `krishi-core` (pure Rust).
//! Implementations live in `krishi-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;
use krishi_types::{
    Result,
    config::ChatMode,
    conversation::Conversation,
    message::Message,
    wire::{SendRequest, SendResponse},
};
use tokio_util::sync::CancellationToken;

/// Raw response body, one item per network read
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>>>>;

// ─── Stream Port ─────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StreamTransport {
    /// POST a JSON body and hand back the response body once headers arrive.
    ///
    /// A non-success status must resolve to `ChatError::Http` built from
    /// the error body, and a missing body to `ChatError::EmptyBody`.
    /// Implementations should abort the request when `cancel` fires.
    async fn open(
        &self,
        url: &str,
        body: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<ByteStream>;
}

// ─── Backend Port ────────────────────────────────────────────

/// Conversation persistence and the non-streaming send endpoint
#[async_trait(?Send)]
pub trait ConversationBackend {
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>>;

    async fn create_conversation(
        &self,
        user_id: &str,
        title: Option<&str>,
    ) -> Result<Conversation>;

    /// Messages of a conversation in chronological order
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    async fn rename_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<()>;

    async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> Result<()>;

    /// Non-streaming send to the endpoint of `mode`
    async fn send_message(&self, mode: ChatMode, req: &SendRequest) -> Result<SendResponse>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}
