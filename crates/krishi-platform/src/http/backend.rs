//! REST adapter for conversations and the non-streaming send endpoints.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use krishi_core::directory::DEFAULT_TITLE;
use krishi_core::ports::ConversationBackend;
use krishi_types::{
    ChatError, Result,
    config::{ChatMode, ClientConfig},
    conversation::Conversation,
    message::Message,
    wire::{
        CreateConversationRequest, CreatedConversation, DeleteConversationRequest,
        MessageRecord, SendRequest, SendResponse, UpdateTitleRequest,
    },
};
use super::{error_from_response, network_error};

/// Talks to the chat backend at `config.api_base`
pub struct HttpConversationBackend {
    config: ClientConfig,
}

impl HttpConversationBackend {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Config for a request in `mode`; only the send path depends on it
    fn with_mode(&self, mode: ChatMode) -> ClientConfig {
        ClientConfig {
            mode,
            ..self.config.clone()
        }
    }
}

async fn ensure_ok(response: Response) -> Result<Response> {
    if response.ok() {
        Ok(response)
    } else {
        let error = error_from_response(response).await;
        log::warn!("Backend request failed: {}", error);
        Err(error)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| ChatError::Serialization(e.to_string()))
}

#[async_trait(?Send)]
impl ConversationBackend for HttpConversationBackend {
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let url = self.config.endpoints().user_conversations(user_id);
        let response = Request::get(&url).send().await.map_err(network_error)?;
        read_json(ensure_ok(response).await?).await
    }

    async fn create_conversation(
        &self,
        user_id: &str,
        title: Option<&str>,
    ) -> Result<Conversation> {
        let body = CreateConversationRequest {
            user_id: user_id.to_string(),
            title: title.map(String::from),
        };
        let response = Request::post(&self.config.endpoints().conversations())
            .json(&body)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;
        let created: CreatedConversation = read_json(ensure_ok(response).await?).await?;
        Ok(created.into_conversation(title.unwrap_or(DEFAULT_TITLE)))
    }

    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let url = self.config.endpoints().conversation_messages(conversation_id);
        let response = Request::get(&url).send().await.map_err(network_error)?;
        let records: Vec<MessageRecord> = read_json(ensure_ok(response).await?).await?;
        Ok(records.into_iter().map(Message::from).collect())
    }

    async fn rename_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<()> {
        let body = UpdateTitleRequest {
            title: title.to_string(),
            user_id: user_id.to_string(),
        };
        let response = Request::patch(&self.config.endpoints().conversation(conversation_id))
            .json(&body)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;
        ensure_ok(response).await?;
        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> Result<()> {
        let body = DeleteConversationRequest {
            user_id: user_id.to_string(),
        };
        let response = Request::delete(&self.config.endpoints().conversation(conversation_id))
            .json(&body)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;
        ensure_ok(response).await?;
        Ok(())
    }

    async fn send_message(&self, mode: ChatMode, req: &SendRequest) -> Result<SendResponse> {
        let url = self.with_mode(mode).endpoints().send();
        let response = Request::post(&url)
            .json(req)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;
        read_json(ensure_ok(response).await?).await
    }

    fn backend_name(&self) -> &str {
        "http"
    }
}
