//! Conversation directory: the user's conversation list.
//!
//! Selecting or creating a conversation retargets the chat session.
//! Creation always waits for the backend: a conversation id is needed
//! before the first message can be sent. Failures leave both the list
//! and the session untouched and are reported as `ChatEvent::Error`.

use std::cell::RefCell;
use std::rc::Rc;
use krishi_types::{
    ChatError, Result,
    conversation::Conversation,
    event::ChatEvent,
};
use crate::ports::ConversationBackend;
use crate::session::ChatSession;

/// Title given to conversations created without one
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Shared directory, clone-cheap via Rc.
#[derive(Clone)]
pub struct ConversationDirectory {
    inner: Rc<DirectoryInner>,
}

struct DirectoryInner {
    session: ChatSession,
    backend: Rc<dyn ConversationBackend>,
    conversations: RefCell<Vec<Conversation>>,
}

impl ConversationDirectory {
    pub fn new(session: ChatSession) -> Self {
        let backend = session.backend();
        Self {
            inner: Rc::new(DirectoryInner {
                session,
                backend,
                conversations: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.inner.session
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner.conversations.borrow().clone()
    }

    pub fn get(&self, conversation_id: &str) -> Option<Conversation> {
        self.inner
            .conversations
            .borrow()
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    /// The conversation sends currently target
    pub fn active(&self) -> Option<Conversation> {
        let id = self.inner.session.active_conversation()?;
        self.get(&id)
    }

    /// Reload the list from the backend
    pub async fn refresh(&self) -> Result<()> {
        let user_id = self.user_id().map_err(|e| self.report("refresh", e))?;
        let conversations = self
            .inner
            .backend
            .list_conversations(&user_id)
            .await
            .map_err(|e| self.report("refresh", e))?;
        log::debug!("Loaded {} conversations", conversations.len());
        *self.inner.conversations.borrow_mut() = conversations;
        self.changed();
        Ok(())
    }

    /// Create a conversation on the backend, then make it active
    pub async fn create(&self, title: Option<&str>) -> Result<Conversation> {
        let user_id = self.user_id().map_err(|e| self.report("create", e))?;
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let conversation = self
            .inner
            .backend
            .create_conversation(&user_id, title)
            .await
            .map_err(|e| self.report("create", e))?;
        log::info!("Created conversation {}", conversation.id);

        self.inner
            .conversations
            .borrow_mut()
            .insert(0, conversation.clone());
        self.changed();
        // Fresh conversations have no history to fetch
        self.inner.session.switch_to(Some(conversation.id.clone()));
        Ok(conversation)
    }

    /// Make `conversation_id` active and load its messages.
    /// Selecting the active conversation again does nothing.
    pub async fn select(&self, conversation_id: &str) -> Result<()> {
        let session = &self.inner.session;
        if session.active_conversation().as_deref() == Some(conversation_id) {
            return Ok(());
        }
        session.switch_to(Some(conversation_id.to_string()));
        session
            .load_history(conversation_id)
            .await
            .map_err(|e| self.report("select", e))
    }

    pub async fn rename(&self, conversation_id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }
        let user_id = self.user_id().map_err(|e| self.report("rename", e))?;
        self.inner
            .backend
            .rename_conversation(conversation_id, &user_id, title)
            .await
            .map_err(|e| self.report("rename", e))?;

        self.update(conversation_id, |c| c.rename(title));
        Ok(())
    }

    /// Delete on the backend. Deleting the active conversation clears the session.
    pub async fn delete(&self, conversation_id: &str) -> Result<()> {
        let user_id = self.user_id().map_err(|e| self.report("delete", e))?;
        self.inner
            .backend
            .delete_conversation(conversation_id, &user_id)
            .await
            .map_err(|e| self.report("delete", e))?;
        log::info!("Deleted conversation {}", conversation_id);

        self.inner
            .conversations
            .borrow_mut()
            .retain(|c| c.id != conversation_id);
        self.changed();
        if self.inner.session.active_conversation().as_deref() == Some(conversation_id) {
            self.inner.session.switch_to(None);
        }
        Ok(())
    }

    /// Account for a completed exchange in the local list
    pub fn record_turn(&self, conversation_id: &str, reply: &str) {
        self.update(conversation_id, |c| c.record_turn(reply));
    }

    fn update(&self, conversation_id: &str, apply: impl FnOnce(&mut Conversation)) {
        let found = {
            let mut conversations = self.inner.conversations.borrow_mut();
            match conversations.iter_mut().find(|c| c.id == conversation_id) {
                Some(conversation) => {
                    apply(conversation);
                    true
                }
                None => false,
            }
        };
        if found {
            self.changed();
        }
    }

    fn user_id(&self) -> Result<String> {
        let user_id = self.inner.session.config().user_id;
        if user_id.is_empty() {
            return Err(ChatError::Config("No user id configured".to_string()));
        }
        Ok(user_id)
    }

    fn changed(&self) {
        self.inner.session.events().emit(ChatEvent::ConversationsChanged);
    }

    fn report(&self, operation: &str, error: ChatError) -> ChatError {
        log::warn!("Conversation {} failed: {}", operation, error);
        self.inner.session.events().emit(ChatEvent::Error {
            message: error.to_string(),
        });
        error
    }
}
