//! Ordered message log of the active conversation.
//!
//! Messages are only ever appended at the tail. The one exception to
//! immutability is the assistant message of the turn being streamed,
//! which grows in place until it is finalized.

use krishi_types::message::{LocalId, Message, MessageId, ReplyMetadata, Role};

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    /// Assistant message currently receiving chunks
    in_progress: Option<LocalId>,
    /// Bumped on every mutation
    revision: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_progress(&self) -> Option<LocalId> {
        self.in_progress
    }

    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(Message::is_pending)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// The in-progress assistant id, if that message is still the tail
    fn streamed_tail(&self) -> Option<LocalId> {
        let current = self.in_progress?;
        self.messages
            .last()
            .filter(|m| m.role == Role::Assistant && m.id == MessageId::Pending(current))
            .map(|_| current)
    }

    /// Append the user's message before the backend has seen it.
    /// Starts a new turn.
    pub fn append_optimistic_user(&mut self, text: &str) -> LocalId {
        let id = LocalId::new();
        self.messages.push(Message::user(MessageId::Pending(id), text));
        self.in_progress = None;
        self.touch();
        id
    }

    /// Grow the assistant message of the current turn, creating it on
    /// the first chunk.
    pub fn append_or_extend_assistant(&mut self, text: &str) -> LocalId {
        if let Some(current) = self.streamed_tail() {
            if let Some(tail) = self.messages.last_mut() {
                tail.content.push_str(text);
            }
            self.touch();
            return current;
        }
        let id = LocalId::new();
        self.messages.push(Message::assistant(MessageId::Pending(id), text));
        self.in_progress = Some(id);
        self.touch();
        id
    }

    /// Overwrite the streamed assistant message with the authoritative
    /// text and attach metadata. When the turn produced no chunks the
    /// reply is appended instead, so every user message is answered.
    pub fn finalize_assistant(&mut self, full_text: &str, meta: &ReplyMetadata) -> LocalId {
        let finalized = match self.streamed_tail() {
            Some(current) => {
                if let Some(tail) = self.messages.last_mut() {
                    if !full_text.is_empty() {
                        tail.content = full_text.to_string();
                    }
                    tail.attach(meta);
                }
                current
            }
            None => {
                let id = LocalId::new();
                let mut reply = Message::assistant(MessageId::Pending(id), full_text);
                reply.attach(meta);
                self.messages.push(reply);
                id
            }
        };
        self.in_progress = None;
        self.touch();
        finalized
    }

    /// Swap a local id for the backend's canonical one
    pub fn promote(&mut self, local: LocalId, server_id: impl Into<String>) -> bool {
        let target = MessageId::Pending(local);
        match self.messages.iter_mut().find(|m| m.id == target) {
            Some(message) => {
                message.id = MessageId::Confirmed(server_id.into());
                if self.in_progress == Some(local) {
                    self.in_progress = None;
                }
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Mark a finished message as kept even though the backend gave no id.
    /// Only `Pending` messages change.
    pub fn settle(&mut self, local: LocalId) -> bool {
        let target = MessageId::Pending(local);
        match self.messages.iter_mut().find(|m| m.id == target) {
            Some(message) => {
                message.id = MessageId::Settled(local);
                if self.in_progress == Some(local) {
                    self.in_progress = None;
                }
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Drop every message still pending. Returns how many went.
    pub fn discard_optimistic(&mut self) -> usize {
        self.remove_pending(|_| true)
    }

    /// Drop the pending messages among `ids`; settled and confirmed ones stay
    pub fn discard(&mut self, ids: &[LocalId]) -> usize {
        self.remove_pending(|local| ids.contains(&local))
    }

    fn remove_pending(&mut self, selected: impl Fn(LocalId) -> bool) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| match m.id {
            MessageId::Pending(local) => !selected(local),
            _ => true,
        });
        if self.in_progress.is_some_and(|local| selected(local)) {
            self.in_progress = None;
        }
        let removed = before - self.messages.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Bulk-set the list (conversation switch, history load)
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.in_progress = None;
        self.touch();
    }

    /// Install loaded history underneath a turn that started before it
    /// arrived. Unconfirmed messages stay at the tail, in order.
    pub fn restore_history(&mut self, history: Vec<Message>) {
        let pending: Vec<Message> = self.messages.drain(..).filter(Message::is_pending).collect();
        self.messages = history;
        self.messages.extend(pending);
        self.touch();
    }
}
