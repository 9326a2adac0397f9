//! Chat state machine: a single pure transition function.
//!
//! All mutations of the status and the message store go through
//! `ChatState::apply`. It performs no I/O; the session feeds it actions
//! and forwards the returned events to the bus.
//!
//! Callbacks of a stream carry the `StreamId` captured at submit time.
//! An action whose stream is no longer the current turn (superseded,
//! cancelled, or its conversation switched away) is dropped.

use krishi_types::{
    event::{ChatEvent, ChatStatus},
    message::{LocalId, Message},
    wire::Completion,
};
use crate::lifecycle::StreamId;
use crate::store::MessageStore;

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// User submitted text on a conversation
    Submit {
        stream_id: StreamId,
        conversation_id: String,
        text: String,
    },
    Chunk { stream_id: StreamId, text: String },
    Complete { stream_id: StreamId, completion: Completion },
    /// Transport or application failure, already rendered for display
    Fail { stream_id: StreamId, message: String },
    Cancelled { stream_id: StreamId },
    ClearError,
    SwitchConversation { conversation_id: Option<String> },
    /// History fetched for a conversation
    LoadHistory {
        conversation_id: String,
        messages: Vec<Message>,
    },
    /// History re-fetched after a turn the backend confirmed without ids.
    /// Applied only if nothing changed since `revision`.
    Reconcile {
        conversation_id: String,
        revision: u64,
        messages: Vec<Message>,
    },
}

/// The turn currently owning the trailing assistant message
#[derive(Debug, Clone, PartialEq, Eq)]
struct StreamTurn {
    stream_id: StreamId,
    conversation_id: String,
    user_message: LocalId,
}

#[derive(Debug, Default)]
pub struct ChatState {
    status: ChatStatus,
    store: MessageStore,
    active_conversation: Option<String>,
    turn: Option<StreamTurn>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ChatStatus {
        &self.status
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    /// Stream that currently owns the turn, if any
    pub fn current_stream(&self) -> Option<StreamId> {
        self.turn.as_ref().map(|t| t.stream_id)
    }

    /// Apply one action. Returns the events describing what changed:
    /// status first, then the message list, then action-specific ones.
    pub fn apply(&mut self, action: ChatAction) -> Vec<ChatEvent> {
        let status_before = self.status.clone();
        let revision_before = self.store.revision();

        let specific = self.transition(action);

        let mut events = Vec::with_capacity(specific.len() + 2);
        if self.status != status_before {
            events.push(ChatEvent::StatusChanged {
                status: self.status.clone(),
            });
        }
        if self.store.revision() != revision_before {
            events.push(ChatEvent::MessagesChanged {
                revision: self.store.revision(),
            });
        }
        events.extend(specific);
        events
    }

    fn transition(&mut self, action: ChatAction) -> Vec<ChatEvent> {
        match action {
            ChatAction::Submit {
                stream_id,
                conversation_id,
                text,
            } => {
                if self.status.is_streaming() || self.turn.is_some() {
                    log::debug!("Dropping submit for {}: a turn is already streaming", stream_id);
                    return Vec::new();
                }
                if text.trim().is_empty() {
                    return Vec::new();
                }
                if self.active_conversation.as_deref() != Some(conversation_id.as_str()) {
                    log::debug!("Dropping submit for inactive conversation {}", conversation_id);
                    return Vec::new();
                }
                let user_message = self.store.append_optimistic_user(&text);
                self.turn = Some(StreamTurn {
                    stream_id,
                    conversation_id,
                    user_message,
                });
                self.status = ChatStatus::Streaming;
                Vec::new()
            }

            ChatAction::Chunk { stream_id, text } => {
                if self.owns_turn(stream_id) {
                    self.store.append_or_extend_assistant(&text);
                } else {
                    log::debug!("Ignoring chunk from stale {}", stream_id);
                }
                Vec::new()
            }

            ChatAction::Complete {
                stream_id,
                completion,
            } => {
                let Some(turn) = self.take_turn(stream_id) else {
                    log::debug!("Ignoring completion from stale {}", stream_id);
                    return Vec::new();
                };
                let reply_id = self
                    .store
                    .finalize_assistant(&completion.full_text, &completion.meta);
                if let Some(server_id) = completion.user_message_id {
                    self.store.promote(turn.user_message, server_id);
                }
                if let Some(server_id) = completion.ai_message_id {
                    self.store.promote(reply_id, server_id);
                }
                // Whatever the backend left unconfirmed is kept, not optimistic
                self.store.settle(turn.user_message);
                self.store.settle(reply_id);
                self.status = ChatStatus::Idle;

                let reply = self
                    .store
                    .messages()
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                vec![ChatEvent::TurnCompleted {
                    conversation_id: turn.conversation_id,
                    reply,
                }]
            }

            ChatAction::Fail { stream_id, message } => {
                let Some(turn) = self.take_turn(stream_id) else {
                    log::debug!("Ignoring failure from stale {}: {}", stream_id, message);
                    return Vec::new();
                };
                self.discard_turn(&turn);
                self.status = ChatStatus::Error(message);
                Vec::new()
            }

            ChatAction::Cancelled { stream_id } => {
                if let Some(turn) = self.take_turn(stream_id) {
                    self.discard_turn(&turn);
                    self.status = ChatStatus::Idle;
                }
                Vec::new()
            }

            ChatAction::ClearError => {
                if self.status.error().is_some() {
                    self.status = ChatStatus::Idle;
                }
                Vec::new()
            }

            ChatAction::SwitchConversation { conversation_id } => {
                if self.active_conversation == conversation_id {
                    return Vec::new();
                }
                // The stream stays bound to the conversation it started on
                self.turn = None;
                if self.status.is_streaming() {
                    self.status = ChatStatus::Idle;
                }
                self.store.replace_all(Vec::new());
                self.active_conversation = conversation_id.clone();
                vec![ChatEvent::ActiveConversationChanged { conversation_id }]
            }

            ChatAction::LoadHistory {
                conversation_id,
                messages,
            } => {
                if !self.is_active(&conversation_id) {
                    log::debug!("Ignoring history for inactive conversation {}", conversation_id);
                    return Vec::new();
                }
                if self.turn.is_some() {
                    self.store.restore_history(messages);
                } else {
                    self.store.replace_all(messages);
                }
                Vec::new()
            }

            ChatAction::Reconcile {
                conversation_id,
                revision,
                messages,
            } => {
                if self.is_active(&conversation_id)
                    && self.turn.is_none()
                    && self.store.revision() == revision
                {
                    self.store.replace_all(messages);
                } else {
                    log::debug!("Skipping reconciliation of {}: list changed", conversation_id);
                }
                Vec::new()
            }
        }
    }

    fn is_active(&self, conversation_id: &str) -> bool {
        self.active_conversation.as_deref() == Some(conversation_id)
    }

    fn owns_turn(&self, stream_id: StreamId) -> bool {
        self.turn
            .as_ref()
            .is_some_and(|t| t.stream_id == stream_id && self.is_active(&t.conversation_id))
    }

    /// Remove the turn's user message and its partial reply
    fn discard_turn(&mut self, turn: &StreamTurn) {
        let mut ids = vec![turn.user_message];
        ids.extend(self.store.in_progress());
        self.store.discard(&ids);
    }

    fn take_turn(&mut self, stream_id: StreamId) -> Option<StreamTurn> {
        if self.owns_turn(stream_id) {
            self.turn.take()
        } else {
            None
        }
    }
}
