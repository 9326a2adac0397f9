//! Chat session: drives one conversation slot.
//!
//! Ties the request controller, the transport and the state machine
//! together:
//! 1. Validate and claim the in-flight slot (re-entrant sends are no-ops)
//! 2. Submit to the state machine (optimistic user message, `Streaming`)
//! 3. Stream the reply, dispatching every frame back into the machine
//! 4. Settle: release the slot, then reconcile history if the backend
//!    did not hand out message ids
//!
//! Network and stream failures never escape `send`; they end up as
//! `ChatStatus::Error`. Only validation errors are returned.

use std::cell::RefCell;
use std::rc::Rc;
use futures::future::{select, Either};
use krishi_types::{
    ChatError, Result,
    config::{ChatMode, ClientConfig},
    event::ChatStatus,
    message::Message,
    wire::{Completion, FarmContext, SendRequest},
};
use tokio_util::sync::CancellationToken;
use crate::event_bus::EventBus;
use crate::lifecycle::{RequestController, StreamId};
use crate::machine::{ChatAction, ChatState};
use crate::ports::{ConversationBackend, StreamTransport};
use crate::stream::{stream_post, StreamEnd, StreamHandler};

/// What became of a `send` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Another send was in flight; nothing happened
    Dropped,
    Completed,
    /// The failure is in `status()`
    Failed,
    Cancelled,
}

/// Shared chat session, clone-cheap via Rc.
#[derive(Clone)]
pub struct ChatSession {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    config: RefCell<ClientConfig>,
    state: RefCell<ChatState>,
    requests: RefCell<RequestController>,
    farm_context: RefCell<Option<FarmContext>>,
    transport: Rc<dyn StreamTransport>,
    backend: Rc<dyn ConversationBackend>,
    events: EventBus,
}

impl ChatSession {
    pub fn new(
        config: ClientConfig,
        transport: Rc<dyn StreamTransport>,
        backend: Rc<dyn ConversationBackend>,
        events: EventBus,
    ) -> Self {
        log::info!("Chat session using backend '{}'", backend.backend_name());
        Self {
            inner: Rc::new(SessionInner {
                config: RefCell::new(config),
                state: RefCell::new(ChatState::new()),
                requests: RefCell::new(RequestController::new()),
                farm_context: RefCell::new(None),
                transport,
                backend,
                events,
            }),
        }
    }

    // ─── Snapshots ───────────────────────────────────────────

    pub fn status(&self) -> ChatStatus {
        self.inner.state.borrow().status().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.borrow().messages().to_vec()
    }

    pub fn revision(&self) -> u64 {
        self.inner.state.borrow().revision()
    }

    pub fn active_conversation(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .active_conversation()
            .map(String::from)
    }

    /// True from the start of a send until its terminal callback
    pub fn is_sending(&self) -> bool {
        self.inner.requests.borrow().in_flight()
    }

    pub fn config(&self) -> ClientConfig {
        self.inner.config.borrow().clone()
    }

    pub fn set_config(&self, config: ClientConfig) {
        *self.inner.config.borrow_mut() = config;
    }

    pub fn farm_context(&self) -> Option<FarmContext> {
        self.inner.farm_context.borrow().clone()
    }

    pub fn set_farm_context(&self, context: Option<FarmContext>) {
        *self.inner.farm_context.borrow_mut() = context;
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn backend(&self) -> Rc<dyn ConversationBackend> {
        Rc::clone(&self.inner.backend)
    }

    // ─── Commands ────────────────────────────────────────────

    /// Send `text` on the active conversation and drive the reply to the end.
    ///
    /// Must be spawned via `wasm_bindgen_futures::spawn_local` in the browser.
    /// Returns `Err` only for validation failures, before any state change.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let conversation_id = self.active_conversation().ok_or(ChatError::NoConversation)?;

        let config = self.config();
        let request = SendRequest {
            conversation_id: conversation_id.clone(),
            user_message: text.to_string(),
            user_id: config.user_id.clone(),
            context: self.context_for(&config),
        };
        let body = serde_json::to_value(&request)?;

        let ticket = self.inner.requests.borrow_mut().begin(&conversation_id);
        let Some(ticket) = ticket else {
            return Ok(SendOutcome::Dropped);
        };
        let stream_id = ticket.stream_id;

        self.dispatch(ChatAction::Submit {
            stream_id,
            conversation_id: ticket.conversation_id.clone(),
            text: text.to_string(),
        });
        if self.inner.state.borrow().current_stream() != Some(stream_id) {
            self.inner.requests.borrow_mut().finish(stream_id);
            return Ok(SendOutcome::Dropped);
        }

        log::info!("{} started on conversation {}", stream_id, conversation_id);
        let mut handler = TurnHandler {
            session: self,
            stream_id,
            needs_reconcile: false,
        };
        let end = if config.streaming {
            let url = config.endpoints().send_stream();
            stream_post(
                &*self.inner.transport,
                &url,
                &body,
                &ticket.cancel,
                &mut handler,
            )
            .await
        } else {
            self.send_once(config.mode, &request, &ticket.cancel, &mut handler).await
        };
        let needs_reconcile = handler.needs_reconcile;
        log::info!("{} ended: {:?}", stream_id, end);

        match end {
            StreamEnd::Completed => {
                if needs_reconcile && self.active_conversation().as_deref() == Some(&*conversation_id) {
                    self.reconcile(&conversation_id).await;
                }
                Ok(SendOutcome::Completed)
            }
            StreamEnd::Failed => Ok(SendOutcome::Failed),
            StreamEnd::Cancelled => {
                self.inner.requests.borrow_mut().finish(stream_id);
                self.dispatch(ChatAction::Cancelled { stream_id });
                Ok(SendOutcome::Cancelled)
            }
        }
    }

    /// Stop the send in flight. Silent: the status returns to idle.
    pub fn cancel(&self) {
        let cancelled = self.inner.requests.borrow_mut().cancel();
        if let Some(stream_id) = cancelled {
            log::info!("{} cancelled by user", stream_id);
            self.dispatch(ChatAction::Cancelled { stream_id });
        }
    }

    pub fn clear_error(&self) {
        self.dispatch(ChatAction::ClearError);
    }

    /// Make another conversation (or none) active. A send in flight is
    /// cancelled and the message list is cleared until history arrives.
    pub fn switch_to(&self, conversation_id: Option<String>) {
        if self.active_conversation() == conversation_id {
            return;
        }
        let cancelled = self.inner.requests.borrow_mut().cancel();
        if let Some(stream_id) = cancelled {
            log::info!("{} cancelled by conversation switch", stream_id);
        }
        self.dispatch(ChatAction::SwitchConversation { conversation_id });
    }

    /// Fetch and install the history of `conversation_id`
    pub async fn load_history(&self, conversation_id: &str) -> Result<()> {
        let messages = self
            .inner
            .backend
            .fetch_messages(conversation_id)
            .await
            .map_err(|e| {
                log::warn!("Loading messages of {} failed: {}", conversation_id, e);
                e
            })?;
        log::debug!("Loaded {} messages for {}", messages.len(), conversation_id);
        self.dispatch(ChatAction::LoadHistory {
            conversation_id: conversation_id.to_string(),
            messages,
        });
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────

    fn dispatch(&self, action: ChatAction) {
        let events = self.inner.state.borrow_mut().apply(action);
        self.inner.events.emit_all(events);
    }

    fn context_for(&self, config: &ClientConfig) -> Option<FarmContext> {
        if !config.mode.uses_farm_context() {
            return None;
        }
        self.farm_context().filter(|ctx| !ctx.is_empty())
    }

    /// Non-streaming endpoint, settled through the same handler
    async fn send_once(
        &self,
        mode: ChatMode,
        request: &SendRequest,
        cancel: &CancellationToken,
        handler: &mut TurnHandler<'_>,
    ) -> StreamEnd {
        if cancel.is_cancelled() {
            return StreamEnd::Cancelled;
        }
        let mut cancelled = Box::pin(cancel.cancelled());
        match select(self.inner.backend.send_message(mode, request), cancelled.as_mut()).await {
            Either::Right(_) => StreamEnd::Cancelled,
            Either::Left((_, _)) if cancel.is_cancelled() => StreamEnd::Cancelled,
            Either::Left((Ok(response), _)) => {
                handler.on_complete(Completion::from(response));
                StreamEnd::Completed
            }
            Either::Left((Err(e), _)) if e.is_cancellation() => StreamEnd::Cancelled,
            Either::Left((Err(e), _)) => {
                log::warn!("Send to {} failed: {}", self.inner.backend.backend_name(), e);
                handler.on_error(e);
                StreamEnd::Failed
            }
        }
    }

    /// Replace the list with the backend's copy, unless anything moved meanwhile
    async fn reconcile(&self, conversation_id: &str) {
        let revision = self.revision();
        match self.inner.backend.fetch_messages(conversation_id).await {
            Ok(messages) => self.dispatch(ChatAction::Reconcile {
                conversation_id: conversation_id.to_string(),
                revision,
                messages,
            }),
            Err(e) => log::warn!("Reconciling history of {} failed: {}", conversation_id, e),
        }
    }
}

/// Routes decoded frames of one turn into the state machine.
/// Terminal callbacks release the in-flight slot synchronously.
struct TurnHandler<'a> {
    session: &'a ChatSession,
    stream_id: StreamId,
    needs_reconcile: bool,
}

impl TurnHandler<'_> {
    fn release(&self) {
        self.session.inner.requests.borrow_mut().finish(self.stream_id);
    }
}

impl StreamHandler for TurnHandler<'_> {
    fn on_chunk(&mut self, text: &str) {
        self.session.dispatch(ChatAction::Chunk {
            stream_id: self.stream_id,
            text: text.to_string(),
        });
    }

    fn on_complete(&mut self, completion: Completion) {
        self.needs_reconcile = !completion.has_server_ids();
        self.session.dispatch(ChatAction::Complete {
            stream_id: self.stream_id,
            completion,
        });
        self.release();
    }

    fn on_error(&mut self, error: ChatError) {
        self.release();
        self.session.dispatch(ChatAction::Fail {
            stream_id: self.stream_id,
            message: error.to_string(),
        });
    }
}
