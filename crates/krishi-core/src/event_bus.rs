//! Event queue between the chat session and the UI.
//!
//! Single-threaded (WASM), drained by the UI once per frame. A streamed
//! reply changes the message list on every chunk, so back-to-back
//! `MessagesChanged` notifications collapse into the newest one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use krishi_types::event::ChatEvent;

/// Shared event queue, clone-cheap via Rc.
#[derive(Clone, Default)]
pub struct EventBus {
    queue: Rc<RefCell<VecDeque<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ChatEvent) {
        let mut queue = self.queue.borrow_mut();
        if let ChatEvent::MessagesChanged { .. } = event {
            if let Some(ChatEvent::MessagesChanged { .. }) = queue.back() {
                queue.pop_back();
            }
        }
        queue.push_back(event);
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = ChatEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Everything queued since the last drain, oldest first
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }
}
