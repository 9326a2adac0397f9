//! Main egui application: composes the panels and drives the chat session.

use std::future::Future;
use std::rc::Rc;

use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};

use krishi_core::event_bus::EventBus;
use krishi_core::ports::{ConversationBackend, StreamTransport};
use krishi_core::{ChatSession, ConversationDirectory};
use krishi_platform::{FetchStreamTransport, HttpConversationBackend};
use krishi_types::config::ClientConfig;
use krishi_types::event::ChatEvent;
use krishi_ui::panels::chat::{self, ChatPanelAction};
use krishi_ui::panels::conversations::{self, SidebarAction};
use krishi_ui::panels::settings::{self, SettingsAction};
use krishi_ui::state::UiState;
use krishi_ui::theme;

use crate::settings::StoredSettings;

/// The main application state
pub struct KrishiApp {
    ui_state: UiState,
    config: ClientConfig,
    event_bus: EventBus,
    session: ChatSession,
    directory: ConversationDirectory,
    first_frame: bool,
}

impl KrishiApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let stored = StoredSettings::load();
        let event_bus = EventBus::new();

        let transport: Rc<dyn StreamTransport> = Rc::new(FetchStreamTransport::new());
        let backend: Rc<dyn ConversationBackend> =
            Rc::new(HttpConversationBackend::new(stored.config.clone()));
        let session = ChatSession::new(stored.config.clone(), transport, backend, event_bus.clone());
        session.set_farm_context(Some(stored.farm.clone()));
        let directory = ConversationDirectory::new(session.clone());

        let mut ui_state = UiState::new();
        ui_state.farm_context = stored.farm;

        Self {
            ui_state,
            config: stored.config,
            event_bus,
            session,
            directory,
            first_frame: true,
        }
    }

    /// Run `task` on the browser event loop and repaint when it settles
    fn spawn<F>(ctx: &egui::Context, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            task.await;
            ctx.request_repaint();
        });
    }

    /// Pull changed snapshots out of the session and directory
    fn sync(&mut self, ctx: &egui::Context) {
        let events = self.event_bus.drain();
        if !events.is_empty() {
            for event in &events {
                if let ChatEvent::TurnCompleted { conversation_id, reply } = event {
                    self.directory.record_turn(conversation_id, reply);
                }
            }
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }

        if self.ui_state.messages_stale {
            self.ui_state.set_messages(&self.session.messages());
        }
        if self.ui_state.conversations_stale {
            self.ui_state.set_conversations(&self.directory.conversations());
        }
    }

    fn apply_settings(&self) {
        let farm = self.ui_state.farm_context.clone();
        self.session.set_config(self.config.clone());
        self.session.set_farm_context(Some(farm.clone()));
        StoredSettings {
            config: self.config.clone(),
            farm,
        }
        .save();
    }
}

impl eframe::App for KrishiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            let directory = self.directory.clone();
            Self::spawn(ctx, async move {
                let _ = directory.refresh().await;
            });
            self.first_frame = false;
        }

        self.sync(ctx);

        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("KrishiGPT")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                ui.label(
                    RichText::new(format!(
                        "Mode: {} | {}",
                        self.config.mode.label(),
                        if self.config.streaming { "Streaming" } else { "Single reply" }
                    ))
                    .color(theme::TEXT_SECONDARY)
                    .small(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .selectable_label(self.ui_state.show_settings, "Settings")
                        .clicked()
                    {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                    }
                });
            });
        });

        // ── Conversation sidebar ─────────────────────────────
        SidePanel::left("conversations_panel")
            .min_width(220.0)
            .max_width(300.0)
            .show(ctx, |ui| {
                if let Some(action) = conversations::conversations_panel(ui, &mut self.ui_state) {
                    self.handle_sidebar(action, ctx);
                }
            });

        // ── Settings side panel ──────────────────────────────
        if self.ui_state.show_settings {
            SidePanel::right("settings_panel")
                .min_width(280.0)
                .max_width(350.0)
                .show(ctx, |ui| {
                    let action = settings::settings_panel(
                        ui,
                        &mut self.config,
                        &mut self.ui_state.farm_context,
                    );
                    if action == SettingsAction::Changed {
                        self.apply_settings();
                    }
                });
        }

        // ── Chat ─────────────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            if let Some(action) = chat::chat_panel(ui, &mut self.ui_state) {
                self.handle_chat(action, ctx);
            }
        });
    }
}

impl KrishiApp {
    fn handle_chat(&self, action: ChatPanelAction, ctx: &egui::Context) {
        match action {
            ChatPanelAction::Send(text) => {
                let session = self.session.clone();
                let events = self.event_bus.clone();
                Self::spawn(ctx, async move {
                    match session.send(&text).await {
                        Ok(outcome) => log::debug!("Send finished: {:?}", outcome),
                        Err(e) => {
                            log::warn!("Send rejected: {}", e);
                            events.emit(ChatEvent::Error {
                                message: e.to_string(),
                            });
                        }
                    }
                });
            }
            ChatPanelAction::Stop => self.session.cancel(),
            ChatPanelAction::DismissError => self.session.clear_error(),
        }
    }

    /// Directory failures are reported on the event bus by the directory itself
    fn handle_sidebar(&self, action: SidebarAction, ctx: &egui::Context) {
        let directory = self.directory.clone();
        match action {
            SidebarAction::Create => Self::spawn(ctx, async move {
                let _ = directory.create(None).await;
            }),
            SidebarAction::Select(id) => Self::spawn(ctx, async move {
                let _ = directory.select(&id).await;
            }),
            SidebarAction::Rename(id, title) => Self::spawn(ctx, async move {
                let _ = directory.rename(&id, &title).await;
            }),
            SidebarAction::Delete(id) => Self::spawn(ctx, async move {
                let _ = directory.delete(&id).await;
            }),
            SidebarAction::Refresh => Self::spawn(ctx, async move {
                let _ = directory.refresh().await;
            }),
        }
    }
}
