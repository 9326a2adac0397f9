//! Chat panel: messages of the active conversation, error banner and input.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use krishi_types::message::Role;
use crate::state::{ChatEntry, UiState};
use crate::theme::*;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPanelAction {
    Send(String),
    /// Stop the reply being streamed
    Stop,
    DismissError,
}

/// Render the chat panel. Returns an action when the user submits, stops or dismisses.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatPanelAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    let title = state.active_title().unwrap_or("KrishiGPT").to_string();
                    ui.heading(RichText::new(title).color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status_color = if state.is_busy() { HARVEST } else { ACCENT };
                        ui.label(
                            RichText::new(state.status_text())
                                .color(status_color)
                                .small(),
                        );
                    });
                });

                ui.separator();

                if let Some(message) = state.status.error() {
                    if error_banner(ui, message) {
                        action = Some(ChatPanelAction::DismissError);
                    }
                    ui.add_space(4.0);
                }

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if state.messages.is_empty() {
                            ui.label(
                                RichText::new(empty_hint(state))
                                    .color(TEXT_SECONDARY)
                                    .italics(),
                            );
                        }
                        let last = state.messages.len().saturating_sub(1);
                        for (i, entry) in state.messages.iter().enumerate() {
                            let streaming = state.is_busy() && i == last && entry.role == Role::Assistant;
                            render_message(ui, entry, streaming);
                            ui.add_space(4.0);
                        }
                    });

                ui.add_space(8.0);

                // Input area
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Ask about crops, soil, weather...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add_enabled(state.active_conversation.is_some(), input);

                    if state.is_busy() {
                        let stop_btn = ui.add(
                            egui::Button::new(RichText::new("Stop").color(TEXT_PRIMARY))
                                .fill(BG_SURFACE)
                                .corner_radius(PANEL_ROUNDING)
                                .min_size(Vec2::new(60.0, 0.0)),
                        );
                        if stop_btn.clicked() {
                            action = Some(ChatPanelAction::Stop);
                        }
                        return;
                    }

                    let send_enabled = !state.input_text.trim().is_empty() && state.can_send();
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    // Submit on Enter or button click
                    let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if send_enabled && (entered || send_btn.clicked()) {
                        let text = state.input_text.trim().to_string();
                        state.input_text.clear();
                        action = Some(ChatPanelAction::Send(text));
                        response.request_focus();
                    }
                });
            });
        });

    action
}

fn empty_hint(state: &UiState) -> &'static str {
    if state.active_conversation.is_some() {
        "Ask your first question."
    } else {
        "Create or select a conversation to start."
    }
}

/// Returns true when dismissed
fn error_banner(ui: &mut egui::Ui, message: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::default()
        .fill(ERROR_BG)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(message).color(ERROR));
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.small_button("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
            });
        });
    dismissed
}

fn render_message(ui: &mut egui::Ui, entry: &ChatEntry, streaming: bool) {
    let (label, label_color) = match entry.role {
        Role::User => ("You", HARVEST),
        Role::Assistant => ("KrishiGPT", ACCENT),
    };
    let text_color = if entry.pending && !streaming { TEXT_PENDING } else { TEXT_PRIMARY };

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(BUBBLE_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).color(label_color).strong().small());
                if let Some(confidence) = &entry.confidence {
                    ui.label(
                        RichText::new(format!("{} confidence", confidence))
                            .color(confidence_color(confidence))
                            .small(),
                    );
                }
            });
            ui.label(RichText::new(&entry.content).color(text_color));
            if streaming {
                ui.label(RichText::new("▌").color(ACCENT).strong());
            }
        });
}
