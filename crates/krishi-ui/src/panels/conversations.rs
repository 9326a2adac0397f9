//! Conversation sidebar: list, create, select, rename, delete.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use crate::state::{ConversationEntry, UiState};
use crate::theme::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    Create,
    Select(String),
    Rename(String, String),
    Delete(String),
    Refresh,
}

/// Render the sidebar. At most one action per frame.
pub fn conversations_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<SidebarAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Conversations").color(TEXT_PRIMARY).strong());
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.small_button("⟳").on_hover_text("Reload").clicked() {
                        action = Some(SidebarAction::Refresh);
                    }
                });
            });

            let new_btn = ui.add(
                egui::Button::new(RichText::new("+ New conversation").color(TEXT_PRIMARY))
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(ui.available_width(), 28.0)),
            );
            if new_btn.clicked() {
                action = Some(SidebarAction::Create);
            }

            if let Some(notice) = state.notice.clone() {
                ui.add_space(4.0);
                ui.horizontal_wrapped(|ui| {
                    ui.label(RichText::new(notice).color(ERROR).small());
                    if ui.small_button("×").clicked() {
                        state.notice = None;
                    }
                });
            }

            ui.separator();

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if state.conversations.is_empty() {
                        ui.label(
                            RichText::new("No conversations yet")
                                .color(TEXT_SECONDARY)
                                .small()
                                .italics(),
                        );
                    }

                    for entry in state.conversations.clone() {
                        let active = state.active_conversation.as_deref() == Some(entry.id.as_str());
                        let row = match state.renaming.as_mut() {
                            Some((id, buffer)) if *id == entry.id => rename_row(ui, &entry, buffer),
                            _ => conversation_row(ui, &entry, active),
                        };
                        if let Some(row) = row {
                            action = Some(row);
                        }
                        ui.add_space(2.0);
                    }
                });
        });

    // An empty title only opens the rename editor
    if let Some(SidebarAction::Rename(id, title)) = &action {
        if title.is_empty() {
            let current = entry_title(state, id);
            state.renaming = Some((id.clone(), current));
            return None;
        }
        state.renaming = None;
    }
    action
}

fn entry_title(state: &UiState, id: &str) -> String {
    state
        .conversations
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.title.clone())
        .unwrap_or_default()
}

/// Rename with an empty title starts editing
fn conversation_row(ui: &mut egui::Ui, entry: &ConversationEntry, active: bool) -> Option<SidebarAction> {
    let mut action = None;
    let fill = if active { BG_SURFACE } else { BG_SECONDARY };

    egui::Frame::default()
        .fill(fill)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(6.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                let title_color = if active { ACCENT } else { TEXT_PRIMARY };
                let title = ui.add(
                    egui::Label::new(RichText::new(&entry.title).color(title_color))
                        .truncate()
                        .sense(egui::Sense::click()),
                );
                if title.clicked() && !active {
                    action = Some(SidebarAction::Select(entry.id.clone()));
                }
                if title.double_clicked() {
                    action = Some(SidebarAction::Rename(entry.id.clone(), String::new()));
                }

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                        action = Some(SidebarAction::Delete(entry.id.clone()));
                    }
                    if ui.small_button("✏").on_hover_text("Rename").clicked() {
                        action = Some(SidebarAction::Rename(entry.id.clone(), String::new()));
                    }
                });
            });

            if let Some(preview) = &entry.preview {
                ui.add(
                    egui::Label::new(RichText::new(preview).color(TEXT_SECONDARY).small())
                        .truncate(),
                );
            }
        });

    action
}

fn rename_row(ui: &mut egui::Ui, entry: &ConversationEntry, buffer: &mut String) -> Option<SidebarAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let edit = ui.add(
            egui::TextEdit::singleline(buffer)
                .desired_width(ui.available_width() - 40.0),
        );
        let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (entered || ui.small_button("✔").clicked()) && !buffer.trim().is_empty() {
            log::debug!("Renaming {} to '{}'", entry.id, buffer.trim());
            action = Some(SidebarAction::Rename(entry.id.clone(), buffer.trim().to_string()));
        }
    });
    action
}
