//! Settings panel: assistant mode, delivery, user id and farm details.

use egui::{self, RichText};
use krishi_types::{
    config::{ChatMode, ClientConfig},
    wire::FarmContext,
};
use crate::theme::*;

/// What the caller should do after rendering the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    /// Nothing changed
    None,
    /// A field was changed; push config and context to the session
    Changed,
}

/// Render the settings panel. Returns an action for the caller to handle.
pub fn settings_panel(
    ui: &mut egui::Ui,
    config: &mut ClientConfig,
    farm: &mut FarmContext,
) -> SettingsAction {
    let mut changed = false;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
            ui.separator();

            // ── Assistant ────────────────────────────────────
            ui.label(RichText::new("Assistant").color(ACCENT).strong());
            ui.add_space(2.0);

            ui.label(RichText::new("Mode").color(TEXT_SECONDARY).small());
            egui::ComboBox::from_id_salt("chat_mode")
                .selected_text(config.mode.label())
                .show_ui(ui, |ui| {
                    for mode in ChatMode::all() {
                        if ui
                            .selectable_value(&mut config.mode, *mode, mode.label())
                            .changed()
                        {
                            changed = true;
                        }
                    }
                });

            ui.add_space(4.0);
            if ui
                .checkbox(&mut config.streaming, "Stream replies as they are written")
                .changed()
            {
                changed = true;
            }

            ui.add_space(4.0);
            ui.label(RichText::new("User ID").color(TEXT_SECONDARY).small());
            if ui.text_edit_singleline(&mut config.user_id).changed() {
                changed = true;
            }

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);

            // ── Farm ─────────────────────────────────────────
            ui.label(RichText::new("Farm").color(ACCENT).strong());
            if !config.mode.uses_farm_context() {
                ui.label(
                    RichText::new("Only sent in KrishiGPT mode.")
                        .color(TEXT_SECONDARY)
                        .small()
                        .italics(),
                );
            }
            ui.add_space(2.0);

            changed |= optional_field(ui, "Location", "District, state", &mut farm.location);
            changed |= optional_field(ui, "Crop", "e.g. Wheat", &mut farm.crop);
            changed |= optional_field(ui, "Crop stage", "e.g. Flowering", &mut farm.crop_stage);
            changed |= optional_field(ui, "Season", "Kharif, Rabi, Zaid", &mut farm.season);
            changed |= optional_field(ui, "Soil type", "e.g. Black cotton", &mut farm.soil_type);
            changed |= optional_field(ui, "Irrigation", "e.g. Drip", &mut farm.irrigation_method);
            changed |= optional_field(ui, "Weather", "Recent conditions", &mut farm.weather_summary);

            // Zero acres means unknown
            ui.label(RichText::new("Land size (acres)").color(TEXT_SECONDARY).small());
            let mut acres = farm.land_size_acres.unwrap_or(0.0);
            if ui
                .add(
                    egui::DragValue::new(&mut acres)
                        .range(0.0..=10_000.0)
                        .speed(0.1),
                )
                .changed()
            {
                farm.land_size_acres = (acres > 0.0).then_some(acres);
                changed = true;
            }

            ui.add_space(8.0);
            if !farm.is_empty() && ui.small_button("Clear farm details").clicked() {
                *farm = FarmContext::default();
                changed = true;
            }
        });

    if changed {
        SettingsAction::Changed
    } else {
        SettingsAction::None
    }
}

/// Labelled text field where an empty string means unset
fn optional_field(ui: &mut egui::Ui, label: &str, hint: &str, value: &mut Option<String>) -> bool {
    ui.label(RichText::new(label).color(TEXT_SECONDARY).small());
    let mut text = value.clone().unwrap_or_default();
    let changed = ui
        .add(egui::TextEdit::singleline(&mut text).hint_text(hint))
        .changed();
    if changed {
        *value = if text.trim().is_empty() { None } else { Some(text) };
    }
    ui.add_space(2.0);
    changed
}
