//! UI theme constants: a dark palette with field-green accents

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BG_PRIMARY: Color32 = Color32::from_rgb(20, 24, 20);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(32, 38, 32);
pub const BG_SURFACE: Color32 = Color32::from_rgb(46, 54, 46);
pub const BG_INPUT: Color32 = Color32::from_rgb(14, 17, 14);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 234, 226);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(158, 168, 152);
pub const TEXT_PENDING: Color32 = Color32::from_rgb(120, 128, 116);
pub const ACCENT: Color32 = Color32::from_rgb(76, 175, 80);
pub const HARVEST: Color32 = Color32::from_rgb(230, 176, 60);
pub const ERROR: Color32 = Color32::from_rgb(229, 83, 75);
pub const ERROR_BG: Color32 = Color32::from_rgb(58, 24, 22);

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(6);
pub const BUBBLE_ROUNDING: CornerRadius = CornerRadius::same(10);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

/// Apply the dark theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_SECONDARY;
    style.visuals.extreme_bg_color = BG_INPUT;

    style.visuals.widgets.inactive.bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    style.visuals.widgets.hovered.bg_fill = BG_SURFACE;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.active.bg_fill = ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    style.visuals.selection.bg_fill = ACCENT.linear_multiply(0.35);
    style.visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}

/// Badge color for a confidence label
pub fn confidence_color(label: &str) -> Color32 {
    match label {
        "High" => ACCENT,
        "Medium" => HARVEST,
        _ => ERROR,
    }
}
