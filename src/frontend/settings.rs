//! Settings page
//!
//! Theme and font size are bound to the setting store with
//! [`use_setting`], so a choice made here survives restarts for
//! [`SETTING_TTL_DAYS`](crate::config::SETTING_TTL_DAYS) days.

use std::sync::Arc;

use egui::{FontId, TextStyle, Ui};

use crate::config::settings::{FONT_SIZE_SETTING, THEME_SETTING};
use crate::config::{use_setting, Setting, SettingStore};

const THEMES: &[&str] = &["dark", "light"];
const FONT_SIZES: &[&str] = &["small", "medium", "large"];

/// Apply a theme name to the egui context
pub fn apply_theme(ctx: &egui::Context, theme: &str) {
    match theme {
        "light" => ctx.set_visuals(egui::Visuals::light()),
        _ => ctx.set_visuals(egui::Visuals::dark()),
    }
}

fn font_points(size: &str) -> f32 {
    match size {
        "small" => 12.0,
        "large" => 17.0,
        _ => 14.0,
    }
}

/// Apply a font size name to the egui context
pub fn apply_font_size(ctx: &egui::Context, size: &str) {
    let points = font_points(size);
    let mut style = (*ctx.style()).clone();
    style
        .text_styles
        .insert(TextStyle::Body, FontId::proportional(points));
    style
        .text_styles
        .insert(TextStyle::Button, FontId::proportional(points));
    style
        .text_styles
        .insert(TextStyle::Monospace, FontId::monospace(points));
    style
        .text_styles
        .insert(TextStyle::Small, FontId::proportional(points * 0.8));
    style
        .text_styles
        .insert(TextStyle::Heading, FontId::proportional(points * 1.4));
    ctx.set_style(style);
}

/// Settings bound to the current egui context
pub struct SettingsPage {
    theme: Setting,
    font_size: Setting,
}

impl SettingsPage {
    /// Bind settings and apply their stored values
    pub fn new(ctx: &egui::Context, store: Arc<dyn SettingStore>) -> Self {
        let theme_ctx = ctx.clone();
        let theme = use_setting(store.clone(), THEME_SETTING, "dark", move |value| {
            apply_theme(&theme_ctx, value)
        });

        let font_ctx = ctx.clone();
        let font_size = use_setting(store, FONT_SIZE_SETTING, "medium", move |value| {
            apply_font_size(&font_ctx, value)
        });

        Self { theme, font_size }
    }

    pub fn show(&mut self, ui: &mut Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([16.0, 8.0])
            .show(ui, |ui| {
                ui.label("Theme");
                choice(ui, "theme_choice", &mut self.theme, THEMES);
                ui.end_row();

                ui.label("Font size");
                choice(ui, "font_size_choice", &mut self.font_size, FONT_SIZES);
                ui.end_row();
            });
    }
}

fn choice(ui: &mut Ui, id: &str, setting: &mut Setting, options: &[&str]) {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(setting.value())
        .show_ui(ui, |ui| {
            for option in options {
                if ui
                    .selectable_label(setting.value() == *option, *option)
                    .clicked()
                {
                    picked = Some(*option);
                }
            }
        });
    if let Some(value) = picked {
        if value != setting.value() {
            setting.change(value);
        }
    }
}
