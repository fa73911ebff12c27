//! Status bar panel: session phase, buffer sizes and log counters.
//!
//! Sits at the very bottom of the window.

use egui::{Color32, RichText, Ui};

use crate::session::{LogStyle, SessionPhase, SessionSnapshot};

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub snapshot: &'a SessionSnapshot,
    pub engine_version: &'a str,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    let snap = ctx.snapshot;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let (color, text) = match snap.phase {
            SessionPhase::Idle => (Color32::GRAY, "Not compiled"),
            SessionPhase::CompileInFlight => (Color32::YELLOW, "Compiling"),
            SessionPhase::Compiled => (Color32::GREEN, "Compiled"),
            SessionPhase::ExecuteInFlight => (Color32::YELLOW, "Executing"),
            SessionPhase::NormaliseInFlight => (Color32::YELLOW, "Normalising"),
        };
        ui.colored_label(color, "●");
        ui.label(RichText::new(text).small());

        ui.separator();

        let config_lines = snap.config.split('\n').count();
        let input_lines = snap.input.split('\n').count();
        ui.label(RichText::new(format!("Config: {} lines", config_lines)).small());
        ui.label(RichText::new(format!("Input: {} lines", input_lines)).small());

        ui.separator();

        let errors = snap.entries.iter().filter(|e| e.is(LogStyle::Error)).count();
        let lints = snap.entries.iter().filter(|e| e.is(LogStyle::Lint)).count();
        let error_color = if errors > 0 {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(error_color, RichText::new(format!("Errors: {}", errors)).small());
        ui.label(RichText::new(format!("Lints: {}", lints)).small());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(format!("Engine v{}", ctx.engine_version)).small());
        });
    });
}
