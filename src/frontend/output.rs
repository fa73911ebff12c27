//! Output log panel

use egui::{Color32, RichText, Ui};

use crate::session::{LogEntry, LogStyle};

fn style_color(style: LogStyle) -> Color32 {
    match style {
        LogStyle::Info => Color32::LIGHT_BLUE,
        LogStyle::Error => Color32::LIGHT_RED,
        LogStyle::Lint => Color32::YELLOW,
        LogStyle::Log => Color32::GRAY,
        LogStyle::Link => Color32::from_rgb(100, 200, 255),
    }
}

/// Render log entries, newest at the bottom.
pub fn render_output(ui: &mut Ui, entries: &[LogEntry]) {
    egui::ScrollArea::vertical()
        .id_salt("output_log")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in entries {
                render_entry(ui, entry);
            }
        });
}

fn render_entry(ui: &mut Ui, entry: &LogEntry) {
    match entry.style {
        None if entry.text.is_empty() => {
            ui.add_space(4.0);
        }
        None => {
            ui.label(RichText::new(&entry.text).monospace());
        }
        Some(LogStyle::Link) => {
            // "Session saved at: <url>"
            match entry.text.rsplit_once(": ") {
                Some((prefix, url)) => {
                    ui.horizontal(|ui| {
                        ui.colored_label(style_color(LogStyle::Link), format!("{}:", prefix));
                        ui.hyperlink(url);
                    });
                }
                None => {
                    ui.colored_label(style_color(LogStyle::Link), &entry.text);
                }
            }
        }
        Some(style) => {
            ui.label(
                RichText::new(&entry.text)
                    .monospace()
                    .color(style_color(style)),
            );
        }
    }
}
