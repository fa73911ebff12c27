//! Config and input editors
//!
//! The editors keep a local copy of each buffer so `TextEdit` can borrow it
//! mutably. The copy is refreshed whenever the session's revision moves past
//! the one it was taken at, which covers normalise and component insertion.

use egui::{FontId, Ui};

use crate::session::{SessionController, SessionSnapshot};

#[derive(Debug, Default)]
struct LocalCopy {
    text: String,
    revision: Option<u64>,
}

impl LocalCopy {
    fn sync(&mut self, text: &str, revision: u64) {
        if self.revision != Some(revision) {
            self.text = text.to_string();
            self.revision = Some(revision);
        }
    }
}

/// Editor state for both buffers
#[derive(Debug, Default)]
pub struct EditorState {
    config: LocalCopy,
    input: LocalCopy,
}

impl EditorState {
    /// Pull buffer changes made outside the editor
    pub fn sync(&mut self, snapshot: &SessionSnapshot) {
        self.config.sync(&snapshot.config, snapshot.config_revision);
        self.input.sync(&snapshot.input, snapshot.input_revision);
    }

    pub fn show_config(&mut self, ui: &mut Ui, session: &SessionController) {
        if code_editor(ui, &mut self.config.text, "config_editor") {
            session.set_config(self.config.text.clone());
        }
    }

    pub fn show_input(&mut self, ui: &mut Ui, session: &SessionController) {
        if code_editor(ui, &mut self.input.text, "input_editor") {
            session.set_input(self.input.text.clone());
        }
    }
}

/// Full-size monospace editor; returns true if the text changed
fn code_editor(ui: &mut Ui, text: &mut String, id: &str) -> bool {
    let font_size = ui
        .style()
        .text_styles
        .get(&egui::TextStyle::Monospace)
        .map(|f| f.size)
        .unwrap_or(14.0);

    let mut changed = false;
    egui::ScrollArea::vertical()
        .id_salt(id)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let text_edit = egui::TextEdit::multiline(text)
                .id_salt(id)
                .code_editor()
                .font(FontId::monospace(font_size))
                .desired_width(f32::INFINITY)
                .desired_rows(20);
            changed = text_edit.show(ui).response.changed();
        });
    changed
}
