//! Toolbar panel: session actions, component insertion and view tabs.
//!
//! Sits at the top of the window, above the editor.

use egui::{Color32, RichText, Ui};

use crate::engine::{ComponentCatalog, ComponentKind};
use crate::frontend::AppAction;
use crate::session::{Controls, SessionPhase, View};

/// Context needed to render the toolbar.
pub struct ToolbarContext<'a> {
    pub controls: Controls,
    pub phase: SessionPhase,
    pub catalog: &'a ComponentCatalog,
    pub view: View,
}

/// Render the toolbar and return the actions the user triggered.
pub fn render_toolbar(ui: &mut Ui, ctx: &ToolbarContext<'_>) -> Vec<AppAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 4.0;

        render_session_group(ui, ctx, &mut actions);
        ui.separator();
        render_insert_group(ui, ctx, &mut actions);
        ui.separator();
        render_view_group(ui, ctx, &mut actions);

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("About").clicked() {
                actions.push(AppAction::ShowAbout);
            }
            if ui
                .button("Clear")
                .on_hover_text("Clear the output log")
                .clicked()
            {
                actions.push(AppAction::ClearOutput);
            }
        });
    });

    actions
}

fn render_session_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    let (dot, hint) = match ctx.phase {
        SessionPhase::Compiled => (Color32::GREEN, "Pipeline compiled"),
        SessionPhase::CompileInFlight | SessionPhase::ExecuteInFlight => {
            (Color32::YELLOW, "Engine busy")
        }
        SessionPhase::NormaliseInFlight => (Color32::YELLOW, "Normalising"),
        SessionPhase::Idle => (Color32::GRAY, "Not compiled"),
    };
    ui.colored_label(dot, "●").on_hover_text(hint);

    let compile = egui::Button::new("Compile");
    if ui
        .add_enabled(ctx.controls.compile_enabled, compile)
        .on_hover_text("Load the config into the engine")
        .clicked()
    {
        actions.push(AppAction::Compile);
    }

    let execute = egui::Button::new(RichText::new("Execute").color(Color32::WHITE))
        .fill(Color32::from_rgb(50, 120, 50));
    if ui
        .add_enabled(ctx.controls.execute_enabled, execute)
        .on_hover_text("Run the input through the compiled pipeline")
        .clicked()
    {
        actions.push(AppAction::Execute);
    }

    if ui
        .add_enabled(ctx.controls.normalise_enabled, egui::Button::new("Normalise"))
        .on_hover_text("Rewrite the config with all defaults filled in")
        .clicked()
    {
        actions.push(AppAction::Normalise);
    }

    if ui
        .add_enabled(ctx.controls.share_enabled, egui::Button::new("Share"))
        .on_hover_text("Upload this session and get a link")
        .clicked()
    {
        actions.push(AppAction::Share);
    }
}

fn render_insert_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    for kind in ComponentKind::ALL {
        let names = ctx.catalog.names(kind);
        let label = match kind {
            ComponentKind::Processor => "+ Processor",
            ComponentKind::Cache => "+ Cache",
            ComponentKind::RateLimit => "+ Rate limit",
        };

        ui.add_enabled_ui(!names.is_empty(), |ui| {
            egui::ComboBox::from_id_salt(("insert_component", kind.as_str()))
                .selected_text(label)
                .show_ui(ui, |ui| {
                    for name in names {
                        if ui.selectable_label(false, name.as_str()).clicked() {
                            actions.push(AppAction::Insert {
                                kind,
                                name: name.clone(),
                            });
                        }
                    }
                });
        });
    }
}

fn render_view_group(ui: &mut Ui, ctx: &ToolbarContext<'_>, actions: &mut Vec<AppAction>) {
    for (view, label) in [
        (View::Config, "Config"),
        (View::Input, "Input"),
        (View::Settings, "Settings"),
    ] {
        if ui.selectable_label(ctx.view == view, label).clicked() && ctx.view != view {
            actions.push(AppAction::SetView(view));
        }
    }
}
