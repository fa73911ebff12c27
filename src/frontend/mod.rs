//! Frontend module for the StreamLab UI
//!
//! This module contains all UI components built with egui/eframe. Panels
//! render from a [`SessionSnapshot`] and return [`AppAction`]s instead of
//! mutating the session directly; [`LabApp`] applies them.
//!
//! # Layout
//!
//! - Toolbar (top): session actions, component insertion, view tabs
//! - Status bar (bottom): phase, buffer sizes, log counters
//! - Output log (bottom, resizable)
//! - Central panel: config editor, input editor or settings page
//!
//! Until the engine has loaded, only a loading screen is shown. If loading
//! fails the window shows the error and nothing else.

pub mod editor;
pub mod output;
pub mod settings;
pub mod status_bar;
pub mod toolbar;

use std::sync::Arc;
use std::time::Duration;

use egui::{Color32, RichText};

use crate::app::launch_session;
use crate::bridge::{LabBridge, LabCommand, LabEvent, Waker};
use crate::config::{AppConfig, SettingStore};
use crate::engine::ComponentKind;
use crate::error::Result;
use crate::session::{
    ActionOutcome, SessionController, SessionOptions, SessionPhase, SessionSnapshot, View,
};

use editor::EditorState;
use settings::SettingsPage;
use status_bar::StatusBarContext;
use toolbar::ToolbarContext;

/// How often to repaint while an action is streaming output
const IN_FLIGHT_REPAINT: Duration = Duration::from_millis(100);

/// Actions returned by panels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Compile,
    Execute,
    Normalise,
    Share,
    Insert { kind: ComponentKind, name: String },
    SetView(View),
    ClearOutput,
    ShowAbout,
}

enum LoadState {
    Loading,
    Ready {
        session: Arc<SessionController>,
        version: String,
    },
    Failed(String),
}

/// Main application
pub struct LabApp {
    bridge: LabBridge,
    state: LoadState,
    editor: EditorState,
    settings: SettingsPage,
}

impl LabApp {
    /// Create the app and start loading the engine in the background
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        store: Arc<dyn SettingStore>,
    ) -> Result<Self> {
        let repaint_ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || repaint_ctx.request_repaint());

        let options = SessionOptions {
            show_welcome: config.ui.show_welcome,
            ..Default::default()
        };
        let bridge = LabBridge::spawn(move || launch_session(config, options), waker)?;
        let settings = SettingsPage::new(&cc.egui_ctx, store);

        Ok(Self {
            bridge,
            state: LoadState::Loading,
            editor: EditorState::default(),
            settings,
        })
    }

    fn process_events(&mut self) {
        for event in self.bridge.drain() {
            match event {
                LabEvent::Loaded(session) => {
                    let version = session.engine_version();
                    tracing::info!("Session ready");
                    self.state = LoadState::Ready { session, version };
                }
                LabEvent::LoadFailed(msg) => {
                    self.state = LoadState::Failed(msg);
                }
                LabEvent::Finished { command, outcome } => {
                    if let ActionOutcome::Failed(kind) = outcome {
                        tracing::debug!("{:?} failed ({:?})", command, kind);
                    } else {
                        tracing::debug!("{:?} finished: {:?}", command, outcome);
                    }
                }
            }
        }
    }

    fn apply_action(&mut self, session: &SessionController, action: AppAction) {
        match action {
            AppAction::Compile => {
                self.bridge.send(LabCommand::Compile);
            }
            AppAction::Execute => {
                self.bridge.send(LabCommand::Execute);
            }
            AppAction::Normalise => {
                self.bridge.send(LabCommand::Normalise);
            }
            AppAction::Share => {
                self.bridge.send(LabCommand::Share);
            }
            AppAction::Insert { kind, name } => {
                session.insert_component(kind, &name);
            }
            AppAction::SetView(view) => session.set_view(view),
            AppAction::ClearOutput => session.clear_output(),
            AppAction::ShowAbout => session.show_about(),
        }
    }

    fn render_session(
        &mut self,
        ctx: &egui::Context,
        session: &Arc<SessionController>,
        version: &str,
    ) {
        let snapshot = session.snapshot();
        self.editor.sync(&snapshot);
        let mut actions = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(2.0);
            actions.extend(toolbar::render_toolbar(
                ui,
                &ToolbarContext {
                    controls: snapshot.controls,
                    phase: snapshot.phase,
                    catalog: session.catalog(),
                    view: snapshot.view,
                },
            ));
            ui.add_space(2.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            status_bar::render_status_bar(
                ui,
                &StatusBarContext {
                    snapshot: &snapshot,
                    engine_version: version,
                },
            );
        });

        egui::TopBottomPanel::bottom("output")
            .resizable(true)
            .default_height(220.0)
            .show(ctx, |ui| {
                output::render_output(ui, &snapshot.entries);
            });

        egui::CentralPanel::default().show(ctx, |ui| match snapshot.view {
            View::Config => self.editor.show_config(ui, session),
            View::Input => self.editor.show_input(ui, session),
            View::Settings => self.settings.show(ui),
        });

        for action in actions {
            self.apply_action(session, action);
        }

        if is_busy(&snapshot) {
            ctx.request_repaint_after(IN_FLIGHT_REPAINT);
        }
    }
}

fn is_busy(snapshot: &SessionSnapshot) -> bool {
    !snapshot.controls.share_enabled
        || !snapshot.controls.normalise_enabled
        || matches!(
            snapshot.phase,
            SessionPhase::CompileInFlight | SessionPhase::ExecuteInFlight
        )
}

fn render_loading(ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.centered_and_justified(|ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading engine...");
            });
        });
    });
}

fn render_failed(ctx: &egui::Context, message: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading(RichText::new("Failed to load the engine").color(Color32::LIGHT_RED));
            ui.add_space(8.0);
            ui.label(message);
            ui.add_space(8.0);
            ui.label("Check the log file and restart StreamLab.");
        });
    });
}

impl eframe::App for LabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();

        match &self.state {
            LoadState::Loading => render_loading(ctx),
            LoadState::Failed(msg) => {
                let msg = msg.clone();
                render_failed(ctx, &msg);
            }
            LoadState::Ready { session, version } => {
                let session = session.clone();
                let version = version.clone();
                self.render_session(ctx, &session, &version);
            }
        }
    }
}
