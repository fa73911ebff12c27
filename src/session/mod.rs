//! Session lifecycle
//!
//! A [`SessionController`] owns one lab session: the configuration and input
//! buffers, the output log, and the compute engine. It tracks whether the
//! engine holds a pipeline compiled from the *current* configuration and
//! serialises access to the engine.
//!
//! # Main Types
//!
//! - [`SessionController`] - Entry point for every user action
//! - [`Controls`] - Which actions the front end should enable
//! - [`ActionOutcome`] - Result of an async action, for the front end
//! - [`SessionSnapshot`] - Point-in-time copy for rendering
//!
//! # Compiled state
//!
//! Every configuration mutation clears the compiled flag. A compile that was
//! in flight while the configuration changed finishes against the engine, but
//! its success is discarded because the engine no longer matches the buffer.
//! Comparisons use buffer revisions, so an edit that restores the original
//! text still counts as a change.
//!
//! State is behind a `std::sync::Mutex` that is never held across an
//! `.await`.

pub mod buffer;
pub mod output;

pub use buffer::{Buffer, BufferEdit, BufferPair};
pub use output::{LogEntry, LogStyle, OutputLog};

use crate::engine::{ComponentCatalog, ComponentKind, ComputeEngine, EngineError, EngineResult};
use crate::error::{ErrorKind, LabError, Result};
use crate::share::ShareService;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// Configuration loaded into a fresh session
pub const DEFAULT_CONFIG: &str = "pipeline:
  processors:
    - type: text
      operator: to_upper
";

/// Input loaded into a fresh session
pub const DEFAULT_INPUT: &str = "hello world\n";

const WELCOME: &[&str] = &[
    "Welcome to StreamLab, a sandbox for stream processing pipelines.",
    "Write a pipeline in the Config tab and sample messages in the Input tab. Each input line is a message and a blank line starts a new batch.",
    "Compile loads the pipeline into the engine and Execute runs the input through it. Results appear here.",
    "Normalise rewrites the config with all defaults filled in. Share uploads the session and prints a link.",
];

/// Which page the front end shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Config,
    Input,
    Settings,
}

/// Coarse lifecycle phase, for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    CompileInFlight,
    Compiled,
    ExecuteInFlight,
    NormaliseInFlight,
}

/// Enabled state of the session actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub compile_enabled: bool,
    pub execute_enabled: bool,
    pub normalise_enabled: bool,
    pub share_enabled: bool,
}

/// How an async action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action succeeded and its effects were applied
    Completed,
    /// Nothing to do
    NoChange,
    /// The action failed; an `Error` entry was written
    Failed(ErrorKind),
    /// A conflicting action was in flight; an `Info` entry was written
    Rejected,
    /// The action succeeded but the configuration changed meanwhile
    Stale,
}

/// Initial content and behaviour of a new session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub initial_config: String,
    pub initial_input: String,
    pub show_welcome: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_config: DEFAULT_CONFIG.to_string(),
            initial_input: DEFAULT_INPUT.to_string(),
            show_welcome: true,
        }
    }
}

/// Point-in-time copy of a session for rendering
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub config: String,
    pub config_revision: u64,
    pub input: String,
    pub input_revision: u64,
    pub entries: Vec<LogEntry>,
    pub log_version: u64,
    pub controls: Controls,
    pub phase: SessionPhase,
    pub view: View,
}

#[derive(Debug, Default)]
struct SessionState {
    buffers: BufferPair,
    compiled: bool,
    compiling: bool,
    executing: bool,
    normalising: bool,
    sharing: bool,
    /// Held by compile and execute, which must not overlap on the engine
    engine_busy: bool,
    view: View,
}

impl SessionState {
    fn controls(&self) -> Controls {
        Controls {
            compile_enabled: !self.compiled && !self.compiling,
            execute_enabled: self.compiled && !self.executing,
            normalise_enabled: !self.normalising,
            share_enabled: !self.sharing,
        }
    }

    fn phase(&self) -> SessionPhase {
        if self.executing {
            SessionPhase::ExecuteInFlight
        } else if self.compiling {
            SessionPhase::CompileInFlight
        } else if self.normalising {
            SessionPhase::NormaliseInFlight
        } else if self.compiled {
            SessionPhase::Compiled
        } else {
            SessionPhase::Idle
        }
    }

    fn mutate_config(&mut self, f: impl FnOnce(&mut Buffer)) {
        f(&mut self.buffers.config);
        self.compiled = false;
    }
}

/// Clears in-flight flags when an action finishes or its future is dropped
struct FlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    release: fn(&mut SessionState),
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        (self.release)(&mut state);
    }
}

/// Owner of one lab session
pub struct SessionController {
    state: Mutex<SessionState>,
    engine: Arc<dyn ComputeEngine>,
    share: Arc<dyn ShareService>,
    log: OutputLog,
    catalog: ComponentCatalog,
}

impl SessionController {
    /// Create a session around an already loaded engine
    pub fn new(
        engine: Arc<dyn ComputeEngine>,
        share: Arc<dyn ShareService>,
        options: SessionOptions,
    ) -> Self {
        let catalog = ComponentCatalog::query(engine.as_ref());
        let state = SessionState {
            buffers: BufferPair::new(options.initial_config, options.initial_input),
            ..Default::default()
        };
        let controller = Self {
            state: Mutex::new(state),
            engine,
            share,
            log: OutputLog::new(),
            catalog,
        };
        if options.show_welcome {
            controller.show_about();
        }
        controller
    }

    /// Wait for the engine to load and create a session around it
    ///
    /// A load failure is fatal: no session exists without an engine.
    pub async fn bootstrap<F, E>(
        load: F,
        share: Arc<dyn ShareService>,
        options: SessionOptions,
    ) -> Result<Self>
    where
        F: Future<Output = EngineResult<E>>,
        E: ComputeEngine + 'static,
    {
        let engine = load.await.map_err(|e| match e {
            EngineError::Load(msg) => LabError::EngineLoad(msg),
            other => LabError::EngineLoad(other.to_string()),
        })?;
        let controller = Self::new(Arc::new(engine), share, options);
        let version = controller.engine.version();
        tracing::info!("Engine v{} loaded", version);
        controller.log.info(format!("Engine v{} loaded.", version));
        Ok(controller)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard(&self, release: fn(&mut SessionState)) -> FlightGuard<'_> {
        FlightGuard {
            state: &self.state,
            release,
        }
    }

    // ==================== Queries ====================

    pub fn engine_version(&self) -> String {
        self.engine.version()
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    /// Component names per kind, queried once at creation
    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    /// Whether the engine holds a pipeline built from the current config
    pub fn is_compiled(&self) -> bool {
        self.lock().compiled
    }

    pub fn controls(&self) -> Controls {
        self.lock().controls()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    pub fn view(&self) -> View {
        self.lock().view
    }

    pub fn config(&self) -> String {
        self.lock().buffers.config.snapshot()
    }

    pub fn input(&self) -> String {
        self.lock().buffers.input.snapshot()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            config: state.buffers.config.snapshot(),
            config_revision: state.buffers.config.revision(),
            input: state.buffers.input.snapshot(),
            input_revision: state.buffers.input.revision(),
            entries: self.log.entries(),
            log_version: self.log.version(),
            controls: state.controls(),
            phase: state.phase(),
            view: state.view,
        }
    }

    // ==================== Synchronous actions ====================

    pub fn set_view(&self, view: View) {
        self.lock().view = view;
    }

    /// Replace the configuration buffer
    pub fn set_config(&self, text: impl Into<String>) {
        let text = text.into();
        self.lock().mutate_config(|buf| buf.set(text));
    }

    pub fn edit_config(&self, edit: BufferEdit) {
        self.lock().mutate_config(|buf| buf.apply(edit));
    }

    /// Replace the input buffer; does not affect the compiled state
    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().buffers.input.set(text);
    }

    pub fn edit_input(&self, edit: BufferEdit) {
        self.lock().buffers.input.apply(edit);
    }

    /// Insert a default component into the configuration
    pub fn insert_component(&self, kind: ComponentKind, name: &str) -> ActionOutcome {
        let mut state = self.lock();
        let result = self
            .engine
            .insert_component(kind, name, state.buffers.config.as_str());

        match result {
            Ok(Some(text)) => {
                tracing::debug!("Inserted {} '{}'", kind, name);
                state.mutate_config(|buf| buf.set(text));
                state.view = View::Config;
                ActionOutcome::Completed
            }
            Ok(None) => ActionOutcome::NoChange,
            Err(e) => {
                self.log.error(format!("Error: failed to add {}: {}", kind, e));
                ActionOutcome::Failed(LabError::from(e).kind())
            }
        }
    }

    /// Append the welcome text to the log
    pub fn show_about(&self) {
        for line in WELCOME {
            self.log.info(*line);
        }
    }

    pub fn clear_output(&self) {
        self.log.clear();
    }

    // ==================== Async actions ====================

    /// Compile the current configuration
    pub async fn request_compile(&self) -> ActionOutcome {
        let (config, revision) = {
            let mut state = self.lock();
            if state.compiling {
                self.log.info("Compile already in progress.");
                return ActionOutcome::Rejected;
            }
            if state.engine_busy {
                self.log.info("Engine is busy, try again when the current run finishes.");
                return ActionOutcome::Rejected;
            }
            state.compiling = true;
            state.engine_busy = true;
            state.compiled = false;
            (state.buffers.config.snapshot(), state.buffers.config.revision())
        };
        let _guard = self.guard(|state| {
            state.compiling = false;
            state.engine_busy = false;
        });

        self.compile_revision(&config, revision).await
    }

    async fn compile_revision(&self, config: &str, revision: u64) -> ActionOutcome {
        tracing::debug!("Compiling config revision {}", revision);
        match self.engine.compile(config, &self.log).await {
            Ok(()) => {
                let mut state = self.lock();
                if state.buffers.config.revision() != revision {
                    self.log
                        .info("Configuration changed during compile, result discarded.");
                    return ActionOutcome::Stale;
                }
                state.compiled = true;
                self.log.info("Compiled successfully.");
                ActionOutcome::Completed
            }
            Err(e) => {
                self.log
                    .error(format!("Error: failed to create pipeline: {}", e));
                ActionOutcome::Failed(LabError::from(e).kind())
            }
        }
    }

    /// Run the input through the pipeline, compiling first if needed
    pub async fn request_execute(&self) -> ActionOutcome {
        let (needs_compile, config, revision, input) = {
            let mut state = self.lock();
            if state.executing {
                self.log.info("Execution already in progress.");
                return ActionOutcome::Rejected;
            }
            if state.engine_busy {
                self.log.info("Engine is busy, try again when the current run finishes.");
                return ActionOutcome::Rejected;
            }
            let needs_compile = !state.compiled;
            state.executing = true;
            state.engine_busy = true;
            state.compiling = needs_compile;
            (
                needs_compile,
                state.buffers.config.snapshot(),
                state.buffers.config.revision(),
                state.buffers.input.snapshot(),
            )
        };
        let _guard = self.guard(|state| {
            state.executing = false;
            state.compiling = false;
            state.engine_busy = false;
        });

        if needs_compile {
            let outcome = self.compile_revision(&config, revision).await;
            self.lock().compiling = false;
            if outcome != ActionOutcome::Completed {
                return outcome;
            }
        }

        match self.engine.execute(&input, &self.log).await {
            Ok(report) => {
                tracing::debug!(
                    "Execute finished: {} batch(es), {} message(s) out",
                    report.batches,
                    report.messages_out
                );
                ActionOutcome::Completed
            }
            Err(e) => {
                self.log.error(format!("Error: failed to execute: {}", e));
                ActionOutcome::Failed(LabError::from(e).kind())
            }
        }
    }

    /// Replace the configuration with the engine's normalised form
    pub async fn request_normalise(&self) -> ActionOutcome {
        let (config, revision) = {
            let mut state = self.lock();
            if state.normalising {
                self.log.info("Normalise already in progress.");
                return ActionOutcome::Rejected;
            }
            state.normalising = true;
            (state.buffers.config.snapshot(), state.buffers.config.revision())
        };
        let _guard = self.guard(|state| state.normalising = false);

        match self.engine.normalise(&config).await {
            Ok(text) => {
                let mut state = self.lock();
                if state.buffers.config.revision() != revision {
                    self.log
                        .info("Configuration changed during normalise, result discarded.");
                    return ActionOutcome::Stale;
                }
                state.mutate_config(|buf| buf.set(text));
                state.view = View::Config;
                ActionOutcome::Completed
            }
            Err(e) => {
                self.log
                    .error(format!("Error: failed to normalise config: {}", e));
                ActionOutcome::Failed(LabError::from(e).kind())
            }
        }
    }

    /// Upload the session and log a shareable link
    pub async fn request_share(&self) -> Option<Url> {
        let (input, config) = {
            let mut state = self.lock();
            if state.sharing {
                self.log.info("Share already in progress.");
                return None;
            }
            state.sharing = true;
            (state.buffers.input.snapshot(), state.buffers.config.snapshot())
        };
        let _guard = self.guard(|state| state.sharing = false);

        match self.share.share(&input, &config).await {
            Ok(url) => {
                tracing::info!("Session saved at {}", url);
                self.log.link(format!("Session saved at: {}", url));
                Some(url)
            }
            Err(e) => {
                tracing::warn!("Share failed: {}", e);
                self.log.error(format!("Error: failed to save state: {}", e));
                None
            }
        }
    }
}
