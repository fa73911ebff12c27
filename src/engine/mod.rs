//! Compute engine adapter
//!
//! The session controller talks to the stream-processing engine exclusively
//! through [`ComputeEngine`]. The engine is a single stateful resource: a
//! successful compile loads a pipeline that later executes consume, so the
//! controller is its only caller and never overlaps compile with execute.
//!
//! # Implementations
//!
//! - [`LocalEngine`] - in-process engine with YAML configs and Rhai scripts
//! - [`RemoteNormalise`] - wraps any engine and routes normalise over HTTP
//!
//! # Example
//!
//! ```ignore
//! use streamlab_rs::engine::{ComputeEngine, LocalEngine};
//! use streamlab_rs::session::OutputLog;
//!
//! let engine = LocalEngine::load(Default::default()).await?;
//! let log = OutputLog::new();
//! engine.compile("pipeline: {}", &log).await?;
//! engine.execute("hello\nworld", &log).await?;
//! ```

pub mod batch;
pub mod local;
pub mod processors;
pub mod remote;
pub mod resources;
pub mod stream_config;

pub use batch::{parse_batches, Batch};
pub use local::LocalEngine;
pub use remote::RemoteNormalise;
pub use stream_config::StreamConfig;

use crate::session::output::OutputLog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Category of insertable component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Processor,
    Cache,
    #[serde(rename = "ratelimit")]
    RateLimit,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [
        ComponentKind::Processor,
        ComponentKind::Cache,
        ComponentKind::RateLimit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Processor => "processor",
            ComponentKind::Cache => "cache",
            ComponentKind::RateLimit => "ratelimit",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a compute engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Validation(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("{kind} type '{name}' not recognised")]
    UnknownComponent { kind: ComponentKind, name: String },

    #[error("failed to find a free label for the new {0}")]
    NoFreeLabel(ComponentKind),

    #[error("pipeline must be compiled first")]
    NotCompiled,

    #[error("processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("engine failed to load: {0}")]
    Load(String),

    #[error("{0}")]
    Transport(String),
}

impl EngineError {
    /// Whether this error rejects the configuration itself
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::Parse(_)
                | EngineError::Validation(_)
                | EngineError::Script(_)
                | EngineError::UnknownComponent { .. }
                | EngineError::NoFreeLabel(_)
        )
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::Parse(err.to_string())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Summary of one execute call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Non-empty input batches fed to the pipeline
    pub batches: usize,
    /// Batches that failed inside a processor
    pub failed_batches: usize,
    /// Messages written to the log
    pub messages_out: usize,
}

/// Narrow call surface of the external compute engine
#[async_trait]
pub trait ComputeEngine: Send + Sync {
    /// Engine version, surfaced once after load
    fn version(&self) -> String;

    /// Ordered component type names of one kind
    fn list_components(&self, kind: ComponentKind) -> Vec<String>;

    /// Insert a default component into `config`
    ///
    /// `Ok(None)` means the engine cannot represent the insertion and the
    /// configuration must be left alone.
    fn insert_component(
        &self,
        kind: ComponentKind,
        name: &str,
        config: &str,
    ) -> EngineResult<Option<String>>;

    /// Reformat a configuration
    async fn normalise(&self, config: &str) -> EngineResult<String>;

    /// Load a configuration, replacing whatever was loaded before
    async fn compile(&self, config: &str, log: &OutputLog) -> EngineResult<()>;

    /// Feed input through the loaded pipeline, streaming results into `log`
    async fn execute(&self, input: &str, log: &OutputLog) -> EngineResult<ExecutionReport>;
}

/// Component type names per kind, fixed for the life of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentCatalog {
    entries: BTreeMap<ComponentKind, Vec<String>>,
}

impl ComponentCatalog {
    /// Query every kind from an engine once
    pub fn query(engine: &dyn ComputeEngine) -> Self {
        let entries = ComponentKind::ALL
            .iter()
            .map(|&kind| (kind, engine.list_components(kind)))
            .collect();
        Self { entries }
    }

    pub fn names(&self, kind: ComponentKind) -> &[String] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, kind: ComponentKind, name: &str) -> bool {
        self.names(kind).iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}
