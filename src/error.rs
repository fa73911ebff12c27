//! Error handling for the StreamLab application
//!
//! This module defines the error taxonomy surfaced to the session controller
//! and a Result alias for use throughout the application.
//!
//! Every recoverable error ends up as a styled entry in the output log. Only
//! [`LabError::EngineLoad`] is fatal to a session.

use crate::engine::EngineError;
use thiserror::Error;

/// Coarse classification of a [`LabError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Compile or normalise rejected the configuration
    Config,
    /// The engine failed while processing input
    Execution,
    /// A share or normalise network call failed
    Transport,
    /// The compute engine could not be initialised
    EngineLoad,
    /// Anything local to the lab itself (settings, files)
    Internal,
}

/// Main error type for StreamLab operations
#[derive(Error, Debug)]
pub enum LabError {
    /// Compile or normalise rejected the configuration
    #[error("Config error: {0}")]
    Config(String),

    /// The engine raised an error while processing input
    #[error("Execution error: {0}")]
    Execution(String),

    /// Network failure or non-success status from a remote service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from a remote service
    #[error("Request failed with status: {status}")]
    Status { status: u16, body: String },

    /// The compute engine failed to initialise
    #[error("Engine load error: {0}")]
    EngineLoad(String),

    /// Errors related to the setting store
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LabError>,
    },
}

impl LabError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LabError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify this error for the output log
    pub fn kind(&self) -> ErrorKind {
        match self {
            LabError::Config(_) => ErrorKind::Config,
            LabError::Execution(_) => ErrorKind::Execution,
            LabError::Transport(_) | LabError::Status { .. } => ErrorKind::Transport,
            LabError::EngineLoad(_) => ErrorKind::EngineLoad,
            LabError::Settings(_) | LabError::Io(_) | LabError::Serialization(_) => {
                ErrorKind::Internal
            }
            LabError::WithContext { source, .. } => source.kind(),
        }
    }

    /// Whether the session can continue after this error
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::EngineLoad
    }
}

impl From<EngineError> for LabError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Load(msg) => LabError::EngineLoad(msg),
            EngineError::Transport(msg) => LabError::Transport(msg),
            e if e.is_config_error() => LabError::Config(e.to_string()),
            e => LabError::Execution(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for LabError {
    fn from(err: reqwest::Error) -> Self {
        LabError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for LabError {
    fn from(err: serde_json::Error) -> Self {
        LabError::Serialization(err.to_string())
    }
}

/// Result type alias for StreamLab operations
pub type Result<T> = std::result::Result<T, LabError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<LabError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LabError::Config("unexpected end of stream".to_string());
        assert_eq!(err.to_string(), "Config error: unexpected end of stream");
    }

    #[test]
    fn test_error_with_context_keeps_kind() {
        let err = LabError::Transport("connection refused".to_string());
        let with_ctx = err.with_context("failed to save state");
        assert!(with_ctx.to_string().contains("failed to save state"));
        assert_eq!(with_ctx.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_status_error() {
        let err = LabError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed with status: 500");
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: LabError = EngineError::NotCompiled.into();
        assert_eq!(err.kind(), ErrorKind::Execution);

        let err: LabError = EngineError::Validation("bad".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err: LabError = EngineError::Load("missing".to_string()).into();
        assert!(!err.is_recoverable());
    }
}
