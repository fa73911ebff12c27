//! Append-only output log
//!
//! The output log is the only record of session activity shown to the user.
//! Entries are appended by the session controller and by the compute engine
//! (lints, script prints, execution results) and can only be removed all at
//! once with [`OutputLog::clear`].
//!
//! [`OutputLog`] is a cheap handle; clones write to the same log.

use std::sync::{Arc, Mutex, PoisonError};

/// Style tag attached to a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogStyle {
    /// Lifecycle messages (compiled, saved, discarded)
    Info,
    /// Recoverable failures
    Error,
    /// Configuration lint warnings
    Lint,
    /// Engine and script log lines
    Log,
    /// A shareable link
    Link,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub style: Option<LogStyle>,
}

impl LogEntry {
    pub fn new(text: impl Into<String>, style: Option<LogStyle>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Check if this entry carries the given style
    pub fn is(&self, style: LogStyle) -> bool {
        self.style == Some(style)
    }
}

#[derive(Debug, Default)]
struct LogInner {
    entries: Vec<LogEntry>,
    /// Bumped on every append or clear so renderers can skip unchanged frames
    version: u64,
}

/// Shared handle to a session's output log
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    inner: Arc<Mutex<LogInner>>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry
    pub fn write(&self, text: impl Into<String>, style: Option<LogStyle>) {
        let mut inner = self.lock();
        inner.entries.push(LogEntry::new(text, style));
        inner.version += 1;
    }

    /// Append an unstyled entry (pipeline output)
    pub fn plain(&self, text: impl Into<String>) {
        self.write(text, None);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.write(text, Some(LogStyle::Info));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.write(text, Some(LogStyle::Error));
    }

    pub fn lint(&self, text: impl Into<String>) {
        self.write(format!("Lint: {}", text.into()), Some(LogStyle::Lint));
    }

    pub fn log(&self, text: impl Into<String>) {
        self.write(format!("Log: {}", text.into()), Some(LogStyle::Log));
    }

    pub fn link(&self, text: impl Into<String>) {
        self.write(text, Some(LogStyle::Link));
    }

    /// Remove every entry
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.version += 1;
    }

    /// Snapshot of all entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.clone()
    }

    /// Entries appended after the first `from` entries
    pub fn entries_since(&self, from: usize) -> Vec<LogEntry> {
        let inner = self.lock();
        inner.entries.iter().skip(from).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries with the given style
    pub fn count(&self, style: LogStyle) -> usize {
        self.lock().entries.iter().filter(|e| e.is(style)).count()
    }

    /// Change counter, bumped on every append or clear
    pub fn version(&self) -> u64 {
        self.lock().version
    }
}
