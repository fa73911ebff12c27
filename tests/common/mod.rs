//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;
use streamlab_rs::session::{LogStyle, OutputLog};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Text of every log entry, in order
pub fn texts(log: &OutputLog) -> Vec<String> {
    log.entries().into_iter().map(|e| e.text).collect()
}

/// Text of every log entry with the given style
pub fn texts_with(log: &OutputLog, style: LogStyle) -> Vec<String> {
    log.entries()
        .into_iter()
        .filter(|e| e.is(style))
        .map(|e| e.text)
        .collect()
}

/// Plain (unstyled) entries, i.e. pipeline output
pub fn output_lines(log: &OutputLog) -> Vec<String> {
    log.entries()
        .into_iter()
        .filter(|e| e.style.is_none())
        .map(|e| e.text)
        .collect()
}
