//! Editable text buffers
//!
//! A session has two independent buffers: the pipeline configuration and the
//! sample input. Every mutation bumps the buffer's revision, including a
//! replacement with identical text, so a revision comparison answers "was
//! this buffer touched since" without looking at the content.
//!
//! Edit offsets are in characters, not bytes, and are clamped to the buffer
//! length.

use std::ops::Range;

/// An interactive edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEdit {
    /// Replace the whole content
    Replace(String),
    /// Insert text at a character offset
    Insert { offset: usize, text: String },
    /// Replace a character range
    ReplaceRange { range: Range<usize>, text: String },
    /// Append text at the end
    Append(String),
}

/// A text buffer with a mutation counter
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    content: String,
    revision: u64,
}

impl Buffer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            revision: 0,
        }
    }

    /// Borrow the current content
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Point-in-time copy of the content
    pub fn snapshot(&self) -> String {
        self.content.clone()
    }

    /// Number of mutations applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole content
    pub fn set(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.revision += 1;
    }

    /// Apply an interactive edit
    pub fn apply(&mut self, edit: BufferEdit) {
        match edit {
            BufferEdit::Replace(text) => {
                self.content = text;
            }
            BufferEdit::Insert { offset, text } => {
                let at = self.byte_offset(offset);
                self.content.insert_str(at, &text);
            }
            BufferEdit::ReplaceRange { range, text } => {
                let start = self.byte_offset(range.start);
                let end = self.byte_offset(range.end.max(range.start));
                self.content.replace_range(start..end, &text);
            }
            BufferEdit::Append(text) => {
                self.content.push_str(&text);
            }
        }
        self.revision += 1;
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

/// The configuration and input buffers of one session
#[derive(Debug, Clone, Default)]
pub struct BufferPair {
    pub config: Buffer,
    pub input: Buffer,
}

impl BufferPair {
    pub fn new(config: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            config: Buffer::new(config),
            input: Buffer::new(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_replacement_still_bumps_revision() {
        let mut buf = Buffer::new("pipeline: {}");
        buf.set("pipeline: {}");
        assert_eq!(buf.revision(), 1);
        assert_eq!(buf.as_str(), "pipeline: {}");
    }

    #[test]
    fn test_insert_uses_char_offsets() {
        let mut buf = Buffer::new("héllo");
        buf.apply(BufferEdit::Insert {
            offset: 2,
            text: "X".to_string(),
        });
        assert_eq!(buf.as_str(), "héXllo");
    }

    #[test]
    fn test_out_of_range_offsets_clamp() {
        let mut buf = Buffer::new("abc");
        buf.apply(BufferEdit::Insert {
            offset: 99,
            text: "d".to_string(),
        });
        buf.apply(BufferEdit::ReplaceRange {
            range: 3..50,
            text: "D".to_string(),
        });
        assert_eq!(buf.as_str(), "abcD");
        assert_eq!(buf.revision(), 2);
    }

    #[test]
    fn test_buffers_are_independent() {
        let mut pair = BufferPair::new("cfg", "in");
        pair.input.apply(BufferEdit::Append("put".to_string()));
        assert_eq!(pair.input.as_str(), "input");
        assert_eq!(pair.config.revision(), 0);
        assert_eq!(pair.input.revision(), 1);
    }
}
