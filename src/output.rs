//! Per-dispatch output sink.
//!
//! Every trigger call creates its own `Output` and hands it to each listener
//! in turn. Whatever listeners write is returned to the trigger caller, so
//! nested triggers each collect into their own buffer.

use std::fmt;

/// Text accumulated by listeners during a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    buf: String,
}

impl Output {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends text to the sink.
    pub fn push(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
    }

    /// Appends text followed by a newline.
    pub fn push_line(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    /// Returns everything written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Length of the captured text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Ends the capture and returns the accumulated text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Write for Output {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}
