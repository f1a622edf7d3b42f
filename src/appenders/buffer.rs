//! In-memory appender
//!
//! Keeps everything it receives in a string that can be read through a
//! [`SharedBuffer`] handle, which makes it the natural sink for tests.

use crate::core::{Appender, LogEntry, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Read side of a [`BufferAppender`]
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<String>>,
}

impl SharedBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        self.inner.lock().clone()
    }

    /// Written text split in lines, without their `\n`
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines().map(String::from).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[derive(Debug, Default)]
pub struct BufferAppender {
    buffer: SharedBuffer,
}

impl BufferAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the text this appender collects
    pub fn buffer(&self) -> SharedBuffer {
        self.buffer.clone()
    }
}

impl Appender for BufferAppender {
    fn append(&mut self, text: &str, _entry: &LogEntry) -> Result<()> {
        self.buffer.inner.lock().push_str(text);
        Ok(())
    }

    fn appender_type(&self) -> &str {
        "buffer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SeverityLevel;

    #[test]
    fn test_shared_view() {
        let mut appender = BufferAppender::new();
        let buffer = appender.buffer();
        assert!(buffer.is_empty());

        let entry = LogEntry::new(SeverityLevel::ERROR, "x");
        appender.append("a\n", &entry).unwrap();
        appender.append("b\n", &entry).unwrap();
        assert_eq!(buffer.contents(), "a\nb\n");
        assert_eq!(buffer.lines(), vec!["a", "b"]);

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
