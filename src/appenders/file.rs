//! File appender implementation

use crate::core::{Appender, LogEntry, LoggerError, Result};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct FileAppender {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

fn open(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::io_operation("opening", format!("cannot open {}", path.display()), e)
        })?;
    Ok(BufWriter::new(file))
}

impl FileAppender {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let writer = Some(open(&path)?);
        Ok(Self { path, writer })
    }

    /// Build from the appender's own configuration keys (`filename`)
    pub fn from_options(name: &str, options: &HashMap<String, String>) -> Result<Self> {
        let filename = options.get("filename").ok_or_else(|| {
            LoggerError::config(
                format!("{}::filename", name),
                "a file appender requires a filename.",
            )
        })?;
        Self::new(filename)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Appender for FileAppender {
    fn append(&mut self, text: &str, _entry: &LogEntry) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    /// Close and open the file again, following an external rotation
    fn reopen(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.writer = Some(open(&self.path)?);
        Ok(())
    }

    fn appender_type(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SeverityLevel;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut appender = FileAppender::new(&path).unwrap();
        let entry = LogEntry::new(SeverityLevel::ERROR, "x");
        appender.append("one\n", &entry).unwrap();
        appender.append("two\n", &entry).unwrap();
        appender.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_reopen_after_rotation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.log");
        let rotated = dir.path().join("out.log.1");
        let mut appender = FileAppender::new(&path).unwrap();
        let entry = LogEntry::new(SeverityLevel::ERROR, "x");

        appender.append("before\n", &entry).unwrap();
        appender.flush().unwrap();
        std::fs::rename(&path, &rotated).unwrap();

        appender.reopen().unwrap();
        appender.append("after\n", &entry).unwrap();
        appender.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&rotated).unwrap(), "before\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn test_missing_filename() {
        let err = FileAppender::from_options("journal", &HashMap::new())
            .err()
            .expect("filename is required");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
