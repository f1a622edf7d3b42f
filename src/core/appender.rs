//! Appender trait for log output destinations
//!
//! A sink only knows how to write already rendered text. Everything the
//! logger decides per appender (name, enabled flag, severity threshold,
//! component allow-list, format, counters) lives in the [`AppenderHandle`]
//! that wraps it.

use super::error::{LoggerError, Result};
use super::format::Format;
use super::log_entry::LogEntry;
use super::severity::SeverityLevel;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Appender types whose instances may be renamed
pub const RENAMEABLE_TYPES: [&str; 2] = ["console", "syslog"];

const RATE_WINDOW: Duration = Duration::from_secs(60);

pub trait Appender: Send {
    /// Write one rendered message; `text` already ends with `\n`
    fn append(&mut self, text: &str, entry: &LogEntry) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Re-acquire the destination, e.g. after an external log rotation
    fn reopen(&mut self) -> Result<()> {
        Ok(())
    }

    fn appender_type(&self) -> &str;

    /// At most one appender of a unique type can be registered with a logger
    fn is_unique(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct AppenderState {
    name: String,
    enabled: bool,
    severity: SeverityLevel,
    components: Vec<String>,
    format: Arc<Format>,
}

#[derive(Debug)]
struct RateWindow {
    started: Instant,
    bytes: u64,
}

/// A registered sink plus the settings the logger applies to it
pub struct AppenderHandle {
    appender_type: String,
    unique: bool,
    state: RwLock<AppenderState>,
    sink: Mutex<Box<dyn Appender>>,
    bytes_per_minute: AtomicU64,
    window: Mutex<RateWindow>,
    bytes_written: AtomicU64,
    messages_written: AtomicU64,
    messages_dropped: AtomicU64,
}

impl AppenderHandle {
    /// Wrap a sink; the default name is the sink's type
    pub fn new(sink: impl Appender + 'static) -> Self {
        Self::from_box(Box::new(sink))
    }

    pub fn from_box(sink: Box<dyn Appender>) -> Self {
        let appender_type = sink.appender_type().to_string();
        let unique = sink.is_unique();
        Self {
            state: RwLock::new(AppenderState {
                name: appender_type.clone(),
                enabled: true,
                severity: SeverityLevel::DEFAULT,
                components: Vec::new(),
                format: Format::default_shared(),
            }),
            appender_type,
            unique,
            sink: Mutex::new(sink),
            bytes_per_minute: AtomicU64::new(0),
            window: Mutex::new(RateWindow {
                started: Instant::now(),
                bytes: 0,
            }),
            bytes_written: AtomicU64::new(0),
            messages_written: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
        }
    }

    /// Give the appender its name at construction, bypassing the rename rule
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.state.write().name = name.into();
        self
    }

    #[must_use]
    pub fn with_severity(self, severity: SeverityLevel) -> Self {
        self.set_severity(severity);
        self
    }

    #[must_use]
    pub fn with_format(self, format: Arc<Format>) -> Self {
        self.set_format(format);
        self
    }

    #[must_use]
    pub fn with_component(self, component: impl Into<String>) -> Self {
        self.add_component(component);
        self
    }

    pub fn get_type(&self) -> &str {
        &self.appender_type
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn get_name(&self) -> String {
        self.state.read().name.clone()
    }

    /// Rename the appender; only console and syslog appenders can be renamed
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        if !RENAMEABLE_TYPES.contains(&self.appender_type.as_str()) {
            return Err(LoggerError::invalid_parameter(format!(
                "an appender of type \"{}\" cannot be renamed.",
                self.appender_type
            )));
        }
        self.state.write().name = name.into();
        Ok(())
    }

    /// Whether the appender still carries its type as its name
    pub fn has_default_name(&self) -> bool {
        self.state.read().name == self.appender_type
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.write().enabled = enabled;
    }

    pub fn get_severity(&self) -> SeverityLevel {
        self.state.read().severity
    }

    pub fn set_severity(&self, severity: SeverityLevel) {
        self.state.write().severity = severity;
    }

    /// Lower the threshold to `severity` if that is more permissive
    pub fn reduce_severity(&self, severity: SeverityLevel) {
        let mut state = self.state.write();
        if severity.value() < state.severity.value() {
            state.severity = severity;
        }
    }

    /// Raise the threshold to `severity` if that is more restrictive
    pub fn increase_severity(&self, severity: SeverityLevel) {
        let mut state = self.state.write();
        if severity.value() > state.severity.value() {
            state.severity = severity;
        }
    }

    /// Restrict the appender to messages tagged with `component`
    pub fn add_component(&self, component: impl Into<String>) {
        let component = component.into();
        let mut state = self.state.write();
        if !state.components.contains(&component) {
            state.components.push(component);
        }
    }

    pub fn components(&self) -> Vec<String> {
        self.state.read().components.clone()
    }

    pub fn get_format(&self) -> Arc<Format> {
        Arc::clone(&self.state.read().format)
    }

    /// Swap the format, returning the previous one
    pub fn set_format(&self, format: Arc<Format>) -> Arc<Format> {
        std::mem::replace(&mut self.state.write().format, format)
    }

    /// Use `format` until the returned guard is dropped
    pub fn scoped_format(&self, format: Arc<Format>) -> FormatGuard<'_> {
        let previous = self.set_format(format);
        FormatGuard {
            handle: self,
            previous: Some(previous),
        }
    }

    /// Limit the output to `bytes` per minute; zero removes the limit
    pub fn set_bytes_per_minute(&self, bytes: u64) {
        self.bytes_per_minute.store(bytes, Ordering::Relaxed);
    }

    pub fn bytes_per_minute(&self) -> u64 {
        self.bytes_per_minute.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn messages_written(&self) -> u64 {
        self.messages_written.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }

    /// Severity and component filters of this appender
    pub fn accepts(&self, entry: &LogEntry) -> bool {
        let state = self.state.read();
        if !state.enabled || !entry.severity.passes(state.severity) {
            return false;
        }
        state.components.is_empty()
            || entry
                .routing_components()
                .iter()
                .any(|name| state.components.iter().any(|c| c == name))
    }

    /// Render and write an entry already known to be accepted
    ///
    /// Returns `Ok(false)` when the bytes-per-minute limit dropped it.
    pub fn send(&self, entry: &LogEntry) -> Result<bool> {
        let format = self.get_format();
        let text = format.render(entry)?;
        let len = text.len() as u64;

        if !self.reserve(len) {
            self.messages_dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        }

        self.sink.lock().append(&text, entry)?;
        self.bytes_written.fetch_add(len, Ordering::Relaxed);
        self.messages_written.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn reserve(&self, len: u64) -> bool {
        let limit = self.bytes_per_minute();
        if limit == 0 {
            return true;
        }
        let mut window = self.window.lock();
        if window.started.elapsed() >= RATE_WINDOW {
            window.started = Instant::now();
            window.bytes = 0;
        }
        if window.bytes + len > limit {
            return false;
        }
        window.bytes += len;
        true
    }

    pub fn flush(&self) -> Result<()> {
        self.sink.lock().flush()
    }

    pub fn reopen(&self) -> Result<()> {
        self.sink.lock().reopen()
    }
}

impl std::fmt::Debug for AppenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("AppenderHandle")
            .field("type", &self.appender_type)
            .field("name", &state.name)
            .field("enabled", &state.enabled)
            .field("severity", &state.severity)
            .field("components", &state.components)
            .finish()
    }
}

/// Restores the previous format of an appender when dropped
pub struct FormatGuard<'a> {
    handle: &'a AppenderHandle,
    previous: Option<Arc<Format>>,
}

impl Drop for FormatGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.handle.set_format(previous);
        }
    }
}

/// Creates a sink from its appender name and the flat configuration map
pub type AppenderFactory =
    Arc<dyn Fn(&str, &HashMap<String, String>) -> Result<Box<dyn Appender>> + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::ComponentRegistry;

    struct Collect {
        kind: &'static str,
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl Appender for Collect {
        fn append(&mut self, text: &str, _entry: &LogEntry) -> Result<()> {
            self.lines.lock().push(text.to_string());
            Ok(())
        }

        fn appender_type(&self) -> &str {
            self.kind
        }
    }

    fn handle(kind: &'static str) -> (AppenderHandle, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Collect {
            kind,
            lines: Arc::clone(&lines),
        };
        let handle = AppenderHandle::new(sink).with_format(Format::shared("${message}").unwrap());
        (handle, lines)
    }

    #[test]
    fn test_rename_only_reserved_types() {
        let (file, _) = handle("file");
        let err = file.set_name("other").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidParameter(_)));
        assert_eq!(file.get_name(), "file");

        let (console, _) = handle("console");
        assert!(console.has_default_name());
        console.set_name("user-console").unwrap();
        assert_eq!(console.get_name(), "user-console");
        assert!(!console.has_default_name());
    }

    #[test]
    fn test_reduce_and_increase_severity() {
        let (h, _) = handle("file");
        h.set_severity(SeverityLevel::WARNING);
        h.reduce_severity(SeverityLevel::ERROR);
        assert_eq!(h.get_severity(), SeverityLevel::WARNING);
        h.reduce_severity(SeverityLevel::DEBUG);
        assert_eq!(h.get_severity(), SeverityLevel::DEBUG);
        h.increase_severity(SeverityLevel::INFORMATION);
        assert_eq!(h.get_severity(), SeverityLevel::INFORMATION);
        h.increase_severity(SeverityLevel::TRACE);
        assert_eq!(h.get_severity(), SeverityLevel::INFORMATION);
    }

    #[test]
    fn test_accepts_filters() {
        let registry = ComponentRegistry::new();
        let (h, _) = handle("file");
        h.set_severity(SeverityLevel::WARNING);

        assert!(!h.accepts(&LogEntry::new(SeverityLevel::INFORMATION, "x")));
        assert!(h.accepts(&LogEntry::new(SeverityLevel::WARNING, "x")));
        assert!(!h.accepts(&LogEntry::new(SeverityLevel::OFF, "x")));

        h.add_component("secure");
        assert!(!h.accepts(&LogEntry::new(SeverityLevel::ERROR, "x")));
        let tagged = LogEntry::new(SeverityLevel::ERROR, "x")
            .with_component(registry.get_or_create("secure").unwrap());
        assert!(h.accepts(&tagged));

        h.set_enabled(false);
        assert!(!h.accepts(&tagged));

        let (off, _) = handle("file");
        off.set_severity(SeverityLevel::OFF);
        assert!(!off.accepts(&LogEntry::new(SeverityLevel::FATAL, "x")));
    }

    #[test]
    fn test_untagged_matches_normal_allow_list() {
        let (h, _) = handle("file");
        h.add_component("normal");
        assert!(h.accepts(&LogEntry::new(SeverityLevel::ERROR, "x")));
    }

    #[test]
    fn test_scoped_format_restores() {
        let (h, lines) = handle("file");
        let entry = LogEntry::new(SeverityLevel::ERROR, "hello");
        {
            let _guard = h.scoped_format(Format::shared("<${message}>").unwrap());
            h.send(&entry).unwrap();
        }
        h.send(&entry).unwrap();
        assert_eq!(*lines.lock(), vec!["<hello>\n", "hello\n"]);
        assert_eq!(h.messages_written(), 2);
        assert_eq!(h.bytes_written(), 14);
    }

    #[test]
    fn test_bytes_per_minute_limit() {
        let (h, lines) = handle("file");
        h.set_bytes_per_minute(10);
        let entry = LogEntry::new(SeverityLevel::ERROR, "1234");
        assert!(h.send(&entry).unwrap());
        assert!(h.send(&entry).unwrap());
        assert!(!h.send(&entry).unwrap());
        assert_eq!(lines.lock().len(), 2);
        assert_eq!(h.messages_dropped(), 1);
    }
}
