//! Log entry structure
//!
//! A `LogEntry` is the frozen form of a message once its owner sent it: this
//! is what travels through the async queue and what formats render.

use super::component::{Component, COMPONENT_NORMAL};
use super::diagnostic::DiagnosticSnapshot;
use super::severity::{system_name_of, SeverityLevel};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Collapse `\r\n` sequences so every line ends with a single `\n`
pub fn normalize_text(text: &str) -> String {
    if text.contains("\r\n") {
        text.replace("\r\n", "\n")
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: SeverityLevel,
    pub severity_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<String>,
    pub function: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub components: Vec<Arc<Component>>,
    pub fields: BTreeMap<String, String>,
    /// Captured when the entry enters the logger; `None` means "capture at render"
    pub diagnostics: Option<DiagnosticSnapshot>,
    pub program_name: String,
    pub process_id: u32,
    pub thread_id: String,
    pub thread_name: Option<String>,
}

impl LogEntry {
    pub fn new(severity: SeverityLevel, message: impl AsRef<str>) -> Self {
        Self {
            severity,
            severity_name: system_name_of(severity),
            message: normalize_text(message.as_ref()),
            timestamp: Utc::now(),
            file: None,
            function: None,
            line: None,
            column: None,
            components: Vec::new(),
            fields: BTreeMap::new(),
            diagnostics: None,
            program_name: String::new(),
            process_id: std::process::id(),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, file: &str, function: &str, line: u32, column: u32) -> Self {
        self.file = Some(file.to_string());
        self.function = Some(function.to_string());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    #[must_use]
    pub fn with_component(mut self, component: Arc<Component>) -> Self {
        if !self.has_component(component.name()) {
            self.components.push(component);
        }
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSnapshot) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.name() == name)
    }

    /// Names used for routing; an untagged entry counts as `normal`
    pub fn routing_components(&self) -> Vec<&str> {
        if self.components.is_empty() {
            vec![COMPONENT_NORMAL]
        } else {
            self.components.iter().map(|c| c.name()).collect()
        }
    }
}
