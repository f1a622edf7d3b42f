//! Main logger implementation
//!
//! A [`Logger`] is a cheap, clonable handle on shared state: the severity and
//! component registries, the appenders, the appender factories, the default
//! fields and the optional async worker. [`Logger::instance`] gives the
//! process-wide logger; tests and embedders can build independent ones with
//! [`Logger::new`] or [`Logger::builder`].

use super::appender::{Appender, AppenderFactory, AppenderHandle};
use super::component::{
    Component, ComponentRegistry, COMPONENT_BANNER, COMPONENT_NORMAL, COMPONENT_SELF,
};
use super::config;
use super::diagnostic::DiagnosticSnapshot;
use super::dispatch::Dispatcher;
use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::message::Message;
use super::metrics::LoggerMetrics;
use super::severity::{SeverityLevel, SeverityRegistry};
use super::worker::AsyncWorker;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static INSTANCE: Lazy<Logger> = Lazy::new(Logger::new);

struct LoggerInner {
    severities: SeverityRegistry,
    components: ComponentRegistry,
    dispatcher: Arc<Dispatcher>,
    /// Held for writing while the worker starts or drains, so producers
    /// cannot slip a synchronous entry ahead of queued ones
    worker: RwLock<Option<AsyncWorker>>,
    factories: RwLock<HashMap<String, AppenderFactory>>,
    default_fields: RwLock<BTreeMap<String, String>>,
    program_name: RwLock<String>,
    ready: AtomicBool,
}

impl Drop for LoggerInner {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            if let Err(e) = worker.stop() {
                eprintln!("[LOGGER ERROR] Failed to stop the async worker: {}", e);
            }
        }

        if let Err(e) = self.dispatcher.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let metrics = self.dispatcher.metrics();
        let dropped = metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                metrics.drop_rate()
            );
        }
    }
}

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                severities: SeverityRegistry::new(),
                components: ComponentRegistry::new(),
                dispatcher: Arc::new(Dispatcher::new()),
                worker: RwLock::new(None),
                factories: RwLock::new(crate::appenders::builtin_factories()),
                default_fields: RwLock::new(BTreeMap::new()),
                program_name: RwLock::new(String::new()),
                ready: AtomicBool::new(false),
            }),
        }
    }

    /// The process-wide logger; every call returns the same logger
    pub fn instance() -> Logger {
        INSTANCE.clone()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Whether both handles refer to the same logger
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn severities(&self) -> &SeverityRegistry {
        &self.inner.severities
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.inner.components
    }

    /// Shared component by name, created on first use
    pub fn get_component(&self, name: &str) -> Result<Arc<Component>> {
        self.inner.components.get_or_create(name)
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use snaplogger::Logger;
    ///
    /// let logger = Logger::new();
    /// logger.info("nobody listens yet");
    ///
    /// let metrics = logger.metrics();
    /// assert_eq!(metrics.ignored_count(), 1);
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        self.inner.dispatcher.metrics()
    }

    // Appenders

    /// Register an appender and return the instance now in the logger
    ///
    /// A second console appender is discarded; if the registered console
    /// still has its default name it is renamed to the newcomer's name, so
    /// the returned handle may be the earlier instance.
    pub fn add_appender(&self, appender: AppenderHandle) -> Arc<AppenderHandle> {
        self.inner.dispatcher.add_appender(appender)
    }

    pub fn get_appender(&self, name: &str) -> Option<Arc<AppenderHandle>> {
        self.inner.dispatcher.get_appender(name)
    }

    /// Appenders in registration order
    pub fn appenders(&self) -> Vec<Arc<AppenderHandle>> {
        self.inner.dispatcher.appenders()
    }

    pub fn remove_appender(&self, name: &str) -> Option<Arc<AppenderHandle>> {
        self.inner.dispatcher.remove_appender(name)
    }

    /// Make a new appender type available to [`create_appender`](Self::create_appender)
    pub fn register_appender_factory<F>(&self, appender_type: &str, factory: F) -> Result<()>
    where
        F: Fn(&str, &HashMap<String, String>) -> Result<Box<dyn Appender>> + Send + Sync + 'static,
    {
        let mut factories = self.inner.factories.write();
        if factories.contains_key(appender_type) {
            return Err(LoggerError::duplicate(format!(
                "trying to add two appender factories of type \"{}\".",
                appender_type
            )));
        }
        factories.insert(appender_type.to_string(), Arc::new(factory));
        Ok(())
    }

    /// Build an appender of a registered type; `options` are its own keys,
    /// e.g. `filename` for a file appender
    pub fn create_appender(
        &self,
        appender_type: &str,
        name: &str,
        options: &HashMap<String, String>,
    ) -> Result<AppenderHandle> {
        let factory = self
            .inner
            .factories
            .read()
            .get(appender_type)
            .cloned()
            .ok_or_else(|| {
                LoggerError::invalid_parameter(format!(
                    "unknown appender type \"{}\".",
                    appender_type
                ))
            })?;
        let sink = factory(name, options)?;
        Ok(AppenderHandle::from_box(sink).with_name(name))
    }

    // Filters

    /// Lowest severity any enabled appender accepts, `OFF` without appenders
    pub fn output_threshold(&self) -> SeverityLevel {
        self.inner.dispatcher.output_threshold()
    }

    /// Whether a message of `severity` would currently reach an appender
    pub fn is_enabled(&self, severity: SeverityLevel) -> bool {
        severity.passes(self.output_threshold())
    }

    /// Only let messages tagged with one of the included components through
    pub fn add_component_to_include(&self, name: &str) -> Result<()> {
        let component = self.get_component(name)?;
        self.inner.dispatcher.add_include(component.name());
        Ok(())
    }

    /// Drop every message tagged with `name`
    pub fn add_component_to_ignore(&self, name: &str) -> Result<()> {
        let component = self.get_component(name)?;
        self.inner.dispatcher.add_ignore(component.name());
        Ok(())
    }

    // Context

    /// Field added to every message that does not set it itself
    pub fn set_default_field(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner
            .default_fields
            .write()
            .insert(key.into(), value.into());
    }

    pub fn default_fields(&self) -> BTreeMap<String, String> {
        self.inner.default_fields.read().clone()
    }

    pub fn set_program_name(&self, name: impl Into<String>) {
        *self.inner.program_name.write() = name.into();
    }

    pub fn program_name(&self) -> String {
        self.inner.program_name.read().clone()
    }

    // Delivery

    /// Start a message; it is sent when dropped or by [`Message::send`]
    ///
    /// The severity gate runs here, before any formatting happens.
    pub fn message(&self, severity: SeverityLevel) -> Message {
        Message::new(self, severity)
    }

    /// Single ingestion point for complete entries
    pub fn log_message(&self, entry: LogEntry) -> Result<()> {
        if !self.is_enabled(entry.severity) {
            self.metrics().record_ignored();
            return Ok(());
        }
        self.deliver(entry)
    }

    /// Deliver an entry that already went through the severity gate
    pub(crate) fn deliver(&self, mut entry: LogEntry) -> Result<()> {
        self.prepare(&mut entry);

        let worker = self.inner.worker.read();
        match worker.as_ref() {
            Some(worker) => {
                self.metrics().record_queued();
                worker.send(entry)
            }
            None => {
                drop(worker);
                self.inner.dispatcher.dispatch(&entry)
            }
        }
    }

    fn prepare(&self, entry: &mut LogEntry) {
        entry.severity_name = self.inner.severities.name_of(entry.severity);

        for (key, value) in self.inner.default_fields.read().iter() {
            entry
                .fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        if entry.program_name.is_empty() {
            entry.program_name = self.program_name();
        }

        if entry.diagnostics.is_none() {
            entry.diagnostics = Some(DiagnosticSnapshot::capture());
        }
    }

    pub fn log(&self, severity: SeverityLevel, message: impl AsRef<str>) -> Result<()> {
        if !self.is_enabled(severity) {
            self.metrics().record_ignored();
            return Ok(());
        }
        self.deliver(LogEntry::new(severity, message))
    }

    // errors are reported on stderr by the dispatcher
    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) {
        let _ = self.log(SeverityLevel::TRACE, message);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        let _ = self.log(SeverityLevel::DEBUG, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        let _ = self.log(SeverityLevel::INFORMATION, message);
    }

    #[inline]
    pub fn warning(&self, message: impl AsRef<str>) {
        let _ = self.log(SeverityLevel::WARNING, message);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        let _ = self.log(SeverityLevel::ERROR, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl AsRef<str>) {
        let _ = self.log(SeverityLevel::FATAL, message);
    }

    // Lifecycle

    /// Switch between inline and background delivery
    ///
    /// Disabling blocks until every queued entry has been delivered and the
    /// worker thread has exited.
    pub fn set_asynchronous(&self, asynchronous: bool) -> Result<()> {
        let mut worker = self.inner.worker.write();
        if asynchronous {
            if worker.is_none() {
                let self_component = self.get_component(COMPONENT_SELF)?;
                *worker = Some(AsyncWorker::start(
                    Arc::clone(&self.inner.dispatcher),
                    self_component,
                    self.program_name(),
                )?);
            }
            Ok(())
        } else {
            match worker.take() {
                Some(running) => running.stop(),
                None => Ok(()),
            }
        }
    }

    pub fn is_asynchronous(&self) -> bool {
        self.inner.worker.read().is_some()
    }

    /// Emit the startup banner; later calls do nothing
    pub fn ready(&self) -> Result<()> {
        if self.inner.ready.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let banner = self.get_component(COMPONENT_BANNER)?;
        let normal = self.get_component(COMPONENT_NORMAL)?;
        let program = match self.program_name() {
            name if name.is_empty() => env!("CARGO_PKG_NAME").to_string(),
            name => name,
        };
        let lines = [
            "-".repeat(50),
            format!("{} started.", program),
            format!(
                "{} v{} with {} appender(s).",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                self.appenders().len()
            ),
        ];

        let mut first_error = None;
        for line in lines {
            let entry = LogEntry::new(SeverityLevel::INFORMATION, line)
                .with_component(Arc::clone(&banner))
                .with_component(Arc::clone(&normal));
            if let Err(e) = self.log_message(entry) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// Restore a clean slate: synchronous, no appenders, filters or fields
    pub fn reset(&self) -> Result<()> {
        let stopped = self.set_asynchronous(false);
        if let Err(e) = self.inner.dispatcher.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during reset: {}", e);
        }
        self.inner.dispatcher.clear();
        self.inner.default_fields.write().clear();
        self.inner.program_name.write().clear();
        self.inner.ready.store(false, Ordering::Release);
        stopped
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.dispatcher.flush()
    }

    /// Ask every appender to re-acquire its destination
    pub fn reopen(&self) -> Result<()> {
        self.inner.dispatcher.reopen()
    }

    /// Apply a flat key/value configuration
    ///
    /// Returns false, after reporting the problem on stderr, when the
    /// configuration is malformed; nothing is applied in that case.
    pub fn process_configuration(&self, options: &HashMap<String, String>) -> bool {
        match config::apply_configuration(self, options) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Invalid logger configuration: {}", e);
                false
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("appenders", &self.appenders())
            .field("asynchronous", &self.is_asynchronous())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use snaplogger::prelude::*;
///
/// let logger = Logger::builder()
///     .program_name("server")
///     .appender(AppenderHandle::new(ConsoleAppender::new()).with_severity(SeverityLevel::DEBUG))
///     .default_field("region", "eu")
///     .build()
///     .unwrap();
/// assert_eq!(logger.output_threshold(), SeverityLevel::DEBUG);
/// ```
pub struct LoggerBuilder {
    appenders: Vec<AppenderHandle>,
    program_name: Option<String>,
    default_fields: Vec<(String, String)>,
    asynchronous: bool,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            appenders: Vec::new(),
            program_name: None,
            default_fields: Vec::new(),
            asynchronous: false,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender(mut self, appender: AppenderHandle) -> Self {
        self.appenders.push(appender);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn default_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_fields.push((key.into(), value.into()));
        self
    }

    /// Deliver from a background thread
    #[must_use = "builder methods return a new value"]
    pub fn asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }

    pub fn build(self) -> Result<Logger> {
        let logger = Logger::new();
        if let Some(name) = self.program_name {
            logger.set_program_name(name);
        }
        for (key, value) in self.default_fields {
            logger.set_default_field(key, value);
        }
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        logger.set_asynchronous(self.asynchronous)?;
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
