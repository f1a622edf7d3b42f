//! Routing of log entries to the registered appenders
//!
//! The dispatcher is shared between the logger and its async worker, so the
//! same routing runs whether an entry is delivered inline or from the queue.

use super::appender::AppenderHandle;
use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::metrics::LoggerMetrics;
use super::severity::SeverityLevel;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Default)]
pub(crate) struct Dispatcher {
    appenders: RwLock<Vec<Arc<AppenderHandle>>>,
    include: RwLock<Vec<String>>,
    ignore: RwLock<Vec<String>>,
    metrics: LoggerMetrics,
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn appenders(&self) -> Vec<Arc<AppenderHandle>> {
        self.appenders.read().clone()
    }

    pub fn get_appender(&self, name: &str) -> Option<Arc<AppenderHandle>> {
        self.appenders
            .read()
            .iter()
            .find(|a| a.get_name() == name)
            .cloned()
    }

    /// Register an appender, applying the unique-type claim rule
    ///
    /// When an appender of the same unique type is already registered, the
    /// newcomer is discarded. If the registered one still has its default
    /// name it takes the newcomer's name. The registered appender is returned.
    pub fn add_appender(&self, appender: AppenderHandle) -> Arc<AppenderHandle> {
        let mut appenders = self.appenders.write();

        if appender.is_unique() {
            if let Some(existing) = appenders
                .iter()
                .find(|a| a.get_type() == appender.get_type())
            {
                if existing.has_default_name() && !appender.has_default_name() {
                    if let Err(e) = existing.set_name(appender.get_name()) {
                        eprintln!("[LOGGER ERROR] Failed to rename appender: {}", e);
                    }
                }
                return Arc::clone(existing);
            }
        }

        let name = appender.get_name();
        if let Some(index) = appenders.iter().position(|a| a.get_name() == name) {
            eprintln!(
                "[LOGGER WARNING] Appender \"{}\" replaced by a new appender with the same name.",
                name
            );
            appenders.remove(index);
        }

        let appender = Arc::new(appender);
        appenders.push(Arc::clone(&appender));
        appender
    }

    pub fn remove_appender(&self, name: &str) -> Option<Arc<AppenderHandle>> {
        let mut appenders = self.appenders.write();
        let index = appenders.iter().position(|a| a.get_name() == name)?;
        Some(appenders.remove(index))
    }

    pub fn clear(&self) {
        self.appenders.write().clear();
        self.include.write().clear();
        self.ignore.write().clear();
        self.metrics.reset();
    }

    pub fn add_include(&self, component: &str) {
        let mut include = self.include.write();
        if !include.iter().any(|c| c == component) {
            include.push(component.to_string());
        }
    }

    pub fn add_ignore(&self, component: &str) {
        let mut ignore = self.ignore.write();
        if !ignore.iter().any(|c| c == component) {
            ignore.push(component.to_string());
        }
    }

    /// Lowest threshold of the enabled appenders, `OFF` when nothing listens
    pub fn output_threshold(&self) -> SeverityLevel {
        self.appenders
            .read()
            .iter()
            .filter(|a| a.is_enabled())
            .map(|a| a.get_severity())
            .filter(|s| !s.is_off())
            .min_by_key(|s| s.value())
            .unwrap_or(SeverityLevel::OFF)
    }

    /// Logger-wide include/ignore lists
    pub fn component_allowed(&self, entry: &LogEntry) -> bool {
        let components = entry.routing_components();

        let ignore = self.ignore.read();
        if components.iter().any(|c| ignore.iter().any(|i| i == c)) {
            return false;
        }

        let include = self.include.read();
        include.is_empty() || components.iter().any(|c| include.iter().any(|i| i == c))
    }

    /// Deliver an entry to every appender that accepts it
    ///
    /// Each appender runs isolated from the others: a failure or a panic is
    /// reported on stderr and the remaining appenders still get the entry.
    /// The first failure is returned.
    pub fn dispatch(&self, entry: &LogEntry) -> Result<()> {
        if !self.component_allowed(entry) {
            self.metrics.record_ignored();
            return Ok(());
        }

        let appenders = self.appenders();
        let mut first_error = None;
        let mut delivered = false;
        let mut dropped = false;

        for appender in appenders.iter().filter(|a| a.accepts(entry)) {
            match catch_unwind(AssertUnwindSafe(|| appender.send(entry))) {
                Ok(Ok(true)) => delivered = true,
                Ok(Ok(false)) => dropped = true,
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Appender \"{}\" failed: {}",
                        appender.get_name(),
                        e
                    );
                    dropped = true;
                    first_error.get_or_insert(e);
                }
                Err(panic_info) => {
                    let panic_msg = panic_message(&*panic_info);
                    eprintln!(
                        "[LOGGER CRITICAL] Appender \"{}\" panicked: {}. \
                         Other appenders continue to function.",
                        appender.get_name(),
                        panic_msg
                    );
                    dropped = true;
                    first_error.get_or_insert_with(|| {
                        LoggerError::writer(format!(
                            "appender \"{}\" panicked: {}",
                            appender.get_name(),
                            panic_msg
                        ))
                    });
                }
            }
        }

        if dropped {
            self.metrics.record_dropped();
        } else if delivered {
            self.metrics.record_logged();
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.for_each_sink("flush", |a| a.flush())
    }

    pub fn reopen(&self) -> Result<()> {
        self.for_each_sink("reopen", |a| a.reopen())
    }

    fn for_each_sink<F>(&self, operation: &str, f: F) -> Result<()>
    where
        F: Fn(&AppenderHandle) -> Result<()>,
    {
        let mut first_error = None;
        for appender in self.appenders() {
            match catch_unwind(AssertUnwindSafe(|| f(&appender))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Appender \"{}\" {} failed: {}",
                        appender.get_name(),
                        operation,
                        e
                    );
                    first_error.get_or_insert(e);
                }
                Err(panic_info) => {
                    let panic_msg = panic_message(&*panic_info);
                    eprintln!(
                        "[LOGGER CRITICAL] Appender \"{}\" panicked during {}: {}. \
                         Other appenders continue to function.",
                        appender.get_name(),
                        operation,
                        panic_msg
                    );
                    first_error.get_or_insert_with(|| LoggerError::writer(panic_msg));
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
