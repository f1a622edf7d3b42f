//! Messages under construction
//!
//! A [`Message`] collects text, components, fields and location until its
//! owner is dropped (or consumed by [`Message::send`]); that is the one
//! point where it gets delivered. Clones are aliases that share the same
//! state but never send it.
//!
//! Whether a message is worth building is decided once, when it is created:
//! if no appender accepts its severity, every later call on it is a no-op
//! and nothing gets formatted.
//!
//! ```
//! use snaplogger::prelude::*;
//! use std::fmt::Write;
//!
//! let logger = Logger::new();
//! let buffer = BufferAppender::new();
//! let lines = buffer.buffer();
//! logger.add_appender(
//!     AppenderHandle::new(buffer).with_format(Format::shared("${severity}: ${message}").unwrap()),
//! );
//!
//! {
//!     let mut msg = logger.message(SeverityLevel::ERROR);
//!     write!(msg, "disk {} is full", "/dev/sda1").unwrap();
//! } // sent here
//!
//! assert_eq!(lines.lines(), vec!["error: disk /dev/sda1 is full"]);
//! ```

use super::component::Component;
use super::error::Result;
use super::log_entry::LogEntry;
use super::logger::Logger;
use super::severity::SeverityLevel;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::sync::Arc;

#[derive(Debug)]
struct MessageState {
    severity: SeverityLevel,
    text: String,
    file: Option<String>,
    function: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
    components: Vec<Arc<Component>>,
    fields: BTreeMap<String, String>,
    sent: bool,
}

struct Shared {
    state: Mutex<MessageState>,
    logger: Logger,
}

pub struct Message {
    /// `None` when the message was ignored at creation
    shared: Option<Arc<Shared>>,
    owner: bool,
    initial_severity: SeverityLevel,
}

impl Message {
    /// Start a message for `logger`, applying its severity gate
    pub fn new(logger: &Logger, severity: SeverityLevel) -> Self {
        if !logger.is_enabled(severity) {
            logger.metrics().record_ignored();
            return Self {
                shared: None,
                owner: true,
                initial_severity: severity,
            };
        }

        Self {
            shared: Some(Arc::new(Shared {
                state: Mutex::new(MessageState {
                    severity,
                    text: String::new(),
                    file: None,
                    function: None,
                    line: None,
                    column: None,
                    components: Vec::new(),
                    fields: BTreeMap::new(),
                    sent: false,
                }),
                logger: logger.clone(),
            })),
            owner: true,
            initial_severity: severity,
        }
    }

    /// State of a message that is neither ignored nor sent
    fn active(&self) -> Option<MutexGuard<'_, MessageState>> {
        let shared = self.shared.as_ref()?;
        let state = shared.state.lock();
        if state.sent {
            None
        } else {
            Some(state)
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.shared.is_none()
    }

    /// Still accepting changes: not ignored and not sent yet
    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn append<T: fmt::Display>(&self, value: T) -> &Self {
        if let Some(mut state) = self.active() {
            let _ = write!(state.text, "{}", value);
        }
        self
    }

    /// Append pre-formatted arguments, as produced by `format_args!`
    pub fn append_fmt(&self, args: fmt::Arguments<'_>) -> &Self {
        if let Some(mut state) = self.active() {
            let _ = state.text.write_fmt(args);
        }
        self
    }

    pub fn text(&self) -> String {
        self.active().map(|s| s.text.clone()).unwrap_or_default()
    }

    pub fn severity(&self) -> SeverityLevel {
        self.active()
            .map(|s| s.severity)
            .unwrap_or(self.initial_severity)
    }

    /// Change the severity; the creation gate is not evaluated again
    pub fn set_severity(&self, severity: SeverityLevel) -> &Self {
        if let Some(mut state) = self.active() {
            state.severity = severity;
        }
        self
    }

    /// Tag the message with a component
    pub fn section(&self, component: &Arc<Component>) -> &Self {
        if let Some(mut state) = self.active() {
            if !state.components.iter().any(|c| Arc::ptr_eq(c, component)) {
                state.components.push(Arc::clone(component));
            }
        }
        self
    }

    /// Tag the message with a component looked up by name
    pub fn add_component(&self, name: &str) -> Result<&Self> {
        if let Some(shared) = &self.shared {
            let component = shared.logger.get_component(name)?;
            self.section(&component);
        }
        Ok(self)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.active()
            .map(|s| s.components.iter().any(|c| c.name() == name))
            .unwrap_or(false)
    }

    pub fn add_field(&self, key: impl Into<String>, value: impl ToString) -> &Self {
        if let Some(mut state) = self.active() {
            state.fields.insert(key.into(), value.to_string());
        }
        self
    }

    pub fn set_filename(&self, file: impl Into<String>) -> &Self {
        if let Some(mut state) = self.active() {
            state.file = Some(file.into());
        }
        self
    }

    pub fn set_function(&self, function: impl Into<String>) -> &Self {
        if let Some(mut state) = self.active() {
            state.function = Some(function.into());
        }
        self
    }

    pub fn set_line(&self, line: u32) -> &Self {
        if let Some(mut state) = self.active() {
            state.line = Some(line);
        }
        self
    }

    pub fn set_column(&self, column: u32) -> &Self {
        if let Some(mut state) = self.active() {
            state.column = Some(column);
        }
        self
    }

    /// Set the whole call site at once; used by the logging macros
    #[must_use]
    pub fn with_location(self, file: &str, function: &str, line: u32, column: u32) -> Self {
        if let Some(mut state) = self.active() {
            state.file = Some(file.to_string());
            state.function = Some(function.to_string());
            state.line = Some(line);
            state.column = Some(column);
        }
        self
    }

    /// Deliver the message now, reporting rendering and sink errors
    ///
    /// Calling this on an alias does nothing: only the owner sends.
    pub fn send(mut self) -> Result<()> {
        match self.take_for_sending() {
            Some(shared) => Self::deliver(&shared),
            None => Ok(()),
        }
    }

    fn take_for_sending(&mut self) -> Option<Arc<Shared>> {
        if self.owner {
            self.shared.take()
        } else {
            None
        }
    }

    fn deliver(shared: &Shared) -> Result<()> {
        let entry = {
            let mut state = shared.state.lock();
            if state.sent {
                return Ok(());
            }
            state.sent = true;

            let mut entry = LogEntry::new(state.severity, &state.text);
            entry.file = state.file.take();
            entry.function = state.function.take();
            entry.line = state.line;
            entry.column = state.column;
            entry.components = std::mem::take(&mut state.components);
            entry.fields = std::mem::take(&mut state.fields);
            state.text.clear();
            entry
        };
        shared.logger.deliver(entry)
    }
}

impl Clone for Message {
    /// A non-owning alias of the same message
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            owner: false,
            initial_severity: self.initial_severity,
        }
    }
}

impl Write for Message {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s);
        Ok(())
    }
}

impl Drop for Message {
    fn drop(&mut self) {
        if let Some(shared) = self.take_for_sending() {
            // failures were already reported on stderr and counted
            let _ = Self::deliver(&shared);
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("owner", &self.owner)
            .field("ignored", &self.is_ignored())
            .field("severity", &self.severity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::{BufferAppender, SharedBuffer};
    use crate::core::appender::AppenderHandle;
    use crate::core::format::Format;

    fn logger(threshold: SeverityLevel) -> (Logger, SharedBuffer) {
        let logger = Logger::new();
        let appender = BufferAppender::new();
        let buffer = appender.buffer();
        logger.add_appender(
            AppenderHandle::new(appender)
                .with_severity(threshold)
                .with_format(Format::shared("${severity}:${message}").unwrap()),
        );
        (logger, buffer)
    }

    #[test]
    fn test_owner_drop_sends_once() {
        let (logger, buffer) = logger(SeverityLevel::INFORMATION);
        {
            let msg = logger.message(SeverityLevel::WARNING);
            msg.append("hello ").append(42);
        }
        assert_eq!(buffer.lines(), vec!["warning:hello 42"]);
    }

    #[test]
    fn test_alias_does_not_send() {
        let (logger, buffer) = logger(SeverityLevel::INFORMATION);
        let msg = logger.message(SeverityLevel::ERROR);
        {
            let alias = msg.clone();
            alias.append("from alias");
            assert!(!alias.is_owner());
        }
        assert!(buffer.lines().is_empty());
        assert_eq!(msg.text(), "from alias");
        drop(msg);
        assert_eq!(buffer.lines(), vec!["error:from alias"]);
    }

    #[test]
    fn test_alias_after_owner_sent_is_inert() {
        let (logger, buffer) = logger(SeverityLevel::INFORMATION);
        let msg = logger.message(SeverityLevel::ERROR);
        let alias = msg.clone();
        msg.append("first");
        msg.send().unwrap();
        alias.append(" late");
        assert!(!alias.is_active());
        drop(alias);
        assert_eq!(buffer.lines(), vec!["error:first"]);
    }

    #[test]
    fn test_ignored_message_is_inert() {
        let (logger, buffer) = logger(SeverityLevel::WARNING);
        let mut msg = logger.message(SeverityLevel::DEBUG);
        assert!(msg.is_ignored());
        msg.append("dropped");
        write!(msg, "{}", 1).unwrap();
        msg.set_severity(SeverityLevel::FATAL);
        assert_eq!(msg.text(), "");
        assert_eq!(msg.severity(), SeverityLevel::DEBUG);
        drop(msg);
        assert!(buffer.lines().is_empty());
        assert_eq!(logger.metrics().ignored_count(), 1);
    }

    #[test]
    fn test_off_is_always_ignored() {
        let (logger, _buffer) = logger(SeverityLevel::ALL);
        assert!(logger.message(SeverityLevel::OFF).is_ignored());
    }

    #[test]
    fn test_severity_raised_after_creation() {
        let (logger, buffer) = logger(SeverityLevel::INFORMATION);
        let msg = logger.message(SeverityLevel::INFORMATION);
        msg.set_severity(SeverityLevel::ERROR).append("raised");
        drop(msg);
        assert_eq!(buffer.lines(), vec!["error:raised"]);
    }

    #[test]
    fn test_components_and_fields() {
        let (logger, buffer) = logger(SeverityLevel::INFORMATION);
        let appender = logger.appenders()[0].clone();
        appender.set_format(Format::shared("${components} ${field:name=id} ${message}").unwrap());

        let secure = logger.get_component("secure").unwrap();
        let msg = logger.message(SeverityLevel::ERROR);
        msg.section(&secure).section(&secure).add_field("id", 7).append("x");
        msg.add_component("audit").unwrap();
        assert!(msg.add_component("9bad").is_err());
        assert!(msg.has_component("audit"));
        drop(msg);

        assert_eq!(buffer.lines(), vec!["secure,audit 7 x"]);
    }

    #[test]
    fn test_send_reports_render_error() {
        let (logger, _buffer) = logger(SeverityLevel::INFORMATION);
        logger.appenders()[0].set_format(Format::shared("${message:align=9}").unwrap());
        let msg = logger.message(SeverityLevel::ERROR);
        msg.append("x");
        assert!(msg.send().is_err());
        assert_eq!(logger.metrics().dropped_count(), 1);
    }

    #[test]
    fn test_drop_survives_render_error() {
        let (logger, buffer) = logger(SeverityLevel::INFORMATION);
        let appender = logger.appenders()[0].clone();
        appender.set_format(Format::shared("${message:min_width=abc}").unwrap());
        {
            let msg = logger.message(SeverityLevel::ERROR);
            msg.append("lost");
        }
        assert!(buffer.is_empty());
        assert_eq!(logger.metrics().dropped_count(), 1);

        appender.set_format(Format::shared("${message}").unwrap());
        logger.message(SeverityLevel::ERROR).append("kept");
        assert_eq!(buffer.lines(), vec!["kept"]);
    }
}
