//! # snaplogger
//!
//! A structured logging engine: messages carry a severity, a set of
//! components, fields and the location they were emitted from, and every
//! appender renders them through its own `${...}` template.
//!
//! ## Features
//!
//! - **Severities**: a registry of named levels with aliases, extensible from configuration
//! - **Components**: tags that route messages to the appenders interested in them
//! - **Templates**: `${variable:param=value}` formats with padding, alignment and case functions
//! - **Asynchronous delivery**: an optional worker thread that keeps message order
//!
//! ```
//! use snaplogger::prelude::*;
//!
//! let logger = Logger::new();
//! let buffer = BufferAppender::new();
//! let output = buffer.buffer();
//! logger.add_appender(
//!     AppenderHandle::new(buffer)
//!         .with_severity(SeverityLevel::WARNING)
//!         .with_format(Format::shared("${severity:upper}: ${message}").unwrap()),
//! );
//!
//! logger.info("not shown");
//! logger.error("shown");
//! assert_eq!(output.contents(), "ERROR: shown\n");
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{BufferAppender, ConsoleAppender, FileAppender, SharedBuffer};
    pub use crate::core::{
        Appender, AppenderHandle, Component, Format, LogEntry, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, Message, Result, Severity, SeverityLevel, Value,
    };
}

pub use self::appenders::{BufferAppender, ConsoleAppender, FileAppender, SharedBuffer};
#[cfg(unix)]
pub use self::appenders::SyslogAppender;
pub use self::core::{
    Appender, AppenderHandle, Component, ComponentRegistry, Format, LogEntry, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, Message, Result, Severity, SeverityLevel,
    SeverityRegistry, TimestampFormat, Value,
};
