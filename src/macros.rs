//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. They record the
//! call site (file, module, line and column) and check the logger's severity
//! gate before the arguments are formatted, so a disabled message costs no
//! formatting at all.
//!
//! # Examples
//!
//! ```
//! use snaplogger::prelude::*;
//! use snaplogger::{snap_log_debug, snap_log_error};
//!
//! let logger = Logger::new();
//! let buffer = BufferAppender::new();
//! let output = buffer.buffer();
//! logger.add_appender(
//!     AppenderHandle::new(buffer).with_format(Format::shared("${line}: ${message}").unwrap()),
//! );
//!
//! let port = 8080;
//! snap_log_error!(logger, "cannot listen on port {}", port);
//! snap_log_debug!(logger, "below the threshold, never formatted");
//!
//! assert_eq!(output.lines().len(), 1);
//! assert!(output.contents().ends_with(": cannot listen on port 8080\n"));
//! ```

/// Log a message at any severity.
///
/// # Examples
///
/// ```
/// # use snaplogger::prelude::*;
/// # let logger = Logger::new();
/// use snaplogger::snap_log;
/// snap_log!(logger, SeverityLevel::IMPORTANT, "Simple message");
/// snap_log!(logger, SeverityLevel::ERROR, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! snap_log {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {{
        let message = $crate::core::Message::new(&$logger, $severity);
        if !message.is_ignored() {
            message
                .with_location(file!(), module_path!(), line!(), column!())
                .append_fmt(format_args!($($arg)+));
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use snaplogger::prelude::*;
/// # let logger = Logger::new();
/// use snaplogger::snap_log_trace;
/// snap_log_trace!(logger, "Entering function: calculate()");
/// snap_log_trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! snap_log_trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::snap_log!($logger, $crate::core::SeverityLevel::TRACE, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! snap_log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::snap_log!($logger, $crate::core::SeverityLevel::DEBUG, $($arg)+)
    };
}

/// Log an information-level message.
///
/// # Examples
///
/// ```
/// # use snaplogger::prelude::*;
/// # let logger = Logger::new();
/// use snaplogger::snap_log_info;
/// snap_log_info!(logger, "Application started");
/// snap_log_info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! snap_log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::snap_log!($logger, $crate::core::SeverityLevel::INFORMATION, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! snap_log_warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::snap_log!($logger, $crate::core::SeverityLevel::WARNING, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! snap_log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::snap_log!($logger, $crate::core::SeverityLevel::ERROR, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! snap_log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::snap_log!($logger, $crate::core::SeverityLevel::FATAL, $($arg)+)
    };
}

/// Create a message handle tagged with the call site.
///
/// The handle is active or ignored depending on the logger's gate, and takes
/// chained text, components and fields. It is sent when dropped.
///
/// # Examples
///
/// ```
/// # use snaplogger::prelude::*;
/// # let logger = Logger::new();
/// use snaplogger::snap_message;
/// let network = logger.get_component("network").unwrap();
/// snap_message!(logger, SeverityLevel::ERROR)
///     .section(&network)
///     .add_field("peer", "10.0.0.7")
///     .append("connection reset");
/// ```
#[macro_export]
macro_rules! snap_message {
    ($logger:expr, $severity:expr) => {
        $crate::core::Message::new(&$logger, $severity)
            .with_location(file!(), module_path!(), line!(), column!())
    };
}

#[macro_export]
macro_rules! snap_message_trace {
    ($logger:expr) => {
        $crate::snap_message!($logger, $crate::core::SeverityLevel::TRACE)
    };
}

#[macro_export]
macro_rules! snap_message_debug {
    ($logger:expr) => {
        $crate::snap_message!($logger, $crate::core::SeverityLevel::DEBUG)
    };
}

#[macro_export]
macro_rules! snap_message_info {
    ($logger:expr) => {
        $crate::snap_message!($logger, $crate::core::SeverityLevel::INFORMATION)
    };
}

#[macro_export]
macro_rules! snap_message_warning {
    ($logger:expr) => {
        $crate::snap_message!($logger, $crate::core::SeverityLevel::WARNING)
    };
}

#[macro_export]
macro_rules! snap_message_error {
    ($logger:expr) => {
        $crate::snap_message!($logger, $crate::core::SeverityLevel::ERROR)
    };
}

#[macro_export]
macro_rules! snap_message_fatal {
    ($logger:expr) => {
        $crate::snap_message!($logger, $crate::core::SeverityLevel::FATAL)
    };
}
