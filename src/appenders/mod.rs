//! Appender implementations

pub mod buffer;
pub mod console;
pub mod file;
#[cfg(unix)]
pub mod syslog;

pub use buffer::{BufferAppender, SharedBuffer};
pub use console::ConsoleAppender;
pub use file::FileAppender;
#[cfg(unix)]
pub use syslog::SyslogAppender;

pub use crate::core::Appender;

use crate::core::{AppenderFactory, Result};
use std::collections::HashMap;
use std::sync::Arc;

fn console_factory(_name: &str, options: &HashMap<String, String>) -> Result<Box<dyn Appender>> {
    Ok(Box::new(ConsoleAppender::from_options(options)?))
}

fn file_factory(name: &str, options: &HashMap<String, String>) -> Result<Box<dyn Appender>> {
    Ok(Box::new(FileAppender::from_options(name, options)?))
}

fn buffer_factory(_name: &str, _options: &HashMap<String, String>) -> Result<Box<dyn Appender>> {
    Ok(Box::new(BufferAppender::new()))
}

#[cfg(unix)]
fn syslog_factory(name: &str, options: &HashMap<String, String>) -> Result<Box<dyn Appender>> {
    Ok(Box::new(SyslogAppender::from_options(name, options)?))
}

/// Appender types every logger can create from configuration
pub(crate) fn builtin_factories() -> HashMap<String, AppenderFactory> {
    let mut factories: HashMap<String, AppenderFactory> = HashMap::new();
    factories.insert("console".to_string(), Arc::new(console_factory));
    factories.insert("file".to_string(), Arc::new(file_factory));
    factories.insert("buffer".to_string(), Arc::new(buffer_factory));
    #[cfg(unix)]
    factories.insert("syslog".to_string(), Arc::new(syslog_factory));
    factories
}
