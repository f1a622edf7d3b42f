//! Core logger types and traits

pub mod appender;
pub mod component;
pub mod config;
pub mod diagnostic;
pub(crate) mod dispatch;
pub mod error;
pub mod format;
pub mod function;
pub mod log_entry;
pub mod logger;
pub mod message;
pub mod metrics;
pub mod severity;
pub mod timestamp;
pub mod variable;
pub(crate) mod worker;

pub use appender::{Appender, AppenderFactory, AppenderHandle, FormatGuard};
pub use component::{
    validate_component_name, Component, ComponentRegistry, COMPONENT_BANNER, COMPONENT_DEBUG,
    COMPONENT_NORMAL, COMPONENT_SECURE, COMPONENT_SELF,
};
pub use config::{options_from_toml, verify_severity_config, SeverityConfig, SeverityDefinition};
pub use diagnostic::{
    map_diagnostic, map_diagnostics, nested_diagnostics, push_nested_diagnostic,
    scoped_map_diagnostic, set_map_diagnostic, unset_map_diagnostic, DiagnosticSnapshot,
    MapDiagnosticGuard, NestedDiagnosticGuard,
};
pub use error::{LoggerError, Result};
pub use format::{Format, Param, ParamValue, Value, DEFAULT_FORMAT};
pub use function::{register_function, Align, Function, FunctionData};
pub use log_entry::LogEntry;
pub use logger::{Logger, LoggerBuilder};
pub use message::Message;
pub use metrics::LoggerMetrics;
pub use severity::{Severity, SeverityLevel, SeverityRegistry};
pub use timestamp::TimestampFormat;
pub use variable::{register_variable, Variable};
