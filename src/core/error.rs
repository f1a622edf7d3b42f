//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A severity, alias, variable, function or factory name was registered twice
    #[error("{0}")]
    Duplicate(String),

    /// Severity ordinal outside of the supported range
    #[error("{0}")]
    InvalidSeverity(String),

    /// Malformed component name, template parameter or appender operation
    #[error("{0}")]
    InvalidParameter(String),

    /// Template references a variable nobody registered
    #[error("{0}")]
    InvalidVariable(String),

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file or option could not be understood
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Channel send error
    #[error("Failed to send log entry to async worker")]
    ChannelSendError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn duplicate<S: Into<String>>(msg: S) -> Self {
        LoggerError::Duplicate(msg.into())
    }

    pub fn invalid_severity<S: Into<String>>(msg: S) -> Self {
        LoggerError::InvalidSeverity(msg.into())
    }

    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        LoggerError::InvalidParameter(msg.into())
    }

    pub fn invalid_variable<S: Into<String>>(msg: S) -> Self {
        LoggerError::InvalidVariable(msg.into())
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
