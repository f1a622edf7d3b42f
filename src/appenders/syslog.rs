//! Syslog appender writing RFC 3164 records to the local `/dev/log` socket

use crate::core::{Appender, LogEntry, LoggerError, Result, SeverityLevel};
use fasyslog::format::SyslogContext;
use fasyslog::sender::SyslogSender;
use fasyslog::Facility;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_SYSLOG_SOCKET: &str = "/dev/log";

/// Syslog severity of a snaplogger severity level
pub fn syslog_severity(severity: SeverityLevel) -> fasyslog::Severity {
    match severity.value() {
        v if v >= SeverityLevel::EMERGENCY.value() => fasyslog::Severity::EMERGENCY,
        v if v >= SeverityLevel::ALERT.value() => fasyslog::Severity::ALERT,
        v if v >= SeverityLevel::CRITICAL.value() => fasyslog::Severity::CRITICAL,
        v if v >= SeverityLevel::ERROR.value() => fasyslog::Severity::ERROR,
        v if v >= SeverityLevel::WARNING.value() => fasyslog::Severity::WARNING,
        v if v >= SeverityLevel::IMPORTANT.value() => fasyslog::Severity::NOTICE,
        v if v >= SeverityLevel::INFORMATION.value() => fasyslog::Severity::INFORMATIONAL,
        _ => fasyslog::Severity::DEBUG,
    }
}

fn parse_facility(name: &str) -> Option<Facility> {
    let facility = match name {
        "kern" => Facility::KERN,
        "user" => Facility::USER,
        "mail" => Facility::MAIL,
        "daemon" => Facility::DAEMON,
        "auth" => Facility::AUTH,
        "syslog" => Facility::SYSLOG,
        "cron" => Facility::CRON,
        "authpriv" => Facility::AUTHPRIV,
        "local0" => Facility::LOCAL0,
        "local1" => Facility::LOCAL1,
        "local2" => Facility::LOCAL2,
        "local3" => Facility::LOCAL3,
        "local4" => Facility::LOCAL4,
        "local5" => Facility::LOCAL5,
        "local6" => Facility::LOCAL6,
        "local7" => Facility::LOCAL7,
        _ => return None,
    };
    Some(facility)
}

pub struct SyslogAppender {
    socket_path: PathBuf,
    context: SyslogContext,
    tagged: bool,
    sender: Option<SyslogSender>,
}

impl SyslogAppender {
    pub fn new() -> Self {
        let mut context = SyslogContext::default();
        context.facility(Facility::USER);
        Self {
            socket_path: PathBuf::from(DEFAULT_SYSLOG_SOCKET),
            context,
            tagged: false,
            sender: None,
        }
    }

    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Build from the appender's own configuration keys (`facility`, `socket`)
    pub fn from_options(name: &str, options: &HashMap<String, String>) -> Result<Self> {
        let mut appender = Self::new();
        if let Some(facility) = options.get("facility") {
            let facility = parse_facility(facility).ok_or_else(|| {
                LoggerError::config(
                    format!("{}::facility", name),
                    format!("unknown syslog facility \"{}\".", facility),
                )
            })?;
            appender.context.facility(facility);
        }
        if let Some(socket) = options.get("socket") {
            appender.socket_path = PathBuf::from(socket);
        }
        Ok(appender)
    }

    /// The RFC 3164 record for `text`, without the trailing newline.
    ///
    /// The tag is the program name of the first entry seen.
    pub fn datagram(&mut self, text: &str, entry: &LogEntry) -> String {
        if !self.tagged {
            let tag = if entry.program_name.is_empty() {
                env!("CARGO_PKG_NAME")
            } else {
                entry.program_name.as_str()
            };
            self.context.appname(tag.to_string());
            self.tagged = true;
        }
        let body = text.strip_suffix('\n').unwrap_or(text);
        format!(
            "{}",
            self.context
                .format_rfc3164(syslog_severity(entry.severity), Some(body))
        )
    }

    fn connect(&mut self) -> Result<&mut SyslogSender> {
        if self.sender.is_none() {
            let sender = fasyslog::sender::unix(&self.socket_path).map_err(|e| {
                LoggerError::io_operation(
                    "connecting",
                    format!("cannot reach syslog at {}", self.socket_path.display()),
                    e,
                )
            })?;
            self.sender = Some(sender);
        }
        self.sender
            .as_mut()
            .ok_or_else(|| LoggerError::writer("syslog socket not connected"))
    }
}

impl Default for SyslogAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for SyslogAppender {
    fn append(&mut self, text: &str, entry: &LogEntry) -> Result<()> {
        let datagram = self.datagram(text, entry);
        let result = self.connect()?.send_formatted(datagram.as_bytes());
        if let Err(e) = result {
            // reconnect on the next message
            self.sender = None;
            return Err(LoggerError::io_operation("writing", "syslog send failed", e));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.sender.as_mut() {
            Some(sender) => sender
                .flush()
                .map_err(|e| LoggerError::io_operation("flushing", "syslog flush failed", e)),
            None => Ok(()),
        }
    }

    fn reopen(&mut self) -> Result<()> {
        self.sender = None;
        self.connect().map(|_| ())
    }

    fn appender_type(&self) -> &str {
        "syslog"
    }
}
