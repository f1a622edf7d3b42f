//! Console appender implementation

use crate::core::config::parse_bool;
use crate::core::{Appender, LogEntry, Result, SeverityLevel};
use colored::{Color, Colorize};
use std::collections::HashMap;
use std::io::Write;

/// Writes to stdout, or stderr from `error` up
///
/// Only one console appender can be registered with a logger.
pub struct ConsoleAppender {
    use_colors: bool,
    stderr_from: SeverityLevel,
}

/// Color of a severity band
pub fn color_code(severity: SeverityLevel) -> Color {
    match severity.value() {
        v if v < SeverityLevel::DEBUG.value() => Color::BrightBlack,
        v if v < SeverityLevel::INFORMATION.value() => Color::Blue,
        v if v < SeverityLevel::WARNING.value() => Color::Green,
        v if v < SeverityLevel::ERROR.value() => Color::Yellow,
        v if v < SeverityLevel::CRITICAL.value() => Color::Red,
        _ => Color::BrightRed,
    }
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            stderr_from: SeverityLevel::ERROR,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Send messages of `severity` and above to stderr
    #[must_use]
    pub fn with_stderr_from(mut self, severity: SeverityLevel) -> Self {
        self.stderr_from = severity;
        self
    }

    /// Build from the appender's own configuration keys (`colors`)
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let use_colors = match options.get("colors") {
            Some(value) => parse_bool("console::colors", value)?,
            None => true,
        };
        Ok(Self::with_colors(use_colors))
    }

    fn decorate(&self, text: &str, severity: SeverityLevel) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        let body = text.strip_suffix('\n').unwrap_or(text);
        format!("{}\n", body.color(color_code(severity)))
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, text: &str, entry: &LogEntry) -> Result<()> {
        let output = self.decorate(text, entry.severity);

        if entry.severity.passes(self.stderr_from) {
            std::io::stderr().write_all(output.as_bytes())?;
        } else {
            std::io::stdout().write_all(output.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn appender_type(&self) -> &str {
        "console"
    }

    fn is_unique(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_bands() {
        assert_eq!(color_code(SeverityLevel::TRACE), Color::BrightBlack);
        assert_eq!(color_code(SeverityLevel::DEBUG), Color::Blue);
        assert_eq!(color_code(SeverityLevel::INFORMATION), Color::Green);
        assert_eq!(color_code(SeverityLevel::WARNING), Color::Yellow);
        assert_eq!(color_code(SeverityLevel::ERROR), Color::Red);
        assert_eq!(color_code(SeverityLevel::FATAL), Color::BrightRed);
    }

    #[test]
    fn test_plain_text_untouched() {
        let appender = ConsoleAppender::with_colors(false);
        assert_eq!(appender.decorate("x\n", SeverityLevel::ERROR), "x\n");
    }

    #[test]
    fn test_decorated_keeps_single_newline() {
        let appender = ConsoleAppender::new();
        let output = appender.decorate("x\n", SeverityLevel::ERROR);
        assert!(output.ends_with('\n'));
        assert!(!output.ends_with("\n\n"));
        assert!(output.contains('x'));
    }

    #[test]
    fn test_from_options() {
        let mut options = HashMap::new();
        options.insert("colors".to_string(), "no".to_string());
        let appender = ConsoleAppender::from_options(&options).unwrap();
        assert!(!appender.use_colors);

        options.insert("colors".to_string(), "purple".to_string());
        assert!(ConsoleAppender::from_options(&options).is_err());
    }

    #[test]
    fn test_console_is_unique() {
        let appender = ConsoleAppender::new();
        assert!(appender.is_unique());
        assert_eq!(appender.appender_type(), "console");
    }
}
