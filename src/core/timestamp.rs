//! Timestamp formatting utilities
//!
//! Backs the `${date}`, `${time}` and `${timestamp}` template variables.
//! Named formats cover what log aggregation tools usually expect; any other
//! value is used as a strftime pattern.

use super::error::{LoggerError, Result};
use super::format::Value;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{Display, Write};

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use snaplogger::core::TimestampFormat;
///
/// let format = TimestampFormat::from_name("unix_millis");
/// assert_eq!(format, TimestampFormat::UnixMillis);
/// assert!(format.is_numeric());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Map a `${timestamp:format=...}` value to a format
    pub fn from_name(name: &str) -> Self {
        match name {
            "iso8601" => TimestampFormat::Iso8601,
            "iso8601_micros" => TimestampFormat::Iso8601Micros,
            "rfc3339" => TimestampFormat::Rfc3339,
            "unix" => TimestampFormat::Unix,
            "unix_millis" => TimestampFormat::UnixMillis,
            "unix_micros" => TimestampFormat::UnixMicros,
            other => TimestampFormat::Custom(other.to_string()),
        }
    }

    /// Format a `DateTime<Utc>` according to this format
    pub fn format(&self, datetime: &DateTime<Utc>) -> Result<String> {
        self.value(datetime).map(Value::into_text)
    }

    /// Like [`format`](Self::format), numeric formats giving a `Value::Integer`
    pub fn value(&self, datetime: &DateTime<Utc>) -> Result<Value> {
        Ok(match self {
            TimestampFormat::Iso8601 => {
                Value::Text(datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            }
            TimestampFormat::Iso8601Micros => {
                Value::Text(datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string())
            }
            TimestampFormat::Rfc3339 => Value::Text(datetime.to_rfc3339()),
            TimestampFormat::Unix => Value::Integer(datetime.timestamp()),
            TimestampFormat::UnixMillis => Value::Integer(datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => Value::Integer(datetime.timestamp_micros()),
            TimestampFormat::Custom(pattern) => Value::Text(strftime(datetime, pattern)?),
        })
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}

/// Format with a strftime pattern, reporting bad patterns instead of panicking
pub fn strftime<Tz>(datetime: &DateTime<Tz>, pattern: &str) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut result = String::new();
    write!(result, "{}", datetime.format(pattern)).map_err(|_| {
        LoggerError::invalid_parameter(format!(
            "\"{}\" is not a valid date/time format.",
            pattern
        ))
    })?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimestampFormat::Iso8601.format(&fixed_datetime()).unwrap();
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_iso8601_micros_format() {
        let result = TimestampFormat::Iso8601Micros
            .format(&fixed_datetime())
            .unwrap();
        assert_eq!(result, "2025-01-08T10:30:45.123456Z");
    }

    #[test]
    fn test_rfc3339_format() {
        let result = TimestampFormat::Rfc3339.format(&fixed_datetime()).unwrap();
        assert!(result.starts_with("2025-01-08T10:30:45"));
        assert!(result.contains("+00:00") || result.ends_with('Z'));
    }

    #[test]
    fn test_numeric_formats() {
        let dt = fixed_datetime();
        assert_eq!(
            TimestampFormat::Unix.value(&dt).unwrap(),
            Value::Integer(1736332245)
        );
        assert_eq!(
            TimestampFormat::UnixMillis.value(&dt).unwrap(),
            Value::Integer(1736332245123)
        );
        assert_eq!(
            TimestampFormat::UnixMicros.format(&dt).unwrap(),
            "1736332245123456"
        );
    }

    #[test]
    fn test_custom_apache_format() {
        let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S +0000".to_string());
        let result = format.format(&fixed_datetime()).unwrap();
        assert_eq!(result, "08/Jan/2025:10:30:45 +0000");
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let format = TimestampFormat::from_name("%Y-%Q");
        let err = format.format(&fixed_datetime()).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidParameter(_)));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(TimestampFormat::from_name("iso8601"), TimestampFormat::Iso8601);
        assert_eq!(TimestampFormat::from_name("rfc3339"), TimestampFormat::Rfc3339);
        assert_eq!(
            TimestampFormat::from_name("%H"),
            TimestampFormat::Custom("%H".to_string())
        );
        assert!(!TimestampFormat::Iso8601.is_numeric());
        assert!(TimestampFormat::Unix.is_numeric());
    }
}
