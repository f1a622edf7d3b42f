//! Property-based tests for snaplogger using proptest

use proptest::prelude::*;
use snaplogger::prelude::*;

fn level(value: u8) -> SeverityLevel {
    SeverityLevel::new(i32::from(value)).unwrap()
}

// ============================================================================
// SeverityLevel Tests
// ============================================================================

proptest! {
    /// Ordering follows the ordinal for every level except OFF
    #[test]
    fn test_severity_ordering(a in 0u8..255, b in 0u8..255) {
        let (la, lb) = (level(a), level(b));
        prop_assert_eq!(la <= lb, a <= b);
        prop_assert_eq!(la < lb, a < b);
        prop_assert_eq!(la >= lb, a >= b);
        prop_assert_eq!(la == lb, a == b);
    }

    /// OFF is never above or below anything else
    #[test]
    fn test_off_is_unordered(a in 0u8..255) {
        let other = level(a);
        prop_assert!(!(SeverityLevel::OFF >= other));
        prop_assert!(!(SeverityLevel::OFF <= other));
        prop_assert!(!(other >= SeverityLevel::OFF));
        prop_assert!(!(other <= SeverityLevel::OFF));
        prop_assert!(!other.passes(SeverityLevel::OFF));
        prop_assert!(!SeverityLevel::OFF.passes(other));
    }

    /// Out of range ordinals are rejected
    #[test]
    fn test_severity_range(value in any::<i32>()) {
        prop_assert_eq!(SeverityLevel::new(value).is_ok(), (0..=255).contains(&value));
    }
}

// ============================================================================
// Dispatch Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A message of severity j reaches an appender of threshold i iff
    /// j >= i and neither is OFF
    #[test]
    fn test_message_reaches_appender(i in any::<u8>(), j in any::<u8>()) {
        let logger = Logger::new();
        let buffer = BufferAppender::new();
        let output = buffer.buffer();
        logger.add_appender(
            AppenderHandle::new(buffer)
                .with_severity(level(i))
                .with_format(Format::shared("${message}").unwrap()),
        );

        logger.message(level(j)).append("reached");

        let expected = j >= i && i != 255 && j != 255;
        prop_assert_eq!(!output.is_empty(), expected);
    }

    /// reduce/increase keep the lowest/highest threshold seen
    #[test]
    fn test_reduce_and_increase(start in 0u8..255, other in 0u8..255) {
        let appender = AppenderHandle::new(BufferAppender::new()).with_severity(level(start));
        appender.reduce_severity(level(other));
        prop_assert_eq!(appender.get_severity().value(), start.min(other));

        let appender = AppenderHandle::new(BufferAppender::new()).with_severity(level(start));
        appender.increase_severity(level(other));
        prop_assert_eq!(appender.get_severity().value(), start.max(other));
    }
}

// ============================================================================
// Component Tests
// ============================================================================

proptest! {
    /// Names made of the allowed characters and not starting with a digit are valid
    #[test]
    fn test_valid_component_names(name in "[a-zA-Z_-][a-zA-Z0-9_-]{0,20}") {
        let logger = Logger::new();
        let first = logger.get_component(&name).unwrap();
        let second = logger.get_component(&name).unwrap();
        prop_assert!(std::sync::Arc::ptr_eq(&first, &second));
        prop_assert_eq!(first.name(), name.as_str());
    }

    #[test]
    fn test_leading_digit_rejected(name in "[0-9][a-zA-Z0-9]{0,10}") {
        let logger = Logger::new();
        let err = logger.get_component(&name).unwrap_err().to_string();
        prop_assert!(err.contains("starts with a digit"), "{}", err);
    }
}

// ============================================================================
// Template Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Text without `$` is copied as is, with one trailing newline
    #[test]
    fn test_literal_template(text in "[a-zA-Z0-9 ,.:;!?-]{0,40}") {
        let format = Format::new(text.as_str()).unwrap();
        let entry = LogEntry::new(SeverityLevel::ERROR, "ignored");
        prop_assert_eq!(format.render(&entry).unwrap(), format!("{}\n", text));
    }

    /// Message bodies never get a second trailing newline
    #[test]
    fn test_message_newline(text in "[a-z ]{0,20}", newline in any::<bool>()) {
        let format = Format::new("${message}").unwrap();
        let body = if newline { format!("{}\n", text) } else { text.clone() };
        let entry = LogEntry::new(SeverityLevel::ERROR, &body);
        prop_assert_eq!(format.render(&entry).unwrap(), format!("{}\n", text));
    }

    /// min_width pads to at least the requested width, never truncating
    #[test]
    fn test_min_width(text in "[a-z]{0,20}", width in 0usize..30) {
        let format = Format::new(format!("${{message:min_width={}}}", width)).unwrap();
        let entry = LogEntry::new(SeverityLevel::ERROR, &text);
        let rendered = format.render(&entry).unwrap();
        let body = rendered.strip_suffix('\n').unwrap();
        prop_assert_eq!(body.chars().count(), text.len().max(width));
        prop_assert!(body.starts_with(text.as_str()));
    }
}
