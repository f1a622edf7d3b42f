//! Severity levels and the registry that names them
//!
//! A severity is an ordinal in `[SeverityLevel::MIN, SeverityLevel::MAX]` with a
//! canonical name and any number of aliases. The registry guarantees that an
//! ordinal and every name identify at most one severity.

use super::error::{LoggerError, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Ordinal of a severity
///
/// Ordering is the plain integer ordering with one exception: `OFF` is
/// unordered against every other level, so neither `OFF >= x` nor `OFF <= x`
/// ever holds for `x != OFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeverityLevel(u8);

impl SeverityLevel {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 255;

    pub const ALL: SeverityLevel = SeverityLevel(0);
    pub const TRACE: SeverityLevel = SeverityLevel(10);
    pub const NOISY: SeverityLevel = SeverityLevel(15);
    pub const DEBUG: SeverityLevel = SeverityLevel(20);
    pub const NOTICE: SeverityLevel = SeverityLevel(30);
    pub const UNINITIALIZED: SeverityLevel = SeverityLevel(32);
    pub const UNIMPORTANT: SeverityLevel = SeverityLevel(35);
    pub const VERBOSE: SeverityLevel = SeverityLevel(40);
    pub const CONFIGURATION: SeverityLevel = SeverityLevel(45);
    pub const CONFIGURATION_WARNING: SeverityLevel = SeverityLevel(47);
    pub const INFORMATION: SeverityLevel = SeverityLevel(50);
    pub const IMPORTANT: SeverityLevel = SeverityLevel(60);
    pub const MINOR: SeverityLevel = SeverityLevel(70);
    pub const TODO: SeverityLevel = SeverityLevel(80);
    pub const DEPRECATED: SeverityLevel = SeverityLevel(90);
    pub const WARNING: SeverityLevel = SeverityLevel(100);
    pub const MAJOR: SeverityLevel = SeverityLevel(150);
    pub const RECOVERABLE_ERROR: SeverityLevel = SeverityLevel(170);
    pub const ERROR: SeverityLevel = SeverityLevel(200);
    pub const NOISY_ERROR: SeverityLevel = SeverityLevel(210);
    pub const SEVERE: SeverityLevel = SeverityLevel(220);
    pub const EXCEPTION: SeverityLevel = SeverityLevel(230);
    pub const CRITICAL: SeverityLevel = SeverityLevel(240);
    pub const ALERT: SeverityLevel = SeverityLevel(241);
    pub const EMERGENCY: SeverityLevel = SeverityLevel(242);
    pub const FATAL: SeverityLevel = SeverityLevel(250);
    pub const OFF: SeverityLevel = SeverityLevel(255);

    pub const DEFAULT: SeverityLevel = SeverityLevel::INFORMATION;

    /// Create a level, rejecting ordinals outside `[MIN, MAX]`
    pub fn new(level: i32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&level) {
            return Err(LoggerError::invalid_severity(format!(
                "the severity level cannot be {}. The possible range is [{}..{}].",
                level,
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(SeverityLevel(level as u8))
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_off(self) -> bool {
        self.0 == Self::OFF.0
    }

    /// Whether a message at this level gets through a `threshold`
    #[inline]
    pub fn passes(self, threshold: SeverityLevel) -> bool {
        !self.is_off() && !threshold.is_off() && self.0 >= threshold.0
    }
}

impl PartialOrd for SeverityLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.0 == other.0 {
            return Some(Ordering::Equal);
        }
        if self.is_off() || other.is_off() {
            return None;
        }
        Some(self.0.cmp(&other.0))
    }
}

impl Default for SeverityLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for SeverityLevel {
    type Error = LoggerError;

    fn try_from(level: i32) -> Result<Self> {
        SeverityLevel::new(level)
    }
}

/// A named severity
///
/// Names are stored lowercase; the first one is canonical and the others are
/// aliases in the order they were added.
#[derive(Debug)]
pub struct Severity {
    level: SeverityLevel,
    names: RwLock<Vec<String>>,
    system: bool,
    description: String,
    styles: String,
}

impl Severity {
    /// Create a user defined severity
    pub fn new(level: i32, name: impl Into<String>) -> Result<Self> {
        let level = SeverityLevel::new(level)?;
        let name = normalize_name(&name.into())?;
        Ok(Self {
            level,
            description: name.clone(),
            names: RwLock::new(vec![name]),
            system: false,
            styles: String::new(),
        })
    }

    fn system(level: SeverityLevel, name: &str, description: &str, styles: &str) -> Self {
        Self {
            level,
            names: RwLock::new(vec![name.to_string()]),
            system: true,
            description: description.to_string(),
            styles: styles.to_string(),
        }
    }

    /// Set the human readable description (defaults to the name)
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the style hint used by styled sinks such as the console
    #[must_use]
    pub fn with_styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    pub fn level(&self) -> SeverityLevel {
        self.level
    }

    pub fn name(&self) -> String {
        self.names.read()[0].clone()
    }

    /// Canonical name followed by every alias, in registration order
    pub fn get_all_names(&self) -> Vec<String> {
        self.names.read().clone()
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn styles(&self) -> &str {
        &self.styles
    }

    fn owns(&self, name: &str) -> bool {
        self.names.read().iter().any(|n| n == name)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(LoggerError::invalid_parameter(
            "a severity name cannot be empty.",
        ));
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(LoggerError::invalid_parameter(format!(
            "a severity name cannot start with a digit (\"{}\").",
            name
        )));
    }
    Ok(name)
}

#[derive(Default)]
struct RegistryInner {
    by_name: HashMap<String, Arc<Severity>>,
    by_level: BTreeMap<u8, Arc<Severity>>,
}

/// Registry of all the severities known to a logger
pub struct SeverityRegistry {
    inner: RwLock<RegistryInner>,
}

impl SeverityRegistry {
    /// Create a registry holding the system severities
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut inner = registry.inner.write();
            for (level, name, aliases, description, styles) in SYSTEM_SEVERITIES {
                let severity = Arc::new(Severity::system(*level, name, description, styles));
                for alias in aliases.iter() {
                    severity.names.write().push(alias.to_string());
                    inner.by_name.insert(alias.to_string(), Arc::clone(&severity));
                }
                inner.by_name.insert(name.to_string(), Arc::clone(&severity));
                inner.by_level.insert(level.value(), severity);
            }
        }
        registry
    }

    /// Create a registry without any severity
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Register a severity
    ///
    /// Fails when its ordinal or any of its names is already taken, whether
    /// by a system or a user severity.
    pub fn register(&self, severity: Severity) -> Result<Arc<Severity>> {
        let mut inner = self.inner.write();

        if let Some(existing) = inner.by_level.get(&severity.level.value()) {
            return Err(LoggerError::duplicate(format!(
                "a severity with level {} (\"{}\") already exists.",
                severity.level,
                existing.name()
            )));
        }
        for name in severity.names.read().iter() {
            if inner.by_name.contains_key(name) {
                return Err(LoggerError::duplicate(format!(
                    "a severity named \"{}\" already exists.",
                    name
                )));
            }
        }

        let severity = Arc::new(severity);
        for name in severity.names.read().iter() {
            inner.by_name.insert(name.clone(), Arc::clone(&severity));
        }
        inner
            .by_level
            .insert(severity.level.value(), Arc::clone(&severity));
        Ok(severity)
    }

    /// Append an alias to a severity
    pub fn add_alias(&self, severity: &Severity, alias: &str) -> Result<()> {
        let alias = normalize_name(alias)?;
        let mut inner = self.inner.write();

        let registered = inner
            .by_level
            .get(&severity.level.value())
            .filter(|registered| std::ptr::eq(Arc::as_ptr(registered), severity))
            .cloned()
            .ok_or_else(|| {
                LoggerError::invalid_severity(format!(
                    "severity \"{}\" is not registered with this registry.",
                    severity.name()
                ))
            })?;

        if severity.owns(&alias) {
            return Err(LoggerError::duplicate(format!(
                "severity \"{}\" already has an alias \"{}\".",
                severity.name(),
                alias
            )));
        }
        if inner.by_name.contains_key(&alias) {
            return Err(LoggerError::duplicate(format!(
                "a severity named \"{}\" already exists.",
                alias
            )));
        }

        severity.names.write().push(alias.clone());
        inner.by_name.insert(alias, registered);
        Ok(())
    }

    pub fn lookup_name(&self, name: &str) -> Option<Arc<Severity>> {
        self.inner
            .read()
            .by_name
            .get(&name.trim().to_lowercase())
            .cloned()
    }

    pub fn lookup_level(&self, level: SeverityLevel) -> Option<Arc<Severity>> {
        self.inner.read().by_level.get(&level.value()).cloned()
    }

    /// Canonical name of a level, or a placeholder for unregistered ordinals
    pub fn name_of(&self, level: SeverityLevel) -> String {
        match self.lookup_level(level) {
            Some(severity) => severity.name(),
            None => format!("(unknown severity: {})", level),
        }
    }

    /// Parse a severity given by name or by ordinal
    pub fn parse(&self, value: &str) -> Result<SeverityLevel> {
        if let Some(severity) = self.lookup_name(value) {
            return Ok(severity.level());
        }
        match value.trim().parse::<i32>() {
            Ok(level) => SeverityLevel::new(level),
            Err(_) => Err(LoggerError::invalid_parameter(format!(
                "unknown severity \"{}\".",
                value
            ))),
        }
    }

    /// Every registered severity, ordered by level
    pub fn all(&self) -> Vec<Arc<Severity>> {
        self.inner.read().by_level.values().cloned().collect()
    }
}

impl Default for SeverityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static SYSTEM_REGISTRY: Lazy<SeverityRegistry> = Lazy::new(SeverityRegistry::new);

/// Name of a level according to the system severities only
pub fn system_name_of(level: SeverityLevel) -> String {
    SYSTEM_REGISTRY.name_of(level)
}

type SystemSeverity = (SeverityLevel, &'static str, &'static [&'static str], &'static str, &'static str);

const SYSTEM_SEVERITIES: &[SystemSeverity] = &[
    (SeverityLevel::ALL, "all", &[], "all", ""),
    (SeverityLevel::TRACE, "trace", &[], "trace", ""),
    (SeverityLevel::NOISY, "noisy", &[], "noisy", ""),
    (SeverityLevel::DEBUG, "debug", &[], "debug", "blue"),
    (SeverityLevel::NOTICE, "notice", &[], "notice", "green"),
    (SeverityLevel::UNINITIALIZED, "uninitialized", &[], "uninitialized", "red"),
    (SeverityLevel::UNIMPORTANT, "unimportant", &[], "unimportant", ""),
    (SeverityLevel::VERBOSE, "verbose", &[], "verbose", ""),
    (SeverityLevel::CONFIGURATION, "configuration", &[], "configuration", ""),
    (SeverityLevel::CONFIGURATION_WARNING, "configuration-warning", &[], "configuration warning", "yellow"),
    (SeverityLevel::INFORMATION, "information", &["info"], "info", "green"),
    (SeverityLevel::IMPORTANT, "important", &[], "important", "green"),
    (SeverityLevel::MINOR, "minor", &[], "minor", "green"),
    (SeverityLevel::TODO, "todo", &[], "incomplete task", "magenta"),
    (SeverityLevel::DEPRECATED, "deprecated", &[], "deprecated", "magenta"),
    (SeverityLevel::WARNING, "warning", &["warn"], "warning", "yellow"),
    (SeverityLevel::MAJOR, "major", &[], "major", "yellow"),
    (SeverityLevel::RECOVERABLE_ERROR, "recoverable-error", &[], "recoverable error", "red"),
    (SeverityLevel::ERROR, "error", &["err"], "error", "red"),
    (SeverityLevel::NOISY_ERROR, "noisy-error", &[], "noisy error", "red"),
    (SeverityLevel::SEVERE, "severe", &[], "severe error", "red"),
    (SeverityLevel::EXCEPTION, "exception", &[], "exception", "red"),
    (SeverityLevel::CRITICAL, "critical", &["crit"], "critical", "bright red"),
    (SeverityLevel::ALERT, "alert", &[], "alert", "bright red"),
    (SeverityLevel::EMERGENCY, "emergency", &["emerg"], "emergency", "bright red"),
    (SeverityLevel::FATAL, "fatal", &[], "fatal error", "bright red"),
    (SeverityLevel::OFF, "off", &[], "off", ""),
];
