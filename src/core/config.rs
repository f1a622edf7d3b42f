//! Configuration ingestion
//!
//! The logger is configured from a flat key/value map, the shape produced by
//! command line or `.conf` style option loaders. Appender settings use
//! `<appender name>::<key>`:
//!
//! ```text
//! appenders=console,journal
//! program_name=server
//! asynchronous=true
//! console::severity=debug
//! journal::type=file
//! journal::filename=/var/log/server.log
//! journal::components=secure,normal
//! journal::format=${date} ${severity}: ${message}
//! components::ignore=debug
//! ```
//!
//! [`options_from_toml`] turns a TOML document into such a map, and the
//! `[severity.<name>]` tables of `conf/severity.toml` describe severities.

use super::appender::AppenderHandle;
use super::error::{LoggerError, Result};
use super::format::Format;
use super::logger::Logger;
use super::severity::{Severity, SeverityLevel, SeverityRegistry};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

pub const KEY_APPENDERS: &str = "appenders";
pub const KEY_ASYNCHRONOUS: &str = "asynchronous";
pub const KEY_PROGRAM_NAME: &str = "program_name";
pub const KEY_COMPONENTS_INCLUDE: &str = "components::include";
pub const KEY_COMPONENTS_IGNORE: &str = "components::ignore";

/// Keys understood by every appender; any other `<name>::` key is passed
/// to the appender factory
const HANDLE_KEYS: [&str; 6] = [
    "type",
    "severity",
    "components",
    "format",
    "enabled",
    "bytes_per_minute",
];

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(LoggerError::config(
            key,
            format!("\"{}\" is not a valid boolean.", value),
        )),
    }
}

/// Options of one appender with the `<name>::` prefix removed
fn appender_options(name: &str, options: &HashMap<String, String>) -> HashMap<String, String> {
    let prefix = format!("{}::", name);
    options
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(&prefix)
                .map(|key| (key.to_string(), value.clone()))
        })
        .collect()
}

fn build_appender(
    logger: &Logger,
    name: &str,
    options: &HashMap<String, String>,
) -> Result<AppenderHandle> {
    let own = appender_options(name, options);
    let appender_type = own.get("type").map(String::as_str).unwrap_or(name);

    let factory_options: HashMap<String, String> = own
        .iter()
        .filter(|(key, _)| !HANDLE_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let handle = logger.create_appender(appender_type, name, &factory_options)?;

    if let Some(severity) = own.get("severity") {
        let level = logger
            .severities()
            .parse(severity)
            .map_err(|e| LoggerError::config(format!("{}::severity", name), e.to_string()))?;
        handle.set_severity(level);
    }
    if let Some(components) = own.get("components") {
        for component in split_list(components) {
            let component = logger.get_component(component)?;
            handle.add_component(component.name());
        }
    }
    if let Some(format) = own.get("format") {
        handle.set_format(Format::shared(format.as_str())?);
    }
    if let Some(enabled) = own.get("enabled") {
        handle.set_enabled(parse_bool(&format!("{}::enabled", name), enabled)?);
    }
    if let Some(bytes) = own.get("bytes_per_minute") {
        let bytes = bytes.trim().parse::<u64>().map_err(|_| {
            LoggerError::config(
                format!("{}::bytes_per_minute", name),
                format!("\"{}\" is not a valid number of bytes.", bytes),
            )
        })?;
        handle.set_bytes_per_minute(bytes);
    }

    Ok(handle)
}

/// Validate everything first, then apply; a bad option leaves the logger as is
pub(crate) fn apply_configuration(logger: &Logger, options: &HashMap<String, String>) -> Result<()> {
    let mut appenders = Vec::new();
    if let Some(names) = options.get(KEY_APPENDERS) {
        for name in split_list(names) {
            appenders.push(build_appender(logger, name, options)?);
        }
    }

    let asynchronous = options
        .get(KEY_ASYNCHRONOUS)
        .map(|value| parse_bool(KEY_ASYNCHRONOUS, value))
        .transpose()?;

    let mut include = Vec::new();
    if let Some(names) = options.get(KEY_COMPONENTS_INCLUDE) {
        for name in split_list(names) {
            include.push(logger.get_component(name)?);
        }
    }
    let mut ignore = Vec::new();
    if let Some(names) = options.get(KEY_COMPONENTS_IGNORE) {
        for name in split_list(names) {
            ignore.push(logger.get_component(name)?);
        }
    }

    if let Some(name) = options.get(KEY_PROGRAM_NAME) {
        logger.set_program_name(name.trim());
    }
    for component in include {
        logger.add_component_to_include(component.name())?;
    }
    for component in ignore {
        logger.add_component_to_ignore(component.name())?;
    }
    for appender in appenders {
        logger.add_appender(appender);
    }
    if let Some(asynchronous) = asynchronous {
        logger.set_asynchronous(asynchronous)?;
    }

    Ok(())
}

/// Flatten a TOML document into `table::key` options
///
/// Arrays become comma separated lists.
pub fn options_from_toml(text: &str) -> Result<HashMap<String, String>> {
    let table: toml::Table = toml::from_str(text)
        .map_err(|e| LoggerError::config("toml", e.to_string()))?;
    let mut options = HashMap::new();
    flatten(&mut options, "", &table)?;
    Ok(options)
}

fn flatten(options: &mut HashMap<String, String>, prefix: &str, table: &toml::Table) -> Result<()> {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}::{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten(options, &key, inner)?,
            toml::Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| scalar(&key, item))
                    .collect::<Result<Vec<_>>>()?;
                options.insert(key, items.join(","));
            }
            scalar_value => {
                let text = scalar(&key, scalar_value)?;
                options.insert(key, text);
            }
        }
    }
    Ok(())
}

fn scalar(key: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        _ => Err(LoggerError::config(
            key,
            "nested arrays and tables inside arrays are not supported.",
        )),
    }
}

/// One `[severity.<name>]` table
#[derive(Debug, Clone, Deserialize)]
pub struct SeverityDefinition {
    pub level: i32,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub styles: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeverityConfig {
    #[serde(default)]
    pub severity: BTreeMap<String, SeverityDefinition>,
}

impl SeverityConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LoggerError::config("severity", e.to_string()))
    }

    /// Register the severities the registry does not know yet
    ///
    /// Entries already registered under the same name and level are
    /// skipped; conflicting ones fail with a duplicate error.
    pub fn register(&self, registry: &SeverityRegistry) -> Result<usize> {
        let mut added = 0;
        for (name, definition) in &self.severity {
            if let Some(existing) = registry.lookup_name(name) {
                if i32::from(existing.level().value()) == definition.level {
                    continue;
                }
            }
            let mut severity = Severity::new(definition.level, name.as_str())?;
            if let Some(description) = &definition.description {
                severity = severity.with_description(description.as_str());
            }
            if let Some(styles) = &definition.styles {
                severity = severity.with_styles(styles.as_str());
            }
            let severity = registry.register(severity)?;
            for alias in &definition.aliases {
                registry.add_alias(&severity, alias)?;
            }
            added += 1;
        }
        Ok(added)
    }
}

/// Check a severity configuration against the system severities
///
/// Every system severity must be listed with the same level, and every
/// alias listed for it must be one of its names.
pub fn verify_severity_config(registry: &SeverityRegistry, text: &str) -> Result<()> {
    let config = SeverityConfig::parse(text)?;

    for severity in registry.all().iter().filter(|s| s.is_system()) {
        let name = severity.name();
        let definition = config.severity.get(&name).ok_or_else(|| {
            LoggerError::config("severity", format!("system severity \"{}\" is missing.", name))
        })?;
        if SeverityLevel::new(definition.level)? != severity.level() {
            return Err(LoggerError::config(
                "severity",
                format!(
                    "severity \"{}\" has level {} instead of {}.",
                    name,
                    definition.level,
                    severity.level()
                ),
            ));
        }
        let names = severity.get_all_names();
        for alias in &definition.aliases {
            if !names.iter().any(|n| n == alias) {
                return Err(LoggerError::config(
                    "severity",
                    format!("severity \"{}\" has no alias \"{}\".", name, alias),
                ));
            }
        }
    }

    Ok(())
}
