//! Variables resolve the `${name}` part of a template expression
//!
//! Each variable reads one aspect of a [`LogEntry`] (or of the running
//! process) and may take parameters of its own, e.g.
//! `${severity:format=number}` or `${field:name=request_id}`. Parameters
//! that are not registered functions are left for the variable to read.

use super::diagnostic::{nested_diagnostics, map_diagnostics, render_map, render_nested};
use super::error::{LoggerError, Result};
use super::format::{find_param, Param, Value};
use super::log_entry::LogEntry;
use super::timestamp::{strftime, TimestampFormat};
use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

pub trait Variable: Send + Sync {
    fn resolve(&self, entry: &LogEntry, params: &[Param]) -> Result<Value>;
}

impl<F> Variable for F
where
    F: Fn(&LogEntry, &[Param]) -> Result<Value> + Send + Sync,
{
    fn resolve(&self, entry: &LogEntry, params: &[Param]) -> Result<Value> {
        self(entry, params)
    }
}

static VARIABLES: Lazy<RwLock<HashMap<String, Arc<dyn Variable>>>> =
    Lazy::new(|| RwLock::new(builtin_variables()));

static HOSTNAME: Lazy<String> = Lazy::new(|| {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
});

fn builtin_variables() -> HashMap<String, Arc<dyn Variable>> {
    let mut variables: HashMap<String, Arc<dyn Variable>> = HashMap::new();
    variables.insert("message".to_string(), Arc::new(message));
    variables.insert("severity".to_string(), Arc::new(severity));
    variables.insert("filename".to_string(), Arc::new(filename));
    variables.insert("basename".to_string(), Arc::new(basename));
    variables.insert("path".to_string(), Arc::new(path));
    variables.insert("function".to_string(), Arc::new(function));
    variables.insert("line".to_string(), Arc::new(line));
    variables.insert("column".to_string(), Arc::new(column));
    variables.insert("components".to_string(), Arc::new(components));
    variables.insert("hostname".to_string(), Arc::new(hostname));
    variables.insert("progname".to_string(), Arc::new(progname));
    variables.insert("pid".to_string(), Arc::new(pid));
    variables.insert("tid".to_string(), Arc::new(tid));
    variables.insert("thread_name".to_string(), Arc::new(thread_name));
    variables.insert("version".to_string(), Arc::new(version));
    variables.insert("diagnostic".to_string(), Arc::new(diagnostic));
    variables.insert("field".to_string(), Arc::new(field));
    variables.insert("fields".to_string(), Arc::new(fields));
    variables.insert("env".to_string(), Arc::new(env));
    variables.insert("date".to_string(), Arc::new(date));
    variables.insert("time".to_string(), Arc::new(time));
    variables.insert("timestamp".to_string(), Arc::new(timestamp));
    variables
}

/// Register a new variable type; each name can only be registered once
pub fn register_variable(name: &str, variable: impl Variable + 'static) -> Result<()> {
    let mut variables = VARIABLES.write();
    if variables.contains_key(name) {
        return Err(LoggerError::duplicate(format!(
            "trying to add two variable factories of type \"{}\".",
            name
        )));
    }
    variables.insert(name.to_string(), Arc::new(variable));
    Ok(())
}

pub fn get_variable(name: &str) -> Result<Arc<dyn Variable>> {
    VARIABLES.read().get(name).cloned().ok_or_else(|| {
        LoggerError::invalid_variable(format!("unknown variable type \"{}\"", name))
    })
}

pub fn hostname_value() -> &'static str {
    &HOSTNAME
}

/// Text value of a named parameter, if present
fn text_param<'a>(params: &'a [Param], name: &str) -> Option<&'a str> {
    find_param(params, name).and_then(Param::text)
}

fn message(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.message.as_str()))
}

fn severity(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    match text_param(params, "format") {
        None | Some("alpha") => Ok(Value::from(entry.severity_name.as_str())),
        Some("number") => Ok(Value::Integer(i64::from(entry.severity.value()))),
        Some(other) => Err(LoggerError::invalid_parameter(format!(
            "the ${{severity:format={}}} parameter must be \"alpha\" or \"number\".",
            other
        ))),
    }
}

fn filename(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.file.as_deref().unwrap_or_default()))
}

fn basename(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    let file = entry.file.as_deref().unwrap_or_default();
    let base = Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file);
    Ok(Value::from(base))
}

fn path(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    let file = entry.file.as_deref().unwrap_or_default();
    let dir = Path::new(file)
        .parent()
        .and_then(|dir| dir.to_str())
        .unwrap_or_default();
    Ok(Value::from(dir))
}

fn function(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.function.as_deref().unwrap_or_default()))
}

fn line(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.line.unwrap_or(0)))
}

fn column(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.column.unwrap_or(0)))
}

fn components(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    let names: Vec<&str> = entry.components.iter().map(|c| c.name()).collect();
    Ok(Value::from(names.join(",")))
}

fn hostname(_entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(hostname_value()))
}

fn progname(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.program_name.as_str()))
}

fn pid(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.process_id))
}

fn tid(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.thread_id.as_str()))
}

fn thread_name(entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(entry.thread_name.as_deref().unwrap_or_default()))
}

fn version(_entry: &LogEntry, _params: &[Param]) -> Result<Value> {
    Ok(Value::from(env!("CARGO_PKG_VERSION")))
}

/// `${diagnostic}` renders everything; `map[=key]` or `nested[=depth]` narrow it
fn diagnostic(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    let captured;
    let (map, nested) = match &entry.diagnostics {
        Some(snapshot) => (&snapshot.map, &snapshot.nested),
        None => {
            captured = (map_diagnostics(), nested_diagnostics());
            (&captured.0, &captured.1)
        }
    };

    if let Some(param) = find_param(params, "map") {
        return Ok(match param.text() {
            Some(key) => Value::from(map.get(key).map(String::as_str).unwrap_or_default()),
            None => Value::from(render_map(map)),
        });
    }

    if let Some(param) = find_param(params, "nested") {
        let depth = match param.integer() {
            Some(depth) => usize::try_from(depth).map_err(|_| {
                LoggerError::invalid_parameter(format!(
                    "the {} parameter must be a positive integer.",
                    param.spec()
                ))
            })?,
            None => nested.len(),
        };
        return Ok(Value::from(render_nested(nested, depth)));
    }

    let mut text = String::new();
    if !map.is_empty() {
        text.push_str(&render_map(map));
    }
    if !nested.is_empty() {
        text.push_str(&render_nested(nested, nested.len()));
    }
    Ok(Value::from(text))
}

fn field(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    let name = text_param(params, "name").ok_or_else(|| {
        LoggerError::invalid_parameter("the ${field} variable requires a name=... parameter.")
    })?;
    Ok(Value::from(
        entry.fields.get(name).map(String::as_str).unwrap_or_default(),
    ))
}

/// `k=v k=v`, or a JSON object with `format=json`
fn fields(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    match text_param(params, "format") {
        None | Some("text") => Ok(Value::from(render_fields(&entry.fields))),
        Some("json") => serde_json::to_string(&entry.fields)
            .map(Value::from)
            .map_err(|e| LoggerError::other(format!("cannot render fields as JSON: {}", e))),
        Some(other) => Err(LoggerError::invalid_parameter(format!(
            "the ${{fields:format={}}} parameter must be \"text\" or \"json\".",
            other
        ))),
    }
}

fn render_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn env(_entry: &LogEntry, params: &[Param]) -> Result<Value> {
    let name = text_param(params, "name").ok_or_else(|| {
        LoggerError::invalid_parameter("the ${env} variable requires a name=... parameter.")
    })?;
    Ok(Value::from(std::env::var(name).unwrap_or_default()))
}

fn local_or_utc(entry: &LogEntry, params: &[Param], default: &str) -> Result<Value> {
    let pattern = text_param(params, "format").unwrap_or(default);
    let text = if find_param(params, "utc").is_some() {
        strftime(&entry.timestamp, pattern)?
    } else {
        strftime(&entry.timestamp.with_timezone(&Local), pattern)?
    };
    Ok(Value::from(text))
}

fn date(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    local_or_utc(entry, params, DEFAULT_DATE_FORMAT)
}

fn time(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    local_or_utc(entry, params, DEFAULT_TIME_FORMAT)
}

fn timestamp(entry: &LogEntry, params: &[Param]) -> Result<Value> {
    let format = text_param(params, "format")
        .map(TimestampFormat::from_name)
        .unwrap_or_default();
    format.value(&entry.timestamp)
}
