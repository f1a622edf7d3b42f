//! Compiled message templates
//!
//! A template is literal text mixed with `${name[:param[=value]]*}`
//! expressions. `name` selects a registered [`Variable`]; each parameter
//! either configures that variable or, when a [`Function`] of that name is
//! registered, transforms the variable's value. Functions run left to right.
//!
//! Values are bare words, integers or quoted strings (`"..."` or `'...'`,
//! with backslash escapes). `$$` is a literal `$`.
//!
//! ```
//! use snaplogger::core::{Format, LogEntry, SeverityLevel};
//!
//! let format = Format::new("${severity:padding='.':min_width=8}|${message}").unwrap();
//! let entry = LogEntry::new(SeverityLevel::ERROR, "disk full");
//! assert_eq!(format.render(&entry).unwrap(), "error...|disk full\n");
//! ```

use super::error::{LoggerError, Result};
use super::function::{get_function, Function, FunctionData};
use super::log_entry::LogEntry;
use super::variable::{get_variable, Variable};
use once_cell::sync::Lazy;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

pub const DEFAULT_FORMAT: &str = "${date} ${time} ${hostname} ${progname}[${pid}]: \
${severity}: ${message} (in function \"${function}()\") (${basename}:${line})";

static DEFAULT: Lazy<Arc<Format>> = Lazy::new(|| {
    Arc::new(Format::new(DEFAULT_FORMAT).unwrap_or_else(|e| {
        eprintln!("[LOGGER ERROR] default format is invalid: {}", e);
        Format::empty()
    }))
});

/// Raw value produced by a variable and transformed by functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
}

impl Value {
    pub fn into_text(self) -> String {
        match self {
            Value::Text(s) => s,
            Value::Integer(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

/// Value of a template parameter, as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `${name:param}`
    Flag,
    /// `${name:param=word}`
    Word(String),
    /// `${name:param=42}`
    Integer(i64),
    /// `${name:param="text"}`
    Quoted(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Flag => Ok(()),
            ParamValue::Word(s) | ParamValue::Quoted(s) => f.write_str(s),
            ParamValue::Integer(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    value: ParamValue,
    literal: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        let literal = match &value {
            ParamValue::Flag => String::new(),
            ParamValue::Word(s) | ParamValue::Quoted(s) => s.clone(),
            ParamValue::Integer(i) => i.to_string(),
        };
        Self {
            name: name.into(),
            value,
            literal,
        }
    }

    /// Keep the value's text exactly as written (`007` stays `007`)
    fn with_literal(mut self, literal: &str) -> Self {
        self.literal = literal.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// The value as written, numbers included; `None` for a flag
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            ParamValue::Flag => None,
            _ => Some(&self.literal),
        }
    }

    /// The value as an integer, accepting quoted digits
    pub fn integer(&self) -> Option<i64> {
        match &self.value {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::Word(s) | ParamValue::Quoted(s) => s.trim().parse().ok(),
            ParamValue::Flag => None,
        }
    }

    /// `${...:name=value}`, as used in error messages
    pub fn spec(&self) -> String {
        match &self.value {
            ParamValue::Flag => format!("${{...:{}}}", self.name),
            _ => format!("${{...:{}={}}}", self.name, self.literal),
        }
    }
}

/// Look up the first parameter named `name`
pub fn find_param<'a>(params: &'a [Param], name: &str) -> Option<&'a Param> {
    params.iter().find(|p| p.name == name)
}

/// Parsed but not yet resolved template piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Expression { name: String, params: Vec<Param> },
}

/// Split a template into literal text and expressions
pub fn parse_template(template: &str) -> Result<Vec<TemplatePart>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            literal.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                literal.push('$');
            }
            Some('{') => {
                chars.next();
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(parse_expression(&mut chars, template)?);
            }
            _ => literal.push('$'),
        }
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    Ok(parts)
}

fn parse_expression(chars: &mut Peekable<Chars<'_>>, template: &str) -> Result<TemplatePart> {
    let name = read_name(chars);
    if name.is_empty() {
        return Err(LoggerError::invalid_parameter(format!(
            "a ${{...}} expression must start with a variable name in \"{}\".",
            template
        )));
    }

    let mut params = Vec::new();
    loop {
        match chars.next() {
            Some('}') => break,
            Some(':') => params.push(parse_param(chars, template)?),
            Some(c) => {
                return Err(LoggerError::invalid_parameter(format!(
                    "unexpected character '{}' in ${{{}...}} of \"{}\".",
                    c, name, template
                )))
            }
            None => return Err(unterminated(template)),
        }
    }

    Ok(TemplatePart::Expression { name, params })
}

fn parse_param(chars: &mut Peekable<Chars<'_>>, template: &str) -> Result<Param> {
    let name = read_name(chars);
    if name.is_empty() {
        return Err(LoggerError::invalid_parameter(format!(
            "a ${{...:}} parameter must have a name in \"{}\".",
            template
        )));
    }

    if chars.peek() != Some(&'=') {
        return Ok(Param::new(name, ParamValue::Flag));
    }
    chars.next();

    let value = match chars.peek() {
        Some(&quote) if quote == '"' || quote == '\'' => {
            chars.next();
            let text = read_quoted(chars, quote, template)?;
            match chars.peek() {
                Some(':') | Some('}') => {}
                None => return Err(unterminated(template)),
                Some(c) => {
                    return Err(LoggerError::invalid_parameter(format!(
                        "unexpected character '{}' after the quoted value of \"{}\" in \"{}\".",
                        c, name, template
                    )))
                }
            }
            ParamValue::Quoted(text)
        }
        _ => {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c == ':' || c == '}' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let word = word.trim();
            match word.parse::<i64>() {
                Ok(i) => return Ok(Param::new(name, ParamValue::Integer(i)).with_literal(word)),
                Err(_) => ParamValue::Word(word.to_string()),
            }
        }
    };

    Ok(Param::new(name, value))
}

fn read_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == ':' || c == '}' || c == '=' {
            break;
        }
        name.push(c);
        chars.next();
    }
    name.trim().to_string()
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char, template: &str) -> Result<String> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => return Ok(text),
            Some('\\') => match chars.next() {
                Some('n') => text.push('\n'),
                Some('r') => text.push('\r'),
                Some('t') => text.push('\t'),
                Some(c) => text.push(c),
                None => return Err(unterminated(template)),
            },
            Some(c) => text.push(c),
            None => return Err(unterminated(template)),
        }
    }
}

fn unterminated(template: &str) -> LoggerError {
    LoggerError::invalid_parameter(format!(
        "unterminated ${{...}} expression in \"{}\".",
        template
    ))
}

struct Expression {
    variable: Arc<dyn Variable>,
    params: Vec<Param>,
    /// index into `params` of each parameter naming a function, in order
    functions: Vec<(usize, Arc<dyn Function>)>,
}

impl Expression {
    fn evaluate(&self, entry: &LogEntry) -> Result<String> {
        let value = self.variable.resolve(entry, &self.params)?;
        let mut data = FunctionData::new(value);
        for (index, function) in &self.functions {
            function.apply(&mut data, &self.params[*index])?;
        }
        Ok(data.into_text())
    }
}

enum Segment {
    Literal(String),
    Expression(Expression),
}

/// A compiled template
///
/// Parameter values are only checked when a message is rendered, so a bad
/// parameter fails the messages that reach it, not the compilation.
pub struct Format {
    template: String,
    segments: Vec<Segment>,
}

impl Format {
    /// Compile a template, resolving its variables and functions
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let mut segments = Vec::new();

        for part in parse_template(&template)? {
            match part {
                TemplatePart::Literal(text) => segments.push(Segment::Literal(text)),
                TemplatePart::Expression { name, params } => {
                    let variable = get_variable(&name)?;
                    let functions = params
                        .iter()
                        .enumerate()
                        .filter_map(|(index, param)| {
                            get_function(param.name()).map(|function| (index, function))
                        })
                        .collect();
                    segments.push(Segment::Expression(Expression {
                        variable,
                        params,
                        functions,
                    }));
                }
            }
        }

        Ok(Self { template, segments })
    }

    /// Compile a template directly into a shareable `Arc`
    pub fn shared(template: impl Into<String>) -> Result<Arc<Self>> {
        Self::new(template).map(Arc::new)
    }

    /// The format used by appenders that were not given one
    pub fn default_shared() -> Arc<Self> {
        Arc::clone(&DEFAULT)
    }

    fn empty() -> Self {
        Self {
            template: String::new(),
            segments: Vec::new(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render an entry; the result always ends with exactly one added `\n`
    /// unless the content already ends with one
    pub fn render(&self, entry: &LogEntry) -> Result<String> {
        let mut output = String::with_capacity(self.template.len() + entry.message.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Expression(expression) => output.push_str(&expression.evaluate(entry)?),
            }
        }
        if !output.ends_with('\n') {
            output.push('\n');
        }
        Ok(output)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("template", &self.template)
            .finish()
    }
}
