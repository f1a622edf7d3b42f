//! Functions transform the value of a template variable
//!
//! A function is a template parameter whose name is registered here, e.g.
//! `${message:upper:max_width=40}`. Functions share a small working state
//! ([`FunctionData`]) so that `padding` and `align` affect the width
//! functions placed after them.

use super::error::{LoggerError, Result};
use super::format::{Param, ParamValue, Value};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Characters escaped by `${...:escape}` when no set is given
pub const DEFAULT_ESCAPE_CHARACTERS: &str = "\\\"\r\n\t";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Working state threaded through the functions of one expression
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub value: Value,
    pub padding: char,
    pub align: Align,
}

impl FunctionData {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            padding: ' ',
            align: Align::Left,
        }
    }

    pub fn text(&self) -> String {
        self.value.to_string()
    }

    pub fn set_text(&mut self, text: String) {
        self.value = Value::Text(text);
    }

    pub fn into_text(self) -> String {
        self.value.into_text()
    }
}

pub trait Function: Send + Sync {
    fn apply(&self, data: &mut FunctionData, param: &Param) -> Result<()>;
}

impl<F> Function for F
where
    F: Fn(&mut FunctionData, &Param) -> Result<()> + Send + Sync,
{
    fn apply(&self, data: &mut FunctionData, param: &Param) -> Result<()> {
        self(data, param)
    }
}

static FUNCTIONS: Lazy<RwLock<HashMap<String, Arc<dyn Function>>>> =
    Lazy::new(|| RwLock::new(builtin_functions()));

fn builtin_functions() -> HashMap<String, Arc<dyn Function>> {
    let mut functions: HashMap<String, Arc<dyn Function>> = HashMap::new();
    functions.insert("padding".to_string(), Arc::new(padding));
    functions.insert("align".to_string(), Arc::new(align));
    functions.insert("min_width".to_string(), Arc::new(min_width));
    functions.insert("max_width".to_string(), Arc::new(max_width));
    functions.insert("exact_width".to_string(), Arc::new(exact_width));
    functions.insert("escape".to_string(), Arc::new(escape));
    functions.insert("upper".to_string(), Arc::new(upper));
    functions.insert("lower".to_string(), Arc::new(lower));
    functions.insert("caps".to_string(), Arc::new(caps));
    functions.insert("append".to_string(), Arc::new(append));
    functions.insert("prepend".to_string(), Arc::new(prepend));
    functions
}

/// Register a new function; names are unique across the process
pub fn register_function(name: &str, function: impl Function + 'static) -> Result<()> {
    let mut functions = FUNCTIONS.write();
    if functions.contains_key(name) {
        return Err(LoggerError::duplicate(format!(
            "trying to add two functions named \"{}\".",
            name
        )));
    }
    functions.insert(name.to_string(), Arc::new(function));
    Ok(())
}

pub fn get_function(name: &str) -> Option<Arc<dyn Function>> {
    FUNCTIONS.read().get(name).cloned()
}

fn padding(data: &mut FunctionData, param: &Param) -> Result<()> {
    let text = param.value().to_string();
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            data.padding = c;
            Ok(())
        }
        _ => Err(LoggerError::invalid_parameter(format!(
            "the {} parameter must be a single character.",
            param.spec()
        ))),
    }
}

fn align(data: &mut FunctionData, param: &Param) -> Result<()> {
    if let ParamValue::Integer(_) = param.value() {
        return Err(LoggerError::invalid_parameter(format!(
            "the {} parameter must be a valid string (not an integer).",
            param.spec()
        )));
    }
    data.align = match param.text() {
        Some("left") => Align::Left,
        Some("center") => Align::Center,
        Some("right") => Align::Right,
        _ => {
            return Err(LoggerError::invalid_parameter(format!(
                "the {} parameter must be \"left\", \"center\" or \"right\".",
                param.spec()
            )))
        }
    };
    Ok(())
}

fn width(param: &Param) -> Result<usize> {
    param
        .integer()
        .and_then(|w| usize::try_from(w).ok())
        .ok_or_else(|| {
            LoggerError::invalid_parameter(format!(
                "the {} parameter must be a valid integer.",
                param.spec()
            ))
        })
}

fn pad(text: &str, width: usize, padding: char, align: Align) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let missing = width - len;
    let (before, after) = match align {
        Align::Left => (0, missing),
        Align::Right => (missing, 0),
        Align::Center => (missing / 2, missing - missing / 2),
    };
    let mut result = String::with_capacity(text.len() + missing * padding.len_utf8());
    result.extend(std::iter::repeat(padding).take(before));
    result.push_str(text);
    result.extend(std::iter::repeat(padding).take(after));
    result
}

fn truncate(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    let skip = match align {
        Align::Left => 0,
        Align::Right => len - width,
        Align::Center => (len - width) / 2,
    };
    text.chars().skip(skip).take(width).collect()
}

fn min_width(data: &mut FunctionData, param: &Param) -> Result<()> {
    let width = width(param)?;
    let text = pad(&data.text(), width, data.padding, data.align);
    data.set_text(text);
    Ok(())
}

fn max_width(data: &mut FunctionData, param: &Param) -> Result<()> {
    let width = width(param)?;
    let text = truncate(&data.text(), width, data.align);
    data.set_text(text);
    Ok(())
}

fn exact_width(data: &mut FunctionData, param: &Param) -> Result<()> {
    let width = width(param)?;
    let text = truncate(&data.text(), width, data.align);
    let text = pad(&text, width, data.padding, data.align);
    data.set_text(text);
    Ok(())
}

fn escape(data: &mut FunctionData, param: &Param) -> Result<()> {
    let set = match param.value() {
        ParamValue::Flag => DEFAULT_ESCAPE_CHARACTERS.to_string(),
        value => value.to_string(),
    };
    let text = data.text();
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if !set.contains(c) {
            result.push(c);
            continue;
        }
        match c {
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => {
                result.push('\\');
                result.push(c);
            }
        }
    }
    data.set_text(result);
    Ok(())
}

fn upper(data: &mut FunctionData, _param: &Param) -> Result<()> {
    let text = data.text().to_uppercase();
    data.set_text(text);
    Ok(())
}

fn lower(data: &mut FunctionData, _param: &Param) -> Result<()> {
    let text = data.text().to_lowercase();
    data.set_text(text);
    Ok(())
}

fn caps(data: &mut FunctionData, _param: &Param) -> Result<()> {
    let mut result = String::new();
    let mut word_start = true;
    for c in data.text().chars() {
        if c.is_alphanumeric() {
            if word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            result.push(c);
            word_start = true;
        }
    }
    data.set_text(result);
    Ok(())
}

fn append(data: &mut FunctionData, param: &Param) -> Result<()> {
    let text = format!("{}{}", data.text(), param.text().unwrap_or_default());
    data.set_text(text);
    Ok(())
}

fn prepend(data: &mut FunctionData, param: &Param) -> Result<()> {
    let text = format!("{}{}", param.text().unwrap_or_default(), data.text());
    data.set_text(text);
    Ok(())
}
