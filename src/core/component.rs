//! Components: named tags attached to messages for routing

use super::error::{LoggerError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const COMPONENT_NORMAL: &str = "normal";
pub const COMPONENT_SECURE: &str = "secure";
pub const COMPONENT_DEBUG: &str = "debug";
pub const COMPONENT_BANNER: &str = "banner";
/// Tag of the messages the logger emits about itself (async worker notices)
pub const COMPONENT_SELF: &str = "self";

/// A validated component name
///
/// Components are only created through a [`ComponentRegistry`], so two
/// components with the same name are always the same `Arc`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Component {
    name: String,
}

impl Component {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Check a component name, reporting the first offending character
pub fn validate_component_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    match chars.next() {
        None => {
            return Err(LoggerError::invalid_parameter(
                "a component name cannot be empty.",
            ))
        }
        Some(c) if c.is_ascii_digit() => {
            return Err(LoggerError::invalid_parameter(format!(
                "component name \"{}\" is not valid: it starts with a digit.",
                name
            )))
        }
        Some(_) => {}
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(LoggerError::invalid_parameter(format!(
            "component name \"{}\" is not valid: character '{}' is not allowed.",
            name, bad
        )));
    }
    Ok(())
}

/// Lazily populated set of components, shared by name
#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, Arc<Component>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the component named `name`, creating it on first use
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Component>> {
        if let Some(component) = self.components.read().get(name) {
            return Ok(Arc::clone(component));
        }

        validate_component_name(name)?;

        let mut components = self.components.write();
        let component = components
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Component {
                    name: name.to_string(),
                })
            });
        Ok(Arc::clone(component))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Component>> {
        self.components.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_component() {
        let registry = ComponentRegistry::new();
        let a = registry.get_or_create("network").unwrap();
        let b = registry.get_or_create("network").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        // identity is case sensitive
        let c = registry.get_or_create("Network").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_name_starting_with_digit() {
        let registry = ComponentRegistry::new();
        let err = registry.get_or_create("1abc").unwrap_err();
        assert!(matches!(err, LoggerError::InvalidParameter(_)));
        let text = err.to_string();
        assert!(text.contains("\"1abc\""));
        assert!(text.contains("starts with a digit"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_name_with_bad_character() {
        let registry = ComponentRegistry::new();
        let err = registry.get_or_create("net#work!").unwrap_err();
        assert!(err.to_string().contains("'#'"));
        assert!(!err.to_string().contains("'!'"));
    }

    #[test]
    fn test_valid_names() {
        for name in ["a", "with-dash", "with_underscore", "x9", "_lead"] {
            assert!(validate_component_name(name).is_ok(), "{name} should be valid");
        }
        assert!(validate_component_name("").is_err());
        assert!(validate_component_name("sp ace").is_err());
    }
}
