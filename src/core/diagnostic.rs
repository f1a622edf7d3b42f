//! Diagnostic context spliced into rendered messages
//!
//! This module provides:
//! - map diagnostics: process-wide key/value pairs
//! - nested diagnostics: a per-thread stack of labels following the call stack
//! - `NestedDiagnosticGuard` / `MapDiagnosticGuard`: RAII guards for scoped context
//!
//! Both kinds are captured in a [`DiagnosticSnapshot`] on the producing thread
//! when a message is sent, so rendering on the async worker still sees the
//! caller's context.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;

static MAP_DIAGNOSTICS: Lazy<RwLock<BTreeMap<String, String>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

thread_local! {
    static NESTED_DIAGNOSTICS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Set a map diagnostic, overwriting any previous value
pub fn set_map_diagnostic<K, V>(key: K, value: V)
where
    K: Into<String>,
    V: Into<String>,
{
    MAP_DIAGNOSTICS.write().insert(key.into(), value.into());
}

pub fn unset_map_diagnostic(key: &str) {
    MAP_DIAGNOSTICS.write().remove(key);
}

pub fn map_diagnostic(key: &str) -> Option<String> {
    MAP_DIAGNOSTICS.read().get(key).cloned()
}

/// Get a copy of all the map diagnostics
pub fn map_diagnostics() -> BTreeMap<String, String> {
    MAP_DIAGNOSTICS.read().clone()
}

/// Set a map diagnostic for the lifetime of the returned guard
///
/// The previous value, if any, is restored when the guard is dropped.
pub fn scoped_map_diagnostic<K, V>(key: K, value: V) -> MapDiagnosticGuard
where
    K: Into<String>,
    V: Into<String>,
{
    let key = key.into();
    let previous = MAP_DIAGNOSTICS.write().insert(key.clone(), value.into());
    MapDiagnosticGuard { key, previous }
}

/// Push a label on the current thread's nested diagnostic stack
///
/// # Example
///
/// ```
/// use snaplogger::core::diagnostic::{nested_diagnostics, push_nested_diagnostic};
///
/// {
///     let _outer = push_nested_diagnostic("request");
///     let _inner = push_nested_diagnostic("parse");
///     assert_eq!(nested_diagnostics(), vec!["request", "parse"]);
/// }
/// assert!(nested_diagnostics().is_empty());
/// ```
pub fn push_nested_diagnostic(label: impl Into<String>) -> NestedDiagnosticGuard {
    NESTED_DIAGNOSTICS.with(|stack| stack.borrow_mut().push(label.into()));
    NestedDiagnosticGuard {
        _not_send: PhantomData,
    }
}

/// Current thread's nested labels, outermost first
pub fn nested_diagnostics() -> Vec<String> {
    NESTED_DIAGNOSTICS.with(|stack| stack.borrow().clone())
}

/// Render a nested stack keeping at most `depth` innermost labels
///
/// `["a", "b", "c"]` with a depth of 2 gives `{.../b/c}`.
pub fn render_nested(stack: &[String], depth: usize) -> String {
    let mut result = String::from("{");
    if stack.len() > depth {
        result.push_str("...");
        for label in &stack[stack.len() - depth..] {
            result.push('/');
            result.push_str(label);
        }
    } else {
        result.push_str(&stack.join("/"));
    }
    result.push('}');
    result
}

/// Render the map diagnostics as `<k1=v1:k2=v2>`
pub fn render_map(map: &BTreeMap<String, String>) -> String {
    let pairs = map
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(":");
    format!("<{}>", pairs)
}

/// Pops exactly one nested label when dropped
///
/// The guard is tied to the thread that created it.
pub struct NestedDiagnosticGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for NestedDiagnosticGuard {
    fn drop(&mut self) {
        NESTED_DIAGNOSTICS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Restores a map diagnostic to its previous state when dropped
pub struct MapDiagnosticGuard {
    key: String,
    previous: Option<String>,
}

impl Drop for MapDiagnosticGuard {
    fn drop(&mut self) {
        let mut map = MAP_DIAGNOSTICS.write();
        match self.previous.take() {
            Some(value) => {
                map.insert(std::mem::take(&mut self.key), value);
            }
            None => {
                map.remove(&self.key);
            }
        }
    }
}

/// Diagnostics captured when a message is sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticSnapshot {
    pub map: BTreeMap<String, String>,
    pub nested: Vec<String>,
}

impl DiagnosticSnapshot {
    /// Capture the map and the calling thread's nested stack
    pub fn capture() -> Self {
        Self {
            map: map_diagnostics(),
            nested: nested_diagnostics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_nested_truncates() {
        let stack = labels(&["level-I", "sub-level-II", "under-level-III"]);
        assert_eq!(
            render_nested(&stack, 2),
            "{.../sub-level-II/under-level-III}"
        );
        assert_eq!(
            render_nested(&stack, 10),
            "{level-I/sub-level-II/under-level-III}"
        );
        assert_eq!(
            render_nested(&stack, 3),
            "{level-I/sub-level-II/under-level-III}"
        );
        assert_eq!(render_nested(&[], 5), "{}");
    }

    #[test]
    fn test_guard_pops_on_early_return() {
        fn inner() -> Result<(), ()> {
            let _guard = push_nested_diagnostic("inner");
            assert_eq!(nested_diagnostics().last().map(String::as_str), Some("inner"));
            Err(())
        }

        let _outer = push_nested_diagnostic("outer");
        assert!(inner().is_err());
        assert_eq!(nested_diagnostics(), labels(&["outer"]));
    }

    #[test]
    fn test_guard_pops_on_panic() {
        let result = std::panic::catch_unwind(|| {
            let _guard = push_nested_diagnostic("doomed");
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(nested_diagnostics().is_empty());
    }

    #[test]
    fn test_nested_is_thread_local() {
        let _guard = push_nested_diagnostic("main-thread");
        let other = std::thread::spawn(nested_diagnostics).join().unwrap();
        assert!(other.is_empty());
        assert_eq!(nested_diagnostics(), labels(&["main-thread"]));
    }

    #[test]
    fn test_scoped_map_restores_previous() {
        set_map_diagnostic("diag-test-user", "alice");
        {
            let _guard = scoped_map_diagnostic("diag-test-user", "bob");
            assert_eq!(map_diagnostic("diag-test-user").as_deref(), Some("bob"));
        }
        assert_eq!(map_diagnostic("diag-test-user").as_deref(), Some("alice"));
        unset_map_diagnostic("diag-test-user");

        {
            let _guard = scoped_map_diagnostic("diag-test-temp", "x");
        }
        assert!(map_diagnostic("diag-test-temp").is_none());
    }

    #[test]
    fn test_render_map() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());
        assert_eq!(render_map(&map), "<a=1:b=2>");
    }
}
