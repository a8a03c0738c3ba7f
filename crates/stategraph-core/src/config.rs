//! Per-run configuration passed read-only to every node

use serde_json::Value;
use std::collections::HashMap;

/// Immutable mapping of caller-supplied options for one run
///
/// Built by the caller per invocation (e.g. which model provider a node
/// should use) and passed by reference to every node. The engine never
/// writes to it.
///
/// # Examples
///
/// ```rust
/// use stategraph_core::RunConfig;
///
/// let config = RunConfig::new()
///     .with_option("model_provider", "fake")
///     .with_option("max_tokens", 256);
///
/// assert_eq!(config.str_or("model_provider", "openai"), "fake");
/// assert_eq!(config.str_or("model_name", "gpt-4.1"), "gpt-4.1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    options: HashMap<String, Value>,
}

impl RunConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, consuming and returning the config
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Raw option lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// String option lookup
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// String option with a default for absent or non-string values
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    /// Whether no options are set
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
