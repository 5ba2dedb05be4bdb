//! Named functions
//!
//! Field rules never embed code. A rule that needs behavior beyond the
//! built-in transform kinds names a function (`op: custom, name: ...`), and
//! the function is looked up here when the rule runs.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

/// A named value transform
pub type TransformFn = Arc<dyn Fn(&Value) -> crate::Result<Value> + Send + Sync>;

/// A named validation predicate
pub type ValidateFn = Arc<dyn Fn(&Value) -> crate::Result<bool> + Send + Sync>;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static pattern is valid"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static pattern is valid"));

/// Registry of named transforms and validators
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    transforms: HashMap<String, TransformFn>,
    validators: HashMap<String, ValidateFn>,
    /// Compiled `matches` patterns, shared between clones
    patterns: Arc<Mutex<HashMap<String, Regex>>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in functions
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_transform("strip_html", |value| {
                Ok(match value {
                    Value::String(s) => Value::String(HTML_TAG.replace_all(s, "").into_owned()),
                    other => other.clone(),
                })
            })
            .register_transform("collapse_whitespace", |value| {
                Ok(match value {
                    Value::String(s) => {
                        Value::String(WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned())
                    }
                    other => other.clone(),
                })
            })
            .register_transform("non_negative_integer", non_negative_integer)
            .register_validator("non_negative", |value| {
                crate::numeric::value_to_f64(value)
                    .map(|n| n >= 0.0)
                    .ok_or_else(|| {
                        crate::Error::Validation(format!("'{value}' is not a number"))
                    })
            });
        registry
    }

    /// Register a transform under `name`, replacing any previous one
    pub fn register_transform(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value) -> crate::Result<Value> + Send + Sync + 'static,
    ) -> &mut Self {
        self.transforms.insert(name.into(), Arc::new(func));
        self
    }

    /// Register a validator under `name`, replacing any previous one
    pub fn register_validator(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&Value) -> crate::Result<bool> + Send + Sync + 'static,
    ) -> &mut Self {
        self.validators.insert(name.into(), Arc::new(func));
        self
    }

    #[must_use]
    pub fn has_transform(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    #[must_use]
    pub fn has_validator(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Run the named transform
    ///
    /// # Errors
    ///
    /// Returns an error if no transform is registered under `name`, or if
    /// the transform itself fails.
    pub fn call_transform(&self, name: &str, value: &Value) -> crate::Result<Value> {
        let func = self
            .transforms
            .get(name)
            .ok_or_else(|| crate::Error::UnknownFunction(name.to_string()))?;
        func(value)
    }

    /// Run the named validator
    ///
    /// # Errors
    ///
    /// Returns an error if no validator is registered under `name`, or if
    /// the validator itself fails.
    pub fn call_validator(&self, name: &str, value: &Value) -> crate::Result<bool> {
        let func = self
            .validators
            .get(name)
            .ok_or_else(|| crate::Error::UnknownFunction(name.to_string()))?;
        func(value)
    }

    /// Test `text` against `pattern`, compiling each distinct pattern once
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the cache lock is poisoned.
    pub fn is_match(&self, pattern: &str, text: &str) -> crate::Result<bool> {
        let mut patterns = self
            .patterns
            .lock()
            .map_err(|_| crate::Error::Validation("Failed to lock pattern cache".to_string()))?;
        if let Some(regex) = patterns.get(pattern) {
            return Ok(regex.is_match(text));
        }
        let regex = Regex::new(pattern).map_err(|e| {
            crate::Error::Validation(format!("Invalid pattern '{pattern}': {e}"))
        })?;
        let matched = regex.is_match(text);
        patterns.insert(pattern.to_string(), regex);
        Ok(matched)
    }

    /// Number of compiled patterns held in the cache
    #[must_use]
    pub fn cached_patterns(&self) -> usize {
        self.patterns.lock().map_or(0, |patterns| patterns.len())
    }

    /// Sorted names of registered transforms
    #[must_use]
    pub fn transform_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transforms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted names of registered validators
    #[must_use]
    pub fn validator_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.validators.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Whole, non-negative count from a number or numeric string
fn non_negative_integer(value: &Value) -> crate::Result<Value> {
    if let Some(n) = value.as_u64() {
        return Ok(Value::from(n));
    }
    let number = crate::numeric::value_to_f64(value)
        .ok_or_else(|| crate::Error::Transform(format!("'{value}' is not a number")))?;
    if number < 0.0 || number.fract() != 0.0 || number > 9_007_199_254_740_992.0 {
        return Err(crate::Error::Transform(format!(
            "'{value}' is not a non-negative integer"
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = number as u64;
    Ok(Value::from(whole))
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("transforms", &self.transform_names())
            .field("validators", &self.validator_names())
            .finish()
    }
}
