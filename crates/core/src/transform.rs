//! Transform trait — value middleware applied before a setter runs.
//!
//! A directive carries an ordered chain of transforms; each maps an input
//! value to an output value. Transforms are looked up by name when directives
//! are loaded from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TransformError;
use crate::value::Value;

/// A single value-processing step.
pub trait Transform: Send + Sync {
    /// The unique name of this transform (e.g., "trim").
    fn name(&self) -> &str;

    /// Map an input value to an output value.
    fn apply(&self, value: Value) -> Result<Value, TransformError>;
}

/// Run `value` through `chain` in declaration order.
pub fn apply_chain(chain: &[Arc<dyn Transform>], value: Value) -> Result<Value, TransformError> {
    chain.iter().try_fold(value, |value, step| step.apply(value))
}

/// A transform backed by a plain function.
pub struct FnTransform<F> {
    name: String,
    func: F,
}

impl<F> FnTransform<F>
where
    F: Fn(Value) -> Result<Value, TransformError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(Value) -> Result<Value, TransformError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, value: Value) -> Result<Value, TransformError> {
        (self.func)(value)
    }
}

/// A registry of named transforms.
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// A registry holding the built-in transforms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FnTransform::new("trim", |v: Value| map_str(v, |s| s.trim().to_string()))));
        registry.register(Arc::new(FnTransform::new("lowercase", |v: Value| map_str(v, |s| s.to_lowercase()))));
        registry.register(Arc::new(FnTransform::new("uppercase", |v: Value| map_str(v, |s| s.to_uppercase()))));
        registry.register(Arc::new(FnTransform::new("null_if_empty", null_if_empty)));
        registry.register(Arc::new(FnTransform::new("to_string", to_string)));
        registry.register(Arc::new(FnTransform::new("to_number", to_number)));
        registry
    }

    /// Register a transform. Replaces any existing transform with the same name.
    pub fn register(&mut self, transform: Arc<dyn Transform>) {
        self.transforms.insert(transform.name().to_string(), transform);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.get(name).cloned()
    }

    /// Look up every name of a chain, failing on the first unknown one.
    pub fn chain(&self, names: &[String]) -> Result<Vec<Arc<dyn Transform>>, TransformError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| TransformError::UnknownTransform(name.clone()))
            })
            .collect()
    }

    /// List all registered transform names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// Non-string values pass through string transforms untouched.
fn map_str(value: Value, f: impl Fn(&str) -> String) -> Result<Value, TransformError> {
    Ok(match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    })
}

fn null_if_empty(value: Value) -> Result<Value, TransformError> {
    Ok(match value {
        Value::String(s) if s.is_empty() => Value::Null,
        Value::Array(a) if a.is_empty() => Value::Null,
        other => other,
    })
}

fn to_string(value: Value) -> Result<Value, TransformError> {
    match value {
        Value::String(_) | Value::Null => Ok(value),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(TransformError::Failed {
            transform: "to_string".into(),
            reason: format!("cannot convert {other} to a string"),
        }),
    }
}

fn to_number(value: Value) -> Result<Value, TransformError> {
    let fail = |reason: String| TransformError::Failed {
        transform: "to_number".into(),
        reason,
    };
    match value {
        Value::Number(_) | Value::Null => Ok(value),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| fail(format!("{s:?} is not a number")))
        }
        other => Err(fail(format!("cannot convert {other} to a number"))),
    }
}
