//! Function values used by descriptors: value coercion (`kind`) and external-name conversion.

use crate::utils;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct CoercionError(pub String);

type CoerceFn = dyn Fn(Value) -> Result<Value, CoercionError> + Send + Sync;

/// A value transform applied to each scalar element of a field.
///
/// Defaults to the identity transform. Serialize and deserialize halves of the same
/// attribute usually carry inverse coercions (e.g. `string` on one side, `integer` on the other).
#[derive(Clone)]
pub struct Coercion {
    label: &'static str,
    func: Arc<CoerceFn>,
}

impl Coercion {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CoercionError> + Send + Sync + 'static,
    {
        Self::labelled("custom", func)
    }

    fn labelled<F>(label: &'static str, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CoercionError> + Send + Sync + 'static,
    {
        Self {
            label,
            func: Arc::new(func),
        }
    }

    pub fn identity() -> Self {
        Self::labelled("identity", Ok)
    }

    /// Renders scalars as strings. Strings pass through untouched.
    pub fn string() -> Self {
        Self::labelled("string", |value| match value {
            Value::String(s) => Ok(Value::String(s)),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            other => Err(CoercionError(format!("cannot render {other} as a string"))),
        })
    }

    /// Accepts integral numbers and strings holding one.
    pub fn integer() -> Self {
        Self::labelled("integer", |value| match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(CoercionError(format!("{n} is not an integer"))),
            },
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Ok(Value::from(i))
                } else if let Ok(u) = trimmed.parse::<u64>() {
                    Ok(Value::from(u))
                } else {
                    Err(CoercionError(format!("`{s}` is not an integer")))
                }
            }
            Value::Bool(b) => Ok(Value::from(i64::from(b))),
            other => Err(CoercionError(format!("{other} is not an integer"))),
        })
    }

    pub fn float() -> Self {
        Self::labelled("float", |value| {
            let parsed = match &value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| CoercionError(format!("{value} is not a finite float")))
        })
    }

    /// Accepts booleans, `0`/`1`, and the usual INI spellings (`yes`/`no`, `true`/`false`, `on`/`off`).
    pub fn boolean() -> Self {
        Self::labelled("boolean", |value| match &value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "yes" | "true" | "on" => Ok(Value::Bool(true)),
                "0" | "no" | "false" | "off" => Ok(Value::Bool(false)),
                _ => Err(CoercionError(format!("`{s}` is not a boolean"))),
            },
            other => Err(CoercionError(format!("{other} is not a boolean"))),
        })
    }

    pub fn apply(&self, value: Value) -> Result<Value, CoercionError> {
        (self.func)(value)
    }
}

impl Default for Coercion {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coercion({})", self.label)
    }
}

type ConvFn = dyn Fn(&str) -> String + Send + Sync;

/// Maps an attribute name to the external key used when a descriptor has no explicit name.
#[derive(Clone)]
pub struct NameConv {
    label: &'static str,
    func: Arc<ConvFn>,
}

impl NameConv {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::labelled("custom", func)
    }

    fn labelled<F>(label: &'static str, func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            label,
            func: Arc::new(func),
        }
    }

    pub fn identity() -> Self {
        Self::labelled("identity", str::to_owned)
    }

    pub fn camel_case() -> Self {
        Self::labelled("camel_case", utils::camel_case)
    }

    pub fn pascal_case() -> Self {
        Self::labelled("pascal_case", utils::pascal_case)
    }

    pub fn kebab_case() -> Self {
        Self::labelled("kebab_case", utils::kebab_case)
    }

    pub fn upper_case() -> Self {
        Self::labelled("upper_case", utils::upper_case)
    }

    pub fn convert(&self, attribute: &str) -> String {
        (self.func)(attribute)
    }
}

impl Default for NameConv {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for NameConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameConv({})", self.label)
    }
}
