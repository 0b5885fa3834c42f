//! Typed access to the members of a JSON object.

use serde_json::Value;
use tiledmap_io_core::error::{FormatError, Result};

/// A JSON object together with a description used in error messages.
pub(crate) struct Fields<'a> {
    object: &'a serde_json::Map<String, Value>,
    context: String,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value, context: impl Into<String>) -> Result<Self> {
        let context = context.into();
        match value {
            Value::Object(object) => Ok(Self { object, context }),
            _ => Err(FormatError::bad_structure(context, "expected a JSON object")),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|value| !value.is_null())
    }

    fn invalid(&self, key: &str, expected: &str) -> FormatError {
        FormatError::bad_structure(
            self.context.clone(),
            format!("field '{key}' must be {expected}"),
        )
    }

    fn missing(&self, key: &str) -> FormatError {
        FormatError::missing_field(self.context.clone(), key)
    }

    pub fn opt_u32(&self, key: &str) -> Result<Option<u32>> {
        self.get(key)
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| self.invalid(key, "a non-negative integer"))
            })
            .transpose()
    }

    pub fn u32(&self, key: &str) -> Result<u32> {
        self.opt_u32(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)
            .map(|value| value.as_i64().ok_or_else(|| self.invalid(key, "an integer")))
            .transpose()
    }

    pub fn f32_or(&self, key: &str, default: f32) -> Result<f32> {
        match self.get(key) {
            Some(value) => value
                .as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| self.invalid(key, "a number")),
            None => Ok(default),
        }
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>> {
        self.get(key)
            .map(|value| value.as_str().ok_or_else(|| self.invalid(key, "a string")))
            .transpose()
    }

    pub fn str(&self, key: &str) -> Result<&'a str> {
        self.opt_str(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn str_or(&self, key: &str, default: &'a str) -> Result<&'a str> {
        Ok(self.opt_str(key)?.unwrap_or(default))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            Some(value) => value.as_bool().ok_or_else(|| self.invalid(key, "a boolean")),
            None => Ok(default),
        }
    }

    /// The array under `key`, or an empty slice when it is absent.
    pub fn array(&self, key: &str) -> Result<&'a [Value]> {
        match self.get(key) {
            Some(value) => value
                .as_array()
                .map(Vec::as_slice)
                .ok_or_else(|| self.invalid(key, "an array")),
            None => Ok(&[]),
        }
    }
}
