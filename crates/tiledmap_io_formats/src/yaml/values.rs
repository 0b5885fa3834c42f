//! Attribute payloads as YAML scalars and sequences.

use std::path::PathBuf;

use serde_yaml::Value;
use tiledmap_io_core::attribute::{AttributeKind, AttributeValue};
use tiledmap_io_core::color::Color;
use tiledmap_io_core::error::{FormatError, Result, TypeMismatch};

use crate::common::{path_to_string, widen_float};

/// Vectors become sequences, colors `#RRGGBBAA` strings and paths forward-slash
/// strings.
pub(crate) fn to_yaml(value: &AttributeValue, precision: Option<usize>) -> Value {
    let float = |v: f32| Value::from(widen_float(v, precision));
    match value {
        AttributeValue::String(text) => Value::from(text.as_str()),
        AttributeValue::Int(v) | AttributeValue::Object(v) => Value::from(*v),
        AttributeValue::Int2(v) => Value::from(v.to_array().to_vec()),
        AttributeValue::Int3(v) => Value::from(v.to_array().to_vec()),
        AttributeValue::Int4(v) => Value::from(v.to_array().to_vec()),
        AttributeValue::Float(v) => float(*v),
        AttributeValue::Float2(v) => Value::Sequence(v.to_array().map(float).to_vec()),
        AttributeValue::Float3(v) => Value::Sequence(v.to_array().map(float).to_vec()),
        AttributeValue::Float4(v) => Value::Sequence(v.to_array().map(float).to_vec()),
        AttributeValue::Bool(v) => Value::from(*v),
        AttributeValue::Path(path) => Value::from(path_to_string(path)),
        AttributeValue::Color(color) => Value::from(color.to_rgba_hex()),
    }
}

/// Reads a payload of `kind`. A YAML value of the wrong shape is a type mismatch.
pub(crate) fn from_yaml(context: &str, kind: AttributeKind, value: &Value) -> Result<AttributeValue> {
    let mismatch = || {
        FormatError::TypeMismatch(TypeMismatch {
            expected: kind,
            found: found_kind(value),
        })
    };
    let parsed = match kind {
        AttributeKind::String => value.as_str().map(AttributeValue::from),
        AttributeKind::Int => as_i32(value).map(AttributeValue::Int),
        AttributeKind::Object => as_i32(value).map(AttributeValue::Object),
        AttributeKind::Float => value.as_f64().map(|v| AttributeValue::Float(v as f32)),
        AttributeKind::Bool => value.as_bool().map(AttributeValue::Bool),
        AttributeKind::Path => value
            .as_str()
            .map(|text| AttributeValue::Path(PathBuf::from(text))),
        AttributeKind::Color => match value.as_str() {
            Some("") => Some(AttributeValue::default_for(kind)),
            Some(text) => Some(AttributeValue::Color(Color::from_rgba_hex(text).ok_or_else(
                || FormatError::bad_structure(context, format!("invalid color '{text}'")),
            )?)),
            None => None,
        },
        AttributeKind::Int2 | AttributeKind::Int3 | AttributeKind::Int4 => value
            .as_sequence()
            .and_then(|items| items.iter().map(as_i32).collect::<Option<Vec<_>>>())
            .and_then(|components| AttributeValue::int_vector(kind, &components)),
        AttributeKind::Float2 | AttributeKind::Float3 | AttributeKind::Float4 => value
            .as_sequence()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_f64().map(|v| v as f32))
                    .collect::<Option<Vec<_>>>()
            })
            .and_then(|components| AttributeValue::float_vector(kind, &components)),
    };
    parsed.ok_or_else(mismatch)
}

/// Reads a `type` key.
pub(crate) fn parse_kind(context: &str, name: &str) -> Result<AttributeKind> {
    AttributeKind::from_name(name).ok_or_else(|| {
        FormatError::bad_structure(context, format!("unknown attribute type '{name}'"))
    })
}

fn as_i32(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|v| i32::try_from(v).ok())
}

/// Best guess at the kind a mismatching YAML value was meant to be, for error
/// messages.
fn found_kind(value: &Value) -> AttributeKind {
    match value {
        Value::Bool(_) => AttributeKind::Bool,
        Value::Number(number) if number.is_f64() => AttributeKind::Float,
        Value::Number(_) => AttributeKind::Int,
        Value::Sequence(items) => match items.len() {
            2 => AttributeKind::Float2,
            3 => AttributeKind::Float3,
            _ => AttributeKind::Float4,
        },
        _ => AttributeKind::String,
    }
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec2};
    use tiledmap_io_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_values_survive_yaml_text() {
        let values = [
            AttributeValue::from("door"),
            AttributeValue::Int(-7),
            AttributeValue::Int3(IVec3::new(1, 2, 3)),
            AttributeValue::Float(0.1),
            AttributeValue::Float2(Vec2::new(1.5, -2.25)),
            AttributeValue::Bool(true),
            AttributeValue::Path(PathBuf::from("sounds/door.ogg")),
            AttributeValue::Color(Color::rgba(1, 2, 3, 4)),
            AttributeValue::Object(12),
        ];
        for value in values {
            let text = serde_yaml::to_string(&to_yaml(&value, None)).unwrap();
            let yaml: Value = serde_yaml::from_str(&text).unwrap();
            assert_eq!(from_yaml("test", value.kind(), &yaml).unwrap(), value, "{text}");
        }
    }

    #[test]
    fn test_color_is_rgba_hex() {
        let value = to_yaml(&AttributeValue::Color(Color::rgba(0xFF, 0x80, 0, 0xC0)), None);
        assert_eq!(value, Value::from("#FF8000C0"));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = from_yaml("test", AttributeKind::Int, &Value::from("three")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = from_yaml("test", AttributeKind::Int2, &Value::from(vec![1, 2, 3])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        let err = from_yaml("test", AttributeKind::Color, &Value::from("#12")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadStructure);
    }

    #[test]
    fn test_float_precision() {
        let value = to_yaml(&AttributeValue::Float(1.23456), Some(2));
        assert_eq!(value.as_f64(), Some(1.23));
    }
}
