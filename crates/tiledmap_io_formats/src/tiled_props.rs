//! Property type mapping for the Tiled formats (TMJ and TMX).
//!
//! Tiled has no vector types, so vectors are written as `string` properties holding
//! `x;y[;z[;w]]` and load back as strings.

use std::path::PathBuf;

use tiledmap_io_core::attribute::{AttributeKind, AttributeValue};
use tiledmap_io_core::color::Color;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{Orientation, TileCompression};

use crate::common::{format_float, path_to_string};

/// Document format version written into TMJ and TMX files.
pub(crate) const FORMAT_VERSION: &str = "1.7";

/// Tiled release whose output the emitters reproduce.
pub(crate) const TILED_VERSION: &str = "1.9.0";

pub(crate) fn parse_orientation(name: &str) -> Result<Orientation> {
    match name {
        "staggered" => Err(FormatError::UnsupportedFeature(
            "staggered orientation".to_string(),
        )),
        name => Orientation::from_name(name).ok_or_else(|| {
            FormatError::bad_structure("map", format!("unknown orientation '{name}'"))
        }),
    }
}

/// Parses the `compression` of a tile layer. Tiled's `gzip` is not supported.
pub(crate) fn parse_compression(context: &str, name: &str) -> Result<TileCompression> {
    match name {
        "gzip" => Err(FormatError::UnsupportedFeature(
            "gzip tile layer compression".to_string(),
        )),
        name => TileCompression::from_name(name).ok_or_else(|| {
            FormatError::bad_structure(context, format!("unknown compression '{name}'"))
        }),
    }
}

/// The Tiled `type` of a property holding `value`.
pub(crate) fn tiled_type(value: &AttributeValue) -> &'static str {
    match value.kind() {
        AttributeKind::Int => "int",
        AttributeKind::Float => "float",
        AttributeKind::Bool => "bool",
        AttributeKind::Path => "file",
        AttributeKind::Color => "color",
        AttributeKind::Object => "object",
        _ => "string",
    }
}

/// The textual form of `value`, as stored in TMX `value` attributes.
pub(crate) fn tiled_text(value: &AttributeValue, precision: Option<usize>) -> String {
    match value {
        AttributeValue::String(text) => text.clone(),
        AttributeValue::Int(number) => number.to_string(),
        AttributeValue::Float(number) => format_float(*number, precision),
        AttributeValue::Bool(flag) => flag.to_string(),
        AttributeValue::Path(path) => path_to_string(path),
        AttributeValue::Color(color) => color.to_argb_hex(),
        AttributeValue::Object(id) => id.to_string(),
        vector => vector.vector_to_string().unwrap_or_default(),
    }
}

/// Parses a property given as text. Returns `Ok(None)` for types that are not mapped,
/// such as Tiled's `class` properties.
pub(crate) fn parse_tiled_text(
    context: &str,
    type_name: &str,
    text: &str,
) -> Result<Option<AttributeValue>> {
    let invalid =
        || FormatError::bad_structure(context, format!("invalid {type_name} value '{text}'"));
    let value = match type_name {
        "string" => AttributeValue::String(text.to_string()),
        "int" => AttributeValue::Int(text.trim().parse().map_err(|_| invalid())?),
        "float" => AttributeValue::Float(text.trim().parse().map_err(|_| invalid())?),
        "bool" => AttributeValue::Bool(match text.trim() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(invalid()),
        }),
        "file" => AttributeValue::Path(PathBuf::from(text)),
        "color" if text.is_empty() => AttributeValue::default_for(AttributeKind::Color),
        "color" => AttributeValue::Color(Color::from_argb_hex(text).ok_or_else(invalid)?),
        "object" => AttributeValue::Object(text.trim().parse().map_err(|_| invalid())?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use glam::{IVec2, Vec3};

    use super::*;

    #[test]
    fn test_vectors_become_strings() {
        let value = AttributeValue::Int2(IVec2::new(3, -4));
        assert_eq!(tiled_type(&value), "string");
        assert_eq!(tiled_text(&value, None), "3;-4");

        let value = AttributeValue::Float3(Vec3::new(0.5, 1.0, 2.25));
        assert_eq!(tiled_text(&value, None), "0.5;1;2.25");
    }

    #[test]
    fn test_color_uses_argb() {
        let value = AttributeValue::Color(Color::rgba(0x11, 0x22, 0x33, 0x80));
        assert_eq!(tiled_type(&value), "color");
        assert_eq!(tiled_text(&value, None), "#80112233");

        let parsed = parse_tiled_text("property", "color", "#80112233").unwrap();
        assert_eq!(parsed, Some(value));
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(
            parse_tiled_text("p", "int", "42").unwrap(),
            Some(AttributeValue::Int(42))
        );
        assert_eq!(
            parse_tiled_text("p", "bool", "false").unwrap(),
            Some(AttributeValue::Bool(false))
        );
        assert_eq!(
            parse_tiled_text("p", "file", "a/b.png").unwrap(),
            Some(AttributeValue::Path(PathBuf::from("a/b.png")))
        );
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        let err = parse_tiled_text("p", "int", "four").unwrap_err();
        assert!(matches!(err, FormatError::BadStructure { .. }));
    }

    #[test]
    fn test_staggered_orientation_is_unsupported() {
        assert_eq!(parse_orientation("isometric").unwrap(), Orientation::Isometric);
        assert!(matches!(
            parse_orientation("staggered"),
            Err(FormatError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            parse_orientation("round"),
            Err(FormatError::BadStructure { .. })
        ));
    }

    #[test]
    fn test_unmapped_types_are_skipped() {
        assert_eq!(parse_tiled_text("p", "class", "").unwrap(), None);
    }
}
