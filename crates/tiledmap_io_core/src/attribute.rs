//! Typed attribute values used for properties and component slots.
//!
//! An [`AttributeValue`] always holds a payload matching its [`AttributeKind`]. Changing
//! the kind of an attribute goes through [`AttributeValue::reset_to`], which replaces the
//! payload with the default for the new kind rather than converting the old one.
//!
//! # Example
//!
//! ```
//! use tiledmap_io_core::attribute::{AttributeKind, AttributeValue};
//!
//! let mut value = AttributeValue::from("door");
//! assert_eq!(value.kind(), AttributeKind::String);
//!
//! // Assigning an int to a string attribute is rejected...
//! assert!(value.set(AttributeValue::Int(3)).is_err());
//!
//! // ...until the kind is switched, which resets the payload.
//! value.reset_to(AttributeKind::Int);
//! assert_eq!(value, AttributeValue::Int(0));
//! value.set(AttributeValue::Int(3)).unwrap();
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use glam::{IVec2, IVec3, IVec4, Vec2, Vec3, Vec4};

use crate::color::Color;
use crate::error::TypeMismatch;

/// Identifier of an object referenced from an attribute.
pub type ObjectRef = i32;

/// The closed set of attribute kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    String,
    Int,
    Int2,
    Int3,
    Int4,
    Float,
    Float2,
    Float3,
    Float4,
    Bool,
    Path,
    Color,
    Object,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 13] = [
        AttributeKind::String,
        AttributeKind::Int,
        AttributeKind::Int2,
        AttributeKind::Int3,
        AttributeKind::Int4,
        AttributeKind::Float,
        AttributeKind::Float2,
        AttributeKind::Float3,
        AttributeKind::Float4,
        AttributeKind::Bool,
        AttributeKind::Path,
        AttributeKind::Color,
        AttributeKind::Object,
    ];

    /// Canonical lowercase name, as written by the YAML format.
    pub fn name(self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Int => "int",
            AttributeKind::Int2 => "int2",
            AttributeKind::Int3 => "int3",
            AttributeKind::Int4 => "int4",
            AttributeKind::Float => "float",
            AttributeKind::Float2 => "float2",
            AttributeKind::Float3 => "float3",
            AttributeKind::Float4 => "float4",
            AttributeKind::Bool => "bool",
            AttributeKind::Path => "file",
            AttributeKind::Color => "color",
            AttributeKind::Object => "object",
        }
    }

    /// Inverse of [`AttributeKind::name`]. `"path"` is accepted as an alias of `"file"`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "path" {
            return Some(AttributeKind::Path);
        }
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Number of components for vector kinds, `None` for everything else.
    pub fn vector_len(self) -> Option<usize> {
        match self {
            AttributeKind::Int2 | AttributeKind::Float2 => Some(2),
            AttributeKind::Int3 | AttributeKind::Float3 => Some(3),
            AttributeKind::Int4 | AttributeKind::Float4 => Some(4),
            _ => None,
        }
    }

    pub fn is_vector(self) -> bool {
        self.vector_len().is_some()
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged attribute payload.
///
/// Equality is structural: two values are equal only if they have the same kind and
/// the same payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Int(i32),
    Int2(IVec2),
    Int3(IVec3),
    Int4(IVec4),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Bool(bool),
    Path(PathBuf),
    Color(Color),
    Object(ObjectRef),
}

impl Default for AttributeValue {
    fn default() -> Self {
        AttributeValue::String(String::new())
    }
}

impl AttributeValue {
    /// The default value of `kind`: empty strings and paths, zeroes, `false`, and
    /// opaque black for colors.
    pub fn default_for(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::String => AttributeValue::String(String::new()),
            AttributeKind::Int => AttributeValue::Int(0),
            AttributeKind::Int2 => AttributeValue::Int2(IVec2::ZERO),
            AttributeKind::Int3 => AttributeValue::Int3(IVec3::ZERO),
            AttributeKind::Int4 => AttributeValue::Int4(IVec4::ZERO),
            AttributeKind::Float => AttributeValue::Float(0.0),
            AttributeKind::Float2 => AttributeValue::Float2(Vec2::ZERO),
            AttributeKind::Float3 => AttributeValue::Float3(Vec3::ZERO),
            AttributeKind::Float4 => AttributeValue::Float4(Vec4::ZERO),
            AttributeKind::Bool => AttributeValue::Bool(false),
            AttributeKind::Path => AttributeValue::Path(PathBuf::new()),
            AttributeKind::Color => AttributeValue::Color(Color::BLACK),
            AttributeKind::Object => AttributeValue::Object(0),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::String(_) => AttributeKind::String,
            AttributeValue::Int(_) => AttributeKind::Int,
            AttributeValue::Int2(_) => AttributeKind::Int2,
            AttributeValue::Int3(_) => AttributeKind::Int3,
            AttributeValue::Int4(_) => AttributeKind::Int4,
            AttributeValue::Float(_) => AttributeKind::Float,
            AttributeValue::Float2(_) => AttributeKind::Float2,
            AttributeValue::Float3(_) => AttributeKind::Float3,
            AttributeValue::Float4(_) => AttributeKind::Float4,
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::Path(_) => AttributeKind::Path,
            AttributeValue::Color(_) => AttributeKind::Color,
            AttributeValue::Object(_) => AttributeKind::Object,
        }
    }

    /// Switches the kind of this attribute, resetting the payload to the kind default.
    ///
    /// Resetting to the current kind also clears the payload.
    pub fn reset_to(&mut self, kind: AttributeKind) {
        *self = Self::default_for(kind);
    }

    /// Replaces the payload, which must have the same kind as the current one.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] if `value` has a different kind. The attribute is left
    /// unchanged in that case.
    pub fn set(&mut self, value: AttributeValue) -> Result<(), TypeMismatch> {
        if value.kind() != self.kind() {
            return Err(TypeMismatch {
                expected: self.kind(),
                found: value.kind(),
            });
        }
        *self = value;
        Ok(())
    }

    /// Returns `true` if this value equals the default of its kind.
    pub fn has_default_value(&self) -> bool {
        *self == Self::default_for(self.kind())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            AttributeValue::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttributeValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            AttributeValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Components of an int vector, widened to four lanes (unused lanes are zero).
    pub fn as_int_vector(&self) -> Option<IVec4> {
        match self {
            AttributeValue::Int2(v) => Some(v.extend(0).extend(0)),
            AttributeValue::Int3(v) => Some(v.extend(0)),
            AttributeValue::Int4(v) => Some(*v),
            _ => None,
        }
    }

    /// Components of a float vector, widened to four lanes (unused lanes are zero).
    pub fn as_float_vector(&self) -> Option<Vec4> {
        match self {
            AttributeValue::Float2(v) => Some(v.extend(0.0).extend(0.0)),
            AttributeValue::Float3(v) => Some(v.extend(0.0)),
            AttributeValue::Float4(v) => Some(*v),
            _ => None,
        }
    }

    /// Builds an int vector of the given kind from its components.
    ///
    /// Returns `None` if `kind` is not an int vector kind or the component count is wrong.
    pub fn int_vector(kind: AttributeKind, components: &[i32]) -> Option<Self> {
        match (kind, components) {
            (AttributeKind::Int2, [x, y]) => Some(AttributeValue::Int2(IVec2::new(*x, *y))),
            (AttributeKind::Int3, [x, y, z]) => {
                Some(AttributeValue::Int3(IVec3::new(*x, *y, *z)))
            }
            (AttributeKind::Int4, [x, y, z, w]) => {
                Some(AttributeValue::Int4(IVec4::new(*x, *y, *z, *w)))
            }
            _ => None,
        }
    }

    /// Builds a float vector of the given kind from its components.
    pub fn float_vector(kind: AttributeKind, components: &[f32]) -> Option<Self> {
        match (kind, components) {
            (AttributeKind::Float2, [x, y]) => Some(AttributeValue::Float2(Vec2::new(*x, *y))),
            (AttributeKind::Float3, [x, y, z]) => {
                Some(AttributeValue::Float3(Vec3::new(*x, *y, *z)))
            }
            (AttributeKind::Float4, [x, y, z, w]) => {
                Some(AttributeValue::Float4(Vec4::new(*x, *y, *z, *w)))
            }
            _ => None,
        }
    }

    /// Vector components joined with `;`, as used by formats without vector types.
    ///
    /// Returns `None` for non-vector kinds.
    pub fn vector_to_string(&self) -> Option<String> {
        let len = self.kind().vector_len()?;
        let parts: Vec<String> = if let Some(v) = self.as_int_vector() {
            v.to_array()[..len].iter().map(ToString::to_string).collect()
        } else {
            let v = self.as_float_vector()?;
            v.to_array()[..len].iter().map(ToString::to_string).collect()
        };
        Some(parts.join(";"))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f32> for AttributeValue {
    fn from(value: f32) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<Color> for AttributeValue {
    fn from(value: Color) -> Self {
        AttributeValue::Color(value)
    }
}

impl From<PathBuf> for AttributeValue {
    fn from(value: PathBuf) -> Self {
        AttributeValue::Path(value)
    }
}
