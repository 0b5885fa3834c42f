//! Layers and the objects they hold.

use glam::Vec2;

use super::meta::Metadata;
use super::tiles::TileMatrix;

pub type LayerId = u32;
pub type ObjectId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectKind {
    Point,
    #[default]
    Rect,
    Ellipse,
}

/// A point, rectangle or ellipse placed on an object layer or a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Vec2,
    pub size: Vec2,
    /// Free-text tag, empty when absent.
    pub tag: String,
    pub visible: bool,
    pub meta: Metadata,
}

impl Object {
    pub fn new(id: ObjectId, kind: ObjectKind) -> Self {
        Self {
            id,
            kind,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            tag: String::new(),
            visible: true,
            meta: Metadata::default(),
        }
    }
}

/// Discriminant of [`LayerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Object,
    Group,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Tile(TileMatrix),
    Object(Vec<Object>),
    /// Child layers, owned by value.
    Group(Vec<Layer>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub opacity: f32,
    pub visible: bool,
    pub meta: Metadata,
    pub kind: LayerKind,
}

impl Layer {
    fn with_kind(id: LayerId, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id,
            opacity: 1.0,
            visible: true,
            meta: Metadata::named(name),
            kind,
        }
    }

    pub fn tile(id: LayerId, name: impl Into<String>, tiles: TileMatrix) -> Self {
        Self::with_kind(id, name, LayerKind::Tile(tiles))
    }

    pub fn object(id: LayerId, name: impl Into<String>, objects: Vec<Object>) -> Self {
        Self::with_kind(id, name, LayerKind::Object(objects))
    }

    pub fn group(id: LayerId, name: impl Into<String>, children: Vec<Layer>) -> Self {
        Self::with_kind(id, name, LayerKind::Group(children))
    }

    pub fn layer_type(&self) -> LayerType {
        match self.kind {
            LayerKind::Tile(_) => LayerType::Tile,
            LayerKind::Object(_) => LayerType::Object,
            LayerKind::Group(_) => LayerType::Group,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn tiles(&self) -> Option<&TileMatrix> {
        match &self.kind {
            LayerKind::Tile(tiles) => Some(tiles),
            _ => None,
        }
    }

    /// Objects of an object layer; empty for the other kinds.
    pub fn objects(&self) -> &[Object] {
        match &self.kind {
            LayerKind::Object(objects) => objects,
            _ => &[],
        }
    }

    /// Children of a group layer; empty for the other kinds.
    pub fn children(&self) -> &[Layer] {
        match &self.kind {
            LayerKind::Group(children) => children,
            _ => &[],
        }
    }
}
