//! The root IR node.

use std::collections::HashSet;

use glam::UVec2;
use tracing::warn;

use super::layer::{Layer, LayerId, LayerKind, ObjectId};
use super::meta::{Component, Metadata};
use super::tiles::{Extent, TileId};
use super::tileset::TilesetRef;
use crate::error::{FormatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Hexagonal,
}

impl Orientation {
    pub fn name(self) -> &'static str {
        match self {
            Orientation::Orthogonal => "orthogonal",
            Orientation::Isometric => "isometric",
            Orientation::Hexagonal => "hexagonal",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "orthogonal" => Some(Orientation::Orthogonal),
            "isometric" => Some(Orientation::Isometric),
            "hexagonal" => Some(Orientation::Hexagonal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileEncoding {
    #[default]
    PlainText,
    Base64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileCompression {
    #[default]
    None,
    Zlib,
    Zstd,
}

impl TileCompression {
    /// Name used in the `compression` attribute of Tiled formats.
    pub fn name(self) -> Option<&'static str> {
        match self {
            TileCompression::None => None,
            TileCompression::Zlib => Some("zlib"),
            TileCompression::Zstd => Some("zstd"),
        }
    }

    /// Parses a compression name. The empty string means no compression.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "" | "none" => Some(TileCompression::None),
            "zlib" => Some(TileCompression::Zlib),
            "zstd" => Some(TileCompression::Zstd),
            _ => None,
        }
    }
}

/// How tile layer grids are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileFormat {
    pub encoding: TileEncoding,
    pub compression: TileCompression,
    pub compression_level: Option<i32>,
}

impl TileFormat {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn base64(compression: TileCompression) -> Self {
        Self {
            encoding: TileEncoding::Base64,
            compression,
            compression_level: None,
        }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }
}

/// A complete map snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub meta: Metadata,
    pub orientation: Orientation,
    pub extent: Extent,
    pub tile_size: UVec2,
    pub tile_format: TileFormat,
    /// Component prototypes available to every node of the map.
    pub components: Vec<Component>,
    pub tilesets: Vec<TilesetRef>,
    pub layers: Vec<Layer>,
    pub next_layer_id: LayerId,
    pub next_object_id: ObjectId,
}

impl Default for Map {
    fn default() -> Self {
        Self::new(Extent::default(), UVec2::new(32, 32))
    }
}

impl Map {
    pub fn new(extent: Extent, tile_size: UVec2) -> Self {
        Self {
            meta: Metadata::default(),
            orientation: Orientation::Orthogonal,
            extent,
            tile_size,
            tile_format: TileFormat::default(),
            components: Vec::new(),
            tilesets: Vec::new(),
            layers: Vec::new(),
            next_layer_id: 1,
            next_object_id: 1,
        }
    }

    /// All layers in depth-first order, parents before their children.
    pub fn layers_depth_first(&self) -> impl Iterator<Item = &Layer> {
        let mut stack: Vec<&Layer> = self.layers.iter().rev().collect();
        std::iter::from_fn(move || {
            let layer = stack.pop()?;
            stack.extend(layer.children().iter().rev());
            Some(layer)
        })
    }

    pub fn find_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers_depth_first().find(|layer| layer.id == id)
    }

    /// The tileset that owns a global tile id.
    pub fn find_tileset(&self, id: TileId) -> Option<&TilesetRef> {
        self.tilesets.iter().find(|tileset| tileset.contains(id))
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Raises the id counters above every layer and object id in use.
    ///
    /// Parsers call this so that a missing or stale `next*id` never hands out an id
    /// that already exists.
    pub fn ensure_next_ids(&mut self) {
        let mut next_layer = self.next_layer_id.max(1);
        let mut next_object = self.next_object_id.max(1);
        for layer in self.layers_depth_first() {
            next_layer = next_layer.max(layer.id.saturating_add(1));
            for object in layer.objects() {
                next_object = next_object.max(object.id.saturating_add(1));
            }
        }
        for tile in self.tilesets.iter().flat_map(|t| &t.tileset.tiles) {
            for object in &tile.objects {
                next_object = next_object.max(object.id.saturating_add(1));
            }
        }
        self.next_layer_id = next_layer;
        self.next_object_id = next_object;
    }

    /// Checks the identity invariants: layer ids are unique across the whole map and
    /// object ids are unique within their layer.
    pub fn validate(&self) -> Result<()> {
        let mut layer_ids = HashSet::new();
        for layer in self.layers_depth_first() {
            if !layer_ids.insert(layer.id) {
                return Err(FormatError::bad_structure(
                    "map",
                    format!("duplicate layer id {}", layer.id),
                ));
            }
            let mut object_ids = HashSet::new();
            for object in layer.objects() {
                if !object_ids.insert(object.id) {
                    return Err(FormatError::bad_structure(
                        format!("layer {}", layer.id),
                        format!("duplicate object id {}", object.id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Visits the metadata of every node: map, tilesets, tiles, tile objects, layers
    /// and layer objects.
    pub fn for_each_meta_mut(&mut self, f: &mut impl FnMut(&mut Metadata)) {
        f(&mut self.meta);
        for tileset in &mut self.tilesets {
            f(&mut tileset.tileset.meta);
            for tile in &mut tileset.tileset.tiles {
                f(&mut tile.meta);
                for object in &mut tile.objects {
                    f(&mut object.meta);
                }
            }
        }
        fn visit_layers(layers: &mut [Layer], f: &mut impl FnMut(&mut Metadata)) {
            for layer in layers {
                f(&mut layer.meta);
                match &mut layer.kind {
                    LayerKind::Tile(_) => {}
                    LayerKind::Object(objects) => {
                        for object in objects {
                            f(&mut object.meta);
                        }
                    }
                    LayerKind::Group(children) => visit_layers(children, &mut *f),
                }
            }
        }
        visit_layers(&mut self.layers, f);
    }

    /// Aligns every attached component to its prototype and removes attachments
    /// whose prototype no longer exists.
    ///
    /// Returns the number of removed attachments. Removal loses their values.
    pub fn reconcile_components(&mut self) -> usize {
        let prototypes = std::mem::take(&mut self.components);
        let mut removed = 0;
        self.for_each_meta_mut(&mut |meta| {
            let Metadata {
                name, components, ..
            } = meta;
            components.retain_mut(|attached| {
                match prototypes.iter().find(|p| p.name == attached.prototype) {
                    Some(prototype) => {
                        attached.align_to(prototype);
                        true
                    }
                    None => {
                        warn!(
                            "Dropping component '{}' on '{}': no such prototype",
                            attached.prototype, name
                        );
                        removed += 1;
                        false
                    }
                }
            });
        });
        self.components = prototypes;
        removed
    }
}
