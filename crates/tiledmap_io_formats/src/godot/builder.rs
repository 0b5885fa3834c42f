//! Builds Godot scene data while walking a document.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use glam::{UVec2, Vec2};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    Component, EMPTY_TILE, LayerId, LayerType, ObjectKind, Orientation, TileId,
};
use tiledmap_io_view::{
    DocumentNode, DocumentVisitor, LayerView, MapView, MetaView, ObjectParent, ObjectView,
    TileView, TilesetView,
};
use tracing::{debug, warn};

use super::scene::{
    Animation, ExtResource, Node, ResourceId, Scene, SubResource, TilesetEntry, TilesetResource,
    quoted,
};
use crate::common::{format_float, path_to_string};
use crate::format::WriteOptions;

/// Godot packs two signed 16-bit coordinates into one int.
const COORDINATE_STRIDE: i64 = 65_536;

/// First coordinate the packing cannot hold.
const COORDINATE_LIMIT: u32 = 1 << 15;

pub(crate) const TILESET_FILE: &str = "tileset.tres";

struct TilesetInfo {
    first_tile: TileId,
    tile_count: u32,
    column_count: u32,
    tile_size: UVec2,
    texture_path: String,
}

impl TilesetInfo {
    fn contains(&self, id: TileId) -> bool {
        id >= self.first_tile && id - self.first_tile < self.tile_count
    }

    /// Atlas cell of a tile index, as a column and a row.
    fn cell(&self, index: u32) -> (u32, u32) {
        match self.column_count {
            0 => (index, 0),
            columns => (index % columns, index / columns),
        }
    }
}

/// Collects a `.tscn` scene and its `tileset.tres` resource.
///
/// Node order follows the traversal, which always reaches a parent before its children.
pub(crate) struct SceneBuilder<'a> {
    options: &'a WriteOptions,
    prototypes: Vec<Component>,
    cell_size: UVec2,
    scene: Scene,
    tileset: TilesetResource,
    tilesets: Vec<TilesetInfo>,
    animations: Vec<Animation>,
    /// Animated tiles, by global id.
    animated: HashSet<TileId>,
    sprite_frames: Option<ResourceId>,
    animations_sealed: bool,
    layer_paths: HashMap<LayerId, String>,
    used_paths: HashSet<String>,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(options: &'a WriteOptions) -> Self {
        Self {
            options,
            prototypes: Vec::new(),
            cell_size: UVec2::ONE,
            scene: Scene::default(),
            tileset: TilesetResource::default(),
            tilesets: Vec::new(),
            animations: Vec::new(),
            animated: HashSet::new(),
            sprite_frames: None,
            animations_sealed: false,
            layer_paths: HashMap::new(),
            used_paths: HashSet::new(),
        }
    }

    pub fn finish(mut self) -> (Scene, TilesetResource) {
        self.seal_animations();
        (self.scene, self.tileset)
    }

    fn real(&self, value: f32) -> String {
        godot_real(value, self.options.float_precision)
    }

    fn vector2(&self, value: Vec2) -> String {
        format!(
            "Vector2( {}, {} )",
            format_float(value.x, self.options.float_precision),
            format_float(value.y, self.options.float_precision)
        )
    }

    fn visit_map(&mut self, map: &dyn MapView) -> Result<()> {
        if map.orientation() != Orientation::Orthogonal {
            return Err(FormatError::UnsupportedFeature(format!(
                "{} maps in Godot scenes",
                map.orientation().name()
            )));
        }
        self.prototypes = map.component_definitions();
        self.cell_size = map.tile_size();
        self.scene.add_ext_resource(ExtResource {
            path: format!("res://{TILESET_FILE}"),
            kind: "TileSet",
        });

        let mut root = Node::new("Root", "Node2D", None);
        self.add_meta(&mut root, map.meta());
        self.scene.nodes.push(root);
        Ok(())
    }

    fn visit_tileset(&mut self, tileset: &dyn TilesetView) -> Result<()> {
        let texture_path = format!("res://{}", path_to_string(tileset.image_path()));
        self.tileset.textures.push(ExtResource {
            path: texture_path.clone(),
            kind: "Texture",
        });
        self.tileset.entries.push(TilesetEntry {
            name: escape_name(tileset.meta().name()),
            texture: self.tileset.textures.len(),
            image_size: tileset.image_size(),
            tile_size: tileset.tile_size(),
        });
        self.tilesets.push(TilesetInfo {
            first_tile: tileset.first_tile(),
            tile_count: tileset.tile_count(),
            column_count: tileset.column_count(),
            tile_size: tileset.tile_size(),
            texture_path,
        });
        Ok(())
    }

    fn visit_tile(&mut self, tile: &dyn TileView) -> Result<()> {
        if tile.frame_count() == 0 {
            return Ok(());
        }
        let first_tile = tile.tileset_first_tile();
        let Some(info) = self.tilesets.iter().find(|t| t.first_tile == first_tile) else {
            return Err(FormatError::bad_structure(
                format!("tile {}", tile.index()),
                "the owning tileset was not visited",
            ));
        };

        let texture = self.scene.add_ext_resource(ExtResource {
            path: info.texture_path.clone(),
            kind: "Texture",
        });
        let size = info.tile_size;
        let context = || format!("tile {} of tileset '{}'", tile.index(), info.texture_path);
        let mut frames = Vec::with_capacity(tile.frame_count());
        let mut first_duration = None;
        for frame in (0..tile.frame_count()).filter_map(|index| tile.frame(index)) {
            if frame.tile_index >= info.tile_count {
                return Err(FormatError::bad_structure(
                    context(),
                    format!(
                        "animation frame {} is outside the tileset's {} tiles",
                        frame.tile_index, info.tile_count
                    ),
                ));
            }
            let (col, row) = info.cell(frame.tile_index);
            let (Some(x), Some(y)) = (col.checked_mul(size.x), row.checked_mul(size.y)) else {
                return Err(FormatError::bad_structure(
                    context(),
                    format!("atlas region of frame {} is out of range", frame.tile_index),
                ));
            };
            first_duration.get_or_insert(frame.duration_ms());
            frames.push(SubResource::AtlasTexture {
                atlas: texture,
                region: [x, y, size.x, size.y],
            });
        }
        let id = first_tile.checked_add(tile.index()).ok_or_else(|| {
            FormatError::bad_structure(context(), "the global tile id is out of range")
        })?;

        // Godot 3 plays every frame at one speed, taken from the first frame.
        let speed = self.real(1000.0 / first_duration.unwrap_or(1).max(1) as f32);
        let frames = frames
            .into_iter()
            .map(|frame| self.scene.add_sub_resource(frame))
            .collect();
        self.animations.push(Animation {
            name: format!("Tile {id}"),
            speed,
            frames,
        });
        self.animated.insert(id);
        Ok(())
    }

    /// Adds the `SpriteFrames` resource once every atlas texture it refers to exists.
    fn seal_animations(&mut self) {
        if self.animations_sealed {
            return;
        }
        self.animations_sealed = true;
        if !self.animations.is_empty() {
            let animations = std::mem::take(&mut self.animations);
            self.sprite_frames = Some(
                self.scene
                    .add_sub_resource(SubResource::SpriteFrames(animations)),
            );
        }
    }

    fn visit_layer(&mut self, layer: &dyn LayerView) -> Result<()> {
        self.seal_animations();

        let parent = match layer.parent_id() {
            None => ".".to_string(),
            Some(parent) => self.layer_paths.get(&parent).cloned().ok_or_else(|| {
                FormatError::bad_structure(
                    format!("layer {}", layer.id()),
                    format!("parent layer {parent} was not visited"),
                )
            })?,
        };
        let name = match escape_name(layer.meta().name()) {
            name if name.is_empty() => format!("Layer {}", layer.id()),
            name => name,
        };
        let mut node = match layer.layer_type() {
            LayerType::Tile => Node::new(name, "TileMap", Some(parent)),
            LayerType::Object | LayerType::Group => Node::new(name, "Node2D", Some(parent)),
        };
        if self.used_paths.contains(&node.path()) {
            node.name = format!("{} {}", node.name, layer.id());
        }
        self.used_paths.insert(node.path());
        self.layer_paths.insert(layer.id(), node.path());

        let mut animated_cells = Vec::new();
        if layer.layer_type() == LayerType::Tile {
            node.field("tile_set", "ExtResource( 1 )");
            node.field("format", "1");
            node.field("cell_size", self.vector2(self.cell_size.as_vec2()));
            let (data, animated) = self.tile_data(layer)?;
            node.field("tile_data", format!("PoolIntArray( {} )", data.join(", ")));
            animated_cells = animated;
        }
        if layer.opacity() != 1.0 {
            node.field(
                "modulate",
                format!("Color( 1, 1, 1, {} )", self.real(layer.opacity())),
            );
        }
        if !layer.is_visible() {
            node.field("visible", "false");
        }
        self.add_meta(&mut node, layer.meta());

        let layer_path = node.path();
        self.scene.nodes.push(node);
        for (row, col, id) in animated_cells {
            self.add_animated_sprite(&layer_path, row, col, id);
        }
        Ok(())
    }

    /// `tile_data` triples for every non-empty cell, and the animated cells.
    fn tile_data(&self, layer: &dyn LayerView) -> Result<(Vec<String>, Vec<(usize, usize, TileId)>)> {
        let mut data = Vec::new();
        let mut animated = Vec::new();
        let Some(extent) = layer.extent() else {
            return Ok((data, animated));
        };
        let limit = COORDINATE_LIMIT as usize;
        if extent.rows > limit || extent.cols > limit {
            return Err(FormatError::UnsupportedFeature(format!(
                "{}x{} tile layers in Godot scenes, which hold at most {limit}x{limit} cells",
                extent.cols, extent.rows
            )));
        }
        for row in 0..extent.rows {
            for col in 0..extent.cols {
                let Some(id) = layer.tile_at(row, col).filter(|id| *id != EMPTY_TILE) else {
                    continue;
                };
                let Some((index, info)) = self
                    .tilesets
                    .iter()
                    .enumerate()
                    .find(|(_, info)| info.contains(id))
                else {
                    return Err(FormatError::bad_structure(
                        format!("layer {}", layer.id()),
                        format!("tile {id} belongs to no tileset"),
                    ));
                };
                let (atlas_col, atlas_row) = info.cell(id - info.first_tile);
                let Some(coordinate) = pack_coordinates(atlas_col, atlas_row) else {
                    return Err(FormatError::UnsupportedFeature(format!(
                        "tile {id} at atlas cell ({atlas_col}, {atlas_row}) in Godot scenes"
                    )));
                };
                let Some(position) = pack_coordinates(col as u32, row as u32) else {
                    return Err(FormatError::bad_structure(
                        format!("layer {}", layer.id()),
                        format!("cell ({col}, {row}) is out of range"),
                    ));
                };
                data.push(format!("{position}, {}, {coordinate}", index + 1));
                if self.animated.contains(&id) {
                    animated.push((row, col, id));
                }
            }
        }
        Ok((data, animated))
    }

    fn add_animated_sprite(&mut self, layer_path: &str, row: usize, col: usize, id: TileId) {
        let Some(frames) = self.sprite_frames else {
            return;
        };
        let position = Vec2::new(col as f32, row as f32) * self.cell_size.as_vec2();

        let mut node = Node::new(
            format!("Tile ({row}, {col})"),
            "AnimatedSprite",
            Some(layer_path.to_string()),
        );
        node.field("position", self.vector2(position))
            .field("frames", format!("SubResource( {frames} )"))
            .field("speed_scale", "1.0")
            .field("animation", quoted(&format!("Tile {id}")))
            .field("playing", "true")
            .field("centered", "false");
        self.scene.nodes.push(node);
    }

    fn visit_object(&mut self, object: &dyn ObjectView) -> Result<()> {
        let layer = match object.parent() {
            ObjectParent::Layer(layer) => layer,
            ObjectParent::Tile { index, .. } => {
                warn!(
                    "Skipping object {} of tile {index}: Godot scenes only hold layer objects",
                    object.id()
                );
                return Ok(());
            }
        };
        let Some(parent) = self.layer_paths.get(&layer).cloned() else {
            return Err(FormatError::bad_structure(
                format!("object {}", object.id()),
                format!("layer {layer} was not visited"),
            ));
        };

        let name = match escape_name(object.meta().name()) {
            name if name.is_empty() => format!("Object {}", object.id()),
            name => format!("Object {} ('{name}')", object.id()),
        };
        let center = object.position() + object.size() * 0.5;
        let mut node = match object.kind() {
            ObjectKind::Point => {
                let mut node = Node::new(name, "Node2D", Some(parent));
                node.field("position", self.vector2(object.position()));
                node
            }
            ObjectKind::Rect | ObjectKind::Ellipse => {
                let mut node = Node::new(name, "Area2D", Some(parent));
                node.field("position", self.vector2(center));
                node
            }
        };
        if !object.is_visible() {
            node.field("visible", "false");
        }
        self.add_meta(&mut node, object.meta());
        let shape_parent = Some(node.path());
        self.scene.nodes.push(node);

        match object.kind() {
            ObjectKind::Point => {}
            ObjectKind::Rect => {
                let extents = self.vector2(object.size() * 0.5);
                let shape = self
                    .scene
                    .add_sub_resource(SubResource::RectangleShape { extents });
                let mut node = Node::new("Shape", "CollisionShape2D", shape_parent);
                node.field("shape", format!("SubResource( {shape} )"));
                self.scene.nodes.push(node);
            }
            ObjectKind::Ellipse => {
                let count = self.options.ellipse_point_count.max(3);
                warn!(
                    "Approximating ellipse object {} with a {count}-point polygon",
                    object.id()
                );
                let points: Vec<String> = ellipse_points(object.size() * 0.5, count)
                    .into_iter()
                    .map(|point| {
                        format!(
                            "{}, {}",
                            format_float(point.x, self.options.float_precision),
                            format_float(point.y, self.options.float_precision)
                        )
                    })
                    .collect();
                let mut node = Node::new("Shape", "CollisionPolygon2D", shape_parent);
                node.field("polygon", format!("PoolVector2Array( {} )", points.join(", ")));
                self.scene.nodes.push(node);
            }
        }
        Ok(())
    }

    /// Writes properties and components to `__meta__`. Nothing is written for empty
    /// metadata.
    fn add_meta(&self, node: &mut Node, meta: &dyn MetaView) {
        let properties: Vec<String> = (0..meta.property_count())
            .filter_map(|index| meta.property(index))
            .map(|(name, value)| format!("{}: {}", quoted(name), self.variant(value)))
            .collect();

        let mut components = Vec::new();
        for mut component in (0..meta.component_count()).filter_map(|index| meta.component(index))
        {
            let Some(prototype) = self
                .prototypes
                .iter()
                .find(|p| p.name == component.prototype)
            else {
                warn!(
                    "Dropping component '{}' on '{}': no such prototype",
                    component.prototype,
                    meta.name()
                );
                continue;
            };
            component.align_to(prototype);
            let values: Vec<String> = component
                .values
                .iter()
                .map(|attr| format!("{}: {}", quoted(&attr.name), self.variant(&attr.value)))
                .collect();
            components.push(format!(
                "{}: {{ {} }}",
                quoted(&component.prototype),
                values.join(", ")
            ));
        }

        let mut sections = Vec::new();
        if !properties.is_empty() {
            sections.push(format!("\"properties\": {{ {} }}", properties.join(", ")));
        }
        if !components.is_empty() {
            sections.push(format!("\"components\": {{ {} }}", components.join(", ")));
        }
        if !sections.is_empty() {
            node.field("__meta__", format!("{{ {} }}", sections.join(", ")));
        }
    }

    /// An attribute as a Godot variant literal.
    fn variant(&self, value: &AttributeValue) -> String {
        let real = |v: f32| self.real(v);
        match value {
            AttributeValue::String(text) => quoted(text),
            AttributeValue::Int(v) | AttributeValue::Object(v) => v.to_string(),
            AttributeValue::Int2(v) => format!("Vector2( {}, {} )", v.x, v.y),
            AttributeValue::Int3(v) => format!("Vector3( {}, {}, {} )", v.x, v.y, v.z),
            AttributeValue::Int4(v) => format!("[ {}, {}, {}, {} ]", v.x, v.y, v.z, v.w),
            AttributeValue::Float(v) => real(*v),
            AttributeValue::Float2(v) => format!("Vector2( {}, {} )", real(v.x), real(v.y)),
            AttributeValue::Float3(v) => {
                format!("Vector3( {}, {}, {} )", real(v.x), real(v.y), real(v.z))
            }
            AttributeValue::Float4(v) => format!(
                "[ {}, {}, {}, {} ]",
                real(v.x),
                real(v.y),
                real(v.z),
                real(v.w)
            ),
            AttributeValue::Bool(v) => v.to_string(),
            AttributeValue::Path(path) => quoted(&path_to_string(path)),
            AttributeValue::Color(color) => {
                let [r, g, b, a] = color.to_normalized().map(real);
                format!("Color( {r}, {g}, {b}, {a} )")
            }
        }
    }
}

impl DocumentVisitor for SceneBuilder<'_> {
    fn visit(&mut self, node: DocumentNode<'_>) -> Result<()> {
        debug!("Converting {} for a Godot scene", node.kind_name());
        match node {
            DocumentNode::Map(view) => self.visit_map(view),
            DocumentNode::Tileset(view) => self.visit_tileset(view),
            DocumentNode::Tile(view) => self.visit_tile(view),
            DocumentNode::Layer(view) => self.visit_layer(view),
            DocumentNode::Object(view) => self.visit_object(view),
        }
    }
}

/// Packs a column and a row the way Godot 3 stores cell and atlas coordinates.
fn pack_coordinates(x: u32, y: u32) -> Option<i64> {
    (x < COORDINATE_LIMIT && y < COORDINATE_LIMIT)
        .then(|| i64::from(x) + i64::from(y) * COORDINATE_STRIDE)
}

/// A float that Godot reads back as a float: whole numbers keep a `.0`.
fn godot_real(value: f32, precision: Option<usize>) -> String {
    let text = format_float(value, precision);
    if text.contains(['.', 'e', 'E', 'N', 'n']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// Godot node names may not contain `.`, `:`, `@`, `/`, `"` or `%`.
fn escape_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | ':' | '@' | '/' | '"' | '%' => '_',
            c => c,
        })
        .collect()
}

/// `count` points on the ellipse with the given radii, centered on the origin.
fn ellipse_points(radius: Vec2, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|index| {
            let theta = index as f32 / count as f32 * TAU;
            Vec2::new(radius.x * theta.cos(), radius.y * theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_godot_real() {
        assert_eq!(godot_real(1.0, None), "1.0");
        assert_eq!(godot_real(0.25, None), "0.25");
        assert_eq!(godot_real(2.0 / 3.0, Some(3)), "0.667");
        assert_eq!(godot_real(f32::INFINITY, None), "inf");
    }

    #[test]
    fn test_pack_coordinates() {
        assert_eq!(pack_coordinates(3, 2), Some(3 + 2 * 65_536));
        assert_eq!(pack_coordinates(32_767, 32_767), Some(32_767 + 32_767 * 65_536));
        assert_eq!(pack_coordinates(32_768, 0), None);
        assert_eq!(pack_coordinates(0, 65_536), None);
    }

    #[test]
    fn test_escape_name() {
        assert_eq!(escape_name("a.b:c@d/e\"f%g h"), "a_b_c_d_e_f_g h");
    }

    #[test]
    fn test_ellipse_points() {
        let points = ellipse_points(Vec2::new(3.0, 2.0), 4);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Vec2::new(3.0, 0.0));
        assert!((points[1] - Vec2::new(0.0, 2.0)).length() < 1e-5);
        assert!((points[2] - Vec2::new(-3.0, 0.0)).length() < 1e-5);
    }
}
