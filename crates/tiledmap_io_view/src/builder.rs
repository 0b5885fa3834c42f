//! A visitor that materializes a full IR [`Map`] from any [`MapView`].

use std::collections::HashMap;

use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    Layer, LayerId, LayerKind, LayerType, Map, Metadata, NamedAttribute, Object, Tile, TileId,
    Tileset, TilesetRef,
};
use tracing::debug;

use crate::view::{LayerView, MapView, MetaView, ObjectParent, ObjectView, TileView, TilesetView};
use crate::visitor::{DocumentNode, DocumentVisitor};

/// Copies a [`MetaView`] into owned [`Metadata`].
pub fn collect_meta(view: &dyn MetaView) -> Metadata {
    let properties = (0..view.property_count())
        .filter_map(|index| view.property(index))
        .map(|(name, value)| NamedAttribute::new(name, value.clone()))
        .collect();
    let components = (0..view.component_count())
        .filter_map(|index| view.component(index))
        .collect();
    Metadata {
        name: view.name().to_string(),
        properties,
        components,
    }
}

fn collect_object(view: &dyn ObjectView) -> Object {
    Object {
        id: view.id(),
        kind: view.kind(),
        position: view.position(),
        size: view.size(),
        tag: view.tag().to_string(),
        visible: view.is_visible(),
        meta: collect_meta(view.meta()),
    }
}

fn structure(node: &str, reason: impl Into<String>) -> FormatError {
    FormatError::bad_structure(node, reason)
}

fn layer_at_mut<'a>(layers: &'a mut [Layer], path: &[usize]) -> Option<&'a mut Layer> {
    let (first, rest) = path.split_first()?;
    let layer = layers.get_mut(*first)?;
    if rest.is_empty() {
        return Some(layer);
    }
    match &mut layer.kind {
        LayerKind::Group(children) => layer_at_mut(children, rest),
        _ => None,
    }
}

/// Builds an IR map while visiting a document.
///
/// Nodes must arrive in the order produced by [`MapView::accept`]: parents before
/// their children.
#[derive(Debug, Default)]
pub struct IrBuilder {
    map: Option<Map>,
    /// Index path from the root layer list to each layer seen so far.
    layer_paths: HashMap<LayerId, Vec<usize>>,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built map.
    ///
    /// # Errors
    ///
    /// Fails if no map node was visited.
    pub fn finish(self) -> Result<Map> {
        self.map
            .ok_or_else(|| structure("document", "traversal did not report a map"))
    }

    fn map_mut(&mut self, node: &str) -> Result<&mut Map> {
        self.map
            .as_mut()
            .ok_or_else(|| structure(node, "visited before the map"))
    }

    fn visit_map(&mut self, view: &dyn MapView) -> Result<()> {
        if self.map.is_some() {
            return Err(structure("map", "visited twice"));
        }
        let mut map = Map::new(view.extent(), view.tile_size());
        map.meta = collect_meta(view.meta());
        map.orientation = view.orientation();
        map.tile_format = view.tile_format();
        map.components = view.component_definitions();
        map.next_layer_id = view.next_layer_id();
        map.next_object_id = view.next_object_id();
        map.tilesets.reserve(view.tileset_count());
        map.layers.reserve(view.layer_count());
        self.map = Some(map);
        Ok(())
    }

    fn visit_tileset(&mut self, view: &dyn TilesetView) -> Result<()> {
        let map = self.map_mut("tileset")?;
        map.tilesets.push(TilesetRef {
            first_tile: view.first_tile(),
            tileset: Tileset {
                meta: collect_meta(view.meta()),
                tile_size: view.tile_size(),
                tile_count: view.tile_count(),
                column_count: view.column_count(),
                image_path: view.image_path().to_path_buf(),
                image_size: view.image_size(),
                tiles: Vec::with_capacity(view.tile_definition_count()),
            },
        });
        Ok(())
    }

    fn tileset_mut(&mut self, first_tile: TileId) -> Result<&mut Tileset> {
        self.map_mut("tile")?
            .tilesets
            .iter_mut()
            .find(|tileset| tileset.first_tile == first_tile)
            .map(|tileset| &mut tileset.tileset)
            .ok_or_else(|| structure("tile", format!("no tileset starts at {first_tile}")))
    }

    fn visit_tile(&mut self, view: &dyn TileView) -> Result<()> {
        let tileset = self.tileset_mut(view.tileset_first_tile())?;
        tileset.tiles.push(Tile {
            index: view.index(),
            animation: (0..view.frame_count())
                .filter_map(|index| view.frame(index))
                .collect(),
            objects: Vec::with_capacity(view.object_count()),
            meta: collect_meta(view.meta()),
        });
        Ok(())
    }

    fn visit_layer(&mut self, view: &dyn LayerView) -> Result<()> {
        let id = view.id();
        if self.layer_paths.contains_key(&id) {
            return Err(structure("layer", format!("duplicate layer id {id}")));
        }

        let kind = match view.layer_type() {
            LayerType::Tile => LayerKind::Tile(
                view.tiles().ok_or_else(|| {
                    structure(
                        "layer",
                        format!("tile layer {id} has no grid of a supported size"),
                    )
                })?,
            ),
            LayerType::Object => LayerKind::Object(Vec::with_capacity(view.object_count())),
            LayerType::Group => LayerKind::Group(Vec::with_capacity(view.child_count())),
        };
        let layer = Layer {
            id,
            opacity: view.opacity(),
            visible: view.is_visible(),
            meta: collect_meta(view.meta()),
            kind,
        };

        let parent_path = match view.parent_id() {
            Some(parent) => Some(self.layer_paths.get(&parent).cloned().ok_or_else(|| {
                structure("layer", format!("parent {parent} of layer {id} not visited"))
            })?),
            None => None,
        };

        let map = self.map_mut("layer")?;
        let path = match parent_path {
            None => {
                map.layers.push(layer);
                vec![map.layers.len() - 1]
            }
            Some(mut path) => {
                let parent = layer_at_mut(&mut map.layers, &path)
                    .ok_or_else(|| structure("layer", "dangling parent path"))?;
                let LayerKind::Group(children) = &mut parent.kind else {
                    return Err(structure(
                        "layer",
                        format!("parent of layer {id} is not a group"),
                    ));
                };
                children.push(layer);
                path.push(children.len() - 1);
                path
            }
        };
        self.layer_paths.insert(id, path);
        Ok(())
    }

    fn visit_object(&mut self, view: &dyn ObjectView) -> Result<()> {
        let object = collect_object(view);
        match view.parent() {
            ObjectParent::Layer(layer_id) => {
                let path = self.layer_paths.get(&layer_id).cloned().ok_or_else(|| {
                    structure("object", format!("layer {layer_id} not visited"))
                })?;
                let map = self.map_mut("object")?;
                let layer = layer_at_mut(&mut map.layers, &path)
                    .ok_or_else(|| structure("object", "dangling layer path"))?;
                let LayerKind::Object(objects) = &mut layer.kind else {
                    return Err(structure(
                        "object",
                        format!("layer {layer_id} is not an object layer"),
                    ));
                };
                objects.push(object);
            }
            ObjectParent::Tile {
                tileset_first_tile,
                index,
            } => {
                let tileset = self.tileset_mut(tileset_first_tile)?;
                let tile = tileset
                    .tiles
                    .iter_mut()
                    .find(|tile| tile.index == index)
                    .ok_or_else(|| structure("object", format!("tile {index} not visited")))?;
                tile.objects.push(object);
            }
        }
        Ok(())
    }
}

impl DocumentVisitor for IrBuilder {
    fn visit(&mut self, node: DocumentNode<'_>) -> Result<()> {
        match node {
            DocumentNode::Map(view) => self.visit_map(view),
            DocumentNode::Tileset(view) => self.visit_tileset(view),
            DocumentNode::Tile(view) => self.visit_tile(view),
            DocumentNode::Layer(view) => self.visit_layer(view),
            DocumentNode::Object(view) => self.visit_object(view),
        }
    }
}

/// Walks `view` and returns the equivalent IR map.
///
/// Attached components are aligned to their prototypes, and attachments whose
/// prototype is gone are dropped.
pub fn build_ir(view: &dyn MapView) -> Result<Map> {
    let mut builder = IrBuilder::new();
    view.accept(&mut builder)?;
    let mut map = builder.finish()?;
    let dropped = map.reconcile_components();
    map.validate()?;
    debug!(
        "Built IR map '{}' with {} layers and {} tilesets ({} component attachments dropped)",
        map.meta.name,
        map.layers.len(),
        map.tilesets.len(),
        dropped
    );
    Ok(map)
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, Vec2};
    use tiledmap_io_core::attribute::AttributeValue;
    use tiledmap_io_core::color::Color;
    use tiledmap_io_core::ir::{
        AnimationFrame, AttachedComponent, Component, Extent, ObjectKind, TileMatrix,
    };

    use super::*;
    use crate::ir_view::IrMapView;

    fn rich_map() -> Map {
        let mut map = Map::new(Extent::new(3, 4), UVec2::new(16, 16));
        map.meta = Metadata::named("level").with_property("difficulty", 3);
        map.components
            .push(Component::new("Door").with_attribute("locked", AttributeValue::Bool(false)));

        let mut tile = Tile::new(2);
        tile.animation = vec![AnimationFrame::new(2, 100), AnimationFrame::new(3, 150)];
        tile.objects.push(Object::new(1, ObjectKind::Rect));
        map.tilesets.push(TilesetRef {
            first_tile: 1,
            tileset: Tileset {
                meta: Metadata::named("terrain"),
                tile_size: UVec2::new(16, 16),
                tile_count: 16,
                column_count: 4,
                image_path: "terrain.png".into(),
                image_size: UVec2::new(64, 64),
                tiles: vec![tile],
            },
        });

        let mut door = Object::new(7, ObjectKind::Rect);
        door.position = Vec2::new(4.0, 8.0);
        door.size = Vec2::new(16.0, 32.0);
        door.tag = "door".into();
        door.meta = Metadata::named("front door")
            .with_property("label", "exit")
            .with_property("tint", Color::rgba(10, 20, 30, 40));
        let mut attached = AttachedComponent::new("Door");
        attached.values.push(NamedAttribute::new("locked", true));
        door.meta.attach(attached);

        let grid = TileMatrix::from_rows(vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![9, 10, 11, 12],
        ]);
        let mut hidden = Layer::tile(3, "hidden", grid.clone());
        hidden.visible = false;
        hidden.opacity = 0.5;
        map.layers = vec![
            Layer::tile(1, "ground", grid),
            Layer::group(
                2,
                "group",
                vec![hidden, Layer::object(4, "objects", vec![door])],
            ),
        ];
        map.next_layer_id = 5;
        map.next_object_id = 8;
        map
    }

    #[test]
    fn test_build_ir_from_ir_view_is_identity() {
        let map = rich_map();
        let rebuilt = build_ir(&IrMapView::new(&map)).unwrap();
        assert_eq!(rebuilt, map);
    }

    #[test]
    fn test_build_ir_drops_orphan_components() {
        let mut map = rich_map();
        map.meta.attach(AttachedComponent::new("Ghost"));
        let rebuilt = build_ir(&IrMapView::new(&map)).unwrap();
        assert!(rebuilt.meta.components.is_empty());
    }

    #[test]
    fn test_build_ir_rejects_duplicate_layer_ids() {
        let mut map = rich_map();
        map.layers.push(Layer::object(1, "clash", Vec::new()));
        let err = build_ir(&IrMapView::new(&map)).unwrap_err();
        assert!(err.to_string().contains("duplicate layer id 1"));
    }

    #[test]
    fn test_builder_requires_map_first() {
        let map = rich_map();
        let view = IrMapView::new(&map);
        let mut builder = IrBuilder::new();
        struct Skip<'b>(&'b mut IrBuilder);
        impl DocumentVisitor for Skip<'_> {
            fn visit(&mut self, node: DocumentNode<'_>) -> Result<()> {
                match node {
                    DocumentNode::Map(_) => Ok(()),
                    other => self.0.visit(other),
                }
            }
        }
        assert!(view.accept(&mut Skip(&mut builder)).is_err());
        assert!(IrBuilder::new().finish().is_err());
    }
}
