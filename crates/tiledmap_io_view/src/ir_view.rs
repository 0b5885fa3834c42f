//! Views over an IR [`Map`], so an IR snapshot can be saved like any live document.

use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::Result;
use tiledmap_io_core::ir::{
    AnimationFrame, AttachedComponent, Component, Extent, Layer, LayerId, LayerKind, LayerType,
    Map, Metadata, Object, ObjectId, ObjectKind, Orientation, Tile, TileFormat, TileId,
    TileIndex, TileMatrix, TilesetRef,
};

use crate::view::{
    LayerView, MapView, MetaView, ObjectParent, ObjectView, TileView, TilesetView,
};
use crate::visitor::{DocumentNode, DocumentVisitor};

struct IrMetaView<'a>(&'a Metadata);

impl MetaView for IrMetaView<'_> {
    fn name(&self) -> &str {
        &self.0.name
    }

    fn property_count(&self) -> usize {
        self.0.properties.len()
    }

    fn property(&self, index: usize) -> Option<(&str, &AttributeValue)> {
        self.0
            .properties
            .get(index)
            .map(|attr| (attr.name.as_str(), &attr.value))
    }

    fn component_count(&self) -> usize {
        self.0.components.len()
    }

    fn component(&self, index: usize) -> Option<AttachedComponent> {
        self.0.components.get(index).cloned()
    }
}

/// A [`MapView`] borrowing an IR map.
///
/// # Example
///
/// ```
/// use tiledmap_io_core::ir::Map;
/// use tiledmap_io_view::{IrMapView, build_ir};
///
/// let map = Map::default();
/// let view = IrMapView::new(&map).with_path("level.yaml");
/// assert_eq!(build_ir(&view).unwrap(), map);
/// ```
pub struct IrMapView<'a> {
    map: &'a Map,
    path: Option<PathBuf>,
    meta: IrMetaView<'a>,
    tilesets: Vec<IrTilesetView<'a>>,
    layers: Vec<IrLayerView<'a>>,
}

impl<'a> IrMapView<'a> {
    pub fn new(map: &'a Map) -> Self {
        Self {
            map,
            path: None,
            meta: IrMetaView(&map.meta),
            tilesets: map.tilesets.iter().map(IrTilesetView::new).collect(),
            layers: map
                .layers
                .iter()
                .map(|layer| IrLayerView::new(layer, None))
                .collect(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn map(&self) -> &'a Map {
        self.map
    }
}

impl MapView for IrMapView<'_> {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn orientation(&self) -> Orientation {
        self.map.orientation
    }

    fn extent(&self) -> Extent {
        self.map.extent
    }

    fn tile_size(&self) -> UVec2 {
        self.map.tile_size
    }

    fn tile_format(&self) -> TileFormat {
        self.map.tile_format
    }

    fn next_layer_id(&self) -> LayerId {
        self.map.next_layer_id
    }

    fn next_object_id(&self) -> ObjectId {
        self.map.next_object_id
    }

    fn component_definitions(&self) -> Vec<Component> {
        self.map.components.clone()
    }

    fn tileset_count(&self) -> usize {
        self.tilesets.len()
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn meta(&self) -> &dyn MetaView {
        &self.meta
    }

    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()> {
        visitor.visit(DocumentNode::Map(self))?;
        for tileset in &self.tilesets {
            tileset.accept(visitor)?;
        }
        for layer in &self.layers {
            layer.accept(visitor)?;
        }
        Ok(())
    }
}

struct IrTilesetView<'a> {
    tileset: &'a TilesetRef,
    meta: IrMetaView<'a>,
    tiles: Vec<IrTileView<'a>>,
}

impl<'a> IrTilesetView<'a> {
    fn new(tileset: &'a TilesetRef) -> Self {
        Self {
            tileset,
            meta: IrMetaView(&tileset.tileset.meta),
            tiles: tileset
                .tileset
                .tiles
                .iter()
                .map(|tile| IrTileView::new(tileset.first_tile, tile))
                .collect(),
        }
    }
}

impl TilesetView for IrTilesetView<'_> {
    fn first_tile(&self) -> TileId {
        self.tileset.first_tile
    }

    fn tile_size(&self) -> UVec2 {
        self.tileset.tileset.tile_size
    }

    fn tile_count(&self) -> u32 {
        self.tileset.tileset.tile_count
    }

    fn column_count(&self) -> u32 {
        self.tileset.tileset.column_count
    }

    fn image_path(&self) -> &Path {
        &self.tileset.tileset.image_path
    }

    fn image_size(&self) -> UVec2 {
        self.tileset.tileset.image_size
    }

    fn tile_definition_count(&self) -> usize {
        self.tiles.len()
    }

    fn meta(&self) -> &dyn MetaView {
        &self.meta
    }

    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()> {
        visitor.visit(DocumentNode::Tileset(self))?;
        for tile in &self.tiles {
            tile.accept(visitor)?;
        }
        Ok(())
    }
}

struct IrTileView<'a> {
    first_tile: TileId,
    tile: &'a Tile,
    meta: IrMetaView<'a>,
    objects: Vec<IrObjectView<'a>>,
}

impl<'a> IrTileView<'a> {
    fn new(first_tile: TileId, tile: &'a Tile) -> Self {
        let parent = ObjectParent::Tile {
            tileset_first_tile: first_tile,
            index: tile.index,
        };
        Self {
            first_tile,
            tile,
            meta: IrMetaView(&tile.meta),
            objects: tile
                .objects
                .iter()
                .map(|object| IrObjectView::new(object, parent))
                .collect(),
        }
    }
}

impl TileView for IrTileView<'_> {
    fn tileset_first_tile(&self) -> TileId {
        self.first_tile
    }

    fn index(&self) -> TileIndex {
        self.tile.index
    }

    fn frame_count(&self) -> usize {
        self.tile.animation.len()
    }

    fn frame(&self, index: usize) -> Option<AnimationFrame> {
        self.tile.animation.get(index).copied()
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn meta(&self) -> &dyn MetaView {
        &self.meta
    }

    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()> {
        visitor.visit(DocumentNode::Tile(self))?;
        for object in &self.objects {
            object.accept(visitor)?;
        }
        Ok(())
    }
}

struct IrLayerView<'a> {
    layer: &'a Layer,
    parent: Option<LayerId>,
    meta: IrMetaView<'a>,
    objects: Vec<IrObjectView<'a>>,
    children: Vec<IrLayerView<'a>>,
}

impl<'a> IrLayerView<'a> {
    fn new(layer: &'a Layer, parent: Option<LayerId>) -> Self {
        let object_parent = ObjectParent::Layer(layer.id);
        Self {
            layer,
            parent,
            meta: IrMetaView(&layer.meta),
            objects: layer
                .objects()
                .iter()
                .map(|object| IrObjectView::new(object, object_parent))
                .collect(),
            children: layer
                .children()
                .iter()
                .map(|child| IrLayerView::new(child, Some(layer.id)))
                .collect(),
        }
    }
}

impl LayerView for IrLayerView<'_> {
    fn id(&self) -> LayerId {
        self.layer.id
    }

    fn parent_id(&self) -> Option<LayerId> {
        self.parent
    }

    fn layer_type(&self) -> LayerType {
        self.layer.layer_type()
    }

    fn opacity(&self) -> f32 {
        self.layer.opacity
    }

    fn is_visible(&self) -> bool {
        self.layer.visible
    }

    fn extent(&self) -> Option<Extent> {
        self.layer.tiles().map(|tiles| tiles.extent())
    }

    fn tile_at(&self, row: usize, col: usize) -> Option<TileId> {
        self.layer.tiles()?.get(row, col)
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn meta(&self) -> &dyn MetaView {
        &self.meta
    }

    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()> {
        visitor.visit(DocumentNode::Layer(self))?;
        for object in &self.objects {
            object.accept(visitor)?;
        }
        for child in &self.children {
            child.accept(visitor)?;
        }
        Ok(())
    }

    fn tiles(&self) -> Option<TileMatrix> {
        match &self.layer.kind {
            LayerKind::Tile(tiles) => Some(tiles.clone()),
            _ => None,
        }
    }
}

struct IrObjectView<'a> {
    object: &'a Object,
    parent: ObjectParent,
    meta: IrMetaView<'a>,
}

impl<'a> IrObjectView<'a> {
    fn new(object: &'a Object, parent: ObjectParent) -> Self {
        Self {
            object,
            parent,
            meta: IrMetaView(&object.meta),
        }
    }
}

impl ObjectView for IrObjectView<'_> {
    fn parent(&self) -> ObjectParent {
        self.parent
    }

    fn id(&self) -> ObjectId {
        self.object.id
    }

    fn kind(&self) -> ObjectKind {
        self.object.kind
    }

    fn position(&self) -> Vec2 {
        self.object.position
    }

    fn size(&self) -> Vec2 {
        self.object.size
    }

    fn tag(&self) -> &str {
        &self.object.tag
    }

    fn is_visible(&self) -> bool {
        self.object.visible
    }

    fn meta(&self) -> &dyn MetaView {
        &self.meta
    }

    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()> {
        visitor.visit(DocumentNode::Object(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiledmap_io_core::error::FormatError;
    use tiledmap_io_core::ir::Tileset;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl DocumentVisitor for Recorder {
        fn visit(&mut self, node: DocumentNode<'_>) -> Result<()> {
            let event = match node {
                DocumentNode::Map(map) => format!("map {}", map.meta().name()),
                DocumentNode::Tileset(tileset) => format!("tileset {}", tileset.first_tile()),
                DocumentNode::Tile(tile) => format!("tile {}", tile.index()),
                DocumentNode::Layer(layer) => {
                    format!("layer {} parent {:?}", layer.id(), layer.parent_id())
                }
                DocumentNode::Object(object) => format!("object {} {:?}", object.id(), object.parent()),
            };
            self.events.push(event);
            Ok(())
        }
    }

    fn sample_map() -> Map {
        let mut map = Map::new(Extent::new(1, 2), UVec2::new(8, 8));
        map.meta.name = "demo".into();
        let mut tile = Tile::new(3);
        tile.objects.push(Object::new(1, ObjectKind::Rect));
        map.tilesets.push(TilesetRef {
            first_tile: 1,
            tileset: Tileset {
                tile_count: 4,
                column_count: 2,
                tiles: vec![tile],
                ..Default::default()
            },
        });
        map.layers = vec![
            Layer::group(
                1,
                "group",
                vec![Layer::object(2, "objects", vec![Object::new(5, ObjectKind::Point)])],
            ),
            Layer::tile(3, "tiles", TileMatrix::from_rows(vec![vec![1, 2]])),
        ];
        map
    }

    #[test]
    fn test_traversal_order() {
        let map = sample_map();
        let view = IrMapView::new(&map);
        let mut recorder = Recorder::default();
        view.accept(&mut recorder).unwrap();

        assert_eq!(
            recorder.events,
            vec![
                "map demo",
                "tileset 1",
                "tile 3",
                "object 1 Tile { tileset_first_tile: 1, index: 3 }",
                "layer 1 parent None",
                "layer 2 parent Some(1)",
                "object 5 Layer(2)",
                "layer 3 parent None",
            ]
        );
    }

    #[test]
    fn test_layer_view_tiles() {
        let map = sample_map();
        let view = IrMapView::new(&map);
        assert_eq!(view.layer_count(), 2);
        let tile_layer = &view.layers[1];
        assert_eq!(tile_layer.extent(), Some(Extent::new(1, 2)));
        assert_eq!(tile_layer.tile_at(0, 1), Some(2));
        assert_eq!(tile_layer.tile_at(1, 0), None);
        assert_eq!(view.layers[0].tiles(), None);
    }

    #[test]
    fn test_visitor_error_stops_traversal() {
        struct FailOnLayer(usize);
        impl DocumentVisitor for FailOnLayer {
            fn visit(&mut self, node: DocumentNode<'_>) -> Result<()> {
                self.0 += 1;
                match node {
                    DocumentNode::Layer(_) => {
                        Err(FormatError::UnsupportedFeature("layers".into()))
                    }
                    _ => Ok(()),
                }
            }
        }

        let map = sample_map();
        let mut visitor = FailOnLayer(0);
        assert!(IrMapView::new(&map).accept(&mut visitor).is_err());
        // map, tileset, tile, tile object, first layer
        assert_eq!(visitor.0, 5);
    }
}
