//! Read-only views over a map document.
//!
//! Format code only sees a document through these traits, so it never depends on how
//! the host stores maps. Every view that can be traversed exposes `accept`, which
//! reports the node itself to a [`DocumentVisitor`] and then its children.
//!
//! Views must not change while a traversal is in progress. No locking happens here;
//! keeping the document still is the caller's job.

use std::path::Path;

use glam::{UVec2, Vec2};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::Result;
use tiledmap_io_core::ir::{
    AnimationFrame, AttachedComponent, Component, Extent, LayerId, LayerType, ObjectId,
    ObjectKind, Orientation, TileFormat, TileId, TileIndex, TileMatrix,
};

use crate::visitor::DocumentVisitor;

/// Name, properties and components of a node.
pub trait MetaView {
    fn name(&self) -> &str;

    fn property_count(&self) -> usize;

    /// Property at `index`, in insertion order.
    fn property(&self, index: usize) -> Option<(&str, &AttributeValue)>;

    fn component_count(&self) -> usize;

    fn component(&self, index: usize) -> Option<AttachedComponent>;
}

pub trait MapView {
    /// Where the map is saved. Required by `save_map`.
    fn path(&self) -> Option<&Path>;

    fn orientation(&self) -> Orientation;

    fn extent(&self) -> Extent;

    fn tile_size(&self) -> UVec2;

    fn tile_format(&self) -> TileFormat;

    fn next_layer_id(&self) -> LayerId;

    fn next_object_id(&self) -> ObjectId;

    /// Component prototypes defined for the map.
    fn component_definitions(&self) -> Vec<Component>;

    fn tileset_count(&self) -> usize;

    /// Number of root layers.
    fn layer_count(&self) -> usize;

    fn meta(&self) -> &dyn MetaView;

    /// Visits the map, then every tileset, then every root layer.
    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()>;
}

pub trait TilesetView {
    fn first_tile(&self) -> TileId;

    fn tile_size(&self) -> UVec2;

    fn tile_count(&self) -> u32;

    fn column_count(&self) -> u32;

    fn image_path(&self) -> &Path;

    fn image_size(&self) -> UVec2;

    /// Number of tiles with extra data (animation, objects or metadata).
    fn tile_definition_count(&self) -> usize;

    fn meta(&self) -> &dyn MetaView;

    /// Visits the tileset, then each tile definition.
    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()>;
}

pub trait TileView {
    /// First global id of the owning tileset.
    fn tileset_first_tile(&self) -> TileId;

    fn index(&self) -> TileIndex;

    fn frame_count(&self) -> usize;

    fn frame(&self, index: usize) -> Option<AnimationFrame>;

    fn object_count(&self) -> usize;

    fn meta(&self) -> &dyn MetaView;

    /// Visits the tile, then its objects.
    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()>;
}

pub trait LayerView {
    fn id(&self) -> LayerId;

    /// Id of the enclosing group layer, `None` for root layers.
    fn parent_id(&self) -> Option<LayerId>;

    fn layer_type(&self) -> LayerType;

    fn opacity(&self) -> f32;

    fn is_visible(&self) -> bool;

    /// Grid dimensions of a tile layer.
    fn extent(&self) -> Option<Extent>;

    fn tile_at(&self, row: usize, col: usize) -> Option<TileId>;

    fn child_count(&self) -> usize;

    fn object_count(&self) -> usize;

    fn meta(&self) -> &dyn MetaView;

    /// Visits the layer, then its objects, then its child layers.
    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()>;

    /// Copies the grid of a tile layer. `None` for other layers and for grids beyond
    /// [`Extent::checked_len`].
    fn tiles(&self) -> Option<TileMatrix> {
        let extent = self.extent()?;
        extent.checked_len()?;
        let mut tiles = TileMatrix::new(extent);
        for row in 0..extent.rows {
            for col in 0..extent.cols {
                if let Some(id) = self.tile_at(row, col) {
                    tiles.set(row, col, id);
                }
            }
        }
        Some(tiles)
    }
}

/// What an object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectParent {
    Layer(LayerId),
    Tile {
        tileset_first_tile: TileId,
        index: TileIndex,
    },
}

pub trait ObjectView {
    fn parent(&self) -> ObjectParent;

    fn id(&self) -> ObjectId;

    fn kind(&self) -> ObjectKind;

    fn position(&self) -> Vec2;

    fn size(&self) -> Vec2;

    fn tag(&self) -> &str;

    fn is_visible(&self) -> bool;

    fn meta(&self) -> &dyn MetaView;

    fn accept(&self, visitor: &mut dyn DocumentVisitor) -> Result<()>;
}
