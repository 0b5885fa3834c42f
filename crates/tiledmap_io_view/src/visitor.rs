//! The closed set of document nodes and the visitor that receives them.

use tiledmap_io_core::error::Result;

use crate::view::{LayerView, MapView, ObjectView, TileView, TilesetView};

/// One node reported during a traversal.
///
/// The set of node kinds is fixed, so visitors match on it exhaustively.
#[derive(Clone, Copy)]
pub enum DocumentNode<'a> {
    Map(&'a dyn MapView),
    Tileset(&'a dyn TilesetView),
    Tile(&'a dyn TileView),
    Layer(&'a dyn LayerView),
    Object(&'a dyn ObjectView),
}

impl DocumentNode<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DocumentNode::Map(_) => "map",
            DocumentNode::Tileset(_) => "tileset",
            DocumentNode::Tile(_) => "tile",
            DocumentNode::Layer(_) => "layer",
            DocumentNode::Object(_) => "object",
        }
    }
}

/// Receives nodes in traversal order.
///
/// Order: the map, each tileset followed by its tiles and their objects, then each
/// root layer depth-first (a layer, its objects, then its child layers). Returning an
/// error stops the traversal.
pub trait DocumentVisitor {
    fn visit(&mut self, node: DocumentNode<'_>) -> Result<()>;
}
