//! Format-neutral intermediate representation of a map.
//!
//! IR values are plain owned snapshots: a parser or a view traversal creates them,
//! an emitter or the host consumes them, and nothing keeps them in sync with a live
//! document afterwards.

mod layer;
mod map;
mod meta;
mod tiles;
mod tileset;

pub use layer::{Layer, LayerId, LayerKind, LayerType, Object, ObjectId, ObjectKind};
pub use map::{Map, Orientation, TileCompression, TileEncoding, TileFormat};
pub use meta::{AttachedComponent, Component, Metadata, NamedAttribute};
pub use tiles::{EMPTY_TILE, Extent, TileId, TileMatrix};
pub use tileset::{AnimationFrame, Tile, TileIndex, Tileset, TilesetRef};
