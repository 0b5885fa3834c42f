//! # `tiledmap_io_core`
//!
//! Shared vocabulary for the `tiledmap_io` conversion layers:
//!
//! - [`attribute`]: typed property and component values
//! - [`color`]: 8-bit RGBA colors with the hex notations used by map formats
//! - [`ir`]: the intermediate representation every format reads and writes
//! - [`error`]: the error taxonomy returned across format and codec boundaries
//!
//! Nothing in this crate touches the filesystem.

pub mod attribute;
pub mod color;
pub mod error;
pub mod ir;

pub mod prelude {
    //! Common imports for `tiledmap_io_core` users.

    pub use crate::attribute::{AttributeKind, AttributeValue};
    pub use crate::color::Color;
    pub use crate::error::{CodecError, CompressionError, ErrorKind, FormatError, TypeMismatch};
    pub use crate::ir::{
        AnimationFrame, AttachedComponent, Component, Extent, Layer, LayerKind, LayerType, Map,
        Metadata, NamedAttribute, Object, ObjectKind, Orientation, Tile, TileCompression,
        TileEncoding, TileFormat, TileId, TileMatrix, Tileset, TilesetRef,
    };
}
