//! # tiledmap_io
//!
//! Reads and writes 2D tile maps in several file formats through one intermediate
//! representation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use tiledmap_io::prelude::*;
//!
//! # fn main() -> Result<(), FormatError> {
//! let converter = Converter::default();
//! let map = converter.convert(Path::new("level.tmx"), Path::new("level.yaml"))?;
//! println!("{} layers", map.layers.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Formats
//!
//! | Format | Extensions | Load | Save |
//! |---|---|---|---|
//! | Tiled JSON | `tmj`, `json` | yes | yes |
//! | Tiled XML | `tmx` | yes | yes |
//! | YAML | `yaml`, `yml` | yes | yes, lossless |
//! | Godot 3 scene | `tscn` | no | yes |
//!
//! ## Features
//!
//! - **bevy**: asset loader and plugin in [`bevy`]
//!
//! ## Architecture
//!
//! - [`core`]: attribute values, the IR and errors
//! - [`codec`]: tile grid encoding and compression providers
//! - [`view`]: read-only document views and the visitor used for saving
//! - [`formats`]: the formats, their registry and the [`Converter`](formats::Converter)

pub use tiledmap_io_codec as codec;
pub use tiledmap_io_core as core;
pub use tiledmap_io_formats as formats;
pub use tiledmap_io_view as view;

#[cfg(feature = "bevy")]
pub use tiledmap_io_bevy as bevy;

/// Unified prelude for `tiledmap_io`
pub mod prelude {
    pub use tiledmap_io_codec::{PlainTextStyle, TileCodec};
    pub use tiledmap_io_core::prelude::*;
    pub use tiledmap_io_formats::prelude::*;
    pub use tiledmap_io_formats::{
        GodotSceneFormat, TmjFormat, TmxFormat, YamlFormat, write_atomically,
    };
    pub use tiledmap_io_view::{DocumentNode, DocumentVisitor, IrMapView, MapView, build_ir};

    #[cfg(feature = "bevy")]
    pub use tiledmap_io_bevy::prelude::*;
}
