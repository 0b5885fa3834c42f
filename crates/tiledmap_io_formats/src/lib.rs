//! # `tiledmap_io_formats`
//!
//! Map file formats for `tiledmap_io`, behind one [`SaveFormat`] contract:
//!
//! - [`tmj`]: Tiled JSON maps and `.tsj` tilesets
//! - [`tmx`]: Tiled XML maps and `.tsx` tilesets
//! - [`yaml`]: a lossless YAML format that keeps components and vector properties
//! - [`godot`]: a save-only Godot 3 scene export
//!
//! A [`FormatRegistry`] maps identifiers and file extensions to formats, and a
//! [`Converter`] uses it to load, save and convert files by extension. Every file is
//! written through [`write_atomically`], so a failed save never leaves a partial file.

pub mod atomic;
pub mod converter;
pub mod format;
pub mod godot;
pub mod registry;
pub mod tmj;
pub mod tmx;
pub mod yaml;

mod common;
#[cfg(test)]
mod testing;
mod tiled_props;

pub use atomic::{write_atomically, write_bytes_atomically};
pub use converter::Converter;
pub use format::{ConversionConfig, ReadOptions, SaveFormat, WriteOptions};
pub use godot::GodotSceneFormat;
pub use registry::{FormatConstructor, FormatEntry, FormatRegistry};
pub use tmj::TmjFormat;
pub use tmx::TmxFormat;
pub use yaml::YamlFormat;

pub mod prelude {
    //! Common imports for `tiledmap_io_formats` users.

    pub use crate::converter::Converter;
    pub use crate::format::{ConversionConfig, ReadOptions, SaveFormat, WriteOptions};
    pub use crate::registry::FormatRegistry;
}
