//! Tiled JSON maps (`.tmj`) and tilesets (`.tsj`).

mod emit;
mod fields;
mod parse;

use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::error::Result;
use tiledmap_io_core::ir::Map;
use tiledmap_io_view::{MapView, build_ir};

use crate::format::{ReadOptions, SaveFormat, WriteOptions, destination};
use emit::TmjEmitter;

/// The Tiled JSON format.
///
/// Vector properties are written as `;`-separated strings and components are not
/// written at all, so a round trip through this format is not lossless for them.
#[derive(Debug, Clone, Default)]
pub struct TmjFormat {
    codec: TileCodec,
}

impl TmjFormat {
    pub const ID: &'static str = "tmj";
    pub const EXTENSIONS: &'static [&'static str] = &["tmj", "json"];

    pub fn new(codec: TileCodec) -> Self {
        Self { codec }
    }
}

impl SaveFormat for TmjFormat {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "Tiled JSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        Self::EXTENSIONS
    }

    fn parse_map(&self, bytes: &[u8], options: &ReadOptions) -> Result<Map> {
        parse::parse_map(bytes, options, &self.codec)
    }

    fn save_map(&self, map: &dyn MapView, options: &WriteOptions) -> Result<()> {
        let path = destination(map)?;
        let map = build_ir(map)?;
        TmjEmitter::new(&self.codec, options).save(&map, &path)
    }
}
