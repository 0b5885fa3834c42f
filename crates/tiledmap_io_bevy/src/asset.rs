use bevy::prelude::*;
use tiledmap_io_core::ir::Map;

/// A map loaded through one of the registered formats.
#[derive(TypePath, Asset, Debug)]
pub struct TiledmapIoAsset {
    /// The loaded map, with tilesets resolved and embedded.
    pub map: Map,

    /// Identifier of the format the map was read with, such as `"tmx"`.
    pub format: &'static str,
}

impl TiledmapIoAsset {
    pub fn name(&self) -> &str {
        &self.map.meta.name
    }
}
