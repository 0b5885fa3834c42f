//! # `tiledmap_io_bevy`
//!
//! Loads TMJ, TMX and YAML maps as Bevy assets.
//!
//! The loader reads the asset bytes, picks a format from the extension and yields a
//! [`TiledmapIoAsset`] holding the parsed map. Spawning entities from it is left to
//! the host.

pub mod asset;
pub mod loader;
pub mod plugin;

pub use plugin::{TiledmapIoConverter, TiledmapIoPlugin};

/// Prelude module for convenient imports
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use tiledmap_io_bevy::prelude::*;
///
/// fn count_layers(maps: Res<Assets<TiledmapIoAsset>>) {
///     for (_, asset) in maps.iter() {
///         info!("{} has {} layers", asset.name(), asset.map.layers.len());
///     }
/// }
/// ```
pub mod prelude {
    pub use crate::asset::TiledmapIoAsset;
    pub use crate::loader::{MapLoaderError, TiledmapIoAssetLoader};
    pub use crate::plugin::{TiledmapIoConverter, TiledmapIoPlugin};
}
