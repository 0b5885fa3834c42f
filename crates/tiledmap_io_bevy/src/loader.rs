use std::path::{Path, PathBuf};

use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    prelude::*,
    tasks::ConditionalSendFuture,
};
use thiserror::Error;
use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::error::FormatError;
use tiledmap_io_formats::{FormatRegistry, ReadOptions};

use crate::asset::TiledmapIoAsset;

/// Directory Bevy reads assets from when no other source is configured.
const ASSET_ROOT: &str = "assets";

/// Asset loader for every map format that can be read back.
///
/// The format is chosen from the asset's extension through a [`FormatRegistry`].
/// External tilesets are read from disk next to the map, relative to the asset root,
/// unless [`ReadOptions::base_dir`] is set.
#[derive(Clone)]
pub struct TiledmapIoAssetLoader {
    registry: FormatRegistry,
    codec: TileCodec,
    options: ReadOptions,
    asset_root: PathBuf,
}

#[derive(Debug, Error)]
pub enum MapLoaderError {
    #[error("Failed to load map: {0}")]
    Format(#[from] FormatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No map format handles '{0}'")]
    UnsupportedExtension(String),
}

impl Default for TiledmapIoAssetLoader {
    fn default() -> Self {
        Self::new(ReadOptions::default())
    }
}

impl TiledmapIoAssetLoader {
    pub fn new(options: ReadOptions) -> Self {
        Self {
            registry: FormatRegistry::default(),
            codec: TileCodec::default(),
            options,
            asset_root: PathBuf::from(ASSET_ROOT),
        }
    }

    /// Resolves external tilesets under `root` instead of `assets/`.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Parses map bytes read from `asset_path`, a path relative to the asset root.
    pub fn parse(
        &self,
        bytes: &[u8],
        asset_path: &Path,
    ) -> Result<TiledmapIoAsset, MapLoaderError> {
        let format = self
            .registry
            .for_path(asset_path, &self.codec)
            .ok_or_else(|| MapLoaderError::UnsupportedExtension(asset_path.display().to_string()))?;

        let mut options = self.options.clone();
        if options.base_dir.is_none() {
            let dir = asset_path.parent().unwrap_or_else(|| Path::new(""));
            options.base_dir = Some(self.asset_root.join(dir));
        }

        let mut map = format.parse_map(bytes, &options)?;
        if map.meta.name.is_empty() {
            if let Some(stem) = asset_path.file_stem() {
                map.meta.name = stem.to_string_lossy().into_owned();
            }
        }
        debug!(
            "Loaded {} map asset '{}' from {}",
            format.name(),
            map.meta.name,
            asset_path.display()
        );
        Ok(TiledmapIoAsset {
            map,
            format: format.id(),
        })
    }
}

impl AssetLoader for TiledmapIoAssetLoader {
    type Asset = TiledmapIoAsset;
    type Settings = ();
    type Error = MapLoaderError;

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        load_context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            self.parse(&bytes, load_context.asset_path().path())
        }
    }

    fn extensions(&self) -> &[&str] {
        &["tmj", "tmx", "yaml", "yml"]
    }
}
