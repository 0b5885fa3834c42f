//! Extension-driven load, save and conversion.

use std::path::Path;

use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::Map;
use tiledmap_io_view::{IrMapView, MapView};
use tracing::info;

use crate::format::{ConversionConfig, SaveFormat, destination};
use crate::registry::FormatRegistry;

/// Loads and saves maps, choosing the format from the file extension.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    registry: FormatRegistry,
    codec: TileCodec,
    config: ConversionConfig,
}

impl Converter {
    pub fn new(registry: FormatRegistry, codec: TileCodec, config: ConversionConfig) -> Self {
        Self {
            registry,
            codec,
            config,
        }
    }

    /// A converter with the default registry and codec.
    pub fn with_config(config: ConversionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// The format responsible for `path`.
    pub fn format_for(&self, path: &Path) -> Result<Box<dyn SaveFormat>> {
        self.registry.for_path(path, &self.codec).ok_or_else(|| {
            FormatError::UnsupportedFeature(format!(
                "no map format handles '{}'",
                path.display()
            ))
        })
    }

    pub fn load(&self, path: &Path) -> Result<Map> {
        self.format_for(path)?.load_map(path, &self.config.read)
    }

    /// Saves an IR map to `path`.
    pub fn save(&self, map: &Map, path: &Path) -> Result<()> {
        let view = IrMapView::new(map).with_path(path);
        self.save_view(&view)
    }

    /// Saves a host document to its own path.
    pub fn save_view(&self, map: &dyn MapView) -> Result<()> {
        let path = destination(map)?;
        self.format_for(&path)?.save_map(map, &self.config.write)?;
        info!("Saved map to {}", path.display());
        Ok(())
    }

    /// Loads `source` and saves it as `destination`, returning the intermediate map.
    pub fn convert(&self, source: &Path, destination: &Path) -> Result<Map> {
        let map = self.load(source)?;
        self.save(&map, destination)?;
        info!(
            "Converted {} to {}",
            source.display(),
            destination.display()
        );
        Ok(map)
    }
}
