use bevy::prelude::*;
use tiledmap_io_formats::{ConversionConfig, Converter};

use crate::asset::TiledmapIoAsset;
use crate::loader::TiledmapIoAssetLoader;

/// Plugin that registers [`TiledmapIoAsset`] and its loader.
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use tiledmap_io_bevy::TiledmapIoPlugin;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(TiledmapIoPlugin::default())
///     .run();
/// ```
///
/// Maps with the extensions `tmj`, `tmx`, `yaml` and `yml` can then be loaded with the
/// `AssetServer`. The plugin also inserts a [`TiledmapIoConverter`] resource built from
/// the same configuration, for saving maps.
#[derive(Debug, Clone, Default)]
pub struct TiledmapIoPlugin {
    pub config: ConversionConfig,
}

/// Loads and saves maps outside the asset system with the plugin's configuration.
#[derive(Resource, Debug, Clone, Deref)]
pub struct TiledmapIoConverter(pub Converter);

impl Plugin for TiledmapIoPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TiledmapIoAsset>()
            .register_asset_loader(TiledmapIoAssetLoader::new(self.config.read.clone()))
            .insert_resource(TiledmapIoConverter(Converter::with_config(
                self.config.clone(),
            )));
    }
}

#[cfg(test)]
mod tests {
    use bevy::asset::AssetPlugin;

    use super::*;

    #[test]
    fn test_plugin_registers_asset_and_converter() {
        let mut config = ConversionConfig::default();
        config.write.embed_tilesets = true;

        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin::default(),
            TiledmapIoPlugin { config },
        ));

        assert!(app.world().contains_resource::<Assets<TiledmapIoAsset>>());
        let converter = app.world().resource::<TiledmapIoConverter>();
        assert!(converter.config().write.embed_tilesets);
    }
}
