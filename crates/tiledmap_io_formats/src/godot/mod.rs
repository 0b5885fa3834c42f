//! Export to Godot 3 scenes.
//!
//! Saving writes a `.tscn` scene and a `tileset.tres` resource beside it. Tile layers
//! become `TileMap` nodes, object and group layers become `Node2D` nodes, and
//! rectangles and ellipses become `Area2D` nodes with collision shapes. Animated tiles
//! are placed as `AnimatedSprite` children of their layer. Properties and components
//! are kept in each node's `__meta__`.
//!
//! Only orthogonal maps are exported, and scenes cannot be loaded back.

mod builder;
mod scene;

use std::path::Path;

use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::Map;
use tiledmap_io_view::MapView;
use tracing::info;

use crate::atomic::write_bytes_atomically;
use crate::format::{ReadOptions, SaveFormat, WriteOptions, destination};
use builder::{SceneBuilder, TILESET_FILE};

/// The save-only Godot 3 scene format.
#[derive(Debug, Clone, Copy, Default)]
pub struct GodotSceneFormat;

impl GodotSceneFormat {
    pub const ID: &'static str = "godot";
    pub const EXTENSIONS: &'static [&'static str] = &["tscn"];

    fn unsupported() -> FormatError {
        FormatError::UnsupportedFeature("loading Godot scenes".to_string())
    }
}

impl SaveFormat for GodotSceneFormat {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "Godot 3 scene"
    }

    fn extensions(&self) -> &'static [&'static str] {
        Self::EXTENSIONS
    }

    fn parse_map(&self, _bytes: &[u8], _options: &ReadOptions) -> Result<Map> {
        Err(Self::unsupported())
    }

    fn load_map(&self, _path: &Path, _options: &ReadOptions) -> Result<Map> {
        Err(Self::unsupported())
    }

    fn save_map(&self, map: &dyn MapView, options: &WriteOptions) -> Result<()> {
        let path = destination(map)?.with_extension("tscn");
        let mut builder = SceneBuilder::new(options);
        map.accept(&mut builder)?;
        let (scene, tileset) = builder.finish();

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        write_bytes_atomically(&dir.join(TILESET_FILE), tileset.render().as_bytes())?;
        write_bytes_atomically(&path, scene.render().as_bytes())?;
        info!(
            "Exported Godot scene with {} nodes to {}",
            scene.nodes.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tiledmap_io_core::error::ErrorKind;
    use tiledmap_io_core::ir::{AnimationFrame, Extent, Layer, Orientation, TileMatrix};
    use tiledmap_io_view::IrMapView;

    use super::*;
    use crate::testing::{sample_map, sample_map_with_components};

    fn export(map: &Map, dir: &Path, options: &WriteOptions) -> Result<String> {
        let path = dir.join("level.tscn");
        GodotSceneFormat.save_map(&IrMapView::new(map).with_path(&path), options)?;
        Ok(fs::read_to_string(path).unwrap())
    }

    #[test]
    fn test_scene_layout() {
        let dir = tempfile::tempdir().unwrap();
        let text = export(&sample_map(), dir.path(), &WriteOptions::default()).unwrap();

        assert!(text.starts_with("[gd_scene load_steps=7 format=2]\n\n"));
        assert!(text.contains(
            "[ext_resource path=\"res://tileset.tres\" type=\"TileSet\" id=1]\n\
             [ext_resource path=\"res://images/terrain.png\" type=\"Texture\" id=2]\n"
        ));
        assert!(text.contains(
            "[sub_resource type=\"AtlasTexture\" id=1]\n\
             atlas = ExtResource( 2 )\n\
             region = Rect2( 16, 0, 16, 16 )\n"
        ));
        assert!(text.contains("region = Rect2( 32, 0, 16, 16 )\n"));
        assert!(text.contains(
            "[sub_resource type=\"SpriteFrames\" id=3]\n\
             animations = [ { \"frames\": [ SubResource( 1 ), SubResource( 2 ) ], \
             \"loop\": true, \"name\": \"Tile 2\", \"speed\": 10.0 } ]\n"
        ));
        assert!(text.contains(
            "[sub_resource type=\"RectangleShape2D\" id=4]\nextents = Vector2( 8, 4 )\n"
        ));
        assert!(text.contains(
            "[node name=\"Root\" type=\"Node2D\"]\n\
             __meta__ = { \"properties\": { \"music\": \"cave.ogg\" } }\n"
        ));
    }

    #[test]
    fn test_tile_layers() {
        let dir = tempfile::tempdir().unwrap();
        let text = export(&sample_map(), dir.path(), &WriteOptions::default()).unwrap();

        assert!(text.contains(
            "[node name=\"ground\" type=\"TileMap\" parent=\".\"]\n\
             tile_set = ExtResource( 1 )\n\
             format = 1\n\
             cell_size = Vector2( 16, 16 )\n\
             tile_data = PoolIntArray( 0, 1, 0, 1, 1, 1, 2, 1, 2, 3, 1, 3, 65536, 1, 65536, "
        ));
        assert!(text.contains("__meta__ = { \"properties\": { \"depth\": 2 } }\n"));
        assert!(text.contains(
            "[node name=\"Tile (0, 1)\" type=\"AnimatedSprite\" parent=\"ground\"]\n\
             position = Vector2( 16, 0 )\n\
             frames = SubResource( 3 )\n\
             speed_scale = 1.0\n\
             animation = \"Tile 2\"\n\
             playing = true\n\
             centered = false\n"
        ));
        assert!(text.contains("[node name=\"decor\" type=\"TileMap\" parent=\"group\"]\n"));
        assert!(text.contains("modulate = Color( 1, 1, 1, 0.5 )\n"));
        assert!(text.contains(
            "[node name=\"Tile (2, 3)\" type=\"AnimatedSprite\" parent=\"group/decor\"]\n\
             position = Vector2( 48, 32 )\n"
        ));
    }

    #[test]
    fn test_objects() {
        let dir = tempfile::tempdir().unwrap();
        let text = export(&sample_map(), dir.path(), &WriteOptions::default()).unwrap();

        assert!(text.contains(
            "[node name=\"Object 1 ('door')\" type=\"Area2D\" parent=\"things\"]\n\
             position = Vector2( 24, 36.5 )\n"
        ));
        assert!(text.contains("\"target\": \"level2\""));
        assert!(text.contains(
            "[node name=\"Shape\" type=\"CollisionShape2D\" parent=\"things/Object 1 ('door')\"]\n\
             shape = SubResource( 4 )\n"
        ));
        assert!(text.contains(
            "[node name=\"Object 2 ('spawn')\" type=\"Node2D\" parent=\"things\"]\n\
             position = Vector2( 8, 8 )\n"
        ));
        assert!(text.contains(
            "[node name=\"lights\" type=\"Node2D\" parent=\"group\"]\nvisible = false\n"
        ));
        assert!(text.contains(
            "[node name=\"Object 3\" type=\"Area2D\" parent=\"group/lights\"]\n\
             position = Vector2( 43, 7 )\n\
             visible = false\n"
        ));
        assert!(text.contains(
            "[node name=\"Shape\" type=\"CollisionPolygon2D\" parent=\"group/lights/Object 3\"]\n\
             polygon = PoolVector2Array( 3, 0, "
        ));
        // Tile collision objects have no place in the scene.
        assert_eq!(text.matches("CollisionShape2D").count(), 1);
    }

    #[test]
    fn test_tileset_resource() {
        let dir = tempfile::tempdir().unwrap();
        export(&sample_map(), dir.path(), &WriteOptions::default()).unwrap();

        let text = fs::read_to_string(dir.path().join("tileset.tres")).unwrap();
        assert!(text.starts_with("[gd_resource type=\"TileSet\" load_steps=2 format=2]\n"));
        assert!(text.contains("[ext_resource path=\"res://images/terrain.png\" type=\"Texture\" id=1]\n"));
        assert!(text.contains("1/name = \"terrain\"\n"));
        assert!(text.contains("1/region = Rect2( 0, 0, 64, 48 )\n"));
    }

    #[test]
    fn test_components_in_meta() {
        let dir = tempfile::tempdir().unwrap();
        let text = export(
            &sample_map_with_components(),
            dir.path(),
            &WriteOptions::default(),
        )
        .unwrap();

        assert!(text.contains(
            "__meta__ = { \"properties\": { \"music\": \"cave.ogg\" }, \
             \"components\": { \"Light\": { \"radius\": 4.0 } } }\n"
        ));
        assert!(text.contains("\"components\": { \"Door\": { \"locked\": true, \"key\": \"brass\" } }"));
    }

    #[test]
    fn test_ellipse_point_count() {
        let dir = tempfile::tempdir().unwrap();
        let options = WriteOptions {
            ellipse_point_count: 4,
            float_precision: Some(3),
            ..Default::default()
        };
        let text = export(&sample_map(), dir.path(), &options).unwrap();

        assert!(text.contains("polygon = PoolVector2Array( 3, 0, 0, 3, -3, 0, 0, -3 )\n"));
    }

    #[test]
    fn test_isometric_maps_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = sample_map();
        map.orientation = Orientation::Isometric;

        let err = export(&map, dir.path(), &WriteOptions::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        assert!(!dir.path().join("level.tscn").exists());
        assert!(!dir.path().join("tileset.tres").exists());
    }

    #[test]
    fn test_layers_wider_than_cell_packing_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = sample_map();
        let mut tiles = TileMatrix::new(Extent::new(1, 32_769));
        tiles.set(0, 0, 1);
        tiles.set(0, 32_768, 2);
        map.extent = tiles.extent();
        map.layers = vec![Layer::tile(1, "wide", tiles)];

        let err = export(&map, dir.path(), &WriteOptions::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        assert!(err.to_string().contains("32769x1"), "{err}");
        assert!(!dir.path().join("level.tscn").exists());
    }

    #[test]
    fn test_animation_frame_outside_tileset() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = sample_map();
        map.tilesets[0].tileset.tiles[0]
            .animation
            .push(AnimationFrame::new(u32::MAX, 100));

        let err = export(&map, dir.path(), &WriteOptions::default()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadStructure);
        assert!(!dir.path().join("level.tscn").exists());
    }

    #[test]
    fn test_loading_is_unsupported() {
        let format = GodotSceneFormat;
        let options = ReadOptions::default();

        let err = format.load_map(Path::new("missing.tscn"), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        let err = format.parse_map(b"[gd_scene format=2]", &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }
}
