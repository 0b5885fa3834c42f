//! Lossless YAML maps.
//!
//! Unlike the Tiled formats, this one stores everything the IR holds: vector and
//! color properties keep their kind, component prototypes are written under
//! `component-definitions`, and attached components under `components`. Loading a
//! saved map yields a map equal to the saved one.
//!
//! ```yaml
//! version: 1
//! row-count: 3
//! column-count: 4
//! tile-width: 16
//! tile-height: 16
//! tile-encoding: base64
//! compression: zstd
//! zstd-compression-level: 3
//! tilesets:
//!   - first-global-id: 1
//!     path: terrain.yaml
//! layers:
//!   - id: 1
//!     type: tile-layer
//!     name: ground
//!     data: KLUv/SAwgQEA...
//! ```
//!
//! Documents whose `version` is not `1` are rejected with
//! [`FormatError::UnsupportedVersion`](tiledmap_io_core::error::FormatError::UnsupportedVersion).

mod emit;
mod parse;
mod schema;
mod values;

use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::error::Result;
use tiledmap_io_core::ir::Map;
use tiledmap_io_view::{MapView, build_ir};

use crate::format::{ReadOptions, SaveFormat, WriteOptions, destination};
use emit::YamlEmitter;

#[derive(Debug, Clone, Default)]
pub struct YamlFormat {
    codec: TileCodec,
}

impl YamlFormat {
    pub const ID: &'static str = "yaml";
    pub const EXTENSIONS: &'static [&'static str] = &["yaml", "yml"];

    pub fn new(codec: TileCodec) -> Self {
        Self { codec }
    }
}

impl SaveFormat for YamlFormat {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "YAML"
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
        YamlEmitter::new(&self.codec, options, &map).save(&map, &path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use glam::{IVec2, Vec3};
    use pretty_assertions::assert_eq;
    use tiledmap_io_core::attribute::AttributeValue;
    use tiledmap_io_core::error::ErrorKind;
    use tiledmap_io_core::ir::{AttachedComponent, TileCompression, TileFormat};
    use tiledmap_io_view::IrMapView;

    use super::*;
    use crate::testing::{sample_map, sample_map_with_components};

    fn save(map: &Map, path: &Path, options: &WriteOptions) {
        YamlFormat::default()
            .save_map(&IrMapView::new(map).with_path(path), options)
            .unwrap();
    }

    fn load(path: &Path) -> Result<Map> {
        YamlFormat::default().load_map(path, &ReadOptions::default())
    }

    fn parse(text: &str) -> Result<Map> {
        YamlFormat::default().parse_map(text.as_bytes(), &ReadOptions::default())
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.yaml");
        let mut map = sample_map_with_components();
        map.meta.set_property("offset", AttributeValue::Int2(IVec2::new(3, -4)));
        map.meta
            .set_property("axis", AttributeValue::Float3(Vec3::new(0.1, 0.5, 1.0)));

        save(&map, &path, &WriteOptions::default());

        assert!(dir.path().join("terrain.yaml").exists());
        assert_eq!(load(&path).unwrap(), map);
    }

    #[test]
    fn test_round_trip_every_tile_format() {
        let formats = [
            TileFormat::plain(),
            TileFormat::base64(TileCompression::None),
            TileFormat::base64(TileCompression::Zlib).with_level(6),
            TileFormat::base64(TileCompression::Zstd).with_level(3),
        ];
        for format in formats {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("level.yml");
            let mut map = sample_map();
            map.tile_format = format;

            save(
                &map,
                &path,
                &WriteOptions {
                    embed_tilesets: true,
                    ..Default::default()
                },
            );

            assert_eq!(load(&path).unwrap(), map, "{format:?}");
        }
    }

    #[test]
    fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.yaml");
        save(&sample_map_with_components(), &path, &WriteOptions::default());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("version: 1\nname: level\n"));
        assert!(text.contains("#FF8000C0"));

        let document: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(document["tilesets"][0]["path"].as_str(), Some("terrain.yaml"));
        let ground = &document["layers"][0];
        assert_eq!(ground["type"].as_str(), Some("tile-layer"));
        assert_eq!(ground["data"].as_str(), Some("1 2 3 4\n5 6 7 8\n9 10 11 12"));
        let decor = &document["layers"][2]["layers"][0];
        assert_eq!(decor["opacity"].as_f64(), Some(0.5));
        assert!(decor.get("row-count").is_none());

        let tileset = fs::read_to_string(dir.path().join("terrain.yaml")).unwrap();
        assert!(tileset.starts_with("version: 1\nname: terrain\n"));
    }

    #[test]
    fn test_default_component_values_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.yaml");
        let map = sample_map_with_components();
        let light = |path: &Path| {
            let text = fs::read_to_string(path).unwrap();
            let document: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
            document["components"][0].clone()
        };

        save(&map, &path, &WriteOptions::default());
        assert_eq!(light(&path)["type"].as_str(), Some("Light"));
        assert!(light(&path).get("values").is_none());
        assert_eq!(load(&path).unwrap(), map);

        save(
            &map,
            &path,
            &WriteOptions {
                emit_default_properties: true,
                ..Default::default()
            },
        );
        assert_eq!(light(&path)["values"][0]["name"].as_str(), Some("radius"));
        assert_eq!(load(&path).unwrap(), map);
    }

    #[test]
    fn test_unknown_prototypes_are_dropped_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.yaml");
        let mut map = sample_map_with_components();
        map.meta.attach(AttachedComponent::new("Ghost"));

        save(&map, &path, &WriteOptions::default());

        let loaded = load(&path).unwrap();
        assert!(loaded.meta.component("Ghost").is_none());
        assert!(loaded.meta.component("Light").is_some());
    }

    #[test]
    fn test_missing_values_take_prototype_defaults() {
        let map = parse(
            r#"
version: 1
row-count: 0
column-count: 0
tile-width: 8
tile-height: 8
component-definitions:
  - name: Door
    attributes:
      - name: locked
        type: bool
        default: true
      - name: key
        type: string
components:
  - type: Door
    values:
      - name: key
        value: brass
"#,
        )
        .unwrap();

        let door = map.meta.component("Door").unwrap();
        assert_eq!(door.value("locked"), Some(&AttributeValue::Bool(true)));
        assert_eq!(door.value("key"), Some(&AttributeValue::from("brass")));
    }

    #[test]
    fn test_unknown_version() {
        let err = parse("version: 2\nrow-count: 1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
        assert!(err.to_string().contains("'2'"));

        let err = parse("row-count: 1\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadStructure);
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "version: 1\nlayers: [\n",
            "version: 1\ncolumn-count: 2\ntile-width: 8\ntile-height: 8\n",
            "version: 1\nrow-count: 1\ncolumn-count: 2\ntile-width: 8\ntile-height: 8\nlayers:\n  - id: 1\n    type: tile-layer\n    data: 1 2 3\n",
            "version: 1\nrow-count: 0\ncolumn-count: 0\ntile-width: 8\ntile-height: 8\nlayers:\n  - id: 1\n    type: image-layer\n",
            "version: 1\nrow-count: 0\ncolumn-count: 0\ntile-width: 8\ntile-height: 8\ntilesets:\n  - first-global-id: 1\n",
        ];
        for text in cases {
            let err = parse(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadStructure, "{text}");
        }
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let cases = [
            "version: 1\nrow-count: 18446744073709551615\ncolumn-count: 2\ntile-width: 8\ntile-height: 8\n",
            "version: 1\nrow-count: 4611686018427387904\ncolumn-count: 4\ntile-width: 8\ntile-height: 8\nlayers:\n  - id: 1\n    type: tile-layer\n    data: '1'\n",
            "version: 1\nrow-count: 1\ncolumn-count: 1\ntile-width: 8\ntile-height: 8\nlayers:\n  - id: 1\n    type: tile-layer\n    row-count: 18446744073709551615\n    data: ''\n",
        ];
        for text in cases {
            let err = parse(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadStructure, "{text}");
            assert!(err.to_string().contains("too large"), "{err}");
        }
    }

    #[test]
    fn test_repeated_property_keeps_last_value() {
        let map = parse(
            "version: 1\nrow-count: 0\ncolumn-count: 0\ntile-width: 8\ntile-height: 8\nproperties:\n  - name: hp\n    type: int\n    value: 3\n  - name: title\n    type: string\n    value: Cave\n  - name: hp\n    type: int\n    value: 5\n",
        )
        .unwrap();

        assert_eq!(map.meta.properties.len(), 2);
        assert_eq!(map.meta.properties[0].name, "hp");
        assert_eq!(map.meta.property("hp"), Some(&AttributeValue::Int(5)));
    }

    #[test]
    fn test_property_type_mismatch() {
        let err = parse(
            "version: 1\nrow-count: 0\ncolumn-count: 0\ntile-width: 8\ntile-height: 8\nproperties:\n  - name: hp\n    type: int\n    value: lots\n",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_missing_external_tileset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.yaml");
        fs::write(
            &path,
            "version: 1\nrow-count: 0\ncolumn-count: 0\ntile-width: 8\ntile-height: 8\ntilesets:\n  - first-global-id: 1\n    path: gone.yaml\n",
        )
        .unwrap();

        assert_eq!(load(&path).unwrap_err().kind(), ErrorKind::BadFile);
    }
}
