//! Tiled XML maps (`.tmx`) and tilesets (`.tsx`).
//!
//! Documents are written with `version="1.7"` and `tiledversion="1.9.0"`. When
//! loading, a different `version` only logs a warning unless
//! [`ReadOptions::strict_version`] is set.

mod dom;
mod emit;
mod parse;

use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::error::Result;
use tiledmap_io_core::ir::Map;
use tiledmap_io_view::{MapView, build_ir};

use crate::format::{ReadOptions, SaveFormat, WriteOptions, destination};
use emit::TmxEmitter;

#[derive(Debug, Clone, Default)]
pub struct TmxFormat {
    codec: TileCodec,
}

impl TmxFormat {
    pub const ID: &'static str = "tmx";
    pub const EXTENSIONS: &'static [&'static str] = &["tmx"];

    pub fn new(codec: TileCodec) -> Self {
        Self { codec }
    }
}

impl SaveFormat for TmxFormat {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn name(&self) -> &'static str {
        "Tiled XML"
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
        TmxEmitter::new(&self.codec, options).save(&map, &path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tiledmap_io_core::attribute::AttributeValue;
    use tiledmap_io_core::ir::{TileCompression, TileFormat};
    use tiledmap_io_view::IrMapView;

    use super::*;
    use crate::testing::sample_map;

    fn save(map: &Map, path: &Path, options: &WriteOptions) {
        TmxFormat::default()
            .save_map(&IrMapView::new(map).with_path(path), options)
            .unwrap();
    }

    fn load(path: &Path) -> Map {
        TmxFormat::default()
            .load_map(path, &ReadOptions::default())
            .unwrap()
    }

    #[test]
    fn test_round_trip_with_external_tileset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.tmx");
        let map = sample_map();

        save(&map, &path, &WriteOptions::default());

        let tileset = fs::read_to_string(dir.path().join("terrain.tsx")).unwrap();
        assert!(tileset.contains(r#"<tileset version="1.7" tiledversion="1.9.0" name="terrain""#));
        assert_eq!(load(&path), map);
    }

    #[test]
    fn test_round_trip_every_tile_format() {
        let formats = [
            TileFormat::plain(),
            TileFormat::base64(TileCompression::None),
            TileFormat::base64(TileCompression::Zlib).with_level(9),
            TileFormat::base64(TileCompression::Zstd),
        ];
        for format in formats {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("level.tmx");
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

            assert_eq!(load(&path), map, "{format:?}");
        }
    }

    #[test]
    fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.tmx");
        save(&sample_map(), &path, &WriteOptions::default());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(r#"<map version="1.7" tiledversion="1.9.0" orientation="orthogonal""#));
        assert!(text.contains(r#"<tileset firstgid="1" source="terrain.tsx"/>"#));
        assert!(text.contains("<data encoding=\"csv\">\n1,2,3,4,\n5,6,7,8,\n9,10,11,12\n</data>"));
        assert!(text.contains(r##"<property name="tint" type="color" value="#C0FF8000"/>"##));
        assert!(text.contains(r#"<layer id="4" name="decor" width="4" height="3" opacity="0.5">"#));
        assert!(text.contains(r#"<objectgroup id="5" name="lights" visible="0">"#));
    }

    #[test]
    fn test_unfolded_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.tmx");
        let options = WriteOptions {
            fold_tile_data: false,
            indent_output: false,
            ..Default::default()
        };

        save(&sample_map(), &path, &options);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n1,2,3,4,5,6,7,8,9,10,11,12\n"));
        assert_eq!(load(&path), sample_map());
    }

    #[test]
    fn test_multiline_string_property() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.tmx");
        let mut map = sample_map();
        map.meta.set_property("notes", "line one\nline two");
        map.meta.set_property("poem", "  indented\n\tlast line  \n");

        save(&map, &path, &WriteOptions::default());

        let loaded = load(&path);
        assert_eq!(
            loaded.meta.property("notes"),
            Some(&AttributeValue::from("line one\nline two"))
        );
        assert_eq!(
            loaded.meta.property("poem"),
            Some(&AttributeValue::from("  indented\n\tlast line  \n"))
        );
    }
}
