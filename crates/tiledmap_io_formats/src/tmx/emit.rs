use std::fmt::Display;
use std::io;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tiledmap_io_codec::{PlainTextStyle, TileCodec};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    Layer, LayerKind, Map, Metadata, Object, ObjectKind, Tile, TileEncoding, TileFormat,
    TileMatrix, Tileset,
};
use tracing::debug;

use crate::atomic::write_bytes_atomically;
use crate::common::{format_float, path_to_string, tileset_file_names};
use crate::format::WriteOptions;
use crate::tiled_props::{FORMAT_VERSION, TILED_VERSION, tiled_text, tiled_type};

type Attributes<'a> = Vec<(&'a str, String)>;

fn write_error(err: impl Display) -> FormatError {
    FormatError::Io(io::Error::other(err.to_string()))
}

/// Event writer with the element helpers the emitter needs.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new(indent: bool) -> Self {
        let writer = if indent {
            Writer::new_with_indent(Vec::new(), b' ', 1)
        } else {
            Writer::new(Vec::new())
        };
        Self { writer }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event).map_err(write_error)
    }

    fn declaration(&mut self) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn start<'a>(name: &'a str, attributes: &'a [(&'a str, String)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for (key, value) in attributes {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }

    fn open(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<()> {
        self.event(Event::Start(Self::start(name, attributes)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, String)]) -> Result<()> {
        self.event(Event::Empty(Self::start(name, attributes)))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn finish(self) -> Vec<u8> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        bytes
    }
}

pub(crate) struct TmxEmitter<'a> {
    codec: &'a TileCodec,
    options: &'a WriteOptions,
}

impl<'a> TmxEmitter<'a> {
    pub fn new(codec: &'a TileCodec, options: &'a WriteOptions) -> Self {
        Self { codec, options }
    }

    /// Writes the map to `path` and, unless tilesets are embedded, one `.tsx` file per
    /// tileset beside it.
    pub fn save(&self, map: &Map, path: &Path) -> Result<()> {
        let sources = if self.options.embed_tilesets {
            vec![None; map.tilesets.len()]
        } else {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            let names = tileset_file_names(&map.tilesets, "tsx");
            for (tileset, name) in map.tilesets.iter().zip(&names) {
                let mut out = XmlOut::new(self.options.indent_output);
                out.declaration()?;
                self.write_tileset(&mut out, &tileset.tileset, None)?;
                write_bytes_atomically(&dir.join(name), &out.finish())?;
            }
            names.into_iter().map(Some).collect()
        };

        let document = self.map_document(map, &sources)?;
        write_bytes_atomically(path, &document)?;
        debug!("Emitted TMX map to {}", path.display());
        Ok(())
    }

    fn float(&self, value: f32) -> String {
        format_float(value, self.options.float_precision)
    }

    pub fn map_document(&self, map: &Map, sources: &[Option<String>]) -> Result<Vec<u8>> {
        let mut out = XmlOut::new(self.options.indent_output);
        out.declaration()?;

        let mut attributes: Attributes = vec![
            ("version", FORMAT_VERSION.to_string()),
            ("tiledversion", TILED_VERSION.to_string()),
            ("orientation", map.orientation.name().to_string()),
            ("renderorder", "right-down".to_string()),
        ];
        if let Some(level) = map.tile_format.compression_level {
            attributes.push(("compressionlevel", level.to_string()));
        }
        attributes.extend([
            ("width", map.extent.cols.to_string()),
            ("height", map.extent.rows.to_string()),
            ("tilewidth", map.tile_size.x.to_string()),
            ("tileheight", map.tile_size.y.to_string()),
            ("infinite", "0".to_string()),
            ("nextlayerid", map.next_layer_id.to_string()),
            ("nextobjectid", map.next_object_id.to_string()),
        ]);
        out.open("map", &attributes)?;
        self.write_properties(&mut out, &map.meta)?;

        for (tileset, source) in map.tilesets.iter().zip(sources) {
            match source {
                Some(source) => out.empty(
                    "tileset",
                    &[
                        ("firstgid", tileset.first_tile.to_string()),
                        ("source", source.clone()),
                    ],
                )?,
                None => self.write_tileset(&mut out, &tileset.tileset, Some(tileset.first_tile))?,
            }
        }
        for layer in &map.layers {
            self.write_layer(&mut out, layer, &map.tile_format)?;
        }

        out.close("map")?;
        Ok(out.finish())
    }

    /// Writes a `<tileset>`. Embedded tilesets carry `firstgid`, external files carry
    /// the format version instead.
    fn write_tileset(
        &self,
        out: &mut XmlOut,
        tileset: &Tileset,
        first_tile: Option<u32>,
    ) -> Result<()> {
        let mut attributes: Attributes = match first_tile {
            Some(first_tile) => vec![("firstgid", first_tile.to_string())],
            None => vec![
                ("version", FORMAT_VERSION.to_string()),
                ("tiledversion", TILED_VERSION.to_string()),
            ],
        };
        attributes.extend([
            ("name", tileset.name().to_string()),
            ("tilewidth", tileset.tile_size.x.to_string()),
            ("tileheight", tileset.tile_size.y.to_string()),
            ("tilecount", tileset.tile_count.to_string()),
            ("columns", tileset.column_count.to_string()),
        ]);
        out.open("tileset", &attributes)?;
        self.write_properties(out, &tileset.meta)?;
        out.empty(
            "image",
            &[
                ("source", path_to_string(&tileset.image_path)),
                ("width", tileset.image_size.x.to_string()),
                ("height", tileset.image_size.y.to_string()),
            ],
        )?;
        for tile in &tileset.tiles {
            self.write_tile(out, tile)?;
        }
        out.close("tileset")
    }

    fn write_tile(&self, out: &mut XmlOut, tile: &Tile) -> Result<()> {
        let attributes = [("id", tile.index.to_string())];
        if tile.meta.properties.is_empty() && tile.objects.is_empty() && !tile.is_animated() {
            return out.empty("tile", &attributes);
        }

        out.open("tile", &attributes)?;
        self.write_properties(out, &tile.meta)?;
        if !tile.objects.is_empty() {
            out.open("objectgroup", &[("draworder", "index".to_string())])?;
            for object in &tile.objects {
                self.write_object(out, object)?;
            }
            out.close("objectgroup")?;
        }
        if tile.is_animated() {
            out.open("animation", &[])?;
            for frame in &tile.animation {
                out.empty(
                    "frame",
                    &[
                        ("tileid", frame.tile_index.to_string()),
                        ("duration", frame.duration_ms().to_string()),
                    ],
                )?;
            }
            out.close("animation")?;
        }
        out.close("tile")
    }

    fn layer_attributes(&self, layer: &Layer) -> Attributes<'static> {
        let mut attributes = vec![
            ("id", layer.id.to_string()),
            ("name", layer.name().to_string()),
        ];
        if let Some(tiles) = layer.tiles() {
            attributes.push(("width", tiles.extent().cols.to_string()));
            attributes.push(("height", tiles.extent().rows.to_string()));
        }
        if layer.opacity != 1.0 || self.options.emit_default_properties {
            attributes.push(("opacity", self.float(layer.opacity)));
        }
        if !layer.visible || self.options.emit_default_properties {
            attributes.push(("visible", u8::from(layer.visible).to_string()));
        }
        attributes
    }

    fn write_layer(&self, out: &mut XmlOut, layer: &Layer, format: &TileFormat) -> Result<()> {
        let attributes = self.layer_attributes(layer);
        match &layer.kind {
            LayerKind::Tile(tiles) => {
                out.open("layer", &attributes)?;
                self.write_properties(out, &layer.meta)?;
                self.write_data(out, tiles, format)?;
                out.close("layer")
            }
            LayerKind::Object(objects) => {
                out.open("objectgroup", &attributes)?;
                self.write_properties(out, &layer.meta)?;
                for object in objects {
                    self.write_object(out, object)?;
                }
                out.close("objectgroup")
            }
            LayerKind::Group(children) => {
                out.open("group", &attributes)?;
                self.write_properties(out, &layer.meta)?;
                for child in children {
                    self.write_layer(out, child, format)?;
                }
                out.close("group")
            }
        }
    }

    fn write_data(&self, out: &mut XmlOut, tiles: &TileMatrix, format: &TileFormat) -> Result<()> {
        match format.encoding {
            TileEncoding::PlainText => {
                out.open("data", &[("encoding", "csv".to_string())])?;
                let style = if self.options.fold_tile_data {
                    PlainTextStyle::TILED_CSV
                } else {
                    PlainTextStyle::CSV_SINGLE_LINE
                };
                let text = self.codec.encode_plain(tiles, style);
                if !text.is_empty() {
                    out.text(&format!("\n{text}\n"))?;
                }
            }
            TileEncoding::Base64 => {
                let mut attributes = vec![("encoding", "base64".to_string())];
                if let Some(name) = format.compression.name() {
                    attributes.push(("compression", name.to_string()));
                }
                out.open("data", &attributes)?;
                let text = self.codec.encode_base64(
                    tiles,
                    format.compression,
                    format.compression_level,
                )?;
                out.text(&text)?;
            }
        }
        out.close("data")
    }

    fn write_object(&self, out: &mut XmlOut, object: &Object) -> Result<()> {
        let mut attributes: Attributes = vec![("id", object.id.to_string())];
        if !object.meta.name.is_empty() {
            attributes.push(("name", object.meta.name.clone()));
        }
        if !object.tag.is_empty() {
            attributes.push(("type", object.tag.clone()));
        }
        attributes.push(("x", self.float(object.position.x)));
        attributes.push(("y", self.float(object.position.y)));
        if object.kind != ObjectKind::Point {
            attributes.push(("width", self.float(object.size.x)));
            attributes.push(("height", self.float(object.size.y)));
        }
        if !object.visible {
            attributes.push(("visible", "0".to_string()));
        }

        let shape = match object.kind {
            ObjectKind::Point => Some("point"),
            ObjectKind::Ellipse => Some("ellipse"),
            ObjectKind::Rect => None,
        };
        if shape.is_none() && object.meta.properties.is_empty() {
            return out.empty("object", &attributes);
        }

        out.open("object", &attributes)?;
        self.write_properties(out, &object.meta)?;
        if let Some(shape) = shape {
            out.empty(shape, &[])?;
        }
        out.close("object")
    }

    /// Writes `<properties>`. Components have no Tiled equivalent and are skipped.
    fn write_properties(&self, out: &mut XmlOut, meta: &Metadata) -> Result<()> {
        if meta.properties.is_empty() {
            return Ok(());
        }
        out.open("properties", &[])?;
        for property in &meta.properties {
            let mut attributes: Attributes = vec![("name", property.name.clone())];
            let type_name = tiled_type(&property.value);
            if type_name != "string" {
                attributes.push(("type", type_name.to_string()));
            }
            let text = tiled_text(&property.value, self.options.float_precision);
            match &property.value {
                AttributeValue::String(_) if text.contains('\n') => {
                    out.open("property", &attributes)?;
                    out.text(&text)?;
                    out.close("property")?;
                }
                _ => {
                    attributes.push(("value", text));
                    out.empty("property", &attributes)?;
                }
            }
        }
        out.close("properties")
    }
}
