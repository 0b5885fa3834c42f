use std::path::Path;

use serde_json::{Value, json};
use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    Layer, LayerKind, Map, Metadata, Object, ObjectKind, TileEncoding, TileFormat, Tileset,
};
use tracing::debug;

use crate::atomic::write_bytes_atomically;
use crate::common::{json_float, path_to_string, tileset_file_names};
use crate::format::WriteOptions;
use crate::tiled_props::{FORMAT_VERSION, TILED_VERSION, tiled_text, tiled_type};

type JsonObject = serde_json::Map<String, Value>;

pub(crate) struct TmjEmitter<'a> {
    codec: &'a TileCodec,
    options: &'a WriteOptions,
}

impl<'a> TmjEmitter<'a> {
    pub fn new(codec: &'a TileCodec, options: &'a WriteOptions) -> Self {
        Self { codec, options }
    }

    /// Writes the map to `path` and, unless tilesets are embedded, one `.tsj` file per
    /// tileset beside it.
    pub fn save(&self, map: &Map, path: &Path) -> Result<()> {
        let sources = if self.options.embed_tilesets {
            vec![None; map.tilesets.len()]
        } else {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            let names = tileset_file_names(&map.tilesets, "tsj");
            for (tileset, name) in map.tilesets.iter().zip(&names) {
                let document = self.external_tileset(&tileset.tileset);
                write_bytes_atomically(&dir.join(name), &self.to_bytes(&document)?)?;
            }
            names.into_iter().map(Some).collect()
        };

        let document = self.map_document(map, &sources)?;
        write_bytes_atomically(path, &self.to_bytes(&document)?)?;
        debug!("Emitted TMJ map to {}", path.display());
        Ok(())
    }

    fn to_bytes(&self, document: &Value) -> Result<Vec<u8>> {
        let bytes = if self.options.indent_output {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        };
        bytes.map_err(|err| FormatError::Io(err.into()))
    }

    fn float(&self, value: f32) -> Value {
        json_float(value, self.options.float_precision)
    }

    /// The map document. `sources[i]` names the external file of tileset `i`, or is
    /// `None` to embed it.
    pub fn map_document(&self, map: &Map, sources: &[Option<String>]) -> Result<Value> {
        let layers = map
            .layers
            .iter()
            .map(|layer| self.layer(layer, &map.tile_format))
            .collect::<Result<Vec<_>>>()?;

        let tilesets: Vec<Value> = map
            .tilesets
            .iter()
            .zip(sources)
            .map(|(tileset, source)| {
                let mut entry = JsonObject::new();
                entry.insert("firstgid".into(), json!(tileset.first_tile));
                match source {
                    Some(source) => {
                        entry.insert("source".into(), json!(source));
                    }
                    None => entry.extend(self.tileset(&tileset.tileset)),
                }
                Value::Object(entry)
            })
            .collect();

        let mut document = json!({
            "compressionlevel": map.tile_format.compression_level.unwrap_or(-1),
            "height": map.extent.rows,
            "infinite": false,
            "layers": layers,
            "nextlayerid": map.next_layer_id,
            "nextobjectid": map.next_object_id,
            "orientation": map.orientation.name(),
            "renderorder": "right-down",
            "tiledversion": TILED_VERSION,
            "tileheight": map.tile_size.y,
            "tilesets": tilesets,
            "tilewidth": map.tile_size.x,
            "type": "map",
            "version": FORMAT_VERSION,
            "width": map.extent.cols,
        });
        self.insert_properties(&mut document, &map.meta);
        Ok(document)
    }

    fn external_tileset(&self, tileset: &Tileset) -> Value {
        let mut document = self.tileset(tileset);
        document.insert("tiledversion".into(), json!(TILED_VERSION));
        document.insert("type".into(), json!("tileset"));
        document.insert("version".into(), json!(FORMAT_VERSION));
        Value::Object(document)
    }

    fn tileset(&self, tileset: &Tileset) -> JsonObject {
        let mut value = json!({
            "columns": tileset.column_count,
            "image": path_to_string(&tileset.image_path),
            "imageheight": tileset.image_size.y,
            "imagewidth": tileset.image_size.x,
            "margin": 0,
            "name": tileset.name(),
            "spacing": 0,
            "tilecount": tileset.tile_count,
            "tileheight": tileset.tile_size.y,
            "tilewidth": tileset.tile_size.x,
        });

        let tiles: Vec<Value> = tileset
            .tiles
            .iter()
            .map(|tile| {
                let mut value = json!({ "id": tile.index });
                if tile.is_animated() {
                    value["animation"] = tile
                        .animation
                        .iter()
                        .map(|frame| {
                            json!({ "duration": frame.duration_ms(), "tileid": frame.tile_index })
                        })
                        .collect();
                }
                if !tile.objects.is_empty() {
                    value["objectgroup"] = json!({
                        "draworder": "index",
                        "name": "",
                        "objects": self.objects(&tile.objects),
                        "opacity": 1,
                        "type": "objectgroup",
                        "visible": true,
                        "x": 0,
                        "y": 0,
                    });
                }
                self.insert_properties(&mut value, &tile.meta);
                value
            })
            .collect();
        if !tiles.is_empty() {
            value["tiles"] = Value::Array(tiles);
        }
        self.insert_properties(&mut value, &tileset.meta);

        match value {
            Value::Object(object) => object,
            _ => JsonObject::new(),
        }
    }

    fn layer(&self, layer: &Layer, format: &TileFormat) -> Result<Value> {
        let mut value = json!({
            "id": layer.id,
            "name": layer.name(),
            "opacity": self.float(layer.opacity),
            "visible": layer.visible,
            "x": 0,
            "y": 0,
        });

        match &layer.kind {
            LayerKind::Tile(tiles) => {
                let extent = tiles.extent();
                value["type"] = json!("tilelayer");
                value["width"] = json!(extent.cols);
                value["height"] = json!(extent.rows);
                match format.encoding {
                    TileEncoding::PlainText => value["data"] = json!(tiles.as_slice()),
                    TileEncoding::Base64 => {
                        let data = self.codec.encode_base64(
                            tiles,
                            format.compression,
                            format.compression_level,
                        )?;
                        value["encoding"] = json!("base64");
                        if let Some(name) = format.compression.name() {
                            value["compression"] = json!(name);
                        }
                        value["data"] = json!(data);
                    }
                }
            }
            LayerKind::Object(objects) => {
                value["type"] = json!("objectgroup");
                value["draworder"] = json!("topdown");
                value["objects"] = self.objects(objects);
            }
            LayerKind::Group(children) => {
                value["type"] = json!("group");
                value["layers"] = children
                    .iter()
                    .map(|child| self.layer(child, format))
                    .collect::<Result<Vec<_>>>()?
                    .into();
            }
        }
        self.insert_properties(&mut value, &layer.meta);
        Ok(value)
    }

    fn objects(&self, objects: &[Object]) -> Value {
        objects.iter().map(|object| self.object(object)).collect()
    }

    fn object(&self, object: &Object) -> Value {
        let mut value = json!({
            "height": self.float(object.size.y),
            "id": object.id,
            "name": object.meta.name,
            "rotation": 0,
            "type": object.tag,
            "visible": object.visible,
            "width": self.float(object.size.x),
            "x": self.float(object.position.x),
            "y": self.float(object.position.y),
        });
        match object.kind {
            ObjectKind::Point => value["point"] = json!(true),
            ObjectKind::Ellipse => value["ellipse"] = json!(true),
            ObjectKind::Rect => {}
        }
        self.insert_properties(&mut value, &object.meta);
        value
    }

    /// Adds a `properties` array. Components have no Tiled equivalent and are skipped.
    fn insert_properties(&self, target: &mut Value, meta: &Metadata) {
        if meta.properties.is_empty() {
            return;
        }
        let precision = self.options.float_precision;
        target["properties"] = meta
            .properties
            .iter()
            .map(|property| {
                let value = &property.value;
                let json_value = match value {
                    AttributeValue::Int(n) => json!(n),
                    AttributeValue::Object(n) => json!(n),
                    AttributeValue::Float(n) => {
                        json_float(*n, precision)
                    }
                    AttributeValue::Bool(flag) => json!(flag),
                    other => json!(tiled_text(other, precision)),
                };
                json!({
                    "name": property.name,
                    "type": tiled_type(value),
                    "value": json_value,
                })
            })
            .collect();
    }
}
