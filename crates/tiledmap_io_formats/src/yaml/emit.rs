use std::path::Path;

use serde::Serialize;
use tiledmap_io_codec::{PlainTextStyle, TileCodec};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    Component, Layer, LayerKind, Map, Metadata, Object, ObjectKind, Tile, TileCompression,
    TileEncoding, TileMatrix, Tileset,
};
use tracing::debug;

use super::schema::{
    ComponentDefDoc, ComponentDoc, ComponentValueDoc, FORMAT_VERSION, FrameDoc, LayerDoc, MapDoc,
    ObjectDoc, PropertyDoc, SlotDoc, TileDoc, TilesetDoc, TilesetRefDoc,
};
use super::values::to_yaml;
use crate::atomic::write_bytes_atomically;
use crate::common::{path_to_string, tileset_file_names, widen_float};
use crate::format::WriteOptions;

pub(crate) struct YamlEmitter<'a> {
    codec: &'a TileCodec,
    options: &'a WriteOptions,
    prototypes: &'a [Component],
}

impl<'a> YamlEmitter<'a> {
    pub fn new(codec: &'a TileCodec, options: &'a WriteOptions, map: &'a Map) -> Self {
        Self {
            codec,
            options,
            prototypes: &map.components,
        }
    }

    /// Writes the map to `path` and, unless tilesets are embedded, one `<name>.yaml`
    /// file per tileset beside it.
    pub fn save(&self, map: &Map, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let names = tileset_file_names(&map.tilesets, "yaml");

        let mut tilesets = Vec::with_capacity(map.tilesets.len());
        for (tileset, name) in map.tilesets.iter().zip(names) {
            let mut document = self.tileset(&tileset.tileset);
            let entry = if self.options.embed_tilesets {
                TilesetRefDoc {
                    first_global_id: tileset.first_tile,
                    path: None,
                    tileset: Some(document),
                }
            } else {
                document.version = Some(FORMAT_VERSION);
                write_bytes_atomically(&dir.join(&name), &to_bytes(&document)?)?;
                TilesetRefDoc {
                    first_global_id: tileset.first_tile,
                    path: Some(name),
                    tileset: None,
                }
            };
            tilesets.push(entry);
        }

        let document = self.map_document(map, tilesets)?;
        write_bytes_atomically(path, &to_bytes(&document)?)?;
        debug!("Emitted YAML map to {}", path.display());
        Ok(())
    }

    pub fn map_document(&self, map: &Map, tilesets: Vec<TilesetRefDoc>) -> Result<MapDoc> {
        let format = map.tile_format;
        let level = |kind| {
            if format.compression == kind {
                format.compression_level
            } else {
                None
            }
        };
        let layers = map
            .layers
            .iter()
            .map(|layer| self.layer(map, layer))
            .collect::<Result<_>>()?;

        Ok(MapDoc {
            version: FORMAT_VERSION,
            name: map.meta.name.clone(),
            orientation: map.orientation.name().to_string(),
            row_count: map.extent.rows,
            column_count: map.extent.cols,
            tile_width: map.tile_size.x,
            tile_height: map.tile_size.y,
            next_layer_id: map.next_layer_id,
            next_object_id: map.next_object_id,
            tile_encoding: match format.encoding {
                TileEncoding::PlainText => "plain",
                TileEncoding::Base64 => "base64",
            }
            .to_string(),
            compression: format.compression.name().unwrap_or("none").to_string(),
            zlib_compression_level: level(TileCompression::Zlib),
            zstd_compression_level: level(TileCompression::Zstd),
            component_definitions: map.components.iter().map(|c| self.definition(c)).collect(),
            tilesets,
            layers,
            properties: self.properties(&map.meta),
            components: self.components(&map.meta),
        })
    }

    fn definition(&self, component: &Component) -> ComponentDefDoc {
        ComponentDefDoc {
            name: component.name.clone(),
            attributes: component
                .attributes
                .iter()
                .map(|slot| SlotDoc {
                    name: slot.name.clone(),
                    kind: slot.value.kind().name().to_string(),
                    default: (self.options.emit_default_properties
                        || !slot.value.has_default_value())
                    .then(|| self.value(&slot.value)),
                })
                .collect(),
        }
    }

    fn tileset(&self, tileset: &Tileset) -> TilesetDoc {
        TilesetDoc {
            version: None,
            name: tileset.meta.name.clone(),
            tile_width: tileset.tile_size.x,
            tile_height: tileset.tile_size.y,
            tile_count: tileset.tile_count,
            column_count: tileset.column_count,
            image_path: path_to_string(&tileset.image_path),
            image_width: tileset.image_size.x,
            image_height: tileset.image_size.y,
            tiles: tileset.tiles.iter().map(|tile| self.tile(tile)).collect(),
            properties: self.properties(&tileset.meta),
            components: self.components(&tileset.meta),
        }
    }

    fn tile(&self, tile: &Tile) -> TileDoc {
        TileDoc {
            id: tile.index,
            name: tile.meta.name.clone(),
            animation: tile
                .animation
                .iter()
                .map(|frame| FrameDoc {
                    tile: frame.tile_index,
                    duration: frame.duration_ms(),
                })
                .collect(),
            objects: tile.objects.iter().map(|object| self.object(object)).collect(),
            properties: self.properties(&tile.meta),
            components: self.components(&tile.meta),
        }
    }

    fn layer(&self, map: &Map, layer: &Layer) -> Result<LayerDoc> {
        let mut document = LayerDoc {
            id: layer.id,
            kind: String::new(),
            name: layer.meta.name.clone(),
            opacity: layer.opacity,
            visible: layer.visible,
            row_count: None,
            column_count: None,
            data: None,
            objects: Vec::new(),
            layers: Vec::new(),
            properties: self.properties(&layer.meta),
            components: self.components(&layer.meta),
        };
        match &layer.kind {
            LayerKind::Tile(tiles) => {
                document.kind = "tile-layer".to_string();
                if tiles.extent() != map.extent {
                    document.row_count = Some(tiles.extent().rows);
                    document.column_count = Some(tiles.extent().cols);
                }
                document.data = Some(self.tile_data(map, tiles)?);
            }
            LayerKind::Object(objects) => {
                document.kind = "object-layer".to_string();
                document.objects = objects.iter().map(|object| self.object(object)).collect();
            }
            LayerKind::Group(children) => {
                document.kind = "group-layer".to_string();
                document.layers = children
                    .iter()
                    .map(|child| self.layer(map, child))
                    .collect::<Result<_>>()?;
            }
        }
        Ok(document)
    }

    fn tile_data(&self, map: &Map, tiles: &TileMatrix) -> Result<String> {
        let format = map.tile_format;
        Ok(match format.encoding {
            TileEncoding::PlainText => {
                let style = if self.options.fold_tile_data {
                    PlainTextStyle::SPACED
                } else {
                    PlainTextStyle::SPACED_SINGLE_LINE
                };
                self.codec.encode_plain(tiles, style)
            }
            TileEncoding::Base64 => {
                self.codec
                    .encode_base64(tiles, format.compression, format.compression_level)?
            }
        })
    }

    fn object(&self, object: &Object) -> ObjectDoc {
        let has_size = object.kind != ObjectKind::Point;
        ObjectDoc {
            id: object.id,
            kind: match object.kind {
                ObjectKind::Point => "point",
                ObjectKind::Rect => "rect",
                ObjectKind::Ellipse => "ellipse",
            }
            .to_string(),
            name: object.meta.name.clone(),
            tag: object.tag.clone(),
            visible: object.visible,
            x: self.float(object.position.x),
            y: self.float(object.position.y),
            width: has_size.then(|| self.float(object.size.x)),
            height: has_size.then(|| self.float(object.size.y)),
            properties: self.properties(&object.meta),
            components: self.components(&object.meta),
        }
    }

    fn properties(&self, meta: &Metadata) -> Vec<PropertyDoc> {
        meta.properties
            .iter()
            .map(|property| PropertyDoc {
                name: property.name.clone(),
                kind: property.value.kind().name().to_string(),
                value: self.value(&property.value),
            })
            .collect()
    }

    /// Attached components. Values equal to the prototype default are left out unless
    /// `emit_default_properties` is set; loading fills them back in.
    fn components(&self, meta: &Metadata) -> Vec<ComponentDoc> {
        meta.components
            .iter()
            .map(|attached| {
                let prototype = self
                    .prototypes
                    .iter()
                    .find(|c| c.name == attached.prototype);
                let values = attached
                    .values
                    .iter()
                    .filter(|attr| {
                        self.options.emit_default_properties
                            || prototype.and_then(|p| p.attribute(&attr.name)) != Some(&attr.value)
                    })
                    .map(|attr| ComponentValueDoc {
                        name: attr.name.clone(),
                        value: self.value(&attr.value),
                    })
                    .collect();
                ComponentDoc {
                    prototype: attached.prototype.clone(),
                    values,
                }
            })
            .collect()
    }

    fn value(&self, value: &AttributeValue) -> serde_yaml::Value {
        to_yaml(value, self.options.float_precision)
    }

    fn float(&self, value: f32) -> f64 {
        widen_float(value, self.options.float_precision)
    }
}

fn to_bytes(document: &impl Serialize) -> Result<Vec<u8>> {
    serde_yaml::to_string(document)
        .map(String::into_bytes)
        .map_err(|err| FormatError::Io(std::io::Error::other(err)))
}
