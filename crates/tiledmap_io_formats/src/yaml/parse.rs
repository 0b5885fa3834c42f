use std::fs;
use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use tiledmap_io_codec::{PlainTextStyle, TileCodec};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    AnimationFrame, AttachedComponent, Component, Extent, Layer, LayerKind, Map, Metadata,
    NamedAttribute, Object, ObjectKind, Orientation, Tile, TileCompression, TileEncoding,
    TileFormat, TileMatrix, Tileset, TilesetRef,
};
use tracing::{debug, warn};

use super::schema::{
    ComponentDefDoc, ComponentDoc, FORMAT_VERSION, LayerDoc, MapDoc, ObjectDoc, PropertyDoc,
    TileDoc, TilesetDoc, TilesetRefDoc,
};
use super::values::{from_yaml, parse_kind};
use crate::common::{grid_extent, resolve_path};
use crate::format::ReadOptions;

pub(crate) fn parse_map(bytes: &[u8], options: &ReadOptions, codec: &TileCodec) -> Result<Map> {
    let document: MapDoc = parse_document(bytes, "map")?;
    let parser = YamlParser {
        codec,
        base_dir: options.base_dir(),
    };
    parser.map(document)
}

/// Checks `version` on the raw tree before the typed parse, so that documents of a
/// later revision fail with a version error rather than a structure error.
fn parse_document<T: DeserializeOwned>(bytes: &[u8], context: &str) -> Result<T> {
    let invalid =
        |err: serde_yaml::Error| FormatError::bad_structure(context, format!("invalid YAML: {err}"));
    let tree: Value = serde_yaml::from_slice(bytes).map_err(invalid)?;
    match tree.get("version") {
        None => return Err(FormatError::missing_field(context, "version")),
        Some(version) if version.as_u64() == Some(u64::from(FORMAT_VERSION)) => {}
        Some(version) => {
            let found = match version {
                Value::String(text) => text.clone(),
                other => serde_yaml::to_string(other)
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default(),
            };
            return Err(FormatError::UnsupportedVersion {
                found,
                expected: FORMAT_VERSION.to_string(),
            });
        }
    }
    serde_yaml::from_value(tree).map_err(invalid)
}

struct YamlParser<'a> {
    codec: &'a TileCodec,
    base_dir: &'a Path,
}

impl YamlParser<'_> {
    fn map(&self, document: MapDoc) -> Result<Map> {
        let mut map = Map::new(
            grid_extent(document.row_count, document.column_count, "map")?,
            UVec2::new(document.tile_width, document.tile_height),
        );
        map.orientation = Orientation::from_name(&document.orientation).ok_or_else(|| {
            FormatError::bad_structure(
                "map",
                format!("unknown orientation '{}'", document.orientation),
            )
        })?;
        map.tile_format = tile_format(&document)?;
        map.components = document
            .component_definitions
            .iter()
            .map(definition)
            .collect::<Result<_>>()?;
        map.meta.name = document.name;

        map.tilesets = document
            .tilesets
            .into_iter()
            .map(|entry| self.tileset_ref(entry, &map.components))
            .collect::<Result<_>>()?;
        map.layers = document
            .layers
            .into_iter()
            .map(|layer| self.layer(layer, &map))
            .collect::<Result<_>>()?;
        map.meta.properties = properties("map", &document.properties)?;
        map.meta.components = components("map", &document.components, &map.components)?;

        map.next_layer_id = document.next_layer_id;
        map.next_object_id = document.next_object_id;
        map.ensure_next_ids();
        map.validate()?;
        debug!(
            "Parsed YAML map with {} layers and {} tilesets",
            map.layers.len(),
            map.tilesets.len()
        );
        Ok(map)
    }

    fn tileset_ref(&self, entry: TilesetRefDoc, prototypes: &[Component]) -> Result<TilesetRef> {
        let document = match (entry.path, entry.tileset) {
            (Some(path), None) => {
                let file = resolve_path(self.base_dir, &path);
                let bytes = fs::read(&file).map_err(|err| FormatError::bad_file(&file, err))?;
                parse_document(&bytes, &path)?
            }
            (None, Some(tileset)) => tileset,
            _ => {
                return Err(FormatError::bad_structure(
                    format!("tileset at {}", entry.first_global_id),
                    "expected exactly one of 'path' and 'tileset'",
                ));
            }
        };
        Ok(TilesetRef {
            first_tile: entry.first_global_id,
            tileset: tileset(document, prototypes)?,
        })
    }

    fn layer(&self, document: LayerDoc, map: &Map) -> Result<Layer> {
        let context = format!("layer {}", document.id);
        let kind = match document.kind.as_str() {
            "tile-layer" => {
                let extent = match (document.row_count, document.column_count) {
                    (None, None) => map.extent,
                    (rows, cols) => grid_extent(
                        rows.unwrap_or(map.extent.rows),
                        cols.unwrap_or(map.extent.cols),
                        &context,
                    )?,
                };
                let data = document.data.as_deref().unwrap_or_default();
                LayerKind::Tile(self.tile_data(data, extent, &map.tile_format)?)
            }
            "object-layer" => LayerKind::Object(
                document
                    .objects
                    .iter()
                    .map(|object| self::object(object, &map.components))
                    .collect::<Result<_>>()?,
            ),
            "group-layer" => LayerKind::Group(
                document
                    .layers
                    .into_iter()
                    .map(|child| self.layer(child, map))
                    .collect::<Result<_>>()?,
            ),
            other => {
                return Err(FormatError::bad_structure(
                    context,
                    format!("unknown layer type '{other}'"),
                ));
            }
        };
        Ok(Layer {
            id: document.id,
            opacity: document.opacity,
            visible: document.visible,
            meta: metadata(
                &context,
                document.name,
                &document.properties,
                &document.components,
                &map.components,
            )?,
            kind,
        })
    }

    fn tile_data(&self, data: &str, extent: Extent, format: &TileFormat) -> Result<TileMatrix> {
        Ok(match format.encoding {
            TileEncoding::PlainText => {
                self.codec
                    .decode_plain_flat(data, extent, PlainTextStyle::SPACED)?
            }
            TileEncoding::Base64 => self.codec.decode_base64(data, extent, format.compression)?,
        })
    }
}

fn tile_format(document: &MapDoc) -> Result<TileFormat> {
    let encoding = match document.tile_encoding.as_str() {
        "plain" => TileEncoding::PlainText,
        "base64" => TileEncoding::Base64,
        other => {
            return Err(FormatError::bad_structure(
                "map",
                format!("unknown tile encoding '{other}'"),
            ));
        }
    };
    let compression = TileCompression::from_name(&document.compression).ok_or_else(|| {
        FormatError::bad_structure(
            "map",
            format!("unknown compression '{}'", document.compression),
        )
    })?;
    Ok(TileFormat {
        encoding,
        compression,
        compression_level: match compression {
            TileCompression::None => None,
            TileCompression::Zlib => document.zlib_compression_level,
            TileCompression::Zstd => document.zstd_compression_level,
        },
    })
}

fn definition(document: &ComponentDefDoc) -> Result<Component> {
    let context = format!("component '{}'", document.name);
    let mut component = Component::new(&document.name);
    for slot in &document.attributes {
        let kind = parse_kind(&context, &slot.kind)?;
        let default = match &slot.default {
            Some(value) => from_yaml(&context, kind, value)?,
            None => AttributeValue::default_for(kind),
        };
        component = component.with_attribute(&slot.name, default);
    }
    Ok(component)
}

fn tileset(document: TilesetDoc, prototypes: &[Component]) -> Result<Tileset> {
    let context = format!("tileset '{}'", document.name);
    let tiles = document
        .tiles
        .into_iter()
        .map(|tile| self::tile(tile, prototypes))
        .collect::<Result<_>>()?;
    Ok(Tileset {
        meta: metadata(
            &context,
            document.name,
            &document.properties,
            &document.components,
            prototypes,
        )?,
        tile_size: UVec2::new(document.tile_width, document.tile_height),
        tile_count: document.tile_count,
        column_count: document.column_count,
        image_path: PathBuf::from(document.image_path),
        image_size: UVec2::new(document.image_width, document.image_height),
        tiles,
    })
}

fn tile(document: TileDoc, prototypes: &[Component]) -> Result<Tile> {
    let context = format!("tile {}", document.id);
    let mut tile = Tile::new(document.id);
    tile.animation = document
        .animation
        .iter()
        .map(|frame| AnimationFrame::new(frame.tile, frame.duration))
        .collect();
    tile.objects = document
        .objects
        .iter()
        .map(|object| self::object(object, prototypes))
        .collect::<Result<_>>()?;
    tile.meta = metadata(
        &context,
        document.name,
        &document.properties,
        &document.components,
        prototypes,
    )?;
    Ok(tile)
}

fn object(document: &ObjectDoc, prototypes: &[Component]) -> Result<Object> {
    let context = format!("object {}", document.id);
    let kind = match document.kind.as_str() {
        "point" => ObjectKind::Point,
        "rect" => ObjectKind::Rect,
        "ellipse" => ObjectKind::Ellipse,
        other => {
            return Err(FormatError::bad_structure(
                context,
                format!("unknown object type '{other}'"),
            ));
        }
    };
    let mut object = Object::new(document.id, kind);
    object.position = Vec2::new(document.x as f32, document.y as f32);
    object.size = Vec2::new(
        document.width.unwrap_or_default() as f32,
        document.height.unwrap_or_default() as f32,
    );
    object.tag = document.tag.clone();
    object.visible = document.visible;
    object.meta = metadata(
        &context,
        document.name.clone(),
        &document.properties,
        &document.components,
        prototypes,
    )?;
    Ok(object)
}

fn metadata(
    context: &str,
    name: String,
    properties: &[PropertyDoc],
    components: &[ComponentDoc],
    prototypes: &[Component],
) -> Result<Metadata> {
    Ok(Metadata {
        name,
        properties: self::properties(context, properties)?,
        components: self::components(context, components, prototypes)?,
    })
}

/// Property names stay unique. A repeated name keeps its first position and its last value.
fn properties(context: &str, documents: &[PropertyDoc]) -> Result<Vec<NamedAttribute>> {
    let mut meta = Metadata::default();
    for property in documents {
        let kind = parse_kind(context, &property.kind)?;
        let value = from_yaml(context, kind, &property.value)?;
        if meta.set_property(property.name.clone(), value).is_some() {
            warn!(
                "Property '{}' on {context} is set more than once, keeping the last value",
                property.name
            );
        }
    }
    Ok(meta.properties)
}

/// Attachments aligned to their prototypes, so omitted values take the prototype
/// default. Attachments of unknown prototypes are dropped.
fn components(
    context: &str,
    documents: &[ComponentDoc],
    prototypes: &[Component],
) -> Result<Vec<AttachedComponent>> {
    let mut attached = Vec::with_capacity(documents.len());
    for document in documents {
        let Some(prototype) = prototypes.iter().find(|p| p.name == document.prototype) else {
            warn!(
                "Dropping component '{}' on {context}: no such prototype",
                document.prototype
            );
            continue;
        };
        let mut component = AttachedComponent::new(&prototype.name);
        for value in &document.values {
            match prototype.attribute(&value.name) {
                Some(default) => component.values.push(NamedAttribute {
                    name: value.name.clone(),
                    value: from_yaml(context, default.kind(), &value.value)?,
                }),
                None => warn!(
                    "Ignoring value '{}' of component '{}' on {context}: no such attribute",
                    value.name, prototype.name
                ),
            }
        }
        component.align_to(prototype);
        attached.push(component);
    }
    Ok(attached)
}
