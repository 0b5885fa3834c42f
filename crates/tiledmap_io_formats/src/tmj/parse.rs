use std::fs;
use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use serde_json::Value;
use tiledmap_io_codec::TileCodec;
use tiledmap_io_core::attribute::{AttributeKind, AttributeValue};
use tiledmap_io_core::error::{FormatError, Result, TypeMismatch};
use tiledmap_io_core::ir::{
    AnimationFrame, Extent, Layer, Map, Metadata, Object, ObjectKind, Tile, TileFormat, TileId,
    TileMatrix, Tileset, TilesetRef,
};
use tracing::{debug, warn};

use super::fields::Fields;
use crate::common::{grid_extent, resolve_path};
use crate::format::ReadOptions;
use crate::tiled_props::{parse_compression, parse_orientation, parse_tiled_text};

pub(crate) fn parse_map(bytes: &[u8], options: &ReadOptions, codec: &TileCodec) -> Result<Map> {
    let root = parse_json(bytes, "map")?;
    let mut parser = TmjParser {
        codec,
        base_dir: options.base_dir(),
        tile_format: None,
    };
    parser.parse_map(&root)
}

fn parse_json(bytes: &[u8], context: &str) -> Result<Value> {
    serde_json::from_slice(bytes)
        .map_err(|err| FormatError::bad_structure(context, format!("invalid JSON: {err}")))
}

struct TmjParser<'a> {
    codec: &'a TileCodec,
    base_dir: &'a Path,
    /// Format of the first tile layer, which becomes the map's format.
    tile_format: Option<TileFormat>,
}

impl TmjParser<'_> {
    fn parse_map(&mut self, root: &Value) -> Result<Map> {
        let fields = Fields::new(root, "map")?;
        match fields.opt_str("type")? {
            None | Some("map") => {}
            Some(other) => {
                return Err(FormatError::bad_structure(
                    "map",
                    format!("expected a map document, found '{other}'"),
                ));
            }
        }
        if fields.bool_or("infinite", false)? {
            return Err(FormatError::UnsupportedFeature("infinite maps".to_string()));
        }

        let extent = grid_extent(
            fields.u32("height")? as usize,
            fields.u32("width")? as usize,
            "map",
        )?;
        let tile_size = UVec2::new(fields.u32("tilewidth")?, fields.u32("tileheight")?);
        let mut map = Map::new(extent, tile_size);
        map.orientation = parse_orientation(fields.str_or("orientation", "orthogonal")?)?;

        map.tilesets = fields
            .array("tilesets")?
            .iter()
            .map(|value| self.parse_tileset_ref(value))
            .collect::<Result<_>>()?;
        map.layers = fields
            .array("layers")?
            .iter()
            .map(|value| self.parse_layer(value))
            .collect::<Result<_>>()?;
        parse_properties(&fields, &mut map.meta)?;

        let mut tile_format = self.tile_format.unwrap_or_default();
        if let Some(level) = fields.opt_i64("compressionlevel")? {
            if level >= 0 {
                tile_format.compression_level = i32::try_from(level).ok();
            }
        }
        map.tile_format = tile_format;

        if let Some(id) = fields.opt_u32("nextlayerid")? {
            map.next_layer_id = id;
        }
        if let Some(id) = fields.opt_u32("nextobjectid")? {
            map.next_object_id = id;
        }
        map.ensure_next_ids();
        map.validate()?;

        debug!(
            "Parsed TMJ map: {}x{} tiles, {} root layers, {} tilesets",
            extent.cols,
            extent.rows,
            map.layers.len(),
            map.tilesets.len()
        );
        Ok(map)
    }

    fn parse_tileset_ref(&self, value: &Value) -> Result<TilesetRef> {
        let fields = Fields::new(value, "tileset")?;
        let first_tile = fields.u32("firstgid")?;
        let tileset = match fields.opt_str("source")? {
            Some(source) => self.load_external_tileset(source)?,
            None => parse_tileset(&fields)?,
        };
        Ok(TilesetRef {
            first_tile,
            tileset,
        })
    }

    fn load_external_tileset(&self, source: &str) -> Result<Tileset> {
        let path = resolve_path(self.base_dir, source);
        if path.extension().is_some_and(|ext| ext == "tsx") {
            return Err(FormatError::UnsupportedFeature(format!(
                "XML tileset '{source}' referenced from a JSON map"
            )));
        }
        let bytes = fs::read(&path).map_err(|err| FormatError::bad_file(&path, err))?;
        let context = format!("tileset '{}'", path.display());
        let value = parse_json(&bytes, &context)?;
        debug!("Loading external tileset {}", path.display());
        parse_tileset(&Fields::new(&value, context)?)
    }

    fn parse_layer(&mut self, value: &Value) -> Result<Layer> {
        let fields = Fields::new(value, "layer")?;
        let id = fields.u32("id")?;
        let name = fields.str_or("name", "")?;
        let context = format!("layer '{name}'");

        let mut layer = match fields.str("type")? {
            "tilelayer" => {
                let extent = grid_extent(
                    fields.u32("height")? as usize,
                    fields.u32("width")? as usize,
                    &context,
                )?;
                let tiles = self.parse_tile_data(&fields, &context, extent)?;
                Layer::tile(id, name, tiles)
            }
            "objectgroup" => {
                let objects = parse_objects(&fields, &context)?;
                Layer::object(id, name, objects)
            }
            "group" => {
                let children = fields
                    .array("layers")?
                    .iter()
                    .map(|child| self.parse_layer(child))
                    .collect::<Result<_>>()?;
                Layer::group(id, name, children)
            }
            "imagelayer" => {
                return Err(FormatError::UnsupportedFeature("image layers".to_string()));
            }
            other => {
                return Err(FormatError::bad_structure(
                    context,
                    format!("unknown layer type '{other}'"),
                ));
            }
        };
        layer.opacity = fields.f32_or("opacity", 1.0)?;
        layer.visible = fields.bool_or("visible", true)?;
        parse_properties(&fields, &mut layer.meta)?;
        Ok(layer)
    }

    fn parse_tile_data(
        &mut self,
        fields: &Fields,
        context: &str,
        extent: Extent,
    ) -> Result<TileMatrix> {
        if fields.get("chunks").is_some() {
            return Err(FormatError::UnsupportedFeature("chunked tile layers".to_string()));
        }
        let compression = parse_compression(context, fields.str_or("compression", "")?)?;
        let data = fields
            .get("data")
            .ok_or_else(|| FormatError::missing_field(context, "data"))?;

        let (tiles, format) = match fields.str_or("encoding", "csv")? {
            "csv" => {
                let ids = data
                    .as_array()
                    .ok_or_else(|| {
                        FormatError::bad_structure(context, "plain tile data must be an array")
                    })?
                    .iter()
                    .map(|id| {
                        id.as_u64()
                            .and_then(|id| TileId::try_from(id).ok())
                            .ok_or_else(|| {
                                FormatError::bad_structure(context, format!("invalid tile id {id}"))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let count = ids.len();
                let tiles = TileMatrix::from_row_major(extent, ids).ok_or_else(|| {
                    FormatError::bad_structure(
                        context,
                        format!("expected {} tiles, found {count}", extent.len()),
                    )
                })?;
                (tiles, TileFormat::plain())
            }
            "base64" => {
                let text = data.as_str().ok_or_else(|| {
                    FormatError::bad_structure(context, "base64 tile data must be a string")
                })?;
                let tiles = self.codec.decode_base64(text, extent, compression)?;
                (tiles, TileFormat::base64(compression))
            }
            other => {
                return Err(FormatError::bad_structure(
                    context,
                    format!("unknown encoding '{other}'"),
                ));
            }
        };
        self.tile_format.get_or_insert(format);
        Ok(tiles)
    }
}

fn parse_tileset(fields: &Fields) -> Result<Tileset> {
    let Some(image) = fields.opt_str("image")? else {
        return Err(FormatError::UnsupportedFeature(
            "image collection tilesets".to_string(),
        ));
    };
    let mut tileset = Tileset {
        meta: Metadata::named(fields.str_or("name", "")?),
        tile_size: UVec2::new(fields.u32("tilewidth")?, fields.u32("tileheight")?),
        tile_count: fields.u32("tilecount")?,
        column_count: fields.u32("columns")?,
        image_path: PathBuf::from(image),
        image_size: UVec2::new(fields.u32("imagewidth")?, fields.u32("imageheight")?),
        tiles: Vec::new(),
    };
    let context = format!("tileset '{}'", tileset.name());
    tileset.tiles = fields
        .array("tiles")?
        .iter()
        .map(|value| parse_tile(value, &context))
        .collect::<Result<_>>()?;
    tileset.tiles.sort_by_key(|tile| tile.index);
    parse_properties(fields, &mut tileset.meta)?;
    Ok(tileset)
}

fn parse_tile(value: &Value, context: &str) -> Result<Tile> {
    let fields = Fields::new(value, format!("{context} tile"))?;
    let mut tile = Tile::new(fields.u32("id")?);

    for frame in fields.array("animation")? {
        let frame = Fields::new(frame, format!("{} frame", fields.context()))?;
        tile.animation.push(AnimationFrame::new(
            frame.u32("tileid")?,
            u64::from(frame.u32("duration")?),
        ));
    }
    if let Some(group) = fields.get("objectgroup") {
        let group = Fields::new(group, format!("{} objects", fields.context()))?;
        tile.objects = parse_objects(&group, group.context())?;
    }
    parse_properties(&fields, &mut tile.meta)?;
    Ok(tile)
}

fn parse_objects(fields: &Fields, context: &str) -> Result<Vec<Object>> {
    fields
        .array("objects")?
        .iter()
        .map(|value| parse_object(value, context))
        .collect()
}

fn parse_object(value: &Value, context: &str) -> Result<Object> {
    let fields = Fields::new(value, format!("{context} object"))?;
    for key in ["polygon", "polyline", "text", "gid"] {
        if fields.get(key).is_some() {
            return Err(FormatError::UnsupportedFeature(format!("{key} objects")));
        }
    }

    let kind = if fields.bool_or("point", false)? {
        ObjectKind::Point
    } else if fields.bool_or("ellipse", false)? {
        ObjectKind::Ellipse
    } else {
        ObjectKind::Rect
    };
    let mut object = Object::new(fields.u32("id")?, kind);
    object.position = Vec2::new(fields.f32_or("x", 0.0)?, fields.f32_or("y", 0.0)?);
    object.size = Vec2::new(fields.f32_or("width", 0.0)?, fields.f32_or("height", 0.0)?);
    object.tag = match fields.opt_str("type")? {
        Some(tag) => tag.to_string(),
        None => fields.str_or("class", "")?.to_string(),
    };
    object.visible = fields.bool_or("visible", true)?;
    object.meta.name = fields.str_or("name", "")?.to_string();
    parse_properties(&fields, &mut object.meta)?;
    Ok(object)
}

fn parse_properties(fields: &Fields, meta: &mut Metadata) -> Result<()> {
    for entry in fields.array("properties")? {
        let property = Fields::new(entry, format!("{} property", fields.context()))?;
        let name = property.str("name")?;
        let type_name = property.str_or("type", "string")?;
        let value = property
            .get("value")
            .ok_or_else(|| FormatError::missing_field(property.context(), "value"))?;

        match parse_property_value(property.context(), type_name, value)? {
            Some(value) => {
                meta.set_property(name, value);
            }
            None => warn!(
                "Skipping property '{}' of unsupported type '{}' in {}",
                name,
                type_name,
                fields.context()
            ),
        }
    }
    Ok(())
}

/// Kind of a JSON scalar, for type mismatch reports.
fn json_kind(value: &Value) -> Option<AttributeKind> {
    match value {
        Value::String(_) => Some(AttributeKind::String),
        Value::Bool(_) => Some(AttributeKind::Bool),
        Value::Number(n) if n.is_f64() => Some(AttributeKind::Float),
        Value::Number(_) => Some(AttributeKind::Int),
        _ => None,
    }
}

fn parse_property_value(
    context: &str,
    type_name: &str,
    value: &Value,
) -> Result<Option<AttributeValue>> {
    let expected = match type_name {
        "string" => AttributeKind::String,
        "int" => AttributeKind::Int,
        "float" => AttributeKind::Float,
        "bool" => AttributeKind::Bool,
        "file" => AttributeKind::Path,
        "color" => AttributeKind::Color,
        "object" => AttributeKind::Object,
        _ => return Ok(None),
    };
    let integer = |n: &serde_json::Number| {
        n.as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| FormatError::bad_structure(context, format!("{n} is out of range")))
    };

    let parsed = match (expected, value) {
        (AttributeKind::String, Value::String(text)) => AttributeValue::String(text.clone()),
        (AttributeKind::Path, Value::String(text)) => AttributeValue::Path(PathBuf::from(text)),
        (AttributeKind::Color, Value::String(text)) => {
            return parse_tiled_text(context, "color", text);
        }
        (AttributeKind::Int, Value::Number(n)) if !n.is_f64() => AttributeValue::Int(integer(n)?),
        (AttributeKind::Object, Value::Number(n)) if !n.is_f64() => {
            AttributeValue::Object(integer(n)?)
        }
        (AttributeKind::Float, Value::Number(n)) => {
            AttributeValue::Float(n.as_f64().unwrap_or_default() as f32)
        }
        (AttributeKind::Bool, Value::Bool(flag)) => AttributeValue::Bool(*flag),
        (expected, value) => {
            return Err(match json_kind(value) {
                Some(found) => TypeMismatch { expected, found }.into(),
                None => FormatError::bad_structure(
                    context,
                    format!("invalid {type_name} value {value}"),
                ),
            });
        }
    };
    Ok(Some(parsed))
}
