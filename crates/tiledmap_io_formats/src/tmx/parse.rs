use std::fs;
use std::path::{Path, PathBuf};

use glam::{UVec2, Vec2};
use tiledmap_io_codec::{PlainTextStyle, TileCodec};
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{
    AnimationFrame, Extent, Layer, Map, Metadata, Object, ObjectKind, Tile, TileFormat, TileId,
    TileMatrix, Tileset, TilesetRef,
};
use tracing::{debug, warn};

use super::dom::Element;
use crate::common::{grid_extent, resolve_path};
use crate::format::ReadOptions;
use crate::tiled_props::{FORMAT_VERSION, parse_compression, parse_orientation, parse_tiled_text};

pub(crate) fn parse_map(bytes: &[u8], options: &ReadOptions, codec: &TileCodec) -> Result<Map> {
    let root = parse_document(bytes, "map")?;
    if root.name != "map" {
        return Err(FormatError::bad_structure(
            "map",
            format!("expected a <map> root, found <{}>", root.name),
        ));
    }
    check_version(&root, options.strict_version)?;

    let mut parser = TmxParser {
        codec,
        base_dir: options.base_dir(),
        tile_format: None,
    };
    parser.parse_map(&root)
}

fn parse_document(bytes: &[u8], context: &str) -> Result<Element> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| FormatError::bad_structure(context, format!("invalid UTF-8: {err}")))?;
    Element::parse_document(text, context)
}

/// The `version` attribute is advisory unless `strict` is set.
fn check_version(root: &Element, strict: bool) -> Result<()> {
    match root.attr("version") {
        Some(found) if found != FORMAT_VERSION => {
            if strict {
                return Err(FormatError::UnsupportedVersion {
                    found: found.to_string(),
                    expected: FORMAT_VERSION.to_string(),
                });
            }
            warn!(
                "TMX version '{}' differs from the supported version '{}'",
                found, FORMAT_VERSION
            );
        }
        Some(_) => {}
        None => debug!("TMX document has no version attribute"),
    }
    Ok(())
}

struct TmxParser<'a> {
    codec: &'a TileCodec,
    base_dir: &'a Path,
    tile_format: Option<TileFormat>,
}

impl TmxParser<'_> {
    fn parse_map(&mut self, root: &Element) -> Result<Map> {
        if root.flag_or("infinite", false)? {
            return Err(FormatError::UnsupportedFeature("infinite maps".to_string()));
        }
        let extent = grid_extent(root.required("height")?, root.required("width")?, "map")?;
        let tile_size = UVec2::new(root.required("tilewidth")?, root.required("tileheight")?);
        let mut map = Map::new(extent, tile_size);
        map.orientation = parse_orientation(root.attr("orientation").unwrap_or("orthogonal"))?;

        for child in &root.children {
            match child.name.as_str() {
                "properties" => parse_properties(child, &mut map.meta)?,
                "tileset" => {
                    let tileset = self.parse_tileset_ref(child)?;
                    map.tilesets.push(tileset);
                }
                "layer" | "objectgroup" | "group" | "imagelayer" => {
                    let layer = self.parse_layer(child)?;
                    map.layers.push(layer);
                }
                _ => {}
            }
        }

        let mut tile_format = self.tile_format.unwrap_or_default();
        if let Some(level) = root.parse_attr::<i32>("compressionlevel")? {
            if level >= 0 {
                tile_format.compression_level = Some(level);
            }
        }
        map.tile_format = tile_format;

        if let Some(id) = root.parse_attr("nextlayerid")? {
            map.next_layer_id = id;
        }
        if let Some(id) = root.parse_attr("nextobjectid")? {
            map.next_object_id = id;
        }
        map.ensure_next_ids();
        map.validate()?;

        debug!(
            "Parsed TMX map: {}x{} tiles, {} root layers, {} tilesets",
            extent.cols,
            extent.rows,
            map.layers.len(),
            map.tilesets.len()
        );
        Ok(map)
    }

    fn parse_tileset_ref(&self, element: &Element) -> Result<TilesetRef> {
        let first_tile = element.required("firstgid")?;
        let tileset = match element.attr("source") {
            Some(source) => self.load_external_tileset(source)?,
            None => parse_tileset(element)?,
        };
        Ok(TilesetRef {
            first_tile,
            tileset,
        })
    }

    fn load_external_tileset(&self, source: &str) -> Result<Tileset> {
        let path = resolve_path(self.base_dir, source);
        if path
            .extension()
            .is_some_and(|ext| ext == "tsj" || ext == "json")
        {
            return Err(FormatError::UnsupportedFeature(format!(
                "JSON tileset '{source}' referenced from an XML map"
            )));
        }
        let bytes = fs::read(&path).map_err(|err| FormatError::bad_file(&path, err))?;
        let context = format!("tileset '{}'", path.display());
        let root = parse_document(&bytes, &context)?;
        if root.name != "tileset" {
            return Err(FormatError::bad_structure(
                context,
                format!("expected a <tileset> root, found <{}>", root.name),
            ));
        }
        debug!("Loading external tileset {}", path.display());
        parse_tileset(&root)
    }

    fn parse_layer(&mut self, element: &Element) -> Result<Layer> {
        let id = element.required("id")?;
        let name = element.attr("name").unwrap_or_default();

        let mut layer = match element.name.as_str() {
            "layer" => {
                let extent = grid_extent(
                    element.required("height")?,
                    element.required("width")?,
                    &element.context(),
                )?;
                let data = element
                    .child("data")
                    .ok_or_else(|| FormatError::missing_field(element.context(), "data"))?;
                let tiles = self.parse_data(data, &element.context(), extent)?;
                Layer::tile(id, name, tiles)
            }
            "objectgroup" => Layer::object(id, name, parse_objects(element)?),
            "group" => {
                let mut children = Vec::new();
                for child in &element.children {
                    if matches!(
                        child.name.as_str(),
                        "layer" | "objectgroup" | "group" | "imagelayer"
                    ) {
                        children.push(self.parse_layer(child)?);
                    }
                }
                Layer::group(id, name, children)
            }
            _ => return Err(FormatError::UnsupportedFeature("image layers".to_string())),
        };
        layer.opacity = element.parse_or("opacity", 1.0)?;
        layer.visible = element.flag_or("visible", true)?;
        if let Some(properties) = element.child("properties") {
            parse_properties(properties, &mut layer.meta)?;
        }
        Ok(layer)
    }

    fn parse_data(&mut self, data: &Element, context: &str, extent: Extent) -> Result<TileMatrix> {
        if data.child("chunk").is_some() {
            return Err(FormatError::UnsupportedFeature("chunked tile layers".to_string()));
        }
        let compression = parse_compression(context, data.attr("compression").unwrap_or(""))?;

        let (tiles, format) = match data.attr("encoding") {
            None => {
                let ids = data
                    .children_named("tile")
                    .map(|tile| tile.parse_or::<TileId>("gid", 0))
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
            Some("csv") => (
                self.codec
                    .decode_plain_flat(&data.text, extent, PlainTextStyle::TILED_CSV)?,
                TileFormat::plain(),
            ),
            Some("base64") => (
                self.codec.decode_base64(&data.text, extent, compression)?,
                TileFormat::base64(compression),
            ),
            Some(other) => {
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

fn parse_tileset(element: &Element) -> Result<Tileset> {
    let Some(image) = element.child("image") else {
        return Err(FormatError::UnsupportedFeature(
            "image collection tilesets".to_string(),
        ));
    };
    let mut tileset = Tileset {
        meta: Metadata::named(element.attr("name").unwrap_or_default()),
        tile_size: UVec2::new(element.required("tilewidth")?, element.required("tileheight")?),
        tile_count: element.required("tilecount")?,
        column_count: element.required("columns")?,
        image_path: PathBuf::from(image.required_attr("source")?),
        image_size: UVec2::new(image.required("width")?, image.required("height")?),
        tiles: Vec::new(),
    };

    for child in &element.children {
        match child.name.as_str() {
            "properties" => parse_properties(child, &mut tileset.meta)?,
            "tile" => tileset.tiles.push(parse_tile(child)?),
            _ => {}
        }
    }
    tileset.tiles.sort_by_key(|tile| tile.index);
    Ok(tileset)
}

fn parse_tile(element: &Element) -> Result<Tile> {
    let mut tile = Tile::new(element.required("id")?);
    if let Some(animation) = element.child("animation") {
        for frame in animation.children_named("frame") {
            tile.animation.push(AnimationFrame::new(
                frame.required("tileid")?,
                frame.required("duration")?,
            ));
        }
    }
    if let Some(group) = element.child("objectgroup") {
        tile.objects = parse_objects(group)?;
    }
    if let Some(properties) = element.child("properties") {
        parse_properties(properties, &mut tile.meta)?;
    }
    Ok(tile)
}

fn parse_objects(group: &Element) -> Result<Vec<Object>> {
    group.children_named("object").map(parse_object).collect()
}

fn parse_object(element: &Element) -> Result<Object> {
    if element.attr("gid").is_some() {
        return Err(FormatError::UnsupportedFeature("tile objects".to_string()));
    }
    for shape in ["polygon", "polyline", "text"] {
        if element.child(shape).is_some() {
            return Err(FormatError::UnsupportedFeature(format!("{shape} objects")));
        }
    }

    let kind = if element.child("point").is_some() {
        ObjectKind::Point
    } else if element.child("ellipse").is_some() {
        ObjectKind::Ellipse
    } else {
        ObjectKind::Rect
    };
    let mut object = Object::new(element.required("id")?, kind);
    object.position = Vec2::new(element.parse_or("x", 0.0)?, element.parse_or("y", 0.0)?);
    object.size = Vec2::new(
        element.parse_or("width", 0.0)?,
        element.parse_or("height", 0.0)?,
    );
    object.tag = element
        .attr("type")
        .or_else(|| element.attr("class"))
        .unwrap_or_default()
        .to_string();
    object.visible = element.flag_or("visible", true)?;
    object.meta.name = element.attr("name").unwrap_or_default().to_string();
    if let Some(properties) = element.child("properties") {
        parse_properties(properties, &mut object.meta)?;
    }
    Ok(object)
}

fn parse_properties(element: &Element, meta: &mut Metadata) -> Result<()> {
    for property in element.children_named("property") {
        let name = property.required_attr("name")?;
        let type_name = property.attr("type").unwrap_or("string");
        // Multi-line strings are stored as element text.
        let text = property.attr("value").unwrap_or(&property.text);

        match parse_tiled_text(&property.context(), type_name, text)? {
            Some(value) => {
                meta.set_property(name, value);
            }
            None => warn!(
                "Skipping property '{}' of unsupported type '{}'",
                name, type_name
            ),
        }
    }
    Ok(())
}
