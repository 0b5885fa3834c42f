//! Maps shared by the format tests.

use std::path::PathBuf;

use glam::{UVec2, Vec2};
use tiledmap_io_core::attribute::AttributeValue;
use tiledmap_io_core::color::Color;
use tiledmap_io_core::ir::{
    AnimationFrame, AttachedComponent, Component, Extent, Layer, LayerKind, Map, Metadata,
    NamedAttribute, Object, ObjectKind, Tile, TileMatrix, Tileset, TilesetRef,
};

/// A 3x4 map with one of everything the Tiled formats can express.
///
/// - `ground`: tile layer with ids 1..=12
/// - `things`: object layer with a `door` rectangle and a spawn point
/// - `group`: a group holding a second tile layer and an object layer
/// - `terrain`: tileset with an animated tile that carries a collision object
pub(crate) fn sample_map() -> Map {
    let mut map = Map::new(Extent::new(3, 4), UVec2::new(16, 16));
    map.meta = Metadata::named("level").with_property("music", "cave.ogg");

    let mut door = Object::new(1, ObjectKind::Rect);
    door.position = Vec2::new(16.0, 32.5);
    door.size = Vec2::new(16.0, 8.0);
    door.tag = "door".to_string();
    door.meta = Metadata::named("door")
        .with_property("target", "level2")
        .with_property("tint", Color::rgba(0xFF, 0x80, 0x00, 0xC0));

    let mut spawn = Object::new(2, ObjectKind::Point);
    spawn.position = Vec2::new(8.0, 8.0);
    spawn.meta.name = "spawn".to_string();

    let mut lamp = Object::new(3, ObjectKind::Ellipse);
    lamp.position = Vec2::new(40.0, 4.0);
    lamp.size = Vec2::new(6.0, 6.0);
    lamp.visible = false;

    let mut ground = Layer::tile(
        1,
        "ground",
        TileMatrix::from_rows(vec![
            vec![1, 2, 3, 4],
            vec![5, 6, 7, 8],
            vec![9, 10, 11, 12],
        ]),
    );
    ground.meta.set_property("depth", 2);

    let mut decor = Layer::tile(
        4,
        "decor",
        TileMatrix::from_rows(vec![vec![0, 0, 3, 0], vec![0, 0, 0, 0], vec![1, 0, 0, 2]]),
    );
    decor.opacity = 0.5;

    let mut hidden = Layer::object(5, "lights", vec![lamp]);
    hidden.visible = false;

    map.layers = vec![
        ground,
        Layer::object(2, "things", vec![door, spawn]),
        Layer::group(3, "group", vec![decor, hidden]),
    ];

    let mut animated = Tile::new(1);
    animated.animation = vec![AnimationFrame::new(1, 100), AnimationFrame::new(2, 250)];
    let mut collider = Object::new(4, ObjectKind::Rect);
    collider.size = Vec2::new(16.0, 4.0);
    animated.objects = vec![collider];
    animated.meta.set_property("speed", 1.5_f32);

    map.tilesets = vec![TilesetRef {
        first_tile: 1,
        tileset: Tileset {
            meta: Metadata::named("terrain").with_property("biome", "cave"),
            tile_size: UVec2::new(16, 16),
            tile_count: 12,
            column_count: 4,
            image_path: PathBuf::from("images/terrain.png"),
            image_size: UVec2::new(64, 48),
            tiles: vec![animated],
        },
    }];
    map.next_layer_id = 6;
    map.next_object_id = 5;
    map
}

/// [`sample_map`] plus component prototypes and attachments.
pub(crate) fn sample_map_with_components() -> Map {
    let mut map = sample_map();
    map.components = vec![
        Component::new("Door")
            .with_attribute("locked", AttributeValue::Bool(false))
            .with_attribute("key", AttributeValue::from("")),
        Component::new("Light").with_attribute("radius", AttributeValue::Float(4.0)),
    ];

    let mut door = AttachedComponent::new("Door");
    door.values = vec![
        NamedAttribute::new("locked", true),
        NamedAttribute::new("key", "brass"),
    ];
    if let LayerKind::Object(objects) = &mut map.layers[1].kind {
        objects[0].meta.attach(door);
    }

    // Equal to the prototype default.
    let mut light = AttachedComponent::new("Light");
    light.values = vec![NamedAttribute::new("radius", 4.0_f32)];
    map.meta.attach(light);
    map
}
