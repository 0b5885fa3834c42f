//! Godot 3 scene and resource files as plain data, and their text form.
//!
//! Resource ids start at 1 and follow the order of the vectors that hold them.

use glam::UVec2;

pub(crate) type ResourceId = usize;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtResource {
    pub path: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Animation {
    pub name: String,
    /// Frames per second.
    pub speed: String,
    pub frames: Vec<ResourceId>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubResource {
    AtlasTexture { atlas: ResourceId, region: [u32; 4] },
    SpriteFrames(Vec<Animation>),
    /// `extents` is a formatted `Vector2`.
    RectangleShape { extents: String },
}

/// A `[node]` section. `parent` is `None` only for the root.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub name: String,
    pub kind: &'static str,
    pub parent: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: &'static str, parent: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            parent,
            fields: Vec::new(),
        }
    }

    pub fn field(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Path of this node relative to the root, as used in `parent` attributes.
    pub fn path(&self) -> String {
        match self.parent.as_deref() {
            None => ".".to_string(),
            Some(".") => self.name.clone(),
            Some(parent) => format!("{parent}/{}", self.name),
        }
    }
}

/// A `.tscn` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Scene {
    pub ext_resources: Vec<ExtResource>,
    pub sub_resources: Vec<SubResource>,
    pub nodes: Vec<Node>,
}

impl Scene {
    pub fn add_ext_resource(&mut self, resource: ExtResource) -> ResourceId {
        if let Some(index) = self.ext_resources.iter().position(|r| *r == resource) {
            return index + 1;
        }
        self.ext_resources.push(resource);
        self.ext_resources.len()
    }

    pub fn add_sub_resource(&mut self, resource: SubResource) -> ResourceId {
        self.sub_resources.push(resource);
        self.sub_resources.len()
    }

    pub fn render(&self) -> String {
        let mut out = TextOut::default();
        out.line(format!(
            "[gd_scene load_steps={} format=2]",
            load_steps(&self.ext_resources, self.sub_resources.len())
        ));
        write_ext_resources(&mut out, &self.ext_resources);

        for (index, resource) in self.sub_resources.iter().enumerate() {
            let id = index + 1;
            out.blank();
            match resource {
                SubResource::AtlasTexture { atlas, region } => {
                    out.line(format!("[sub_resource type=\"AtlasTexture\" id={id}]"));
                    out.line(format!("atlas = ExtResource( {atlas} )"));
                    out.line(format!("region = {}", rect2(*region)));
                }
                SubResource::SpriteFrames(animations) => {
                    out.line(format!("[sub_resource type=\"SpriteFrames\" id={id}]"));
                    let animations: Vec<String> = animations
                        .iter()
                        .map(|animation| {
                            let frames: Vec<String> = animation
                                .frames
                                .iter()
                                .map(|frame| format!("SubResource( {frame} )"))
                                .collect();
                            format!(
                                "{{ \"frames\": [ {} ], \"loop\": true, \"name\": {}, \"speed\": {} }}",
                                frames.join(", "),
                                quoted(&animation.name),
                                animation.speed
                            )
                        })
                        .collect();
                    out.line(format!("animations = [ {} ]", animations.join(", ")));
                }
                SubResource::RectangleShape { extents } => {
                    out.line(format!("[sub_resource type=\"RectangleShape2D\" id={id}]"));
                    out.line(format!("extents = {extents}"));
                }
            }
        }

        for node in &self.nodes {
            out.blank();
            match &node.parent {
                None => out.line(format!(
                    "[node name={} type=\"{}\"]",
                    quoted(&node.name),
                    node.kind
                )),
                Some(parent) => out.line(format!(
                    "[node name={} type=\"{}\" parent={}]",
                    quoted(&node.name),
                    node.kind,
                    quoted(parent)
                )),
            }
            for (key, value) in &node.fields {
                out.line(format!("{key} = {value}"));
            }
        }
        out.finish()
    }
}

/// One atlas of a `TileSet` resource.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TilesetEntry {
    pub name: String,
    pub texture: ResourceId,
    pub image_size: UVec2,
    pub tile_size: UVec2,
}

/// A `tileset.tres` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TilesetResource {
    pub textures: Vec<ExtResource>,
    pub entries: Vec<TilesetEntry>,
}

impl TilesetResource {
    pub fn render(&self) -> String {
        let mut out = TextOut::default();
        out.line(format!(
            "[gd_resource type=\"TileSet\" load_steps={} format=2]",
            load_steps(&self.textures, 0)
        ));
        write_ext_resources(&mut out, &self.textures);

        out.blank();
        out.line("[resource]");
        for (index, entry) in self.entries.iter().enumerate() {
            let prefix = format!("{}/", index + 1);
            let fields = [
                ("name", quoted(&entry.name)),
                ("texture", format!("ExtResource( {} )", entry.texture)),
                ("tex_offset", "Vector2( 0, 0 )".to_string()),
                ("modulate", "Color( 1, 1, 1, 1 )".to_string()),
                (
                    "region",
                    rect2([0, 0, entry.image_size.x, entry.image_size.y]),
                ),
                ("tile_mode", "2".to_string()),
                ("autotile/icon_coordinate", "Vector2( 0, 0 )".to_string()),
                (
                    "autotile/tile_size",
                    format!("Vector2( {}, {} )", entry.tile_size.x, entry.tile_size.y),
                ),
                ("autotile/spacing", "0".to_string()),
                ("autotile/occluder_map", "[  ]".to_string()),
                ("autotile/navpoly_map", "[  ]".to_string()),
                ("autotile/priority_map", "[  ]".to_string()),
                ("autotile/z_index_map", "[  ]".to_string()),
                ("occluder_offset", "Vector2( 0, 0 )".to_string()),
                ("navigation_offset", "Vector2( 0, 0 )".to_string()),
                ("shape_offset", "Vector2( 0, 0 )".to_string()),
                (
                    "shape_transform",
                    "Transform2D( 1, 0, 0, 1, 0, 0 )".to_string(),
                ),
                ("shape_one_way", "false".to_string()),
                ("shape_one_way_margin", "0.0".to_string()),
                ("shapes", "[  ]".to_string()),
                ("z_index", "0".to_string()),
            ];
            for (key, value) in fields {
                out.line(format!("{prefix}{key} = {value}"));
            }
        }
        out.finish()
    }
}

/// Every resource plus the file itself.
fn load_steps(ext_resources: &[ExtResource], sub_resources: usize) -> usize {
    ext_resources.len() + sub_resources + 1
}

fn write_ext_resources(out: &mut TextOut, resources: &[ExtResource]) {
    if resources.is_empty() {
        return;
    }
    out.blank();
    for (index, resource) in resources.iter().enumerate() {
        out.line(format!(
            "[ext_resource path={} type=\"{}\" id={}]",
            quoted(&resource.path),
            resource.kind,
            index + 1
        ));
    }
}

fn rect2([x, y, w, h]: [u32; 4]) -> String {
    format!("Rect2( {x}, {y}, {w}, {h} )")
}

/// A Godot string literal.
pub(crate) fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Default)]
struct TextOut {
    text: String,
}

impl TextOut {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn finish(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_paths() {
        let root = Node::new("Root", "Node2D", None);
        let layer = Node::new("group", "Node2D", Some(".".to_string()));
        let child = Node::new("decor", "TileMap", Some(layer.path()));

        assert_eq!(root.path(), ".");
        assert_eq!(layer.path(), "group");
        assert_eq!(child.path(), "group/decor");
    }

    #[test]
    fn test_render_scene() {
        let mut scene = Scene::default();
        let tileset = scene.add_ext_resource(ExtResource {
            path: "res://tileset.tres".to_string(),
            kind: "TileSet",
        });
        assert_eq!(
            scene.add_ext_resource(ExtResource {
                path: "res://tileset.tres".to_string(),
                kind: "TileSet",
            }),
            tileset
        );
        let shape = scene.add_sub_resource(SubResource::RectangleShape {
            extents: "Vector2( 8, 4.5 )".to_string(),
        });
        scene.nodes.push(Node::new("Root", "Node2D", None));
        let mut area = Node::new("Door \"A\"", "Area2D", Some(".".to_string()));
        area.field("position", "Vector2( 1, 2 )");
        scene.nodes.push(area);
        scene.nodes[1].field("shape", format!("SubResource( {shape} )"));

        assert_eq!(
            scene.render(),
            "[gd_scene load_steps=3 format=2]\n\
             \n\
             [ext_resource path=\"res://tileset.tres\" type=\"TileSet\" id=1]\n\
             \n\
             [sub_resource type=\"RectangleShape2D\" id=1]\n\
             extents = Vector2( 8, 4.5 )\n\
             \n\
             [node name=\"Root\" type=\"Node2D\"]\n\
             \n\
             [node name=\"Door \\\"A\\\"\" type=\"Area2D\" parent=\".\"]\n\
             position = Vector2( 1, 2 )\n\
             shape = SubResource( 1 )\n"
        );
    }

    #[test]
    fn test_render_tileset() {
        let resource = TilesetResource {
            textures: vec![ExtResource {
                path: "res://terrain.png".to_string(),
                kind: "Texture",
            }],
            entries: vec![TilesetEntry {
                name: "terrain".to_string(),
                texture: 1,
                image_size: UVec2::new(64, 48),
                tile_size: UVec2::new(16, 16),
            }],
        };

        let text = resource.render();

        assert!(text.starts_with("[gd_resource type=\"TileSet\" load_steps=2 format=2]\n"));
        assert!(text.contains("[ext_resource path=\"res://terrain.png\" type=\"Texture\" id=1]\n"));
        assert!(text.contains("\n[resource]\n1/name = \"terrain\"\n1/texture = ExtResource( 1 )\n"));
        assert!(text.contains("1/region = Rect2( 0, 0, 64, 48 )\n"));
        assert!(text.contains("1/autotile/tile_size = Vector2( 16, 16 )\n"));
    }
}
