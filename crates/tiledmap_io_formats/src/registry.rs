//! Lookup of formats by identifier and file extension.

use std::fmt;
use std::path::Path;

use tiledmap_io_codec::TileCodec;

use crate::format::SaveFormat;
use crate::godot::GodotSceneFormat;
use crate::tmj::TmjFormat;
use crate::tmx::TmxFormat;
use crate::yaml::YamlFormat;

/// Creates a format bound to a tile codec.
pub type FormatConstructor = fn(&TileCodec) -> Box<dyn SaveFormat>;

/// One registered format.
#[derive(Clone, Copy)]
pub struct FormatEntry {
    pub id: &'static str,
    pub extensions: &'static [&'static str],
    pub constructor: FormatConstructor,
}

/// The set of available formats.
///
/// This is a plain value. Hosts build one (usually with [`FormatRegistry::default`])
/// and pass it to a [`Converter`](crate::converter::Converter).
#[derive(Clone)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a format, replacing any previous entry with the same id.
    pub fn register(&mut self, entry: FormatEntry) {
        self.entries.retain(|existing| existing.id != entry.id);
        self.entries.push(entry);
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.id)
    }

    pub fn create(&self, id: &str, codec: &TileCodec) -> Option<Box<dyn SaveFormat>> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| (entry.constructor)(codec))
    }

    /// Format handling `extension`, compared case-insensitively and without the dot.
    pub fn for_extension(&self, extension: &str, codec: &TileCodec) -> Option<Box<dyn SaveFormat>> {
        let extension = extension.trim_start_matches('.');
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(extension))
            })
            .map(|entry| (entry.constructor)(codec))
    }

    pub fn for_path(&self, path: &Path, codec: &TileCodec) -> Option<Box<dyn SaveFormat>> {
        let extension = path.extension()?.to_str()?;
        self.for_extension(extension, codec)
    }
}

impl Default for FormatRegistry {
    /// Registers `tmj`, `tmx`, `yaml` and `godot`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FormatEntry {
            id: TmjFormat::ID,
            extensions: TmjFormat::EXTENSIONS,
            constructor: |codec| Box::new(TmjFormat::new(codec.clone())),
        });
        registry.register(FormatEntry {
            id: TmxFormat::ID,
            extensions: TmxFormat::EXTENSIONS,
            constructor: |codec| Box::new(TmxFormat::new(codec.clone())),
        });
        registry.register(FormatEntry {
            id: YamlFormat::ID,
            extensions: YamlFormat::EXTENSIONS,
            constructor: |codec| Box::new(YamlFormat::new(codec.clone())),
        });
        registry.register(FormatEntry {
            id: GodotSceneFormat::ID,
            extensions: GodotSceneFormat::EXTENSIONS,
            constructor: |_| Box::new(GodotSceneFormat),
        });
        registry
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats() {
        let registry = FormatRegistry::default();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, ["tmj", "tmx", "yaml", "godot"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let registry = FormatRegistry::default();
        let codec = TileCodec::default();

        let format = registry.create("tmx", &codec).unwrap();
        assert_eq!(format.id(), "tmx");
        assert!(registry.create("gzip", &codec).is_none());
    }

    #[test]
    fn test_lookup_by_extension() {
        let registry = FormatRegistry::default();
        let codec = TileCodec::default();

        assert_eq!(registry.for_extension("json", &codec).unwrap().id(), "tmj");
        assert_eq!(registry.for_extension(".YML", &codec).unwrap().id(), "yaml");
        assert_eq!(
            registry
                .for_path(Path::new("out/level.tscn"), &codec)
                .unwrap()
                .id(),
            "godot"
        );
        assert!(registry.for_path(Path::new("README"), &codec).is_none());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = FormatRegistry::default();
        registry.register(FormatEntry {
            id: "tmj",
            extensions: &["map"],
            constructor: |codec| Box::new(TmjFormat::new(codec.clone())),
        });
        let codec = TileCodec::default();

        assert_eq!(registry.ids().count(), 4);
        assert!(registry.for_extension("tmj", &codec).is_none());
        assert_eq!(registry.for_extension("map", &codec).unwrap().id(), "tmj");
    }
}
