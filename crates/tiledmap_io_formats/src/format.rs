//! The contract every map format implements, and the options passed to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::Map;
use tiledmap_io_view::MapView;
use tracing::{debug, info};

/// Settings that affect parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReadOptions {
    /// Directory used to resolve external tilesets. Defaults to the directory of the
    /// loaded file, or the working directory when parsing raw bytes.
    pub base_dir: Option<PathBuf>,

    /// Reject TMX documents whose `version` differs from the one this crate writes.
    pub strict_version: bool,
}

impl ReadOptions {
    pub(crate) fn base_dir(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }
}

/// Settings that affect emitted files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WriteOptions {
    /// Write tilesets inline instead of as separate files beside the map.
    pub embed_tilesets: bool,

    /// Round floats to this many decimals. `None` writes the shortest exact form.
    pub float_precision: Option<usize>,

    /// Also write component values that equal their prototype default.
    pub emit_default_properties: bool,

    /// One grid row per line in text tile data.
    pub fold_tile_data: bool,

    /// Pretty-print documents.
    pub indent_output: bool,

    /// Number of vertices used to approximate ellipses in scene exports.
    pub ellipse_point_count: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            embed_tilesets: false,
            float_precision: None,
            emit_default_properties: false,
            fold_tile_data: true,
            indent_output: true,
            ellipse_point_count: 32,
        }
    }
}

/// Both option sets, as hosts store them in their settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub read: ReadOptions,
    pub write: WriteOptions,
}

/// A file format that maps can be loaded from and saved to.
///
/// Implementations are stateless between calls and are created through a
/// [`FormatRegistry`](crate::registry::FormatRegistry).
pub trait SaveFormat: Send + Sync {
    /// Identifier used by the registry, such as `"tmj"`.
    fn id(&self) -> &'static str;

    /// Human readable name.
    fn name(&self) -> &'static str;

    /// File extensions handled by this format, without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parses a map document held in memory.
    fn parse_map(&self, bytes: &[u8], options: &ReadOptions) -> Result<Map>;

    /// Writes the map behind `map` to `map.path()`, along with any companion files.
    fn save_map(&self, map: &dyn MapView, options: &WriteOptions) -> Result<()>;

    /// Reads and parses the file at `path`.
    ///
    /// External tilesets resolve against the file's directory unless
    /// [`ReadOptions::base_dir`] is set. A map without a stored name takes the file
    /// stem.
    fn load_map(&self, path: &Path, options: &ReadOptions) -> Result<Map> {
        debug!("Loading {} map from {}", self.name(), path.display());
        let bytes = std::fs::read(path).map_err(|err| FormatError::bad_file(path, err))?;

        let mut options = options.clone();
        if options.base_dir.is_none() {
            options.base_dir = path.parent().map(Path::to_path_buf);
        }

        let mut map = self.parse_map(&bytes, &options)?;
        if map.meta.name.is_empty() {
            if let Some(stem) = path.file_stem() {
                map.meta.name = stem.to_string_lossy().into_owned();
            }
        }
        info!(
            "Loaded {} map '{}' ({} layers, {} tilesets)",
            self.name(),
            map.meta.name,
            map.layers.len(),
            map.tilesets.len()
        );
        Ok(map)
    }
}

/// Destination of a save, or an error when the view has none.
pub(crate) fn destination(map: &dyn MapView) -> Result<PathBuf> {
    map.path()
        .map(Path::to_path_buf)
        .ok_or_else(|| FormatError::bad_structure("map", "the map has no destination path"))
}
