//! Tilesets and per-tile definitions.

use std::path::PathBuf;
use std::time::Duration;

use glam::UVec2;

use super::layer::Object;
use super::meta::Metadata;
use super::tiles::TileId;

/// Index of a tile within its tileset, starting at zero.
pub type TileIndex = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub tile_index: TileIndex,
    pub duration: Duration,
}

impl AnimationFrame {
    pub fn new(tile_index: TileIndex, duration_ms: u64) -> Self {
        Self {
            tile_index,
            duration: Duration::from_millis(duration_ms),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A tile that carries more than its image region: animation, collision objects or
/// metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tile {
    pub index: TileIndex,
    pub animation: Vec<AnimationFrame>,
    pub objects: Vec<Object>,
    pub meta: Metadata,
}

impl Tile {
    pub fn new(index: TileIndex) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn is_animated(&self) -> bool {
        !self.animation.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tileset {
    pub meta: Metadata,
    pub tile_size: UVec2,
    pub tile_count: u32,
    pub column_count: u32,
    /// Image path as written in the source document.
    pub image_path: PathBuf,
    pub image_size: UVec2,
    /// Tiles with extra data, ordered by index.
    pub tiles: Vec<Tile>,
}

impl Tileset {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn row_count(&self) -> u32 {
        self.tile_count.checked_div(self.column_count).unwrap_or(0)
    }

    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.index == index)
    }

    /// Pixel offset of a tile within the tileset image.
    pub fn tile_origin(&self, index: TileIndex) -> UVec2 {
        if self.column_count == 0 {
            return UVec2::ZERO;
        }
        let col = index % self.column_count;
        let row = index / self.column_count;
        UVec2::new(col * self.tile_size.x, row * self.tile_size.y)
    }
}

/// A tileset as used by a map, with its first global tile id.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetRef {
    pub first_tile: TileId,
    pub tileset: Tileset,
}

impl TilesetRef {
    /// Last global id covered by this tileset.
    pub fn last_tile(&self) -> TileId {
        self.first_tile
            .saturating_add(self.tileset.tile_count)
            .saturating_sub(1)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tileset.tile_count > 0 && id >= self.first_tile && id <= self.last_tile()
    }

    /// Local index of a global id, if it belongs to this tileset.
    pub fn local_index(&self, id: TileId) -> Option<TileIndex> {
        self.contains(id).then(|| id - self.first_tile)
    }
}
