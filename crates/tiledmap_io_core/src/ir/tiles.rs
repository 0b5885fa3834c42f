//! Row-major tile grids.

/// Global tile identifier. `0` is the empty tile.
pub type TileId = u32;

pub const EMPTY_TILE: TileId = 0;

/// Grid dimensions, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent {
    pub rows: usize,
    pub cols: usize,
}

impl Extent {
    /// Longest side a grid may have.
    pub const MAX_SIDE: usize = 1 << 20;

    /// Most cells a grid may hold.
    pub const MAX_CELLS: usize = 1 << 28;

    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of cells. Saturates for extents beyond [`Extent::checked_len`].
    pub const fn len(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Number of cells, or `None` if a side exceeds [`Extent::MAX_SIDE`] or the
    /// grid exceeds [`Extent::MAX_CELLS`].
    pub const fn checked_len(&self) -> Option<usize> {
        if self.rows > Self::MAX_SIDE || self.cols > Self::MAX_SIDE {
            return None;
        }
        match self.rows.checked_mul(self.cols) {
            Some(len) if len <= Self::MAX_CELLS => Some(len),
            _ => None,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rectangular, row-major matrix of tile ids.
///
/// The matrix is rectangular by construction, so every consumer can rely on
/// `tiles.len() == rows * cols`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TileMatrix {
    extent: Extent,
    tiles: Vec<TileId>,
}

impl TileMatrix {
    /// A matrix filled with [`EMPTY_TILE`].
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            tiles: vec![EMPTY_TILE; extent.len()],
        }
    }

    /// Builds a matrix from rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows do not all have the same length. A ragged grid is a
    /// programming error, not a recoverable condition.
    pub fn from_rows(rows: Vec<Vec<TileId>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|row| row.len() == cols),
            "tile matrix rows must all have {cols} columns"
        );
        let extent = Extent::new(rows.len(), cols);
        Self {
            extent,
            tiles: rows.into_iter().flatten().collect(),
        }
    }

    /// Wraps row-major ids. Returns `None` if the count does not match `extent`.
    pub fn from_row_major(extent: Extent, tiles: Vec<TileId>) -> Option<Self> {
        (tiles.len() == extent.len()).then_some(Self { extent, tiles })
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<TileId> {
        if row < self.extent.rows && col < self.extent.cols {
            Some(self.tiles[row * self.extent.cols + col])
        } else {
            None
        }
    }

    /// Sets a cell. Returns `false` if the position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, id: TileId) -> bool {
        if row < self.extent.rows && col < self.extent.cols {
            self.tiles[row * self.extent.cols + col] = id;
            true
        } else {
            false
        }
    }

    /// Iterates over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[TileId]> {
        let cols = self.extent.cols;
        (0..self.extent.rows).map(move |row| &self.tiles[row * cols..(row + 1) * cols])
    }

    pub fn as_slice(&self) -> &[TileId] {
        &self.tiles
    }

    pub fn into_vec(self) -> Vec<TileId> {
        self.tiles
    }
}
