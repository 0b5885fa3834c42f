//! # `tiledmap_io_codec`
//!
//! Tile grid serialization shared by every map format.
//!
//! - [`compression`]: the [`CompressionProvider`] contract, zlib and zstd providers,
//!   and the [`CompressionRegistry`] that constructs them
//! - [`tiles`]: the [`TileCodec`] turning a [`TileMatrix`](tiledmap_io_core::ir::TileMatrix)
//!   into plain text or Base64 and back

pub mod compression;
pub mod tiles;

pub use compression::{CompressionProvider, CompressionRegistry, ZlibProvider, ZstdProvider};
pub use tiles::{PlainTextStyle, TileCodec};
