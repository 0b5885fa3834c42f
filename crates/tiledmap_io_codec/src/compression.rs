//! Compression providers for tile data.
//!
//! Providers are stateless: every call works on its own buffers, so a single
//! provider can be shared between threads.

use std::collections::HashMap;
use std::fmt;

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tiledmap_io_core::error::CompressionError;
use tiledmap_io_core::ir::TileCompression;

/// One compression algorithm.
///
/// `decompress(compress(bytes))` must return `bytes` for every input, including the
/// empty one. Malformed input is reported as [`CompressionError::Decode`], never as a
/// panic.
pub trait CompressionProvider: Send + Sync {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError>;

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

const CHUNK_SIZE: usize = 16 * 1024;

/// zlib (RFC 1950) through `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct ZlibProvider {
    level: Compression,
}

impl ZlibProvider {
    pub const MIN_LEVEL: i32 = 1;
    pub const MAX_LEVEL: i32 = 9;

    /// Levels outside `1..=9` (including Tiled's `-1`) select the library default.
    pub fn new(level: Option<i32>) -> Self {
        let level = level
            .filter(|level| (Self::MIN_LEVEL..=Self::MAX_LEVEL).contains(level))
            .and_then(|level| u32::try_from(level).ok())
            .map_or_else(Compression::default, Compression::new);
        Self { level }
    }
}

impl Default for ZlibProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CompressionProvider for ZlibProvider {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut encoder = Compress::new(self.level, true);
        let mut out = Vec::with_capacity(bytes.len() / 2 + 64);
        loop {
            if out.len() == out.capacity() {
                out.reserve(CHUNK_SIZE);
            }
            let consumed = usize::try_from(encoder.total_in())
                .map_err(|_| CompressionError::Internal)?;
            let input = bytes.get(consumed..).ok_or(CompressionError::Internal)?;
            let status = encoder
                .compress_vec(input, &mut out, FlushCompress::Finish)
                .map_err(|_| CompressionError::Internal)?;
            if status == Status::StreamEnd {
                return Ok(out);
            }
        }
    }

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError> {
        if bytes.is_empty() {
            return Err(CompressionError::NoData);
        }
        let mut decoder = Decompress::new(true);
        let mut out = Vec::with_capacity(bytes.len() * 4);
        loop {
            if out.len() == out.capacity() {
                out.reserve(CHUNK_SIZE);
            }
            let consumed =
                usize::try_from(decoder.total_in()).map_err(|_| CompressionError::Internal)?;
            let input = bytes.get(consumed..).ok_or(CompressionError::Internal)?;
            let status = decoder
                .decompress_vec(input, &mut out, FlushDecompress::Finish)
                .map_err(|_| CompressionError::Decode)?;
            match status {
                Status::StreamEnd => return Ok(out),
                Status::Ok | Status::BufError => {
                    // Out of input with room left over: the stream is truncated.
                    let exhausted = decoder.total_in() == bytes.len() as u64;
                    if exhausted && out.len() < out.capacity() {
                        return Err(CompressionError::Decode);
                    }
                }
            }
        }
    }
}

/// Zstandard through the `zstd` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdProvider {
    level: i32,
}

impl ZstdProvider {
    pub const MIN_LEVEL: i32 = 1;
    pub const MAX_LEVEL: i32 = 19;

    /// Levels outside `1..=19` select the library default.
    pub fn new(level: Option<i32>) -> Self {
        let level = level
            .filter(|level| (Self::MIN_LEVEL..=Self::MAX_LEVEL).contains(level))
            .unwrap_or(zstd::DEFAULT_COMPRESSION_LEVEL);
        Self { level }
    }
}

impl CompressionProvider for ZstdProvider {
    fn compress(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::stream::encode_all(bytes, self.level).map_err(|_| CompressionError::Internal)
    }

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, CompressionError> {
        if bytes.is_empty() {
            return Err(CompressionError::NoData);
        }
        zstd::stream::decode_all(bytes).map_err(|_| CompressionError::Decode)
    }
}

/// Builds a provider for an optional compression level.
pub type ProviderConstructor = fn(Option<i32>) -> Box<dyn CompressionProvider>;

/// Maps compression kinds to provider constructors.
///
/// The registry is an ordinary value: hosts build one (usually with
/// [`CompressionRegistry::default`]) and hand it to the codec.
#[derive(Clone)]
pub struct CompressionRegistry {
    constructors: HashMap<TileCompression, ProviderConstructor>,
}

impl CompressionRegistry {
    /// A registry without any provider.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers (or replaces) the constructor for `kind`.
    pub fn register(&mut self, kind: TileCompression, constructor: ProviderConstructor) -> &mut Self {
        self.constructors.insert(kind, constructor);
        self
    }

    pub fn contains(&self, kind: TileCompression) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Creates a provider for `kind`, or `None` if nothing is registered for it.
    pub fn create(
        &self,
        kind: TileCompression,
        level: Option<i32>,
    ) -> Option<Box<dyn CompressionProvider>> {
        self.constructors.get(&kind).map(|constructor| constructor(level))
    }
}

impl Default for CompressionRegistry {
    /// zlib and zstd.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(TileCompression::Zlib, |level| Box::new(ZlibProvider::new(level)))
            .register(TileCompression::Zstd, |level| Box::new(ZstdProvider::new(level)));
        registry
    }
}

impl fmt::Debug for CompressionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn providers() -> Vec<(&'static str, Box<dyn CompressionProvider>)> {
        vec![
            ("zlib", Box::new(ZlibProvider::default())),
            ("zlib-9", Box::new(ZlibProvider::new(Some(9)))),
            ("zstd", Box::new(ZstdProvider::default())),
            ("zstd-19", Box::new(ZstdProvider::new(Some(19)))),
        ]
    }

    /// Deterministic pseudo-random bytes.
    fn noise(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_round_trip_all_lengths() {
        for (name, provider) in providers() {
            for len in [0, 1, 2, 3, 4, 7, 64, 255, 4096, 100_000] {
                let bytes = noise(len);
                let compressed = provider.compress(&bytes).unwrap();
                let restored = provider.decompress(&compressed).unwrap();
                assert_eq!(restored, bytes, "{name} with {len} bytes");
            }
        }
    }

    #[test]
    fn test_round_trip_repetitive_data() {
        let bytes = vec![0u8; 1 << 20];
        for (name, provider) in providers() {
            let compressed = provider.compress(&bytes).unwrap();
            assert!(compressed.len() < bytes.len() / 100, "{name}");
            assert_eq!(provider.decompress(&compressed).unwrap(), bytes, "{name}");
        }
    }

    #[test]
    fn test_decompress_empty_is_no_data() {
        for (name, provider) in providers() {
            assert_eq!(
                provider.decompress(&[]),
                Err(CompressionError::NoData),
                "{name}"
            );
        }
    }

    #[test]
    fn test_decompress_garbage_is_decode_error() {
        let garbage = b"definitely not a compressed stream";
        for (name, provider) in providers() {
            assert_eq!(
                provider.decompress(garbage),
                Err(CompressionError::Decode),
                "{name}"
            );
        }
    }

    #[test]
    fn test_foreign_algorithm_is_decode_error() {
        let bytes = noise(512);
        let zlib = ZlibProvider::default().compress(&bytes).unwrap();
        let zstd = ZstdProvider::default().compress(&bytes).unwrap();
        assert_eq!(
            ZstdProvider::default().decompress(&zlib),
            Err(CompressionError::Decode)
        );
        assert_eq!(
            ZlibProvider::default().decompress(&zstd),
            Err(CompressionError::Decode)
        );
    }

    #[test]
    fn test_zlib_truncated_is_decode_error() {
        let compressed = ZlibProvider::default().compress(&noise(2048)).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        assert_eq!(
            ZlibProvider::default().decompress(truncated),
            Err(CompressionError::Decode)
        );
    }

    #[test]
    fn test_out_of_range_levels_fall_back() {
        let bytes = noise(1024);
        for level in [-1, 0, 10, 42] {
            let compressed = ZlibProvider::new(Some(level)).compress(&bytes).unwrap();
            assert_eq!(ZlibProvider::default().decompress(&compressed).unwrap(), bytes);
        }
        for level in [-1, 0, 20] {
            let compressed = ZstdProvider::new(Some(level)).compress(&bytes).unwrap();
            assert_eq!(ZstdProvider::default().decompress(&compressed).unwrap(), bytes);
        }
    }

    #[test]
    fn test_registry_defaults() {
        let registry = CompressionRegistry::default();
        assert!(registry.contains(TileCompression::Zlib));
        assert!(registry.contains(TileCompression::Zstd));
        assert!(!registry.contains(TileCompression::None));
        assert!(registry.create(TileCompression::None, None).is_none());
        assert!(CompressionRegistry::empty()
            .create(TileCompression::Zlib, None)
            .is_none());
    }
}
