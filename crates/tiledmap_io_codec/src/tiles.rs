//! Tile grid encoding.
//!
//! A grid is serialized either as plain text (decimal ids separated by a per-format
//! convention) or as Base64 over little-endian `u32` ids, optionally compressed.
//!
//! # Example
//!
//! ```
//! use tiledmap_io_codec::TileCodec;
//! use tiledmap_io_core::ir::{TileFormat, TileMatrix};
//!
//! let codec = TileCodec::default();
//! let tiles = TileMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
//!
//! assert_eq!(codec.encode(&tiles, &TileFormat::plain()).unwrap(), "1,2\n3,4");
//!
//! let text = codec.encode(&tiles, &TileFormat::base64(Default::default())).unwrap();
//! assert_eq!(text, "AQAAAAIAAAADAAAABAAAAA==");
//! ```

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tiledmap_io_core::error::CodecError;
use tiledmap_io_core::ir::{
    Extent, TileCompression, TileEncoding, TileFormat, TileId, TileMatrix,
};

use crate::compression::CompressionRegistry;

/// Separators used by the plain text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainTextStyle {
    pub column_separator: &'static str,
    pub row_separator: &'static str,
}

impl PlainTextStyle {
    /// `1,2\n3,4`
    pub const CSV: Self = Self {
        column_separator: ",",
        row_separator: "\n",
    };

    /// `1,2,\n3,4`, the layout Tiled writes inside `<data encoding="csv">`.
    pub const TILED_CSV: Self = Self {
        column_separator: ",",
        row_separator: ",\n",
    };

    /// `1,2,3,4`, every row on one line.
    pub const CSV_SINGLE_LINE: Self = Self {
        column_separator: ",",
        row_separator: ",",
    };

    /// `1 2\n3 4`
    pub const SPACED: Self = Self {
        column_separator: " ",
        row_separator: "\n",
    };

    /// `1 2 3 4`, every row on one line.
    pub const SPACED_SINGLE_LINE: Self = Self {
        column_separator: " ",
        row_separator: " ",
    };

    fn is_separator(&self, c: char) -> bool {
        c.is_whitespace() || self.column_separator.contains(c) || self.row_separator.contains(c)
    }
}

impl Default for PlainTextStyle {
    fn default() -> Self {
        Self::CSV
    }
}

/// Encodes and decodes tile grids.
///
/// The codec is cheap to clone and shares its [`CompressionRegistry`].
#[derive(Debug, Clone, Default)]
pub struct TileCodec {
    compression: Arc<CompressionRegistry>,
}

fn bad_structure(reason: impl Into<String>) -> CodecError {
    CodecError::BadStructure(reason.into())
}

fn parse_id(token: &str) -> Result<TileId, CodecError> {
    token
        .parse::<TileId>()
        .map_err(|_| bad_structure(format!("invalid tile id '{token}'")))
}

impl TileCodec {
    pub fn new(compression: Arc<CompressionRegistry>) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> &CompressionRegistry {
        &self.compression
    }

    /// Encodes a grid according to `format`. Plain text uses [`PlainTextStyle::CSV`].
    pub fn encode(&self, tiles: &TileMatrix, format: &TileFormat) -> Result<String, CodecError> {
        match format.encoding {
            TileEncoding::PlainText => Ok(self.encode_plain(tiles, PlainTextStyle::CSV)),
            TileEncoding::Base64 => {
                self.encode_base64(tiles, format.compression, format.compression_level)
            }
        }
    }

    /// Inverse of [`TileCodec::encode`].
    pub fn decode(
        &self,
        text: &str,
        extent: Extent,
        format: &TileFormat,
    ) -> Result<TileMatrix, CodecError> {
        match format.encoding {
            TileEncoding::PlainText => self.decode_plain(text, extent, PlainTextStyle::CSV),
            TileEncoding::Base64 => self.decode_base64(text, extent, format.compression),
        }
    }

    /// Writes each row as ids joined by the column separator, and joins rows with the
    /// row separator. An empty grid yields an empty string.
    pub fn encode_plain(&self, tiles: &TileMatrix, style: PlainTextStyle) -> String {
        if tiles.is_empty() {
            return String::new();
        }
        tiles
            .rows()
            .map(|row| {
                row.iter()
                    .map(TileId::to_string)
                    .collect::<Vec<_>>()
                    .join(style.column_separator)
            })
            .collect::<Vec<_>>()
            .join(style.row_separator)
    }

    /// Strict row-wise decoding.
    ///
    /// The text must contain exactly `extent.rows` rows of `extent.cols` ids each.
    /// Surrounding whitespace is ignored.
    pub fn decode_plain(
        &self,
        text: &str,
        extent: Extent,
        style: PlainTextStyle,
    ) -> Result<TileMatrix, CodecError> {
        let text = text.trim();
        if let Some(empty) = Self::decode_empty(text, extent)? {
            return Ok(empty);
        }

        let rows: Vec<&str> = text.split(style.row_separator).collect();
        if rows.len() != extent.rows {
            return Err(bad_structure(format!(
                "expected {} rows, found {}",
                extent.rows,
                rows.len()
            )));
        }

        let mut tiles = Vec::with_capacity(extent.len());
        for (index, row) in rows.iter().enumerate() {
            let before = tiles.len();
            for token in row.trim().split(style.column_separator) {
                tiles.push(parse_id(token.trim())?);
            }
            let count = tiles.len() - before;
            if count != extent.cols {
                return Err(bad_structure(format!(
                    "row {index} has {count} tiles, expected {}",
                    extent.cols
                )));
            }
        }
        Self::finish(extent, tiles)
    }

    /// Lenient decoding that ignores the line layout.
    ///
    /// Tokens may be separated by any separator of `style` or by whitespace, but there
    /// must be exactly `extent.len()` of them.
    pub fn decode_plain_flat(
        &self,
        text: &str,
        extent: Extent,
        style: PlainTextStyle,
    ) -> Result<TileMatrix, CodecError> {
        let text = text.trim();
        if let Some(empty) = Self::decode_empty(text, extent)? {
            return Ok(empty);
        }
        let tiles = text
            .split(|c| style.is_separator(c))
            .filter(|token| !token.is_empty())
            .map(parse_id)
            .collect::<Result<Vec<_>, _>>()?;
        Self::finish(extent, tiles)
    }

    /// Little-endian `u32` ids, compressed if requested, then standard padded Base64.
    pub fn encode_base64(
        &self,
        tiles: &TileMatrix,
        compression: TileCompression,
        level: Option<i32>,
    ) -> Result<String, CodecError> {
        if tiles.is_empty() {
            return Ok(String::new());
        }
        let bytes: Vec<u8> = tiles
            .as_slice()
            .iter()
            .flat_map(|id| id.to_le_bytes())
            .collect();
        let bytes = match compression {
            TileCompression::None => bytes,
            kind => self
                .compression
                .create(kind, level)
                .ok_or(CodecError::MissingProvider(kind))?
                .compress(&bytes)?,
        };
        Ok(STANDARD.encode(bytes))
    }

    /// Inverse of [`TileCodec::encode_base64`]. Whitespace inside the text is ignored.
    pub fn decode_base64(
        &self,
        text: &str,
        extent: Extent,
        compression: TileCompression,
    ) -> Result<TileMatrix, CodecError> {
        let compact: String = text.split_whitespace().collect();
        if let Some(empty) = Self::decode_empty(&compact, extent)? {
            return Ok(empty);
        }

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| bad_structure(format!("invalid base64: {err}")))?;
        let bytes = match compression {
            TileCompression::None => bytes,
            kind => self
                .compression
                .create(kind, None)
                .ok_or(CodecError::MissingProvider(kind))?
                .decompress(&bytes)?,
        };

        if bytes.len() % 4 != 0 {
            return Err(bad_structure(format!(
                "tile data length {} is not a multiple of 4",
                bytes.len()
            )));
        }
        let tiles = bytes
            .chunks_exact(4)
            .map(|chunk| TileId::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::finish(extent, tiles)
    }

    /// Rejects oversized extents, then handles empty text and empty extents, which
    /// must come together.
    fn decode_empty(text: &str, extent: Extent) -> Result<Option<TileMatrix>, CodecError> {
        let Some(len) = extent.checked_len() else {
            return Err(bad_structure(format!(
                "a {}x{} layer is too large",
                extent.rows, extent.cols
            )));
        };
        match (text.is_empty(), len == 0) {
            (true, true) => Ok(Some(TileMatrix::new(extent))),
            (false, false) => Ok(None),
            (true, false) => Err(bad_structure(format!(
                "no tile data for a {}x{} layer",
                extent.rows, extent.cols
            ))),
            (false, true) => Err(bad_structure("tile data present for an empty layer")),
        }
    }

    fn finish(extent: Extent, tiles: Vec<TileId>) -> Result<TileMatrix, CodecError> {
        let count = tiles.len();
        TileMatrix::from_row_major(extent, tiles).ok_or_else(|| {
            bad_structure(format!(
                "expected {} tiles, found {count}",
                extent.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_formats() -> Vec<TileFormat> {
        let mut formats = vec![TileFormat::plain()];
        for compression in [
            TileCompression::None,
            TileCompression::Zlib,
            TileCompression::Zstd,
        ] {
            formats.push(TileFormat::base64(compression));
            // Plain text ignores compression but still has to round-trip.
            formats.push(TileFormat {
                encoding: TileEncoding::PlainText,
                compression,
                compression_level: None,
            });
        }
        formats
    }

    fn sample_matrices() -> Vec<TileMatrix> {
        let large: Vec<Vec<TileId>> = (0..37)
            .map(|row| (0..53).map(|col| (row * 53 + col) % 11).collect())
            .collect();
        vec![
            TileMatrix::default(),
            TileMatrix::from_rows(vec![vec![], vec![]]),
            TileMatrix::from_rows(vec![vec![0]]),
            TileMatrix::from_rows(vec![vec![0, 0, 0], vec![0, 0, 0]]),
            TileMatrix::from_rows(vec![vec![1, 2, 3, 4, 5]]),
            TileMatrix::from_rows(vec![vec![1], vec![2], vec![3]]),
            TileMatrix::from_rows(vec![vec![u32::MAX, 0], vec![7, 1 << 31]]),
            TileMatrix::from_rows(large),
        ]
    }

    #[test]
    fn test_round_trip_every_format() {
        let codec = TileCodec::default();
        for format in all_formats() {
            for matrix in sample_matrices() {
                let text = codec.encode(&matrix, &format).unwrap();
                let decoded = codec.decode(&text, matrix.extent(), &format).unwrap();
                assert_eq!(decoded, matrix, "{format:?}");
            }
        }
    }

    #[test]
    fn test_round_trip_with_levels() {
        let codec = TileCodec::default();
        let matrix = sample_matrices().pop().unwrap();
        for format in [
            TileFormat::base64(TileCompression::Zlib).with_level(9),
            TileFormat::base64(TileCompression::Zstd).with_level(19),
            TileFormat::base64(TileCompression::Zlib).with_level(-1),
        ] {
            let text = codec.encode(&matrix, &format).unwrap();
            assert_eq!(codec.decode(&text, matrix.extent(), &format).unwrap(), matrix);
        }
    }

    #[test]
    fn test_empty_grid_encodes_to_empty_string() {
        let codec = TileCodec::default();
        for format in all_formats() {
            assert_eq!(codec.encode(&TileMatrix::default(), &format).unwrap(), "");
        }
    }

    #[test]
    fn test_two_by_two_example() {
        let codec = TileCodec::default();
        let tiles = TileMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);

        assert_eq!(codec.encode(&tiles, &TileFormat::plain()).unwrap(), "1,2\n3,4");

        let expected = STANDARD.encode([
            0x01_u8, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04, 0x00,
            0x00, 0x00,
        ]);
        let encoded = codec
            .encode(&tiles, &TileFormat::base64(TileCompression::None))
            .unwrap();
        assert_eq!(encoded, expected);
        assert_eq!(encoded, "AQAAAAIAAAADAAAABAAAAA==");
    }

    #[test]
    fn test_plain_styles() {
        let codec = TileCodec::default();
        let tiles = TileMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(codec.encode_plain(&tiles, PlainTextStyle::TILED_CSV), "1,2,\n3,4");
        assert_eq!(codec.encode_plain(&tiles, PlainTextStyle::SPACED), "1 2\n3 4");
        assert_eq!(
            codec.encode_plain(&tiles, PlainTextStyle::SPACED_SINGLE_LINE),
            "1 2 3 4"
        );
        let decoded = codec
            .decode_plain("\n1,2,\n3,4\n", tiles.extent(), PlainTextStyle::TILED_CSV)
            .unwrap();
        assert_eq!(decoded, tiles);
    }

    #[test]
    fn test_plain_rejects_wrong_token_count() {
        let codec = TileCodec::default();
        let extent = Extent::new(2, 2);
        let err = codec
            .decode_plain("1,2\n3", extent, PlainTextStyle::CSV)
            .unwrap_err();
        assert!(matches!(err, CodecError::BadStructure(_)));

        let err = codec
            .decode_plain("1,2,3\n4,5,6", extent, PlainTextStyle::CSV)
            .unwrap_err();
        assert!(matches!(err, CodecError::BadStructure(_)));

        let err = codec
            .decode_plain("1,2\n3,4\n5,6", extent, PlainTextStyle::CSV)
            .unwrap_err();
        assert!(matches!(err, CodecError::BadStructure(_)));
    }

    #[test]
    fn test_plain_rejects_bad_tokens() {
        let codec = TileCodec::default();
        for text in ["1,x\n3,4", "1,-2\n3,4", "1,,\n3,4"] {
            assert!(
                codec
                    .decode_plain(text, Extent::new(2, 2), PlainTextStyle::CSV)
                    .is_err(),
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_flat_decoding_ignores_layout() {
        let codec = TileCodec::default();
        let expected = TileMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        for text in ["1,2,3,4", "\n1,2,\n3,4\n", "1, 2,\r\n3, 4"] {
            let decoded = codec
                .decode_plain_flat(text, Extent::new(2, 2), PlainTextStyle::TILED_CSV)
                .unwrap();
            assert_eq!(decoded, expected, "{text:?}");
        }
        assert!(codec
            .decode_plain_flat("1,2,3", Extent::new(2, 2), PlainTextStyle::CSV)
            .is_err());
    }

    #[test]
    fn test_base64_length_not_multiple_of_four() {
        let codec = TileCodec::default();
        let text = STANDARD.encode([1u8, 0, 0, 0, 2, 0]);
        let err = codec
            .decode_base64(&text, Extent::new(1, 2), TileCompression::None)
            .unwrap_err();
        assert!(matches!(err, CodecError::BadStructure(reason) if reason.contains("multiple of 4")));
    }

    #[test]
    fn test_base64_compressed_length_not_multiple_of_four() {
        let codec = TileCodec::default();
        let compressed = codec
            .compression()
            .create(TileCompression::Zlib, None)
            .unwrap()
            .compress(&[1, 2, 3, 4, 5])
            .unwrap();
        let err = codec
            .decode_base64(&STANDARD.encode(compressed), Extent::new(1, 1), TileCompression::Zlib)
            .unwrap_err();
        assert!(matches!(err, CodecError::BadStructure(_)));
    }

    #[test]
    fn test_base64_count_mismatch() {
        let codec = TileCodec::default();
        let text = codec
            .encode_base64(&TileMatrix::from_rows(vec![vec![1, 2, 3]]), TileCompression::None, None)
            .unwrap();
        assert!(codec
            .decode_base64(&text, Extent::new(2, 2), TileCompression::None)
            .is_err());
    }

    #[test]
    fn test_base64_ignores_whitespace() {
        let codec = TileCodec::default();
        let tiles = TileMatrix::from_rows(vec![vec![1, 2], vec![3, 4]]);
        let decoded = codec
            .decode_base64(
                "\n   AQAAAAIAAAAD\n   AAAABAAAAA==\n",
                tiles.extent(),
                TileCompression::None,
            )
            .unwrap();
        assert_eq!(decoded, tiles);
    }

    #[test]
    fn test_base64_rejects_invalid_alphabet() {
        let codec = TileCodec::default();
        assert!(matches!(
            codec.decode_base64("@@@@", Extent::new(1, 1), TileCompression::None),
            Err(CodecError::BadStructure(_))
        ));
    }

    #[test]
    fn test_decompression_failure_surfaces() {
        let codec = TileCodec::default();
        let text = STANDARD.encode(b"not zlib data at all");
        assert!(matches!(
            codec.decode_base64(&text, Extent::new(1, 1), TileCompression::Zlib),
            Err(CodecError::Compression(_))
        ));
    }

    #[test]
    fn test_missing_provider() {
        let codec = TileCodec::new(Arc::new(CompressionRegistry::empty()));
        let tiles = TileMatrix::from_rows(vec![vec![1]]);
        assert!(matches!(
            codec.encode_base64(&tiles, TileCompression::Zstd, None),
            Err(CodecError::MissingProvider(TileCompression::Zstd))
        ));
    }

    #[test]
    fn test_empty_text_for_non_empty_layer() {
        let codec = TileCodec::default();
        assert!(codec
            .decode("", Extent::new(2, 2), &TileFormat::plain())
            .is_err());
        assert!(codec
            .decode("1", Extent::new(0, 0), &TileFormat::plain())
            .is_err());
    }

    #[test]
    fn test_oversized_extent_is_rejected() {
        let codec = TileCodec::default();
        for text in ["", "1"] {
            assert!(matches!(
                codec.decode_plain_flat(text, Extent::new(usize::MAX, 2), PlainTextStyle::SPACED),
                Err(CodecError::BadStructure(_))
            ));
            assert!(matches!(
                codec.decode_plain(text, Extent::new(usize::MAX / 2, 4), PlainTextStyle::CSV),
                Err(CodecError::BadStructure(_))
            ));
        }
        assert!(matches!(
            codec.decode_base64("AQAAAA==", Extent::new(usize::MAX, usize::MAX), TileCompression::None),
            Err(CodecError::BadStructure(_))
        ));
    }
}
