//! Error types shared by every conversion layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::attribute::AttributeKind;
use crate::ir::TileCompression;

/// An attribute payload did not match the declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("type mismatch: expected {expected}, found {found}")]
pub struct TypeMismatch {
    pub expected: AttributeKind,
    pub found: AttributeKind,
}

/// Failure reported by a compression provider.
///
/// The underlying library diagnostic is intentionally not carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompressionError {
    #[error("no data to decompress")]
    NoData,

    #[error("input is not valid compressed data")]
    Decode,

    #[error("internal compression error")]
    Internal,
}

/// Failure while encoding or decoding a tile grid.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{0}")]
    BadStructure(String),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error("no provider registered for {0:?} compression")]
    MissingProvider(TileCompression),
}

/// Error returned by every load and save operation.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Failed to open '{}': {source}", .path.display())]
    BadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bad structure in {context}: {reason}")]
    BadStructure { context: String, reason: String },

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Unsupported version '{found}', expected '{expected}'")]
    UnsupportedVersion { found: String, expected: String },

    #[error("Compression failure: {0}")]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`FormatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadFile,
    BadStructure,
    UnsupportedFeature,
    UnsupportedVersion,
    Compression,
    TypeMismatch,
    Io,
}

impl FormatError {
    pub fn bad_structure(context: impl Into<String>, reason: impl Into<String>) -> Self {
        FormatError::BadStructure {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a required field that is absent.
    pub fn missing_field(context: impl Into<String>, field: &str) -> Self {
        Self::bad_structure(context, format!("missing required field '{field}'"))
    }

    pub fn bad_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormatError::BadFile {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::BadFile { .. } => ErrorKind::BadFile,
            FormatError::BadStructure { .. } => ErrorKind::BadStructure,
            FormatError::UnsupportedFeature(_) => ErrorKind::UnsupportedFeature,
            FormatError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            FormatError::Compression(_) => ErrorKind::Compression,
            FormatError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            FormatError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<CodecError> for FormatError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::BadStructure(reason) => FormatError::bad_structure("tile data", reason),
            CodecError::Compression(err) => FormatError::Compression(err),
            CodecError::MissingProvider(compression) => FormatError::UnsupportedFeature(format!(
                "{compression:?} compression is not available"
            )),
        }
    }
}

pub type Result<T, E = FormatError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_maps_to_kind() {
        let err: FormatError = CodecError::BadStructure("odd length".into()).into();
        assert_eq!(err.kind(), ErrorKind::BadStructure);
        assert_eq!(err.to_string(), "Bad structure in tile data: odd length");

        let err: FormatError = CodecError::Compression(CompressionError::Decode).into();
        assert_eq!(err.kind(), ErrorKind::Compression);
    }

    #[test]
    fn test_bad_file_message_names_path() {
        let err = FormatError::bad_file(
            "maps/missing.tmj",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.kind(), ErrorKind::BadFile);
        assert!(err.to_string().contains("maps/missing.tmj"));
    }
}
