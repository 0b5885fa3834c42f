//! Number and path helpers shared by the emitters and parsers.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use normalize_path::NormalizePath;
use tiledmap_io_core::error::{FormatError, Result};
use tiledmap_io_core::ir::{Extent, TilesetRef};

/// Formats a float with the shortest text that reads back as the same `f32`, or
/// rounded to `precision` decimals without trailing zeros.
pub(crate) fn format_float(value: f32, precision: Option<usize>) -> String {
    match precision {
        None => value.to_string(),
        Some(precision) => {
            let text = format!("{value:.precision$}");
            if text.contains('.') {
                let trimmed = text.trim_end_matches('0').trim_end_matches('.');
                match trimmed {
                    "-0" => "0".to_string(),
                    _ => trimmed.to_string(),
                }
            } else {
                text
            }
        }
    }
}

/// Widens a float for serializers that only know `f64`, keeping the short decimal form.
///
/// `0.1_f32 as f64` would print as `0.10000000149011612`; this yields `0.1`.
pub(crate) fn widen_float(value: f32, precision: Option<usize>) -> f64 {
    format_float(value, precision)
        .parse()
        .unwrap_or(f64::from(value))
}

/// A JSON number for `value`. Whole numbers are written without a fraction.
pub(crate) fn json_float(value: f32, precision: Option<usize>) -> serde_json::Value {
    let wide = widen_float(value, precision);
    if wide.fract() == 0.0 && wide.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(wide as i64)
    } else {
        serde_json::Number::from_f64(wide)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// A path as written into documents: forward slashes on every platform.
pub(crate) fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Resolves a document-relative reference against `base`.
pub(crate) fn resolve_path(base: &Path, reference: &str) -> PathBuf {
    base.join(reference).normalize()
}

/// A grid size read from a document, rejected if it is too large to hold.
pub(crate) fn grid_extent(rows: usize, cols: usize, context: &str) -> Result<Extent> {
    let extent = Extent::new(rows, cols);
    match extent.checked_len() {
        Some(_) => Ok(extent),
        None => Err(FormatError::bad_structure(
            context,
            format!("a {cols}x{rows} grid is too large"),
        )),
    }
}

/// Picks a file name for every external tileset, unique within the map.
///
/// Names come from the tileset name with path separators replaced; unnamed or
/// clashing tilesets get a numeric suffix.
pub(crate) fn tileset_file_names(tilesets: &[TilesetRef], extension: &str) -> Vec<String> {
    let mut used = HashSet::new();
    tilesets
        .iter()
        .enumerate()
        .map(|(index, tileset)| {
            let stem: String = tileset
                .tileset
                .name()
                .chars()
                .map(|c| match c {
                    '/' | '\\' | ':' => '-',
                    c => c,
                })
                .collect();
            let stem = stem.trim();
            let mut name = if stem.is_empty() {
                format!("tileset-{}.{extension}", index + 1)
            } else {
                format!("{stem}.{extension}")
            };
            let mut suffix = 2;
            while !used.insert(name.clone()) {
                name = format!("{stem}-{suffix}.{extension}");
                suffix += 1;
            }
            name
        })
        .collect()
}
