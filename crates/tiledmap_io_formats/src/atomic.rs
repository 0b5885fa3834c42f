//! All-or-nothing file writes.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tiledmap_io_core::error::{FormatError, Result};
use tracing::debug;

/// Writes a file through a temporary sibling that replaces `path` only on success.
///
/// If `write` fails, or anything before the final rename does, the previous content
/// of `path` is left as it was and the temporary file is removed.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| FormatError::bad_file(dir, err))?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }

    // Keep the permissions of the file being replaced.
    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| FormatError::Io(err.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// [`write_atomically`] for content that is already in memory.
pub fn write_bytes_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomically(path, |writer| Ok(writer.write_all(bytes)?))
}
