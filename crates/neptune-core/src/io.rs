use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Readers never observe a half-written spec or config file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a file to a string, mapping "does not exist" to `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read a single-value metadata file. Surrounding whitespace is stripped and
/// an empty file counts as absent.
pub fn read_single_value(path: &Path) -> Result<Option<String>> {
    Ok(read_optional(path)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Write a single-value metadata file with a trailing newline.
pub fn write_single_value(path: &Path, value: &str) -> Result<()> {
    atomic_write(path, format!("{}\n", value.trim()).as_bytes())
}
