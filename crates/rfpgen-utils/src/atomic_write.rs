//! Atomic file writes: temp file in the target directory, fsync, rename.
//!
//! A reader of the target path sees either the previous content or the new
//! content, never a partial write.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Write `content` to `path` atomically.
///
/// Parent directories are created as needed. Bytes are written unchanged.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the temporary file
/// cannot be written or synced, or the final rename fails.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    temp_file
        .persist(path.as_std_path())
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to atomically write file: {path}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_and_file() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let target = root.join("nested").join("record.json");

        write_file_atomic(&target, "{\"a\":1}").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let target = root.join("record.json");

        write_file_atomic(&target, "first").unwrap();
        write_file_atomic(&target, "second\r\nline").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "second\r\nline");
        let leftovers: Vec<_> = fs::read_dir(&root).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary files must not linger");
    }
}
