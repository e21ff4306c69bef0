//! Scratch file helpers for generated images.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Create `dir` and its parents if missing.
pub async fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir).await
}

async fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent).await,
        _ => Ok(()),
    }
}

/// Write `bytes` to `path`, creating parent directories.
pub async fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent(path).await?;
    fs::write(path, bytes).await
}

/// Copy `src` to `dest`, creating parent directories.
pub async fn copy_file(src: &Path, dest: &Path) -> io::Result<u64> {
    ensure_parent(dest).await?;
    fs::copy(src, dest).await
}

/// Remove every entry inside `dir`, keeping `dir` itself.
///
/// Returns the number of removed entries. A missing directory is empty.
pub async fn clear_directory(dir: &Path) -> io::Result<usize> {
    let pattern = format!(
        "{}/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?
        .collect::<Result<_, _>>()
        .map_err(glob::GlobError::into_error)?;

    for entry in &entries {
        if fs::metadata(entry).await?.is_dir() {
            fs::remove_dir_all(entry).await?;
        } else {
            fs::remove_file(entry).await?;
        }
    }

    debug!("Removed {} entries from {:?}", entries.len(), dir);
    Ok(entries.len())
}
