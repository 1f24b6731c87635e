//! File writes and directory sizes.

use crate::error::{ReceiptError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Write raw bytes to `path`, replacing any existing file.
pub fn write_bytes(content: &[u8], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "written");
    Ok(())
}

/// Total size in bytes of every file under `dir`, recursively.
pub fn dir_size(dir: impl AsRef<Path>) -> Result<u64> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ReceiptError::PathMissing(dir.to_path_buf()));
    }

    let mut total = 0;
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

/// Size in GiB of each directory. Paths that are not directories are logged and left out.
pub fn all_dir_sizes<P: AsRef<Path>>(
    dirs: impl IntoIterator<Item = P>,
) -> Result<BTreeMap<PathBuf, f64>> {
    let mut sizes = BTreeMap::new();
    for dir in dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            tracing::error!(dir = %dir.display(), "directory does not exist");
            continue;
        }
        sizes.insert(dir.to_path_buf(), bytes_to_gib(dir_size(dir)?));
    }
    Ok(sizes)
}
