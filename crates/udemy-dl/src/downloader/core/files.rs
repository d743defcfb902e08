//! File naming and placement helpers
//!
//! Targets are always passed around as full paths; nothing here changes the
//! process working directory.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::downloader::core::{DownloadError, FileOperation, Result};

/// Keep letters, digits and ` .-_,`, then drop trailing whitespace
pub fn sanitize_path(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '-' | '_' | ','))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Create a temporary file path for partial downloads
///
/// `lecture.mp4` becomes `lecture.mp4.part`; the extension is appended rather
/// than replaced so that two targets never share a part file.
pub fn create_temp_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Size of an existing partial file, 0 when there is none
pub async fn partial_size(temp_path: &Path) -> Result<u64> {
    match fs::metadata(temp_path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(DownloadError::FileSystem {
            path: temp_path.to_path_buf(),
            operation: FileOperation::Metadata,
            source: e,
        }),
    }
}

/// Create a directory and its parents; existing directories are fine
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloadError::FileSystem {
            path: dir.to_path_buf(),
            operation: FileOperation::CreateDir,
            source: e,
        })
}

/// Atomically rename a temporary file to its final destination
///
/// The final file therefore either exists completely or not at all.
pub async fn atomic_rename(temp_path: &Path, dest_path: &Path) -> Result<()> {
    fs::rename(temp_path, dest_path)
        .await
        .map_err(|e| DownloadError::FileSystem {
            path: dest_path.to_path_buf(),
            operation: FileOperation::Move,
            source: e,
        })?;
    debug!("Atomically renamed {} to {}", temp_path.display(), dest_path.display());
    Ok(())
}
