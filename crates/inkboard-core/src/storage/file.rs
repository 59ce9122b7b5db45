//! Directory download sink for native platforms.

use super::{BoxFuture, DownloadSink, StorageError, StorageResult};
use crate::export::Blob;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes blobs into a directory, never overwriting existing files.
pub struct FileSink {
    base_path: PathBuf,
}

impl FileSink {
    /// Create a sink writing into `base_path`.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create download directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Sink writing into the user's download directory.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::download_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine download directory".to_string()))?;
        Self::new(base)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// First free path for `file_name`: `name.ext`, `name (1).ext`, ...
    fn free_path(&self, file_name: &str) -> PathBuf {
        let safe = sanitize_file_name(file_name);
        let candidate = self.base_path.join(&safe);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match safe.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
            _ => (safe.clone(), String::new()),
        };
        (1u32..)
            .map(|n| self.base_path.join(format!("{stem} ({n}){ext}")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = safe.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

impl DownloadSink for FileSink {
    fn deliver(&self, blob: &Blob) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.free_path(&blob.file_name);
        let bytes = blob.bytes.clone();

        Box::pin(async move {
            fs::write(&path, bytes).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            log::info!("Saved download to {}", path.display());
            Ok(path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default())
        })
    }
}
