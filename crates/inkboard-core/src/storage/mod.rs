//! Download sinks for exported blobs.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemorySink;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSink;

use crate::export::Blob;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Where exported blobs are delivered.
///
/// `deliver` returns the name the blob was actually stored under, which may
/// differ from `blob.file_name` when a sink avoids overwriting.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, blob: &Blob) -> BoxFuture<'_, StorageResult<String>>;
}

/// Where exported blobs are delivered (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait DownloadSink {
    fn deliver(&self, blob: &Blob) -> BoxFuture<'_, StorageResult<String>>;
}
