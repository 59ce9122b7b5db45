//! In-memory download sink.

use super::{BoxFuture, DownloadSink, StorageError, StorageResult};
use crate::export::Blob;
use std::sync::RwLock;

/// Keeps delivered blobs in memory, for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemorySink {
    blobs: RwLock<Vec<Blob>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far, oldest first.
    pub fn blobs(&self) -> Vec<Blob> {
        self.blobs.read().map(|b| b.clone()).unwrap_or_default()
    }

    /// The most recent blob with this file name.
    pub fn find(&self, file_name: &str) -> Option<Blob> {
        self.blobs
            .read()
            .ok()?
            .iter()
            .rev()
            .find(|b| b.file_name == file_name)
            .cloned()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, blob: &Blob) -> BoxFuture<'_, StorageResult<String>> {
        let blob = blob.clone();
        Box::pin(async move {
            let mut blobs = self
                .blobs
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            let name = blob.file_name.clone();
            blobs.push(blob);
            Ok(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_and_find() {
        let sink = MemorySink::new();
        let first = Blob::new("a.json", "application/json", b"1".to_vec());
        let second = Blob::new("a.json", "application/json", b"2".to_vec());

        assert_eq!(pollster::block_on(sink.deliver(&first)).unwrap(), "a.json");
        pollster::block_on(sink.deliver(&second)).unwrap();

        assert_eq!(sink.blobs().len(), 2);
        assert_eq!(sink.find("a.json").unwrap().bytes, b"2");
        assert!(sink.find("b.json").is_none());
    }
}
