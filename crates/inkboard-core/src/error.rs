//! Error types for editor operations.

use crate::storage::StorageError;
use thiserror::Error;

/// A document string could not be turned into a scene.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Document is not a stage (className: {0})")]
    MissingStage(String),
    #[error("Malformed stage: {0}")]
    Malformed(String),
}

/// An image source could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// The scene could not be exported.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Stage has no area ({width}x{height})")]
    EmptyStage { width: u32, height: u32 },
    #[error("Render error: {0}")]
    Render(String),
    #[error("Encode error: {0}")]
    Encode(String),
}

/// An editor configuration file could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Any error surfaced to the host.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),
    #[error("Image load failed: {0}")]
    ImageLoad(#[from] LoadError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Config failed: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EditorError = DocumentError::from(json_err).into();
        assert!(matches!(err, EditorError::InvalidDocument(DocumentError::InvalidJson(_))));
        assert!(err.to_string().starts_with("Invalid document: Invalid JSON"));
    }

    #[test]
    fn test_export_error_message() {
        let err = ExportError::EmptyStage { width: 0, height: 10 };
        assert_eq!(err.to_string(), "Stage has no area (0x10)");
    }
}
