//! Document and raster export.

use crate::document::write_document;
use crate::error::{EditorError, ExportError};
use crate::scene::Scene;
use crate::storage::{DownloadSink, StorageResult};

pub const DOCUMENT_FILE_NAME: &str = "whiteboard.json";
pub const DOCUMENT_MIME: &str = "application/json;charset=utf-8";
pub const RASTER_FILE_NAME: &str = "whiteboard.png";
pub const RASTER_MIME: &str = "image/png";

/// A named, typed chunk of bytes ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// The bytes as UTF-8 text, if they are.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Renders a scene into encoded PNG bytes at stage size.
pub trait Rasterizer {
    fn rasterize(&self, scene: &Scene) -> Result<Vec<u8>, ExportError>;
}

/// Produces download blobs from a scene.
#[derive(Debug, Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// The scene document as `whiteboard.json`.
    pub fn export_document(&self, scene: &Scene) -> Result<Blob, EditorError> {
        let json = write_document(scene)?;
        log::info!("Exported document ({} nodes, {} bytes)", scene.len(), json.len());
        Ok(Blob::new(DOCUMENT_FILE_NAME, DOCUMENT_MIME, json.into_bytes()))
    }

    /// The scene pixels as `whiteboard.png`.
    pub fn export_raster(&self, scene: &Scene, rasterizer: &dyn Rasterizer) -> Result<Blob, EditorError> {
        if scene.width == 0 || scene.height == 0 {
            return Err(ExportError::EmptyStage {
                width: scene.width,
                height: scene.height,
            }
            .into());
        }
        let png = rasterizer.rasterize(scene)?;
        log::info!(
            "Exported {}x{} raster ({} bytes)",
            scene.width,
            scene.height,
            png.len()
        );
        Ok(Blob::new(RASTER_FILE_NAME, RASTER_MIME, png))
    }

    /// Hand a blob to a download sink.
    pub async fn download(&self, blob: &Blob, sink: &dyn DownloadSink) -> StorageResult<String> {
        sink.deliver(blob).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Node};
    use crate::storage::MemorySink;
    use kurbo::Point;

    struct FixedRasterizer;

    impl Rasterizer for FixedRasterizer {
        fn rasterize(&self, _scene: &Scene) -> Result<Vec<u8>, ExportError> {
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    #[test]
    fn test_export_document_blob() {
        let mut scene = Scene::new();
        scene.add(Node::Circle(Circle::new(Point::new(1.0, 1.0), 1.0)));
        let blob = ExportService::new().export_document(&scene).unwrap();
        assert_eq!(blob.file_name, "whiteboard.json");
        assert_eq!(blob.mime, "application/json;charset=utf-8");
        assert!(blob.text().unwrap().contains("\"className\":\"Circle\""));
    }

    #[test]
    fn test_export_raster_blob() {
        let blob = ExportService::new()
            .export_raster(&Scene::new(), &FixedRasterizer)
            .unwrap();
        assert_eq!(blob.file_name, "whiteboard.png");
        assert_eq!(blob.mime, "image/png");
        assert_eq!(blob.bytes.len(), 4);
    }

    #[test]
    fn test_export_raster_rejects_empty_stage() {
        let result = ExportService::new().export_raster(&Scene::with_size(0, 10), &FixedRasterizer);
        assert!(matches!(
            result,
            Err(EditorError::Export(ExportError::EmptyStage { width: 0, height: 10 }))
        ));
    }

    #[test]
    fn test_download_to_sink() {
        let sink = MemorySink::new();
        let service = ExportService::new();
        let blob = service.export_document(&Scene::new()).unwrap();
        let name = pollster::block_on(service.download(&blob, &sink)).unwrap();
        assert_eq!(name, "whiteboard.json");
        assert_eq!(sink.blobs().len(), 1);
    }
}
