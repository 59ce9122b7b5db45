//! Image node for embedded raster images.

use super::{NodeId, NodeKind, NodeTransform, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Raster formats accepted for import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format (first frame).
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }

        None
    }
}

/// Decoded straight-alpha RGBA8 pixels, shared between clones of a node.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// An image node; the transform position is its top-left corner.
///
/// `source` is the data URI the pixels came from and is the only image data
/// written to documents. `pixels` is filled in once the source is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: NodeId,
    #[serde(flatten)]
    pub transform: NodeTransform,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub draggable: bool,
    #[serde(skip)]
    pub pixels: Option<DecodedImage>,
}

impl Image {
    /// Create an image node that has not been loaded yet.
    pub fn new(position: Point, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transform: NodeTransform::at(position),
            source: source.into(),
            width: None,
            height: None,
            draggable: false,
            pixels: None,
        }
    }

    /// Attach decoded pixels, adopting their size if none was stored.
    pub fn set_pixels(&mut self, pixels: DecodedImage) {
        self.width.get_or_insert(f64::from(pixels.width));
        self.height.get_or_insert(f64::from(pixels.height));
        self.pixels = Some(pixels);
    }

    pub fn is_loaded(&self) -> bool {
        self.pixels.is_some()
    }

    /// Display size; an unloaded image without a stored size is empty.
    pub fn size(&self) -> (f64, f64) {
        let natural = self
            .pixels
            .as_ref()
            .map(|p| (f64::from(p.width), f64::from(p.height)));
        let width = self.width.or(natural.map(|n| n.0)).unwrap_or(0.0);
        let height = self.height.or(natural.map(|n| n.1)).unwrap_or(0.0);
        (width, height)
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Image
    }

    fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    fn local_bounds(&self) -> Rect {
        let (width, height) = self.size();
        Rect::new(0.0, 0.0, width, height)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        let bounds = self.local_bounds();
        if bounds.area() <= 0.0 {
            return false;
        }
        bounds.inflate(tolerance, tolerance).contains(point)
    }

    fn draggable(&self) -> bool {
        self.draggable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageFormat::from_magic_bytes(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a.."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"{\"a\""), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x89]), None);
    }

    #[test]
    fn test_mime_type_round_trip() {
        for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP, ImageFormat::Gif] {
            assert_eq!(ImageFormat::from_mime_type(format.mime_type()), Some(format));
        }
    }

    #[test]
    fn test_unloaded_image_has_no_area() {
        let img = Image::new(Point::new(120.0, 50.0), "data:image/png;base64,");
        assert_eq!(img.size(), (0.0, 0.0));
        assert!(!img.hit_test_local(Point::ZERO, 0.0));
    }

    #[test]
    fn test_set_pixels_adopts_size() {
        let mut img = Image::new(Point::ZERO, "");
        img.set_pixels(DecodedImage::new(2, 3, vec![0; 24]));
        assert_eq!(img.size(), (2.0, 3.0));
        assert!(img.hit_test_local(Point::new(1.0, 1.0), 0.0));
    }

    #[test]
    fn test_pixels_not_serialized() {
        let mut img = Image::new(Point::new(1.0, 2.0), "data:image/png;base64,AAAA");
        img.set_pixels(DecodedImage::new(1, 1, vec![1, 2, 3, 4]));
        let value = serde_json::to_value(&img).unwrap();
        assert_eq!(value["source"], "data:image/png;base64,AAAA");
        assert_eq!(value["width"], 1.0);
        assert!(value.get("pixels").is_none());
    }
}
