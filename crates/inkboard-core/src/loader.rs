//! Image loading from data URIs.

use crate::error::LoadError;
use crate::shapes::{DecodedImage, ImageFormat, NodeId};
use crate::storage::BoxFuture;
use base64::{Engine, engine::general_purpose::STANDARD};

/// Something that can turn an image `source` into pixels.
pub trait ImageLoader {
    fn load<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<DecodedImage, LoadError>>;
}

/// Decodes `data:<mime>;base64,<payload>` sources in memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriLoader;

impl DataUriLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode synchronously.
    pub fn decode(&self, source: &str) -> Result<DecodedImage, LoadError> {
        let (mime, bytes) = parse_data_uri(source)?;
        let format = ImageFormat::from_magic_bytes(&bytes)
            .or_else(|| mime.as_deref().and_then(ImageFormat::from_mime_type))
            .ok_or_else(|| LoadError::UnsupportedFormat(mime.unwrap_or_default()))?;
        decode_image(&bytes, format)
    }
}

impl ImageLoader for DataUriLoader {
    fn load<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<DecodedImage, LoadError>> {
        Box::pin(async move { self.decode(source) })
    }
}

fn to_image_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::WebP => image::ImageFormat::WebP,
        ImageFormat::Gif => image::ImageFormat::Gif,
    }
}

/// Decode encoded image bytes into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, LoadError> {
    let decoded = image::load_from_memory_with_format(bytes, to_image_format(format))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage::new(width, height, rgba.into_raw()))
}

/// Split a data URI into its MIME type and decoded payload.
pub fn parse_data_uri(uri: &str) -> Result<(Option<String>, Vec<u8>), LoadError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::InvalidDataUri("missing `data:` prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidDataUri("missing `,` separator".to_string()))?;
    let mut parts = meta.split(';');
    let mime = parts
        .next()
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_lowercase);
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(LoadError::InvalidDataUri(
            "only base64 payloads are supported".to_string(),
        ));
    }
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime, bytes))
}

/// Build a self-contained data URI for encoded image bytes.
pub fn data_uri(bytes: &[u8]) -> Result<(String, ImageFormat), LoadError> {
    let format = ImageFormat::from_magic_bytes(bytes)
        .ok_or_else(|| LoadError::UnsupportedFormat("unrecognised image data".to_string()))?;
    let uri = format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes));
    Ok((uri, format))
}

/// What a completed load should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    /// Attach pixels to an image node read from a document.
    Rehydrate(NodeId),
    /// Insert a new image node once the pixels are available.
    Insert,
}

/// A pending image load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: u64,
    /// Scene epoch the load was started in.
    pub epoch: u64,
    pub source: String,
    pub target: LoadTarget,
}
