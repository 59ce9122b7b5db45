//! Renderer errors and options.

use inkboard_core::error::ExportError;
use inkboard_core::shapes::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Surface {width}x{height} exceeds {max} pixels per side")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("Font load failed: {0}")]
    Font(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

impl From<RendererError> for ExportError {
    fn from(err: RendererError) -> Self {
        match err {
            RendererError::InvalidSize { width, height } => ExportError::EmptyStage { width, height },
            RendererError::Encode(e) => ExportError::Encode(e),
            other => ExportError::Render(other.to_string()),
        }
    }
}

/// Options for a render pass.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Painted under the scene. Transparent when `None`.
    pub background: Option<Color>,
}

impl RenderOptions {
    pub fn with_background(mut self, color: impl Into<Color>) -> Self {
        self.background = Some(color.into());
        self
    }
}
