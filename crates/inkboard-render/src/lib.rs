//! Inkboard Render Library
//!
//! Rasterizes Inkboard scenes into pixmaps and PNG bytes using tiny-skia.

mod renderer;
mod skia;
mod text;

pub use renderer::{RenderOptions, RendererError, RenderResult};
pub use skia::SkiaRasterizer;
