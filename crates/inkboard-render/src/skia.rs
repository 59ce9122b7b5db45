//! tiny-skia scene rasterizer.

use crate::renderer::{RenderOptions, RenderResult, RendererError};
use crate::text::rasterize_text;
use inkboard_core::error::ExportError;
use inkboard_core::export::Rasterizer;
use inkboard_core::scene::Scene;
use inkboard_core::shapes::{
    Circle, Color, DecodedImage, Image, Node, NodeId, Rectangle, Stroke, StrokeMode, Text,
};
use kurbo::Affine;
use rusttype::Font;
use tiny_skia::{
    BlendMode, ColorU8, FillRule, FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder,
    Pixmap, PixmapPaint, Rect, Transform,
};

/// Software rasterizer for whole scenes.
///
/// Text needs a font; without one, text nodes are left out of the output.
#[derive(Default)]
pub struct SkiaRasterizer {
    font: Option<Font<'static>>,
    options: RenderOptions,
}

impl std::fmt::Debug for SkiaRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkiaRasterizer")
            .field("font", &self.font.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl SkiaRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a TrueType/OpenType font for text nodes.
    pub fn with_font(mut self, bytes: Vec<u8>) -> RenderResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| RendererError::Font("unsupported font data".to_string()))?;
        self.font = Some(font);
        Ok(self)
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render the scene at stage size.
    pub fn render_pixmap(&self, scene: &Scene) -> RenderResult<Pixmap> {
        if scene.width > Scene::MAX_SIDE || scene.height > Scene::MAX_SIDE {
            return Err(RendererError::TooLarge {
                width: scene.width,
                height: scene.height,
                max: Scene::MAX_SIDE,
            });
        }
        let mut pixmap = Pixmap::new(scene.width, scene.height).ok_or(RendererError::InvalidSize {
            width: scene.width,
            height: scene.height,
        })?;
        if let Some(background) = &self.options.background {
            pixmap.fill(paint_color(background));
        }
        for node in scene.nodes_ordered() {
            self.draw_node(&mut pixmap, node);
        }
        Ok(pixmap)
    }

    /// Render the scene and encode it as PNG.
    pub fn render_png(&self, scene: &Scene) -> RenderResult<Vec<u8>> {
        let pixmap = self.render_pixmap(scene)?;
        pixmap
            .encode_png()
            .map_err(|e| RendererError::Encode(e.to_string()))
    }

    fn draw_node(&self, pixmap: &mut Pixmap, node: &Node) {
        let transform = to_skia(node.affine());
        match node {
            Node::Circle(circle) => draw_circle(pixmap, circle, transform),
            Node::Rectangle(rect) => draw_rectangle(pixmap, rect, transform),
            Node::Stroke(stroke) => draw_stroke(pixmap, stroke, transform),
            Node::Text(text) => self.draw_text(pixmap, text, transform),
            Node::Image(image) => draw_image(pixmap, node.id(), image, transform),
        }
    }

    fn draw_text(&self, pixmap: &mut Pixmap, text: &Text, transform: Transform) {
        let Some(font) = &self.font else {
            log::debug!("No font loaded, skipping text {}", text.text_id);
            return;
        };
        let color = text.fill.as_ref().map_or([0, 0, 0, 255], rgba);
        if let Some(layer) = rasterize_text(font, text, color) {
            pixmap.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), transform, None);
        }
    }
}

impl Rasterizer for SkiaRasterizer {
    fn rasterize(&self, scene: &Scene) -> Result<Vec<u8>, ExportError> {
        Ok(self.render_png(scene)?)
    }
}

fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

/// Straight RGBA for a colour; unrecognised colours paint black.
fn rgba(color: &Color) -> [u8; 4] {
    color.to_rgba8().unwrap_or_else(|| {
        log::warn!("Unrecognised colour `{color}`, painting black");
        [0, 0, 0, 255]
    })
}

fn paint_color(color: &Color) -> tiny_skia::Color {
    let [r, g, b, a] = rgba(color);
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn solid(color: &Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(paint_color(color));
    paint.anti_alias = true;
    paint
}

fn outline(width: f64) -> tiny_skia::Stroke {
    tiny_skia::Stroke {
        width: width as f32,
        ..Default::default()
    }
}

fn draw_circle(pixmap: &mut Pixmap, circle: &Circle, transform: Transform) {
    let Some(path) = PathBuilder::from_circle(0.0, 0.0, circle.radius as f32) else {
        return;
    };
    if let Some(fill) = &circle.fill {
        pixmap.fill_path(&path, &solid(fill), FillRule::Winding, transform, None);
    }
    if let Some(stroke) = &circle.stroke {
        pixmap.stroke_path(&path, &solid(stroke), &outline(circle.stroke_width), transform, None);
    }
}

fn draw_rectangle(pixmap: &mut Pixmap, rect: &Rectangle, transform: Transform) {
    let Some(r) = Rect::from_xywh(0.0, 0.0, rect.width as f32, rect.height as f32) else {
        return;
    };
    let path = PathBuilder::from_rect(r);
    if let Some(fill) = &rect.fill {
        pixmap.fill_path(&path, &solid(fill), FillRule::Winding, transform, None);
    }
    if let Some(stroke) = &rect.stroke {
        pixmap.stroke_path(&path, &solid(stroke), &outline(rect.stroke_width), transform, None);
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, transform: Transform) {
    let mut paint = solid(&stroke.stroke);
    if stroke.mode == StrokeMode::Erase {
        paint.blend_mode = BlendMode::DestinationOut;
    }
    let width = stroke.stroke_width as f32;

    match stroke.points.as_slice() {
        [] => {}
        // A single tap leaves a round dot.
        [p] => {
            if let Some(dot) = PathBuilder::from_circle(p.x as f32, p.y as f32, width / 2.0) {
                pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
            }
        }
        [first, rest @ ..] => {
            let mut pb = PathBuilder::new();
            pb.move_to(first.x as f32, first.y as f32);
            for p in rest {
                pb.line_to(p.x as f32, p.y as f32);
            }
            let Some(path) = pb.finish() else {
                return;
            };
            let style = tiny_skia::Stroke {
                width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &style, transform, None);
        }
    }
}

/// Convert straight-alpha pixels into a premultiplied pixmap.
fn image_pixmap(pixels: &DecodedImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(pixels.width, pixels.height)?;
    let mut data = Vec::with_capacity(pixels.rgba.len());
    for px in pixels.rgba.chunks_exact(4) {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size)
}

fn draw_image(pixmap: &mut Pixmap, id: NodeId, image: &Image, transform: Transform) {
    let Some(pixels) = &image.pixels else {
        log::debug!("Image {id} has no pixels yet");
        return;
    };
    let Some(layer) = image_pixmap(pixels) else {
        log::warn!("Image {id} has invalid pixel data");
        return;
    };
    let (width, height) = image.size();
    let transform = transform.pre_scale(
        (width / f64::from(pixels.width)) as f32,
        (height / f64::from(pixels.height)) as f32,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..Default::default()
    };
    pixmap.draw_pixmap(0, 0, layer.as_ref(), &paint, transform, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::loader::DataUriLoader;
    use inkboard_core::shapes::TextId;
    use inkboard_core::{Editor, FileInput, ToolKind};
    use kurbo::Point;

    fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(pixel));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn alpha_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        pixmap.pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn test_circle_fill() {
        let mut scene = Scene::with_size(200, 200);
        let mut circle = Circle::new(Point::new(100.0, 100.0), 50.0);
        circle.fill = Some(Color::new("red"));
        scene.add(Node::Circle(circle));

        let pixmap = SkiaRasterizer::new().render_pixmap(&scene).unwrap();
        let center = pixmap.pixel(100, 100).unwrap();
        assert_eq!((center.red(), center.green(), center.alpha()), (255, 0, 255));
        assert_eq!(alpha_at(&pixmap, 5, 5), 0);
    }

    #[test]
    fn test_background_option() {
        let scene = Scene::with_size(4, 4);
        let rasterizer =
            SkiaRasterizer::new().with_options(RenderOptions::default().with_background("white"));
        let pixmap = rasterizer.render_pixmap(&scene).unwrap();
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.alpha()), (255, 255));
    }

    #[test]
    fn test_erase_stroke_clears_pixels() {
        let mut scene = Scene::with_size(100, 100);
        let mut rect = Rectangle::new(Point::ZERO, 100.0, 100.0);
        rect.fill = Some(Color::new("green"));
        scene.add(Node::Rectangle(rect));
        let mut eraser = Stroke::new(Point::new(10.0, 50.0), StrokeMode::Erase);
        eraser.stroke_width = 10.0;
        eraser.add_point(Point::new(90.0, 50.0));
        scene.add(Node::Stroke(eraser));

        let pixmap = SkiaRasterizer::new().render_pixmap(&scene).unwrap();
        assert_eq!(alpha_at(&pixmap, 50, 50), 0);
        assert_eq!(alpha_at(&pixmap, 50, 20), 255);
    }

    #[test]
    fn test_brush_dot_for_single_point() {
        let mut scene = Scene::with_size(40, 40);
        let mut dot = Stroke::new(Point::new(20.0, 20.0), StrokeMode::Brush);
        dot.stroke_width = 10.0;
        scene.add(Node::Stroke(dot));
        let pixmap = SkiaRasterizer::new().render_pixmap(&scene).unwrap();
        assert_eq!(alpha_at(&pixmap, 20, 20), 255);
        assert_eq!(alpha_at(&pixmap, 2, 2), 0);
    }

    #[test]
    fn test_unknown_color_paints_black() {
        let mut scene = Scene::with_size(20, 20);
        let mut rect = Rectangle::new(Point::ZERO, 20.0, 20.0);
        rect.fill = Some(Color::new("not-a-colour"));
        scene.add(Node::Rectangle(rect));
        let pixmap = SkiaRasterizer::new().render_pixmap(&scene).unwrap();
        let px = pixmap.pixel(10, 10).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0, 0, 0, 255));
    }

    #[test]
    fn test_text_without_font_is_skipped() {
        let mut scene = Scene::with_size(50, 50);
        scene.add(Node::Text(Text::new(TextId(1), Point::ZERO, "hi")));
        let pixmap = SkiaRasterizer::new().render_pixmap(&scene).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_rejects_bad_font() {
        let result = SkiaRasterizer::new().with_font(b"not a font".to_vec());
        assert!(matches!(result, Err(RendererError::Font(_))));
    }

    #[test]
    fn test_zero_stage_is_an_error() {
        let result = SkiaRasterizer::new().rasterize(&Scene::with_size(0, 0));
        assert!(matches!(result, Err(ExportError::EmptyStage { width: 0, height: 0 })));
    }

    #[test]
    fn test_oversized_stage_is_refused_before_allocating() {
        let scene = Scene::with_size(200_000, 200_000);
        assert!(matches!(
            SkiaRasterizer::new().render_pixmap(&scene),
            Err(RendererError::TooLarge { max: Scene::MAX_SIDE, .. })
        ));
        assert!(matches!(
            SkiaRasterizer::new().rasterize(&scene),
            Err(ExportError::Render(_))
        ));
    }

    #[test]
    fn test_image_pixels_drawn_at_position() {
        let mut editor = Editor::default();
        editor.add_image();
        editor
            .handle_file(FileInput::new("blue.png", png_bytes(10, 10, [0, 0, 255, 255])))
            .unwrap();
        pollster::block_on(editor.settle_loads(&DataUriLoader::new()));

        let pixmap = SkiaRasterizer::new().render_pixmap(editor.scene()).unwrap();
        // Images land at (120, 50).
        let inside = pixmap.pixel(125, 55).unwrap();
        assert_eq!((inside.blue(), inside.alpha()), (255, 255));
        assert_eq!(alpha_at(&pixmap, 100, 55), 0);
    }

    #[test]
    fn test_raster_survives_document_round_trip() {
        let mut editor = Editor::default();
        editor.select_tool(ToolKind::Circle);
        editor.select_tool(ToolKind::Rectangle);
        editor.add_image();
        editor
            .handle_file(FileInput::new("dot.png", png_bytes(8, 6, [200, 30, 30, 128])))
            .unwrap();
        pollster::block_on(editor.settle_loads(&DataUriLoader::new()));
        editor.select_tool(ToolKind::Erase);
        editor.pointer_down(Point::new(60.0, 60.0));
        editor.pointer_move(Point::new(140.0, 90.0));
        editor.pointer_up(Point::new(140.0, 90.0));

        let rasterizer = SkiaRasterizer::new();
        let before = editor.export_raster(&rasterizer).unwrap();

        let mut reloaded = Editor::default();
        reloaded.from_document(&editor.to_document().unwrap()).unwrap();
        pollster::block_on(reloaded.settle_loads(&DataUriLoader::new()));
        let after = reloaded.export_raster(&rasterizer).unwrap();

        assert_eq!(before.file_name, "whiteboard.png");
        assert_eq!(before.bytes, after.bytes);
        let decoded = image::load_from_memory(&after.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 800));
    }
}
