//! Node factories.

use crate::config::{ShapeDefaults, TextDefaults};
use crate::scene::Scene;
use crate::shapes::{Circle, Image, Rectangle, Stroke, StrokeMode, Text, TextId};
use kurbo::Point;
use std::sync::atomic::{AtomicU64, Ordering};

/// Builds circles, rectangles, strokes and images from configured defaults.
#[derive(Debug, Clone, Default)]
pub struct ShapeFactory {
    defaults: ShapeDefaults,
}

impl ShapeFactory {
    pub fn new(defaults: ShapeDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &ShapeDefaults {
        &self.defaults
    }

    /// A draggable circle at the default location.
    pub fn circle(&self) -> Circle {
        let d = &self.defaults.circle;
        let mut circle = Circle::new(d.center, d.radius);
        circle.fill = Some(d.fill.clone());
        circle.stroke = Some(d.stroke.clone());
        circle.stroke_width = d.stroke_width;
        circle.draggable = true;
        circle
    }

    /// A draggable rectangle at the default location.
    pub fn rectangle(&self) -> Rectangle {
        let d = &self.defaults.rectangle;
        let mut rect = Rectangle::new(d.position, d.width, d.height);
        rect.fill = Some(d.fill.clone());
        rect.stroke = Some(d.stroke.clone());
        rect.stroke_width = d.stroke_width;
        rect.draggable = true;
        rect
    }

    /// A one-point stroke; `mode` fixes its compositing.
    pub fn line(&self, start: Point, mode: StrokeMode) -> Stroke {
        let d = &self.defaults.stroke;
        let mut stroke = Stroke::new(start, mode);
        stroke.stroke = d.color.clone();
        stroke.stroke_width = d.width;
        stroke
    }

    /// A draggable, not yet loaded image at the import location.
    pub fn image(&self, source: impl Into<String>) -> Image {
        let mut image = Image::new(self.defaults.image_position, source);
        image.draggable = true;
        image
    }
}

/// Monotonic source of text ids for one editor.
#[derive(Debug)]
pub struct TextIdGenerator {
    next: AtomicU64,
}

impl Default for TextIdGenerator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl TextIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fresh id in `1..=TextId::MAX`.
    ///
    /// Past `TextId::MAX` the counter starts again at 1, so callers that need
    /// uniqueness against existing nodes check them (see `TextFactory::unique_id`).
    pub fn mint(&self) -> TextId {
        let advance = |n: u64| Some(if n >= TextId::MAX.0 { 1 } else { n + 1 });
        match self.next.fetch_update(Ordering::SeqCst, Ordering::SeqCst, advance) {
            Ok(n) | Err(n) => TextId(n),
        }
    }

    /// Make sure `id` is never minted later. Returns false for ids outside
    /// the mintable range, which the caller must replace.
    pub fn observe(&self, id: TextId) -> bool {
        if !id.is_valid() {
            return false;
        }
        self.next.fetch_max(id.0 + 1, Ordering::SeqCst);
        true
    }
}

/// Builds editable text nodes with unique ids.
#[derive(Debug, Default)]
pub struct TextFactory {
    defaults: TextDefaults,
    ids: TextIdGenerator,
}

impl TextFactory {
    pub fn new(defaults: TextDefaults) -> Self {
        Self {
            defaults,
            ids: TextIdGenerator::new(),
        }
    }

    pub fn ids(&self) -> &TextIdGenerator {
        &self.ids
    }

    /// Mint an id not used by any text node in `scene`.
    pub fn unique_id(&self, scene: &Scene) -> TextId {
        loop {
            let id = self.ids.mint();
            if scene.text_by_id(id).is_none() {
                return id;
            }
        }
    }

    /// A draggable placeholder text node with a fresh id.
    pub fn text(&self, scene: &Scene) -> Text {
        let d = &self.defaults;
        let mut text = Text::new(self.unique_id(scene), d.position, d.content.clone());
        text.font_size = d.font_size;
        text.width = Some(d.width);
        text.fill = Some(d.fill.clone());
        text.draggable = true;
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Node;

    #[test]
    fn test_circle_defaults() {
        let circle = ShapeFactory::default().circle();
        assert_eq!(circle.center(), Point::new(100.0, 100.0));
        assert!((circle.radius - 70.0).abs() < f64::EPSILON);
        assert_eq!(circle.fill.as_ref().map(|c| c.as_str()), Some("red"));
        assert!(circle.draggable);
    }

    #[test]
    fn test_rectangle_defaults() {
        let rect = ShapeFactory::default().rectangle();
        assert_eq!(rect.transform.position(), Point::new(20.0, 50.0));
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
        assert!(rect.draggable);
    }

    #[test]
    fn test_line_modes() {
        let factory = ShapeFactory::default();
        let brush = factory.line(Point::new(1.0, 2.0), StrokeMode::Brush);
        let erase = factory.line(Point::new(1.0, 2.0), StrokeMode::Erase);
        assert_eq!(brush.points, vec![Point::new(1.0, 2.0)]);
        assert_eq!(brush.mode, StrokeMode::Brush);
        assert_eq!(erase.mode, StrokeMode::Erase);
        assert!(!brush.draggable);
    }

    #[test]
    fn test_id_generator_is_monotonic() {
        let ids = TextIdGenerator::new();
        assert_eq!(ids.mint(), TextId(1));
        assert_eq!(ids.mint(), TextId(2));
        ids.observe(TextId(10));
        assert_eq!(ids.mint(), TextId(11));
        ids.observe(TextId(3));
        assert_eq!(ids.mint(), TextId(12));
    }

    #[test]
    fn test_id_generator_never_mints_unassigned() {
        let ids = TextIdGenerator::new();
        assert!(!ids.observe(TextId(u64::MAX)));
        assert!(!ids.observe(TextId::UNASSIGNED));
        assert_eq!(ids.mint(), TextId(1));

        assert!(ids.observe(TextId(TextId::MAX.0 - 1)));
        assert_eq!(ids.mint(), TextId::MAX);
        assert_eq!(ids.mint(), TextId(1));
    }

    #[test]
    fn test_text_ids_unique_in_scene() {
        let factory = TextFactory::default();
        let mut scene = Scene::new();
        // An id already present in the scene is skipped.
        scene.add(Node::Text(Text::new(TextId(1), Point::ZERO, "taken")));
        let text = factory.text(&scene);
        assert_eq!(text.text_id, TextId(2));
        assert_eq!(text.text, "Some text here");
        assert_eq!(text.width, Some(200.0));
        assert!(text.draggable);
    }
}
