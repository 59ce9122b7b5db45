//! Scene node definitions.

mod circle;
mod color;
mod image;
mod rectangle;
mod stroke;
mod text;

pub use circle::Circle;
pub use color::Color;
pub use image::{DecodedImage, Image, ImageFormat};
pub use rectangle::Rectangle;
pub use stroke::{Stroke, StrokeMode};
pub use text::{FontStyle, StyleParseError, Text, TextDecoration, TextId};

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for nodes in a scene.
pub type NodeId = Uuid;

/// Class names understood by the document reader, in `Node` variant order.
pub const KNOWN_CLASS_NAMES: &[&str] = &["Line", "Circle", "Rect", "Text", "Image"];

/// Discriminant stored alongside a node reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Stroke,
    Circle,
    Rect,
    Text,
    Image,
}

impl NodeKind {
    /// The class name used in documents.
    pub fn class_name(self) -> &'static str {
        match self {
            NodeKind::Stroke => "Line",
            NodeKind::Circle => "Circle",
            NodeKind::Rect => "Rect",
            NodeKind::Text => "Text",
            NodeKind::Image => "Image",
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_one(v: &f64) -> bool {
    *v == 1.0
}

/// Position, rotation and scale shared by every node.
///
/// Rotation is in degrees, applied after scaling and before translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTransform {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
    #[serde(default = "default_scale", skip_serializing_if = "is_one")]
    pub scale_x: f64,
    #[serde(default = "default_scale", skip_serializing_if = "is_one")]
    pub scale_y: f64,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::at(Point::ZERO)
    }
}

impl NodeTransform {
    /// An unrotated, unscaled transform at `position`.
    pub fn at(position: Point) -> Self {
        Self {
            x: position.x,
            y: position.y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Rotation component only (no translation or scale).
    pub fn rotation_affine(&self) -> Affine {
        Affine::rotate(self.rotation.to_radians())
    }

    /// Local-to-stage transform.
    pub fn affine(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * self.rotation_affine()
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Mean absolute scale, used to convert stage tolerances to local ones.
    fn mean_scale(&self) -> f64 {
        ((self.scale_x.abs() + self.scale_y.abs()) / 2.0).max(f64::EPSILON)
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Common behaviour of all node kinds.
///
/// Geometry is expressed in node-local coordinates; `Node` applies the
/// node transform on top.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> NodeId;

    fn kind(&self) -> NodeKind;

    fn transform(&self) -> &NodeTransform;

    fn transform_mut(&mut self) -> &mut NodeTransform;

    /// Bounding box in node-local coordinates.
    fn local_bounds(&self) -> Rect;

    /// Check if a node-local point hits this shape.
    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool;

    /// Whether pointer drags move this node.
    fn draggable(&self) -> bool;
}

/// Enum wrapper for all node kinds.
///
/// Serializes as `{"className": ..., "attrs": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "className", content = "attrs")]
pub enum Node {
    #[serde(rename = "Line")]
    Stroke(Stroke),
    Circle(Circle),
    #[serde(rename = "Rect")]
    Rectangle(Rectangle),
    Text(Text),
    Image(Image),
}

impl Node {
    fn shape(&self) -> &dyn ShapeTrait {
        match self {
            Node::Stroke(s) => s,
            Node::Circle(s) => s,
            Node::Rectangle(s) => s,
            Node::Text(s) => s,
            Node::Image(s) => s,
        }
    }

    fn shape_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Node::Stroke(s) => s,
            Node::Circle(s) => s,
            Node::Rectangle(s) => s,
            Node::Text(s) => s,
            Node::Image(s) => s,
        }
    }

    pub fn id(&self) -> NodeId {
        self.shape().id()
    }

    pub fn kind(&self) -> NodeKind {
        self.shape().kind()
    }

    pub fn transform(&self) -> &NodeTransform {
        self.shape().transform()
    }

    pub fn transform_mut(&mut self) -> &mut NodeTransform {
        self.shape_mut().transform_mut()
    }

    pub fn local_bounds(&self) -> Rect {
        self.shape().local_bounds()
    }

    /// Local-to-stage transform.
    pub fn affine(&self) -> Affine {
        self.transform().affine()
    }

    /// Axis-aligned bounds in stage coordinates.
    pub fn bounds(&self) -> Rect {
        self.affine().transform_rect_bbox(self.local_bounds())
    }

    /// Check if a stage point hits this node.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let transform = self.transform();
        if transform.scale_x == 0.0 || transform.scale_y == 0.0 {
            return false;
        }
        let local = transform.affine().inverse() * point;
        self.shape()
            .hit_test_local(local, tolerance / transform.mean_scale())
    }

    pub fn draggable(&self) -> bool {
        self.shape().draggable()
    }

    /// The fill slot for kinds that have one.
    pub fn fill_mut(&mut self) -> Option<&mut Option<Color>> {
        match self {
            Node::Circle(c) => Some(&mut c.fill),
            Node::Rectangle(r) => Some(&mut r.fill),
            Node::Text(t) => Some(&mut t.fill),
            Node::Stroke(_) | Node::Image(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_stroke_mut(&mut self) -> Option<&mut Stroke> {
        match self {
            Node::Stroke(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Node::Image(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            Node::Image(img) => Some(img),
            _ => None,
        }
    }
}
