//! Rectangle node.

use super::{Color, NodeId, NodeKind, NodeTransform, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_stroke_width() -> f64 {
    2.0
}

/// An axis-aligned rectangle; the transform position is its top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: NodeId,
    #[serde(flatten)]
    pub transform: NodeTransform,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub draggable: bool,
}

impl Rectangle {
    /// Create an unfilled rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            transform: NodeTransform::at(position),
            width,
            height,
            fill: None,
            stroke: None,
            stroke_width: default_stroke_width(),
            draggable: false,
        }
    }

    /// Get the rectangle in local coordinates.
    pub fn as_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Rect
    }

    fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    fn local_bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        let half_sw = self.stroke.as_ref().map_or(0.0, |_| self.stroke_width / 2.0);
        let outer = self.as_rect().inflate(tolerance + half_sw, tolerance + half_sw);
        if !outer.contains(point) && !on_far_edge(outer, point) {
            return false;
        }
        if self.fill.is_some() {
            return true;
        }
        let inset = tolerance + self.stroke_width / 2.0;
        let inner = self.as_rect().inset(-inset);
        !(inner.width() > 0.0 && inner.height() > 0.0 && inner.contains(point))
    }

    fn draggable(&self) -> bool {
        self.draggable
    }
}

/// `Rect::contains` is half-open; treat the far edges as inside too.
fn on_far_edge(rect: Rect, point: Point) -> bool {
    (point.x == rect.x1 && point.y >= rect.y0 && point.y <= rect.y1)
        || (point.y == rect.y1 && point.x >= rect.x0 && point.x <= rect.x1)
}
