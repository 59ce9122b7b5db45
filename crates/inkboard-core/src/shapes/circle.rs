//! Circle node.

use super::{Color, NodeId, NodeKind, NodeTransform, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_stroke_width() -> f64 {
    2.0
}

/// A circle; the transform position is its centre.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: NodeId,
    #[serde(flatten)]
    pub transform: NodeTransform,
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub draggable: bool,
}

impl Circle {
    /// Create an unfilled circle.
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            transform: NodeTransform::at(center),
            radius,
            fill: None,
            stroke: None,
            stroke_width: default_stroke_width(),
            draggable: false,
        }
    }

    pub fn center(&self) -> Point {
        self.transform.position()
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Circle
    }

    fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    fn local_bounds(&self) -> Rect {
        Rect::new(-self.radius, -self.radius, self.radius, self.radius)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        let reach = self.radius + tolerance + self.stroke.as_ref().map_or(0.0, |_| self.stroke_width / 2.0);
        let dist = point.to_vec2().hypot();
        if dist > reach {
            return false;
        }
        if self.fill.is_some() {
            return true;
        }
        // Outline only: reject the interior.
        let inner = (self.radius - tolerance - self.stroke_width / 2.0).max(0.0);
        dist >= inner
    }

    fn draggable(&self) -> bool {
        self.draggable
    }
}
