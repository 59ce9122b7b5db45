//! Freehand stroke (brush or eraser).

use super::{Color, NodeId, NodeKind, NodeTransform, ShapeTrait, point_to_polyline_dist};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a stroke composites onto what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StrokeMode {
    /// Paint over existing pixels.
    #[default]
    #[serde(rename = "source-over")]
    Brush,
    /// Clear the pixels underneath.
    #[serde(rename = "destination-out")]
    Erase,
}

impl fmt::Display for StrokeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrokeMode::Brush => f.write_str("brush"),
            StrokeMode::Erase => f.write_str("erase"),
        }
    }
}

pub(crate) const DEFAULT_STROKE_COLOR: &str = "#df4b26";
pub(crate) const DEFAULT_STROKE_WIDTH: f64 = 5.0;

fn default_stroke() -> Color {
    Color::new(DEFAULT_STROKE_COLOR)
}

fn default_stroke_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

/// A polyline produced by dragging in a drawing mode.
///
/// Points are stored in node-local coordinates; the transform offsets them
/// (it stays at the origin for strokes drawn in the editor).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    #[serde(skip, default = "Uuid::new_v4")]
    pub(crate) id: NodeId,
    #[serde(flatten)]
    pub transform: NodeTransform,
    #[serde(with = "flat_points")]
    pub points: Vec<Point>,
    #[serde(default = "default_stroke")]
    pub stroke: Color,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(rename = "globalCompositeOperation", default)]
    pub mode: StrokeMode,
    #[serde(default)]
    pub draggable: bool,
}

impl Stroke {
    /// Start a stroke with a single point.
    pub fn new(start: Point, mode: StrokeMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            transform: NodeTransform::default(),
            points: vec![start],
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
            mode,
            draggable: false,
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Points as `[x0, y0, x1, y1, ...]`.
    pub fn flat_points(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl ShapeTrait for Stroke {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Stroke
    }

    fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut NodeTransform {
        &mut self.transform
    }

    fn local_bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        let bounds = self
            .points
            .iter()
            .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p));
        let half = self.stroke_width / 2.0;
        bounds.inflate(half, half)
    }

    fn hit_test_local(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance + self.stroke_width / 2.0
    }

    fn draggable(&self) -> bool {
        self.draggable
    }
}

/// Serde adapter storing points as a flat number array.
mod flat_points {
    use kurbo::Point;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().flat_map(|p| [p.x, p.y]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let flat = Vec::<f64>::deserialize(deserializer)?;
        if flat.len() % 2 != 0 {
            return Err(D::Error::custom(format!(
                "points must hold an even number of values, got {}",
                flat.len()
            )));
        }
        Ok(flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect())
    }
}
