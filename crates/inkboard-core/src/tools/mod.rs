//! Tool modes and freehand stroke capture.

use crate::factory::ShapeFactory;
use crate::history::HistoryStack;
use crate::scene::Scene;
use crate::shapes::{Node, NodeId, StrokeMode};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tool intents a host toolbar can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Circle,
    Rectangle,
    Text,
    Line,
    Erase,
    Clear,
}

impl ToolKind {
    /// Get all tool kinds, in toolbar order.
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Circle,
            ToolKind::Rectangle,
            ToolKind::Text,
            ToolKind::Line,
            ToolKind::Erase,
            ToolKind::Clear,
        ]
    }
}

/// The single active tool mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolMode {
    #[default]
    Idle,
    PlaceCircle,
    PlaceRectangle,
    PlaceText,
    Drawing(StrokeMode),
    /// Waiting for a file import to complete.
    Loading,
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolMode::Idle => f.write_str("idle"),
            ToolMode::PlaceCircle => f.write_str("place-circle"),
            ToolMode::PlaceRectangle => f.write_str("place-rectangle"),
            ToolMode::PlaceText => f.write_str("place-text"),
            ToolMode::Drawing(mode) => write!(f, "drawing-{mode}"),
            ToolMode::Loading => f.write_str("loading"),
        }
    }
}

impl ToolMode {
    /// The mode a tool intent enters.
    pub fn for_tool(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Circle => ToolMode::PlaceCircle,
            ToolKind::Rectangle => ToolMode::PlaceRectangle,
            ToolKind::Text => ToolMode::PlaceText,
            ToolKind::Line => ToolMode::Drawing(StrokeMode::Brush),
            ToolKind::Erase => ToolMode::Drawing(StrokeMode::Erase),
            ToolKind::Clear => ToolMode::Idle,
        }
    }

    pub fn is_idle(self) -> bool {
        self == ToolMode::Idle
    }

    pub fn is_drawing(self) -> bool {
        matches!(self, ToolMode::Drawing(_))
    }

    pub fn is_brush(self) -> bool {
        self == ToolMode::Drawing(StrokeMode::Brush)
    }

    pub fn is_erase(self) -> bool {
        self == ToolMode::Drawing(StrokeMode::Erase)
    }

    pub fn is_loading(self) -> bool {
        self == ToolMode::Loading
    }
}

/// Owns the tool mode and the stroke being drawn.
#[derive(Debug, Clone, Default)]
pub struct ToolController {
    mode: ToolMode,
    painting: bool,
    active_stroke: Option<NodeId>,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Enter `mode`, abandoning any stroke in progress.
    pub fn enter(&mut self, mode: ToolMode) {
        if self.mode != mode {
            log::debug!("Tool mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        self.painting = false;
        self.active_stroke = None;
    }

    /// Apply a tool intent and return the mode it entered.
    pub fn select_tool(&mut self, kind: ToolKind) -> ToolMode {
        self.enter(ToolMode::for_tool(kind));
        self.mode
    }

    /// Return to idle after a placement or import finishes.
    pub fn finish(&mut self) {
        if !self.mode.is_drawing() {
            self.enter(ToolMode::Idle);
        }
    }

    /// True between pointer-down and pointer-up in a drawing mode.
    pub fn is_painting(&self) -> bool {
        self.painting
    }

    pub fn active_stroke(&self) -> Option<NodeId> {
        self.active_stroke
    }

    /// Start a stroke at `position` if a drawing mode is active.
    pub fn begin_stroke(
        &mut self,
        position: Point,
        factory: &ShapeFactory,
        scene: &mut Scene,
        history: &mut HistoryStack,
    ) -> Option<NodeId> {
        let ToolMode::Drawing(mode) = self.mode else {
            return None;
        };
        let id = scene.add(Node::Stroke(factory.line(position, mode)));
        history.push(id);
        self.painting = true;
        self.active_stroke = Some(id);
        log::debug!("Started {mode} stroke {id}");
        Some(id)
    }

    /// Append `position` to the active stroke. Returns true if a point was added.
    pub fn extend_stroke(&mut self, position: Point, scene: &mut Scene) -> bool {
        if !self.painting {
            return false;
        }
        let stroke = self
            .active_stroke
            .and_then(|id| scene.get_mut(id))
            .and_then(Node::as_stroke_mut);
        match stroke {
            Some(stroke) => {
                stroke.add_point(position);
                true
            }
            None => {
                // The stroke was removed mid-gesture (undo or delete).
                self.painting = false;
                self.active_stroke = None;
                false
            }
        }
    }

    /// Finish the active stroke.
    pub fn end_stroke(&mut self) -> Option<NodeId> {
        self.painting = false;
        self.active_stroke.take()
    }
}
