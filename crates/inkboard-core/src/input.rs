//! Pointer state and click synthesis.

use crate::shapes::NodeId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
}

/// A completed click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub position: Point,
    /// Node under the pointer on release, `None` for the background.
    pub target: Option<NodeId>,
    /// Whether pointer-down happened on the same target.
    pub started_on_target: bool,
    /// Second click on the same target within the double-click window.
    pub double: bool,
}

#[derive(Debug, Clone, Copy)]
struct ClickRecord {
    time: Instant,
    position: Point,
    target: Option<NodeId>,
}

/// Turns primary-button releases into clicks and double clicks.
#[derive(Debug, Clone)]
pub struct InputState {
    /// Node under the pointer when the primary button went down.
    click_start: Option<NodeId>,
    last_click: Option<ClickRecord>,
    double_click_time: Duration,
    double_click_distance: f64,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 5.0)
    }
}

impl InputState {
    /// Create an input state with the given double-click window.
    pub fn new(double_click_time: Duration, double_click_distance: f64) -> Self {
        Self {
            click_start: None,
            last_click: None,
            double_click_time,
            double_click_distance,
        }
    }

    /// Record the node under a pointer-down.
    pub fn set_click_start(&mut self, target: Option<NodeId>) {
        self.click_start = target;
    }

    /// Build the click for a release over `target`.
    pub fn register_click(&mut self, position: Point, target: Option<NodeId>) -> Click {
        self.register_click_at(position, target, Instant::now())
    }

    /// Same as [`register_click`](Self::register_click) with an explicit clock.
    pub fn register_click_at(
        &mut self,
        position: Point,
        target: Option<NodeId>,
        now: Instant,
    ) -> Click {
        let started_on_target = self.click_start == target;
        let double = started_on_target
            && self.last_click.is_some_and(|last| {
                last.target == target
                    && now.saturating_duration_since(last.time) < self.double_click_time
                    && (position - last.position).hypot() < self.double_click_distance
            });
        // A double click consumes the pair so a third click starts over.
        self.last_click = if double || !started_on_target {
            None
        } else {
            Some(ClickRecord {
                time: now,
                position,
                target,
            })
        };
        self.click_start = None;
        Click {
            position,
            target,
            started_on_target,
            double,
        }
    }

    /// Forget any pending click pair.
    pub fn reset_clicks(&mut self) {
        self.click_start = None;
        self.last_click = None;
    }
}
