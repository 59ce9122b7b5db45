//! Selection, transform handles and style routing.

use crate::scene::Scene;
use crate::shapes::{Color, FontStyle, Node, NodeId, NodeKind, NodeTransform, TextDecoration};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit tolerance in stage pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Distance from the top edge to the rotation grip (in stage units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;
/// Smallest scale magnitude a corner drag can produce.
const MIN_SCALE: f64 = 0.01;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// This corner of `rect`.
    pub fn of(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
        }
    }

    fn all() -> [Corner; 4] {
        [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomLeft,
            Corner::BottomRight,
        ]
    }
}

/// Type of transform handle grip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner grip; scales with the opposite corner anchored.
    Corner(Corner),
    /// Rotation grip above the top edge.
    Rotate,
}

/// A grip with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in stage coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a stage point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Get the grips of a transform handle attached to `node`.
pub fn get_handles(node: &Node) -> Vec<Handle> {
    let affine = node.affine();
    let bounds = node.local_bounds();
    let mut handles: Vec<Handle> = Corner::all()
        .into_iter()
        .map(|corner| Handle::new(affine * corner.of(bounds), HandleKind::Corner(corner)))
        .collect();

    let top_center = affine * Point::new(bounds.center().x, bounds.y0);
    let up = rotate_vec(Vec2::new(0.0, -ROTATE_HANDLE_OFFSET), node.transform().rotation);
    handles.push(Handle::new(top_center + up, HandleKind::Rotate));
    handles
}

/// Find which grip (if any) is hit at the given point.
pub fn hit_test_handles(node: &Node, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(node)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// A transform handle attached to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformHandle {
    pub node: NodeId,
}

/// The selected node, its kind and its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub node: NodeId,
    pub kind: NodeKind,
    pub handle: TransformHandle,
}

/// State of an active drag on a node body or one of its grips.
#[derive(Debug, Clone)]
pub struct ManipulationState {
    pub node_id: NodeId,
    /// The grip being dragged (None = moving the whole node).
    pub handle: Option<HandleKind>,
    pub start_point: Point,
    pub current_point: Point,
    /// Transform when the drag started.
    pub original: NodeTransform,
    /// Local bounds when the drag started.
    pub local_bounds: Rect,
}

impl ManipulationState {
    pub fn new(node: &Node, handle: Option<HandleKind>, start_point: Point) -> Self {
        Self {
            node_id: node.id(),
            handle,
            start_point,
            current_point: start_point,
            original: *node.transform(),
            local_bounds: node.local_bounds(),
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// The transform the node should have for the current pointer position.
    pub fn transform(&self) -> NodeTransform {
        match self.handle {
            None => {
                let mut t = self.original;
                t.set_position(self.original.position() + self.delta());
                t
            }
            Some(HandleKind::Corner(corner)) => self.scaled(corner),
            Some(HandleKind::Rotate) => self.rotated(),
        }
    }

    fn scaled(&self, corner: Corner) -> NodeTransform {
        let o = self.original;
        let anchor = corner.opposite().of(self.local_bounds);
        let dragged = corner.of(self.local_bounds);
        let anchor_world = o.affine() * anchor;
        let dragged_world = o.affine() * dragged + self.delta();
        let q = rotate_vec(dragged_world - anchor_world, -o.rotation);

        let span = dragged - anchor;
        let scale = |q: f64, span: f64, current: f64| {
            if span.abs() < f64::EPSILON {
                return current;
            }
            let s = q / span;
            if s.abs() < MIN_SCALE {
                MIN_SCALE.copysign(if s == 0.0 { current } else { s })
            } else {
                s
            }
        };

        let mut t = o;
        t.scale_x = scale(q.x, span.x, o.scale_x);
        t.scale_y = scale(q.y, span.y, o.scale_y);
        let offset = rotate_vec(Vec2::new(anchor.x * t.scale_x, anchor.y * t.scale_y), o.rotation);
        t.set_position(anchor_world - offset);
        t
    }

    fn rotated(&self) -> NodeTransform {
        let o = self.original;
        let center_local = self.local_bounds.center();
        let center = o.affine() * center_local;
        let v = self.current_point - center;
        let mut t = o;
        // The grip sits straight above the centre at rotation 0.
        t.rotation = normalize_degrees(v.y.atan2(v.x).to_degrees() + 90.0);
        let offset = rotate_vec(
            Vec2::new(center_local.x * o.scale_x, center_local.y * o.scale_y),
            t.rotation,
        );
        t.set_position(center - offset);
        t
    }
}

/// Rotate a vector clockwise (in screen space) by `degrees`.
fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Tracks the single selection and routes style edits to it.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selection: Option<Selection>,
    manipulation: Option<ManipulationState>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selection.map(|s| s.node)
    }

    pub fn selected_kind(&self) -> Option<NodeKind> {
        self.selection.map(|s| s.kind)
    }

    /// Number of attached transform handles (0 or 1).
    pub fn attached_handles(&self) -> usize {
        usize::from(self.selection.is_some())
    }

    /// Select `id`, detaching any previous handle first.
    ///
    /// Returns false if the node is not in the scene.
    pub fn select(&mut self, scene: &Scene, id: NodeId) -> bool {
        let Some(node) = scene.get(id) else {
            return false;
        };
        let kind = node.kind();
        self.deselect();
        self.selection = Some(Selection {
            node: id,
            kind,
            handle: TransformHandle { node: id },
        });
        log::debug!("Selected {} {id}", kind.class_name());
        true
    }

    /// Clear the selection and detach the handle.
    pub fn deselect(&mut self) -> Option<Selection> {
        self.manipulation = None;
        self.selection.take()
    }

    fn selected_node_mut<'a>(&self, scene: &'a mut Scene) -> Option<&'a mut Node> {
        scene.get_mut(self.selected_id()?)
    }

    /// Set the fill of a selected circle, rectangle or text.
    pub fn set_color(&self, scene: &mut Scene, color: Color) -> bool {
        match self.selected_node_mut(scene).and_then(Node::fill_mut) {
            Some(fill) => {
                *fill = Some(color);
                true
            }
            None => false,
        }
    }

    /// Set the font style of a selected text.
    pub fn set_text_style(&self, scene: &mut Scene, style: FontStyle) -> bool {
        match self.selected_node_mut(scene).and_then(Node::as_text_mut) {
            Some(text) => {
                text.font_style = style;
                true
            }
            None => false,
        }
    }

    /// Set the decoration of a selected text.
    pub fn set_text_decoration(&self, scene: &mut Scene, decoration: TextDecoration) -> bool {
        match self.selected_node_mut(scene).and_then(Node::as_text_mut) {
            Some(text) => {
                text.text_decoration = decoration;
                true
            }
            None => false,
        }
    }

    /// Set the font size of a selected text. Sizes must be positive and finite.
    pub fn set_font_size(&self, scene: &mut Scene, size: f64) -> bool {
        if !(size.is_finite() && size > 0.0) {
            log::warn!("Ignoring font size {size}");
            return false;
        }
        match self.selected_node_mut(scene).and_then(Node::as_text_mut) {
            Some(text) => {
                text.font_size = size;
                true
            }
            None => false,
        }
    }

    pub fn manipulation(&self) -> Option<&ManipulationState> {
        self.manipulation.as_ref()
    }

    /// Start a drag at `point`: a grip of the selected node wins over node
    /// bodies, and only draggable bodies move.
    pub fn begin_manipulation(
        &mut self,
        scene: &Scene,
        point: Point,
        target: Option<NodeId>,
        tolerance: f64,
    ) -> bool {
        if let Some(node) = self.selected_id().and_then(|id| scene.get(id)) {
            if let Some(handle) = hit_test_handles(node, point, tolerance) {
                self.manipulation = Some(ManipulationState::new(node, Some(handle), point));
                return true;
            }
        }
        match target.and_then(|id| scene.get(id)) {
            Some(node) if node.draggable() => {
                self.manipulation = Some(ManipulationState::new(node, None, point));
                true
            }
            _ => false,
        }
    }

    /// Whether a grip drag (rather than a body drag) is in progress.
    pub fn is_transforming(&self) -> bool {
        self.manipulation.as_ref().is_some_and(|m| m.handle.is_some())
    }

    /// Move the active drag to `point` and apply it.
    pub fn update_manipulation(&mut self, scene: &mut Scene, point: Point) -> bool {
        let Some(state) = self.manipulation.as_mut() else {
            return false;
        };
        state.current_point = point;
        let transform = state.transform();
        match scene.get_mut(state.node_id) {
            Some(node) => {
                *node.transform_mut() = transform;
                true
            }
            None => {
                self.manipulation = None;
                false
            }
        }
    }

    /// Finish the active drag.
    pub fn end_manipulation(&mut self) -> Option<ManipulationState> {
        self.manipulation.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Image, Rectangle, Stroke, StrokeMode, Text, TextId};

    fn rect_node(x: f64, y: f64, w: f64, h: f64) -> Node {
        let mut rect = Rectangle::new(Point::new(x, y), w, h);
        rect.fill = Some(Color::new("green"));
        rect.draggable = true;
        Node::Rectangle(rect)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_handles_follow_transform() {
        let node = rect_node(10.0, 20.0, 100.0, 50.0);
        let handles = get_handles(&node);
        assert_eq!(handles.len(), 5);
        assert_eq!(handles[3].kind, HandleKind::Corner(Corner::BottomRight));
        assert!(approx(handles[3].position.x, 110.0) && approx(handles[3].position.y, 70.0));
        assert_eq!(handles[4].kind, HandleKind::Rotate);
        assert!(approx(handles[4].position.x, 60.0) && approx(handles[4].position.y, -5.0));
        assert_eq!(
            hit_test_handles(&node, Point::new(111.0, 71.0), HANDLE_HIT_TOLERANCE),
            Some(HandleKind::Corner(Corner::BottomRight))
        );
        assert_eq!(hit_test_handles(&node, Point::new(60.0, 45.0), HANDLE_HIT_TOLERANCE), None);
    }

    #[test]
    fn test_at_most_one_handle() {
        let mut scene = Scene::new();
        let a = scene.add(rect_node(0.0, 0.0, 10.0, 10.0));
        let b = scene.add(rect_node(20.0, 0.0, 10.0, 10.0));
        let mut selection = SelectionController::new();
        for id in [a, b, a, a, b] {
            assert!(selection.select(&scene, id));
            assert_eq!(selection.attached_handles(), 1);
            assert_eq!(selection.selection().unwrap().handle.node, id);
        }
        selection.deselect();
        assert_eq!(selection.attached_handles(), 0);
    }

    #[test]
    fn test_selection_records_kind() {
        let mut scene = Scene::new();
        let stroke = scene.add(Node::Stroke(Stroke::new(Point::ZERO, StrokeMode::Brush)));
        let image = scene.add(Node::Image(Image::new(Point::ZERO, "")));
        let mut selection = SelectionController::new();
        selection.select(&scene, stroke);
        assert_eq!(selection.selected_kind(), Some(NodeKind::Stroke));
        assert!(!selection.set_color(&mut scene, Color::new("blue")));
        selection.select(&scene, image);
        assert_eq!(selection.selected_kind(), Some(NodeKind::Image));
        assert!(!selection.select(&scene, uuid::Uuid::new_v4()));
        assert_eq!(selection.selected_id(), Some(image));
    }

    #[test]
    fn test_style_routing() {
        let mut scene = Scene::new();
        let circle = scene.add(Node::Circle(Circle::new(Point::ZERO, 5.0)));
        let text = scene.add(Node::Text(Text::new(TextId(1), Point::ZERO, "hi")));
        let mut selection = SelectionController::new();

        // Nothing selected: every style edit is a no-op.
        assert!(!selection.set_color(&mut scene, Color::new("blue")));
        assert!(!selection.set_font_size(&mut scene, 12.0));

        selection.select(&scene, circle);
        assert!(selection.set_color(&mut scene, Color::new("blue")));
        assert!(!selection.set_text_style(&mut scene, FontStyle::Bold));
        let Some(Node::Circle(c)) = scene.get(circle) else { panic!() };
        assert_eq!(c.fill.as_ref().unwrap().as_str(), "blue");

        selection.select(&scene, text);
        assert!(selection.set_text_style(&mut scene, FontStyle::Italic));
        assert!(selection.set_text_decoration(&mut scene, TextDecoration::Underline));
        assert!(selection.set_font_size(&mut scene, 24.0));
        assert!(!selection.set_font_size(&mut scene, -3.0));
        assert!(!selection.set_font_size(&mut scene, f64::NAN));
        let t = scene.get(text).and_then(Node::as_text).unwrap();
        assert_eq!(t.font_style, FontStyle::Italic);
        assert_eq!(t.text_decoration, TextDecoration::Underline);
        assert!(approx(t.font_size, 24.0));
    }

    #[test]
    fn test_drag_moves_draggable_body() {
        let mut scene = Scene::new();
        let id = scene.add(rect_node(0.0, 0.0, 100.0, 100.0));
        let mut selection = SelectionController::new();
        assert!(selection.begin_manipulation(&scene, Point::new(50.0, 50.0), Some(id), 8.0));
        assert!(!selection.is_transforming());
        selection.update_manipulation(&mut scene, Point::new(60.0, 45.0));
        let pos = scene.get(id).unwrap().transform().position();
        assert!(approx(pos.x, 10.0) && approx(pos.y, -5.0));
        assert!(selection.end_manipulation().is_some());
    }

    #[test]
    fn test_non_draggable_body_does_not_move() {
        let mut scene = Scene::new();
        let id = scene.add(Node::Circle(Circle::new(Point::new(50.0, 50.0), 10.0)));
        let mut selection = SelectionController::new();
        assert!(!selection.begin_manipulation(&scene, Point::new(50.0, 50.0), Some(id), 8.0));
    }

    #[test]
    fn test_corner_scale_anchors_opposite_corner() {
        let mut scene = Scene::new();
        let id = scene.add(rect_node(10.0, 10.0, 100.0, 50.0));
        let mut selection = SelectionController::new();
        selection.select(&scene, id);
        assert!(selection.begin_manipulation(&scene, Point::new(110.0, 60.0), None, 8.0));
        assert!(selection.is_transforming());
        selection.update_manipulation(&mut scene, Point::new(210.0, 110.0));

        let t = *scene.get(id).unwrap().transform();
        assert!(approx(t.scale_x, 2.0) && approx(t.scale_y, 2.0));
        assert!(approx(t.x, 10.0) && approx(t.y, 10.0));

        // Dragging the top-left corner keeps the bottom-right fixed.
        selection.end_manipulation();
        selection.begin_manipulation(&scene, Point::new(10.0, 10.0), None, 8.0);
        selection.update_manipulation(&mut scene, Point::new(110.0, 60.0));
        let node = scene.get(id).unwrap();
        let b = node.bounds();
        assert!(approx(b.x0, 110.0) && approx(b.y0, 60.0));
        assert!(approx(b.x1, 210.0) && approx(b.y1, 110.0));
    }

    #[test]
    fn test_rotate_about_center() {
        let mut scene = Scene::new();
        let id = scene.add(rect_node(0.0, 0.0, 100.0, 100.0));
        let mut selection = SelectionController::new();
        selection.select(&scene, id);
        // Rotation grip sits at (50, -25).
        assert!(selection.begin_manipulation(&scene, Point::new(50.0, -25.0), None, 8.0));
        // Pull the grip to the right of the centre: a quarter turn clockwise.
        selection.update_manipulation(&mut scene, Point::new(150.0, 50.0));
        let node = scene.get(id).unwrap();
        assert!(approx(node.transform().rotation, 90.0));
        let center = node.affine() * Point::new(50.0, 50.0);
        assert!(approx(center.x, 50.0) && approx(center.y, 50.0));
    }
}
