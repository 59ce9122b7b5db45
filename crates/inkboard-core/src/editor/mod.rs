//! The scene editor: one object receiving every host intent.

mod io;

pub use io::{FileInput, FileOutcome, ImportKind, LoadOutcome};

use crate::config::EditorConfig;
use crate::export::ExportService;
use crate::factory::{ShapeFactory, TextFactory};
use crate::history::HistoryStack;
use crate::input::{Click, InputState, MouseButton, PointerEvent};
use crate::loader::LoadTicket;
use crate::overlay::{OverlayRegistry, TextEditResult, TextKey, TextOverlay};
use crate::scene::Scene;
use crate::selection::{HANDLE_HIT_TOLERANCE, Selection, SelectionController};
use crate::shapes::{Color, FontStyle, Node, NodeId, NodeKind, TextDecoration, TextId};
use crate::tools::{ToolController, ToolKind, ToolMode};
use kurbo::{Point, Vec2};
use std::time::Duration;

/// Key name that deletes the selected node.
pub const DELETE_KEY: &str = "Delete";

/// Whiteboard scene editor.
///
/// Hosts forward toolbar intents, pointer events and keys; the editor keeps
/// the scene, the tool mode, the selection, open text overlays and the undo
/// history consistent with each other.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    scene: Scene,
    shapes: ShapeFactory,
    texts: TextFactory,
    tools: ToolController,
    selection: SelectionController,
    overlays: OverlayRegistry,
    history: HistoryStack,
    input: InputState,
    export: ExportService,
    /// Bumped whenever the scene is replaced wholesale.
    epoch: u64,
    pending_loads: Vec<LoadTicket>,
    next_ticket: u64,
    import: Option<ImportKind>,
    /// Set while a grip drag owns the gesture, so its release is not a click.
    suppress_click: bool,
    redraw: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let input = InputState::new(
            Duration::from_millis(config.double_click_ms),
            config.double_click_distance,
        );
        Self {
            scene: Scene::with_size(config.stage_width, config.stage_height),
            shapes: ShapeFactory::new(config.defaults.clone()),
            texts: TextFactory::new(config.defaults.text.clone()),
            tools: ToolController::new(),
            selection: SelectionController::new(),
            overlays: OverlayRegistry::new(),
            history: HistoryStack::new(),
            input,
            export: ExportService::new(),
            epoch: 0,
            pending_loads: Vec::new(),
            next_ticket: 1,
            import: None,
            suppress_click: false,
            redraw: false,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The active tool mode, for toolbar state.
    pub fn mode(&self) -> ToolMode {
        self.tools.mode()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.selection()
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    /// The overlay open for `text_id`, if any.
    pub fn overlay(&self, text_id: TextId) -> Option<&TextOverlay> {
        self.overlays.get(text_id)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the stage needs repainting; clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Add a node on top and record it for undo.
    fn insert(&mut self, node: Node) -> NodeId {
        let kind = node.kind();
        let id = self.scene.add(node);
        self.history.push(id);
        self.request_redraw();
        log::debug!("Inserted {} {id}", kind.class_name());
        id
    }

    /// Apply a toolbar tool intent.
    ///
    /// Placement tools insert their node immediately and return its id.
    pub fn select_tool(&mut self, kind: ToolKind) -> Option<NodeId> {
        let inserted = match self.tools.select_tool(kind) {
            ToolMode::PlaceCircle => Some(self.insert(Node::Circle(self.shapes.circle()))),
            ToolMode::PlaceRectangle => Some(self.insert(Node::Rectangle(self.shapes.rectangle()))),
            ToolMode::PlaceText => {
                let text = self.texts.text(&self.scene);
                Some(self.insert(Node::Text(text)))
            }
            ToolMode::Idle if kind == ToolKind::Clear => {
                self.clear();
                None
            }
            _ => None,
        };
        self.tools.finish();
        inserted
    }

    /// Remove the most recently added node. No-op on an empty history.
    pub fn undo(&mut self) -> bool {
        let Some(node) = self.history.undo(&mut self.scene) else {
            return false;
        };
        self.selection.deselect();
        self.overlays.discard_node(node.id());
        self.request_redraw();
        log::debug!("Undid {} {}", node.kind().class_name(), node.id());
        true
    }

    /// Empty the scene, keeping the stage size.
    pub fn clear(&mut self) {
        self.scene.clear();
        self.reset_scene_state();
        self.tools.enter(ToolMode::Idle);
        log::info!("Cleared scene (epoch {})", self.epoch);
    }

    /// Forget everything tied to the previous scene contents.
    fn reset_scene_state(&mut self) {
        self.history.clear();
        self.selection.deselect();
        self.overlays.discard_all();
        self.input.reset_clicks();
        self.pending_loads.clear();
        self.suppress_click = false;
        self.epoch += 1;
        self.request_redraw();
    }

    /// Process a pointer event. Only the primary button interacts.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => self.on_pointer_down(position),
            PointerEvent::Move { position } => self.on_pointer_move(position),
            PointerEvent::Up {
                position,
                button: MouseButton::Left,
            } => self.on_pointer_up(position),
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => {}
        }
    }

    pub fn pointer_down(&mut self, position: Point) {
        self.handle_pointer_event(PointerEvent::Down {
            position,
            button: MouseButton::Left,
        });
    }

    pub fn pointer_move(&mut self, position: Point) {
        self.handle_pointer_event(PointerEvent::Move { position });
    }

    pub fn pointer_up(&mut self, position: Point) {
        self.handle_pointer_event(PointerEvent::Up {
            position,
            button: MouseButton::Left,
        });
    }

    fn on_pointer_down(&mut self, position: Point) {
        if self.tools.mode().is_drawing() {
            self.tools
                .begin_stroke(position, &self.shapes, &mut self.scene, &mut self.history);
            self.request_redraw();
            return;
        }
        let target = self.scene.node_at(position, self.config.hit_tolerance);
        self.input.set_click_start(target);
        self.selection
            .begin_manipulation(&self.scene, position, target, HANDLE_HIT_TOLERANCE);
        self.suppress_click = self.selection.is_transforming();
    }

    fn on_pointer_move(&mut self, position: Point) {
        if self.tools.is_painting() {
            if self.tools.extend_stroke(position, &mut self.scene) {
                self.request_redraw();
            }
        } else if self.selection.update_manipulation(&mut self.scene, position) {
            self.request_redraw();
        }
    }

    fn on_pointer_up(&mut self, position: Point) {
        if self.tools.is_painting() {
            if let Some(id) = self.tools.end_stroke() {
                log::debug!("Finished stroke {id}");
            }
            return;
        }
        if self.tools.mode().is_drawing() {
            return;
        }
        // A body drag that moved its node is not a click either.
        let moved = self
            .selection
            .end_manipulation()
            .is_some_and(|drag| drag.delta() != Vec2::ZERO);
        if std::mem::take(&mut self.suppress_click) || moved {
            self.input.reset_clicks();
            return;
        }
        let target = self.scene.node_at(position, self.config.hit_tolerance);
        let click = self.input.register_click(position, target);
        self.on_click(click);
    }

    fn on_click(&mut self, click: Click) {
        // Releases that end on a different node than they started are drags.
        if !click.started_on_target {
            return;
        }
        match click.target {
            None => {
                if self.selection.selection().is_some() || !self.overlays.is_empty() {
                    self.overlays.commit_all(&mut self.scene);
                    self.selection.deselect();
                    self.request_redraw();
                }
            }
            Some(id) => {
                if self.selection.selected_id() != Some(id) {
                    self.overlays.commit_all(&mut self.scene);
                    self.selection.select(&self.scene, id);
                    self.request_redraw();
                }
                if click.double {
                    self.open_overlay(id);
                }
            }
        }
    }

    /// Native double-click or double-tap at `position`.
    pub fn double_click(&mut self, position: Point) -> bool {
        match self.scene.node_at(position, self.config.hit_tolerance) {
            Some(id) => self.open_overlay(id),
            None => false,
        }
    }

    /// Open a text overlay over the text node `id`.
    pub fn open_overlay(&mut self, id: NodeId) -> bool {
        let opened = self
            .overlays
            .open(&mut self.scene, id, self.config.container_origin)
            .is_some();
        if opened {
            self.request_redraw();
        }
        opened
    }

    /// Deliver a key to the overlay of `text_id`.
    pub fn overlay_key(&mut self, text_id: TextId, key: TextKey) -> TextEditResult {
        let result = self.overlays.key(&mut self.scene, text_id, key);
        if result == TextEditResult::Committed {
            self.request_redraw();
        }
        result
    }

    /// Replace an overlay's value from a host input event.
    pub fn set_overlay_value(&mut self, text_id: TextId, value: impl Into<String>) -> bool {
        self.overlays.set_value(text_id, value)
    }

    /// Editor-wide key handler.
    pub fn key_down(&mut self, key: &str) -> bool {
        if key != DELETE_KEY {
            return false;
        }
        let Some(id) = self.selection.selected_id() else {
            return false;
        };
        self.selection.deselect();
        self.overlays.discard_node(id);
        self.history.remove(id);
        let removed = self.scene.remove(id).is_some();
        if removed {
            self.request_redraw();
            log::debug!("Deleted {id}");
        }
        removed
    }

    /// Set the fill of the selected circle, rectangle or text.
    pub fn set_color(&mut self, color: impl Into<Color>) -> bool {
        let changed = self.selection.set_color(&mut self.scene, color.into());
        self.redraw |= changed;
        changed
    }

    /// Set the font style of the selected text (`normal`, `bold`, `italic`, `italic bold`).
    pub fn set_text_style(&mut self, style: &str) -> bool {
        match style.parse::<FontStyle>() {
            Ok(style) => {
                let changed = self.selection.set_text_style(&mut self.scene, style);
                self.redraw |= changed;
                changed
            }
            Err(e) => {
                log::warn!("Ignoring text style: {e}");
                false
            }
        }
    }

    /// Set the decoration of the selected text (`underline`, `line-through`, both or none).
    pub fn set_text_decoration(&mut self, decoration: &str) -> bool {
        match decoration.parse::<TextDecoration>() {
            Ok(decoration) => {
                let changed = self.selection.set_text_decoration(&mut self.scene, decoration);
                self.redraw |= changed;
                changed
            }
            Err(e) => {
                log::warn!("Ignoring text decoration: {e}");
                false
            }
        }
    }

    /// Set the font size of the selected text.
    pub fn set_font_size(&mut self, size: f64) -> bool {
        let changed = self.selection.set_font_size(&mut self.scene, size);
        self.redraw |= changed;
        changed
    }

    /// Ids of all text nodes, in paint order.
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.scene.nodes_of_kind(NodeKind::Text)
    }
}
