//! In-place text editing overlays.
//!
//! An overlay stands for a host text-input element laid over a text node.
//! Overlays are keyed by text id, so there is never more than one per node.

use crate::scene::Scene;
use crate::shapes::{Node, NodeId, TextId};
use kurbo::{Point, Vec2};
use std::collections::BTreeMap;

/// Keys delivered to an open overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextKey {
    Character(String),
    Backspace,
    Enter,
}

/// Result of delivering a key to an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEditResult {
    /// The overlay value may have changed.
    Handled,
    /// The value was written back and the overlay removed.
    Committed,
    /// No overlay is open for that id.
    NotHandled,
}

/// A text-input element positioned over a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text_id: TextId,
    pub node: NodeId,
    /// Host element id, derived from the text id.
    pub element_id: String,
    /// Page-space position of the element's top-left corner.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Current contents of the input.
    pub value: String,
}

impl TextOverlay {
    /// Host element id for the overlay of `text_id`.
    pub fn element_id_for(text_id: TextId) -> String {
        format!("text-area{text_id}")
    }
}

/// All open overlays.
#[derive(Debug, Clone, Default)]
pub struct OverlayRegistry {
    overlays: BTreeMap<TextId, TextOverlay>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an overlay over the text node `id`.
    ///
    /// Every other open overlay is committed first. An overlay already open
    /// for the same text is returned unchanged.
    pub fn open(&mut self, scene: &mut Scene, id: NodeId, container_origin: Point) -> Option<&TextOverlay> {
        let (text_id, overlay) = {
            let node = scene.get(id)?;
            let text = node.as_text()?;
            let t = node.transform();
            let (width, height) = text.approximate_size();
            let overlay = TextOverlay {
                text_id: text.text_id,
                node: id,
                element_id: TextOverlay::element_id_for(text.text_id),
                position: container_origin + Vec2::new(t.x, t.y),
                width: width * t.scale_x.abs(),
                height: height * t.scale_y.abs(),
                value: text.text.clone(),
            };
            (text.text_id, overlay)
        };

        let others: Vec<TextId> = self.overlays.keys().copied().filter(|&k| k != text_id).collect();
        for other in others {
            self.commit(scene, other);
        }

        if !self.overlays.contains_key(&text_id) {
            log::debug!("Opened overlay {}", overlay.element_id);
        }
        Some(self.overlays.entry(text_id).or_insert(overlay))
    }

    pub fn get(&self, text_id: TextId) -> Option<&TextOverlay> {
        self.overlays.get(&text_id)
    }

    /// Replace the value of an open overlay (host input events).
    pub fn set_value(&mut self, text_id: TextId, value: impl Into<String>) -> bool {
        match self.overlays.get_mut(&text_id) {
            Some(overlay) => {
                overlay.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Deliver a key to the overlay of `text_id`; Enter commits.
    pub fn key(&mut self, scene: &mut Scene, text_id: TextId, key: TextKey) -> TextEditResult {
        let Some(overlay) = self.overlays.get_mut(&text_id) else {
            return TextEditResult::NotHandled;
        };
        match key {
            TextKey::Character(s) => {
                overlay.value.push_str(&s);
                TextEditResult::Handled
            }
            TextKey::Backspace => {
                overlay.value.pop();
                TextEditResult::Handled
            }
            TextKey::Enter => {
                self.commit(scene, text_id);
                TextEditResult::Committed
            }
        }
    }

    /// Write the overlay value back into its text node and remove the overlay.
    pub fn commit(&mut self, scene: &mut Scene, text_id: TextId) -> bool {
        let Some(overlay) = self.overlays.remove(&text_id) else {
            return false;
        };
        match scene.get_mut(overlay.node).and_then(Node::as_text_mut) {
            Some(text) => {
                text.text = overlay.value;
                log::debug!("Committed overlay {}", overlay.element_id);
                true
            }
            None => {
                log::debug!("Dropped overlay {} for a removed node", overlay.element_id);
                false
            }
        }
    }

    /// Commit every open overlay. Returns how many were written back.
    pub fn commit_all(&mut self, scene: &mut Scene) -> usize {
        let ids: Vec<TextId> = self.overlays.keys().copied().collect();
        ids.into_iter().filter(|&id| self.commit(scene, id)).count()
    }

    /// Remove the overlay of a node that left the scene, without writing back.
    pub fn discard_node(&mut self, id: NodeId) {
        self.overlays.retain(|_, overlay| overlay.node != id);
    }

    /// Remove every overlay without writing back.
    pub fn discard_all(&mut self) {
        self.overlays.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextOverlay> {
        self.overlays.values()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
