//! Single-step undo of node insertions.

use crate::scene::Scene;
use crate::shapes::{Node, NodeId};

/// Nodes added by the user, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    entries: Vec<NodeId>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node the user just added.
    pub fn push(&mut self, id: NodeId) {
        self.entries.push(id);
    }

    /// Drop a node from the stack wherever it is.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|&entry| entry != id);
        self.entries.len() != before
    }

    /// Pop the newest entry and remove it from `scene`.
    ///
    /// Entries whose node is already gone from the scene are discarded, so
    /// one call removes at most one live node. Returns `None` when nothing
    /// was removed.
    pub fn undo(&mut self, scene: &mut Scene) -> Option<Node> {
        while let Some(id) = self.entries.pop() {
            if let Some(node) = scene.remove(id) {
                return Some(node);
            }
            log::debug!("Undo skipped node {id} that is no longer in the scene");
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn last(&self) -> Option<NodeId> {
        self.entries.last().copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains(&id)
    }

    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
