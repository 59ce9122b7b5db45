//! The scene graph: a stage with a single drawing layer.

use crate::shapes::{Node, NodeId, NodeKind, TextId};
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// All nodes of the drawing layer plus the stage size.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Stage width in pixels.
    pub width: u32,
    /// Stage height in pixels.
    pub height: u32,
    nodes: HashMap<NodeId, Node>,
    /// Paint order (back to front).
    z_order: Vec<NodeId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub const DEFAULT_WIDTH: u32 = 1024;
    pub const DEFAULT_HEIGHT: u32 = 800;
    /// Largest stage side a document may declare.
    pub const MAX_SIDE: u32 = 8192;

    /// Create an empty scene with the default stage size.
    pub fn new() -> Self {
        Self::with_size(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: HashMap::new(),
            z_order: Vec::new(),
        }
    }

    /// Add a node on top of everything else.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = node.id();
        if self.nodes.insert(id, node).is_none() {
            self.z_order.push(id);
        }
        id
    }

    /// Remove a node from the scene.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.z_order.retain(|&node_id| node_id != id);
        self.nodes.remove(&id)
    }

    /// Remove every node, keeping the stage size.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.z_order.clear();
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Node ids in paint order (back to front).
    pub fn ids(&self) -> &[NodeId] {
        &self.z_order
    }

    /// Nodes in paint order (back to front).
    pub fn nodes_ordered(&self) -> impl Iterator<Item = &Node> {
        self.z_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// The topmost node hit by a stage point.
    pub fn node_at(&self, point: Point, tolerance: f64) -> Option<NodeId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .find(|id| self.nodes.get(id).is_some_and(|n| n.hit_test(point, tolerance)))
    }

    /// All nodes of one kind, in paint order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes_ordered()
            .filter(|n| n.kind() == kind)
            .map(Node::id)
            .collect()
    }

    /// Find a text node by its text id.
    pub fn text_by_id(&self, text_id: TextId) -> Option<NodeId> {
        self.nodes_ordered()
            .find(|n| n.as_text().is_some_and(|t| t.text_id == text_id))
            .map(Node::id)
    }

    /// Bounding box of all nodes.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes_ordered()
            .map(Node::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
