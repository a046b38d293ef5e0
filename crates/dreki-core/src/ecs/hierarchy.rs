//! # Transform Graph — Parent/Child Structure
//!
//! Every entity's [`Transform`](super::Transform) is backed by a
//! [`TransformNode`] in a [`TransformGraph`]. The graph is a `slotmap` arena:
//! nodes refer to each other by [`NodeId`], and the parent/child relation is
//! stored on both sides.
//!
//! ```text
//!            root (parent: None, children: [a, b])
//!           /    \
//!   a (parent: root)   b (parent: root, children: [c])
//!                       \
//!                        c (parent: b)
//! ```
//!
//! [`link`](TransformGraph::link) and [`unlink`](TransformGraph::unlink) are
//! the only functions that touch `parent`/`children`, and each updates both
//! ends, so a child always appears exactly once in its parent's list.
//!
//! The graph is not synchronised. It lives inside the
//! [`World`](super::World) and is only reachable through `&mut World`.
//! Spatial queries and mutators live in [`transform`](super::transform).

use std::cell::Cell;

use slotmap::SlotMap;

use super::activation::ActiveState;
use super::entity::Entity;
use crate::error::CoreError;
use crate::math::{Mat4, Quat, Vec3};

slotmap::new_key_type! {
    /// Handle to a node in a [`TransformGraph`].
    pub struct NodeId;
}

/// Local spatial state and links for one entity.
#[derive(Debug, Clone)]
pub struct TransformNode {
    pub(crate) owner: Entity,
    pub(crate) local_position: Vec3,
    pub(crate) local_rotation: Quat,
    /// Euler form of `local_rotation` in degrees, kept in sync with it.
    pub(crate) local_euler: Vec3,
    pub(crate) local_scale: Vec3,
    pub(crate) local_matrix: Cell<Mat4>,
    pub(crate) dirty: Cell<bool>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Set once teardown of this node's subtree has started.
    pub(crate) destroying: bool,
    pub(crate) active: ActiveState,
}

impl TransformNode {
    fn new(owner: Entity) -> Self {
        Self {
            owner,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            local_euler: Vec3::ZERO,
            local_scale: Vec3::ONE,
            local_matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(false),
            parent: None,
            children: Vec::new(),
            destroying: false,
            active: ActiveState::default(),
        }
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_destroying(&self) -> bool {
        self.destroying
    }

    pub fn active(&self) -> ActiveState {
        self.active
    }
}

/// Arena of transform nodes.
#[derive(Debug)]
pub struct TransformGraph {
    pub(crate) nodes: SlotMap<NodeId, TransformNode>,
    pub(crate) scale_epsilon: f32,
}

impl TransformGraph {
    pub fn new(scale_epsilon: f32) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            scale_epsilon,
        }
    }

    /// Add a parentless node at the origin.
    pub fn insert(&mut self, owner: Entity) -> NodeId {
        self.nodes.insert(TransformNode::new(owner))
    }

    /// Remove a node, unlinking it from its parent and orphaning its children.
    pub fn remove(&mut self, node: NodeId) -> Option<TransformNode> {
        self.unlink(node);
        let removed = self.nodes.remove(node)?;
        for &child in &removed.children {
            if let Some(child) = self.nodes.get_mut(child) {
                child.parent = None;
            }
        }
        Some(removed)
    }

    pub fn get(&self, node: NodeId) -> Option<&TransformNode> {
        self.nodes.get(node)
    }

    pub(crate) fn get_mut(&mut self, node: NodeId) -> Option<&mut TransformNode> {
        self.nodes.get_mut(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn owner(&self, node: NodeId) -> Option<Entity> {
        self.nodes.get(node).map(|n| n.owner)
    }

    // ── Links ────────────────────────────────────────────────────────

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[], |n| n.children.as_slice())
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// The `index`-th child. Out of range is logged and yields `None`.
    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        let n = self.nodes.get(node)?;
        let child = n.children.get(index).copied();
        if child.is_none() {
            CoreError::ChildIndex {
                entity: n.owner,
                index,
                count: n.children.len(),
            }
            .report();
        }
        child
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    /// Callers must rule out cycles first (see [`would_cycle`](Self::would_cycle)).
    pub(crate) fn link(&mut self, child: NodeId, parent: NodeId) {
        self.unlink(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Detach `child` from its parent, if any.
    pub(crate) fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|c| c.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
    }

    /// `true` if `node` is a strict descendant of `ancestor`.
    pub fn is_child_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// `true` if parenting `child` under `parent` would create a cycle.
    pub fn would_cycle(&self, child: NodeId, parent: NodeId) -> bool {
        child == parent || self.is_child_of(parent, child)
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), |&n| self.parent(n))
    }

    /// Topmost ancestor, or `node` itself if it has no parent.
    pub fn root(&self, node: NodeId) -> NodeId {
        self.ancestors(node).last().unwrap_or(node)
    }

    /// `node` and all its descendants, depth-first, parents before children.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if !self.contains(n) {
                continue;
            }
            out.push(n);
            stack.extend(self.children(n).iter().rev());
        }
        out
    }

    /// Position of `node` in its parent's child list. `None` for roots.
    pub fn sibling_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    /// Search below `node`: direct children first, then the subtrees of
    /// children that have children of their own. First match wins.
    pub fn find(&self, node: NodeId, matches: &dyn Fn(&TransformNode) -> bool) -> Option<NodeId> {
        let children = self.children(node);
        if let Some(&hit) = children
            .iter()
            .find(|&&c| self.nodes.get(c).is_some_and(matches))
        {
            return Some(hit);
        }
        children
            .iter()
            .filter(|&&c| self.child_count(c) > 0)
            .find_map(|&c| self.find(c, matches))
    }
}

impl Default for TransformGraph {
    fn default() -> Self {
        Self::new(crate::math::DEFAULT_SCALE_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::identity::InstanceId;

    fn entity(raw: u32) -> Entity {
        Entity::from_id(InstanceId::from_raw(raw))
    }

    /// root ─┬─ a ── c
    ///       └─ b
    fn tree() -> (TransformGraph, [NodeId; 4]) {
        let mut graph = TransformGraph::default();
        let root = graph.insert(entity(1));
        let a = graph.insert(entity(2));
        let b = graph.insert(entity(3));
        let c = graph.insert(entity(4));
        graph.link(a, root);
        graph.link(b, root);
        graph.link(c, a);
        (graph, [root, a, b, c])
    }

    fn assert_symmetric(graph: &TransformGraph) {
        for (id, node) in &graph.nodes {
            if let Some(parent) = node.parent {
                let count = graph.children(parent).iter().filter(|&&c| c == id).count();
                assert_eq!(count, 1, "parent must list child exactly once");
            }
            for &child in &node.children {
                assert_eq!(graph.parent(child), Some(id));
            }
        }
    }

    #[test]
    fn link_is_symmetric() {
        let (graph, [root, a, b, c]) = tree();
        assert_eq!(graph.children(root), &[a, b]);
        assert_eq!(graph.parent(c), Some(a));
        assert_eq!(graph.child_count(root), 2);
        assert_symmetric(&graph);
    }

    #[test]
    fn relink_moves_child_between_lists() {
        let (mut graph, [root, a, b, c]) = tree();
        graph.link(c, b);
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(b), &[c]);
        graph.link(c, b);
        assert_eq!(graph.children(b), &[c], "relinking to same parent must not duplicate");
        graph.unlink(a);
        assert_eq!(graph.children(root), &[b]);
        assert_eq!(graph.parent(a), None);
        assert_symmetric(&graph);
    }

    #[test]
    fn remove_orphans_children() {
        let (mut graph, [root, a, _b, c]) = tree();
        graph.remove(a).unwrap();
        assert_eq!(graph.child_count(root), 1);
        assert_eq!(graph.parent(c), None);
        assert!(!graph.contains(a));
        assert_symmetric(&graph);
    }

    #[test]
    fn ancestry_queries() {
        let (graph, [root, a, b, c]) = tree();
        assert!(graph.is_child_of(c, root));
        assert!(graph.is_child_of(c, a));
        assert!(!graph.is_child_of(c, b));
        assert!(!graph.is_child_of(root, root));
        assert_eq!(graph.root(c), root);
        assert_eq!(graph.root(root), root);
        assert!(graph.would_cycle(root, c));
        assert!(graph.would_cycle(a, a));
        assert!(!graph.would_cycle(c, b));
    }

    #[test]
    fn subtree_is_preorder() {
        let (graph, [root, a, b, c]) = tree();
        assert_eq!(graph.subtree(root), vec![root, a, c, b]);
        assert_eq!(graph.subtree(b), vec![b]);
    }

    #[test]
    fn child_index_bounds() {
        let (graph, [root, a, b, _c]) = tree();
        assert_eq!(graph.child(root, 0), Some(a));
        assert_eq!(graph.child(root, 1), Some(b));
        assert_eq!(graph.child(root, 2), None);
        assert_eq!(graph.sibling_index(b), Some(1));
        assert_eq!(graph.sibling_index(root), None);
    }

    #[test]
    fn find_prefers_direct_children() {
        let (mut graph, [root, a, _b, c]) = tree();
        // A grandchild owned by entity 3 under `a`, plus the direct child b (entity 3).
        let deep = graph.insert(entity(3));
        graph.link(deep, a);
        let hit = graph.find(root, &|n| n.owner == entity(3)).unwrap();
        assert_eq!(graph.parent(hit), Some(root));
        assert_eq!(graph.find(root, &|n| n.owner == entity(4)), Some(c));
        assert_eq!(graph.find(root, &|n| n.owner == entity(99)), None);
    }
}
