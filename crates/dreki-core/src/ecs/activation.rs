//! # Activation — Self, Hierarchy, and Effective Active State
//!
//! ```text
//! effective(node) = self_active(node) && hierarchy_active(node)
//! hierarchy_active(node) = effective(parent)      (true for roots)
//! ```
//!
//! A change is pushed down the graph by [`apply_active_in_hierarchy`]. The
//! walk stops at any node whose effective state didn't change, so toggling a
//! parent never re-notifies a subtree that was already disabled for another
//! reason. Notifications are only sent while the owning scene is active; the
//! stored flags are updated regardless.

use super::component::Component;
use super::entity::Entity;
use super::hierarchy::{NodeId, TransformGraph};
use super::store::ObjectStore;

/// Active flags stored on every transform node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveState {
    pub self_active: bool,
    pub hierarchy_active: bool,
    pub effective: bool,
}

impl Default for ActiveState {
    fn default() -> Self {
        Self {
            self_active: true,
            hierarchy_active: true,
            effective: true,
        }
    }
}

/// Receives enable/disable notifications for whole entities. Installed on the
/// world by the physics integration so colliders follow their owner.
pub trait CollisionListener: Send {
    fn on_entity_enabled(&mut self, entity: Entity);
    fn on_entity_disabled(&mut self, entity: Entity);
}

/// Set `node`'s hierarchy flag and cascade if its effective state changed.
///
/// `notify(entity, now_active)` is called once per node whose effective state
/// flipped, parents before children, and only when `scene_active` is set.
pub fn apply_active_in_hierarchy(
    graph: &mut TransformGraph,
    node: NodeId,
    hierarchy_active: bool,
    scene_active: bool,
    notify: &mut dyn FnMut(Entity, bool),
) {
    let Some(n) = graph.get_mut(node) else {
        return;
    };
    n.active.hierarchy_active = hierarchy_active;
    let effective = n.active.self_active && hierarchy_active;
    if effective == n.active.effective {
        return;
    }
    n.active.effective = effective;
    let owner = n.owner;
    let children = n.children.clone();

    if scene_active {
        notify(owner, effective);
    }
    for child in children {
        apply_active_in_hierarchy(graph, child, effective, scene_active, notify);
    }
}

/// Re-derive `node`'s state from its current parent.
pub fn reevaluate(
    graph: &mut TransformGraph,
    node: NodeId,
    scene_active: bool,
    notify: &mut dyn FnMut(Entity, bool),
) {
    let incoming = graph
        .parent(node)
        .and_then(|p| graph.get(p))
        .is_none_or(|p| p.active.effective);
    apply_active_in_hierarchy(graph, node, incoming, scene_active, notify);
}

/// Change `node`'s self flag. Returns `false` if it already had that value.
pub fn set_active(
    graph: &mut TransformGraph,
    node: NodeId,
    active: bool,
    scene_active: bool,
    notify: &mut dyn FnMut(Entity, bool),
) -> bool {
    let Some(n) = graph.get_mut(node) else {
        return false;
    };
    if n.active.self_active == active {
        return false;
    }
    n.active.self_active = active;
    reevaluate(graph, node, scene_active, notify);
    true
}

/// Deliver `on_enabled`/`on_disabled` to every behaviour on `entity`.
pub(crate) fn notify_behaviours(store: &ObjectStore, entity: Entity, active: bool) {
    for component in store.components(entity) {
        component.with_dyn_mut(|c: &mut dyn Component| {
            if let Some(behaviour) = c.as_behaviour() {
                if active {
                    behaviour.on_enabled();
                } else {
                    behaviour.on_disabled();
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::identity::InstanceId;

    fn entity(raw: u32) -> Entity {
        Entity::from_id(InstanceId::from_raw(raw))
    }

    /// a ── b ── c
    fn chain() -> (TransformGraph, [NodeId; 3]) {
        let mut graph = TransformGraph::default();
        let a = graph.insert(entity(1));
        let b = graph.insert(entity(2));
        let c = graph.insert(entity(3));
        graph.link(b, a);
        graph.link(c, b);
        (graph, [a, b, c])
    }

    fn effective(graph: &TransformGraph, node: NodeId) -> bool {
        graph.get(node).unwrap().active.effective
    }

    #[test]
    fn disabling_root_cascades() {
        let (mut graph, [a, b, c]) = chain();
        let mut calls = Vec::new();
        assert!(set_active(&mut graph, a, false, true, &mut |e, on| calls.push((e, on))));
        assert_eq!(
            calls,
            vec![(entity(1), false), (entity(2), false), (entity(3), false)]
        );
        assert!(!effective(&graph, c));
        assert!(graph.get(b).unwrap().active.self_active);
        assert!(!graph.get(b).unwrap().active.hierarchy_active);
    }

    #[test]
    fn same_value_is_noop() {
        let (mut graph, [a, _, _]) = chain();
        let mut calls = 0;
        assert!(!set_active(&mut graph, a, true, true, &mut |_, _| calls += 1));
        assert_eq!(calls, 0);
    }

    #[test]
    fn already_disabled_subtree_is_pruned() {
        let (mut graph, [a, b, c]) = chain();
        set_active(&mut graph, b, false, true, &mut |_, _| {});

        // Toggling the root off and on leaves b and c disabled throughout.
        let mut calls = Vec::new();
        set_active(&mut graph, a, false, true, &mut |e, on| calls.push((e, on)));
        set_active(&mut graph, a, true, true, &mut |e, on| calls.push((e, on)));
        assert_eq!(calls, vec![(entity(1), false), (entity(1), true)]);
        assert!(!effective(&graph, b));
        assert!(!effective(&graph, c));
    }

    #[test]
    fn inactive_scene_updates_flags_silently() {
        let (mut graph, [a, _, c]) = chain();
        let mut calls = 0;
        set_active(&mut graph, a, false, false, &mut |_, _| calls += 1);
        assert_eq!(calls, 0);
        assert!(!effective(&graph, c));
    }

    #[test]
    fn reevaluate_picks_up_new_parent() {
        let (mut graph, [a, _, _]) = chain();
        let loose = graph.insert(entity(9));
        set_active(&mut graph, a, false, true, &mut |_, _| {});
        graph.link(loose, a);
        let mut calls = Vec::new();
        reevaluate(&mut graph, loose, true, &mut |e, on| calls.push((e, on)));
        assert_eq!(calls, vec![(entity(9), false)]);

        graph.unlink(loose);
        calls.clear();
        reevaluate(&mut graph, loose, true, &mut |e, on| calls.push((e, on)));
        assert_eq!(calls, vec![(entity(9), true)]);
    }
}
