//! # World — Entities, Hierarchy, and Scenes
//!
//! The [`World`] ties the object model together:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ World                                                    │
//! │                                                          │
//! │  store: Arc<ObjectStore>     (Send + Sync)               │
//! │    catalog      component types, fixed at build time     │
//! │    registry     ids, live objects, deletion queue        │
//! │    attachments  entity → ordered component table         │
//! │                                                          │
//! │  graph: TransformGraph       (main thread only)          │
//! │  entities: Entity → { name, tag, layer, scene, node }    │
//! │  scenes: SceneSet                                        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! [`create_entity`](World::create_entity) allocates an id, inserts a
//! transform node, attaches the [`Transform`] component and lists the entity
//! as a root of the current scene. [`destroy`](World::destroy) either tears
//! the entity down right away (`delay < 0`) or queues it; queued entries are
//! processed by [`frame_update`](World::frame_update).
//!
//! Teardown of an entity destroys its whole subtree, depth-first. Only the
//! entity the teardown started from is detached from its parent (or its
//! scene's root list); descendants are marked `destroying` and go down with
//! it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::activation::{self, CollisionListener, notify_behaviours};
use super::catalog::{CatalogBuilder, ComponentCatalog, ComponentKind};
use super::component::{AnyComponentRef, Component, ComponentRef, downcast_mut};
use super::entity::{Entity, EntityMut, TransformMut};
use super::hierarchy::{NodeId, TransformGraph, TransformNode};
use super::identity::{InstanceId, InstanceKind, InstanceRef};
use super::scene::{Scene, SceneId, SceneSet};
use super::store::ObjectStore;
use super::transform::Transform;
use crate::config::CoreConfig;
use crate::error::CoreError;

/// Per-entity metadata kept outside the store.
#[derive(Debug, Clone)]
pub(crate) struct EntityRecord {
    pub name: String,
    pub tag: String,
    pub layer: u32,
    pub scene: SceneId,
    pub node: NodeId,
}

/// Counters for the diagnostics overlay.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldStats {
    pub entities: usize,
    pub nodes: usize,
    pub scenes: usize,
    pub pool: super::identity::PoolStats,
    pub created_this_frame: u32,
    pub destroyed_this_frame: u32,
}

pub struct World {
    store: Arc<ObjectStore>,
    pub(crate) graph: TransformGraph,
    pub(crate) entities: HashMap<Entity, EntityRecord>,
    scenes: SceneSet,
    config: CoreConfig,
    collision: Option<Box<dyn CollisionListener>>,
    #[cfg(feature = "diagnostics")]
    created_this_frame: u32,
    #[cfg(feature = "diagnostics")]
    destroyed_this_frame: u32,
}

/// Lists component types and settings for a new [`World`].
pub struct WorldBuilder {
    catalog: CatalogBuilder,
    config: CoreConfig,
}

impl WorldBuilder {
    pub fn register<T: Component + Default>(mut self) -> Self {
        self.catalog = self.catalog.register::<T>();
        self
    }

    pub fn register_named<T: Component + Default>(mut self, name: impl Into<String>) -> Self {
        self.catalog = self.catalog.register_named::<T>(name);
        self
    }

    pub fn register_persistent<T>(mut self) -> Self
    where
        T: Component + Default + Serialize + DeserializeOwned,
    {
        self.catalog = self.catalog.register_persistent::<T>();
        self
    }

    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> World {
        World::new(self.catalog.build(), self.config)
    }
}

impl World {
    pub fn new(catalog: ComponentCatalog, config: CoreConfig) -> Self {
        log::debug!("world created with {} component types", catalog.len());
        Self {
            store: Arc::new(ObjectStore::new(catalog)),
            graph: TransformGraph::new(config.scale_epsilon),
            entities: HashMap::new(),
            scenes: SceneSet::new(&config.default_scene),
            config,
            collision: None,
            #[cfg(feature = "diagnostics")]
            created_this_frame: 0,
            #[cfg(feature = "diagnostics")]
            destroyed_this_frame: 0,
        }
    }

    pub fn builder() -> WorldBuilder {
        WorldBuilder {
            catalog: CatalogBuilder::new(),
            config: CoreConfig::default(),
        }
    }

    /// Shared handle to the thread-safe store, for attaching components from
    /// other threads.
    pub fn store(&self) -> &Arc<ObjectStore> {
        &self.store
    }

    pub fn graph(&self) -> &TransformGraph {
        &self.graph
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn set_collision_listener(&mut self, listener: Box<dyn CollisionListener>) {
        self.collision = Some(listener);
    }

    // ── Entities ─────────────────────────────────────────────────────

    /// Create a root entity in the current scene. Yields
    /// [`Entity::INVALID`] (with a log) if the id space is exhausted.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        let scene = self.scenes.current();
        self.create_entity_in(name.into(), scene)
    }

    pub(crate) fn create_entity_in(&mut self, name: String, scene: SceneId) -> Entity {
        let Some(entity) = self.store.register_entity() else {
            return Entity::INVALID;
        };
        let node = self.graph.insert(entity);
        log::debug!("created entity `{name}` {entity:?}");
        self.entities.insert(
            entity,
            EntityRecord {
                name,
                tag: self.config.default_tag.clone(),
                layer: 0,
                scene,
                node,
            },
        );
        self.scenes.add_root(scene, entity);
        self.store
            .attach_with(entity, ComponentKind::TRANSFORM, |c| {
                if let Some(transform) = downcast_mut::<Transform>(c) {
                    transform.node = node;
                }
            });
        #[cfg(feature = "diagnostics")]
        {
            self.created_this_frame += 1;
        }
        entity
    }

    /// Create an entity parented under `parent` at its local origin.
    /// `None` if `parent` isn't live.
    pub fn create_child(&mut self, parent: Entity, name: impl Into<String>) -> Option<Entity> {
        if !self.contains(parent) {
            CoreError::UnknownEntity(parent).report();
            return None;
        }
        let scene = self.entities.get(&parent)?.scene;
        let child = self.create_entity_in(name.into(), scene);
        self.set_parent(child, Some(parent), false);
        Some(child)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        self.contains(entity).then(|| EntityMut::new(self, entity))
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Option<TransformMut<'_>> {
        let node = self.node_of(entity)?;
        Some(TransformMut::new(self, entity, node))
    }

    /// The entity's transform node.
    pub fn node_of(&self, entity: Entity) -> Option<NodeId> {
        self.entities.get(&entity).map(|r| r.node)
    }

    pub fn transform(&self, entity: Entity) -> Option<ComponentRef<Transform>> {
        self.store.get_component::<Transform>(entity)
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.entities.get(&entity).map(|r| r.name.as_str())
    }

    pub fn set_name(&mut self, entity: Entity, name: impl Into<String>) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.name = name.into();
        }
    }

    pub fn tag(&self, entity: Entity) -> Option<&str> {
        self.entities.get(&entity).map(|r| r.tag.as_str())
    }

    pub fn set_tag(&mut self, entity: Entity, tag: impl Into<String>) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.tag = tag.into();
        }
    }

    pub fn layer(&self, entity: Entity) -> Option<u32> {
        self.entities.get(&entity).map(|r| r.layer)
    }

    pub fn set_layer(&mut self, entity: Entity, layer: u32) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.layer = layer;
        }
    }

    pub fn scene_of(&self, entity: Entity) -> Option<SceneId> {
        self.entities.get(&entity).map(|r| r.scene)
    }

    /// Every entity in scene order, each root followed by its subtree.
    fn hierarchy_order(&self) -> Vec<Entity> {
        self.scenes
            .iter()
            .flat_map(|scene| scene.roots().iter())
            .filter_map(|&root| self.node_of(root))
            .flat_map(|node| self.graph.subtree(node))
            .filter_map(|node| self.graph.owner(node))
            .collect()
    }

    /// First entity carrying `tag`, in hierarchy order.
    pub fn find_with_tag(&self, tag: &str) -> Option<Entity> {
        self.hierarchy_order()
            .into_iter()
            .find(|e| self.tag(*e) == Some(tag))
    }

    pub fn find_all_with_tag(&self, tag: &str) -> Vec<Entity> {
        self.hierarchy_order()
            .into_iter()
            .filter(|e| self.tag(*e) == Some(tag))
            .collect()
    }

    /// First entity named `name`: scene roots first, then their subtrees.
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        let roots: Vec<Entity> = self
            .scenes
            .iter()
            .flat_map(|s| s.roots().iter().copied())
            .collect();
        if let Some(&hit) = roots.iter().find(|&&e| self.name(e) == Some(name)) {
            return Some(hit);
        }
        roots.iter().find_map(|&root| self.find(root, name))
    }

    // ── Components ───────────────────────────────────────────────────

    pub fn add_component<T: Component>(&self, entity: Entity) -> Option<ComponentRef<T>> {
        self.store.add_component::<T>(entity)
    }

    pub fn add_component_by_name(&self, entity: Entity, name: &str) -> Option<AnyComponentRef> {
        self.store.add_component_by_name(entity, name)
    }

    pub fn remove_component<T: Component>(&self, entity: Entity) -> bool {
        self.store.remove_component::<T>(entity)
    }

    pub fn remove_component_by_name(&self, entity: Entity, name: &str) -> bool {
        self.store.remove_component_by_name(entity, name)
    }

    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<ComponentRef<T>> {
        self.store.get_component::<T>(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.store.has_component::<T>(entity)
    }

    pub fn components(&self, entity: Entity) -> Vec<AnyComponentRef> {
        self.store.components(entity)
    }

    /// The entity a component is attached to.
    pub fn owner_of(&self, component: InstanceId) -> Option<Entity> {
        self.store.owner_of(component)
    }

    // ── Destruction ──────────────────────────────────────────────────

    /// Destroy an entity or component. A negative `delay` destroys it now;
    /// otherwise it is queued for [`frame_update`](Self::frame_update).
    pub fn destroy(&mut self, id: InstanceId, delay: f32) {
        if delay < 0.0 {
            self.destroy_immediate(id);
        } else {
            self.store.registry().schedule(id, delay);
        }
    }

    /// Destroy an entity (with its subtree) or a single component now.
    /// Children of a destroyed entity go down in the same call.
    /// Returns `false` if `id` isn't live or names a [`Transform`].
    pub fn destroy_immediate(&mut self, id: InstanceId) -> bool {
        match self.store.registry().kind(id) {
            Some(InstanceKind::Entity) => self.destroy_entity(Entity::from_id(id)),
            Some(InstanceKind::Component(ComponentKind::TRANSFORM)) => {
                if let Some(owner) = self.store.owner_of(id) {
                    CoreError::TransformRemoval(owner).report();
                }
                false
            }
            Some(InstanceKind::Component(_)) => self.store.destroy_component(id),
            None => false,
        }
    }

    /// Advance the deletion queue by `dt` seconds and destroy what is due.
    pub fn frame_update(&mut self, dt: f32) {
        #[cfg(feature = "diagnostics")]
        {
            self.created_this_frame = 0;
            self.destroyed_this_frame = 0;
        }
        // Ids freed by one entry stay parked until the batch is done, so a
        // later entry can't hit an object that reused one of them.
        let store = Arc::clone(&self.store);
        let _hold = store.registry().hold_released();
        for id in store.registry().advance(dt) {
            self.destroy_immediate(id);
        }
    }

    /// Tear down `entity` and its whole subtree right away. Descendants are
    /// destroyed synchronously, depth-first, rather than being queued for a
    /// later frame, so they are gone when this returns.
    fn destroy_entity(&mut self, entity: Entity) -> bool {
        let Some(record) = self.entities.get(&entity) else {
            return false;
        };
        let (node, scene) = (record.node, record.scene);
        let Some(state) = self.graph.get(node) else {
            return false;
        };

        if !state.destroying {
            if state.parent.is_some() {
                self.graph.unlink(node);
            } else {
                self.scenes.remove_root(scene, entity);
            }
            if let Some(n) = self.graph.get_mut(node) {
                n.destroying = true;
            }
        }

        for child in self.graph.children(node).to_vec() {
            let Some(c) = self.graph.get_mut(child) else {
                continue;
            };
            c.destroying = true;
            let owner = c.owner;
            self.destroy_entity(owner);
        }

        // Other components in reverse attachment order, the Transform last.
        let components = self.store.components(entity);
        let (transform, others): (Vec<_>, Vec<_>) = components
            .iter()
            .partition(|c| c.kind() == ComponentKind::TRANSFORM);
        for component in others.iter().rev().chain(transform.iter()) {
            self.store.destroy_component(component.id());
        }

        self.graph.remove(node);
        self.entities.remove(&entity);
        self.store.release_entity(entity);
        log::debug!("destroyed entity {entity:?}");
        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_frame += 1;
        }
        true
    }

    // ── Hierarchy ────────────────────────────────────────────────────

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        let node = self.node_of(entity)?;
        self.graph.owner(self.graph.parent(node)?)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.node_of(entity)
            .map(|node| {
                self.graph
                    .children(node)
                    .iter()
                    .filter_map(|&c| self.graph.owner(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn child_count(&self, entity: Entity) -> usize {
        self.node_of(entity)
            .map_or(0, |node| self.graph.child_count(node))
    }

    /// The `index`-th child. Out of range is logged and yields `None`.
    pub fn child(&self, entity: Entity, index: usize) -> Option<Entity> {
        let node = self.node_of(entity)?;
        self.graph.owner(self.graph.child(node, index)?)
    }

    /// `true` if `entity` is a strict descendant of `ancestor`.
    pub fn is_child_of(&self, entity: Entity, ancestor: Entity) -> bool {
        match (self.node_of(entity), self.node_of(ancestor)) {
            (Some(node), Some(anc)) => self.graph.is_child_of(node, anc),
            _ => false,
        }
    }

    pub fn root(&self, entity: Entity) -> Option<Entity> {
        let node = self.node_of(entity)?;
        self.graph.owner(self.graph.root(node))
    }

    /// Descendant of `entity` named `name`. Direct children are checked
    /// before deeper levels.
    pub fn find(&self, entity: Entity, name: &str) -> Option<Entity> {
        let node = self.node_of(entity)?;
        let matches = |n: &TransformNode| self.name(n.owner) == Some(name);
        self.graph
            .find(node, &matches)
            .and_then(|hit| self.graph.owner(hit))
    }

    /// Like [`find`](Self::find), but searches the whole tree `entity` lives
    /// in, starting from its root.
    pub fn find_from_child(&self, entity: Entity, name: &str) -> Option<Entity> {
        let root = self.root(entity)?;
        if self.name(root) == Some(name) {
            return Some(root);
        }
        self.find(root, name)
    }

    /// Position among the parent's children, or among the scene roots for a
    /// root entity.
    pub fn sibling_index(&self, entity: Entity) -> Option<usize> {
        let node = self.node_of(entity)?;
        if self.graph.parent(node).is_some() {
            return self.graph.sibling_index(node);
        }
        let scene = self.scenes.get(self.scene_of(entity)?)?;
        scene.roots().iter().position(|&e| e == entity)
    }

    /// Move `child` under `parent`, or to the scene root when `parent` is
    /// `None`. With `keep_world_pose` the child's world position, rotation
    /// and scale are preserved; otherwise its local values are.
    ///
    /// Returns `false` (and logs) if either entity is unknown or the move
    /// would create a cycle.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>, keep_world_pose: bool) -> bool {
        let Some(node) = self.node_of(child) else {
            CoreError::UnknownEntity(child).report();
            return false;
        };
        let parent_node = match parent {
            Some(p) => match self.node_of(p) {
                Some(n) => Some(n),
                None => {
                    CoreError::UnknownEntity(p).report();
                    return false;
                }
            },
            None => None,
        };
        let old_parent = self.graph.parent(node);
        if old_parent == parent_node {
            return true;
        }
        if let (Some(p), Some(pn)) = (parent, parent_node) {
            if self.graph.would_cycle(node, pn) {
                CoreError::HierarchyCycle { child, parent: p }.report();
                return false;
            }
        }

        let world = keep_world_pose.then(|| self.graph.local_to_world_matrix(node));
        let Some(old_scene) = self.scene_of(child) else {
            return false;
        };
        match parent_node {
            Some(pn) => {
                self.graph.link(node, pn);
                if old_parent.is_none() {
                    self.scenes.remove_root(old_scene, child);
                }
            }
            None => {
                self.graph.unlink(node);
                self.scenes.add_root(old_scene, child);
            }
        }
        if let Some(world) = world {
            let local = self.graph.local_from_world(parent_node, world);
            self.graph.set_local_trs(node, local);
        }

        let new_scene = parent.and_then(|p| self.scene_of(p)).unwrap_or(old_scene);
        if new_scene != old_scene {
            self.assign_scene(node, new_scene);
        }
        log::debug!("reparented {child:?} under {parent:?}");
        self.reevaluate_active(node);
        true
    }

    fn assign_scene(&mut self, node: NodeId, scene: SceneId) {
        for n in self.graph.subtree(node) {
            if let Some(record) = self.graph.owner(n).and_then(|e| self.entities.get_mut(&e)) {
                record.scene = scene;
            }
        }
    }

    // ── Activation ───────────────────────────────────────────────────

    /// Change the entity's own active flag, cascading to its subtree.
    /// Returns `false` if nothing changed.
    pub fn set_active(&mut self, entity: Entity, active: bool) -> bool {
        let (Some(node), Some(scene)) = (self.node_of(entity), self.scene_of(entity)) else {
            CoreError::UnknownEntity(entity).report();
            return false;
        };
        let scene_active = self.scenes.is_active(scene);
        let store = &self.store;
        let collision = &mut self.collision;
        activation::set_active(&mut self.graph, node, active, scene_active, &mut |e, on| {
            dispatch(store, collision, e, on);
        })
    }

    fn reevaluate_active(&mut self, node: NodeId) {
        let scene = self
            .graph
            .owner(node)
            .and_then(|e| self.scene_of(e));
        let scene_active = scene.is_some_and(|s| self.scenes.is_active(s));
        let store = &self.store;
        let collision = &mut self.collision;
        activation::reevaluate(&mut self.graph, node, scene_active, &mut |e, on| {
            dispatch(store, collision, e, on);
        });
    }

    pub fn is_active_self(&self, entity: Entity) -> bool {
        self.node_of(entity)
            .and_then(|n| self.graph.get(n))
            .is_some_and(|n| n.active.self_active)
    }

    /// Effective state: the entity and all its ancestors are active.
    pub fn is_active_in_hierarchy(&self, entity: Entity) -> bool {
        self.node_of(entity)
            .and_then(|n| self.graph.get(n))
            .is_some_and(|n| n.active.effective)
    }

    /// Whether the entity's scene delivers notifications.
    pub fn is_active_scene(&self, entity: Entity) -> bool {
        self.scene_of(entity)
            .is_some_and(|s| self.scenes.is_active(s))
    }

    /// A component counts as active and enabled when its owner is active in
    /// hierarchy, its scene is active, and (for behaviours) it reports
    /// itself enabled.
    pub fn is_active_and_enabled(&self, component: InstanceId) -> bool {
        let Some(owner) = self.owner_of(component) else {
            return false;
        };
        if !self.is_active_in_hierarchy(owner) || !self.is_active_scene(owner) {
            return false;
        }
        let Some(InstanceRef::Component(handle)) = self.store.instance(component)
        else {
            return false;
        };
        handle
            .with_dyn_mut(|c| c.as_behaviour().is_none_or(|b| b.is_enabled()))
            .unwrap_or(false)
    }

    // ── Scenes ───────────────────────────────────────────────────────

    pub fn create_scene(&mut self, name: &str) -> SceneId {
        self.scenes.create(name)
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn scene_by_name(&self, name: &str) -> Option<SceneId> {
        self.scenes.by_name(name)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    /// The scene new entities are created in.
    pub fn active_scene(&self) -> SceneId {
        self.scenes.current()
    }

    pub fn set_active_scene(&mut self, id: SceneId) -> bool {
        if !self.scenes.set_current(id) {
            CoreError::UnknownScene(id).report();
            return false;
        }
        true
    }

    /// Turn a scene's notification gate on or off. Stored active flags keep
    /// updating either way.
    pub fn set_scene_active(&mut self, id: SceneId, active: bool) -> bool {
        if !self.scenes.set_active(id, active) {
            CoreError::UnknownScene(id).report();
            return false;
        }
        true
    }

    pub fn scene_roots(&self, id: SceneId) -> Vec<Entity> {
        self.scenes
            .get(id)
            .map(|s| s.roots().to_vec())
            .unwrap_or_default()
    }

    /// Move a root entity and its subtree to another scene.
    pub fn move_to_scene(&mut self, entity: Entity, scene: SceneId) -> bool {
        if self.scenes.get(scene).is_none() {
            CoreError::UnknownScene(scene).report();
            return false;
        }
        let (Some(node), Some(old)) = (self.node_of(entity), self.scene_of(entity)) else {
            CoreError::UnknownEntity(entity).report();
            return false;
        };
        if self.graph.parent(node).is_some() {
            log::warn!("{entity:?} has a parent; only roots can change scene");
            return false;
        }
        self.scenes.remove_root(old, entity);
        self.scenes.add_root(scene, entity);
        self.assign_scene(node, scene);
        true
    }

    /// Destroy every root of a scene (and their subtrees), then drop the
    /// scene itself.
    pub fn unload_scene(&mut self, id: SceneId) -> bool {
        let Some(scene) = self.scenes.get(id) else {
            CoreError::UnknownScene(id).report();
            return false;
        };
        for root in scene.roots().to_vec() {
            self.destroy_entity(root);
        }
        let fallback = self.config.default_scene.clone();
        self.scenes.remove(id, &fallback);
        log::debug!("unloaded {id:?}");
        true
    }

    #[cfg(feature = "diagnostics")]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            entities: self.entities.len(),
            nodes: self.graph.len(),
            scenes: self.scenes.len(),
            pool: self.store.registry().stats(),
            created_this_frame: self.created_this_frame,
            destroyed_this_frame: self.destroyed_this_frame,
        }
    }
}

/// Forward an activation change to behaviours and the collision listener.
fn dispatch(
    store: &ObjectStore,
    collision: &mut Option<Box<dyn CollisionListener>>,
    entity: Entity,
    active: bool,
) {
    notify_behaviours(store, entity, active);
    if let Some(listener) = collision.as_mut() {
        if active {
            listener.on_entity_enabled(entity);
        } else {
            listener.on_entity_disabled(entity);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        let roots: Vec<Entity> = self
            .scenes
            .iter()
            .flat_map(|s| s.roots().iter().copied())
            .collect();
        for root in roots {
            self.destroy_entity(root);
        }
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("scenes", &self.scenes.len())
            .field("store", &self.store)
            .finish()
    }
}
