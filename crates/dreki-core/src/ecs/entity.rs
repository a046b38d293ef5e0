//! Entity handles and the borrowed facades over a [`World`].
//!
//! [`Entity`] is a plain `Copy` id. [`EntityMut`] and [`TransformMut`] borrow
//! the world mutably and offer the per-entity API in one place:
//!
//! ```ignore
//! let player = world.create_entity("Player");
//! let mut e = world.entity_mut(player).unwrap();
//! e.set_tag("Player");
//! e.add_component::<Health>();
//! e.transform().set_position(Vec3::new(0.0, 1.0, 0.0));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::component::{AnyComponentRef, Component, ComponentRef};
use super::hierarchy::NodeId;
use super::identity::InstanceId;
use super::scene::SceneId;
use super::world::World;
use crate::math::{Mat4, Quat, Trs, Vec3};

/// The identity of an entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(InstanceId);

impl Entity {
    /// Returned by entity creation when no id could be allocated. Never
    /// live, so every operation on it is a logged no-op.
    pub const INVALID: Self = Self(InstanceId::INVALID);

    pub(crate) fn from_id(id: InstanceId) -> Self {
        Self(id)
    }

    pub fn id(self) -> InstanceId {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0.raw())
    }
}

impl From<Entity> for InstanceId {
    fn from(entity: Entity) -> Self {
        entity.0
    }
}

// ── EntityMut ────────────────────────────────────────────────────────

/// Mutable access to one live entity.
pub struct EntityMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(world: &'w mut World, entity: Entity) -> Self {
        Self { world, entity }
    }

    pub fn id(&self) -> Entity {
        self.entity
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn name(&self) -> &str {
        self.world.name(self.entity).unwrap_or_default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.world.set_name(self.entity, name);
        self
    }

    pub fn tag(&self) -> &str {
        self.world.tag(self.entity).unwrap_or_default()
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.world.set_tag(self.entity, tag);
        self
    }

    pub fn layer(&self) -> u32 {
        self.world.layer(self.entity).unwrap_or_default()
    }

    pub fn set_layer(&mut self, layer: u32) -> &mut Self {
        self.world.set_layer(self.entity, layer);
        self
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.world.scene_of(self.entity)
    }

    // ── Components ───────────────────────────────────────────────────

    pub fn add_component<T: Component>(&mut self) -> Option<ComponentRef<T>> {
        self.world.add_component::<T>(self.entity)
    }

    pub fn remove_component<T: Component>(&mut self) -> bool {
        self.world.remove_component::<T>(self.entity)
    }

    pub fn get_component<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.world.get_component::<T>(self.entity)
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.world.has_component::<T>(self.entity)
    }

    pub fn components(&self) -> Vec<AnyComponentRef> {
        self.world.components(self.entity)
    }

    // ── Hierarchy and activation ─────────────────────────────────────

    pub fn transform(&mut self) -> TransformMut<'_> {
        let node = self.world.node_of(self.entity).unwrap_or_default();
        TransformMut::new(self.world, self.entity, node)
    }

    pub fn parent(&self) -> Option<Entity> {
        self.world.parent(self.entity)
    }

    pub fn children(&self) -> Vec<Entity> {
        self.world.children(self.entity)
    }

    pub fn set_parent(&mut self, parent: Option<Entity>, keep_world_pose: bool) -> bool {
        self.world.set_parent(self.entity, parent, keep_world_pose)
    }

    pub fn set_active(&mut self, active: bool) -> bool {
        self.world.set_active(self.entity, active)
    }

    pub fn is_active_self(&self) -> bool {
        self.world.is_active_self(self.entity)
    }

    pub fn is_active_in_hierarchy(&self) -> bool {
        self.world.is_active_in_hierarchy(self.entity)
    }

    /// Destroy this entity after `delay` seconds (now if negative).
    pub fn destroy(self, delay: f32) {
        self.world.destroy(self.entity.id(), delay);
    }
}

// ── TransformMut ─────────────────────────────────────────────────────

/// Spatial access to one entity's transform node.
pub struct TransformMut<'w> {
    world: &'w mut World,
    entity: Entity,
    node: NodeId,
}

impl<'w> TransformMut<'w> {
    pub(crate) fn new(world: &'w mut World, entity: Entity, node: NodeId) -> Self {
        Self {
            world,
            entity,
            node,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    // Local

    pub fn local_position(&self) -> Vec3 {
        self.world.graph.local_position(self.node).unwrap_or(Vec3::ZERO)
    }

    pub fn local_rotation(&self) -> Quat {
        self.world.graph.local_rotation(self.node).unwrap_or(Quat::IDENTITY)
    }

    pub fn local_euler_angles(&self) -> Vec3 {
        self.world.graph.local_euler_angles(self.node).unwrap_or(Vec3::ZERO)
    }

    pub fn local_scale(&self) -> Vec3 {
        self.world.graph.local_scale(self.node).unwrap_or(Vec3::ONE)
    }

    pub fn set_local_position(&mut self, position: Vec3) -> &mut Self {
        self.world.graph.set_local_position(self.node, position);
        self
    }

    pub fn set_local_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.world.graph.set_local_rotation(self.node, rotation);
        self
    }

    pub fn set_local_euler_angles(&mut self, degrees: Vec3) -> &mut Self {
        self.world.graph.set_local_euler_angles(self.node, degrees);
        self
    }

    pub fn set_local_scale(&mut self, scale: Vec3) -> &mut Self {
        self.world.graph.set_local_scale(self.node, scale);
        self
    }

    pub fn set_local_trs(&mut self, trs: Trs) -> &mut Self {
        self.world.graph.set_local_trs(self.node, trs);
        self
    }

    // World

    pub fn position(&self) -> Vec3 {
        self.world.graph.position(self.node)
    }

    pub fn rotation(&self) -> Quat {
        self.world.graph.rotation(self.node)
    }

    pub fn euler_angles(&self) -> Vec3 {
        self.world.graph.euler_angles(self.node)
    }

    pub fn lossy_scale(&self) -> Vec3 {
        self.world.graph.lossy_scale(self.node)
    }

    pub fn local_to_world_matrix(&self) -> Mat4 {
        self.world.graph.local_to_world_matrix(self.node)
    }

    pub fn world_to_local_matrix(&self) -> Mat4 {
        self.world.graph.world_to_local_matrix(self.node)
    }

    pub fn forward(&self) -> Vec3 {
        self.world.graph.forward(self.node)
    }

    pub fn right(&self) -> Vec3 {
        self.world.graph.right(self.node)
    }

    pub fn up(&self) -> Vec3 {
        self.world.graph.up(self.node)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.world.graph.transform_point(self.node, point)
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.world.graph.inverse_transform_point(self.node, point)
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.world.graph.set_position(self.node, position);
        self
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.world.graph.set_rotation(self.node, rotation);
        self
    }

    pub fn set_euler_angles(&mut self, degrees: Vec3) -> &mut Self {
        self.world.graph.set_euler_angles(self.node, degrees);
        self
    }

    pub fn set_lossy_scale(&mut self, scale: Vec3) -> &mut Self {
        self.world.graph.set_lossy_scale(self.node, scale);
        self
    }

    // Motion

    pub fn translate(&mut self, delta: Vec3, self_space: bool) -> &mut Self {
        self.world.graph.translate(self.node, delta, self_space);
        self
    }

    pub fn rotate(&mut self, rotation: Quat, self_space: bool) -> &mut Self {
        self.world.graph.rotate(self.node, rotation, self_space);
        self
    }

    pub fn rotate_euler(&mut self, degrees: Vec3, self_space: bool) -> &mut Self {
        self.world.graph.rotate_euler(self.node, degrees, self_space);
        self
    }

    pub fn rotate_around(&mut self, point: Vec3, axis: Vec3, degrees: f32) -> &mut Self {
        self.world.graph.rotate_around(self.node, point, axis, degrees);
        self
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) -> &mut Self {
        self.world.graph.look_at(self.node, target, up);
        self
    }

    pub fn set_parent(&mut self, parent: Option<Entity>, keep_world_pose: bool) -> bool {
        self.world.set_parent(self.entity, parent, keep_world_pose)
    }
}
