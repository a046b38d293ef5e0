//! # Transforms — Local State and Spatial Queries
//!
//! [`Transform`] is the component every entity owns for its whole life. It
//! only stores the [`NodeId`] of its node; the spatial state lives in the
//! [`TransformGraph`] so that hierarchy walks don't need to lock components.
//!
//! ## Local vs world
//!
//! Each node stores local position/rotation/scale relative to its parent and
//! lazily caches the local matrix. World values are recomputed from the
//! ancestor chain on every query:
//!
//! ```text
//! world_rotation = root.rot * ... * parent.rot * node.rot
//! lossy_scale    = root.scale * ... * parent.scale * node.scale   (per axis)
//! world_position = parent_world_matrix * node.position
//! ```
//!
//! World-space setters do the reverse: un-rotate by the parent's world
//! rotation, then divide by the parent's lossy scale. Parent scale axes
//! below `scale_epsilon` give 0 on that axis rather than NaN.

use super::component::Component;
use super::hierarchy::{NodeId, TransformGraph, TransformNode};
use crate::math::{Mat4, Quat, Trs, Vec3, div_clamped, euler_to_quat, quat_to_euler};

/// Marks an entity's place in the transform graph.
///
/// Read and write spatial state through
/// [`World::transform_mut`](super::World::transform_mut) or the
/// [`TransformGraph`] methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transform {
    pub(crate) node: NodeId,
}

impl Transform {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Component for Transform {}

impl TransformNode {
    fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    fn set_rotation_quat(&mut self, rotation: Quat) {
        self.local_rotation = rotation.normalize();
        self.local_euler = quat_to_euler(self.local_rotation);
        self.mark_dirty();
    }

    fn set_rotation_euler(&mut self, degrees: Vec3) {
        self.local_euler = degrees;
        self.local_rotation = euler_to_quat(degrees);
        self.mark_dirty();
    }

    /// The cached local matrix, refreshed if the node is dirty.
    pub fn local_matrix(&self) -> Mat4 {
        if self.dirty.get() {
            self.local_matrix.set(Mat4::from_scale_rotation_translation(
                self.local_scale,
                self.local_rotation,
                self.local_position,
            ));
            self.dirty.set(false);
        }
        self.local_matrix.get()
    }

    pub fn local_trs(&self) -> Trs {
        Trs {
            translation: self.local_position,
            rotation: self.local_rotation,
            scale: self.local_scale,
        }
    }
}

/// Replace one component of `v` (0 = x, 1 = y, 2 = z).
fn with_axis(mut v: Vec3, axis: usize, value: f32) -> Vec3 {
    match axis {
        0 => v.x = value,
        1 => v.y = value,
        2 => v.z = value,
        _ => log::warn!("axis index {axis} out of range; expected 0..=2"),
    }
    v
}

impl TransformGraph {
    // ── Local state ──────────────────────────────────────────────────

    pub fn local_position(&self, node: NodeId) -> Option<Vec3> {
        self.get(node).map(|n| n.local_position)
    }

    pub fn local_rotation(&self, node: NodeId) -> Option<Quat> {
        self.get(node).map(|n| n.local_rotation)
    }

    /// Local rotation as Euler angles in degrees.
    pub fn local_euler_angles(&self, node: NodeId) -> Option<Vec3> {
        self.get(node).map(|n| n.local_euler)
    }

    pub fn local_scale(&self, node: NodeId) -> Option<Vec3> {
        self.get(node).map(|n| n.local_scale)
    }

    pub fn local_trs(&self, node: NodeId) -> Option<Trs> {
        self.get(node).map(TransformNode::local_trs)
    }

    pub fn set_local_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.get_mut(node) {
            n.local_position = position;
            n.mark_dirty();
        }
    }

    pub fn set_local_rotation(&mut self, node: NodeId, rotation: Quat) {
        if let Some(n) = self.get_mut(node) {
            n.set_rotation_quat(rotation);
        }
    }

    pub fn set_local_euler_angles(&mut self, node: NodeId, degrees: Vec3) {
        if let Some(n) = self.get_mut(node) {
            n.set_rotation_euler(degrees);
        }
    }

    pub fn set_local_scale(&mut self, node: NodeId, scale: Vec3) {
        if let Some(n) = self.get_mut(node) {
            n.local_scale = scale;
            n.mark_dirty();
        }
    }

    /// Overwrite position, rotation and scale at once.
    pub fn set_local_trs(&mut self, node: NodeId, trs: Trs) {
        if let Some(n) = self.get_mut(node) {
            n.local_position = trs.translation;
            n.local_scale = trs.scale;
            n.set_rotation_quat(trs.rotation);
        }
    }

    /// Set one local position axis (0 = x, 1 = y, 2 = z).
    pub fn set_local_position_axis(&mut self, node: NodeId, axis: usize, value: f32) {
        if let Some(p) = self.local_position(node) {
            self.set_local_position(node, with_axis(p, axis, value));
        }
    }

    pub fn set_local_euler_axis(&mut self, node: NodeId, axis: usize, degrees: f32) {
        if let Some(e) = self.local_euler_angles(node) {
            self.set_local_euler_angles(node, with_axis(e, axis, degrees));
        }
    }

    // ── World queries ────────────────────────────────────────────────

    /// Local-to-world matrix: the ancestors' local matrices multiplied
    /// root-ward onto this node's.
    pub fn local_to_world_matrix(&self, node: NodeId) -> Mat4 {
        let Some(n) = self.get(node) else {
            return Mat4::IDENTITY;
        };
        self.ancestors(node)
            .filter_map(|a| self.get(a))
            .fold(n.local_matrix(), |m, a| a.local_matrix() * m)
    }

    pub fn world_to_local_matrix(&self, node: NodeId) -> Mat4 {
        self.local_to_world_matrix(node).inverse()
    }

    /// Parent's local-to-world matrix, identity for roots.
    fn parent_matrix(&self, node: NodeId) -> Mat4 {
        self.parent(node)
            .map_or(Mat4::IDENTITY, |p| self.local_to_world_matrix(p))
    }

    fn parent_rotation(&self, node: NodeId) -> Quat {
        self.parent(node).map_or(Quat::IDENTITY, |p| self.rotation(p))
    }

    fn parent_scale(&self, node: NodeId) -> Vec3 {
        self.parent(node).map_or(Vec3::ONE, |p| self.lossy_scale(p))
    }

    pub fn position(&self, node: NodeId) -> Vec3 {
        let local = self.local_position(node).unwrap_or(Vec3::ZERO);
        match self.parent(node) {
            Some(_) => self.parent_matrix(node).transform_point3(local),
            None => local,
        }
    }

    pub fn rotation(&self, node: NodeId) -> Quat {
        let local = self.local_rotation(node).unwrap_or(Quat::IDENTITY);
        self.ancestors(node)
            .filter_map(|a| self.local_rotation(a))
            .fold(local, |r, a| a * r)
            .normalize()
    }

    /// World rotation as Euler angles in degrees.
    pub fn euler_angles(&self, node: NodeId) -> Vec3 {
        quat_to_euler(self.rotation(node))
    }

    /// Product of the local scales up the chain. Ignores the skew that
    /// rotated non-uniform parents introduce.
    pub fn lossy_scale(&self, node: NodeId) -> Vec3 {
        let local = self.local_scale(node).unwrap_or(Vec3::ONE);
        self.ancestors(node)
            .filter_map(|a| self.local_scale(a))
            .fold(local, |s, a| a * s)
    }

    pub fn world_trs(&self, node: NodeId) -> Trs {
        Trs {
            translation: self.position(node),
            rotation: self.rotation(node),
            scale: self.lossy_scale(node),
        }
    }

    pub fn transform_point(&self, node: NodeId, point: Vec3) -> Vec3 {
        self.local_to_world_matrix(node).transform_point3(point)
    }

    pub fn inverse_transform_point(&self, node: NodeId, point: Vec3) -> Vec3 {
        self.world_to_local_matrix(node).transform_point3(point)
    }

    /// Rotate a local direction into world space. Scale is not applied.
    pub fn transform_direction(&self, node: NodeId, direction: Vec3) -> Vec3 {
        self.rotation(node) * direction
    }

    pub fn inverse_transform_direction(&self, node: NodeId, direction: Vec3) -> Vec3 {
        self.rotation(node).inverse() * direction
    }

    /// World-space forward (−Z).
    pub fn forward(&self, node: NodeId) -> Vec3 {
        self.transform_direction(node, Vec3::NEG_Z)
    }

    pub fn right(&self, node: NodeId) -> Vec3 {
        self.transform_direction(node, Vec3::X)
    }

    pub fn up(&self, node: NodeId) -> Vec3 {
        self.transform_direction(node, Vec3::Y)
    }

    // ── World setters ────────────────────────────────────────────────

    /// Express a world-space offset in the parent's space.
    fn world_delta_to_parent_space(&self, node: NodeId, delta: Vec3) -> Vec3 {
        let unrotated = self.parent_rotation(node).inverse() * delta;
        div_clamped(unrotated, self.parent_scale(node), self.scale_epsilon)
    }

    pub fn set_position(&mut self, node: NodeId, position: Vec3) {
        let local = match self.parent(node) {
            Some(parent) => {
                let offset = position - self.position(parent);
                self.world_delta_to_parent_space(node, offset)
            }
            None => position,
        };
        self.set_local_position(node, local);
    }

    pub fn set_position_axis(&mut self, node: NodeId, axis: usize, value: f32) {
        let p = self.position(node);
        self.set_position(node, with_axis(p, axis, value));
    }

    pub fn set_rotation(&mut self, node: NodeId, rotation: Quat) {
        let local = self.parent_rotation(node).inverse() * rotation;
        self.set_local_rotation(node, local);
    }

    pub fn set_euler_angles(&mut self, node: NodeId, degrees: Vec3) {
        self.set_rotation(node, euler_to_quat(degrees));
    }

    pub fn set_euler_axis(&mut self, node: NodeId, axis: usize, degrees: f32) {
        let e = self.euler_angles(node);
        self.set_euler_angles(node, with_axis(e, axis, degrees));
    }

    /// Set the local scale so the lossy world scale becomes `scale`.
    pub fn set_lossy_scale(&mut self, node: NodeId, scale: Vec3) {
        let local = div_clamped(scale, self.parent_scale(node), self.scale_epsilon);
        self.set_local_scale(node, local);
    }

    // ── Relative motion ──────────────────────────────────────────────

    /// Move by `delta`. In self space the delta follows the node's own axes;
    /// otherwise it is a world-space offset.
    pub fn translate(&mut self, node: NodeId, delta: Vec3, self_space: bool) {
        let Some(n) = self.get(node) else {
            return;
        };
        let local_delta = if self_space {
            n.local_rotation * delta
        } else {
            self.world_delta_to_parent_space(node, delta)
        };
        let position = n.local_position + local_delta;
        self.set_local_position(node, position);
    }

    /// Apply `rotation` after the current one, in the node's own frame
    /// (`self_space`) or in world space.
    pub fn rotate(&mut self, node: NodeId, rotation: Quat, self_space: bool) {
        let Some(local) = self.local_rotation(node) else {
            return;
        };
        let updated = if self_space {
            local * rotation
        } else {
            let parent = self.parent_rotation(node);
            parent.inverse() * rotation * parent * local
        };
        self.set_local_rotation(node, updated);
    }

    pub fn rotate_euler(&mut self, node: NodeId, degrees: Vec3, self_space: bool) {
        self.rotate(node, euler_to_quat(degrees), self_space);
    }

    /// Orbit `point` around a world `axis` by `degrees`, turning with it.
    pub fn rotate_around(&mut self, node: NodeId, point: Vec3, axis: Vec3, degrees: f32) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let q = Quat::from_axis_angle(axis, degrees.to_radians());
        let position = point + q * (self.position(node) - point);
        self.set_position(node, position);
        self.rotate(node, q, false);
    }

    /// Turn so that −Z points at `target` with +Y as close to `up` as possible.
    pub fn look_at(&mut self, node: NodeId, target: Vec3, up: Vec3) {
        let eye = self.position(node);
        let forward = target - eye;
        if forward.length_squared() < f32::EPSILON || forward.cross(up).length_squared() < f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.set_rotation(node, rotation);
    }

    /// Re-express `world` as a local transform under `parent` (or as a root).
    /// Collapsed scale axes, on either side, come out as 0 rather than NaN.
    pub(crate) fn local_from_world(&self, parent: Option<NodeId>, world: Mat4) -> Trs {
        let Some(parent) = parent else {
            return Trs::from_matrix_clamped(world, self.scale_epsilon);
        };
        let parent_world = self.local_to_world_matrix(parent);
        if parent_world.determinant().abs() > self.scale_epsilon {
            return Trs::from_matrix_clamped(parent_world.inverse() * world, self.scale_epsilon);
        }
        // Collapsed parent: fall back to per-axis division.
        let world = Trs::from_matrix_clamped(world, self.scale_epsilon);
        let parent_rotation = self.rotation(parent);
        let parent_scale = self.lossy_scale(parent);
        let offset = parent_rotation.inverse() * (world.translation - self.position(parent));
        Trs {
            translation: div_clamped(offset, parent_scale, self.scale_epsilon),
            rotation: parent_rotation.inverse() * world.rotation,
            scale: div_clamped(world.scale, parent_scale, self.scale_epsilon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::Entity;
    use crate::ecs::identity::InstanceId;

    const EPS: f32 = 1e-4;

    fn graph_with(count: u32) -> (TransformGraph, Vec<NodeId>) {
        let mut graph = TransformGraph::default();
        let nodes = (1..=count)
            .map(|i| graph.insert(Entity::from_id(InstanceId::from_raw(i))))
            .collect();
        (graph, nodes)
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn root_queries_return_local_values() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_position(n[0], Vec3::new(1.0, 2.0, 3.0));
        graph.set_local_scale(n[0], Vec3::splat(2.0));
        assert_eq!(graph.position(n[0]), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(graph.lossy_scale(n[0]), Vec3::splat(2.0));
    }

    #[test]
    fn local_matrix_is_cached_until_dirty() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_position(n[0], Vec3::X);
        let node = graph.get(n[0]).unwrap();
        assert!(node.dirty.get());
        let m = node.local_matrix();
        assert!(!node.dirty.get());
        assert_eq!(m.w_axis.truncate(), Vec3::X);
    }

    #[test]
    fn child_inherits_parent_chain() {
        let (mut graph, n) = graph_with(3);
        graph.link(n[1], n[0]);
        graph.link(n[2], n[1]);
        graph.set_local_position(n[0], Vec3::new(1.0, 0.0, 0.0));
        graph.set_local_position(n[1], Vec3::new(2.0, 0.0, 0.0));
        graph.set_local_position(n[2], Vec3::new(3.0, 0.0, 0.0));
        assert!(close(graph.position(n[2]), Vec3::new(6.0, 0.0, 0.0)));

        graph.set_local_rotation(n[0], Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        assert!(close(graph.position(n[2]), Vec3::new(1.0, 5.0, 0.0)));
        let m = graph.local_to_world_matrix(n[2]);
        assert!(close(m.transform_point3(Vec3::ZERO), graph.position(n[2])));
    }

    #[test]
    fn world_setters_round_trip_through_parent() {
        let (mut graph, n) = graph_with(2);
        graph.link(n[1], n[0]);
        graph.set_local_position(n[0], Vec3::new(10.0, 0.0, 0.0));
        graph.set_local_rotation(n[0], Quat::from_rotation_y(0.7));
        graph.set_local_scale(n[0], Vec3::new(2.0, 3.0, 4.0));

        graph.set_position(n[1], Vec3::new(5.0, 1.0, -2.0));
        assert!(close(graph.position(n[1]), Vec3::new(5.0, 1.0, -2.0)));

        let target = Quat::from_rotation_x(0.3);
        graph.set_rotation(n[1], target);
        assert!(graph.rotation(n[1]).dot(target).abs() > 0.9999);

        graph.set_lossy_scale(n[1], Vec3::splat(1.0));
        assert!(close(graph.lossy_scale(n[1]), Vec3::ONE));
    }

    #[test]
    fn collapsed_parent_scale_clamps_axis() {
        let (mut graph, n) = graph_with(2);
        graph.link(n[1], n[0]);
        graph.set_local_scale(n[0], Vec3::new(1.0, 0.0, 1.0));
        graph.translate(n[1], Vec3::new(1.0, 1.0, 1.0), false);
        let local = graph.local_position(n[1]).unwrap();
        assert_eq!(local, Vec3::new(1.0, 0.0, 1.0));
        assert!(local.is_finite());

        graph.set_lossy_scale(n[1], Vec3::splat(2.0));
        assert!(graph.local_scale(n[1]).unwrap().is_finite());
    }

    #[test]
    fn translate_self_space_follows_own_axes() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_euler_angles(n[0], Vec3::new(0.0, 90.0, 0.0));
        graph.translate(n[0], Vec3::NEG_Z, true);
        assert!(close(graph.position(n[0]), Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn euler_and_quaternion_stay_in_sync() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_rotation(n[0], Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        assert!(close(graph.local_euler_angles(n[0]).unwrap(), Vec3::new(0.0, 90.0, 0.0)));

        graph.set_local_euler_axis(n[0], 0, 30.0);
        let q = graph.local_rotation(n[0]).unwrap();
        assert!(q.dot(euler_to_quat(Vec3::new(30.0, 90.0, 0.0))).abs() > 0.9999);
    }

    #[test]
    fn rotate_world_vs_self() {
        let (mut graph, n) = graph_with(2);
        graph.link(n[1], n[0]);
        graph.set_local_rotation(n[0], Quat::from_rotation_y(1.0));
        let before = graph.rotation(n[1]);
        let q = Quat::from_rotation_x(0.5);

        graph.rotate(n[1], q, false);
        assert!(graph.rotation(n[1]).dot(q * before).abs() > 0.9999);

        graph.set_local_rotation(n[1], Quat::IDENTITY);
        graph.rotate(n[1], q, true);
        assert!(graph.local_rotation(n[1]).unwrap().dot(q).abs() > 0.9999);
    }

    #[test]
    fn rotate_around_orbits_point() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_position(n[0], Vec3::new(1.0, 0.0, 0.0));
        graph.rotate_around(n[0], Vec3::ZERO, Vec3::Y, 90.0);
        assert!(close(graph.position(n[0]), Vec3::new(0.0, 0.0, -1.0)));
        assert!(close(graph.right(n[0]), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_position(n[0], Vec3::new(0.0, 5.0, 10.0));
        graph.look_at(n[0], Vec3::ZERO, Vec3::Y);
        let expected = (Vec3::ZERO - Vec3::new(0.0, 5.0, 10.0)).normalize();
        assert!(close(graph.forward(n[0]), expected));
    }

    #[test]
    fn point_and_direction_transforms_invert() {
        let (mut graph, n) = graph_with(1);
        graph.set_local_trs(
            n[0],
            Trs {
                translation: Vec3::new(3.0, -1.0, 2.0),
                rotation: Quat::from_rotation_z(0.4),
                scale: Vec3::splat(2.0),
            },
        );
        let p = Vec3::new(0.5, 1.5, -2.0);
        let world = graph.transform_point(n[0], p);
        assert!(close(graph.inverse_transform_point(n[0], world), p));
        let d = graph.transform_direction(n[0], Vec3::X);
        assert!(close(graph.inverse_transform_direction(n[0], d), Vec3::X));
        assert!((d.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn local_from_world_preserves_pose() {
        let (mut graph, n) = graph_with(2);
        graph.set_local_position(n[0], Vec3::new(2.0, 0.0, 0.0));
        graph.set_local_scale(n[0], Vec3::splat(0.5));
        let world = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let local = graph.local_from_world(Some(n[0]), world);
        assert!(close(local.translation, Vec3::new(6.0, 0.0, 0.0)));
        assert!(close(local.scale, Vec3::splat(2.0)));
    }
}
