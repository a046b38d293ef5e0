//! # Dreki Core — Entity/Component Object Model and Scene Graph
//!
//! Stable instance identities, dynamically attached components, a parent/child
//! transform hierarchy with world-pose-preserving reparenting, and
//! active-state propagation with pruned notifications.
//!
//! Start with `use dreki_core::prelude::*` and a [`World`](ecs::World):
//!
//! ```ignore
//! let mut world = World::builder().register::<Spin>().build();
//! let root = world.create_entity("Root");
//! let arm = world.create_child(root, "Arm").unwrap();
//! world.add_component::<Spin>(arm);
//! world.transform_mut(arm).unwrap().set_position(Vec3::new(5.0, 0.0, 0.0));
//! world.frame_update(1.0 / 60.0);
//! ```

pub mod config;
pub mod ecs;
pub mod error;
pub mod logging;
pub mod math;
pub mod persist;
pub mod prelude;
