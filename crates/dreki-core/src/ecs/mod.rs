//! # Object Model — Entities, Components, and the Transform Graph
//!
//! ## Module Overview
//!
//! - [`identity`] — Instance ids, live-object ownership, deletion queue
//! - [`catalog`] — Registered component types and their kind tokens
//! - [`component`] — The `Component`/`Behaviour` traits and handles
//! - [`store`] — Thread-safe attachment table over catalog + registry
//! - [`hierarchy`] — Arena of transform nodes with parent/child links
//! - [`transform`] — The `Transform` component and spatial math
//! - [`activation`] — Self/hierarchy active flags and their cascade
//! - [`scene`] — Scenes and their root sets
//! - [`entity`] — Entity ids and borrowed facades
//! - [`world`] — Ties it all together

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod activation;
pub mod catalog;
pub mod component;
pub mod entity;
pub mod hierarchy;
pub mod identity;
pub mod scene;
pub mod store;
pub mod transform;
pub mod world;

pub use activation::{ActiveState, CollisionListener};
pub use catalog::{CatalogBuilder, ComponentCatalog, ComponentKind, TypeKey};
pub use component::{AnyComponentRef, Behaviour, Component, ComponentContext, ComponentRef};
pub use entity::{Entity, EntityMut, TransformMut};
pub use hierarchy::{NodeId, TransformGraph};
pub use identity::{IdentityRegistry, InstanceId, InstanceKind, InstanceRef};
pub use scene::{Scene, SceneId};
pub use store::ObjectStore;
pub use transform::Transform;
pub use world::{World, WorldBuilder};

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
