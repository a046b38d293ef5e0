//! Convenience re-exports — `use dreki_core::prelude::*` for the common items.

pub use crate::config::CoreConfig;
pub use crate::ecs::{
    AnyComponentRef, Behaviour, CollisionListener, Component, ComponentContext, ComponentRef,
    Entity, EntityMut, InstanceId, ObjectStore, SceneId, Transform, TransformMut, World,
};
pub use crate::error::CoreError;
pub use crate::math::{EulerRot, Mat4, Quat, Trs, Vec3};
pub use crate::persist::{EntityData, SceneData};
