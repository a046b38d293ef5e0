//! Error type shared by the object model.
//!
//! Most operations in this crate report failures through logging plus a
//! sentinel return (`None`, `false`). Internally they build a [`CoreError`]
//! and call [`CoreError::report`], which picks the log level from the error
//! class. Parsing entry points (config, persisted scenes) return the error.

use thiserror::Error;

use crate::ecs::Entity;
use crate::ecs::identity::InstanceId;
use crate::ecs::scene::SceneId;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Not found ────────────────────────────────────────────────────
    #[error("component type `{0}` is not registered in the catalog")]
    UnregisteredComponent(String),

    #[error("{0:?} is not a live instance")]
    UnknownInstance(InstanceId),

    #[error("{0:?} is not a live entity")]
    UnknownEntity(Entity),

    #[error("child index {index} is out of range for {entity:?} ({count} children)")]
    ChildIndex {
        entity: Entity,
        index: usize,
        count: usize,
    },

    #[error("scene {0:?} does not exist")]
    UnknownScene(SceneId),

    // ── Invariant violations ─────────────────────────────────────────
    #[error("{0:?} is already registered")]
    AlreadyRegistered(InstanceId),

    #[error("the Transform of {0:?} cannot be removed on its own")]
    TransformRemoval(Entity),

    #[error("cannot parent {child:?} under {parent:?}: it is the node itself or one of its descendants")]
    HierarchyCycle { child: Entity, parent: Entity },

    // ── Exhaustion ───────────────────────────────────────────────────
    #[error("every instance id is in use")]
    IdentitiesExhausted,

    // ── Serialization ────────────────────────────────────────────────
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// `true` for errors that indicate a broken invariant rather than a
    /// missing object.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRegistered(_) | Self::TransformRemoval(_) | Self::HierarchyCycle { .. }
        )
    }

    /// Log the error at the level matching its class.
    pub fn report(&self) {
        if self.is_invariant_violation() || matches!(self, Self::IdentitiesExhausted) {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        let id = InstanceId::from_raw(3);
        assert!(CoreError::AlreadyRegistered(id).is_invariant_violation());
        assert!(!CoreError::UnknownInstance(id).is_invariant_violation());
        assert!(!CoreError::UnregisteredComponent("Foo".into()).is_invariant_violation());
    }

    #[test]
    fn messages_name_the_offender() {
        let msg = CoreError::UnregisteredComponent("Health".into()).to_string();
        assert!(msg.contains("Health"));
    }
}
