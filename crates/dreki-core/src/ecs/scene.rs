//! Scenes: named groups of root entities.
//!
//! Each entity belongs to exactly one scene. Only parentless entities are
//! listed in a scene's root set; children inherit the scene of their parent.
//! A scene's `active` flag gates enable/disable notifications for its
//! entities.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::entity::Entity;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(u32);

impl fmt::Debug for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scene({})", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    id: SceneId,
    name: String,
    active: bool,
    roots: Vec<Entity>,
}

impl Scene {
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether enable/disable notifications are delivered for this scene.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Parentless entities, in the order they joined.
    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }
}

/// All scenes of a world plus the one new entities join.
#[derive(Debug)]
pub struct SceneSet {
    scenes: IndexMap<SceneId, Scene>,
    next: u32,
    current: SceneId,
}

impl SceneSet {
    /// A set holding one active scene called `default_name`.
    pub fn new(default_name: &str) -> Self {
        let mut set = Self {
            scenes: IndexMap::new(),
            next: 0,
            current: SceneId(0),
        };
        set.current = set.create(default_name);
        set
    }

    pub fn create(&mut self, name: &str) -> SceneId {
        let id = SceneId(self.next);
        self.next += 1;
        self.scenes.insert(
            id,
            Scene {
                id,
                name: name.to_string(),
                active: true,
                roots: Vec::new(),
            },
        );
        log::debug!("created scene `{name}` as {id:?}");
        id
    }

    pub fn get(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<SceneId> {
        self.scenes.values().find(|s| s.name == name).map(|s| s.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// The scene new entities are created in.
    pub fn current(&self) -> SceneId {
        self.current
    }

    pub fn set_current(&mut self, id: SceneId) -> bool {
        if !self.scenes.contains_key(&id) {
            return false;
        }
        self.current = id;
        true
    }

    /// Notification gate of `id`. Unknown scenes count as inactive.
    pub fn is_active(&self, id: SceneId) -> bool {
        self.scenes.get(&id).is_some_and(|s| s.active)
    }

    pub fn set_active(&mut self, id: SceneId, active: bool) -> bool {
        match self.scenes.get_mut(&id) {
            Some(scene) => {
                scene.active = active;
                true
            }
            None => false,
        }
    }

    pub(crate) fn add_root(&mut self, id: SceneId, entity: Entity) {
        if let Some(scene) = self.scenes.get_mut(&id) {
            if !scene.roots.contains(&entity) {
                scene.roots.push(entity);
            }
        }
    }

    pub(crate) fn remove_root(&mut self, id: SceneId, entity: Entity) {
        if let Some(scene) = self.scenes.get_mut(&id) {
            scene.roots.retain(|&e| e != entity);
        }
    }

    /// Remove a scene. If it was current, the first remaining scene becomes
    /// current; when none remain a fresh scene named `fallback` is created.
    pub(crate) fn remove(&mut self, id: SceneId, fallback: &str) -> Option<Scene> {
        let scene = self.scenes.shift_remove(&id)?;
        if self.current == id {
            self.current = match self.scenes.keys().next() {
                Some(&first) => first,
                None => self.create(fallback),
            };
        }
        Some(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::identity::InstanceId;

    #[test]
    fn default_scene_is_current_and_active() {
        let set = SceneSet::new("Main");
        let main = set.current();
        assert_eq!(set.get(main).unwrap().name(), "Main");
        assert!(set.is_active(main));
        assert_eq!(set.by_name("Main"), Some(main));
    }

    #[test]
    fn roots_are_unique() {
        let mut set = SceneSet::new("Main");
        let main = set.current();
        let e = Entity::from_id(InstanceId::from_raw(1));
        set.add_root(main, e);
        set.add_root(main, e);
        assert_eq!(set.get(main).unwrap().roots(), &[e]);
        set.remove_root(main, e);
        assert!(set.get(main).unwrap().roots().is_empty());
    }

    #[test]
    fn removing_current_scene_picks_another() {
        let mut set = SceneSet::new("Main");
        let main = set.current();
        let level = set.create("Level");
        set.remove(main, "Main").unwrap();
        assert_eq!(set.current(), level);

        set.remove(level, "Fallback").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(set.current()).unwrap().name(), "Fallback");
        assert!(!set.set_current(level));
    }
}
