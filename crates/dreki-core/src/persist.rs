//! # Persistence — Save and Load Entity Subtrees as JSON
//!
//! An entity saves as its name, tag, layer, self-active flag, local
//! transform, its non-Transform components keyed by catalog name, and its
//! children, recursively:
//!
//! ```json
//! {
//!   "name": "Ship",
//!   "tag": "Player",
//!   "layer": 0,
//!   "active": true,
//!   "transform": { "position": [0, 0, 0], "rotation": [0, 0, 0, 1], "scale": [1, 1, 1] },
//!   "components": [ { "type_name": "Health", "data": { "hp": 3 } } ],
//!   "children": []
//! }
//! ```
//!
//! Components registered with
//! [`register_persistent`](crate::ecs::CatalogBuilder::register_persistent)
//! carry their state in `data`; others are written with `null` data and come
//! back default-constructed.
//!
//! Loading rebuilds each entity in this order: identity, Transform and scene
//! membership, local transform, parent link, then components in saved order
//! (state applied before `on_create`), children, and finally the self-active
//! flag. Unknown component names are logged and skipped.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecs::{ComponentKind, Entity, SceneId, World};
use crate::error::CoreError;
use crate::math::{Quat, Trs, Vec3};

// ── Data (JSON wire format) ──────────────────────────────────────────

/// A saved scene: its name and root subtrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub name: String,
    pub roots: Vec<EntityData>,
}

/// A saved entity and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub name: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default)]
    pub layer: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityData>,
}

/// Local position, rotation and scale of a saved transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformData {
    fn default() -> Self {
        Trs::IDENTITY.into()
    }
}

impl From<Trs> for TransformData {
    fn from(trs: Trs) -> Self {
        Self {
            position: trs.translation,
            rotation: trs.rotation,
            scale: trs.scale,
        }
    }
}

impl From<TransformData> for Trs {
    fn from(data: TransformData) -> Self {
        Self {
            translation: data.position,
            rotation: data.rotation,
            scale: data.scale,
        }
    }
}

/// One attached component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    pub type_name: String,
    #[serde(default)]
    pub data: Value,
}

fn default_tag() -> String {
    crate::config::CoreConfig::default().default_tag
}

fn default_active() -> bool {
    true
}

// ── Save ─────────────────────────────────────────────────────────────

/// Save `entity` and its subtree. `None` if the entity isn't live.
pub fn save_entity(world: &World, entity: Entity) -> Option<EntityData> {
    let node = world.node_of(entity)?;
    let graph = world.graph();
    let store = world.store();

    let components = store
        .components(entity)
        .into_iter()
        .filter(|c| c.kind() != ComponentKind::TRANSFORM)
        .filter_map(|c| {
            let descriptor = store.catalog().descriptor(c.kind())?;
            let data = c.with_dyn(|component| descriptor.save(component))?;
            Some(ComponentData {
                type_name: descriptor.name().to_string(),
                data: data.unwrap_or(Value::Null),
            })
        })
        .collect();

    let children = graph
        .children(node)
        .iter()
        .filter_map(|&child| graph.owner(child))
        .filter_map(|child| save_entity(world, child))
        .collect();

    Some(EntityData {
        name: world.name(entity)?.to_string(),
        tag: world.tag(entity)?.to_string(),
        layer: world.layer(entity)?,
        active: world.is_active_self(entity),
        transform: graph.local_trs(node)?.into(),
        components,
        children,
    })
}

/// Save every root of a scene. `None` if the scene doesn't exist.
pub fn save_scene(world: &World, scene: SceneId) -> Option<SceneData> {
    let scene = world.scene(scene)?;
    Some(SceneData {
        name: scene.name().to_string(),
        roots: scene
            .roots()
            .iter()
            .filter_map(|&root| save_entity(world, root))
            .collect(),
    })
}

// ── Load ─────────────────────────────────────────────────────────────

/// Rebuild a saved subtree under `parent` (or as a root of the current
/// scene).
pub fn load_entity(world: &mut World, data: &EntityData, parent: Option<Entity>) -> Entity {
    let scene = parent
        .and_then(|p| world.scene_of(p))
        .unwrap_or_else(|| world.active_scene());
    load_into(world, data, parent, scene)
}

/// Rebuild a saved scene as a new scene. Returns its id.
pub fn load_scene(world: &mut World, data: &SceneData) -> SceneId {
    let scene = world.create_scene(&data.name);
    for root in &data.roots {
        load_into(world, root, None, scene);
    }
    log::debug!("loaded scene `{}` with {} roots", data.name, data.roots.len());
    scene
}

fn load_into(world: &mut World, data: &EntityData, parent: Option<Entity>, scene: SceneId) -> Entity {
    let entity = world.create_entity_in(data.name.clone(), scene);
    world.set_tag(entity, data.tag.clone());
    world.set_layer(entity, data.layer);
    if let Some(node) = world.node_of(entity) {
        world.graph.set_local_trs(node, data.transform.into());
    }
    if parent.is_some() {
        world.set_parent(entity, parent, false);
    }

    let store = Arc::clone(world.store());
    for saved in &data.components {
        let Some(kind) = store.catalog().kind_by_name(&saved.type_name) else {
            CoreError::UnregisteredComponent(saved.type_name.clone()).report();
            continue;
        };
        if kind == ComponentKind::TRANSFORM {
            continue;
        }
        let Some(descriptor) = store.catalog().descriptor(kind) else {
            continue;
        };
        let state = saved.data.clone();
        store.attach_with(entity, kind, |component| {
            if let Err(e) = descriptor.load(component, state) {
                log::warn!("failed to load `{}`: {e}", descriptor.name());
            }
        });
    }

    for child in &data.children {
        load_into(world, child, Some(entity), scene);
    }
    if !data.active {
        world.set_active(entity, false);
    }
    entity
}

// ── JSON / files ─────────────────────────────────────────────────────

pub fn to_json(data: &SceneData) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn from_json(json: &str) -> Result<SceneData, CoreError> {
    Ok(serde_json::from_str(json)?)
}

pub fn save_scene_to_file(
    world: &World,
    scene: SceneId,
    path: impl AsRef<Path>,
) -> Result<(), CoreError> {
    let data = save_scene(world, scene).ok_or(CoreError::UnknownScene(scene))?;
    std::fs::write(path, to_json(&data)?).map_err(serde_json::Error::io)?;
    Ok(())
}

pub fn load_scene_from_file(world: &mut World, path: impl AsRef<Path>) -> Result<SceneId, CoreError> {
    let json = std::fs::read_to_string(path).map_err(serde_json::Error::io)?;
    let data = from_json(&json)?;
    Ok(load_scene(world, &data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, ComponentContext};
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Health {
        hp: i32,
    }
    impl Component for Health {}

    #[derive(Default)]
    struct Marker;
    impl Component for Marker {}

    static SEEN_AT_CREATE: AtomicI32 = AtomicI32::new(0);

    /// Records its loaded value from `on_create`.
    #[derive(Default, Serialize, Deserialize)]
    struct Seed {
        value: i32,
    }
    impl Component for Seed {
        fn on_create(&mut self, _ctx: &ComponentContext<'_>) {
            SEEN_AT_CREATE.store(self.value, Ordering::SeqCst);
        }
    }

    fn world() -> World {
        World::builder()
            .register_persistent::<Health>()
            .register::<Marker>()
            .register_persistent::<Seed>()
            .build()
    }

    /// Root(Health 7, Marker) ─┬─ A (scaled, rotated) ── C
    ///                         └─ B (inactive)
    fn populate(world: &mut World) -> Entity {
        let root = world.create_entity("Root");
        world.set_tag(root, "Player");
        world.set_layer(root, 4);
        world.add_component::<Health>(root).unwrap().with_mut(|h| h.hp = 7);
        world.add_component::<Marker>(root).unwrap();
        let a = world.create_child(root, "A").unwrap();
        let b = world.create_child(root, "B").unwrap();
        let c = world.create_child(a, "C").unwrap();
        world
            .transform_mut(a)
            .unwrap()
            .set_local_position(Vec3::new(1.0, 2.0, 3.0))
            .set_local_rotation(Quat::from_rotation_y(0.5))
            .set_local_scale(Vec3::new(2.0, 1.0, 1.0));
        world.transform_mut(c).unwrap().set_local_position(Vec3::new(0.0, -1.0, 0.0));
        world.set_active(b, false);
        root
    }

    /// (name, local TRS, child count, component names) for every node.
    fn snapshot(world: &World, root: Entity) -> Vec<(String, Trs, usize, BTreeSet<String>)> {
        let graph = world.graph();
        graph
            .subtree(world.node_of(root).unwrap())
            .into_iter()
            .map(|node| {
                let entity = graph.owner(node).unwrap();
                let names = world
                    .components(entity)
                    .iter()
                    .filter_map(|c| world.store().catalog().name(c.kind()).map(str::to_string))
                    .collect();
                (
                    world.name(entity).unwrap().to_string(),
                    graph.local_trs(node).unwrap(),
                    graph.child_count(node),
                    names,
                )
            })
            .collect()
    }

    #[test]
    fn subtree_round_trips_through_json() {
        let mut source = world();
        let root = populate(&mut source);
        let scene = save_scene(&source, source.active_scene()).unwrap();
        let json = to_json(&scene).unwrap();

        let mut target = world();
        let loaded_scene = load_scene(&mut target, &from_json(&json).unwrap());
        let roots = target.scene_roots(loaded_scene);
        assert_eq!(roots.len(), 1);
        let loaded = roots[0];

        let before = snapshot(&source, root);
        let after = snapshot(&target, loaded);
        assert_eq!(before.len(), after.len());
        for ((name, trs, count, names), (name2, trs2, count2, names2)) in before.iter().zip(&after) {
            assert_eq!((name, count, names), (name2, count2, names2));
            assert!(trs.translation.abs_diff_eq(trs2.translation, 1e-6));
            assert!(trs.rotation.abs_diff_eq(trs2.rotation, 1e-6));
            assert!(trs.scale.abs_diff_eq(trs2.scale, 1e-6));
        }
        assert_eq!(target.tag(loaded), Some("Player"));
        assert_eq!(target.layer(loaded), Some(4));
        let hp = target.get_component::<Health>(loaded).unwrap().with(|h| h.hp);
        assert_eq!(hp, Some(7));

        let b = target.find(loaded, "B").unwrap();
        assert!(!target.is_active_self(b));
        let c = target.find(loaded, "C").unwrap();
        assert_eq!(target.scene_of(c), Some(loaded_scene));
    }

    #[test]
    fn non_persistent_components_save_as_null() {
        let mut world = world();
        let root = populate(&mut world);
        let data = save_entity(&world, root).unwrap();
        let names: Vec<_> = data.components.iter().map(|c| c.type_name.as_str()).collect();
        assert_eq!(names, ["Health", "Marker"]);
        assert_eq!(data.components[1].data, Value::Null);
        assert_eq!(data.children.len(), 2);
    }

    #[test]
    fn state_is_loaded_before_on_create() {
        let mut world = world();
        let data = EntityData {
            name: "Seeded".into(),
            tag: "Untagged".into(),
            layer: 0,
            active: true,
            transform: TransformData::default(),
            components: vec![ComponentData {
                type_name: "Seed".into(),
                data: serde_json::json!({ "value": 42 }),
            }],
            children: Vec::new(),
        };
        load_entity(&mut world, &data, None);
        assert_eq!(SEEN_AT_CREATE.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn unknown_components_are_skipped() {
        let mut world = world();
        let json = r#"{
            "name": "Loose",
            "components": [
                { "type_name": "Ghost", "data": {} },
                { "type_name": "Health", "data": { "hp": 3 } }
            ]
        }"#;
        let data: EntityData = serde_json::from_str(json).unwrap();
        let parent = world.create_entity("Parent");
        let e = load_entity(&mut world, &data, Some(parent));
        assert_eq!(world.parent(e), Some(parent));
        assert_eq!(world.components(e).len(), 2);
        assert_eq!(world.tag(e), Some("Untagged"));
        assert!(world.is_active_self(e));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(from_json("{"), Err(CoreError::Json(_))));
    }

    #[test]
    fn missing_scene_cannot_be_saved() {
        let mut world = world();
        let scene = world.create_scene("Gone");
        world.unload_scene(scene);
        assert!(save_scene(&world, scene).is_none());
    }
}
