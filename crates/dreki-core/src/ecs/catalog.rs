//! # Component Catalog
//!
//! Every component type a [`World`](super::World) can attach is listed once,
//! up front, in a [`CatalogBuilder`]. The finished [`ComponentCatalog`] is
//! immutable and shared by the whole store.
//!
//! Each registered type gets three names:
//!
//! - a [`ComponentKind`], a dense index used for every runtime lookup,
//! - a [`TypeKey`], a stable hash of the type name,
//! - the name itself, used only for persistence and diagnostics.
//!
//! ```ignore
//! let catalog = CatalogBuilder::new()
//!     .register::<Spin>()
//!     .register_persistent::<Health>()
//!     .build();
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::component::{Component, ComponentCell, downcast_mut, downcast_ref};
use super::transform::Transform;

/// Dense per-catalog index of a component type. [`Transform`] is always 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(u16);

impl ComponentKind {
    pub const TRANSFORM: Self = Self(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({})", self.0)
    }
}

/// Stable 64-bit FNV-1a hash of a component type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeKey(u64);

impl TypeKey {
    pub const fn of_name(name: &str) -> Self {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        let bytes = name.as_bytes();
        let mut hash = OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(PRIME);
            i += 1;
        }
        Self(hash)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

type ConstructFn = fn() -> ComponentCell;
type SaveFn = fn(&dyn Component) -> Option<Value>;
type LoadFn = fn(&mut dyn Component, Value) -> Result<(), serde_json::Error>;

/// Everything the store needs to know about one component type.
pub struct ComponentDescriptor {
    kind: ComponentKind,
    name: String,
    type_key: TypeKey,
    type_id: TypeId,
    construct: ConstructFn,
    save: Option<SaveFn>,
    load: Option<LoadFn>,
}

impl ComponentDescriptor {
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// `true` if the type's state is written out when saving.
    pub fn is_persistent(&self) -> bool {
        self.save.is_some()
    }

    pub(crate) fn construct(&self) -> ComponentCell {
        (self.construct)()
    }

    pub(crate) fn save(&self, component: &dyn Component) -> Option<Value> {
        self.save.and_then(|save| save(component))
    }

    /// Overwrite `component` with `data`. Types registered without
    /// persistence ignore the data.
    pub(crate) fn load(
        &self,
        component: &mut dyn Component,
        data: Value,
    ) -> Result<(), serde_json::Error> {
        match self.load {
            Some(load) => load(component, data),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("type_key", &self.type_key)
            .field("persistent", &self.is_persistent())
            .finish()
    }
}

fn construct<T: Component + Default>() -> ComponentCell {
    Arc::new(Mutex::new(T::default()))
}

fn save_json<T: Component + Serialize>(component: &dyn Component) -> Option<Value> {
    let value = downcast_ref::<T>(component)?;
    match serde_json::to_value(value) {
        Ok(json) => Some(json),
        Err(e) => {
            log::warn!("failed to save `{}`: {e}", std::any::type_name::<T>());
            None
        }
    }
}

fn load_json<T: Component + DeserializeOwned>(
    component: &mut dyn Component,
    data: Value,
) -> Result<(), serde_json::Error> {
    let loaded: T = serde_json::from_value(data)?;
    if let Some(slot) = downcast_mut::<T>(component) {
        *slot = loaded;
    }
    Ok(())
}

/// Extract the short type name from a full path
/// (e.g. `"my_game::combat::Health"` → `"Health"`).
fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let prefix = full.split('<').next().unwrap_or(full);
    prefix.rsplit("::").next().unwrap_or(prefix).to_string()
}

// ── Catalog ──────────────────────────────────────────────────────────

/// Immutable table of registered component types.
pub struct ComponentCatalog {
    descriptors: Vec<ComponentDescriptor>,
    by_type: HashMap<TypeId, ComponentKind>,
    by_name: HashMap<String, ComponentKind>,
    by_key: HashMap<TypeKey, ComponentKind>,
}

impl ComponentCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn kind_of<T: Component>(&self) -> Option<ComponentKind> {
        self.kind_of_type(TypeId::of::<T>())
    }

    pub fn kind_of_type(&self, type_id: TypeId) -> Option<ComponentKind> {
        self.by_type.get(&type_id).copied()
    }

    pub fn kind_by_name(&self, name: &str) -> Option<ComponentKind> {
        self.by_name.get(name).copied()
    }

    pub fn kind_by_key(&self, key: TypeKey) -> Option<ComponentKind> {
        self.by_key.get(&key).copied()
    }

    pub fn descriptor(&self, kind: ComponentKind) -> Option<&ComponentDescriptor> {
        self.descriptors.get(kind.index())
    }

    pub fn name(&self, kind: ComponentKind) -> Option<&str> {
        self.descriptor(kind).map(ComponentDescriptor::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for ComponentCatalog {
    fn default() -> Self {
        CatalogBuilder::new().build()
    }
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors.iter()).finish()
    }
}

/// Collects component registrations. [`Transform`] is registered up front.
pub struct CatalogBuilder {
    catalog: ComponentCatalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        let builder = Self {
            catalog: ComponentCatalog {
                descriptors: Vec::new(),
                by_type: HashMap::new(),
                by_name: HashMap::new(),
                by_key: HashMap::new(),
            },
        };
        builder.register::<Transform>()
    }

    /// Register `T` under its short type name.
    pub fn register<T: Component + Default>(self) -> Self {
        let name = short_type_name::<T>();
        self.insert::<T>(name, None, None)
    }

    /// Register `T` under an explicit name.
    pub fn register_named<T: Component + Default>(self, name: impl Into<String>) -> Self {
        self.insert::<T>(name.into(), None, None)
    }

    /// Register `T` with JSON save/load support.
    pub fn register_persistent<T>(self) -> Self
    where
        T: Component + Default + Serialize + DeserializeOwned,
    {
        let name = short_type_name::<T>();
        self.insert::<T>(name, Some(save_json::<T>), Some(load_json::<T>))
    }

    fn insert<T: Component + Default>(
        mut self,
        name: String,
        save: Option<SaveFn>,
        load: Option<LoadFn>,
    ) -> Self {
        let catalog = &mut self.catalog;
        let type_id = TypeId::of::<T>();
        if catalog.by_type.contains_key(&type_id) {
            log::warn!("component `{name}` registered twice; keeping the first registration");
            return self;
        }
        let type_key = TypeKey::of_name(&name);
        if catalog.by_name.contains_key(&name) || catalog.by_key.contains_key(&type_key) {
            log::error!("component name `{name}` collides with an existing registration");
            return self;
        }
        let Ok(raw) = u16::try_from(catalog.descriptors.len()) else {
            log::error!("component catalog is full; `{name}` not registered");
            return self;
        };

        let kind = ComponentKind(raw);
        log::debug!("registered component `{name}` as {kind:?}");
        catalog.by_type.insert(type_id, kind);
        catalog.by_name.insert(name.clone(), kind);
        catalog.by_key.insert(type_key, kind);
        catalog.descriptors.push(ComponentDescriptor {
            kind,
            name,
            type_key,
            type_id,
            construct: construct::<T>,
            save,
            load,
        });
        self
    }

    pub fn build(self) -> ComponentCatalog {
        self.catalog
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}
