//! # Object Store — Catalog, Registry, and Attachment Table
//!
//! [`ObjectStore`] is the thread-safe half of a [`World`](super::World). It
//! is handed out as `Arc<ObjectStore>` so background work (an asset finishing
//! its load, say) can attach and detach components while the main thread
//! drives the frame.
//!
//! ## Attachment table
//!
//! ```text
//! attachments: HashMap<Entity, IndexMap<ComponentKind, Attached>>
//!                                 │
//!                                 └─ insertion order = attachment order
//! ```
//!
//! Entries hold `Weak` references; the registry holds the strong ones.
//! Entries whose component has died are pruned lazily by
//! [`components`](ObjectStore::components).
//!
//! ## Locking
//!
//! The table lock may be held while taking the registry lock, never the
//! other way round. Lifecycle hooks run after both are released. A new
//! component's own lock is taken before it becomes visible to other threads,
//! so nobody observes it before `on_create` has returned.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use indexmap::IndexMap;

use super::catalog::{ComponentCatalog, ComponentKind};
use super::component::{AnyComponentRef, Component, ComponentContext, ComponentRef};
use super::entity::Entity;
use super::identity::{
    ComponentRecord, IdentityRegistry, InstanceId, InstanceKind, InstanceRef, LiveObject,
};
use super::lock;
use crate::error::CoreError;

/// A table entry: the component's id and a non-owning reference to it.
struct Attached {
    id: InstanceId,
    type_id: TypeId,
    cell: Weak<Mutex<dyn Component>>,
}

impl Attached {
    fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }

    fn to_ref(&self, kind: ComponentKind) -> AnyComponentRef {
        AnyComponentRef::new(self.id, kind, self.type_id, self.cell.clone())
    }
}

type AttachmentTable = HashMap<Entity, IndexMap<ComponentKind, Attached>>;

pub struct ObjectStore {
    catalog: ComponentCatalog,
    registry: IdentityRegistry,
    attachments: Mutex<AttachmentTable>,
}

impl ObjectStore {
    pub fn new(catalog: ComponentCatalog) -> Self {
        Self {
            catalog,
            registry: IdentityRegistry::new(),
            attachments: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Non-owning reference to any live entity or component. A miss is
    /// logged.
    pub fn instance(&self, id: InstanceId) -> Option<InstanceRef> {
        let instance = self.registry.instance(id);
        if instance.is_none() {
            CoreError::UnknownInstance(id).report();
        }
        instance
    }

    /// `true` if `entity` has been registered and not yet released.
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.registry.kind(entity.id()) == Some(InstanceKind::Entity)
    }

    // ── Entity identities ────────────────────────────────────────────

    /// Allocate and register a new entity identity with an empty table.
    /// `None` once the id space is exhausted.
    pub(crate) fn register_entity(&self) -> Option<Entity> {
        let mut table = lock(&self.attachments);
        let entity = Entity::from_id(self.registry.allocate(LiveObject::Entity)?);
        table.insert(entity, IndexMap::new());
        Some(entity)
    }

    /// Drop the entity's table, destroy anything still attached, and return
    /// its id to the pool.
    pub(crate) fn release_entity(&self, entity: Entity) {
        let leftovers = lock(&self.attachments).remove(&entity);
        for attached in leftovers.into_iter().flat_map(IndexMap::into_values) {
            log::debug!("destroying late attachment {:?} of {entity:?}", attached.id);
            self.destroy_component(attached.id);
        }
        self.registry.unregister(entity.id());
    }

    // ── Attach ───────────────────────────────────────────────────────

    /// Attach a `T` to `owner`, or return the one already attached.
    ///
    /// `None` (with a log) if `T` isn't in the catalog or `owner` isn't live.
    pub fn add_component<T: Component>(&self, owner: Entity) -> Option<ComponentRef<T>> {
        let Some(kind) = self.catalog.kind_of::<T>() else {
            CoreError::UnregisteredComponent(std::any::type_name::<T>().to_string()).report();
            return None;
        };
        self.attach_with(owner, kind, |_| {})?.downcast::<T>()
    }

    /// Attach a component by its registered name.
    pub fn add_component_by_name(&self, owner: Entity, name: &str) -> Option<AnyComponentRef> {
        let Some(kind) = self.catalog.kind_by_name(name) else {
            CoreError::UnregisteredComponent(name.to_string()).report();
            return None;
        };
        self.attach_with(owner, kind, |_| {})
    }

    /// Attach a component of `kind`, running `init` on a newly constructed
    /// instance before its `on_create`. An existing live attachment is
    /// returned untouched and `init` is not called.
    pub(crate) fn attach_with(
        &self,
        owner: Entity,
        kind: ComponentKind,
        init: impl FnOnce(&mut dyn Component),
    ) -> Option<AnyComponentRef> {
        let descriptor = self.catalog.descriptor(kind)?;

        let cell = descriptor.construct();
        let mut component = lock(&*cell);
        let id = {
            let mut table = lock(&self.attachments);
            let Some(entry) = table.get_mut(&owner) else {
                CoreError::UnknownEntity(owner).report();
                return None;
            };
            if let Some(existing) = entry.get(&kind).filter(|a| a.is_alive()) {
                return Some(existing.to_ref(kind));
            }

            let id = self.registry.allocate(LiveObject::Component(ComponentRecord {
                kind,
                type_id: descriptor.type_id(),
                owner,
                cell: Arc::clone(&cell),
            }))?;
            // A dead entry keeps its slot otherwise; move the new one to the end.
            entry.shift_remove(&kind);
            entry.insert(
                kind,
                Attached {
                    id,
                    type_id: descriptor.type_id(),
                    cell: Arc::downgrade(&cell),
                },
            );
            id
        };

        log::debug!("attached `{}` {id:?} to {owner:?}", descriptor.name());
        init(&mut *component);
        let ctx = ComponentContext {
            store: self,
            owner,
            id,
        };
        component.on_create(&ctx);
        drop(component);

        Some(AnyComponentRef::new(
            id,
            kind,
            descriptor.type_id(),
            Arc::downgrade(&cell),
        ))
    }

    // ── Detach ───────────────────────────────────────────────────────

    /// Detach and destroy `owner`'s `T`. Returns `false` if nothing was
    /// attached or `T` is [`Transform`](super::Transform).
    pub fn remove_component<T: Component>(&self, owner: Entity) -> bool {
        match self.catalog.kind_of::<T>() {
            Some(kind) => self.remove_kind(owner, kind),
            None => {
                CoreError::UnregisteredComponent(std::any::type_name::<T>().to_string()).report();
                false
            }
        }
    }

    pub fn remove_component_by_name(&self, owner: Entity, name: &str) -> bool {
        match self.catalog.kind_by_name(name) {
            Some(kind) => self.remove_kind(owner, kind),
            None => {
                CoreError::UnregisteredComponent(name.to_string()).report();
                false
            }
        }
    }

    pub fn remove_kind(&self, owner: Entity, kind: ComponentKind) -> bool {
        if kind == ComponentKind::TRANSFORM {
            CoreError::TransformRemoval(owner).report();
            return false;
        }
        let removed = lock(&self.attachments)
            .get_mut(&owner)
            .and_then(|entry| entry.shift_remove(&kind));
        match removed {
            Some(attached) => {
                self.destroy_component(attached.id);
                true
            }
            None => false,
        }
    }

    /// Unregister a component, drop its table entry, and run `on_destroy`.
    /// Returns `false` if `id` isn't a live component.
    pub(crate) fn destroy_component(&self, id: InstanceId) -> bool {
        if !matches!(self.registry.kind(id), Some(InstanceKind::Component(_))) {
            return false;
        }
        let Some(LiveObject::Component(record)) = self.registry.unregister(id) else {
            return false;
        };
        if let Some(entry) = lock(&self.attachments).get_mut(&record.owner) {
            if entry.get(&record.kind).is_some_and(|a| a.id == id) {
                entry.shift_remove(&record.kind);
            }
        }
        log::debug!("destroying component {id:?} of {:?}", record.owner);
        lock(&*record.cell).on_destroy();
        true
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn has_component<T: Component>(&self, owner: Entity) -> bool {
        self.catalog
            .kind_of::<T>()
            .is_some_and(|kind| self.has_kind(owner, kind))
    }

    pub fn has_kind(&self, owner: Entity, kind: ComponentKind) -> bool {
        lock(&self.attachments)
            .get(&owner)
            .and_then(|entry| entry.get(&kind))
            .is_some_and(Attached::is_alive)
    }

    pub fn get_component<T: Component>(&self, owner: Entity) -> Option<ComponentRef<T>> {
        let kind = self.catalog.kind_of::<T>()?;
        self.get_kind(owner, kind)?.downcast::<T>()
    }

    pub fn get_kind(&self, owner: Entity, kind: ComponentKind) -> Option<AnyComponentRef> {
        lock(&self.attachments)
            .get(&owner)?
            .get(&kind)
            .filter(|a| a.is_alive())
            .map(|a| a.to_ref(kind))
    }

    pub fn get_component_by_name(&self, owner: Entity, name: &str) -> Option<AnyComponentRef> {
        let kind = self.catalog.kind_by_name(name)?;
        self.get_kind(owner, kind)
    }

    /// Snapshot of `owner`'s components in attachment order. Dead entries
    /// are pruned from the table on the way.
    pub fn components(&self, owner: Entity) -> Vec<AnyComponentRef> {
        let mut table = lock(&self.attachments);
        let Some(entry) = table.get_mut(&owner) else {
            return Vec::new();
        };
        entry.retain(|_, attached| attached.is_alive());
        entry
            .iter()
            .map(|(kind, attached)| attached.to_ref(*kind))
            .collect()
    }

    /// The entity a component is attached to.
    pub fn owner_of(&self, component: InstanceId) -> Option<Entity> {
        self.registry.owner_of(component)
    }

    /// Number of entities with an attachment table.
    pub fn entity_count(&self) -> usize {
        lock(&self.attachments).len()
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("component_types", &self.catalog.len())
            .field("entities", &self.entity_count())
            .field("live", &self.registry.live_count())
            .finish()
    }
}
