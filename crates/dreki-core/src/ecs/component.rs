//! # Components — Lifecycle Hooks and Handles
//!
//! A component is any `Send + 'static` type implementing [`Component`]. Live
//! components are owned by the identity registry as
//! `Arc<Mutex<dyn Component>>`; everything else (attachment table, user code)
//! holds a [`ComponentRef`] or [`AnyComponentRef`], which wrap a `Weak` and
//! never keep a component alive.
//!
//! ## Hooks
//!
//! | Hook            | Called                                          |
//! |-----------------|-------------------------------------------------|
//! | `on_create`     | once, after the component is fully registered   |
//! | `on_destroy`    | once, after it has been removed from the store  |
//! | `on_enabled`    | when the owner's effective active state → true  |
//! | `on_disabled`   | when the owner's effective active state → false |
//!
//! Hooks run with no store lock held, so `on_create` may add further
//! components through its [`ComponentContext`]. A hook must not lock its own
//! component through a handle; the component is already borrowed mutably.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, Weak};

use super::catalog::ComponentKind;
use super::entity::Entity;
use super::identity::InstanceId;
use super::lock;
use super::store::ObjectStore;
use super::transform::Transform;

/// Shared storage for one live component.
pub type ComponentCell = Arc<Mutex<dyn Component>>;

/// Object-safe access to `Any` for trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A capability attached to exactly one entity.
pub trait Component: AsAny + Send + 'static {
    /// Called once after the component is registered and attached.
    fn on_create(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Called once after the component has been detached and unregistered.
    fn on_destroy(&mut self) {}

    /// Components that want enable/disable notifications return `Some(self)`.
    fn as_behaviour(&mut self) -> Option<&mut dyn Behaviour> {
        None
    }
}

/// Enable/disable notifications driven by the owner's active state.
pub trait Behaviour {
    fn on_enabled(&mut self) {}
    fn on_disabled(&mut self) {}

    /// Behaviour-level switch checked by
    /// [`World::is_active_and_enabled`](super::World::is_active_and_enabled).
    fn is_enabled(&self) -> bool {
        true
    }
}

pub(crate) fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

pub(crate) fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}

// ── Creation context ─────────────────────────────────────────────────

/// Passed to [`Component::on_create`].
pub struct ComponentContext<'a> {
    pub(crate) store: &'a ObjectStore,
    pub(crate) owner: Entity,
    pub(crate) id: InstanceId,
}

impl<'a> ComponentContext<'a> {
    /// The entity this component is attached to.
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// This component's own identity.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn store(&self) -> &'a ObjectStore {
        self.store
    }

    /// The owner's [`Transform`]. `None` only while the Transform itself is
    /// being created.
    pub fn transform(&self) -> Option<ComponentRef<Transform>> {
        self.store.get_component::<Transform>(self.owner)
    }

    /// Attach another component to the owner.
    pub fn add_component<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.store.add_component::<T>(self.owner)
    }
}

// ── Handles ──────────────────────────────────────────────────────────

/// Non-owning typed handle to a live component.
pub struct ComponentRef<T: Component> {
    id: InstanceId,
    cell: Weak<Mutex<dyn Component>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentRef<T> {
    pub(crate) fn new(id: InstanceId, cell: Weak<Mutex<dyn Component>>) -> Self {
        Self {
            id,
            cell,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// `false` once the component has been destroyed.
    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }

    /// Run `f` with shared access. `None` if the component is gone.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let cell = self.cell.upgrade()?;
        let guard = lock(&*cell);
        downcast_ref::<T>(&*guard).map(f)
    }

    /// Run `f` with exclusive access. `None` if the component is gone.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let cell = self.cell.upgrade()?;
        let mut guard = lock(&*cell);
        downcast_mut::<T>(&mut *guard).map(f)
    }

    /// Erase the type.
    pub fn untyped(&self, kind: ComponentKind) -> AnyComponentRef {
        AnyComponentRef {
            id: self.id,
            kind,
            type_id: TypeId::of::<T>(),
            cell: self.cell.clone(),
        }
    }
}

impl<T: Component> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        Self::new(self.id, self.cell.clone())
    }
}

impl<T: Component> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("type", &std::any::type_name::<T>())
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Non-owning untyped handle, as returned by
/// [`ObjectStore::components`](super::store::ObjectStore::components).
#[derive(Clone)]
pub struct AnyComponentRef {
    id: InstanceId,
    kind: ComponentKind,
    type_id: TypeId,
    cell: Weak<Mutex<dyn Component>>,
}

impl AnyComponentRef {
    pub(crate) fn new(
        id: InstanceId,
        kind: ComponentKind,
        type_id: TypeId,
        cell: Weak<Mutex<dyn Component>>,
    ) -> Self {
        Self {
            id,
            kind,
            type_id,
            cell,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn is_alive(&self) -> bool {
        self.cell.strong_count() > 0
    }

    pub fn is<T: Component>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Recover a typed handle. `None` if `T` is the wrong type.
    pub fn downcast<T: Component>(&self) -> Option<ComponentRef<T>> {
        self.is::<T>()
            .then(|| ComponentRef::new(self.id, self.cell.clone()))
    }

    /// Run `f` against the trait object.
    pub fn with_dyn<R>(&self, f: impl FnOnce(&dyn Component) -> R) -> Option<R> {
        let cell = self.cell.upgrade()?;
        let guard = lock(&*cell);
        Some(f(&*guard))
    }

    pub fn with_dyn_mut<R>(&self, f: impl FnOnce(&mut dyn Component) -> R) -> Option<R> {
        let cell = self.cell.upgrade()?;
        let mut guard = lock(&*cell);
        Some(f(&mut *guard))
    }
}

impl fmt::Debug for AnyComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyComponentRef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Health(i32);
    impl Component for Health {}

    #[derive(Default)]
    struct Armor;
    impl Component for Armor {}

    fn cell_of<T: Component>(value: T) -> ComponentCell {
        Arc::new(Mutex::new(value))
    }

    #[test]
    fn typed_handle_reads_and_writes() {
        let cell = cell_of(Health(10));
        let handle = ComponentRef::<Health>::new(InstanceId::from_raw(1), Arc::downgrade(&cell));
        handle.with_mut(|h| h.0 -= 3);
        assert_eq!(handle.with(|h| h.0), Some(7));
    }

    #[test]
    fn handle_dies_with_cell() {
        let cell = cell_of(Health(1));
        let handle = ComponentRef::<Health>::new(InstanceId::from_raw(1), Arc::downgrade(&cell));
        assert!(handle.is_alive());
        drop(cell);
        assert!(!handle.is_alive());
        assert_eq!(handle.with(|h| h.0), None);
    }

    #[test]
    fn downcast_checks_type() {
        let cell = cell_of(Health(5));
        let any = AnyComponentRef::new(
            InstanceId::from_raw(2),
            ComponentKind::TRANSFORM,
            TypeId::of::<Health>(),
            Arc::downgrade(&cell),
        );
        assert!(any.is::<Health>());
        assert!(any.downcast::<Armor>().is_none());
        let typed = any.downcast::<Health>().unwrap();
        assert_eq!(typed.with(|h| h.0), Some(5));
        assert_eq!(any.with_dyn(|c| downcast_ref::<Health>(c).is_some()), Some(true));
    }

    #[test]
    fn mismatched_handle_type_yields_none() {
        let cell = cell_of(Health(5));
        let wrong = ComponentRef::<Armor>::new(InstanceId::from_raw(3), Arc::downgrade(&cell));
        assert_eq!(wrong.with(|_| ()), None);
    }
}
