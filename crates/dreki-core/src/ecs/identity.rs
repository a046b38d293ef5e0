//! # Identity Registry — Ids, Live Objects, and Delayed Destruction
//!
//! Every entity and every component is named by an [`InstanceId`]. The
//! registry hands ids out, owns each live component by strong reference, and
//! keeps a deletion queue that the world drains once per frame.
//!
//! ## Recycling
//!
//! ```text
//! next:  6            ← next fresh id (0 is reserved as INVALID)
//! free:  [2, 4]       ← ids whose objects were fully destroyed
//! live:  {1, 3, 5}
//! ```
//!
//! Allocation pops from `free` first, otherwise takes `next`. An id only goes
//! back onto `free` after its object has been removed from `live`, so at most
//! one live object holds a given id at any time. Releasing an id also drops
//! any deletion-queue entries still aimed at it, so a recycled id can't be
//! hit by a destroy that was scheduled for its previous owner.
//!
//! While a [`ReleaseHold`] is alive, released ids are parked instead of going
//! back onto `free`. The world holds one while it works through a batch of
//! due destroys, so an id freed early in the batch can't be handed to a new
//! object and then hit by a later entry of the same batch.
//!
//! ## Locking
//!
//! All state sits behind one `Mutex`. Callers never run lifecycle hooks while
//! holding it: [`IdentityRegistry::unregister`] hands the removed object back
//! and the caller invokes `on_destroy` afterwards.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::catalog::ComponentKind;
use super::component::{AnyComponentRef, ComponentCell};
use super::entity::Entity;
use super::lock;
use crate::error::CoreError;

/// A process-unique identity for an entity or component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(u32);

impl InstanceId {
    /// Reserved value never handed out by the registry.
    pub const INVALID: Self = Self(0);

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a live identity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Entity,
    Component(ComponentKind),
}

/// Non-owning view of a live object, returned by [`IdentityRegistry::instance`].
#[derive(Clone)]
pub enum InstanceRef {
    Entity(Entity),
    Component(AnyComponentRef),
}

/// A registered component: its kind, owner, and the strong reference that
/// keeps it alive.
pub(crate) struct ComponentRecord {
    pub kind: ComponentKind,
    pub type_id: TypeId,
    pub owner: Entity,
    pub cell: ComponentCell,
}

/// An object held by the registry.
pub(crate) enum LiveObject {
    /// Entity state lives in the [`World`](super::World); the registry only
    /// tracks that the id is taken.
    Entity,
    Component(ComponentRecord),
}

impl LiveObject {
    fn kind(&self) -> InstanceKind {
        match self {
            Self::Entity => InstanceKind::Entity,
            Self::Component(record) => InstanceKind::Component(record.kind),
        }
    }
}

/// A scheduled destruction: `remaining` seconds until `id` is destroyed.
#[derive(Debug, Clone, Copy)]
struct PendingDestroy {
    remaining: f32,
    id: InstanceId,
}

/// Snapshot of the identity pool (diagnostics only).
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub live: usize,
    pub free: usize,
    pub held: usize,
    pub pending: usize,
    pub next_fresh: u32,
}

struct RegistryState {
    next: u32,
    free: Vec<u32>,
    live: HashMap<InstanceId, LiveObject>,
    pending: Vec<PendingDestroy>,
    holds: usize,
    held: Vec<u32>,
}

/// Allocates identities, owns live objects, and runs the deletion queue.
pub struct IdentityRegistry {
    state: Mutex<RegistryState>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next: InstanceId::INVALID.0 + 1,
                free: Vec::new(),
                live: HashMap::new(),
                pending: Vec::new(),
                holds: 0,
                held: Vec::new(),
            }),
        }
    }

    /// Allocate an identity. Reuses a freed id if one is available; never
    /// returns [`InstanceId::INVALID`]. `None` (with a log) once every id is
    /// in use.
    pub fn attach_id(&self) -> Option<InstanceId> {
        let mut state = lock(&self.state);
        if let Some(raw) = state.free.pop() {
            return Some(InstanceId(raw));
        }
        let raw = state.next;
        let Some(next) = raw.checked_add(1) else {
            drop(state);
            CoreError::IdentitiesExhausted.report();
            return None;
        };
        state.next = next;
        Some(InstanceId(raw))
    }

    /// Allocate an id and register `object` under it. The id comes straight
    /// from the pool, so registration cannot collide.
    pub(crate) fn allocate(&self, object: LiveObject) -> Option<InstanceId> {
        let id = self.attach_id()?;
        if let Err(e) = self.register(id, object) {
            e.report();
            return None;
        }
        Some(id)
    }

    /// Store `object` under `id`. Rejects ids that are already live.
    pub(crate) fn register(&self, id: InstanceId, object: LiveObject) -> Result<(), CoreError> {
        let mut state = lock(&self.state);
        if !id.is_valid() || state.live.contains_key(&id) {
            return Err(CoreError::AlreadyRegistered(id));
        }
        state.live.insert(id, object);
        Ok(())
    }

    /// Remove `id` from the live map, purge its queue entries, and return the
    /// id to the pool. Returns the removed object so the caller can run its
    /// destruction hook outside the lock. `None` if `id` wasn't live.
    pub(crate) fn unregister(&self, id: InstanceId) -> Option<LiveObject> {
        let mut state = lock(&self.state);
        let object = state.live.remove(&id)?;
        state.pending.retain(|p| p.id != id);
        if state.holds > 0 {
            state.held.push(id.0);
        } else {
            state.free.push(id.0);
        }
        Some(object)
    }

    /// Park released ids until the returned guard is dropped. Holds nest.
    pub fn hold_released(&self) -> ReleaseHold<'_> {
        lock(&self.state).holds += 1;
        ReleaseHold { registry: self }
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        lock(&self.state).live.contains_key(&id)
    }

    /// Kind of the live object behind `id`, if any.
    pub fn kind(&self, id: InstanceId) -> Option<InstanceKind> {
        lock(&self.state).live.get(&id).map(LiveObject::kind)
    }

    /// Non-owning reference to the live object behind `id`.
    pub fn instance(&self, id: InstanceId) -> Option<InstanceRef> {
        let state = lock(&self.state);
        match state.live.get(&id)? {
            LiveObject::Entity => Some(InstanceRef::Entity(Entity::from_id(id))),
            LiveObject::Component(record) => Some(InstanceRef::Component(
                AnyComponentRef::new(id, record.kind, record.type_id, Arc::downgrade(&record.cell)),
            )),
        }
    }

    /// Owning entity of a live component.
    pub fn owner_of(&self, id: InstanceId) -> Option<Entity> {
        match lock(&self.state).live.get(&id)? {
            LiveObject::Component(record) => Some(record.owner),
            LiveObject::Entity => None,
        }
    }

    /// Number of live objects (entities and components).
    pub fn live_count(&self) -> usize {
        lock(&self.state).live.len()
    }

    // ── Deletion queue ───────────────────────────────────────────────

    /// Queue `id` for destruction after `delay` seconds.
    pub fn schedule(&self, id: InstanceId, delay: f32) {
        let mut state = lock(&self.state);
        if !state.live.contains_key(&id) {
            log::debug!("ignoring delayed destroy of {id:?}: not live");
            return;
        }
        state.pending.push(PendingDestroy {
            remaining: delay.max(0.0),
            id,
        });
    }

    /// Advance the queue by `dt` seconds and take the entries that are due.
    ///
    /// Remaining delays are decremented first, then the queue is sorted
    /// ascending and the prefix with `remaining <= 0` is drained. The
    /// returned ids are unique and in due order. Entries scheduled while the
    /// caller processes the result wait for a later call.
    pub fn advance(&self, dt: f32) -> Vec<InstanceId> {
        let mut state = lock(&self.state);
        for entry in &mut state.pending {
            entry.remaining -= dt;
        }
        state
            .pending
            .sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        let ready = state
            .pending
            .iter()
            .take_while(|entry| entry.remaining <= 0.0)
            .count();

        let mut seen = HashSet::new();
        state
            .pending
            .drain(..ready)
            .map(|entry| entry.id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Number of queued destructions.
    pub fn pending_count(&self) -> usize {
        lock(&self.state).pending.len()
    }

    /// Remaining delay of the earliest queue entry for `id`.
    pub fn pending_delay(&self, id: InstanceId) -> Option<f32> {
        lock(&self.state)
            .pending
            .iter()
            .filter(|p| p.id == id)
            .map(|p| p.remaining)
            .min_by(f32::total_cmp)
    }

    #[cfg(feature = "diagnostics")]
    pub fn stats(&self) -> PoolStats {
        let state = lock(&self.state);
        PoolStats {
            live: state.live.len(),
            free: state.free.len(),
            held: state.held.len(),
            pending: state.pending.len(),
            next_fresh: state.next,
        }
    }
}

/// Keeps released ids out of the free pool while alive. See
/// [`IdentityRegistry::hold_released`].
pub struct ReleaseHold<'a> {
    registry: &'a IdentityRegistry,
}

impl Drop for ReleaseHold<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.registry.state);
        state.holds -= 1;
        if state.holds == 0 {
            let held = std::mem::take(&mut state.held);
            state.free.extend(held);
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_entity(registry: &IdentityRegistry) -> InstanceId {
        registry.allocate(LiveObject::Entity).unwrap()
    }

    #[test]
    fn ids_start_above_invalid() {
        let registry = IdentityRegistry::new();
        let a = registry.attach_id().unwrap();
        let b = registry.attach_id().unwrap();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert!(a.is_valid());
    }

    #[test]
    fn double_register_rejected() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        assert!(matches!(
            registry.register(id, LiveObject::Entity),
            Err(CoreError::AlreadyRegistered(_))
        ));
        assert!(registry.register(InstanceId::INVALID, LiveObject::Entity).is_err());
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn freed_id_is_recycled() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        let _other = live_entity(&registry);
        assert!(registry.unregister(id).is_some());
        assert!(!registry.is_live(id));
        let reused = registry.attach_id().unwrap();
        assert_eq!(reused, id);
    }

    #[test]
    fn unregister_twice_is_noop() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        assert!(registry.unregister(id).is_some());
        assert!(registry.unregister(id).is_none());
        // The id must only be in the free pool once.
        let a = registry.attach_id().unwrap();
        let b = registry.attach_id().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn queue_drains_in_delay_order() {
        let registry = IdentityRegistry::new();
        let three = live_entity(&registry);
        let one = live_entity(&registry);
        let two = live_entity(&registry);
        registry.schedule(three, 3.0);
        registry.schedule(one, 1.0);
        registry.schedule(two, 2.0);

        assert_eq!(registry.advance(1.0), vec![one]);
        assert_eq!(registry.advance(1.0), vec![two]);
        assert_eq!(registry.advance(0.5), Vec::<InstanceId>::new());
        assert_eq!(registry.advance(0.5), vec![three]);
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn zero_delay_is_due_on_next_advance() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        registry.schedule(id, 0.0);
        assert_eq!(registry.advance(0.0), vec![id]);
    }

    #[test]
    fn duplicate_entries_are_reported_once() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        registry.schedule(id, 0.5);
        registry.schedule(id, 0.2);
        assert_eq!(registry.pending_delay(id), Some(0.2));
        assert_eq!(registry.advance(1.0), vec![id]);
    }

    #[test]
    fn unregister_purges_pending_entries() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        registry.schedule(id, 5.0);
        registry.unregister(id);
        assert_eq!(registry.pending_count(), 0);

        // The recycled id must not inherit the old schedule.
        let reused = live_entity(&registry);
        assert_eq!(reused, id);
        assert!(registry.advance(10.0).is_empty());
        assert!(registry.is_live(reused));
    }

    #[test]
    fn scheduling_dead_id_is_ignored() {
        let registry = IdentityRegistry::new();
        registry.schedule(InstanceId::from_raw(42), 1.0);
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn instance_lookup() {
        let registry = IdentityRegistry::new();
        let id = live_entity(&registry);
        assert!(matches!(registry.instance(id), Some(InstanceRef::Entity(e)) if e.id() == id));
        assert_eq!(registry.kind(id), Some(InstanceKind::Entity));
        assert!(registry.instance(InstanceId::from_raw(99)).is_none());
        assert!(registry.owner_of(id).is_none());
    }

    #[test]
    fn exhausted_ids_are_refused() {
        let registry = IdentityRegistry::new();
        lock(&registry.state).next = u32::MAX - 1;
        let last = registry.attach_id().unwrap();
        assert_eq!(last.raw(), u32::MAX - 1);
        assert_eq!(registry.attach_id(), None);
        assert!(registry.allocate(LiveObject::Entity).is_none());

        // Recycled ids are still handed out.
        registry.register(last, LiveObject::Entity).unwrap();
        registry.unregister(last);
        assert_eq!(registry.attach_id(), Some(last));
    }

    #[test]
    fn held_ids_return_when_the_hold_ends() {
        let registry = IdentityRegistry::new();
        let a = live_entity(&registry);
        {
            let _outer = registry.hold_released();
            {
                let _inner = registry.hold_released();
                registry.unregister(a);
            }
            let fresh = live_entity(&registry);
            assert_ne!(fresh, a);
        }
        assert_eq!(live_entity(&registry), a);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn stats_track_pool() {
        let registry = IdentityRegistry::new();
        let a = live_entity(&registry);
        let _b = live_entity(&registry);
        registry.unregister(a);
        let stats = registry.stats();
        assert_eq!(stats.live, 1);
        assert_eq!(stats.free, 1);
        assert_eq!(stats.next_fresh, 3);
    }
}
