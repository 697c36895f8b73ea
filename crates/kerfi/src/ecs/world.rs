//! # World — The Store and Its Scheduler
//!
//! The [`World`] owns every entity, component and system of one simulation,
//! and drives the frame tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ World                                                        │
//! │                                                              │
//! │  ids:         IdAllocator (component ids pre-reserved)       │
//! │  storage:     one sparse table per component type            │
//! │  signatures:  entity → BitSignature of attached types        │
//! │  collections: (type, owner) → members     ← collection_owner │
//! │  relations:   (type, member) ↔ owners     ← RelationshipSet  │
//! │  phases:      Phase → OrderedList<SystemKey>                 │
//! │  systems:     required signature, context, tracked entities  │
//! │  clock:       frame / timestamp / delta                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Keeping Indices in Step
//!
//! Every mutation (`set`, `remove`, `take`, `modify`, `destroy`) updates the
//! signature, the table, the reverse indices and every system's membership
//! for the touched entity before it returns. Nothing is recomputed by
//! scanning. The one thing that waits is the callback to a system that is
//! itself mid-tick: its changes are coalesced per entity and delivered when
//! its tick ends.
//!
//! A system matches an entity iff the entity's signature is a superset of
//! the system's required signature *and* the entity's context component is
//! the very handle the system was bound to.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: archetype tables, queries evaluated per run.
//! - **Here**: sparse per-type tables and observer-style systems whose entity
//!   sets are maintained incrementally, scoped by context identity.

use std::any::type_name;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::bitset::BitSignature;
use super::component::{Boxed, Component, Storage, downcast_mut, downcast_ref};
use super::context::{Context, ContextKey, WorldId};
use super::entity::{ComponentId, Entity, IdAllocator};
use super::phase::{Phase, PhaseGraph, SystemKey};
use super::query::{Bundle, Query, Staged};
use super::registry;
use super::relation::{RelationIndex, SharedRelationIndex};
use super::system::{Change, Placement, System, SystemBox, SystemSlot};
use crate::error::EcsError;
use crate::time::Clock;

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(0);

static EMPTY_SET: BTreeSet<Entity> = BTreeSet::new();
static EMPTY_SIGNATURE: BitSignature = BitSignature::new();

// ── Reverse Index ───────────────────────────────────────────────────────

/// `(type, owner) → members` for components with a collection owner.
#[derive(Default)]
struct Collections {
    members: HashMap<(ComponentId, Entity), BTreeSet<Entity>>,
    /// Types under which each owner has a non-empty member set.
    owned: HashMap<Entity, BTreeSet<ComponentId>>,
}

impl Collections {
    fn get(&self, id: ComponentId, owner: Entity) -> Option<&BTreeSet<Entity>> {
        self.members.get(&(id, owner))
    }

    fn relink(&mut self, id: ComponentId, member: Entity, from: Option<Entity>, to: Option<Entity>) {
        if from == to {
            return;
        }
        if let Some(owner) = from {
            self.unlink(id, owner, member);
        }
        if let Some(owner) = to {
            self.members.entry((id, owner)).or_default().insert(member);
            self.owned.entry(owner).or_default().insert(id);
        }
    }

    fn unlink(&mut self, id: ComponentId, owner: Entity, member: Entity) {
        let Some(set) = self.members.get_mut(&(id, owner)) else {
            return;
        };
        set.remove(&member);
        if set.is_empty() {
            self.members.remove(&(id, owner));
            if let Some(kinds) = self.owned.get_mut(&owner) {
                kinds.remove(&id);
                if kinds.is_empty() {
                    self.owned.remove(&owner);
                }
            }
        }
    }

    /// Removes and returns every member set owned by `owner`.
    fn take_owned(&mut self, owner: Entity) -> Vec<(ComponentId, BTreeSet<Entity>)> {
        let Some(kinds) = self.owned.remove(&owner) else {
            return Vec::new();
        };
        kinds
            .into_iter()
            .filter_map(|id| self.members.remove(&(id, owner)).map(|set| (id, set)))
            .collect()
    }
}

// ── World ───────────────────────────────────────────────────────────────

/// The store: entities, components, reverse indices, systems and clock.
pub struct World {
    id: WorldId,
    ids: IdAllocator,
    /// Ids below this are component types.
    reserved: usize,
    storage: Storage,
    signatures: Vec<BitSignature>,
    collections: Collections,
    relations: SharedRelationIndex,
    phases: PhaseGraph,
    systems: Vec<SystemSlot>,
    slot_of: HashMap<(Phase, SystemKey), usize>,
    /// Slot indices in execution order, rebuilt when a system is added.
    schedule: Vec<usize>,
    /// Slot of the system currently inside its tick.
    running: Option<usize>,
    clock: Clock,
    #[cfg(feature = "diagnostics")]
    pub(crate) timings: Vec<crate::diag::SystemTiming>,
}

impl World {
    /// Creates a world with the standard phases.
    ///
    /// The first world freezes the component registry.
    pub fn new() -> Self {
        Self::with_phases(PhaseGraph::standard())
    }

    /// Creates a world with a custom phase graph.
    pub fn with_phases(phases: PhaseGraph) -> Self {
        let snapshot = registry::freeze();
        let id = WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "world {} created, {} component ids reserved",
            id.0,
            snapshot.count
        );
        Self {
            id,
            ids: snapshot.ids,
            reserved: snapshot.count,
            storage: Storage::new(snapshot.type_ids, snapshot.count),
            signatures: Vec::new(),
            collections: Collections::default(),
            relations: Rc::new(RefCell::new(RelationIndex::default())),
            phases,
            systems: Vec::new(),
            slot_of: HashMap::new(),
            schedule: Vec::new(),
            running: None,
            clock: Clock::new(),
            #[cfg(feature = "diagnostics")]
            timings: Vec::new(),
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Read access to the component tables.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn phases(&self) -> &PhaseGraph {
        &self.phases
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    // ── Entity Management ───────────────────────────────────────────

    /// Creates an entity with no components.
    pub fn create_empty(&mut self) -> Entity {
        let entity = Entity(self.ids.alloc() as u32);
        log::debug!("created {entity}");
        entity
    }

    /// Creates an entity and attaches `bundle`.
    pub fn create<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.create_empty();
        self.set(entity, bundle);
        entity
    }

    /// Returns true if `entity`'s id is currently allocated.
    ///
    /// Ids reserved for component types count as alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.ids.is_allocated(entity.slot())
    }

    /// Number of live entities, not counting reserved component ids.
    pub fn entity_count(&self) -> usize {
        self.ids.allocated_count() - self.reserved
    }

    /// Live entities in ascending id order, not counting reserved ids.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        (self.reserved..self.ids.capacity())
            .filter(|&slot| self.ids.is_allocated(slot))
            .map(|slot| Entity(slot as u32))
    }

    /// Which component types `entity` carries.
    pub fn signature(&self, entity: Entity) -> &BitSignature {
        self.signatures.get(entity.slot()).unwrap_or(&EMPTY_SIGNATURE)
    }

    fn signature_mut(&mut self, entity: Entity) -> &mut BitSignature {
        let slot = entity.slot();
        if slot >= self.signatures.len() {
            self.signatures.resize_with(slot + 1, BitSignature::new);
        }
        &mut self.signatures[slot]
    }

    /// Destroys `entity`.
    ///
    /// 1. Drops it from every system tracking it (`on_removed`).
    /// 2. Deletes its components and unlinks it from its owners.
    /// 3. Detaches, from every entity that points at it as collection owner,
    ///    the component doing the pointing. Those entities are not destroyed.
    /// 4. Removes it from every relationship set containing it. Systems
    ///    tracking a set's owner hear about the change.
    /// 5. Releases the id.
    ///
    /// Returns false if the entity wasn't alive or is a reserved component id.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        if entity.slot() < self.reserved {
            log::warn!("refusing to destroy {entity}: reserved for a component type");
            return false;
        }

        for slot in &mut self.systems {
            if slot.tracked.remove(&entity) {
                slot.report(&self.storage, entity, true, Change::Removed);
            }
            slot.close(entity);
        }

        let attached: Vec<usize> = self.signature(entity).ones().collect();
        for id in attached {
            self.detach(entity, ComponentId(id as u32));
        }
        if let Some(signature) = self.signatures.get_mut(entity.slot()) {
            signature.clear();
        }

        for (id, members) in self.collections.take_owned(entity) {
            for member in members {
                if self.detach(member, id).is_some() {
                    self.refresh_membership(member);
                }
            }
        }

        let memberships = self.relations.borrow().slots_containing(entity);
        for (id, owner) in memberships {
            let removed = self
                .storage
                .get_erased_mut(id, owner)
                .and_then(|value| value.relationship_set())
                .is_some_and(|set| set.remove(entity));
            if removed {
                self.refresh_membership(owner);
            }
        }
        self.relations.borrow_mut().forget(entity);

        self.ids.free(entity.slot());
        log::debug!("destroyed {entity}");
        true
    }

    // ── Component Mutation ──────────────────────────────────────────

    /// Attaches every component of `bundle`, replacing existing instances of
    /// the same types, then re-evaluates system membership.
    ///
    /// # Panics
    ///
    /// Panics if a component type is not registered, or if an embedded
    /// relationship set is still bound to another `(type, entity)` slot.
    pub fn set<B: Bundle>(&mut self, entity: Entity, bundle: B) {
        if !self.is_alive(entity) {
            log::warn!("ignored set on dead {entity}");
            return;
        }
        let mut staged = Staged::new();
        bundle.stage(&mut staged);
        for item in staged.items {
            let id = self.storage.id_of_type(item.type_id).unwrap_or_else(|| {
                panic!(
                    "{}",
                    EcsError::UnregisteredComponent {
                        type_name: item.type_name
                    }
                )
            });
            self.attach(entity, id, item.value);
        }
        self.refresh_membership(entity);
    }

    /// Attaches one component. Same as `set(entity, (component,))`.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) {
        self.set(entity, (component,));
    }

    /// Detaches `T`. Returns false if it wasn't attached.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> bool {
        match self.storage.id_of::<T>() {
            Some(id) => self.remove_ids(entity, &[id]) > 0,
            None => false,
        }
    }

    /// Detaches every listed type that is attached. Returns how many were.
    pub fn remove_ids(&mut self, entity: Entity, ids: &[ComponentId]) -> usize {
        let removed = ids
            .iter()
            .filter(|&&id| self.detach(entity, id).is_some())
            .count();
        if removed > 0 {
            self.refresh_membership(entity);
        }
        removed
    }

    /// Detaches `T` and hands it back.
    ///
    /// An embedded relationship set comes back unlinked but still bound to
    /// this `(type, entity)` slot.
    pub fn take<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let id = self.storage.id_of::<T>()?;
        let value = self.detach(entity, id)?;
        self.refresh_membership(entity);
        value.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Mutates `T` in place, then updates reverse indices and membership as
    /// if it had been set again. Returns false if `T` isn't attached.
    pub fn modify<T: Component>(&mut self, entity: Entity, f: impl FnOnce(&mut T)) -> bool {
        let Some(id) = self.storage.id_of::<T>() else {
            return false;
        };
        let Some(value) = self.storage.get_erased_mut(id, entity) else {
            return false;
        };
        let before = value.owner();
        f(downcast_mut::<T>(value.as_any_mut()));
        let after = value.owner();
        self.collections.relink(id, entity, before, after);
        self.refresh_membership(entity);
        true
    }

    fn attach(&mut self, entity: Entity, id: ComponentId, mut value: Boxed) {
        let mut old = self.storage.take(id, entity);
        let old_owner = old.as_ref().and_then(|o| o.owner());
        if let Some(set) = old.as_mut().and_then(|o| o.relationship_set()) {
            set.detach();
        }
        if let Some(set) = value.relationship_set() {
            if let Err(err) = set.attach(id, entity, &self.relations) {
                panic!("{err}");
            }
        }
        self.collections.relink(id, entity, old_owner, value.owner());
        self.signature_mut(entity).set(id.slot(), true);
        log::trace!("{entity} ← {}", value.debug_value());
        self.storage.replace(id, entity, value);
    }

    fn detach(&mut self, entity: Entity, id: ComponentId) -> Option<Boxed> {
        let mut value = self.storage.take(id, entity)?;
        self.collections.relink(id, entity, value.owner(), None);
        if let Some(set) = value.relationship_set() {
            set.detach();
        }
        if let Some(signature) = self.signatures.get_mut(entity.slot()) {
            signature.set(id.slot(), false);
        }
        log::trace!("{entity} lost component #{}", id.index());
        Some(value)
    }

    // ── Component Access ────────────────────────────────────────────

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage.get::<T>(entity)
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Mutable access without membership notifications.
    ///
    /// When the guard drops, a changed collection owner is relinked and an
    /// embedded relationship set that isn't linked yet (a replaced value) is
    /// bound to this slot. Swapping the context handle re-evaluates
    /// membership. Use [`modify`](Self::modify) when systems should hear
    /// about any other change.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<ComponentMut<'_, T>> {
        let id = self.storage.id_of::<T>()?;
        let value = self.storage.get_erased(id, entity)?;
        let owner = value.owner();
        let context = value.context_key();
        Some(ComponentMut {
            world: self,
            id,
            entity,
            owner,
            context,
            _marker: PhantomData,
        })
    }

    /// Resolves a whole query tuple for one entity.
    pub fn fetch<Q: Query>(&self, entity: Entity) -> Option<Q::Item<'_>> {
        Q::fetch(&self.storage, entity)
    }

    /// `T` for each of `entities` that has one.
    pub fn get_for_many<T: Component>(
        &self,
        entities: impl IntoIterator<Item = Entity>,
    ) -> BTreeMap<Entity, &T> {
        entities
            .into_iter()
            .filter_map(|e| self.get::<T>(e).map(|value| (e, value)))
            .collect()
    }

    /// Entities whose component `id` names `owner` as collection owner.
    ///
    /// Empty (never absent) when there are none.
    pub fn get_collected(&self, owner: Entity, id: ComponentId) -> &BTreeSet<Entity> {
        self.collections.get(id, owner).unwrap_or(&EMPTY_SET)
    }

    /// Typed form of [`get_collected`](Self::get_collected).
    pub fn collected<T: Component>(&self, owner: Entity) -> &BTreeSet<Entity> {
        match self.storage.id_of::<T>() {
            Some(id) => self.get_collected(owner, id),
            None => &EMPTY_SET,
        }
    }

    // ── Relationship Sets ───────────────────────────────────────────

    /// Owners whose `id` relationship set contains `member`.
    pub fn relation_owners(&self, member: Entity, id: ComponentId) -> BTreeSet<Entity> {
        self.relations
            .borrow()
            .owners_of(id, member)
            .cloned()
            .unwrap_or_default()
    }

    /// Other entities that share an `id` relationship set with `member`.
    ///
    /// Errors if `member` was never added to any set of that type. An entity
    /// that was added and later removed gets an empty set.
    pub fn sharing_cell(&self, member: Entity, id: ComponentId) -> Result<BTreeSet<Entity>, EcsError> {
        let index = self.relations.borrow();
        let owners = index
            .owners_of(id, member)
            .ok_or_else(|| EcsError::NotInRelationship {
                entity: member,
                component: registry::component_info(id).map_or("<unregistered>", |info| info.name),
            })?;
        let mut shared = BTreeSet::new();
        for &owner in owners {
            if let Some(members) = index.members_of(id, owner) {
                shared.extend(members.iter().copied().filter(|&e| e != member));
            }
        }
        Ok(shared)
    }

    // ── Systems ─────────────────────────────────────────────────────

    /// Creates a context handle owned by this world.
    pub fn create_context<T: 'static>(&self, state: T) -> Context<T> {
        Context::new(self.id, state)
    }

    /// Adds a system to `phase`, bound to `context`.
    ///
    /// Returns false if the same system type is already in that phase for
    /// that context; `factory` isn't called then.
    ///
    /// # Panics
    ///
    /// Panics on any error [`try_add_system`](Self::try_add_system) returns.
    pub fn add_system<S: System>(
        &mut self,
        phase: Phase,
        context: &Context<S::Context>,
        factory: impl FnOnce(&Context<S::Context>) -> S,
        placement: Placement,
    ) -> bool {
        self.try_add_system(phase, context, factory, placement)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Adds a system, reporting foreign contexts, unknown phases,
    /// unregistered types and contradictory placement as errors.
    ///
    /// Existing entities are evaluated against the new system immediately.
    pub fn try_add_system<S: System>(
        &mut self,
        phase: Phase,
        context: &Context<S::Context>,
        factory: impl FnOnce(&Context<S::Context>) -> S,
        placement: Placement,
    ) -> Result<bool, EcsError> {
        if context.world_id() != self.id {
            return Err(EcsError::ForeignContext {
                system: type_name::<S>(),
            });
        }
        if !self.phases.contains(phase) {
            return Err(EcsError::UnknownPhase(phase.name()));
        }
        let key = SystemKey::of::<S>(context.key());
        if self.phases.has_system(phase, &key) {
            log::debug!("system {key} already in {phase} for this context");
            return Ok(false);
        }

        let context_type = self.storage.try_id::<Context<S::Context>>()?;
        let mut required_ids = Vec::new();
        <S::Query as Query>::component_ids(&self.storage, &mut required_ids)?;

        let in_context = |list: &[(std::any::TypeId, &'static str)]| -> Vec<SystemKey> {
            list.iter()
                .map(|&(system, name)| SystemKey {
                    system,
                    context: key.context,
                    name,
                })
                .collect()
        };
        let before = in_context(&placement.before);
        let after = in_context(&placement.after);
        self.phases.insert_system(phase, key, &before, &after)?;

        let system = factory(context);
        registry::add_match_all_group(&system.match_all());

        let mut required = BitSignature::from_indices(required_ids.iter().map(|id| id.slot()));
        required.set(context_type.slot(), true);

        let index = self.systems.len();
        self.systems.push(SystemSlot {
            name: system.name(),
            phase,
            gate: context.gate(),
            context_type,
            required,
            tracked: BTreeSet::new(),
            system: Some(Box::new(SystemBox(system))),
            deferred: Vec::new(),
        });
        self.slot_of.insert((phase, key), index);
        self.rebuild_schedule();
        log::debug!("added system {} to {phase}", self.systems[index].name);

        for slot in 0..self.signatures.len() {
            if !self.signatures[slot].is_empty() {
                self.evaluate(index, Entity(slot as u32));
            }
        }
        Ok(true)
    }

    fn rebuild_schedule(&mut self) {
        let schedule = self
            .phases
            .execution_order()
            .filter_map(|(phase, key)| self.slot_of.get(&(phase, *key)).copied())
            .collect();
        self.schedule = schedule;
    }

    /// System names in execution order, with their phase.
    pub fn scheduled_systems(&self) -> Vec<(Phase, &str)> {
        self.schedule
            .iter()
            .map(|&index| {
                let slot = &self.systems[index];
                (slot.phase, slot.name.as_str())
            })
            .collect()
    }

    /// Returns true if the system currently ticking tracks `entity`.
    ///
    /// Always false outside a tick.
    pub fn is_tracked(&self, entity: Entity) -> bool {
        self.running
            .is_some_and(|index| self.systems[index].tracked.contains(&entity))
    }

    fn refresh_membership(&mut self, entity: Entity) {
        for index in 0..self.systems.len() {
            self.evaluate(index, entity);
        }
    }

    fn evaluate(&mut self, index: usize, entity: Entity) {
        let slot = &self.systems[index];
        let matched = self
            .signatures
            .get(entity.slot())
            .is_some_and(|signature| signature.is_superset_of(&slot.required))
            && self
                .storage
                .get_erased(slot.context_type, entity)
                .and_then(|context| context.context_key())
                == Some(slot.gate.key);

        let slot = &mut self.systems[index];
        let was = slot.tracked.contains(&entity);
        let Some(change) = Change::between(was, matched) else {
            return;
        };
        if matched {
            slot.tracked.insert(entity);
        } else {
            slot.tracked.remove(&entity);
        }
        log::trace!("{entity} {change:?} in {}", slot.name);
        slot.report(&self.storage, entity, was, change);
    }

    // ── Tick ────────────────────────────────────────────────────────

    /// Runs one tick: phases in order, systems in order, skipping systems
    /// whose context is paused.
    pub fn run(&mut self) {
        #[cfg(feature = "diagnostics")]
        self.timings.clear();

        let schedule = self.schedule.clone();
        for index in schedule {
            if self.systems[index].gate.is_paused() {
                continue;
            }
            self.tick_system(index);
        }
    }

    /// Advances the clock to `timestamp_ms` and runs one tick.
    ///
    /// Timestamps that don't move forward are ignored with a warning and
    /// nothing runs.
    pub fn advance_to(&mut self, timestamp_ms: f64) -> bool {
        if !self.clock.advance(timestamp_ms) {
            log::warn!(
                "ignored clock timestamp {timestamp_ms} (current {})",
                self.clock.timestamp_ms()
            );
            return false;
        }
        self.run();
        true
    }

    fn tick_system(&mut self, index: usize) {
        // Already lifted out: a nested `run` from inside this system's tick.
        let Some(mut system) = self.systems[index].system.take() else {
            return;
        };
        let tracked: Vec<Entity> = self.systems[index].tracked.iter().copied().collect();
        let outer = self.running.replace(index);

        #[cfg(feature = "diagnostics")]
        let start = std::time::Instant::now();

        system.tick(self, &tracked);

        #[cfg(feature = "diagnostics")]
        self.timings.push(crate::diag::SystemTiming {
            name: self.systems[index].name.clone(),
            phase: self.systems[index].phase.name(),
            duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
        });

        self.running = outer;
        let slot = &mut self.systems[index];
        slot.system = Some(system);
        slot.flush_deferred(&self.storage);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ── Guarded Mutable Access ──────────────────────────────────────────────

/// Mutable access to one component, returned by [`World::get_mut`].
pub struct ComponentMut<'w, T: Component> {
    world: &'w mut World,
    id: ComponentId,
    entity: Entity,
    /// Collection owner and context key when the guard was taken.
    owner: Option<Entity>,
    context: Option<ContextKey>,
    _marker: PhantomData<T>,
}

impl<T: Component> Deref for ComponentMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.world.storage.get_erased(self.id, self.entity) {
            Some(value) => downcast_ref::<T>(value.as_any()),
            None => panic!("{} lost its component while borrowed", self.entity),
        }
    }
}

impl<T: Component> DerefMut for ComponentMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.world.storage.get_erased_mut(self.id, self.entity) {
            Some(value) => downcast_mut::<T>(value.as_any_mut()),
            None => panic!("{} lost its component while borrowed", self.entity),
        }
    }
}

impl<T: Component> Drop for ComponentMut<'_, T> {
    fn drop(&mut self) {
        let World {
            storage,
            collections,
            relations,
            ..
        } = &mut *self.world;
        let Some(value) = storage.get_erased_mut(self.id, self.entity) else {
            return;
        };
        let owner = value.owner();
        let context = value.context_key();
        if let Some(set) = value.relationship_set().filter(|set| !set.is_linked()) {
            if let Err(err) = set.attach(self.id, self.entity, relations) {
                log::error!("{err}; the set stays unlinked");
            }
        }
        collections.relink(self.id, self.entity, self.owner, owner);
        if context != self.context {
            self.world.refresh_membership(self.entity);
        }
    }
}
