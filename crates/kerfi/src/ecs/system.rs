//! # Systems — Incrementally Matched Per-Frame Logic
//!
//! A system declares what it needs (a [`Query`] tuple and a context type)
//! and the store tells it about every entity that starts, keeps or stops
//! matching. There is no per-frame query: membership is updated by each
//! mutation as it happens.
//!
//! ```text
//! world.set(e, (Velocity::ZERO,))
//!   └─ for every system: e ⊇ required && e's context is the bound one?
//!        not tracked → tracked   on_added  + on_set
//!        tracked     → tracked   on_modified + on_set
//!        tracked     → dropped   on_removed
//! world.run()
//!   └─ for every phase, every system: on_tick(world, tracked)
//!                                         └─ default: per_entity for each
//! ```
//!
//! ## Ticking
//!
//! While a system ticks it is lifted out of the store, so it can take
//! `&mut World` and mutate freely. Its tracked set keeps updating as it
//! mutates. Callbacks that would have reached it during the tick are held and
//! delivered right after, in order, one per entity describing the net change.
//! Destroying an entity closes its entry, so an id reused later in the same
//! tick is reported as a new entity (`on_removed`, then `on_added`).
//!
//! ## Comparison
//!
//! - **bevy_ecs**: systems are functions over queries evaluated every run.
//! - **flecs observers**: closest relative; callbacks on add/set/remove.

use std::any::{TypeId, type_name};
use std::collections::BTreeSet;

use super::bitset::BitSignature;
use super::component::{Storage, short_type_name};
use super::context::ContextGate;
use super::entity::{ComponentId, Entity};
use super::phase::Phase;
use super::query::Query;
use super::world::World;

/// Per-frame logic bound to one context.
///
/// Every callback has an empty default. Implement what you need:
///
/// ```ignore
/// struct Mover;
///
/// impl System for Mover {
///     type Query = (&'static Position, &'static Velocity);
///     type Context = Level;
///
///     fn per_entity(&mut self, world: &mut World, e: Entity) {
///         let v = *world.get::<Velocity>(e).unwrap();
///         world.modify::<Position>(e, |p| p.translate(v));
///     }
/// }
/// ```
pub trait System: 'static {
    /// Required components, in the order callbacks receive them.
    type Query: Query;
    /// State type of the `Context<_>` this system is bound to.
    type Context: 'static;

    fn name(&self) -> String {
        short_type_name(type_name::<Self>())
    }

    /// Required types that should never appear without each other.
    ///
    /// Advisory: feeds the prerequisite scan, never membership.
    fn match_all(&self) -> Vec<ComponentId> {
        Vec::new()
    }

    /// `entity` started matching.
    fn on_added(&mut self, entity: Entity, item: <Self::Query as Query>::Item<'_>) {
        let _ = (entity, item);
    }

    /// `entity` still matches after a mutation.
    fn on_modified(&mut self, entity: Entity, item: <Self::Query as Query>::Item<'_>) {
        let _ = (entity, item);
    }

    /// Follows every `on_added` and `on_modified`.
    fn on_set(&mut self, entity: Entity, item: <Self::Query as Query>::Item<'_>) {
        let _ = (entity, item);
    }

    /// `entity` stopped matching or was destroyed.
    fn on_removed(&mut self, entity: Entity) {
        let _ = entity;
    }

    /// Called by the default `on_tick` for each tracked entity.
    fn per_entity(&mut self, world: &mut World, entity: Entity) {
        let _ = (world, entity);
    }

    /// Called once per frame with every entity tracked when the tick began.
    ///
    /// The default skips entities that stopped matching earlier in the same
    /// tick.
    fn on_tick(&mut self, world: &mut World, tracked: &[Entity]) {
        for &entity in tracked {
            if world.is_tracked(entity) {
                self.per_entity(world, entity);
            }
        }
    }
}

// ── Placement ───────────────────────────────────────────────────────────

/// Where to put a system inside its phase, relative to other system types
/// bound to the same context.
///
/// ```ignore
/// world.add_system(Phase::ACTION, &level, |_| Collide, Placement::new().after::<Mover>());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Placement {
    pub(crate) before: Vec<(TypeId, &'static str)>,
    pub(crate) after: Vec<(TypeId, &'static str)>,
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run before `S` if it is already in the phase.
    pub fn before<S: System>(mut self) -> Self {
        self.before.push((TypeId::of::<S>(), type_name::<S>()));
        self
    }

    /// Run after `S` if it is already in the phase.
    pub fn after<S: System>(mut self) -> Self {
        self.after.push((TypeId::of::<S>(), type_name::<S>()));
        self
    }
}

// ── Erased systems ──────────────────────────────────────────────────────

/// What happened to an entity from one system's point of view.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Change {
    Added,
    Modified,
    Removed,
}

impl Change {
    /// Net change between membership before and after a span of mutations.
    pub(crate) fn between(was: bool, now: bool) -> Option<Change> {
        match (was, now) {
            (false, true) => Some(Change::Added),
            (true, true) => Some(Change::Modified),
            (true, false) => Some(Change::Removed),
            (false, false) => None,
        }
    }
}

/// Object-safe wrapper the store holds for each system.
pub(crate) trait AnySystem {
    fn notify(&mut self, storage: &Storage, entity: Entity, change: Change);
    fn tick(&mut self, world: &mut World, tracked: &[Entity]);
}

pub(crate) struct SystemBox<S>(pub(crate) S);

impl<S: System> AnySystem for SystemBox<S> {
    fn notify(&mut self, storage: &Storage, entity: Entity, change: Change) {
        let item = match change {
            Change::Removed => {
                self.0.on_removed(entity);
                return;
            }
            Change::Added | Change::Modified => match <S::Query as Query>::fetch(storage, entity) {
                Some(item) => item,
                None => return,
            },
        };
        if change == Change::Added {
            self.0.on_added(entity, item);
        } else {
            self.0.on_modified(entity, item);
        }
        self.0.on_set(entity, item);
    }

    fn tick(&mut self, world: &mut World, tracked: &[Entity]) {
        self.0.on_tick(world, tracked);
    }
}

/// One registered system and its membership state.
pub(crate) struct SystemSlot {
    pub(crate) name: String,
    pub(crate) phase: Phase,
    pub(crate) gate: ContextGate,
    pub(crate) context_type: ComponentId,
    pub(crate) required: BitSignature,
    pub(crate) tracked: BTreeSet<Entity>,
    /// `None` while the system is ticking.
    pub(crate) system: Option<Box<dyn AnySystem>>,
    /// Entities touched while ticking, in first-touch order.
    pub(crate) deferred: Vec<Held>,
}

/// Membership of one entity across part of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Held {
    entity: Entity,
    /// Tracked when the entry opened.
    was: bool,
    /// Tracked after the latest change.
    now: bool,
    /// Set once the entity is destroyed; later changes open a new entry.
    closed: bool,
}

impl SystemSlot {
    /// Records a membership change, delivering it now or after the tick.
    pub(crate) fn report(&mut self, storage: &Storage, entity: Entity, was: bool, change: Change) {
        match self.system.as_mut() {
            Some(system) => system.notify(storage, entity, change),
            None => {
                let now = change != Change::Removed;
                match self.open_entry(entity) {
                    Some(held) => held.now = now,
                    None => self.deferred.push(Held {
                        entity,
                        was,
                        now,
                        closed: false,
                    }),
                }
            }
        }
    }

    /// Ends `entity`'s held entry. Called when the entity is destroyed.
    pub(crate) fn close(&mut self, entity: Entity) {
        if let Some(held) = self.open_entry(entity) {
            held.closed = true;
        }
    }

    fn open_entry(&mut self, entity: Entity) -> Option<&mut Held> {
        self.deferred
            .iter_mut()
            .rev()
            .find(|held| held.entity == entity && !held.closed)
    }

    /// Delivers held callbacks once the system is back in its slot.
    pub(crate) fn flush_deferred(&mut self, storage: &Storage) {
        let deferred = std::mem::take(&mut self.deferred);
        let Some(system) = self.system.as_mut() else {
            return;
        };
        for held in deferred {
            if let Some(change) = Change::between(held.was, held.now) {
                system.notify(storage, held.entity, change);
            }
        }
    }
}
