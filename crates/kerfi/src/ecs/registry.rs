//! # Component Registry — Process-Wide Type Ids With a Freeze Point
//!
//! Every component type gets one id for the lifetime of the process. Ids come
//! from an [`IdAllocator`], so they are small, dense and start at zero. The
//! built-in [`ChildOf`] is always registered first.
//!
//! ```text
//! register::<Position>()   ──►  ComponentId(1)
//! register::<Velocity>()   ──►  ComponentId(2)
//! World::new()             ──►  freeze; the world's allocator starts at 3
//! register::<Late>()       ──►  EcsError::RegistryFrozen
//! ```
//!
//! ## Lifecycle
//!
//! Registration is an init phase. The first [`World`](super::world::World)
//! freezes the registry and every world takes a snapshot of it: the
//! `TypeId → ComponentId` map for its tables and a copy of the id allocator,
//! so component-type ids are reserved as entities in that world.
//!
//! Registering a type that is already known returns its id, frozen or not.
//! That lets plugins register what they use without coordinating.
//!
//! ## Prerequisites
//!
//! A type may declare prerequisite types, and systems may declare groups of
//! their required types that should always travel together. Both become
//! advisory edges in one graph. Nothing enforces them; the graph only feeds
//! the diagnostic scan (`World::missing_prerequisites`).

use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::component::{Component, short_type_name};
use super::entity::{ComponentId, IdAllocator};
use super::hierarchy::ChildOf;
use crate::error::EcsError;

/// Descriptor of a registered component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub type_id: TypeId,
    /// Fully-qualified type name.
    pub name: &'static str,
}

impl ComponentInfo {
    /// The type name without module paths.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

struct Registry {
    ids: IdAllocator,
    by_type: HashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
    prerequisites: BTreeMap<ComponentId, BTreeSet<ComponentId>>,
    frozen: bool,
}

impl Registry {
    fn new() -> Self {
        let mut registry = Self {
            ids: IdAllocator::new(),
            by_type: HashMap::new(),
            infos: Vec::new(),
            prerequisites: BTreeMap::new(),
            frozen: false,
        };
        registry.insert(TypeId::of::<ChildOf>(), type_name::<ChildOf>());
        registry
    }

    fn insert(&mut self, type_id: TypeId, name: &'static str) -> ComponentId {
        let id = ComponentId(self.ids.alloc() as u32);
        debug_assert_eq!(id.slot(), self.infos.len());
        self.by_type.insert(type_id, id);
        self.infos.push(ComponentInfo { id, type_id, name });
        id
    }

    fn register(&mut self, type_id: TypeId, name: &'static str) -> Result<ComponentId, EcsError> {
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }
        if self.frozen {
            return Err(EcsError::RegistryFrozen { type_name: name });
        }
        let id = self.insert(type_id, name);
        log::debug!("registered component {} as #{}", short_type_name(name), id.index());
        Ok(id)
    }

    fn require(&mut self, dependent: ComponentId, prerequisites: &[ComponentId]) {
        let edges = self.prerequisites.entry(dependent).or_default();
        edges.extend(prerequisites.iter().copied().filter(|&p| p != dependent));
        if edges.is_empty() {
            self.prerequisites.remove(&dependent);
        }
    }
}

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

fn read() -> RwLockReadGuard<'static, Registry> {
    REGISTRY
        .get_or_init(|| RwLock::new(Registry::new()))
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

fn write() -> RwLockWriteGuard<'static, Registry> {
    REGISTRY
        .get_or_init(|| RwLock::new(Registry::new()))
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}

// ── Registration ────────────────────────────────────────────────────────

/// Registers `T` and returns its id.
///
/// # Panics
///
/// Panics if `T` is new and a `World` has already been created.
pub fn register_component<T: Component>() -> ComponentId {
    try_register_component::<T>().unwrap_or_else(|e| panic!("{e}"))
}

/// Registers `T`, or returns [`EcsError::RegistryFrozen`] if it is new and
/// the registry is frozen.
pub fn try_register_component<T: Component>() -> Result<ComponentId, EcsError> {
    write().register(TypeId::of::<T>(), type_name::<T>())
}

/// Registers `T` with advisory prerequisite types.
///
/// ```ignore
/// let sprite = register_component::<Sprite>();
/// let tint = register_component_requiring::<Tint>(&[sprite]);
/// ```
///
/// # Panics
///
/// Panics if `T` is new and the registry is frozen.
pub fn register_component_requiring<T: Component>(prerequisites: &[ComponentId]) -> ComponentId {
    let mut registry = write();
    let id = registry
        .register(TypeId::of::<T>(), type_name::<T>())
        .unwrap_or_else(|e| panic!("{e}"));
    registry.require(id, prerequisites);
    id
}

/// Records that the given types should never appear without each other.
///
/// Called for a system's match-all group when the system is added.
pub(crate) fn add_match_all_group(group: &[ComponentId]) {
    if group.len() < 2 {
        return;
    }
    let mut registry = write();
    for &id in group {
        registry.require(id, group);
    }
}

// ── Lookup ──────────────────────────────────────────────────────────────

/// The id of `T`.
///
/// # Panics
///
/// Panics if `T` was never registered.
pub fn component_id<T: Component>() -> ComponentId {
    try_component_id::<T>().unwrap_or_else(|| {
        panic!(
            "{}",
            EcsError::UnregisteredComponent {
                type_name: type_name::<T>()
            }
        )
    })
}

/// The id of `T`, if registered.
pub fn try_component_id<T: Component>() -> Option<ComponentId> {
    read().by_type.get(&TypeId::of::<T>()).copied()
}

/// The descriptor registered under `id`.
pub fn component_info(id: ComponentId) -> Option<ComponentInfo> {
    read().infos.get(id.slot()).cloned()
}

/// Every registered type, in id order.
pub fn registered_components() -> Vec<ComponentInfo> {
    read().infos.clone()
}

/// Advisory prerequisites of `id`, in id order.
pub fn prerequisites_of(id: ComponentId) -> Vec<ComponentId> {
    read()
        .prerequisites
        .get(&id)
        .map(|set| set.iter().copied().collect())
        .unwrap_or_default()
}

/// Returns true once a `World` has been created.
pub fn is_frozen() -> bool {
    read().frozen
}

// ── Freeze ──────────────────────────────────────────────────────────────

/// What a new world copies out of the registry.
pub(crate) struct RegistrySnapshot {
    pub ids: IdAllocator,
    pub type_ids: HashMap<TypeId, ComponentId>,
    pub count: usize,
}

/// Freezes the registry (first call only) and snapshots it.
pub(crate) fn freeze() -> RegistrySnapshot {
    let mut registry = write();
    if !registry.frozen {
        registry.frozen = true;
        log::debug!("component registry frozen with {} types", registry.infos.len());
    }
    RegistrySnapshot {
        ids: IdAllocator::seeded_from(&registry.ids),
        type_ids: registry.by_type.clone(),
        count: registry.infos.len(),
    }
}
