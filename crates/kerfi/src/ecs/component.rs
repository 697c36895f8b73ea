//! # Component — Typed Data in Sparse Per-Type Tables
//!
//! Components are plain data (`Position`, `Velocity`, `ChildOf`). Each
//! registered type owns one table, and each table is a sparse vector indexed
//! by entity id:
//!
//! ```text
//! Storage
//!   table[ChildOf]:  [None, None, None, Some(ChildOf(3)), None, ...]
//!   table[Position]: [None, None, None, Some(..),         Some(..), ...]
//!                                      ▲ entity 3          ▲ entity 4
//! ```
//!
//! Values are stored as `Box<dyn StoredComponent>` and downcast on access.
//! A table is selected by the dense [`ComponentId`] handed out at
//! registration, so component types declared in separate modules all get a
//! slot without a closed enum.
//!
//! ## Hooks
//!
//! The [`Component`] trait has two optional hooks the store calls on every
//! attach and detach:
//!
//! - [`collection_owner`](Component::collection_owner): a single owner entity,
//!   making the instance a one-to-many relationship edge. The store keeps a
//!   reverse index (`owner → members`) in sync.
//! - [`relationship_set`](Component::relationship_set): an embedded
//!   [`RelationshipSet`] the store binds to `(type, entity)`.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use super::context::ContextKey;
use super::entity::{ComponentId, Entity};
use super::relation::RelationshipSet;
use crate::error::EcsError;

/// Data that can be attached to an entity.
///
/// ```ignore
/// #[derive(Debug)]
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
///
/// #[derive(Debug)]
/// struct Follows { leader: Entity }
/// impl Component for Follows {
///     fn collection_owner(&self) -> Option<Entity> { Some(self.leader) }
/// }
/// ```
pub trait Component: fmt::Debug + 'static {
    /// The owner this instance is collected under, if any.
    fn collection_owner(&self) -> Option<Entity> {
        None
    }

    /// An embedded relationship set the store should bind to this slot.
    fn relationship_set(&mut self) -> Option<&mut RelationshipSet> {
        None
    }

    /// Identity key of a context handle. Only [`Context`](super::context::Context) returns one.
    #[doc(hidden)]
    fn context_key(&self) -> Option<ContextKey> {
        None
    }
}

/// Object-safe view of a stored component.
pub(crate) trait StoredComponent {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn owner(&self) -> Option<Entity>;
    fn context_key(&self) -> Option<ContextKey>;
    fn relationship_set(&mut self) -> Option<&mut RelationshipSet>;
    fn debug_value(&self) -> String;
}

impl<T: Component> StoredComponent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn owner(&self) -> Option<Entity> {
        self.collection_owner()
    }

    fn context_key(&self) -> Option<ContextKey> {
        Component::context_key(self)
    }

    fn relationship_set(&mut self) -> Option<&mut RelationshipSet> {
        Component::relationship_set(self)
    }

    fn debug_value(&self) -> String {
        format!("{self:?}")
    }
}

pub(crate) type Boxed = Box<dyn StoredComponent>;

/// One sparse column: slot `i` holds entity `i`'s instance, if any.
#[derive(Default)]
struct ComponentTable {
    slots: Vec<Option<Boxed>>,
}

impl ComponentTable {
    fn get(&self, entity: Entity) -> Option<&Boxed> {
        self.slots.get(entity.slot())?.as_ref()
    }

    fn get_mut(&mut self, entity: Entity) -> Option<&mut Boxed> {
        self.slots.get_mut(entity.slot())?.as_mut()
    }

    fn replace(&mut self, entity: Entity, value: Boxed) -> Option<Boxed> {
        let slot = entity.slot();
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot].replace(value)
    }

    fn take(&mut self, entity: Entity) -> Option<Boxed> {
        self.slots.get_mut(entity.slot())?.take()
    }
}

/// All component tables of one [`World`](super::world::World).
///
/// Read access is public so [`Query`](super::query::Query) implementations
/// can resolve tuples; writes go through the world, which keeps signatures,
/// reverse indices and system membership in step.
pub struct Storage {
    tables: Vec<ComponentTable>,
    type_ids: HashMap<TypeId, ComponentId>,
}

impl Storage {
    pub(crate) fn new(type_ids: HashMap<TypeId, ComponentId>, count: usize) -> Self {
        let mut tables = Vec::with_capacity(count);
        tables.resize_with(count, ComponentTable::default);
        Self { tables, type_ids }
    }

    /// The id registered for `T`, if any.
    pub fn id_of<T: 'static>(&self) -> Option<ComponentId> {
        self.type_ids.get(&TypeId::of::<T>()).copied()
    }

    /// The id registered for `T`, or [`EcsError::UnregisteredComponent`].
    pub fn try_id<T: 'static>(&self) -> Result<ComponentId, EcsError> {
        self.id_of::<T>().ok_or(EcsError::UnregisteredComponent {
            type_name: type_name::<T>(),
        })
    }

    /// The id registered for `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was not registered before this storage was created.
    pub fn require_id<T: 'static>(&self) -> ComponentId {
        self.try_id::<T>().unwrap_or_else(|e| panic!("{e}"))
    }

    pub(crate) fn id_of_type(&self, type_id: TypeId) -> Option<ComponentId> {
        self.type_ids.get(&type_id).copied()
    }

    /// Number of component tables (one per registered type).
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Shared reference to `entity`'s `T`, if attached.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        let id = self.id_of::<T>()?;
        let value = self.get_erased(id, entity)?;
        Some(downcast_ref::<T>(value.as_any()))
    }

    pub(crate) fn get_erased(&self, id: ComponentId, entity: Entity) -> Option<&Boxed> {
        self.tables.get(id.slot())?.get(entity)
    }

    pub(crate) fn get_erased_mut(&mut self, id: ComponentId, entity: Entity) -> Option<&mut Boxed> {
        self.tables.get_mut(id.slot())?.get_mut(entity)
    }

    /// Stores `value`, returning the instance it replaced.
    pub(crate) fn replace(&mut self, id: ComponentId, entity: Entity, value: Boxed) -> Option<Boxed> {
        self.tables[id.slot()].replace(entity, value)
    }

    pub(crate) fn take(&mut self, id: ComponentId, entity: Entity) -> Option<Boxed> {
        self.tables.get_mut(id.slot())?.take(entity)
    }
}

pub(crate) fn downcast_ref<T: 'static>(value: &dyn Any) -> &T {
    value.downcast_ref().unwrap_or_else(|| {
        panic!("Component type mismatch: expected `{}` in table", type_name::<T>())
    })
}

pub(crate) fn downcast_mut<T: 'static>(value: &mut dyn Any) -> &mut T {
    value.downcast_mut().unwrap_or_else(|| {
        panic!("Component type mismatch: expected `{}` in table", type_name::<T>())
    })
}

/// Strip the module path from a fully-qualified type name, keeping generic
/// arguments readable (`kerfi::ecs::context::Context<game::Level>` →
/// `Context<Level>`).
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' => {
                out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}
