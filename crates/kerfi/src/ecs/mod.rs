//! # Sparse-Set ECS With Incremental Systems
//!
//! The store keeps one sparse table per component type and a bit signature
//! per entity. Systems don't query each frame: every mutation re-evaluates
//! the touched entity against every system and tells the system what
//! changed. Context handles scope systems to logical sub-worlds that share
//! one store.
//!
//! ## Module Overview
//!
//! - [`bitset`]: growable bit signatures with a superset test
//! - [`entity`]: integer handles and the id allocator
//! - [`registry`]: process-wide component ids, frozen by the first world
//! - [`component`]: the `Component` trait and type-erased tables
//! - [`query`]: typed tuples of required components, bundles to attach
//! - [`ordered`]: before/after constrained insertion
//! - [`phase`]: the frame's stages and each stage's system order
//! - [`context`]: identity-keyed context handles
//! - [`system`]: the `System` trait and placement
//! - [`relation`]: relationship sets that index themselves
//! - [`hierarchy`]: the built-in `ChildOf` relationship
//! - [`world`]: the store and scheduler

pub mod bitset;
pub mod component;
pub mod context;
pub mod entity;
pub mod hierarchy;
pub mod ordered;
pub mod phase;
pub mod query;
pub mod registry;
pub mod relation;
pub mod system;
pub mod world;

pub use bitset::BitSignature;
pub use component::{Component, Storage};
pub use context::{Context, ContextKey, WorldId};
pub use entity::{ComponentId, Entity, IdAllocator};
pub use hierarchy::ChildOf;
pub use ordered::OrderedList;
pub use phase::{Phase, PhaseGraph, SystemKey};
pub use query::{Bundle, Query, Staged};
pub use registry::{
    ComponentInfo, component_id, component_info, is_frozen, prerequisites_of,
    register_component, register_component_requiring, registered_components,
    try_component_id, try_register_component,
};
pub use relation::RelationshipSet;
pub use system::{Placement, System};
pub use world::{ComponentMut, World};
