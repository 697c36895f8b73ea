//! Errors raised by the store, the registry and the scheduler.
//!
//! Every variant describes a programming error: nothing here is transient
//! and nothing is retried. The panicking entry points (`register_component`,
//! `World::add_system`, ...) panic with the `Display` text of the matching
//! variant; the `try_*` counterparts hand the value back instead.

use std::fmt;

use crate::ecs::Entity;

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors produced by the ECS core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A new component type was registered after the first `World` froze the registry.
    RegistryFrozen { type_name: &'static str },
    /// A component type was used before it was registered.
    UnregisteredComponent { type_name: &'static str },
    /// Contradictory `before`/`after` constraints in an ordered insertion.
    OrderConflict {
        item: String,
        after: String,
        before: String,
        sequence: Vec<String>,
    },
    /// A system was added to a phase that is not part of the phase graph.
    UnknownPhase(&'static str),
    /// A system was bound to a context created by another `World`.
    ForeignContext { system: &'static str },
    /// A relationship set already bound to one slot was associated with another.
    RelationshipRebound {
        bound_to: (u32, Entity),
        attempted: (u32, Entity),
    },
    /// The entity was never added to any set of this relationship type.
    NotInRelationship {
        entity: Entity,
        component: &'static str,
    },
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::RegistryFrozen { type_name } => write!(
                f,
                "cannot register component `{type_name}`: the registry was frozen when the first World was created"
            ),
            EcsError::UnregisteredComponent { type_name } => {
                write!(f, "component `{type_name}` is not registered")
            }
            EcsError::OrderConflict {
                item,
                after,
                before,
                sequence,
            } => write!(
                f,
                "cannot place `{item}` after `{after}` and before `{before}`; current order: [{}]",
                sequence.join(", ")
            ),
            EcsError::UnknownPhase(name) => write!(f, "phase `{name}` is not declared"),
            EcsError::ForeignContext { system } => write!(
                f,
                "system `{system}` was given a context that belongs to another World"
            ),
            EcsError::RelationshipRebound {
                bound_to,
                attempted,
            } => write!(
                f,
                "relationship set is bound to component #{} on {}; cannot rebind it to component #{} on {}",
                bound_to.0, bound_to.1, attempted.0, attempted.1
            ),
            EcsError::NotInRelationship { entity, component } => write!(
                f,
                "{entity} was never added to a `{component}` relationship"
            ),
        }
    }
}

impl std::error::Error for EcsError {}
