//! Convenience re-exports: `use kerfi::prelude::*` for the common items.

pub use crate::app::{App, Plugin};
pub use crate::ecs::{
    ChildOf, Component, ComponentId, ComponentMut, Context, Entity, Phase, PhaseGraph, Placement,
    RelationshipSet, System, World, component_id, register_component,
    register_component_requiring,
};
pub use crate::error::EcsError;
pub use crate::time::Clock;

#[cfg(feature = "diagnostics")]
pub use crate::diag::{EntitySnapshot, PrerequisiteGap, SystemTiming};
