//! Shared fixtures for unit tests.
//!
//! The component registry is process-wide and freezes on the first `World`,
//! so every component type the unit tests use is registered here, once,
//! before any test creates a world.

use std::sync::Once;

use crate::ecs::{
    Component, Context, Entity, RelationshipSet, World, register_component,
    register_component_requiring,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}
impl Component for Velocity {}

/// Declares `Position` as a prerequisite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health(pub u32);
impl Component for Health {}

/// One-to-many edge: the follower is collected under its leader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Follows(pub Entity);
impl Component for Follows {
    fn collection_owner(&self) -> Option<Entity> {
        Some(self.0)
    }
}

/// Many-to-many edge through an embedded relationship set.
#[derive(Debug, Default)]
pub struct Squad {
    pub members: RelationshipSet,
}
impl Component for Squad {
    fn relationship_set(&mut self) -> Option<&mut RelationshipSet> {
        Some(&mut self.members)
    }
}

/// Context state used by test systems.
#[derive(Debug)]
pub struct Level {
    pub name: &'static str,
}

static INIT: Once = Once::new();

/// Registers every fixture type and freezes the registry.
pub fn init() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        let position = register_component::<Position>();
        register_component::<Velocity>();
        register_component_requiring::<Health>(&[position]);
        register_component::<Follows>();
        register_component::<Squad>();
        register_component::<Context<Level>>();
        register_component::<Context<()>>();
        drop(World::new());
    });
}

/// A fresh world over the fixture registry.
pub fn world() -> World {
    init();
    World::new()
}
