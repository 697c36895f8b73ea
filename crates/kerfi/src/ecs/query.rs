//! # Query and Bundle — Typed Tuples Over the Erased Store
//!
//! Two small traits connect Rust types to the type-erased tables:
//!
//! - [`Query`] names the components a system requires, in the positional
//!   order its callbacks receive them. `(&Position, &Velocity)` resolves to
//!   `(&Position, &Velocity)` for one entity, or `None` if any is missing.
//! - [`Bundle`] is a tuple of owned values to attach in one call:
//!   `world.create((Position::ZERO, Velocity::ZERO))`.
//!
//! Both are implemented for tuples up to eight elements with `macro_rules!`.
//!
//! ```text
//! impl System for Mover {
//!     type Query = (&'static Position, &'static Velocity);
//!     fn on_set(&mut self, e: Entity, (pos, vel): (&Position, &Velocity)) { .. }
//! }
//! ```
//!
//! ## Comparison
//!
//! - **hecs**: `Query` on reference tuples, same idea.
//! - **bevy_ecs**: `QueryData` plus filters and change ticks. Here a query is
//!   only a membership requirement and a fetch; change tracking is the
//!   store's job (systems are told about every change as it happens).

use std::any::{TypeId, type_name};

use super::component::{Boxed, Component, Storage};
use super::entity::{ComponentId, Entity};
use crate::error::EcsError;

/// A set of required component types and how to read them for one entity.
pub trait Query {
    /// Borrowed values for one entity.
    type Item<'w>: Copy;

    /// Appends the ids of every required type, in positional order.
    fn component_ids(storage: &Storage, out: &mut Vec<ComponentId>) -> Result<(), EcsError>;

    /// Reads every required component of `entity`, or `None` if one is missing.
    fn fetch(storage: &Storage, entity: Entity) -> Option<Self::Item<'_>>;
}

/// Shared read of one component.
impl<T: Component> Query for &T {
    type Item<'w> = &'w T;

    fn component_ids(storage: &Storage, out: &mut Vec<ComponentId>) -> Result<(), EcsError> {
        out.push(storage.try_id::<T>()?);
        Ok(())
    }

    fn fetch(storage: &Storage, entity: Entity) -> Option<Self::Item<'_>> {
        storage.get::<T>(entity)
    }
}

/// No required components: every entity in the context matches.
impl Query for () {
    type Item<'w> = ();

    fn component_ids(_storage: &Storage, _out: &mut Vec<ComponentId>) -> Result<(), EcsError> {
        Ok(())
    }

    fn fetch(_storage: &Storage, _entity: Entity) -> Option<()> {
        Some(())
    }
}

macro_rules! impl_query_tuple {
    ($($Q:ident),+) => {
        impl<$($Q: Query),+> Query for ($($Q,)+) {
            type Item<'w> = ($($Q::Item<'w>,)+);

            fn component_ids(storage: &Storage, out: &mut Vec<ComponentId>) -> Result<(), EcsError> {
                $($Q::component_ids(storage, out)?;)+
                Ok(())
            }

            fn fetch(storage: &Storage, entity: Entity) -> Option<Self::Item<'_>> {
                Some(($($Q::fetch(storage, entity)?,)+))
            }
        }
    };
}

impl_query_tuple!(A);
impl_query_tuple!(A, B);
impl_query_tuple!(A, B, C);
impl_query_tuple!(A, B, C, D);
impl_query_tuple!(A, B, C, D, E);
impl_query_tuple!(A, B, C, D, E, F);
impl_query_tuple!(A, B, C, D, E, F, G);
impl_query_tuple!(A, B, C, D, E, F, G, H);

// ── Bundles ─────────────────────────────────────────────────────────────

/// Components staged for attachment, in the order they were given.
pub struct Staged {
    pub(crate) items: Vec<StagedComponent>,
}

pub(crate) struct StagedComponent {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) value: Boxed,
}

impl Staged {
    pub(crate) fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Stages one component value.
    pub fn push<T: Component>(&mut self, value: T) {
        self.items.push(StagedComponent {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value: Box::new(value),
        });
    }
}

/// A tuple of component values attached together.
///
/// ```ignore
/// let e = world.create((Position::ZERO, Health(10)));
/// world.set(e, (Velocity::new(1.0, 0.0),));
/// ```
pub trait Bundle: 'static {
    fn stage(self, staged: &mut Staged);
}

impl Bundle for () {
    fn stage(self, _staged: &mut Staged) {}
}

macro_rules! impl_bundle_tuple {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            #[allow(non_snake_case)]
            fn stage(self, staged: &mut Staged) {
                let ($($T,)+) = self;
                $(staged.push($T);)+
            }
        }
    };
}

impl_bundle_tuple!(A);
impl_bundle_tuple!(A, B);
impl_bundle_tuple!(A, B, C);
impl_bundle_tuple!(A, B, C, D);
impl_bundle_tuple!(A, B, C, D, E);
impl_bundle_tuple!(A, B, C, D, E, F);
impl_bundle_tuple!(A, B, C, D, E, F, G);
impl_bundle_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Health, Position, Velocity};

    #[test]
    fn tuple_ids_keep_positional_order() {
        let world = test_support::world();
        let storage = world.storage();
        let mut ids = Vec::new();
        <(&Velocity, &Position)>::component_ids(storage, &mut ids).unwrap();
        assert_eq!(
            ids,
            vec![storage.require_id::<Velocity>(), storage.require_id::<Position>()]
        );
    }

    #[test]
    fn unregistered_type_is_reported() {
        #[derive(Debug)]
        struct Ghost;
        impl Component for Ghost {}

        let world = test_support::world();
        let mut ids = Vec::new();
        let err = <(&Position, &Ghost)>::component_ids(world.storage(), &mut ids).unwrap_err();
        assert!(matches!(err, EcsError::UnregisteredComponent { .. }));
    }

    #[test]
    fn fetch_requires_every_component() {
        let mut world = test_support::world();
        let both = world.create((Position { x: 1.0, y: 2.0 }, Velocity { dx: 3.0, dy: 4.0 }));
        let one = world.create((Position { x: 0.0, y: 0.0 },));

        let (p, v) = <(&Position, &Velocity)>::fetch(world.storage(), both).unwrap();
        assert_eq!((p.x, v.dy), (1.0, 4.0));
        assert!(<(&Position, &Velocity)>::fetch(world.storage(), one).is_none());
        assert!(<()>::fetch(world.storage(), one).is_some());
    }

    #[test]
    fn bundle_stages_in_order() {
        let mut staged = Staged::new();
        (Health(3), Position { x: 0.0, y: 0.0 }).stage(&mut staged);
        let ids: Vec<_> = staged.items.iter().map(|s| s.type_id).collect();
        assert_eq!(ids, vec![TypeId::of::<Health>(), TypeId::of::<Position>()]);
    }
}
