//! # Kerfi — ECS Runtime Core
//!
//! A store of entities and typed components plus a phase-ordered scheduler
//! that drives per-frame logic over it. Systems track their matching
//! entities incrementally, relationship components keep reverse indices in
//! sync, and context handles let independent sub-worlds share one store.
//!
//! Register component types first, then build a [`World`](ecs::World)
//! (directly or through an [`App`](app::App)). Start with
//! `use kerfi::prelude::*`.

pub mod app;
pub mod diag;
pub mod ecs;
pub mod error;
pub mod prelude;
pub mod time;

#[cfg(test)]
pub(crate) mod test_support;
