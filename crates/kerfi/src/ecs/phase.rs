//! # Phases — The Fixed Stages of a Frame
//!
//! A tick walks the phases in order and, inside each phase, the systems in
//! the order they were placed:
//!
//! ```text
//! Load → Impetus → Action → Reaction → Correction → PreRender → Render → Advance
//!  │
//!  └─ [AssetLoader, SceneSwitch]      ← OrderedList<SystemKey>, fixed at add time
//! ```
//!
//! Phases are named values rather than an enum so a [`PhaseGraph`] can be
//! built with extra stages; adding a system to a name the graph doesn't know
//! is [`EcsError::UnknownPhase`].
//!
//! Inside a phase a system is identified by its [`SystemKey`]: the system's
//! type plus the identity of the context it is bound to. The same type may
//! run once per context, and adding the same pair twice is a no-op.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use super::component::short_type_name;
use super::context::ContextKey;
use super::ordered::OrderedList;
use crate::error::EcsError;

/// A named stage of the frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Phase(&'static str);

impl Phase {
    pub const LOAD: Phase = Phase("Load");
    pub const IMPETUS: Phase = Phase("Impetus");
    pub const ACTION: Phase = Phase("Action");
    pub const REACTION: Phase = Phase("Reaction");
    pub const CORRECTION: Phase = Phase("Correction");
    pub const PRE_RENDER: Phase = Phase("PreRender");
    pub const RENDER: Phase = Phase("Render");
    pub const ADVANCE: Phase = Phase("Advance");

    /// The standard stages in execution order.
    pub const STANDARD: [Phase; 8] = [
        Phase::LOAD,
        Phase::IMPETUS,
        Phase::ACTION,
        Phase::REACTION,
        Phase::CORRECTION,
        Phase::PRE_RENDER,
        Phase::RENDER,
        Phase::ADVANCE,
    ];

    /// A custom phase. Add it to a [`PhaseGraph`] before use.
    pub const fn new(name: &'static str) -> Self {
        Phase(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identity of a system inside a phase: its type plus its bound context.
#[derive(Clone, Copy, Debug)]
pub struct SystemKey {
    pub(crate) system: TypeId,
    pub(crate) context: ContextKey,
    pub(crate) name: &'static str,
}

impl SystemKey {
    pub(crate) fn of<S: 'static>(context: ContextKey) -> Self {
        Self {
            system: TypeId::of::<S>(),
            context,
            name: std::any::type_name::<S>(),
        }
    }
}

impl PartialEq for SystemKey {
    fn eq(&self, other: &Self) -> bool {
        self.system == other.system && self.context == other.context
    }
}

impl Eq for SystemKey {}

impl std::hash::Hash for SystemKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.system.hash(state);
        self.context.hash(state);
    }
}

impl fmt::Display for SystemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_type_name(self.name))
    }
}

/// The phase sequence plus each phase's system order.
#[derive(Clone, Debug, Default)]
pub struct PhaseGraph {
    order: OrderedList<Phase>,
    systems: HashMap<Phase, OrderedList<SystemKey>>,
}

impl PhaseGraph {
    /// A graph with no phases.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The eight standard phases, each placed after the previous one.
    pub fn standard() -> Self {
        let mut graph = Self::empty();
        for phase in Phase::STANDARD {
            graph.order.push(phase);
            graph.systems.insert(phase, OrderedList::new());
        }
        graph
    }

    /// Places `phase` relative to phases already in the graph.
    pub fn add_phase(&mut self, phase: Phase, before: &[Phase], after: &[Phase]) -> Result<bool, EcsError> {
        let added = self.order.add(phase, before, after)?;
        if added {
            self.systems.insert(phase, OrderedList::new());
        }
        Ok(added)
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.systems.contains_key(&phase)
    }

    /// Phases in execution order.
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.order.iter().copied()
    }

    /// Systems of `phase` in execution order.
    pub fn systems_in(&self, phase: Phase) -> &[SystemKey] {
        self.systems.get(&phase).map(OrderedList::as_slice).unwrap_or(&[])
    }

    /// Inserts `key` into `phase`. `Ok(false)` if it was already there.
    pub(crate) fn insert_system(
        &mut self,
        phase: Phase,
        key: SystemKey,
        before: &[SystemKey],
        after: &[SystemKey],
    ) -> Result<bool, EcsError> {
        let list = self
            .systems
            .get_mut(&phase)
            .ok_or(EcsError::UnknownPhase(phase.name()))?;
        list.add(key, before, after)
    }

    pub(crate) fn has_system(&self, phase: Phase, key: &SystemKey) -> bool {
        self.systems.get(&phase).is_some_and(|list| list.contains(key))
    }

    /// Every system key in execution order across all phases.
    pub(crate) fn execution_order(&self) -> impl Iterator<Item = (Phase, &SystemKey)> + '_ {
        self.order
            .iter()
            .flat_map(move |&phase| self.systems_in(phase).iter().map(move |key| (phase, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Physics;
    struct Input;

    fn ctx(n: usize) -> ContextKey {
        ContextKey::from_raw(n)
    }

    #[test]
    fn standard_order() {
        let graph = PhaseGraph::standard();
        let names: Vec<_> = graph.phases().map(Phase::name).collect();
        assert_eq!(
            names,
            ["Load", "Impetus", "Action", "Reaction", "Correction", "PreRender", "Render", "Advance"]
        );
        assert!(Phase::STANDARD.iter().all(|&phase| graph.contains(phase)));
        assert!(graph.systems_in(Phase::RENDER).is_empty());
    }

    #[test]
    fn custom_phase_slots_between() {
        let mut graph = PhaseGraph::standard();
        let late_physics = Phase::new("LatePhysics");
        graph
            .add_phase(late_physics, &[Phase::CORRECTION], &[Phase::REACTION])
            .unwrap();
        let names: Vec<_> = graph.phases().map(Phase::name).collect();
        assert_eq!(names[3..6], ["Reaction", "LatePhysics", "Correction"]);
    }

    #[test]
    fn unknown_phase_is_an_error() {
        let mut graph = PhaseGraph::standard();
        let key = SystemKey::of::<Physics>(ctx(1));
        let err = graph.insert_system(Phase::new("Nowhere"), key, &[], &[]).unwrap_err();
        assert_eq!(err, EcsError::UnknownPhase("Nowhere"));
    }

    #[test]
    fn key_is_type_plus_context() {
        let mut graph = PhaseGraph::standard();
        let a = SystemKey::of::<Physics>(ctx(1));
        let b = SystemKey::of::<Physics>(ctx(2));
        assert_eq!(graph.insert_system(Phase::ACTION, a, &[], &[]), Ok(true));
        assert_eq!(graph.insert_system(Phase::ACTION, a, &[], &[]), Ok(false));
        assert_eq!(graph.insert_system(Phase::ACTION, b, &[], &[]), Ok(true));
        assert_eq!(graph.systems_in(Phase::ACTION).len(), 2);
    }

    #[test]
    fn execution_order_walks_phases_then_systems() {
        let mut graph = PhaseGraph::standard();
        let physics = SystemKey::of::<Physics>(ctx(1));
        let input = SystemKey::of::<Input>(ctx(1));
        graph.insert_system(Phase::ACTION, physics, &[], &[]).unwrap();
        graph.insert_system(Phase::LOAD, input, &[], &[]).unwrap();
        let order: Vec<_> = graph.execution_order().map(|(p, k)| (p, k.to_string())).collect();
        assert_eq!(
            order,
            vec![(Phase::LOAD, "Input".to_string()), (Phase::ACTION, "Physics".to_string())]
        );
    }
}
