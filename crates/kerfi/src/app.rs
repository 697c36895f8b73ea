//! App builder and plugin system.
//!
//! Surrounding modules (rendering, audio, input, tile maps) plug into the
//! core the same way: they register component types while the registry is
//! still open, then add contexts, systems and entities to the finished
//! world.
//!
//! ## Example
//!
//! ```ignore
//! use kerfi::prelude::*;
//!
//! let mut world = App::new()
//!     .with_logger()
//!     .add_plugin(InputPlugin)
//!     .add_plugin(GameplayPlugin)
//!     .build();
//!
//! let mut t = 0.0;
//! loop {
//!     t += 16.0;
//!     world.advance_to(t);
//! }
//! ```
//!
//! `add_plugin` calls [`Plugin::register`] immediately, so every plugin's
//! types are in before [`App::build`] creates the world and freezes the
//! registry. `build` then calls [`Plugin::build`] in the order the plugins
//! were added.

use crate::ecs::phase::PhaseGraph;
use crate::ecs::world::World;

/// A unit of setup contributed by one module.
pub trait Plugin {
    /// Registers component types. Runs before any world exists.
    fn register(&self) {}

    /// Adds contexts, systems and entities to the new world.
    fn build(&self, world: &mut World);

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Collects plugins, then builds a [`World`].
pub struct App {
    plugins: Vec<Box<dyn Plugin>>,
    phases: PhaseGraph,
}

impl App {
    /// An app with the standard phases and no plugins.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            phases: PhaseGraph::standard(),
        }
    }

    /// Installs the env_logger-backed logger (see [`crate::diag::init_logger`]).
    pub fn with_logger(self) -> Self {
        crate::diag::init_logger();
        self
    }

    /// Uses a custom phase graph instead of the standard one.
    pub fn with_phases(mut self, phases: PhaseGraph) -> Self {
        self.phases = phases;
        self
    }

    /// Registers the plugin's components now and queues its build step.
    pub fn add_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        plugin.register();
        log::debug!("registered plugin {}", plugin.name());
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Creates the world (freezing the registry) and runs every plugin's build.
    pub fn build(self) -> World {
        let mut world = World::with_phases(self.phases);
        for plugin in &self.plugins {
            plugin.build(&mut world);
            log::debug!("built plugin {}", plugin.name());
        }
        world
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::ecs::{Phase, Placement, System};
    use crate::test_support::{self, Level, Position};

    struct Spawner {
        count: usize,
        built: Rc<Cell<usize>>,
    }

    impl Plugin for Spawner {
        fn register(&self) {
            // Already registered by the fixtures; re-registering is allowed.
            crate::ecs::register_component::<Position>();
        }

        fn build(&self, world: &mut World) {
            for i in 0..self.count {
                world.create((Position { x: i as f32, y: 0.0 },));
            }
            self.built.set(self.built.get() + 1);
        }
    }

    struct Ticker;
    impl System for Ticker {
        type Query = ();
        type Context = Level;
    }

    struct Systems;
    impl Plugin for Systems {
        fn build(&self, world: &mut World) {
            let level = world.create_context(Level { name: "app" });
            world.add_system(Phase::ACTION, &level, |_| Ticker, Placement::new());
        }
    }

    #[test]
    fn build_runs_plugins_in_order() {
        test_support::init();
        let built = Rc::new(Cell::new(0));
        let world = App::new()
            .add_plugin(Spawner {
                count: 3,
                built: built.clone(),
            })
            .add_plugin(Systems)
            .build();

        assert_eq!(built.get(), 1);
        assert_eq!(world.entity_count(), 3);
        assert_eq!(world.scheduled_systems(), vec![(Phase::ACTION, "Ticker")]);
    }

    #[test]
    fn custom_phases_are_used() {
        test_support::init();
        let mut phases = PhaseGraph::empty();
        phases.add_phase(Phase::new("Only"), &[], &[]).unwrap();
        let world = App::new().with_phases(phases).build();
        assert_eq!(world.phases().phases().count(), 1);
    }
}
