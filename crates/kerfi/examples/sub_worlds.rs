//! Sub-worlds — two screens sharing one store.
//!
//! A menu and a level each get their own `Context<Screen>`. The same
//! `Drift` system type is added once per context, so each instance only
//! sees its own screen's entities. The menu is paused after a few frames
//! and the level keeps moving. Squads use a relationship set, so the store
//! always knows which squad an entity is in and who else shares it.
//!
//! Run with: `RUST_LOG=kerfi=debug cargo run -p kerfi --example sub_worlds`

use glam::Vec2;
use kerfi::diag;
use kerfi::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Position(Vec2);
impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec2);
impl Component for Velocity {}

#[derive(Debug, Default)]
struct Squad {
    members: RelationshipSet,
}
impl Component for Squad {
    fn relationship_set(&mut self) -> Option<&mut RelationshipSet> {
        Some(&mut self.members)
    }
}

#[derive(Debug)]
struct Screen {
    title: &'static str,
}

/// Moves everything in its screen by its velocity.
struct Drift {
    title: &'static str,
}

impl System for Drift {
    type Query = (&'static Position, &'static Velocity);
    type Context = Screen;

    fn name(&self) -> String {
        format!("Drift<{}>", self.title)
    }

    fn on_added(&mut self, entity: Entity, (p, _): (&Position, &Velocity)) {
        log::info!("{}: {entity} joined at {}", self.title, p.0);
    }

    fn on_removed(&mut self, entity: Entity) {
        log::info!("{}: {entity} left", self.title);
    }

    fn per_entity(&mut self, world: &mut World, entity: Entity) {
        let dt = world.clock().delta_secs();
        let Some(v) = world.get::<Velocity>(entity).copied() else {
            return;
        };
        world.modify::<Position>(entity, |p| p.0 += v.0 * dt);
    }
}

fn main() {
    diag::init_logger();

    register_component::<Position>();
    register_component::<Velocity>();
    register_component::<Squad>();
    register_component::<Context<Screen>>();

    let mut world = World::new();
    let menu = world.create_context(Screen { title: "menu" });
    let level = world.create_context(Screen { title: "level" });

    for screen in [&menu, &level] {
        let title = screen.title;
        world.add_system(Phase::ACTION, screen, |_| Drift { title }, Placement::new());
    }

    let cursor = world.create((
        menu.clone(),
        Position(Vec2::ZERO),
        Velocity(Vec2::new(0.0, 10.0)),
    ));
    let mut soldiers = Vec::new();
    for i in 0..4 {
        soldiers.push(world.create((
            level.clone(),
            Position(Vec2::new(i as f32 * 10.0, 0.0)),
            Velocity(Vec2::new(30.0, 0.0)),
        )));
    }

    let alpha = world.create((Squad {
        members: soldiers[..2].iter().copied().collect(),
    },));
    let bravo = world.create((Squad {
        members: soldiers[2..].iter().copied().collect(),
    },));

    let mut t = 0.0;
    for frame in 0..30 {
        t += 1000.0 / 30.0;
        world.advance_to(t);
        if frame == 10 {
            log::info!("pausing {}", menu.title);
            menu.set_paused(true);
        }
    }

    // Out-of-order timestamps are rejected and logged.
    world.advance_to(0.0);

    let squad = component_id::<Squad>();
    let first = soldiers[0];
    println!("{first} is in squad(s) {:?}", world.relation_owners(first, squad));
    println!("{first} shares a squad with {:?}", world.sharing_cell(first, squad));

    // Losing a soldier updates its squad in place.
    world.destroy(soldiers[3]);
    let left: Vec<Entity> = world
        .get::<Squad>(bravo)
        .map(|s| s.members.iter().collect())
        .unwrap_or_default();
    let alpha_size = world.get::<Squad>(alpha).map_or(0, |s| s.members.len());
    println!("bravo now has {left:?}, alpha has {alpha_size}");

    println!("cursor: {:?}", world.get::<Position>(cursor));
    for (phase, name) in world.scheduled_systems() {
        println!("[{phase}] {name}");
    }
    for warning in diag::drain_warnings(16) {
        println!("captured {}: {}", warning.level, warning.message);
    }

    #[cfg(feature = "diagnostics")]
    println!("{}", world.report().to_json());
}
