//! Entity Hierarchies — solar system demo.
//!
//! Planets orbit the sun, moons orbit their planet, all through `ChildOf`.
//! An orbit system spins local offsets; a propagation system in a later
//! phase walks each entity's ancestors to compute its world position.
//! Halfway through, one planet is despawned together with its subtree.
//!
//! Run with: `RUST_LOG=debug cargo run -p kerfi --example scene_hierarchy`

use glam::Vec2;
use kerfi::prelude::*;

// ── Components ──────────────────────────────────────────────────────────

/// Offset from the parent, or from the origin for roots.
#[derive(Debug, Clone, Copy)]
struct Local(Vec2);
impl Component for Local {}

#[derive(Debug, Clone, Copy, Default)]
struct WorldPos(Vec2);
impl Component for WorldPos {}

#[derive(Debug, Clone, Copy)]
struct Orbit {
    /// Radians per second.
    speed: f32,
}
impl Component for Orbit {}

#[derive(Debug)]
struct Scene;

// ── Systems ─────────────────────────────────────────────────────────────

struct Spin;

impl System for Spin {
    type Query = (&'static Local, &'static Orbit);
    type Context = Scene;

    fn on_tick(&mut self, world: &mut World, tracked: &[Entity]) {
        let dt = world.clock().delta_secs();
        for &e in tracked {
            let Some(orbit) = world.get::<Orbit>(e).copied() else {
                continue;
            };
            let rotation = Vec2::from_angle(orbit.speed * dt);
            world.modify::<Local>(e, |local| local.0 = rotation.rotate(local.0));
        }
    }
}

struct Propagate;

impl System for Propagate {
    type Query = (&'static Local, &'static WorldPos);
    type Context = Scene;

    fn per_entity(&mut self, world: &mut World, entity: Entity) {
        let mut position = world.get::<Local>(entity).map_or(Vec2::ZERO, |l| l.0);
        for ancestor in world.ancestors(entity) {
            if let Some(local) = world.get::<Local>(ancestor) {
                position += local.0;
            }
        }
        world.modify::<WorldPos>(entity, |p| p.0 = position);
    }
}

// ── Plugin ──────────────────────────────────────────────────────────────

struct SolarSystem;

impl Plugin for SolarSystem {
    fn register(&self) {
        register_component::<Local>();
        register_component::<WorldPos>();
        register_component::<Orbit>();
        register_component::<Context<Scene>>();
    }

    fn build(&self, world: &mut World) {
        let scene = world.create_context(Scene);
        world.add_system(Phase::ACTION, &scene, |_| Spin, Placement::new());
        world.add_system(Phase::CORRECTION, &scene, |_| Propagate, Placement::new());

        let sun = world.create((scene.clone(), Local(Vec2::ZERO), WorldPos::default()));
        for i in 0..3 {
            let radius = 120.0 + 80.0 * i as f32;
            let planet = world.create((
                scene.clone(),
                Local(Vec2::new(radius, 0.0)),
                WorldPos::default(),
                Orbit { speed: 1.0 / (i + 1) as f32 },
                ChildOf(sun),
            ));
            world.create((
                scene.clone(),
                Local(Vec2::new(25.0, 0.0)),
                WorldPos::default(),
                Orbit { speed: 4.0 },
                ChildOf(planet),
            ));
        }
    }
}

/// Destroys `root` and everything below it, deepest first.
fn despawn_recursive(world: &mut World, root: Entity) {
    let mut doomed = world.descendants(root);
    doomed.reverse();
    doomed.push(root);
    for e in doomed {
        world.destroy(e);
    }
}

fn main() {
    let mut world = App::new().with_logger().add_plugin(SolarSystem).build();

    let sun = world
        .entities()
        .find(|&e| world.has::<Local>(e) && world.parent(e).is_none())
        .expect("sun was spawned by the plugin");

    let mut t = 0.0;
    for frame in 0..120 {
        t += 1000.0 / 60.0;
        world.advance_to(t);

        if frame != 60 {
            continue;
        }
        let first = world.children(sun).iter().next().copied();
        if let Some(planet) = first {
            log::info!("despawning {planet} and its moons");
            despawn_recursive(&mut world, planet);
        }
    }

    for planet in world.children(sun).clone() {
        let p = world.get::<WorldPos>(planet).map_or(Vec2::ZERO, |p| p.0);
        println!("{planet} at ({:.1}, {:.1})", p.x, p.y);
        for moon in world.children(planet) {
            let m = world.get::<WorldPos>(*moon).map_or(Vec2::ZERO, |p| p.0);
            println!("  {moon} at ({:.1}, {:.1})", m.x, m.y);
        }
    }
    println!("{} entities after {} frames", world.entity_count(), world.clock().frame());
}
