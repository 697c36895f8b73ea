//! Two sub-worlds sharing one store: context isolation, pausing, ordering
//! and relationship cleanup through the public API.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use kerfi::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}
impl Component for Velocity {}

#[derive(Debug, Default)]
struct Team {
    members: RelationshipSet,
}
impl Component for Team {
    fn relationship_set(&mut self) -> Option<&mut RelationshipSet> {
        Some(&mut self.members)
    }
}

#[derive(Debug)]
struct Screen(&'static str);

type Log = Rc<RefCell<Vec<String>>>;

struct Movement {
    log: Log,
}

impl System for Movement {
    type Query = (&'static Position, &'static Velocity);
    type Context = Screen;

    fn on_added(&mut self, entity: Entity, _: (&Position, &Velocity)) {
        self.log.borrow_mut().push(format!("added {}", entity.index()));
    }

    fn on_removed(&mut self, entity: Entity) {
        self.log.borrow_mut().push(format!("removed {}", entity.index()));
    }

    fn per_entity(&mut self, world: &mut World, entity: Entity) {
        let Some(v) = world.get::<Velocity>(entity).copied() else {
            return;
        };
        world.modify::<Position>(entity, |p| {
            p.x += v.dx;
            p.y += v.dy;
        });
    }
}

struct Stamp {
    log: Log,
    label: &'static str,
}

impl System for Stamp {
    type Query = ();
    type Context = Screen;

    fn name(&self) -> String {
        self.label.to_string()
    }

    fn on_tick(&mut self, _world: &mut World, _tracked: &[Entity]) {
        self.log.borrow_mut().push(self.label.to_string());
    }
}

fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        register_component::<Position>();
        register_component::<Velocity>();
        register_component::<Team>();
        register_component::<Context<Screen>>();
    });
}

#[test]
fn contexts_isolate_systems() {
    setup();
    let mut world = World::new();
    let menu = world.create_context(Screen("menu"));
    let level = world.create_context(Screen("level"));

    let log: Log = Rc::default();
    let in_level = log.clone();
    world.add_system(Phase::ACTION, &level, |_| Movement { log: in_level }, Placement::new());

    let still = Velocity { dx: 1.0, dy: 0.0 };
    let a = world.create((level.clone(), Position { x: 0.0, y: 0.0 }, still));
    let b = world.create((menu.clone(), Position { x: 0.0, y: 0.0 }, still));

    world.advance_to(0.0);
    world.advance_to(16.0);
    assert_eq!(world.get::<Position>(a), Some(&Position { x: 2.0, y: 0.0 }));
    assert_eq!(world.get::<Position>(b), Some(&Position { x: 0.0, y: 0.0 }));

    level.set_paused(true);
    world.advance_to(32.0);
    assert_eq!(world.get::<Position>(a).map(|p| p.x), Some(2.0));
    level.set_paused(false);

    // Moving the entity to the other context drops it from the system.
    world.insert(a, menu.clone());
    assert!(world.destroy(b));
    assert_eq!(
        *log.borrow(),
        vec![format!("added {}", a.index()), format!("removed {}", a.index())]
    );
}

#[test]
fn placement_orders_systems_in_a_phase() {
    setup();
    let mut world = World::new();
    let level = world.create_context(Screen("level"));
    let log: Log = Rc::default();

    let first = log.clone();
    world.add_system(
        Phase::ACTION,
        &level,
        |_| Stamp { log: first, label: "stamp" },
        Placement::new(),
    );
    let second = log.clone();
    world.add_system(
        Phase::ACTION,
        &level,
        |_| Movement { log: second },
        Placement::new().before::<Stamp>(),
    );

    let order: Vec<&str> = world.scheduled_systems().into_iter().map(|(_, name)| name).collect();
    assert_eq!(order, vec!["Movement", "stamp"]);

    // Same type, same phase, same context: refused without calling the factory.
    assert!(!world.add_system(
        Phase::ACTION,
        &level,
        |_| -> Stamp { unreachable!() },
        Placement::new(),
    ));
}

#[test]
fn foreign_context_is_rejected() {
    setup();
    let mut world = World::new();
    let other = World::new();
    let theirs = other.create_context(Screen("theirs"));
    let log: Log = Rc::default();
    let result = world.try_add_system(Phase::ACTION, &theirs, |_| Movement { log }, Placement::new());
    assert!(matches!(result, Err(EcsError::ForeignContext { .. })));
}

#[test]
fn destroyed_members_leave_relationship_sets() {
    setup();
    let mut world = World::new();
    let team = component_id::<Team>();
    let a = world.create_empty();
    let b = world.create_empty();
    let c = world.create_empty();

    let mut members = RelationshipSet::new();
    members.add(a);
    members.add(b);
    let red = world.create((Team { members },));
    world.get_mut::<Team>(red).unwrap().members.add(c);

    assert_eq!(world.relation_owners(c, team).into_iter().collect::<Vec<_>>(), vec![red]);
    assert_eq!(
        world.sharing_cell(a, team).unwrap().into_iter().collect::<Vec<_>>(),
        vec![b, c]
    );

    world.destroy(b);
    assert!(!world.get::<Team>(red).unwrap().members.contains(b));
    assert!(world.sharing_cell(b, team).is_err());

    world.destroy(red);
    assert!(world.relation_owners(a, team).is_empty());
}
