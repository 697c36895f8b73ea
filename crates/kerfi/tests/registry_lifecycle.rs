//! Registry behavior before and after the first world.
//!
//! Runs in its own process so the registry starts empty. Everything lives in
//! one test because the registry is process-wide.

use kerfi::ecs::{
    component_info, is_frozen, prerequisites_of, registered_components, try_register_component,
};
use kerfi::prelude::*;

#[derive(Debug)]
struct Position;
impl Component for Position {}

#[derive(Debug)]
struct Sprite;
impl Component for Sprite {}

#[derive(Debug)]
struct Tint;
impl Component for Tint {}

#[derive(Debug)]
struct Late;
impl Component for Late {}

#[test]
fn registry_lifecycle() {
    assert!(!is_frozen());
    assert_eq!(component_id::<ChildOf>().index(), 0);

    let position = register_component::<Position>();
    let sprite = register_component::<Sprite>();
    let tint = register_component_requiring::<Tint>(&[sprite]);
    assert_eq!(position.index(), 1);
    assert_eq!(sprite.index(), 2);
    assert_eq!(tint.index(), 3);

    // Registering again hands back the same id.
    assert_eq!(register_component::<Sprite>(), sprite);
    assert_eq!(prerequisites_of(tint), vec![sprite]);
    assert_eq!(component_info(tint).unwrap().short_name(), "Tint");

    let mut world = World::new();
    assert!(is_frozen());

    // Component ids and entities share one numbering space.
    let first = world.create_empty();
    assert_eq!(first.index() as usize, registered_components().len());
    assert!(!world.destroy(position.as_entity()));

    match try_register_component::<Late>() {
        Err(EcsError::RegistryFrozen { type_name }) => assert!(type_name.ends_with("Late")),
        other => panic!("expected RegistryFrozen, got {other:?}"),
    }
    // Known types are still fine after the freeze.
    assert_eq!(try_register_component::<Position>().unwrap(), position);

    // A second world starts from the same snapshot.
    let mut second = World::new();
    assert_eq!(second.create_empty(), first);
}
