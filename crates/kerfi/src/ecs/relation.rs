//! # Relationship Sets — Many-to-Many Links That Index Themselves
//!
//! A [`RelationshipSet`] is a set of entities embedded in a component. Once
//! the component is attached, the set binds to that exact `(component type,
//! owner entity)` slot and from then on every mutation writes through to the
//! store's relation index in the same call:
//!
//! ```text
//! world.insert(squad, Members::default());           // binds (Members, squad)
//! world.get_mut::<Members>(squad).unwrap().set.add(alice);
//!
//!   forward:  (Members, squad) → { alice }
//!   reverse:  (Members, alice) → { squad }           ← updated by `add`
//! ```
//!
//! There is no reconciliation pass, so the forward set and the reverse index
//! can't drift apart. Detaching the component (remove, take, destroy) unlinks
//! every member; the set stays bound to its slot and may only be re-attached
//! there.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use super::entity::{ComponentId, Entity};
use crate::error::EcsError;

/// Both directions of every bound relationship set in one store.
#[derive(Default)]
pub(crate) struct RelationIndex {
    /// `(type, member) → owners whose set contains member`.
    owners: HashMap<(ComponentId, Entity), BTreeSet<Entity>>,
    /// `(type, owner) → members` mirror of each bound set.
    members: HashMap<(ComponentId, Entity), BTreeSet<Entity>>,
    /// Relationship types each member has ever joined.
    kinds: HashMap<Entity, BTreeSet<ComponentId>>,
}

pub(crate) type SharedRelationIndex = Rc<RefCell<RelationIndex>>;

impl RelationIndex {
    fn link(&mut self, component: ComponentId, owner: Entity, member: Entity) {
        self.owners.entry((component, member)).or_default().insert(owner);
        self.members.entry((component, owner)).or_default().insert(member);
        self.kinds.entry(member).or_default().insert(component);
    }

    fn unlink(&mut self, component: ComponentId, owner: Entity, member: Entity) {
        // The member keeps its (possibly empty) owner entry: it has joined this
        // relationship before, which is what `sharing_cell` distinguishes.
        if let Some(owners) = self.owners.get_mut(&(component, member)) {
            owners.remove(&owner);
        }
        if let Some(members) = self.members.get_mut(&(component, owner)) {
            members.remove(&member);
            if members.is_empty() {
                self.members.remove(&(component, owner));
            }
        }
    }

    pub(crate) fn owners_of(&self, component: ComponentId, member: Entity) -> Option<&BTreeSet<Entity>> {
        self.owners.get(&(component, member))
    }

    pub(crate) fn members_of(&self, component: ComponentId, owner: Entity) -> Option<&BTreeSet<Entity>> {
        self.members.get(&(component, owner))
    }

    /// Every `(type, owner)` slot whose set currently contains `member`.
    pub(crate) fn slots_containing(&self, member: Entity) -> Vec<(ComponentId, Entity)> {
        let Some(kinds) = self.kinds.get(&member) else {
            return Vec::new();
        };
        kinds
            .iter()
            .flat_map(|&component| {
                self.owners
                    .get(&(component, member))
                    .into_iter()
                    .flatten()
                    .map(move |&owner| (component, owner))
            })
            .collect()
    }

    /// Drops every trace of `member` once it belongs to no set.
    pub(crate) fn forget(&mut self, member: Entity) {
        if let Some(kinds) = self.kinds.remove(&member) {
            for component in kinds {
                self.owners.remove(&(component, member));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_clean(&self, entity: Entity) -> bool {
        !self.kinds.contains_key(&entity) && !self.members.keys().any(|&(_, owner)| owner == entity)
    }
}

/// Where a set is bound and, while attached, the index it writes through to.
struct Binding {
    component: ComponentId,
    owner: Entity,
    index: Option<SharedRelationIndex>,
}

/// A set of entities that keeps its store's reverse index in sync.
///
/// Embed it in a component and return it from
/// [`Component::relationship_set`](super::component::Component::relationship_set):
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Members { set: RelationshipSet }
/// impl Component for Members {
///     fn relationship_set(&mut self) -> Option<&mut RelationshipSet> { Some(&mut self.set) }
/// }
/// ```
#[derive(Default)]
pub struct RelationshipSet {
    entries: BTreeSet<Entity>,
    binding: Option<Binding>,
}

impl RelationshipSet {
    /// Creates an empty, unbound set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity`. Returns false if it was already present.
    pub fn add(&mut self, entity: Entity) -> bool {
        if !self.entries.insert(entity) {
            return false;
        }
        self.write_through(|index, component, owner| index.link(component, owner, entity));
        true
    }

    /// Removes `entity`. Returns false if it wasn't present.
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.entries.remove(&entity) {
            return false;
        }
        self.write_through(|index, component, owner| index.unlink(component, owner, entity));
        true
    }

    /// Replaces the contents with exactly `entity`.
    pub fn set_to_exactly_one(&mut self, entity: Entity) {
        self.set_to_exactly([entity]);
    }

    /// Replaces the contents with exactly `entities`, touching only the difference.
    pub fn set_to_exactly(&mut self, entities: impl IntoIterator<Item = Entity>) {
        let wanted: BTreeSet<Entity> = entities.into_iter().collect();
        let stale: Vec<Entity> = self.entries.difference(&wanted).copied().collect();
        for entity in stale {
            self.remove(entity);
        }
        for entity in wanted {
            self.add(entity);
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entries.iter().copied()
    }

    /// The `(type, owner)` slot this set is bound to, if any.
    pub fn bound_slot(&self) -> Option<(ComponentId, Entity)> {
        self.binding.as_ref().map(|b| (b.component, b.owner))
    }

    /// Returns true while attached and writing through to an index.
    pub(crate) fn is_linked(&self) -> bool {
        self.binding.as_ref().is_some_and(|b| b.index.is_some())
    }

    /// Binds to `(component, owner)` and links every current member.
    pub(crate) fn attach(
        &mut self,
        component: ComponentId,
        owner: Entity,
        index: &SharedRelationIndex,
    ) -> Result<(), EcsError> {
        if let Some(binding) = &self.binding {
            if (binding.component, binding.owner) != (component, owner) {
                return Err(EcsError::RelationshipRebound {
                    bound_to: (binding.component.index(), binding.owner),
                    attempted: (component.index(), owner),
                });
            }
        }
        {
            let mut idx = index.borrow_mut();
            for &member in &self.entries {
                idx.link(component, owner, member);
            }
        }
        self.binding = Some(Binding {
            component,
            owner,
            index: Some(Rc::clone(index)),
        });
        Ok(())
    }

    /// Unlinks every member and stops writing through. The slot binding stays.
    pub(crate) fn detach(&mut self) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        if let Some(index) = binding.index.take() {
            let mut idx = index.borrow_mut();
            for &member in &self.entries {
                idx.unlink(binding.component, binding.owner, member);
            }
        }
    }

    fn write_through(&self, f: impl FnOnce(&mut RelationIndex, ComponentId, Entity)) {
        if let Some(Binding {
            component,
            owner,
            index: Some(index),
        }) = &self.binding
        {
            f(&mut index.borrow_mut(), *component, *owner);
        }
    }
}

/// A bound set dropped in place (for example overwritten through
/// `World::get_mut`) unlinks its members.
impl Drop for RelationshipSet {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Clones are unbound copies of the members.
impl Clone for RelationshipSet {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            binding: None,
        }
    }
}

impl fmt::Debug for RelationshipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.iter()).finish()
    }
}

impl FromIterator<Entity> for RelationshipSet {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            binding: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: ComponentId = ComponentId(4);
    const OTHER: ComponentId = ComponentId(5);

    fn index() -> SharedRelationIndex {
        Rc::new(RefCell::new(RelationIndex::default()))
    }

    #[test]
    fn unbound_set_is_local_only() {
        let idx = index();
        let mut set = RelationshipSet::new();
        assert!(set.add(Entity(10)));
        assert!(!set.add(Entity(10)));
        assert!(idx.borrow().owners_of(KIND, Entity(10)).is_none());
        assert_eq!(set.bound_slot(), None);
    }

    #[test]
    fn attach_links_existing_members() {
        let idx = index();
        let mut set: RelationshipSet = [Entity(10), Entity(11)].into_iter().collect();
        set.attach(KIND, Entity(1), &idx).unwrap();

        let i = idx.borrow();
        assert!(i.owners_of(KIND, Entity(10)).unwrap().contains(&Entity(1)));
        assert_eq!(i.members_of(KIND, Entity(1)).unwrap().len(), 2);
    }

    #[test]
    fn mutations_write_through() {
        let idx = index();
        let mut set = RelationshipSet::new();
        set.attach(KIND, Entity(1), &idx).unwrap();

        set.add(Entity(20));
        set.add(Entity(21));
        set.remove(Entity(20));
        {
            let i = idx.borrow();
            assert!(i.owners_of(KIND, Entity(20)).unwrap().is_empty());
            assert!(i.owners_of(KIND, Entity(21)).unwrap().contains(&Entity(1)));
        }

        set.set_to_exactly([Entity(22), Entity(23)]);
        let i = idx.borrow();
        assert!(i.owners_of(KIND, Entity(21)).unwrap().is_empty());
        let members: Vec<_> = i.members_of(KIND, Entity(1)).unwrap().iter().copied().collect();
        assert_eq!(members, vec![Entity(22), Entity(23)]);
    }

    #[test]
    fn set_to_exactly_one_replaces_everything() {
        let idx = index();
        let mut set = RelationshipSet::new();
        set.attach(KIND, Entity(1), &idx).unwrap();
        set.set_to_exactly([Entity(5), Entity(6)]);
        set.set_to_exactly_one(Entity(7));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Entity(7)]);
        assert_eq!(idx.borrow().slots_containing(Entity(7)), vec![(KIND, Entity(1))]);
        assert!(idx.borrow().slots_containing(Entity(5)).is_empty());
    }

    #[test]
    fn rebinding_to_another_slot_fails() {
        let idx = index();
        let mut set = RelationshipSet::new();
        set.attach(KIND, Entity(1), &idx).unwrap();
        // Same slot again is fine.
        set.attach(KIND, Entity(1), &idx).unwrap();

        let err = set.attach(OTHER, Entity(1), &idx).unwrap_err();
        assert!(matches!(err, EcsError::RelationshipRebound { .. }));
        let err = set.attach(KIND, Entity(2), &idx).unwrap_err();
        assert!(matches!(err, EcsError::RelationshipRebound { .. }));
    }

    #[test]
    fn detach_unlinks_but_keeps_slot() {
        let idx = index();
        let mut set = RelationshipSet::new();
        set.attach(KIND, Entity(1), &idx).unwrap();
        assert!(set.is_linked());
        set.add(Entity(30));
        set.detach();
        assert!(!set.is_linked());

        assert!(idx.borrow().owners_of(KIND, Entity(30)).unwrap().is_empty());
        assert!(idx.borrow().members_of(KIND, Entity(1)).is_none());
        assert_eq!(set.bound_slot(), Some((KIND, Entity(1))));

        // Detached sets no longer write through.
        set.add(Entity(31));
        assert!(idx.borrow().owners_of(KIND, Entity(31)).is_none());
    }

    #[test]
    fn clone_is_unbound() {
        let idx = index();
        let mut set = RelationshipSet::new();
        set.add(Entity(3));
        set.attach(KIND, Entity(1), &idx).unwrap();
        let copy = set.clone();
        assert_eq!(copy.bound_slot(), None);
        assert!(copy.contains(Entity(3)));
    }

    #[test]
    fn forget_clears_member_entries() {
        let idx = index();
        let mut set = RelationshipSet::new();
        set.attach(KIND, Entity(1), &idx).unwrap();
        set.add(Entity(9));
        set.remove(Entity(9));
        assert!(!idx.borrow().is_clean(Entity(9)));
        idx.borrow_mut().forget(Entity(9));
        assert!(idx.borrow().is_clean(Entity(9)));
    }
}
