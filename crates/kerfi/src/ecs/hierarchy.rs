//! # Entity Hierarchies — `ChildOf` as a One-to-Many Edge
//!
//! [`ChildOf`] is the built-in relationship component and always has
//! component id 0. A child points at its parent; the store's reverse index
//! keeps the parent's child set:
//!
//! ```ignore
//! let parent = world.create_empty();
//! let child = world.create((ChildOf(parent), Position::ZERO));
//! assert!(world.children(parent).contains(&child));
//!
//! world.destroy(parent);
//! // The child survives but is no longer a child of anything.
//! assert!(world.get::<ChildOf>(child).is_none());
//! ```
//!
//! There is no `Children` component to keep in sync by hand. Re-parenting is
//! just `world.insert(child, ChildOf(other))`.

use std::collections::BTreeSet;

use super::component::Component;
use super::entity::Entity;
use super::world::World;

/// Marks an entity as a child of another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildOf(pub Entity);

impl Component for ChildOf {
    fn collection_owner(&self) -> Option<Entity> {
        Some(self.0)
    }
}

impl World {
    /// Entities whose `ChildOf` points at `parent`.
    pub fn children(&self, parent: Entity) -> &BTreeSet<Entity> {
        self.get_collected(parent, self.storage().require_id::<ChildOf>())
    }

    /// The parent of `child`, if it has one.
    pub fn parent(&self, child: Entity) -> Option<Entity> {
        self.get::<ChildOf>(child).map(|c| c.0)
    }

    /// Walks `ChildOf` links upward from `entity`, nearest parent first.
    ///
    /// Stops at the first repeated entity, so a cycle ends the walk.
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        let mut seen = BTreeSet::from([entity]);
        let mut out = Vec::new();
        let mut current = entity;
        while let Some(parent) = self.parent(current) {
            if !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Every entity below `root`, breadth-first.
    pub fn descendants(&self, root: Entity) -> Vec<Entity> {
        let mut seen = BTreeSet::from([root]);
        let mut out = Vec::new();
        let mut frontier = vec![root];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for parent in frontier {
                for &child in self.children(parent) {
                    if seen.insert(child) {
                        out.push(child);
                        next.push(child);
                    }
                }
            }
            frontier = next;
        }
        out
    }
}
