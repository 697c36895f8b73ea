//! # Context — Identity-Keyed Sub-Worlds
//!
//! A [`Context`] is an ordinary component whose *identity* decides which
//! systems may see an entity. Every system is bound to one context; an entity
//! is visible to it only if the entity's context component is the very same
//! handle, not merely one of the same type:
//!
//! ```text
//! let menu  = world.create_context(Screen::Menu);
//! let level = world.create_context(Screen::Level);
//!
//! world.create((menu.clone(),  Position::ZERO));   // seen by systems bound to `menu`
//! world.create((level.clone(), Position::ZERO));   // seen by systems bound to `level`
//! ```
//!
//! Both entities carry a `Context<Screen>`, yet a movement system added for
//! `level` never sees the menu entity. Several logical sub-worlds share one
//! store and one set of system types without cross-talk.
//!
//! Handles are cheap `Rc` clones. Identity is the shared allocation, so a
//! clone is the same context and a freshly created one never is. A context
//! also remembers which store created it and carries a pause flag the
//! scheduler checks before ticking bound systems.

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use super::component::Component;

/// Opaque identity of a context handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextKey(usize);

impl ContextKey {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: usize) -> Self {
        ContextKey(raw)
    }
}

/// Process-wide id of a [`World`](super::world::World).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct WorldId(pub(crate) u32);

struct Inner<T> {
    world: WorldId,
    paused: Cell<bool>,
    state: T,
}

/// Shared handle to a context's state.
///
/// Create one with [`World::create_context`](super::world::World::create_context)
/// and register `Context<T>` as a component type before the first world
/// exists.
pub struct Context<T: 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: 'static> Context<T> {
    pub(crate) fn new(world: WorldId, state: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                world,
                paused: Cell::new(false),
                state,
            }),
        }
    }

    /// The identity key shared by every clone of this handle.
    pub fn key(&self) -> ContextKey {
        ContextKey(Rc::as_ptr(&self.inner) as *const () as usize)
    }

    /// The store that created this context.
    pub fn world_id(&self) -> WorldId {
        self.inner.world
    }

    /// Systems bound to a paused context are skipped by `World::run`.
    pub fn set_paused(&self, paused: bool) {
        self.inner.paused.set(paused);
    }

    /// Returns true while paused.
    pub fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    /// Returns true if both handles are the same context.
    pub fn same(&self, other: &Context<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn gate(&self) -> ContextGate {
        ContextGate {
            key: self.key(),
            paused: self.inner.clone(),
        }
    }
}

impl<T: 'static> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Deref for Context<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner.state
    }
}

impl<T: 'static> PartialEq for Context<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<T: 'static> Eq for Context<T> {}

impl<T: 'static> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context({:#x}", self.key().0)?;
        if self.is_paused() {
            write!(f, ", paused")?;
        }
        write!(f, ")")
    }
}

impl<T: 'static> Component for Context<T> {
    fn context_key(&self) -> Option<ContextKey> {
        Some(self.key())
    }
}

/// Type-erased view a system slot keeps of its bound context.
///
/// Holding the `Rc` keeps the allocation alive, so the key can't be reused
/// by a later context while the system exists.
pub(crate) struct ContextGate {
    pub(crate) key: ContextKey,
    paused: Rc<dyn Pausable>,
}

impl ContextGate {
    pub(crate) fn is_paused(&self) -> bool {
        self.paused.paused()
    }
}

trait Pausable {
    fn paused(&self) -> bool;
}

impl<T> Pausable for Inner<T> {
    fn paused(&self) -> bool {
        self.paused.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let a = Context::new(WorldId(0), "menu");
        let b = a.clone();
        let c = Context::new(WorldId(0), "menu");
        assert!(a.same(&b));
        assert_eq!(a.key(), b.key());
        assert!(!a.same(&c));
        assert_ne!(a.key(), c.key());
        assert_eq!(*a, "menu");
    }

    #[test]
    fn pause_is_shared_between_clones() {
        let a = Context::new(WorldId(0), ());
        let gate = a.gate();
        let b = a.clone();
        b.set_paused(true);
        assert!(a.is_paused());
        assert!(gate.is_paused());
        a.set_paused(false);
        assert!(!gate.is_paused());
    }

    #[test]
    fn component_hook_reports_key() {
        let a = Context::new(WorldId(3), 1u8);
        assert_eq!(Component::context_key(&a), Some(a.key()));
        assert_eq!(a.world_id(), WorldId(3));
    }
}
