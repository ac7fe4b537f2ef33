//! Owner liveness tracking
//!
//! Animation jobs are often attached to an object that can disappear while the
//! job is still running. A [`Lifeline`] is embedded in such an object; jobs only
//! ever hold an [`OwnerRef`], a weak observer that reports whether the lifeline
//! is still alive.
//!
//! Composite objects hand out [`Part`]s: a part reports the liveness of the
//! root that owns it, so a job attached to a part is stopped when the root goes
//! away.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Strong liveness token owned by an animatable object
///
/// Dropping the lifeline (or calling [`Lifeline::destroy`]) invalidates every
/// [`OwnerRef`] derived from it.
pub struct Lifeline {
    alive: Rc<Cell<bool>>,
}

impl Lifeline {
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Mark the owner destroyed without dropping it
    pub fn destroy(&self) {
        self.alive.set(false);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Weak observer for this lifeline
    pub fn owner_ref(&self) -> OwnerRef {
        OwnerRef {
            alive: Rc::downgrade(&self.alive),
        }
    }

    /// Create a part whose liveness follows this lifeline
    pub fn part(&self) -> Part {
        Part {
            root: self.owner_ref(),
        }
    }
}

impl Default for Lifeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifeline")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Weak reference to an owner's lifeline
#[derive(Clone)]
pub struct OwnerRef {
    alive: Weak<Cell<bool>>,
}

impl OwnerRef {
    /// A reference that is never alive
    pub fn dangling() -> Self {
        Self { alive: Weak::new() }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.upgrade().is_some_and(|alive| alive.get())
    }

    /// Whether both references observe the same lifeline
    pub fn same_owner(&self, other: &OwnerRef) -> bool {
        Weak::ptr_eq(&self.alive, &other.alive)
    }
}

impl PartialEq for OwnerRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_owner(other)
    }
}

impl Eq for OwnerRef {}

impl fmt::Debug for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A sub-object of a composite owner
///
/// Its owner reference is the root's, never its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    root: OwnerRef,
}

impl Part {
    /// Create a part of another part or owner; the root is carried through
    pub fn of(owner: &dyn Owned) -> Self {
        Self {
            root: owner.owner_ref(),
        }
    }

    pub fn root(&self) -> &OwnerRef {
        &self.root
    }
}

// ============================================================================
// Owned
// ============================================================================

/// Anything that can be named as the owner of a job
pub trait Owned {
    /// The reference stored by the scheduler; composites return their root
    fn owner_ref(&self) -> OwnerRef;
}

impl Owned for Lifeline {
    fn owner_ref(&self) -> OwnerRef {
        Lifeline::owner_ref(self)
    }
}

impl Owned for OwnerRef {
    fn owner_ref(&self) -> OwnerRef {
        self.clone()
    }
}

impl Owned for Part {
    fn owner_ref(&self) -> OwnerRef {
        self.root.clone()
    }
}

impl<T: Owned + ?Sized> Owned for &T {
    fn owner_ref(&self) -> OwnerRef {
        (**self).owner_ref()
    }
}

impl<T: Owned + ?Sized> Owned for Rc<T> {
    fn owner_ref(&self) -> OwnerRef {
        (**self).owner_ref()
    }
}

impl<T: Owned + ?Sized> Owned for Box<T> {
    fn owner_ref(&self) -> OwnerRef {
        (**self).owner_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_invalidates_refs() {
        let lifeline = Lifeline::new();
        let owner = lifeline.owner_ref();
        assert!(owner.is_alive());

        drop(lifeline);
        assert!(!owner.is_alive());
    }

    #[test]
    fn test_destroy_invalidates_refs() {
        let lifeline = Lifeline::new();
        let owner = lifeline.owner_ref();
        lifeline.destroy();
        assert!(!owner.is_alive());
        assert!(!lifeline.is_alive());
    }

    #[test]
    fn test_part_resolves_to_root() {
        let lifeline = Lifeline::new();
        let wheel = lifeline.part();
        let spoke = Part::of(&wheel);

        assert!(spoke.owner_ref().same_owner(&lifeline.owner_ref()));
        assert_eq!(wheel, spoke);

        drop(lifeline);
        assert!(!spoke.owner_ref().is_alive());
    }

    #[test]
    fn test_distinct_owners() {
        let a = Lifeline::new();
        let b = Lifeline::new();
        assert_ne!(a.owner_ref(), b.owner_ref());
        assert!(!OwnerRef::dangling().is_alive());
    }
}
