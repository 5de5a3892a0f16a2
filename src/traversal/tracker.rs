use ahash::AHashSet;
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

/// Visitation tracker for one traversal branch, chained to its ancestors.
///
/// An item counts as visited when it was visited by this branch *or* by any
/// ancestor branch; visiting in one branch never marks it visited in a
/// sibling. The chain is an explicit parent link queried on both `has_visited`
/// and `visit`, which keeps branch creation cheap compared to copying
/// visited-sets per branch.
#[derive(Debug)]
pub struct Tracker<T> {
    visited: RefCell<AHashSet<T>>,
    parent: Option<Rc<Tracker<T>>>,
}

impl<T: Copy + Eq + Hash> Tracker<T> {
    pub fn new() -> Self {
        Tracker {
            visited: RefCell::new(AHashSet::new()),
            parent: None,
        }
    }

    /// A fresh tracker whose lineage includes `parent` and its ancestors.
    pub fn child(parent: &Rc<Tracker<T>>) -> Self {
        Tracker {
            visited: RefCell::new(AHashSet::new()),
            parent: Some(Rc::clone(parent)),
        }
    }

    pub fn has_visited(&self, item: T) -> bool {
        if self.visited.borrow().contains(&item) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.has_visited(item),
            None => false,
        }
    }

    /// Marks `item` visited; returns false if it was already visited in this
    /// branch's lineage.
    pub fn visit(&self, item: T) -> bool {
        if self.has_visited(item) {
            return false;
        }
        self.visited.borrow_mut().insert(item);
        true
    }

    /// Clears this branch's own visits. Ancestor visits are untouched.
    pub fn clear(&self) {
        self.visited.borrow_mut().clear();
    }
}
