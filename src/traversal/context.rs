use ahash::AHashMap;
use std::any::Any;
use std::rc::Rc;

/// Ephemeral per-step context, created when an item is queued and discarded
/// once its step completes.
pub struct StepContext {
    /// True for the item a traversal (or branch) was started from.
    pub is_start_item: bool,
    /// True when this item opened a new branch.
    pub is_branch_start: bool,
    /// Monotonically increasing counter assigned at queue time.
    pub step_number: usize,
    /// How many branch points lie between this item and the root traversal.
    pub branch_depth: usize,
    values: AHashMap<&'static str, Box<dyn Any>>,
}

impl StepContext {
    pub(super) fn start(step_number: usize, values: AHashMap<&'static str, Box<dyn Any>>) -> Self {
        StepContext {
            is_start_item: true,
            is_branch_start: false,
            step_number,
            branch_depth: 0,
            values,
        }
    }

    pub(super) fn next(
        &self,
        step_number: usize,
        is_branch_start: bool,
        values: AHashMap<&'static str, Box<dyn Any>>,
    ) -> Self {
        StepContext {
            is_start_item: false,
            is_branch_start,
            step_number,
            branch_depth: self.branch_depth + usize::from(is_branch_start),
            values,
        }
    }

    /// A computed value from the context bag, downcast to its real type.
    pub fn value<V: Any>(&self, key: &str) -> Option<&V> {
        self.values.get(key)?.downcast_ref()
    }

    pub(super) fn raw_value(&self, key: &str) -> Option<&dyn Any> {
        self.values.get(key).map(|v| v.as_ref())
    }
}

/// Computes one keyed context value: `init` seeds the value for a start
/// item, `next` derives the value for a queued item from the current step.
pub(super) struct ContextValueComputer<T> {
    pub key: &'static str,
    pub init: Rc<dyn Fn(&T) -> Box<dyn Any>>,
    pub next: Rc<dyn Fn(&T, &T, Option<&dyn Any>) -> Box<dyn Any>>,
}

impl<T> Clone for ContextValueComputer<T> {
    fn clone(&self) -> Self {
        ContextValueComputer {
            key: self.key,
            init: Rc::clone(&self.init),
            next: Rc::clone(&self.next),
        }
    }
}
