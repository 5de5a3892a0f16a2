//! A generic, reusable branching graph walker.
//!
//! A [`Traversal`] drains a breadth- or depth-configurable queue of items,
//! applying registered stop conditions, queue conditions and step actions to
//! each. The caller-supplied queue-next callback decides what to walk next,
//! either as a straight continuation or as a *branch*: an independently
//! tracked alternate continuation created at a topological fork. Branches are
//! a data-structure concept, not execution concurrency; everything here is
//! single-threaded and synchronous.
//!
//! Branch children inherit the parent's conditions, actions and computers,
//! and their visitation trackers chain to the parent's, so an item is never
//! re-walked within one branch's own ancestry but sibling branches can each
//! visit it independently (which is what makes electrical loops safe).

pub mod context;
pub mod tracker;

pub use context::StepContext;
pub use tracker::Tracker;

use ahash::AHashMap;
use context::ContextValueComputer;
use std::any::Any;
use std::collections::VecDeque;
use std::hash::Hash;
use std::rc::Rc;
use tracing::trace;

/// Whether the work queue drains first-in-first-out or last-in-first-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    BreadthFirst,
    DepthFirst,
}

struct TraversalQueue<T> {
    kind: QueueKind,
    items: VecDeque<(T, StepContext)>,
}

impl<T> TraversalQueue<T> {
    fn new(kind: QueueKind) -> Self {
        TraversalQueue {
            kind,
            items: VecDeque::new(),
        }
    }

    fn push(&mut self, item: T, context: StepContext) {
        self.items.push_back((item, context));
    }

    fn pop(&mut self) -> Option<(T, StepContext)> {
        match self.kind {
            QueueKind::BreadthFirst => self.items.pop_front(),
            QueueKind::DepthFirst => self.items.pop_back(),
        }
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

/// Handle passed to the queue-next callback for scheduling continuations.
#[derive(Debug)]
pub struct Queuer<T> {
    items: Vec<T>,
    branches: Vec<T>,
}

impl<T> Default for Queuer<T> {
    fn default() -> Self {
        Queuer {
            items: Vec::new(),
            branches: Vec::new(),
        }
    }
}

impl<T> Queuer<T> {
    /// Schedules a straight continuation on the current branch.
    pub fn queue(&mut self, item: T) {
        self.items.push(item);
    }

    /// Schedules an independently tracked branch continuation, drained after
    /// the current branch's own queue empties.
    pub fn queue_branch(&mut self, item: T) {
        self.branches.push(item);
    }
}

type StopCondition<T, S> = Rc<dyn Fn(T, &StepContext, &S) -> bool>;
type QueueCondition<T, S> = Rc<dyn Fn(T, &StepContext, T, &StepContext, &S) -> bool>;
type StepAction<T, S, E> = Rc<dyn Fn(T, &StepContext, &mut S) -> Result<(), E>>;
type QueueNext<T, S, E> = Rc<dyn Fn(T, &StepContext, &mut S, &mut Queuer<T>) -> Result<(), E>>;

/// A single-threaded branching traversal over items of type `T`.
///
/// `S` is caller state threaded into every callback (immutably into
/// conditions, mutably into actions and the queue-next callback) and `E` is
/// the error type fallible callbacks may raise; the first error aborts the
/// run. Conditions, actions and context-value computers are fixed at
/// construction and shared with every branch the run spawns.
pub struct Traversal<T, S, E> {
    queue: TraversalQueue<T>,
    branch_seeds: Vec<(T, StepContext)>,
    stop_conditions: Vec<StopCondition<T, S>>,
    queue_conditions: Vec<QueueCondition<T, S>>,
    step_actions: Vec<StepAction<T, S, E>>,
    computers: Vec<ContextValueComputer<T>>,
    queue_next: QueueNext<T, S, E>,
    tracker: Rc<Tracker<T>>,
    next_step: usize,
    running: bool,
    has_run: bool,
}

impl<T: Copy + Eq + Hash + 'static, S, E> Traversal<T, S, E> {
    pub fn new(
        kind: QueueKind,
        queue_next: impl Fn(T, &StepContext, &mut S, &mut Queuer<T>) -> Result<(), E> + 'static,
    ) -> Self {
        Traversal {
            queue: TraversalQueue::new(kind),
            branch_seeds: Vec::new(),
            stop_conditions: Vec::new(),
            queue_conditions: Vec::new(),
            step_actions: Vec::new(),
            computers: Vec::new(),
            queue_next: Rc::new(queue_next),
            tracker: Rc::new(Tracker::new()),
            next_step: 0,
            running: false,
            has_run: false,
        }
    }

    /// Stop conditions are OR'd: any match stops the walk at that item
    /// (after its step actions have been applied).
    pub fn add_stop_condition(
        mut self,
        condition: impl Fn(T, &StepContext, &S) -> bool + 'static,
    ) -> Self {
        self.stop_conditions.push(Rc::new(condition));
        self
    }

    /// Queue conditions are AND'd: every one must pass for a continuation to
    /// be queued. The predicate sees the candidate item with its computed
    /// context and the item it was queued from.
    pub fn add_queue_condition(
        mut self,
        condition: impl Fn(T, &StepContext, T, &StepContext, &S) -> bool + 'static,
    ) -> Self {
        self.queue_conditions.push(Rc::new(condition));
        self
    }

    pub fn add_step_action(
        mut self,
        action: impl Fn(T, &StepContext, &mut S) -> Result<(), E> + 'static,
    ) -> Self {
        self.step_actions.push(Rc::new(action));
        self
    }

    /// Registers a computed context value: `init` seeds it on the start
    /// item, `next` derives it for each queued item from the current step's
    /// value.
    pub fn add_context_value_computer<V: Any>(
        mut self,
        key: &'static str,
        init: impl Fn(&T) -> V + 'static,
        next: impl Fn(&T, &T, Option<&V>) -> V + 'static,
    ) -> Self {
        self.computers.push(ContextValueComputer {
            key,
            init: Rc::new(move |item| Box::new(init(item))),
            next: Rc::new(move |next_item, current, value| {
                Box::new(next(next_item, current, value.and_then(|v| v.downcast_ref())))
            }),
        });
        self
    }

    /// Whether `item` has been visited by this traversal or any ancestor
    /// branch.
    pub fn has_visited(&self, item: T) -> bool {
        self.tracker.has_visited(item)
    }

    /// Walks the graph from `start`, draining this traversal's queue and
    /// then every branch it spawned.
    ///
    /// When `can_stop_on_start` is false, stop conditions are not evaluated
    /// for the start item itself.
    ///
    /// # Panics
    ///
    /// Panics when called while already running, or re-run without
    /// [`reset`](Self::reset) in between; both are programmer errors.
    pub fn run(&mut self, start: T, state: &mut S, can_stop_on_start: bool) -> Result<(), E> {
        let context = StepContext::start(self.take_step_number(), self.initial_values(&start));
        self.run_with_context(start, context, state, can_stop_on_start)
    }

    /// Clears the queues and the tracker so the instance can be reused.
    ///
    /// # Panics
    ///
    /// Panics when called while the traversal is running.
    pub fn reset(&mut self) {
        assert!(!self.running, "cannot reset a traversal while it is running");
        self.queue.clear();
        self.branch_seeds.clear();
        self.tracker.clear();
        self.next_step = 0;
        self.has_run = false;
    }

    fn run_with_context(
        &mut self,
        start: T,
        context: StepContext,
        state: &mut S,
        can_stop_on_start: bool,
    ) -> Result<(), E> {
        assert!(!self.running, "traversal is already running");
        assert!(!self.has_run, "traversal must be reset before it is re-run");
        self.running = true;
        self.has_run = true;
        self.queue.push(start, context);
        let result = self.drain(state, can_stop_on_start);
        self.running = false;
        result
    }

    fn drain(&mut self, state: &mut S, can_stop_on_start: bool) -> Result<(), E> {
        while let Some((item, context)) = self.queue.pop() {
            // A queued item already claimed by this branch's lineage is
            // silently skipped, never reprocessed.
            if !self.tracker.visit(item) {
                continue;
            }
            trace!(
                step = context.step_number,
                depth = context.branch_depth,
                "traversal step"
            );

            let can_stop = can_stop_on_start || !context.is_start_item;
            let stopping =
                can_stop && self.stop_conditions.iter().any(|c| c(item, &context, state));

            for action in &self.step_actions {
                action(item, &context, state)?;
            }

            if !stopping {
                let mut queuer = Queuer::default();
                (self.queue_next)(item, &context, state, &mut queuer)?;
                for next in queuer.items {
                    if let Some(next_context) = self.admit(next, item, &context, false, state) {
                        self.queue.push(next, next_context);
                    }
                }
                for next in queuer.branches {
                    if let Some(next_context) = self.admit(next, item, &context, true, state) {
                        self.branch_seeds.push((next, next_context));
                    }
                }
            }
        }

        // The parent queue is empty; drain branches, each with a tracker
        // chained to this one.
        let seeds = std::mem::take(&mut self.branch_seeds);
        for (seed, context) in seeds {
            if self.tracker.has_visited(seed) {
                continue;
            }
            let mut branch = self.new_branch(context.step_number + 1);
            branch.run_with_context(seed, context, state, true)?;
        }
        Ok(())
    }

    /// Computes the context for a continuation and applies queue conditions
    /// and the visitation check; `None` means the item is not queued.
    fn admit(
        &mut self,
        next: T,
        current: T,
        current_context: &StepContext,
        is_branch: bool,
        state: &S,
    ) -> Option<StepContext> {
        if self.tracker.has_visited(next) {
            return None;
        }
        let mut values = AHashMap::new();
        for computer in &self.computers {
            let current_value = current_context.raw_value(computer.key);
            values.insert(computer.key, (computer.next)(&next, &current, current_value));
        }
        let next_context = current_context.next(self.take_step_number(), is_branch, values);
        let admitted = self
            .queue_conditions
            .iter()
            .all(|c| c(next, &next_context, current, current_context, state));
        admitted.then_some(next_context)
    }

    fn initial_values(&self, start: &T) -> AHashMap<&'static str, Box<dyn Any>> {
        let mut values = AHashMap::new();
        for computer in &self.computers {
            values.insert(computer.key, (computer.init)(start));
        }
        values
    }

    fn take_step_number(&mut self) -> usize {
        let step = self.next_step;
        self.next_step += 1;
        step
    }

    fn new_branch(&self, next_step: usize) -> Traversal<T, S, E> {
        Traversal {
            queue: TraversalQueue::new(self.queue.kind),
            branch_seeds: Vec::new(),
            stop_conditions: self.stop_conditions.clone(),
            queue_conditions: self.queue_conditions.clone(),
            step_actions: self.step_actions.clone(),
            computers: self.computers.clone(),
            queue_next: Rc::clone(&self.queue_next),
            tracker: Rc::new(Tracker::child(&self.tracker)),
            next_step,
            running: false,
            has_run: false,
        }
    }
}
