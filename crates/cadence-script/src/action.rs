//! Action protocol and leaf actions
//!
//! An action is a unit of work inside a block. The block calls
//! [`Action::init`] once each time the action becomes current and
//! [`Action::poll`] once per tick while it stays current; the returned
//! [`Flow`] tells the block whether to hold, advance, or finish.

use crate::block::Block;
use cadence_core::{Flow, Id};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// A unit of work that can hold, advance, or finish a block
pub trait Action {
    /// Called when this action becomes the current one for its block
    fn init(&mut self, block: &mut Block<'_>);

    /// Called once per tick while this action is current
    fn poll(&mut self, block: &mut Block<'_>) -> Flow;

    /// Label this action answers to when a block jumps by label
    fn label(&self) -> Option<&Id> {
        None
    }

    /// Hand over contained actions to be spliced into the enclosing list
    ///
    /// Grouping actions return their children here and are never stored
    /// themselves; every other action returns None.
    fn splice(&mut self) -> Option<Vec<BoxedAction>> {
        None
    }
}

/// An owned, type-erased action
pub type BoxedAction = Box<dyn Action>;

/// Build a `Vec<BoxedAction>` from a list of actions
///
/// ```ignore
/// routine.define("intro", actions![Wait::new(secs(1)), finish()])?;
/// ```
#[macro_export]
macro_rules! actions {
    () => {
        ::std::vec::Vec::<$crate::BoxedAction>::new()
    };
    ($($action:expr),+ $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($action) as $crate::BoxedAction),+]
    };
}

/// Replace every grouping action with its children, recursively
pub(crate) fn flatten(actions: Vec<BoxedAction>) -> Vec<BoxedAction> {
    let mut flat = Vec::with_capacity(actions.len());
    for mut action in actions {
        match action.splice() {
            Some(children) => flat.extend(flatten(children)),
            None => flat.push(action),
        }
    }
    flat
}

/// Waits for a fixed amount of time before advancing
#[derive(Debug, Clone)]
pub struct Wait {
    duration: Duration,
    deadline: Option<Duration>,
}

impl Wait {
    /// Create a wait of the given duration
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: None,
        }
    }

    /// The configured duration
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Action for Wait {
    fn init(&mut self, block: &mut Block<'_>) {
        self.deadline = Some(block.now() + self.duration);
    }

    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        let now = block.now();
        let deadline = *self.deadline.get_or_insert(now + self.duration);
        if now >= deadline {
            Flow::Advance
        } else {
            Flow::Idle
        }
    }
}

type PollFn = Box<dyn FnMut(&mut Block<'_>) -> Flow>;
type InitFn = Box<dyn FnMut(&mut Block<'_>)>;

/// Runs caller-supplied closures
///
/// This is the extension point for domain behavior: the poll closure
/// decides the flow, and an optional init closure runs whenever the action
/// becomes current.
pub struct Function {
    poll: PollFn,
    init: Option<InitFn>,
}

impl Function {
    /// Create a function action from a poll closure
    pub fn new(poll: impl FnMut(&mut Block<'_>) -> Flow + 'static) -> Self {
        Self {
            poll: Box::new(poll),
            init: None,
        }
    }

    /// Run `init` each time the action becomes current
    pub fn with_init(mut self, init: impl FnMut(&mut Block<'_>) + 'static) -> Self {
        self.init = Some(Box::new(init));
        self
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("has_init", &self.init.is_some())
            .finish_non_exhaustive()
    }
}

impl Action for Function {
    fn init(&mut self, block: &mut Block<'_>) {
        if let Some(init) = self.init.as_mut() {
            init(block);
        }
    }

    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        (self.poll)(block)
    }
}

/// A jump target; polling it simply advances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    id: Id,
}

impl Label {
    /// Create a label with the given id
    pub fn new(id: impl Into<Id>) -> Self {
        Self { id: id.into() }
    }
}

impl Action for Label {
    fn init(&mut self, _block: &mut Block<'_>) {}

    fn poll(&mut self, _block: &mut Block<'_>) -> Flow {
        Flow::Advance
    }

    fn label(&self) -> Option<&Id> {
        Some(&self.id)
    }
}

/// A group of actions that splices into whatever list it is placed in
///
/// Collections let helper functions return several actions at once. Blocks,
/// gate options, and other collections flatten them at definition time, so a
/// collection never exists as a step of its own.
#[derive(Default)]
pub struct Collection {
    actions: Vec<BoxedAction>,
}

impl Collection {
    /// Create a collection; nested collections are flattened immediately
    pub fn new(actions: Vec<BoxedAction>) -> Self {
        Self {
            actions: flatten(actions),
        }
    }

    /// Append an action
    pub fn push(&mut self, action: impl Action + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Number of contained actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.actions.len())
            .finish()
    }
}

impl Action for Collection {
    fn init(&mut self, _block: &mut Block<'_>) {}

    fn poll(&mut self, _block: &mut Block<'_>) -> Flow {
        Flow::Advance
    }

    fn splice(&mut self) -> Option<Vec<BoxedAction>> {
        Some(std::mem::take(&mut self.actions))
    }
}

/// Idles for a number of ticks before advancing
#[derive(Debug, Clone, Copy)]
pub struct WaitTicks {
    ticks: u64,
}

impl WaitTicks {
    /// Idle until the action has been current for `ticks` ticks
    pub fn new(ticks: u64) -> Self {
        Self { ticks }
    }
}

impl Action for WaitTicks {
    fn init(&mut self, _block: &mut Block<'_>) {}

    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        if block.current_frame() >= self.ticks {
            Flow::Advance
        } else {
            Flow::Idle
        }
    }
}

/// Idles for a random number of ticks in `[min, max]`
///
/// The tick count is drawn each time the action becomes current.
#[derive(Debug, Clone, Copy)]
pub struct WaitTicksRandom {
    min: u64,
    max: u64,
    target: u64,
}

impl WaitTicksRandom {
    /// Create a random tick wait; the bounds may be given in either order
    pub fn new(min: u64, max: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            target: min,
        }
    }
}

impl Action for WaitTicksRandom {
    fn init(&mut self, _block: &mut Block<'_>) {
        self.target = rand::thread_rng().gen_range(self.min..=self.max);
    }

    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        if block.current_frame() >= self.target {
            Flow::Advance
        } else {
            Flow::Idle
        }
    }
}
