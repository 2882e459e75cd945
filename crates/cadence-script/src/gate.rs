//! Commit-once branch selection
//!
//! A [`Gate`] evaluates its options' guards in order until one matches,
//! then runs only that option's actions to exhaustion before advancing the
//! enclosing block. Guards are never re-evaluated while a branch is running.

use crate::action::{flatten, Action, BoxedAction};
use crate::block::Block;
use crate::error::{ScriptError, ScriptResult};
use cadence_core::{CommitTiming, Flow};
use std::fmt;
use tracing::trace;

type GuardFn = Box<dyn FnMut(&Block<'_>) -> bool>;
type HookFn = Box<dyn FnMut(&mut Block<'_>)>;

/// One guarded branch of a [`Gate`]
pub struct GateOption {
    guard: Option<GuardFn>,
    actions: Vec<BoxedAction>,
    index: usize,
}

impl GateOption {
    /// Create an option taken when `guard` returns true
    pub fn new(
        guard: impl FnMut(&Block<'_>) -> bool + 'static,
        actions: Vec<BoxedAction>,
    ) -> ScriptResult<Self> {
        Self::build(Some(Box::new(guard)), actions)
    }

    /// Create an option that always matches
    ///
    /// Placed last, it acts as the else branch.
    pub fn otherwise(actions: Vec<BoxedAction>) -> ScriptResult<Self> {
        Self::build(None, actions)
    }

    fn build(guard: Option<GuardFn>, actions: Vec<BoxedAction>) -> ScriptResult<Self> {
        let actions = flatten(actions);
        if actions.is_empty() {
            return Err(ScriptError::EmptyGateOption);
        }
        Ok(Self {
            guard,
            actions,
            index: 0,
        })
    }

    /// Number of actions in the branch
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Always false; options cannot be built empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether this option is an unconditional else branch
    pub fn is_otherwise(&self) -> bool {
        self.guard.is_none()
    }

    fn matches(&mut self, block: &Block<'_>) -> bool {
        match self.guard.as_mut() {
            Some(guard) => guard(block),
            None => true,
        }
    }

    fn reset(&mut self, block: &mut Block<'_>) {
        self.index = 0;
        if let Some(first) = self.actions.first_mut() {
            first.init(block);
        }
    }

    /// Poll the branch's current action with block rules
    ///
    /// Returns Advance once the last action advances, Finish if any action
    /// finishes, and Idle otherwise.
    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        let Some(action) = self.actions.get_mut(self.index) else {
            self.index = 0;
            return Flow::Advance;
        };

        match action.poll(block) {
            Flow::Idle => Flow::Idle,
            Flow::Finish => {
                self.index = 0;
                Flow::Finish
            }
            Flow::Advance => {
                self.index += 1;
                match self.actions.get_mut(self.index) {
                    Some(next) => {
                        next.init(block);
                        block.restart_frame(true);
                        Flow::Idle
                    }
                    None => {
                        self.index = 0;
                        Flow::Advance
                    }
                }
            }
        }
    }
}

impl fmt::Debug for GateOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateOption")
            .field("otherwise", &self.guard.is_none())
            .field("len", &self.actions.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Branch selector that commits to one option until it is exhausted
///
/// While no option has committed, `on_idle` fires at the start of every
/// poll. When an option commits, `on_choose` fires once. By default the
/// committing poll idles and the branch starts on the next tick; with
/// [`CommitTiming::SameTick`] the branch's first action is polled right
/// away.
#[derive(Default)]
pub struct Gate {
    options: Vec<GateOption>,
    chosen: Option<usize>,
    on_idle: Option<HookFn>,
    on_choose: Option<HookFn>,
    commit: Option<CommitTiming>,
}

impl Gate {
    /// Create a gate over the given options, evaluated in order
    pub fn new(options: Vec<GateOption>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Append an option
    pub fn add_option(mut self, option: GateOption) -> Self {
        self.options.push(option);
        self
    }

    /// Run `hook` on each poll while no option has committed
    pub fn on_idle(mut self, hook: impl FnMut(&mut Block<'_>) + 'static) -> Self {
        self.on_idle = Some(Box::new(hook));
        self
    }

    /// Run `hook` when an option commits
    pub fn on_choose(mut self, hook: impl FnMut(&mut Block<'_>) + 'static) -> Self {
        self.on_choose = Some(Box::new(hook));
        self
    }

    /// Override the routine's commit timing for this gate
    pub fn commit_timing(mut self, commit: CommitTiming) -> Self {
        self.commit = Some(commit);
        self
    }

    /// Index of the committed option, if any
    pub fn chosen(&self) -> Option<usize> {
        self.chosen
    }

    fn poll_chosen(&mut self, chosen: usize, block: &mut Block<'_>) -> Flow {
        let Some(option) = self.options.get_mut(chosen) else {
            self.chosen = None;
            return Flow::Advance;
        };
        let flow = option.poll(block);
        if !flow.is_idle() {
            self.chosen = None;
        }
        flow
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("options", &self.options)
            .field("chosen", &self.chosen)
            .field("commit", &self.commit)
            .finish_non_exhaustive()
    }
}

impl Action for Gate {
    fn init(&mut self, block: &mut Block<'_>) {
        for option in &mut self.options {
            option.reset(block);
        }
        self.chosen = None;
    }

    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        if let Some(chosen) = self.chosen {
            return self.poll_chosen(chosen, block);
        }

        if let Some(hook) = self.on_idle.as_mut() {
            hook(block);
        }

        let Some(chosen) = self.options.iter_mut().position(|o| o.matches(block)) else {
            return Flow::Idle;
        };

        trace!(block = %block.id(), option = chosen, "Gate committed");
        self.chosen = Some(chosen);
        if let Some(hook) = self.on_choose.as_mut() {
            hook(block);
        }

        match self.commit.unwrap_or(block.options().gate_commit) {
            CommitTiming::NextTick => {
                block.restart_frame(true);
                Flow::Idle
            }
            CommitTiming::SameTick => {
                block.restart_frame(false);
                self.poll_chosen(chosen, block)
            }
        }
    }
}
