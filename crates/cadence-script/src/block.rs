//! Blocks and their playheads
//!
//! A block is an ordered list of actions with a playhead. The routine owns
//! the block data; actions and embedders work with a [`Block`] handle that
//! borrows the routine for as long as it is needed.
//!
//! While an action is being polled or initialized it is checked out of its
//! slot. Relocating the playhead onto a checked-out slot records a pending
//! init that runs as soon as the action is put back, so every relocation
//! initializes the newly current action exactly once.

use crate::action::BoxedAction;
use crate::routine::{RoutineMut, RoutineState};
use cadence_core::{EndBehavior, Flow, Id, Properties, RoutineOptions};
use std::time::Duration;
use tracing::{debug, trace};

/// Stored state of one block
pub(crate) struct BlockData {
    pub(crate) id: Id,
    pub(crate) actions: Vec<Option<BoxedAction>>,
    /// Labels captured at definition time, parallel to `actions`
    pub(crate) labels: Vec<Option<Id>>,
    pub(crate) index: usize,
    pub(crate) active: bool,
    /// Set when the playhead was relocated since the last step began
    pub(crate) moved: bool,
    /// Ticks the current action has been polled
    pub(crate) frame: u64,
    /// The frame count starts over once the current poll returns
    pub(crate) frame_restarted: bool,
    pub(crate) on_end: Option<EndBehavior>,
    pub(crate) pending_init: Option<usize>,
}

impl BlockData {
    pub(crate) fn new(id: Id, actions: Vec<BoxedAction>) -> Self {
        let labels = actions.iter().map(|a| a.label().cloned()).collect();
        Self {
            id,
            actions: actions.into_iter().map(Some).collect(),
            labels,
            index: 0,
            active: false,
            moved: false,
            frame: 0,
            frame_restarted: false,
            on_end: None,
            pending_init: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.actions.len()
    }
}

/// Outcome of stepping one block for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The block is still active
    Running,
    /// The block deactivated during this step
    Stopped,
}

impl RoutineState {
    /// Run `init` on one action slot of a block
    pub(crate) fn init_action(&mut self, pos: usize, slot: usize) {
        let data = &mut self.blocks[pos];
        data.frame = 0;
        let Some(mut action) = data.actions.get_mut(slot).and_then(Option::take) else {
            // Checked out further up the call chain; runs when put back.
            data.pending_init = Some(slot);
            return;
        };
        action.init(&mut Block::new(self, pos));
        self.restore(pos, slot, action);
    }

    /// Return a checked-out action to its slot
    fn restore(&mut self, pos: usize, slot: usize, action: BoxedAction) {
        let data = &mut self.blocks[pos];
        if let Some(cell) = data.actions.get_mut(slot) {
            *cell = Some(action);
        }
        if data.pending_init == Some(slot) {
            data.pending_init = None;
            self.init_action(pos, slot);
        }
    }

    /// Move the playhead, clamping into range
    ///
    /// Does nothing if the clamped index is already current.
    pub(crate) fn set_index(&mut self, pos: usize, index: usize) {
        let data = &mut self.blocks[pos];
        let index = index.min(data.len().saturating_sub(1));
        if data.index == index {
            return;
        }
        trace!(block = %data.id, from = data.index, to = index, "Moving playhead");
        data.index = index;
        data.moved = true;
        self.init_action(pos, index);
    }

    /// Find the first action carrying `label`
    pub(crate) fn find_label(&self, pos: usize, label: &Id) -> Option<usize> {
        self.blocks[pos]
            .labels
            .iter()
            .position(|l| l.as_ref() == Some(label))
    }

    /// Jump to a label; an unknown label leaves the playhead alone
    pub(crate) fn jump_to(&mut self, pos: usize, label: &Id) -> Option<usize> {
        match self.find_label(pos, label) {
            Some(index) => {
                debug!(block = %self.blocks[pos].id, label = %label, index, "Jumping to label");
                self.set_index(pos, index);
                Some(index)
            }
            None => {
                debug!(block = %self.blocks[pos].id, label = %label, "Label not found, jump ignored");
                None
            }
        }
    }

    /// Rewind to the first action and initialize it
    pub(crate) fn restart(&mut self, pos: usize) {
        let data = &mut self.blocks[pos];
        data.index = 0;
        data.moved = true;
        self.init_action(pos, 0);
    }

    pub(crate) fn activate(&mut self, pos: usize) {
        let data = &mut self.blocks[pos];
        if !data.active {
            debug!(block = %data.id, "Activating block");
            data.active = true;
        }
    }

    pub(crate) fn pause(&mut self, pos: usize) {
        let data = &mut self.blocks[pos];
        if data.active {
            debug!(block = %data.id, "Pausing block");
            data.active = false;
        }
    }

    pub(crate) fn stop(&mut self, pos: usize) {
        self.pause(pos);
        self.restart(pos);
    }

    fn end_behavior(&self, pos: usize) -> EndBehavior {
        self.blocks[pos].on_end.unwrap_or(self.options.on_end)
    }

    /// Poll the current action of a block once and apply the resulting flow
    fn poll_once(&mut self, pos: usize) -> (Flow, Step) {
        let data = &mut self.blocks[pos];
        data.moved = false;
        data.frame_restarted = false;
        let slot = data.index;
        let Some(mut action) = data.actions.get_mut(slot).and_then(Option::take) else {
            return (Flow::Idle, Step::Running);
        };

        let flow = action.poll(&mut Block::new(self, pos));
        self.restore(pos, slot, action);

        let on_end = self.end_behavior(pos);
        let data = &mut self.blocks[pos];
        trace!(block = %data.id, index = slot, flow = %flow, "Polled action");
        if std::mem::take(&mut data.frame_restarted) {
            data.frame = 0;
        } else {
            data.frame += 1;
        }

        match flow {
            Flow::Idle => {
                if data.moved {
                    data.frame = 0;
                }
            }
            Flow::Finish => {
                debug!(block = %data.id, "Block finished");
                data.index = 0;
                data.active = false;
                self.init_action(pos, 0);
            }
            Flow::Advance => {
                if data.moved {
                    // The action relocated the playhead; its target is
                    // already initialized.
                    data.frame = 0;
                } else {
                    data.index += 1;
                    if data.index >= data.len() {
                        data.index = 0;
                        match on_end {
                            EndBehavior::Deactivate => {
                                debug!(block = %data.id, "Reached end of block");
                                data.active = false;
                            }
                            EndBehavior::Loop => {
                                trace!(block = %data.id, "Looping block");
                            }
                        }
                    }
                    let index = data.index;
                    self.init_action(pos, index);
                }
            }
        }

        let step = if self.blocks[pos].active {
            Step::Running
        } else {
            Step::Stopped
        };
        (flow, step)
    }

    /// Step a block for one tick
    ///
    /// In chain mode an advance is followed by another poll, bounded by the
    /// number of actions in the block.
    pub(crate) fn step(&mut self, pos: usize, chain: bool) -> Step {
        let mut budget = self.blocks[pos].len();
        loop {
            let (flow, step) = self.poll_once(pos);
            budget = budget.saturating_sub(1);
            if !chain || flow != Flow::Advance || step == Step::Stopped || budget == 0 {
                return step;
            }
        }
    }
}

/// Handle to one block of a routine
///
/// Actions receive a `&mut Block` in [`Action::init`](crate::Action::init)
/// and [`Action::poll`](crate::Action::poll). Through it they can move
/// their own playhead, read and write routine properties, consult the
/// clock, and reach sibling blocks via [`Block::routine`].
pub struct Block<'a> {
    state: &'a mut RoutineState,
    pos: usize,
}

impl<'a> Block<'a> {
    pub(crate) fn new(state: &'a mut RoutineState, pos: usize) -> Self {
        Self { state, pos }
    }

    fn data(&self) -> &BlockData {
        &self.state.blocks[self.pos]
    }

    /// Block identifier
    pub fn id(&self) -> &Id {
        &self.data().id
    }

    /// Index of the current action
    pub fn index(&self) -> usize {
        self.data().index
    }

    /// Number of actions in the block
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Always false; blocks cannot be defined empty
    pub fn is_empty(&self) -> bool {
        self.data().actions.is_empty()
    }

    /// Ticks the current action has been polled
    ///
    /// Zero during the first poll of an action, reset on every change of
    /// position.
    pub fn current_frame(&self) -> u64 {
        self.data().frame
    }

    /// Start the frame count over for an action nested inside the current one
    ///
    /// With `after_poll` the count restarts once the current poll returns, for
    /// a nested action first polled on a later tick. Otherwise it restarts
    /// now, for one polled during this call.
    pub(crate) fn restart_frame(&mut self, after_poll: bool) {
        let data = &mut self.state.blocks[self.pos];
        data.frame = 0;
        data.frame_restarted = after_poll;
    }

    /// Whether the block is active
    pub fn is_active(&self) -> bool {
        self.data().active
    }

    /// Label of the action at `index`, if it has one
    pub fn label_at(&self, index: usize) -> Option<&Id> {
        self.data().labels.get(index).and_then(Option::as_ref)
    }

    /// Index of the first action carrying `label`
    pub fn position_of(&self, label: impl Into<Id>) -> Option<usize> {
        self.state.find_label(self.pos, &label.into())
    }

    /// Set the playhead
    ///
    /// The index is clamped into range. If it differs from the current one
    /// the new action is initialized immediately and the block will not
    /// auto-advance past it at the end of the current poll.
    pub fn set_index(&mut self, index: usize) {
        self.state.set_index(self.pos, index);
    }

    /// Set the playhead to the first action labelled `label`
    ///
    /// Returns the new index, or None if no action carries the label, in
    /// which case the playhead is unchanged.
    pub fn jump_to(&mut self, label: impl Into<Id>) -> Option<usize> {
        self.state.jump_to(self.pos, &label.into())
    }

    /// Mark the block active; it is stepped from the next tick on
    pub fn activate(&mut self) -> &mut Self {
        self.state.activate(self.pos);
        self
    }

    /// Deactivate the block, keeping its position
    pub fn pause(&mut self) -> &mut Self {
        self.state.pause(self.pos);
        self
    }

    /// Deactivate the block and rewind it to the first action
    pub fn stop(&mut self) -> &mut Self {
        self.state.stop(self.pos);
        self
    }

    /// Rewind the block to the first action without changing activity
    pub fn restart(&mut self) -> &mut Self {
        self.state.restart(self.pos);
        self
    }

    /// Override the routine's end-of-block behavior for this block
    pub fn set_end_behavior(&mut self, on_end: EndBehavior) -> &mut Self {
        self.state.blocks[self.pos].on_end = Some(on_end);
        self
    }

    /// Effective end-of-block behavior
    pub fn end_behavior(&self) -> EndBehavior {
        self.state.end_behavior(self.pos)
    }

    /// Routine-wide properties
    pub fn properties(&self) -> &Properties {
        &self.state.properties
    }

    /// Routine-wide properties, mutably
    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.state.properties
    }

    /// Current time according to the routine's clock
    pub fn now(&self) -> Duration {
        self.state.clock.now()
    }

    /// Routine options
    pub fn options(&self) -> &RoutineOptions {
        &self.state.options
    }

    /// Control any block of the owning routine
    pub fn routine(&mut self) -> RoutineMut<'_> {
        RoutineMut::new(self.state)
    }
}

impl std::fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data();
        f.debug_struct("Block")
            .field("id", &data.id)
            .field("index", &data.index)
            .field("len", &data.len())
            .field("active", &data.active)
            .field("frame", &data.frame)
            .finish()
    }
}
