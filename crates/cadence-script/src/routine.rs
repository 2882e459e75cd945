//! Routine: the owner and driver of all blocks
//!
//! A routine holds blocks in registration order, a property store shared by
//! every action, the clock, and the options. Calling [`Routine::tick`] once
//! per frame steps every block that is active at the start of the tick.

use crate::action::{flatten, BoxedAction};
use crate::block::{Block, BlockData, Step};
use crate::error::{ScriptError, ScriptResult};
use cadence_core::{AdvanceMode, Clock, Id, Properties, RoutineOptions, SystemClock};
use tracing::{debug, instrument, trace};

/// State shared between the routine and the handles it gives out
pub(crate) struct RoutineState {
    pub(crate) blocks: Vec<BlockData>,
    pub(crate) properties: Properties,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) options: RoutineOptions,
}

impl RoutineState {
    fn position(&self, id: &Id) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    /// Resolve ids to block positions; an empty list selects every block
    fn select<I>(&self, ids: I) -> Vec<usize>
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        let ids: Vec<Id> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return (0..self.blocks.len()).collect();
        }
        ids.iter().filter_map(|id| self.position(id)).collect()
    }

    fn is_active<I>(&self, ids: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.select(ids).into_iter().any(|pos| self.blocks[pos].active)
    }

    fn switch_to(&mut self, positions: &[usize]) {
        for &pos in positions {
            self.stop(pos);
        }
        for &pos in positions {
            self.activate(pos);
        }
    }
}

/// Summary of a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tick number (starting at 0)
    pub tick: u64,
    /// Number of blocks stepped
    pub stepped: usize,
    /// Blocks that were stepped and are inactive afterwards
    pub deactivated: Vec<Id>,
}

/// The scheduler
///
/// # Example
///
/// ```ignore
/// let mut routine = Routine::new();
/// routine
///     .define("intro", actions![Wait::new(Duration::from_secs(1)), finish()])?
///     .activate();
///
/// while routine.is_running() {
///     routine.tick();
/// }
/// ```
pub struct Routine {
    state: RoutineState,
    ticks: u64,
}

impl Routine {
    /// Create a routine driven by the system clock with default options
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }

    /// Create a routine driven by the given clock
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self::with_options(clock, RoutineOptions::default())
    }

    /// Create a routine with a clock and options
    pub fn with_options(clock: impl Clock + 'static, options: RoutineOptions) -> Self {
        Self {
            state: RoutineState {
                blocks: Vec::new(),
                properties: Properties::new(),
                clock: Box::new(clock),
                options,
            },
            ticks: 0,
        }
    }

    /// Define a block
    ///
    /// Collections are flattened into the block. A block with the same id is
    /// discarded and the new one registered last. The block starts inactive
    /// with its first action initialized.
    pub fn define(
        &mut self,
        id: impl Into<Id>,
        actions: Vec<BoxedAction>,
    ) -> ScriptResult<Block<'_>> {
        let id = id.into();
        let actions = flatten(actions);
        if actions.is_empty() {
            return Err(ScriptError::EmptyBlock { id });
        }

        if let Some(pos) = self.state.position(&id) {
            debug!(block = %id, "Replacing block");
            self.state.blocks.remove(pos);
        }

        debug!(block = %id, actions = actions.len(), "Defining block");
        self.state.blocks.push(BlockData::new(id, actions));
        let pos = self.state.blocks.len() - 1;
        self.state.init_action(pos, 0);
        Ok(Block::new(&mut self.state, pos))
    }

    /// Get a handle to a block
    pub fn block(&mut self, id: impl Into<Id>) -> Option<Block<'_>> {
        let pos = self.state.position(&id.into())?;
        Some(Block::new(&mut self.state, pos))
    }

    /// Block ids in registration order
    pub fn block_ids(&self) -> impl Iterator<Item = &Id> {
        self.state.blocks.iter().map(|b| &b.id)
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.state.blocks.len()
    }

    /// Whether no block has been defined
    pub fn is_empty(&self) -> bool {
        self.state.blocks.is_empty()
    }

    /// Activate blocks by id; no ids activates every block
    pub fn activate<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.routine_mut().activate(ids);
    }

    /// Pause blocks by id; no ids pauses every block
    pub fn pause<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.routine_mut().pause(ids);
    }

    /// Stop blocks by id; no ids stops every block
    pub fn stop<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.routine_mut().stop(ids);
    }

    /// Restart blocks by id; no ids restarts every block
    pub fn restart<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.routine_mut().restart(ids);
    }

    /// Stop and then activate blocks by id
    pub fn switch_to<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.routine_mut().switch_to(ids);
    }

    /// Activate every block
    pub fn activate_all(&mut self) {
        self.activate(Vec::<Id>::new());
    }

    /// Pause every block
    pub fn pause_all(&mut self) {
        self.pause(Vec::<Id>::new());
    }

    /// Stop every block
    pub fn stop_all(&mut self) {
        self.stop(Vec::<Id>::new());
    }

    /// Whether any of the given blocks is active; no ids checks every block
    pub fn is_active<I>(&self, ids: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.state.is_active(ids)
    }

    /// Whether any block is active
    pub fn is_running(&self) -> bool {
        self.state.blocks.iter().any(|b| b.active)
    }

    /// Step every active block once
    ///
    /// Blocks are stepped in registration order. Only blocks that were
    /// active when the tick began are stepped; a block activated during the
    /// tick first runs on the next one.
    #[instrument(skip(self), fields(tick = self.ticks))]
    pub fn tick(&mut self) -> TickSummary {
        let selected: Vec<usize> = self
            .state
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.active)
            .map(|(pos, _)| pos)
            .collect();

        let chain = self.state.options.advance == AdvanceMode::Chain;
        let mut deactivated = Vec::new();
        for &pos in &selected {
            if self.state.step(pos, chain) == Step::Stopped {
                deactivated.push(self.state.blocks[pos].id.clone());
            }
        }

        trace!(stepped = selected.len(), "Tick complete");
        let summary = TickSummary {
            tick: self.ticks,
            stepped: selected.len(),
            deactivated,
        };
        self.ticks += 1;
        summary
    }

    /// Number of completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Routine-wide properties
    pub fn properties(&self) -> &Properties {
        &self.state.properties
    }

    /// Routine-wide properties, mutably
    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.state.properties
    }

    /// The routine's clock
    pub fn clock(&self) -> &dyn Clock {
        self.state.clock.as_ref()
    }

    /// Routine options
    pub fn options(&self) -> &RoutineOptions {
        &self.state.options
    }

    fn routine_mut(&mut self) -> RoutineMut<'_> {
        RoutineMut::new(&mut self.state)
    }
}

impl Default for Routine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routine")
            .field("blocks", &self.state.blocks.len())
            .field("ticks", &self.ticks)
            .field("options", &self.state.options)
            .finish()
    }
}

/// Cross-block control from inside an action
///
/// Obtained from [`Block::routine`]. Changes apply immediately, but a block
/// that was already selected for the current tick still takes its step, and
/// a block activated mid-tick first runs on the next tick.
pub struct RoutineMut<'a> {
    state: &'a mut RoutineState,
}

impl<'a> RoutineMut<'a> {
    pub(crate) fn new(state: &'a mut RoutineState) -> Self {
        Self { state }
    }

    /// Activate blocks by id; no ids activates every block
    pub fn activate<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        for pos in self.state.select(ids) {
            self.state.activate(pos);
        }
    }

    /// Pause blocks by id; no ids pauses every block
    pub fn pause<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        for pos in self.state.select(ids) {
            self.state.pause(pos);
        }
    }

    /// Stop blocks by id; no ids stops every block
    pub fn stop<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        for pos in self.state.select(ids) {
            self.state.stop(pos);
        }
    }

    /// Restart blocks by id; no ids restarts every block
    pub fn restart<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        for pos in self.state.select(ids) {
            self.state.restart(pos);
        }
    }

    /// Stop and then activate blocks by id; no ids switches every block
    pub fn switch_to<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        let positions = self.state.select(ids);
        self.state.switch_to(&positions);
    }

    /// Whether any of the given blocks is active; no ids checks every block
    pub fn is_active<I>(&self, ids: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Id>,
    {
        self.state.is_active(ids)
    }

    /// Get a handle to a block
    pub fn block(&mut self, id: impl Into<Id>) -> Option<Block<'_>> {
        let pos = self.state.position(&id.into())?;
        Some(Block::new(self.state, pos))
    }

    /// Routine-wide properties
    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.state.properties
    }
}
