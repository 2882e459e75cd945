//! Sequential timed callbacks

use crate::action::Action;
use crate::block::Block;
use crate::error::{ScriptError, ScriptResult};
use cadence_core::Flow;
use std::fmt;
use std::time::Duration;

type CallbackFn = Box<dyn FnMut(&mut Block<'_>)>;

/// A callback to run once `duration` has passed
pub struct TimingPair {
    duration: Duration,
    callback: CallbackFn,
    deadline: Option<Duration>,
}

impl TimingPair {
    /// Create a pair that runs `callback` once `duration` has passed after
    /// the pair becomes current
    pub fn new(duration: Duration, callback: impl FnMut(&mut Block<'_>) + 'static) -> Self {
        Self {
            duration,
            callback: Box::new(callback),
            deadline: None,
        }
    }

    /// The configured delay
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Debug for TimingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingPair")
            .field("duration", &self.duration)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Runs callbacks one after another, each after its own delay
///
/// A pair's deadline is computed on the first poll that reaches it, so the
/// delays are measured back to back. When the last callback has fired the
/// chain advances its block and rewinds itself, ready to run again.
#[derive(Debug)]
pub struct Timing {
    pairs: Vec<TimingPair>,
    index: usize,
}

impl Timing {
    /// Create a timing chain; it must contain at least one pair
    pub fn new(pairs: Vec<TimingPair>) -> ScriptResult<Self> {
        if pairs.is_empty() {
            return Err(ScriptError::EmptyTiming);
        }
        Ok(Self { pairs, index: 0 })
    }

    /// Index of the pair currently waited on
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of pairs in the chain
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Always false; chains cannot be built empty
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Action for Timing {
    fn init(&mut self, _block: &mut Block<'_>) {
        self.index = 0;
        for pair in &mut self.pairs {
            pair.deadline = None;
        }
    }

    fn poll(&mut self, block: &mut Block<'_>) -> Flow {
        let Some(pair) = self.pairs.get_mut(self.index) else {
            self.index = 0;
            return Flow::Advance;
        };

        let now = block.now();
        let deadline = *pair.deadline.get_or_insert(now + pair.duration);
        if now < deadline {
            return Flow::Idle;
        }

        (pair.callback)(block);
        pair.deadline = None;
        self.index += 1;
        if self.index >= self.pairs.len() {
            self.index = 0;
            return Flow::Advance;
        }
        Flow::Idle
    }
}
