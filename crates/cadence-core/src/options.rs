//! Routine behavior options

use serde::{Deserialize, Serialize};

/// What a block does when it advances past its last action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndBehavior {
    /// Rewind to the first action and deactivate
    #[default]
    Deactivate,
    /// Rewind to the first action and keep running
    Loop,
}

/// When a gate starts running the branch it commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitTiming {
    /// The committing poll idles; the branch's first action is polled next tick
    #[default]
    NextTick,
    /// The branch's first action is polled within the committing poll
    SameTick,
}

/// How far a block may move within one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// Exactly one action is polled per block per tick
    #[default]
    Step,
    /// After an advance the next action is polled in the same tick, until an
    /// action idles or finishes, the block deactivates, or every action of
    /// the block has been polled once this tick
    Chain,
}

/// Options shared by every block of a routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoutineOptions {
    /// Default end-of-block behavior (blocks may override it)
    #[serde(default)]
    pub on_end: EndBehavior,

    /// Default gate commit timing (gates may override it)
    #[serde(default)]
    pub gate_commit: CommitTiming,

    /// Per-tick advance policy
    #[serde(default)]
    pub advance: AdvanceMode,
}
