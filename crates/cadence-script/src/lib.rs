//! Sequencer Engine
//!
//! This crate provides a cooperative, frame-driven action sequencer. A
//! [`Routine`] owns named blocks; each block is an ordered list of actions
//! with a playhead. Every call to [`Routine::tick`] polls the current action
//! of each active block once, and the returned [`Flow`] decides whether the
//! block holds, advances, or finishes.
//!
//! # Action Types
//!
//! - Delays ([`Wait`], [`WaitTicks`], [`WaitTicksRandom`])
//! - Custom closures ([`Function`])
//! - Jump targets ([`Label`])
//! - Grouping ([`Collection`])
//! - Commit-once branching ([`Gate`])
//! - Timed callback chains ([`Timing`])
//! - Playhead and routine commands (see [`commands`])
//!
//! # Key Types
//!
//! - [`Action`] - The protocol every action implements
//! - [`Block`] - Handle to one block's playhead and the shared state
//! - [`Routine`] - The scheduler

pub mod action;
pub mod block;
pub mod commands;
pub mod error;
pub mod gate;
pub mod routine;
pub mod timing;

pub use action::{
    Action, BoxedAction, Collection, Function, Label, Wait, WaitTicks, WaitTicksRandom,
};
pub use block::Block;
pub use commands::{
    activate_blocks, finish, jump_to, pause_blocks, restart_block, set_index, set_property,
    stop_blocks, switch_blocks,
};
pub use error::{ScriptError, ScriptResult};
pub use gate::{Gate, GateOption};
pub use routine::{Routine, RoutineMut, TickSummary};
pub use timing::{Timing, TimingPair};

pub use cadence_core::{
    AdvanceMode, Clock, CommitTiming, EndBehavior, Flow, Id, ManualClock, Properties,
    RoutineOptions, SystemClock,
};
