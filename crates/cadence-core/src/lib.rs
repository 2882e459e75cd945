//! Core types for Cadence
//!
//! This crate provides the vocabulary shared by the sequencer engine and
//! its embedders: identifiers for blocks and labels, the [`Flow`] signal an
//! action returns each tick, the routine-wide [`Properties`] store, the
//! injected [`Clock`] capability, and [`RoutineOptions`].

mod clock;
mod flow;
mod id;
mod options;
mod properties;

pub use clock::{Clock, ManualClock, SystemClock};
pub use flow::Flow;
pub use id::Id;
pub use options::{AdvanceMode, CommitTiming, EndBehavior, RoutineOptions};
pub use properties::Properties;
