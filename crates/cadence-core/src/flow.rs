//! Flow signal returned by actions

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a block should do after polling its current action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Stay on the current action and poll it again next tick
    Idle,
    /// Move on to the next action, or run off the end of the block
    Advance,
    /// Deactivate the block and rewind it to its first action
    Finish,
}

impl Flow {
    /// Whether the action asked to be polled again
    pub fn is_idle(self) -> bool {
        self == Flow::Idle
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flow::Idle => "idle",
            Flow::Advance => "advance",
            Flow::Finish => "finish",
        };
        f.write_str(name)
    }
}
