//! Definition errors
//!
//! Running a routine never fails; only building one can.

use cadence_core::Id;
use thiserror::Error;

/// Errors raised while defining blocks and composite actions
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("block '{id}' has no actions")]
    EmptyBlock { id: Id },

    #[error("gate option has no actions")]
    EmptyGateOption,

    #[error("timing action has no pairs")]
    EmptyTiming,
}

/// Result type for definition operations
pub type ScriptResult<T> = Result<T, ScriptError>;
