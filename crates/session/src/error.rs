use crate::state::Phase;
use thiserror::Error;
use wtsplit_matrix::ValidationError;

/// Result type for session transitions
pub type Result<T> = std::result::Result<T, SessionError>;

/// Reasons a session refuses an event.
///
/// A refused event leaves the previous session value untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// No node is open for splitting
    #[error("No split session is open")]
    NotOpen,

    /// Event does not apply to the current state
    #[error("Cannot {action} while {phase}")]
    InvalidState { action: &'static str, phase: Phase },

    /// User input failed validation
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Level outside `[node level, level count)`
    #[error("Level {level} is not selectable (allowed {min}..{count})")]
    LevelNotSelectable { level: usize, min: usize, count: usize },

    /// Candidate or confirmed index past the end of its list
    #[error("Index {index} out of range ({len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Breakpoint is in the confirmed list already
    #[error("Breakpoint {0} is already confirmed")]
    AlreadyConfirmed(f64),

    /// At least one confirmed breakpoint has to stay
    #[error("The last confirmed breakpoint cannot be removed")]
    LastConfirmed,

    /// Bounded search needs a confirmed breakpoint and a direction
    #[error("Select a confirmed breakpoint and a search direction first")]
    NoBoundSelected,

    /// A suggestion request is still in flight
    #[error("A suggestion request is still pending")]
    RequestPending,

    /// Response belongs to a session generation that no longer exists
    #[error("Stale response for generation {received} (current generation {current})")]
    StaleResponse { current: u64, received: u64 },
}

impl SessionError {
    pub(crate) const fn invalid_state(action: &'static str, phase: Phase) -> Self {
        Self::InvalidState { action, phase }
    }

    /// Stale responses are dropped without telling the user
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::StaleResponse { .. })
    }
}
