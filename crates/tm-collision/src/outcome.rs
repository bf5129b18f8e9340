//! Result of evaluating one candidate pair.

use thiserror::Error;

use tm_world::WorldError;

/// What one `(ego, candidate)` evaluation concluded.
#[derive(Clone, Debug, PartialEq)]
pub enum CandidateOutcome {
    /// Out of range, vertically separated, or the ego has priority.
    Clear,
    /// The ego must yield to this candidate.
    Hazard,
    /// The candidate could not be evaluated; treated as [`Clear`](Self::Clear).
    Skipped(SkipReason),
}

impl CandidateOutcome {
    #[inline]
    pub fn is_hazard(&self) -> bool {
        matches!(self, CandidateOutcome::Hazard)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SkipReason {
    #[error(transparent)]
    World(#[from] WorldError),

    #[error("candidate is neither managed nor tracked")]
    Untracked,

    #[error("candidate location is not finite")]
    NonFiniteLocation,
}
