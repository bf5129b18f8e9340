use thiserror::Error;

use tm_core::Version;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A publish did not advance the channel by exactly one version.
    ///
    /// This is a wiring bug, never a transient condition.
    #[error("version desync: channel expected {expected}, publisher sent {got}")]
    VersionDesync {
        expected: Version,
        got:      Version,
    },

    #[error("channel closed")]
    Closed,

    #[error("pipeline configuration error: {0}")]
    Config(String),

    /// A stage failed outside its recoverable region; the tick is lost.
    #[error("stage failure: {0}")]
    Stage(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
