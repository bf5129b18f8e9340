use thiserror::Error;

use tm_core::TmError;
use tm_pipeline::PipelineError;
use tm_spatial::SpatialError;
use tm_world::WorldError;

#[derive(Debug, Error)]
pub enum CollisionError {
    #[error(transparent)]
    Config(#[from] TmError),

    #[error("world error: {0}")]
    World(#[from] WorldError),

    #[error("spatial index error: {0}")]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type CollisionResult<T> = Result<T, CollisionError>;

impl From<CollisionError> for PipelineError {
    fn from(e: CollisionError) -> Self {
        match e {
            CollisionError::Pipeline(inner) => inner,
            other => PipelineError::Stage(other.to_string()),
        }
    }
}
