//! Spatial-subsystem error type.

use thiserror::Error;

use tm_core::ActorId;

/// Errors produced by `tm-spatial`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    #[error("invalid grid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("actor {0} has a non-finite location")]
    NonFiniteLocation(ActorId),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
