//! World-backend error type.

use thiserror::Error;

use tm_core::ActorId;

/// Errors produced when reading actors from the world backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error("actor {0} has been destroyed")]
    ActorDestroyed(ActorId),

    #[error("actor {0} not found")]
    ActorNotFound(ActorId),
}

pub type WorldResult<T> = Result<T, WorldError>;
