//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `TmError` as one variant
//! where configuration problems can surface.

use thiserror::Error;

/// The top-level error type for `tm-core`.
#[derive(Debug, Error)]
pub enum TmError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tm-core`.
pub type TmResult<T> = Result<T, TmError>;
