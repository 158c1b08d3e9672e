use crate::grapple::state::GrappleState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Catalog lookup failed: {0}")]
    CatalogLookupFailed(String),

    #[error("Illegal grapple transition: {from:?} -> {to:?}")]
    IllegalGrappleTransition { from: GrappleState, to: GrappleState },

    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
