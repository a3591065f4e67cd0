//! Core capability errors (identifier validation).
//!
//! These are bounded and stable: core errors describe refusals of malformed
//! input, not library implementation details.

use thiserror::Error;

/// Invalid identifier component.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("membership id is invalid: {reason}")]
    Membership { reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
}
