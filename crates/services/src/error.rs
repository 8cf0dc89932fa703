//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::BuildError;
use quiz_core::model::TransitionError;
use storage::repository::StorageError;

/// Errors emitted by `QuizStateMachine`.
///
/// Every variant leaves the session exactly as it was before the call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    /// The statement pool could not be fetched.
    #[error("statement pool unavailable: {0}")]
    PoolUnavailable(#[source] StorageError),
    /// The pool cannot produce a valid session (missing labels, too few statements).
    #[error(transparent)]
    Config(#[from] BuildError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl QuizError {
    /// True for rejected operations that a host may simply ignore.
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Transition(_))
    }
}
