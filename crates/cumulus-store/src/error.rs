//! Error types for the status store layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during status store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists at the requested key.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A conditional write found a stored value different from the expected
    /// one: another actor mutated the record after it was read.
    #[error("conditional write failed for key {0}: stored value differs from expected")]
    ConditionMismatch(String),

    /// The store could not be reached or answered with a service failure.
    #[error("status store unavailable: {0}")]
    Transient(String),

    /// A wire payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true if this error might be resolved by retrying.
    ///
    /// A [`StoreError::ConditionMismatch`] is deliberately not retriable at
    /// this layer: it signals a genuine concurrent writer, and the decision
    /// to react belongs to the caller.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
