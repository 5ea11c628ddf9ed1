//! Error types for fleet status orchestration.
//!
//! Every failure mode of the update protocol gets its own variant so that
//! calling layers branch on type rather than on message content. Transient
//! read failures never appear here: they are absorbed inside
//! [`get_status`](crate::ComputeFleetStatusManager::get_status), which
//! degrades to the caller's fallback value.

use cumulus_core::ComputeFleetStatus;
use cumulus_store::{CodecError, StoreError};
use thiserror::Error;

/// A result type using `FleetStatusError`.
pub type Result<T> = std::result::Result<T, FleetStatusError>;

/// Errors that can occur while requesting or observing a fleet transition.
#[derive(Debug, Error)]
pub enum FleetStatusError {
    /// No usable fleet status could be established.
    #[error("could not retrieve compute fleet status")]
    StatusUnavailable,

    /// The conditional status write found a value different from the one
    /// read: another actor mutated the record concurrently. Never retried
    /// internally; the decision to react is the caller's.
    #[error("compute fleet status was modified by a concurrent request after it was read")]
    ConditionalStatusUpdateFailed,

    /// An expected transition did not occur within the bounded wait.
    #[error("timed out after {timeout_seconds}s waiting for the compute fleet to leave {waited_on}")]
    TransitionTimeout {
        /// The status the manager was waiting to see change.
        waited_on: ComputeFleetStatus,
        /// The phase timeout that expired, in seconds.
        timeout_seconds: u64,
    },

    /// After waiting, the record held neither the expected in-progress nor
    /// final value: a different request most likely interleaved.
    #[error("Unexpected final state {observed}, probably due to a concurrent status update request")]
    ConcurrentUpdate {
        /// The status observed after waiting.
        observed: ComputeFleetStatus,
    },

    /// A non-conditional store failure while writing.
    #[error("status store error: {0}")]
    Store(StoreError),

    /// A status value could not be encoded for persistence.
    #[error("status encoding error: {0}")]
    Codec(CodecError),
}

impl FleetStatusError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::ConditionalStatusUpdateFailed | Self::ConcurrentUpdate { .. } => 409,
            Self::TransitionTimeout { .. } => 504,
            Self::Store(_) => 502,
            Self::StatusUnavailable | Self::Codec(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    ///
    /// Conflict-class errors are deliberately excluded: they signal a
    /// genuine concurrent writer, not a fault.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::StatusUnavailable => true,
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}
