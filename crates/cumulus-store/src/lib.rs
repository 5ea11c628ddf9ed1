//! Status store access layer for cumulus.
//!
//! This crate defines the interface to the durable, strongly-consistent keyed
//! store that holds per-cluster state, together with the wire encodings used
//! for the compute fleet status record.
//!
//! # Architecture
//!
//! The store itself is external infrastructure: it is provisioned with the
//! cluster and shared by every actor that reads or advances fleet state (CLI
//! and API callers through the status manager, and the fleet daemon on the
//! head node). Correctness of concurrent updates rests entirely on the
//! store's conditional write: every mutation names the value it expects to
//! replace, and the store rejects the write if another actor got there first.
//! Reads are linearizable per key; an eventually-consistent backend would
//! break that protocol.
//!
//! Two implementations of [`StatusStore`] are provided:
//!
//! - [`HttpStatusStore`]: client for the durable store's REST facade
//! - [`MemoryStatusStore`]: in-process map for tests and local development

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod error;
pub mod http;
pub mod memory;
pub mod record;

pub use codec::{codec_for_version, CodecError, PlainTextCodec, StatusCodec, StructuredCodec};
pub use error::{Result, StoreError};
pub use http::HttpStatusStore;
pub use memory::MemoryStatusStore;
pub use record::StatusRecord;

use async_trait::async_trait;

/// Logical key of the compute fleet status record within a cluster's
/// namespace. Exactly one such record exists per cluster; it is created when
/// the cluster infrastructure is provisioned and deleted with the cluster.
pub const COMPUTE_FLEET_STATUS_KEY: &str = "COMPUTE_FLEET";

/// Access to the durable per-cluster keyed store.
///
/// Implementations must provide linearizable reads and atomic conditional
/// writes per key: `put_conditional` succeeds only if the stored value equals
/// the expected value at write time.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Read the record at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record exists at `key`, or
    /// [`StoreError::Transient`] if the store could not be reached.
    async fn get(&self, key: &str) -> Result<StatusRecord>;

    /// Atomically replace the record at `key` with `next`, provided the
    /// stored value equals `expected_value` at write time.
    ///
    /// A record's timestamp takes no part in the comparison; only the encoded
    /// status value does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConditionMismatch`] if the stored value differs
    /// from `expected_value` (including when the record is absent), or
    /// [`StoreError::Transient`] if the store could not be reached.
    async fn put_conditional(
        &self,
        key: &str,
        next: StatusRecord,
        expected_value: &str,
    ) -> Result<()>;
}
