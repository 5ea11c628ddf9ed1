//! Wire encodings for the persisted fleet status value.
//!
//! Two encodings exist for the same logical values. Clusters running daemon
//! software from before the structured encoding was introduced persist the
//! bare status name; newer clusters persist a JSON document. The codec is
//! selected once per cluster from its software version so that the manager
//! always speaks the same dialect as the daemon.
//!
//! The value spaces are disjoint: a JSON document is not a valid status name
//! and a status name is not valid JSON, so bytes produced by one codec never
//! decode under the other.

use cumulus_core::ComputeFleetStatus;
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while encoding or decoding a status value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value does not name any persistable fleet status.
    #[error("unrecognized status value: {0}")]
    UnrecognizedValue(String),

    /// The payload could not be parsed under this encoding.
    #[error("malformed status payload: {0}")]
    Malformed(String),

    /// The status is a read-side sentinel that is never persisted.
    #[error("status {0} cannot be persisted")]
    NotPersistable(ComputeFleetStatus),
}

/// A wire encoding for [`ComputeFleetStatus`] values.
///
/// Round-trips are exact: `decode(encode(s)) == s` for every persistable
/// status. [`ComputeFleetStatus::Unknown`] is rejected in both directions.
pub trait StatusCodec: Send + Sync {
    /// Encode a status for persistence.
    ///
    /// The output depends only on `status`, so equality over encoded values
    /// is equality over statuses, which the conditional-write protocol
    /// relies on.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotPersistable`] for the `UNKNOWN` sentinel.
    fn encode(&self, status: ComputeFleetStatus) -> Result<String, CodecError>;

    /// Decode a persisted value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] if the payload is not in this
    /// codec's format, or [`CodecError::UnrecognizedValue`] if it names no
    /// persistable status.
    fn decode(&self, value: &str) -> Result<ComputeFleetStatus, CodecError>;
}

/// The structured JSON encoding: `{"status":"<NAME>"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredCodec;

/// The JSON document wrapping a status value.
#[derive(Serialize, Deserialize)]
struct StatusDocument {
    status: ComputeFleetStatus,
}

impl StatusCodec for StructuredCodec {
    fn encode(&self, status: ComputeFleetStatus) -> Result<String, CodecError> {
        if status == ComputeFleetStatus::Unknown {
            return Err(CodecError::NotPersistable(status));
        }
        serde_json::to_string(&StatusDocument { status })
            .map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn decode(&self, value: &str) -> Result<ComputeFleetStatus, CodecError> {
        let document: StatusDocument =
            serde_json::from_str(value).map_err(|e| CodecError::Malformed(e.to_string()))?;
        if document.status == ComputeFleetStatus::Unknown {
            return Err(CodecError::UnrecognizedValue(value.to_string()));
        }
        Ok(document.status)
    }
}

/// The legacy plain-text encoding: the bare status name.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextCodec;

impl StatusCodec for PlainTextCodec {
    fn encode(&self, status: ComputeFleetStatus) -> Result<String, CodecError> {
        if status == ComputeFleetStatus::Unknown {
            return Err(CodecError::NotPersistable(status));
        }
        Ok(status.as_str().to_string())
    }

    fn decode(&self, value: &str) -> Result<ComputeFleetStatus, CodecError> {
        let status: ComputeFleetStatus = value
            .parse()
            .map_err(|_| CodecError::UnrecognizedValue(value.to_string()))?;
        if status == ComputeFleetStatus::Unknown {
            return Err(CodecError::UnrecognizedValue(value.to_string()));
        }
        Ok(status)
    }
}

/// Select the codec matching a cluster's daemon software version.
///
/// The structured encoding shipped with daemon 2.0.0; older daemons read and
/// write the plain-text encoding.
#[must_use]
pub fn codec_for_version(version: &Version) -> &'static dyn StatusCodec {
    if *version >= Version::new(2, 0, 0) {
        &StructuredCodec
    } else {
        &PlainTextCodec
    }
}
