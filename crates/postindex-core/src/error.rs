//! Client-side fetch failures.
//!
//! Every variant is handled the same way by the retrieval state machine:
//! the load guard is cleared, the error is recorded for the render layer,
//! and no data from the failed attempt is merged. The variants exist so
//! diagnostics can tell a timeout from a bad payload.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure: connection refused, DNS, I/O.
    #[error("network error fetching {resource}: {message}")]
    Network { resource: String, message: String },

    /// The server (or file store) answered, but not with the resource.
    #[error("{resource} returned status {status}")]
    Status { resource: String, status: u16 },

    /// The fetch did not resolve within the configured bound.
    #[error("timed out after {after_ms} ms fetching {resource}")]
    Timeout { resource: String, after_ms: u64 },

    /// The payload decoded to something other than a valid shard or summary.
    #[error("malformed {resource}: {reason}")]
    Malformed { resource: String, reason: String },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    pub fn resource(&self) -> &str {
        match self {
            FetchError::Network { resource, .. }
            | FetchError::Status { resource, .. }
            | FetchError::Timeout { resource, .. }
            | FetchError::Malformed { resource, .. } => resource,
        }
    }
}
