//! # Error Types
//!
//! Error taxonomy for the controller library.
//!
//! Not-found on read is never surfaced through this type: the cluster port
//! maps 404 responses to `Ok(None)` so callers treat absence as a normal
//! branch. Everything else — conflicts, timeouts, unavailability — propagates
//! unchanged for the controller runtime to retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Any Kubernetes API error other than not-found on read.
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    /// A synthesized or observed object is missing `metadata.name`.
    #[error("object has no name in metadata")]
    MissingName,

    /// Object serialization failed (only reachable through test fakes and
    /// status patching).
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
