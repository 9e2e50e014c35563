//! Errors for the `girder-beacon` crate.

use thiserror::Error;

/// A [Result] type alias where the error is [BeaconClientError].
pub type BeaconResult<T> = Result<T, BeaconClientError>;

/// An error returned by beacon node interactions.
#[derive(Error, Debug)]
pub enum BeaconClientError {
    /// The HTTP transport failed.
    #[error("Beacon request failed: {_0}")]
    Http(#[from] reqwest::Error),
    /// The requested object does not exist, e.g. a skipped slot.
    #[error("Beacon object not found: {_0}")]
    NotFound(String),
    /// The response body could not be decoded as SSZ.
    #[error("SSZ decode error: {_0}")]
    Ssz(String),
    /// The beacon node returned an unexpected status code.
    #[error("Unexpected beacon response status {_0} for {_1}")]
    UnexpectedStatus(u16, String),
}

impl BeaconClientError {
    /// Whether the error denotes a missing object rather than a failure.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
