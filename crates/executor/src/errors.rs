//! Errors for the `girder-executor` crate.

use thiserror::Error;

/// A [Result] type alias where the error is [ExecutorError].
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// An error encountered while submitting to destination contracts.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The signing key could not be parsed.
    #[error("Invalid signing key: {_0}")]
    InvalidKey(String),
    /// The RPC endpoint URL could not be parsed.
    #[error("Invalid endpoint: {_0}")]
    InvalidEndpoint(String),
    /// The transport or the node failed.
    #[error("RPC error: {_0}")]
    Rpc(String),
    /// A contract return value could not be decoded.
    #[error("ABI decode error: {_0}")]
    AbiDecode(String),
    /// A proposal of an unexpected variant reached this executor.
    #[error("No executor configured for proposal variant")]
    UnexpectedProposal,
}
