//! Errors for the `girder-relay` crate.

use girder_beacon::BeaconClientError;
use girder_proof::ProofError;
use girder_store::StoreError;
use thiserror::Error;

use crate::MessageKind;

/// A [Result] type alias where the error is [ProviderError].
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A [Result] type alias where the error is [HandlerError].
pub type HandlerResult<T> = Result<T, HandlerError>;

/// An error returned by execution RPC interactions.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The transport or the node failed.
    #[error("RPC error: {_0}")]
    Rpc(String),
    /// The requested block is unknown to the node.
    #[error("Block {_0} not found")]
    MissingBlock(alloy_primitives::B256),
    /// The requested receipt is unknown to the node.
    #[error("Receipt for transaction {_0} not found")]
    MissingReceipt(alloy_primitives::B256),
}

/// An error encountered while handling events or messages.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// An execution RPC interaction failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// A beacon node interaction failed.
    #[error(transparent)]
    Beacon(#[from] BeaconClientError),
    /// Proof construction failed.
    #[error(transparent)]
    Proof(#[from] ProofError),
    /// The block store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The handler is misconfigured.
    #[error("Configuration error: {_0}")]
    Config(String),
    /// The outbound message channel is closed.
    #[error("Outbound message channel closed")]
    ChannelClosed,
    /// A required field was absent from an RPC response.
    #[error("Missing {_0} in RPC response")]
    MissingField(&'static str),
    /// No beacon block was found within the skipped-slot search window.
    #[error("No beacon block found within {tries} slots after {after}")]
    SlotNotFound {
        /// Slot of the parent beacon block.
        after: u64,
        /// Number of child slots probed.
        tries: u64,
    },
    /// A message of an unexpected variant reached this handler.
    #[error("Unexpected message kind {_0:?}")]
    UnexpectedMessage(MessageKind),
    /// A destination-side submission failed.
    #[error("Execution error: {_0}")]
    Execution(String),
}
