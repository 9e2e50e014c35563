//! Errors for the `girder-proof` crate.

use alloy_primitives::B256;
use girder_beacon::BeaconClientError;
use thiserror::Error;

/// A [Result] type alias where the error is [ProofError].
pub type ProofResult<T> = Result<T, ProofError>;

/// An error encountered while constructing an inclusion proof.
#[derive(Error, Debug)]
pub enum ProofError {
    /// A beacon node interaction failed.
    #[error("Beacon client error: {_0}")]
    Beacon(#[from] BeaconClientError),
    /// An execution RPC interaction failed.
    #[error("Provider error: {_0}")]
    Provider(String),
    /// The rebuilt receipt trie does not match the block header.
    #[error("Reconstructed receipts root {actual} does not match header root {expected}")]
    StateInconsistent {
        /// Root recorded in the block header.
        expected: B256,
        /// Root of the rebuilt trie.
        actual: B256,
    },
    /// A generalized index walked past a leaf of the tree.
    #[error("Generalized index {_0} is out of range for the tree")]
    GindexOutOfRange(u64),
    /// The transaction is not yet included in a block.
    #[error("Transaction {_0} has no canonical block")]
    PendingTransaction(B256),
    /// The trie retained no proof for the requested key.
    #[error("No proof retained for transaction index {_0}")]
    MissingProof(u64),
}
