//! Typed internal messages and the proposals derived from them.

use alloy_primitives::{Bytes, B256};

use crate::DepositRecord;

/// The variant of a [Message] or [Proposal], used for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A newly accepted state root.
    StateRoot,
    /// A proven bridge deposit.
    Transfer,
    /// A proven dispatched message.
    Dispatched,
}

/// A state root accepted on the observing domain.
#[derive(Debug, Clone)]
pub struct StateRootData {
    /// The accepted execution state root.
    pub state_root: B256,
    /// Finalized beacon slot the root belongs to.
    pub slot: u64,
}

/// How a transfer is executed on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// A fungible token transfer.
    Fungible,
    /// A generic call whose execution gas rides in the deposit data.
    Generic,
}

/// Evidence that a deposit is included in a proven state root.
#[derive(Debug, Clone)]
pub struct TransferData {
    /// The deposit itself.
    pub deposit: DepositRecord,
    /// Beacon slot of the state root the proofs anchor to.
    pub slot: u64,
    /// Account proof of the router, state root to account.
    pub account_proof: Vec<Bytes>,
    /// Storage proof of the deposit's executor slot.
    pub storage_proof: Vec<Bytes>,
    /// Transfer classification.
    pub kind: TransferKind,
}

/// Evidence that a dispatched message's receipt is included under a proven
/// state root.
#[derive(Debug, Clone)]
pub struct DispatchedData {
    /// Beacon slot of the accepted state root.
    pub src_slot: u64,
    /// Beacon slot containing the transaction.
    pub tx_slot: u64,
    /// SSZ proof from the receipts root to the trusted beacon root.
    pub receipts_root_proof: Vec<B256>,
    /// The receipts root of the transaction's block.
    pub receipts_root: B256,
    /// Merkle-Patricia proof of the receipt, root first.
    pub receipt_proof: Vec<Bytes>,
    /// RLP encoding of the transaction index.
    pub tx_index_rlp: Bytes,
    /// Position of the message log within the receipt.
    pub log_index: u64,
}

/// The payload of an internal [Message].
#[derive(Debug, Clone)]
pub enum Payload {
    /// See [StateRootData].
    StateRoot(StateRootData),
    /// See [TransferData].
    Transfer(TransferData),
    /// See [DispatchedData].
    Dispatched(DispatchedData),
}

/// An internal message routed between domains.
#[derive(Debug, Clone)]
pub struct Message {
    /// Domain the message originates from.
    pub source: u8,
    /// Domain the message is addressed to.
    pub destination: u8,
    /// Identifier used for log correlation.
    pub id: String,
    /// The payload.
    pub payload: Payload,
}

impl Message {
    /// A state-root message from the observing domain to the root's source.
    pub fn state_root(source: u8, destination: u8, data: StateRootData) -> Self {
        let id = format!("{}-{}-{}", source, destination, data.slot);
        Self { source, destination, id, payload: Payload::StateRoot(data) }
    }

    /// A transfer message carrying deposit evidence.
    pub fn transfer(source: u8, destination: u8, data: TransferData) -> Self {
        let id = format!("{}-{}-{}", source, destination, data.deposit.deposit_nonce);
        Self { source, destination, id, payload: Payload::Transfer(data) }
    }

    /// A dispatched-message message carrying receipt evidence.
    pub fn dispatched(source: u8, destination: u8, id: String, data: DispatchedData) -> Self {
        Self { source, destination, id, payload: Payload::Dispatched(data) }
    }

    /// The variant of this message.
    pub const fn kind(&self) -> MessageKind {
        match &self.payload {
            Payload::StateRoot(_) => MessageKind::StateRoot,
            Payload::Transfer(_) => MessageKind::Transfer,
            Payload::Dispatched(_) => MessageKind::Dispatched,
        }
    }
}

/// The payload of an executor [Proposal].
#[derive(Debug, Clone)]
pub enum ProposalPayload {
    /// See [TransferData].
    Transfer(TransferData),
    /// See [DispatchedData].
    Dispatched(DispatchedData),
}

/// A unit of destination-side work derived from a [Message].
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Domain the underlying event happened on.
    pub source: u8,
    /// Domain the proposal executes on.
    pub destination: u8,
    /// Identifier of the originating message.
    pub id: String,
    /// The payload.
    pub payload: ProposalPayload,
}
