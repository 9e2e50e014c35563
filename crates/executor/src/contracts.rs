//! Call surfaces of the executor and hashi adapter contracts.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;

use crate::{ExecutorError, ExecutorResult, TransactOptions, Transactor};

pub(crate) mod abi {
    use alloy_sol_types::sol;

    sol! {
        /// A bridge proposal as the executor contract consumes it.
        struct Proposal {
            uint8 originDomainID;
            uint8 securityModel;
            uint64 depositNonce;
            bytes32 resourceID;
            bytes data;
            bytes[] storageProof;
        }

        function executeProposals(
            Proposal[] calldata proposals,
            bytes[] calldata accountProof,
            uint256 slot
        ) external;

        function isProposalExecuted(uint8 originDomainID, uint256 depositNonce)
            external
            view
            returns (bool);
    }

    sol! {
        function verifyAndStoreDispatchedMessage(
            uint64 srcSlot,
            uint64 txSlot,
            bytes[] calldata receiptsRootProof,
            bytes32 receiptsRoot,
            bytes[] calldata receiptProof,
            bytes calldata txIndexRLPEncoded,
            uint256 logIndex
        ) external;
    }
}

pub use abi::Proposal as ExecutorProposal;

/// The executor contract surface consumed by the batcher.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutorCalls: Send + Sync {
    /// Whether the proposal identified by `(origin_domain, deposit_nonce)`
    /// has already been executed.
    async fn is_proposal_executed(
        &self,
        origin_domain: u8,
        deposit_nonce: u64,
    ) -> ExecutorResult<bool>;

    /// Submits one batch of proposals sharing `account_proof` and `slot`.
    async fn execute_proposals(
        &self,
        proposals: Vec<ExecutorProposal>,
        account_proof: Vec<Bytes>,
        slot: U256,
        gas_limit: u64,
    ) -> ExecutorResult<B256>;
}

/// The hashi adapter surface consumed by the message submitter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HashiCalls: Send + Sync {
    /// Submits one dispatched-message verification.
    #[allow(clippy::too_many_arguments)]
    async fn verify_and_store_dispatched_message(
        &self,
        src_slot: u64,
        tx_slot: u64,
        receipts_root_proof: Vec<Bytes>,
        receipts_root: B256,
        receipt_proof: Vec<Bytes>,
        tx_index_rlp: Bytes,
        log_index: U256,
        gas_limit: u64,
    ) -> ExecutorResult<B256>;
}

/// An [ExecutorCalls] implementation over a deployed executor contract.
#[derive(Debug)]
pub struct ExecutorContract<T> {
    address: Address,
    transactor: Arc<T>,
}

impl<T> ExecutorContract<T> {
    /// Creates a client for the executor at `address`.
    pub const fn new(address: Address, transactor: Arc<T>) -> Self {
        Self { address, transactor }
    }
}

#[async_trait]
impl<T: Transactor> ExecutorCalls for ExecutorContract<T> {
    async fn is_proposal_executed(
        &self,
        origin_domain: u8,
        deposit_nonce: u64,
    ) -> ExecutorResult<bool> {
        let call = abi::isProposalExecutedCall {
            originDomainID: origin_domain,
            depositNonce: U256::from(deposit_nonce),
        };
        let returned = self.transactor.call(self.address, call.abi_encode().into()).await?;
        abi::isProposalExecutedCall::abi_decode_returns(&returned)
            .map_err(|e| ExecutorError::AbiDecode(e.to_string()))
    }

    async fn execute_proposals(
        &self,
        proposals: Vec<ExecutorProposal>,
        account_proof: Vec<Bytes>,
        slot: U256,
        gas_limit: u64,
    ) -> ExecutorResult<B256> {
        let call = abi::executeProposalsCall { proposals, accountProof: account_proof, slot };
        self.transactor
            .send(self.address, call.abi_encode().into(), TransactOptions { gas_limit })
            .await
    }
}

/// A [HashiCalls] implementation over a deployed hashi adapter.
#[derive(Debug)]
pub struct HashiAdapterContract<T> {
    address: Address,
    transactor: Arc<T>,
}

impl<T> HashiAdapterContract<T> {
    /// Creates a client for the hashi adapter at `address`.
    pub const fn new(address: Address, transactor: Arc<T>) -> Self {
        Self { address, transactor }
    }
}

#[async_trait]
impl<T: Transactor> HashiCalls for HashiAdapterContract<T> {
    async fn verify_and_store_dispatched_message(
        &self,
        src_slot: u64,
        tx_slot: u64,
        receipts_root_proof: Vec<Bytes>,
        receipts_root: B256,
        receipt_proof: Vec<Bytes>,
        tx_index_rlp: Bytes,
        log_index: U256,
        gas_limit: u64,
    ) -> ExecutorResult<B256> {
        let call = abi::verifyAndStoreDispatchedMessageCall {
            srcSlot: src_slot,
            txSlot: tx_slot,
            receiptsRootProof: receipts_root_proof,
            receiptsRoot: receipts_root,
            receiptProof: receipt_proof,
            txIndexRLPEncoded: tx_index_rlp,
            logIndex: log_index,
        };
        self.transactor
            .send(self.address, call.abi_encode().into(), TransactOptions { gas_limit })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    #[test]
    fn test_is_proposal_executed_selector_stability() {
        assert_eq!(abi::isProposalExecutedCall::SIGNATURE, "isProposalExecuted(uint8,uint256)");
        assert_eq!(
            abi::executeProposalsCall::SIGNATURE,
            "executeProposals((uint8,uint8,uint64,bytes32,bytes,bytes[])[],bytes[],uint256)"
        );
        assert_eq!(
            abi::verifyAndStoreDispatchedMessageCall::SIGNATURE,
            "verifyAndStoreDispatchedMessage(uint64,uint64,bytes[],bytes32,bytes[],bytes,uint256)"
        );
    }

    #[test]
    fn test_proposal_abi_roundtrip() {
        let proposal = ExecutorProposal {
            originDomainID: 1,
            securityModel: 1,
            depositNonce: 7,
            resourceID: B256::repeat_byte(3),
            data: Bytes::from(vec![1, 2, 3]),
            storageProof: vec![Bytes::from(vec![9])],
        };
        let encoded = proposal.abi_encode();
        let decoded = ExecutorProposal::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.originDomainID, 1);
        assert_eq!(decoded.depositNonce, 7);
        assert_eq!(decoded.resourceID, B256::repeat_byte(3));
        assert_eq!(decoded.data, Bytes::from(vec![1, 2, 3]));
        assert_eq!(decoded.storageProof, vec![Bytes::from(vec![9])]);
    }
}
