//! The destination-side proposal batcher.

use std::sync::Arc;

use alloy_primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use tracing::{error, info};

use girder_relay::{
    HandlerError, HandlerResult, Proposal, ProposalExecutor, ProposalPayload, TransferData,
    TransferKind,
};

use crate::{ExecutorCalls, ExecutorProposal, ExecutorResult, HashiCalls};

/// Gas estimate of a fungible transfer proposal.
pub const TRANSFER_GAS_COST: u64 = 600_000;

/// Gas limit of a dispatched-message verification.
pub const HASHI_GAS_COST: u64 = 3_000_000;

/// Upper bound on the accumulated gas of one submission.
pub const TRANSACTION_MAX_GAS: u64 = 10_000_000;

#[derive(Debug, Default)]
struct Batch {
    proposals: Vec<ExecutorProposal>,
    gas_limit: u64,
}

/// Executes transfer and dispatched-message proposals on one domain,
/// partitioning transfers into gas-bounded batches and filtering out
/// proposals the contract has already executed.
#[derive(Debug)]
pub struct EvmExecutor<E, H> {
    domain_id: u8,
    executor: Arc<E>,
    hashi: Arc<H>,
}

impl<E, H> EvmExecutor<E, H> {
    /// Creates a new [EvmExecutor] for `domain_id`.
    pub const fn new(domain_id: u8, executor: Arc<E>, hashi: Arc<H>) -> Self {
        Self { domain_id, executor, hashi }
    }
}

/// Gas estimate of one transfer: generic deposits carry a caller-supplied
/// execution-gas field in the first 32 bytes of their data.
fn proposal_gas(data: &TransferData) -> u64 {
    if data.kind != TransferKind::Generic {
        return TRANSFER_GAS_COST;
    }
    let generic_gas = match data.deposit.data.get(..32) {
        Some(word) => U256::from_be_slice(word).saturating_to::<u64>(),
        None => 0,
    };
    TRANSFER_GAS_COST.saturating_add(generic_gas)
}

fn executor_proposal(source: u8, data: &TransferData) -> ExecutorProposal {
    ExecutorProposal {
        originDomainID: source,
        securityModel: data.deposit.security_model,
        depositNonce: data.deposit.deposit_nonce,
        resourceID: data.deposit.resource_id,
        data: data.deposit.data.clone(),
        storageProof: data.storage_proof.clone(),
    }
}

impl<E: ExecutorCalls, H: HashiCalls> EvmExecutor<E, H> {
    async fn proposal_batches(&self, proposals: &[Proposal]) -> ExecutorResult<Vec<Batch>> {
        let mut batches = Vec::new();
        let mut current = Batch::default();

        for proposal in proposals {
            let ProposalPayload::Transfer(data) = &proposal.payload else {
                continue;
            };
            if self.executor.is_proposal_executed(proposal.source, data.deposit.deposit_nonce).await?
            {
                info!(
                    target: "executor",
                    domain_id = self.domain_id,
                    source = proposal.source,
                    nonce = data.deposit.deposit_nonce,
                    "Proposal already executed"
                );
                continue;
            }

            let gas = proposal_gas(data);
            if !current.proposals.is_empty() && current.gas_limit + gas >= TRANSACTION_MAX_GAS {
                batches.push(std::mem::take(&mut current));
            }
            current.gas_limit += gas;
            current.proposals.push(executor_proposal(proposal.source, data));
        }

        batches.push(current);
        Ok(batches)
    }

    async fn transfer(&self, proposals: Vec<Proposal>) -> HandlerResult<()> {
        let ProposalPayload::Transfer(first) = &proposals[0].payload else {
            return Err(HandlerError::Execution("expected transfer proposals".into()));
        };
        let account_proof: Vec<Bytes> = first.account_proof.clone();
        let slot = U256::from(first.slot);
        let message_id = proposals[0].id.clone();

        let batches = self
            .proposal_batches(&proposals)
            .await
            .map_err(|e| HandlerError::Execution(e.to_string()))?;

        for batch in batches {
            if batch.proposals.is_empty() {
                continue;
            }
            match self
                .executor
                .execute_proposals(batch.proposals, account_proof.clone(), slot, batch.gas_limit)
                .await
            {
                Ok(hash) => {
                    info!(
                        target: "executor",
                        domain_id = self.domain_id,
                        message_id = %message_id,
                        hash = %hash,
                        "Sent proposals execution"
                    );
                }
                Err(err) => {
                    // The contract's used-nonce filter makes a retry of this
                    // batch on the next observation safe.
                    error!(target: "executor", domain_id = self.domain_id, %err, "Failed executing proposals");
                    continue;
                }
            }
        }
        Ok(())
    }

    async fn store_messages(&self, proposals: Vec<Proposal>) -> HandlerResult<()> {
        for proposal in proposals {
            let ProposalPayload::Dispatched(data) = &proposal.payload else {
                continue;
            };
            let receipts_root_proof: Vec<Bytes> = data
                .receipts_root_proof
                .iter()
                .map(|hash| Bytes::copy_from_slice(hash.as_slice()))
                .collect();
            let hash: B256 = self
                .hashi
                .verify_and_store_dispatched_message(
                    data.src_slot,
                    data.tx_slot,
                    receipts_root_proof,
                    data.receipts_root,
                    data.receipt_proof.clone(),
                    data.tx_index_rlp.clone(),
                    U256::from(data.log_index),
                    HASHI_GAS_COST,
                )
                .await
                .map_err(|e| HandlerError::Execution(e.to_string()))?;

            info!(
                target: "executor",
                domain_id = self.domain_id,
                message_id = %proposal.id,
                hash = %hash,
                "Sent hashi message execution"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<E: ExecutorCalls, H: HashiCalls> ProposalExecutor for EvmExecutor<E, H> {
    async fn execute(&self, proposals: Vec<Proposal>) -> HandlerResult<()> {
        let Some(first) = proposals.first() else { return Ok(()) };
        match first.payload {
            ProposalPayload::Transfer(_) => self.transfer(proposals).await,
            ProposalPayload::Dispatched(_) => self.store_messages(proposals).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockExecutorCalls, MockHashiCalls};
    use girder_relay::{DepositRecord, DispatchedData};
    use proptest::prelude::*;

    fn transfer_proposal(nonce: u64, kind: TransferKind, data: Vec<u8>) -> Proposal {
        Proposal {
            source: 1,
            destination: 2,
            id: format!("1-2-{nonce}"),
            payload: ProposalPayload::Transfer(TransferData {
                deposit: DepositRecord {
                    destination_domain_id: 2,
                    security_model: 1,
                    resource_id: B256::repeat_byte(3),
                    deposit_nonce: nonce,
                    sender: Default::default(),
                    data: data.into(),
                },
                slot: 10,
                account_proof: vec![Bytes::from(vec![1u8])],
                storage_proof: vec![Bytes::from(vec![2u8])],
                kind,
            }),
        }
    }

    fn dispatched_proposal(id: u64) -> Proposal {
        Proposal {
            source: 1,
            destination: 2,
            id: id.to_string(),
            payload: ProposalPayload::Dispatched(DispatchedData {
                src_slot: 150,
                tx_slot: 121,
                receipts_root_proof: vec![B256::repeat_byte(2)],
                receipts_root: B256::repeat_byte(9),
                receipt_proof: vec![Bytes::from(vec![1u8])],
                tx_index_rlp: Bytes::from(vec![0x80]),
                log_index: 0,
            }),
        }
    }

    fn never_executed() -> MockExecutorCalls {
        let mut executor = MockExecutorCalls::new();
        executor.expect_is_proposal_executed().returning(|_, _| Ok(false));
        executor
    }

    #[tokio::test]
    async fn test_batches_respect_gas_cap() {
        // Twenty fungible proposals at 600k gas each split 16 + 4.
        let mut executor = never_executed();
        let mut calls = Vec::new();
        executor
            .expect_execute_proposals()
            .times(2)
            .returning_st(move |proposals, _, _, gas_limit| {
                calls.push(());
                match calls.len() {
                    1 => {
                        assert_eq!(proposals.len(), 16);
                        assert_eq!(gas_limit, 9_600_000);
                    }
                    _ => {
                        assert_eq!(proposals.len(), 4);
                        assert_eq!(gas_limit, 2_400_000);
                    }
                }
                Ok(B256::repeat_byte(0xbb))
            });

        let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
        let proposals: Vec<_> =
            (0..20).map(|i| transfer_proposal(i, TransferKind::Fungible, vec![])).collect();
        evm.execute(proposals).await.unwrap();
    }

    #[tokio::test]
    async fn test_executed_proposals_are_filtered() {
        let mut executor = MockExecutorCalls::new();
        executor
            .expect_is_proposal_executed()
            .returning(|_, nonce| Ok(nonce == 1));
        executor
            .expect_execute_proposals()
            .times(1)
            .returning(|proposals, _, _, gas_limit| {
                assert_eq!(proposals.len(), 1);
                assert_eq!(proposals[0].depositNonce, 2);
                assert_eq!(gas_limit, TRANSFER_GAS_COST);
                Ok(B256::ZERO)
            });

        let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
        evm.execute(vec![
            transfer_proposal(1, TransferKind::Fungible, vec![]),
            transfer_proposal(2, TransferKind::Fungible, vec![]),
        ])
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_generic_gas_includes_data_field() {
        let mut generic_gas = [0u8; 32];
        generic_gas[24..].copy_from_slice(&100_000u64.to_be_bytes());

        let mut executor = never_executed();
        executor
            .expect_execute_proposals()
            .times(1)
            .returning(|_, _, _, gas_limit| {
                assert_eq!(gas_limit, 700_000);
                Ok(B256::ZERO)
            });

        let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
        evm.execute(vec![transfer_proposal(1, TransferKind::Generic, generic_gas.to_vec())])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_batch_order_matches_input_order() {
        let mut executor = never_executed();
        executor
            .expect_execute_proposals()
            .times(1)
            .returning(|proposals, _, _, _| {
                let nonces: Vec<u64> = proposals.iter().map(|p| p.depositNonce).collect();
                assert_eq!(nonces, vec![5, 3, 9]);
                Ok(B256::ZERO)
            });

        let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
        evm.execute(vec![
            transfer_proposal(5, TransferKind::Fungible, vec![]),
            transfer_proposal(3, TransferKind::Fungible, vec![]),
            transfer_proposal(9, TransferKind::Fungible, vec![]),
        ])
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_batch_error_does_not_abort_remaining_batches() {
        let mut executor = never_executed();
        let mut call = 0usize;
        executor
            .expect_execute_proposals()
            .times(2)
            .returning_st(move |_, _, _, _| {
                call += 1;
                if call == 1 {
                    Err(crate::ExecutorError::Rpc("revert".into()))
                } else {
                    Ok(B256::ZERO)
                }
            });

        let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
        let proposals: Vec<_> =
            (0..20).map(|i| transfer_proposal(i, TransferKind::Fungible, vec![])).collect();
        evm.execute(proposals).await.unwrap();
    }

    #[tokio::test]
    async fn test_idempotency_check_failure_aborts() {
        let mut executor = MockExecutorCalls::new();
        executor
            .expect_is_proposal_executed()
            .returning(|_, _| Err(crate::ExecutorError::Rpc("down".into())));

        let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
        let result =
            evm.execute(vec![transfer_proposal(1, TransferKind::Fungible, vec![])]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatched_proposal_uses_fixed_gas() {
        let mut hashi = MockHashiCalls::new();
        hashi
            .expect_verify_and_store_dispatched_message()
            .times(1)
            .returning(|src_slot, tx_slot, _, _, _, _, log_index, gas_limit| {
                assert_eq!(src_slot, 150);
                assert_eq!(tx_slot, 121);
                assert_eq!(log_index, U256::ZERO);
                assert_eq!(gas_limit, HASHI_GAS_COST);
                Ok(B256::ZERO)
            });

        let evm = EvmExecutor::new(2, Arc::new(MockExecutorCalls::new()), Arc::new(hashi));
        evm.execute(vec![dispatched_proposal(1)]).await.unwrap();
    }

    proptest! {
        #[test]
        fn test_batcher_partition_properties(gas_words in prop::collection::vec(0u64..2_000_000, 1..64)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let count = gas_words.len();
                let proposals: Vec<_> = gas_words
                    .iter()
                    .enumerate()
                    .map(|(i, gas)| {
                        let mut word = [0u8; 32];
                        word[24..].copy_from_slice(&gas.to_be_bytes());
                        transfer_proposal(i as u64, TransferKind::Generic, word.to_vec())
                    })
                    .collect();

                let mut executor = never_executed();
                let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
                let sink = seen.clone();
                executor.expect_execute_proposals().returning(move |proposals, _, _, gas_limit| {
                    // Every batch stays under the cap unless it is a lone
                    // over-limit proposal.
                    assert!(gas_limit < TRANSACTION_MAX_GAS || proposals.len() == 1);
                    sink.lock().unwrap().extend(proposals.iter().map(|p| p.depositNonce));
                    Ok(B256::ZERO)
                });

                let evm = EvmExecutor::new(2, Arc::new(executor), Arc::new(MockHashiCalls::new()));
                evm.execute(proposals).await.unwrap();

                // No proposal is dropped or duplicated, and input order holds.
                let seen = seen.lock().unwrap();
                let expected: Vec<u64> = (0..count as u64).collect();
                assert_eq!(*seen, expected);
            });
        }
    }
}
