//! Constructors for synthetic consensus objects used across the workspace tests.

use alloy_primitives::{B256, U256};
use ssz_types::{BitVector, FixedVector, VariableList};

use crate::{
    BeaconBlock, BeaconBlockBody, BeaconBlockHeader, BeaconState, Checkpoint, Eth1Data, EthSpec,
    ExecutionPayload, ExecutionPayloadHeader, Fork, SignedBeaconBlock, Slot, SyncAggregate,
    SyncCommittee,
};

/// A signed beacon block at `slot` whose execution payload carries
/// `block_number` and `receipts_root`; everything else is zeroed.
pub fn sample_signed_block<E: EthSpec>(
    slot: Slot,
    block_number: u64,
    receipts_root: B256,
) -> SignedBeaconBlock<E> {
    SignedBeaconBlock {
        message: BeaconBlock {
            slot,
            proposer_index: 0,
            parent_root: B256::ZERO,
            state_root: B256::ZERO,
            body: BeaconBlockBody {
                randao_reveal: FixedVector::default(),
                eth1_data: sample_eth1_data(),
                graffiti: B256::ZERO,
                proposer_slashings: VariableList::default(),
                attester_slashings: VariableList::default(),
                attestations: VariableList::default(),
                deposits: VariableList::default(),
                voluntary_exits: VariableList::default(),
                sync_aggregate: SyncAggregate {
                    sync_committee_bits: BitVector::new(),
                    sync_committee_signature: FixedVector::default(),
                },
                execution_payload: sample_payload(block_number, receipts_root),
                bls_to_execution_changes: VariableList::default(),
                blob_kzg_commitments: VariableList::default(),
            },
        },
        signature: FixedVector::default(),
    }
}

/// A beacon state at `slot` with zeroed registries and histories.
pub fn sample_state<E: EthSpec>(slot: Slot) -> BeaconState<E> {
    BeaconState {
        genesis_time: 0,
        genesis_validators_root: B256::ZERO,
        slot,
        fork: Fork {
            previous_version: FixedVector::default(),
            current_version: FixedVector::default(),
            epoch: 0,
        },
        latest_block_header: sample_header(slot),
        block_roots: FixedVector::default(),
        state_roots: FixedVector::default(),
        historical_roots: VariableList::default(),
        eth1_data: sample_eth1_data(),
        eth1_data_votes: VariableList::default(),
        eth1_deposit_index: 0,
        validators: VariableList::default(),
        balances: VariableList::default(),
        randao_mixes: FixedVector::default(),
        slashings: FixedVector::default(),
        previous_epoch_participation: VariableList::default(),
        current_epoch_participation: VariableList::default(),
        justification_bits: BitVector::new(),
        previous_justified_checkpoint: sample_checkpoint(),
        current_justified_checkpoint: sample_checkpoint(),
        finalized_checkpoint: sample_checkpoint(),
        inactivity_scores: VariableList::default(),
        current_sync_committee: sample_sync_committee(),
        next_sync_committee: sample_sync_committee(),
        latest_execution_payload_header: sample_payload_header(),
        next_withdrawal_index: 0,
        next_withdrawal_validator_index: 0,
        historical_summaries: VariableList::default(),
    }
}

/// A beacon block header at `slot` with zeroed roots.
pub const fn sample_header(slot: Slot) -> BeaconBlockHeader {
    BeaconBlockHeader {
        slot,
        proposer_index: 0,
        parent_root: B256::ZERO,
        state_root: B256::ZERO,
        body_root: B256::ZERO,
    }
}

fn sample_eth1_data() -> Eth1Data {
    Eth1Data { deposit_root: B256::ZERO, deposit_count: 0, block_hash: B256::ZERO }
}

const fn sample_checkpoint() -> Checkpoint {
    Checkpoint { epoch: 0, root: B256::ZERO }
}

fn sample_sync_committee() -> SyncCommittee {
    SyncCommittee { pubkeys: FixedVector::default(), aggregate_pubkey: FixedVector::default() }
}

fn sample_payload<E: EthSpec>(block_number: u64, receipts_root: B256) -> ExecutionPayload<E> {
    ExecutionPayload {
        parent_hash: B256::ZERO,
        fee_recipient: Default::default(),
        state_root: B256::ZERO,
        receipts_root,
        logs_bloom: FixedVector::default(),
        prev_randao: B256::ZERO,
        block_number,
        gas_limit: 0,
        gas_used: 0,
        timestamp: 0,
        extra_data: VariableList::default(),
        base_fee_per_gas: U256::ZERO,
        block_hash: B256::ZERO,
        transactions: VariableList::default(),
        withdrawals: VariableList::default(),
        blob_gas_used: 0,
        excess_blob_gas: 0,
    }
}

fn sample_payload_header<E: EthSpec>() -> ExecutionPayloadHeader<E> {
    ExecutionPayloadHeader {
        parent_hash: B256::ZERO,
        fee_recipient: Default::default(),
        state_root: B256::ZERO,
        receipts_root: B256::ZERO,
        logs_bloom: FixedVector::default(),
        prev_randao: B256::ZERO,
        block_number: 0,
        gas_limit: 0,
        gas_used: 0,
        timestamp: 0,
        extra_data: VariableList::default(),
        base_fee_per_gas: U256::ZERO,
        block_hash: B256::ZERO,
        transactions_root: B256::ZERO,
        withdrawals_root: B256::ZERO,
        blob_gas_used: 0,
        excess_blob_gas: 0,
    }
}
