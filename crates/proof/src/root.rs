//! SSZ proofs rooting an execution receipts root in a trusted beacon root.
//!
//! The same-slot case is a single in-block proof at [RECEIPTS_ROOT_GINDEX].
//! The historical case composes three segments: the in-block proof at the
//! target slot, the beacon-state proof to `block_roots[target % 8192]`, and
//! the header proof to the state root — in that order, each segment ordered
//! leaf-sibling first.

use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;
use tracing::debug;
use tree_hash::TreeHash;

use girder_beacon::{
    BeaconBlock, BeaconBlockBody, BeaconBlockHeader, BeaconProvider, BeaconState, EthSpec,
    ExecutionPayload, Slot, VersionedBeaconState, VersionedSignedBeaconBlock,
    SLOTS_PER_HISTORICAL_LIMIT,
};

use crate::{
    array_gindex, concat_gindices, ProofResult, SszTree, BEACON_STATE_GINDEX, BLOCK_ROOTS_DEPTH,
    BLOCK_ROOTS_GINDEX, RECEIPTS_ROOT_GINDEX,
};

/// Produces SSZ proofs binding a receipts root at `target_slot` to the beacon
/// root accepted at `current_slot`.
#[async_trait]
pub trait ProveReceiptsRoot: Send + Sync {
    /// Builds the proof between `current_slot` and `target_slot`.
    async fn receipts_root_proof(
        &self,
        current_slot: Slot,
        target_slot: Slot,
    ) -> ProofResult<Vec<B256>>;
}

/// An implementation of the [ProveReceiptsRoot] trait over a beacon node.
#[derive(Debug)]
pub struct ReceiptsRootProver<B> {
    beacon: Arc<B>,
}

impl<B: BeaconProvider> ReceiptsRootProver<B> {
    /// Creates a new [ReceiptsRootProver].
    pub const fn new(beacon: Arc<B>) -> Self {
        Self { beacon }
    }

    async fn in_block_proof(&self, slot: Slot) -> ProofResult<Vec<B256>> {
        let block = self.beacon.signed_beacon_block(&slot.to_string()).await?;
        let tree = match &block {
            VersionedSignedBeaconBlock::Mainnet(block) => block_tree(&block.message),
            VersionedSignedBeaconBlock::Gnosis(block) => block_tree(&block.message),
        };
        tree.prove(RECEIPTS_ROOT_GINDEX)
    }

    async fn historical_root_proof(
        &self,
        current_slot: Slot,
        target_slot: Slot,
    ) -> ProofResult<Vec<B256>> {
        let header = self.beacon.beacon_header(&current_slot.to_string()).await?;
        let state_proof = header_tree(&header.header).prove(BEACON_STATE_GINDEX)?;

        let state = self.beacon.beacon_state(&header.header.state_root.to_string()).await?;
        let tree = match state.as_ref() {
            VersionedBeaconState::Mainnet(state) => state_tree(state),
            VersionedBeaconState::Gnosis(state) => state_tree(state),
        };
        let root_gindex = array_gindex(target_slot % SLOTS_PER_HISTORICAL_LIMIT, BLOCK_ROOTS_DEPTH);
        let mut proof = tree.prove(concat_gindices(&[BLOCK_ROOTS_GINDEX, root_gindex]))?;
        proof.extend(state_proof);
        Ok(proof)
    }
}

#[async_trait]
impl<B: BeaconProvider> ProveReceiptsRoot for ReceiptsRootProver<B> {
    async fn receipts_root_proof(
        &self,
        current_slot: Slot,
        target_slot: Slot,
    ) -> ProofResult<Vec<B256>> {
        let mut proof = self.in_block_proof(target_slot).await?;
        if current_slot != target_slot {
            proof.extend(self.historical_root_proof(current_slot, target_slot).await?);
        }
        debug!(
            target: "root_prover",
            current_slot,
            target_slot,
            hashes = proof.len(),
            "Built receipts root proof"
        );
        Ok(proof)
    }
}

/// The Merkle tree of a beacon block, expanded along the path to the
/// execution payload's receipts root.
pub fn block_tree<E: EthSpec>(block: &BeaconBlock<E>) -> SszTree {
    SszTree::container(vec![
        SszTree::leaf(block.slot.tree_hash_root()),
        SszTree::leaf(block.proposer_index.tree_hash_root()),
        SszTree::leaf(block.parent_root.tree_hash_root()),
        SszTree::leaf(block.state_root.tree_hash_root()),
        body_tree(&block.body),
    ])
}

fn body_tree<E: EthSpec>(body: &BeaconBlockBody<E>) -> SszTree {
    SszTree::container(vec![
        SszTree::leaf(body.randao_reveal.tree_hash_root()),
        SszTree::leaf(body.eth1_data.tree_hash_root()),
        SszTree::leaf(body.graffiti.tree_hash_root()),
        SszTree::leaf(body.proposer_slashings.tree_hash_root()),
        SszTree::leaf(body.attester_slashings.tree_hash_root()),
        SszTree::leaf(body.attestations.tree_hash_root()),
        SszTree::leaf(body.deposits.tree_hash_root()),
        SszTree::leaf(body.voluntary_exits.tree_hash_root()),
        SszTree::leaf(body.sync_aggregate.tree_hash_root()),
        payload_tree(&body.execution_payload),
        SszTree::leaf(body.bls_to_execution_changes.tree_hash_root()),
        SszTree::leaf(body.blob_kzg_commitments.tree_hash_root()),
    ])
}

fn payload_tree<E: EthSpec>(payload: &ExecutionPayload<E>) -> SszTree {
    SszTree::container(vec![
        SszTree::leaf(payload.parent_hash.tree_hash_root()),
        SszTree::leaf(payload.fee_recipient.tree_hash_root()),
        SszTree::leaf(payload.state_root.tree_hash_root()),
        SszTree::leaf(payload.receipts_root.tree_hash_root()),
        SszTree::leaf(payload.logs_bloom.tree_hash_root()),
        SszTree::leaf(payload.prev_randao.tree_hash_root()),
        SszTree::leaf(payload.block_number.tree_hash_root()),
        SszTree::leaf(payload.gas_limit.tree_hash_root()),
        SszTree::leaf(payload.gas_used.tree_hash_root()),
        SszTree::leaf(payload.timestamp.tree_hash_root()),
        SszTree::leaf(payload.extra_data.tree_hash_root()),
        SszTree::leaf(payload.base_fee_per_gas.tree_hash_root()),
        SszTree::leaf(payload.block_hash.tree_hash_root()),
        SszTree::leaf(payload.transactions.tree_hash_root()),
        SszTree::leaf(payload.withdrawals.tree_hash_root()),
        SszTree::leaf(payload.blob_gas_used.tree_hash_root()),
        SszTree::leaf(payload.excess_blob_gas.tree_hash_root()),
    ])
}

/// The Merkle tree of a beacon block header.
pub fn header_tree(header: &BeaconBlockHeader) -> SszTree {
    SszTree::container(vec![
        SszTree::leaf(header.slot.tree_hash_root()),
        SszTree::leaf(header.proposer_index.tree_hash_root()),
        SszTree::leaf(header.parent_root.tree_hash_root()),
        SszTree::leaf(header.state_root.tree_hash_root()),
        SszTree::leaf(header.body_root.tree_hash_root()),
    ])
}

/// The Merkle tree of a beacon state, expanded along the `block_roots` vector.
pub fn state_tree<E: EthSpec>(state: &BeaconState<E>) -> SszTree {
    SszTree::container(vec![
        SszTree::leaf(state.genesis_time.tree_hash_root()),
        SszTree::leaf(state.genesis_validators_root.tree_hash_root()),
        SszTree::leaf(state.slot.tree_hash_root()),
        SszTree::leaf(state.fork.tree_hash_root()),
        SszTree::leaf(state.latest_block_header.tree_hash_root()),
        SszTree::from_chunks(&state.block_roots, BLOCK_ROOTS_DEPTH),
        SszTree::leaf(state.state_roots.tree_hash_root()),
        SszTree::leaf(state.historical_roots.tree_hash_root()),
        SszTree::leaf(state.eth1_data.tree_hash_root()),
        SszTree::leaf(state.eth1_data_votes.tree_hash_root()),
        SszTree::leaf(state.eth1_deposit_index.tree_hash_root()),
        SszTree::leaf(state.validators.tree_hash_root()),
        SszTree::leaf(state.balances.tree_hash_root()),
        SszTree::leaf(state.randao_mixes.tree_hash_root()),
        SszTree::leaf(state.slashings.tree_hash_root()),
        SszTree::leaf(state.previous_epoch_participation.tree_hash_root()),
        SszTree::leaf(state.current_epoch_participation.tree_hash_root()),
        SszTree::leaf(state.justification_bits.tree_hash_root()),
        SszTree::leaf(state.previous_justified_checkpoint.tree_hash_root()),
        SszTree::leaf(state.current_justified_checkpoint.tree_hash_root()),
        SszTree::leaf(state.finalized_checkpoint.tree_hash_root()),
        SszTree::leaf(state.inactivity_scores.tree_hash_root()),
        SszTree::leaf(state.current_sync_committee.tree_hash_root()),
        SszTree::leaf(state.next_sync_committee.tree_hash_root()),
        SszTree::leaf(state.latest_execution_payload_header.tree_hash_root()),
        SszTree::leaf(state.next_withdrawal_index.tree_hash_root()),
        SszTree::leaf(state.next_withdrawal_validator_index.tree_hash_root()),
        SszTree::leaf(state.historical_summaries.tree_hash_root()),
    ])
}
