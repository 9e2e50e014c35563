//! Merkle-Patricia proofs of transaction receipts.
//!
//! The receipt trie is rebuilt from all receipts of the enclosing block and
//! must reproduce the header's `receiptsRoot` before a proof is handed out.

use std::sync::Arc;

use alloy_consensus::{Receipt, ReceiptEnvelope, ReceiptWithBloom};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Bloom, Bytes, B256};
use alloy_rlp::Encodable;
use alloy_rpc_types_eth::{Block, TransactionReceipt};
use alloy_trie::{proof::ProofRetainer, root::adjust_index_for_rlp, HashBuilder, Nibbles};
use async_trait::async_trait;

use crate::{ProofError, ProofResult};

/// The execution RPC surface the receipt prover consumes.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    /// Fetches the receipt of `tx_hash`.
    async fn transaction_receipt(&self, tx_hash: B256) -> ProofResult<TransactionReceipt>;

    /// Fetches the block with `hash`.
    async fn block_by_hash(&self, hash: B256) -> ProofResult<Block>;

    /// Fetches all receipts of the block with `hash`, in transaction order.
    async fn block_receipts(&self, hash: B256) -> ProofResult<Vec<TransactionReceipt>>;
}

/// Produces Merkle-Patricia proofs of single receipts against their block's
/// receipts root.
#[async_trait]
pub trait ProveReceipt: Send + Sync {
    /// Builds the inclusion proof for the receipt of `tx_hash`, returned as
    /// RLP-encoded trie nodes ordered root first.
    async fn receipt_proof(&self, tx_hash: B256) -> ProofResult<Vec<Bytes>>;
}

/// An implementation of the [ProveReceipt] trait over an execution RPC.
#[derive(Debug)]
pub struct ReceiptProver<F> {
    fetcher: Arc<F>,
}

impl<F: TransactionFetcher> ReceiptProver<F> {
    /// Creates a new [ReceiptProver].
    pub const fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: TransactionFetcher> ProveReceipt for ReceiptProver<F> {
    async fn receipt_proof(&self, tx_hash: B256) -> ProofResult<Vec<Bytes>> {
        let receipt = self.fetcher.transaction_receipt(tx_hash).await?;
        let block_hash = receipt.block_hash.ok_or(ProofError::PendingTransaction(tx_hash))?;
        let tx_index =
            receipt.transaction_index.ok_or(ProofError::PendingTransaction(tx_hash))? as usize;

        let block = self.fetcher.block_by_hash(block_hash).await?;
        let siblings = self.fetcher.block_receipts(block_hash).await?;
        let envelopes: Vec<ReceiptEnvelope> = siblings.iter().map(consensus_receipt).collect();

        receipt_trie_proof(&envelopes, tx_index, block.header.receipts_root)
    }
}

/// Rebuilds the receipt trie, checks it against `expected_root`, and returns
/// the proof for `tx_index`.
pub fn receipt_trie_proof(
    receipts: &[ReceiptEnvelope],
    tx_index: usize,
    expected_root: B256,
) -> ProofResult<Vec<Bytes>> {
    let mut index_buffer = Vec::new();
    let mut value_buffer = Vec::new();

    let target_path = {
        index_buffer.clear();
        tx_index.encode(&mut index_buffer);
        Nibbles::unpack(&index_buffer)
    };
    let mut builder =
        HashBuilder::default().with_proof_retainer(ProofRetainer::new(vec![target_path]));

    // Leaves must be added in nibble order; RLP(0) = 0x80 sorts after the
    // single-byte encodings 0x01..0x7f, hence the index adjustment.
    for i in 0..receipts.len() {
        let index = adjust_index_for_rlp(i, receipts.len());
        index_buffer.clear();
        index.encode(&mut index_buffer);
        value_buffer.clear();
        // The trie value is the EIP-2718 envelope: a bare RLP receipt for
        // legacy transactions, the type byte followed by the RLP payload for
        // typed ones.
        receipts[index].encode_2718(&mut value_buffer);
        builder.add_leaf(Nibbles::unpack(&index_buffer), &value_buffer);
    }

    let actual = builder.root();
    if actual != expected_root {
        return Err(ProofError::StateInconsistent { expected: expected_root, actual });
    }

    let mut nodes: Vec<_> = builder
        .take_proof_nodes()
        .iter()
        .map(|(path, node)| (*path, node.clone()))
        .collect();
    if nodes.is_empty() {
        return Err(ProofError::MissingProof(tx_index as u64));
    }
    nodes.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    Ok(nodes.into_iter().map(|(_, node)| node).collect())
}

/// Converts an RPC receipt into its consensus form.
fn consensus_receipt(rpc: &TransactionReceipt) -> ReceiptEnvelope {
    let logs = rpc.inner.logs().iter().map(|log| log.inner.clone()).collect();
    let inner = ReceiptWithBloom::new(
        Receipt {
            status: rpc.inner.status().into(),
            cumulative_gas_used: rpc.inner.cumulative_gas_used(),
            logs,
        },
        Bloom::from_slice(rpc.inner.logs_bloom().as_slice()),
    );

    match rpc.transaction_type() as u8 {
        1 => ReceiptEnvelope::Eip2930(inner),
        2 => ReceiptEnvelope::Eip1559(inner),
        3 => ReceiptEnvelope::Eip4844(inner),
        4 => ReceiptEnvelope::Eip7702(inner),
        _ => ReceiptEnvelope::Legacy(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Log, LogData};
    use alloy_trie::root::ordered_trie_root_with_encoder;
    use proptest::prelude::*;

    fn envelope(typed: bool, cumulative_gas_used: u64, logs: usize) -> ReceiptEnvelope {
        let logs = (0..logs)
            .map(|i| Log {
                address: Default::default(),
                data: LogData::new_unchecked(
                    vec![B256::repeat_byte(i as u8)],
                    Bytes::from(vec![i as u8; 8]),
                ),
            })
            .collect();
        let inner = ReceiptWithBloom::new(
            Receipt { status: true.into(), cumulative_gas_used, logs },
            Bloom::default(),
        );
        if typed {
            ReceiptEnvelope::Eip1559(inner)
        } else {
            ReceiptEnvelope::Legacy(inner)
        }
    }

    fn reference_root(receipts: &[ReceiptEnvelope]) -> B256 {
        ordered_trie_root_with_encoder(receipts, |receipt, out| receipt.encode_2718(out))
    }

    #[test]
    fn test_proof_against_mixed_receipt_types() {
        let receipts: Vec<_> =
            (0..10).map(|i| envelope(i % 2 == 0, (i as u64 + 1) * 21_000, i % 3)).collect();
        let root = reference_root(&receipts);

        for tx_index in [0usize, 1, 7, 9] {
            let proof = receipt_trie_proof(&receipts, tx_index, root).unwrap();
            assert!(!proof.is_empty());
            // The first node is the trie root node.
            assert_eq!(keccak256(&proof[0]), root);
        }
    }

    #[test]
    fn test_root_mismatch_is_state_inconsistent() {
        let receipts: Vec<_> = (0..3).map(|i| envelope(false, (i as u64 + 1) * 21_000, 1)).collect();
        let err = receipt_trie_proof(&receipts, 0, B256::repeat_byte(0xde)).unwrap_err();
        assert!(matches!(err, ProofError::StateInconsistent { .. }));
    }

    proptest! {
        #[test]
        fn test_rebuilt_trie_always_matches_reference_root(
            count in 1usize..200,
            target in 0usize..200,
            typed_seed in any::<u64>(),
        ) {
            let target = target % count;
            let receipts: Vec<_> = (0..count)
                .map(|i| envelope((typed_seed >> (i % 64)) & 1 == 1, (i as u64 + 1) * 1_000, i % 2))
                .collect();
            let root = reference_root(&receipts);

            let proof = receipt_trie_proof(&receipts, target, root).unwrap();
            prop_assert!(!proof.is_empty());
            prop_assert_eq!(keccak256(&proof[0]), root);
        }
    }
}
