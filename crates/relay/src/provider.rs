//! Execution-layer RPC capabilities and their alloy-backed implementation.

use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{Block, BlockId, EIP1186AccountProofResponse, Filter, Log, TransactionReceipt};
use async_trait::async_trait;
use girder_proof::{ProofError, ProofResult, TransactionFetcher};
use url::Url;

use crate::{ProviderError, ProviderResult};

/// The execution RPC surface the listeners and event handlers consume.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionProvider: Send + Sync {
    /// Fetches logs emitted by `contract` matching `event_signature` within
    /// the inclusive block range.
    async fn fetch_event_logs(
        &self,
        contract: Address,
        event_signature: &str,
        start_block: u64,
        end_block: u64,
    ) -> ProviderResult<Vec<Log>>;

    /// Fetches the account proof of `address` and the storage proofs of
    /// `slot_keys` at `block_number`.
    async fn account_proof(
        &self,
        address: Address,
        slot_keys: Vec<B256>,
        block_number: u64,
    ) -> ProviderResult<EIP1186AccountProofResponse>;

    /// The current head block number.
    async fn latest_block_number(&self) -> ProviderResult<u64>;

    /// Fetches the receipt of `tx_hash`.
    async fn transaction_receipt(&self, tx_hash: B256) -> ProviderResult<TransactionReceipt>;

    /// Fetches the block with `hash`.
    async fn block_by_hash(&self, hash: B256) -> ProviderResult<Block>;

    /// Fetches all receipts of the block with `hash`.
    async fn block_receipts(&self, hash: B256) -> ProviderResult<Vec<TransactionReceipt>>;
}

/// An HTTP [ExecutionProvider] over an alloy [RootProvider].
#[derive(Debug, Clone)]
pub struct RpcClient {
    provider: RootProvider,
}

impl RpcClient {
    /// Creates a client against the JSON-RPC endpoint at `url`.
    pub fn new_http(url: Url) -> Self {
        Self { provider: RootProvider::new_http(url) }
    }
}

fn rpc_err(err: impl std::fmt::Display) -> ProviderError {
    ProviderError::Rpc(err.to_string())
}

#[async_trait]
impl ExecutionProvider for RpcClient {
    async fn fetch_event_logs(
        &self,
        contract: Address,
        event_signature: &str,
        start_block: u64,
        end_block: u64,
    ) -> ProviderResult<Vec<Log>> {
        let filter = Filter::new()
            .address(contract)
            .event(event_signature)
            .from_block(start_block)
            .to_block(end_block);
        self.provider.get_logs(&filter).await.map_err(rpc_err)
    }

    async fn account_proof(
        &self,
        address: Address,
        slot_keys: Vec<B256>,
        block_number: u64,
    ) -> ProviderResult<EIP1186AccountProofResponse> {
        self.provider
            .get_proof(address, slot_keys)
            .block_id(BlockId::number(block_number))
            .await
            .map_err(rpc_err)
    }

    async fn latest_block_number(&self) -> ProviderResult<u64> {
        self.provider.get_block_number().await.map_err(rpc_err)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> ProviderResult<TransactionReceipt> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_err)?
            .ok_or(ProviderError::MissingReceipt(tx_hash))
    }

    async fn block_by_hash(&self, hash: B256) -> ProviderResult<Block> {
        self.provider
            .get_block_by_hash(hash)
            .await
            .map_err(rpc_err)?
            .ok_or(ProviderError::MissingBlock(hash))
    }

    async fn block_receipts(&self, hash: B256) -> ProviderResult<Vec<TransactionReceipt>> {
        self.provider
            .get_block_receipts(BlockId::hash(hash))
            .await
            .map_err(rpc_err)?
            .ok_or(ProviderError::MissingBlock(hash))
    }
}

#[async_trait]
impl TransactionFetcher for RpcClient {
    async fn transaction_receipt(&self, tx_hash: B256) -> ProofResult<TransactionReceipt> {
        ExecutionProvider::transaction_receipt(self, tx_hash)
            .await
            .map_err(|e| ProofError::Provider(e.to_string()))
    }

    async fn block_by_hash(&self, hash: B256) -> ProofResult<Block> {
        ExecutionProvider::block_by_hash(self, hash)
            .await
            .map_err(|e| ProofError::Provider(e.to_string()))
    }

    async fn block_receipts(&self, hash: B256) -> ProofResult<Vec<TransactionReceipt>> {
        ExecutionProvider::block_receipts(self, hash)
            .await
            .map_err(|e| ProofError::Provider(e.to_string()))
    }
}
