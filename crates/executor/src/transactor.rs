//! Transaction submission with a gas policy and a pending-fee monitor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::{ExecutorError, ExecutorResult};

/// How often the monitor inspects pending transactions.
const MONITOR_INTERVAL: Duration = Duration::from_secs(60);

/// How long a transaction may stay pending before its fee is bumped and it
/// is resubmitted.
const RESUBMIT_AFTER: Duration = Duration::from_secs(3 * 60);

/// How long a transaction is tracked before the monitor gives up on it.
const ABANDON_AFTER: Duration = Duration::from_secs(10 * 60);

/// Per-transaction options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactOptions {
    /// Gas limit of the transaction.
    pub gas_limit: u64,
}

/// Fee parameters applied to every submission.
#[derive(Debug, Clone, Copy)]
pub struct GasPolicy {
    /// Upper bound on the gas price in wei.
    pub max_gas_price: u128,
    /// Multiplier applied to the node's suggested gas price.
    pub gas_multiplier: f64,
    /// Percentage by which a stuck transaction's fee is increased.
    pub gas_increase_percentage: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self { max_gas_price: 500_000_000_000, gas_multiplier: 1.0, gas_increase_percentage: 15 }
    }
}

/// Applies the multiplier and cap of `policy` to a suggested gas price.
pub fn effective_gas_price(policy: &GasPolicy, suggested: u128) -> u128 {
    let scaled = (suggested as f64 * policy.gas_multiplier) as u128;
    scaled.min(policy.max_gas_price)
}

/// Increases `price` by the policy's bump percentage, still capped.
pub fn bumped_gas_price(policy: &GasPolicy, price: u128) -> u128 {
    let bumped = price + price * policy.gas_increase_percentage as u128 / 100;
    bumped.min(policy.max_gas_price)
}

/// Submits calls and transactions to one domain's contracts.
#[async_trait]
pub trait Transactor: Send + Sync {
    /// Performs a read-only contract call.
    async fn call(&self, to: Address, data: Bytes) -> ExecutorResult<Bytes>;

    /// Signs and submits a transaction, returning its hash.
    async fn send(&self, to: Address, data: Bytes, opts: TransactOptions) -> ExecutorResult<B256>;
}

#[derive(Debug)]
struct PendingTransaction {
    request: TransactionRequest,
    hash: B256,
    gas_price: u128,
    sent_at: Instant,
}

/// A [Transactor] backed by an alloy wallet provider. Submitted transactions
/// are tracked and resubmitted with bumped fees by [SigningTransactor::run_monitor].
#[derive(Debug)]
pub struct SigningTransactor {
    provider: DynProvider,
    policy: GasPolicy,
    pending: Mutex<Vec<PendingTransaction>>,
}

impl SigningTransactor {
    /// Creates a transactor for `endpoint`, signing with the hex-encoded
    /// secp256k1 `key`.
    pub fn new_http(endpoint: &str, key: &str, policy: GasPolicy) -> ExecutorResult<Self> {
        let url: Url =
            endpoint.parse().map_err(|_| ExecutorError::InvalidEndpoint(endpoint.to_string()))?;
        let signer: PrivateKeySigner =
            key.trim_start_matches("0x").parse().map_err(|e| ExecutorError::InvalidKey(format!("{e}")))?;
        let provider = ProviderBuilder::new().wallet(signer).connect_http(url).erased();
        Ok(Self { provider, policy, pending: Mutex::new(Vec::new()) })
    }

    async fn submit(&self, request: TransactionRequest) -> ExecutorResult<B256> {
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| ExecutorError::Rpc(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    /// Resubmits stuck pending transactions with bumped fees until `cancel`
    /// fires.
    pub async fn run_monitor(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(MONITOR_INTERVAL) => {}
            }
            self.check_pending().await;
        }
    }

    async fn check_pending(&self) {
        let mut pending = self.pending.lock().await;
        let mut kept = Vec::with_capacity(pending.len());
        for mut tx in pending.drain(..) {
            match self.provider.get_transaction_receipt(tx.hash).await {
                Ok(Some(receipt)) => {
                    info!(
                        target: "transactor",
                        hash = %tx.hash,
                        block = receipt.block_number,
                        "Transaction mined"
                    );
                }
                Ok(None) if tx.sent_at.elapsed() > ABANDON_AFTER => {
                    warn!(target: "transactor", hash = %tx.hash, "Abandoning stuck transaction");
                }
                Ok(None) => {
                    if tx.sent_at.elapsed() > RESUBMIT_AFTER {
                        let bumped = bumped_gas_price(&self.policy, tx.gas_price);
                        if bumped > tx.gas_price {
                            let request = tx.request.clone().with_gas_price(bumped);
                            match self.submit(request.clone()).await {
                                Ok(hash) => {
                                    info!(
                                        target: "transactor",
                                        old = %tx.hash,
                                        new = %hash,
                                        gas_price = bumped,
                                        "Resubmitted with bumped fee"
                                    );
                                    tx = PendingTransaction {
                                        request,
                                        hash,
                                        gas_price: bumped,
                                        sent_at: Instant::now(),
                                    };
                                }
                                Err(err) => {
                                    warn!(target: "transactor", hash = %tx.hash, %err, "Fee bump failed");
                                }
                            }
                        }
                    }
                    kept.push(tx);
                }
                Err(err) => {
                    warn!(target: "transactor", hash = %tx.hash, %err, "Failed checking receipt");
                    kept.push(tx);
                }
            }
        }
        *pending = kept;
    }
}

#[async_trait]
impl Transactor for SigningTransactor {
    async fn call(&self, to: Address, data: Bytes) -> ExecutorResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider.call(request).await.map_err(|e| ExecutorError::Rpc(e.to_string()))
    }

    async fn send(&self, to: Address, data: Bytes, opts: TransactOptions) -> ExecutorResult<B256> {
        let suggested =
            self.provider.get_gas_price().await.map_err(|e| ExecutorError::Rpc(e.to_string()))?;
        let gas_price = effective_gas_price(&self.policy, suggested);
        let request = TransactionRequest::default()
            .with_to(to)
            .with_input(data)
            .with_gas_limit(opts.gas_limit)
            .with_gas_price(gas_price);

        let hash = self.submit(request.clone()).await?;
        self.pending.lock().await.push(PendingTransaction {
            request,
            hash,
            gas_price,
            sent_at: Instant::now(),
        });
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_gas_price_applies_multiplier() {
        let policy = GasPolicy { gas_multiplier: 1.5, ..Default::default() };
        assert_eq!(effective_gas_price(&policy, 100), 150);
    }

    #[test]
    fn test_effective_gas_price_is_capped() {
        let policy = GasPolicy { max_gas_price: 120, gas_multiplier: 2.0, ..Default::default() };
        assert_eq!(effective_gas_price(&policy, 100), 120);
    }

    #[test]
    fn test_bumped_gas_price() {
        let policy = GasPolicy { gas_increase_percentage: 15, ..Default::default() };
        assert_eq!(bumped_gas_price(&policy, 100), 115);

        let capped = GasPolicy { max_gas_price: 110, gas_increase_percentage: 15, ..Default::default() };
        assert_eq!(bumped_gas_price(&capped, 100), 110);
    }
}
