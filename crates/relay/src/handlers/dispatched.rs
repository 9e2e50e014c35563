//! Proves dispatched cross-chain messages against accepted state roots.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error};

use girder_beacon::BeaconProvider;
use girder_proof::{ProveReceipt, ProveReceiptsRoot};

use crate::{
    events::MessageDispatched, fetch_logs, DispatchedData, EventHandler, ExecutionProvider,
    HandlerError, HandlerResult, Message,
};

/// How many child slots are probed past the parent beacon block before the
/// skipped-slot search gives up.
pub const DEFAULT_SLOT_SEARCH_LIMIT: u64 = 16;

/// Fetches `MessageDispatched` events from the yaho contract, locates each
/// transaction's beacon slot, builds the receipts-root and receipt proofs,
/// and emits one message per event.
#[derive(Debug)]
pub struct DispatchedEventHandler<P, B, RP, RR> {
    domain_id: u8,
    yaho_address: Address,
    chain_ids: HashMap<u8, u64>,
    slot_search_limit: u64,
    client: Arc<P>,
    beacon: Arc<B>,
    receipt_prover: Arc<RP>,
    root_prover: Arc<RR>,
    msg_tx: mpsc::Sender<Vec<Message>>,
}

impl<P, B, RP, RR> DispatchedEventHandler<P, B, RP, RR> {
    /// Creates a new [DispatchedEventHandler]. `chain_ids` maps destination
    /// domains to their EVM chain IDs.
    #[allow(clippy::too_many_arguments, reason = "construction-time wiring")]
    pub fn new(
        domain_id: u8,
        yaho_address: Address,
        chain_ids: HashMap<u8, u64>,
        slot_search_limit: u64,
        client: Arc<P>,
        beacon: Arc<B>,
        receipt_prover: Arc<RP>,
        root_prover: Arc<RR>,
        msg_tx: mpsc::Sender<Vec<Message>>,
    ) -> Self {
        Self {
            domain_id,
            yaho_address,
            chain_ids,
            slot_search_limit,
            client,
            beacon,
            receipt_prover,
            root_prover,
            msg_tx,
        }
    }
}

impl<P, B, RP, RR> DispatchedEventHandler<P, B, RP, RR>
where
    P: ExecutionProvider,
    B: BeaconProvider,
    RP: ProveReceipt,
    RR: ProveReceiptsRoot,
{
    async fn handle_log(
        &self,
        log: &Log,
        destination: u8,
        slot: u64,
    ) -> HandlerResult<Option<Message>> {
        let event = match MessageDispatched::decode_log_data(log.data()) {
            Ok(event) => event,
            Err(err) => {
                error!(target: "dispatched_handler", %err, "Failed unpacking message dispatched log");
                return Ok(None);
            }
        };
        let chain_id = self
            .chain_ids
            .get(&destination)
            .ok_or_else(|| HandlerError::Config(format!("no chain ID for destination {destination}")))?;
        if event.message.targetChainId != U256::from(*chain_id) {
            return Ok(None);
        }

        let tx_hash = log.transaction_hash.ok_or(HandlerError::MissingField("transactionHash"))?;
        let receipt = self.client.transaction_receipt(tx_hash).await?;
        let block_hash = receipt.block_hash.ok_or(HandlerError::MissingField("blockHash"))?;
        let block = self.client.block_by_hash(block_hash).await?;
        let parent_beacon_root = block
            .header
            .parent_beacon_block_root
            .ok_or(HandlerError::MissingField("parentBeaconBlockRoot"))?;

        let tx_slot = self.transaction_slot(parent_beacon_root).await?;
        let receipts_root_proof = self.root_prover.receipts_root_proof(slot, tx_slot).await?;
        let receipt_proof = self.receipt_prover.receipt_proof(tx_hash).await?;

        let tx_index =
            receipt.transaction_index.ok_or(HandlerError::MissingField("transactionIndex"))?;
        let tx_index_rlp = Bytes::from(alloy_rlp::encode(tx_index));
        let log_index = receipt
            .inner
            .logs()
            .iter()
            .position(|l| l.log_index == log.log_index)
            .unwrap_or_default() as u64;

        debug!(
            target: "dispatched_handler",
            domain_id = self.domain_id,
            destination,
            message_id = %event.messageId,
            tx_slot,
            "Proved dispatched message"
        );
        Ok(Some(Message::dispatched(
            self.domain_id,
            destination,
            event.messageId.to_string(),
            DispatchedData {
                src_slot: slot,
                tx_slot,
                receipts_root_proof,
                receipts_root: block.header.receipts_root,
                receipt_proof,
                tx_index_rlp,
                log_index,
            },
        )))
    }

    /// Resolves the beacon slot containing a transaction from its block's
    /// parent beacon root: the first non-skipped slot after the parent's.
    async fn transaction_slot(&self, parent_beacon_root: B256) -> HandlerResult<u64> {
        let parent = self.beacon.beacon_header(&parent_beacon_root.to_string()).await?;
        let mut candidate = parent.header.slot + 1;
        for _ in 0..self.slot_search_limit {
            match self.beacon.beacon_header(&candidate.to_string()).await {
                Ok(header) => return Ok(header.header.slot),
                Err(err) if err.is_not_found() => candidate += 1,
                Err(err) => return Err(err.into()),
            }
        }
        Err(HandlerError::SlotNotFound { after: parent.header.slot, tries: self.slot_search_limit })
    }
}

#[async_trait]
impl<P, B, RP, RR> EventHandler for DispatchedEventHandler<P, B, RP, RR>
where
    P: ExecutionProvider,
    B: BeaconProvider,
    RP: ProveReceipt,
    RR: ProveReceiptsRoot,
{
    async fn handle_events(
        &self,
        destination: u8,
        start_block: u64,
        end_block: u64,
        slot: u64,
    ) -> HandlerResult<()> {
        let logs = fetch_logs(
            self.client.as_ref(),
            self.yaho_address,
            MessageDispatched::SIGNATURE,
            start_block,
            end_block,
        )
        .await?;

        let mut messages = Vec::new();
        for log in logs {
            if let Some(message) = self.handle_log(&log, destination, slot).await? {
                messages.push(message);
            }
        }

        // One message per outbound batch: each triggers a distinct call.
        for message in messages {
            self.msg_tx.send(vec![message]).await.map_err(|_| HandlerError::ChannelClosed)?;
        }
        Ok(())
    }
}
