//! Proves router deposits against accepted state roots.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{hex, Address};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error};

use girder_proof::transfer_slot_key;

use crate::{
    events::Deposit, fetch_logs, DepositRecord, EventHandler, ExecutionProvider, HandlerError,
    HandlerResult, Message, TransferData, TransferKind,
};

/// Fetches `Deposit` events from the router, derives each deposit's executor
/// slot key, obtains the account and storage proofs at the proven block, and
/// emits transfer messages grouped per destination.
#[derive(Debug)]
pub struct DepositEventHandler<P> {
    domain_id: u8,
    router_address: Address,
    slot_index: u8,
    generic_resources: Vec<String>,
    client: Arc<P>,
    msg_tx: mpsc::Sender<Vec<Message>>,
}

impl<P> DepositEventHandler<P> {
    /// Creates a new [DepositEventHandler]. `generic_resources` holds the
    /// hex-encoded resource IDs executed as generic calls.
    pub const fn new(
        domain_id: u8,
        router_address: Address,
        slot_index: u8,
        generic_resources: Vec<String>,
        client: Arc<P>,
        msg_tx: mpsc::Sender<Vec<Message>>,
    ) -> Self {
        Self { domain_id, router_address, slot_index, generic_resources, client, msg_tx }
    }

    fn transfer_kind(&self, deposit: &DepositRecord) -> TransferKind {
        if self.generic_resources.contains(&hex::encode(deposit.resource_id)) {
            TransferKind::Generic
        } else {
            TransferKind::Fungible
        }
    }
}

impl<P: ExecutionProvider> DepositEventHandler<P> {
    async fn fetch_deposits(
        &self,
        destination: u8,
        start_block: u64,
        end_block: u64,
    ) -> HandlerResult<Vec<DepositRecord>> {
        let logs = fetch_logs(
            self.client.as_ref(),
            self.router_address,
            Deposit::SIGNATURE,
            start_block,
            end_block,
        )
        .await?;

        let mut deposits = Vec::new();
        for log in logs {
            let deposit = match Deposit::decode_log_data(log.data()) {
                Ok(event) => DepositRecord::from(event),
                Err(err) => {
                    error!(target: "deposit_handler", %err, "Failed unpacking deposit event log");
                    continue;
                }
            };
            if deposit.destination_domain_id != destination {
                continue;
            }

            debug!(
                target: "deposit_handler",
                domain_id = self.domain_id,
                block = log.block_number,
                tx_hash = ?log.transaction_hash,
                sender = %deposit.sender,
                nonce = deposit.deposit_nonce,
                "Found deposit log"
            );
            deposits.push(deposit);
        }
        Ok(deposits)
    }

    /// Fetches the router account proof and the deposit's storage proof at
    /// `block_number`.
    async fn proof(
        &self,
        block_number: u64,
        deposit: &DepositRecord,
    ) -> HandlerResult<(Vec<alloy_primitives::Bytes>, Vec<alloy_primitives::Bytes>)> {
        let slot_key =
            transfer_slot_key(deposit.destination_domain_id, self.slot_index, deposit.deposit_nonce);
        let response =
            self.client.account_proof(self.router_address, vec![slot_key], block_number).await?;
        let storage_proof = response
            .storage_proof
            .into_iter()
            .next()
            .ok_or(HandlerError::MissingField("storageProof"))?
            .proof;
        Ok((response.account_proof, storage_proof))
    }
}

#[async_trait]
impl<P: ExecutionProvider> EventHandler for DepositEventHandler<P> {
    async fn handle_events(
        &self,
        destination: u8,
        start_block: u64,
        end_block: u64,
        slot: u64,
    ) -> HandlerResult<()> {
        let deposits = self.fetch_deposits(destination, start_block, end_block).await?;

        let mut grouped: BTreeMap<u8, Vec<Message>> = BTreeMap::new();
        for deposit in deposits {
            let (account_proof, storage_proof) = self.proof(end_block, &deposit).await?;
            let kind = self.transfer_kind(&deposit);

            debug!(
                target: "deposit_handler",
                domain_id = self.domain_id,
                destination = deposit.destination_domain_id,
                nonce = deposit.deposit_nonce,
                "Sending transfer message"
            );
            let message = Message::transfer(
                self.domain_id,
                deposit.destination_domain_id,
                TransferData { deposit, slot, account_proof, storage_proof, kind },
            );
            grouped.entry(message.destination).or_default().push(message);
        }

        if grouped.is_empty() {
            debug!(
                target: "deposit_handler",
                domain_id = self.domain_id,
                "No deposits found for block range {start_block}-{end_block}"
            );
            return Ok(());
        }
        for (_, messages) in grouped {
            self.msg_tx.send(messages).await.map_err(|_| HandlerError::ChannelClosed)?;
        }
        Ok(())
    }
}
