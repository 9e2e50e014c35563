//! Drives proof construction for every newly accepted state root.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use girder_beacon::BeaconProvider;
use girder_store::BlockStore;

use crate::{
    EventHandler, HandlerResult, HandlerError, Message, MessageHandler, Payload, Proposal,
    ProposalPayload,
};

/// Handles state-root messages for one domain: resolves the execution block
/// range newly covered by the root, runs each event handler over it, and
/// advances the route cursor.
pub struct StateRootMessageHandler<B> {
    domain_id: u8,
    start_block: u64,
    beacon: Arc<B>,
    store: Arc<BlockStore>,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl<B> std::fmt::Debug for StateRootMessageHandler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRootMessageHandler")
            .field("domain_id", &self.domain_id)
            .field("start_block", &self.start_block)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<B> StateRootMessageHandler<B> {
    /// Creates a new [StateRootMessageHandler]. `start_block` seeds routes
    /// that have never been advanced.
    pub fn new(
        domain_id: u8,
        start_block: u64,
        beacon: Arc<B>,
        store: Arc<BlockStore>,
        handlers: Vec<Arc<dyn EventHandler>>,
    ) -> Self {
        Self { domain_id, start_block, beacon, store, handlers }
    }
}

#[async_trait]
impl<B: BeaconProvider> MessageHandler for StateRootMessageHandler<B> {
    async fn handle_message(&self, message: Message) -> HandlerResult<Option<Proposal>> {
        let Payload::StateRoot(data) = &message.payload else {
            return Err(HandlerError::UnexpectedMessage(message.kind()));
        };
        // The observing domain is the destination for everything proven here.
        let destination = message.source;

        let block = self.beacon.signed_beacon_block(&data.slot.to_string()).await?;
        let end_block = block.execution_block_number();
        let latest = self.store.latest_block(self.domain_id, destination)?;
        let start_block = if latest == 0 { self.start_block } else { latest };

        info!(
            target: "state_root_handler",
            domain_id = self.domain_id,
            destination,
            state_root = %data.state_root,
            slot = data.slot,
            start_block,
            end_block,
            "Handling state root"
        );
        for handler in &self.handlers {
            handler.handle_events(destination, start_block, end_block, data.slot).await?;
        }

        // The executor filters already-executed proposals, so a failed cursor
        // write only costs an idempotent replay on the next observation.
        if let Err(err) = self.store.store_block(self.domain_id, destination, end_block) {
            error!(
                target: "state_root_handler",
                domain_id = self.domain_id,
                destination,
                %err,
                "Failed storing latest block"
            );
        }
        Ok(None)
    }
}

/// Maps transfer messages onto executor proposals.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferMessageHandler;

#[async_trait]
impl MessageHandler for TransferMessageHandler {
    async fn handle_message(&self, message: Message) -> HandlerResult<Option<Proposal>> {
        match message.payload {
            Payload::Transfer(data) => Ok(Some(Proposal {
                source: message.source,
                destination: message.destination,
                id: message.id,
                payload: ProposalPayload::Transfer(data),
            })),
            _ => Err(HandlerError::UnexpectedMessage(message.kind())),
        }
    }
}

/// Maps dispatched-message messages onto hashi proposals.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchedMessageHandler;

#[async_trait]
impl MessageHandler for DispatchedMessageHandler {
    async fn handle_message(&self, message: Message) -> HandlerResult<Option<Proposal>> {
        match message.payload {
            Payload::Dispatched(data) => Ok(Some(Proposal {
                source: message.source,
                destination: message.destination,
                id: message.id,
                payload: ProposalPayload::Dispatched(data),
            })),
            _ => Err(HandlerError::UnexpectedMessage(message.kind())),
        }
    }
}
