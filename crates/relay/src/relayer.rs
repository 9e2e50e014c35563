//! Routing of internal messages to per-domain handlers and executors.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{HandlerResult, Message, MessageHandler, MessageKind, Proposal};

/// Executes grouped proposals on a destination domain.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalExecutor: Send + Sync {
    /// Executes `proposals`, which all share this executor's domain.
    async fn execute(&self, proposals: Vec<Proposal>) -> HandlerResult<()>;
}

/// Dispatches message batches to the handler registered for each message's
/// destination domain and variant, then hands the resulting proposals to the
/// destination's executor.
#[derive(Default)]
pub struct Relayer {
    handlers: HashMap<(u8, MessageKind), Arc<dyn MessageHandler>>,
    executors: HashMap<u8, Arc<dyn ProposalExecutor>>,
}

impl std::fmt::Debug for Relayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relayer")
            .field("handlers", &self.handlers.len())
            .field("executors", &self.executors.len())
            .finish()
    }
}

impl Relayer {
    /// Creates an empty [Relayer].
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `kind` messages addressed to `domain_id`.
    pub fn register_handler(
        &mut self,
        domain_id: u8,
        kind: MessageKind,
        handler: Arc<dyn MessageHandler>,
    ) {
        self.handlers.insert((domain_id, kind), handler);
    }

    /// Registers the proposal executor for `domain_id`.
    pub fn register_executor(&mut self, domain_id: u8, executor: Arc<dyn ProposalExecutor>) {
        self.executors.insert(domain_id, executor);
    }

    /// Consumes message batches from `rx` until `cancel` fires or every
    /// sender is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<Vec<Message>>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(target: "relayer", "Relayer shutting down");
                    return;
                }
                batch = rx.recv() => match batch {
                    Some(messages) => self.route(messages).await,
                    None => {
                        info!(target: "relayer", "Message channel closed");
                        return;
                    }
                }
            }
        }
    }

    /// Routes one batch of messages. Per-message failures are logged and do
    /// not block the rest of the batch.
    pub async fn route(&self, messages: Vec<Message>) {
        let mut proposals: Vec<Proposal> = Vec::new();
        for message in messages {
            let key = (message.destination, message.kind());
            let Some(handler) = self.handlers.get(&key) else {
                warn!(
                    target: "relayer",
                    destination = message.destination,
                    kind = ?message.kind(),
                    "No handler registered for message"
                );
                continue;
            };
            debug!(
                target: "relayer",
                id = %message.id,
                source = message.source,
                destination = message.destination,
                kind = ?message.kind(),
                "Routing message"
            );
            match handler.handle_message(message).await {
                Ok(Some(proposal)) => proposals.push(proposal),
                Ok(None) => {}
                Err(err) => error!(target: "relayer", %err, "Failed handling message"),
            }
        }

        let Some(first) = proposals.first() else { return };
        let destination = first.destination;
        let Some(executor) = self.executors.get(&destination) else {
            warn!(target: "relayer", destination, "No executor registered for destination");
            return;
        };
        if let Err(err) = executor.execute(proposals).await {
            error!(target: "relayer", destination, %err, "Failed executing proposals");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DepositRecord, MockMessageHandler, MockProposalExecutor, Payload, ProposalPayload,
        StateRootData, TransferData, TransferKind,
    };
    use alloy_primitives::B256;

    fn transfer_message(nonce: u64) -> Message {
        Message::transfer(
            1,
            2,
            TransferData {
                deposit: DepositRecord {
                    destination_domain_id: 2,
                    security_model: 1,
                    resource_id: B256::ZERO,
                    deposit_nonce: nonce,
                    sender: Default::default(),
                    data: Default::default(),
                },
                slot: 10,
                account_proof: vec![],
                storage_proof: vec![],
                kind: TransferKind::Fungible,
            },
        )
    }

    #[tokio::test]
    async fn test_route_handles_and_executes() {
        let mut handler = MockMessageHandler::new();
        handler.expect_handle_message().times(2).returning(|message| {
            let Payload::Transfer(data) = message.payload else { panic!("wrong payload") };
            Ok(Some(Proposal {
                source: message.source,
                destination: message.destination,
                id: message.id,
                payload: ProposalPayload::Transfer(data),
            }))
        });

        let mut executor = MockProposalExecutor::new();
        executor
            .expect_execute()
            .withf(|proposals| proposals.len() == 2 && proposals[0].destination == 2)
            .times(1)
            .returning(|_| Ok(()));

        let mut relayer = Relayer::new();
        relayer.register_handler(2, MessageKind::Transfer, Arc::new(handler));
        relayer.register_executor(2, Arc::new(executor));

        relayer.route(vec![transfer_message(1), transfer_message(2)]).await;
    }

    #[tokio::test]
    async fn test_route_without_proposals_skips_executor() {
        let mut handler = MockMessageHandler::new();
        handler.expect_handle_message().returning(|_| Ok(None));

        let mut relayer = Relayer::new();
        relayer.register_handler(1, MessageKind::StateRoot, Arc::new(handler));
        // No executor registered; nothing to execute, nothing panics.
        relayer
            .route(vec![Message::state_root(
                2,
                1,
                StateRootData { state_root: B256::ZERO, slot: 1 },
            )])
            .await;
    }

    #[tokio::test]
    async fn test_handler_error_does_not_block_batch() {
        let mut handler = MockMessageHandler::new();
        let mut failed_once = false;
        handler.expect_handle_message().times(2).returning(move |message| {
            if !failed_once {
                failed_once = true;
                return Err(crate::HandlerError::Config("boom".into()));
            }
            let Payload::Transfer(data) = message.payload else { panic!("wrong payload") };
            Ok(Some(Proposal {
                source: message.source,
                destination: message.destination,
                id: message.id,
                payload: ProposalPayload::Transfer(data),
            }))
        });

        let mut executor = MockProposalExecutor::new();
        executor
            .expect_execute()
            .withf(|proposals| proposals.len() == 1)
            .times(1)
            .returning(|_| Ok(()));

        let mut relayer = Relayer::new();
        relayer.register_handler(2, MessageKind::Transfer, Arc::new(handler));
        relayer.register_executor(2, Arc::new(executor));

        relayer.route(vec![transfer_message(1), transfer_message(2)]).await;
    }
}
