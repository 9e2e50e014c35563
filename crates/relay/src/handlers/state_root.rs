//! Watches state-root submissions and surfaces them as internal messages.

use std::sync::Arc;

use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::{
    events::StateRootSubmitted, BlockEventHandler, ExecutionProvider, HandlerError, HandlerResult,
    Message, StateRootData,
};

/// Decodes `StateRootSubmitted` events from one state-root storage contract
/// and emits a state-root message per event, addressed to the root's source
/// domain.
#[derive(Debug)]
pub struct StateRootEventHandler<P> {
    domain_id: u8,
    state_root_address: Address,
    client: Arc<P>,
    msg_tx: mpsc::Sender<Vec<Message>>,
}

impl<P> StateRootEventHandler<P> {
    /// Creates a new [StateRootEventHandler] for the contract at
    /// `state_root_address`.
    pub const fn new(
        domain_id: u8,
        state_root_address: Address,
        client: Arc<P>,
        msg_tx: mpsc::Sender<Vec<Message>>,
    ) -> Self {
        Self { domain_id, state_root_address, client, msg_tx }
    }
}

#[async_trait]
impl<P: ExecutionProvider> BlockEventHandler for StateRootEventHandler<P> {
    async fn handle_block_range(&self, start_block: u64, end_block: u64) -> HandlerResult<()> {
        let logs = self
            .client
            .fetch_event_logs(
                self.state_root_address,
                StateRootSubmitted::SIGNATURE,
                start_block,
                end_block,
            )
            .await?;

        for log in logs {
            let event = match StateRootSubmitted::decode_log_data(log.data()) {
                Ok(event) => event,
                Err(err) => {
                    error!(
                        target: "state_root_handler",
                        domain_id = self.domain_id,
                        %err,
                        "Failed unpacking state root event log"
                    );
                    continue;
                }
            };
            let Ok(slot) = u64::try_from(event.slot) else {
                error!(target: "state_root_handler", slot = %event.slot, "State root slot overflows u64");
                continue;
            };

            debug!(
                target: "state_root_handler",
                domain_id = self.domain_id,
                source_domain_id = event.sourceDomainID,
                state_root = %event.stateRoot,
                slot,
                "Found state root submission"
            );
            self.msg_tx
                .send(vec![Message::state_root(
                    self.domain_id,
                    event.sourceDomainID,
                    StateRootData { state_root: event.stateRoot, slot },
                )])
                .await
                .map_err(|_| HandlerError::ChannelClosed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageKind, MockExecutionProvider, Payload};
    use alloy_primitives::{B256, U256};
    use alloy_rpc_types_eth::Log;
    use mockall::predicate::eq;

    fn state_root_log(source: u8, slot: u64, root: B256) -> Log {
        let event = StateRootSubmitted {
            sourceDomainID: source,
            slot: U256::from(slot),
            stateRoot: root,
        };
        Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(0xa8),
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_emits_one_message_per_event() {
        let root = B256::repeat_byte(7);
        let mut client = MockExecutionProvider::new();
        client
            .expect_fetch_event_logs()
            .with(
                eq(Address::repeat_byte(0xa8)),
                eq(StateRootSubmitted::SIGNATURE),
                eq(10u64),
                eq(20u64),
            )
            .returning(move |_, _, _, _| {
                Ok(vec![state_root_log(1, 10, root), state_root_log(3, 11, root)])
            });

        let (tx, mut rx) = mpsc::channel(8);
        let handler =
            StateRootEventHandler::new(2, Address::repeat_byte(0xa8), Arc::new(client), tx);
        handler.handle_block_range(10, 20).await.unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].source, 2);
        assert_eq!(first[0].destination, 1);
        assert_eq!(first[0].kind(), MessageKind::StateRoot);
        let Payload::StateRoot(data) = &first[0].payload else { panic!("wrong payload") };
        assert_eq!(data.slot, 10);
        assert_eq!(data.state_root, root);

        let second = rx.try_recv().unwrap();
        assert_eq!(second[0].destination, 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_log_is_skipped() {
        let mut client = MockExecutionProvider::new();
        client.expect_fetch_event_logs().returning(|_, _, _, _| {
            Ok(vec![Log {
                inner: alloy_primitives::Log {
                    address: Address::ZERO,
                    data: alloy_primitives::LogData::new_unchecked(vec![], vec![1, 2, 3].into()),
                },
                ..Default::default()
            }])
        });

        let (tx, mut rx) = mpsc::channel(8);
        let handler = StateRootEventHandler::new(2, Address::ZERO, Arc::new(client), tx);
        handler.handle_block_range(0, 1).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
