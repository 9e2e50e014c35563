//! Event and message handler capabilities.

use async_trait::async_trait;

use crate::{HandlerResult, Message, Proposal};

/// Handles decoded chain events for one block range of the observing domain's
/// counterpart, anchored at the state root accepted at `slot`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Processes events destined for `destination` within
    /// `[start_block, end_block]`.
    async fn handle_events(
        &self,
        destination: u8,
        start_block: u64,
        end_block: u64,
        slot: u64,
    ) -> HandlerResult<()>;
}

/// Handles raw block ranges observed by a domain listener.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockEventHandler: Send + Sync {
    /// Processes `[start_block, end_block]` of the listener's own domain.
    async fn handle_block_range(&self, start_block: u64, end_block: u64) -> HandlerResult<()>;
}

/// Handles one routed [Message], optionally producing a [Proposal].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes `message`.
    async fn handle_message(&self, message: Message) -> HandlerResult<Option<Proposal>>;
}

mod state_root;
pub use state_root::StateRootEventHandler;

mod deposit;
pub use deposit::DepositEventHandler;

mod dispatched;
pub use dispatched::{DispatchedEventHandler, DEFAULT_SLOT_SEARCH_LIMIT};

mod state_root_msg;
pub use state_root_msg::{DispatchedMessageHandler, StateRootMessageHandler, TransferMessageHandler};
