#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{HandlerError, HandlerResult, ProviderError, ProviderResult};

pub mod events;
pub use events::DepositRecord;

mod message;
pub use message::{
    DispatchedData, Message, MessageKind, Payload, Proposal, ProposalPayload, StateRootData,
    TransferData, TransferKind,
};

mod provider;
pub use provider::{ExecutionProvider, RpcClient};
#[cfg(test)]
pub use provider::MockExecutionProvider;

mod logs;
pub use logs::{fetch_logs, MAX_BLOCK_RANGE};

mod handlers;
pub use handlers::{
    BlockEventHandler, DepositEventHandler, DispatchedEventHandler, DispatchedMessageHandler,
    EventHandler, MessageHandler, StateRootEventHandler, StateRootMessageHandler,
    TransferMessageHandler, DEFAULT_SLOT_SEARCH_LIMIT,
};
#[cfg(test)]
pub use handlers::{MockBlockEventHandler, MockEventHandler, MockMessageHandler};

mod listener;
pub use listener::{Listener, ListenerConfig};

mod relayer;
pub use relayer::{ProposalExecutor, Relayer};
#[cfg(test)]
pub use relayer::MockProposalExecutor;
