#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{ExecutorError, ExecutorResult};

mod transactor;
pub use transactor::{
    bumped_gas_price, effective_gas_price, GasPolicy, SigningTransactor, TransactOptions,
    Transactor,
};

mod contracts;
pub use contracts::{
    ExecutorCalls, ExecutorContract, ExecutorProposal, HashiAdapterContract, HashiCalls,
};
#[cfg(test)]
pub use contracts::{MockExecutorCalls, MockHashiCalls};

mod executor;
pub use executor::{EvmExecutor, HASHI_GAS_COST, TRANSACTION_MAX_GAS, TRANSFER_GAS_COST};
