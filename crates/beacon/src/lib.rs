#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod spec;
pub use spec::{ChainSpec, EthSpec, GnosisEthSpec, MainnetEthSpec, SLOTS_PER_HISTORICAL_LIMIT};

mod types;
pub use types::{
    Attestation, AttestationData, AttesterSlashing, BeaconBlock, BeaconBlockBody,
    BeaconBlockHeader, BeaconState, BlsPublicKey, BlsSignature, BlsToExecutionChange, Checkpoint,
    Deposit, DepositData, Epoch, Eth1Data, ExecutionPayload, ExecutionPayloadHeader, Fork,
    HistoricalSummary, IndexedAttestation, KzgCommitment, ProposerSlashing, Root,
    SignedBeaconBlock, SignedBeaconBlockHeader, SignedBlsToExecutionChange, SignedVoluntaryExit,
    Slot, SyncAggregate, SyncCommittee, Validator, Version, VoluntaryExit, Withdrawal,
};

mod versioned;
pub use versioned::{VersionedBeaconState, VersionedSignedBeaconBlock};

mod errors;
pub use errors::{BeaconClientError, BeaconResult};

mod cache;
pub use cache::{StateCache, STATE_CACHE_CAPACITY, STATE_CACHE_TTL};

mod client;
pub use client::{BeaconHeader, BeaconProvider, OnlineBeaconClient};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
