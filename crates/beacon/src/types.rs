//! Deneb consensus-layer containers.
//!
//! Only the fields the prover walks are ever inspected directly; the rest
//! exist so that SSZ decoding and per-field tree hashing of downloaded blocks
//! and states are exact. Container layouts follow the Deneb specification,
//! with preset-dependent capacities drawn from [EthSpec].

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, BitList, BitVector, FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::EthSpec;

/// A consensus-layer slot number.
pub type Slot = u64;
/// A consensus-layer epoch number.
pub type Epoch = u64;
/// A 32-byte SSZ root.
pub type Root = B256;
/// A compressed BLS12-381 public key.
pub type BlsPublicKey = FixedVector<u8, typenum::U48>;
/// A compressed BLS12-381 signature.
pub type BlsSignature = FixedVector<u8, typenum::U96>;
/// A KZG commitment to a blob.
pub type KzgCommitment = FixedVector<u8, typenum::U48>;
/// A 4-byte fork version.
pub type Version = FixedVector<u8, typenum::U4>;

/// Fork data carried in the beacon state.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Fork {
    /// Version before the fork epoch.
    pub previous_version: Version,
    /// Version from the fork epoch onwards.
    pub current_version: Version,
    /// Epoch of the fork.
    pub epoch: Epoch,
}

/// An epoch boundary reference.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Checkpoint {
    /// Epoch of the checkpoint.
    pub epoch: Epoch,
    /// Block root at the checkpoint boundary.
    pub root: Root,
}

/// The summary header of a beacon block.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    /// Slot the block was proposed in.
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: Slot,
    /// Index of the proposing validator.
    #[serde(with = "serde_utils::quoted_u64")]
    pub proposer_index: u64,
    /// Root of the parent block.
    pub parent_root: Root,
    /// Root of the post-state.
    pub state_root: Root,
    /// Root of the block body.
    pub body_root: Root,
}

/// Eth1 chain data voted into the beacon state.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Eth1Data {
    /// Root of the deposit tree.
    pub deposit_root: Root,
    /// Total deposits at the vote.
    pub deposit_count: u64,
    /// Eth1 block hash of the vote.
    pub block_hash: B256,
}

/// A registered validator.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Validator {
    /// BLS public key.
    pub pubkey: BlsPublicKey,
    /// Withdrawal credentials commitment.
    pub withdrawal_credentials: B256,
    /// Effective balance in gwei.
    pub effective_balance: u64,
    /// Whether the validator has been slashed.
    pub slashed: bool,
    /// Epoch the validator became eligible for activation.
    pub activation_eligibility_epoch: Epoch,
    /// Activation epoch.
    pub activation_epoch: Epoch,
    /// Exit epoch.
    pub exit_epoch: Epoch,
    /// Epoch funds become withdrawable.
    pub withdrawable_epoch: Epoch,
}

/// The data every attestation commits to.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct AttestationData {
    /// Slot the attestation targets.
    pub slot: Slot,
    /// Committee index.
    pub index: u64,
    /// LMD-GHOST head vote.
    pub beacon_block_root: Root,
    /// FFG source checkpoint.
    pub source: Checkpoint,
    /// FFG target checkpoint.
    pub target: Checkpoint,
}

/// An aggregated attestation.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Attestation<E: EthSpec> {
    /// Participation bits over the committee.
    pub aggregation_bits: BitList<E::MaxValidatorsPerCommittee>,
    /// Attested data.
    pub data: AttestationData,
    /// Aggregate BLS signature.
    pub signature: BlsSignature,
}

/// An attestation with explicit attester indices, as carried in slashings.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct IndexedAttestation<E: EthSpec> {
    /// Indices of the attesting validators.
    pub attesting_indices: VariableList<u64, E::MaxValidatorsPerCommittee>,
    /// Attested data.
    pub data: AttestationData,
    /// Aggregate BLS signature.
    pub signature: BlsSignature,
}

/// Evidence of two conflicting attestations.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct AttesterSlashing<E: EthSpec> {
    /// First conflicting attestation.
    pub attestation_1: IndexedAttestation<E>,
    /// Second conflicting attestation.
    pub attestation_2: IndexedAttestation<E>,
}

/// A beacon block header with its proposer signature.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlockHeader {
    /// The header.
    pub message: BeaconBlockHeader,
    /// Proposer signature over the header.
    pub signature: BlsSignature,
}

/// Evidence of two conflicting block proposals.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct ProposerSlashing {
    /// First conflicting header.
    pub signed_header_1: SignedBeaconBlockHeader,
    /// Second conflicting header.
    pub signed_header_2: SignedBeaconBlockHeader,
}

/// The deposit-contract payload of a deposit.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct DepositData {
    /// Validator public key.
    pub pubkey: BlsPublicKey,
    /// Withdrawal credentials commitment.
    pub withdrawal_credentials: B256,
    /// Amount in gwei.
    pub amount: u64,
    /// Deposit signature.
    pub signature: BlsSignature,
}

/// A deposit included in a block, with its deposit-tree branch.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Deposit {
    /// Merkle branch into the deposit tree.
    pub proof: FixedVector<B256, typenum::U33>,
    /// Deposit payload.
    pub data: DepositData,
}

/// A voluntary validator exit.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct VoluntaryExit {
    /// Earliest epoch the exit may be processed.
    pub epoch: Epoch,
    /// Exiting validator index.
    pub validator_index: u64,
}

/// A signed voluntary exit.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct SignedVoluntaryExit {
    /// The exit.
    pub message: VoluntaryExit,
    /// Validator signature.
    pub signature: BlsSignature,
}

/// Aggregated sync-committee participation for the parent slot.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct SyncAggregate {
    /// Participation bits over the sync committee.
    pub sync_committee_bits: BitVector<typenum::U512>,
    /// Aggregate BLS signature.
    pub sync_committee_signature: BlsSignature,
}

/// A sync committee.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct SyncCommittee {
    /// Member public keys.
    pub pubkeys: FixedVector<BlsPublicKey, typenum::U512>,
    /// Aggregate of the member public keys.
    pub aggregate_pubkey: BlsPublicKey,
}

/// A change of withdrawal credentials from BLS to an execution address.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct BlsToExecutionChange {
    /// Affected validator index.
    pub validator_index: u64,
    /// Current BLS withdrawal key.
    pub from_bls_pubkey: BlsPublicKey,
    /// New execution-layer withdrawal address.
    pub to_execution_address: Address,
}

/// A signed [BlsToExecutionChange].
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct SignedBlsToExecutionChange {
    /// The change.
    pub message: BlsToExecutionChange,
    /// Signature by the BLS withdrawal key.
    pub signature: BlsSignature,
}

/// A validator withdrawal in an execution payload.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct Withdrawal {
    /// Monotonic withdrawal index.
    pub index: u64,
    /// Withdrawing validator index.
    pub validator_index: u64,
    /// Recipient execution address.
    pub address: Address,
    /// Amount in gwei.
    pub amount: u64,
}

/// Roots summarizing a retired `block_roots`/`state_roots` period.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct HistoricalSummary {
    /// Root over the period's block roots.
    pub block_summary_root: Root,
    /// Root over the period's state roots.
    pub state_summary_root: Root,
}

/// The Deneb execution payload embedded in a beacon block body.
///
/// `receipts_root` is field 3; together with the body and block offsets this
/// yields the in-block generalized index the prover walks.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct ExecutionPayload<E: EthSpec> {
    /// Parent execution block hash.
    pub parent_hash: B256,
    /// Fee recipient address.
    pub fee_recipient: Address,
    /// Execution state root.
    pub state_root: B256,
    /// Execution receipts root.
    pub receipts_root: B256,
    /// Logs bloom.
    pub logs_bloom: FixedVector<u8, E::BytesPerLogsBloom>,
    /// RANDAO of the previous block.
    pub prev_randao: B256,
    /// Execution block number.
    pub block_number: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Gas used by the block.
    pub gas_used: u64,
    /// Block timestamp.
    pub timestamp: u64,
    /// Arbitrary extra data.
    pub extra_data: VariableList<u8, E::MaxExtraDataBytes>,
    /// EIP-1559 base fee.
    pub base_fee_per_gas: U256,
    /// Execution block hash.
    pub block_hash: B256,
    /// Opaque transaction payloads.
    pub transactions: VariableList<VariableList<u8, E::MaxBytesPerTransaction>, E::MaxTransactionsPerPayload>,
    /// Validator withdrawals.
    pub withdrawals: VariableList<Withdrawal, E::MaxWithdrawalsPerPayload>,
    /// Blob gas used by the block.
    pub blob_gas_used: u64,
    /// Running excess blob gas.
    pub excess_blob_gas: u64,
}

/// The body of a Deneb beacon block. `execution_payload` is field 9.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct BeaconBlockBody<E: EthSpec> {
    /// RANDAO reveal.
    pub randao_reveal: BlsSignature,
    /// Eth1 vote.
    pub eth1_data: Eth1Data,
    /// Proposer graffiti.
    pub graffiti: B256,
    /// Proposer slashings.
    pub proposer_slashings: VariableList<ProposerSlashing, E::MaxProposerSlashings>,
    /// Attester slashings.
    pub attester_slashings: VariableList<AttesterSlashing<E>, E::MaxAttesterSlashings>,
    /// Attestations.
    pub attestations: VariableList<Attestation<E>, E::MaxAttestations>,
    /// Deposits.
    pub deposits: VariableList<Deposit, E::MaxDeposits>,
    /// Voluntary exits.
    pub voluntary_exits: VariableList<SignedVoluntaryExit, E::MaxVoluntaryExits>,
    /// Sync-committee aggregate.
    pub sync_aggregate: SyncAggregate,
    /// Execution payload.
    pub execution_payload: ExecutionPayload<E>,
    /// BLS-to-execution changes.
    pub bls_to_execution_changes: VariableList<SignedBlsToExecutionChange, E::MaxBlsToExecutionChanges>,
    /// Blob KZG commitments.
    pub blob_kzg_commitments: VariableList<KzgCommitment, E::MaxBlobCommitmentsPerBlock>,
}

/// A Deneb beacon block. `body` is field 4.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct BeaconBlock<E: EthSpec> {
    /// Slot of the block.
    pub slot: Slot,
    /// Proposing validator index.
    pub proposer_index: u64,
    /// Parent block root.
    pub parent_root: Root,
    /// Post-state root.
    pub state_root: Root,
    /// Block body.
    pub body: BeaconBlockBody<E>,
}

/// A [BeaconBlock] with its proposer signature.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct SignedBeaconBlock<E: EthSpec> {
    /// The block.
    pub message: BeaconBlock<E>,
    /// Proposer signature.
    pub signature: BlsSignature,
}

/// The execution payload header kept in the beacon state.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct ExecutionPayloadHeader<E: EthSpec> {
    /// Parent execution block hash.
    pub parent_hash: B256,
    /// Fee recipient address.
    pub fee_recipient: Address,
    /// Execution state root.
    pub state_root: B256,
    /// Execution receipts root.
    pub receipts_root: B256,
    /// Logs bloom.
    pub logs_bloom: FixedVector<u8, E::BytesPerLogsBloom>,
    /// RANDAO of the previous block.
    pub prev_randao: B256,
    /// Execution block number.
    pub block_number: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Gas used by the block.
    pub gas_used: u64,
    /// Block timestamp.
    pub timestamp: u64,
    /// Arbitrary extra data.
    pub extra_data: VariableList<u8, E::MaxExtraDataBytes>,
    /// EIP-1559 base fee.
    pub base_fee_per_gas: U256,
    /// Execution block hash.
    pub block_hash: B256,
    /// Root over the transaction payloads.
    pub transactions_root: Root,
    /// Root over the withdrawals.
    pub withdrawals_root: Root,
    /// Blob gas used by the block.
    pub blob_gas_used: u64,
    /// Running excess blob gas.
    pub excess_blob_gas: u64,
}

/// The Deneb beacon state. `block_roots` is field 5, which fixes the
/// historical-root generalized index inside the 32-chunk container tree.
#[derive(Debug, Clone, PartialEq, Encode, Decode, TreeHash)]
pub struct BeaconState<E: EthSpec> {
    /// Genesis timestamp.
    pub genesis_time: u64,
    /// Root over the genesis validator set.
    pub genesis_validators_root: Root,
    /// Current slot.
    pub slot: Slot,
    /// Fork data.
    pub fork: Fork,
    /// Header of the latest processed block.
    pub latest_block_header: BeaconBlockHeader,
    /// Recent block roots, indexed by `slot % SLOTS_PER_HISTORICAL_ROOT`.
    pub block_roots: FixedVector<Root, E::SlotsPerHistoricalRoot>,
    /// Recent state roots.
    pub state_roots: FixedVector<Root, E::SlotsPerHistoricalRoot>,
    /// Frozen pre-Capella accumulator roots.
    pub historical_roots: VariableList<Root, E::HistoricalRootsLimit>,
    /// Latest eth1 vote outcome.
    pub eth1_data: Eth1Data,
    /// Pending eth1 votes.
    pub eth1_data_votes: VariableList<Eth1Data, E::SlotsPerEth1VotingPeriod>,
    /// Deposits processed so far.
    pub eth1_deposit_index: u64,
    /// Validator registry.
    pub validators: VariableList<Validator, E::ValidatorRegistryLimit>,
    /// Validator balances in gwei.
    pub balances: VariableList<u64, E::ValidatorRegistryLimit>,
    /// RANDAO mixes.
    pub randao_mixes: FixedVector<B256, E::EpochsPerHistoricalVector>,
    /// Per-epoch slashed totals.
    pub slashings: FixedVector<u64, E::EpochsPerSlashingsVector>,
    /// Previous-epoch participation flags.
    pub previous_epoch_participation: VariableList<u8, E::ValidatorRegistryLimit>,
    /// Current-epoch participation flags.
    pub current_epoch_participation: VariableList<u8, E::ValidatorRegistryLimit>,
    /// Justification bitfield.
    pub justification_bits: BitVector<E::JustificationBitsLength>,
    /// Previous justified checkpoint.
    pub previous_justified_checkpoint: Checkpoint,
    /// Current justified checkpoint.
    pub current_justified_checkpoint: Checkpoint,
    /// Finalized checkpoint.
    pub finalized_checkpoint: Checkpoint,
    /// Inactivity scores.
    pub inactivity_scores: VariableList<u64, E::ValidatorRegistryLimit>,
    /// Current sync committee.
    pub current_sync_committee: SyncCommittee,
    /// Next sync committee.
    pub next_sync_committee: SyncCommittee,
    /// Header of the latest execution payload.
    pub latest_execution_payload_header: ExecutionPayloadHeader<E>,
    /// Next withdrawal index.
    pub next_withdrawal_index: u64,
    /// Next validator to sweep for withdrawals.
    pub next_withdrawal_validator_index: u64,
    /// Post-Capella accumulator summaries.
    pub historical_summaries: VariableList<HistoricalSummary, E::HistoricalRootsLimit>,
}
