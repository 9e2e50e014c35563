//! Chain presets for the consensus-layer containers.
//!
//! The mainnet and gnosis presets share field names but not all vector
//! capacities, which changes both the SSZ layout and the Merkle shape of the
//! affected containers. The preset is therefore carried at the type level and
//! selected once, at construction time, through [ChainSpec].

use core::fmt::Debug;
use core::str::FromStr;

use ssz_types::typenum::{
    Unsigned, U2, U4, U16, U32, U33, U128, U256, U1024, U2048, U4096, U8192, U65536, U1048576,
    U16777216, U1073741824, U1099511627776,
};

/// Number of slots retained in the beacon state's `block_roots` vector.
pub const SLOTS_PER_HISTORICAL_LIMIT: u64 = 8192;

/// Associated capacities of the consensus containers for one chain preset.
pub trait EthSpec: 'static + Clone + Debug + Send + Sync + PartialEq {
    /// `MAX_VALIDATORS_PER_COMMITTEE`
    type MaxValidatorsPerCommittee: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_PROPOSER_SLASHINGS`
    type MaxProposerSlashings: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_ATTESTER_SLASHINGS`
    type MaxAttesterSlashings: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_ATTESTATIONS`
    type MaxAttestations: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_DEPOSITS`
    type MaxDeposits: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_VOLUNTARY_EXITS`
    type MaxVoluntaryExits: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_BLS_TO_EXECUTION_CHANGES`
    type MaxBlsToExecutionChanges: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_BLOB_COMMITMENTS_PER_BLOCK`
    type MaxBlobCommitmentsPerBlock: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `BYTES_PER_LOGS_BLOOM`
    type BytesPerLogsBloom: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_EXTRA_DATA_BYTES`
    type MaxExtraDataBytes: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_BYTES_PER_TRANSACTION`
    type MaxBytesPerTransaction: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_TRANSACTIONS_PER_PAYLOAD`
    type MaxTransactionsPerPayload: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `MAX_WITHDRAWALS_PER_PAYLOAD` — 16 on mainnet, 8 on gnosis.
    type MaxWithdrawalsPerPayload: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `SLOTS_PER_HISTORICAL_ROOT`
    type SlotsPerHistoricalRoot: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `HISTORICAL_ROOTS_LIMIT`
    type HistoricalRootsLimit: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `EPOCHS_PER_ETH1_VOTING_PERIOD * SLOTS_PER_EPOCH` — 2048 on mainnet,
    /// 1024 on gnosis (16-slot epochs).
    type SlotsPerEth1VotingPeriod: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `VALIDATOR_REGISTRY_LIMIT`
    type ValidatorRegistryLimit: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `EPOCHS_PER_HISTORICAL_VECTOR`
    type EpochsPerHistoricalVector: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `EPOCHS_PER_SLASHINGS_VECTOR`
    type EpochsPerSlashingsVector: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `JUSTIFICATION_BITS_LENGTH`
    type JustificationBitsLength: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    /// `DEPOSIT_CONTRACT_TREE_DEPTH + 1`
    type DepositProofLength: Unsigned + Clone + Sync + Send + Debug + PartialEq;
}

/// The canonical Ethereum mainnet preset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainnetEthSpec;

impl EthSpec for MainnetEthSpec {
    type MaxValidatorsPerCommittee = U2048;
    type MaxProposerSlashings = U16;
    type MaxAttesterSlashings = U2;
    type MaxAttestations = U128;
    type MaxDeposits = U16;
    type MaxVoluntaryExits = U16;
    type MaxBlsToExecutionChanges = U16;
    type MaxBlobCommitmentsPerBlock = U4096;
    type BytesPerLogsBloom = U256;
    type MaxExtraDataBytes = U32;
    type MaxBytesPerTransaction = U1073741824;
    type MaxTransactionsPerPayload = U1048576;
    type MaxWithdrawalsPerPayload = U16;
    type SlotsPerHistoricalRoot = U8192;
    type HistoricalRootsLimit = U16777216;
    type SlotsPerEth1VotingPeriod = U2048;
    type ValidatorRegistryLimit = U1099511627776;
    type EpochsPerHistoricalVector = U65536;
    type EpochsPerSlashingsVector = U8192;
    type JustificationBitsLength = U4;
    type DepositProofLength = U33;
}

/// The gnosis chain preset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GnosisEthSpec;

impl EthSpec for GnosisEthSpec {
    type MaxValidatorsPerCommittee = U2048;
    type MaxProposerSlashings = U16;
    type MaxAttesterSlashings = U2;
    type MaxAttestations = U128;
    type MaxDeposits = U16;
    type MaxVoluntaryExits = U16;
    type MaxBlsToExecutionChanges = U16;
    type MaxBlobCommitmentsPerBlock = U4096;
    type BytesPerLogsBloom = U256;
    type MaxExtraDataBytes = U32;
    type MaxBytesPerTransaction = U1073741824;
    type MaxTransactionsPerPayload = U1048576;
    type MaxWithdrawalsPerPayload = ssz_types::typenum::U8;
    type SlotsPerHistoricalRoot = U8192;
    type HistoricalRootsLimit = U16777216;
    type SlotsPerEth1VotingPeriod = U1024;
    type ValidatorRegistryLimit = U1099511627776;
    type EpochsPerHistoricalVector = U65536;
    type EpochsPerSlashingsVector = U8192;
    type JustificationBitsLength = U4;
    type DepositProofLength = U33;
}

/// Runtime selector between the statically-typed presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainSpec {
    /// Canonical Ethereum mainnet SSZ schema.
    #[default]
    Mainnet,
    /// Gnosis chain SSZ schema.
    Gnosis,
}

impl FromStr for ChainSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "gnosis" => Ok(Self::Gnosis),
            other => Err(format!("unknown chain spec `{other}`")),
        }
    }
}
