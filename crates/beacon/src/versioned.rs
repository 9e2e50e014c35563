//! Spec-erased wrappers over the preset-generic containers.
//!
//! The chain preset is chosen from configuration at runtime, while the SSZ
//! schemas are static. These wrappers pin the schema once, at decode time, and
//! let the rest of the system stay monomorphic.

use ssz::Decode;

use crate::{
    BeaconState, ChainSpec, GnosisEthSpec, MainnetEthSpec, SignedBeaconBlock, Slot,
};
use alloy_primitives::B256;

/// A [SignedBeaconBlock] decoded under one of the supported presets.
#[derive(Debug, Clone)]
pub enum VersionedSignedBeaconBlock {
    /// Block decoded with the mainnet schema.
    Mainnet(SignedBeaconBlock<MainnetEthSpec>),
    /// Block decoded with the gnosis schema.
    Gnosis(SignedBeaconBlock<GnosisEthSpec>),
}

impl VersionedSignedBeaconBlock {
    /// Decodes an SSZ-encoded signed beacon block under `spec`.
    pub fn from_ssz_bytes(spec: ChainSpec, bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
        match spec {
            ChainSpec::Mainnet => SignedBeaconBlock::from_ssz_bytes(bytes).map(Self::Mainnet),
            ChainSpec::Gnosis => SignedBeaconBlock::from_ssz_bytes(bytes).map(Self::Gnosis),
        }
    }

    /// The slot of the block.
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Mainnet(block) => block.message.slot,
            Self::Gnosis(block) => block.message.slot,
        }
    }

    /// The execution block number carried in the payload.
    pub const fn execution_block_number(&self) -> u64 {
        match self {
            Self::Mainnet(block) => block.message.body.execution_payload.block_number,
            Self::Gnosis(block) => block.message.body.execution_payload.block_number,
        }
    }

    /// The execution receipts root carried in the payload.
    pub const fn execution_receipts_root(&self) -> B256 {
        match self {
            Self::Mainnet(block) => block.message.body.execution_payload.receipts_root,
            Self::Gnosis(block) => block.message.body.execution_payload.receipts_root,
        }
    }
}

/// A [BeaconState] decoded under one of the supported presets.
#[derive(Debug, Clone)]
pub enum VersionedBeaconState {
    /// State decoded with the mainnet schema.
    Mainnet(BeaconState<MainnetEthSpec>),
    /// State decoded with the gnosis schema.
    Gnosis(BeaconState<GnosisEthSpec>),
}

impl VersionedBeaconState {
    /// Decodes an SSZ-encoded beacon state under `spec`.
    pub fn from_ssz_bytes(spec: ChainSpec, bytes: &[u8]) -> Result<Self, ssz::DecodeError> {
        match spec {
            ChainSpec::Mainnet => BeaconState::from_ssz_bytes(bytes).map(Self::Mainnet),
            ChainSpec::Gnosis => BeaconState::from_ssz_bytes(bytes).map(Self::Gnosis),
        }
    }

    /// The slot of the state.
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Mainnet(state) => state.slot,
            Self::Gnosis(state) => state.slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_signed_block, sample_state};
    use ssz::Encode;

    #[test]
    fn test_signed_block_ssz_roundtrip() {
        let block = sample_signed_block::<MainnetEthSpec>(10, 100, B256::repeat_byte(0xaa));
        let bytes = block.as_ssz_bytes();
        let decoded = VersionedSignedBeaconBlock::from_ssz_bytes(ChainSpec::Mainnet, &bytes).unwrap();
        assert_eq!(decoded.slot(), 10);
        assert_eq!(decoded.execution_block_number(), 100);
        assert_eq!(decoded.execution_receipts_root(), B256::repeat_byte(0xaa));
    }

    #[test]
    fn test_state_ssz_roundtrip() {
        let state = sample_state::<GnosisEthSpec>(8);
        let bytes = state.as_ssz_bytes();
        let decoded = VersionedBeaconState::from_ssz_bytes(ChainSpec::Gnosis, &bytes).unwrap();
        assert_eq!(decoded.slot(), 8);
    }

    #[test]
    fn test_block_decode_rejects_wrong_schema_garbage() {
        assert!(VersionedSignedBeaconBlock::from_ssz_bytes(ChainSpec::Mainnet, &[1, 2, 3]).is_err());
    }
}
