//! On-chain event definitions and their decoded domain forms.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::sol;

sol! {
    /// Emitted by a state-root storage contract when a finalized execution
    /// state root of a source chain is accepted.
    event StateRootSubmitted(uint8 sourceDomainID, uint256 slot, bytes32 stateRoot);

    /// Emitted by the router for every bridge deposit.
    event Deposit(
        uint8 destinationDomainID,
        uint8 securityModel,
        bytes32 resourceID,
        uint64 depositNonce,
        address indexed user,
        bytes data
    );

    /// The message payload carried by [MessageDispatched].
    struct HashiMessage {
        uint256 nonce;
        uint256 targetChainId;
        uint256 threshold;
        address sender;
        address receiver;
        bytes data;
        address[] reporters;
        address[] adapters;
    }

    /// Emitted by the yaho contract for every dispatched cross-chain message.
    event MessageDispatched(uint256 indexed messageId, HashiMessage message);
}

/// A decoded router deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRecord {
    /// Domain the deposit is destined for.
    pub destination_domain_id: u8,
    /// Security model chosen by the depositor.
    pub security_model: u8,
    /// Resource the deposit transfers.
    pub resource_id: B256,
    /// Nonce identifying the deposit on its route.
    pub deposit_nonce: u64,
    /// Depositing account.
    pub sender: Address,
    /// Deposit calldata.
    pub data: Bytes,
}

impl From<Deposit> for DepositRecord {
    fn from(event: Deposit) -> Self {
        Self {
            destination_domain_id: event.destinationDomainID,
            security_model: event.securityModel,
            resource_id: event.resourceID,
            deposit_nonce: event.depositNonce,
            sender: event.user,
            data: event.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolEvent;

    #[test]
    fn test_event_signatures() {
        assert_eq!(StateRootSubmitted::SIGNATURE, "StateRootSubmitted(uint8,uint256,bytes32)");
        assert_eq!(Deposit::SIGNATURE, "Deposit(uint8,uint8,bytes32,uint64,address,bytes)");
        assert_eq!(
            MessageDispatched::SIGNATURE,
            "MessageDispatched(uint256,(uint256,uint256,uint256,address,address,bytes,address[],address[]))"
        );
    }

    #[test]
    fn test_deposit_decode_roundtrip() {
        let event = Deposit {
            destinationDomainID: 2,
            securityModel: 1,
            resourceID: B256::repeat_byte(3),
            depositNonce: 7,
            user: Address::repeat_byte(0xd6),
            data: Bytes::from(vec![0u8; 32]),
        };
        let log_data = event.encode_log_data();
        let decoded = Deposit::decode_log_data(&log_data).unwrap();
        let record = DepositRecord::from(decoded);
        assert_eq!(record.destination_domain_id, 2);
        assert_eq!(record.security_model, 1);
        assert_eq!(record.deposit_nonce, 7);
        assert_eq!(record.sender, Address::repeat_byte(0xd6));
    }
}
