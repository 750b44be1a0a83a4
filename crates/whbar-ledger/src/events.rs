//! Ledger events and their EVM log encoding.

use crate::{abi::IWHBAR, error::StoreError};
use alloy_primitives::{Address, Log, LogData, U256};
use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};

/// Event emitted by a successful entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum WhbarEvent {
    /// `dst` wrapped `wad` coarse units.
    Deposit {
        /// Credited account.
        dst: Address,
        /// Coarse amount credited.
        wad: U256,
    },
    /// `src` unwrapped `wad` coarse units.
    Withdrawal {
        /// Debited account.
        src: Address,
        /// Coarse amount debited.
        wad: U256,
    },
    /// `wad` coarse units moved from `src` to `dst`.
    Transfer {
        /// Debited account.
        src: Address,
        /// Credited account.
        dst: Address,
        /// Coarse amount moved.
        wad: U256,
    },
    /// `src` allowed `guy` to move `wad` coarse units.
    Approval {
        /// Owner.
        src: Address,
        /// Spender.
        guy: Address,
        /// New allowance.
        wad: U256,
    },
}

impl WhbarEvent {
    /// ABI-encoded topics and data.
    pub fn log_data(&self) -> LogData {
        match *self {
            Self::Deposit { dst, wad } => IWHBAR::Deposit { dst, wad }.encode_log_data(),
            Self::Withdrawal { src, wad } => IWHBAR::Withdrawal { src, wad }.encode_log_data(),
            Self::Transfer { src, dst, wad } => {
                IWHBAR::Transfer { src, dst, wad }.encode_log_data()
            }
            Self::Approval { src, guy, wad } => {
                IWHBAR::Approval { src, guy, wad }.encode_log_data()
            }
        }
    }

    /// EVM log emitted by `contract`.
    pub fn into_log(self, contract: Address) -> Log {
        Log {
            address: contract,
            data: self.log_data(),
        }
    }
}

/// Receiver of ledger events.
pub trait EventSink {
    /// Records `event`. Only called after the state change it describes.
    fn emit(&mut self, event: WhbarEvent) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, B256};

    #[test]
    fn transfer_log_indexes_both_parties() {
        let src = address!("0x00000000000000000000000000000000000000a1");
        let dst = address!("0x00000000000000000000000000000000000000b1");
        let contract = address!("0x00000000000000000000000000000000000000fc");

        let log = WhbarEvent::Transfer {
            src,
            dst,
            wad: U256::from(5),
        }
        .into_log(contract);

        assert_eq!(log.address, contract);
        let topics = log.data.topics();
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0], IWHBAR::Transfer::SIGNATURE_HASH);
        assert_eq!(topics[1], B256::from(src.into_word()));
        assert_eq!(topics[2], B256::from(dst.into_word()));
        assert_eq!(log.data.data.as_ref(), U256::from(5).to_be_bytes::<32>().as_slice());
    }

    #[test]
    fn deposit_log_carries_amount_in_data() {
        let dst = address!("0x00000000000000000000000000000000000000a2");
        let data = WhbarEvent::Deposit {
            dst,
            wad: U256::from(100_000_000u64),
        }
        .log_data();

        assert_eq!(data.topics()[0], IWHBAR::Deposit::SIGNATURE_HASH);
        assert_eq!(
            U256::from_be_slice(data.data.as_ref()),
            U256::from(100_000_000u64)
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = WhbarEvent::Approval {
            src: address!("0x00000000000000000000000000000000000000a3"),
            guy: address!("0x00000000000000000000000000000000000000b3"),
            wad: U256::from(1),
        };
        let json = serde_json::to_value(event).expect("serializes");
        assert_eq!(json["event"], "approval");
    }
}
