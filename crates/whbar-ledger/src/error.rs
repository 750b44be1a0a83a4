//! Error taxonomy of the ledger.

use crate::abi::IWHBAR;
use alloy_primitives::{Address, Bytes, Selector, U256};
use alloy_sol_types::SolError;
use thiserror::Error;

/// Broad category of a [`WhbarError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any state was read or written.
    Validation,
    /// A ledger precondition failed. Nothing was written.
    Domain,
    /// The native payout failed after the debit was committed.
    Boundary,
    /// The host storage backing the ledger failed.
    Host,
}

/// Input that can never be executed, regardless of ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Calldata names no entry point and carries no value.
    #[error("calldata does not match any entry point")]
    UnknownSelector,
    /// The selector matched but the arguments did not decode.
    #[error("malformed calldata for selector {selector}: {reason}")]
    MalformedCall {
        /// Selector of the entry point that was matched.
        selector: Selector,
        /// Decoder failure.
        reason: String,
    },
    /// Value was attached to an entry point that does not accept it.
    #[error("entry point {selector} is not payable")]
    NonPayable {
        /// Selector of the non-payable entry point.
        selector: Selector,
    },
    /// Converting the coarse amount to fine units leaves the 256-bit range.
    #[error("coarse amount {coarse} overflows the fine unit")]
    FineAmountOverflow {
        /// The offending coarse amount.
        coarse: U256,
    },
    /// A signed amount below zero.
    #[error("negative amount {value}")]
    NegativeAmount {
        /// The offending value.
        value: i128,
    },
}

/// Failure of the storage backing a [`crate::LedgerStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ledger storage failure: {0}")]
pub struct StoreError(pub String);

/// Errors raised by the ledger entry points.
///
/// Every variant except [`WhbarError::SendFailed`] guarantees that no ledger
/// state was modified. `SendFailed` is raised after the withdrawal debit was
/// committed, and that debit is not rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhbarError {
    /// Input rejected up front.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The source balance does not cover the amount.
    #[error("InsufficientFunds: {account} holds {available}, needs {required}")]
    InsufficientFunds {
        /// Account being debited.
        account: Address,
        /// Its current balance.
        available: U256,
        /// Requested amount.
        required: U256,
    },
    /// The spender's allowance does not cover the amount.
    #[error("InsufficientAllowance: {spender} may move {available} from {owner}, needs {required}")]
    InsufficientAllowance {
        /// Owner of the balance.
        owner: Address,
        /// Spender whose allowance is consumed.
        spender: Address,
        /// Current allowance.
        available: U256,
        /// Requested amount.
        required: U256,
    },
    /// Crediting the account would exceed the 256-bit range.
    #[error("balance overflow crediting {account}")]
    BalanceOverflow {
        /// Account being credited.
        account: Address,
    },
    /// Crediting would push the total supply past the 256-bit range.
    #[error("total supply overflow")]
    SupplyOverflow,
    /// Wrapped balance cannot be sent to the ledger contract itself.
    #[error("SendFailed: {recipient} is the ledger contract")]
    ContractRecipient {
        /// The rejected destination.
        recipient: Address,
    },
    /// The native payout of a withdrawal was refused. The debit stands.
    #[error("SendFailed: payout of {amount} to {destination} refused, debit of {debited} stands")]
    SendFailed {
        /// Payout destination.
        destination: Address,
        /// Fine amount that was not delivered.
        amount: U256,
        /// Coarse amount already debited.
        debited: U256,
    },
    /// Host storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WhbarError {
    /// Returns the category of the error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InsufficientFunds { .. } |
            Self::InsufficientAllowance { .. } |
            Self::BalanceOverflow { .. } |
            Self::SupplyOverflow |
            Self::ContractRecipient { .. } => ErrorKind::Domain,
            Self::SendFailed { .. } => ErrorKind::Boundary,
            Self::Store(_) => ErrorKind::Host,
        }
    }

    /// Whether ledger state was committed before the error was raised.
    pub const fn is_committed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Boundary)
    }

    /// ABI revert payload for the error.
    ///
    /// Errors without a Solidity counterpart revert with empty data, as a
    /// Solidity contract does for arithmetic and decoding failures.
    pub fn revert_data(&self) -> Bytes {
        let encoded = match self {
            Self::InsufficientFunds { .. } => IWHBAR::InsufficientFunds {}.abi_encode(),
            Self::InsufficientAllowance { .. } => IWHBAR::InsufficientAllowance {}.abi_encode(),
            Self::ContractRecipient { .. } | Self::SendFailed { .. } => {
                IWHBAR::SendFailed {}.abi_encode()
            }
            _ => Vec::new(),
        };
        encoded.into()
    }
}

/// A broken ledger invariant, reported by [`crate::Runtime::audit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The total supply counter differs from the sum of balances.
    #[error("total supply {total_supply} differs from sum of balances {sum}")]
    SupplyMismatch {
        /// Stored counter.
        total_supply: U256,
        /// Sum over all balance records.
        sum: U256,
    },
    /// The native reserve does not cover the wrapped supply.
    #[error("reserve {reserve} cannot cover {required} fine units of supply")]
    ReserveShortfall {
        /// Native balance held by the ledger.
        reserve: U256,
        /// `toFine(totalSupply)`.
        required: U256,
    },
}
