//! Native transfer boundary.
//!
//! Paying out native currency is the only ledger operation that can hand control
//! to code the ledger does not own. The destination may call back into any entry
//! point before [`NativeTransfer::send_native`] returns, so callers must commit
//! their ledger writes first and must not hold any ledger-derived values they
//! intend to write back afterwards.

use crate::error::StoreError;
use alloy_primitives::{Address, U256};

/// Moves native currency held by the ledger contract.
pub trait NativeTransfer {
    /// Sends `amount` fine units from the ledger contract to `destination`.
    ///
    /// Returns `Ok(false)` when the destination refused the payment or the
    /// reserve could not cover it. In that case no native value moved and any
    /// effects of the destination's own execution were discarded. `Err` is
    /// reserved for host failures.
    fn send_native(&mut self, destination: Address, amount: U256) -> Result<bool, StoreError>;

    /// Native balance currently held by the ledger contract.
    fn reserve(&mut self) -> Result<U256, StoreError>;
}
