//! Ledger state in EVM account storage.
//!
//! ## Storage Layout
//!
//! The precompile account uses the Solidity layout of the equivalent contract,
//! so standard tooling (`eth_getStorageAt`, storage proofs) reads the same slots:
//!
//! | Slot | Description |
//! |------|-------------|
//! | `keccak256(account . 0)` | `balanceOf[account]` |
//! | `keccak256(spender . keccak256(owner . 1))` | `allowance[owner][spender]` |
//! | `2` | `totalSupply` |
//!
//! where `.` is the concatenation of two left-padded 32-byte words.

use alloy_evm::{EvmInternals, EvmInternalsError};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use revm::bytecode::Bytecode;
use std::{fmt, sync::OnceLock};
use whbar_ledger::{
    EventSink, LedgerStore, NativeTransfer, OwnerSpender, StoreError, WhbarEvent,
};

/// Root slot of the balance mapping.
pub const BALANCES_SLOT: U256 = U256::ZERO;
/// Root slot of the nested allowance mapping.
pub const ALLOWANCES_SLOT: U256 = U256::from_limbs([1, 0, 0, 0]);
/// Slot of the total supply counter.
pub const TOTAL_SUPPLY_SLOT: U256 = U256::from_limbs([2, 0, 0, 0]);

/// Storage slot of `mapping[key]` for a mapping rooted at `slot`.
pub fn mapping_slot(key: B256, slot: U256) -> U256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key.as_slice());
    preimage[32..].copy_from_slice(&slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(preimage).0)
}

/// Storage slot of `balanceOf[account]`.
pub fn balance_slot(account: Address) -> U256 {
    mapping_slot(account.into_word(), BALANCES_SLOT)
}

/// Storage slot of `allowance[owner][spender]`.
pub fn allowance_slot(owner: Address, spender: Address) -> U256 {
    let inner = mapping_slot(owner.into_word(), ALLOWANCES_SLOT);
    mapping_slot(spender.into_word(), inner)
}

/// Bytecode marker for the precompile account.
///
/// The invalid instruction `0xFE` keeps the account from being pruned as empty
/// and marks it as not executable as a normal contract.
fn bytecode() -> &'static Bytecode {
    static BYTECODE: OnceLock<Bytecode> = OnceLock::new();
    BYTECODE.get_or_init(|| Bytecode::new_raw(Bytes::from_static(&[0xFE])))
}

fn map_internals_error(err: EvmInternalsError) -> StoreError {
    StoreError(err.to_string())
}

/// [`whbar_ledger::LedgerHost`] backed by the EVM journal of the current call.
///
/// Every write goes through the journal, so a reverted call frame discards
/// it together with the rest of the frame.
pub struct EvmLedgerHost<'a, 'i> {
    internals: &'a mut EvmInternals<'i>,
    contract: Address,
}

impl fmt::Debug for EvmLedgerHost<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmLedgerHost")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl<'a, 'i> EvmLedgerHost<'a, 'i> {
    /// Wraps `internals` for the ledger living at `contract`.
    pub fn new(internals: &'a mut EvmInternals<'i>, contract: Address) -> Self {
        Self {
            internals,
            contract,
        }
    }

    /// Creates the precompile account with its code marker if it does not exist.
    pub fn ensure_created(&mut self) -> Result<(), StoreError> {
        let account = self
            .internals
            .load_account(self.contract)
            .map_err(map_internals_error)?;

        if account.is_loaded_as_not_existing() {
            self.internals.set_code(self.contract, bytecode().clone());
            self.internals.nonce_bump_journal_entry(self.contract);
            self.internals.touch_account(self.contract);
            tracing::debug!(target: "whbar::precompile", contract = ?self.contract, "created precompile account");
        }
        Ok(())
    }

    fn native_balance(&mut self, addr: Address) -> Result<U256, StoreError> {
        let account = self
            .internals
            .load_account(addr)
            .map_err(map_internals_error)?;
        Ok(account.info.balance)
    }

    fn sload(&mut self, slot: U256) -> Result<U256, StoreError> {
        let value = self
            .internals
            .sload(self.contract, slot)
            .map_err(map_internals_error)?;
        Ok(*value)
    }

    fn sstore(&mut self, slot: U256, value: U256) -> Result<(), StoreError> {
        self.internals
            .sstore(self.contract, slot, value)
            .map_err(map_internals_error)?;
        self.internals.touch_account(self.contract);
        Ok(())
    }
}

impl LedgerStore for EvmLedgerHost<'_, '_> {
    fn balance(&mut self, account: Address) -> Result<U256, StoreError> {
        self.sload(balance_slot(account))
    }

    fn set_balance(&mut self, account: Address, amount: U256) -> Result<(), StoreError> {
        self.sstore(balance_slot(account), amount)
    }

    fn total_supply(&mut self) -> Result<U256, StoreError> {
        self.sload(TOTAL_SUPPLY_SLOT)
    }

    fn set_total_supply(&mut self, amount: U256) -> Result<(), StoreError> {
        self.sstore(TOTAL_SUPPLY_SLOT, amount)
    }

    fn allowance(&mut self, key: OwnerSpender) -> Result<U256, StoreError> {
        self.sload(allowance_slot(key.owner, key.spender))
    }

    fn set_allowance(&mut self, key: OwnerSpender, amount: U256) -> Result<(), StoreError> {
        self.sstore(allowance_slot(key.owner, key.spender), amount)
    }
}

impl NativeTransfer for EvmLedgerHost<'_, '_> {
    /// Moves native balance out of the precompile account.
    ///
    /// No destination code runs, so the payout can only be refused when the
    /// reserve does not cover it.
    fn send_native(&mut self, destination: Address, amount: U256) -> Result<bool, StoreError> {
        let reserve = self.native_balance(self.contract)?;
        let Some(remaining) = reserve.checked_sub(amount) else {
            tracing::warn!(
                target: "whbar::precompile",
                ?destination,
                %amount,
                %reserve,
                "reserve cannot cover payout"
            );
            return Ok(false);
        };
        if amount.is_zero() || destination == self.contract {
            return Ok(true);
        }

        let credited = self
            .native_balance(destination)?
            .checked_add(amount)
            .ok_or_else(|| StoreError("native balance overflow".to_string()))?;

        self.internals
            .set_balance(self.contract, remaining)
            .map_err(map_internals_error)?;
        self.internals
            .set_balance(destination, credited)
            .map_err(map_internals_error)?;
        self.internals.touch_account(self.contract);
        self.internals.touch_account(destination);
        Ok(true)
    }

    fn reserve(&mut self) -> Result<U256, StoreError> {
        self.native_balance(self.contract)
    }
}

impl EventSink for EvmLedgerHost<'_, '_> {
    fn emit(&mut self, event: WhbarEvent) -> Result<(), StoreError> {
        self.internals.log(event.into_log(self.contract));
        Ok(())
    }
}
