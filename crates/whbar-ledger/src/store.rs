//! Storage of ledger state.
//!
//! The ledger persists two maps and one scalar: balances keyed by account,
//! allowances keyed by `(owner, spender)`, and the total supply. Absent entries
//! read as zero. Entries are never removed; a zero is stored like any other
//! value.

use crate::error::StoreError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key of an allowance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerSpender {
    /// Account whose balance may be moved.
    pub owner: Address,
    /// Account allowed to move it.
    pub spender: Address,
}

impl OwnerSpender {
    /// Creates a key for the `(owner, spender)` pair.
    pub const fn new(owner: Address, spender: Address) -> Self {
        Self { owner, spender }
    }
}

/// Backing storage for the ledger.
///
/// Reads take `&mut self` because EVM storage tracks warm/cold slot access on
/// every load. Implementations must make each write visible to subsequent reads
/// immediately; the ledger relies on that for re-entrant calls.
pub trait LedgerStore {
    /// Balance of `account`, zero when absent.
    fn balance(&mut self, account: Address) -> Result<U256, StoreError>;

    /// Overwrites the balance of `account`.
    fn set_balance(&mut self, account: Address, amount: U256) -> Result<(), StoreError>;

    /// Current total supply.
    fn total_supply(&mut self) -> Result<U256, StoreError>;

    /// Overwrites the total supply.
    fn set_total_supply(&mut self, amount: U256) -> Result<(), StoreError>;

    /// Allowance stored under `key`, zero when absent.
    fn allowance(&mut self, key: OwnerSpender) -> Result<U256, StoreError>;

    /// Overwrites the allowance stored under `key`.
    fn set_allowance(&mut self, key: OwnerSpender, amount: U256) -> Result<(), StoreError>;
}

/// In-memory ledger storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    balances: HashMap<Address, U256>,
    allowances: HashMap<OwnerSpender, U256>,
    total_supply: U256,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every balance record ever written.
    pub fn balances(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.balances.iter().map(|(account, amount)| (*account, *amount))
    }

    /// Every allowance record ever written.
    pub fn allowances(&self) -> impl Iterator<Item = (OwnerSpender, U256)> + '_ {
        self.allowances.iter().map(|(key, amount)| (*key, *amount))
    }

    /// Sum of all balance records, `None` if it leaves the 256-bit range.
    pub fn sum_of_balances(&self) -> Option<U256> {
        self.balances
            .values()
            .try_fold(U256::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    /// Total supply without going through the fallible trait.
    pub const fn supply(&self) -> U256 {
        self.total_supply
    }
}

impl LedgerStore for MemoryStore {
    fn balance(&mut self, account: Address) -> Result<U256, StoreError> {
        Ok(self.balances.get(&account).copied().unwrap_or_default())
    }

    fn set_balance(&mut self, account: Address, amount: U256) -> Result<(), StoreError> {
        self.balances.insert(account, amount);
        Ok(())
    }

    fn total_supply(&mut self) -> Result<U256, StoreError> {
        Ok(self.total_supply)
    }

    fn set_total_supply(&mut self, amount: U256) -> Result<(), StoreError> {
        self.total_supply = amount;
        Ok(())
    }

    fn allowance(&mut self, key: OwnerSpender) -> Result<U256, StoreError> {
        Ok(self.allowances.get(&key).copied().unwrap_or_default())
    }

    fn set_allowance(&mut self, key: OwnerSpender, amount: U256) -> Result<(), StoreError> {
        self.allowances.insert(key, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn absent_entries_read_as_zero() {
        let mut store = MemoryStore::new();
        let owner = address!("0x00000000000000000000000000000000000000a1");
        let spender = address!("0x00000000000000000000000000000000000000b1");

        assert_eq!(store.balance(owner).unwrap(), U256::ZERO);
        assert_eq!(store.total_supply().unwrap(), U256::ZERO);
        assert_eq!(
            store.allowance(OwnerSpender::new(owner, spender)).unwrap(),
            U256::ZERO
        );
        assert_eq!(store.balances().count(), 0, "reads must not create records");
    }

    #[test]
    fn zero_writes_persist_as_records() {
        let mut store = MemoryStore::new();
        let account = address!("0x00000000000000000000000000000000000000a2");

        store.set_balance(account, U256::from(5)).unwrap();
        store.set_balance(account, U256::ZERO).unwrap();

        let records: Vec<_> = store.balances().collect();
        assert_eq!(records, vec![(account, U256::ZERO)]);
    }

    #[test]
    fn allowance_keys_are_ordered_pairs() {
        let mut store = MemoryStore::new();
        let a = address!("0x00000000000000000000000000000000000000a3");
        let b = address!("0x00000000000000000000000000000000000000b3");

        store
            .set_allowance(OwnerSpender::new(a, b), U256::from(7))
            .unwrap();

        assert_eq!(store.allowance(OwnerSpender::new(a, b)).unwrap(), U256::from(7));
        assert_eq!(store.allowance(OwnerSpender::new(b, a)).unwrap(), U256::ZERO);
    }
}
