//! Balance ledger: per-account coarse balances and the total supply counter.
//!
//! `total_supply == Σ balances` holds after every function here returns,
//! whether it succeeded or not. Each function reads and checks everything it
//! needs before its first write.

use crate::{
    error::{StoreError, WhbarError},
    store::LedgerStore,
};
use alloy_primitives::{Address, U256};

/// Balance of `account`.
pub fn balance_of<S: LedgerStore + ?Sized>(
    store: &mut S,
    account: Address,
) -> Result<U256, StoreError> {
    store.balance(account)
}

/// Aggregate of all balances.
pub fn total_supply<S: LedgerStore + ?Sized>(store: &mut S) -> Result<U256, StoreError> {
    store.total_supply()
}

/// Increases `account` and the total supply by `amount`.
pub fn credit<S: LedgerStore + ?Sized>(
    store: &mut S,
    account: Address,
    amount: U256,
) -> Result<(), WhbarError> {
    let balance = store.balance(account)?;
    let new_balance = balance
        .checked_add(amount)
        .ok_or(WhbarError::BalanceOverflow { account })?;
    let new_supply = store
        .total_supply()?
        .checked_add(amount)
        .ok_or(WhbarError::SupplyOverflow)?;

    store.set_balance(account, new_balance)?;
    store.set_total_supply(new_supply)?;
    Ok(())
}

/// Decreases `account` and the total supply by `amount`.
pub fn debit<S: LedgerStore + ?Sized>(
    store: &mut S,
    account: Address,
    amount: U256,
) -> Result<(), WhbarError> {
    let balance = store.balance(account)?;
    let new_balance = balance
        .checked_sub(amount)
        .ok_or(WhbarError::InsufficientFunds {
            account,
            available: balance,
            required: amount,
        })?;
    // Supply covers every balance, so this only fails on corrupted storage.
    let new_supply = store
        .total_supply()?
        .checked_sub(amount)
        .ok_or_else(|| StoreError("total supply below debited balance".to_string()))?;

    store.set_balance(account, new_balance)?;
    store.set_total_supply(new_supply)?;
    Ok(())
}

/// Moves `amount` from `from` to `to`, leaving the total supply unchanged.
///
/// A self move still requires `from` to hold `amount` but writes nothing.
pub fn move_balance<S: LedgerStore + ?Sized>(
    store: &mut S,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), WhbarError> {
    let from_balance = store.balance(from)?;
    let remaining = from_balance
        .checked_sub(amount)
        .ok_or(WhbarError::InsufficientFunds {
            account: from,
            available: from_balance,
            required: amount,
        })?;

    if from == to {
        return Ok(());
    }

    let to_balance = store
        .balance(to)?
        .checked_add(amount)
        .ok_or(WhbarError::BalanceOverflow { account: to })?;

    store.set_balance(from, remaining)?;
    store.set_balance(to, to_balance)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use alloy_primitives::address;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
    const BOB: Address = address!("0x00000000000000000000000000000000000000b1");

    fn funded(amount: u64) -> MemoryStore {
        let mut store = MemoryStore::new();
        credit(&mut store, ALICE, U256::from(amount)).expect("credit succeeds");
        store
    }

    #[test]
    fn credit_increases_balance_and_supply() {
        let mut store = funded(100);
        credit(&mut store, BOB, U256::from(50)).expect("credit succeeds");

        assert_eq!(balance_of(&mut store, ALICE).unwrap(), U256::from(100));
        assert_eq!(balance_of(&mut store, BOB).unwrap(), U256::from(50));
        assert_eq!(total_supply(&mut store).unwrap(), U256::from(150));
    }

    #[test]
    fn credit_overflow_writes_nothing() {
        let mut store = MemoryStore::new();
        credit(&mut store, ALICE, U256::MAX).expect("first credit fits");

        let err = credit(&mut store, BOB, U256::from(1)).unwrap_err();
        assert_eq!(err, WhbarError::SupplyOverflow);

        let err = credit(&mut store, ALICE, U256::from(1)).unwrap_err();
        assert_eq!(err, WhbarError::BalanceOverflow { account: ALICE });

        assert_eq!(balance_of(&mut store, BOB).unwrap(), U256::ZERO);
        assert_eq!(total_supply(&mut store).unwrap(), U256::MAX);
    }

    #[test]
    fn debit_decreases_balance_and_supply() {
        let mut store = funded(100);
        debit(&mut store, ALICE, U256::from(40)).expect("debit succeeds");

        assert_eq!(balance_of(&mut store, ALICE).unwrap(), U256::from(60));
        assert_eq!(total_supply(&mut store).unwrap(), U256::from(60));
    }

    #[test]
    fn debit_beyond_balance_is_rejected_without_mutation() {
        let mut store = funded(100);
        let before = store.clone();

        let err = debit(&mut store, ALICE, U256::from(101)).unwrap_err();
        assert_eq!(
            err,
            WhbarError::InsufficientFunds {
                account: ALICE,
                available: U256::from(100),
                required: U256::from(101),
            }
        );
        assert_eq!(store, before);
    }

    #[test]
    fn move_conserves_supply() {
        let mut store = funded(100);
        move_balance(&mut store, ALICE, BOB, U256::from(30)).expect("move succeeds");

        assert_eq!(balance_of(&mut store, ALICE).unwrap(), U256::from(70));
        assert_eq!(balance_of(&mut store, BOB).unwrap(), U256::from(30));
        assert_eq!(total_supply(&mut store).unwrap(), U256::from(100));
        assert_eq!(store.sum_of_balances(), Some(U256::from(100)));
    }

    #[test]
    fn self_move_is_noop_but_checks_funds() {
        let mut store = funded(100);
        let before = store.clone();

        move_balance(&mut store, ALICE, ALICE, U256::from(100)).expect("self move succeeds");
        assert_eq!(store, before);

        let err = move_balance(&mut store, ALICE, ALICE, U256::from(101)).unwrap_err();
        assert!(matches!(err, WhbarError::InsufficientFunds { .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn move_beyond_balance_is_rejected_without_mutation() {
        let mut store = funded(10);
        let before = store.clone();

        let err = move_balance(&mut store, ALICE, BOB, U256::from(11)).unwrap_err();
        assert!(matches!(err, WhbarError::InsufficientFunds { account, .. } if account == ALICE));
        assert_eq!(store, before);
    }
}
