//! Allowance store: how much a spender may move out of an owner's balance.

use crate::{
    error::{StoreError, WhbarError},
    store::{LedgerStore, OwnerSpender},
};
use alloy_primitives::{Address, U256};

/// Amount `spender` may currently move out of `owner`'s balance.
pub fn allowance<S: LedgerStore + ?Sized>(
    store: &mut S,
    owner: Address,
    spender: Address,
) -> Result<U256, StoreError> {
    store.allowance(OwnerSpender::new(owner, spender))
}

/// Overwrites the allowance. `U256::MAX` gets no special treatment.
pub fn set_allowance<S: LedgerStore + ?Sized>(
    store: &mut S,
    owner: Address,
    spender: Address,
    amount: U256,
) -> Result<(), StoreError> {
    store.set_allowance(OwnerSpender::new(owner, spender), amount)
}

/// Consumes `amount` of the allowance.
pub fn spend_allowance<S: LedgerStore + ?Sized>(
    store: &mut S,
    owner: Address,
    spender: Address,
    amount: U256,
) -> Result<(), WhbarError> {
    let key = OwnerSpender::new(owner, spender);
    let available = store.allowance(key)?;
    let remaining = available
        .checked_sub(amount)
        .ok_or(WhbarError::InsufficientAllowance {
            owner,
            spender,
            available,
            required: amount,
        })?;
    store.set_allowance(key, remaining)?;
    Ok(())
}
