//! Single-threaded in-process execution context.
//!
//! [`Runtime`] models just enough of a chain to run the ledger with real
//! call-frame semantics: native balances, accounts with receive hooks, and a
//! call stack in which every frame is rolled back on failure. Native payouts
//! from the ledger run the destination's hook in a nested frame, so hooks can
//! re-enter any entry point.

use crate::{
    error::{InvariantViolation, StoreError, WhbarError},
    events::{EventSink, WhbarEvent},
    executor::NativeTransfer,
    ledger::{CallContext, Whbar},
    store::{LedgerStore, MemoryStore, OwnerSpender},
    units,
};
use alloy_primitives::{Address, Bytes, Log, U256};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
};
use thiserror::Error;

/// Deepest call stack a [`Runtime`] will build.
pub const MAX_CALL_DEPTH: usize = 64;

/// Code run when an account receives a plain value transfer.
pub trait Receiver {
    /// Invoked with the frame already credited with `value`.
    ///
    /// `this` is the receiving account. Returning an error rolls back the
    /// frame, including the value transfer and anything the hook did through
    /// `runtime`.
    fn on_receive(
        &self,
        runtime: &mut Runtime,
        this: Address,
        sender: Address,
        value: U256,
    ) -> Result<(), CallError>;
}

impl<F> Receiver for F
where
    F: Fn(&mut Runtime, Address, Address, U256) -> Result<(), CallError>,
{
    fn on_receive(
        &self,
        runtime: &mut Runtime,
        this: Address,
        sender: Address,
        value: U256,
    ) -> Result<(), CallError> {
        self(runtime, this, sender, value)
    }
}

/// Failure of a [`Runtime::call`] frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The caller cannot cover the attached value.
    #[error("{account} holds {available} native, needs {required}")]
    InsufficientValue {
        /// Paying account.
        account: Address,
        /// Its native balance.
        available: U256,
        /// Attached value.
        required: U256,
    },
    /// The ledger rejected the call.
    #[error(transparent)]
    Ledger(#[from] WhbarError),
    /// The target's code refused the call.
    #[error("{account} rejected the call: {reason}")]
    Rejected {
        /// Refusing account.
        account: Address,
        /// Reason given.
        reason: String,
    },
    /// The call stack is full.
    #[error("call depth {depth} exceeded")]
    DepthExceeded {
        /// Depth at which the call was attempted.
        depth: usize,
    },
}

impl CallError {
    /// Whether state written by the failed frame was kept.
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Ledger(err) if err.is_committed())
    }
}

#[derive(Clone)]
enum Code {
    /// Rejects any value sent to it.
    NonPayable,
    /// Runs a receive hook.
    Hook(Rc<dyn Receiver>),
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPayable => f.write_str("NonPayable"),
            Self::Hook(_) => f.write_str("Hook"),
        }
    }
}

/// Everything a frame rollback restores.
#[derive(Debug, Clone, Default)]
struct WorldState {
    native: HashMap<Address, U256>,
    ledger: MemoryStore,
    events: Vec<WhbarEvent>,
}

/// Serializable view of ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// Every balance record, including zeros.
    pub balances: BTreeMap<Address, U256>,
    /// Every allowance record, including zeros.
    pub allowances: Vec<AllowanceRecord>,
    /// Total supply counter.
    pub total_supply: U256,
    /// Native balance held by the ledger contract.
    pub reserve: U256,
}

/// One `(owner, spender)` allowance in a [`LedgerSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllowanceRecord {
    /// Owner of the balance.
    pub owner: Address,
    /// Spender.
    pub spender: Address,
    /// Remaining allowance.
    pub amount: U256,
}

/// In-process chain hosting one ledger.
#[derive(Debug)]
pub struct Runtime {
    whbar: Rc<Whbar>,
    world: WorldState,
    code: HashMap<Address, Code>,
    depth: usize,
}

impl Runtime {
    /// Creates a runtime with the ledger deployed and no funded accounts.
    pub fn new(whbar: Whbar) -> Self {
        Self {
            whbar: Rc::new(whbar),
            world: WorldState::default(),
            code: HashMap::new(),
            depth: 0,
        }
    }

    /// The hosted ledger.
    pub fn whbar(&self) -> &Whbar {
        &self.whbar
    }

    /// Address of the hosted ledger.
    pub fn contract(&self) -> Address {
        self.whbar.contract()
    }

    /// Adds `amount` native units to `account` out of thin air.
    pub fn fund(&mut self, account: Address, amount: U256) {
        let balance = self.world.native.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Native balance of `account`.
    pub fn native_balance(&self, account: Address) -> U256 {
        self.world.native.get(&account).copied().unwrap_or_default()
    }

    /// Installs a receive hook at `account`.
    pub fn deploy_contract(&mut self, account: Address, receiver: Rc<dyn Receiver>) {
        self.code.insert(account, Code::Hook(receiver));
    }

    /// Installs code at `account` that refuses every value transfer.
    pub fn deploy_non_payable(&mut self, account: Address) {
        self.code.insert(account, Code::NonPayable);
    }

    /// Current call depth; zero outside any call.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Runs one call frame from `caller` to `target` carrying `value`.
    ///
    /// The frame is rolled back on error, unless it is a ledger frame that
    /// failed after committing state ([`CallError::is_committed`]). A hook
    /// frame passing such an error up is rolled back like any other.
    pub fn call(
        &mut self,
        caller: Address,
        target: Address,
        value: U256,
        calldata: &[u8],
    ) -> Result<Bytes, CallError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(CallError::DepthExceeded { depth: self.depth });
        }

        let checkpoint = self.world.clone();
        self.depth += 1;
        let result = self.execute(caller, target, value, calldata);
        self.depth -= 1;

        match &result {
            Ok(_) => {}
            Err(err) if target == self.whbar.contract() && err.is_committed() => {
                tracing::debug!(target: "whbar::runtime", ?caller, ?target, %err, "frame failed, state kept");
            }
            Err(err) => {
                tracing::debug!(target: "whbar::runtime", ?caller, ?target, %err, "frame reverted");
                self.world = checkpoint;
            }
        }
        result
    }

    fn execute(
        &mut self,
        caller: Address,
        target: Address,
        value: U256,
        calldata: &[u8],
    ) -> Result<Bytes, CallError> {
        self.move_native(caller, target, value)?;

        if target == self.whbar.contract() {
            let whbar = Rc::clone(&self.whbar);
            let ctx = CallContext::with_value(caller, value);
            return Ok(whbar.dispatch(self, ctx, calldata)?);
        }

        match self.code.get(&target).cloned() {
            None => Ok(Bytes::new()),
            Some(Code::NonPayable) if value.is_zero() => Ok(Bytes::new()),
            Some(Code::NonPayable) => Err(CallError::Rejected {
                account: target,
                reason: "not payable".to_string(),
            }),
            Some(Code::Hook(receiver)) => {
                receiver.on_receive(self, target, caller, value)?;
                Ok(Bytes::new())
            }
        }
    }

    fn move_native(&mut self, from: Address, to: Address, value: U256) -> Result<(), CallError> {
        let available = self.native_balance(from);
        let remaining = available
            .checked_sub(value)
            .ok_or(CallError::InsufficientValue {
                account: from,
                available,
                required: value,
            })?;
        if value.is_zero() || from == to {
            return Ok(());
        }

        self.world.native.insert(from, remaining);
        let credited = self.native_balance(to).saturating_add(value);
        self.world.native.insert(to, credited);
        Ok(())
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[WhbarEvent] {
        &self.world.events
    }

    /// Events emitted so far as EVM logs of the ledger contract.
    pub fn logs(&self) -> Vec<Log> {
        let contract = self.whbar.contract();
        self.world
            .events
            .iter()
            .map(|event| event.into_log(contract))
            .collect()
    }

    /// Checks supply conservation and reserve coverage.
    pub fn audit(&self) -> Result<(), InvariantViolation> {
        let total_supply = self.world.ledger.supply();
        let sum = self.world.ledger.sum_of_balances().unwrap_or(U256::MAX);
        if sum != total_supply {
            return Err(InvariantViolation::SupplyMismatch { total_supply, sum });
        }

        let reserve = self.native_balance(self.whbar.contract());
        let required = units::to_fine(total_supply).unwrap_or(U256::MAX);
        if reserve < required {
            return Err(InvariantViolation::ReserveShortfall { reserve, required });
        }
        Ok(())
    }

    /// Serializable copy of the ledger state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut allowances: Vec<_> = self
            .world
            .ledger
            .allowances()
            .map(|(key, amount)| AllowanceRecord {
                owner: key.owner,
                spender: key.spender,
                amount,
            })
            .collect();
        allowances.sort();

        LedgerSnapshot {
            balances: self.world.ledger.balances().collect(),
            allowances,
            total_supply: self.world.ledger.supply(),
            reserve: self.native_balance(self.whbar.contract()),
        }
    }
}

impl LedgerStore for Runtime {
    fn balance(&mut self, account: Address) -> Result<U256, StoreError> {
        self.world.ledger.balance(account)
    }

    fn set_balance(&mut self, account: Address, amount: U256) -> Result<(), StoreError> {
        self.world.ledger.set_balance(account, amount)
    }

    fn total_supply(&mut self) -> Result<U256, StoreError> {
        self.world.ledger.total_supply()
    }

    fn set_total_supply(&mut self, amount: U256) -> Result<(), StoreError> {
        self.world.ledger.set_total_supply(amount)
    }

    fn allowance(&mut self, key: OwnerSpender) -> Result<U256, StoreError> {
        self.world.ledger.allowance(key)
    }

    fn set_allowance(&mut self, key: OwnerSpender, amount: U256) -> Result<(), StoreError> {
        self.world.ledger.set_allowance(key, amount)
    }
}

impl NativeTransfer for Runtime {
    fn send_native(&mut self, destination: Address, amount: U256) -> Result<bool, StoreError> {
        let contract = self.whbar.contract();
        match self.call(contract, destination, amount, &[]) {
            Ok(_) => Ok(true),
            Err(CallError::Ledger(WhbarError::Store(err))) => Err(err),
            Err(err) => {
                tracing::debug!(target: "whbar::runtime", ?destination, %amount, %err, "payout refused");
                Ok(false)
            }
        }
    }

    fn reserve(&mut self) -> Result<U256, StoreError> {
        Ok(self.native_balance(self.whbar.contract()))
    }
}

impl EventSink for Runtime {
    fn emit(&mut self, event: WhbarEvent) -> Result<(), StoreError> {
        self.world.events.push(event);
        Ok(())
    }
}
