//! Ledger entry points and the calldata router.
//!
//! Each entry point is one atomic transition over host state: it validates its
//! inputs, performs every ledger check, writes, and emits its event. The sole
//! exception is [`Whbar::withdraw`], which hands control to the native payout
//! after committing its debit.

use crate::{
    abi::{IWHBAR, IWHBARCalls},
    allowances, balances,
    error::{ValidationError, WhbarError},
    events::{EventSink, WhbarEvent},
    executor::NativeTransfer,
    store::LedgerStore,
    units,
};
use alloy_primitives::{Address, Bytes, Selector, U256};
use alloy_sol_types::{SolCall, SolInterface, SolValue};
use serde::{Deserialize, Serialize};

/// Everything the ledger needs from the environment it runs in.
pub trait LedgerHost: LedgerStore + NativeTransfer + EventSink {}

impl<T: LedgerStore + NativeTransfer + EventSink + ?Sized> LedgerHost for T {}

/// Token name and symbol reported by the metadata getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenMetadata {
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "Wrapped HBAR".to_string(),
            symbol: "WHBAR".to_string(),
        }
    }
}

/// Caller and attached value of one entry-point invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Immediate caller.
    pub caller: Address,
    /// Attached native value, in fine units.
    pub value: U256,
}

impl CallContext {
    /// Context for a call without attached value.
    pub const fn new(caller: Address) -> Self {
        Self {
            caller,
            value: U256::ZERO,
        }
    }

    /// Context for a call carrying `value` fine units.
    pub const fn with_value(caller: Address, value: U256) -> Self {
        Self { caller, value }
    }
}

/// The wrapped native-currency ledger.
///
/// Holds no state of its own: balances, allowances and the total supply live in
/// the [`LedgerHost`] passed to each entry point, keyed under the ledger's
/// contract address.
#[derive(Debug, Clone)]
pub struct Whbar {
    contract: Address,
    metadata: TokenMetadata,
}

impl Whbar {
    /// Decimal places of every amount the ledger accepts or reports.
    pub const DECIMALS: u8 = units::COARSE_DECIMALS;

    /// Creates a ledger deployed at `contract`.
    pub const fn new(contract: Address, metadata: TokenMetadata) -> Self {
        Self { contract, metadata }
    }

    /// Address the ledger is deployed at.
    pub const fn contract(&self) -> Address {
        self.contract
    }

    /// Token metadata.
    pub const fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Token name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Token symbol.
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Decimal places of ledger amounts.
    pub const fn decimals(&self) -> u8 {
        Self::DECIMALS
    }

    // === Reads ===

    /// Coarse balance of `account`.
    pub fn balance_of<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        account: Address,
    ) -> Result<U256, WhbarError> {
        Ok(balances::balance_of(host, account)?)
    }

    /// Sum of all coarse balances.
    pub fn total_supply<H: LedgerHost + ?Sized>(&self, host: &mut H) -> Result<U256, WhbarError> {
        Ok(balances::total_supply(host)?)
    }

    /// Amount `spender` may move out of `owner`'s balance.
    pub fn allowance<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        owner: Address,
        spender: Address,
    ) -> Result<U256, WhbarError> {
        Ok(allowances::allowance(host, owner, spender)?)
    }

    // === Entry points ===

    /// Wraps `value` fine units for `caller`.
    ///
    /// The host must already hold `value` in the ledger's reserve. Only
    /// `to_coarse(value)` is credited; the remainder stays in the reserve.
    /// Returns the credited coarse amount.
    pub fn deposit<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        caller: Address,
        value: U256,
    ) -> Result<U256, WhbarError> {
        let amount = units::to_coarse(value);
        balances::credit(host, caller, amount)?;
        host.emit(WhbarEvent::Deposit {
            dst: caller,
            wad: amount,
        })?;

        tracing::info!(
            target: "whbar::ledger",
            ?caller,
            %value,
            %amount,
            dust = %units::dust(value),
            "deposit"
        );
        Ok(amount)
    }

    /// Unwraps `amount` coarse units and pays `to_fine(amount)` to `caller`.
    ///
    /// The debit is committed before the payout, so a re-entrant call from the
    /// payee sees the reduced balance. If the payee refuses the payout this
    /// returns [`WhbarError::SendFailed`] and the debit is **not** undone.
    pub fn withdraw<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        caller: Address,
        amount: U256,
    ) -> Result<(), WhbarError> {
        let payout = units::to_fine(amount)?;
        balances::debit(host, caller, amount)?;

        if !host.send_native(caller, payout)? {
            tracing::warn!(
                target: "whbar::ledger",
                ?caller,
                %amount,
                %payout,
                "native payout refused, debit stands"
            );
            return Err(WhbarError::SendFailed {
                destination: caller,
                amount: payout,
                debited: amount,
            });
        }

        host.emit(WhbarEvent::Withdrawal {
            src: caller,
            wad: amount,
        })?;
        tracing::info!(target: "whbar::ledger", ?caller, %amount, %payout, "withdrawal");
        Ok(())
    }

    /// Moves `amount` from `caller` to `to`.
    pub fn transfer<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, WhbarError> {
        self.ensure_not_contract(to)?;
        balances::move_balance(host, caller, to, amount)?;
        host.emit(WhbarEvent::Transfer {
            src: caller,
            dst: to,
            wad: amount,
        })?;

        tracing::info!(target: "whbar::ledger", from = ?caller, ?to, %amount, "transfer");
        Ok(true)
    }

    /// Sets the amount `spender` may move out of `caller`'s balance.
    pub fn approve<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<bool, WhbarError> {
        allowances::set_allowance(host, caller, spender, amount)?;
        host.emit(WhbarEvent::Approval {
            src: caller,
            guy: spender,
            wad: amount,
        })?;

        tracing::info!(target: "whbar::ledger", owner = ?caller, ?spender, %amount, "approval");
        Ok(true)
    }

    /// Moves `amount` from `from` to `to`, spending `caller`'s allowance.
    ///
    /// The allowance is consulted even when `caller == from`.
    pub fn transfer_from<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, WhbarError> {
        self.ensure_not_contract(to)?;

        // Both preconditions are checked before either write.
        let available = allowances::allowance(host, from, caller)?;
        if available < amount {
            return Err(WhbarError::InsufficientAllowance {
                owner: from,
                spender: caller,
                available,
                required: amount,
            });
        }
        let balance = balances::balance_of(host, from)?;
        if balance < amount {
            return Err(WhbarError::InsufficientFunds {
                account: from,
                available: balance,
                required: amount,
            });
        }

        allowances::spend_allowance(host, from, caller, amount)?;
        balances::move_balance(host, from, to, amount)?;
        host.emit(WhbarEvent::Transfer {
            src: from,
            dst: to,
            wad: amount,
        })?;

        tracing::info!(
            target: "whbar::ledger",
            spender = ?caller,
            ?from,
            ?to,
            %amount,
            "transfer from"
        );
        Ok(true)
    }

    fn ensure_not_contract(&self, recipient: Address) -> Result<(), WhbarError> {
        if recipient == self.contract {
            tracing::warn!(target: "whbar::ledger", ?recipient, "transfer to ledger contract rejected");
            return Err(WhbarError::ContractRecipient { recipient });
        }
        Ok(())
    }

    // === Router ===

    /// Decodes `calldata` and runs the matching entry point.
    ///
    /// Calldata that names no entry point is routed to [`Self::deposit`] when
    /// value is attached, and rejected otherwise. Value attached to any entry
    /// point other than `deposit` is rejected. Returns the ABI-encoded result.
    pub fn dispatch<H: LedgerHost + ?Sized>(
        &self,
        host: &mut H,
        ctx: CallContext,
        calldata: &[u8],
    ) -> Result<Bytes, WhbarError> {
        let Some(call) = Self::decode(calldata)? else {
            if ctx.value.is_zero() {
                return Err(ValidationError::UnknownSelector.into());
            }
            tracing::debug!(
                target: "whbar::ledger",
                caller = ?ctx.caller,
                calldata_len = calldata.len(),
                "no entry point matched, routing value to deposit"
            );
            self.deposit(host, ctx.caller, ctx.value)?;
            return Ok(Bytes::new());
        };

        if !ctx.value.is_zero() && !matches!(call, IWHBARCalls::deposit(_)) {
            return Err(ValidationError::NonPayable {
                selector: Selector::from(call.selector()),
            }
            .into());
        }

        let output = match call {
            IWHBARCalls::name(_) => self.metadata.name.abi_encode(),
            IWHBARCalls::symbol(_) => self.metadata.symbol.abi_encode(),
            IWHBARCalls::decimals(_) => IWHBAR::decimalsCall::abi_encode_returns(&Self::DECIMALS),
            IWHBARCalls::totalSupply(_) => self.total_supply(host)?.abi_encode(),
            IWHBARCalls::balanceOf(call) => self.balance_of(host, call.account)?.abi_encode(),
            IWHBARCalls::allowance(call) => {
                self.allowance(host, call.owner, call.spender)?.abi_encode()
            }
            IWHBARCalls::deposit(_) => {
                self.deposit(host, ctx.caller, ctx.value)?;
                Vec::new()
            }
            IWHBARCalls::withdraw(call) => {
                self.withdraw(host, ctx.caller, call.amount)?;
                Vec::new()
            }
            IWHBARCalls::transfer(call) => self
                .transfer(host, ctx.caller, call.to, call.amount)?
                .abi_encode(),
            IWHBARCalls::approve(call) => self
                .approve(host, ctx.caller, call.spender, call.amount)?
                .abi_encode(),
            IWHBARCalls::transferFrom(call) => self
                .transfer_from(host, ctx.caller, call.from, call.to, call.amount)?
                .abi_encode(),
        };
        Ok(output.into())
    }

    /// Matches `calldata` against the entry points.
    ///
    /// `Ok(None)` means no selector matched. A matching selector with
    /// undecodable arguments is a validation error, never a deposit.
    fn decode(calldata: &[u8]) -> Result<Option<IWHBARCalls>, ValidationError> {
        let Some(selector) = calldata.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) else {
            return Ok(None);
        };
        if !IWHBARCalls::valid_selector(selector) {
            return Ok(None);
        }
        IWHBARCalls::abi_decode(calldata)
            .map(Some)
            .map_err(|err| ValidationError::MalformedCall {
                selector: Selector::from(selector),
                reason: err.to_string(),
            })
    }
}

/// Calldata for `deposit()`.
pub fn deposit_calldata() -> Bytes {
    IWHBAR::depositCall {}.abi_encode().into()
}
