//! # WHBAR Ledger
//!
//! Wrapped native-currency ledger. Native value enters the ledger through
//! `deposit`, is accounted in a coarser unit than the one used at the calling
//! boundary, and leaves through `withdraw`. In between, balances move with the
//! usual ERC-20 surface (`transfer`, `approve`, `transferFrom`).
//!
//! ## Units
//!
//! | Unit | Decimals | Used for |
//! |------|----------|----------|
//! | fine | 18 | attached call value, native payouts |
//! | coarse | 8 | balances, allowances, total supply, events |
//!
//! One coarse unit is [`units::COEF`] (10^10) fine units. Deposits truncate,
//! so the reserve held by the contract can exceed `toFine(totalSupply)`; it can
//! never fall below it.
//!
//! ## Components
//!
//! - [`units`]: fine/coarse conversion
//! - [`balances`]: account balances and the total supply counter
//! - [`allowances`]: `(owner, spender)` approvals
//! - [`executor`]: the native payout boundary
//! - [`ledger`]: entry points and the calldata router
//! - [`runtime`]: single-threaded in-process execution context
//!
//! All ledger state lives behind [`store::LedgerStore`], so the same entry
//! points run against the in-memory [`store::MemoryStore`] or against EVM
//! account storage.
//!
//! ## Failure semantics
//!
//! Every error leaves the ledger untouched, with one exception: a `withdraw`
//! whose native payout is refused reports [`WhbarError::SendFailed`] *after*
//! the debit has been committed. The caller's wrapped balance is consumed.
//! Callers that need a refund must handle it themselves.

pub mod abi;
pub mod allowances;
pub mod balances;
pub mod error;
pub mod events;
pub mod executor;
pub mod ledger;
pub mod runtime;
pub mod store;
pub mod units;

pub use error::{ErrorKind, InvariantViolation, StoreError, ValidationError, WhbarError};
pub use events::{EventSink, WhbarEvent};
pub use executor::NativeTransfer;
pub use ledger::{CallContext, LedgerHost, TokenMetadata, Whbar};
pub use runtime::{AllowanceRecord, CallError, LedgerSnapshot, Receiver, Runtime};
pub use store::{LedgerStore, MemoryStore, OwnerSpender};
