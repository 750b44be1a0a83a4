//! # WHBAR Precompile
//!
//! Runs the [`whbar_ledger`] ledger as a stateful EVM precompile, so the wrapped
//! token is available at a fixed address without deploying bytecode.
//!
//! | Address | Name | Description |
//! |---------|------|-------------|
//! | `0xF200` | [`precompile`] | Wrapped native token (deposit/withdraw/ERC-20) |
//!
//! ## Architecture
//!
//! 1. **Routing**: calldata is decoded and dispatched by [`whbar_ledger::Whbar::dispatch`]
//! 2. **State**: balances, allowances and the total supply live in the storage
//!    of the precompile account ([`storage`])
//! 3. **Reserve**: native value attached to a call is already credited to the
//!    precompile account by the EVM; payouts move it back out
//! 4. **Logs**: ledger events are emitted as regular EVM logs of the precompile
//!
//! ## Integration
//!
//! The precompile is registered through [`install::WhbarEvmFactory`], which wraps
//! `EthEvmFactory` and installs the precompile into every EVM it creates once
//! the configured activation height is reached.
//!
//! ```ignore
//! use whbar_precompile::{config::WhbarConfig, install::WhbarEvmFactory};
//!
//! let factory = WhbarEvmFactory::new(EthEvmFactory::default(), Some(WhbarConfig::default()));
//! ```

pub mod config;
pub mod install;
pub mod precompile;
pub mod storage;

pub use config::{ConfigError, WhbarConfig};
pub use install::WhbarEvmFactory;
pub use precompile::{WhbarPrecompile, WHBAR_PRECOMPILE_ADDR};
