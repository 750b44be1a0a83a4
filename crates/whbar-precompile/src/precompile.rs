//! WHBAR precompile
//!
//! Exposes the [`whbar_ledger::abi::IWHBAR`] interface at a fixed address.
//! Calldata routing, unit conversion and every ledger rule come from
//! [`Whbar`]; this module only binds them to the EVM journal.
//!
//! ## Reserve
//!
//! Value attached to a call is moved into the precompile account by the EVM
//! before [`Precompile::call`] runs, so a deposit only has to credit the ledger.
//! Withdrawals pay out of the same account without running recipient code.
//!
//! ## Failures
//!
//! Any ledger error is returned as [`PrecompileError::Other`] carrying the error
//! message, and the EVM reverts the call frame with everything the ledger wrote
//! in it. A payout can only be refused here when the reserve is short, which
//! the ledger never allows to happen through its own entry points.

use crate::{config::WhbarConfig, storage::EvmLedgerHost};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileError, PrecompileId, PrecompileResult},
};
use alloy_primitives::{address, Address};
use revm::precompile::PrecompileOutput;
use std::sync::OnceLock;
use whbar_ledger::{CallContext, TokenMetadata, Whbar, WhbarError};

/// Default address of the WHBAR precompile.
pub const WHBAR_PRECOMPILE_ADDR: Address = address!("0x000000000000000000000000000000000000F200");

/// The wrapped native token as a stateful precompile.
#[derive(Clone, Debug)]
pub struct WhbarPrecompile {
    whbar: Whbar,
}

impl WhbarPrecompile {
    /// Lazily-initialized precompile ID, since `PrecompileId::custom` is not const.
    pub fn id() -> &'static PrecompileId {
        static ID: OnceLock<PrecompileId> = OnceLock::new();
        ID.get_or_init(|| PrecompileId::custom("whbar"))
    }

    /// Creates the precompile at `address` with the given token metadata.
    pub const fn new(address: Address, metadata: TokenMetadata) -> Self {
        Self {
            whbar: Whbar::new(address, metadata),
        }
    }

    /// Creates the precompile described by `config`.
    pub fn from_config(config: &WhbarConfig) -> Self {
        Self::new(config.precompile_address, config.metadata.clone())
    }

    /// Address the precompile keeps its state under.
    pub const fn address(&self) -> Address {
        self.whbar.contract()
    }

    /// The hosted ledger.
    pub const fn ledger(&self) -> &Whbar {
        &self.whbar
    }

    fn map_ledger_error(err: WhbarError) -> PrecompileError {
        PrecompileError::Other(err.to_string().into())
    }
}

impl Default for WhbarPrecompile {
    fn default() -> Self {
        Self::new(WHBAR_PRECOMPILE_ADDR, TokenMetadata::default())
    }
}

impl Precompile for WhbarPrecompile {
    fn precompile_id(&self) -> &PrecompileId {
        Self::id()
    }

    fn call(&self, mut input: PrecompileInput<'_>) -> PrecompileResult {
        let ctx = CallContext::with_value(input.caller, input.value);
        let data = input.data;

        tracing::debug!(
            target: "whbar::precompile",
            caller = ?ctx.caller,
            value = %ctx.value,
            gas = input.gas,
            calldata_len = data.len(),
            "precompile call invoked"
        );

        let mut host = EvmLedgerHost::new(input.internals_mut(), self.whbar.contract());
        host.ensure_created()
            .map_err(|err| Self::map_ledger_error(err.into()))?;

        match self.whbar.dispatch(&mut host, ctx, data) {
            Ok(output) => Ok(PrecompileOutput::new(0, output)),
            Err(err) => {
                tracing::debug!(
                    target: "whbar::precompile",
                    caller = ?ctx.caller,
                    kind = ?err.kind(),
                    %err,
                    "precompile call rejected"
                );
                Err(Self::map_ledger_error(err))
            }
        }
    }

    fn is_pure(&self) -> bool {
        false
    }
}
