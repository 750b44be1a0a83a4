//! Helpers for installing the WHBAR precompile into Reth EVM factories.

use crate::{config::WhbarConfig, precompile::WhbarPrecompile};
use alloy_evm::{
    eth::{EthEvm, EthEvmContext, EthEvmFactory},
    precompiles::{DynPrecompile, Precompile, PrecompilesMap},
    Database, Evm, EvmEnv, EvmFactory,
};
use revm::{
    context::{
        result::{EVMError, HaltReason},
        BlockEnv, TxEnv,
    },
    context_interface::result::InvalidTransaction,
    inspector::NoOpInspector,
    primitives::hardfork::SpecId,
    Inspector,
};
use std::sync::Arc;

/// Registers `whbar` in `precompiles` at its configured address.
pub fn install_whbar_precompile(precompiles: &mut PrecompilesMap, whbar: Arc<WhbarPrecompile>) {
    let address = whbar.address();
    let precompile = DynPrecompile::new_stateful(WhbarPrecompile::id().clone(), move |input| {
        whbar.call(input)
    });

    precompiles.apply_precompile(&address, |_| Some(precompile));
    tracing::debug!(target: "whbar::precompile", ?address, "installed WHBAR precompile");
}

/// Wrapper around an existing `EvmFactory` that installs the WHBAR precompile.
#[derive(Debug, Clone)]
pub struct WhbarEvmFactory<F> {
    inner: F,
    config: Option<WhbarConfig>,
    precompile: Option<Arc<WhbarPrecompile>>,
}

impl<F> WhbarEvmFactory<F> {
    /// Creates a new factory wrapper. `None` disables the precompile.
    pub fn new(inner: F, config: Option<WhbarConfig>) -> Self {
        let precompile = config
            .as_ref()
            .map(|config| Arc::new(WhbarPrecompile::from_config(config)));
        Self {
            inner,
            config,
            precompile,
        }
    }

    /// The wrapped factory.
    pub const fn inner(&self) -> &F {
        &self.inner
    }

    /// Active configuration, if the precompile is enabled.
    pub const fn config(&self) -> Option<&WhbarConfig> {
        self.config.as_ref()
    }

    fn install(&self, precompiles: &mut PrecompilesMap, block_number: u64) {
        let (Some(config), Some(precompile)) = (&self.config, &self.precompile) else {
            return;
        };
        if !config.is_active_at(block_number) {
            tracing::trace!(
                target: "whbar::precompile",
                block_number,
                activation = ?config.activation_height,
                "WHBAR precompile not active yet"
            );
            return;
        }
        install_whbar_precompile(precompiles, Arc::clone(precompile));
    }
}

impl EvmFactory for WhbarEvmFactory<EthEvmFactory> {
    type Evm<DB: Database, I: Inspector<Self::Context<DB>>> = EthEvm<DB, I, PrecompilesMap>;
    type Context<DB: Database> = EthEvmContext<DB>;
    type Tx = TxEnv;
    type Error<DBError: std::error::Error + Send + Sync + 'static> =
        EVMError<DBError, InvalidTransaction>;
    type HaltReason = HaltReason;
    type Spec = SpecId;
    type BlockEnv = BlockEnv;
    type Precompiles = PrecompilesMap;

    fn create_evm<DB: Database>(
        &self,
        db: DB,
        evm_env: EvmEnv<Self::Spec, Self::BlockEnv>,
    ) -> Self::Evm<DB, NoOpInspector> {
        let block_number = evm_env.block_env.number.saturating_to::<u64>();
        let mut evm = self.inner.create_evm(db, evm_env);
        self.install(evm.precompiles_mut(), block_number);
        evm
    }

    fn create_evm_with_inspector<DB: Database, I: Inspector<Self::Context<DB>>>(
        &self,
        db: DB,
        input: EvmEnv<Self::Spec, Self::BlockEnv>,
        inspector: I,
    ) -> Self::Evm<DB, I> {
        let block_number = input.block_env.number.saturating_to::<u64>();
        let mut evm = self.inner.create_evm_with_inspector(db, input, inspector);
        self.install(evm.precompiles_mut(), block_number);
        evm
    }
}
