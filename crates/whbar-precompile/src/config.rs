use crate::precompile::WHBAR_PRECOMPILE_ADDR;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use whbar_ledger::TokenMetadata;

/// Key of the WHBAR section in the genesis config extras.
pub const GENESIS_EXTRAS_KEY: &str = "whbar";

/// Configuration for the WHBAR precompile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhbarConfig {
    /// Address the precompile is installed at.
    #[serde(default = "default_precompile_address", rename = "precompileAddress")]
    pub precompile_address: Address,
    /// Token name and symbol.
    #[serde(flatten)]
    pub metadata: TokenMetadata,
    /// First block at which the precompile is installed. `None` means genesis.
    #[serde(default, rename = "activationHeight")]
    pub activation_height: Option<u64>,
}

const fn default_precompile_address() -> Address {
    WHBAR_PRECOMPILE_ADDR
}

impl Default for WhbarConfig {
    fn default() -> Self {
        Self {
            precompile_address: WHBAR_PRECOMPILE_ADDR,
            metadata: TokenMetadata::default(),
            activation_height: None,
        }
    }
}

impl WhbarConfig {
    /// Creates a `WhbarConfig` from environment variables.
    ///
    /// Every variable is optional and falls back to [`WhbarConfig::default`]:
    /// `WHBAR_PRECOMPILE_ADDR`, `WHBAR_TOKEN_NAME`, `WHBAR_TOKEN_SYMBOL` and
    /// `WHBAR_ACTIVATION_HEIGHT`.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`WhbarConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("WHBAR_PRECOMPILE_ADDR") {
            config.precompile_address = Address::from_str(addr.trim())?;
        }
        if let Some(name) = lookup("WHBAR_TOKEN_NAME") {
            config.metadata.name = name;
        }
        if let Some(symbol) = lookup("WHBAR_TOKEN_SYMBOL") {
            config.metadata.symbol = symbol;
        }
        config.activation_height = lookup("WHBAR_ACTIVATION_HEIGHT")
            .map(|s| s.trim().parse::<u64>())
            .transpose()?;

        config.validate()?;
        Ok(config)
    }

    /// Reads the `whbar` section of genesis config extras.
    ///
    /// Returns `Ok(None)` when the section is absent.
    pub fn from_genesis_extras(
        extras: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(section) = extras.get(GENESIS_EXTRAS_KEY) else {
            return Ok(None);
        };
        let config: Self = serde_json::from_value(section.clone())?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precompile_address.is_zero() {
            return Err(ConfigError::ZeroAddress);
        }
        if self.metadata.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        Ok(())
    }

    /// Whether the precompile is installed at `block_number`.
    pub fn is_active_at(&self, block_number: u64) -> bool {
        block_number >= self.activation_height.unwrap_or(0)
    }
}

/// Errors that can occur during configuration validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The precompile cannot live at the zero address.
    #[error("WHBAR precompile address must not be zero")]
    ZeroAddress,
    /// The token symbol is blank.
    #[error("WHBAR token symbol must not be empty")]
    EmptySymbol,
    /// Genesis extras contained invalid values
    #[error("Invalid whbar extras in genesis: {0}")]
    InvalidExtras(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;
    use std::collections::HashMap;

    fn extras(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert(GENESIS_EXTRAS_KEY.to_string(), value);
        map
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = WhbarConfig::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config, WhbarConfig::default());
        assert_eq!(config.precompile_address, WHBAR_PRECOMPILE_ADDR);
        assert_eq!(config.metadata.symbol, "WHBAR");
        assert!(config.is_active_at(0));
    }

    #[test]
    fn env_overrides_are_applied() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("WHBAR_PRECOMPILE_ADDR", " 0x000000000000000000000000000000000000f300 "),
            ("WHBAR_TOKEN_NAME", "Wrapped Test"),
            ("WHBAR_TOKEN_SYMBOL", "WTST"),
            ("WHBAR_ACTIVATION_HEIGHT", "42"),
        ]);

        let config = WhbarConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("valid overrides");

        assert_eq!(
            config.precompile_address,
            address!("0x000000000000000000000000000000000000f300")
        );
        assert_eq!(config.metadata.name, "Wrapped Test");
        assert_eq!(config.metadata.symbol, "WTST");
        assert!(!config.is_active_at(41));
        assert!(config.is_active_at(42));
    }

    #[test]
    fn env_rejects_bad_values() {
        assert!(WhbarConfig::from_lookup(|key| {
            (key == "WHBAR_PRECOMPILE_ADDR").then(|| "not-an-address".to_string())
        })
        .is_err());
        assert!(WhbarConfig::from_lookup(|key| {
            (key == "WHBAR_ACTIVATION_HEIGHT").then(|| "-1".to_string())
        })
        .is_err());
        assert!(WhbarConfig::from_lookup(|key| {
            (key == "WHBAR_PRECOMPILE_ADDR").then(|| Address::ZERO.to_string())
        })
        .is_err());
    }

    #[test]
    fn genesis_extras_are_parsed() {
        let config = WhbarConfig::from_genesis_extras(&extras(json!({
            "precompileAddress": "0x000000000000000000000000000000000000f201",
            "name": "Wrapped HBAR",
            "symbol": "WHBAR",
            "activationHeight": 10
        })))
        .expect("valid extras")
        .expect("section present");

        assert_eq!(
            config.precompile_address,
            address!("0x000000000000000000000000000000000000f201")
        );
        assert_eq!(config.activation_height, Some(10));
    }

    #[test]
    fn genesis_extras_fill_defaults() {
        let config = WhbarConfig::from_genesis_extras(&extras(json!({})))
            .expect("valid extras")
            .expect("section present");
        assert_eq!(config, WhbarConfig::default());

        let missing = WhbarConfig::from_genesis_extras(&serde_json::Map::new()).expect("no error");
        assert!(missing.is_none());
    }

    #[test]
    fn genesis_extras_reject_invalid_values() {
        let err = WhbarConfig::from_genesis_extras(&extras(json!({ "activationHeight": "soon" })))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExtras(_)));

        let err = WhbarConfig::from_genesis_extras(&extras(json!({ "symbol": " " }))).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySymbol));
    }
}
