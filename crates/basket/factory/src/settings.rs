use std::path::Path;

use basket_controller::PlatformConfig;
use basket_ledger::LedgerConfig;
use basket_types::{Amount, AssetId, FeeConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Base asset used when settings do not name one.
pub const DEFAULT_BASE_ASSET: &str = "WETH";

/// Platform-wide parameters owned by the factory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorySettings {
    pub fees: FeeConfig,

    /// Smallest claim amount a withdrawal may redeem
    #[serde(default)]
    pub min_lp_withdrawal: Amount,

    /// Smallest seed contribution a new basket accepts
    #[serde(default)]
    pub min_bts_creation_amount: Amount,

    #[serde(default = "default_base_asset")]
    pub base_asset: AssetId,

    /// Ledger parameters of the first implementation version
    #[serde(default)]
    pub ledger: LedgerConfig,
}

fn default_base_asset() -> AssetId {
    AssetId::new(DEFAULT_BASE_ASSET)
}

impl FactorySettings {
    pub fn new(fees: FeeConfig) -> Self {
        Self {
            fees,
            min_lp_withdrawal: 0,
            min_bts_creation_amount: 0,
            base_asset: default_base_asset(),
            ledger: LedgerConfig::default(),
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: FactorySettings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading factory settings");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fees
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.base_asset.is_empty() {
            return Err(ConfigError::Invalid("base_asset cannot be empty".into()));
        }
        if self.ledger.bootstrap_units == 0 {
            return Err(ConfigError::Invalid("ledger.bootstrap_units must be positive".into()));
        }
        Ok(())
    }
}

/// Settings shared between the factory, which writes them, and every basket
/// it created, which reads them at the start of each flow.
#[derive(Debug)]
pub struct SharedSettings {
    inner: RwLock<FactorySettings>,
}

impl SharedSettings {
    pub fn new(settings: FactorySettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn snapshot(&self) -> FactorySettings {
        self.inner.read().clone()
    }

    pub(crate) fn update(&self, apply: impl FnOnce(&mut FactorySettings)) {
        apply(&mut self.inner.write());
    }
}

impl PlatformConfig for SharedSettings {
    fn platform_fee_config(&self) -> FeeConfig {
        self.inner.read().fees.clone()
    }

    fn min_lp_withdrawal(&self) -> Amount {
        self.inner.read().min_lp_withdrawal
    }

    fn min_bts_creation_amount(&self) -> Amount {
        self.inner.read().min_bts_creation_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_types::Address;

    fn collector() -> Address {
        Address::derive("collector")
    }

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let toml = format!(
            r#"
            [fees]
            creation_fee_bps = 10
            contribution_fee_bps = 50
            withdrawal_fee_bps = 25
            fee_collector = "{}"
            "#,
            collector()
        );
        let settings = FactorySettings::from_toml_str(&toml).unwrap();
        assert_eq!(settings.fees.contribution_fee_bps, 50);
        assert_eq!(settings.fees.fee_collector, collector());
        assert_eq!(settings.base_asset, AssetId::new("WETH"));
        assert_eq!(settings.ledger, LedgerConfig::default());
        assert_eq!(settings.min_lp_withdrawal, 0);
    }

    #[test]
    fn parses_full_toml() {
        let toml = format!(
            r#"
            min_lp_withdrawal = 100
            min_bts_creation_amount = 5000
            base_asset = "WBNB"

            [fees]
            creation_fee_bps = 0
            contribution_fee_bps = 0
            withdrawal_fee_bps = 0
            fee_collector = "{}"

            [ledger]
            bootstrap_units = 10000
            "#,
            collector()
        );
        let settings = FactorySettings::from_toml_str(&toml).unwrap();
        assert_eq!(settings.min_lp_withdrawal, 100);
        assert_eq!(settings.min_bts_creation_amount, 5_000);
        assert_eq!(settings.base_asset, AssetId::new("WBNB"));
        assert_eq!(settings.ledger.bootstrap_units, 10_000);
    }

    #[test]
    fn rejects_fee_above_ceiling() {
        let toml = format!(
            r#"
            [fees]
            creation_fee_bps = 0
            contribution_fee_bps = 51
            withdrawal_fee_bps = 0
            fee_collector = "{}"
            "#,
            collector()
        );
        assert!(matches!(
            FactorySettings::from_toml_str(&toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_malformed_collector() {
        let toml = r#"
            [fees]
            creation_fee_bps = 0
            contribution_fee_bps = 0
            withdrawal_fee_bps = 0
            fee_collector = "not-an-address"
        "#;
        assert!(matches!(
            FactorySettings::from_toml_str(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            FactorySettings::load("/nonexistent/basket/settings.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn shared_settings_expose_platform_config() {
        let shared = SharedSettings::new(FactorySettings::new(FeeConfig {
            creation_fee_bps: 1,
            contribution_fee_bps: 2,
            withdrawal_fee_bps: 3,
            fee_collector: collector(),
        }));
        shared.update(|s| s.min_lp_withdrawal = 42);
        assert_eq!(shared.min_lp_withdrawal(), 42);
        assert_eq!(shared.platform_fee_config().withdrawal_fee_bps, 3);
    }
}
