use std::collections::BTreeSet;
use std::path::Path;

use basket_types::Bps;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// A scenario file. Amounts are whole minor units and kept to `u64` so they
/// round-trip through TOML integers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub platform: PlatformSection,
    pub assets: Vec<AssetSection>,
    pub actors: Vec<ActorSection>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Factory settings. The fee collector is an actor label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSection {
    #[serde(default = "default_base_asset")]
    pub base_asset: String,
    #[serde(default)]
    pub creation_fee_bps: Bps,
    #[serde(default)]
    pub contribution_fee_bps: Bps,
    #[serde(default)]
    pub withdrawal_fee_bps: Bps,
    #[serde(default = "default_collector")]
    pub fee_collector: String,
    #[serde(default)]
    pub min_lp_withdrawal: u64,
    #[serde(default)]
    pub min_bts_creation_amount: u64,
    #[serde(default = "default_bootstrap_units")]
    pub bootstrap_units: u64,
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            base_asset: default_base_asset(),
            creation_fee_bps: 0,
            contribution_fee_bps: 0,
            withdrawal_fee_bps: 0,
            fee_collector: default_collector(),
            min_lp_withdrawal: 0,
            min_bts_creation_amount: 0,
            bootstrap_units: default_bootstrap_units(),
        }
    }
}

fn default_base_asset() -> String {
    basket_factory::DEFAULT_BASE_ASSET.to_string()
}

fn default_collector() -> String {
    "treasury".to_string()
}

fn default_bootstrap_units() -> u64 {
    basket_ledger::DEFAULT_BOOTSTRAP_UNITS as u64
}

/// A listed token, its exchange price and the exchange's inventory of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSection {
    pub id: String,
    pub price: u64,
    #[serde(default)]
    pub liquidity: u64,
}

/// A participant funded with the base asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSection {
    pub name: String,
    #[serde(default)]
    pub funds: u64,
}

/// One scenario action. Baskets are referred to by the label given at
/// creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Create {
        actor: String,
        basket: String,
        name: String,
        assets: Vec<String>,
        weights: Vec<Bps>,
        amount: u64,
        #[serde(default = "default_buffer")]
        buffer_bps: Bps,
    },
    Contribute {
        actor: String,
        basket: String,
        amount: u64,
        #[serde(default = "default_buffer")]
        buffer_bps: Bps,
    },
    Withdraw {
        actor: String,
        basket: String,
        units: u64,
        #[serde(default = "default_buffer")]
        buffer_bps: Bps,
    },
    WithdrawEth {
        actor: String,
        basket: String,
        units: u64,
        #[serde(default = "default_buffer")]
        buffer_bps: Bps,
    },
    SyncReserves {
        actor: String,
        basket: String,
    },
    SetPrice {
        asset: String,
        price: u64,
    },
    SetHaircut {
        bps: Bps,
    },
    Advance {
        seconds: u64,
    },
}

fn default_buffer() -> Bps {
    100
}

impl Step {
    pub fn action(&self) -> &'static str {
        match self {
            Step::Create { .. } => "create",
            Step::Contribute { .. } => "contribute",
            Step::Withdraw { .. } => "withdraw",
            Step::WithdrawEth { .. } => "withdraw_eth",
            Step::SyncReserves { .. } => "sync_reserves",
            Step::SetPrice { .. } => "set_price",
            Step::SetHaircut { .. } => "set_haircut",
            Step::Advance { .. } => "advance",
        }
    }
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> SimResult<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Structural checks only. Fee ceilings are enforced by the factory and
    /// per-step rules by the baskets, whose rejections land in the report.
    pub fn validate(&self) -> SimResult<()> {
        let mut ids = BTreeSet::new();
        for asset in &self.assets {
            if asset.id.trim().is_empty() {
                return Err(SimError::Invalid("asset id cannot be empty".into()));
            }
            if !ids.insert(asset.id.as_str()) {
                return Err(SimError::Invalid(format!("asset {} listed twice", asset.id)));
            }
        }
        if !ids.contains(self.platform.base_asset.as_str()) {
            return Err(SimError::Invalid(format!(
                "base asset {} is not among the listed assets",
                self.platform.base_asset
            )));
        }

        let mut names = BTreeSet::new();
        for actor in &self.actors {
            if !names.insert(actor.name.as_str()) {
                return Err(SimError::Invalid(format!("actor {} declared twice", actor.name)));
            }
        }

        Ok(())
    }
}
