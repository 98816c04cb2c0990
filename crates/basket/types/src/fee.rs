use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::FeeConfigError;
use crate::math::Bps;

/// Ceiling for every platform fee: 50 bps (0.5%).
pub const MAX_FEE_BPS: Bps = 50;

/// Platform fee configuration, owned by the factory and read by controllers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Cut taken from the seed contribution when a basket is created
    pub creation_fee_bps: Bps,
    /// Cut taken from every contribution
    pub contribution_fee_bps: Bps,
    /// Cut taken from every withdrawal payout
    pub withdrawal_fee_bps: Bps,
    /// Receives every fee
    pub fee_collector: Address,
}

impl FeeConfig {
    /// Check every fee against [`MAX_FEE_BPS`] and reject a zero collector.
    pub fn validate(&self) -> Result<(), FeeConfigError> {
        for (field, value) in [
            ("creation_fee_bps", self.creation_fee_bps),
            ("contribution_fee_bps", self.contribution_fee_bps),
            ("withdrawal_fee_bps", self.withdrawal_fee_bps),
        ] {
            if value > MAX_FEE_BPS {
                return Err(FeeConfigError::FeeAboveCeiling {
                    field,
                    value,
                    ceiling: MAX_FEE_BPS,
                });
            }
        }
        if self.fee_collector.is_zero() {
            return Err(FeeConfigError::ZeroCollector);
        }
        Ok(())
    }

    /// The fee rate charged for a given action.
    pub fn bps_for(&self, action: FeeAction) -> Bps {
        match action {
            FeeAction::Create => self.creation_fee_bps,
            FeeAction::Contribute => self.contribution_fee_bps,
            FeeAction::WithdrawTokens | FeeAction::WithdrawEth => self.withdrawal_fee_bps,
        }
    }
}

/// The flow a platform fee was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeAction {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "contribute")]
    Contribute,
    #[serde(rename = "withdrawTokens")]
    WithdrawTokens,
    #[serde(rename = "withdrawETH")]
    WithdrawEth,
}

impl std::fmt::Display for FeeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FeeAction::Create => "create",
            FeeAction::Contribute => "contribute",
            FeeAction::WithdrawTokens => "withdrawTokens",
            FeeAction::WithdrawEth => "withdrawETH",
        };
        f.write_str(label)
    }
}
