use basket_types::{Amount, FeeConfig};

/// Platform parameters a controller reads at the start of every flow.
///
/// Implemented by the factory's shared settings; controllers never write it.
pub trait PlatformConfig: Send + Sync {
    fn platform_fee_config(&self) -> FeeConfig;

    /// Smallest claim amount a withdrawal may redeem.
    fn min_lp_withdrawal(&self) -> Amount;

    /// Smallest base amount a basket may be created with.
    fn min_bts_creation_amount(&self) -> Amount;
}

/// Fixed platform parameters for standalone controllers.
#[derive(Clone, Debug)]
pub struct StaticPlatformConfig {
    pub fees: FeeConfig,
    pub min_lp_withdrawal: Amount,
    pub min_bts_creation_amount: Amount,
}

impl PlatformConfig for StaticPlatformConfig {
    fn platform_fee_config(&self) -> FeeConfig {
        self.fees.clone()
    }

    fn min_lp_withdrawal(&self) -> Amount {
        self.min_lp_withdrawal
    }

    fn min_bts_creation_amount(&self) -> Amount {
        self.min_bts_creation_amount
    }
}
