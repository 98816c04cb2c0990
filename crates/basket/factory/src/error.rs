use basket_controller::ControllerError;
use basket_types::{Address, Amount, AssetId, FeeConfigError, Role};
use thiserror::Error;

/// Errors loading factory settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Errors from factory operations. None of them leave a partially created
/// basket or a partially applied setting behind.
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("caller {caller} lacks role {role}")]
    Unauthorized { caller: Address, role: Role },

    #[error("factory address cannot be the zero address")]
    ZeroAddress,

    #[error("invalid fee configuration: {0}")]
    InvalidFeeConfig(#[from] FeeConfigError),

    // --- Composition ---
    #[error("basket name cannot be empty")]
    EmptyName,

    #[error("basket needs at least one asset")]
    EmptyAssetList,

    #[error("{assets} assets but {weights} weights")]
    LengthMismatch { assets: usize, weights: usize },

    #[error("asset {0} appears more than once")]
    DuplicateAsset(AssetId),

    #[error("asset {0} does not resolve to a listed token")]
    UnlistedAsset(AssetId),

    #[error("creation amount {amount} is below the minimum of {minimum}")]
    BelowMinimumCreation { amount: Amount, minimum: Amount },

    #[error("invalid implementation: {0}")]
    InvalidImplementation(String),

    // --- Propagated ---
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_names_role() {
        let err = FactoryError::Unauthorized {
            caller: Address::derive("mallory"),
            role: Role::FeeManager,
        };
        assert!(err.to_string().contains("fee-manager"));
    }
}
