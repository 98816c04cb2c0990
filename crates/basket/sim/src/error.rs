use basket_controller::ControllerError;
use basket_factory::{ConfigError, FactoryError};
use basket_host::BankError;
use thiserror::Error;

/// Errors that stop a scenario run.
///
/// A step the basket rejects is not one of these; it is recorded in the
/// report and the run continues.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid scenario: {0}")]
    Invalid(String),

    #[error("unknown basket label: {0}")]
    UnknownBasket(String),

    #[error("settings error: {0}")]
    Config(#[from] ConfigError),

    #[error("factory error: {0}")]
    Factory(#[from] FactoryError),

    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("bank error: {0}")]
    Bank(#[from] BankError),

    #[error("failed to render report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
