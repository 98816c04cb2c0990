use basket_types::{Address, Amount, AssetId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a committed contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionReceipt {
    pub operation_id: Uuid,
    pub contributor: Address,
    pub amount_in: Amount,
    pub fee_amount: Amount,
    pub net_amount: Amount,
    /// Basket asset amounts credited to the ledger, aligned with its asset list
    pub deposits: Vec<Amount>,
    pub minted_units: Amount,
}

/// Outcome of a committed in-kind withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub operation_id: Uuid,
    pub recipient: Address,
    pub burned_units: Amount,
    pub assets: Vec<AssetId>,
    pub fees: Vec<Amount>,
    /// Delivered to the recipient after fees
    pub amounts: Vec<Amount>,
}

/// Outcome of a committed base-asset withdrawal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthWithdrawalReceipt {
    pub operation_id: Uuid,
    pub recipient: Address,
    pub burned_units: Amount,
    /// Base asset obtained from the payouts, before the fee
    pub gross_amount: Amount,
    pub fee_amount: Amount,
    pub eth_amount: Amount,
}

/// What a contribution would do at current quotes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionPreview {
    pub fee_amount: Amount,
    pub net_amount: Amount,
    pub portions: Vec<Amount>,
    pub quoted_outputs: Vec<Amount>,
    pub expected_units: Amount,
}
