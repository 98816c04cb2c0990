use serde::{Deserialize, Serialize};

use crate::address::{Address, AssetId};
use crate::fee::FeeAction;
use crate::math::{Amount, Bps};

/// Events emitted by committed basket operations.
///
/// Events are published only after the operation that produced them has
/// committed; a failed operation emits nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BasketEvent {
    ContributedToBts {
        user: Address,
        amount: Amount,
    },
    WithdrawnFromBts {
        basket: Address,
        recipient: Address,
        assets: Vec<AssetId>,
        amounts: Vec<Amount>,
    },
    WithdrawnEthFromBts {
        basket: Address,
        recipient: Address,
        eth_amount: Amount,
    },
    PlatformFeeDeducted {
        fee_amount: Amount,
        fee_percent_bps: Bps,
        fee_collector: Address,
        action: FeeAction,
    },
    BtsCreated {
        basket: Address,
        pair: Address,
    },
    ReservesSynced {
        basket: Address,
        assets: Vec<AssetId>,
        reserves: Vec<Amount>,
    },
    WeightsUpdated {
        basket: Address,
        weights: Vec<Bps>,
    },
}

impl BasketEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            BasketEvent::ContributedToBts { .. } => "ContributedToBTS",
            BasketEvent::WithdrawnFromBts { .. } => "WithdrawnFromBTS",
            BasketEvent::WithdrawnEthFromBts { .. } => "WithdrawnETHFromBTS",
            BasketEvent::PlatformFeeDeducted { .. } => "PlatformFeeDeducted",
            BasketEvent::BtsCreated { .. } => "BTSCreated",
            BasketEvent::ReservesSynced { .. } => "ReservesSynced",
            BasketEvent::WeightsUpdated { .. } => "WeightsUpdated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_is_tagged() {
        let event = BasketEvent::PlatformFeeDeducted {
            fee_amount: 5,
            fee_percent_bps: 50,
            fee_collector: Address::derive("collector"),
            action: FeeAction::Contribute,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"platform_fee_deducted\""));
        let restored: BasketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn event_names() {
        let event = BasketEvent::ContributedToBts {
            user: Address::derive("alice"),
            amount: 1,
        };
        assert_eq!(event.name(), "ContributedToBTS");
    }
}
