#![allow(dead_code)]

use std::sync::Arc;

use basket_controller::{BasketController, ControllerDeps, ControllerInit, StaticPlatformConfig};
use basket_host::{
    Clock, Exchange, FixedRateExchange, InMemoryBank, ManualClock, MemoryEventLog, RoleRegistry,
    TokenBank,
};
use basket_ledger::LedgerConfig;
use basket_types::{Address, Amount, AssetId, Bps, CallContext, FeeConfig, Role};
use chrono::{Duration, TimeZone, Utc};

pub const USER_FUNDS: Amount = 1_000_000_000_000_000_000_000;
pub const EXCHANGE_INVENTORY: Amount = 1_000_000_000_000_000_000_000_000;

pub fn weth() -> AssetId {
    AssetId::new("WETH")
}

pub fn wbtc() -> AssetId {
    AssetId::new("WBTC")
}

pub fn usdc() -> AssetId {
    AssetId::new("USDC")
}

pub fn alice() -> Address {
    Address::derive("alice")
}

pub fn bob() -> Address {
    Address::derive("bob")
}

pub fn manager() -> Address {
    Address::derive("manager")
}

pub fn collector() -> Address {
    Address::derive("fee-collector")
}

pub fn factory() -> Address {
    Address::derive("factory")
}

pub fn fees(contribution_fee_bps: Bps, withdrawal_fee_bps: Bps) -> FeeConfig {
    FeeConfig {
        creation_fee_bps: 10,
        contribution_fee_bps,
        withdrawal_fee_bps,
        fee_collector: collector(),
    }
}

/// A two-asset basket (WBTC/USDC, 50/50) priced 1:1 against WETH.
pub struct Harness {
    pub bank: Arc<InMemoryBank>,
    pub exchange: Arc<FixedRateExchange>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<MemoryEventLog>,
    pub access: Arc<RoleRegistry>,
    pub controller: Arc<BasketController>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(fees(0, 0), 0, vec![wbtc(), usdc()], vec![5_000, 5_000])
    }

    pub fn with_fees(contribution_fee_bps: Bps, withdrawal_fee_bps: Bps) -> Self {
        Self::build(
            fees(contribution_fee_bps, withdrawal_fee_bps),
            0,
            vec![wbtc(), usdc()],
            vec![5_000, 5_000],
        )
    }

    pub fn build(fees: FeeConfig, min_lp_withdrawal: Amount, assets: Vec<AssetId>, weights: Vec<Bps>) -> Self {
        let bank = Arc::new(InMemoryBank::new());
        for asset in [weth(), wbtc(), usdc()] {
            bank.list_asset(asset);
        }
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let exchange = Arc::new(FixedRateExchange::new(Address::derive("router"), clock.clone()));
        for asset in [weth(), wbtc(), usdc()] {
            exchange.set_price(asset.clone(), 1);
            bank.mint(&asset, &exchange.address(), EXCHANGE_INVENTORY).unwrap();
        }
        for user in [alice(), bob()] {
            bank.mint(&weth(), &user, USER_FUNDS).unwrap();
        }

        let events = Arc::new(MemoryEventLog::new());
        let access = Arc::new(RoleRegistry::new());
        let platform = Arc::new(StaticPlatformConfig {
            fees,
            min_lp_withdrawal,
            min_bts_creation_amount: 0,
        });

        let address = Address::derive("basket");
        access.grant(manager(), Role::BasketManager { basket: address });

        let deps = ControllerDeps {
            bank: bank.clone(),
            exchange: exchange.clone(),
            platform,
            access: access.clone(),
            clock: clock.clone(),
            events: events.clone(),
        };
        let init = ControllerInit {
            address,
            ledger_address: Address::derive("basket-ledger"),
            factory: factory(),
            name: "DEFI".into(),
            base_asset: weth(),
            assets,
            weights,
            ledger_config: LedgerConfig::default(),
        };
        let controller = Arc::new(BasketController::new(init, deps).unwrap());

        Self {
            bank,
            exchange,
            clock,
            events,
            access,
            controller,
        }
    }

    /// Five minutes from now with the given buffer.
    pub fn ctx(&self, slippage_buffer_bps: Bps) -> CallContext {
        CallContext::new(self.clock.now() + Duration::minutes(5), slippage_buffer_bps)
    }

    /// A context whose deadline has already passed.
    pub fn expired_ctx(&self) -> CallContext {
        CallContext::new(self.clock.now() - Duration::seconds(1), 100)
    }

    pub fn balance(&self, asset: &AssetId, holder: &Address) -> Amount {
        self.bank.balance_of(asset, holder)
    }

    /// Every balance the flows can touch.
    pub fn balances(&self) -> Vec<Amount> {
        let holders = [
            alice(),
            bob(),
            collector(),
            manager(),
            self.controller.address(),
            self.controller.ledger_address(),
            self.exchange.address(),
        ];
        let mut out = Vec::new();
        for asset in [weth(), wbtc(), usdc()] {
            for holder in &holders {
                out.push(self.balance(&asset, holder));
            }
        }
        out
    }

    /// Let the controller pull `amount` of `holder`'s claims.
    pub fn approve(&self, holder: &Address, amount: Amount) {
        self.controller
            .approve_claims(holder, &self.controller.address(), amount)
            .unwrap();
    }

    pub fn holder_sum(&self) -> Amount {
        self.controller
            .ledger_snapshot()
            .holders
            .iter()
            .map(|(_, units)| *units)
            .sum()
    }
}
