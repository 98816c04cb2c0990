use std::collections::BTreeMap;
use std::sync::Arc;

use basket_controller::{
    BasketController, ContributionReceipt, ControllerError, EthWithdrawalReceipt, WithdrawalReceipt,
};
use basket_factory::{BasketFactory, CreateBasket, FactoryDeps, FactorySettings};
use basket_host::{
    Clock, Exchange, FixedRateExchange, InMemoryBank, ManualClock, MemoryEventLog, RoleRegistry,
    TokenBank,
};
use basket_ledger::LedgerConfig;
use basket_types::{Address, Amount, AssetId, BasketEvent, Bps, CallContext, FeeConfig};
use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{SimError, SimResult};
use crate::scenario::{Scenario, Step};

/// Deadline granted to every step, relative to the simulated clock.
const STEP_DEADLINE_SECS: i64 = 300;

/// What a step produced.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StepDetail {
    Created { basket: Address, pair: Address, seed: ContributionReceipt },
    Contribution(ContributionReceipt),
    Withdrawal(WithdrawalReceipt),
    EthWithdrawal(EthWithdrawalReceipt),
    Reserves { reserves: Vec<Amount> },
    Nothing {},
}

#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<StepDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HolderReport {
    pub actor: String,
    pub units: Amount,
}

#[derive(Debug, Serialize)]
pub struct BasketReport {
    pub label: String,
    pub address: Address,
    pub name: String,
    pub assets: Vec<AssetId>,
    pub weights: Vec<Bps>,
    pub reserves: Vec<Amount>,
    pub claim_supply: Amount,
    pub holders: Vec<HolderReport>,
}

#[derive(Debug, Serialize)]
pub struct BalanceReport {
    pub actor: String,
    pub address: Address,
    pub balances: Vec<(AssetId, Amount)>,
}

/// Final state of a scenario run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub baskets: Vec<BasketReport>,
    pub balances: Vec<BalanceReport>,
    pub events: Vec<BasketEvent>,
}

impl Report {
    pub fn rejected(&self) -> usize {
        self.steps.iter().filter(|step| step.error.is_some()).count()
    }
}

/// Wires the in-memory host and a factory together and plays steps on it.
pub struct Runner {
    bank: Arc<InMemoryBank>,
    exchange: Arc<FixedRateExchange>,
    clock: Arc<ManualClock>,
    events: Arc<MemoryEventLog>,
    factory: BasketFactory,
    assets: Vec<AssetId>,
    /// Labels in declaration order; the fee collector is appended if it is
    /// not an actor
    actors: Vec<(String, Address)>,
    baskets: BTreeMap<String, Arc<BasketController>>,
}

impl Runner {
    pub fn new(scenario: &Scenario) -> SimResult<Self> {
        let bank = Arc::new(InMemoryBank::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .ok_or_else(|| SimError::Invalid("invalid start time".into()))?,
        ));
        let exchange = Arc::new(FixedRateExchange::new(Address::derive("exchange"), clock.clone()));

        let assets: Vec<AssetId> = scenario.assets.iter().map(|a| AssetId::new(&a.id)).collect();
        for (asset, section) in assets.iter().zip(&scenario.assets) {
            bank.list_asset(asset.clone());
            exchange.set_price(asset.clone(), Amount::from(section.price));
            bank.mint(asset, &exchange.address(), Amount::from(section.liquidity))?;
        }

        let platform = &scenario.platform;
        let base_asset = AssetId::new(&platform.base_asset);
        let mut actors = Vec::with_capacity(scenario.actors.len() + 1);
        for actor in &scenario.actors {
            let address = Address::derive(&actor.name);
            bank.mint(&base_asset, &address, Amount::from(actor.funds))?;
            actors.push((actor.name.clone(), address));
        }
        if !actors.iter().any(|(name, _)| *name == platform.fee_collector) {
            actors.push((platform.fee_collector.clone(), Address::derive(&platform.fee_collector)));
        }

        let settings = FactorySettings {
            fees: FeeConfig {
                creation_fee_bps: platform.creation_fee_bps,
                contribution_fee_bps: platform.contribution_fee_bps,
                withdrawal_fee_bps: platform.withdrawal_fee_bps,
                fee_collector: Address::derive(&platform.fee_collector),
            },
            min_lp_withdrawal: Amount::from(platform.min_lp_withdrawal),
            min_bts_creation_amount: Amount::from(platform.min_bts_creation_amount),
            base_asset,
            ledger: LedgerConfig {
                bootstrap_units: Amount::from(platform.bootstrap_units),
            },
        };
        settings.validate()?;

        let events = Arc::new(MemoryEventLog::new());
        let deps = FactoryDeps {
            bank: bank.clone(),
            exchange: exchange.clone(),
            access: Arc::new(RoleRegistry::with_admin(Address::derive("admin"))),
            clock: clock.clone(),
            events: events.clone(),
        };
        let factory = BasketFactory::new(Address::derive("factory"), settings, deps)?;

        info!(
            assets = assets.len(),
            actors = actors.len(),
            steps = scenario.steps.len(),
            "Scenario host ready"
        );

        Ok(Self {
            bank,
            exchange,
            clock,
            events,
            factory,
            assets,
            actors,
            baskets: BTreeMap::new(),
        })
    }

    /// Play every step in order. A rejected step is recorded and the run
    /// moves on.
    pub fn run(mut self, steps: &[Step]) -> Report {
        let mut outcomes = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let outcome = match self.apply(step) {
                Ok(detail) => {
                    debug!(index, action = step.action(), "Step applied");
                    StepOutcome {
                        index,
                        action: step.action(),
                        detail: Some(detail),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(index, action = step.action(), error = %e, "Step rejected");
                    StepOutcome {
                        index,
                        action: step.action(),
                        detail: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }
        self.report(outcomes)
    }

    fn apply(&mut self, step: &Step) -> SimResult<StepDetail> {
        match step {
            Step::Create {
                actor,
                basket,
                name,
                assets,
                weights,
                amount,
                buffer_bps,
            } => {
                if self.baskets.contains_key(basket) {
                    return Err(SimError::Invalid(format!("basket label {} already used", basket)));
                }
                let creator = self.actor(actor)?;
                let request = CreateBasket {
                    name: name.clone(),
                    assets: assets.iter().map(AssetId::new).collect(),
                    weights: weights.clone(),
                    amount_in: Amount::from(*amount),
                    slippage_buffer_bps: *buffer_bps,
                    deadline: self.deadline(),
                };
                let created = self.factory.create_basket(&creator, request)?;
                self.baskets.insert(basket.clone(), created.controller);
                Ok(StepDetail::Created {
                    basket: created.record.basket,
                    pair: created.record.pair,
                    seed: created.seed,
                })
            }
            Step::Contribute {
                actor,
                basket,
                amount,
                buffer_bps,
            } => {
                let caller = self.actor(actor)?;
                let ctx = self.ctx(*buffer_bps);
                let receipt = self.basket(basket)?.contribute(&caller, Amount::from(*amount), &ctx)?;
                Ok(StepDetail::Contribution(receipt))
            }
            Step::Withdraw {
                actor,
                basket,
                units,
                buffer_bps,
            } => {
                let caller = self.actor(actor)?;
                let ctx = self.ctx(*buffer_bps);
                let controller = self.basket(basket)?;
                let units = Amount::from(*units);
                approve(controller, &caller, units)?;
                Ok(StepDetail::Withdrawal(controller.withdraw(&caller, units, &ctx)?))
            }
            Step::WithdrawEth {
                actor,
                basket,
                units,
                buffer_bps,
            } => {
                let caller = self.actor(actor)?;
                let ctx = self.ctx(*buffer_bps);
                let controller = self.basket(basket)?;
                let units = Amount::from(*units);
                approve(controller, &caller, units)?;
                Ok(StepDetail::EthWithdrawal(controller.withdraw_eth(&caller, units, &ctx)?))
            }
            Step::SyncReserves { actor, basket } => {
                let caller = self.actor(actor)?;
                let reserves = self.basket(basket)?.sync_reserves(&caller)?;
                Ok(StepDetail::Reserves { reserves })
            }
            Step::SetPrice { asset, price } => {
                let asset = AssetId::new(asset);
                if !self.bank.is_listed(&asset) {
                    return Err(SimError::Invalid(format!("asset {} is not listed", asset)));
                }
                self.exchange.set_price(asset, Amount::from(*price));
                Ok(StepDetail::Nothing {})
            }
            Step::SetHaircut { bps } => {
                self.exchange.set_haircut_bps(*bps);
                Ok(StepDetail::Nothing {})
            }
            Step::Advance { seconds } => {
                let seconds = i64::try_from(*seconds)
                    .map_err(|_| SimError::Invalid(format!("cannot advance {} seconds", seconds)))?;
                self.clock.advance(Duration::seconds(seconds));
                Ok(StepDetail::Nothing {})
            }
        }
    }

    fn actor(&self, name: &str) -> SimResult<Address> {
        self.actors
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, address)| *address)
            .ok_or_else(|| SimError::Invalid(format!("unknown actor {}", name)))
    }

    fn basket(&self, label: &str) -> SimResult<&Arc<BasketController>> {
        self.baskets
            .get(label)
            .ok_or_else(|| SimError::UnknownBasket(label.to_string()))
    }

    fn deadline(&self) -> chrono::DateTime<Utc> {
        self.clock.now() + Duration::seconds(STEP_DEADLINE_SECS)
    }

    fn ctx(&self, buffer_bps: Bps) -> CallContext {
        CallContext::new(self.deadline(), buffer_bps)
    }

    fn report(&self, steps: Vec<StepOutcome>) -> Report {
        let baskets = self
            .baskets
            .iter()
            .map(|(label, controller)| {
                let snapshot = controller.ledger_snapshot();
                let holders = self
                    .actors
                    .iter()
                    .map(|(actor, address)| HolderReport {
                        actor: actor.clone(),
                        units: controller.claim_balance_of(address),
                    })
                    .filter(|holder| holder.units > 0)
                    .collect();
                BasketReport {
                    label: label.clone(),
                    address: controller.address(),
                    name: snapshot.name,
                    assets: snapshot.assets,
                    weights: controller.weights(),
                    reserves: snapshot.reserves,
                    claim_supply: snapshot.claim_supply,
                    holders,
                }
            })
            .collect();

        let balances = self
            .actors
            .iter()
            .map(|(actor, address)| BalanceReport {
                actor: actor.clone(),
                address: *address,
                balances: self
                    .assets
                    .iter()
                    .map(|asset| (asset.clone(), self.bank.balance_of(asset, address)))
                    .filter(|(_, amount)| *amount > 0)
                    .collect(),
            })
            .collect();

        Report {
            steps,
            baskets,
            balances,
            events: self.events.events(),
        }
    }
}

fn approve(controller: &BasketController, holder: &Address, units: Amount) -> Result<(), ControllerError> {
    controller.approve_claims(holder, &controller.address(), units)
}
