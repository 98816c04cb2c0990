use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use basket_controller::{
    validate_weights, BasketController, ContributionReceipt, ControllerDeps, ControllerInit,
    PlatformConfig, ReentrancyGuard,
};
use basket_host::{AccessPolicy, Clock, EventSink, Exchange, RoleRegistry, TokenBank};
use basket_ledger::LedgerConfig;
use basket_types::{Address, Amount, AssetId, BasketEvent, Bps, CallContext, FeeConfig, Role};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::FactoryError;
use crate::settings::{FactorySettings, SharedSettings};

/// Collaborators shared by the factory and every basket it creates.
#[derive(Clone)]
pub struct FactoryDeps {
    pub bank: Arc<dyn TokenBank>,
    pub exchange: Arc<dyn Exchange>,
    /// The factory grants manager roles, so it needs the registry itself
    pub access: Arc<RoleRegistry>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

/// A published ledger implementation. New baskets use the latest one;
/// existing baskets keep the version they were created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationVersion {
    pub version: u32,
    pub ledger: LedgerConfig,
    pub published_at: DateTime<Utc>,
}

/// Registry entry for a created basket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketRecord {
    /// Controller address; identifies the basket
    pub basket: Address,
    /// Ledger address
    pub pair: Address,
    pub name: String,
    pub creator: Address,
    pub assets: Vec<AssetId>,
    pub weights: Vec<Bps>,
    pub implementation: u32,
    pub created_at: DateTime<Utc>,
}

/// Parameters of a new basket and its seed contribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBasket {
    pub name: String,
    pub assets: Vec<AssetId>,
    pub weights: Vec<Bps>,
    /// Base asset the creator contributes
    pub amount_in: Amount,
    pub slippage_buffer_bps: Bps,
    pub deadline: DateTime<Utc>,
}

/// A registered basket together with its seed contribution.
#[derive(Clone)]
pub struct CreatedBasket {
    pub record: BasketRecord,
    pub controller: Arc<BasketController>,
    pub seed: ContributionReceipt,
}

struct Registry {
    baskets: BTreeMap<Address, (BasketRecord, Arc<BasketController>)>,
    order: Vec<Address>,
    current: ImplementationVersion,
    /// Every published version, oldest first; the last is `current`
    implementations: Vec<ImplementationVersion>,
    nonce: u64,
}

/// Creates baskets and owns the platform parameters they read.
pub struct BasketFactory {
    address: Address,
    settings: Arc<SharedSettings>,
    deps: FactoryDeps,
    registry: RwLock<Registry>,
    guard: ReentrancyGuard,
}

impl BasketFactory {
    pub fn new(
        address: Address,
        settings: FactorySettings,
        deps: FactoryDeps,
    ) -> Result<Self, FactoryError> {
        if address.is_zero() {
            return Err(FactoryError::ZeroAddress);
        }
        settings.validate()?;
        if !deps.bank.is_listed(&settings.base_asset) {
            return Err(FactoryError::UnlistedAsset(settings.base_asset));
        }

        let first = ImplementationVersion {
            version: 1,
            ledger: settings.ledger.clone(),
            published_at: deps.clock.now(),
        };
        let registry = Registry {
            baskets: BTreeMap::new(),
            order: Vec::new(),
            current: first.clone(),
            implementations: vec![first],
            nonce: 0,
        };

        info!(
            factory = %address,
            base_asset = %settings.base_asset,
            fee_collector = %settings.fees.fee_collector,
            "Basket factory initialized"
        );

        Ok(Self {
            address,
            settings: Arc::new(SharedSettings::new(settings)),
            deps,
            registry: RwLock::new(registry),
            guard: ReentrancyGuard::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn settings(&self) -> FactorySettings {
        self.settings.snapshot()
    }

    pub fn platform_fee_config(&self) -> FeeConfig {
        self.settings.platform_fee_config()
    }

    pub fn min_lp_withdrawal(&self) -> Amount {
        self.settings.min_lp_withdrawal()
    }

    pub fn min_bts_creation_amount(&self) -> Amount {
        self.settings.min_bts_creation_amount()
    }

    // --- Settings ---

    pub fn set_platform_fee_config(&self, caller: &Address, fees: FeeConfig) -> Result<(), FactoryError> {
        let _token = self.guard.enter()?;
        self.ensure_role(caller, Role::FeeManager)?;
        fees.validate()?;
        info!(
            creation = fees.creation_fee_bps,
            contribution = fees.contribution_fee_bps,
            withdrawal = fees.withdrawal_fee_bps,
            collector = %fees.fee_collector,
            "Platform fee config updated"
        );
        self.settings.update(|s| s.fees = fees);
        Ok(())
    }

    pub fn set_min_lp_withdrawal(&self, caller: &Address, amount: Amount) -> Result<(), FactoryError> {
        let _token = self.guard.enter()?;
        self.ensure_role(caller, Role::Admin)?;
        info!(amount, "Minimum withdrawal updated");
        self.settings.update(|s| s.min_lp_withdrawal = amount);
        Ok(())
    }

    pub fn set_min_bts_creation_amount(&self, caller: &Address, amount: Amount) -> Result<(), FactoryError> {
        let _token = self.guard.enter()?;
        self.ensure_role(caller, Role::Admin)?;
        info!(amount, "Minimum creation amount updated");
        self.settings.update(|s| s.min_bts_creation_amount = amount);
        Ok(())
    }

    // --- Implementations ---

    /// Publish a new ledger implementation for baskets created from now on.
    pub fn publish_implementation(
        &self,
        caller: &Address,
        ledger: LedgerConfig,
    ) -> Result<u32, FactoryError> {
        let _token = self.guard.enter()?;
        self.ensure_role(caller, Role::Admin)?;
        if ledger.bootstrap_units == 0 {
            return Err(FactoryError::InvalidImplementation(
                "bootstrap_units must be positive".into(),
            ));
        }
        let mut registry = self.registry.write();
        let version = registry.current.version + 1;
        let published = ImplementationVersion {
            version,
            ledger,
            published_at: self.deps.clock.now(),
        };
        registry.current = published.clone();
        registry.implementations.push(published);
        info!(version, "Implementation published");
        Ok(version)
    }

    /// The implementation new baskets are built from.
    pub fn implementation(&self) -> ImplementationVersion {
        self.registry.read().current.clone()
    }

    pub fn implementations(&self) -> Vec<ImplementationVersion> {
        self.registry.read().implementations.clone()
    }

    // --- Creation ---

    /// Validate, build, seed and register a new basket.
    pub fn create_basket(
        &self,
        caller: &Address,
        request: CreateBasket,
    ) -> Result<CreatedBasket, FactoryError> {
        let _token = self.guard.enter()?;
        let settings = self.settings.snapshot();
        self.validate_request(&request, &settings)?;

        let (nonce, implementation) = {
            let registry = self.registry.read();
            (registry.nonce, registry.current.clone())
        };
        let basket = Address::derive_child(&self.address, "controller", nonce);
        let pair = Address::derive_child(&self.address, "ledger", nonce);

        let init = ControllerInit {
            address: basket,
            ledger_address: pair,
            factory: self.address,
            name: request.name.clone(),
            base_asset: settings.base_asset.clone(),
            assets: request.assets.clone(),
            weights: request.weights.clone(),
            ledger_config: implementation.ledger.clone(),
        };
        let platform: Arc<dyn PlatformConfig> = self.settings.clone();
        let access: Arc<dyn AccessPolicy> = self.deps.access.clone();
        let deps = ControllerDeps {
            bank: self.deps.bank.clone(),
            exchange: self.deps.exchange.clone(),
            platform,
            access,
            clock: self.deps.clock.clone(),
            events: self.deps.events.clone(),
        };
        let controller = Arc::new(BasketController::new(init, deps)?);

        let ctx = CallContext::new(request.deadline, request.slippage_buffer_bps);
        let seed = controller
            .seed_contribution(&self.address, caller, request.amount_in, &ctx)
            .map_err(|e| {
                warn!(basket = %basket, creator = %caller, error = %e, "Seed contribution failed");
                e
            })?;

        self.deps
            .access
            .grant(*caller, Role::BasketManager { basket });

        let record = BasketRecord {
            basket,
            pair,
            name: request.name,
            creator: *caller,
            assets: request.assets,
            weights: request.weights,
            implementation: implementation.version,
            created_at: self.deps.clock.now(),
        };
        {
            let mut registry = self.registry.write();
            registry.nonce += 1;
            registry.order.push(basket);
            registry
                .baskets
                .insert(basket, (record.clone(), controller.clone()));
        }

        let event = BasketEvent::BtsCreated { basket, pair };
        info!(
            basket = %basket,
            pair = %pair,
            name = %record.name,
            creator = %caller,
            implementation = record.implementation,
            event = event.name(),
            "Basket created"
        );
        self.deps.events.publish(event);

        Ok(CreatedBasket {
            record,
            controller,
            seed,
        })
    }

    // --- Lookups ---

    /// Every basket, in creation order.
    pub fn baskets(&self) -> Vec<BasketRecord> {
        let registry = self.registry.read();
        registry
            .order
            .iter()
            .filter_map(|address| registry.baskets.get(address))
            .map(|(record, _)| record.clone())
            .collect()
    }

    pub fn basket(&self, basket: &Address) -> Option<Arc<BasketController>> {
        self.registry
            .read()
            .baskets
            .get(basket)
            .map(|(_, controller)| controller.clone())
    }

    pub fn record(&self, basket: &Address) -> Option<BasketRecord> {
        self.registry
            .read()
            .baskets
            .get(basket)
            .map(|(record, _)| record.clone())
    }

    pub fn basket_count(&self) -> usize {
        self.registry.read().order.len()
    }

    // --- Internals ---

    fn ensure_role(&self, caller: &Address, role: Role) -> Result<(), FactoryError> {
        if !self.deps.access.check_role(caller, &role) {
            warn!(caller = %caller, role = %role, "Role check failed");
            return Err(FactoryError::Unauthorized {
                caller: *caller,
                role,
            });
        }
        Ok(())
    }

    fn validate_request(
        &self,
        request: &CreateBasket,
        settings: &FactorySettings,
    ) -> Result<(), FactoryError> {
        if request.name.trim().is_empty() {
            return Err(FactoryError::EmptyName);
        }
        if request.assets.is_empty() {
            return Err(FactoryError::EmptyAssetList);
        }
        if request.assets.len() != request.weights.len() {
            return Err(FactoryError::LengthMismatch {
                assets: request.assets.len(),
                weights: request.weights.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for asset in &request.assets {
            if !seen.insert(asset) {
                return Err(FactoryError::DuplicateAsset(asset.clone()));
            }
            if asset.is_empty() || !self.deps.bank.is_listed(asset) {
                return Err(FactoryError::UnlistedAsset(asset.clone()));
            }
        }
        validate_weights(request.assets.len(), &request.weights)?;
        if request.amount_in < settings.min_bts_creation_amount {
            return Err(FactoryError::BelowMinimumCreation {
                amount: request.amount_in,
                minimum: settings.min_bts_creation_amount,
            });
        }
        Ok(())
    }
}
