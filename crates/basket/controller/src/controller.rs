use std::sync::Arc;

use basket_host::{
    AccessPolicy, BankTransaction, Clock, EventSink, Exchange, SwapRequest, TokenBank,
};
use basket_ledger::{BasketLedger, LedgerConfig, LedgerSnapshot};
use basket_types::math::{self, checked_add, checked_sub};
use basket_types::{
    Address, Amount, AssetId, BasketEvent, Bps, CallContext, FeeAction, Role,
};
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ControllerError;
use crate::guard::ReentrancyGuard;
use crate::platform::PlatformConfig;
use crate::receipt::{
    ContributionPreview, ContributionReceipt, EthWithdrawalReceipt, WithdrawalReceipt,
};
use crate::weights::{split_by_weights, validate_weights};

/// Collaborators a controller calls into.
#[derive(Clone)]
pub struct ControllerDeps {
    pub bank: Arc<dyn TokenBank>,
    pub exchange: Arc<dyn Exchange>,
    pub platform: Arc<dyn PlatformConfig>,
    pub access: Arc<dyn AccessPolicy>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

/// Everything needed to stand up a controller and its ledger.
#[derive(Clone, Debug)]
pub struct ControllerInit {
    pub address: Address,
    pub ledger_address: Address,
    /// The only caller allowed to seed the creation contribution
    pub factory: Address,
    pub name: String,
    pub base_asset: AssetId,
    pub assets: Vec<AssetId>,
    pub weights: Vec<Bps>,
    pub ledger_config: LedgerConfig,
}

/// User-facing entry points of one basket.
///
/// Takes `&self` everywhere so it can be shared behind an `Arc` and reached
/// from exchange callbacks; the [`ReentrancyGuard`] keeps mutations serial.
pub struct BasketController {
    address: Address,
    factory: Address,
    base_asset: AssetId,
    weights: RwLock<Vec<Bps>>,
    ledger: RwLock<BasketLedger>,
    deps: ControllerDeps,
    guard: ReentrancyGuard,
}

impl BasketController {
    /// Validate the composition and initialize the owned ledger.
    pub fn new(init: ControllerInit, deps: ControllerDeps) -> Result<Self, ControllerError> {
        for address in [init.address, init.ledger_address, init.factory] {
            if address.is_zero() {
                return Err(ControllerError::InvalidAddress(address));
            }
        }
        if init.address == init.ledger_address {
            return Err(ControllerError::InvalidAddress(init.ledger_address));
        }
        validate_weights(init.assets.len(), &init.weights)?;
        if !deps.bank.is_listed(&init.base_asset) {
            return Err(ControllerError::UnlistedAsset(init.base_asset));
        }
        ensure_listed(deps.bank.as_ref(), &init.assets)?;

        let mut ledger = BasketLedger::new(init.ledger_address, init.ledger_config);
        ledger.initialize(init.address, &init.name, init.assets)?;

        info!(
            basket = %init.address,
            ledger = %init.ledger_address,
            name = %init.name,
            weights = ?init.weights,
            "Basket controller created"
        );

        Ok(Self {
            address: init.address,
            factory: init.factory,
            base_asset: init.base_asset,
            weights: RwLock::new(init.weights),
            ledger: RwLock::new(ledger),
            deps,
            guard: ReentrancyGuard::new(),
        })
    }

    // =========================================================================
    // User flows
    // =========================================================================

    /// Contribute `amount_in` of the base asset and receive claim units.
    pub fn contribute(
        &self,
        caller: &Address,
        amount_in: Amount,
        ctx: &CallContext,
    ) -> Result<ContributionReceipt, ControllerError> {
        let _token = self.guard.enter()?;
        self.check_contribution(amount_in, ctx)?;
        self.deposit(caller, amount_in, ctx, FeeAction::Contribute)
    }

    /// Creation-time contribution on behalf of the basket's creator.
    ///
    /// Charges the creation fee instead of the contribution fee. Only the
    /// factory that created the basket may call it.
    pub fn seed_contribution(
        &self,
        caller: &Address,
        beneficiary: &Address,
        amount_in: Amount,
        ctx: &CallContext,
    ) -> Result<ContributionReceipt, ControllerError> {
        let _token = self.guard.enter()?;
        if *caller != self.factory {
            return Err(ControllerError::Unauthorized {
                caller: *caller,
                action: "seed the creation contribution",
            });
        }
        self.check_contribution(amount_in, ctx)?;
        self.deposit(beneficiary, amount_in, ctx, FeeAction::Create)
    }

    /// Redeem `claim_amount` for the proportional slice of every reserve.
    ///
    /// The caller must have approved the controller for `claim_amount`.
    pub fn withdraw(
        &self,
        caller: &Address,
        claim_amount: Amount,
        ctx: &CallContext,
    ) -> Result<WithdrawalReceipt, ControllerError> {
        let _token = self.guard.enter()?;
        self.check_withdrawal(claim_amount, ctx)?;

        let fees = self.deps.platform.platform_fee_config();
        let fee_bps = fees.bps_for(FeeAction::WithdrawTokens);
        let mut ledger = self.ledger.read().clone();
        let mut tx = BankTransaction::begin(self.deps.bank.as_ref());
        let mut events = Vec::new();

        let burn = self.redeem(&mut ledger, &mut tx, caller, claim_amount)?;

        let mut fee_amounts = Vec::with_capacity(burn.payouts.len());
        let mut amounts = Vec::with_capacity(burn.payouts.len());
        for (asset, payout) in burn.assets.iter().zip(&burn.payouts) {
            let fee = math::bps_of(*payout, fee_bps)?;
            let net = checked_sub(*payout, fee)?;
            tx.transfer(asset, &self.address, &fees.fee_collector, fee)?;
            tx.transfer(asset, &self.address, caller, net)?;
            fee_amounts.push(fee);
            amounts.push(net);
        }

        let total_fee = math::checked_sum(&fee_amounts)?;
        if total_fee > 0 {
            events.push(BasketEvent::PlatformFeeDeducted {
                fee_amount: total_fee,
                fee_percent_bps: fee_bps,
                fee_collector: fees.fee_collector,
                action: FeeAction::WithdrawTokens,
            });
        }
        events.push(BasketEvent::WithdrawnFromBts {
            basket: self.address,
            recipient: *caller,
            assets: burn.assets.clone(),
            amounts: amounts.clone(),
        });

        self.commit(tx, ledger, events);

        let receipt = WithdrawalReceipt {
            operation_id: Uuid::new_v4(),
            recipient: *caller,
            burned_units: burn.burned_units,
            assets: burn.assets,
            fees: fee_amounts,
            amounts,
        };
        info!(
            basket = %self.address,
            operation = %receipt.operation_id,
            recipient = %caller,
            burned = receipt.burned_units,
            amounts = ?receipt.amounts,
            "Withdrawal committed"
        );
        Ok(receipt)
    }

    /// Redeem `claim_amount` and receive everything as the base asset.
    pub fn withdraw_eth(
        &self,
        caller: &Address,
        claim_amount: Amount,
        ctx: &CallContext,
    ) -> Result<EthWithdrawalReceipt, ControllerError> {
        let _token = self.guard.enter()?;
        self.check_withdrawal(claim_amount, ctx)?;

        let fees = self.deps.platform.platform_fee_config();
        let fee_bps = fees.bps_for(FeeAction::WithdrawEth);
        let mut ledger = self.ledger.read().clone();
        let mut tx = BankTransaction::begin(self.deps.bank.as_ref());
        let mut events = Vec::new();

        let burn = self.redeem(&mut ledger, &mut tx, caller, claim_amount)?;

        let mut gross: Amount = 0;
        for (asset, payout) in burn.assets.iter().zip(&burn.payouts) {
            let converted = if *payout == 0 || *asset == self.base_asset {
                *payout
            } else {
                let path = vec![asset.clone(), self.base_asset.clone()];
                self.swap(&mut tx, *payout, path, &self.address, ctx)?
            };
            gross = checked_add(gross, converted)?;
        }

        let fee_amount = math::bps_of(gross, fee_bps)?;
        let eth_amount = checked_sub(gross, fee_amount)?;
        tx.transfer(&self.base_asset, &self.address, &fees.fee_collector, fee_amount)?;
        tx.transfer(&self.base_asset, &self.address, caller, eth_amount)?;

        if fee_amount > 0 {
            events.push(BasketEvent::PlatformFeeDeducted {
                fee_amount,
                fee_percent_bps: fee_bps,
                fee_collector: fees.fee_collector,
                action: FeeAction::WithdrawEth,
            });
        }
        events.push(BasketEvent::WithdrawnEthFromBts {
            basket: self.address,
            recipient: *caller,
            eth_amount,
        });

        self.commit(tx, ledger, events);

        let receipt = EthWithdrawalReceipt {
            operation_id: Uuid::new_v4(),
            recipient: *caller,
            burned_units: burn.burned_units,
            gross_amount: gross,
            fee_amount,
            eth_amount,
        };
        info!(
            basket = %self.address,
            operation = %receipt.operation_id,
            recipient = %caller,
            burned = receipt.burned_units,
            eth_amount,
            "Base-asset withdrawal committed"
        );
        Ok(receipt)
    }

    /// Accept a direct base-asset delivery. Only the exchange may send one.
    pub fn receive(&self, sender: &Address, amount: Amount) -> Result<(), ControllerError> {
        if *sender != self.deps.exchange.address() {
            warn!(basket = %self.address, sender = %sender, amount, "Unsolicited transfer rejected");
            return Err(ControllerError::UnauthorizedSender { sender: *sender });
        }
        let _token = self.guard.enter()?;
        let mut tx = BankTransaction::begin(self.deps.bank.as_ref());
        tx.transfer(&self.base_asset, sender, &self.address, amount)?;
        tx.commit();
        debug!(basket = %self.address, amount, "Base asset received from exchange");
        Ok(())
    }

    // =========================================================================
    // Manager operations
    // =========================================================================

    /// Resync every reserve to the ledger's custody balance.
    pub fn sync_reserves(&self, caller: &Address) -> Result<Vec<Amount>, ControllerError> {
        let _token = self.guard.enter()?;
        self.ensure_manager(caller, "sync reserves")?;

        let mut ledger = self.ledger.read().clone();
        let assets = ledger.assets().to_vec();
        ledger.update_tokens(&self.address, assets, self.deps.bank.as_ref())?;
        let reserves = ledger.reserves().to_vec();
        let event = BasketEvent::ReservesSynced {
            basket: self.address,
            assets: ledger.assets().to_vec(),
            reserves: reserves.clone(),
        };
        self.install(ledger, vec![event]);
        Ok(reserves)
    }

    /// Replace the asset list and weights, then resync reserves.
    pub fn update_composition(
        &self,
        caller: &Address,
        assets: Vec<AssetId>,
        weights: Vec<Bps>,
    ) -> Result<(), ControllerError> {
        let _token = self.guard.enter()?;
        self.ensure_manager(caller, "update composition")?;
        validate_weights(assets.len(), &weights)?;
        ensure_listed(self.deps.bank.as_ref(), &assets)?;

        let mut ledger = self.ledger.read().clone();
        ledger.update_tokens(&self.address, assets, self.deps.bank.as_ref())?;
        let events = vec![
            BasketEvent::ReservesSynced {
                basket: self.address,
                assets: ledger.assets().to_vec(),
                reserves: ledger.reserves().to_vec(),
            },
            BasketEvent::WeightsUpdated {
                basket: self.address,
                weights: weights.clone(),
            },
        ];
        *self.weights.write() = weights;
        self.install(ledger, events);
        Ok(())
    }

    /// Sweep every custody balance out of the ledger and forward it to the
    /// manager. Claims stay outstanding; reserves drop to zero until the
    /// assets are returned and [`BasketController::sync_reserves`] runs.
    pub fn emergency_withdraw(
        &self,
        caller: &Address,
    ) -> Result<Vec<(AssetId, Amount)>, ControllerError> {
        let _token = self.guard.enter()?;
        self.ensure_manager(caller, "emergency withdraw")?;

        let mut ledger = self.ledger.read().clone();
        let mut tx = BankTransaction::begin(self.deps.bank.as_ref());
        let swept = ledger.transfer_tokens_to_owner(&self.address, &mut tx)?;
        let assets = ledger.assets().to_vec();
        for (asset, amount) in assets.iter().zip(&swept) {
            tx.transfer(asset, &self.address, caller, *amount)?;
        }

        let event = BasketEvent::ReservesSynced {
            basket: self.address,
            assets: assets.clone(),
            reserves: ledger.reserves().to_vec(),
        };
        self.commit(tx, ledger, vec![event]);

        warn!(basket = %self.address, manager = %caller, swept = ?swept, "Emergency withdrawal executed");
        Ok(assets.into_iter().zip(swept).collect())
    }

    // =========================================================================
    // Claim token passthroughs
    // =========================================================================

    pub fn approve_claims(
        &self,
        holder: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), ControllerError> {
        let _token = self.guard.enter()?;
        self.ledger.write().approve(holder, spender, amount)?;
        debug!(holder = %holder, spender = %spender, amount, "Claim allowance set");
        Ok(())
    }

    pub fn transfer_claims(
        &self,
        holder: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), ControllerError> {
        let _token = self.guard.enter()?;
        self.ledger.write().transfer(holder, to, amount)?;
        debug!(from = %holder, to = %to, amount, "Claim units transferred");
        Ok(())
    }

    pub fn claim_balance_of(&self, holder: &Address) -> Amount {
        self.ledger.read().balance_of(holder)
    }

    pub fn claim_allowance(&self, holder: &Address, spender: &Address) -> Amount {
        self.ledger.read().allowance(holder, spender)
    }

    pub fn claim_supply(&self) -> Amount {
        self.ledger.read().total_supply()
    }

    // =========================================================================
    // Previews
    // =========================================================================

    /// Fee, split, quotes and expected units of contributing `amount_in` now.
    pub fn preview_contribution(&self, amount_in: Amount) -> Result<ContributionPreview, ControllerError> {
        let fees = self.deps.platform.platform_fee_config();
        let fee_amount = math::bps_of(amount_in, fees.bps_for(FeeAction::Contribute))?;
        let net_amount = checked_sub(amount_in, fee_amount)?;
        let portions = split_by_weights(net_amount, &self.weights.read())?;

        let ledger = self.ledger.read().clone();
        let mut quoted_outputs = Vec::with_capacity(portions.len());
        for (asset, portion) in ledger.assets().iter().zip(&portions) {
            let quoted = if *portion == 0 || *asset == self.base_asset {
                *portion
            } else {
                let path = [self.base_asset.clone(), asset.clone()];
                self.deps
                    .exchange
                    .get_amounts_out(*portion, &path)?
                    .last()
                    .copied()
                    .unwrap_or(0)
            };
            quoted_outputs.push(quoted);
        }
        let expected_units = ledger.preview_mint(&quoted_outputs)?;

        debug!(amount_in, fee_amount, expected_units, "Previewed contribution");
        Ok(ContributionPreview {
            fee_amount,
            net_amount,
            portions,
            quoted_outputs,
            expected_units,
        })
    }

    /// Claim units an evenly split base amount would mint.
    pub fn preview_share_lp(&self, base_amount: Amount) -> Result<Amount, ControllerError> {
        Ok(self.ledger.read().calculate_share_lp(base_amount)?)
    }

    /// Per-asset payout of redeeming `claim_amount`, before fees.
    pub fn preview_share_tokens(&self, claim_amount: Amount) -> Result<Vec<Amount>, ControllerError> {
        Ok(self.ledger.read().calculate_share_tokens(claim_amount)?)
    }

    /// Base-asset value of redeeming `claim_amount`, before fees.
    pub fn preview_share_eth(&self, claim_amount: Amount) -> Result<Amount, ControllerError> {
        Ok(self.ledger.read().calculate_share_eth(
            claim_amount,
            self.deps.exchange.as_ref(),
            &self.base_asset,
        )?)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn ledger_address(&self) -> Address {
        self.ledger.read().address()
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn base_asset(&self) -> &AssetId {
        &self.base_asset
    }

    pub fn assets(&self) -> Vec<AssetId> {
        self.ledger.read().assets().to_vec()
    }

    pub fn weights(&self) -> Vec<Bps> {
        self.weights.read().clone()
    }

    pub fn reserves(&self) -> Vec<Amount> {
        self.ledger.read().reserves().to_vec()
    }

    pub fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.ledger.read().snapshot()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_contribution(&self, amount_in: Amount, ctx: &CallContext) -> Result<(), ControllerError> {
        if amount_in == 0 {
            return Err(ControllerError::ZeroContributionAmount);
        }
        ctx.ensure_not_expired(self.deps.clock.now())?;
        ctx.ensure_valid_buffer()?;
        Ok(())
    }

    fn check_withdrawal(&self, claim_amount: Amount, ctx: &CallContext) -> Result<(), ControllerError> {
        let minimum = self.deps.platform.min_lp_withdrawal();
        if claim_amount == 0 || claim_amount < minimum {
            return Err(ControllerError::InvalidWithdrawalAmount {
                amount: claim_amount,
                minimum,
            });
        }
        ctx.ensure_not_expired(self.deps.clock.now())?;
        ctx.ensure_valid_buffer()?;
        Ok(())
    }

    fn ensure_manager(&self, caller: &Address, action: &'static str) -> Result<(), ControllerError> {
        let role = Role::BasketManager {
            basket: self.address,
        };
        if !self.deps.access.check_role(caller, &role) {
            warn!(basket = %self.address, caller = %caller, action, "Manager check failed");
            return Err(ControllerError::Unauthorized {
                caller: *caller,
                action,
            });
        }
        Ok(())
    }

    /// Shared body of contribute and seed_contribution.
    fn deposit(
        &self,
        payer: &Address,
        amount_in: Amount,
        ctx: &CallContext,
        action: FeeAction,
    ) -> Result<ContributionReceipt, ControllerError> {
        let fees = self.deps.platform.platform_fee_config();
        let fee_bps = fees.bps_for(action);
        let fee_amount = math::bps_of(amount_in, fee_bps)?;
        let net_amount = checked_sub(amount_in, fee_amount)?;
        let portions = split_by_weights(net_amount, &self.weights.read())?;

        let mut ledger = self.ledger.read().clone();
        let mut tx = BankTransaction::begin(self.deps.bank.as_ref());
        let mut events = Vec::new();

        tx.transfer(&self.base_asset, payer, &self.address, amount_in)?;
        if fee_amount > 0 {
            tx.transfer(&self.base_asset, &self.address, &fees.fee_collector, fee_amount)?;
            events.push(BasketEvent::PlatformFeeDeducted {
                fee_amount,
                fee_percent_bps: fee_bps,
                fee_collector: fees.fee_collector,
                action,
            });
        }

        let ledger_address = ledger.address();
        let assets = ledger.assets().to_vec();
        let mut deposits = Vec::with_capacity(assets.len());
        for (asset, portion) in assets.iter().zip(&portions) {
            let received = if *portion == 0 {
                0
            } else if *asset == self.base_asset {
                tx.transfer(asset, &self.address, &ledger_address, *portion)?;
                *portion
            } else {
                let path = vec![self.base_asset.clone(), asset.clone()];
                self.swap(&mut tx, *portion, path, &ledger_address, ctx)?
            };
            deposits.push(received);
        }

        let minted = ledger.mint(&self.address, payer, &deposits, tx.bank())?;
        events.push(BasketEvent::ContributedToBts {
            user: *payer,
            amount: amount_in,
        });

        self.commit(tx, ledger, events);

        let receipt = ContributionReceipt {
            operation_id: Uuid::new_v4(),
            contributor: *payer,
            amount_in,
            fee_amount,
            net_amount,
            deposits,
            minted_units: minted,
        };
        info!(
            basket = %self.address,
            operation = %receipt.operation_id,
            contributor = %payer,
            action = %action,
            amount_in,
            fee_amount,
            minted,
            "Contribution committed"
        );
        Ok(receipt)
    }

    /// Pull `claim_amount` of the caller's claims into ledger custody and burn
    /// them, paying the reserves out to the controller.
    fn redeem(
        &self,
        ledger: &mut BasketLedger,
        tx: &mut BankTransaction<'_>,
        caller: &Address,
        claim_amount: Amount,
    ) -> Result<basket_ledger::BurnReceipt, ControllerError> {
        let custody = ledger.address();
        ledger.transfer_from(&self.address, caller, &custody, claim_amount)?;
        Ok(ledger.burn(&self.address, &self.address, tx)?)
    }

    /// Swap along `path` with a minimum output derived from the current quote
    /// and the caller's slippage buffer.
    fn swap(
        &self,
        tx: &mut BankTransaction<'_>,
        amount_in: Amount,
        path: Vec<AssetId>,
        recipient: &Address,
        ctx: &CallContext,
    ) -> Result<Amount, ControllerError> {
        let asset_out = path.last().cloned().unwrap_or_else(|| self.base_asset.clone());
        let quoted = self
            .deps
            .exchange
            .get_amounts_out(amount_in, &path)?
            .last()
            .copied()
            .unwrap_or(0);
        let minimum = math::apply_slippage(quoted, ctx.slippage_buffer_bps)?;

        let request = SwapRequest {
            amount_in,
            min_amount_out: minimum,
            path,
            payer: self.address,
            recipient: *recipient,
            deadline: ctx.deadline,
        };
        let received = self
            .deps
            .exchange
            .swap_exact_tokens_for_tokens(tx, &request)
            .map_err(|e| {
                warn!(basket = %self.address, asset = %asset_out, error = %e, "Swap rejected");
                e
            })?;
        if received < minimum {
            warn!(basket = %self.address, asset = %asset_out, received, minimum, "Swap output below tolerance");
            return Err(ControllerError::SlippageExceeded {
                asset: asset_out,
                received,
                minimum,
            });
        }
        debug!(asset = %asset_out, amount_in, quoted, received, "Swap leg settled");
        Ok(received)
    }

    fn commit(&self, tx: BankTransaction<'_>, ledger: BasketLedger, events: Vec<BasketEvent>) {
        let transfers = tx.commit();
        debug!(basket = %self.address, transfers = transfers.len(), "Bank transaction committed");
        self.install(ledger, events);
    }

    fn install(&self, ledger: BasketLedger, events: Vec<BasketEvent>) {
        *self.ledger.write() = ledger;
        for event in events {
            info!(basket = %self.address, event = event.name(), "Event published");
            self.deps.events.publish(event);
        }
    }
}

fn ensure_listed(bank: &dyn TokenBank, assets: &[AssetId]) -> Result<(), ControllerError> {
    match assets.iter().find(|asset| !bank.is_listed(asset)) {
        Some(asset) => Err(ControllerError::UnlistedAsset(asset.clone())),
        None => Ok(()),
    }
}
