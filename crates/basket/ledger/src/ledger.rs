use std::collections::BTreeSet;

use basket_host::{BankTransaction, Exchange, TokenBank};
use basket_types::math::{self, checked_add, checked_sub};
use basket_types::{Address, Amount, AssetId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::claim::ClaimToken;
use crate::config::LedgerConfig;
use crate::error::LedgerError;

/// Outcome of a burn: the units destroyed and what each asset paid out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnReceipt {
    pub burned_units: Amount,
    pub assets: Vec<AssetId>,
    pub payouts: Vec<Amount>,
}

/// Point-in-time view of a ledger, comparable before and after an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub address: Address,
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub assets: Vec<AssetId>,
    pub reserves: Vec<Amount>,
    pub claim_supply: Amount,
    pub holders: Vec<(Address, Amount)>,
}

/// The reserve ledger of one basket.
///
/// Owns the ordered asset list, the parallel reserve vector and the claim
/// token. Pure proportional accounting: it never swaps and never takes fees.
/// Mutating entry points take the caller explicitly and reject anyone but the
/// owning controller before touching state.
#[derive(Clone, Debug)]
pub struct BasketLedger {
    address: Address,
    config: LedgerConfig,
    owner: Address,
    name: String,
    symbol: String,
    assets: Vec<AssetId>,
    reserves: Vec<Amount>,
    claims: ClaimToken,
    initialized: bool,
}

impl BasketLedger {
    /// Create an uninitialized ledger custodying assets at `address`.
    pub fn new(address: Address, config: LedgerConfig) -> Self {
        Self {
            address,
            config,
            owner: Address::ZERO,
            name: String::new(),
            symbol: String::new(),
            assets: Vec::new(),
            reserves: Vec::new(),
            claims: ClaimToken::new(),
            initialized: false,
        }
    }

    /// One-time setup: owner, claim-token naming, asset list, zero reserves.
    pub fn initialize(
        &mut self,
        owner: Address,
        name: &str,
        assets: Vec<AssetId>,
    ) -> Result<(), LedgerError> {
        if self.initialized {
            return Err(LedgerError::AlreadyInitialized);
        }
        validate_assets(&assets)?;
        if name.trim().is_empty() {
            return Err(LedgerError::EmptyStringParameter("name"));
        }
        if owner.is_zero() {
            return Err(LedgerError::InvalidOwner);
        }

        self.owner = owner;
        self.name = format!("{}-LP", name);
        self.symbol = format!("{}-LP", name);
        self.reserves = vec![0; assets.len()];
        self.assets = assets;
        self.initialized = true;

        info!(
            ledger = %self.address,
            owner = %owner,
            name = %self.name,
            assets = self.assets.len(),
            "Ledger initialized"
        );
        Ok(())
    }

    /// Replace the asset list and resync every reserve to the custody balance.
    pub fn update_tokens(
        &mut self,
        caller: &Address,
        assets: Vec<AssetId>,
        bank: &dyn TokenBank,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        validate_assets(&assets)?;

        let reserves: Vec<Amount> = assets
            .iter()
            .map(|asset| bank.balance_of(asset, &self.address))
            .collect();

        info!(
            ledger = %self.address,
            assets = assets.len(),
            reserves = ?reserves,
            "Ledger tokens updated and reserves resynced"
        );
        self.assets = assets;
        self.reserves = reserves;
        Ok(())
    }

    /// Credit `recipient` with claim units for assets already in custody.
    ///
    /// The first deposit into an empty basket mints the configured bootstrap
    /// quantity; later deposits mint `min_i(deposited[i] * supply / reserves[i])`.
    /// A reserve of zero while claims are outstanding is rejected as
    /// desynchronized rather than skipped.
    pub fn mint(
        &mut self,
        caller: &Address,
        recipient: &Address,
        deposited: &[Amount],
        bank: &dyn TokenBank,
    ) -> Result<Amount, LedgerError> {
        self.ensure_owner(caller)?;
        if recipient.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let minted = self.preview_mint(deposited)?;

        let mut reserves = Vec::with_capacity(self.reserves.len());
        for (i, asset) in self.assets.iter().enumerate() {
            let next = checked_add(self.reserves[i], deposited[i])?;
            let custody = bank.balance_of(asset, &self.address);
            if next > custody {
                return Err(LedgerError::UntrackedDeposit {
                    asset: asset.clone(),
                    claimed: next,
                    custody,
                });
            }
            reserves.push(next);
        }

        self.claims.mint(recipient, minted)?;
        self.reserves = reserves;

        info!(
            ledger = %self.address,
            recipient = %recipient,
            minted,
            supply = self.claims.total_supply(),
            "Claim units minted"
        );
        Ok(minted)
    }

    /// Destroy the claim units staged in the ledger's own custody and pay the
    /// proportional slice of every reserve to `recipient`.
    pub fn burn(
        &mut self,
        caller: &Address,
        recipient: &Address,
        tx: &mut BankTransaction<'_>,
    ) -> Result<BurnReceipt, LedgerError> {
        self.ensure_owner(caller)?;
        if recipient.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let supply = self.claims.total_supply();
        if supply == 0 {
            return Err(LedgerError::InsufficientLiquidity("no claims outstanding".into()));
        }
        let burned = self.claims.balance_of(&self.address);
        if burned == 0 {
            return Err(LedgerError::InsufficientLiquidity(
                "no claim units staged for burning".into(),
            ));
        }

        let payouts = self.proportional(burned, supply)?;
        if payouts.iter().all(|payout| *payout == 0) {
            return Err(LedgerError::InsufficientLiquidity("burn pays out nothing".into()));
        }
        let mut reserves = Vec::with_capacity(self.reserves.len());
        for (reserve, payout) in self.reserves.iter().zip(&payouts) {
            reserves.push(checked_sub(*reserve, *payout)?);
        }

        for (asset, payout) in self.assets.iter().zip(&payouts) {
            tx.transfer(asset, &self.address, recipient, *payout)?;
        }

        self.claims.burn(&self.address, burned)?;
        self.reserves = reserves;

        info!(
            ledger = %self.address,
            recipient = %recipient,
            burned,
            supply = self.claims.total_supply(),
            "Claim units burned"
        );
        Ok(BurnReceipt {
            burned_units: burned,
            assets: self.assets.clone(),
            payouts,
        })
    }

    /// Units a mint of `deposited` would credit, without touching state.
    pub fn preview_mint(&self, deposited: &[Amount]) -> Result<Amount, LedgerError> {
        self.ensure_initialized()?;
        self.ensure_aligned(deposited)?;

        let supply = self.claims.total_supply();
        if supply == 0 {
            if deposited.iter().any(|amount| *amount == 0) {
                return Err(LedgerError::InsufficientLiquidity(
                    "first deposit must include every asset".into(),
                ));
            }
            return Ok(self.config.bootstrap_units);
        }
        let minted = self.min_ratio(deposited, supply)?;
        if minted == 0 {
            return Err(LedgerError::InsufficientLiquidityMinted);
        }
        Ok(minted)
    }

    /// Preview the claim units a base-asset amount would mint, assuming an
    /// even split across every asset.
    pub fn calculate_share_lp(&self, base_amount: Amount) -> Result<Amount, LedgerError> {
        self.ensure_initialized()?;
        let supply = self.claims.total_supply();
        if supply == 0 {
            return Ok(self.config.bootstrap_units);
        }
        let per_asset = base_amount / self.assets.len() as Amount;
        let deposits = vec![per_asset; self.assets.len()];
        let share = self.min_ratio(&deposits, supply)?;
        debug!(base_amount, share, "Previewed claim units");
        Ok(share)
    }

    /// Preview the base-asset value of `claim_amount`, priced by `exchange`.
    pub fn calculate_share_eth(
        &self,
        claim_amount: Amount,
        exchange: &dyn Exchange,
        base_asset: &AssetId,
    ) -> Result<Amount, LedgerError> {
        let shares = self.calculate_share_tokens(claim_amount)?;
        let mut total: Amount = 0;
        for (asset, amount) in self.assets.iter().zip(shares) {
            let value = if asset == base_asset || amount == 0 {
                amount
            } else {
                let path = [asset.clone(), base_asset.clone()];
                exchange
                    .get_amounts_out(amount, &path)?
                    .last()
                    .copied()
                    .unwrap_or(0)
            };
            total = checked_add(total, value)?;
        }
        debug!(claim_amount, value = total, "Previewed base-asset value");
        Ok(total)
    }

    /// Preview the per-asset payout of `claim_amount`. Same formula as burn.
    pub fn calculate_share_tokens(&self, claim_amount: Amount) -> Result<Vec<Amount>, LedgerError> {
        self.ensure_initialized()?;
        let supply = self.claims.total_supply();
        if supply == 0 {
            return Err(LedgerError::InsufficientLiquidity("no claims outstanding".into()));
        }
        if claim_amount > supply {
            return Err(LedgerError::ExceedsSupply {
                requested: claim_amount,
                supply,
            });
        }
        self.proportional(claim_amount, supply)
    }

    /// Emergency sweep: move the entire custody balance of every asset to the
    /// owner, bypassing claim accounting.
    ///
    /// Reserves drop to zero so they never exceed custody; claims are left
    /// untouched and the basket stays unusable until assets are returned and
    /// [`BasketLedger::update_tokens`] resyncs.
    pub fn transfer_tokens_to_owner(
        &mut self,
        caller: &Address,
        tx: &mut BankTransaction<'_>,
    ) -> Result<Vec<Amount>, LedgerError> {
        self.ensure_owner(caller)?;
        let mut swept = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let balance = tx.balance_of(asset, &self.address);
            tx.transfer(asset, &self.address, &self.owner, balance)?;
            swept.push(balance);
        }
        self.reserves = vec![0; self.assets.len()];

        info!(ledger = %self.address, owner = %self.owner, swept = ?swept, "Custody swept to owner");
        Ok(swept)
    }

    // --- Claim token surface ---

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.claims.approve(owner, spender, amount)
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.claims.transfer(from, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.claims.transfer_from(spender, from, to, amount)
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.claims.balance_of(holder)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.claims.allowance(owner, spender)
    }

    pub fn total_supply(&self) -> Amount {
        self.claims.total_supply()
    }

    // --- Accessors ---

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn reserves(&self) -> &[Amount] {
        &self.reserves
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn claims(&self) -> &ClaimToken {
        &self.claims
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            address: self.address,
            owner: self.owner,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            assets: self.assets.clone(),
            reserves: self.reserves.clone(),
            claim_supply: self.claims.total_supply(),
            holders: self.claims.holders(),
        }
    }

    // --- Internals ---

    fn ensure_initialized(&self) -> Result<(), LedgerError> {
        if !self.initialized {
            return Err(LedgerError::NotInitialized);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        self.ensure_initialized()?;
        if *caller != self.owner {
            return Err(LedgerError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn ensure_aligned(&self, amounts: &[Amount]) -> Result<(), LedgerError> {
        if amounts.len() != self.assets.len() {
            return Err(LedgerError::LengthMismatch {
                expected: self.assets.len(),
                actual: amounts.len(),
            });
        }
        Ok(())
    }

    /// `min_i(deposited[i] * supply / reserves[i])`.
    fn min_ratio(&self, deposited: &[Amount], supply: Amount) -> Result<Amount, LedgerError> {
        let mut minted: Option<Amount> = None;
        for ((asset, reserve), amount) in self.assets.iter().zip(&self.reserves).zip(deposited) {
            if *reserve == 0 {
                return Err(LedgerError::ReserveDesynchronized {
                    asset: asset.clone(),
                });
            }
            let units = math::mul_div(*amount, supply, *reserve)?;
            minted = Some(minted.map_or(units, |current| current.min(units)));
        }
        Ok(minted.unwrap_or(0))
    }

    /// `reserves[i] * units / supply` for every asset.
    fn proportional(&self, units: Amount, supply: Amount) -> Result<Vec<Amount>, LedgerError> {
        self.reserves
            .iter()
            .map(|reserve| math::mul_div(*reserve, units, supply).map_err(LedgerError::from))
            .collect()
    }
}

fn validate_assets(assets: &[AssetId]) -> Result<(), LedgerError> {
    if assets.is_empty() {
        return Err(LedgerError::InvalidToken("asset list is empty".into()));
    }
    let mut seen = BTreeSet::new();
    for asset in assets {
        if asset.is_empty() {
            return Err(LedgerError::InvalidToken("asset identifier is empty".into()));
        }
        if !seen.insert(asset) {
            return Err(LedgerError::InvalidToken(format!("duplicate asset {}", asset)));
        }
    }
    Ok(())
}
