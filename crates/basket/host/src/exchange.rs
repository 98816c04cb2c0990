use std::collections::HashMap;
use std::sync::Arc;

use basket_types::math::{self, Amount, Bps, BPS_DENOMINATOR};
use basket_types::{Address, AssetId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::ExchangeError;
use crate::transaction::BankTransaction;

/// A swap order: spend exactly `amount_in` of `path[0]`, receive at least
/// `min_amount_out` of the last asset in `path`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    pub path: Vec<AssetId>,
    /// Debited for `amount_in`
    pub payer: Address,
    /// Credited with the output
    pub recipient: Address,
    pub deadline: DateTime<Utc>,
}

/// The external component converting between assets at a quoted price.
///
/// A swap either fully succeeds (payer debited, recipient credited, both
/// inside the caller's transaction) or fails without moving anything it did
/// not journal.
pub trait Exchange: Send + Sync {
    /// Account that custodies the exchange's inventory.
    fn address(&self) -> Address;

    /// Quote a swap along `path`. The result has one entry per path element;
    /// the first is `amount_in`.
    fn get_amounts_out(&self, amount_in: Amount, path: &[AssetId]) -> Result<Vec<Amount>, ExchangeError>;

    /// Execute a swap, returning the amount delivered to the recipient.
    fn swap_exact_tokens_for_tokens(
        &self,
        tx: &mut BankTransaction<'_>,
        request: &SwapRequest,
    ) -> Result<Amount, ExchangeError>;
}

/// Callback invoked mid-swap, after the input has been pulled and before the
/// output is delivered. Models token callbacks that hand control to third
/// parties during a swap.
pub type SwapHook = Arc<dyn Fn(&SwapRequest) + Send + Sync>;

#[derive(Default)]
struct RateBook {
    /// Value of one minor unit of each asset, in a common numeraire
    prices: HashMap<AssetId, Amount>,
    /// Shortfall of executed output against the quote
    haircut_bps: Bps,
    halted: bool,
}

/// Reference exchange settling at fixed prices out of its own inventory.
///
/// Output along each hop is `amount * price(from) / price(to)`, rounded down.
pub struct FixedRateExchange {
    address: Address,
    clock: Arc<dyn Clock>,
    book: RwLock<RateBook>,
    hook: RwLock<Option<SwapHook>>,
}

impl FixedRateExchange {
    pub fn new(address: Address, clock: Arc<dyn Clock>) -> Self {
        Self {
            address,
            clock,
            book: RwLock::new(RateBook::default()),
            hook: RwLock::new(None),
        }
    }

    pub fn set_price(&self, asset: AssetId, price: Amount) {
        debug!(asset = %asset, price, "Exchange price set");
        self.book.write().prices.insert(asset, price);
    }

    /// Deliver `haircut_bps` less than quoted on every swap.
    pub fn set_haircut_bps(&self, haircut_bps: Bps) {
        self.book.write().haircut_bps = haircut_bps;
    }

    /// Reject every swap while halted.
    pub fn set_halted(&self, halted: bool) {
        self.book.write().halted = halted;
    }

    pub fn set_hook(&self, hook: Option<SwapHook>) {
        *self.hook.write() = hook;
    }

    fn price(book: &RateBook, asset: &AssetId) -> Result<Amount, ExchangeError> {
        match book.prices.get(asset) {
            Some(price) if *price > 0 => Ok(*price),
            _ => Err(ExchangeError::UnknownAsset(asset.clone())),
        }
    }

    fn quote(book: &RateBook, amount_in: Amount, path: &[AssetId]) -> Result<Vec<Amount>, ExchangeError> {
        if path.len() < 2 {
            return Err(ExchangeError::InvalidPath(format!(
                "path needs at least two assets, got {}",
                path.len()
            )));
        }
        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);
        let mut current = amount_in;
        for hop in path.windows(2) {
            if hop[0] == hop[1] {
                return Err(ExchangeError::InvalidPath(format!("identical hop {}", hop[0])));
            }
            let from = Self::price(book, &hop[0])?;
            let to = Self::price(book, &hop[1])?;
            current = math::mul_div(current, from, to)?;
            amounts.push(current);
        }
        Ok(amounts)
    }
}

impl Exchange for FixedRateExchange {
    fn address(&self) -> Address {
        self.address
    }

    fn get_amounts_out(&self, amount_in: Amount, path: &[AssetId]) -> Result<Vec<Amount>, ExchangeError> {
        let book = self.book.read();
        Self::quote(&book, amount_in, path)
    }

    fn swap_exact_tokens_for_tokens(
        &self,
        tx: &mut BankTransaction<'_>,
        request: &SwapRequest,
    ) -> Result<Amount, ExchangeError> {
        let amount_out = {
            let book = self.book.read();
            if book.halted {
                return Err(ExchangeError::Halted);
            }
            let quoted = Self::quote(&book, request.amount_in, &request.path)?;
            let last = quoted.last().copied().unwrap_or_default();
            math::mul_div(last, BPS_DENOMINATOR - book.haircut_bps.min(10_000) as u128, BPS_DENOMINATOR)?
        };

        if self.clock.now() > request.deadline {
            return Err(ExchangeError::Expired);
        }
        if amount_out < request.min_amount_out {
            warn!(
                actual = amount_out,
                minimum = request.min_amount_out,
                "Swap output below minimum"
            );
            return Err(ExchangeError::InsufficientOutputAmount {
                actual: amount_out,
                minimum: request.min_amount_out,
            });
        }

        let (asset_in, asset_out) = match (request.path.first(), request.path.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ExchangeError::InvalidPath("empty path".into())),
        };

        tx.transfer(asset_in, &request.payer, &self.address, request.amount_in)?;

        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            hook(request);
        }

        tx.transfer(asset_out, &self.address, &request.recipient, amount_out)?;

        debug!(
            asset_in = %asset_in,
            asset_out = %asset_out,
            amount_in = request.amount_in,
            amount_out,
            "Swap executed"
        );
        Ok(amount_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{InMemoryBank, TokenBank};
    use crate::clock::ManualClock;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        bank: InMemoryBank,
        clock: Arc<ManualClock>,
        exchange: FixedRateExchange,
        trader: Address,
    }

    fn weth() -> AssetId {
        AssetId::new("WETH")
    }

    fn wbtc() -> AssetId {
        AssetId::new("WBTC")
    }

    fn fixture() -> Fixture {
        let bank = InMemoryBank::new();
        bank.list_asset(weth());
        bank.list_asset(wbtc());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let exchange = FixedRateExchange::new(Address::derive("router"), clock.clone());
        exchange.set_price(weth(), 1);
        exchange.set_price(wbtc(), 20);
        bank.mint(&wbtc(), &exchange.address(), 1_000_000).unwrap();
        bank.mint(&weth(), &exchange.address(), 1_000_000).unwrap();
        let trader = Address::derive("trader");
        bank.mint(&weth(), &trader, 10_000).unwrap();
        Fixture {
            bank,
            clock,
            exchange,
            trader,
        }
    }

    fn request(f: &Fixture, amount_in: Amount, min_out: Amount) -> SwapRequest {
        SwapRequest {
            amount_in,
            min_amount_out: min_out,
            path: vec![weth(), wbtc()],
            payer: f.trader,
            recipient: f.trader,
            deadline: f.clock.now() + Duration::minutes(5),
        }
    }

    #[test]
    fn quotes_follow_prices() {
        let f = fixture();
        let amounts = f.exchange.get_amounts_out(2_000, &[weth(), wbtc()]).unwrap();
        assert_eq!(amounts, vec![2_000, 100]);
        let back = f.exchange.get_amounts_out(100, &[wbtc(), weth()]).unwrap();
        assert_eq!(back, vec![100, 2_000]);
    }

    #[test]
    fn quote_rejects_bad_paths() {
        let f = fixture();
        assert!(matches!(
            f.exchange.get_amounts_out(1, &[weth()]),
            Err(ExchangeError::InvalidPath(_))
        ));
        assert!(matches!(
            f.exchange.get_amounts_out(1, &[weth(), AssetId::new("DOGE")]),
            Err(ExchangeError::UnknownAsset(_))
        ));
    }

    #[test]
    fn swap_moves_funds_inside_transaction() {
        let f = fixture();
        let mut tx = BankTransaction::begin(&f.bank);
        let out = f
            .exchange
            .swap_exact_tokens_for_tokens(&mut tx, &request(&f, 2_000, 100))
            .unwrap();
        assert_eq!(out, 100);
        tx.commit();
        assert_eq!(f.bank.balance_of(&weth(), &f.trader), 8_000);
        assert_eq!(f.bank.balance_of(&wbtc(), &f.trader), 100);
    }

    #[test]
    fn haircut_trips_minimum_output() {
        let f = fixture();
        f.exchange.set_haircut_bps(200);
        let mut tx = BankTransaction::begin(&f.bank);
        let err = f
            .exchange
            .swap_exact_tokens_for_tokens(&mut tx, &request(&f, 2_000, 99))
            .unwrap_err();
        assert_eq!(
            err,
            ExchangeError::InsufficientOutputAmount {
                actual: 98,
                minimum: 99
            }
        );
        drop(tx);
        assert_eq!(f.bank.balance_of(&weth(), &f.trader), 10_000);
    }

    #[test]
    fn halted_and_expired_swaps_fail() {
        let f = fixture();
        let req = request(&f, 2_000, 0);
        f.exchange.set_halted(true);
        let mut tx = BankTransaction::begin(&f.bank);
        assert_eq!(
            f.exchange.swap_exact_tokens_for_tokens(&mut tx, &req),
            Err(ExchangeError::Halted)
        );
        f.exchange.set_halted(false);
        f.clock.advance(Duration::minutes(10));
        assert_eq!(
            f.exchange.swap_exact_tokens_for_tokens(&mut tx, &req),
            Err(ExchangeError::Expired)
        );
    }

    #[test]
    fn hook_runs_mid_swap() {
        let f = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        f.exchange
            .set_hook(Some(Arc::new(move |_req: &SwapRequest| {
                seen.fetch_add(1, Ordering::SeqCst);
            })));
        let mut tx = BankTransaction::begin(&f.bank);
        f.exchange
            .swap_exact_tokens_for_tokens(&mut tx, &request(&f, 20, 0))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
