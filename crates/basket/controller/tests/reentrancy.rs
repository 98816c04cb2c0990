//! Exchange callbacks that call back into the basket mid-swap.

mod common;

use std::sync::{Arc, Weak};

use basket_controller::{BasketController, ControllerError};
use basket_host::SwapRequest;
use basket_types::CallContext;
use chrono::{Duration, Utc};
use common::*;
use parking_lot::Mutex;

type Outcomes = Arc<Mutex<Vec<ControllerError>>>;

fn far_deadline() -> CallContext {
    CallContext::new(Utc::now() + Duration::days(365 * 10), 100)
}

/// Install a hook that runs `attack` against the controller on every swap and
/// records the error it gets back.
fn arm<F>(h: &Harness, attack: F) -> Outcomes
where
    F: Fn(&BasketController) -> Result<(), ControllerError> + Send + Sync + 'static,
{
    let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
    let seen = outcomes.clone();
    let controller: Weak<BasketController> = Arc::downgrade(&h.controller);
    h.exchange.set_hook(Some(Arc::new(move |_req: &SwapRequest| {
        if let Some(controller) = controller.upgrade() {
            if let Err(e) = attack(&controller) {
                seen.lock().push(e);
            }
        }
    })));
    outcomes
}

#[test]
fn nested_contribute_fails_and_outer_completes() {
    let h = Harness::new();
    let outcomes = arm(&h, |c| c.contribute(&bob(), 200, &far_deadline()).map(|_| ()));

    let receipt = h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    assert_eq!(receipt.minted_units, 1_000);

    let outcomes = outcomes.lock();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|e| *e == ControllerError::ReentrantCall));
    assert_eq!(h.controller.claim_balance_of(&bob()), 0);
    assert_eq!(h.controller.claim_supply(), 1_000);
    assert_eq!(h.holder_sum(), h.controller.claim_supply());
}

#[test]
fn nested_withdraw_during_eth_withdrawal_fails() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    c.contribute(&bob(), 200, &h.ctx(100)).unwrap();
    h.approve(&alice(), 1_000);
    h.approve(&bob(), 1_000);

    let outcomes = arm(&h, |c| c.withdraw(&bob(), 1_000, &far_deadline()).map(|_| ()));
    let receipt = c.withdraw_eth(&alice(), 1_000, &h.ctx(100)).unwrap();
    assert_eq!(receipt.eth_amount, 200);

    assert!(outcomes.lock().iter().all(|e| *e == ControllerError::ReentrantCall));
    assert_eq!(c.claim_balance_of(&bob()), 1_000);
    assert_eq!(c.claim_supply(), 1_000);
    assert_eq!(c.reserves(), vec![100, 100]);
}

#[test]
fn nested_claim_transfer_and_manager_ops_fail() {
    let h = Harness::new();
    let outcomes = arm(&h, |c| {
        c.transfer_claims(&alice(), &bob(), 1)?;
        Ok(())
    });
    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    assert!(outcomes.lock().iter().all(|e| *e == ControllerError::ReentrantCall));

    let outcomes = arm(&h, |c| c.sync_reserves(&manager()).map(|_| ()));
    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    assert_eq!(outcomes.lock().len(), 2);
    assert!(outcomes.lock().iter().all(|e| *e == ControllerError::ReentrantCall));
}

#[test]
fn reads_are_allowed_mid_flight_and_see_committed_state() {
    let h = Harness::new();
    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let controller = Arc::downgrade(&h.controller);
    h.exchange.set_hook(Some(Arc::new(move |_req: &SwapRequest| {
        if let Some(controller) = controller.upgrade() {
            sink.lock().push(controller.claim_supply());
        }
    })));

    h.controller.contribute(&bob(), 200, &h.ctx(100)).unwrap();
    assert_eq!(*observed.lock(), vec![1_000, 1_000]);
    assert_eq!(h.controller.claim_supply(), 2_000);
}

#[test]
fn independent_baskets_run_concurrently() {
    let first = Harness::new();
    let second = Harness::new();

    std::thread::scope(|scope| {
        for h in [&first, &second] {
            scope.spawn(move || {
                for _ in 0..20 {
                    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
                }
            });
        }
    });

    for h in [&first, &second] {
        assert_eq!(h.controller.claim_supply(), 20_000);
        assert_eq!(h.controller.reserves(), vec![2_000, 2_000]);
    }
}
