//! End-to-end contribute and withdraw flows against the in-memory host.

mod common;

use basket_controller::{ContributionReceipt, ControllerError};
use basket_host::{Exchange, TokenBank};
use basket_ledger::LedgerError;
use basket_types::{Address, AssetId, BasketEvent, FeeAction, Role};
use common::*;

#[test]
fn bootstrap_proportional_mint_and_partial_burn() {
    let h = Harness::new();
    let c = &h.controller;

    let first = c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    assert_eq!(first.deposits, vec![100, 100]);
    assert_eq!(first.minted_units, 1_000);
    assert_eq!(c.reserves(), vec![100, 100]);

    let second = c.contribute(&bob(), 400, &h.ctx(100)).unwrap();
    assert_eq!(second.minted_units, 2_000);
    assert_eq!(c.claim_supply(), 3_000);
    assert_eq!(c.reserves(), vec![300, 300]);

    h.approve(&bob(), 1_500);
    let withdrawal = c.withdraw(&bob(), 1_500, &h.ctx(100)).unwrap();
    assert_eq!(withdrawal.burned_units, 1_500);
    assert_eq!(withdrawal.amounts, vec![150, 150]);
    assert_eq!(c.reserves(), vec![150, 150]);
    assert_eq!(c.claim_supply(), 1_500);
    assert_eq!(h.balance(&wbtc(), &bob()), 150);
    assert_eq!(h.balance(&usdc(), &bob()), 150);
    assert_eq!(h.holder_sum(), c.claim_supply());

    for (asset, reserve) in c.assets().iter().zip(c.reserves()) {
        assert!(reserve <= h.balance(asset, &c.ledger_address()));
    }
}

#[test]
fn contribution_fee_is_floor_of_amount_times_bps() {
    let h = Harness::with_fees(50, 0);
    let amount = 1_000_000_000_000_000_000u128;

    let receipt = h.controller.contribute(&alice(), amount, &h.ctx(100)).unwrap();
    assert_eq!(receipt.fee_amount, 5_000_000_000_000_000);
    assert_eq!(receipt.net_amount, 995_000_000_000_000_000);
    assert_eq!(receipt.fee_amount + receipt.net_amount, amount);
    assert_eq!(h.balance(&weth(), &collector()), receipt.fee_amount);
    assert_eq!(h.balance(&weth(), &alice()), USER_FUNDS - amount);

    let events = h.events.events();
    assert_eq!(
        events[0],
        BasketEvent::PlatformFeeDeducted {
            fee_amount: 5_000_000_000_000_000,
            fee_percent_bps: 50,
            fee_collector: collector(),
            action: FeeAction::Contribute,
        }
    );
    assert_eq!(
        events[1],
        BasketEvent::ContributedToBts {
            user: alice(),
            amount
        }
    );
}

#[test]
fn zero_fee_emits_no_fee_event() {
    let h = Harness::new();
    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    let events = h.events.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], BasketEvent::ContributedToBts { .. }));
}

#[test]
fn zero_contribution_rejected() {
    let h = Harness::new();
    assert_eq!(
        h.controller.contribute(&alice(), 0, &h.ctx(100)),
        Err(ControllerError::ZeroContributionAmount)
    );
}

#[test]
fn withdraw_zero_changes_nothing() {
    let h = Harness::new();
    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    h.events.clear();
    let before = h.balances();

    let err = h.controller.withdraw(&alice(), 0, &h.ctx(100)).unwrap_err();
    assert_eq!(err, ControllerError::InvalidWithdrawalAmount { amount: 0, minimum: 0 });
    assert!(h.events.is_empty());
    assert_eq!(h.balances(), before);
}

#[test]
fn withdrawal_below_minimum_rejected() {
    let h = Harness::build(fees(0, 0), 100, vec![wbtc(), usdc()], vec![5_000, 5_000]);
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    h.approve(&alice(), 1_000);
    let snapshot = c.ledger_snapshot();
    let before = h.balances();

    assert_eq!(
        c.withdraw(&alice(), 99, &h.ctx(100)),
        Err(ControllerError::InvalidWithdrawalAmount {
            amount: 99,
            minimum: 100
        })
    );
    assert_eq!(c.ledger_snapshot(), snapshot);
    assert_eq!(h.balances(), before);

    assert!(c.withdraw(&alice(), 100, &h.ctx(100)).is_ok());
}

#[test]
fn expired_deadline_changes_nothing() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    h.approve(&alice(), 1_000);
    h.events.clear();
    let snapshot = c.ledger_snapshot();
    let before = h.balances();

    assert!(matches!(
        c.contribute(&alice(), 200, &h.expired_ctx()),
        Err(ControllerError::DeadlineInPast { .. })
    ));
    assert!(matches!(
        c.withdraw(&alice(), 500, &h.expired_ctx()),
        Err(ControllerError::DeadlineInPast { .. })
    ));
    assert!(matches!(
        c.withdraw_eth(&alice(), 500, &h.expired_ctx()),
        Err(ControllerError::DeadlineInPast { .. })
    ));

    assert_eq!(c.ledger_snapshot(), snapshot);
    assert_eq!(h.balances(), before);
    assert!(h.events.is_empty());
}

#[test]
fn slippage_buffer_must_stay_below_half() {
    let h = Harness::new();
    assert_eq!(
        h.controller.contribute(&alice(), 200, &h.ctx(5_000)),
        Err(ControllerError::InvalidBuffer {
            buffer: 5_000,
            max: 5_000
        })
    );
}

#[test]
fn withdrawal_fee_taken_per_asset() {
    let h = Harness::with_fees(0, 50);
    let c = &h.controller;
    c.contribute(&alice(), 20_000, &h.ctx(100)).unwrap();
    h.approve(&alice(), 1_000);
    h.events.clear();

    let receipt = c.withdraw(&alice(), 1_000, &h.ctx(100)).unwrap();
    assert_eq!(receipt.fees, vec![50, 50]);
    assert_eq!(receipt.amounts, vec![9_950, 9_950]);
    assert_eq!(h.balance(&wbtc(), &collector()), 50);
    assert_eq!(h.balance(&usdc(), &collector()), 50);
    assert_eq!(h.balance(&wbtc(), &alice()), 9_950);
    assert_eq!(c.claim_supply(), 0);
    assert_eq!(c.reserves(), vec![0, 0]);

    assert_eq!(
        h.events.events(),
        vec![
            BasketEvent::PlatformFeeDeducted {
                fee_amount: 100,
                fee_percent_bps: 50,
                fee_collector: collector(),
                action: FeeAction::WithdrawTokens,
            },
            BasketEvent::WithdrawnFromBts {
                basket: c.address(),
                recipient: alice(),
                assets: vec![wbtc(), usdc()],
                amounts: vec![9_950, 9_950],
            },
        ]
    );
}

#[test]
fn withdraw_eth_swaps_back_and_charges_total() {
    let h = Harness::with_fees(0, 50);
    let c = &h.controller;
    c.contribute(&alice(), 20_000, &h.ctx(100)).unwrap();
    h.approve(&alice(), 1_000);
    h.events.clear();

    let receipt = c.withdraw_eth(&alice(), 1_000, &h.ctx(100)).unwrap();
    assert_eq!(receipt.gross_amount, 20_000);
    assert_eq!(receipt.fee_amount, 100);
    assert_eq!(receipt.eth_amount, 19_900);
    assert_eq!(h.balance(&weth(), &alice()), USER_FUNDS - 100);
    assert_eq!(h.balance(&weth(), &collector()), 100);
    assert_eq!(h.balance(&weth(), &c.address()), 0);

    let events = h.events.events();
    assert!(matches!(
        events[0],
        BasketEvent::PlatformFeeDeducted {
            action: FeeAction::WithdrawEth,
            fee_amount: 100,
            ..
        }
    ));
    assert_eq!(
        events[1],
        BasketEvent::WithdrawnEthFromBts {
            basket: c.address(),
            recipient: alice(),
            eth_amount: 19_900
        }
    );
}

#[test]
fn withdrawal_requires_allowance() {
    let h = Harness::new();
    h.controller.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    assert!(matches!(
        h.controller.withdraw(&alice(), 500, &h.ctx(100)),
        Err(ControllerError::Ledger(LedgerError::InsufficientAllowance { .. }))
    ));
    assert_eq!(h.controller.claim_balance_of(&alice()), 1_000);
}

#[test]
fn base_asset_leg_moves_without_swap() {
    let h = Harness::build(fees(0, 0), 0, vec![weth(), wbtc()], vec![4_000, 6_000]);
    let exchange_weth = h.balance(&weth(), &h.exchange.address());

    let receipt = h.controller.contribute(&alice(), 1_000, &h.ctx(100)).unwrap();
    assert_eq!(receipt.deposits, vec![400, 600]);
    assert_eq!(h.balance(&weth(), &h.controller.ledger_address()), 400);
    assert_eq!(h.balance(&weth(), &h.exchange.address()), exchange_weth + 600);
}

#[test]
fn receive_accepts_only_the_exchange() {
    let h = Harness::new();
    let c = &h.controller;
    assert_eq!(
        c.receive(&alice(), 10),
        Err(ControllerError::UnauthorizedSender { sender: alice() })
    );
    assert_eq!(h.balance(&weth(), &c.address()), 0);

    c.receive(&h.exchange.address(), 10).unwrap();
    assert_eq!(h.balance(&weth(), &c.address()), 10);
}

#[test]
fn seed_contribution_charges_creation_fee_for_factory_only() {
    let h = Harness::new();
    let c = &h.controller;
    assert!(matches!(
        c.seed_contribution(&alice(), &alice(), 10_000, &h.ctx(100)),
        Err(ControllerError::Unauthorized { .. })
    ));

    let receipt = c.seed_contribution(&factory(), &alice(), 10_000, &h.ctx(100)).unwrap();
    assert_eq!(receipt.fee_amount, 10);
    assert_eq!(receipt.deposits, vec![4_995, 4_995]);
    assert_eq!(c.claim_balance_of(&alice()), 1_000);
    assert!(matches!(
        h.events.events()[0],
        BasketEvent::PlatformFeeDeducted {
            action: FeeAction::Create,
            ..
        }
    ));
}

#[test]
fn manager_resyncs_reserves_after_donation() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    h.bank.mint(&wbtc(), &c.ledger_address(), 50).unwrap();

    assert!(matches!(
        c.sync_reserves(&bob()),
        Err(ControllerError::Unauthorized { .. })
    ));
    assert_eq!(c.sync_reserves(&manager()).unwrap(), vec![150, 100]);
    assert_eq!(c.reserves(), vec![150, 100]);
    assert!(matches!(
        h.events.events().last(),
        Some(BasketEvent::ReservesSynced { .. })
    ));
}

#[test]
fn composition_update_changes_split() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();

    assert!(matches!(
        c.update_composition(&manager(), vec![wbtc()], vec![5_000, 5_000]),
        Err(ControllerError::InvalidWeights(_))
    ));
    assert_eq!(
        c.update_composition(&manager(), vec![wbtc(), AssetId::new("DOGE")], vec![5_000, 5_000]),
        Err(ControllerError::UnlistedAsset(AssetId::new("DOGE")))
    );
    assert!(matches!(
        c.update_composition(&manager(), vec![], vec![]),
        Err(ControllerError::InvalidWeights(_))
    ));

    c.update_composition(&manager(), vec![wbtc(), usdc()], vec![2_500, 7_500])
        .unwrap();
    assert_eq!(c.weights(), vec![2_500, 7_500]);

    let receipt = c.contribute(&bob(), 1_000, &h.ctx(100)).unwrap();
    assert_eq!(receipt.deposits, vec![250, 750]);
    assert_eq!(receipt.minted_units, 2_500);
}

#[test]
fn emergency_withdraw_then_resync() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();

    assert!(matches!(
        c.emergency_withdraw(&alice()),
        Err(ControllerError::Unauthorized { .. })
    ));
    let swept = c.emergency_withdraw(&manager()).unwrap();
    assert_eq!(swept, vec![(wbtc(), 100), (usdc(), 100)]);
    assert_eq!(h.balance(&wbtc(), &manager()), 100);
    assert_eq!(c.reserves(), vec![0, 0]);
    assert_eq!(c.claim_supply(), 1_000);

    assert_eq!(
        c.contribute(&bob(), 200, &h.ctx(100)),
        Err(ControllerError::Ledger(LedgerError::ReserveDesynchronized { asset: wbtc() }))
    );

    let ledger = c.ledger_address();
    h.bank.transfer(&wbtc(), &manager(), &ledger, 100).unwrap();
    h.bank.transfer(&usdc(), &manager(), &ledger, 100).unwrap();
    assert_eq!(c.sync_reserves(&manager()).unwrap(), vec![100, 100]);
    assert_eq!(c.contribute(&bob(), 200, &h.ctx(100)).unwrap().minted_units, 1_000);
}

#[test]
fn manager_role_is_per_basket() {
    let h = Harness::new();
    let outsider = Address::derive("other-manager");
    h.access.grant(
        outsider,
        Role::BasketManager {
            basket: Address::derive("other-basket"),
        },
    );
    assert!(h.controller.sync_reserves(&outsider).is_err());
}

#[test]
fn previews_agree_with_execution() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();

    let preview = c.preview_contribution(400).unwrap();
    assert_eq!(preview.portions, vec![200, 200]);
    assert_eq!(preview.quoted_outputs, vec![200, 200]);
    assert_eq!(preview.expected_units, 2_000);
    assert_eq!(c.preview_share_lp(400).unwrap(), 2_000);

    let receipt = c.contribute(&bob(), 400, &h.ctx(100)).unwrap();
    assert_eq!(receipt.minted_units, preview.expected_units);

    assert_eq!(c.preview_share_tokens(1_500).unwrap(), vec![150, 150]);
    assert_eq!(c.preview_share_eth(1_500).unwrap(), 300);
}

#[test]
fn claim_transfers_move_redemption_rights() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    c.transfer_claims(&alice(), &bob(), 400).unwrap();
    assert_eq!(c.claim_balance_of(&bob()), 400);

    h.approve(&bob(), 400);
    assert_eq!(c.claim_allowance(&bob(), &c.address()), 400);
    let receipt = c.withdraw(&bob(), 400, &h.ctx(100)).unwrap();
    assert_eq!(receipt.amounts, vec![40, 40]);
    assert_eq!(c.claim_allowance(&bob(), &c.address()), 0);
    assert_eq!(h.holder_sum(), c.claim_supply());
}

#[test]
fn withdrawal_paying_nothing_keeps_claims() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    let events_before = h.events.len();

    // 9 of 1000 units against reserves of 100 rounds every payout to zero
    h.approve(&alice(), 9);
    assert!(matches!(
        c.withdraw(&alice(), 9, &h.ctx(100)),
        Err(ControllerError::Ledger(LedgerError::InsufficientLiquidity(_)))
    ));
    assert!(matches!(
        c.withdraw_eth(&alice(), 9, &h.ctx(100)),
        Err(ControllerError::Ledger(LedgerError::InsufficientLiquidity(_)))
    ));
    assert_eq!(c.claim_balance_of(&alice()), 1_000);
    assert_eq!(c.claim_allowance(&alice(), &c.address()), 9);
    assert_eq!(c.claim_supply(), 1_000);
    assert_eq!(c.reserves(), vec![100, 100]);
    assert_eq!(h.events.len(), events_before);
}

#[test]
fn withdrawal_after_sweep_keeps_claims() {
    let h = Harness::new();
    let c = &h.controller;
    c.contribute(&alice(), 200, &h.ctx(100)).unwrap();
    c.emergency_withdraw(&manager()).unwrap();

    h.approve(&alice(), 1_000);
    assert!(matches!(
        c.withdraw(&alice(), 1_000, &h.ctx(100)),
        Err(ControllerError::Ledger(LedgerError::InsufficientLiquidity(_)))
    ));
    assert_eq!(c.claim_balance_of(&alice()), 1_000);
    assert_eq!(c.claim_allowance(&alice(), &c.address()), 1_000);
    assert_eq!(c.claim_supply(), 1_000);
}

#[test]
fn receipts_and_fee_events_serialize() {
    let h = Harness::with_fees(50, 0);
    let receipt = h.controller.contribute(&alice(), 10_000, &h.ctx(100)).unwrap();

    let json = serde_json::to_string(&receipt).unwrap();
    assert!(json.contains(&format!("\"contributor\":\"{}\"", alice())));
    let back: ContributionReceipt = serde_json::from_str(&json).unwrap();
    assert_eq!(back, receipt);

    let events = serde_json::to_string(&h.events.events()).unwrap();
    assert!(events.contains("\"action\":\"contribute\""));
}
