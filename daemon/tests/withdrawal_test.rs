mod common;

use common::*;
use harvest_common::{
    account::WalletField,
    config::SECONDS_PER_DAY,
    event::LedgerEvent,
    id::{AccountId, ProductId},
    withdrawal::{
        BankDetails, ProductRequirement, RequirementShortfall, WithdrawalDecision, WithdrawalRules,
        WithdrawalStatus,
    },
};
use harvest_daemon::core::{LedgerConfig, LedgerError};

/// An account that bought the default product and has `extra` on top of its 550.00
async fn investor(t: &TestLedger, extra: u64) -> AccountId {
    let product = t.with_product(default_product()).await;
    let account = t.account(None, coins(1000) + extra).await;
    t.ledger.purchase(&account, &product).await.unwrap();
    account
}

#[tokio::test]
async fn test_request_reserves_amount_and_computes_fee() {
    let t = setup();
    let account = investor(&t, 0).await;

    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    assert_eq!(request.status, WithdrawalStatus::Pending);
    assert_eq!(request.fee, coins(18));
    assert_eq!(request.net_payout, coins(282));
    assert_eq!(t.spendable(&account), coins(250));
    assert_eq!(t.ledger.get_withdrawals(&account).unwrap(), vec![request]);
}

#[tokio::test]
async fn test_validation_errors() {
    let t = setup();
    let account = investor(&t, coins(50_000)).await;

    assert!(matches!(
        t.ledger.request_withdrawal(&account, coins(299), bank()).await,
        Err(LedgerError::AmountOutOfRange { .. })
    ));
    assert!(matches!(
        t.ledger.request_withdrawal(&account, coins(40_001), bank()).await,
        Err(LedgerError::AmountOutOfRange { .. })
    ));
    assert!(matches!(
        t.ledger
            .request_withdrawal(&account, coins(300), BankDetails::default())
            .await,
        Err(LedgerError::MissingBankDetails)
    ));
    // nothing was reserved
    assert_eq!(t.spendable(&account), coins(50_550));
}

#[tokio::test]
async fn test_requires_a_purchase() {
    let t = setup();
    let account = t.account(None, coins(1000)).await;

    let err = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ProductRequirementNotMet(RequirementShortfall::NoPurchase)
    ));
}

#[tokio::test]
async fn test_insufficient_funds() {
    let t = setup();
    let account = investor(&t, 0).await;

    let err = t
        .ledger
        .request_withdrawal(&account, coins(551), bank())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(t.spendable(&account), coins(550));
}

#[tokio::test]
async fn test_one_request_per_calendar_day() {
    let t = setup();
    let account = investor(&t, coins(1000)).await;

    t.ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    t.clock.advance(3600);
    let err = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DailyLimitReached { .. }));

    // next calendar day
    t.clock.advance(SECONDS_PER_DAY);
    t.ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_restriction_blocks_until_expiry() {
    let t = setup();
    let account = investor(&t, 0).await;
    let until = t.ledger.now() + 2 * SECONDS_PER_DAY;

    t.ledger
        .set_restriction(&account, "chargeback review", Some(until), ADMIN)
        .await
        .unwrap();
    let err = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::RestrictionActive { .. }));

    t.clock.set(until);
    t.ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reject_with_refund_credits_once() {
    let t = setup();
    let account = investor(&t, 0).await;
    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();
    let mut events = t.ledger.subscribe(account);

    let rejected = t
        .ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Reject, true, ADMIN)
        .await
        .unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
    assert!(rejected.refunded);
    assert_eq!(t.spendable(&account), coins(550));

    // duplicate click
    t.ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Reject, true, ADMIN)
        .await
        .unwrap();
    assert_eq!(t.spendable(&account), coins(550));

    assert_eq!(
        events.try_recv(),
        Some(LedgerEvent::WithdrawalStateChanged {
            account,
            withdrawal: request.id,
            status: WithdrawalStatus::Rejected,
            refunded: Some(coins(300)),
        })
    );
    assert_eq!(events.try_recv(), None);
}

#[tokio::test]
async fn test_terminal_states_cannot_change() {
    let t = setup();
    let account = investor(&t, 0).await;
    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    t.ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Approve, false, ADMIN)
        .await
        .unwrap();
    let err = t
        .ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Reject, true, ADMIN)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidWithdrawalTransition { .. }));
    assert_eq!(t.spendable(&account), coins(250));
}

#[tokio::test]
async fn test_reject_without_refund_keeps_the_funds_out() {
    let t = setup();
    let account = investor(&t, 0).await;
    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    let rejected = t
        .ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Reject, false, ADMIN)
        .await
        .unwrap();
    assert!(!rejected.refunded);
    assert_eq!(t.spendable(&account), coins(250));
}

#[tokio::test]
async fn test_owner_cancellation() {
    let t = setup();
    let account = investor(&t, 0).await;
    let other = t.account(None, 0).await;
    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    assert!(matches!(
        t.ledger.cancel_withdrawal(&other, &request.id).await,
        Err(LedgerError::WithdrawalNotFound(_))
    ));

    let cancelled = t.ledger.cancel_withdrawal(&account, &request.id).await.unwrap();
    assert_eq!(cancelled.status, WithdrawalStatus::Rejected);
    assert_eq!(t.spendable(&account), coins(550));

    assert!(matches!(
        t.ledger.cancel_withdrawal(&account, &request.id).await,
        Err(LedgerError::WithdrawalNotPending { .. })
    ));
}

#[tokio::test]
async fn test_edit_amount_keeps_reservation() {
    let t = setup();
    let account = investor(&t, 0).await;
    let request = t
        .ledger
        .request_withdrawal(&account, coins(500), bank())
        .await
        .unwrap();

    assert!(matches!(
        t.ledger
            .edit_withdrawal_amount(&request.id, coins(400), ADMIN, " ")
            .await,
        Err(LedgerError::MissingOverrideReason)
    ));

    let edited = t
        .ledger
        .edit_withdrawal_amount(&request.id, coins(400), ADMIN, "typo in amount")
        .await
        .unwrap();
    assert_eq!(edited.amount, coins(400));
    assert_eq!(edited.fee, coins(24));
    assert_eq!(edited.reserved_amount, coins(500));
    // no balance side effect
    assert_eq!(t.spendable(&account), coins(50));

    let overrides = t.ledger.get_overrides(Some(account)).unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].reason, "typo in amount");

    // the refund follows the edited amount
    t.ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Reject, true, ADMIN)
        .await
        .unwrap();
    assert_eq!(t.spendable(&account), coins(450));
}

#[tokio::test]
async fn test_delete_only_rejected() {
    let t = setup();
    let account = investor(&t, 0).await;
    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    assert!(matches!(
        t.ledger.delete_withdrawal(&request.id, ADMIN, "cleanup").await,
        Err(LedgerError::WithdrawalNotDeletable(_))
    ));

    t.ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Reject, true, ADMIN)
        .await
        .unwrap();
    t.ledger
        .delete_withdrawal(&request.id, ADMIN, "cleanup")
        .await
        .unwrap();

    assert!(t.ledger.get_withdrawals(&account).unwrap().is_empty());
    assert!(matches!(
        t.ledger.get_withdrawal(&request.id),
        Err(LedgerError::WithdrawalNotFound(_))
    ));
    assert_eq!(t.spendable(&account), coins(550));
}

#[tokio::test]
async fn test_recharge_cap_needs_team_recharge() {
    let rules = WithdrawalRules {
        max_withdrawal_percent_of_recharge: Some(100),
        per_product_invite_recharge_requirement: vec![ProductRequirement {
            product_id: ProductId(1),
            team_recharge: coins(2000),
        }],
        ..Default::default()
    };
    let t = setup_with(LedgerConfig {
        withdrawal_rules: rules,
        ..Default::default()
    });

    let account = investor(&t, coins(5000)).await;
    let recharge = t
        .ledger
        .submit_recharge(&account, coins(400), "bank transfer")
        .await
        .unwrap();
    t.ledger.approve_recharge(&recharge.id, ADMIN).await.unwrap();

    // within the 400.00 cap
    t.ledger
        .request_withdrawal(&account, coins(400), bank())
        .await
        .unwrap();

    t.clock.advance_days(1);
    let err = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ProductRequirementNotMet(RequirementShortfall::TeamRecharge { .. })
    ));

    // a level B member recharging enough lifts the cap
    let direct = t.account(Some(account), 0).await;
    let indirect = t.account(Some(direct), 0).await;
    let recharge = t
        .ledger
        .submit_recharge(&indirect, coins(2000), "")
        .await
        .unwrap();
    t.ledger.approve_recharge(&recharge.id, ADMIN).await.unwrap();

    t.ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_adjust_balance_cannot_go_negative() {
    let t = setup();
    let account = t.account(None, coins(10)).await;

    let err = t
        .ledger
        .adjust_balance(&account, WalletField::Spendable, -(coins(11) as i64))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(t.spendable(&account), coins(10));
}
