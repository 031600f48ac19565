mod common;

use std::sync::Arc;

use common::*;
use futures::future::join_all;
use harvest_common::withdrawal::{WithdrawalDecision, WithdrawalStatus};
use harvest_daemon::core::LedgerError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_respect_the_limit() {
    let t = setup_with(contended_config());
    let product = t.with_product(product(1, coins(100), coins(1), 30, 3)).await;
    let buyer = t.account(None, coins(10_000)).await;

    let tasks = (0..12).map(|_| {
        let ledger = Arc::clone(&t.ledger);
        tokio::spawn(async move { ledger.purchase(&buyer, &product).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, LedgerError::PurchaseLimitExceeded { .. })));

    assert_eq!(t.ledger.get_contracts(&buyer).unwrap().len(), 3);
    assert_eq!(t.spendable(&buyer), coins(10_000) - 3 * coins(99));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_never_overdraw() {
    let t = setup_with(contended_config());
    let product = t.with_product(product(1, coins(400), 0, 30, 0)).await;
    let inviter = t.account(None, 0).await;
    let buyer = t.account(Some(inviter), coins(1000)).await;

    let tasks = (0..8).map(|_| {
        let ledger = Arc::clone(&t.ledger);
        tokio::spawn(async move { ledger.purchase(&buyer, &product).await })
    });
    let succeeded = join_all(tasks)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();

    assert_eq!(succeeded, 2);
    assert_eq!(t.spendable(&buyer), coins(200));
    // commissions only for committed purchases
    assert_eq!(t.invite_wallet(&inviter), 2 * coins(40));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refunds_credit_once() {
    let t = setup_with(contended_config());
    let product = t.with_product(default_product()).await;
    let account = t.account(None, coins(1000)).await;
    t.ledger.purchase(&account, &product).await.unwrap();
    let request = t
        .ledger
        .request_withdrawal(&account, coins(300), bank())
        .await
        .unwrap();

    let tasks = (0..8).map(|_| {
        let ledger = Arc::clone(&t.ledger);
        let id = request.id;
        tokio::spawn(async move {
            ledger
                .decide_withdrawal(&id, WithdrawalDecision::Reject, true, ADMIN)
                .await
        })
    });
    for joined in join_all(tasks).await {
        let request = joined.unwrap().unwrap();
        assert_eq!(request.status, WithdrawalStatus::Rejected);
    }

    assert_eq!(t.spendable(&account), coins(550));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_sweeps_and_logins_credit_once() {
    let t = setup_with(contended_config());
    let product = t.with_product(default_product()).await;
    let account = t.account(None, coins(1000)).await;
    t.ledger.purchase(&account, &product).await.unwrap();
    t.clock.advance_days(4);

    let sweeps = (0..4).map(|_| {
        let ledger = Arc::clone(&t.ledger);
        tokio::spawn(async move { ledger.sync_all().await.map(|_| ()) })
    });
    let logins = (0..4).map(|_| {
        let ledger = Arc::clone(&t.ledger);
        tokio::spawn(async move { ledger.on_session_start(&account).await.map(|_| ()) })
    });
    for joined in join_all(sweeps.chain(logins)).await {
        joined.unwrap().unwrap();
    }

    assert_eq!(t.spendable(&account), coins(750));
    assert_eq!(t.ledger.get_contracts(&account).unwrap()[0].remaining_days, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_purchase_and_withdrawal_race_on_balance() {
    let t = setup_with(contended_config());
    let product = t.with_product(product(1, coins(300), 0, 30, 0)).await;
    let account = t.account(None, coins(300)).await;
    t.ledger.purchase(&account, &product).await.unwrap();
    t.ledger
        .adjust_balance(&account, harvest_common::account::WalletField::Spendable, coins(300) as i64)
        .await
        .unwrap();

    // 300.00 left: either the purchase or the withdrawal gets it
    let purchase = {
        let ledger = Arc::clone(&t.ledger);
        tokio::spawn(async move { ledger.purchase(&account, &product).await.is_ok() })
    };
    let withdrawal = {
        let ledger = Arc::clone(&t.ledger);
        tokio::spawn(async move {
            ledger
                .request_withdrawal(&account, coins(300), bank())
                .await
                .is_ok()
        })
    };
    let (purchased, withdrew) = (purchase.await.unwrap(), withdrawal.await.unwrap());

    assert!(purchased ^ withdrew);
    assert_eq!(t.spendable(&account), 0);
}
