mod common;

use common::*;
use harvest_common::event::LedgerEvent;

#[tokio::test]
async fn test_four_levels_are_paid_on_invite_wallet() {
    let t = setup();
    let product = t.with_product(product(1, coins(1000), coins(10), 30, 0)).await;
    // root -> d -> c -> b -> a -> buyer
    let chain = t.chain(5, 0).await;
    let buyer = t.account(chain.last().copied(), coins(1000)).await;

    let receipt = t.ledger.purchase(&buyer, &product).await.unwrap();

    // a, b, c, d get 10%, 5%, 3%, 2%, the root is beyond level D
    assert_eq!(t.invite_wallet(&chain[4]), coins(100));
    assert_eq!(t.invite_wallet(&chain[3]), coins(50));
    assert_eq!(t.invite_wallet(&chain[2]), coins(30));
    assert_eq!(t.invite_wallet(&chain[1]), coins(20));
    assert_eq!(t.invite_wallet(&chain[0]), 0);

    let levels: Vec<u8> = receipt.commissions.iter().map(|c| c.level).collect();
    assert_eq!(levels, vec![0, 1, 2, 3]);
    // commissions never touch the spendable balance
    assert_eq!(t.spendable(&chain[4]), 0);
}

#[tokio::test]
async fn test_short_chain_pays_existing_levels_only() {
    let t = setup();
    let product = t.with_product(product(1, coins(1000), coins(10), 30, 0)).await;
    let inviter = t.account(None, 0).await;
    let buyer = t.account(Some(inviter), coins(1000)).await;

    let receipt = t.ledger.purchase(&buyer, &product).await.unwrap();
    assert_eq!(receipt.commissions.len(), 1);
    assert_eq!(t.invite_wallet(&inviter), coins(100));
}

#[tokio::test]
async fn test_inviter_chain_is_frozen_at_registration() {
    let t = setup();
    let product = t.with_product(product(1, coins(1000), coins(10), 30, 0)).await;
    let a = t.account(None, 0).await;
    let b = t.account(Some(a), 0).await;
    let buyer = t.account(Some(b), coins(2000)).await;

    // accounts registered later never enter the buyer's chain
    let late = t.account(Some(buyer), 0).await;
    t.ledger.purchase(&buyer, &product).await.unwrap();

    assert_eq!(t.invite_wallet(&b), coins(100));
    assert_eq!(t.invite_wallet(&a), coins(50));
    assert_eq!(t.invite_wallet(&late), 0);
}

#[tokio::test]
async fn test_commission_events_go_to_ancestors() {
    let t = setup();
    let product = t.with_product(product(1, coins(1000), coins(10), 30, 0)).await;
    let inviter = t.account(None, 0).await;
    let buyer = t.account(Some(inviter), coins(1000)).await;
    let mut events = t.ledger.subscribe(inviter);

    let receipt = t.ledger.purchase(&buyer, &product).await.unwrap();

    assert_eq!(
        events.recv().await,
        Some(LedgerEvent::CommissionCredited {
            account: inviter,
            purchaser: buyer,
            contract: receipt.contract.id,
            level: 0,
            amount: coins(100),
        })
    );
}

#[tokio::test]
async fn test_failed_purchase_pays_no_commission() {
    let t = setup();
    let product = t.with_product(product(1, coins(1000), coins(10), 30, 0)).await;
    let inviter = t.account(None, 0).await;
    let buyer = t.account(Some(inviter), coins(999)).await;

    assert!(t.ledger.purchase(&buyer, &product).await.is_err());
    assert_eq!(t.invite_wallet(&inviter), 0);
}
