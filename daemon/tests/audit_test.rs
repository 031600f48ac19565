mod common;

use common::*;
use harvest_common::{account::WalletField, withdrawal::WithdrawalDecision};

#[tokio::test]
async fn test_honest_account_is_safe() {
    let t = setup();
    let product = t.with_product(default_product()).await;
    let account = t.account(None, 0).await;
    let recharge = t
        .ledger
        .submit_recharge(&account, coins(1000), "deposit")
        .await
        .unwrap();
    t.ledger.approve_recharge(&recharge.id, ADMIN).await.unwrap();
    t.ledger.purchase(&account, &product).await.unwrap();
    t.clock.advance_days(3);
    t.ledger.sync_account(&account).await.unwrap();

    let result = t.ledger.audit_account(&account).unwrap();
    // 4 days of 50.00 generated, 700.00 held
    assert_eq!(result.total_generated_income, coins(200) as u128);
    assert_eq!(result.current_balance, coins(700));
    assert_eq!(result.credits, coins(200) as u128);
    // the recharged principal is not a credit of the audit
    assert!(!result.is_safe);
    assert_eq!(result.diff, coins(500) as i128);
}

#[tokio::test]
async fn test_downline_recharges_count_as_rewards() {
    let t = setup();
    let account = t.account(None, 0).await;
    let direct = t.account(Some(account), 0).await;
    let indirect = t.account(Some(direct), 0).await;

    for (member, amount) in [(direct, coins(1000)), (indirect, coins(2000))] {
        let recharge = t.ledger.submit_recharge(&member, amount, "").await.unwrap();
        t.ledger.approve_recharge(&recharge.id, ADMIN).await.unwrap();
    }
    // a pending recharge is ignored
    t.ledger.submit_recharge(&direct, coins(5000), "").await.unwrap();

    let result = t.ledger.audit_account(&account).unwrap();
    assert_eq!(
        result.level_rewards[..2],
        [coins(100) as u128, coins(100) as u128]
    );
    assert_eq!(result.total_rewards, coins(200) as u128);
    // 95% haircut
    assert_eq!(result.credits, coins(190) as u128);
    assert_eq!(result.debits, 0);
    assert!(result.is_safe);
}

#[tokio::test]
async fn test_inflated_balance_is_flagged() {
    let t = setup();
    let product = t.with_product(default_product()).await;
    let account = t.account(None, coins(500)).await;
    t.ledger.purchase(&account, &product).await.unwrap();

    t.ledger
        .set_balance(&account, WalletField::Spendable, coins(900), ADMIN, "manual credit")
        .await
        .unwrap();
    let request = t
        .ledger
        .request_withdrawal(&account, coins(400), bank())
        .await
        .unwrap();
    t.ledger
        .decide_withdrawal(&request.id, WithdrawalDecision::Approve, false, ADMIN)
        .await
        .unwrap();

    let result = t.ledger.audit_account(&account).unwrap();
    assert_eq!(result.total_approved_withdrawals, coins(400) as u128);
    assert_eq!(result.current_balance, coins(500));
    assert_eq!(result.debits, coins(900) as u128);
    assert_eq!(result.credits, coins(50) as u128);
    assert!(!result.is_safe);

    // purely diagnostic: nothing blocks the account
    assert!(t.ledger.get_account(&account).unwrap().restriction.is_none());
}
