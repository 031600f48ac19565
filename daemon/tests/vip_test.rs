mod common;

use common::*;
use harvest_common::{config::SECONDS_PER_DAY, id::AccountId};
use harvest_daemon::core::LedgerError;

/// Register `count` direct members, each with an approved recharge
async fn valid_members(t: &TestLedger, inviter: AccountId, count: usize) {
    for _ in 0..count {
        let member = t.account(Some(inviter), 0).await;
        let recharge = t
            .ledger
            .submit_recharge(&member, coins(100), "")
            .await
            .unwrap();
        t.ledger.approve_recharge(&recharge.id, ADMIN).await.unwrap();
    }
}

#[tokio::test]
async fn test_level_from_valid_team_members() {
    let t = setup();
    let leader = t.account(None, 0).await;
    valid_members(&t, leader, 4).await;
    // registered but never recharged
    t.account(Some(leader), 0).await;

    let evaluation = t.ledger.evaluate_vip(&leader).await.unwrap();
    assert_eq!(evaluation.team_members, 4);
    assert_eq!(evaluation.level, 0);

    valid_members(&t, leader, 1).await;
    let evaluation = t.ledger.evaluate_vip(&leader).await.unwrap();
    assert_eq!(evaluation.team_members, 5);
    assert_eq!(evaluation.previous_level, 0);
    assert_eq!(evaluation.level, 1);

    let account = t.ledger.get_account(&leader).unwrap();
    assert_eq!(account.vip_level, 1);
    assert_eq!(account.vip_entry_timestamp, Some(START));
}

#[tokio::test]
async fn test_deeper_levels_count() {
    let t = setup();
    let leader = t.account(None, 0).await;
    let direct = t.account(Some(leader), 0).await;
    valid_members(&t, direct, 5).await;

    let evaluation = t.ledger.evaluate_vip(&leader).await.unwrap();
    assert_eq!(evaluation.team_members, 5);
    assert_eq!(evaluation.level, 1);
}

#[tokio::test]
async fn test_salary_once_per_interval() {
    let t = setup();
    let leader = t.account(None, 0).await;

    assert!(matches!(
        t.ledger.claim_vip_salary(&leader).await,
        Err(LedgerError::NoVipLevel(_))
    ));

    valid_members(&t, leader, 5).await;
    t.ledger.evaluate_vip(&leader).await.unwrap();

    assert!(matches!(
        t.ledger.claim_vip_salary(&leader).await,
        Err(LedgerError::SalaryNotDue { next_due }) if next_due == START + 30 * SECONDS_PER_DAY
    ));

    t.clock.advance_days(30);
    let receipt = t.ledger.claim_vip_salary(&leader).await.unwrap();
    assert_eq!(receipt.level, 1);
    assert_eq!(receipt.amount, coins(10));
    assert_eq!(t.spendable(&leader), coins(10));

    assert!(matches!(
        t.ledger.claim_vip_salary(&leader).await,
        Err(LedgerError::SalaryNotDue { .. })
    ));
    assert_eq!(t.spendable(&leader), coins(10));
}
