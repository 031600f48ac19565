// Shared helpers of the ledger integration tests
#![allow(dead_code)]

use std::sync::Arc;

use harvest_common::{
    account::WalletField,
    config::{COIN_VALUE, SECONDS_PER_DAY},
    contract::Product,
    id::{AccountId, ProductId},
    withdrawal::BankDetails,
};
use harvest_daemon::core::{storage::MemoryStorage, Ledger, LedgerConfig, ManualClock};

/// Noon UTC, far from any day boundary
pub const START: u64 = 19_675 * SECONDS_PER_DAY + 12 * 3600;

pub const ADMIN: &str = "ops-admin";

pub struct TestLedger {
    pub ledger: Arc<Ledger<MemoryStorage>>,
    pub clock: Arc<ManualClock>,
}

pub fn coins(value: u64) -> u64 {
    value * COIN_VALUE
}

pub fn setup() -> TestLedger {
    setup_with(LedgerConfig::default())
}

pub fn setup_with(config: LedgerConfig) -> TestLedger {
    let clock = Arc::new(ManualClock::new(START));
    let ledger = Ledger::with_clock(MemoryStorage::new(), config, clock.clone()).unwrap();
    TestLedger {
        ledger: Arc::new(ledger),
        clock,
    }
}

/// Config tolerating heavy contention in concurrency tests
pub fn contended_config() -> LedgerConfig {
    LedgerConfig {
        max_atomic_attempts: 256,
        ..Default::default()
    }
}

pub fn product(id: u64, price: u64, daily_income: u64, contract_period: u32, purchase_limit: u32) -> Product {
    Product {
        id: ProductId(id),
        name: format!("plan-{}", id),
        price,
        daily_income,
        contract_period,
        purchase_limit,
    }
}

/// 500.00 price, 50.00 per day over 10 days, unlimited
pub fn default_product() -> Product {
    product(1, coins(500), coins(50), 10, 0)
}

pub fn bank() -> BankDetails {
    BankDetails {
        account_holder: "Ada Obi".to_string(),
        bank_name: "Union Bank".to_string(),
        account_number: "0123456789".to_string(),
    }
}

impl TestLedger {
    /// Register an account and put `balance` on its spendable wallet
    pub async fn account(&self, inviter: Option<AccountId>, balance: u64) -> AccountId {
        let account = self.ledger.register_account(inviter).await.unwrap();
        if balance > 0 {
            self.ledger
                .adjust_balance(&account.id, WalletField::Spendable, balance as i64)
                .await
                .unwrap();
        }
        account.id
    }

    /// A chain root -> a -> b -> ..., returns the accounts from the root down
    pub async fn chain(&self, len: usize, balance: u64) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = Vec::with_capacity(len);
        for _ in 0..len {
            let inviter = accounts.last().copied();
            accounts.push(self.account(inviter, balance).await);
        }
        accounts
    }

    pub async fn with_product(&self, product: Product) -> ProductId {
        self.ledger.upsert_product(product).await.unwrap().id
    }

    pub fn spendable(&self, account: &AccountId) -> u64 {
        self.ledger.get_account(account).unwrap().spendable_balance
    }

    pub fn invite_wallet(&self, account: &AccountId) -> u64 {
        self.ledger.get_account(account).unwrap().invite_wallet
    }
}
