// Accrual Scheduler
// The sweep and the session start path share `sync_account_at`: whichever
// commits first moves `last_accrual_timestamp`, the other one credits nothing.

use std::{sync::Arc, time::Duration};

use log::{debug, error, info, warn};
use harvest_common::{
    account::WalletField,
    api::{AccrualReport, SweepReport},
    contract::ContractStatus,
    event::LedgerEvent,
    id::AccountId,
    time::TimestampSeconds,
    utils::format_coin,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use super::{
    accounts::credit,
    error::LedgerError,
    ledger::{Committed, Ledger},
    storage::{AccountProvider, ContractProvider, Storage},
};

impl<S: Storage> Ledger<S> {
    /// Advance every active contract of an account up to now
    pub async fn sync_account(&self, account: &AccountId) -> Result<AccrualReport, LedgerError> {
        self.sync_account_at(account, self.now()).await
    }

    /// Login path, same computation as the sweep
    pub async fn on_session_start(&self, account: &AccountId) -> Result<AccrualReport, LedgerError> {
        if log::log_enabled!(log::Level::Debug) {
            debug!("session start of {}", account);
        }
        self.sync_account(account).await
    }

    /// Advance every active contract of an account by the whole days
    /// elapsed until `as_of`, the income is credited in one update.
    pub async fn sync_account_at(
        &self,
        account: &AccountId,
        as_of: TimestampSeconds,
    ) -> Result<AccrualReport, LedgerError> {
        let report = self
            .execute("sync_account", |tx| {
                // read even when nothing accrues, a concurrent purchase then conflicts
                tx.get_account(account)?;

                let mut report = AccrualReport::default();
                let mut income: u64 = 0;
                for id in tx.get_active_contract_ids(account)? {
                    let mut contract = tx.get_contract(&id)?;
                    let outcome = contract.accrue(as_of)?;
                    if outcome.days_credited == 0 {
                        continue;
                    }

                    if log::log_enabled!(log::Level::Debug) {
                        debug!(
                            "{} accrued {} days for {}, {} remaining",
                            id,
                            outcome.days_credited,
                            format_coin(outcome.income_credited),
                            outcome.remaining_days
                        );
                    }

                    income = income
                        .checked_add(outcome.income_credited)
                        .ok_or(LedgerError::BalanceOverflow)?;
                    report.contracts_advanced += 1;
                    if outcome.status == ContractStatus::Completed {
                        report.contracts_completed += 1;
                    }
                    tx.set_contract(&contract)?;
                    report.outcomes.push((id, outcome));
                }

                if report.is_empty() {
                    return Ok(Committed::silent(report));
                }

                if income > 0 {
                    credit(tx, account, WalletField::Spendable, income)?;
                }
                report.income_credited = income;

                let event = LedgerEvent::AccrualCommitted {
                    account: *account,
                    income,
                    contracts_advanced: report.contracts_advanced,
                    contracts_completed: report.contracts_completed,
                };
                Ok(Committed::new(report, vec![event]))
            })
            .await?;

        if !report.is_empty() && log::log_enabled!(log::Level::Info) {
            info!(
                "{} accrued {} over {} contracts, {} completed",
                account,
                format_coin(report.income_credited),
                report.contracts_advanced,
                report.contracts_completed
            );
        }
        Ok(report)
    }

    /// Sync every account holding an active contract.
    /// A failing account is logged and counted, it never stops the sweep.
    pub async fn sync_all(&self) -> Result<SweepReport, LedgerError> {
        let as_of = self.now();
        let accounts = self.read(|tx| tx.get_accounts_with_active_contracts())?;
        let mut report = SweepReport::default();

        for account in accounts {
            match self.sync_account_at(&account, as_of).await {
                Ok(synced) => {
                    report.accounts_synced += 1;
                    report.income_credited = report.income_credited.saturating_add(synced.income_credited);
                    report.contracts_completed += synced.contracts_completed;
                }
                Err(e) => {
                    report.accounts_failed += 1;
                    warn!("sweep could not sync {}: {}", account, e);
                }
            }
        }

        if log::log_enabled!(log::Level::Info) {
            info!(
                "sweep synced {} accounts ({} failed), credited {}, {} contracts completed",
                report.accounts_synced,
                report.accounts_failed,
                format_coin(report.income_credited),
                report.contracts_completed
            );
        }
        Ok(report)
    }
}

/// Background task running `sync_all` periodically until stopped
pub struct AccrualScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl AccrualScheduler {
    pub fn start<S: Storage>(ledger: Arc<Ledger<S>>, period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = stop.changed() => break,
                }

                if let Err(e) = ledger.sync_all().await {
                    if log::log_enabled!(log::Level::Error) {
                        error!("Error while running accrual sweep: {}", e);
                    }
                }
            }

            if log::log_enabled!(log::Level::Info) {
                info!("Accrual scheduler stopped");
            }
        });

        Self { shutdown, handle }
    }

    /// Signal the task and wait for the current sweep to end
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("Accrual scheduler task failed: {}", e);
        }
    }
}
