// Recharges
// Approval credits the spendable balance and makes the account a valid member,
// approved recharges feed the team size, the withdrawal cap and the audit.

use log::info;
use harvest_common::{
    account::WalletField,
    event::LedgerEvent,
    id::{AccountId, RechargeId},
    recharge::{RechargeRecord, RechargeStatus},
    utils::format_coin,
};

use super::{
    accounts::credit,
    error::LedgerError,
    ledger::{Committed, Ledger},
    storage::{AccountProvider, RechargeProvider, Storage},
};

impl<S: Storage> Ledger<S> {
    /// Record a deposit waiting for verification, no balance effect
    pub async fn submit_recharge(
        &self,
        account: &AccountId,
        amount: u64,
        reference: &str,
    ) -> Result<RechargeRecord, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::Validation("recharge amount cannot be zero".to_string()));
        }
        let now = self.now();

        self.execute("submit_recharge", |tx| {
            tx.get_account(account)?;
            let recharge = RechargeRecord::new(
                RechargeId(tx.next_id()?),
                *account,
                amount,
                reference.trim().to_string(),
                now,
            );
            tx.set_recharge(&recharge)?;
            Ok(Committed::silent(recharge))
        })
        .await
        .inspect(|recharge| {
            if log::log_enabled!(log::Level::Info) {
                info!(
                    "{} submitted recharge {} of {}",
                    account,
                    recharge.id,
                    format_coin(recharge.amount)
                );
            }
        })
    }

    pub async fn approve_recharge(&self, id: &RechargeId, actor: &str) -> Result<RechargeRecord, LedgerError> {
        self.decide_recharge(id, RechargeStatus::Approved, actor).await
    }

    pub async fn reject_recharge(&self, id: &RechargeId, actor: &str) -> Result<RechargeRecord, LedgerError> {
        self.decide_recharge(id, RechargeStatus::Rejected, actor).await
    }

    async fn decide_recharge(
        &self,
        id: &RechargeId,
        status: RechargeStatus,
        actor: &str,
    ) -> Result<RechargeRecord, LedgerError> {
        let now = self.now();

        let recharge = self
            .execute("decide_recharge", |tx| {
                let mut recharge = tx.get_recharge(id)?;
                if !recharge.is_pending() {
                    return Err(LedgerError::RechargeAlreadyDecided {
                        recharge: *id,
                        status: recharge.status,
                    });
                }
                recharge.status = status;
                recharge.decision_timestamp = Some(now);
                tx.set_recharge(&recharge)?;

                if status != RechargeStatus::Approved {
                    return Ok(Committed::silent(recharge));
                }

                let mut owner = credit(tx, &recharge.account_id, WalletField::Spendable, recharge.amount)?;
                if !owner.is_valid_member {
                    owner.is_valid_member = true;
                    tx.set_account(&owner)?;
                }

                let event = LedgerEvent::RechargeApproved {
                    account: recharge.account_id,
                    recharge: recharge.id,
                    amount: recharge.amount,
                };
                Ok(Committed::new(recharge, vec![event]))
            })
            .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} set recharge {} of {} ({}) to {:?}",
                actor,
                id,
                recharge.account_id,
                format_coin(recharge.amount),
                recharge.status
            );
        }
        Ok(recharge)
    }

    pub fn get_recharge(&self, id: &RechargeId) -> Result<RechargeRecord, LedgerError> {
        self.read(|tx| tx.get_recharge(id))
    }

    /// Recharges of an account, oldest first
    pub fn get_recharges(&self, account: &AccountId) -> Result<Vec<RechargeRecord>, LedgerError> {
        self.read(|tx| {
            tx.get_account(account)?;
            tx.get_account_recharges(account)
        })
    }
}
