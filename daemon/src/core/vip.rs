// VIP levels and salaries

use log::info;
use harvest_common::{
    account::WalletField,
    api::{VipEvaluation, VipSalaryReceipt},
    event::LedgerEvent,
    id::AccountId,
    utils::format_coin,
};

use super::{
    accounts::credit,
    error::LedgerError,
    ledger::{Committed, Ledger},
    storage::{AccountProvider, Storage},
};

impl<S: Storage> Ledger<S> {
    /// Recompute the VIP level from the valid members of the downline.
    /// A level change restarts the salary period.
    pub async fn evaluate_vip(&self, account: &AccountId) -> Result<VipEvaluation, LedgerError> {
        let now = self.now();
        let table = &self.config().vip_table;
        let levels = self.config().commission_ratios.levels();

        let evaluation = self
            .execute("evaluate_vip", |tx| {
                let mut owner = tx.get_account(account)?;

                let mut team_members: u32 = 0;
                for level in 0..levels {
                    for member in tx.get_downline(account, level as u8)? {
                        if tx.get_account(&member)?.is_valid_member {
                            team_members = team_members.saturating_add(1);
                        }
                    }
                }

                let evaluation = VipEvaluation {
                    account: *account,
                    team_members,
                    previous_level: owner.vip_level,
                    level: table.level_for(team_members),
                };

                if evaluation.level != evaluation.previous_level {
                    owner.vip_level = evaluation.level;
                    owner.vip_entry_timestamp = (evaluation.level > 0).then_some(now);
                    owner.last_salary_timestamp = None;
                    tx.set_account(&owner)?;
                }
                Ok(Committed::silent(evaluation))
            })
            .await?;

        if evaluation.level != evaluation.previous_level && log::log_enabled!(log::Level::Info) {
            info!(
                "{} moved from VIP {} to VIP {} with {} team members",
                account, evaluation.previous_level, evaluation.level, evaluation.team_members
            );
        }
        Ok(evaluation)
    }

    /// Pay the salary of the current level once per salary interval
    pub async fn claim_vip_salary(&self, account: &AccountId) -> Result<VipSalaryReceipt, LedgerError> {
        let now = self.now();
        let table = &self.config().vip_table;

        let receipt = self
            .execute("claim_vip_salary", |tx| {
                let owner = tx.get_account(account)?;
                let tier = table
                    .tier(owner.vip_level)
                    .ok_or(LedgerError::NoVipLevel(*account))?;

                let due = table
                    .next_salary_due(owner.last_salary_timestamp, owner.vip_entry_timestamp)
                    .ok_or(LedgerError::NoVipLevel(*account))?;
                if now < due {
                    return Err(LedgerError::SalaryNotDue { next_due: due });
                }

                let mut owner = credit(tx, account, WalletField::Spendable, tier.salary)?;
                owner.last_salary_timestamp = Some(now);
                tx.set_account(&owner)?;

                let receipt = VipSalaryReceipt {
                    account: *account,
                    level: tier.level,
                    amount: tier.salary,
                    next_due: now.saturating_add(table.salary_interval_secs()),
                };
                let event = LedgerEvent::VipSalaryPaid {
                    account: *account,
                    level: tier.level,
                    amount: tier.salary,
                };
                Ok(Committed::new(receipt, vec![event]))
            })
            .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} claimed VIP {} salary of {}",
                account,
                receipt.level,
                format_coin(receipt.amount)
            );
        }
        Ok(receipt)
    }
}
