// Integrity Auditor
// Read-only, nothing here mutates state or gates a withdrawal.

use log::{debug, warn};
use harvest_common::{
    audit::{AuditInputs, IntegrityCheckResult},
    id::AccountId,
    utils::format_coin,
    withdrawal::WithdrawalStatus,
};

use super::{
    error::LedgerError,
    ledger::Ledger,
    storage::{AccountProvider, ContractProvider, RechargeProvider, Storage, StorageTransaction, WithdrawalProvider},
};

/// Collect the raw totals of one account
fn collect_inputs<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    account: &AccountId,
    levels: usize,
) -> Result<AuditInputs, LedgerError> {
    let owner = tx.get_account(account)?;

    let mut downline_recharges = Vec::with_capacity(levels);
    for level in 0..levels {
        let mut total: u64 = 0;
        for member in tx.get_downline(account, level as u8)? {
            total = total.saturating_add(tx.get_approved_recharge_total(&member)?);
        }
        downline_recharges.push(total);
    }

    let total_generated_income = tx
        .get_account_contracts(account)?
        .iter()
        .map(|contract| contract.generated_income())
        .sum();

    let total_approved_withdrawals = tx
        .get_account_withdrawals(account)?
        .iter()
        .filter(|request| request.status == WithdrawalStatus::Approved)
        .map(|request| request.amount as u128)
        .sum();

    Ok(AuditInputs {
        downline_recharges,
        total_generated_income,
        total_approved_withdrawals,
        current_balance: owner.spendable_balance,
    })
}

impl<S: Storage> Ledger<S> {
    /// Reconcile what an account received with what it holds or took out
    pub fn audit_account(&self, account: &AccountId) -> Result<IntegrityCheckResult, LedgerError> {
        let ratios = &self.config().commission_ratios;
        let inputs = self.read(|tx| collect_inputs(tx, account, ratios.levels()))?;
        let result = IntegrityCheckResult::compute(*account, &inputs, ratios, self.config().audit_haircut_bps);

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "audit of {}: credits {} debits {}",
                account,
                result.credits,
                result.debits
            );
        }
        if !result.is_safe {
            warn!(
                "audit flagged {}: debits exceed credits by {}",
                account,
                format_coin(result.diff.unsigned_abs().min(u64::MAX as u128) as u64)
            );
        }
        Ok(result)
    }
}
