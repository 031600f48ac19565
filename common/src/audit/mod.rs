// Integrity audit
//
// credits = total rewards x haircut + generated income
// debits  = approved withdrawals + current balance
// An account is flagged when its debits exceed its credits.

use serde::{Deserialize, Serialize};

use crate::{id::AccountId, referral::CommissionRatios, utils::apply_bps_u128};

/// Raw totals collected for one account
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditInputs {
    /// Approved recharge total of the downline, index 0 = level A
    pub downline_recharges: Vec<u64>,
    pub total_generated_income: u128,
    pub total_approved_withdrawals: u128,
    pub current_balance: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityCheckResult {
    pub account_id: AccountId,
    /// Rewards per level before the haircut
    pub level_rewards: Vec<u128>,
    pub total_rewards: u128,
    pub total_generated_income: u128,
    pub total_approved_withdrawals: u128,
    pub current_balance: u64,
    pub credits: u128,
    pub debits: u128,
    pub is_safe: bool,
    /// debits - credits, negative when the account is safe
    pub diff: i128,
}

impl IntegrityCheckResult {
    pub fn compute(
        account_id: AccountId,
        inputs: &AuditInputs,
        ratios: &CommissionRatios,
        haircut_bps: u16,
    ) -> Self {
        let level_rewards: Vec<u128> = inputs
            .downline_recharges
            .iter()
            .enumerate()
            .map(|(level, recharge)| {
                ratios
                    .get_ratio(level)
                    .map_or(0, |ratio| apply_bps_u128(*recharge as u128, ratio))
            })
            .collect();
        let total_rewards: u128 = level_rewards.iter().sum();

        Self::from_totals(
            account_id,
            level_rewards,
            total_rewards,
            inputs.total_generated_income,
            inputs.total_approved_withdrawals,
            inputs.current_balance,
            haircut_bps,
        )
    }

    pub fn from_totals(
        account_id: AccountId,
        level_rewards: Vec<u128>,
        total_rewards: u128,
        total_generated_income: u128,
        total_approved_withdrawals: u128,
        current_balance: u64,
        haircut_bps: u16,
    ) -> Self {
        let credits = apply_bps_u128(total_rewards, haircut_bps) + total_generated_income;
        let debits = total_approved_withdrawals + current_balance as u128;
        let diff = debits as i128 - credits as i128;

        Self {
            account_id,
            level_rewards,
            total_rewards,
            total_generated_income,
            total_approved_withdrawals,
            current_balance,
            credits,
            debits,
            is_safe: credits >= debits,
            diff,
        }
    }

    /// Positive margin when credits cover debits
    pub fn safe_margin(&self) -> Option<u128> {
        self.is_safe.then(|| self.diff.unsigned_abs())
    }
}
