// Withdrawal requests and the rules applied when they are created
//
// The requested amount is reserved (debited) when the request is created,
// an admin decision later finalizes it or rejects it with an optional refund.

mod error;
mod rules;

pub use error::*;
pub use rules::*;

use serde::{Deserialize, Serialize};

use crate::{
    id::{AccountId, WithdrawalId},
    time::TimestampSeconds,
    utils::apply_bps,
};

/// Withdrawal state machine: pending -> {approved, rejected}
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Admin decision on a pending request
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WithdrawalDecision {
    Approve,
    Reject,
}

impl WithdrawalDecision {
    pub fn target_status(&self) -> WithdrawalStatus {
        match self {
            Self::Approve => WithdrawalStatus::Approved,
            Self::Reject => WithdrawalStatus::Rejected,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub account_holder: String,
    pub bank_name: String,
    pub account_number: String,
}

impl BankDetails {
    pub fn is_complete(&self) -> bool {
        [&self.account_holder, &self.bank_name, &self.account_number]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub account_id: AccountId,
    pub amount: u64,
    /// Amount debited from the spendable balance at request time.
    /// It is not updated by an amount edit.
    pub reserved_amount: u64,
    pub fee_rate_bps: u16,
    pub fee: u64,
    pub net_payout: u64,
    pub bank_details: BankDetails,
    pub status: WithdrawalStatus,
    /// Only meaningful when rejected
    pub refunded: bool,
    pub created_timestamp: TimestampSeconds,
    pub decision_timestamp: Option<TimestampSeconds>,
    pub edit_reason: Option<String>,
}

/// What a decision did to a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status changed, `refund` is the amount to credit back
    Applied { refund: Option<u64> },
    /// The same decision was already recorded, nothing to do
    AlreadyApplied,
}

/// Fee and net payout of an amount
pub fn split_fee(amount: u64, fee_rate_bps: u16) -> (u64, u64) {
    let fee = apply_bps(amount, fee_rate_bps);
    (fee, amount - fee)
}

impl WithdrawalRequest {
    pub fn new(
        id: WithdrawalId,
        account_id: AccountId,
        amount: u64,
        fee_rate_bps: u16,
        bank_details: BankDetails,
        created_timestamp: TimestampSeconds,
    ) -> Self {
        let (fee, net_payout) = split_fee(amount, fee_rate_bps);
        Self {
            id,
            account_id,
            amount,
            reserved_amount: amount,
            fee_rate_bps,
            fee,
            net_payout,
            bank_details,
            status: WithdrawalStatus::Pending,
            refunded: false,
            created_timestamp,
            decision_timestamp: None,
            edit_reason: None,
        }
    }

    /// Apply an admin decision.
    ///
    /// Repeating the decision already recorded is a no-op so a duplicate
    /// click never refunds twice, any other change of a terminal request fails.
    pub fn decide(
        &mut self,
        decision: WithdrawalDecision,
        refund: bool,
        now: TimestampSeconds,
    ) -> Result<TransitionOutcome, WithdrawalError> {
        let target = decision.target_status();
        // refund has no meaning on approval
        let refund = refund && target == WithdrawalStatus::Rejected;

        if self.status.is_terminal() {
            if self.status == target && self.refunded == refund {
                return Ok(TransitionOutcome::AlreadyApplied);
            }

            return Err(WithdrawalError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }

        self.status = target;
        self.refunded = refund;
        self.decision_timestamp = Some(now);

        Ok(TransitionOutcome::Applied {
            refund: refund.then_some(self.amount),
        })
    }

    /// Correct the amount of a pending request, fee and payout follow the new amount
    pub fn edit_amount(&mut self, new_amount: u64, reason: &str) -> Result<(), WithdrawalError> {
        if self.status != WithdrawalStatus::Pending {
            return Err(WithdrawalError::NotPending {
                status: self.status,
            });
        }

        let (fee, net_payout) = split_fee(new_amount, self.fee_rate_bps);
        self.amount = new_amount;
        self.fee = fee;
        self.net_payout = net_payout;
        self.edit_reason = Some(reason.to_string());
        Ok(())
    }

    /// True when an edit made the request amount differ from what was reserved
    pub fn is_diverged(&self) -> bool {
        self.amount != self.reserved_amount
    }

    pub fn is_deletable(&self) -> bool {
        self.status == WithdrawalStatus::Rejected
    }
}
