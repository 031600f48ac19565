use serde::{Deserialize, Serialize};

use crate::{
    id::{AccountId, RechargeId},
    time::TimestampSeconds,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RechargeStatus {
    Pending,
    Approved,
    Rejected,
}

/// A deposit submitted by a user and verified by an administrator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RechargeRecord {
    pub id: RechargeId,
    pub account_id: AccountId,
    pub amount: u64,
    /// Payment reference given by the user
    #[serde(default)]
    pub reference: String,
    pub status: RechargeStatus,
    pub created_timestamp: TimestampSeconds,
    pub decision_timestamp: Option<TimestampSeconds>,
}

impl RechargeRecord {
    pub fn new(
        id: RechargeId,
        account_id: AccountId,
        amount: u64,
        reference: String,
        created_timestamp: TimestampSeconds,
    ) -> Self {
        Self {
            id,
            account_id,
            amount,
            reference,
            status: RechargeStatus::Pending,
            created_timestamp,
            decision_timestamp: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RechargeStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == RechargeStatus::Approved
    }
}
