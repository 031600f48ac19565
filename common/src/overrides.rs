// Audited administrative overrides
// Every override bypasses a normal state transition and is recorded with
// the actor and reason in the same atomic unit as its effect.

use serde::{Deserialize, Serialize};

use crate::{
    account::WalletField,
    id::{AccountId, ContractId, OverrideId, WithdrawalId},
    time::TimestampSeconds,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    BalanceSet {
        account: AccountId,
        field: WalletField,
        previous: u64,
        value: u64,
    },
    ContractPeriod {
        account: AccountId,
        contract: ContractId,
        previous_period: u32,
        new_period: u32,
    },
    BulkContractPeriod {
        day_delta: i64,
        adjusted: u32,
        skipped: u32,
    },
    WithdrawalAmount {
        account: AccountId,
        withdrawal: WithdrawalId,
        previous: u64,
        amount: u64,
        reserved: u64,
    },
    WithdrawalDeleted {
        account: AccountId,
        withdrawal: WithdrawalId,
    },
    RestrictionSet {
        account: AccountId,
        until: Option<TimestampSeconds>,
    },
    RestrictionCleared {
        account: AccountId,
    },
}

impl OverrideKind {
    /// Account directly affected, None for bulk overrides
    pub fn account(&self) -> Option<AccountId> {
        match self {
            Self::BalanceSet { account, .. }
            | Self::ContractPeriod { account, .. }
            | Self::WithdrawalAmount { account, .. }
            | Self::WithdrawalDeleted { account, .. }
            | Self::RestrictionSet { account, .. }
            | Self::RestrictionCleared { account } => Some(*account),
            Self::BulkContractPeriod { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRecord {
    pub id: OverrideId,
    pub actor: String,
    pub reason: String,
    pub kind: OverrideKind,
    pub timestamp: TimestampSeconds,
}
