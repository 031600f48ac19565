// Ledger events, emitted once an atomic unit is committed

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    account::WalletField,
    contract::ContractStatus,
    id::{AccountId, ContractId, ProductId, RechargeId, WithdrawalId},
    withdrawal::WithdrawalStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case", tag = "event")]
#[strum(serialize_all = "snake_case")]
pub enum LedgerEvent {
    PurchaseCommitted {
        account: AccountId,
        contract: ContractId,
        product: ProductId,
        principal: u64,
        day_one_income: u64,
    },
    CommissionCredited {
        account: AccountId,
        purchaser: AccountId,
        contract: ContractId,
        level: u8,
        amount: u64,
    },
    AccrualCommitted {
        account: AccountId,
        income: u64,
        contracts_advanced: u32,
        contracts_completed: u32,
    },
    WithdrawalStateChanged {
        account: AccountId,
        withdrawal: WithdrawalId,
        status: WithdrawalStatus,
        refunded: Option<u64>,
    },
    RechargeApproved {
        account: AccountId,
        recharge: RechargeId,
        amount: u64,
    },
    BalanceOverridden {
        account: AccountId,
        field: WalletField,
        previous: u64,
        value: u64,
    },
    ContractAdjusted {
        account: AccountId,
        contract: ContractId,
        new_period: u32,
        remaining_days: u32,
        status: ContractStatus,
    },
    VipSalaryPaid {
        account: AccountId,
        level: u8,
        amount: u64,
    },
}

impl LedgerEvent {
    /// Account concerned by this event, used to route per-account subscriptions
    pub fn account(&self) -> AccountId {
        match self {
            Self::PurchaseCommitted { account, .. }
            | Self::CommissionCredited { account, .. }
            | Self::AccrualCommitted { account, .. }
            | Self::WithdrawalStateChanged { account, .. }
            | Self::RechargeApproved { account, .. }
            | Self::BalanceOverridden { account, .. }
            | Self::ContractAdjusted { account, .. }
            | Self::VipSalaryPaid { account, .. } => *account,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_routing() {
        let event = LedgerEvent::CommissionCredited {
            account: AccountId(3),
            purchaser: AccountId(9),
            contract: ContractId(1),
            level: 1,
            amount: 50,
        };
        assert_eq!(event.account(), AccountId(3));
        assert_eq!(event.kind(), "commission_credited");
    }

    #[test]
    fn test_event_json_tag() {
        let event = LedgerEvent::VipSalaryPaid {
            account: AccountId(1),
            level: 2,
            amount: 3000,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "vip_salary_paid");
        assert_eq!(value["account"], 1);
    }
}
