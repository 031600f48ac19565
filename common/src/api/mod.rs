// RPC parameters and results

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{
    account::WalletField,
    contract::{AccrualOutcome, Contract, PeriodAdjustment},
    id::{AccountId, ContractId, ProductId, RechargeId, WithdrawalId},
    referral::CommissionCredit,
    time::TimestampSeconds,
    withdrawal::{BankDetails, WithdrawalDecision},
};

#[derive(Serialize, Deserialize)]
pub struct RegisterAccountParams {
    #[serde(default)]
    pub inviter: Option<AccountId>,
}

#[derive(Serialize, Deserialize)]
pub struct AccountParams {
    pub account: AccountId,
}

#[derive(Serialize, Deserialize)]
pub struct GetOverridesParams {
    #[serde(default)]
    pub account: Option<AccountId>,
}

#[derive(Serialize, Deserialize)]
pub struct PurchaseParams {
    pub account: AccountId,
    pub product: ProductId,
}

#[derive(Serialize, Deserialize)]
pub struct SubmitRechargeParams<'a> {
    pub account: AccountId,
    pub amount: u64,
    #[serde(default)]
    pub reference: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct RequestWithdrawalParams {
    pub account: AccountId,
    pub amount: u64,
    pub bank_details: BankDetails,
}

#[derive(Serialize, Deserialize)]
pub struct CancelWithdrawalParams {
    pub account: AccountId,
    pub withdrawal: WithdrawalId,
}

#[derive(Serialize, Deserialize)]
pub struct SetBalanceParams<'a> {
    pub account: AccountId,
    pub field: WalletField,
    pub value: u64,
    pub actor: Cow<'a, str>,
    pub reason: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct AdjustContractPeriodParams<'a> {
    pub contract: ContractId,
    pub new_period: i64,
    pub actor: Cow<'a, str>,
    pub reason: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct BulkAdjustContractPeriodsParams<'a> {
    pub day_delta: i64,
    pub actor: Cow<'a, str>,
    pub reason: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct DecideWithdrawalParams<'a> {
    pub withdrawal: WithdrawalId,
    pub decision: WithdrawalDecision,
    #[serde(default)]
    pub refund: bool,
    pub actor: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct EditWithdrawalAmountParams<'a> {
    pub withdrawal: WithdrawalId,
    pub new_amount: u64,
    pub actor: Cow<'a, str>,
    pub reason: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct DeleteWithdrawalParams<'a> {
    pub withdrawal: WithdrawalId,
    pub actor: Cow<'a, str>,
    pub reason: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct DecideRechargeParams<'a> {
    pub recharge: RechargeId,
    pub actor: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct SetRestrictionParams<'a> {
    pub account: AccountId,
    pub reason: Cow<'a, str>,
    #[serde(default)]
    pub until: Option<TimestampSeconds>,
    pub actor: Cow<'a, str>,
}

#[derive(Serialize, Deserialize)]
pub struct ClearRestrictionParams<'a> {
    pub account: AccountId,
    pub actor: Cow<'a, str>,
    pub reason: Cow<'a, str>,
}

/// Result of a committed purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub contract: Contract,
    pub balance_after: u64,
    pub commissions: Vec<CommissionCredit>,
}

/// Result of syncing one account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccrualReport {
    pub income_credited: u64,
    pub contracts_advanced: u32,
    pub contracts_completed: u32,
    pub outcomes: Vec<(ContractId, AccrualOutcome)>,
}

impl AccrualReport {
    pub fn is_empty(&self) -> bool {
        self.contracts_advanced == 0
    }
}

/// Result of a sweep over every account with active contracts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub accounts_synced: u32,
    pub accounts_failed: u32,
    pub income_credited: u64,
    pub contracts_completed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedContract {
    pub contract: ContractId,
    pub current_period: u32,
    pub requested_period: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkAdjustReport {
    pub adjusted: Vec<(ContractId, PeriodAdjustment)>,
    pub skipped: Vec<SkippedContract>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceOverrideResult {
    pub account: AccountId,
    pub field: WalletField,
    pub previous: u64,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VipEvaluation {
    pub account: AccountId,
    pub team_members: u32,
    pub previous_level: u8,
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VipSalaryReceipt {
    pub account: AccountId,
    pub level: u8,
    pub amount: u64,
    pub next_due: TimestampSeconds,
}
