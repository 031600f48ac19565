use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, EnumIter, Display, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    // {account_id} => {account}
    Accounts,
    // {product_id} => {product}
    Products,

    // {contract_id} => {contract}
    Contracts,
    // Every contract ever opened by an account
    // {account_id}{contract_id} => {}
    AccountContracts,
    // Contracts still accruing, removed on completion
    // {account_id}{contract_id} => {}
    ActiveContracts,
    // Contracts held per product, checked against the purchase limit
    // {account_id}{product_id} => {count}
    PurchaseCounts,

    // {withdrawal_id} => {withdrawal}
    Withdrawals,
    // {account_id}{withdrawal_id} => {}
    AccountWithdrawals,

    // {recharge_id} => {recharge}
    Recharges,
    // {account_id}{recharge_id} => {}
    AccountRecharges,

    // Reverse index of the inviter chains
    // {ancestor_id}{level}{descendant_id} => {}
    Downlines,

    // Audited administrative overrides
    // {override_id} => {record}
    Overrides,
}

impl Column {
    /// Single byte prefix used by backends sharing one keyspace
    pub const fn prefix(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
