use serde::{Deserialize, Serialize};

use crate::id::AccountId;

/// A single commission paid to an ancestor for a purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommissionCredit {
    /// Account credited on its invite wallet
    pub ancestor: AccountId,
    /// 0-indexed level of the ancestor in the purchaser's chain
    pub level: u8,
    pub rate_bps: u16,
    pub amount: u64,
}
