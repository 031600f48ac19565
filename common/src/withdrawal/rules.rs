// Withdrawal rule configuration

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::{
    config::{MAX_WITHDRAWAL_AMOUNT, MIN_WITHDRAWAL_AMOUNT, WITHDRAWAL_FEE_BPS},
    id::ProductId,
    utils::format_coin,
};

/// Team recharge total an account must reach before withdrawing
/// above its recharge cap, for holders of a given product
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequirement {
    pub product_id: ProductId,
    pub team_recharge: u64,
}

mod defaults {
    use super::*;

    pub fn min_amount() -> u64 {
        MIN_WITHDRAWAL_AMOUNT
    }

    pub fn max_amount() -> u64 {
        MAX_WITHDRAWAL_AMOUNT
    }

    pub fn fee_bps() -> u16 {
        WITHDRAWAL_FEE_BPS
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRules {
    #[serde(default = "defaults::min_amount")]
    pub min_amount: u64,
    #[serde(default = "defaults::max_amount")]
    pub max_amount: u64,
    #[serde(default = "defaults::fee_bps")]
    pub fee_bps: u16,
    /// Withdrawals (pending and approved) above this percentage of the
    /// account's own approved recharges need the team requirement.
    /// None disables the rule.
    #[serde(default)]
    pub max_withdrawal_percent_of_recharge: Option<u16>,
    #[serde(default)]
    pub per_product_invite_recharge_requirement: Vec<ProductRequirement>,
}

impl Default for WithdrawalRules {
    fn default() -> Self {
        Self {
            min_amount: defaults::min_amount(),
            max_amount: defaults::max_amount(),
            fee_bps: defaults::fee_bps(),
            max_withdrawal_percent_of_recharge: None,
            per_product_invite_recharge_requirement: Vec::new(),
        }
    }
}

/// Inputs of the recharge cap rule, all amounts are atomic units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RechargeRuleInput {
    pub own_recharge: u64,
    pub team_recharge: u64,
    /// Pending and approved withdrawals already requested
    pub outstanding: u64,
    pub amount: u64,
    /// Highest requirement among the products held
    pub requirement: Option<u64>,
}

/// Why the product requirement blocks a withdrawal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RequirementShortfall {
    /// The account never bought a product
    NoPurchase,
    /// The cap is exceeded and the team recharge is below the requirement
    TeamRecharge {
        cap: u64,
        requested_total: u64,
        team_recharge: u64,
        required: u64,
    },
    /// The cap is exceeded and no held product allows exceeding it
    CapExceeded { cap: u64, requested_total: u64 },
}

impl Display for RequirementShortfall {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::NoPurchase => write!(f, "at least one product must be purchased"),
            Self::TeamRecharge {
                cap,
                requested_total,
                team_recharge,
                required,
            } => write!(
                f,
                "withdrawals {} exceed cap {}, team recharge {} is below required {}",
                format_coin(*requested_total),
                format_coin(*cap),
                format_coin(*team_recharge),
                format_coin(*required)
            ),
            Self::CapExceeded {
                cap,
                requested_total,
            } => write!(
                f,
                "withdrawals {} exceed cap {}",
                format_coin(*requested_total),
                format_coin(*cap)
            ),
        }
    }
}

impl WithdrawalRules {
    pub fn is_amount_in_range(&self, amount: u64) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount)
    }

    pub fn requirement_for(&self, product: &ProductId) -> Option<u64> {
        self.per_product_invite_recharge_requirement
            .iter()
            .find(|r| r.product_id == *product)
            .map(|r| r.team_recharge)
    }

    /// Highest requirement among a set of held products
    pub fn highest_requirement<'a, I>(&self, products: I) -> Option<u64>
    where
        I: IntoIterator<Item = &'a ProductId>,
    {
        products
            .into_iter()
            .filter_map(|product| self.requirement_for(product))
            .max()
    }

    /// Withdrawal cap derived from the account's own approved recharges
    pub fn recharge_cap(&self, own_recharge: u64) -> Option<u64> {
        self.max_withdrawal_percent_of_recharge
            .map(|percent| (own_recharge as u128 * percent as u128 / 100) as u64)
    }

    /// Check the recharge cap rule.
    /// Below the cap nothing is required, above it the team recharge
    /// must reach the highest requirement of the held products.
    pub fn check_recharge_rule(&self, input: &RechargeRuleInput) -> Result<(), RequirementShortfall> {
        let Some(cap) = self.recharge_cap(input.own_recharge) else {
            return Ok(());
        };

        let requested_total = input.outstanding.saturating_add(input.amount);
        if requested_total <= cap {
            return Ok(());
        }

        match input.requirement {
            Some(required) if input.team_recharge >= required => Ok(()),
            Some(required) => Err(RequirementShortfall::TeamRecharge {
                cap,
                requested_total,
                team_recharge: input.team_recharge,
                required,
            }),
            None => Err(RequirementShortfall::CapExceeded {
                cap,
                requested_total,
            }),
        }
    }
}
