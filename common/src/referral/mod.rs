// Referral commission rules
// An account's inviter chain is captured at registration (see `account::InviterChain`),
// every purchase fans out a commission to each existing ancestor of that chain.

mod error;
mod record;

pub use error::*;
pub use record::*;

use serde::{Deserialize, Serialize};

use crate::{
    account::InviterChain,
    config::{BASIS_POINTS, DEFAULT_COMMISSION_RATIOS, INVITER_CHAIN_LEVELS},
    utils::apply_bps,
};

/// Commission ratios per level (in basis points, 100 = 1%)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CommissionRatios {
    /// index 0 = level A (direct inviter)
    pub ratios: Vec<u16>,
}

impl Default for CommissionRatios {
    fn default() -> Self {
        // 10%, 5%, 3%, 2%
        Self {
            ratios: DEFAULT_COMMISSION_RATIOS.to_vec(),
        }
    }
}

impl CommissionRatios {
    pub fn new(ratios: Vec<u16>) -> Self {
        Self { ratios }
    }

    pub fn levels(&self) -> usize {
        self.ratios.len()
    }

    /// Get ratio for a specific level (0-indexed)
    pub fn get_ratio(&self, level: usize) -> Option<u16> {
        self.ratios.get(level).copied()
    }

    pub fn total_ratio(&self) -> u32 {
        self.ratios.iter().map(|&r| r as u32).sum()
    }

    pub fn validate(&self) -> Result<(), ReferralError> {
        if self.ratios.is_empty() {
            return Err(ReferralError::EmptyRatios);
        }

        if self.ratios.len() > INVITER_CHAIN_LEVELS {
            return Err(ReferralError::LevelsTooDeep {
                max: INVITER_CHAIN_LEVELS,
                requested: self.ratios.len(),
            });
        }

        let total = self.total_ratio();
        if total > BASIS_POINTS as u32 {
            return Err(ReferralError::RatiosTooHigh { total });
        }

        Ok(())
    }

    /// Commission owed to the ancestor at `level` for a given amount
    pub fn reward_for_level(&self, amount: u64, level: usize) -> Option<u64> {
        self.get_ratio(level).map(|ratio| apply_bps(amount, ratio))
    }

    /// Build the commission credits for a purchase of `principal`.
    /// Missing levels in the chain produce no credit.
    pub fn plan(&self, chain: &InviterChain, principal: u64) -> Vec<CommissionCredit> {
        chain
            .iter()
            .filter_map(|(level, ancestor)| {
                let rate_bps = self.get_ratio(level)?;
                Some(CommissionCredit {
                    ancestor,
                    level: level as u8,
                    rate_bps,
                    amount: apply_bps(principal, rate_bps),
                })
            })
            .collect()
    }
}

/// Human readable level name (A..D)
pub fn level_name(level: usize) -> char {
    (b'A' + level.min(25) as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::COIN_VALUE, id::AccountId};

    #[test]
    fn test_default_ratios() {
        let ratios = CommissionRatios::default();
        assert_eq!(ratios.levels(), 4);
        assert_eq!(ratios.get_ratio(0), Some(1000)); // 10%
        assert_eq!(ratios.get_ratio(3), Some(200)); // 2%
        assert_eq!(ratios.total_ratio(), 2000); // 20%
        assert!(ratios.validate().is_ok());
    }

    #[test]
    fn test_invalid_ratios() {
        assert_eq!(
            CommissionRatios::new(vec![6000, 3000, 3000]).validate(),
            Err(ReferralError::RatiosTooHigh { total: 12000 })
        );
        assert_eq!(
            CommissionRatios::new(vec![]).validate(),
            Err(ReferralError::EmptyRatios)
        );
        assert_eq!(
            CommissionRatios::new(vec![1; 5]).validate(),
            Err(ReferralError::LevelsTooDeep {
                max: 4,
                requested: 5
            })
        );
    }

    #[test]
    fn test_plan_full_chain() {
        let chain = InviterChain::new([
            Some(AccountId(1)),
            Some(AccountId(2)),
            Some(AccountId(3)),
            Some(AccountId(4)),
        ]);
        let credits = CommissionRatios::default().plan(&chain, 1000 * COIN_VALUE);
        let amounts: Vec<_> = credits.iter().map(|c| (c.ancestor, c.amount)).collect();
        assert_eq!(
            amounts,
            vec![
                (AccountId(1), 100 * COIN_VALUE),
                (AccountId(2), 50 * COIN_VALUE),
                (AccountId(3), 30 * COIN_VALUE),
                (AccountId(4), 20 * COIN_VALUE),
            ]
        );
        let total: u64 = credits.iter().map(|c| c.amount).sum();
        assert_eq!(total, 200 * COIN_VALUE);
    }

    #[test]
    fn test_plan_short_chain() {
        let chain = InviterChain::new([Some(AccountId(1)), None, None, None]);
        let credits = CommissionRatios::default().plan(&chain, 500 * COIN_VALUE);
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].level, 0);
        assert_eq!(credits[0].amount, 50 * COIN_VALUE);

        // A shorter ratio table ignores deeper ancestors
        let chain = InviterChain::new([Some(AccountId(1)), Some(AccountId(2)), None, None]);
        let credits = CommissionRatios::new(vec![1000]).plan(&chain, 500 * COIN_VALUE);
        assert_eq!(credits.len(), 1);
    }

    #[test]
    fn test_level_name() {
        assert_eq!(level_name(0), 'A');
        assert_eq!(level_name(3), 'D');
    }
}
