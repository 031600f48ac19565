// VIP tiers
// A tier is reached by the number of valid members in the four downline levels,
// each tier pays a periodic salary into the spendable balance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{COIN_VALUE, DEFAULT_VIP_SALARY_INTERVAL_DAYS, MAX_VIP_LEVEL, SECONDS_PER_DAY},
    time::TimestampSeconds,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VipTier {
    pub level: u8,
    pub min_team_members: u32,
    pub salary: u64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VipError {
    #[error("VIP level {0} is out of range")]
    LevelOutOfRange(u8),
    #[error("VIP tiers must be sorted by strictly increasing level and team size")]
    Unsorted,
    #[error("VIP salary interval must be at least one day")]
    ZeroInterval,
}

fn default_salary_interval_days() -> u64 {
    DEFAULT_VIP_SALARY_INTERVAL_DAYS
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VipTable {
    pub tiers: Vec<VipTier>,
    #[serde(default = "default_salary_interval_days")]
    pub salary_interval_days: u64,
}

impl Default for VipTable {
    fn default() -> Self {
        let tiers = [
            (1, 5, 10),
            (2, 15, 30),
            (3, 30, 80),
            (4, 60, 200),
            (5, 120, 500),
            (6, 250, 1_200),
            (7, 500, 3_000),
        ]
        .into_iter()
        .map(|(level, min_team_members, salary)| VipTier {
            level,
            min_team_members,
            salary: salary * COIN_VALUE,
        })
        .collect();

        Self {
            tiers,
            salary_interval_days: DEFAULT_VIP_SALARY_INTERVAL_DAYS,
        }
    }
}

impl VipTable {
    pub fn validate(&self) -> Result<(), VipError> {
        if self.salary_interval_days == 0 {
            return Err(VipError::ZeroInterval);
        }

        for tier in &self.tiers {
            if tier.level == 0 || tier.level > MAX_VIP_LEVEL {
                return Err(VipError::LevelOutOfRange(tier.level));
            }
        }

        let sorted = self.tiers.windows(2).all(|pair| {
            pair[0].level < pair[1].level && pair[0].min_team_members < pair[1].min_team_members
        });
        if !sorted {
            return Err(VipError::Unsorted);
        }

        Ok(())
    }

    /// Highest level reached with `team_members` valid members, 0 if none
    pub fn level_for(&self, team_members: u32) -> u8 {
        self.tiers
            .iter()
            .rev()
            .find(|tier| team_members >= tier.min_team_members)
            .map_or(0, |tier| tier.level)
    }

    pub fn tier(&self, level: u8) -> Option<&VipTier> {
        self.tiers.iter().find(|tier| tier.level == level)
    }

    pub fn salary_interval_secs(&self) -> u64 {
        self.salary_interval_days.saturating_mul(SECONDS_PER_DAY)
    }

    /// When the next salary can be claimed.
    /// The period starts at the last salary, or at the VIP entry for the first one.
    pub fn next_salary_due(
        &self,
        last_salary: Option<TimestampSeconds>,
        vip_entry: Option<TimestampSeconds>,
    ) -> Option<TimestampSeconds> {
        last_salary
            .or(vip_entry)
            .map(|start| start.saturating_add(self.salary_interval_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = VipTable::default();
        assert!(table.validate().is_ok());
        assert_eq!(table.tiers.len(), MAX_VIP_LEVEL as usize);
    }

    #[test]
    fn test_level_for() {
        let table = VipTable::default();
        assert_eq!(table.level_for(0), 0);
        assert_eq!(table.level_for(4), 0);
        assert_eq!(table.level_for(5), 1);
        assert_eq!(table.level_for(59), 3);
        assert_eq!(table.level_for(10_000), 7);
    }

    #[test]
    fn test_invalid_tables() {
        let mut table = VipTable::default();
        table.tiers.swap(0, 1);
        assert_eq!(table.validate(), Err(VipError::Unsorted));

        let mut table = VipTable::default();
        table.tiers[0].level = 0;
        assert_eq!(table.validate(), Err(VipError::LevelOutOfRange(0)));

        let table = VipTable {
            salary_interval_days: 0,
            ..Default::default()
        };
        assert_eq!(table.validate(), Err(VipError::ZeroInterval));
    }

    #[test]
    fn test_next_salary_due() {
        let table = VipTable::default();
        let interval = 30 * SECONDS_PER_DAY;
        assert_eq!(table.next_salary_due(None, None), None);
        assert_eq!(table.next_salary_due(None, Some(100)), Some(100 + interval));
        assert_eq!(
            table.next_salary_due(Some(500), Some(100)),
            Some(500 + interval)
        );
    }
}
