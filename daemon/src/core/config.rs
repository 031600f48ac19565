use serde::{Deserialize, Serialize};
use harvest_common::{
    config::{AUDIT_REWARD_HAIRCUT_BPS, BASIS_POINTS, SECONDS_PER_DAY},
    referral::CommissionRatios,
    vip::VipTable,
    withdrawal::WithdrawalRules,
};

use crate::{
    config::{DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_MAX_ATOMIC_ATTEMPTS, DEFAULT_SWEEP_INTERVAL_SECS},
    core::error::LedgerError,
};

fn default_audit_haircut_bps() -> u16 {
    AUDIT_REWARD_HAIRCUT_BPS
}

fn default_max_atomic_attempts() -> u32 {
    DEFAULT_MAX_ATOMIC_ATTEMPTS
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

/// Business rules of the ledger, loaded from the JSON config file
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    #[serde(default)]
    pub commission_ratios: CommissionRatios,
    #[serde(default)]
    pub withdrawal_rules: WithdrawalRules,
    #[serde(default)]
    pub vip_table: VipTable,
    /// Factor applied to commissions by the integrity audit
    #[serde(default = "default_audit_haircut_bps")]
    pub audit_haircut_bps: u16,
    /// Fixed offset of the platform time zone, used for calendar days
    #[serde(default)]
    pub utc_offset_secs: i32,
    #[serde(default = "default_max_atomic_attempts")]
    pub max_atomic_attempts: u32,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            commission_ratios: CommissionRatios::default(),
            withdrawal_rules: WithdrawalRules::default(),
            vip_table: VipTable::default(),
            audit_haircut_bps: default_audit_haircut_bps(),
            utc_offset_secs: 0,
            max_atomic_attempts: default_max_atomic_attempts(),
            sweep_interval_secs: default_sweep_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), LedgerError> {
        self.commission_ratios.validate()?;
        self.vip_table.validate()?;

        let rules = &self.withdrawal_rules;
        if rules.fee_bps as u64 >= BASIS_POINTS {
            return Err(LedgerError::Validation(format!(
                "withdrawal fee {} bps must be below 100%",
                rules.fee_bps
            )));
        }
        if rules.min_amount == 0 || rules.min_amount > rules.max_amount {
            return Err(LedgerError::Validation(format!(
                "invalid withdrawal range [{}, {}]",
                rules.min_amount, rules.max_amount
            )));
        }

        if self.audit_haircut_bps as u64 > BASIS_POINTS {
            return Err(LedgerError::Validation(format!(
                "audit haircut {} bps is above 100%",
                self.audit_haircut_bps
            )));
        }

        if self.utc_offset_secs.unsigned_abs() as u64 >= SECONDS_PER_DAY {
            return Err(LedgerError::Validation(format!(
                "UTC offset {} is out of range",
                self.utc_offset_secs
            )));
        }

        if self.max_atomic_attempts == 0 {
            return Err(LedgerError::Validation(
                "at least one atomic attempt is required".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 || self.event_channel_capacity == 0 {
            return Err(LedgerError::Validation(
                "sweep interval and event capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: LedgerConfig = serde_json::from_str(
            r#"{
                "commissionRatios": [1000, 500],
                "withdrawalRules": { "maxWithdrawalPercentOfRecharge": 150 },
                "utcOffsetSecs": 28800
            }"#,
        )
        .unwrap();
        assert_eq!(config.commission_ratios.levels(), 2);
        assert_eq!(config.withdrawal_rules.max_withdrawal_percent_of_recharge, Some(150));
        assert_eq!(config.withdrawal_rules.fee_bps, 600);
        assert_eq!(config.max_atomic_attempts, DEFAULT_MAX_ATOMIC_ATTEMPTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_rules() {
        let mut config = LedgerConfig::default();
        config.commission_ratios = CommissionRatios::new(vec![6000, 5000]);
        assert!(matches!(config.validate(), Err(LedgerError::Referral(_))));

        let mut config = LedgerConfig::default();
        config.withdrawal_rules.min_amount = config.withdrawal_rules.max_amount + 1;
        assert!(matches!(config.validate(), Err(LedgerError::Validation(_))));

        let mut config = LedgerConfig::default();
        config.max_atomic_attempts = 0;
        assert!(config.validate().is_err());
    }
}
