// Products and the contracts purchased from them
//
// All arithmetic on a contract is pure: the daemon loads a contract inside an
// atomic unit, calls `accrue` or `adjust_period`, and writes back the result.

mod error;

pub use error::ContractError;

use serde::{Deserialize, Serialize};

use crate::{
    config::SECONDS_PER_DAY,
    id::{AccountId, ContractId, ProductId},
    time::{whole_days_between, TimestampSeconds},
};

/// A product of the catalog, managed by administrators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    /// Principal paid at purchase
    pub price: u64,
    pub daily_income: u64,
    /// Total days of the contract, day 1 included
    pub contract_period: u32,
    /// Maximum contracts one account may hold, 0 means unlimited
    #[serde(default)]
    pub purchase_limit: u32,
}

impl Product {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.price == 0 {
            return Err(ContractError::InvalidProduct("price must be greater than zero"));
        }

        if self.contract_period == 0 {
            return Err(ContractError::InvalidProduct(
                "contract period must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Returns true if an account already holding `held` contracts may buy one more
    pub fn allows_purchase(&self, held: u32) -> bool {
        self.purchase_limit == 0 || held < self.purchase_limit
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ContractStatus {
    Active,
    Completed,
}

/// A purchased product instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub principal: u64,
    pub daily_income: u64,
    pub contract_period: u32,
    pub remaining_days: u32,
    pub total_profit: u64,
    pub principal_plus_income: u64,
    pub status: ContractStatus,
    pub purchase_timestamp: TimestampSeconds,
    pub last_accrual_timestamp: TimestampSeconds,
}

/// Result of advancing a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualOutcome {
    pub income_credited: u64,
    pub days_credited: u32,
    pub remaining_days: u32,
    pub status: ContractStatus,
}

/// Result of an administrative period change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAdjustment {
    pub previous_period: u32,
    pub new_period: u32,
    pub day_delta: i64,
    pub remaining_days: u32,
    pub status: ContractStatus,
}

impl Contract {
    /// Open a contract at purchase time.
    /// The first day is paid by the purchase itself, so one day is already consumed.
    pub fn open(
        id: ContractId,
        account_id: AccountId,
        product: &Product,
        purchase_timestamp: TimestampSeconds,
    ) -> Result<Self, ContractError> {
        product.validate()?;

        let total_profit = product
            .daily_income
            .checked_mul(product.contract_period as u64)
            .ok_or(ContractError::Overflow)?;
        let principal_plus_income = product
            .price
            .checked_add(total_profit)
            .ok_or(ContractError::Overflow)?;

        let remaining_days = product.contract_period - 1;
        let status = if remaining_days == 0 {
            ContractStatus::Completed
        } else {
            ContractStatus::Active
        };

        Ok(Self {
            id,
            account_id,
            product_id: product.id,
            principal: product.price,
            daily_income: product.daily_income,
            contract_period: product.contract_period,
            remaining_days,
            total_profit,
            principal_plus_income,
            status,
            purchase_timestamp,
            last_accrual_timestamp: purchase_timestamp,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    /// Days already paid out, day 1 included
    pub fn days_elapsed(&self) -> u32 {
        self.contract_period.saturating_sub(self.remaining_days)
    }

    /// Income generated so far by this contract
    pub fn generated_income(&self) -> u128 {
        self.days_elapsed() as u128 * self.daily_income as u128
    }

    /// Advance the contract by the whole days elapsed since the last accrual.
    ///
    /// The last accrual timestamp moves by whole days only, so calling this
    /// again within the same day credits nothing.
    /// The contract is not modified if an error is returned.
    pub fn accrue(&mut self, as_of: TimestampSeconds) -> Result<AccrualOutcome, ContractError> {
        let elapsed = whole_days_between(self.last_accrual_timestamp, as_of);
        if !self.is_active() || elapsed == 0 {
            return Ok(AccrualOutcome {
                income_credited: 0,
                days_credited: 0,
                remaining_days: self.remaining_days,
                status: self.status,
            });
        }

        let days = elapsed.min(self.remaining_days as u64);
        let income = self
            .daily_income
            .checked_mul(days)
            .ok_or(ContractError::Overflow)?;
        let last_accrual = elapsed
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|secs| self.last_accrual_timestamp.checked_add(secs))
            .ok_or(ContractError::Overflow)?;

        // days <= remaining_days, which fits in u32
        self.remaining_days -= days as u32;
        self.last_accrual_timestamp = last_accrual;
        if self.remaining_days == 0 {
            self.status = ContractStatus::Completed;
        }

        Ok(AccrualOutcome {
            income_credited: income,
            days_credited: days as u32,
            remaining_days: self.remaining_days,
            status: self.status,
        })
    }

    /// Administrative override of the contract period.
    ///
    /// The day difference is applied to the remaining days (clamped at zero)
    /// and to both derived financial fields. A contract brought back above
    /// zero remaining days becomes active again and accrues from `now`,
    /// the days it spent completed are never paid.
    pub fn adjust_period(
        &mut self,
        new_period: i64,
        now: TimestampSeconds,
    ) -> Result<PeriodAdjustment, ContractError> {
        if new_period <= 0 {
            return Err(ContractError::InvalidPeriod {
                requested: new_period,
            });
        }
        let period = u32::try_from(new_period).map_err(|_| ContractError::InvalidPeriod {
            requested: new_period,
        })?;

        let previous_period = self.contract_period;
        let diff = period as i64 - previous_period as i64;
        let income_delta = diff as i128 * self.daily_income as i128;

        let remaining = (self.remaining_days as i64 + diff).max(0) as u32;
        let total_profit = shift_amount(self.total_profit, income_delta)?;
        let principal_plus_income = shift_amount(self.principal_plus_income, income_delta)?;

        self.contract_period = period;
        self.remaining_days = remaining;
        self.total_profit = total_profit;
        self.principal_plus_income = principal_plus_income;
        let status = if remaining == 0 {
            ContractStatus::Completed
        } else {
            ContractStatus::Active
        };
        if self.status == ContractStatus::Completed && status == ContractStatus::Active {
            self.last_accrual_timestamp = now;
        }
        self.status = status;

        Ok(PeriodAdjustment {
            previous_period,
            new_period: period,
            day_delta: diff,
            remaining_days: remaining,
            status: self.status,
        })
    }
}

// Apply a signed delta to an amount, clamping at zero
fn shift_amount(value: u64, delta: i128) -> Result<u64, ContractError> {
    let shifted = (value as i128 + delta).max(0);
    u64::try_from(shifted).map_err(|_| ContractError::Overflow)
}
