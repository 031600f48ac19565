mod inviter_chain;

pub use inviter_chain::InviterChain;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{error::BalanceError, id::AccountId, time::TimestampSeconds};

/// The wallets held by an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WalletField {
    /// Balance used to buy products and withdraw
    Spendable,
    /// Commissions earned from the referral tree
    Invite,
    /// Mini-reward earnings
    Task,
}

/// An administrative restriction blocking withdrawals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restriction {
    pub reason: String,
    /// None means the restriction never expires
    pub until: Option<TimestampSeconds>,
    pub set_by: String,
    pub set_at: TimestampSeconds,
}

impl Restriction {
    pub fn is_active(&self, now: TimestampSeconds) -> bool {
        self.until.map_or(true, |until| now < until)
    }
}

/// A user account with its wallets and referral data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub spendable_balance: u64,
    pub invite_wallet: u64,
    pub task_wallet: u64,
    pub vip_level: u8,
    pub vip_entry_timestamp: Option<TimestampSeconds>,
    pub last_salary_timestamp: Option<TimestampSeconds>,
    /// Ancestors captured at registration, immutable afterwards
    pub inviter_chain: InviterChain,
    /// Counts toward the team size of its ancestors
    pub is_valid_member: bool,
    pub restriction: Option<Restriction>,
    pub last_withdrawal_request_at: Option<TimestampSeconds>,
    pub created_at: TimestampSeconds,
}

impl Account {
    pub fn new(id: AccountId, inviter_chain: InviterChain, created_at: TimestampSeconds) -> Self {
        Self {
            id,
            spendable_balance: 0,
            invite_wallet: 0,
            task_wallet: 0,
            vip_level: 0,
            vip_entry_timestamp: None,
            last_salary_timestamp: None,
            inviter_chain,
            is_valid_member: false,
            restriction: None,
            last_withdrawal_request_at: None,
            created_at,
        }
    }

    pub fn balance(&self, field: WalletField) -> u64 {
        match field {
            WalletField::Spendable => self.spendable_balance,
            WalletField::Invite => self.invite_wallet,
            WalletField::Task => self.task_wallet,
        }
    }

    fn balance_mut(&mut self, field: WalletField) -> &mut u64 {
        match field {
            WalletField::Spendable => &mut self.spendable_balance,
            WalletField::Invite => &mut self.invite_wallet,
            WalletField::Task => &mut self.task_wallet,
        }
    }

    /// Apply a signed delta to a wallet.
    /// A wallet can never go below zero, the account is left untouched on error.
    pub fn apply_delta(&mut self, field: WalletField, delta: i64) -> Result<u64, BalanceError> {
        let balance = self.balance_mut(field);
        let updated = if delta >= 0 {
            balance
                .checked_add(delta as u64)
                .ok_or(BalanceError::Overflow)?
        } else {
            let need = delta.unsigned_abs();
            balance.checked_sub(need).ok_or(BalanceError::Insufficient {
                need,
                have: *balance,
            })?
        };
        *balance = updated;
        Ok(updated)
    }

    /// Overwrite a wallet, no business rule applies
    pub fn set_balance(&mut self, field: WalletField, value: u64) {
        *self.balance_mut(field) = value;
    }

    /// Returns the restriction if one is active at `now`
    pub fn active_restriction(&self, now: TimestampSeconds) -> Option<&Restriction> {
        self.restriction.as_ref().filter(|r| r.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn account() -> Account {
        Account::new(AccountId(1), InviterChain::default(), 0)
    }

    #[test]
    fn test_apply_delta() {
        let mut account = account();
        assert_eq!(account.apply_delta(WalletField::Spendable, 1000), Ok(1000));
        assert_eq!(account.apply_delta(WalletField::Spendable, -400), Ok(600));
        assert_eq!(account.spendable_balance, 600);

        assert_eq!(
            account.apply_delta(WalletField::Spendable, -601),
            Err(BalanceError::Insufficient {
                need: 601,
                have: 600
            })
        );
        // unchanged after a failed delta
        assert_eq!(account.spendable_balance, 600);
    }

    #[test]
    fn test_wallets_are_independent() {
        let mut account = account();
        account.apply_delta(WalletField::Invite, 50).unwrap();
        account.apply_delta(WalletField::Task, 7).unwrap();
        assert_eq!(account.balance(WalletField::Spendable), 0);
        assert_eq!(account.balance(WalletField::Invite), 50);
        assert_eq!(account.balance(WalletField::Task), 7);
        assert!(account.apply_delta(WalletField::Invite, -51).is_err());
    }

    #[test]
    fn test_overflow() {
        let mut account = account();
        account.set_balance(WalletField::Spendable, u64::MAX);
        assert_eq!(
            account.apply_delta(WalletField::Spendable, 1),
            Err(BalanceError::Overflow)
        );
    }

    #[test]
    fn test_restriction_expiry() {
        let mut account = account();
        account.restriction = Some(Restriction {
            reason: "chargeback".to_string(),
            until: Some(100),
            set_by: "ops".to_string(),
            set_at: 0,
        });
        assert!(account.active_restriction(99).is_some());
        assert!(account.active_restriction(100).is_none());
    }

    #[test]
    fn test_wallet_field_names() {
        assert_eq!(WalletField::Spendable.to_string(), "spendable");
        assert_eq!(WalletField::from_str("invite").unwrap(), WalletField::Invite);
    }
}
