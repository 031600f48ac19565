// Account Store
// Wallet mutations always go through `apply_delta` inside an atomic unit,
// never through a blind write of a previously read balance.

use log::info;
use harvest_common::{
    account::{Account, InviterChain, Restriction, WalletField},
    api::BalanceOverrideResult,
    event::LedgerEvent,
    id::AccountId,
    overrides::OverrideKind,
    time::TimestampSeconds,
};

use super::{
    error::LedgerError,
    ledger::{record_override, require_override_reason, Committed, Ledger},
    storage::{AccountProvider, Storage, StorageTransaction},
};

/// Apply a signed delta to a wallet of an account loaded in `tx`.
/// Returns the updated account, already written back.
pub(super) fn apply_delta<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    id: &AccountId,
    field: WalletField,
    delta: i64,
) -> Result<Account, LedgerError> {
    let mut account = tx.get_account(id)?;
    account
        .apply_delta(field, delta)
        .map_err(|e| LedgerError::from_balance(*id, e))?;
    tx.set_account(&account)?;
    Ok(account)
}

/// Credit an unsigned amount, rejecting amounts that do not fit a delta
pub(super) fn credit<S: Storage>(
    tx: &mut StorageTransaction<'_, S>,
    id: &AccountId,
    field: WalletField,
    amount: u64,
) -> Result<Account, LedgerError> {
    let delta = i64::try_from(amount).map_err(|_| LedgerError::BalanceOverflow)?;
    apply_delta(tx, id, field, delta)
}

impl<S: Storage> Ledger<S> {
    /// Register a new account.
    /// Its inviter chain is captured from the inviter now and never changes.
    pub async fn register_account(&self, inviter: Option<AccountId>) -> Result<Account, LedgerError> {
        let now = self.now();
        self.execute("register_account", |tx| {
            let chain = match inviter.as_ref() {
                Some(inviter) => {
                    let inviter_account = tx.get_account(inviter)?;
                    InviterChain::from_inviter(*inviter, &inviter_account.inviter_chain)
                }
                None => InviterChain::default(),
            };

            let account = Account::new(AccountId(tx.next_id()?), chain, now);
            tx.set_account(&account)?;
            for (level, ancestor) in account.inviter_chain.iter() {
                tx.add_downline(&ancestor, level as u8, &account.id);
            }

            Ok(Committed::silent(account))
        })
        .await
        .inspect(|account| {
            if log::log_enabled!(log::Level::Info) {
                info!("registered {} invited by {:?}", account.id, inviter);
            }
        })
    }

    pub fn get_account(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.read(|tx| tx.get_account(id))
    }

    /// Atomic read-modify-write of one wallet.
    /// Fails with `InsufficientFunds` if the wallet would go below zero.
    pub async fn adjust_balance(&self, id: &AccountId, field: WalletField, delta: i64) -> Result<u64, LedgerError> {
        self.execute("adjust_balance", |tx| {
            let account = apply_delta(tx, id, field, delta)?;
            Ok(Committed::silent(account.balance(field)))
        })
        .await
    }

    /// Administrative overwrite of a wallet, audited
    pub async fn set_balance(
        &self,
        id: &AccountId,
        field: WalletField,
        value: u64,
        actor: &str,
        reason: &str,
    ) -> Result<BalanceOverrideResult, LedgerError> {
        require_override_reason(actor, reason)?;
        let now = self.now();

        let result = self
            .execute("set_balance", |tx| {
                let mut account = tx.get_account(id)?;
                let previous = account.balance(field);
                account.set_balance(field, value);
                tx.set_account(&account)?;

                let kind = OverrideKind::BalanceSet {
                    account: *id,
                    field,
                    previous,
                    value,
                };
                record_override(tx, actor, reason, kind, now)?;

                let result = BalanceOverrideResult {
                    account: *id,
                    field,
                    previous,
                    value,
                };
                let event = LedgerEvent::BalanceOverridden {
                    account: *id,
                    field,
                    previous,
                    value,
                };
                Ok(Committed::new(result, vec![event]))
            })
            .await?;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} set {} wallet of {} from {} to {}: {}",
                actor, field, id, result.previous, result.value, reason
            );
        }
        Ok(result)
    }

    /// Block withdrawals of an account until `until`, or forever
    pub async fn set_restriction(
        &self,
        id: &AccountId,
        reason: &str,
        until: Option<TimestampSeconds>,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        require_override_reason(actor, reason)?;
        let now = self.now();

        self.execute("set_restriction", |tx| {
            let mut account = tx.get_account(id)?;
            account.restriction = Some(Restriction {
                reason: reason.to_string(),
                until,
                set_by: actor.to_string(),
                set_at: now,
            });
            tx.set_account(&account)?;
            record_override(
                tx,
                actor,
                reason,
                OverrideKind::RestrictionSet { account: *id, until },
                now,
            )?;
            Ok(Committed::silent(account))
        })
        .await
        .inspect(|_| {
            if log::log_enabled!(log::Level::Info) {
                info!("{} restricted {} until {:?}: {}", actor, id, until, reason);
            }
        })
    }

    pub async fn clear_restriction(&self, id: &AccountId, actor: &str, reason: &str) -> Result<Account, LedgerError> {
        require_override_reason(actor, reason)?;
        let now = self.now();

        self.execute("clear_restriction", |tx| {
            let mut account = tx.get_account(id)?;
            account.restriction = None;
            tx.set_account(&account)?;
            record_override(
                tx,
                actor,
                reason,
                OverrideKind::RestrictionCleared { account: *id },
                now,
            )?;
            Ok(Committed::silent(account))
        })
        .await
    }
}
