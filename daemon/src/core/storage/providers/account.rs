use log::trace;
use harvest_common::{account::Account, id::AccountId};

use crate::core::{
    error::LedgerError,
    storage::{Column, Storage, StorageTransaction},
};

/// Accounts and the downline index built from their inviter chains
pub trait AccountProvider {
    fn get_optional_account(&mut self, id: &AccountId) -> Result<Option<Account>, LedgerError>;

    /// Fails with `AccountNotFound` if the account was never registered
    fn get_account(&mut self, id: &AccountId) -> Result<Account, LedgerError>;

    fn has_account(&mut self, id: &AccountId) -> Result<bool, LedgerError>;

    fn set_account(&mut self, account: &Account) -> Result<(), LedgerError>;

    /// Register `descendant` at a 0-indexed `level` below `ancestor`
    fn add_downline(&mut self, ancestor: &AccountId, level: u8, descendant: &AccountId);

    /// Accounts having `ancestor` at `level` in their inviter chain
    fn get_downline(&self, ancestor: &AccountId, level: u8) -> Result<Vec<AccountId>, LedgerError>;
}

fn downline_prefix(ancestor: &AccountId, level: u8) -> [u8; 9] {
    let mut prefix = [0u8; 9];
    prefix[..8].copy_from_slice(&ancestor.to_bytes());
    prefix[8] = level;
    prefix
}

impl<S: Storage> AccountProvider for StorageTransaction<'_, S> {
    fn get_optional_account(&mut self, id: &AccountId) -> Result<Option<Account>, LedgerError> {
        self.load_optional_from_disk(Column::Accounts, &id.to_bytes())
    }

    fn get_account(&mut self, id: &AccountId) -> Result<Account, LedgerError> {
        self.get_optional_account(id)?
            .ok_or(LedgerError::AccountNotFound(*id))
    }

    fn has_account(&mut self, id: &AccountId) -> Result<bool, LedgerError> {
        self.contains_data(Column::Accounts, &id.to_bytes())
    }

    fn set_account(&mut self, account: &Account) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "set account {} spendable {} invite {} task {}",
                account.id,
                account.spendable_balance,
                account.invite_wallet,
                account.task_wallet
            );
        }
        self.insert_into_disk(Column::Accounts, &account.id.to_bytes(), account)
    }

    fn add_downline(&mut self, ancestor: &AccountId, level: u8, descendant: &AccountId) {
        let mut key = Vec::with_capacity(9 + AccountId::SIZE);
        key.extend_from_slice(&downline_prefix(ancestor, level));
        key.extend_from_slice(&descendant.to_bytes());
        self.insert_marker(Column::Downlines, &key);
    }

    fn get_downline(&self, ancestor: &AccountId, level: u8) -> Result<Vec<AccountId>, LedgerError> {
        let prefix = downline_prefix(ancestor, level);
        Ok(self
            .scan_keys(Column::Downlines, &prefix)?
            .iter()
            .filter_map(|key| key.get(prefix.len()..).and_then(AccountId::from_bytes))
            .collect())
    }
}
