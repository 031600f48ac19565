use log::trace;
use harvest_common::{
    id::{AccountId, WithdrawalId},
    withdrawal::WithdrawalRequest,
};

use super::{pair_key, suffix_id};
use crate::core::{
    error::LedgerError,
    storage::{Column, Storage, StorageTransaction},
};

/// Withdrawal requests indexed per account
pub trait WithdrawalProvider {
    /// Fails with `WithdrawalNotFound` if the request does not exist or was deleted
    fn get_withdrawal(&mut self, id: &WithdrawalId) -> Result<WithdrawalRequest, LedgerError>;

    fn set_withdrawal(&mut self, request: &WithdrawalRequest) -> Result<(), LedgerError>;

    /// Permanently remove a request and its index entry
    fn delete_withdrawal(&mut self, request: &WithdrawalRequest);

    fn get_account_withdrawal_ids(&self, account: &AccountId) -> Result<Vec<WithdrawalId>, LedgerError>;

    /// Requests of an account, oldest first
    fn get_account_withdrawals(&mut self, account: &AccountId) -> Result<Vec<WithdrawalRequest>, LedgerError>;
}

impl<S: Storage> WithdrawalProvider for StorageTransaction<'_, S> {
    fn get_withdrawal(&mut self, id: &WithdrawalId) -> Result<WithdrawalRequest, LedgerError> {
        self.load_optional_from_disk(Column::Withdrawals, &id.to_bytes())?
            .ok_or(LedgerError::WithdrawalNotFound(*id))
    }

    fn set_withdrawal(&mut self, request: &WithdrawalRequest) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "set withdrawal {} of {} status {:?}",
                request.id,
                request.account_id,
                request.status
            );
        }
        self.insert_into_disk(Column::Withdrawals, &request.id.to_bytes(), request)?;
        self.insert_marker(
            Column::AccountWithdrawals,
            &pair_key(request.account_id.to_bytes(), request.id.to_bytes()),
        );
        Ok(())
    }

    fn delete_withdrawal(&mut self, request: &WithdrawalRequest) {
        self.remove_from_disk(Column::Withdrawals, &request.id.to_bytes());
        self.remove_from_disk(
            Column::AccountWithdrawals,
            &pair_key(request.account_id.to_bytes(), request.id.to_bytes()),
        );
    }

    fn get_account_withdrawal_ids(&self, account: &AccountId) -> Result<Vec<WithdrawalId>, LedgerError> {
        Ok(self
            .scan_keys(Column::AccountWithdrawals, &account.to_bytes())?
            .iter()
            .filter_map(|key| suffix_id(key).map(WithdrawalId))
            .collect())
    }

    fn get_account_withdrawals(&mut self, account: &AccountId) -> Result<Vec<WithdrawalRequest>, LedgerError> {
        self.get_account_withdrawal_ids(account)?
            .iter()
            .map(|id| self.get_withdrawal(id))
            .collect()
    }
}
