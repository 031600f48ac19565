use log::trace;
use harvest_common::{
    id::{AccountId, RechargeId},
    recharge::RechargeRecord,
};

use super::{pair_key, suffix_id};
use crate::core::{
    error::LedgerError,
    storage::{Column, Storage, StorageTransaction},
};

/// Recharges indexed per account
pub trait RechargeProvider {
    /// Fails with `RechargeNotFound` if the recharge does not exist
    fn get_recharge(&mut self, id: &RechargeId) -> Result<RechargeRecord, LedgerError>;

    fn set_recharge(&mut self, recharge: &RechargeRecord) -> Result<(), LedgerError>;

    fn get_account_recharges(&mut self, account: &AccountId) -> Result<Vec<RechargeRecord>, LedgerError>;

    /// Sum of the approved recharges of an account
    fn get_approved_recharge_total(&mut self, account: &AccountId) -> Result<u64, LedgerError> {
        Ok(self
            .get_account_recharges(account)?
            .iter()
            .filter(|recharge| recharge.is_approved())
            .fold(0u64, |total, recharge| total.saturating_add(recharge.amount)))
    }
}

impl<S: Storage> RechargeProvider for StorageTransaction<'_, S> {
    fn get_recharge(&mut self, id: &RechargeId) -> Result<RechargeRecord, LedgerError> {
        self.load_optional_from_disk(Column::Recharges, &id.to_bytes())?
            .ok_or(LedgerError::RechargeNotFound(*id))
    }

    fn set_recharge(&mut self, recharge: &RechargeRecord) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "set recharge {} of {} status {:?}",
                recharge.id,
                recharge.account_id,
                recharge.status
            );
        }
        self.insert_into_disk(Column::Recharges, &recharge.id.to_bytes(), recharge)?;
        self.insert_marker(
            Column::AccountRecharges,
            &pair_key(recharge.account_id.to_bytes(), recharge.id.to_bytes()),
        );
        Ok(())
    }

    fn get_account_recharges(&mut self, account: &AccountId) -> Result<Vec<RechargeRecord>, LedgerError> {
        let ids: Vec<RechargeId> = self
            .scan_keys(Column::AccountRecharges, &account.to_bytes())?
            .iter()
            .filter_map(|key| suffix_id(key).map(RechargeId))
            .collect();

        ids.iter().map(|id| self.get_recharge(id)).collect()
    }
}
