use std::collections::BTreeSet;

use log::trace;
use harvest_common::{
    contract::Contract,
    id::{AccountId, ContractId, ProductId},
};

use super::{pair_key, suffix_id};
use crate::core::{
    error::LedgerError,
    storage::{Column, Storage, StorageTransaction},
};

/// Contracts, their per-account indexes and the purchase counters
pub trait ContractProvider {
    /// Fails with `ContractNotFound` if the contract does not exist
    fn get_contract(&mut self, id: &ContractId) -> Result<Contract, LedgerError>;

    /// Store a contract and keep the account and active indexes in sync with its status
    fn set_contract(&mut self, contract: &Contract) -> Result<(), LedgerError>;

    /// Every contract ever opened by an account, oldest first
    fn get_account_contract_ids(&self, account: &AccountId) -> Result<Vec<ContractId>, LedgerError>;

    fn get_account_contracts(&mut self, account: &AccountId) -> Result<Vec<Contract>, LedgerError>;

    /// Contracts of an account still accruing
    fn get_active_contract_ids(&self, account: &AccountId) -> Result<Vec<ContractId>, LedgerError>;

    /// Accounts holding at least one active contract
    fn get_accounts_with_active_contracts(&self) -> Result<Vec<AccountId>, LedgerError>;

    /// Contracts held by an account for a product, read inside the unit
    /// so that concurrent purchases conflict on it
    fn get_purchase_count(&mut self, account: &AccountId, product: &ProductId) -> Result<u32, LedgerError>;

    fn set_purchase_count(
        &mut self,
        account: &AccountId,
        product: &ProductId,
        count: u32,
    ) -> Result<(), LedgerError>;
}

impl<S: Storage> ContractProvider for StorageTransaction<'_, S> {
    fn get_contract(&mut self, id: &ContractId) -> Result<Contract, LedgerError> {
        self.load_optional_from_disk(Column::Contracts, &id.to_bytes())?
            .ok_or(LedgerError::ContractNotFound(*id))
    }

    fn set_contract(&mut self, contract: &Contract) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!(
                "set contract {} of {} remaining {} status {:?}",
                contract.id,
                contract.account_id,
                contract.remaining_days,
                contract.status
            );
        }

        let index_key = pair_key(contract.account_id.to_bytes(), contract.id.to_bytes());
        self.insert_into_disk(Column::Contracts, &contract.id.to_bytes(), contract)?;
        self.insert_marker(Column::AccountContracts, &index_key);
        if contract.is_active() {
            self.insert_marker(Column::ActiveContracts, &index_key);
        } else {
            self.remove_from_disk(Column::ActiveContracts, &index_key);
        }
        Ok(())
    }

    fn get_account_contract_ids(&self, account: &AccountId) -> Result<Vec<ContractId>, LedgerError> {
        Ok(self
            .scan_keys(Column::AccountContracts, &account.to_bytes())?
            .iter()
            .filter_map(|key| suffix_id(key).map(ContractId))
            .collect())
    }

    fn get_account_contracts(&mut self, account: &AccountId) -> Result<Vec<Contract>, LedgerError> {
        self.get_account_contract_ids(account)?
            .iter()
            .map(|id| self.get_contract(id))
            .collect()
    }

    fn get_active_contract_ids(&self, account: &AccountId) -> Result<Vec<ContractId>, LedgerError> {
        Ok(self
            .scan_keys(Column::ActiveContracts, &account.to_bytes())?
            .iter()
            .filter_map(|key| suffix_id(key).map(ContractId))
            .collect())
    }

    fn get_accounts_with_active_contracts(&self) -> Result<Vec<AccountId>, LedgerError> {
        let accounts: BTreeSet<AccountId> = self
            .scan_keys(Column::ActiveContracts, &[])?
            .iter()
            .filter_map(|key| AccountId::from_bytes(key))
            .collect();
        Ok(accounts.into_iter().collect())
    }

    fn get_purchase_count(&mut self, account: &AccountId, product: &ProductId) -> Result<u32, LedgerError> {
        let key = pair_key(account.to_bytes(), product.to_bytes());
        Ok(self
            .load_optional_from_disk(Column::PurchaseCounts, &key)?
            .unwrap_or(0))
    }

    fn set_purchase_count(
        &mut self,
        account: &AccountId,
        product: &ProductId,
        count: u32,
    ) -> Result<(), LedgerError> {
        let key = pair_key(account.to_bytes(), product.to_bytes());
        self.insert_into_disk(Column::PurchaseCounts, &key, &count)
    }
}
