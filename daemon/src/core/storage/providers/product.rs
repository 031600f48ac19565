use log::trace;
use harvest_common::{contract::Product, id::ProductId};

use crate::core::{
    error::LedgerError,
    storage::{Column, Storage, StorageTransaction},
};

/// Product catalog
pub trait ProductProvider {
    /// Fails with `ProductNotFound` if the product is not in the catalog
    fn get_product(&mut self, id: &ProductId) -> Result<Product, LedgerError>;

    fn set_product(&mut self, product: &Product) -> Result<(), LedgerError>;

    fn get_products(&self) -> Result<Vec<Product>, LedgerError>;
}

impl<S: Storage> ProductProvider for StorageTransaction<'_, S> {
    fn get_product(&mut self, id: &ProductId) -> Result<Product, LedgerError> {
        self.load_optional_from_disk(Column::Products, &id.to_bytes())?
            .ok_or(LedgerError::ProductNotFound(*id))
    }

    fn set_product(&mut self, product: &Product) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("set product {} price {}", product.id, product.price);
        }
        self.insert_into_disk(Column::Products, &product.id.to_bytes(), product)
    }

    fn get_products(&self) -> Result<Vec<Product>, LedgerError> {
        self.scan_values(Column::Products, &[])
    }
}
