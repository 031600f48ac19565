// Type map handed to RPC methods: the ledger handle and the client address.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use anyhow::{Context as AnyContext, Result};

#[derive(Default)]
pub struct Context {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store<T: Send + Sync + 'static>(&mut self, data: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(data));
    }

    pub fn has<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn get_optional<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    pub fn get<T: 'static>(&self) -> Result<&T> {
        self.get_optional().context("Requested type not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_get() {
        let mut context = Context::new();
        context.store(42u64);
        context.store(String::from("ledger"));

        assert!(context.has::<u64>());
        assert_eq!(context.get::<u64>().unwrap(), &42);
        assert_eq!(context.get::<String>().unwrap(), "ledger");
        assert!(context.get::<u32>().is_err());
    }
}
