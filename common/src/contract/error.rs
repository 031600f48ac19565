use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("Invalid product: {0}")]
    InvalidProduct(&'static str),

    #[error("Invalid contract period {requested}, must be greater than zero")]
    InvalidPeriod { requested: i64 },

    #[error("Contract amount overflow")]
    Overflow,
}
