use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Balance overflow")]
    Overflow,

    #[error("Insufficient balance: need {need}, have {have}")]
    Insufficient { need: u64, have: u64 },
}
