use thiserror::Error;

use super::WithdrawalStatus;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WithdrawalError {
    #[error("Cannot move withdrawal from {from:?} to {to:?}")]
    InvalidTransition {
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },

    #[error("Withdrawal is {status:?}, only pending requests can be edited")]
    NotPending { status: WithdrawalStatus },
}
