use harvest_common::{
    contract::ContractError,
    error::BalanceError,
    id::{AccountId, ContractId, ProductId, RechargeId, WithdrawalId},
    recharge::RechargeStatus,
    referral::ReferralError,
    rpc::InternalRpcError,
    time::TimestampSeconds,
    utils::format_coin,
    vip::VipError,
    withdrawal::{RequirementShortfall, WithdrawalError, WithdrawalStatus},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {}", _0)]
    Validation(String),
    #[error("Bank details are incomplete")]
    MissingBankDetails,
    #[error("Amount {} is out of range [{}, {}]", format_coin(*amount), format_coin(*min), format_coin(*max))]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },
    #[error("Insufficient funds on {}: need {}, have {}", account, format_coin(*need), format_coin(*have))]
    InsufficientFunds {
        account: AccountId,
        need: u64,
        have: u64,
    },
    #[error("Purchase limit reached for {}: {} held, limit is {}", product, held, limit)]
    PurchaseLimitExceeded {
        product: ProductId,
        held: u32,
        limit: u32,
    },
    #[error("Account {} is restricted: {}", account, reason)]
    RestrictionActive {
        account: AccountId,
        reason: String,
        until: Option<TimestampSeconds>,
    },
    #[error("Account {} already requested a withdrawal today (last request at {})", account, last_request)]
    DailyLimitReached {
        account: AccountId,
        last_request: TimestampSeconds,
    },
    #[error("Product requirement not met: {}", _0)]
    ProductRequirementNotMet(RequirementShortfall),
    #[error("Invalid contract period {}", _0)]
    InvalidPeriod(i64),
    #[error("VIP salary is not due before {}", next_due)]
    SalaryNotDue { next_due: TimestampSeconds },
    #[error("Account {} has no VIP level", _0)]
    NoVipLevel(AccountId),
    #[error("Withdrawal {} cannot go from {:?} to {:?}", withdrawal, from, to)]
    InvalidWithdrawalTransition {
        withdrawal: WithdrawalId,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },
    #[error("Withdrawal {} is {:?} and cannot be modified", withdrawal, status)]
    WithdrawalNotPending {
        withdrawal: WithdrawalId,
        status: WithdrawalStatus,
    },
    #[error("Withdrawal {} must be rejected before it can be deleted", _0)]
    WithdrawalNotDeletable(WithdrawalId),
    #[error("Recharge {} was already decided ({:?})", recharge, status)]
    RechargeAlreadyDecided {
        recharge: RechargeId,
        status: RechargeStatus,
    },
    #[error("An override requires an actor and a reason")]
    MissingOverrideReason,
    #[error("Account {} not found", _0)]
    AccountNotFound(AccountId),
    #[error("Product {} not found", _0)]
    ProductNotFound(ProductId),
    #[error("Contract {} not found", _0)]
    ContractNotFound(ContractId),
    #[error("Withdrawal {} not found", _0)]
    WithdrawalNotFound(WithdrawalId),
    #[error("Recharge {} not found", _0)]
    RechargeNotFound(RechargeId),
    #[error("Balance overflow")]
    BalanceOverflow,
    #[error("Concurrent modification detected")]
    ConcurrencyConflict,
    #[error("Atomic unit '{}' gave up after {} attempts", label, attempts)]
    RetriesExhausted { label: &'static str, attempts: u32 },
    #[error("Storage lock is poisoned")]
    PoisonedLock,
    #[error("Corrupted entry in column {}", _0)]
    CorruptedData(&'static str),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Referral(#[from] ReferralError),
    #[error(transparent)]
    Vip(#[from] VipError),
    #[error(transparent)]
    Sled(#[from] sled::Error),
    #[error(transparent)]
    Serialization(#[from] bincode::Error),
}

impl LedgerError {
    /// Errors that the atomic unit executor retries with the same inputs
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }

    /// Map a wallet arithmetic failure on `account`
    pub fn from_balance(account: AccountId, err: BalanceError) -> Self {
        match err {
            BalanceError::Overflow => Self::BalanceOverflow,
            BalanceError::Insufficient { need, have } => Self::InsufficientFunds {
                account,
                need,
                have,
            },
        }
    }

    pub fn from_withdrawal(withdrawal: WithdrawalId, err: WithdrawalError) -> Self {
        match err {
            WithdrawalError::InvalidTransition { from, to } => Self::InvalidWithdrawalTransition {
                withdrawal,
                from,
                to,
            },
            WithdrawalError::NotPending { status } => {
                Self::WithdrawalNotPending { withdrawal, status }
            }
        }
    }

    /// Stable JSON-RPC error code
    pub fn rpc_code(&self) -> i16 {
        match self {
            Self::Validation(_)
            | Self::MissingBankDetails
            | Self::AmountOutOfRange { .. }
            | Self::InvalidPeriod(_)
            | Self::MissingOverrideReason
            | Self::Contract(ContractError::InvalidProduct(_))
            | Self::Contract(ContractError::InvalidPeriod { .. })
            | Self::Referral(_)
            | Self::Vip(_) => 1,
            Self::InsufficientFunds { .. } => 2,
            Self::PurchaseLimitExceeded { .. } => 3,
            Self::RestrictionActive { .. } => 4,
            Self::DailyLimitReached { .. } => 5,
            Self::ProductRequirementNotMet(_) => 6,
            Self::SalaryNotDue { .. } | Self::NoVipLevel(_) => 7,
            Self::InvalidWithdrawalTransition { .. }
            | Self::WithdrawalNotPending { .. }
            | Self::WithdrawalNotDeletable(_)
            | Self::RechargeAlreadyDecided { .. } => 8,
            Self::AccountNotFound(_)
            | Self::ProductNotFound(_)
            | Self::ContractNotFound(_)
            | Self::WithdrawalNotFound(_)
            | Self::RechargeNotFound(_) => 9,
            Self::ConcurrencyConflict | Self::RetriesExhausted { .. } => 10,
            _ => 11,
        }
    }
}

impl From<LedgerError> for InternalRpcError {
    fn from(err: LedgerError) -> Self {
        InternalRpcError::Ledger {
            code: err.rpc_code(),
            message: err.to_string(),
        }
    }
}
