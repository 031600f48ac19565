// Commission configuration errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferralError {
    #[error("Commission ratios cannot be empty")]
    EmptyRatios,

    #[error("Requested {requested} levels exceeds maximum {max}")]
    LevelsTooDeep { max: usize, requested: usize },

    #[error("Total commission ratio {total} exceeds 10000 (100%)")]
    RatiosTooHigh { total: u32 },
}
