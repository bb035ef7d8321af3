//! Error taxonomy for pool operations

use cpmm_model::MathError;
use thiserror::Error;

use crate::asset::AssetError;
use crate::ledger::LedgerError;

/// Every failure aborts the whole operation; nothing is retried or queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool has not been bootstrapped")]
    NotBootstrapped,

    #[error("pool is already bootstrapped")]
    AlreadyBootstrapped,

    #[error("asset is not one of the pool's two assets")]
    InvalidAsset,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("insufficient allowance")]
    InsufficientAllowance,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("computed amount rounds to zero")]
    DustOutput,

    #[error("ratio-forced amount exceeds the amount offered")]
    RatioViolation,

    #[error("trade would empty a reserve")]
    InsufficientLiquidity,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("caller is not the pool owner")]
    Unauthorized,

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("asset transfer failed: {0}")]
    Transfer(AssetError),
}

pub type Result<T> = core::result::Result<T, PoolError>;

impl From<MathError> for PoolError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidReserves => PoolError::NotBootstrapped,
            MathError::ZeroAmount => PoolError::ZeroAmount,
            MathError::InvalidFee => PoolError::InvalidConfig("fee must be below 10000 bps"),
            MathError::DustOutput => PoolError::DustOutput,
            MathError::InsufficientLiquidity => PoolError::InsufficientLiquidity,
            MathError::RatioViolation => PoolError::RatioViolation,
            MathError::Overflow => PoolError::Overflow,
        }
    }
}

impl From<LedgerError> for PoolError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance => PoolError::InsufficientBalance,
            LedgerError::InsufficientAllowance => PoolError::InsufficientAllowance,
            LedgerError::Overflow => PoolError::Overflow,
        }
    }
}

impl From<AssetError> for PoolError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::InsufficientBalance => PoolError::InsufficientBalance,
            AssetError::InsufficientAllowance => PoolError::InsufficientAllowance,
            other => PoolError::Transfer(other),
        }
    }
}
