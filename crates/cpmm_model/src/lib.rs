//! CPMM Model - Pure constant product math (x·y=k) for a two-asset pool
//!
//! Every function here is total: integer-only, checked, and returns a
//! `Result` instead of panicking. Forced deposit amounts, minted claims
//! and redemptions are floored in the pool's favour. Swaps floor the
//! remaining output reserve, so the trader gains under one unit per trade.
//!
//! The stateful engine (`cpmm_pool`) calls these functions for every quote
//! and commit, and the Kani harnesses in `crates/proofs/kani` check them.

#![no_std]
#![forbid(unsafe_code)]

pub mod liquidity;
pub mod math;

pub use liquidity::{initial_liquidity, quote_add_liquidity, quote_burn, BurnQuote, LiquidityQuote};
pub use math::{fee_amount, invariant, isqrt, quote_swap, ratio, Ratio, SwapQuote};

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u64 = 10_000;

/// Fixed-point scale of the directional ratio reads (1.00 == 100)
pub const RATIO_SCALE: u64 = 100;

/// Error types for pool math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// A reserve (or the claim supply) is zero where a live pool is required
    InvalidReserves,
    /// Input amount is zero
    ZeroAmount,
    /// Fee rate is 100% or more
    InvalidFee,
    /// Computed output, deposit side or redemption rounds to zero
    DustOutput,
    /// Request exceeds what the pool (or the claim supply) holds
    InsufficientLiquidity,
    /// Ratio-forcing produced an amount above what the caller offered
    RatioViolation,
    /// Arithmetic overflow
    Overflow,
}

/// Narrow a u128 intermediate back into the u64 amount domain
#[inline]
pub(crate) fn to_amount(value: u128) -> Result<u64, MathError> {
    u64::try_from(value).map_err(|_| MathError::Overflow)
}
