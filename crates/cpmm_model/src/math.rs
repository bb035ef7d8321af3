//! Constant product swap math (x·y=k) with the fee taken from the input

use crate::{to_amount, MathError, BPS_SCALE};

/// Swap quote: what the trader pays, what they receive, and the booked reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    /// Gross input pulled from the trader
    pub amount_in: u64,

    /// Portion of the input retained as fee (not booked into the reserve)
    pub fee: u64,

    /// Input that backs the invariant: amount_in - fee
    pub amount_in_after_fee: u64,

    /// Output pushed to the trader
    pub amount_out: u64,

    /// Input-side reserve after the trade
    pub new_reserve_in: u64,

    /// Output-side reserve after the trade
    pub new_reserve_out: u64,
}

/// Fee retained from a swap input: floor(amount_in * fee_bps / BPS_SCALE)
pub fn fee_amount(amount_in: u64, fee_bps: u64) -> Result<u64, MathError> {
    if fee_bps >= BPS_SCALE {
        return Err(MathError::InvalidFee);
    }
    let fee = (amount_in as u128) * (fee_bps as u128) / BPS_SCALE as u128;
    to_amount(fee)
}

/// Constant product of two reserves. Never overflows: u64·u64 fits in u128.
#[inline]
pub fn invariant(reserve_a: u64, reserve_b: u64) -> u128 {
    (reserve_a as u128) * (reserve_b as u128)
}

/// Calculate the output of selling `amount_in` into the pool
///
/// With fee on input:
/// - fee = floor(Δin · fee_bps / 10_000)
/// - Δin_net = Δin - fee
/// - x1 = x0 + Δin_net
/// - y1 = floor(x0·y0 / x1)
/// - Δout = y0 - y1
///
/// Flooring the remaining reserve can cost the product less than one unit
/// of y per unit of x1: x1·y1 > x0·y0 - x1. Output is priced from the live
/// reserves passed in, never from a cached k.
///
/// # Arguments
/// * `reserve_in` - Reserve of the asset being sold into the pool
/// * `reserve_out` - Reserve of the asset being bought
/// * `fee_bps` - Fee in basis points (e.g., 30 = 0.30%)
/// * `amount_in` - Gross amount the trader sends
///
/// # Returns
/// * `SwapQuote` with fee split, output and post-trade reserves
/// * `MathError::DustOutput` if the output is zero
/// * `MathError::InsufficientLiquidity` if the trade would empty the output side
pub fn quote_swap(
    reserve_in: u64,
    reserve_out: u64,
    fee_bps: u64,
    amount_in: u64,
) -> Result<SwapQuote, MathError> {
    // Validate inputs
    if reserve_in == 0 || reserve_out == 0 {
        return Err(MathError::InvalidReserves);
    }
    if amount_in == 0 {
        return Err(MathError::ZeroAmount);
    }

    let fee = fee_amount(amount_in, fee_bps)?;
    let amount_in_after_fee = amount_in - fee;

    // x1 = x0 + Δin_net, must stay inside the amount domain
    let new_reserve_in = reserve_in
        .checked_add(amount_in_after_fee)
        .ok_or(MathError::Overflow)?;

    // y1 = k / x1 <= y0, so the narrowing cannot fail
    let new_reserve_out = to_amount(invariant(reserve_in, reserve_out) / new_reserve_in as u128)?;
    let amount_out = reserve_out - new_reserve_out;
    if amount_out == 0 {
        return Err(MathError::DustOutput);
    }
    // Shallow output side: k / x1 floors to zero
    if amount_out >= reserve_out {
        return Err(MathError::InsufficientLiquidity);
    }

    Ok(SwapQuote {
        amount_in,
        fee,
        amount_in_after_fee,
        amount_out,
        new_reserve_in,
        new_reserve_out,
    })
}

/// Integer square root, rounded down
pub fn isqrt(n: u128) -> u64 {
    if n < 2 {
        return n as u64;
    }

    // Start from a power of two that is >= sqrt(n) and walk down (Newton)
    let bits = 128 - n.leading_zeros();
    let mut x: u128 = 1 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            break;
        }
        x = y;
    }

    u64::try_from(x).unwrap_or(u64::MAX)
}

/// Exact exchange rate between two reserves: numerator / denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    /// Fixed-point rendering: floor(numerator * scale / denominator)
    pub fn scaled(&self, scale: u64) -> Result<u128, MathError> {
        if self.denominator == 0 {
            return Err(MathError::InvalidReserves);
        }
        Ok((self.numerator as u128) * (scale as u128) / self.denominator as u128)
    }
}

/// Ratio of two reserves, rejecting an empty denominator
pub fn ratio(numerator: u64, denominator: u64) -> Result<Ratio, MathError> {
    if denominator == 0 {
        return Err(MathError::InvalidReserves);
    }
    Ok(Ratio {
        numerator,
        denominator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RATIO_SCALE;

    #[test]
    fn test_swap_ten_percent_fee() {
        // (100, 100) pool, 10% fee, sell 10
        let q = quote_swap(100, 100, 1_000, 10).unwrap();

        assert_eq!(q.fee, 1);
        assert_eq!(q.amount_in_after_fee, 9);
        // 100 - floor(10_000 / 109)
        assert_eq!(q.amount_out, 9);
        assert_eq!(q.new_reserve_in, 109);
        assert_eq!(q.new_reserve_out, 91);
    }

    #[test]
    fn test_swap_quote_for_twenty() {
        let q = quote_swap(100, 100, 1_000, 20).unwrap();
        assert_eq!(q.amount_in_after_fee, 18);
        // 100 - floor(10_000 / 118)
        assert_eq!(q.amount_out, 16);
    }

    #[test]
    fn test_swap_zero_fee() {
        let q = quote_swap(1_000, 1_000, 0, 100).unwrap();
        assert_eq!(q.fee, 0);
        assert_eq!(q.amount_in_after_fee, 100);
        // 1000 - floor(1_000_000 / 1100)
        assert_eq!(q.amount_out, 91);
    }

    #[test]
    fn test_swap_smallest_input_still_pays() {
        // y0 - floor(k / x1) >= 1 whenever the net input is non-zero
        let q = quote_swap(100, 100, 0, 1).unwrap();
        assert_eq!(q.amount_out, 1);
        assert_eq!(q.new_reserve_out, 99);

        let q = quote_swap(1_000_000, 10, 1_000, 1).unwrap();
        assert_eq!(q.fee, 0);
        assert_eq!(q.amount_out, 1);
    }

    #[test]
    fn test_swap_cannot_empty_output_side() {
        // floor(100 / 101) == 0 would hand over the whole side
        assert_eq!(quote_swap(100, 1, 0, 1), Err(MathError::InsufficientLiquidity));
        assert_eq!(quote_swap(1, 1, 0, 10), Err(MathError::InsufficientLiquidity));
    }

    #[test]
    fn test_swap_rejects_bad_inputs() {
        assert_eq!(quote_swap(0, 100, 30, 10), Err(MathError::InvalidReserves));
        assert_eq!(quote_swap(100, 0, 30, 10), Err(MathError::InvalidReserves));
        assert_eq!(quote_swap(100, 100, 30, 0), Err(MathError::ZeroAmount));
        assert_eq!(quote_swap(100, 100, 10_000, 10), Err(MathError::InvalidFee));
    }

    #[test]
    fn test_swap_product_loss_below_one_row() {
        for &(x, y, fee, dx) in &[
            (100u64, 100u64, 0u64, 9u64),
            (100, 100, 1_000, 10),
            (1_000, 7, 30, 999),
            (123_456, 654_321, 25, 77_777),
        ] {
            let q = quote_swap(x, y, fee, dx).unwrap();
            let k1 = invariant(q.new_reserve_in, q.new_reserve_out);
            assert!(k1 + q.new_reserve_in as u128 > invariant(x, y));
        }
        // (109, 91): 9919 vs 10_000, lost 81 < 109
        let q = quote_swap(100, 100, 1_000, 10).unwrap();
        assert_eq!(invariant(q.new_reserve_in, q.new_reserve_out), 9_919);
    }

    #[test]
    fn test_swap_reserve_overflow() {
        assert_eq!(
            quote_swap(u64::MAX - 5, 100, 0, 10),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_fee_amount_floors() {
        assert_eq!(fee_amount(10, 1_000).unwrap(), 1);
        assert_eq!(fee_amount(9, 1_000).unwrap(), 0);
        let max_fee = ((u64::MAX as u128) * 9_999 / 10_000) as u64;
        assert_eq!(fee_amount(u64::MAX, 9_999).unwrap(), max_fee);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(10_000), 100);
        assert_eq!(isqrt(9_919), 99);
        assert_eq!(isqrt(u128::MAX), u64::MAX);
        assert_eq!(isqrt((u64::MAX as u128) * (u64::MAX as u128)), u64::MAX);
    }

    #[test]
    fn test_ratio_scaled() {
        let r = ratio(91, 109).unwrap();
        assert_eq!(r.scaled(RATIO_SCALE).unwrap(), 83);
        let r = ratio(109, 91).unwrap();
        assert_eq!(r.scaled(RATIO_SCALE).unwrap(), 119);
        assert_eq!(ratio(1, 0), Err(MathError::InvalidReserves));
    }
}
