//! Proportional claim accounting: initial mint, ratio-forced deposits, burns
//!
//! All divisions floor. A depositor never receives more claims than the
//! value they add, and a redeemer never receives more than their share.

use crate::math::{invariant, isqrt};
use crate::{to_amount, MathError};

/// Accepted deposit and the claims it mints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityQuote {
    /// Amount of asset A actually pulled
    pub amount_a: u64,
    /// Amount of asset B actually pulled
    pub amount_b: u64,
    /// Claims minted for the pair
    pub liquidity: u64,
}

/// Assets released by burning claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnQuote {
    pub amount_a: u64,
    pub amount_b: u64,
}

/// Claims minted by the first deposit: floor(sqrt(amount_a · amount_b))
///
/// Fixes the claim exchange rate at 1 claim ≈ sqrt(k) combined value; every
/// later mint and burn is proportional to this supply.
pub fn initial_liquidity(amount_a: u64, amount_b: u64) -> Result<u64, MathError> {
    if amount_a == 0 || amount_b == 0 {
        return Err(MathError::ZeroAmount);
    }
    let liquidity = isqrt(invariant(amount_a, amount_b));
    if liquidity == 0 {
        return Err(MathError::DustOutput);
    }
    Ok(liquidity)
}

/// Force a deposit onto the current reserve ratio and price its claims
///
/// Ratio forcing:
/// - b_opt = floor(Δa · y / x); if b_opt <= Δb take (Δa, b_opt)
/// - else a_opt = floor(Δb · x / y), require a_opt <= Δa, take (a_opt, Δb)
///
/// Minted claims:
/// - L = min(floor(a · S / x), floor(b · S / y))
///
/// The two terms differ only by rounding; taking the minimum never over-mints.
///
/// # Arguments
/// * `reserve_a`, `reserve_b` - Current reserves
/// * `total_supply` - Current claim supply
/// * `desired_a`, `desired_b` - Maximum amounts the depositor offers
///
/// # Returns
/// * `LiquidityQuote` with the accepted pair (each side <= its desired amount)
/// * `MathError::DustOutput` if either side or the minted claims round to zero
/// * `MathError::Overflow` if reserves or supply would leave the u64 domain
pub fn quote_add_liquidity(
    reserve_a: u64,
    reserve_b: u64,
    total_supply: u64,
    desired_a: u64,
    desired_b: u64,
) -> Result<LiquidityQuote, MathError> {
    if reserve_a == 0 || reserve_b == 0 || total_supply == 0 {
        return Err(MathError::InvalidReserves);
    }
    if desired_a == 0 || desired_b == 0 {
        return Err(MathError::ZeroAmount);
    }

    let x = reserve_a as u128;
    let y = reserve_b as u128;

    let b_optimal = (desired_a as u128) * y / x;
    let (amount_a, amount_b) = if b_optimal <= desired_b as u128 {
        (desired_a, to_amount(b_optimal)?)
    } else {
        let a_optimal = (desired_b as u128) * x / y;
        if a_optimal > desired_a as u128 {
            return Err(MathError::RatioViolation);
        }
        (to_amount(a_optimal)?, desired_b)
    };
    if amount_a == 0 || amount_b == 0 {
        return Err(MathError::DustOutput);
    }

    let s = total_supply as u128;
    let from_a = (amount_a as u128) * s / x;
    let from_b = (amount_b as u128) * s / y;
    let liquidity = to_amount(from_a.min(from_b))?;
    if liquidity == 0 {
        return Err(MathError::DustOutput);
    }

    // The commit must not be able to overflow
    reserve_a.checked_add(amount_a).ok_or(MathError::Overflow)?;
    reserve_b.checked_add(amount_b).ok_or(MathError::Overflow)?;
    total_supply.checked_add(liquidity).ok_or(MathError::Overflow)?;

    Ok(LiquidityQuote {
        amount_a,
        amount_b,
        liquidity,
    })
}

/// Redeem `liquidity` claims for a proportional share of both reserves
///
/// - a = floor(L · x / S)
/// - b = floor(L · y / S)
///
/// Burning the whole supply returns both reserves exactly. Any smaller burn
/// leaves both sides strictly positive, since L · x / S < x when L < S.
pub fn quote_burn(
    reserve_a: u64,
    reserve_b: u64,
    total_supply: u64,
    liquidity: u64,
) -> Result<BurnQuote, MathError> {
    if liquidity == 0 {
        return Err(MathError::ZeroAmount);
    }
    if total_supply == 0 || reserve_a == 0 || reserve_b == 0 {
        return Err(MathError::InvalidReserves);
    }
    if liquidity > total_supply {
        return Err(MathError::InsufficientLiquidity);
    }

    let l = liquidity as u128;
    let s = total_supply as u128;
    let amount_a = to_amount(l * reserve_a as u128 / s)?;
    let amount_b = to_amount(l * reserve_b as u128 / s)?;
    if amount_a == 0 || amount_b == 0 {
        return Err(MathError::DustOutput);
    }

    // One side emptied while the other is not would strand the pool
    if (amount_a == reserve_a) != (amount_b == reserve_b) {
        return Err(MathError::InsufficientLiquidity);
    }

    Ok(BurnQuote { amount_a, amount_b })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_liquidity() {
        assert_eq!(initial_liquidity(100, 100).unwrap(), 100);
        assert_eq!(initial_liquidity(1, 4).unwrap(), 2);
        assert_eq!(initial_liquidity(2, 1).unwrap(), 1);
        assert_eq!(initial_liquidity(0, 100), Err(MathError::ZeroAmount));
        assert_eq!(
            initial_liquidity(u64::MAX, u64::MAX).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn test_add_balanced() {
        let q = quote_add_liquidity(100, 100, 100, 20, 20).unwrap();
        assert_eq!(q, LiquidityQuote { amount_a: 20, amount_b: 20, liquidity: 20 });
    }

    #[test]
    fn test_add_forces_ratio_on_a() {
        // b_opt = floor(10 * 91 / 109) = 8 > 6, so B binds
        // a_opt = floor(6 * 109 / 91) = 7
        // L = min(floor(7 * 100 / 109), floor(6 * 100 / 91)) = min(6, 6)
        let q = quote_add_liquidity(109, 91, 100, 10, 6).unwrap();
        assert_eq!(q, LiquidityQuote { amount_a: 7, amount_b: 6, liquidity: 6 });
    }

    #[test]
    fn test_add_a_binds_and_b_is_trimmed() {
        // b_opt = floor(10 * 200 / 100) = 20 <= 50, so A binds
        let q = quote_add_liquidity(100, 200, 141, 10, 50).unwrap();
        assert_eq!(q.amount_a, 10);
        assert_eq!(q.amount_b, 20);
        assert_eq!(q.liquidity, 14);
    }

    #[test]
    fn test_add_dust() {
        // a_opt = floor(1 * 1 / 1000) = 0
        assert_eq!(
            quote_add_liquidity(1, 1_000, 31, 5, 1),
            Err(MathError::DustOutput)
        );
        // Accepted pair is non-zero but too small to earn one claim
        assert_eq!(
            quote_add_liquidity(1_000, 1_000, 10, 50, 50),
            Err(MathError::DustOutput)
        );
    }

    #[test]
    fn test_add_rejects_bad_inputs() {
        assert_eq!(quote_add_liquidity(0, 1, 1, 1, 1), Err(MathError::InvalidReserves));
        assert_eq!(quote_add_liquidity(1, 1, 0, 1, 1), Err(MathError::InvalidReserves));
        assert_eq!(quote_add_liquidity(1, 1, 1, 0, 1), Err(MathError::ZeroAmount));
        assert_eq!(quote_add_liquidity(1, 1, 1, 1, 0), Err(MathError::ZeroAmount));
    }

    #[test]
    fn test_add_overflow() {
        assert_eq!(
            quote_add_liquidity(u64::MAX - 1, u64::MAX - 1, 10, 5, 5),
            Err(MathError::DustOutput)
        );
        assert_eq!(
            quote_add_liquidity(u64::MAX - 1, u64::MAX - 1, u64::MAX - 1, 5, 5),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_burn_proportional() {
        let q = quote_burn(109, 91, 100, 6).unwrap();
        // floor(6 * 109 / 100), floor(6 * 91 / 100)
        assert_eq!(q, BurnQuote { amount_a: 6, amount_b: 5 });
    }

    #[test]
    fn test_burn_full_supply_returns_everything() {
        let q = quote_burn(109, 91, 100, 100).unwrap();
        assert_eq!(q, BurnQuote { amount_a: 109, amount_b: 91 });
    }

    #[test]
    fn test_burn_rejects() {
        assert_eq!(quote_burn(100, 100, 100, 0), Err(MathError::ZeroAmount));
        assert_eq!(quote_burn(100, 100, 100, 101), Err(MathError::InsufficientLiquidity));
        assert_eq!(quote_burn(100, 100, 0, 1), Err(MathError::InvalidReserves));
        // floor(1 * 5 / 1000) == 0
        assert_eq!(quote_burn(1_000, 5, 1_000, 1), Err(MathError::DustOutput));
    }

    #[test]
    fn test_mint_then_burn_never_pays_more() {
        let q = quote_add_liquidity(109, 91, 100, 10, 6).unwrap();
        let b =
            quote_burn(109 + q.amount_a, 91 + q.amount_b, 100 + q.liquidity, q.liquidity).unwrap();
        assert!(b.amount_a <= q.amount_a);
        assert!(b.amount_b <= q.amount_b);
    }
}
