//! Kani proofs for swap pricing
//!
//! - **A1: Product Loss Bounded** - rounding costs x1·y1 less than x1 against x0·y0
//! - **A2: Reserves Positive** - no swap empties either reserve
//! - **A3: No Panic** - extreme inputs return an error instead of overflowing
//! - **A4: Fee Bounded** - the fee never consumes the whole input
//! - **A5: Fee Monotone** - a higher fee never pays the trader more
//! - **A6: Output Tracks Curve** - output exceeds the exact curve by less than one unit

use cpmm_model::{fee_amount, invariant, quote_swap, BPS_SCALE};

/// A1: flooring y1 = k / x1 loses less than one row of x1 from the product
#[kani::proof]
#[kani::unwind(4)]
fn a1_product_loss_bounded() {
    let x0: u64 = kani::any();
    let y0: u64 = kani::any();
    let dx: u64 = kani::any();
    let fee_bps: u64 = kani::any();

    kani::assume(x0 > 0 && x0 < 1 << 40);
    kani::assume(y0 > 0 && y0 < 1 << 40);
    kani::assume(dx > 0 && dx < 1 << 40);
    kani::assume(fee_bps < BPS_SCALE);

    if let Ok(q) = quote_swap(x0, y0, fee_bps, dx) {
        let k1 = invariant(q.new_reserve_in, q.new_reserve_out);
        assert!(
            k1 + q.new_reserve_in as u128 > invariant(x0, y0),
            "A1: swap lost more than rounding allows"
        );
    }
}

/// A2: both reserves stay strictly positive and the output is non-zero
#[kani::proof]
#[kani::unwind(4)]
fn a2_reserves_stay_positive() {
    let x0: u64 = kani::any();
    let y0: u64 = kani::any();
    let dx: u64 = kani::any();
    let fee_bps: u64 = kani::any();

    kani::assume(fee_bps < BPS_SCALE);

    if let Ok(q) = quote_swap(x0, y0, fee_bps, dx) {
        assert!(q.new_reserve_in > 0, "A2: input reserve must stay positive");
        assert!(q.new_reserve_out > 0, "A2: output reserve must stay positive");
        assert!(q.amount_out > 0, "A2: accepted swap pays something");
        assert!(q.new_reserve_out + q.amount_out == y0);
    }
}

/// A3: near the top of the u64 domain the quote errors rather than panics
#[kani::proof]
#[kani::unwind(4)]
fn a3_no_panic_on_large_reserves() {
    let x0: u64 = kani::any();
    let y0: u64 = kani::any();
    let dx: u64 = kani::any();
    let fee_bps: u64 = kani::any();

    kani::assume(x0 > u64::MAX / 2);
    kani::assume(y0 > u64::MAX / 2);

    let _ = quote_swap(x0, y0, fee_bps, dx);
}

/// A4: a non-zero input always leaves a non-zero net amount
#[kani::proof]
#[kani::unwind(4)]
fn a4_fee_bounded() {
    let amount: u64 = kani::any();
    let fee_bps: u64 = kani::any();
    kani::assume(fee_bps < BPS_SCALE);

    if let Ok(fee) = fee_amount(amount, fee_bps) {
        assert!(fee <= amount);
        if amount > 0 {
            assert!(fee < amount, "A4: the fee never eats the whole input");
        }
    }
}

/// A5: raising the fee never increases the output
#[kani::proof]
#[kani::unwind(4)]
fn a5_fee_monotone() {
    let x0: u64 = kani::any();
    let y0: u64 = kani::any();
    let dx: u64 = kani::any();
    let low: u64 = kani::any();
    let high: u64 = kani::any();

    kani::assume(x0 > 0 && x0 < 1 << 32);
    kani::assume(y0 > 0 && y0 < 1 << 32);
    kani::assume(dx > 0 && dx < 1 << 32);
    kani::assume(low <= high && high < BPS_SCALE);

    if let (Ok(cheap), Ok(dear)) = (
        quote_swap(x0, y0, low, dx),
        quote_swap(x0, y0, high, dx),
    ) {
        assert!(dear.amount_out <= cheap.amount_out, "A5: higher fee paid more");
    }
}

/// A6: Δin_net · y0 <= Δout · x1 < Δin_net · y0 + x1
#[kani::proof]
#[kani::unwind(4)]
fn a6_output_tracks_curve() {
    let x0: u64 = kani::any();
    let y0: u64 = kani::any();
    let dx: u64 = kani::any();
    let fee_bps: u64 = kani::any();

    kani::assume(x0 > 0 && x0 < 1 << 32);
    kani::assume(y0 > 0 && y0 < 1 << 32);
    kani::assume(dx > 0 && dx < 1 << 32);
    kani::assume(fee_bps < BPS_SCALE);

    if let Ok(q) = quote_swap(x0, y0, fee_bps, dx) {
        let paid = q.amount_out as u128 * q.new_reserve_in as u128;
        let curve = q.amount_in_after_fee as u128 * y0 as u128;
        assert!(curve <= paid, "A6: output below the curve");
        assert!(paid < curve + q.new_reserve_in as u128, "A6: output a full unit above the curve");
    }
}
