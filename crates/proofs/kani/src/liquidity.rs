//! Kani proofs for deposits and redemptions
//!
//! - **L1: Ratio Forcing** - the accepted pair never exceeds what was offered
//! - **L2: No Over-Mint** - claims minted never exceed either side's share
//! - **L3: No Over-Redeem** - a burn never pays more than the exact share
//! - **L4: Full Burn** - burning the whole supply returns both reserves exactly

use cpmm_model::{quote_add_liquidity, quote_burn};

/// L1: accepted amounts are bounded by the desired amounts
#[kani::proof]
#[kani::unwind(4)]
fn l1_ratio_forcing_bounded() {
    let x: u64 = kani::any();
    let y: u64 = kani::any();
    let s: u64 = kani::any();
    let da: u64 = kani::any();
    let db: u64 = kani::any();

    kani::assume(x > 0 && y > 0 && s > 0);

    if let Ok(q) = quote_add_liquidity(x, y, s, da, db) {
        assert!(q.amount_a <= da, "L1: pulled more A than offered");
        assert!(q.amount_b <= db, "L1: pulled more B than offered");
        assert!(q.amount_a > 0 && q.amount_b > 0 && q.liquidity > 0);
    }
}

/// L2: L·x <= a·S and L·y <= b·S
#[kani::proof]
#[kani::unwind(4)]
fn l2_no_over_mint() {
    let x: u64 = kani::any();
    let y: u64 = kani::any();
    let s: u64 = kani::any();
    let da: u64 = kani::any();
    let db: u64 = kani::any();

    kani::assume(x > 0 && x < 1 << 32);
    kani::assume(y > 0 && y < 1 << 32);
    kani::assume(s > 0 && s < 1 << 32);

    if let Ok(q) = quote_add_liquidity(x, y, s, da, db) {
        let l = q.liquidity as u128;
        assert!(l * x as u128 <= q.amount_a as u128 * s as u128);
        assert!(l * y as u128 <= q.amount_b as u128 * s as u128);
    }
}

/// L3: a·S <= L·x and b·S <= L·y for every burn
#[kani::proof]
#[kani::unwind(4)]
fn l3_no_over_redeem() {
    let x: u64 = kani::any();
    let y: u64 = kani::any();
    let s: u64 = kani::any();
    let l: u64 = kani::any();

    if let Ok(q) = quote_burn(x, y, s, l) {
        assert!(q.amount_a as u128 * s as u128 <= l as u128 * x as u128);
        assert!(q.amount_b as u128 * s as u128 <= l as u128 * y as u128);
        if l < s {
            assert!(q.amount_a < x && q.amount_b < y, "L3: partial burn emptied a reserve");
        }
    }
}

/// L4: burning everything returns everything
#[kani::proof]
#[kani::unwind(4)]
fn l4_full_burn_drains_exactly() {
    let x: u64 = kani::any();
    let y: u64 = kani::any();
    let s: u64 = kani::any();

    kani::assume(x > 0 && y > 0 && s > 0);

    if let Ok(q) = quote_burn(x, y, s, s) {
        assert!(q.amount_a == x && q.amount_b == y);
    }
}
