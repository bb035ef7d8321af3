//! Kani harnesses for the constant product math
//!
//! Run with: cargo kani -p proofs-kani
//! Single harness: cargo kani -p proofs-kani --harness <name>

#![no_std]

#[cfg(kani)]
mod amm;
#[cfg(kani)]
mod liquidity;
