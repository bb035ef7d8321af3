//! Constant-product automated market maker engine
//!
//! A two-asset pool that mints liquidity claims for matched deposits, prices
//! swaps from its reserves (x·y=k, fee taken from the input), and redeems
//! claims for a proportional share of both reserves.
//!
//! The pool never moves assets itself: every deposit, trade and redemption
//! goes through a [`FungibleAsset`] collaborator passed in by the caller.
//! All pricing math lives in the `cpmm_model` crate.

#![forbid(unsafe_code)]

pub mod asset;
pub mod config;
pub mod error;
pub mod ledger;
pub mod pool;

pub use asset::{AccountId, AssetError, AssetId, AssetPair, FungibleAsset, MemoryAsset};
pub use config::{PoolConfig, DEFAULT_FEE_BPS};
pub use cpmm_model::{BurnQuote, LiquidityQuote, Ratio, SwapQuote, BPS_SCALE, RATIO_SCALE};
pub use error::{PoolError, Result};
pub use ledger::{ClaimLedger, LedgerError, UNLIMITED_ALLOWANCE};
pub use pool::{Pool, PoolSnapshot};
