//! Shared harness: a pool plus two in-memory assets and a cast of accounts

#![allow(dead_code)]

use cpmm_pool::*;

pub const T0: AssetId = AccountId::new([10; 32]);
pub const T1: AssetId = AccountId::new([11; 32]);
pub const STRANGER_ASSET: AssetId = AccountId::new([12; 32]);

pub const OWNER: AccountId = AccountId::new([1; 32]);
pub const LP: AccountId = AccountId::new([2; 32]);
pub const TRADER: AccountId = AccountId::new([3; 32]);
pub const TRADER2: AccountId = AccountId::new([4; 32]);
pub const POOL: AccountId = AccountId::new([99; 32]);

pub const ACTORS: [AccountId; 4] = [OWNER, LP, TRADER, TRADER2];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Harness {
    pub pool: Pool,
    pub t0: MemoryAsset,
    pub t1: MemoryAsset,
}

/// Everything an operation could touch, for "no mutation on error" checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub pool: PoolSnapshot,
    pub t0: Vec<u64>,
    pub t1: Vec<u64>,
    pub claims: Vec<u64>,
    pub pool_t0: u64,
    pub pool_t1: u64,
}

impl Harness {
    /// Pool with `fee_bps`; the owner starts with 100_000 of each asset
    pub fn new(fee_bps: u64) -> Self {
        Self::with_supply(fee_bps, 100_000)
    }

    pub fn with_supply(fee_bps: u64, owner_supply: u64) -> Self {
        init_logging();
        let pool = Pool::new(PoolConfig::new(T0, T1, fee_bps, OWNER, POOL)).unwrap();
        let mut t0 = MemoryAsset::new(T0, "t0");
        let mut t1 = MemoryAsset::new(T1, "t1");
        t0.mint_to(OWNER, owner_supply).unwrap();
        t1.mint_to(OWNER, owner_supply).unwrap();
        Self { pool, t0, t1 }
    }

    /// Move assets from the owner to `who`
    pub fn fund(&mut self, who: AccountId, amount_0: u64, amount_1: u64) {
        self.t0.transfer(OWNER, who, amount_0).unwrap();
        self.t1.transfer(OWNER, who, amount_1).unwrap();
    }

    /// Let the pool pull from `who`
    pub fn approve(&mut self, who: AccountId, amount_0: u64, amount_1: u64) {
        self.t0.approve(who, POOL, amount_0).unwrap();
        self.t1.approve(who, POOL, amount_1).unwrap();
    }

    pub fn bootstrap(&mut self, who: AccountId, amount_0: u64, amount_1: u64) -> Result<u64> {
        self.pool.bootstrap(
            who,
            &T0,
            &T1,
            amount_0,
            amount_1,
            &mut AssetPair::new(&mut self.t0, &mut self.t1),
        )
    }

    pub fn swap(&mut self, who: AccountId, asset_in: AssetId, amount_in: u64) -> Result<u64> {
        self.pool.swap(
            who,
            &asset_in,
            amount_in,
            &mut AssetPair::new(&mut self.t0, &mut self.t1),
        )
    }

    pub fn add(
        &mut self,
        who: AccountId,
        desired_0: u64,
        desired_1: u64,
    ) -> Result<LiquidityQuote> {
        self.pool.add_liquidity(
            who,
            desired_0,
            desired_1,
            &mut AssetPair::new(&mut self.t0, &mut self.t1),
        )
    }

    pub fn burn(&mut self, who: AccountId, liquidity: u64) -> Result<BurnQuote> {
        self.pool
            .burn_liquidity(who, liquidity, &mut AssetPair::new(&mut self.t0, &mut self.t1))
    }

    pub fn collect_fees(&mut self, who: AccountId) -> Result<(u64, u64)> {
        self.pool
            .collect_fees(who, &mut AssetPair::new(&mut self.t0, &mut self.t1))
    }

    pub fn world(&self) -> WorldSnapshot {
        WorldSnapshot {
            pool: self.pool.snapshot(),
            t0: ACTORS.iter().map(|a| self.t0.balance_of(a)).collect(),
            t1: ACTORS.iter().map(|a| self.t1.balance_of(a)).collect(),
            claims: ACTORS.iter().map(|a| self.pool.balance_of(a)).collect(),
            pool_t0: self.t0.balance_of(&POOL),
            pool_t1: self.t1.balance_of(&POOL),
        }
    }

    /// Invariants that must hold after every operation, failed or not
    pub fn assert_invariants(&self) {
        let snap = self.pool.snapshot();

        // Custody mirrors the books exactly
        assert_eq!(
            self.t0.balance_of(&POOL) as u128,
            snap.reserve_a as u128 + snap.fees_a as u128,
            "asset A custody diverged from reserve + fees"
        );
        assert_eq!(
            self.t1.balance_of(&POOL) as u128,
            snap.reserve_b as u128 + snap.fees_b as u128,
            "asset B custody diverged from reserve + fees"
        );

        // Claim conservation
        let sum: u128 = self.pool.claims().holders().map(|(_, b)| b as u128).sum();
        assert_eq!(sum, snap.total_supply as u128, "claim balances do not sum to supply");

        // Live iff bootstrapped
        if snap.bootstrapped {
            assert!(snap.reserve_a > 0 && snap.reserve_b > 0);
            assert!(snap.total_supply > 0);
        } else {
            assert_eq!(snap.total_supply, 0);
            assert_eq!((snap.reserve_a, snap.reserve_b), (0, 0));
        }
    }
}
