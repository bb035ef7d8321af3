//! Constant product pool engine
//!
//! Every mutating operation runs in the same order:
//! 1. validate and compute every amount from a read-only quote
//! 2. dry-run each transfer with the collaborators
//! 3. pull inputs
//! 4. commit reserves, invariant, fee buckets and claims in one step
//! 5. push outputs
//!
//! If anything fails the pool is left exactly as it was and any input
//! already pulled is refunded.

use cpmm_model::{self as model, BurnQuote, LiquidityQuote, Ratio, SwapQuote, RATIO_SCALE};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::asset::{AccountId, AssetId, AssetPair, FungibleAsset};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::ledger::{ClaimCheckpoint, ClaimLedger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Point-in-time view of the pool's bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub invariant_k: u128,
    pub total_supply: u64,
    pub fees_a: u64,
    pub fees_b: u64,
    pub bootstrapped: bool,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    reserve_a: u64,
    reserve_b: u64,
    invariant_k: u128,
    fees_a: u64,
    fees_b: u64,
    bootstrapped: bool,
    claims: Option<ClaimCheckpoint>,
}

/// Two-asset constant product pool with its liquidity claim ledger
///
/// Custody: for each asset, the collaborator's balance of `pool_account`
/// covers `reserve + accrued fees` at all times.
#[derive(Debug, Clone)]
pub struct Pool {
    config: PoolConfig,
    reserve_a: u64,
    reserve_b: u64,
    /// Product of the reserves at the last liquidity event; swaps leave it alone
    invariant_k: u128,
    fees_a: u64,
    fees_b: u64,
    bootstrapped: bool,
    claims: ClaimLedger,
}

impl Pool {
    /// Create an empty, not yet bootstrapped pool
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            reserve_a: 0,
            reserve_b: 0,
            invariant_k: 0,
            fees_a: 0,
            fees_b: 0,
            bootstrapped: false,
            claims: ClaimLedger::new(),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn asset_a(&self) -> AssetId {
        self.config.asset_a
    }

    pub fn asset_b(&self) -> AssetId {
        self.config.asset_b
    }

    pub fn fee_bps(&self) -> u64 {
        self.config.fee_bps
    }

    pub fn pool_account(&self) -> AccountId {
        self.config.pool_account
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    // ========================================================================
    // Derived reads
    // ========================================================================

    /// Booked reserve of `asset`
    pub fn reserves(&self, asset: &AssetId) -> Result<u64> {
        Ok(self.reserve(self.side_of(asset)?))
    }

    /// Both reserves in the pool's own (A, B) order
    pub fn reserve_pair(&self) -> (u64, u64) {
        (self.reserve_a, self.reserve_b)
    }

    /// Cached invariant from the last bootstrap, add or burn
    pub fn ratio_k(&self) -> u128 {
        self.invariant_k
    }

    /// Swap fees booked for the owner, not part of the reserves
    pub fn accrued_fees(&self, asset: &AssetId) -> Result<u64> {
        Ok(self.fees(self.side_of(asset)?))
    }

    /// Units of B per unit of A at the current reserves
    pub fn price_a_in_b(&self) -> Result<Ratio> {
        self.ensure_bootstrapped()?;
        Ok(model::ratio(self.reserve_b, self.reserve_a)?)
    }

    /// Units of A per unit of B at the current reserves
    pub fn price_b_in_a(&self) -> Result<Ratio> {
        self.ensure_bootstrapped()?;
        Ok(model::ratio(self.reserve_a, self.reserve_b)?)
    }

    /// floor(reserve_b * 100 / reserve_a)
    pub fn x_to_y_ratio(&self) -> Result<u128> {
        Ok(self.price_a_in_b()?.scaled(RATIO_SCALE)?)
    }

    /// floor(reserve_a * 100 / reserve_b)
    pub fn y_to_x_ratio(&self) -> Result<u128> {
        Ok(self.price_b_in_a()?.scaled(RATIO_SCALE)?)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            invariant_k: self.invariant_k,
            total_supply: self.claims.total_supply(),
            fees_a: self.fees_a,
            fees_b: self.fees_b,
            bootstrapped: self.bootstrapped,
        }
    }

    // ========================================================================
    // Claim token surface
    // ========================================================================

    pub fn claims(&self) -> &ClaimLedger {
        &self.claims
    }

    pub fn total_supply(&self) -> u64 {
        self.claims.total_supply()
    }

    pub fn balance_of(&self, holder: &AccountId) -> u64 {
        self.claims.balance_of(holder)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.claims.allowance(owner, spender)
    }

    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u64) {
        self.claims.approve(owner, spender, amount);
    }

    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> Result<()> {
        Ok(self.claims.transfer(from, to, amount)?)
    }

    pub fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<()> {
        Ok(self.claims.transfer_from(spender, owner, to, amount)?)
    }

    // ========================================================================
    // Previews
    // ========================================================================

    /// Quote a swap without touching state: fee split, output, new reserves
    pub fn preview_swap(&self, asset_in: &AssetId, amount_in: u64) -> Result<SwapQuote> {
        self.ensure_bootstrapped()?;
        let side_in = self.side_of(asset_in)?;
        if amount_in == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let quote = model::quote_swap(
            self.reserve(side_in),
            self.reserve(side_in.other()),
            self.config.fee_bps,
            amount_in,
        )?;
        self.fees(side_in)
            .checked_add(quote.fee)
            .ok_or(PoolError::Overflow)?;
        Ok(quote)
    }

    /// Quote a deposit: the ratio-forced pair actually pulled and the claims minted
    pub fn preview_add_liquidity(&self, desired_a: u64, desired_b: u64) -> Result<LiquidityQuote> {
        self.ensure_bootstrapped()?;
        if desired_a == 0 || desired_b == 0 {
            return Err(PoolError::ZeroAmount);
        }
        Ok(model::quote_add_liquidity(
            self.reserve_a,
            self.reserve_b,
            self.claims.total_supply(),
            desired_a,
            desired_b,
        )?)
    }

    /// Quote a redemption of `liquidity` claims
    pub fn preview_burn_liquidity(&self, liquidity: u64) -> Result<BurnQuote> {
        self.ensure_bootstrapped()?;
        if liquidity == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if liquidity > self.claims.total_supply() {
            return Err(PoolError::InsufficientBalance);
        }
        Ok(model::quote_burn(
            self.reserve_a,
            self.reserve_b,
            self.claims.total_supply(),
            liquidity,
        )?)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Seed the pool with its first deposit and mint the initial claims
    ///
    /// `asset_x`/`asset_y` may name the pool's assets in either order. Mints
    /// floor(sqrt(amount_a * amount_b)) claims to `caller` and returns that amount.
    pub fn bootstrap(
        &mut self,
        caller: AccountId,
        asset_x: &AssetId,
        asset_y: &AssetId,
        amount_x: u64,
        amount_y: u64,
        assets: &mut AssetPair<'_>,
    ) -> Result<u64> {
        if self.bootstrapped {
            return Err(PoolError::AlreadyBootstrapped);
        }
        self.ensure_outside(&caller)?;
        let (amount_a, amount_b) = match (self.side_of(asset_x)?, self.side_of(asset_y)?) {
            (Side::A, Side::B) => (amount_x, amount_y),
            (Side::B, Side::A) => (amount_y, amount_x),
            _ => return Err(PoolError::InvalidAsset),
        };
        if amount_a == 0 || amount_b == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let liquidity = model::initial_liquidity(amount_a, amount_b)?;

        self.check_pull(assets, Side::A, &caller, amount_a)?;
        self.check_pull(assets, Side::B, &caller, amount_b)?;
        self.pull_pair(assets, caller, amount_a, amount_b)?;

        if let Err(err) = self.claims.mint(caller, liquidity) {
            self.refund(assets, Side::A, caller, amount_a);
            self.refund(assets, Side::B, caller, amount_b);
            return Err(err.into());
        }
        self.reserve_a = amount_a;
        self.reserve_b = amount_b;
        self.invariant_k = model::invariant(amount_a, amount_b);
        self.bootstrapped = true;

        info!(
            "pool bootstrapped by {}: reserves ({}, {}), k = {}, {} claims minted",
            caller, amount_a, amount_b, self.invariant_k, liquidity
        );
        Ok(liquidity)
    }

    /// Sell `amount_in` of `asset_in` for the other asset; returns the amount received
    pub fn swap(
        &mut self,
        caller: AccountId,
        asset_in: &AssetId,
        amount_in: u64,
        assets: &mut AssetPair<'_>,
    ) -> Result<u64> {
        self.ensure_outside(&caller)?;
        let quote = self.preview_swap(asset_in, amount_in)?;
        let side_in = self.side_of(asset_in)?;
        let side_out = side_in.other();
        let fees_after = self.fees(side_in) + quote.fee;

        self.check_pull(assets, side_in, &caller, amount_in)?;
        self.check_push(assets, side_out, &caller, quote.amount_out)?;
        self.pull(assets, side_in, caller, amount_in)?;

        let checkpoint = self.checkpoint(None);
        self.set_reserve(side_in, quote.new_reserve_in);
        self.set_reserve(side_out, quote.new_reserve_out);
        self.set_fees(side_in, fees_after);

        if let Err(err) = self.push(assets, side_out, caller, quote.amount_out) {
            warn!("swap payout to {} failed ({}), restoring pool state", caller, err);
            self.restore(checkpoint);
            self.refund(assets, side_in, caller, amount_in);
            return Err(err);
        }

        debug!(
            "swap by {}: {} in (fee {}), {} out, reserves ({}, {})",
            caller, amount_in, quote.fee, quote.amount_out, self.reserve_a, self.reserve_b
        );
        Ok(quote.amount_out)
    }

    /// Deposit at the current ratio; returns the accepted pair and claims minted
    ///
    /// Only the ratio-forced amounts are pulled; the excess of the
    /// non-binding side is never requested from the caller.
    pub fn add_liquidity(
        &mut self,
        caller: AccountId,
        desired_a: u64,
        desired_b: u64,
        assets: &mut AssetPair<'_>,
    ) -> Result<LiquidityQuote> {
        self.ensure_outside(&caller)?;
        let quote = self.preview_add_liquidity(desired_a, desired_b)?;

        self.check_pull(assets, Side::A, &caller, quote.amount_a)?;
        self.check_pull(assets, Side::B, &caller, quote.amount_b)?;
        self.pull_pair(assets, caller, quote.amount_a, quote.amount_b)?;

        if let Err(err) = self.claims.mint(caller, quote.liquidity) {
            self.refund(assets, Side::A, caller, quote.amount_a);
            self.refund(assets, Side::B, caller, quote.amount_b);
            return Err(err.into());
        }
        // Overflow of both sums was ruled out by the quote
        self.reserve_a += quote.amount_a;
        self.reserve_b += quote.amount_b;
        self.invariant_k = model::invariant(self.reserve_a, self.reserve_b);

        debug!(
            "add liquidity by {}: ({}, {}) accepted of ({}, {}) offered, {} claims minted",
            caller, quote.amount_a, quote.amount_b, desired_a, desired_b, quote.liquidity
        );
        Ok(quote)
    }

    /// Burn the caller's own claims and pay out both assets to the caller
    pub fn burn_liquidity(
        &mut self,
        caller: AccountId,
        liquidity: u64,
        assets: &mut AssetPair<'_>,
    ) -> Result<BurnQuote> {
        self.redeem(caller, None, caller, liquidity, assets)
    }

    /// Burn `owner`'s claims on behalf of `spender`, consuming claim allowance,
    /// and pay out both assets to `to`
    pub fn burn_liquidity_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        liquidity: u64,
        to: AccountId,
        assets: &mut AssetPair<'_>,
    ) -> Result<BurnQuote> {
        self.redeem(owner, Some(spender), to, liquidity, assets)
    }

    /// Pay all accrued swap fees to the owner; returns (fees_a, fees_b)
    pub fn collect_fees(
        &mut self,
        caller: AccountId,
        assets: &mut AssetPair<'_>,
    ) -> Result<(u64, u64)> {
        if caller != self.config.owner {
            return Err(PoolError::Unauthorized);
        }
        let (fees_a, fees_b) = (self.fees_a, self.fees_b);

        self.check_push(assets, Side::A, &caller, fees_a)?;
        self.check_push(assets, Side::B, &caller, fees_b)?;

        let checkpoint = self.checkpoint(None);
        self.fees_a = 0;
        self.fees_b = 0;
        self.pay_out(assets, caller, fees_a, fees_b, checkpoint)?;

        info!("fees collected by {}: ({}, {})", caller, fees_a, fees_b);
        Ok((fees_a, fees_b))
    }

    fn redeem(
        &mut self,
        owner: AccountId,
        spender: Option<AccountId>,
        to: AccountId,
        liquidity: u64,
        assets: &mut AssetPair<'_>,
    ) -> Result<BurnQuote> {
        self.ensure_outside(&to)?;
        let quote = self.preview_burn_liquidity(liquidity)?;

        self.check_push(assets, Side::A, &to, quote.amount_a)?;
        self.check_push(assets, Side::B, &to, quote.amount_b)?;

        let checkpoint = self.checkpoint(Some(self.claims.checkpoint(owner, spender)));
        match spender {
            Some(spender) => self.claims.burn_from(spender, owner, liquidity)?,
            None => self.claims.burn(owner, liquidity)?,
        }
        self.reserve_a -= quote.amount_a;
        self.reserve_b -= quote.amount_b;

        if self.claims.total_supply() == 0 {
            // Whole supply burned: both reserves are empty, back to the initial state
            self.invariant_k = 0;
            self.bootstrapped = false;
            info!("pool drained by {}: all claims burned", owner);
        } else {
            self.invariant_k = model::invariant(self.reserve_a, self.reserve_b);
        }

        self.pay_out(assets, to, quote.amount_a, quote.amount_b, checkpoint)?;

        debug!(
            "burn by {}: {} claims for ({}, {}) paid to {}",
            owner, liquidity, quote.amount_a, quote.amount_b, to
        );
        Ok(quote)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_bootstrapped(&self) -> Result<()> {
        if !self.bootstrapped {
            return Err(PoolError::NotBootstrapped);
        }
        Ok(())
    }

    /// The pool account can neither fund the pool nor be paid by it; a pull
    /// from it would book reserves with no new custody behind them
    fn ensure_outside(&self, account: &AccountId) -> Result<()> {
        if *account == self.config.pool_account {
            return Err(PoolError::Unauthorized);
        }
        Ok(())
    }

    fn side_of(&self, asset: &AssetId) -> Result<Side> {
        if *asset == self.config.asset_a {
            Ok(Side::A)
        } else if *asset == self.config.asset_b {
            Ok(Side::B)
        } else {
            Err(PoolError::InvalidAsset)
        }
    }

    fn asset_of(&self, side: Side) -> AssetId {
        match side {
            Side::A => self.config.asset_a,
            Side::B => self.config.asset_b,
        }
    }

    fn reserve(&self, side: Side) -> u64 {
        match side {
            Side::A => self.reserve_a,
            Side::B => self.reserve_b,
        }
    }

    fn set_reserve(&mut self, side: Side, value: u64) {
        match side {
            Side::A => self.reserve_a = value,
            Side::B => self.reserve_b = value,
        }
    }

    fn fees(&self, side: Side) -> u64 {
        match side {
            Side::A => self.fees_a,
            Side::B => self.fees_b,
        }
    }

    fn set_fees(&mut self, side: Side, value: u64) {
        match side {
            Side::A => self.fees_a = value,
            Side::B => self.fees_b = value,
        }
    }

    fn checkpoint(&self, claims: Option<ClaimCheckpoint>) -> Checkpoint {
        Checkpoint {
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            invariant_k: self.invariant_k,
            fees_a: self.fees_a,
            fees_b: self.fees_b,
            bootstrapped: self.bootstrapped,
            claims,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.reserve_a = checkpoint.reserve_a;
        self.reserve_b = checkpoint.reserve_b;
        self.invariant_k = checkpoint.invariant_k;
        self.fees_a = checkpoint.fees_a;
        self.fees_b = checkpoint.fees_b;
        self.bootstrapped = checkpoint.bootstrapped;
        if let Some(claims) = checkpoint.claims {
            self.claims.restore(claims);
        }
    }

    fn collaborator<'p, 'a>(
        &self,
        assets: &'p mut AssetPair<'a>,
        side: Side,
    ) -> Result<&'p mut (dyn FungibleAsset + 'a)> {
        assets
            .get_mut(&self.asset_of(side))
            .ok_or(PoolError::InvalidAsset)
    }

    fn check_pull(
        &self,
        assets: &AssetPair<'_>,
        side: Side,
        from: &AccountId,
        amount: u64,
    ) -> Result<()> {
        let pool = self.config.pool_account;
        let asset = assets
            .get(&self.asset_of(side))
            .ok_or(PoolError::InvalidAsset)?;
        Ok(asset.check_transfer_from(&pool, from, &pool, amount)?)
    }

    fn check_push(
        &self,
        assets: &AssetPair<'_>,
        side: Side,
        to: &AccountId,
        amount: u64,
    ) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let pool = self.config.pool_account;
        let asset = assets
            .get(&self.asset_of(side))
            .ok_or(PoolError::InvalidAsset)?;
        Ok(asset.check_transfer(&pool, to, amount)?)
    }

    fn pull(
        &self,
        assets: &mut AssetPair<'_>,
        side: Side,
        from: AccountId,
        amount: u64,
    ) -> Result<()> {
        let pool = self.config.pool_account;
        Ok(self
            .collaborator(assets, side)?
            .transfer_from(pool, from, pool, amount)?)
    }

    fn push(
        &self,
        assets: &mut AssetPair<'_>,
        side: Side,
        to: AccountId,
        amount: u64,
    ) -> Result<()> {
        let pool = self.config.pool_account;
        Ok(self.collaborator(assets, side)?.transfer(pool, to, amount)?)
    }

    /// Pull both deposit legs; the first is returned if the second fails
    fn pull_pair(
        &self,
        assets: &mut AssetPair<'_>,
        from: AccountId,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<()> {
        self.pull(assets, Side::A, from, amount_a)?;
        if let Err(err) = self.pull(assets, Side::B, from, amount_b) {
            warn!("deposit from {} failed on second leg ({}), refunding first", from, err);
            self.refund(assets, Side::A, from, amount_a);
            return Err(err);
        }
        Ok(())
    }

    fn refund(&self, assets: &mut AssetPair<'_>, side: Side, to: AccountId, amount: u64) {
        if let Err(err) = self.push(assets, side, to, amount) {
            error!(
                "refund of {} {} to {} failed: {}",
                amount,
                self.asset_of(side),
                to,
                err
            );
        }
    }

    /// Push both payout legs after the commit
    ///
    /// A failed first leg undoes the commit. A failed second leg undoes it
    /// only if the first leg can be pulled back from `to`; otherwise the
    /// commit stands, since the pool no longer holds the first leg, and the
    /// unpaid second leg stays in custody above the books.
    fn pay_out(
        &mut self,
        assets: &mut AssetPair<'_>,
        to: AccountId,
        amount_a: u64,
        amount_b: u64,
        checkpoint: Checkpoint,
    ) -> Result<()> {
        if amount_a > 0 {
            if let Err(err) = self.push(assets, Side::A, to, amount_a) {
                warn!("payout to {} failed ({}), restoring pool state", to, err);
                self.restore(checkpoint);
                return Err(err);
            }
        }
        if amount_b > 0 {
            if let Err(err) = self.push(assets, Side::B, to, amount_b) {
                if amount_a == 0 {
                    warn!("payout to {} failed ({}), restoring pool state", to, err);
                    self.restore(checkpoint);
                    return Err(err);
                }
                match self.pull(assets, Side::A, to, amount_a) {
                    Ok(()) => {
                        warn!(
                            "payout to {} failed on second leg ({}), first leg reclaimed",
                            to, err
                        );
                        self.restore(checkpoint);
                    }
                    Err(reclaim) => error!(
                        "payout to {} failed on second leg ({}) and {} {} could not be \
                         reclaimed ({}); keeping the commit, {} {} held off the books",
                        to,
                        err,
                        amount_a,
                        self.config.asset_a,
                        reclaim,
                        amount_b,
                        self.config.asset_b
                    ),
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
