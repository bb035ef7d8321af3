//! Claim ledger: balances, allowances and total supply of the liquidity claim
//!
//! Invariant: the sum of all balances equals `total_supply` after every call.
//! Each call checks everything first and mutates last, so an error leaves the
//! ledger untouched.

use std::collections::HashMap;

use thiserror::Error;

use crate::asset::AccountId;

/// Allowance value that `transfer_from` never decrements
pub const UNLIMITED_ALLOWANCE: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("insufficient allowance")]
    InsufficientAllowance,
    #[error("arithmetic overflow")]
    Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimLedger {
    total_supply: u64,
    balances: HashMap<AccountId, u64>,
    allowances: HashMap<(AccountId, AccountId), u64>,
}

/// Values a single pool operation may touch, captured before it runs
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClaimCheckpoint {
    total_supply: u64,
    holder: AccountId,
    balance: u64,
    allowance: Option<(AccountId, u64)>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &AccountId) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Holders with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, u64)> {
        self.balances.iter().map(|(holder, balance)| (holder, *balance))
    }

    /// Credit `amount` new claims to `holder`
    pub fn mint(&mut self, holder: AccountId, amount: u64) -> Result<(), LedgerError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(&holder)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.total_supply = supply;
        self.set_balance(holder, balance);
        Ok(())
    }

    /// Destroy `amount` of `holder`'s claims
    pub fn burn(&mut self, holder: AccountId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balance_of(&holder);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }

        // balance <= total_supply, so neither subtraction can underflow
        self.total_supply -= amount;
        self.set_balance(holder, balance - amount);
        Ok(())
    }

    /// Destroy `owner`'s claims on behalf of `spender`, consuming allowance
    pub fn burn_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let remaining = self.remaining_allowance(&owner, &spender, amount)?;
        if self.balance_of(&owner) < amount {
            return Err(LedgerError::InsufficientBalance);
        }

        self.burn(owner, amount)?;
        self.set_allowance(owner, spender, remaining);
        Ok(())
    }

    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u64) {
        self.set_allowance(owner, spender, amount);
    }

    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let to_balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.set_balance(from, from_balance - amount);
        self.set_balance(to, to_balance);
        Ok(())
    }

    /// Move `owner`'s claims to `to` on behalf of `spender`
    pub fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let remaining = self.remaining_allowance(&owner, &spender, amount)?;

        self.transfer(owner, to, amount)?;
        self.set_allowance(owner, spender, remaining);
        Ok(())
    }

    fn remaining_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let current = self.allowance(owner, spender);
        if current == UNLIMITED_ALLOWANCE {
            return Ok(current);
        }
        current
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance)
    }

    fn set_balance(&mut self, holder: AccountId, balance: u64) {
        if balance == 0 {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, balance);
        }
    }

    fn set_allowance(&mut self, owner: AccountId, spender: AccountId, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    pub(crate) fn checkpoint(
        &self,
        holder: AccountId,
        spender: Option<AccountId>,
    ) -> ClaimCheckpoint {
        ClaimCheckpoint {
            total_supply: self.total_supply,
            holder,
            balance: self.balance_of(&holder),
            allowance: spender.map(|s| (s, self.allowance(&holder, &s))),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: ClaimCheckpoint) {
        self.total_supply = checkpoint.total_supply;
        self.set_balance(checkpoint.holder, checkpoint.balance);
        if let Some((spender, amount)) = checkpoint.allowance {
            self.set_allowance(checkpoint.holder, spender, amount);
        }
    }

    #[cfg(test)]
    fn balances_sum(&self) -> u128 {
        self.balances.values().map(|b| *b as u128).sum()
    }
}
