//! Asset collaborator boundary
//!
//! The pool never moves assets itself. It asks a [`FungibleAsset`] to pull
//! inputs (`transfer_from`) and push outputs (`transfer`), and trusts each
//! call to either complete or fail without partial effect.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::ledger::{ClaimLedger, LedgerError, UNLIMITED_ALLOWANCE};

/// Opaque 32-byte identity of a holder, spender or the pool's custody account
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId([u8; 32]);

/// Identity of an asset; same shape as an account identity
pub type AssetId = AccountId;

impl AccountId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAccountIdError {
    #[error("invalid base58: {0}")]
    Base58(String),
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ParseAccountIdError::Base58(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| ParseAccountIdError::Length(v.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("insufficient allowance")]
    InsufficientAllowance,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<LedgerError> for AssetError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance => AssetError::InsufficientBalance,
            LedgerError::InsufficientAllowance => AssetError::InsufficientAllowance,
            LedgerError::Overflow => AssetError::Overflow,
        }
    }
}

/// Standard fungible-token interface the pool depends on
///
/// There is no ambient message sender, so the acting account (`from`,
/// `owner`, `spender`) is always an explicit argument. Every mutating call
/// must be atomic.
pub trait FungibleAsset {
    fn id(&self) -> AssetId;

    fn balance_of(&self, holder: &AccountId) -> u64;

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64;

    fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: u64,
    ) -> Result<(), AssetError>;

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> Result<(), AssetError>;

    fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), AssetError>;

    /// Dry run of `transfer`. An `Ok` here means the same `transfer`
    /// issued next will succeed.
    fn check_transfer(
        &self,
        from: &AccountId,
        _to: &AccountId,
        amount: u64,
    ) -> Result<(), AssetError> {
        if self.balance_of(from) < amount {
            return Err(AssetError::InsufficientBalance);
        }
        Ok(())
    }

    /// Dry run of `transfer_from`, with the same guarantee as `check_transfer`
    fn check_transfer_from(
        &self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), AssetError> {
        let allowance = self.allowance(owner, spender);
        if allowance != UNLIMITED_ALLOWANCE && allowance < amount {
            return Err(AssetError::InsufficientAllowance);
        }
        self.check_transfer(owner, to, amount)
    }
}

/// The two collaborators for one pool operation, supplied in any order
pub struct AssetPair<'a> {
    first: &'a mut dyn FungibleAsset,
    second: &'a mut dyn FungibleAsset,
}

impl<'a> AssetPair<'a> {
    pub fn new(first: &'a mut dyn FungibleAsset, second: &'a mut dyn FungibleAsset) -> Self {
        Self { first, second }
    }

    pub fn get(&self, id: &AssetId) -> Option<&(dyn FungibleAsset + 'a)> {
        if self.first.id() == *id {
            Some(&*self.first)
        } else if self.second.id() == *id {
            Some(&*self.second)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: &AssetId) -> Option<&mut (dyn FungibleAsset + 'a)> {
        if self.first.id() == *id {
            Some(&mut *self.first)
        } else if self.second.id() == *id {
            Some(&mut *self.second)
        } else {
            None
        }
    }
}

/// In-memory fungible asset, used to simulate and test the pool
///
/// Keeps its books in a [`ClaimLedger`]. Accounts can be frozen to make
/// transfers touching them fail, which exercises the pool's failure paths.
#[derive(Debug, Clone)]
pub struct MemoryAsset {
    id: AssetId,
    symbol: String,
    ledger: ClaimLedger,
    frozen: HashSet<AccountId>,
}

impl MemoryAsset {
    pub fn new(id: AssetId, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            ledger: ClaimLedger::new(),
            frozen: HashSet::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> u64 {
        self.ledger.total_supply()
    }

    /// Create `amount` new units in `holder`'s balance
    pub fn mint_to(&mut self, holder: AccountId, amount: u64) -> Result<(), AssetError> {
        Ok(self.ledger.mint(holder, amount)?)
    }

    pub fn freeze(&mut self, account: AccountId) {
        self.frozen.insert(account);
    }

    pub fn thaw(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    fn ensure_not_frozen(&self, accounts: &[&AccountId]) -> Result<(), AssetError> {
        match accounts.iter().find(|a| self.frozen.contains(**a)) {
            Some(account) => Err(AssetError::Rejected(format!("account {} is frozen", account))),
            None => Ok(()),
        }
    }
}

impl FungibleAsset for MemoryAsset {
    fn id(&self) -> AssetId {
        self.id
    }

    fn balance_of(&self, holder: &AccountId) -> u64 {
        self.ledger.balance_of(holder)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.ledger.allowance(owner, spender)
    }

    fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: u64,
    ) -> Result<(), AssetError> {
        self.ledger.approve(owner, spender, amount);
        Ok(())
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> Result<(), AssetError> {
        self.ensure_not_frozen(&[&from, &to])?;
        Ok(self.ledger.transfer(from, to, amount)?)
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), AssetError> {
        self.ensure_not_frozen(&[&owner, &to])?;
        Ok(self.ledger.transfer_from(spender, owner, to, amount)?)
    }

    fn check_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), AssetError> {
        self.ensure_not_frozen(&[from, to])?;
        if self.balance_of(from) < amount {
            return Err(AssetError::InsufficientBalance);
        }
        Ok(())
    }
}
