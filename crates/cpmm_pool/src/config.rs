//! Pool configuration, loaded from TOML
//!
//! ```toml
//! asset_a = "<base58 asset id>"
//! asset_b = "<base58 asset id>"
//! owner = "<base58 account id>"
//! pool_account = "<base58 account id>"
//! fee_bps = 30
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cpmm_model::BPS_SCALE;
use serde::{Deserialize, Serialize};

use crate::asset::{AccountId, AssetId};
use crate::error::PoolError;

/// Fee applied when the configuration does not name one (0.30%)
pub const DEFAULT_FEE_BPS: u64 = 30;

fn default_fee_bps() -> u64 {
    DEFAULT_FEE_BPS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// First asset; the pool's internal ordering is always (asset_a, asset_b)
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    /// Fraction of each swap input retained as fee, in basis points
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u64,
    /// Receives accrued swap fees
    pub owner: AccountId,
    /// Account that holds the pool's assets with each collaborator
    pub pool_account: AccountId,
}

impl PoolConfig {
    pub fn new(
        asset_a: AssetId,
        asset_b: AssetId,
        fee_bps: u64,
        owner: AccountId,
        pool_account: AccountId,
    ) -> Self {
        Self {
            asset_a,
            asset_b,
            fee_bps,
            owner,
            pool_account,
        }
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.asset_a == self.asset_b {
            return Err(PoolError::InvalidConfig("asset_a and asset_b must differ"));
        }
        if self.fee_bps >= BPS_SCALE {
            return Err(PoolError::InvalidConfig("fee must be below 10000 bps"));
        }
        if self.pool_account == self.asset_a || self.pool_account == self.asset_b {
            return Err(PoolError::InvalidConfig("pool account cannot be an asset id"));
        }
        if self.owner == self.pool_account {
            return Err(PoolError::InvalidConfig("owner cannot be the pool account"));
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PoolConfig = toml::from_str(text).context("Failed to parse pool config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Pool config not found: {}", path.display());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pool config: {}", path.display()))?;

        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid pool config in: {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize pool config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn id(byte: u8) -> AccountId {
        AccountId::new([byte; 32])
    }

    fn sample() -> PoolConfig {
        PoolConfig::new(id(10), id(11), 1_000, id(1), id(99))
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = sample();
        let text = config.to_toml_string().unwrap();
        assert_eq!(PoolConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_fee_defaults() {
        let text = format!(
            "asset_a = \"{}\"\nasset_b = \"{}\"\nowner = \"{}\"\npool_account = \"{}\"\n",
            id(10),
            id(11),
            id(1),
            id(99)
        );
        let config = PoolConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.fee_bps, DEFAULT_FEE_BPS);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut same_assets = sample();
        same_assets.asset_b = same_assets.asset_a;
        assert!(matches!(same_assets.validate(), Err(PoolError::InvalidConfig(_))));

        let mut full_fee = sample();
        full_fee.fee_bps = BPS_SCALE;
        assert!(matches!(full_fee.validate(), Err(PoolError::InvalidConfig(_))));

        let mut pool_is_asset = sample();
        pool_is_asset.pool_account = pool_is_asset.asset_a;
        assert!(matches!(pool_is_asset.validate(), Err(PoolError::InvalidConfig(_))));

        let mut pool_owns_itself = sample();
        pool_owns_itself.owner = pool_owns_itself.pool_account;
        assert!(matches!(pool_owns_itself.validate(), Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_account_id_is_a_parse_error() {
        let text = "asset_a = \"nope\"\nasset_b = \"nope\"\n\
                    owner = \"nope\"\npool_account = \"nope\"\n";
        let err = PoolConfig::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("Failed to parse pool config"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample().to_toml_string().unwrap().as_bytes()).unwrap();

        let config = PoolConfig::load(file.path()).unwrap();
        assert_eq!(config, sample());
    }

    #[test]
    fn test_load_missing_file() {
        let err = PoolConfig::load(Path::new("/nonexistent/pool.toml")).unwrap_err();
        assert!(err.to_string().contains("Pool config not found"));
    }
}
