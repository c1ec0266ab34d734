use std::str::FromStr;

use cosmwasm_std::{from_json, Api, Decimal, StdError, StdResult};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::adapters::{AssetInfo, PoolAsset, PoolAssetBase, PoolBase};

pub const DEFAULT_PAY_BUFFER: &str = "0.9999";
const MIN_PAY_BUFFER: &str = "0.99";
const MAX_DECIMALS: u32 = 18;

//--------------------------------------------------------------------------------------------------
// Settling
//--------------------------------------------------------------------------------------------------

/// How long to wait, after an approval is confirmed, for the allowance read back from the chain
/// to reflect it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct SettlePolicy {
    /// Wait before the first read
    pub initial_delay_ms: u64,
    /// Wait between subsequent reads
    pub poll_interval_ms: u64,
    /// Number of reads before giving up
    pub max_polls: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy {
            initial_delay_ms: 3_000,
            poll_interval_ms: 1_000,
            max_polls: 10,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Config
//--------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct NetworkConfigBase<T> {
    /// Chain the pool is deployed on; actions are refused while the wallet is on another one
    pub chain_id: String,
    /// The lending pool contract
    pub pool: PoolBase<T>,
    /// The chain's native token, moved as funds attached to calls
    pub native: PoolAssetBase<T>,
    /// The CW20 token tracked by the pool next to the native one
    pub token: PoolAssetBase<T>,
    /// The reward token
    pub peko: PoolAssetBase<T>,
    /// Divisor applied to amounts a liquidator pays, so the payment still covers interest
    /// accrued until the transaction lands
    #[serde(default = "default_pay_buffer")]
    pub pay_buffer: Decimal,
    #[serde(default)]
    pub settle: SettlePolicy,
    /// Upper bound on waiting for a submitted transaction to be included
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Revert reason of `claim_peko` when the pool holds too little PEKO to pay out
    #[serde(default = "default_peko_shortfall_reason")]
    pub peko_shortfall_reason: String,
}

pub type NetworkConfigUnchecked = NetworkConfigBase<String>;
pub type NetworkConfig = NetworkConfigBase<cosmwasm_std::Addr>;

fn default_pay_buffer() -> Decimal {
    Decimal::from_str(DEFAULT_PAY_BUFFER).unwrap_or_else(|_| Decimal::one())
}

fn default_confirmation_timeout_secs() -> u64 {
    180
}

fn default_peko_shortfall_reason() -> String {
    "Insufficient PEKO balance".to_string()
}

impl From<NetworkConfig> for NetworkConfigUnchecked {
    fn from(config: NetworkConfig) -> Self {
        NetworkConfigUnchecked {
            chain_id: config.chain_id,
            pool: config.pool.into(),
            native: config.native.into(),
            token: config.token.into(),
            peko: config.peko.into(),
            pay_buffer: config.pay_buffer,
            settle: config.settle,
            confirmation_timeout_secs: config.confirmation_timeout_secs,
            peko_shortfall_reason: config.peko_shortfall_reason,
        }
    }
}

impl NetworkConfigUnchecked {
    pub fn from_json(data: &[u8]) -> StdResult<Self> {
        from_json(data)
    }

    pub fn check(&self, api: &dyn Api) -> StdResult<NetworkConfig> {
        Ok(NetworkConfig {
            chain_id: self.chain_id.clone(),
            pool: self.pool.check(api)?,
            native: self.native.check(api)?,
            token: self.token.check(api)?,
            peko: self.peko.check(api)?,
            pay_buffer: self.pay_buffer,
            settle: self.settle.clone(),
            confirmation_timeout_secs: self.confirmation_timeout_secs,
            peko_shortfall_reason: self.peko_shortfall_reason.clone(),
        })
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> StdResult<()> {
        if self.chain_id.is_empty() {
            return Err(StdError::generic_err("chain id must not be empty"));
        }

        let min_pay_buffer = Decimal::from_str(MIN_PAY_BUFFER)?;
        if self.pay_buffer <= min_pay_buffer || self.pay_buffer > Decimal::one() {
            return Err(StdError::generic_err(format!(
                "invalid pay buffer: {}; must be in ({}, 1]",
                self.pay_buffer, MIN_PAY_BUFFER
            )));
        }

        if !self.native.info.is_native() {
            return Err(StdError::generic_err(format!(
                "native asset must be a native token, got {}",
                self.native.info
            )));
        }

        for asset in [&self.token, &self.peko] {
            if asset.info.is_native() {
                return Err(StdError::generic_err(format!(
                    "{} must be a cw20 token, got {}",
                    asset.symbol, asset.info
                )));
            }
        }

        for asset in self.assets() {
            if asset.decimals > MAX_DECIMALS {
                return Err(StdError::generic_err(format!(
                    "invalid decimals for {}: {}; must be <= {}",
                    asset.symbol, asset.decimals, MAX_DECIMALS
                )));
            }
        }

        if self.settle.max_polls == 0 {
            return Err(StdError::generic_err("settle policy must poll at least once"));
        }

        if self.confirmation_timeout_secs == 0 {
            return Err(StdError::generic_err("confirmation timeout must be positive"));
        }

        Ok(())
    }

    /// The two assets users can deposit, borrow, and claim profit in
    pub fn lending_assets(&self) -> [&PoolAsset; 2] {
        [&self.native, &self.token]
    }

    fn assets(&self) -> [&PoolAsset; 3] {
        [&self.native, &self.token, &self.peko]
    }

    /// Find the listed asset of the given kind
    pub fn asset(&self, info: &AssetInfo) -> StdResult<&PoolAsset> {
        self.assets()
            .into_iter()
            .find(|asset| &asset.info == info)
            .ok_or_else(|| StdError::generic_err(format!("asset not listed by the pool: {}", info)))
    }
}
