use std::fmt;

use cosmwasm_std::{
    to_json_binary, Addr, Api, BankQuery, Coin, CosmosMsg, Empty, QueryRequest, StdError,
    StdResult, Uint128, WasmMsg, WasmQuery,
};
use cw20::{Cw20ExecuteMsg, Cw20QueryMsg};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::amount;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetInfoBase<T> {
    Cw20 { contract_addr: T },
    Native { denom: String },
}

pub type AssetInfoUnchecked = AssetInfoBase<String>;
pub type AssetInfo = AssetInfoBase<Addr>;

impl From<AssetInfo> for AssetInfoUnchecked {
    fn from(asset_info: AssetInfo) -> Self {
        match &asset_info {
            AssetInfo::Cw20 { contract_addr } => AssetInfoUnchecked::Cw20 {
                contract_addr: contract_addr.to_string(),
            },
            AssetInfo::Native { denom } => AssetInfoUnchecked::Native {
                denom: denom.clone(),
            },
        }
    }
}

impl AssetInfoUnchecked {
    pub fn check(&self, api: &dyn Api) -> StdResult<AssetInfo> {
        let checked = match self {
            AssetInfoUnchecked::Cw20 { contract_addr } => AssetInfo::Cw20 {
                contract_addr: api.addr_validate(contract_addr)?,
            },
            AssetInfoUnchecked::Native { denom } => AssetInfo::Native {
                denom: denom.clone(),
            },
        };

        Ok(checked)
    }
}

impl fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssetInfo::Cw20 { contract_addr } => write!(f, "cw20:{}", contract_addr),
            AssetInfo::Native { denom } => write!(f, "native:{}", denom),
        }
    }
}

impl AssetInfo {
    // INSTANCE CREATION

    pub fn cw20(contract_addr: &Addr) -> Self {
        Self::Cw20 {
            contract_addr: contract_addr.clone(),
        }
    }

    pub fn native(denom: impl Into<String>) -> Self {
        Self::Native {
            denom: denom.into(),
        }
    }

    // UTILITIES

    pub fn is_native(&self) -> bool {
        matches!(self, AssetInfo::Native { .. })
    }

    /// Get the asset's label
    /// For native tokens, it's the denom, e.g. ueth
    /// For CW20 tokens, it's the contract address
    pub fn get_denom(&self) -> String {
        match self {
            AssetInfo::Cw20 { contract_addr } => contract_addr.to_string(),
            AssetInfo::Native { denom } => denom.clone(),
        }
    }

    /// Whether the pool must be granted an allowance before it can draw `amount` of this asset
    ///
    /// Native assets travel as funds attached to the call, so they never need one. The caller is
    /// expected to pass an allowance freshly read from the chain, not one assumed after an
    /// approval was confirmed.
    pub fn requires_approval(&self, amount: Uint128, current_allowance: Uint128) -> bool {
        match self {
            AssetInfo::Native { .. } => false,
            AssetInfo::Cw20 { .. } => current_allowance < amount,
        }
    }

    // QUERIES

    /// Request reading an account's balance of the asset
    pub fn balance_query(&self, account: &Addr) -> StdResult<QueryRequest<Empty>> {
        match self {
            AssetInfo::Cw20 { contract_addr } => Ok(QueryRequest::Wasm(WasmQuery::Smart {
                contract_addr: contract_addr.to_string(),
                msg: to_json_binary(&Cw20QueryMsg::Balance {
                    address: account.to_string(),
                })?,
            })),
            AssetInfo::Native { denom } => Ok(QueryRequest::Bank(BankQuery::Balance {
                address: account.to_string(),
                denom: denom.clone(),
            })),
        }
    }

    /// Request reading how much `spender` may draw from `owner`
    pub fn allowance_query(&self, owner: &Addr, spender: &Addr) -> StdResult<QueryRequest<Empty>> {
        match self {
            AssetInfo::Cw20 { contract_addr } => Ok(QueryRequest::Wasm(WasmQuery::Smart {
                contract_addr: contract_addr.to_string(),
                msg: to_json_binary(&Cw20QueryMsg::Allowance {
                    owner: owner.to_string(),
                    spender: spender.to_string(),
                })?,
            })),
            AssetInfo::Native { .. } => {
                Err(StdError::generic_err("`Allowance` does not apply to native tokens"))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct AssetBase<T> {
    pub info: T,
    pub amount: Uint128,
}

pub type AssetUnchecked = AssetBase<AssetInfoUnchecked>;
pub type Asset = AssetBase<AssetInfo>;

impl From<Asset> for AssetUnchecked {
    fn from(asset: Asset) -> Self {
        AssetUnchecked {
            info: asset.info.into(),
            amount: asset.amount,
        }
    }
}

impl AssetUnchecked {
    pub fn check(&self, api: &dyn Api) -> StdResult<Asset> {
        let checked = Asset {
            info: self.info.check(api)?,
            amount: self.amount,
        };

        Ok(checked)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.info, self.amount)
    }
}

impl Asset {
    // INSTANCE CREATION

    pub fn cw20<A: Into<Uint128>>(contract_addr: &Addr, amount: A) -> Self {
        Asset {
            info: AssetInfo::cw20(contract_addr),
            amount: amount.into(),
        }
    }

    pub fn native<A: Into<Uint128>>(denom: impl Into<String>, amount: A) -> Self {
        Asset {
            info: AssetInfo::native(denom),
            amount: amount.into(),
        }
    }

    // MESSAGES

    /// Native value to attach to a call moving this asset into the pool
    ///
    /// Empty for CW20 tokens and for zero amounts
    pub fn funds(&self) -> Vec<Coin> {
        match &self.info {
            AssetInfo::Native { denom } if !self.amount.is_zero() => vec![Coin {
                denom: denom.clone(),
                amount: self.amount,
            }],
            _ => vec![],
        }
    }

    /// Generate the message raising `spender`'s allowance from `current_allowance` to exactly
    /// the asset amount using the `Cw20ExecuteMsg::IncreaseAllowance` message type
    ///
    /// NOTE: Only valid when the allowance gate reports an approval is required
    pub fn increase_allowance_msg(
        &self,
        spender: &Addr,
        current_allowance: Uint128,
    ) -> StdResult<CosmosMsg> {
        match &self.info {
            AssetInfo::Cw20 { contract_addr } => {
                if !self.info.requires_approval(self.amount, current_allowance) {
                    return Err(StdError::generic_err(format!(
                        "allowance already sufficient! required: {} current: {}",
                        self.amount, current_allowance
                    )));
                }

                Ok(CosmosMsg::Wasm(WasmMsg::Execute {
                    contract_addr: contract_addr.to_string(),
                    msg: to_json_binary(&Cw20ExecuteMsg::IncreaseAllowance {
                        spender: spender.to_string(),
                        amount: self.amount.checked_sub(current_allowance)?,
                        expires: None,
                    })?,
                    funds: vec![],
                }))
            }
            AssetInfo::Native { .. } => Err(StdError::generic_err(
                "`IncreaseAllowance` does not apply to native tokens",
            )),
        }
    }
}

/// An asset listed by the pool, together with the metadata needed to convert between raw
/// integer amounts and what the user types
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct PoolAssetBase<T> {
    /// Ticker shown to the user, e.g. `eth`, `usdc`
    pub symbol: String,
    pub name: String,
    /// Number of fractional digits of the raw on-chain integer
    pub decimals: u32,
    pub info: AssetInfoBase<T>,
}

pub type PoolAssetUnchecked = PoolAssetBase<String>;
pub type PoolAsset = PoolAssetBase<Addr>;

impl From<PoolAsset> for PoolAssetUnchecked {
    fn from(asset: PoolAsset) -> Self {
        PoolAssetUnchecked {
            symbol: asset.symbol,
            name: asset.name,
            decimals: asset.decimals,
            info: asset.info.into(),
        }
    }
}

impl PoolAssetUnchecked {
    pub fn check(&self, api: &dyn Api) -> StdResult<PoolAsset> {
        Ok(PoolAsset {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            decimals: self.decimals,
            info: self.info.check(api)?,
        })
    }
}

impl PoolAsset {
    pub fn with_amount<A: Into<Uint128>>(&self, amount: A) -> Asset {
        Asset {
            info: self.info.clone(),
            amount: amount.into(),
        }
    }

    /// Parse a user-typed decimal string into an asset of this kind
    pub fn parse_amount(&self, input: &str) -> StdResult<Asset> {
        Ok(self.with_amount(amount::to_integer(input, self.decimals)?))
    }

    /// Exact decimal representation of a raw amount of this asset
    pub fn display(&self, amount: Uint128) -> String {
        amount::to_display(amount, self.decimals)
    }

    /// Upper-cased ticker, as shown next to amounts
    pub fn ticker(&self) -> String {
        self.symbol.to_uppercase()
    }
}
