use cosmwasm_std::{
    to_json_binary, Addr, Api, Coin, CosmosMsg, Empty, QueryRequest, StdError, StdResult,
    WasmMsg, WasmQuery,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::adapters::{Asset, AssetInfo};
use crate::msg::{ExecuteMsg, QueryMsg};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
pub struct PoolBase<T> {
    pub contract_addr: T,
}

pub type PoolUnchecked = PoolBase<String>;
pub type Pool = PoolBase<Addr>;

impl From<Pool> for PoolUnchecked {
    fn from(pool: Pool) -> Self {
        PoolUnchecked {
            contract_addr: pool.contract_addr.to_string(),
        }
    }
}

impl PoolUnchecked {
    pub fn check(&self, api: &dyn Api) -> StdResult<Pool> {
        Ok(Pool {
            contract_addr: api.addr_validate(&self.contract_addr)?,
        })
    }
}

impl Pool {
    /// Generate message for depositing a specified amount of asset
    pub fn deposit_msg(&self, asset: &Asset) -> StdResult<CosmosMsg> {
        self.execute_msg(
            &ExecuteMsg::Deposit {
                asset: asset.info.clone().into(),
                amount: asset.amount,
            },
            asset.funds(),
        )
    }

    /// Generate message for repaying a specified amount of asset
    pub fn repay_msg(&self, asset: &Asset) -> StdResult<CosmosMsg> {
        self.execute_msg(
            &ExecuteMsg::Repay {
                asset: asset.info.clone().into(),
                amount: asset.amount,
            },
            asset.funds(),
        )
    }

    /// Generate message for withdrawing a specified amount of the pool's profit
    ///
    /// The pool exposes separate entry points for the native token and for CW20 tokens
    pub fn claim_msg(&self, asset: &Asset) -> StdResult<CosmosMsg> {
        let msg = match &asset.info {
            AssetInfo::Native { .. } => ExecuteMsg::ClaimEth {
                amount: asset.amount,
            },
            AssetInfo::Cw20 { .. } => ExecuteMsg::ClaimToken {
                asset: asset.info.clone().into(),
                amount: asset.amount,
            },
        };
        self.execute_msg(&msg, vec![])
    }

    pub fn claim_peko_msg(&self) -> StdResult<CosmosMsg> {
        self.execute_msg(&ExecuteMsg::ClaimPeko {}, vec![])
    }

    /// Generate message for liquidating `account`
    ///
    /// `native_payment` is the native leg of the payment and is attached as funds. The token leg
    /// is drawn by the pool and must have been approved beforehand
    pub fn liquidate_msg(&self, account: &Addr, native_payment: &Asset) -> StdResult<CosmosMsg> {
        if !native_payment.info.is_native() {
            return Err(StdError::generic_err(format!(
                "liquidation payment must be native, received {}",
                native_payment
            )));
        }
        self.execute_msg(
            &ExecuteMsg::Liquidate {
                account: account.to_string(),
            },
            native_payment.funds(),
        )
    }

    /// Request reading an account's positions
    pub fn user_info_query(&self, account: &Addr) -> StdResult<QueryRequest<Empty>> {
        Ok(QueryRequest::Wasm(WasmQuery::Smart {
            contract_addr: self.contract_addr.to_string(),
            msg: to_json_binary(&QueryMsg::UserInfo {
                account: account.to_string(),
            })?,
        }))
    }

    fn execute_msg(&self, msg: &ExecuteMsg, funds: Vec<Coin>) -> StdResult<CosmosMsg> {
        Ok(CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: self.contract_addr.to_string(),
            msg: to_json_binary(msg)?,
            funds,
        }))
    }
}
