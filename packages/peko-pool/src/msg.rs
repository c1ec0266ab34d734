use cosmwasm_std::{StdResult, Uint128};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::adapters::{AssetInfo, AssetInfoUnchecked};

//--------------------------------------------------------------------------------------------------
// Message types
//--------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteMsg {
    /// Deposit asset of specified type and amount
    ///
    /// If the asset is the native token, the same amount must be attached to the message as funds.
    /// If the asset is a CW20 token, the pool draws it from the sender's wallet. NOTE: sender must
    /// have approved spending first
    Deposit {
        asset: AssetInfoUnchecked,
        amount: Uint128,
    },
    /// Repay a borrowed asset. Funds rules are the same as for `Deposit`
    Repay {
        asset: AssetInfoUnchecked,
        amount: Uint128,
    },
    /// Withdraw a specified amount of the pool's native token profit
    ClaimEth {
        amount: Uint128,
    },
    /// Withdraw a specified amount of the pool's CW20 token profit
    ClaimToken {
        asset: AssetInfoUnchecked,
        amount: Uint128,
    },
    /// Claim all of the sender's accrued PEKO reward
    ClaimPeko {},
    /// Pay off an unhealthy account's debts in both assets and take over its deposits and rewards.
    /// The native leg of the payment is attached as funds; the token leg is drawn by allowance
    Liquidate {
        account: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    /// Return an account's positions in both assets. Response: `UserInfoResponse`
    UserInfo {
        account: String,
    },
}

//--------------------------------------------------------------------------------------------------
// Response types
//--------------------------------------------------------------------------------------------------

/// An account's position in one asset, in raw on-chain units
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct PositionAmounts {
    pub deposit_amount: Uint128,
    pub borrow_amount: Uint128,
    pub interest_amount: Uint128,
    pub reward_amount: Uint128,
}

impl PositionAmounts {
    /// Debt to be repaid: principal plus accrued interest
    pub fn owed(&self) -> StdResult<Uint128> {
        Ok(self.borrow_amount.checked_add(self.interest_amount)?)
    }

    /// What the position's holder is entitled to: deposit plus accrued reward
    pub fn receivable(&self) -> StdResult<Uint128> {
        Ok(self.deposit_amount.checked_add(self.reward_amount)?)
    }
}

/// The pool tracks two assets in parallel, the native token and one CW20 token
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct UserInfoResponse {
    pub native: PositionAmounts,
    pub token: PositionAmounts,
    /// Unclaimed PEKO reward
    pub peko_reward_amount: Uint128,
}

impl UserInfoResponse {
    /// Position in the asset of the given kind
    pub fn position(&self, info: &AssetInfo) -> &PositionAmounts {
        if info.is_native() {
            &self.native
        } else {
            &self.token
        }
    }
}
