use cosmwasm_std::{Decimal, StdError, StdResult, Uint128, Uint256};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::msg::{PositionAmounts, UserInfoResponse};

/// One asset's side of a liquidation
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct LiquidationLeg {
    /// What the pool draws from the liquidator when the liquidation executes
    pub owed: Uint128,
    /// What the liquidator pays: owed amount, buffered
    pub pay: Uint128,
    /// What the liquidator receives: deposit plus reward, never buffered
    pub receive: Uint128,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct LiquidationQuote {
    pub native: LiquidationLeg,
    pub token: LiquidationLeg,
}

impl LiquidationQuote {
    /// Whether the token leg has to be paid, in which case an approval may be needed first
    pub fn requires_token_payment(&self) -> bool {
        !self.token.pay.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        self.native.pay.is_zero() && self.token.pay.is_zero()
    }
}

/// Scale an amount the user must pay up by the pay buffer: `owed / buffer`, rounded half up
///
/// Interest keeps accruing between reading the position and the transaction landing; dividing by
/// a buffer slightly below one makes the payment cover that. Only ever applied to the pay side.
pub fn apply_pay_buffer(owed: Uint128, buffer: Decimal) -> StdResult<Uint128> {
    if buffer.is_zero() || buffer > Decimal::one() {
        return Err(StdError::generic_err(format!(
            "invalid pay buffer: {}; must be in (0, 1]",
            buffer
        )));
    }

    let denominator = Uint256::from(buffer.atomics());
    let numerator = owed.full_mul(Decimal::one().atomics()) + denominator / Uint256::from(2u128);

    Uint128::try_from(numerator / denominator)
        .map_err(|_| StdError::generic_err(format!("buffered payment overflows: {}", owed)))
}

/// Compute what liquidating an account costs and yields, for each asset independently
pub fn compute_liquidation(info: &UserInfoResponse, pay_buffer: Decimal) -> StdResult<LiquidationQuote> {
    Ok(LiquidationQuote {
        native: leg(&info.native, pay_buffer)?,
        token: leg(&info.token, pay_buffer)?,
    })
}

fn leg(amounts: &PositionAmounts, pay_buffer: Decimal) -> StdResult<LiquidationLeg> {
    let owed = amounts.owed()?;
    Ok(LiquidationLeg {
        owed,
        pay: apply_pay_buffer(owed, pay_buffer)?,
        receive: amounts.receivable()?,
    })
}

/// Value of a raw amount at a unit price
pub fn usd_value(amount: Uint128, decimals: u32, price: Decimal) -> StdResult<Decimal> {
    let units = Decimal::from_atomics(amount, decimals)
        .map_err(|err| StdError::generic_err(err.to_string()))?;
    Ok(units.checked_mul(price)?)
}
