use cosmwasm_std::{from_json, Addr, BalanceResponse, Decimal, StdResult, Uint128};
use cw20::{AllowanceResponse, BalanceResponse as Cw20BalanceResponse};

use peko_pool::adapters::{AssetInfo, Pool};
use peko_pool::amount::{to_fixed, DISPLAY_PLACES};
use peko_pool::config::NetworkConfig;
use peko_pool::msg::UserInfoResponse;
use peko_pool::views::{compute_liquidation, usd_value, LiquidationQuote};

use crate::ports::ChainReader;

//--------------------------------------------------------------------------------------------------
// Raw reads
//--------------------------------------------------------------------------------------------------

pub async fn query_balance<R: ChainReader>(
    reader: &R,
    info: &AssetInfo,
    account: &Addr,
) -> StdResult<Uint128> {
    let bin = reader.query(&info.balance_query(account)?).await?;
    match info {
        AssetInfo::Cw20 { .. } => {
            let response: Cw20BalanceResponse = from_json(&bin)?;
            Ok(response.balance)
        }
        AssetInfo::Native { .. } => {
            let response: BalanceResponse = from_json(&bin)?;
            Ok(response.amount.amount)
        }
    }
}

pub async fn query_allowance<R: ChainReader>(
    reader: &R,
    token: &AssetInfo,
    owner: &Addr,
    spender: &Addr,
) -> StdResult<Uint128> {
    let response: AllowanceResponse =
        from_json(&reader.query(&token.allowance_query(owner, spender)?).await?)?;
    Ok(response.allowance)
}

pub async fn query_user_info<R: ChainReader>(
    reader: &R,
    pool: &Pool,
    account: &Addr,
) -> StdResult<UserInfoResponse> {
    from_json(&reader.query(&pool.user_info_query(account)?).await?)
}

//--------------------------------------------------------------------------------------------------
// Views
//--------------------------------------------------------------------------------------------------

/// Most of `info` the account can repay: its debt including interest
pub async fn repay_ceiling<R: ChainReader>(
    reader: &R,
    config: &NetworkConfig,
    account: &Addr,
    info: &AssetInfo,
) -> StdResult<Uint128> {
    let user_info = query_user_info(reader, &config.pool, account).await?;
    user_info.position(info).owed()
}

/// Profit of the given asset available for withdrawal, i.e. the pool contract's own balance
pub async fn claimable_profit<R: ChainReader>(
    reader: &R,
    config: &NetworkConfig,
    info: &AssetInfo,
) -> StdResult<Uint128> {
    query_balance(reader, info, &config.pool.contract_addr).await
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiquidationPreview {
    pub quote: LiquidationQuote,
    /// Whether the liquidator's wallet covers the native pay leg
    pub native_sufficient: bool,
    pub token_sufficient: bool,
}

impl LiquidationPreview {
    pub fn is_affordable(&self) -> bool {
        self.native_sufficient && self.token_sufficient
    }
}

/// What liquidating `account` costs and yields, and whether `liquidator` can afford it
pub async fn liquidation_preview<R: ChainReader>(
    reader: &R,
    config: &NetworkConfig,
    liquidator: &Addr,
    account: &Addr,
) -> StdResult<LiquidationPreview> {
    let user_info = query_user_info(reader, &config.pool, account).await?;
    let quote = compute_liquidation(&user_info, config.pay_buffer)?;

    let native_balance = query_balance(reader, &config.native.info, liquidator).await?;
    let token_balance = query_balance(reader, &config.token.info, liquidator).await?;

    Ok(LiquidationPreview {
        native_sufficient: native_balance >= quote.native.pay,
        token_sufficient: token_balance >= quote.token.pay,
        quote,
    })
}

/// One line of the pool profit table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfitRow {
    pub symbol: String,
    pub amount: Uint128,
    pub display_amount: String,
    pub usd_value: Decimal,
}

pub async fn profit_row<R: ChainReader>(
    reader: &R,
    config: &NetworkConfig,
    info: &AssetInfo,
    price: Decimal,
) -> StdResult<ProfitRow> {
    let asset = config.asset(info)?;
    let amount = claimable_profit(reader, config, info).await?;

    Ok(ProfitRow {
        symbol: asset.ticker(),
        amount,
        display_amount: to_fixed(amount, asset.decimals, DISPLAY_PLACES),
        usd_value: usd_value(amount, asset.decimals, price)?,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PekoRow {
    /// Reward accrued in the pool, not yet claimed
    pub unclaimed: Uint128,
    /// PEKO already in the wallet
    pub balance: Uint128,
    pub unclaimed_display: String,
    pub balance_display: String,
}

pub async fn peko_row<R: ChainReader>(
    reader: &R,
    config: &NetworkConfig,
    account: &Addr,
) -> StdResult<PekoRow> {
    let user_info = query_user_info(reader, &config.pool, account).await?;
    let balance = query_balance(reader, &config.peko.info, account).await?;
    let decimals = config.peko.decimals;

    Ok(PekoRow {
        unclaimed: user_info.peko_reward_amount,
        balance,
        unclaimed_display: to_fixed(user_info.peko_reward_amount, decimals, DISPLAY_PLACES),
        balance_display: to_fixed(balance, decimals, DISPLAY_PLACES),
    })
}
