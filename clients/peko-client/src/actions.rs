use cosmwasm_std::{Addr, CosmosMsg, Uint128};

use peko_pool::adapters::{Asset, PoolAsset};
use peko_pool::amount::is_within_ceiling;
use peko_pool::config::NetworkConfig;

use crate::error::ClientError;
use crate::pipeline::ActionKind;
use crate::ports::ChainReader;
use crate::queries::{claimable_profit, liquidation_preview, query_balance, query_user_info, repay_ceiling};

/// Something the user asked the pool to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Deposit(Asset),
    Repay(Asset),
    /// Pay off `account`'s debts and take over its deposits
    Liquidate {
        account: Addr,
    },
    /// Withdraw pool profit
    ClaimProfit(Asset),
    ClaimPeko,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Deposit(_) => ActionKind::Deposit,
            Action::Repay(_) => ActionKind::Repay,
            Action::Liquidate { .. } => ActionKind::Liquidate,
            Action::ClaimProfit(_) => ActionKind::ClaimProfit,
            Action::ClaimPeko => ActionKind::ClaimPeko,
        }
    }
}

/// An action validated against current chain state and turned into a message
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedCall {
    pub kind: ActionKind,
    /// Asset the pool will draw by allowance, if any, in the amount to approve
    pub approval: Option<Asset>,
    /// What the pool actually draws of the approved asset; a liquidation approves more to cover
    /// interest accruing in the meantime
    pub draw: Uint128,
    pub msg: CosmosMsg,
    /// Amount of the approved asset, or of the moved asset when there is no approval
    pub amount: Uint128,
    pub display_amount: String,
    pub symbol: String,
}

/// Validate `action` as sent by `sender` and build its message
///
/// Only reads from the chain. Every validation error is returned here, before anything is
/// submitted.
pub async fn prepare<R: ChainReader>(
    reader: &R,
    config: &NetworkConfig,
    sender: &Addr,
    action: &Action,
) -> Result<PreparedCall, ClientError> {
    match action {
        Action::Deposit(asset) => {
            let listed = lending_asset(config, asset)?;
            let balance = query_balance(reader, &asset.info, sender).await?;
            assert_within(asset.amount, balance)?;
            Ok(call_moving(ActionKind::Deposit, listed, asset, config.pool.deposit_msg(asset)?))
        }

        Action::Repay(asset) => {
            let listed = lending_asset(config, asset)?;
            let owed = repay_ceiling(reader, config, sender, &asset.info).await?;
            assert_within(asset.amount, owed)?;

            // the repayment itself has to be in the wallet, too
            let balance = query_balance(reader, &asset.info, sender).await?;
            if balance < asset.amount {
                return Err(ClientError::InsufficientBalance {
                    symbol: listed.ticker(),
                });
            }

            Ok(call_moving(ActionKind::Repay, listed, asset, config.pool.repay_msg(asset)?))
        }

        Action::ClaimProfit(asset) => {
            let listed = lending_asset(config, asset)?;
            let profit = claimable_profit(reader, config, &asset.info).await?;
            assert_within(asset.amount, profit)?;
            Ok(PreparedCall {
                kind: ActionKind::ClaimProfit,
                approval: None,
                draw: Uint128::zero(),
                msg: config.pool.claim_msg(asset)?,
                amount: asset.amount,
                display_amount: listed.display(asset.amount),
                symbol: listed.symbol.clone(),
            })
        }

        Action::ClaimPeko => {
            let user_info = query_user_info(reader, &config.pool, sender).await?;
            let reward = user_info.peko_reward_amount;
            Ok(PreparedCall {
                kind: ActionKind::ClaimPeko,
                approval: None,
                draw: Uint128::zero(),
                msg: config.pool.claim_peko_msg()?,
                amount: reward,
                display_amount: config.peko.display(reward),
                symbol: config.peko.symbol.clone(),
            })
        }

        Action::Liquidate { account } => {
            let preview = liquidation_preview(reader, config, sender, account).await?;
            let quote = &preview.quote;
            if quote.is_empty() {
                return Err(ClientError::NothingToLiquidate);
            }
            if !preview.native_sufficient {
                return Err(ClientError::InsufficientBalance {
                    symbol: config.native.ticker(),
                });
            }
            if !preview.token_sufficient {
                return Err(ClientError::InsufficientBalance {
                    symbol: config.token.ticker(),
                });
            }

            let native_payment = config.native.with_amount(quote.native.pay);
            let msg = config.pool.liquidate_msg(account, &native_payment)?;

            // the token leg is drawn by allowance; with nothing to approve, show the native leg
            let (approval, draw, listed, amount) = if quote.requires_token_payment() {
                (
                    Some(config.token.with_amount(quote.token.pay)),
                    quote.token.owed,
                    &config.token,
                    quote.token.pay,
                )
            } else {
                (None, Uint128::zero(), &config.native, quote.native.pay)
            };

            Ok(PreparedCall {
                kind: ActionKind::Liquidate,
                approval,
                draw,
                msg,
                amount,
                display_amount: listed.display(amount),
                symbol: listed.symbol.clone(),
            })
        }
    }
}

/// The listed native or CW20 asset matching `asset`; PEKO is not lent out
fn lending_asset<'a>(config: &'a NetworkConfig, asset: &Asset) -> Result<&'a PoolAsset, ClientError> {
    config
        .lending_assets()
        .into_iter()
        .find(|listed| listed.info == asset.info)
        .ok_or_else(|| ClientError::UnsupportedAsset(asset.info.to_string()))
}

fn assert_within(amount: Uint128, ceiling: Uint128) -> Result<(), ClientError> {
    if !is_within_ceiling(amount, ceiling) {
        return Err(ClientError::AmountOutOfRange {
            amount,
            ceiling,
        });
    }
    Ok(())
}

/// A call moving `asset` into the pool; CW20 tokens need to be approved first
fn call_moving(kind: ActionKind, listed: &PoolAsset, asset: &Asset, msg: CosmosMsg) -> PreparedCall {
    let (approval, draw) = if asset.info.is_native() {
        (None, Uint128::zero())
    } else {
        (Some(asset.clone()), asset.amount)
    };
    PreparedCall {
        kind,
        approval,
        draw,
        msg,
        amount: asset.amount,
        display_amount: listed.display(asset.amount),
        symbol: listed.symbol.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::{from_json, Coin, WasmMsg};

    use peko_pool::msg::{ExecuteMsg, PositionAmounts, UserInfoResponse};

    use crate::testing::{mock_config, FakeChain};

    fn alice() -> Addr {
        Addr::unchecked("alice")
    }

    fn execute_msg(call: &PreparedCall) -> (ExecuteMsg, Vec<Coin>) {
        match &call.msg {
            CosmosMsg::Wasm(WasmMsg::Execute { msg, funds, .. }) => (from_json(msg).unwrap(), funds.clone()),
            _ => panic!("expected a wasm execute message"),
        }
    }

    #[tokio::test]
    async fn deposits_are_bounded_by_the_wallet() {
        let config = mock_config();
        let chain = FakeChain::new("linea-1", "pool");
        chain.set_balance(&config.token.info, &alice(), 12_500_000u128);

        let ok = Action::Deposit(config.token.with_amount(12_500_000u128));
        let call = prepare(&chain, &config, &alice(), &ok).await.unwrap();
        assert_eq!(call.approval, Some(config.token.with_amount(12_500_000u128)));
        assert_eq!(call.draw, Uint128::new(12_500_000));
        assert_eq!(call.display_amount, "12.5");
        assert_eq!(call.symbol, "usdc");

        let too_much = Action::Deposit(config.token.with_amount(12_500_001u128));
        assert_eq!(
            prepare(&chain, &config, &alice(), &too_much).await.unwrap_err(),
            ClientError::AmountOutOfRange {
                amount: Uint128::new(12_500_001),
                ceiling: Uint128::new(12_500_000),
            }
        );

        let zero = Action::Deposit(config.token.with_amount(0u128));
        assert!(matches!(
            prepare(&chain, &config, &alice(), &zero).await,
            Err(ClientError::AmountOutOfRange { .. })
        ));

        let peko = Action::Deposit(config.peko.with_amount(1u128));
        assert_eq!(
            prepare(&chain, &config, &alice(), &peko).await.unwrap_err(),
            ClientError::UnsupportedAsset("cw20:peko_token".to_string())
        );

        assert_eq!(chain.submit_count(), 0);
    }

    #[tokio::test]
    async fn native_deposits_need_no_approval() {
        let config = mock_config();
        let chain = FakeChain::new("linea-1", "pool");
        chain.set_balance(&config.native.info, &alice(), 1_000_000_000_000_000_000u128);

        let action = Action::Deposit(config.native.with_amount(250_000_000_000_000_000u128));
        let call = prepare(&chain, &config, &alice(), &action).await.unwrap();
        assert_eq!(call.approval, None);
        assert_eq!(call.display_amount, "0.25");

        let (_, funds) = execute_msg(&call);
        assert_eq!(funds, vec![Coin::new(250_000_000_000_000_000, "ueth")]);
    }

    #[tokio::test]
    async fn repaying_at_most_what_is_owed() {
        let config = mock_config();
        let chain = FakeChain::new("linea-1", "pool");
        chain.set_balance(&config.token.info, &alice(), 5_000_000u128);
        chain.set_user_info(
            &alice(),
            UserInfoResponse {
                token: PositionAmounts {
                    borrow_amount: Uint128::new(1_000_000),
                    interest_amount: Uint128::new(500),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        let action = Action::Repay(config.token.with_amount(1_000_500u128));
        let call = prepare(&chain, &config, &alice(), &action).await.unwrap();
        assert_eq!(call.kind, ActionKind::Repay);
        assert_eq!(call.approval, Some(config.token.with_amount(1_000_500u128)));

        let action = Action::Repay(config.token.with_amount(1_000_501u128));
        assert!(matches!(
            prepare(&chain, &config, &alice(), &action).await,
            Err(ClientError::AmountOutOfRange { .. })
        ));

        chain.set_balance(&config.token.info, &alice(), 1_000u128);
        let action = Action::Repay(config.token.with_amount(1_000_500u128));
        assert_eq!(
            prepare(&chain, &config, &alice(), &action).await.unwrap_err(),
            ClientError::InsufficientBalance {
                symbol: "USDC".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn claiming_profit_up_to_the_pool_balance() {
        let config = mock_config();
        let chain = FakeChain::new("linea-1", "pool");
        chain.set_balance(&config.token.info, &config.pool.contract_addr, 300u128);

        let call = prepare(&chain, &config, &alice(), &Action::ClaimProfit(config.token.with_amount(300u128)))
            .await
            .unwrap();
        assert_eq!(call.approval, None);
        assert_eq!(
            execute_msg(&call).0,
            ExecuteMsg::ClaimToken {
                asset: config.token.info.clone().into(),
                amount: Uint128::new(300),
            }
        );

        let err = prepare(&chain, &config, &alice(), &Action::ClaimProfit(config.token.with_amount(301u128)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AmountOutOfRange { .. }));
    }

    #[tokio::test]
    async fn liquidating() {
        let config = mock_config();
        let chain = FakeChain::new("linea-1", "pool");
        let bob = Addr::unchecked("bob");
        chain.set_user_info(
            &bob,
            UserInfoResponse {
                native: PositionAmounts {
                    borrow_amount: Uint128::new(1_000_000_000_000_000_000),
                    ..Default::default()
                },
                token: PositionAmounts {
                    deposit_amount: Uint128::new(500_000),
                    borrow_amount: Uint128::new(1_000_000),
                    interest_amount: Uint128::zero(),
                    reward_amount: Uint128::new(10_000),
                },
                ..Default::default()
            },
        );

        let action = Action::Liquidate {
            account: bob.clone(),
        };

        assert_eq!(
            prepare(&chain, &config, &alice(), &action).await.unwrap_err(),
            ClientError::InsufficientBalance {
                symbol: "ETH".to_string(),
            }
        );

        chain.set_balance(&config.native.info, &alice(), 2_000_000_000_000_000_000u128);
        assert_eq!(
            prepare(&chain, &config, &alice(), &action).await.unwrap_err(),
            ClientError::InsufficientBalance {
                symbol: "USDC".to_string(),
            }
        );

        chain.set_balance(&config.token.info, &alice(), 2_000_000u128);
        let call = prepare(&chain, &config, &alice(), &action).await.unwrap();
        assert_eq!(call.approval, Some(config.token.with_amount(1_000_100u128)));
        assert_eq!(call.draw, Uint128::new(1_000_000));
        assert_eq!(call.display_amount, "1.0001");

        let (msg, funds) = execute_msg(&call);
        assert_eq!(
            msg,
            ExecuteMsg::Liquidate {
                account: "bob".to_string(),
            }
        );
        // 1 ETH / 0.9999, rounded half up
        assert_eq!(funds, vec![Coin::new(1_000_100_010_001_000_100, "ueth")]);

        let nobody = Action::Liquidate {
            account: Addr::unchecked("carol"),
        };
        assert_eq!(
            prepare(&chain, &config, &alice(), &nobody).await.unwrap_err(),
            ClientError::NothingToLiquidate
        );
    }
}
