use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("another transaction is in progress")]
    Busy,

    #[error("dialog is closed")]
    Closed,

    #[error("wrong network! expected: {expected}, connected: {actual}")]
    WrongNetwork { expected: String, actual: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("amount out of range! amount: {amount}, ceiling: {ceiling}")]
    AmountOutOfRange { amount: Uint128, ceiling: Uint128 },

    #[error("insufficient {symbol} balance")]
    InsufficientBalance { symbol: String },

    #[error("account has nothing to liquidate")]
    NothingToLiquidate,

    #[error("asset cannot be used for this action: {0}")]
    UnsupportedAsset(String),

    #[error("invalid transition! phase: {phase}, event: {event}")]
    InvalidTransition { phase: String, event: String },
}
