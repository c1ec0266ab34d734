//! Interfaces to the chain and the wallet
//!
//! Everything the client knows about the outside world goes through these two traits, so the
//! transaction flow can be driven against a fake chain in tests.

use std::fmt;

use cosmwasm_std::{Addr, Binary, CosmosMsg, Empty, QueryRequest, StdResult};
use serde::{Deserialize, Serialize};

/// Read access to chain state
#[allow(async_fn_in_trait)]
pub trait ChainReader {
    /// Id of the chain the wallet is currently connected to
    async fn chain_id(&self) -> StdResult<String>;

    /// Answer a raw query; requests are built by `peko_pool::adapters`
    async fn query(&self, request: &QueryRequest<Empty>) -> StdResult<Binary>;

    /// Dry-run a message as `sender` without broadcasting it
    async fn simulate(&self, sender: &Addr, msg: &CosmosMsg) -> Result<(), TxError>;
}

/// Signs and broadcasts transactions on behalf of the connected wallet
#[allow(async_fn_in_trait)]
pub trait ChainWriter {
    async fn submit(&self, msg: &CosmosMsg) -> Result<TxHandle, TxError>;

    /// Resolves once the transaction is included in a block. May never resolve; callers bound the
    /// wait themselves
    async fn await_outcome(&self, handle: &TxHandle) -> Outcome;
}

/// Hash of a broadcast transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TxHandle(pub String);

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(TxError),
}

/// Error reported by the wallet or the chain, as received
///
/// Either part may be missing or empty; see `helpers::revert_reason`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxError {
    pub cause: Option<ErrorCause>,
    pub short_message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorCause {
    pub reason: Option<String>,
}

impl TxError {
    /// Error carrying a structured revert reason
    pub fn reverted(reason: impl Into<String>) -> Self {
        TxError {
            cause: Some(ErrorCause {
                reason: Some(reason.into()),
            }),
            short_message: None,
        }
    }

    /// Error raised on this side, before or instead of reaching the chain
    pub fn local(message: impl Into<String>) -> Self {
        TxError {
            cause: None,
            short_message: Some(message.into()),
        }
    }
}
