use std::time::Duration;

use cosmwasm_std::CosmosMsg;
use tracing::{debug, warn};

use crate::ports::{ChainWriter, Outcome, TxError, TxHandle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Confirmed,
    Reverted(TxError),
    /// No outcome within the allowed wait. The transaction may still land later
    TimedOut,
}

/// Submission of one transaction and the wait for its outcome
///
/// Holds at most one pending transaction; a second submission before the first one's outcome
/// has been awaited is refused without reaching the wallet.
#[derive(Debug, Default)]
pub struct TxStep {
    pending: Option<TxHandle>,
}

impl TxStep {
    pub fn pending(&self) -> Option<&TxHandle> {
        self.pending.as_ref()
    }

    pub async fn submit<W: ChainWriter>(
        &mut self,
        writer: &W,
        msg: &CosmosMsg,
    ) -> Result<TxHandle, TxError> {
        if let Some(handle) = &self.pending {
            return Err(TxError::local(format!("transaction {} is still pending", handle)));
        }

        let handle = writer.submit(msg).await?;
        debug!(%handle, "transaction submitted");

        self.pending = Some(handle.clone());
        Ok(handle)
    }

    pub async fn await_outcome<W: ChainWriter>(
        &mut self,
        writer: &W,
        timeout: Duration,
    ) -> StepOutcome {
        let handle = match self.pending.take() {
            Some(handle) => handle,
            None => return StepOutcome::Reverted(TxError::local("no transaction submitted")),
        };

        match tokio::time::timeout(timeout, writer.await_outcome(&handle)).await {
            Ok(Outcome::Success) => {
                debug!(%handle, "transaction confirmed");
                StepOutcome::Confirmed
            }
            Ok(Outcome::Failure(err)) => {
                debug!(%handle, ?err, "transaction reverted");
                StepOutcome::Reverted(err)
            }
            Err(_) => {
                warn!(%handle, timeout_secs = timeout.as_secs(), "gave up waiting for transaction");
                StepOutcome::TimedOut
            }
        }
    }
}
