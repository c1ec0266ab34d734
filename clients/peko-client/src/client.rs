use std::time::Duration;

use cosmwasm_std::{Addr, CosmosMsg, Uint128};
use tracing::warn;

use peko_pool::adapters::{Asset, AssetInfo};
use peko_pool::config::NetworkConfig;

use crate::actions::{prepare, Action, PreparedCall};
use crate::dialog::Dialog;
use crate::error::ClientError;
use crate::notify::{Notification, NotificationSink, WRONG_NETWORK};
use crate::ports::{ChainReader, ChainWriter};
use crate::queries::query_allowance;

/// The pool as seen from one connected wallet
pub struct PoolClient<R, W, N> {
    reader: R,
    writer: W,
    sink: N,
    config: NetworkConfig,
    sender: Addr,
}

impl<R, W, N> PoolClient<R, W, N>
where
    R: ChainReader,
    W: ChainWriter,
    N: NotificationSink,
{
    /// Fails if `config` does not pass validation
    pub fn new(reader: R, writer: W, sink: N, config: NetworkConfig, sender: Addr) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(PoolClient {
            reader,
            writer,
            sink,
            config,
            sender,
        })
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn sender(&self) -> &Addr {
        &self.sender
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.sink.notify(notification)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.config.confirmation_timeout_secs)
    }

    /// Refuse to go on unless the wallet is connected to the pool's chain. Asks the user to
    /// switch otherwise
    pub async fn ensure_network(&self) -> Result<(), ClientError> {
        let actual = self.reader.chain_id().await?;
        if actual != self.config.chain_id {
            warn!(expected = %self.config.chain_id, %actual, "wallet connected to the wrong network");
            self.notify(Notification::warning(WRONG_NETWORK));
            return Err(ClientError::WrongNetwork {
                expected: self.config.chain_id.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Parse what the user typed into an amount of a listed asset
    pub fn parse_amount(&self, info: &AssetInfo, input: &str) -> Result<Asset, ClientError> {
        self.config
            .asset(info)?
            .parse_amount(input)
            .map_err(|err| ClientError::InvalidAmount(err.to_string()))
    }

    pub async fn prepare(&self, action: &Action) -> Result<PreparedCall, ClientError> {
        prepare(&self.reader, &self.config, &self.sender, action).await
    }

    /// Whether the call still needs an approval, judged by an allowance read just now
    pub async fn approval_required(&self, call: &PreparedCall) -> Result<bool, ClientError> {
        match &call.approval {
            Some(asset) => {
                let allowance = self.allowance(asset).await?;
                Ok(asset.info.requires_approval(asset.amount, allowance))
            }
            None => Ok(false),
        }
    }

    /// Whether the allowance read just now falls short of what the call draws
    ///
    /// Checked right before submitting. The approval may have been sized above the draw, so the
    /// call goes ahead as long as the allowance still covers what the pool takes.
    pub async fn draw_exceeds_allowance(&self, call: &PreparedCall) -> Result<bool, ClientError> {
        match &call.approval {
            Some(asset) => {
                let allowance = self.allowance(asset).await?;
                Ok(asset.info.requires_approval(call.draw, allowance))
            }
            None => Ok(false),
        }
    }

    /// Build the approval raising the pool's allowance to exactly the amount the call needs
    pub async fn approval_msg(&self, call: &PreparedCall) -> Result<CosmosMsg, ClientError> {
        let asset = call
            .approval
            .as_ref()
            .ok_or_else(|| ClientError::UnsupportedAsset(format!("{:?} needs no approval", call.kind)))?;
        let allowance = self.allowance(asset).await?;
        Ok(asset.increase_allowance_msg(&self.config.pool.contract_addr, allowance)?)
    }

    /// A fresh dialog, for one action at a time
    pub fn dialog(&self) -> Dialog<'_, R, W, N> {
        Dialog::new(self)
    }

    async fn allowance(&self, asset: &Asset) -> Result<Uint128, ClientError> {
        Ok(query_allowance(&self.reader, &asset.info, &self.sender, &self.config.pool.contract_addr).await?)
    }
}
