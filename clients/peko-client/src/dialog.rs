use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cosmwasm_std::Addr;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use peko_pool::adapters::AssetInfo;

use crate::actions::{Action, PreparedCall};
use crate::client::PoolClient;
use crate::error::ClientError;
use crate::helpers::revert_reason;
use crate::notify::{NotificationSink, PEKO_SHORTFALL};
use crate::pipeline::{ActionKind, Event, PendingAction, Phase, TxPipeline};
use crate::ports::{ChainReader, ChainWriter, TxError};
use crate::step::{StepOutcome, TxStep};

/// Held while an action runs; releases the loading flag however the run ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ClientError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::Busy)?;
        Ok(LoadingGuard(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the actions the user triggers in one dialog, one at a time
///
/// Drives a `TxPipeline`: performs the IO each phase calls for and feeds the result back in,
/// forwarding whatever the pipeline wants the user to know to the notification sink.
pub struct Dialog<'a, R, W, N> {
    client: &'a PoolClient<R, W, N>,
    loading: AtomicBool,
    closed: AtomicBool,
}

impl<'a, R, W, N> Dialog<'a, R, W, N>
where
    R: ChainReader,
    W: ChainWriter,
    N: NotificationSink,
{
    pub fn new(client: &'a PoolClient<R, W, N>) -> Self {
        Dialog {
            client,
            loading: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close the dialog. A running action stops at its next step and ends silently; a
    /// transaction already broadcast is not recalled
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    //----------------------------------------------------------------------------------------------
    // Actions
    //----------------------------------------------------------------------------------------------

    pub async fn deposit(&self, info: &AssetInfo, amount: &str) -> Result<PendingAction, ClientError> {
        let asset = self.client.parse_amount(info, amount)?;
        self.run(Action::Deposit(asset)).await
    }

    pub async fn repay(&self, info: &AssetInfo, amount: &str) -> Result<PendingAction, ClientError> {
        let asset = self.client.parse_amount(info, amount)?;
        self.run(Action::Repay(asset)).await
    }

    pub async fn claim_profit(&self, info: &AssetInfo, amount: &str) -> Result<PendingAction, ClientError> {
        let asset = self.client.parse_amount(info, amount)?;
        self.run(Action::ClaimProfit(asset)).await
    }

    pub async fn claim_peko(&self) -> Result<PendingAction, ClientError> {
        self.run(Action::ClaimPeko).await
    }

    pub async fn liquidate(&self, account: &Addr) -> Result<PendingAction, ClientError> {
        self.run(Action::Liquidate {
            account: account.clone(),
        })
        .await
    }

    /// Run an action to its end
    ///
    /// Errors are returned only when the action never started: the dialog is busy or closed, the
    /// wallet is on another network, or the action is invalid. Once started, the action always
    /// ends in `Succeeded` or `Failed`, which the returned `PendingAction` reports.
    pub async fn run(&self, action: Action) -> Result<PendingAction, ClientError> {
        let _loading = LoadingGuard::acquire(&self.loading)?;
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        self.client.ensure_network().await?;

        let mut call = self.client.prepare(&action).await?;
        let approval_required = self.client.approval_required(&call).await?;

        let mut pipeline = self.pipeline_for(&call);
        info!(kind = ?call.kind, amount = %call.amount, symbol = %call.symbol, approval_required, "starting action");
        self.apply(&mut pipeline, Event::Start { approval_required })?;

        let mut step = TxStep::default();
        while !pipeline.phase().is_terminal() {
            let event = if self.is_closed() {
                Event::Closed
            } else {
                self.next_event(&mut pipeline, &action, &mut call, &mut step).await
            };
            // the dialog may have been closed while waiting
            let event = if self.is_closed() {
                Event::Closed
            } else {
                event
            };
            self.apply(&mut pipeline, event)?;
        }

        Ok(pipeline.into_action())
    }

    fn pipeline_for(&self, call: &PreparedCall) -> TxPipeline {
        let pipeline = TxPipeline::new(call.kind, call.amount, call.display_amount.clone(), call.symbol.clone());
        match call.kind {
            ActionKind::ClaimPeko => pipeline.warn_on(self.client.config().peko_shortfall_reason.clone(), PEKO_SHORTFALL),
            _ => pipeline,
        }
    }

    fn apply(&self, pipeline: &mut TxPipeline, event: Event) -> Result<(), ClientError> {
        if let Some(notification) = pipeline.apply(event)? {
            if !self.is_closed() {
                self.client.notify(notification);
            }
        }
        Ok(())
    }

    /// Perform the IO the current phase calls for
    async fn next_event(
        &self,
        pipeline: &mut TxPipeline,
        action: &Action,
        call: &mut PreparedCall,
        step: &mut TxStep,
    ) -> Event {
        let writer = self.client.writer();

        match pipeline.phase() {
            Phase::PreparingApproval => match self.client.approval_msg(call).await {
                Ok(msg) => submitted(step.submit(writer, &msg).await),
                Err(err) => {
                    warn!(error = %err, "failed to build approval");
                    Event::SubmitFailed(TxError::default())
                }
            },

            Phase::AwaitingApproval | Phase::AwaitingMain => {
                match step.await_outcome(writer, self.client.confirmation_timeout()).await {
                    StepOutcome::Confirmed => Event::Confirmed,
                    StepOutcome::Reverted(err) => Event::Reverted(err),
                    StepOutcome::TimedOut => Event::TimedOut,
                }
            }

            Phase::Refreshing => self.settle(call).await,

            // re-read state and the allowance on every entry, then submit once the gate is open
            Phase::PreparingMain if !pipeline.gate_open() => {
                match self.refresh(action).await {
                    Ok((fresh, approval_required)) => {
                        // ask for the fresh amount only when the approved one no longer covers the draw
                        if approval_required {
                            pipeline.reprice(fresh.amount, &fresh.display_amount);
                        }
                        *call = fresh;
                        Event::GateChecked { approval_required }
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to prepare transaction");
                        Event::PrepareFailed(Some(err.to_string()))
                    }
                }
            }

            Phase::PreparingMain => {
                match self.client.reader().simulate(self.client.sender(), &call.msg).await {
                    Ok(()) => submitted(step.submit(writer, &call.msg).await),
                    Err(err) => {
                        debug!(?err, "simulation failed");
                        Event::PrepareFailed(revert_reason(&err))
                    }
                }
            }

            Phase::Idle | Phase::Succeeded | Phase::Failed => Event::Closed,
        }
    }

    async fn refresh(&self, action: &Action) -> Result<(PreparedCall, bool), ClientError> {
        let call = self.client.prepare(action).await?;
        let approval_required = self.client.draw_exceeds_allowance(&call).await?;
        Ok((call, approval_required))
    }

    /// Poll the allowance until it reflects the confirmed approval, within the settle policy
    async fn settle(&self, call: &PreparedCall) -> Event {
        let policy = &self.client.config().settle;
        sleep(Duration::from_millis(policy.initial_delay_ms)).await;

        for attempt in 1..=policy.max_polls {
            if attempt > 1 {
                sleep(Duration::from_millis(policy.poll_interval_ms)).await;
            }
            if self.is_closed() {
                return Event::Closed;
            }

            match self.client.approval_required(call).await {
                Ok(false) => {
                    debug!(attempt, "allowance settled");
                    return Event::Settled;
                }
                Ok(true) => debug!(attempt, "allowance not visible yet"),
                Err(err) => warn!(attempt, error = %err, "failed to read allowance"),
            }
        }

        Event::SettleTimedOut
    }
}

fn submitted<T>(result: Result<T, TxError>) -> Event {
    match result {
        Ok(_) => Event::Submitted,
        Err(err) => Event::SubmitFailed(err),
    }
}
