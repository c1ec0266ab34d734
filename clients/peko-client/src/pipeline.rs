//! The two-phase transaction flow as a pure state machine
//!
//! An action that moves a CW20 token into the pool first needs the pool to be granted an
//! allowance. The flow is then: submit the approval, wait for it, wait for the new allowance to
//! become visible, check the allowance once more, submit the main call, wait for it. Actions that
//! need no approval start directly at the check.
//!
//! `TxPipeline` only decides transitions and what to tell the user; `Dialog` does the IO and feeds
//! the results back in as `Event`s.

use std::fmt;

use cosmwasm_std::Uint128;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::helpers::{describe_failure, revert_reason};
use crate::notify::{please_approve, Level, Notification, APPROVAL_FAILED, PREPARE_FAILED, STILL_PENDING};
use crate::ports::TxError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PreparingApproval,
    AwaitingApproval,
    /// Approval confirmed; waiting for the allowance read back from the chain to reflect it
    Refreshing,
    PreparingMain,
    AwaitingMain,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Start { approval_required: bool },
    Submitted,
    SubmitFailed(TxError),
    Confirmed,
    Reverted(TxError),
    TimedOut,
    Settled,
    SettleTimedOut,
    /// Result of re-reading the allowance on entering `PreparingMain`
    GateChecked { approval_required: bool },
    /// The main call could not be built or failed simulation, with the reason if there is one
    PrepareFailed(Option<String>),
    /// The user closed the dialog
    Closed,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Submitted => "submitted",
            Event::SubmitFailed(_) => "submit_failed",
            Event::Confirmed => "confirmed",
            Event::Reverted(_) => "reverted",
            Event::TimedOut => "timed_out",
            Event::Settled => "settled",
            Event::SettleTimedOut => "settle_timed_out",
            Event::GateChecked { .. } => "gate_checked",
            Event::PrepareFailed(_) => "prepare_failed",
            Event::Closed => "closed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Deposit,
    Repay,
    Liquidate,
    ClaimProfit,
    ClaimPeko,
}

impl ActionKind {
    pub fn success_message(self) -> &'static str {
        match self {
            ActionKind::Deposit => "Deposited.",
            ActionKind::Repay => "Repaid.",
            ActionKind::Liquidate => "Liquidated.",
            ActionKind::ClaimProfit => "Withdrawn.",
            ActionKind::ClaimPeko => "PEKO claimed.",
        }
    }

    /// Shown when the main call fails without a reason
    pub fn failure_message(self) -> &'static str {
        match self {
            ActionKind::Deposit => "Deposit failed.",
            ActionKind::Repay => "Repay failed.",
            ActionKind::Liquidate => "Liquidation failed.",
            ActionKind::ClaimProfit => "Withdraw failed.",
            ActionKind::ClaimPeko => "Claim failed.",
        }
    }
}

/// The action the user triggered, and how far it got
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub phase: Phase,
    /// Raw amount of the asset that has to be approved, or moved if no approval is involved
    pub amount: Uint128,
    pub display_amount: String,
    pub symbol: String,
    pub last_error: Option<String>,
}

pub struct TxPipeline {
    action: PendingAction,
    loading: bool,
    gate_open: bool,
    warn_on: Vec<(String, String)>,
}

impl TxPipeline {
    pub fn new(
        kind: ActionKind,
        amount: Uint128,
        display_amount: impl Into<String>,
        symbol: impl Into<String>,
    ) -> Self {
        TxPipeline {
            action: PendingAction {
                kind,
                phase: Phase::Idle,
                amount,
                display_amount: display_amount.into(),
                symbol: symbol.into(),
                last_error: None,
            },
            loading: false,
            gate_open: false,
            warn_on: vec![],
        }
    }

    /// Show a main call failing with exactly `reason`, in simulation or on chain, as a warning
    /// reading `message`
    pub fn warn_on(mut self, reason: impl Into<String>, message: impl Into<String>) -> Self {
        self.warn_on.push((reason.into(), message.into()));
        self
    }

    pub fn action(&self) -> &PendingAction {
        &self.action
    }

    pub fn into_action(self) -> PendingAction {
        self.action
    }

    pub fn phase(&self) -> Phase {
        self.action.phase
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the allowance has been re-checked since entering `PreparingMain`
    pub fn gate_open(&self) -> bool {
        self.gate_open
    }

    /// Update the amount after the action was prepared again, e.g. a liquidation whose debt has
    /// accrued interest in the meantime
    pub fn reprice(&mut self, amount: Uint128, display_amount: &str) {
        self.action.amount = amount;
        self.action.display_amount = display_amount.to_string();
    }

    /// Advance by one event, returning what to tell the user, if anything
    pub fn apply(&mut self, event: Event) -> Result<Option<Notification>, ClientError> {
        let phase = self.action.phase;
        let event_name = event.name();

        let (next, notification) = match (phase, event) {
            (Phase::Idle, Event::Start { approval_required }) => {
                self.loading = true;
                let next = if approval_required {
                    Phase::PreparingApproval
                } else {
                    Phase::PreparingMain
                };
                (next, None)
            }

            (Phase::PreparingApproval, Event::Submitted) => (Phase::AwaitingApproval, None),
            (Phase::PreparingApproval, Event::SubmitFailed(err))
            | (Phase::AwaitingApproval, Event::Reverted(err)) => {
                (Phase::Failed, Some(Notification::error(describe_failure(&err, APPROVAL_FAILED))))
            }
            (Phase::AwaitingApproval, Event::Confirmed) => (Phase::Refreshing, None),

            (Phase::AwaitingApproval, Event::TimedOut) | (Phase::AwaitingMain, Event::TimedOut) => {
                (Phase::Failed, Some(Notification::warning(STILL_PENDING)))
            }

            (Phase::Refreshing, Event::Settled) => (Phase::PreparingMain, None),
            (Phase::Refreshing, Event::SettleTimedOut)
            | (Phase::PreparingMain, Event::GateChecked { approval_required: true }) => {
                (Phase::Failed, Some(Notification::warning(self.please_approve())))
            }

            (Phase::PreparingMain, Event::GateChecked { approval_required: false }) => {
                self.gate_open = true;
                (Phase::PreparingMain, None)
            }
            (Phase::PreparingMain, Event::PrepareFailed(reason)) => {
                let notification = match reason.filter(|reason| !reason.is_empty()) {
                    Some(reason) => self.downgraded(&reason).unwrap_or_else(|| Notification::error(reason)),
                    None => Notification::error(PREPARE_FAILED),
                };
                (Phase::Failed, Some(notification))
            }
            (Phase::PreparingMain, Event::Submitted) if self.gate_open => (Phase::AwaitingMain, None),
            (Phase::PreparingMain, Event::SubmitFailed(err))
            | (Phase::AwaitingMain, Event::Reverted(err)) => (Phase::Failed, Some(self.main_failure(&err))),

            (Phase::AwaitingMain, Event::Confirmed) => {
                (Phase::Succeeded, Some(Notification::success(self.action.kind.success_message())))
            }

            (phase, Event::Closed) if !phase.is_terminal() => (Phase::Failed, None),

            (phase, _) => {
                return Err(ClientError::InvalidTransition {
                    phase: phase.to_string(),
                    event: event_name.to_string(),
                });
            }
        };

        debug!(from = %phase, to = %next, event = event_name, "transition");

        if next != phase {
            self.gate_open = false;
        }
        self.action.phase = next;

        if let Some(notification) = &notification {
            if notification.level != Level::Success {
                self.action.last_error = Some(notification.message.clone());
            }
        }

        if next.is_terminal() {
            self.loading = false;
            match next {
                Phase::Succeeded => info!(kind = ?self.action.kind, "action succeeded"),
                _ => warn!(kind = ?self.action.kind, from = %phase, "action failed"),
            }
        }

        Ok(notification)
    }

    fn please_approve(&self) -> String {
        please_approve(&self.action.display_amount, &self.action.symbol.to_uppercase())
    }

    fn main_failure(&self, err: &TxError) -> Notification {
        revert_reason(err)
            .and_then(|reason| self.downgraded(&reason))
            .unwrap_or_else(|| Notification::error(describe_failure(err, self.action.kind.failure_message())))
    }

    fn downgraded(&self, reason: &str) -> Option<Notification> {
        self.warn_on
            .iter()
            .find(|(warn_reason, _)| warn_reason == reason)
            .map(|(_, message)| Notification::warning(message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::PEKO_SHORTFALL;

    fn usdc_deposit() -> TxPipeline {
        TxPipeline::new(ActionKind::Deposit, Uint128::new(12_500_000), "12.5", "usdc")
    }

    fn apply_all(pipeline: &mut TxPipeline, events: Vec<Event>) -> Vec<Notification> {
        events
            .into_iter()
            .filter_map(|event| pipeline.apply(event).unwrap())
            .collect()
    }

    #[test]
    fn running_through_both_phases() {
        let mut pipeline = usdc_deposit();
        assert!(!pipeline.is_loading());

        pipeline.apply(Event::Start { approval_required: true }).unwrap();
        assert_eq!(pipeline.phase(), Phase::PreparingApproval);
        assert!(pipeline.is_loading());

        let notifications = apply_all(
            &mut pipeline,
            vec![
                Event::Submitted,
                Event::Confirmed,
                Event::Settled,
                Event::GateChecked { approval_required: false },
                Event::Submitted,
            ],
        );
        assert!(notifications.is_empty());
        assert_eq!(pipeline.phase(), Phase::AwaitingMain);
        assert!(pipeline.is_loading());

        let notification = pipeline.apply(Event::Confirmed).unwrap();
        assert_eq!(notification, Some(Notification::success("Deposited.")));
        assert_eq!(pipeline.phase(), Phase::Succeeded);
        assert!(!pipeline.is_loading());
        assert_eq!(pipeline.action().last_error, None);
    }

    #[test]
    fn main_submission_requires_a_fresh_gate_check() {
        let mut pipeline = usdc_deposit();
        apply_all(&mut pipeline, vec![Event::Start { approval_required: false }]);
        assert_eq!(pipeline.phase(), Phase::PreparingMain);
        assert!(!pipeline.gate_open());

        let err = pipeline.apply(Event::Submitted).unwrap_err();
        assert_eq!(
            err,
            ClientError::InvalidTransition {
                phase: "PreparingMain".to_string(),
                event: "submitted".to_string(),
            }
        );
        assert_eq!(pipeline.phase(), Phase::PreparingMain);

        // a gate check from before the approval does not carry over
        let mut pipeline = usdc_deposit();
        apply_all(
            &mut pipeline,
            vec![
                Event::Start { approval_required: true },
                Event::Submitted,
                Event::Confirmed,
                Event::Settled,
            ],
        );
        assert!(!pipeline.gate_open());
        assert!(pipeline.apply(Event::Submitted).is_err());
    }

    #[test]
    fn gate_still_closed_after_approval() {
        let mut pipeline = usdc_deposit();
        let notifications = apply_all(
            &mut pipeline,
            vec![
                Event::Start { approval_required: true },
                Event::Submitted,
                Event::Confirmed,
                Event::Settled,
                Event::GateChecked { approval_required: true },
            ],
        );
        assert_eq!(notifications, vec![Notification::warning("Please approve 12.5 USDC.")]);
        assert_eq!(pipeline.phase(), Phase::Failed);
        assert_eq!(pipeline.action().last_error.as_deref(), Some("Please approve 12.5 USDC."));
    }

    #[test]
    fn every_path_ends_in_one_terminal_state() {
        let paths = vec![
            vec![Event::Start { approval_required: true }, Event::SubmitFailed(TxError::default())],
            vec![Event::Start { approval_required: true }, Event::Submitted, Event::Reverted(TxError::default())],
            vec![Event::Start { approval_required: true }, Event::Submitted, Event::TimedOut],
            vec![Event::Start { approval_required: true }, Event::Submitted, Event::Confirmed, Event::SettleTimedOut],
            vec![Event::Start { approval_required: false }, Event::PrepareFailed(None)],
            vec![
                Event::Start { approval_required: false },
                Event::GateChecked { approval_required: false },
                Event::SubmitFailed(TxError::local("User rejected the request.")),
            ],
            vec![
                Event::Start { approval_required: false },
                Event::GateChecked { approval_required: false },
                Event::Submitted,
                Event::Reverted(TxError::reverted("Not enough collateral")),
            ],
            vec![
                Event::Start { approval_required: false },
                Event::GateChecked { approval_required: false },
                Event::Submitted,
                Event::TimedOut,
            ],
            vec![Event::Start { approval_required: true }, Event::Submitted, Event::Closed],
        ];

        for events in paths {
            let mut pipeline = usdc_deposit();
            let last = events.len() - 1;
            for (i, event) in events.into_iter().enumerate() {
                pipeline.apply(event).unwrap();
                assert_eq!(pipeline.phase().is_terminal(), i == last);
            }
            assert_eq!(pipeline.phase(), Phase::Failed);
            assert!(!pipeline.is_loading());

            // nothing moves it out of the terminal state
            for event in [Event::Confirmed, Event::Closed, Event::Start { approval_required: false }] {
                assert!(pipeline.apply(event).is_err());
                assert_eq!(pipeline.phase(), Phase::Failed);
                assert!(!pipeline.is_loading());
            }
        }
    }

    #[test]
    fn telling_the_user_what_failed() {
        let mut pipeline = usdc_deposit();
        let notifications = apply_all(
            &mut pipeline,
            vec![Event::Start { approval_required: true }, Event::Submitted, Event::Reverted(TxError::default())],
        );
        assert_eq!(notifications, vec![Notification::error("Approval failed.")]);

        let mut pipeline = usdc_deposit();
        let notifications = apply_all(
            &mut pipeline,
            vec![
                Event::Start { approval_required: false },
                Event::GateChecked { approval_required: false },
                Event::Submitted,
                Event::Reverted(TxError::reverted("Deposit amount exceeds cap")),
            ],
        );
        assert_eq!(notifications, vec![Notification::error("Deposit amount exceeds cap")]);

        let mut pipeline = usdc_deposit();
        let notifications = apply_all(
            &mut pipeline,
            vec![Event::Start { approval_required: false }, Event::PrepareFailed(Some(String::new()))],
        );
        assert_eq!(notifications, vec![Notification::error(PREPARE_FAILED)]);

        let mut pipeline = usdc_deposit();
        let notifications = apply_all(
            &mut pipeline,
            vec![Event::Start { approval_required: true }, Event::Submitted, Event::TimedOut],
        );
        assert_eq!(notifications, vec![Notification::warning(STILL_PENDING)]);
    }

    #[test]
    fn closing_is_silent() {
        let mut pipeline = usdc_deposit();
        pipeline.apply(Event::Start { approval_required: true }).unwrap();
        assert_eq!(pipeline.apply(Event::Closed).unwrap(), None);
        assert_eq!(pipeline.phase(), Phase::Failed);
        assert_eq!(pipeline.action().last_error, None);
    }

    #[test]
    fn downgrading_known_reasons_to_warnings() {
        let mut pipeline = TxPipeline::new(ActionKind::ClaimPeko, Uint128::new(42), "0.000000000000000042", "peko")
            .warn_on("Insufficient PEKO balance", PEKO_SHORTFALL);

        let notifications = apply_all(
            &mut pipeline,
            vec![
                Event::Start { approval_required: false },
                Event::GateChecked { approval_required: false },
                Event::Submitted,
                Event::Reverted(TxError::reverted("Insufficient PEKO balance")),
            ],
        );
        assert_eq!(notifications, vec![Notification::warning("Pool hasn't enough PEKO.")]);

        let mut pipeline = TxPipeline::new(ActionKind::ClaimPeko, Uint128::new(42), "0.000000000000000042", "peko")
            .warn_on("Insufficient PEKO balance", PEKO_SHORTFALL);
        let notifications = apply_all(
            &mut pipeline,
            vec![
                Event::Start { approval_required: false },
                Event::PrepareFailed(Some("Insufficient PEKO balance".to_string())),
            ],
        );
        assert_eq!(notifications, vec![Notification::warning("Pool hasn't enough PEKO.")]);
        assert_eq!(pipeline.action().last_error.as_deref(), Some("Pool hasn't enough PEKO."));

        // other reasons are still errors
        let mut pipeline = TxPipeline::new(ActionKind::ClaimPeko, Uint128::new(42), "0.000000000000000042", "peko")
            .warn_on("Insufficient PEKO balance", PEKO_SHORTFALL);
        let notifications = apply_all(
            &mut pipeline,
            vec![
                Event::Start { approval_required: false },
                Event::PrepareFailed(Some("Paused".to_string())),
            ],
        );
        assert_eq!(notifications, vec![Notification::error("Paused")]);
    }
}
