pub const WRONG_NETWORK: &str = "Please switch to the correct network.";
pub const PREPARE_FAILED: &str = "Could not prepare the transaction. Please retry.";
pub const STILL_PENDING: &str = "Transaction is still pending. Check your wallet before retrying.";
pub const APPROVAL_FAILED: &str = "Approval failed.";
pub const PEKO_SHORTFALL: &str = "Pool hasn't enough PEKO.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// A message shown to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Error,
            message: message.into(),
        }
    }
}

pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

/// Asks the user to grant the allowance again, e.g. `Please approve 12.5 USDC.`
pub fn please_approve(display_amount: &str, ticker: &str) -> String {
    format!("Please approve {} {}.", display_amount, ticker)
}
