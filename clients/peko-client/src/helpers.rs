use tracing::warn;

use crate::ports::TxError;

/// Extract a human-readable reason from a failed transaction
///
/// Prefers the structured revert reason, then the wallet's short message. Empty strings count as
/// absent.
pub fn revert_reason(err: &TxError) -> Option<String> {
    err.cause
        .as_ref()
        .and_then(|cause| cause.reason.as_deref())
        .filter(|reason| !reason.is_empty())
        .or_else(|| err.short_message.as_deref().filter(|msg| !msg.is_empty()))
        .map(str::to_string)
}

/// Text to show for a failed transaction; `fallback` when the error carries no reason
pub fn describe_failure(err: &TxError, fallback: &str) -> String {
    match revert_reason(err) {
        Some(reason) => reason,
        None => {
            warn!(?err, "transaction failed without a reason");
            fallback.to_string()
        }
    }
}
