use tracing::{info, warn};

use crate::contract::Notifier;
use crate::format::clamp_chars;

/// Longest message the chat API accepts.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Sends `text` and reports whether it was delivered. Failures are logged and
/// never reach the caller.
pub async fn notify_best_effort<N: Notifier + ?Sized>(notifier: &N, text: &str) -> bool {
    let text = clamp_chars(text, MAX_MESSAGE_LEN);
    match notifier.notify(&text).await {
        Ok(()) => {
            info!("Notification sent");
            true
        }
        Err(e) => {
            warn!(error = %e, "Notification failed");
            false
        }
    }
}
