// =============================================================================
// Signal poller — periodic refresh of the active signal set
// =============================================================================
//
// Runs independently of chart requests. Each successful poll replaces the
// stored set wholesale; a failed poll (after retries) leaves the previous set
// in place and lands in the dashboard error log.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::app_state::AppState;
use crate::error::FetchError;

/// User-facing message for a failed signal refresh.
pub const SIGNAL_FETCH_FAILED: &str = "Failed to fetch signals.";

/// Fetch a new batch and store it. Returns the number of active signals.
pub async fn refresh_signals(state: &AppState) -> Result<usize, FetchError> {
    match state.feed.fetch_signals().await {
        Ok(signals) => {
            let count = signals.len();
            state.replace_signals(signals);
            info!(count, "active signals refreshed");
            Ok(count)
        }
        Err(e) => {
            warn!(error = %e, "signal refresh failed");
            state.push_error_with_code(SIGNAL_FETCH_FAILED.to_string(), Some("signals".into()));
            Err(e)
        }
    }
}

/// Refresh immediately, then every `every` until the task is dropped.
pub async fn run_signal_poller(state: Arc<AppState>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        // Failures are already logged and recorded.
        let _ = refresh_signals(&state).await;
    }
}
