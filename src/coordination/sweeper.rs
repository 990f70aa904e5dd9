use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::state::AppState;

/// Periodic cleanup of expired lock and idempotency entries. Advisory only:
/// reads already treat expired entries as absent.
pub async fn run_expiry_sweeper(state: Arc<AppState>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "expiry sweeper started");

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match state.coordination.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "expired coordination entries purged"),
            Err(err) => warn!(error = %err, "expiry sweep failed"),
        }
    }
}
