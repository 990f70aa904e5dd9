use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;
use uuid::Uuid;

use crate::coordination::{CoordinationError, CoordinationStore};

// Waits before the second and third acquisition attempts. Three attempts
// total; exhausting them reports Busy.
const RETRY_BACKOFF: [Duration; 2] = [Duration::from_millis(50), Duration::from_millis(100)];

/// Proof of one specific lock acquisition; required to release it.
#[derive(Debug, Clone)]
pub struct LockToken(String);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock busy")]
    Busy,

    #[error(transparent)]
    Store(#[from] CoordinationError),
}

/// Per-order mutual exclusion over the coordination store. The TTL is the
/// sole crash-recovery mechanism: a holder that dies self-heals once its
/// entry expires. No queueing or fairness beyond the retry schedule.
pub struct LockManager {
    store: Arc<dyn CoordinationStore>,
    ttl: Duration,
}

impl LockManager {
    pub fn new(store: Arc<dyn CoordinationStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(order_id: Uuid) -> String {
        format!("lock:{order_id}")
    }

    pub async fn acquire(&self, order_id: Uuid) -> Result<LockToken, LockError> {
        let key = Self::key(order_id);
        let token = Uuid::new_v4().to_string();

        for attempt in 0..=RETRY_BACKOFF.len() {
            if attempt > 0 {
                sleep(RETRY_BACKOFF[attempt - 1]).await;
            }

            if self.store.create_if_absent(&key, &token, self.ttl).await? {
                return Ok(LockToken(token));
            }
        }

        Err(LockError::Busy)
    }

    /// Compare-and-delete: a token that no longer matches (the lock expired
    /// and was re-acquired by someone else) leaves the current holder intact.
    pub async fn release(&self, order_id: Uuid, token: &LockToken) -> Result<(), CoordinationError> {
        let released = self
            .store
            .compare_and_delete(&Self::key(order_id), &token.0)
            .await?;

        if !released {
            warn!(order_id = %order_id, "lock expired before release; skipping");
        }

        Ok(())
    }
}
