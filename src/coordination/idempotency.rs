use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::coordination::{CoordinationError, CoordinationStore};

/// The fully materialized response produced the first time a deduplication
/// key was seen. Replays return it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

/// Deduplication layer keyed by order id + action + client dedup key, so the
/// same client key on a different operation never collides.
pub struct IdempotencyCache {
    store: Arc<dyn CoordinationStore>,
    ttl: Duration,
}

impl IdempotencyCache {
    pub fn new(store: Arc<dyn CoordinationStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(order_id: Uuid, action: &str, dedup_key: &str) -> String {
        format!("idem:{order_id}:{action}:{dedup_key}")
    }

    pub async fn lookup(
        &self,
        order_id: Uuid,
        action: &str,
        dedup_key: &str,
    ) -> Result<Option<CachedResponse>, CoordinationError> {
        let key = Self::key(order_id, action, dedup_key);

        match self.store.get(&key).await? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|err| {
                CoordinationError::Backend(format!("corrupt idempotency entry {key}: {err}"))
            }),
            None => Ok(None),
        }
    }

    /// Create-if-absent: the first writer wins and later writers are dropped,
    /// which only occurs when a retry raced past an expiring entry.
    pub async fn store(
        &self,
        order_id: Uuid,
        action: &str,
        dedup_key: &str,
        response: &CachedResponse,
    ) -> Result<(), CoordinationError> {
        let key = Self::key(order_id, action, dedup_key);
        let raw = serde_json::to_string(response)
            .map_err(|err| CoordinationError::Backend(format!("serialize response: {err}")))?;

        let stored = self.store.create_if_absent(&key, &raw, self.ttl).await?;
        if !stored {
            debug!(key = %key, "idempotency entry already present; keeping first writer");
        }

        Ok(())
    }
}
