pub mod idempotency;
pub mod lock;
pub mod memory;
pub mod sweeper;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("coordination backend error: {0}")]
    Backend(String),
}

/// Shared primitive store behind the lock manager and the idempotency cache.
/// Backends must make these operations atomic for arbitrarily many concurrent
/// callers; nothing above this trait holds in-process coordination state.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Atomic create-if-absent with expiry. Returns false while a live entry
    /// already holds the key; an expired entry counts as absent.
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CoordinationError>;

    /// Reads a live entry. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError>;

    /// Deletes the entry only while its stored value still matches.
    async fn compare_and_delete(&self, key: &str, value: &str) -> Result<bool, CoordinationError>;

    /// Drops expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, CoordinationError>;
}
