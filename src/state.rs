use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::coordination::CoordinationStore;
use crate::coordination::idempotency::IdempotencyCache;
use crate::coordination::lock::LockManager;
use crate::coordination::memory::MemoryCoordinationStore;
use crate::models::handoff::HandoffEvent;
use crate::observability::metrics::Metrics;
use crate::storage::OrderStore;
use crate::storage::memory::MemoryOrderStore;

pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub coordination: Arc<dyn CoordinationStore>,
    pub locks: LockManager,
    pub idempotency: IdempotencyCache,
    pub handoff_events_tx: broadcast::Sender<HandoffEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let coordination: Arc<dyn CoordinationStore> = Arc::new(MemoryCoordinationStore::new());
        let (handoff_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            store: Arc::new(MemoryOrderStore::new()),
            locks: LockManager::new(
                coordination.clone(),
                Duration::from_secs(config.lock_ttl_secs),
            ),
            idempotency: IdempotencyCache::new(
                coordination.clone(),
                Duration::from_secs(config.idempotency_ttl_secs),
            ),
            coordination,
            handoff_events_tx,
            metrics: Metrics::new(),
        }
    }
}
