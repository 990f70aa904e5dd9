pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::leg::Leg;
use crate::models::order::Order;

/// An order together with its full leg history. Loaded and committed as one
/// unit so no caller ever observes a partially applied order/leg update.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order: Order,
    pub legs: Vec<Leg>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates a new order record; visible atomically once this returns.
    async fn insert(&self, record: OrderRecord) -> Result<(), StorageError>;

    /// Atomic snapshot of the order and all of its legs.
    async fn load(&self, order_id: Uuid) -> Result<OrderRecord, StorageError>;

    /// Replaces the order and its legs in a single atomic commit.
    async fn commit(&self, record: OrderRecord) -> Result<(), StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;
}
