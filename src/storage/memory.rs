use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::storage::{OrderRecord, OrderStore, StorageError};

/// In-memory order store. Each record occupies one map entry and is replaced
/// wholesale on commit, which gives the atomic order+legs visibility the
/// orchestrator relies on.
pub struct MemoryOrderStore {
    records: DashMap<Uuid, OrderRecord>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, record: OrderRecord) -> Result<(), StorageError> {
        self.records.insert(record.order.id, record);
        Ok(())
    }

    async fn load(&self, order_id: Uuid) -> Result<OrderRecord, StorageError> {
        self.records
            .get(&order_id)
            .map(|entry| entry.value().clone())
            .ok_or(StorageError::NotFound)
    }

    async fn commit(&self, record: OrderRecord) -> Result<(), StorageError> {
        match self.records.get_mut(&record.order.id) {
            Some(mut entry) => {
                *entry = record;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::MemoryOrderStore;
    use crate::models::order::{Order, OrderStatus};
    use crate::storage::{OrderRecord, OrderStore, StorageError};

    fn record(id: Uuid) -> OrderRecord {
        let now = Utc::now();
        OrderRecord {
            order: Order {
                id,
                status: OrderStatus::Created,
                current_rider: None,
                created_at: now,
                updated_at: now,
            },
            legs: Vec::new(),
        }
    }

    #[tokio::test]
    async fn insert_then_load_roundtrips() {
        let store = MemoryOrderStore::new();
        let id = Uuid::new_v4();

        store.insert(record(id)).await.unwrap();

        let loaded = store.load(id).await.unwrap();
        assert_eq!(loaded.order.id, id);
        assert!(loaded.legs.is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn load_unknown_order_is_not_found() {
        let store = MemoryOrderStore::new();
        let result = store.load(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }

    #[tokio::test]
    async fn commit_replaces_order_and_legs_together() {
        let store = MemoryOrderStore::new();
        let id = Uuid::new_v4();
        store.insert(record(id)).await.unwrap();

        let mut updated = store.load(id).await.unwrap();
        updated.order.status = OrderStatus::InProgress;
        updated.order.current_rider = Some(Uuid::new_v4());
        store.commit(updated).await.unwrap();

        let loaded = store.load(id).await.unwrap();
        assert_eq!(loaded.order.status, OrderStatus::InProgress);
        assert!(loaded.order.current_rider.is_some());
    }

    #[tokio::test]
    async fn commit_unknown_order_is_not_found() {
        let store = MemoryOrderStore::new();
        let result = store.commit(record(Uuid::new_v4())).await;
        assert!(matches!(result, Err(StorageError::NotFound)));
    }
}
