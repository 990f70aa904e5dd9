use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::coordination::{CoordinationError, CoordinationStore};

struct StoredEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory coordination backend. Expired entries are treated as absent on
/// read and reclaimed either on the next write to the same key or by the
/// background sweeper.
pub struct MemoryCoordinationStore {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryCoordinationStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for MemoryCoordinationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordinationStore for MemoryCoordinationStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CoordinationError> {
        let now = Instant::now();
        let fresh = StoredEntry {
            value: value.to_string(),
            expires_at: now + ttl,
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    occupied.insert(fresh);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };

        if entry.expires_at <= Instant::now() {
            return Ok(None);
        }

        Ok(Some(entry.value.clone()))
    }

    async fn compare_and_delete(&self, key: &str, value: &str) -> Result<bool, CoordinationError> {
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.value == value)
            .is_some();

        Ok(removed)
    }

    async fn purge_expired(&self) -> Result<usize, CoordinationError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);

        Ok(before.saturating_sub(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::MemoryCoordinationStore;
    use crate::coordination::CoordinationStore;

    const LONG: Duration = Duration::from_secs(30);
    const SHORT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn create_if_absent_is_first_writer_wins() {
        let store = MemoryCoordinationStore::new();

        assert!(store.create_if_absent("k", "a", LONG).await.unwrap());
        assert!(!store.create_if_absent("k", "b", LONG).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_counts_as_absent() {
        let store = MemoryCoordinationStore::new();

        assert!(store.create_if_absent("k", "a", SHORT).await.unwrap());
        tokio::time::sleep(SHORT * 3).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.create_if_absent("k", "b", LONG).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn compare_and_delete_requires_matching_value() {
        let store = MemoryCoordinationStore::new();
        store.create_if_absent("k", "a", LONG).await.unwrap();

        assert!(!store.compare_and_delete("k", "other").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("a".to_string()));

        assert!(store.compare_and_delete("k", "a").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_expired_reports_removed_entries() {
        let store = MemoryCoordinationStore::new();
        store.create_if_absent("dead", "a", SHORT).await.unwrap();
        store.create_if_absent("live", "b", LONG).await.unwrap();
        tokio::time::sleep(SHORT * 3).await;

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.get("live").await.unwrap(), Some("b".to_string()));
    }
}
