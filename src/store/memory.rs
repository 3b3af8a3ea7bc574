//! In-memory item store.
//!
//! Behaves like the hosted table for the operations the API uses, without any
//! network access. Used by the router tests and by `serve --memory`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use crate::error::StoreError;
use crate::item::{Item, ItemId, ItemPatch, NewItem, Status};

use super::ItemStore;

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// When set, every call fails with this store message.
    pub fail_with: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

/// In-memory item store with serial ids.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    config: MockConfig,
    rows: Arc<DashMap<i64, Item>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a store with custom failure/latency behavior.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            rows: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert a fully formed row, bypassing id generation. Seeds fixtures with
    /// fixed `created_at` values.
    ///
    /// Rows are keyed by serial integers, so a text id is rejected. A seeded
    /// id replaces any row already stored under it.
    pub fn seed(&self, item: Item) -> Result<(), StoreError> {
        let id = match &item.id {
            ItemId::Int(id) => *id,
            ItemId::Text(text) => return Err(StoreError::InvalidId(text.clone())),
        };
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
        self.rows.insert(id, item);
        Ok(())
    }

    async fn simulate(&self) -> Result<(), StoreError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        match &self.config.fail_with {
            Some(message) => Err(StoreError::Remote {
                code: None,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn key(id: &str) -> Result<i64, StoreError> {
        id.trim().parse().map_err(|_| StoreError::NotFound)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn insert(&self, item: NewItem) -> Result<Item, StoreError> {
        self.simulate().await?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let row = item.into_item(ItemId::Int(id), OffsetDateTime::now_utc());
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn list(&self, status: Option<Status>) -> Result<Vec<Item>, StoreError> {
        self.simulate().await?;

        let mut rows: Vec<(i64, Item)> = self
            .rows
            .iter()
            .filter(|entry| status.map_or(true, |s| entry.value().status == s))
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        // Newest first; serial id breaks ties.
        rows.sort_by(|(a_id, a), (b_id, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_id.cmp(a_id))
        });

        Ok(rows.into_iter().map(|(_, item)| item).collect())
    }

    async fn get(&self, id: &str) -> Result<Item, StoreError> {
        self.simulate().await?;

        let key = Self::key(id)?;
        self.rows
            .get(&key)
            .map(|row| row.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: &str, patch: ItemPatch) -> Result<Item, StoreError> {
        self.simulate().await?;

        let key = Self::key(id)?;
        let mut row = self.rows.get_mut(&key).ok_or(StoreError::NotFound)?;
        patch.apply(row.value_mut());
        Ok(row.value().clone())
    }

    async fn delete(&self, id: &str) -> Result<Item, StoreError> {
        self.simulate().await?;

        let key = Self::key(id)?;
        self.rows
            .remove(&key)
            .map(|(_, item)| item)
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    fn new_item(name: &str, status: Status) -> NewItem {
        let now = OffsetDateTime::now_utc();
        NewItem {
            customer_name: name.to_string(),
            brand: None,
            size: None,
            service_type: "Wash".to_string(),
            status,
            checkin_date: now,
            promised_date: None,
            price: None,
            note: None,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_assigns_serial_ids() {
        let store = MemoryStore::new();
        let a = store.insert(new_item("a", Status::Waiting)).await.unwrap();
        let b = store.insert(new_item("b", Status::Waiting)).await.unwrap();

        assert_eq!(a.id, ItemId::Int(1));
        assert_eq!(b.id, ItemId::Int(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let store = MemoryStore::new();
        let base = new_item("x", Status::InProgress)
            .into_item(ItemId::Int(1), datetime!(2024-01-01 0:00 UTC));
        store.seed(base.clone()).unwrap();
        store
            .seed(Item {
                id: ItemId::Int(2),
                created_at: datetime!(2024-03-01 0:00 UTC),
                ..base.clone()
            })
            .unwrap();
        store
            .seed(Item {
                id: ItemId::Int(3),
                status: Status::Done,
                created_at: datetime!(2024-02-01 0:00 UTC),
                ..base
            })
            .unwrap();

        let all = store.list(None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, ["2", "3", "1"]);

        let in_progress = store.list(Some(Status::InProgress)).await.unwrap();
        let ids: Vec<_> = in_progress.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, ["2", "1"]);

        // Seeding keeps the id counter ahead of fixtures.
        let next = store.insert(new_item("y", Status::Waiting)).await.unwrap();
        assert_eq!(next.id, ItemId::Int(4));
    }

    #[test]
    fn seed_rejects_text_ids() {
        let store = MemoryStore::new();
        let row = new_item("a", Status::Waiting)
            .into_item(ItemId::Text("abc".to_string()), OffsetDateTime::now_utc());

        let err = store.seed(row).unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(ref id) if id == "abc"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn seed_at_max_id_does_not_overflow() {
        let store = MemoryStore::new();
        let row = new_item("a", Status::Waiting)
            .into_item(ItemId::Int(i64::MAX), OffsetDateTime::now_utc());

        store.seed(row).unwrap();
        assert_eq!(store.len(), 1);
        let fetched = store.get(&i64::MAX.to_string()).await.unwrap();
        assert_eq!(fetched.id, ItemId::Int(i64::MAX));
    }

    #[tokio::test]
    async fn single_row_operations_report_missing_rows() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("1").await, Err(StoreError::NotFound)));
        assert!(matches!(store.get("not-a-number").await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.update("1", ItemPatch::touch(OffsetDateTime::now_utc())).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.delete("1").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let store = MemoryStore::new();
        let created = store.insert(new_item("a", Status::Waiting)).await.unwrap();

        let mut patch = ItemPatch::touch(OffsetDateTime::now_utc());
        patch.price = Some(Some(dec!(15000)));
        let updated = store.update("1", patch).await.unwrap();
        assert_eq!(updated.price, Some(dec!(15000)));
        assert_eq!(updated.created_at, created.created_at);

        let deleted = store.delete("1").await.unwrap();
        assert_eq!(deleted, updated);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failure_mode_returns_store_error() {
        let store = MemoryStore::with_config(MockConfig {
            fail_with: Some("connection refused".to_string()),
            ..Default::default()
        });

        let err = store.list(None).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }
}
