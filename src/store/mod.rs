//! Item persistence.
//!
//! This module handles:
//! - The `ItemStore` seam used by the HTTP handlers
//! - Supabase (PostgREST) client
//! - In-memory store for tests and local runs

pub mod memory;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::item::{Item, ItemPatch, NewItem, Status};

pub use memory::{MemoryStore, MockConfig};
pub use supabase::SupabaseStore;

/// Row-level operations on the items table.
///
/// Single-row operations return `StoreError::NotFound` when no row matches
/// `id`.
#[async_trait]
pub trait ItemStore: Send + Sync + std::fmt::Debug {
    /// Insert a row and return it as stored.
    async fn insert(&self, item: NewItem) -> Result<Item, StoreError>;

    /// All rows, newest `created_at` first, optionally restricted to one status.
    async fn list(&self, status: Option<Status>) -> Result<Vec<Item>, StoreError>;

    /// Fetch one row.
    async fn get(&self, id: &str) -> Result<Item, StoreError>;

    /// Apply a partial update and return the updated row.
    async fn update(&self, id: &str, patch: ItemPatch) -> Result<Item, StoreError>;

    /// Delete one row and return its last snapshot.
    async fn delete(&self, id: &str) -> Result<Item, StoreError>;
}

/// Pick the store for this process: in-memory when `memory` is set,
/// otherwise the Supabase table named by `config`.
///
/// Missing credentials only log warnings. A malformed project URL fails.
pub fn open(config: &Config, memory: bool) -> crate::Result<Arc<dyn ItemStore>> {
    if memory {
        info!("Using in-memory item store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    for warning in config.validate() {
        warn!("[supabase] {}", warning);
    }

    let store = SupabaseStore::new(config)?;
    match store.table_url() {
        Some(url) => info!("Using Supabase table at {}", url),
        None => warn!(
            "Supabase is not configured; item requests will fail \
             until SUPABASE_URL and a key are set"
        ),
    }
    Ok(Arc::new(store))
}
