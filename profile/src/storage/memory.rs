//! Process-local secure store.
//!
//! Behaves like a keychain: inserting over an existing item fails with
//! [`StoreError::DuplicateItem`], deleting a missing item fails with
//! [`StoreError::ItemNotFound`]. Failure statuses can be programmed per
//! primitive to exercise error paths.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::storage::{Accessibility, Query, SecureStore};

#[derive(Debug, Clone)]
struct Item {
    blob: Vec<u8>,
    accessibility: Accessibility,
}

impl Item {
    fn new(query: &Query, blob: &[u8]) -> Self {
        Self {
            blob: blob.to_vec(),
            accessibility: query.accessibility,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<(String, String), Item>,
    fail_insert: Option<i32>,
    fail_delete: Option<i32>,
    fail_lookup: Option<i32>,
}

/// In-memory secure store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the map intact.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every following insert fail with `status` (`None` clears it).
    pub fn fail_insert_with(&self, status: Option<i32>) {
        self.lock().fail_insert = status;
    }

    /// Make every following delete fail with `status` (`None` clears it).
    pub fn fail_delete_with(&self, status: Option<i32>) {
        self.lock().fail_delete = status;
    }

    /// Make every following lookup fail with `status` (`None` clears it).
    pub fn fail_lookup_with(&self, status: Option<i32>) {
        self.lock().fail_lookup = status;
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw blob stored for `query`, bypassing programmed failures.
    pub fn raw(&self, query: &Query) -> Option<Vec<u8>> {
        self.lock()
            .items
            .get(&item_key(query))
            .map(|item| item.blob.clone())
    }

    /// Accessibility attribute the item under `query` was stored with.
    pub fn accessibility(&self, query: &Query) -> Option<Accessibility> {
        self.lock()
            .items
            .get(&item_key(query))
            .map(|item| item.accessibility)
    }

    /// Place `blob` under `query` directly, replacing anything there.
    pub fn put_raw(&self, query: &Query, blob: &[u8]) {
        self.lock()
            .items
            .insert(item_key(query), Item::new(query, blob));
    }
}

fn item_key(query: &Query) -> (String, String) {
    (query.service.clone(), query.account.clone())
}

impl SecureStore for MemoryStore {
    fn delete(&self, query: &Query) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(status) = inner.fail_delete {
            return Err(StoreError::Status(status));
        }
        inner
            .items
            .remove(&item_key(query))
            .map(|_| ())
            .ok_or(StoreError::ItemNotFound)
    }

    fn insert(&self, query: &Query, blob: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(status) = inner.fail_insert {
            return Err(StoreError::Status(status));
        }
        let key = item_key(query);
        if inner.items.contains_key(&key) {
            return Err(StoreError::DuplicateItem);
        }
        inner.items.insert(key, Item::new(query, blob));
        Ok(())
    }

    fn lookup(&self, query: &Query) -> Result<Vec<u8>, StoreError> {
        let inner = self.lock();
        if let Some(status) = inner.fail_lookup {
            return Err(StoreError::Status(status));
        }
        inner
            .items
            .get(&item_key(query))
            .map(|item| item.blob.clone())
            .ok_or(StoreError::ItemNotFound)
    }
}
