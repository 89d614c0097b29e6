//! The current user's profile and its single stored record.

use crate::config::ProfileConfig;
use crate::error::StoreError;
use crate::record::UserRecord;
use crate::storage::{Query, SecureStore};

/// Service and account name of the profile item.
pub const PROFILE_KEY: &str = "curentProfile";

/// In-memory cache of the stored profile record.
///
/// The cache and the store may diverge: nothing is written until
/// [`synchronize`](Profile::synchronize) is called.
#[derive(Debug)]
pub struct Profile<U, S> {
    store: S,
    key: String,
    user_data: Option<U>,
}

impl<U: UserRecord, S: SecureStore> Profile<U, S> {
    /// Hold `user_data` without touching the store.
    pub fn create(store: S, user_data: Option<U>) -> Self {
        Self {
            store,
            key: PROFILE_KEY.to_string(),
            user_data,
        }
    }

    /// Read the stored record into a new profile.
    ///
    /// A missing or unreadable record leaves the profile empty.
    pub fn create_and_load(store: S) -> Self {
        let mut profile = Self::create(store, None);
        profile.reload();
        profile
    }

    /// Like [`create`](Profile::create), addressing the item named by `config`.
    pub fn with_config(store: S, config: &ProfileConfig, user_data: Option<U>) -> Self {
        Self {
            store,
            key: config.key.clone(),
            user_data,
        }
    }

    /// Like [`create_and_load`](Profile::create_and_load), addressing the item
    /// named by `config`.
    pub fn load_with_config(store: S, config: &ProfileConfig) -> Self {
        let mut profile = Self::with_config(store, config, None);
        profile.reload();
        profile
    }

    /// Replace the cached data with whatever the store holds now.
    pub fn reload(&mut self) {
        self.user_data = match load_record(&self.store, &self.query()) {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::debug!(key = %self.key, "No stored profile");
                None
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "Ignoring unreadable stored profile"
                );
                None
            }
        };
    }

    /// Write the cached data to the store, replacing any previous record.
    ///
    /// Returns the store's insert status unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the profile holds no user data.
    pub fn synchronize(&self) -> Result<(), StoreError> {
        let Some(user) = self.user_data.as_ref() else {
            panic!("Invalid parameter not satisfying: user_data != None");
        };
        save_record(&self.store, &self.query(), user)
    }

    /// Set the cached data, then [`synchronize`](Profile::synchronize).
    pub fn synchronize_with_user_data(&mut self, user_data: U) -> Result<(), StoreError> {
        self.user_data = Some(user_data);
        self.synchronize()
    }

    /// Delete the stored record and forget the cached data.
    ///
    /// Deleting a record that does not exist succeeds.
    pub fn clear_profile(&mut self) -> Result<(), StoreError> {
        let result = match self.store.delete(&self.query()) {
            Err(StoreError::ItemNotFound) => Ok(()),
            other => other,
        };
        self.user_data = None;
        tracing::debug!(key = %self.key, ok = result.is_ok(), "Cleared profile");
        result
    }

    pub fn user_data(&self) -> Option<&U> {
        self.user_data.as_ref()
    }

    pub fn take_user_data(&mut self) -> Option<U> {
        self.user_data.take()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn query(&self) -> Query {
        Query::for_key(&self.key)
    }
}

/// Encode `user` and store it under `query`, deleting any previous item first.
///
/// Only the insert status is reported; the delete result is ignored so stale
/// item attributes never survive a save.
pub fn save_record<U: UserRecord, S: SecureStore + ?Sized>(
    store: &S,
    query: &Query,
    user: &U,
) -> Result<(), StoreError> {
    let blob = user.encode()?;
    let _ = store.delete(query);
    store.insert(query, &blob)?;
    tracing::debug!(service = %query.service, bytes = blob.len(), "Saved profile record");
    Ok(())
}

/// Fetch and decode the record under `query`.
///
/// `Ok(None)` means nothing is stored; a blob that fails to decode is
/// [`StoreError::Codec`].
pub fn load_record<U: UserRecord, S: SecureStore + ?Sized>(
    store: &S,
    query: &Query,
) -> Result<Option<U>, StoreError> {
    let lookup = query.clone().returning_data();
    match store.lookup(&lookup) {
        Ok(blob) => Ok(Some(U::decode(&blob)?)),
        Err(StoreError::ItemNotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
