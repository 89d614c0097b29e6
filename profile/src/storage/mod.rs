//! Secure-store backends.
//!
//! Every backend exposes the same three primitives, addressed by a [`Query`]:
//! - **keyring**: OS keychain via the `keyring` crate
//! - **encrypted**: AES-256-GCM encrypted local file, key kept in the keychain
//! - **memory**: process-local fake for tests

pub mod encrypted;
pub mod keyring;
pub mod memory;

pub use self::encrypted::EncryptedFileStore;
pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Query attributes
// ---------------------------------------------------------------------------

/// Kind of item addressed by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemClass {
    GenericPassword,
}

/// When the stored item may be read.
///
/// The profile item is always readable after the first unlock following a
/// reboot. Backends that cannot express the attribute fall back to their
/// platform default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    #[default]
    AfterFirstUnlock,
}

/// How many items a lookup may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchLimit {
    #[default]
    One,
    All,
}

/// Attribute set addressing one item in a secure store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub class: ItemClass,
    pub service: String,
    pub account: String,
    pub accessibility: Accessibility,
    pub return_data: bool,
    pub match_limit: Option<MatchLimit>,
}

impl Query {
    /// Build the query for `key`, used as both service and account.
    pub fn for_key(key: &str) -> Self {
        Self {
            class: ItemClass::GenericPassword,
            service: key.to_string(),
            account: key.to_string(),
            accessibility: Accessibility::AfterFirstUnlock,
            return_data: false,
            match_limit: None,
        }
    }

    /// The same query, asking for the single matching item's data.
    pub fn returning_data(mut self) -> Self {
        self.return_data = true;
        self.match_limit = Some(MatchLimit::One);
        self
    }
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Primitive operations of a secure store.
///
/// Errors are the backend's own statuses; implementations must not retry or
/// reinterpret them.
pub trait SecureStore: Send + Sync {
    /// Remove the item matching `query`. Missing items yield
    /// [`StoreError::ItemNotFound`].
    fn delete(&self, query: &Query) -> Result<(), StoreError>;

    /// Add a new item holding `blob`. An existing item for the same query may
    /// be rejected with [`StoreError::DuplicateItem`].
    fn insert(&self, query: &Query, blob: &[u8]) -> Result<(), StoreError>;

    /// Fetch the data of the item matching `query`.
    fn lookup(&self, query: &Query) -> Result<Vec<u8>, StoreError>;
}

impl<S: SecureStore + ?Sized> SecureStore for Box<S> {
    fn delete(&self, query: &Query) -> Result<(), StoreError> {
        (**self).delete(query)
    }

    fn insert(&self, query: &Query, blob: &[u8]) -> Result<(), StoreError> {
        (**self).insert(query, blob)
    }

    fn lookup(&self, query: &Query) -> Result<Vec<u8>, StoreError> {
        (**self).lookup(query)
    }
}

impl<S: SecureStore + ?Sized> SecureStore for std::sync::Arc<S> {
    fn delete(&self, query: &Query) -> Result<(), StoreError> {
        (**self).delete(query)
    }

    fn insert(&self, query: &Query, blob: &[u8]) -> Result<(), StoreError> {
        (**self).insert(query, blob)
    }

    fn lookup(&self, query: &Query) -> Result<Vec<u8>, StoreError> {
        (**self).lookup(query)
    }
}
