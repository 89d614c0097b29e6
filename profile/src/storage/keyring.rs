//! OS keychain backend.
//!
//! Uses the `keyring` crate to provide a cross-platform interface to:
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring / KWallet)
//! - Windows: Credential Manager
//!
//! Only the service and account attributes reach the platform. The `keyring`
//! crate has no accessibility setting, so items get the platform default
//! rather than [`Accessibility::AfterFirstUnlock`](crate::storage::Accessibility).

use crate::error::StoreError;
use crate::storage::{Query, SecureStore};

/// Secure store backed by the platform credential service.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(query: &Query) -> Result<keyring::Entry, StoreError> {
        Ok(keyring::Entry::new(&query.service, &query.account)?)
    }
}

impl SecureStore for KeyringStore {
    fn delete(&self, query: &Query) -> Result<(), StoreError> {
        let entry = Self::entry(query)?;
        entry.delete_credential()?;
        tracing::debug!(
            service = %query.service,
            account = %query.account,
            "Deleted keychain item"
        );
        Ok(())
    }

    fn insert(&self, query: &Query, blob: &[u8]) -> Result<(), StoreError> {
        let entry = Self::entry(query)?;
        entry.set_secret(blob)?;
        tracing::debug!(
            service = %query.service,
            account = %query.account,
            bytes = blob.len(),
            "Stored keychain item"
        );
        Ok(())
    }

    fn lookup(&self, query: &Query) -> Result<Vec<u8>, StoreError> {
        let entry = Self::entry(query)?;
        Ok(entry.get_secret()?)
    }
}

/// Store a UTF-8 secret in the OS keychain.
pub fn set_password(service: &str, user: &str, secret: &str) -> Result<(), StoreError> {
    let entry = keyring::Entry::new(service, user)?;
    entry.set_password(secret)?;
    Ok(())
}

/// Retrieve a UTF-8 secret from the OS keychain.
pub fn get_password(service: &str, user: &str) -> Result<String, StoreError> {
    let entry = keyring::Entry::new(service, user)?;
    Ok(entry.get_password()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires actual keychain access
    fn test_keyring_blob_roundtrip() {
        let store = KeyringStore::new();
        let query = Query::for_key("profile-keychain-test");

        let _ = store.delete(&query);
        store.insert(&query, b"\x00\x01binary").unwrap();
        let blob = store.lookup(&query.clone().returning_data()).unwrap();
        assert_eq!(blob, b"\x00\x01binary");

        store.delete(&query).unwrap();
        assert!(store.lookup(&query).unwrap_err().is_not_found());
    }
}
