//! Encrypted local file backend.
//!
//! Uses AES-256-GCM to keep items in a single local file. The encryption key
//! is stored in the OS keychain. File layout: a 12-byte random nonce followed
//! by the ciphertext of a JSON map from `service/account` to hex blobs.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::StoreError;
use crate::storage::keyring;
use crate::storage::{Query, SecureStore};

const KEYRING_SERVICE: &str = "profile-keychain";
const KEYRING_USER: &str = "encryption-key";
const NONCE_LEN: usize = 12;

/// Default file name inside the config directory.
pub const STORE_FILE: &str = "profile-store.enc";

type Key = Zeroizing<[u8; 32]>;

/// Generate a cryptographically secure random key.
fn generate_key() -> Result<Key, StoreError> {
    let mut key = Zeroizing::new([0u8; 32]);
    getrandom::fill(key.as_mut_slice())
        .map_err(|e| StoreError::Crypto(format!("failed to generate key: {e}")))?;
    Ok(key)
}

/// Retrieve the encryption key from the keychain, creating it on first use.
fn get_or_create_key() -> Result<Key, StoreError> {
    match keyring::get_password(KEYRING_SERVICE, KEYRING_USER) {
        Ok(key_hex) => {
            let key_hex = Zeroizing::new(key_hex);
            let mut key = Zeroizing::new([0u8; 32]);
            hex::decode_to_slice(key_hex.as_str(), key.as_mut_slice())
                .map_err(|e| StoreError::Crypto(format!("stored key is malformed: {e}")))?;
            Ok(key)
        }
        Err(e) if e.is_not_found() => {
            let key = generate_key()?;
            let key_hex = Zeroizing::new(hex::encode(key.as_slice()));
            keyring::set_password(KEYRING_SERVICE, KEYRING_USER, &key_hex)?;
            tracing::info!("Created store encryption key in keychain");
            Ok(key)
        }
        Err(e) => Err(e),
    }
}

/// Get the default path of the store file.
pub fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("profile-keychain")
        .join(STORE_FILE)
}

/// The data structure kept inside the encrypted file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreData {
    /// `service/account` -> hex-encoded blob
    #[serde(default)]
    items: BTreeMap<String, String>,
}

fn item_key(query: &Query) -> String {
    format!("{}/{}", query.service, query.account)
}

/// Secure store kept in an AES-256-GCM encrypted file.
pub struct EncryptedFileStore {
    path: PathBuf,
    key: Key,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl std::fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EncryptedFileStore {
    /// Open the store at `path`, keyed from the OS keychain.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::from_key(path.into(), get_or_create_key()?))
    }

    /// Open the store at `path` with an explicit 256-bit key.
    pub fn with_key(path: impl Into<PathBuf>, key: [u8; 32]) -> Self {
        Self::from_key(path.into(), Zeroizing::new(key))
    }

    fn from_key(path: PathBuf, key: Key) -> Self {
        Self {
            path,
            key,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cipher(&self) -> Result<Aes256Gcm, StoreError> {
        Aes256Gcm::new_from_slice(self.key.as_slice())
            .map_err(|e| StoreError::Crypto(format!("invalid key: {e}")))
    }

    /// Load and decrypt the file. A missing file is an empty store.
    fn load(&self) -> Result<StoreData, StoreError> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreData::default()),
            Err(e) => return Err(e.into()),
        };
        if contents.len() < NONCE_LEN {
            return Err(StoreError::Crypto("store file is truncated".to_string()));
        }

        let (nonce_bytes, ciphertext) = contents.split_at(NONCE_LEN);
        let plaintext = Zeroizing::new(
            self.cipher()?
                .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
                .map_err(|e| StoreError::Crypto(format!("decryption failed: {e}")))?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|e| StoreError::Crypto(format!("store contents are corrupt: {e}")))
    }

    /// Encrypt and write the file, replacing it atomically.
    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(data)
                .map_err(|e| StoreError::Crypto(format!("failed to serialize store: {e}")))?,
        );

        let mut nonce_bytes = [0u8; NONCE_LEN];
        getrandom::fill(&mut nonce_bytes)
            .map_err(|e| StoreError::Crypto(format!("failed to generate nonce: {e}")))?;

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|e| StoreError::Crypto(format!("encryption failed: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("enc.tmp");
        let mut contents = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        contents.extend_from_slice(&nonce_bytes);
        contents.extend_from_slice(&ciphertext);
        std::fs::write(&tmp, &contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `f` to the stored data and write it back.
    ///
    /// A file that cannot be decrypted (for example after the keychain key was
    /// replaced) is reset to an empty store first, so writes never get stuck.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut data = match self.load() {
            Ok(data) => data,
            Err(StoreError::Crypto(reason)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Discarding unreadable store file"
                );
                let data = StoreData::default();
                self.save(&data)?;
                data
            }
            Err(e) => return Err(e),
        };
        let result = f(&mut data)?;
        self.save(&data)?;
        Ok(result)
    }
}

impl SecureStore for EncryptedFileStore {
    fn delete(&self, query: &Query) -> Result<(), StoreError> {
        self.update(|data| {
            data.items
                .remove(&item_key(query))
                .map(|_| ())
                .ok_or(StoreError::ItemNotFound)
        })?;
        tracing::debug!(
            path = %self.path.display(),
            service = %query.service,
            "Deleted file store item"
        );
        Ok(())
    }

    fn insert(&self, query: &Query, blob: &[u8]) -> Result<(), StoreError> {
        self.update(|data| {
            let key = item_key(query);
            if data.items.contains_key(&key) {
                return Err(StoreError::DuplicateItem);
            }
            data.items.insert(key, hex::encode(blob));
            Ok(())
        })?;
        tracing::debug!(
            path = %self.path.display(),
            service = %query.service,
            bytes = blob.len(),
            "Stored file store item"
        );
        Ok(())
    }

    fn lookup(&self, query: &Query) -> Result<Vec<u8>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let data = self.load()?;
        let blob_hex = data
            .items
            .get(&item_key(query))
            .ok_or(StoreError::ItemNotFound)?;
        hex::decode(blob_hex)
            .map_err(|e| StoreError::Crypto(format!("stored item is malformed: {e}")))
    }
}
