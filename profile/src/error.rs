use thiserror::Error;

/// Failure reported by a secure-store backend.
///
/// Variants carry the backend's own status untouched; callers decide whether
/// a given status matters to them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no item matches the query")]
    ItemNotFound,
    #[error("an item already exists for the query")]
    DuplicateItem,
    /// Raw numeric status, for backends that report OSStatus-style codes.
    #[error("secure store returned status {0}")]
    Status(i32),
    #[error("platform keychain failure: {0}")]
    Platform(#[source] keyring::Error),
    #[error("store file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encryption failed: {0}")]
    Crypto(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Whether this error means "nothing was stored under the query".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::ItemNotFound)
    }
}

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => StoreError::ItemNotFound,
            other => StoreError::Platform(other),
        }
    }
}

/// Failure turning a user record into bytes or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode user record: {0}")]
    Encode(String),
    #[error("failed to decode user record: {0}")]
    Decode(String),
}
