//! Profile Keychain - persistence for the current user's profile
//!
//! Keeps exactly one serialized user record in a secure store:
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring / KWallet)
//! - Windows: Credential Manager
//! - Anywhere: an AES-256-GCM encrypted file keyed from the OS keychain
//!
//! The [`Profile`] is an in-memory cache of that record. Nothing is written
//! until [`Profile::synchronize`] is called.

pub mod config;
pub mod error;
pub mod profile;
pub mod record;
pub mod storage;

// Re-export commonly used types
pub use config::{Backend, ProfileConfig, open_store};
pub use error::{CodecError, StoreError};
pub use profile::{PROFILE_KEY, Profile};
pub use record::UserRecord;
pub use storage::{Accessibility, ItemClass, MatchLimit, Query, SecureStore};
