//! The explicit encode/decode capability a stored user record must provide.
//!
//! The store only ever sees the encoded bytes. Types that already derive
//! serde traits can implement [`UserRecord`] with the [`json`] helpers:
//!
//! ```
//! use profile_keychain::{CodecError, UserRecord, record::json};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct ChatUser {
//!     id: u64,
//!     login: String,
//! }
//!
//! impl UserRecord for ChatUser {
//!     fn encode(&self) -> Result<Vec<u8>, CodecError> {
//!         json::encode(self)
//!     }
//!
//!     fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
//!         json::decode(bytes)
//!     }
//! }
//! ```

use crate::error::CodecError;

/// A user record that can be archived into an opaque blob and restored.
///
/// `decode(encode(u))` must yield a value equal to `u` in every field the
/// owner of the record cares about.
pub trait UserRecord: Sized {
    fn encode(&self) -> Result<Vec<u8>, CodecError>;
    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;
}

impl UserRecord for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.clone())
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bytes.to_vec())
    }
}

/// JSON archiving for serde types.
pub mod json {
    use serde::Serialize;
    use serde::de::DeserializeOwned;

    use crate::error::CodecError;

    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Caller {
        id: u64,
        full_name: Option<String>,
        tags: Vec<String>,
    }

    impl UserRecord for Caller {
        fn encode(&self) -> Result<Vec<u8>, CodecError> {
            json::encode(self)
        }

        fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
            json::decode(bytes)
        }
    }

    #[test]
    fn json_record_restores_every_field() {
        let caller = Caller {
            id: 7,
            full_name: Some("Ada".to_string()),
            tags: vec!["webrtc".to_string(), "demo".to_string()],
        };
        let bytes = caller.encode().unwrap();
        assert_eq!(Caller::decode(&bytes).unwrap(), caller);
    }

    #[test]
    fn json_decode_rejects_garbage() {
        let result = Caller::decode(b"\x00not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn raw_bytes_pass_through() {
        let blob = vec![0u8, 1, 2, 255];
        assert_eq!(Vec::<u8>::decode(&blob.encode().unwrap()).unwrap(), blob);
    }
}
