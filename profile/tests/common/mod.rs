//! Shared fixtures for integration tests.

#![allow(dead_code)]

use profile_keychain::record::json;
use profile_keychain::{CodecError, UserRecord};
use serde::{Deserialize, Serialize};

/// Stand-in for the chat SDK's user object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: u64,
    pub login: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub custom_data: Option<String>,
}

impl ChatUser {
    pub fn sample(id: u64, login: &str) -> Self {
        Self {
            id,
            login: login.to_string(),
            full_name: Some(format!("User {id}")),
            email: None,
            password: Some("x6Bt0VDy5".to_string()),
            tags: vec!["webrtc".to_string()],
            custom_data: None,
        }
    }
}

impl UserRecord for ChatUser {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        json::encode(self)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        json::decode(bytes)
    }
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
