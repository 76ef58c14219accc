//! AssetId: an opaque 128-bit identifier, hex-encoded (32 chars).
//!
//! Identifiers are random, not content-based: the same source asset stored
//! twice gets two distinct identifiers. Randomness comes from a v4 UUID run
//! through BLAKE3 and truncated to 16 bytes, which keeps collision
//! probability negligible while staying human-manageable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// An asset identifier - 128 bits (16 bytes, 32 hex chars).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

/// Errors that can occur when parsing asset identifiers.
#[derive(Debug, Error)]
pub enum IdError {
    #[error("invalid identifier length: expected 32 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in identifier")]
    InvalidHex,
}

impl AssetId {
    /// Generate a new random asset identifier.
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        let hash_bytes = blake3::hash(uuid.as_bytes());
        let hash_hex = hex::encode(&hash_bytes.as_bytes()[..16]);
        Self(hash_hex)
    }

    /// Create from an existing identifier string (validates format).
    pub fn from_str_checked(s: &str) -> Result<Self, IdError> {
        if s.len() != 32 {
            return Err(IdError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidHex);
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Get the full identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
