//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout SeaTrace. Each
//! identifier is a distinct type — you cannot pass a [`BatchCode`] where a
//! [`ProductId`] is expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`ProductId`], [`BatchCode`]) validate format
//! at construction time. The UUID-based [`ActorId`] is always valid by
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for an actor (farmer, fisherman, processor, trader,
/// retailer, or administrator) registered in the traceability system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Create a new random actor identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an actor identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

/// A traceable product identifier.
///
/// Product IDs are assigned by the registering operator (and printed on QR
/// labels downstream), so the canonical storage form is uppercase. The
/// constructor accepts lowercase input and normalizes it.
///
/// # Validation
///
/// - 3-64 characters after trimming
/// - ASCII alphanumeric and `-` only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product ID from a string, validating format.
    ///
    /// The value is uppercased for storage consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidProductId`] if the string is not
    /// 3-64 ASCII alphanumeric/`-` characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let upper = s.trim().to_uppercase();

        if upper.len() < 3 || upper.len() > 64 {
            return Err(ValidationError::InvalidProductId(s));
        }
        if !upper
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ValidationError::InvalidProductId(s));
        }

        Ok(Self(upper))
    }

    /// Access the product ID string (uppercase).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A harvest or catch batch code.
///
/// Formats vary by operator, so validation is intentionally lenient:
/// alphanumeric and `-`, 1-32 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchCode(String);

impl BatchCode {
    /// Create a batch code, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBatchCode`] if the format is invalid.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim().to_string();

        if trimmed.is_empty() || trimmed.len() > 32 {
            return Err(ValidationError::InvalidBatchCode(s));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ValidationError::InvalidBatchCode(s));
        }

        Ok(Self(trimmed))
    }

    /// Access the batch code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
