//! # Error Hierarchy
//!
//! Structured error types for domain-primitive construction, built with
//! `thiserror`. Each variant carries the rejected input and the expected
//! format so that operators can diagnose bad data without guesswork.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
///
/// Each identifier type enforces format constraints at construction time.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Product identifier fails format validation.
    #[error("invalid product ID: \"{0}\" (expected 3-64 ASCII alphanumeric characters or '-')")]
    InvalidProductId(String),

    /// Batch code fails format validation.
    #[error("invalid batch code: \"{0}\" (expected 1-32 ASCII alphanumeric characters or '-')")]
    InvalidBatchCode(String),

    /// Actor role string does not name a known role.
    #[error("unknown actor role: \"{0}\"")]
    InvalidActorRole(String),
}
