//! # seatrace-core — Foundational Types
//!
//! Domain-primitive newtypes and the validation error hierarchy shared by
//! the rest of the SeaTrace workspace. No I/O lives here.
//!
//! - [`identity`]: identifier newtypes ([`ProductId`], [`ActorId`],
//!   [`BatchCode`]). String-based identifiers validate their format at
//!   construction time; UUID-based identifiers are always valid.
//! - [`error`]: [`ValidationError`], the structured error type for
//!   domain-primitive construction failures.

pub mod error;
pub mod identity;

pub use error::ValidationError;
pub use identity::{ActorId, BatchCode, ProductId};
