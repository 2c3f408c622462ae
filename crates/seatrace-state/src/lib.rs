//! # seatrace-state — Supply-Chain Stage Model
//!
//! The stage/state model for seafood traceability. A product moves through
//! one of two fixed progressions depending on how it was sourced:
//!
//! ```text
//! FARMED:        HATCHERY → GROW_OUT → HARVEST ─┐
//!                                               ├─▶ PROCESSING → DISTRIBUTION → RETAIL
//! WILD_CAPTURE:  FISHING ──────────────────────┘
//! ```
//!
//! Transitions are strictly forward within one progression; crossing
//! between the farmed and wild-capture tracks is never allowed, even
//! though both share the `PROCESSING → DISTRIBUTION → RETAIL` tail.
//!
//! ## Modules
//!
//! - [`stage`]: the [`SupplyChainStage`] and [`SourceType`] enumerations,
//!   the two progression tables, and [`ProductStatus`].
//! - [`permissions`]: [`ActorRole`] and the fixed stage→role permission
//!   table.
//! - [`payload`]: [`StagePayloads`], the per-stage structured data
//!   attached to transitions, and the presence rule.
//! - [`validator`]: the pure transition validator — authorization,
//!   progression, and data-presence checks composed in that order.
//! - [`history`]: [`StageHistoryEntry`], the immutable audit record
//!   appended on every stage change.
//!
//! Everything in this crate is pure decision logic: no I/O, no shared
//! mutable state. Persistence and transport concerns live in
//! `seatrace-api`.

pub mod history;
pub mod payload;
pub mod permissions;
pub mod stage;
pub mod validator;

pub use history::StageHistoryEntry;
pub use payload::StagePayloads;
pub use permissions::{allowed_roles, can_actor_update_stage, ActorRole};
pub use stage::{ProductStatus, SourceType, SupplyChainStage};
pub use validator::{
    validate_initial_stage, validate_progression, validate_stage_data, validate_transition,
    TransitionError,
};
