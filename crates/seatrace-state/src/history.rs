//! # Stage History
//!
//! The immutable audit trail. Every accepted stage change appends one
//! [`StageHistoryEntry`]; entries are never updated or deleted, and a
//! product's history is ordered oldest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use seatrace_core::{ActorId, ProductId};

use crate::permissions::ActorRole;
use crate::stage::SupplyChainStage;

/// One immutable record of a stage change.
///
/// Captures who moved the product, from where to where, when, and the
/// stage data supplied with the transition. Registration produces the
/// first entry with `previous_stage` unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    /// Unique identifier of this history entry.
    pub id: Uuid,
    /// The product this entry belongs to.
    pub product_id: ProductId,
    /// The stage the product entered.
    pub stage: SupplyChainStage,
    /// The stage the product left, absent for the registration entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_stage: Option<SupplyChainStage>,
    /// The actor who performed the change.
    pub updated_by: ActorId,
    /// The actor's role at the time of the change.
    pub updated_by_role: ActorRole,
    /// Server-assigned time of the change.
    pub timestamp: DateTime<Utc>,
    /// Free-text note supplied with the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// The payload supplied for the entered stage.
    pub stage_data: Value,
    /// References to supporting documents (certificates, photos).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_refs: Vec<String>,
}

impl StageHistoryEntry {
    /// Build a new entry with a fresh id and the current server time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: ProductId,
        stage: SupplyChainStage,
        previous_stage: Option<SupplyChainStage>,
        updated_by: ActorId,
        updated_by_role: ActorRole,
        notes: Option<String>,
        stage_data: Value,
        file_refs: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            stage,
            previous_stage,
            updated_by,
            updated_by_role,
            timestamp: Utc::now(),
            notes,
            stage_data,
            file_refs,
        }
    }

    /// Whether this is the registration entry.
    pub fn is_registration(&self) -> bool {
        self.previous_stage.is_none()
    }
}
