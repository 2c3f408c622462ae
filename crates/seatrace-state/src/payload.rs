//! # Stage Payloads
//!
//! Each stage carries one free-form structured payload (hatchery spawning
//! records, processing yield figures, and so on). The payload's internal
//! shape is not validated here — that belongs to the request-binding
//! layer. The only rule this crate enforces is *presence*: moving a
//! product into a stage requires that stage's payload to be non-empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stage::SupplyChainStage;

/// The set of optional per-stage payloads attached to a product or a
/// transition request. Field names match the wire contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagePayloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatchery_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grow_out_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fishing_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail_data: Option<Value>,
}

/// Whether a payload value counts as present. `null`, `{}`, `[]`, and
/// `""` all count as absent — the rule is "absent or empty is rejected".
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

impl StagePayloads {
    /// The payload slot for the given stage.
    pub fn for_stage(&self, stage: SupplyChainStage) -> Option<&Value> {
        match stage {
            SupplyChainStage::Hatchery => self.hatchery_data.as_ref(),
            SupplyChainStage::GrowOut => self.grow_out_data.as_ref(),
            SupplyChainStage::Harvest => self.harvest_data.as_ref(),
            SupplyChainStage::Fishing => self.fishing_data.as_ref(),
            SupplyChainStage::Processing => self.processing_data.as_ref(),
            SupplyChainStage::Distribution => self.distribution_data.as_ref(),
            SupplyChainStage::Retail => self.retail_data.as_ref(),
        }
    }

    /// Set the payload slot for the given stage.
    pub fn set_for_stage(&mut self, stage: SupplyChainStage, value: Value) {
        let slot = match stage {
            SupplyChainStage::Hatchery => &mut self.hatchery_data,
            SupplyChainStage::GrowOut => &mut self.grow_out_data,
            SupplyChainStage::Harvest => &mut self.harvest_data,
            SupplyChainStage::Fishing => &mut self.fishing_data,
            SupplyChainStage::Processing => &mut self.processing_data,
            SupplyChainStage::Distribution => &mut self.distribution_data,
            SupplyChainStage::Retail => &mut self.retail_data,
        };
        *slot = Some(value);
    }

    /// Whether the payload required for the given stage is present and
    /// non-empty.
    pub fn has_data_for(&self, stage: SupplyChainStage) -> bool {
        self.for_stage(stage).is_some_and(is_present)
    }
}
