//! # Stage & Source-Type Enumerations
//!
//! The seven lifecycle stages, the two source types with their fixed
//! progressions, and the product status marker.
//!
//! The farmed and wild-capture progressions are kept as two separate
//! ordered lists that duplicate the shared `PROCESSING → DISTRIBUTION →
//! RETAIL` tail. The validator does independent index lookups per list;
//! do not collapse the two lists into a single transition graph — the
//! duplicated tail is what makes shared-tail transitions resolve inside
//! a single progression.

use serde::{Deserialize, Serialize};

// ── SupplyChainStage ────────────────────────────────────────────────

/// One step in a product's supply-chain lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplyChainStage {
    /// Spawning and juvenile rearing (farmed track).
    #[serde(rename = "HATCHERY")]
    Hatchery,
    /// Growth to market size in pens or ponds (farmed track).
    #[serde(rename = "GROW_OUT")]
    GrowOut,
    /// Removal from the farm (farmed track).
    #[serde(rename = "HARVEST")]
    Harvest,
    /// At-sea capture (wild-capture track).
    #[serde(rename = "FISHING")]
    Fishing,
    /// Cleaning, filleting, packaging. Shared tail.
    #[serde(rename = "PROCESSING")]
    Processing,
    /// Cold-chain transport and wholesale. Shared tail.
    #[serde(rename = "DISTRIBUTION")]
    Distribution,
    /// Point of sale. Final stage of both progressions.
    #[serde(rename = "RETAIL")]
    Retail,
}

/// All seven stages, in declaration order.
pub const ALL_STAGES: [SupplyChainStage; 7] = [
    SupplyChainStage::Hatchery,
    SupplyChainStage::GrowOut,
    SupplyChainStage::Harvest,
    SupplyChainStage::Fishing,
    SupplyChainStage::Processing,
    SupplyChainStage::Distribution,
    SupplyChainStage::Retail,
];

/// The farmed progression, in order. Shares its tail with [`WILD_PROGRESSION`].
pub const FARMED_PROGRESSION: [SupplyChainStage; 6] = [
    SupplyChainStage::Hatchery,
    SupplyChainStage::GrowOut,
    SupplyChainStage::Harvest,
    SupplyChainStage::Processing,
    SupplyChainStage::Distribution,
    SupplyChainStage::Retail,
];

/// The wild-capture progression, in order.
pub const WILD_PROGRESSION: [SupplyChainStage; 4] = [
    SupplyChainStage::Fishing,
    SupplyChainStage::Processing,
    SupplyChainStage::Distribution,
    SupplyChainStage::Retail,
];

impl SupplyChainStage {
    /// The canonical string name of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hatchery => "HATCHERY",
            Self::GrowOut => "GROW_OUT",
            Self::Harvest => "HARVEST",
            Self::Fishing => "FISHING",
            Self::Processing => "PROCESSING",
            Self::Distribution => "DISTRIBUTION",
            Self::Retail => "RETAIL",
        }
    }

    /// Convert a canonical stage name to a `SupplyChainStage`.
    ///
    /// Returns `None` for any other input, including lowercase forms.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HATCHERY" => Some(Self::Hatchery),
            "GROW_OUT" => Some(Self::GrowOut),
            "HARVEST" => Some(Self::Harvest),
            "FISHING" => Some(Self::Fishing),
            "PROCESSING" => Some(Self::Processing),
            "DISTRIBUTION" => Some(Self::Distribution),
            "RETAIL" => Some(Self::Retail),
            _ => None,
        }
    }

    /// Position of this stage within the farmed progression, if it
    /// appears there.
    pub fn farmed_index(&self) -> Option<usize> {
        FARMED_PROGRESSION.iter().position(|s| s == self)
    }

    /// Position of this stage within the wild-capture progression, if it
    /// appears there.
    pub fn wild_index(&self) -> Option<usize> {
        WILD_PROGRESSION.iter().position(|s| s == self)
    }

    /// The name of the stage-data field required when transitioning a
    /// product *into* this stage.
    pub fn data_field(&self) -> &'static str {
        match self {
            Self::Hatchery => "hatchery_data",
            Self::GrowOut => "grow_out_data",
            Self::Harvest => "harvest_data",
            Self::Fishing => "fishing_data",
            Self::Processing => "processing_data",
            Self::Distribution => "distribution_data",
            Self::Retail => "retail_data",
        }
    }
}

impl std::fmt::Display for SupplyChainStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── SourceType ──────────────────────────────────────────────────────

/// Whether a product originated from aquaculture or wild capture.
/// Determines which of the two disjoint progressions applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Aquaculture origin: hatchery → grow-out → harvest → shared tail.
    #[serde(rename = "FARMED")]
    Farmed,
    /// Wild capture origin: fishing → shared tail.
    #[serde(rename = "WILD_CAPTURE")]
    WildCapture,
}

impl SourceType {
    /// The canonical string name of this source type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmed => "FARMED",
            Self::WildCapture => "WILD_CAPTURE",
        }
    }

    /// The ordered progression of stages valid for this source type.
    pub fn progression(&self) -> &'static [SupplyChainStage] {
        match self {
            Self::Farmed => &FARMED_PROGRESSION,
            Self::WildCapture => &WILD_PROGRESSION,
        }
    }

    /// Whether the given stage belongs to this source type's progression.
    pub fn contains(&self, stage: SupplyChainStage) -> bool {
        self.progression().contains(&stage)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ProductStatus ───────────────────────────────────────────────────

/// Product lifecycle status. Products are never hard-deleted; a terminal
/// status marks them out of circulation and blocks further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// In circulation; stage transitions permitted.
    Active,
    /// Pulled from circulation for a safety or compliance reason. Terminal.
    Recalled,
    /// End of traceable life (sold through or expired). Terminal.
    Retired,
}

impl ProductStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Recalled => "RECALLED",
            Self::Retired => "RETIRED",
        }
    }

    /// Whether this status blocks further stage transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Recalled | Self::Retired)
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_name_roundtrip() {
        for stage in ALL_STAGES {
            assert_eq!(SupplyChainStage::from_name(stage.as_str()), Some(stage));
        }
    }

    #[test]
    fn stage_from_name_rejects_unknown() {
        assert_eq!(SupplyChainStage::from_name("SPAWNING"), None);
        assert_eq!(SupplyChainStage::from_name("hatchery"), None);
        assert_eq!(SupplyChainStage::from_name(""), None);
    }

    #[test]
    fn stage_serializes_to_canonical_names() {
        let json = serde_json::to_string(&SupplyChainStage::GrowOut).unwrap();
        assert_eq!(json, "\"GROW_OUT\"");
        let parsed: SupplyChainStage = serde_json::from_str("\"RETAIL\"").unwrap();
        assert_eq!(parsed, SupplyChainStage::Retail);
    }

    #[test]
    fn stage_deserialization_rejects_unknown_names() {
        let result: Result<SupplyChainStage, _> = serde_json::from_str("\"SPAWNING\"");
        assert!(result.is_err());
        let result: Result<SupplyChainStage, _> = serde_json::from_str("\"fishing\"");
        assert!(result.is_err());
    }

    #[test]
    fn every_stage_belongs_to_at_least_one_progression() {
        for stage in ALL_STAGES {
            assert!(
                stage.farmed_index().is_some() || stage.wild_index().is_some(),
                "{stage} resolves in neither progression"
            );
        }
    }

    #[test]
    fn shared_tail_appears_in_both_progressions() {
        for stage in [
            SupplyChainStage::Processing,
            SupplyChainStage::Distribution,
            SupplyChainStage::Retail,
        ] {
            assert!(stage.farmed_index().is_some());
            assert!(stage.wild_index().is_some());
        }
    }

    #[test]
    fn farmed_only_stages_are_absent_from_wild_list() {
        for stage in [
            SupplyChainStage::Hatchery,
            SupplyChainStage::GrowOut,
            SupplyChainStage::Harvest,
        ] {
            assert!(stage.farmed_index().is_some());
            assert!(stage.wild_index().is_none());
        }
        assert!(SupplyChainStage::Fishing.wild_index().is_some());
        assert!(SupplyChainStage::Fishing.farmed_index().is_none());
    }

    #[test]
    fn progressions_are_strictly_ordered() {
        assert_eq!(SupplyChainStage::Hatchery.farmed_index(), Some(0));
        assert_eq!(SupplyChainStage::Retail.farmed_index(), Some(5));
        assert_eq!(SupplyChainStage::Fishing.wild_index(), Some(0));
        assert_eq!(SupplyChainStage::Retail.wild_index(), Some(3));
    }

    #[test]
    fn source_type_progression_membership() {
        assert!(SourceType::Farmed.contains(SupplyChainStage::Hatchery));
        assert!(!SourceType::Farmed.contains(SupplyChainStage::Fishing));
        assert!(SourceType::WildCapture.contains(SupplyChainStage::Fishing));
        assert!(!SourceType::WildCapture.contains(SupplyChainStage::Harvest));
        // Shared tail belongs to both.
        assert!(SourceType::Farmed.contains(SupplyChainStage::Processing));
        assert!(SourceType::WildCapture.contains(SupplyChainStage::Processing));
    }

    #[test]
    fn source_type_serialization() {
        assert_eq!(
            serde_json::to_string(&SourceType::WildCapture).unwrap(),
            "\"WILD_CAPTURE\""
        );
        let parsed: SourceType = serde_json::from_str("\"FARMED\"").unwrap();
        assert_eq!(parsed, SourceType::Farmed);
    }

    #[test]
    fn data_field_names_are_distinct() {
        let mut fields: Vec<&str> = ALL_STAGES.iter().map(|s| s.data_field()).collect();
        fields.sort_unstable();
        fields.dedup();
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn product_status_terminal_states() {
        assert!(!ProductStatus::Active.is_terminal());
        assert!(ProductStatus::Recalled.is_terminal());
        assert!(ProductStatus::Retired.is_terminal());
    }

    #[test]
    fn product_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::Recalled).unwrap(),
            "\"RECALLED\""
        );
    }
}
