//! # Actor Roles & Stage Permissions
//!
//! The fixed table mapping each stage to the roles permitted to move a
//! product into it. Expressed as exhaustive matches so that adding a
//! stage or a role forces every table in this crate to be revisited at
//! compile time.

use serde::{Deserialize, Serialize};

use seatrace_core::ValidationError;

use crate::stage::SupplyChainStage;

/// Roles in the traceability system.
///
/// Unlike a privilege hierarchy, these are disjoint per-stage operator
/// roles; only [`ActorRole::Admin`] spans every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Operates hatchery, grow-out, and harvest stages.
    Farmer,
    /// Records at-sea catches.
    Fisherman,
    /// Runs processing facilities.
    Processor,
    /// Moves product through distribution.
    Trader,
    /// Point-of-sale operator.
    Retailer,
    /// Administrative role permitted for every stage.
    Admin,
}

impl ActorRole {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Fisherman => "fisherman",
            Self::Processor => "processor",
            Self::Trader => "trader",
            Self::Retailer => "retailer",
            Self::Admin => "admin",
        }
    }

    /// Parse a role from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidActorRole`] for unknown names.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "farmer" => Ok(Self::Farmer),
            "fisherman" => Ok(Self::Fisherman),
            "processor" => Ok(Self::Processor),
            "trader" => Ok(Self::Trader),
            "retailer" => Ok(Self::Retailer),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::InvalidActorRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The non-administrative roles permitted to move a product into the
/// given stage. [`ActorRole::Admin`] is additionally permitted everywhere.
pub fn allowed_roles(stage: SupplyChainStage) -> &'static [ActorRole] {
    match stage {
        SupplyChainStage::Hatchery | SupplyChainStage::GrowOut | SupplyChainStage::Harvest => {
            &[ActorRole::Farmer]
        }
        SupplyChainStage::Fishing => &[ActorRole::Fisherman],
        SupplyChainStage::Processing => &[ActorRole::Processor],
        SupplyChainStage::Distribution => &[ActorRole::Trader],
        SupplyChainStage::Retail => &[ActorRole::Retailer],
    }
}

/// Whether an actor with the given role may move a product into the
/// target stage. Pure lookup.
pub fn can_actor_update_stage(role: ActorRole, target: SupplyChainStage) -> bool {
    role == ActorRole::Admin || allowed_roles(target).contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::ALL_STAGES;

    #[test]
    fn role_string_roundtrip() {
        for role in [
            ActorRole::Farmer,
            ActorRole::Fisherman,
            ActorRole::Processor,
            ActorRole::Trader,
            ActorRole::Retailer,
            ActorRole::Admin,
        ] {
            assert_eq!(ActorRole::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn role_parse_rejects_unknown() {
        assert!(ActorRole::parse("superadmin").is_err());
        assert!(ActorRole::parse("Farmer").is_err());
        assert!(ActorRole::parse("").is_err());
    }

    #[test]
    fn admin_permitted_for_every_stage() {
        for stage in ALL_STAGES {
            assert!(can_actor_update_stage(ActorRole::Admin, stage));
        }
    }

    #[test]
    fn farmer_covers_the_farmed_head_only() {
        assert!(can_actor_update_stage(
            ActorRole::Farmer,
            SupplyChainStage::Hatchery
        ));
        assert!(can_actor_update_stage(
            ActorRole::Farmer,
            SupplyChainStage::GrowOut
        ));
        assert!(can_actor_update_stage(
            ActorRole::Farmer,
            SupplyChainStage::Harvest
        ));
        assert!(!can_actor_update_stage(
            ActorRole::Farmer,
            SupplyChainStage::Fishing
        ));
        assert!(!can_actor_update_stage(
            ActorRole::Farmer,
            SupplyChainStage::Processing
        ));
    }

    #[test]
    fn single_role_stages() {
        assert!(can_actor_update_stage(
            ActorRole::Fisherman,
            SupplyChainStage::Fishing
        ));
        assert!(can_actor_update_stage(
            ActorRole::Processor,
            SupplyChainStage::Processing
        ));
        assert!(can_actor_update_stage(
            ActorRole::Trader,
            SupplyChainStage::Distribution
        ));
        assert!(can_actor_update_stage(
            ActorRole::Retailer,
            SupplyChainStage::Retail
        ));
    }

    #[test]
    fn wrong_role_rejected_for_every_stage() {
        // A retailer may only move product into RETAIL.
        for stage in ALL_STAGES {
            let expected = stage == SupplyChainStage::Retail;
            assert_eq!(
                can_actor_update_stage(ActorRole::Retailer, stage),
                expected,
                "retailer permission wrong for {stage}"
            );
        }
    }

    #[test]
    fn allowed_roles_never_lists_admin() {
        for stage in ALL_STAGES {
            assert!(!allowed_roles(stage).contains(&ActorRole::Admin));
        }
    }

    #[test]
    fn role_serialization_snake_case() {
        assert_eq!(
            serde_json::to_string(&ActorRole::Fisherman).unwrap(),
            "\"fisherman\""
        );
        let parsed: ActorRole = serde_json::from_str("\"trader\"").unwrap();
        assert_eq!(parsed, ActorRole::Trader);
    }
}
