//! # Stage Transition Validator
//!
//! Pure decision logic for stage transitions. Three independent checks
//! compose the full decision, evaluated strictly in order:
//!
//! 1. authorization — is the actor's role permitted to move a product
//!    into the target stage? Checked first; a failure here reveals no
//!    progression or data-presence detail.
//! 2. progression — within one progression, transitions are strictly
//!    forward; crossing between the farmed and wild-capture tracks is
//!    rejected.
//! 3. data presence — the target stage's payload must be supplied.
//!
//! The progression check does independent index lookups of both stages
//! in the farmed list and in the wild list. Because the shared
//! `PROCESSING → DISTRIBUTION → RETAIL` tail is duplicated in both
//! lists, a product in the tail always resolves both stages inside a
//! single list and advances without any cross-workflow interference;
//! only a pair that resolves in *different* lists (e.g. FISHING →
//! HARVEST) is a cross-workflow rejection.
//!
//! The validator performs no I/O and never mutates anything; callers are
//! responsible for persisting an accepted transition atomically.

use thiserror::Error;

use crate::payload::StagePayloads;
use crate::permissions::{can_actor_update_stage, ActorRole};
use crate::stage::SupplyChainStage;

/// Rejection of a stage transition request.
///
/// All variants are client errors: deterministic, never transient, never
/// retryable without changing the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The actor's role is not permitted to move a product into the
    /// target stage.
    #[error("role '{role}' is not permitted to move a product into {target}")]
    NotAuthorized {
        /// The caller's role.
        role: ActorRole,
        /// The attempted target stage.
        target: SupplyChainStage,
    },

    /// The target stage is at or before the current stage within its
    /// progression.
    #[error("backward transition from {from} to {to}")]
    BackwardTransition {
        /// The product's current stage.
        from: SupplyChainStage,
        /// The attempted target stage.
        to: SupplyChainStage,
    },

    /// The current and target stages belong to different workflows
    /// (farmed vs. wild-capture).
    #[error("invalid cross-workflow transition from {from} to {to}")]
    CrossWorkflowTransition {
        /// The product's current stage.
        from: SupplyChainStage,
        /// The attempted target stage.
        to: SupplyChainStage,
    },

    /// The payload required for the target stage is absent or empty.
    #[error("missing stage data for {stage}: field '{field}' is required")]
    MissingStageData {
        /// The attempted target stage.
        stage: SupplyChainStage,
        /// The name of the required payload field.
        field: &'static str,
    },
}

impl TransitionError {
    /// Machine-readable reason code for API responses.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::BackwardTransition { .. } => "BACKWARD_TRANSITION",
            Self::CrossWorkflowTransition { .. } => "CROSS_WORKFLOW_TRANSITION",
            Self::MissingStageData { .. } => "MISSING_STAGE_DATA",
        }
    }
}

/// Check the progression rule for a `current → target` transition.
///
/// Locates both stages in the farmed progression and in the wild-capture
/// progression independently. If both resolve in the same list the move
/// must be strictly forward (`target_idx > current_idx` — equal index,
/// i.e. a self-transition, is rejected as backward). If they resolve
/// only in different lists the move crosses workflows and is rejected.
pub fn validate_progression(
    current: SupplyChainStage,
    target: SupplyChainStage,
) -> Result<(), TransitionError> {
    let current_farmed = current.farmed_index();
    let target_farmed = target.farmed_index();
    let current_wild = current.wild_index();
    let target_wild = target.wild_index();

    if let (Some(from), Some(to)) = (current_farmed, target_farmed) {
        return if to > from {
            Ok(())
        } else {
            Err(TransitionError::BackwardTransition {
                from: current,
                to: target,
            })
        };
    }

    if let (Some(from), Some(to)) = (current_wild, target_wild) {
        return if to > from {
            Ok(())
        } else {
            Err(TransitionError::BackwardTransition {
                from: current,
                to: target,
            })
        };
    }

    // The stages resolved in different lists only.
    Err(TransitionError::CrossWorkflowTransition {
        from: current,
        to: target,
    })
}

/// Check that the payload required for the target stage is present.
pub fn validate_stage_data(
    target: SupplyChainStage,
    payloads: &StagePayloads,
) -> Result<(), TransitionError> {
    if payloads.has_data_for(target) {
        Ok(())
    } else {
        Err(TransitionError::MissingStageData {
            stage: target,
            field: target.data_field(),
        })
    }
}

/// The composed transition contract: authorization, then progression,
/// then data presence. Returns on the first failing check.
pub fn validate_transition(
    role: ActorRole,
    current: SupplyChainStage,
    target: SupplyChainStage,
    payloads: &StagePayloads,
) -> Result<(), TransitionError> {
    if !can_actor_update_stage(role, target) {
        return Err(TransitionError::NotAuthorized { role, target });
    }
    validate_progression(current, target)?;
    validate_stage_data(target, payloads)?;
    Ok(())
}

/// Check that an actor may register a product at its initial stage.
///
/// Creation follows the same authorization and data-presence rules as a
/// transition, minus the progression check (there is no prior stage).
pub fn validate_initial_stage(
    role: ActorRole,
    initial: SupplyChainStage,
    payloads: &StagePayloads,
) -> Result<(), TransitionError> {
    if !can_actor_update_stage(role, initial) {
        return Err(TransitionError::NotAuthorized {
            role,
            target: initial,
        });
    }
    validate_stage_data(initial, payloads)?;
    Ok(())
}
