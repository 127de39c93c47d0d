use crate::CoreError;
use cardplane_schema::CardObservation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allocation state of a managed card resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationState {
    /// No face recorded.
    Unallocated,
    /// A face is recorded.
    Allocated,
    /// The card went back to its deck through deletion.
    Released,
}

impl AllocationState {
    /// State implied by an observed status. Released is never inferred.
    pub fn of(observation: &CardObservation) -> Self {
        if observation.is_dealt() {
            AllocationState::Allocated
        } else {
            AllocationState::Unallocated
        }
    }
}

impl fmt::Display for AllocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationState::Unallocated => write!(f, "unallocated"),
            AllocationState::Allocated => write!(f, "allocated"),
            AllocationState::Released => write!(f, "released"),
        }
    }
}

pub fn validate_transition(from: AllocationState, to: AllocationState) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (
            AllocationState::Unallocated,
            AllocationState::Allocated | AllocationState::Released
        ) | (AllocationState::Allocated, AllocationState::Released)
            | (AllocationState::Released, AllocationState::Unallocated)
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
