use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionKind {
    /// Whether the external resource is usable.
    Ready,
    /// Whether the last reconciliation pass succeeded.
    Synced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    Available,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Ready => write!(f, "Ready"),
            ConditionKind::Synced => write!(f, "Synced"),
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reason::Available => "Available",
            Reason::Creating => "Creating",
            Reason::Deleting => "Deleting",
            Reason::ReconcileSuccess => "ReconcileSuccess",
            Reason::ReconcileError => "ReconcileError",
        };
        f.write_str(s)
    }
}

/// One status condition of a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub status: ConditionStatus,
    pub reason: Reason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(kind: ConditionKind, status: ConditionStatus, reason: Reason) -> Self {
        Self {
            kind,
            status,
            reason,
            message: None,
            last_transition_time: Utc::now(),
        }
    }

    pub fn available() -> Self {
        Self::new(ConditionKind::Ready, ConditionStatus::True, Reason::Available)
    }

    pub fn creating() -> Self {
        Self::new(ConditionKind::Ready, ConditionStatus::False, Reason::Creating)
    }

    pub fn deleting() -> Self {
        Self::new(ConditionKind::Ready, ConditionStatus::False, Reason::Deleting)
    }

    pub fn reconcile_success() -> Self {
        Self::new(
            ConditionKind::Synced,
            ConditionStatus::True,
            Reason::ReconcileSuccess,
        )
    }

    pub fn reconcile_error(message: impl Into<String>) -> Self {
        let mut c = Self::new(
            ConditionKind::Synced,
            ConditionStatus::False,
            Reason::ReconcileError,
        );
        c.message = Some(message.into());
        c
    }

    /// Same kind, status, reason and message; the timestamp is ignored.
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.kind == other.kind
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Insert or replace the condition of the same kind.
///
/// An equivalent condition keeps its original transition time.
pub(crate) fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) {
    match conditions.iter_mut().find(|c| c.kind == condition.kind) {
        Some(existing) if existing.equivalent(&condition) => {}
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}
