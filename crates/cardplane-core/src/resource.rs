use crate::condition::{set_condition, Condition, ConditionKind};
use cardplane_schema::{CardObservation, ResourceName};
use serde::{Deserialize, Serialize};

/// Capabilities the lifecycle contract needs from a managed resource.
///
/// The concrete resource type is chosen once, where the controller is
/// assembled; the contract never inspects the type at runtime.
pub trait ManagedResource {
    fn name(&self) -> &ResourceName;

    /// Name of the provider config this resource draws from. Also the deck name.
    fn provider_config_name(&self) -> &str;

    fn observation(&self) -> &CardObservation;

    fn set_observation(&mut self, observation: CardObservation);

    fn conditions(&self) -> &[Condition];

    fn set_condition(&mut self, condition: Condition);

    fn deletion_requested(&self) -> bool;

    fn condition(&self, kind: ConditionKind) -> Option<&Condition> {
        self.conditions().iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub at_provider: CardObservation,
}

/// A desired dealt card. Carries no parameters beyond its provider config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardResource {
    pub name: ResourceName,
    pub provider_config_ref: String,
    #[serde(default)]
    pub deletion_requested: bool,
    #[serde(default)]
    pub status: CardStatus,
}

impl CardResource {
    pub fn new(name: impl Into<ResourceName>, provider_config_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_config_ref: provider_config_ref.into(),
            deletion_requested: false,
            status: CardStatus::default(),
        }
    }

    pub fn request_deletion(&mut self) {
        self.deletion_requested = true;
    }
}

impl ManagedResource for CardResource {
    fn name(&self) -> &ResourceName {
        &self.name
    }

    fn provider_config_name(&self) -> &str {
        &self.provider_config_ref
    }

    fn observation(&self) -> &CardObservation {
        &self.status.at_provider
    }

    fn set_observation(&mut self, observation: CardObservation) {
        self.status.at_provider = observation;
    }

    fn conditions(&self) -> &[Condition] {
        &self.status.conditions
    }

    fn set_condition(&mut self, condition: Condition) {
        set_condition(&mut self.status.conditions, condition);
    }

    fn deletion_requested(&self) -> bool {
        self.deletion_requested
    }
}
