use crate::condition::Condition;
use crate::lifecycle::{validate_transition, AllocationState};
use crate::resource::ManagedResource;
use crate::CoreError;
use cardplane_schema::{CardObservation, DeckName};
use cardplane_store::{DeckRegistry, Validation};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Connection details key carrying a dealt card's face.
pub const CONNECTION_FACE_KEY: &str = "Face";

/// Details a host publishes alongside a resource, e.g. as a secret.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// `false` tells the reconciler to call `create`.
    pub resource_exists: bool,
    /// `false` on an existing resource tells the reconciler to call `update`.
    pub resource_up_to_date: bool,
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// Observe, then create, update or delete the external resource so that it
/// matches the managed resource.
pub trait ExternalClient<R: ManagedResource> {
    fn observe(&self, resource: &mut R) -> Result<ExternalObservation, CoreError>;

    fn create(&self, resource: &mut R) -> Result<ExternalCreation, CoreError>;

    fn update(&self, resource: &mut R) -> Result<ExternalUpdate, CoreError>;

    fn delete(&self, resource: &mut R) -> Result<(), CoreError>;
}

/// Client bound to one named deck in a registry.
#[derive(Debug, Clone)]
pub struct CardClient {
    registry: Arc<DeckRegistry>,
    deck: DeckName,
}

impl CardClient {
    pub fn new(registry: Arc<DeckRegistry>, deck: DeckName) -> Self {
        Self { registry, deck }
    }

    pub fn deck(&self) -> &DeckName {
        &self.deck
    }
}

impl<R: ManagedResource> ExternalClient<R> for CardClient {
    fn observe(&self, resource: &mut R) -> Result<ExternalObservation, CoreError> {
        let face = resource.observation().face.clone();
        if face.is_empty() {
            debug!("{} has no card yet", resource.name());
            return Ok(ExternalObservation::default());
        }

        let validation = self
            .registry
            .validate(&self.deck, &face)
            .map_err(CoreError::ObserveFailed)?;
        if let Validation::Repaired { purged } = validation {
            info!(
                "{} holds {face}; removed {purged} stray copies from '{}'",
                resource.name(),
                self.deck
            );
        }

        resource.set_condition(Condition::available());
        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            connection_details: ConnectionDetails::new(),
        })
    }

    fn create(&self, resource: &mut R) -> Result<ExternalCreation, CoreError> {
        validate_transition(
            AllocationState::of(resource.observation()),
            AllocationState::Allocated,
        )?;

        let card = self.registry.deal(&self.deck).map_err(CoreError::DealFailed)?;
        let observation = CardObservation::from(card);
        let face = observation.face.clone();
        resource.set_observation(observation);
        info!("dealt {face} to {}", resource.name());

        let mut details = ConnectionDetails::new();
        details.insert(CONNECTION_FACE_KEY.to_owned(), face.into_bytes());
        Ok(ExternalCreation {
            connection_details: details,
        })
    }

    fn update(&self, resource: &mut R) -> Result<ExternalUpdate, CoreError> {
        debug!("update requested for {}; cards have nothing to update", resource.name());
        Ok(ExternalUpdate::default())
    }

    fn delete(&self, resource: &mut R) -> Result<(), CoreError> {
        validate_transition(
            AllocationState::of(resource.observation()),
            AllocationState::Released,
        )?;

        if let Some(card) = resource.observation().card()? {
            self.registry.discard(&self.deck, card)?;
            info!("{} returned {card} to '{}'", resource.name(), self.deck);
        }
        resource.set_observation(CardObservation::default());
        Ok(())
    }
}
