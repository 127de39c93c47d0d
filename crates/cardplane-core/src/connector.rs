use crate::external::{CardClient, ExternalClient};
use crate::provider::{CredentialExtractor, ProviderConfigSource, UsageTracker};
use crate::resource::ManagedResource;
use crate::CoreError;
use cardplane_schema::{CardCredentials, DeckName};
use cardplane_store::DeckRegistry;
use std::sync::Arc;
use tracing::debug;

/// Produces an [`ExternalClient`] for a managed resource.
pub trait Connecter<R: ManagedResource> {
    type Client: ExternalClient<R>;

    fn connect(&self, resource: &R) -> Result<Self::Client, CoreError>;
}

/// Connects card resources to the deck named after their provider config.
///
/// Connecting is what guarantees a shuffled deck exists: the deck is created
/// (or reshuffled, when empty) with the seed from the provider config's
/// credentials before the client is handed out.
#[derive(Clone)]
pub struct CardConnector {
    registry: Arc<DeckRegistry>,
    configs: Arc<dyn ProviderConfigSource>,
    credentials: Arc<dyn CredentialExtractor>,
    usage: Arc<dyn UsageTracker>,
}

impl CardConnector {
    pub fn new(
        registry: Arc<DeckRegistry>,
        configs: Arc<dyn ProviderConfigSource>,
        credentials: Arc<dyn CredentialExtractor>,
        usage: Arc<dyn UsageTracker>,
    ) -> Self {
        Self {
            registry,
            configs,
            credentials,
            usage,
        }
    }
}

impl<R: ManagedResource> Connecter<R> for CardConnector {
    type Client = CardClient;

    fn connect(&self, resource: &R) -> Result<CardClient, CoreError> {
        let pc_name = resource.provider_config_name();

        self.usage
            .track(resource.name(), pc_name)
            .map_err(CoreError::UsageTrackingFailed)?;

        let pc = self
            .configs
            .get(pc_name)
            .map_err(CoreError::ConfigResolutionFailed)?;

        let data = self
            .credentials
            .extract(&pc.credentials)
            .map_err(CoreError::CredentialExtractionFailed)?;

        // Credentials are only decoded when the deck needs a shuffle.
        let status = self
            .registry
            .get_or_create_with(&pc.name, || {
                CardCredentials::from_bytes(&data)
                    .map(|creds| creds.seed)
                    .map_err(|e| CoreError::ClientConstructionFailed(Box::new(e)))
            })
            .map_err(|e| match e {
                CoreError::Store(e) => CoreError::ClientConstructionFailed(Box::new(e)),
                other => other,
            })?;
        debug!(
            "connected {} to deck '{}' ({} cards left)",
            resource.name(),
            status.name,
            status.remaining
        );

        Ok(CardClient::new(
            Arc::clone(&self.registry),
            DeckName::new(pc.name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        CommonCredentialExtractor, InMemoryProviderConfigs, InMemoryUsageTracker, ProviderConfig,
        SecretStore,
    };
    use crate::resource::CardResource;
    use crate::ProviderError;
    use cardplane_schema::{Card, CredentialsSource, Rank, ResourceName, Suit};

    struct FailingTracker;

    impl UsageTracker for FailingTracker {
        fn track(&self, _: &ResourceName, _: &str) -> Result<(), ProviderError> {
            Err(ProviderError::LockPoisoned("test".to_owned()))
        }
    }

    fn secret_source() -> CredentialsSource {
        CredentialsSource::Secret {
            name: "creds".to_owned(),
            key: "credentials".to_owned(),
        }
    }

    fn connector_with(
        secret_value: Option<&str>,
        credentials: CredentialsSource,
    ) -> (Arc<DeckRegistry>, Arc<InMemoryUsageTracker>, CardConnector) {
        let registry = Arc::new(DeckRegistry::new());
        let mut configs = InMemoryProviderConfigs::new();
        configs.insert(ProviderConfig {
            name: "d1".to_owned(),
            credentials,
        });
        let mut secrets = SecretStore::new();
        if let Some(value) = secret_value {
            secrets.insert("creds", "credentials", value);
        }
        let usage = Arc::new(InMemoryUsageTracker::new());
        let connector = CardConnector::new(
            Arc::clone(&registry),
            Arc::new(configs),
            Arc::new(CommonCredentialExtractor::new(secrets)),
            Arc::clone(&usage) as Arc<dyn UsageTracker>,
        );
        (registry, usage, connector)
    }

    #[test]
    fn connect_shuffles_the_deck_and_binds_client() {
        let (registry, usage, connector) = connector_with(Some(r#"{"seed": 42}"#), secret_source());
        let r = CardResource::new("c", "d1");
        let client = connector.connect(&r).unwrap();
        assert_eq!(client.deck(), &DeckName::new("d1"));
        assert_eq!(
            registry.cards("d1").unwrap().unwrap(),
            cardplane_store::materialize(42)
        );
        assert_eq!(usage.users_of("d1").unwrap(), vec![ResourceName::new("c")]);
    }

    #[test]
    fn connect_is_idempotent_on_a_non_empty_deck() {
        let (registry, _usage, connector) =
            connector_with(Some(r#"{"seed": 42}"#), secret_source());
        let r = CardResource::new("c", "d1");
        connector.connect(&r).unwrap();
        registry.deal("d1").unwrap();
        connector.connect(&r).unwrap();
        let status = registry.get("d1").unwrap().unwrap();
        assert_eq!(status.remaining, 51);
        assert_eq!(status.generation, 1);
    }

    #[test]
    fn unknown_provider_config_is_config_resolution_failure() {
        let (registry, _usage, connector) =
            connector_with(Some(r#"{"seed": 42}"#), secret_source());
        let r = CardResource::new("c", "other");
        let err = connector.connect(&r).unwrap_err();
        assert!(matches!(err, CoreError::ConfigResolutionFailed(_)));
        assert!(err.to_string().starts_with("cannot get ProviderConfig"));
        assert!(registry.names().unwrap().is_empty());
    }

    #[test]
    fn missing_secret_is_credential_extraction_failure() {
        let (_registry, _usage, connector) = connector_with(None, secret_source());
        let err = connector.connect(&CardResource::new("c", "d1")).unwrap_err();
        assert!(matches!(err, CoreError::CredentialExtractionFailed(_)));
    }

    #[test]
    fn bad_credentials_are_client_construction_failure() {
        let (registry, _usage, connector) = connector_with(Some("not json"), secret_source());
        let err = connector.connect(&CardResource::new("c", "d1")).unwrap_err();
        assert!(matches!(err, CoreError::ClientConstructionFailed(_)));
        assert_eq!(registry.remaining("d1").unwrap(), 0);
    }

    #[test]
    fn bad_credentials_are_ignored_while_the_deck_has_cards() {
        let (registry, _usage, connector) = connector_with(Some("not json"), secret_source());
        registry.get_or_create("d1", 42).unwrap();
        registry.deal("d1").unwrap();

        let client = connector.connect(&CardResource::new("c", "d1")).unwrap();
        assert_eq!(client.deck(), &DeckName::new("d1"));
        let status = registry.get("d1").unwrap().unwrap();
        assert_eq!(status.remaining, 51);
        assert_eq!(status.generation, 1);
    }

    #[test]
    fn bad_credentials_fail_once_the_deck_is_empty() {
        let (registry, _usage, connector) = connector_with(Some("not json"), secret_source());
        registry.get_or_create("d1", 42).unwrap();
        while registry.deal("d1").is_ok() {}

        let err = connector.connect(&CardResource::new("c", "d1")).unwrap_err();
        assert!(matches!(err, CoreError::ClientConstructionFailed(_)));
        assert_eq!(registry.remaining("d1").unwrap(), 0);
    }

    #[test]
    fn no_credentials_connect_to_a_deck_created_by_discard() {
        let (registry, _usage, connector) = connector_with(None, CredentialsSource::None);
        registry
            .discard("d1", Card::new(Suit::Spades, Rank::Ace))
            .unwrap();
        connector.connect(&CardResource::new("c", "d1")).unwrap();
        assert_eq!(registry.remaining("d1").unwrap(), 1);
    }

    #[test]
    fn no_credentials_is_client_construction_failure() {
        let (_registry, _usage, connector) = connector_with(None, CredentialsSource::None);
        let err = connector.connect(&CardResource::new("c", "d1")).unwrap_err();
        assert!(matches!(err, CoreError::ClientConstructionFailed(_)));
    }

    #[test]
    fn usage_tracking_failure_stops_connect() {
        let registry = Arc::new(DeckRegistry::new());
        let connector = CardConnector::new(
            Arc::clone(&registry),
            Arc::new(InMemoryProviderConfigs::new()),
            Arc::new(CommonCredentialExtractor::default()),
            Arc::new(FailingTracker),
        );
        let err = connector.connect(&CardResource::new("c", "d1")).unwrap_err();
        assert!(matches!(err, CoreError::UsageTrackingFailed(_)));
    }
}
