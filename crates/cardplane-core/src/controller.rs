use crate::condition::ConditionKind;
use crate::connector::CardConnector;
use crate::external::{ConnectionDetails, CONNECTION_FACE_KEY};
use crate::provider::{
    CommonCredentialExtractor, CredentialExtractor, InMemoryProviderConfigs, InMemoryUsageTracker,
    ProviderConfigSource, SecretStore, UsageTracker,
};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::resource::{CardResource, ManagedResource};
use crate::CoreError;
use cardplane_schema::{parse_manifest_file, ManifestV1, ResourceName, DEFAULT_RESOURCE_KIND};
use cardplane_store::DeckRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of reconciling one resource during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub name: ResourceName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    /// Face held after the pass, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub resources: Vec<ResourceReport>,
}

impl PassReport {
    pub fn failed(&self) -> usize {
        self.resources.iter().filter(|r| !r.is_ok()).count()
    }

    pub fn count(&self, outcome: &str) -> usize {
        self.resources
            .iter()
            .filter(|r| r.outcome == Some(outcome))
            .count()
    }
}

/// Owns the card resources declared in a manifest and the decks they draw
/// from, and drives them through reconciliation passes.
pub struct Controller {
    registry: Arc<DeckRegistry>,
    configs: Arc<dyn ProviderConfigSource>,
    credentials: Arc<dyn CredentialExtractor>,
    usage: Arc<InMemoryUsageTracker>,
    reconciler: Reconciler<CardConnector>,
    resources: Vec<CardResource>,
    connection_details: BTreeMap<ResourceName, ConnectionDetails>,
}

impl Controller {
    /// Assemble a controller from a parsed manifest.
    ///
    /// Every `[[card]]` entry must be of kind `Card`; any other kind is
    /// rejected here before a single deck is touched.
    pub fn from_manifest(manifest: &ManifestV1) -> Result<Self, CoreError> {
        manifest.validate()?;
        for card in &manifest.cards {
            if card.kind != DEFAULT_RESOURCE_KIND {
                return Err(CoreError::TypeMismatch {
                    expected: DEFAULT_RESOURCE_KIND.to_owned(),
                    found: card.kind.clone(),
                });
            }
        }

        let configs: Arc<dyn ProviderConfigSource> =
            Arc::new(InMemoryProviderConfigs::from_manifest(manifest));
        let credentials: Arc<dyn CredentialExtractor> = Arc::new(CommonCredentialExtractor::new(
            SecretStore::from_manifest(manifest),
        ));
        let usage = Arc::new(InMemoryUsageTracker::new());
        let registry = Arc::new(DeckRegistry::new());
        let reconciler = Self::build_reconciler(&registry, &configs, &credentials, &usage);

        let resources = manifest
            .cards
            .iter()
            .map(|card| CardResource::new(card.name.as_str(), card.provider_config.as_str()))
            .collect::<Vec<_>>();
        debug!(
            "controller assembled: {} provider configs, {} cards",
            manifest.provider_configs.len(),
            resources.len()
        );

        Ok(Self {
            registry,
            configs,
            credentials,
            usage,
            reconciler,
            resources,
            connection_details: BTreeMap::new(),
        })
    }

    pub fn from_manifest_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let manifest = parse_manifest_file(path)?;
        Self::from_manifest(&manifest)
    }

    fn build_reconciler(
        registry: &Arc<DeckRegistry>,
        configs: &Arc<dyn ProviderConfigSource>,
        credentials: &Arc<dyn CredentialExtractor>,
        usage: &Arc<InMemoryUsageTracker>,
    ) -> Reconciler<CardConnector> {
        Reconciler::new(CardConnector::new(
            Arc::clone(registry),
            Arc::clone(configs),
            Arc::clone(credentials),
            Arc::clone(usage) as Arc<dyn UsageTracker>,
        ))
    }

    pub fn registry(&self) -> &Arc<DeckRegistry> {
        &self.registry
    }

    pub fn usage(&self) -> &InMemoryUsageTracker {
        &self.usage
    }

    pub fn resources(&self) -> &[CardResource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&CardResource> {
        self.resources.iter().find(|r| r.name == *name)
    }

    /// Details published when the resource's card was dealt.
    pub fn connection_details(&self, name: &str) -> Option<&ConnectionDetails> {
        self.connection_details.get(name)
    }

    pub fn request_deletion(&mut self, name: &str) -> Result<(), CoreError> {
        let resource = self
            .resources
            .iter_mut()
            .find(|r| r.name == *name)
            .ok_or_else(|| CoreError::ResourceNotFound(name.to_owned()))?;
        resource.request_deletion();
        info!("deletion requested for {name}");
        Ok(())
    }

    /// Request deletion of several resources at once.
    ///
    /// Every name is checked first; an unknown name fails the whole request
    /// and no resource is marked.
    pub fn request_deletions<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), CoreError> {
        if let Some(unknown) = names
            .iter()
            .map(|name| name.as_ref())
            .find(|name| self.resource(name).is_none())
        {
            return Err(CoreError::ResourceNotFound(unknown.to_owned()));
        }
        for name in names {
            self.request_deletion(name.as_ref())?;
        }
        Ok(())
    }

    /// Drop every deck, as a process restart would, keeping resource status.
    ///
    /// The next pass reshuffles each deck from its seed, so faces held by
    /// resources are also back in the undealt pool until observe repairs it.
    pub fn reset_decks(&mut self) {
        self.registry = Arc::new(DeckRegistry::new());
        self.reconciler = Self::build_reconciler(
            &self.registry,
            &self.configs,
            &self.credentials,
            &self.usage,
        );
        warn!("deck registry reset; all decks will be reshuffled");
    }

    /// Reconcile every resource once, in manifest order.
    ///
    /// Resources whose deletion completes are dropped from the controller.
    /// A failure on one resource does not stop the pass.
    pub fn run_pass(&mut self) -> PassReport {
        let mut report = PassReport::default();
        let mut deleted = Vec::new();

        for resource in &mut self.resources {
            let name = resource.name.clone();
            match self.reconciler.reconcile(resource) {
                Ok(outcome) => {
                    let label = outcome.label();
                    match outcome {
                        ReconcileOutcome::Created { connection_details }
                        | ReconcileOutcome::Updated { connection_details }
                            if !connection_details.is_empty() =>
                        {
                            self.connection_details
                                .insert(name.clone(), connection_details);
                        }
                        ReconcileOutcome::Deleted => {
                            self.connection_details.remove(&name);
                            deleted.push(name.clone());
                        }
                        _ => {}
                    }
                    report.resources.push(ResourceReport {
                        name,
                        outcome: Some(label),
                        face: face_of(resource),
                        error: None,
                    });
                }
                Err(e) => report.resources.push(ResourceReport {
                    name,
                    outcome: None,
                    face: face_of(resource),
                    error: Some(e.to_string()),
                }),
            }
        }

        if !deleted.is_empty() {
            self.resources.retain(|r| !deleted.contains(&r.name));
            for name in &deleted {
                if let Err(e) = self.usage.release(name) {
                    warn!("cannot release usage of {name}: {e}");
                }
            }
        }

        info!(
            "pass complete: {} resources, {} created, {} deleted, {} failed",
            report.resources.len(),
            report.count("created"),
            report.count("deleted"),
            report.failed()
        );
        report
    }

    /// True when every resource is Ready and Synced and none awaits deletion.
    pub fn converged(&self) -> bool {
        self.resources.iter().all(|r| {
            !r.deletion_requested()
                && r.condition(ConditionKind::Ready)
                    .is_some_and(crate::Condition::is_true)
                && r.condition(ConditionKind::Synced)
                    .is_some_and(crate::Condition::is_true)
        })
    }
}

fn face_of(resource: &CardResource) -> Option<String> {
    let observation = resource.observation();
    observation.is_dealt().then(|| observation.face.clone())
}

/// Face recorded in a set of connection details.
pub fn published_face(details: &ConnectionDetails) -> Option<&str> {
    details
        .get(CONNECTION_FACE_KEY)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardplane_schema::parse_manifest_str;
    use cardplane_store::materialize;

    const MANIFEST: &str = r#"
manifest_version = 1

[secrets.creds]
credentials = '{"seed": 42}'

[[provider_config]]
name = "d1"
[provider_config.credentials]
source = "secret"
name = "creds"
key = "credentials"

[[card]]
name = "alice"
provider_config = "d1"

[[card]]
name = "bob"
provider_config = "d1"
"#;

    fn controller() -> Controller {
        Controller::from_manifest(&parse_manifest_str(MANIFEST).unwrap()).unwrap()
    }

    #[test]
    fn first_pass_deals_in_manifest_order() {
        let mut c = controller();
        let report = c.run_pass();
        assert_eq!(report.count("created"), 2);
        assert_eq!(report.failed(), 0);

        let order = materialize(42);
        assert_eq!(report.resources[0].face, Some(order[0].face()));
        assert_eq!(report.resources[1].face, Some(order[1].face()));
        assert_eq!(c.registry().remaining("d1").unwrap(), 50);
        assert_eq!(
            published_face(c.connection_details("alice").unwrap()),
            Some(order[0].face().as_str())
        );
        assert!(!c.converged());
    }

    #[test]
    fn second_pass_converges() {
        let mut c = controller();
        c.run_pass();
        let report = c.run_pass();
        assert_eq!(report.count("up-to-date"), 2);
        assert!(c.converged());
        assert_eq!(c.registry().remaining("d1").unwrap(), 50);
    }

    #[test]
    fn deletion_returns_card_and_drops_resource() {
        let mut c = controller();
        c.run_pass();
        let face = c.resource("alice").unwrap().observation().face.clone();
        c.request_deletion("alice").unwrap();

        let report = c.run_pass();
        assert_eq!(report.count("deleted"), 1);
        assert!(c.resource("alice").is_none());
        assert!(c.connection_details("alice").is_none());
        assert_eq!(c.resources().len(), 1);
        assert_eq!(c.registry().remaining("d1").unwrap(), 51);
        let last = c.registry().cards("d1").unwrap().unwrap().pop().unwrap();
        assert_eq!(last.face(), face);
        assert_eq!(c.usage().users_of("d1").unwrap(), vec![ResourceName::new("bob")]);
    }

    #[test]
    fn deleting_unknown_resource_fails() {
        let mut c = controller();
        assert!(matches!(
            c.request_deletion("carol"),
            Err(CoreError::ResourceNotFound(n)) if n == "carol"
        ));
    }

    #[test]
    fn batch_deletion_with_unknown_name_marks_nothing() {
        let mut c = controller();
        c.run_pass();
        assert!(matches!(
            c.request_deletions(&["alice", "carol"]),
            Err(CoreError::ResourceNotFound(n)) if n == "carol"
        ));
        assert!(c.resources().iter().all(|r| !r.deletion_requested()));

        let report = c.run_pass();
        assert_eq!(report.count("deleted"), 0);
        assert_eq!(c.resources().len(), 2);
    }

    #[test]
    fn batch_deletion_marks_every_name() {
        let mut c = controller();
        c.run_pass();
        c.request_deletions(&["alice", "bob"]).unwrap();
        let report = c.run_pass();
        assert_eq!(report.count("deleted"), 2);
        assert!(c.resources().is_empty());
        assert_eq!(c.registry().remaining("d1").unwrap(), 52);
    }

    #[test]
    fn reset_then_pass_repairs_held_faces() {
        let mut c = controller();
        c.run_pass();
        c.reset_decks();
        assert!(c.registry().names().unwrap().is_empty());

        let report = c.run_pass();
        assert_eq!(report.count("up-to-date"), 2);
        assert_eq!(c.registry().remaining("d1").unwrap(), 50);
        let held: Vec<String> = c
            .resources()
            .iter()
            .map(|r| r.observation().face.clone())
            .collect();
        let pool = c.registry().cards("d1").unwrap().unwrap();
        assert!(pool.iter().all(|card| !held.contains(&card.face())));
    }

    #[test]
    fn foreign_kind_is_a_type_mismatch() {
        let manifest = parse_manifest_str(&MANIFEST.replace(
            "name = \"bob\"",
            "name = \"bob\"\nkind = \"Chip\"",
        ))
        .unwrap();
        assert!(matches!(
            Controller::from_manifest(&manifest),
            Err(CoreError::TypeMismatch { found, .. }) if found == "Chip"
        ));
    }

    #[test]
    fn failures_are_reported_per_resource() {
        let manifest = parse_manifest_str(&MANIFEST.replace("name = \"creds\"", "name = \"nope\""))
            .unwrap();
        let mut c = Controller::from_manifest(&manifest).unwrap();
        let report = c.run_pass();
        assert_eq!(report.failed(), 2);
        assert!(report.resources[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("cannot get credentials"));
        let synced = c.resources()[0].condition(ConditionKind::Synced).unwrap();
        assert!(!synced.is_true());
        assert!(!c.converged());
    }
}
