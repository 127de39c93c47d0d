//! Provider configs, credential extraction and usage tracking.
//!
//! These are the orchestration framework's collaborators as seen by the
//! connector. Each is a trait so a host can plug in its own; the in-memory
//! implementations here back the CLI and the tests.

use crate::ProviderError;
use cardplane_schema::{CredentialsSource, ManifestV1, ResourceName};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// A named source of deck credentials. Its name is also the deck name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub credentials: CredentialsSource,
}

pub trait ProviderConfigSource: Send + Sync {
    fn get(&self, name: &str) -> Result<ProviderConfig, ProviderError>;
}

pub trait CredentialExtractor: Send + Sync {
    fn extract(&self, source: &CredentialsSource) -> Result<Vec<u8>, ProviderError>;
}

/// Records which resources use which provider config.
pub trait UsageTracker: Send + Sync {
    fn track(&self, resource: &ResourceName, provider_config: &str) -> Result<(), ProviderError>;
}

#[derive(Debug, Default)]
pub struct InMemoryProviderConfigs {
    configs: BTreeMap<String, ProviderConfig>,
}

impl InMemoryProviderConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: ProviderConfig) {
        self.configs.insert(config.name.clone(), config);
    }

    pub fn from_manifest(manifest: &ManifestV1) -> Self {
        let mut configs = Self::new();
        for pc in &manifest.provider_configs {
            configs.insert(ProviderConfig {
                name: pc.name.clone(),
                credentials: pc.credentials.clone(),
            });
        }
        configs
    }
}

impl ProviderConfigSource for InMemoryProviderConfigs {
    fn get(&self, name: &str) -> Result<ProviderConfig, ProviderError> {
        self.configs
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::ConfigNotFound(name.to_owned()))
    }
}

/// Secret name → key → bytes.
#[derive(Debug, Clone, Default)]
pub struct SecretStore {
    secrets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, key: &str, value: impl Into<Vec<u8>>) {
        self.secrets
            .entry(name.to_owned())
            .or_default()
            .insert(key.to_owned(), value.into());
    }

    pub fn get(&self, name: &str, key: &str) -> Result<&[u8], ProviderError> {
        let secret = self
            .secrets
            .get(name)
            .ok_or_else(|| ProviderError::SecretNotFound(name.to_owned()))?;
        secret
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| ProviderError::SecretKeyNotFound {
                name: name.to_owned(),
                key: key.to_owned(),
            })
    }

    pub fn from_manifest(manifest: &ManifestV1) -> Self {
        let mut store = Self::new();
        for (name, entries) in &manifest.secrets {
            for (key, value) in entries {
                store.insert(name, key, value.as_bytes());
            }
        }
        store
    }
}

/// Reads credentials from secrets, the environment, or the filesystem.
#[derive(Debug, Clone, Default)]
pub struct CommonCredentialExtractor {
    secrets: SecretStore,
}

impl CommonCredentialExtractor {
    pub fn new(secrets: SecretStore) -> Self {
        Self { secrets }
    }
}

impl CredentialExtractor for CommonCredentialExtractor {
    fn extract(&self, source: &CredentialsSource) -> Result<Vec<u8>, ProviderError> {
        debug!("extracting credentials from {} source", source.kind());
        match source {
            CredentialsSource::None => Ok(Vec::new()),
            CredentialsSource::Secret { name, key } => Ok(self.secrets.get(name, key)?.to_vec()),
            CredentialsSource::Environment { var } => std::env::var(var)
                .map(String::into_bytes)
                .map_err(|_| ProviderError::EnvNotSet(var.clone())),
            CredentialsSource::Filesystem { path } => {
                std::fs::read(path).map_err(|e| ProviderError::File {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsageTracker {
    usage: Mutex<BTreeMap<ResourceName, String>>,
}

impl InMemoryUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources currently recorded against a provider config, sorted by name.
    pub fn users_of(&self, provider_config: &str) -> Result<Vec<ResourceName>, ProviderError> {
        let usage = self
            .usage
            .lock()
            .map_err(|e| ProviderError::LockPoisoned(e.to_string()))?;
        Ok(usage
            .iter()
            .filter(|(_, pc)| pc.as_str() == provider_config)
            .map(|(resource, _)| resource.clone())
            .collect())
    }

    pub fn release(&self, resource: &ResourceName) -> Result<(), ProviderError> {
        let mut usage = self
            .usage
            .lock()
            .map_err(|e| ProviderError::LockPoisoned(e.to_string()))?;
        usage.remove(resource);
        Ok(())
    }
}

impl UsageTracker for InMemoryUsageTracker {
    fn track(&self, resource: &ResourceName, provider_config: &str) -> Result<(), ProviderError> {
        let mut usage = self
            .usage
            .lock()
            .map_err(|e| ProviderError::LockPoisoned(e.to_string()))?;
        usage.insert(resource.clone(), provider_config.to_owned());
        Ok(())
    }
}
