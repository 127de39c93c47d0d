use crate::credentials::CredentialsSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Kind assumed for a `[[card]]` entry that does not name one.
pub const DEFAULT_RESOURCE_KIND: &str = "Card";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported manifest_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),
    #[error("provider config '{0}' is declared more than once")]
    DuplicateProviderConfig(String),
    #[error("card '{0}' is declared more than once")]
    DuplicateCard(String),
    #[error("card '{card}' references unknown provider config '{provider_config}'")]
    UnknownProviderConfig {
        card: String,
        provider_config: String,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManifestV1 {
    pub manifest_version: u32,
    /// Secret name → key → value.
    #[serde(default)]
    pub secrets: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, rename = "provider_config")]
    pub provider_configs: Vec<ProviderConfigSection>,
    #[serde(default, rename = "card")]
    pub cards: Vec<CardSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfigSection {
    pub name: String,
    #[serde(default)]
    pub credentials: CredentialsSource,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CardSection {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub provider_config: String,
}

fn default_kind() -> String {
    DEFAULT_RESOURCE_KIND.to_owned()
}

impl ManifestV1 {
    /// Check cross-references and uniqueness. Kinds are checked by the caller.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.manifest_version != 1 {
            return Err(ManifestError::UnsupportedVersion(self.manifest_version));
        }

        let mut configs = BTreeSet::new();
        for pc in &self.provider_configs {
            let name = pc.name.as_str();
            if name.trim().is_empty() {
                return Err(ManifestError::EmptyName("provider config"));
            }
            if !configs.insert(name) {
                return Err(ManifestError::DuplicateProviderConfig(name.to_owned()));
            }
        }

        let mut cards = BTreeSet::new();
        for card in &self.cards {
            let name = card.name.as_str();
            if name.trim().is_empty() {
                return Err(ManifestError::EmptyName("card"));
            }
            if !cards.insert(name) {
                return Err(ManifestError::DuplicateCard(name.to_owned()));
            }
            if !configs.contains(card.provider_config.as_str()) {
                return Err(ManifestError::UnknownProviderConfig {
                    card: name.to_owned(),
                    provider_config: card.provider_config.clone(),
                });
            }
        }

        Ok(())
    }
}

pub fn parse_manifest_str(input: &str) -> Result<ManifestV1, ManifestError> {
    let manifest: ManifestV1 = toml::from_str(input)?;
    manifest.validate()?;
    Ok(manifest)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ManifestV1, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}
