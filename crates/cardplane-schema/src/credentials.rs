use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Decoded credentials payload: `{ "seed": <i64> }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCredentials {
    pub seed: i64,
}

impl CardCredentials {
    pub fn from_bytes(data: &[u8]) -> Result<Self, SchemaError> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Where a provider config's credentials come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CredentialsSource {
    /// No credentials; extraction yields an empty payload.
    #[default]
    None,
    /// A key inside a named secret.
    Secret { name: String, key: String },
    /// The value of an environment variable.
    Environment { var: String },
    /// The contents of a file.
    Filesystem { path: PathBuf },
}

impl CredentialsSource {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialsSource::None => "none",
            CredentialsSource::Secret { .. } => "secret",
            CredentialsSource::Environment { .. } => "environment",
            CredentialsSource::Filesystem { .. } => "filesystem",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_seed() {
        let creds = CardCredentials::from_bytes(br#"{"seed": 42}"#).unwrap();
        assert_eq!(creds.seed, 42);
    }

    #[test]
    fn decodes_negative_seed_and_ignores_extra_fields() {
        let creds = CardCredentials::from_bytes(br#"{"seed": -7, "owner": "ops"}"#).unwrap();
        assert_eq!(creds.seed, -7);
    }

    #[test]
    fn missing_seed_is_an_error() {
        let err = CardCredentials::from_bytes(b"{}").unwrap_err();
        assert!(matches!(err, SchemaError::Credentials(_)));
    }

    #[test]
    fn empty_payload_is_an_error() {
        assert!(CardCredentials::from_bytes(b"").is_err());
    }

    #[test]
    fn source_tagged_deserialization() {
        let src: CredentialsSource =
            serde_json::from_str(r#"{"source":"secret","name":"creds","key":"seed"}"#).unwrap();
        assert_eq!(
            src,
            CredentialsSource::Secret {
                name: "creds".to_owned(),
                key: "seed".to_owned()
            }
        );
        assert_eq!(src.kind(), "secret");

        let none: CredentialsSource = serde_json::from_str(r#"{"source":"none"}"#).unwrap();
        assert_eq!(none, CredentialsSource::None);
    }
}
