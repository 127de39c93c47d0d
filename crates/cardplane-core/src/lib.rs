//! Reconciliation core for cardplane.
//!
//! This crate ties the schema and the deck store into the four-phase
//! lifecycle contract (Observe / Create / Update / Delete). A `CardConnector`
//! resolves a resource's provider config and credentials into a `CardClient`
//! bound to a named deck, the `Reconciler` runs one pass of the contract for
//! a single resource, and the `Controller` is the composition root that
//! builds all of it from a manifest.

pub mod concurrency;
pub mod condition;
pub mod connector;
pub mod controller;
pub mod external;
pub mod lifecycle;
pub mod provider;
pub mod reconciler;
pub mod resource;

pub use concurrency::{install_signal_handler, shutdown_requested};
pub use condition::{Condition, ConditionKind, ConditionStatus, Reason};
pub use connector::{CardConnector, Connecter};
pub use controller::{published_face, Controller, PassReport, ResourceReport};
pub use external::{
    CardClient, ConnectionDetails, ExternalClient, ExternalCreation, ExternalObservation,
    ExternalUpdate, CONNECTION_FACE_KEY,
};
pub use lifecycle::{validate_transition, AllocationState};
pub use provider::{
    CommonCredentialExtractor, CredentialExtractor, InMemoryProviderConfigs,
    InMemoryUsageTracker, ProviderConfig, ProviderConfigSource, SecretStore, UsageTracker,
};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use resource::{CardResource, CardStatus, ManagedResource};

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of the external collaborators a connector consults.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider config '{0}' not found")]
    ConfigNotFound(String),
    #[error("secret '{0}' not found")]
    SecretNotFound(String),
    #[error("key '{key}' not found in secret '{name}'")]
    SecretKeyNotFound { name: String, key: String },
    #[error("environment variable '{0}' is not set")]
    EnvNotSet(String),
    #[error("cannot read credentials file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("usage tracker lock poisoned: {0}")]
    LockPoisoned(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("managed resource is not a {expected} custom resource (kind '{found}')")]
    TypeMismatch { expected: String, found: String },
    #[error("cannot track ProviderConfig usage: {0}")]
    UsageTrackingFailed(#[source] ProviderError),
    #[error("cannot get ProviderConfig: {0}")]
    ConfigResolutionFailed(#[source] ProviderError),
    #[error("cannot get credentials: {0}")]
    CredentialExtractionFailed(#[source] ProviderError),
    #[error("cannot create new client: {0}")]
    ClientConstructionFailed(#[source] BoxError),
    #[error("cannot observe card: {0}")]
    ObserveFailed(#[source] cardplane_store::StoreError),
    #[error("cannot deal card: {0}")]
    DealFailed(#[source] cardplane_store::StoreError),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("managed resource not found: {0}")]
    ResourceNotFound(String),
    #[error("store error: {0}")]
    Store(#[from] cardplane_store::StoreError),
    #[error("schema error: {0}")]
    Schema(#[from] cardplane_schema::SchemaError),
    #[error("manifest error: {0}")]
    Manifest(#[from] cardplane_schema::ManifestError),
}
