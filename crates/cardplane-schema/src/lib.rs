//! Schema layer for cardplane.
//!
//! Defines the fixed 52-card universe (`Suit`, `Rank`, `Card`), the observed
//! status record a managed card resource carries (`CardObservation`), the
//! credentials wire format used to seed a deck (`CardCredentials`), the
//! credentials source a provider config points at (`CredentialsSource`), and
//! the TOML manifest (`ManifestV1`) the CLI reconciles.

pub mod card;
pub mod credentials;
pub mod manifest;
pub mod types;

pub use card::{Card, CardObservation, Rank, Suit, DECK_SIZE};
pub use credentials::{CardCredentials, CredentialsSource};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, CardSection, ManifestError, ManifestV1,
    ProviderConfigSection, DEFAULT_RESOURCE_KIND,
};
pub use types::{DeckName, ResourceName};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown suit: '{0}'")]
    UnknownSuit(String),
    #[error("unknown rank: '{0}'")]
    UnknownRank(String),
    #[error("face '{face}' does not match suit and rank (expected '{expected}')")]
    FaceMismatch { face: String, expected: String },
    #[error("cannot decode credentials: {0}")]
    Credentials(#[from] serde_json::Error),
}
