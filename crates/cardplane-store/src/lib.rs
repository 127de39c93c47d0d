//! Deck storage for cardplane.
//!
//! This crate provides the stateful pool engine: a pure, seeded `materialize`
//! that builds a shuffled 52-card deck, the `Deck` itself, and the
//! `DeckRegistry` that owns every named deck in the process and exposes the
//! pool operations (deal, validate, discard). Deck state is volatile and
//! lives only as long as the registry value.

pub mod deck;
pub mod registry;
pub mod shuffle;

pub use deck::{Deck, DeckStatus};
pub use registry::{DeckRegistry, Validation};
pub use shuffle::{materialize, shuffle_ascending};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("deck '{0}' has no cards to deal")]
    EmptyDeck(String),
    #[error("cannot validate card '{face}': deck '{deck}' has no undealt cards")]
    ValidationNotFound { deck: String, face: String },
    #[error("deck registry lock poisoned: {0}")]
    LockPoisoned(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_empty_deck() {
        let e = StoreError::EmptyDeck("d1".to_owned());
        assert!(e.to_string().contains("d1"));
    }

    #[test]
    fn store_error_display_validation_not_found() {
        let e = StoreError::ValidationNotFound {
            deck: "d1".to_owned(),
            face: "♠A".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("d1"));
        assert!(msg.contains("♠A"));
    }
}
