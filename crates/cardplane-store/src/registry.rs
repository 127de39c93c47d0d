use crate::deck::{Deck, DeckStatus};
use crate::StoreError;
use cardplane_schema::{Card, DeckName};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Outcome of a successful [`DeckRegistry::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// The face was not among the undealt cards.
    Confirmed,
    /// Undealt copies of the face were found and removed.
    Repaired { purged: usize },
}

/// Owner of every named deck in the process.
///
/// Each deck sits behind its own mutex, so deal, validate, discard and
/// reshuffle on one deck are serialized while different decks proceed
/// independently. The registry holds no persistent state: dropping it loses
/// every deck.
#[derive(Debug, Default)]
pub struct DeckRegistry {
    decks: RwLock<HashMap<DeckName, Arc<Mutex<Deck>>>>,
}

fn lock_deck(deck: &Mutex<Deck>) -> Result<MutexGuard<'_, Deck>, StoreError> {
    deck.lock()
        .map_err(|e| StoreError::LockPoisoned(format!("deck mutex: {e}")))
}

impl DeckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, name: &str) -> Result<Option<Arc<Mutex<Deck>>>, StoreError> {
        let decks = self
            .decks
            .read()
            .map_err(|e| StoreError::LockPoisoned(format!("registry map: {e}")))?;
        Ok(decks.get(name).cloned())
    }

    fn lookup_or_insert(&self, name: &str) -> Result<Arc<Mutex<Deck>>, StoreError> {
        if let Some(deck) = self.lookup(name)? {
            return Ok(deck);
        }
        let mut decks = self
            .decks
            .write()
            .map_err(|e| StoreError::LockPoisoned(format!("registry map: {e}")))?;
        let deck = decks
            .entry(DeckName::new(name))
            .or_insert_with(|| Arc::new(Mutex::new(Deck::empty(DeckName::new(name)))));
        Ok(Arc::clone(deck))
    }

    /// Return the deck named `name`, shuffling a full one with `seed` when the
    /// deck is absent or currently empty.
    ///
    /// Emptiness is the only trigger: a deck whose 52 cards are all dealt is
    /// reshuffled even though those cards are still held by their resources.
    pub fn get_or_create(&self, name: &str, seed: i64) -> Result<DeckStatus, StoreError> {
        self.get_or_create_with(name, || Ok::<_, StoreError>(seed))
    }

    /// Like [`get_or_create`](Self::get_or_create), but the seed is only
    /// produced when a shuffle is actually needed.
    ///
    /// `seed` runs under the deck's lock and only for an absent or empty
    /// deck; a non-empty deck is returned unchanged without calling it. An
    /// error from `seed` leaves the deck as it was.
    pub fn get_or_create_with<E>(
        &self,
        name: &str,
        seed: impl FnOnce() -> Result<i64, E>,
    ) -> Result<DeckStatus, E>
    where
        E: From<StoreError>,
    {
        let entry = self.lookup_or_insert(name)?;
        let mut deck = lock_deck(&entry)?;
        if deck.is_empty() {
            deck.refill(seed()?);
            info!(
                "shuffled deck '{name}' (generation {}, {} cards)",
                deck.generation(),
                deck.len()
            );
        }
        Ok(deck.status())
    }

    pub fn get(&self, name: &str) -> Result<Option<DeckStatus>, StoreError> {
        match self.lookup(name)? {
            Some(entry) => Ok(Some(lock_deck(&entry)?.status())),
            None => Ok(None),
        }
    }

    /// Undealt cards of a deck in dealing order.
    pub fn cards(&self, name: &str) -> Result<Option<Vec<Card>>, StoreError> {
        match self.lookup(name)? {
            Some(entry) => Ok(Some(lock_deck(&entry)?.cards().copied().collect())),
            None => Ok(None),
        }
    }

    pub fn remaining(&self, name: &str) -> Result<usize, StoreError> {
        Ok(self.get(name)?.map_or(0, |status| status.remaining))
    }

    pub fn names(&self) -> Result<Vec<DeckName>, StoreError> {
        let decks = self
            .decks
            .read()
            .map_err(|e| StoreError::LockPoisoned(format!("registry map: {e}")))?;
        let mut names: Vec<DeckName> = decks.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Remove and return the front card of the deck.
    pub fn deal(&self, name: &str) -> Result<Card, StoreError> {
        let entry = self
            .lookup(name)?
            .ok_or_else(|| StoreError::EmptyDeck(name.to_owned()))?;
        let mut deck = lock_deck(&entry)?;
        let card = deck
            .deal()
            .ok_or_else(|| StoreError::EmptyDeck(name.to_owned()))?;
        info!("dealt {card} from '{name}' ({} left)", deck.len());
        Ok(card)
    }

    /// Confirm that a card recorded as dealt is not also sitting in the deck.
    ///
    /// Undealt copies of `face` are removed. Fails when the deck is absent or
    /// holds no undealt cards, since there is nothing to check against.
    pub fn validate(&self, name: &str, face: &str) -> Result<Validation, StoreError> {
        let not_found = || StoreError::ValidationNotFound {
            deck: name.to_owned(),
            face: face.to_owned(),
        };
        let entry = self.lookup(name)?.ok_or_else(not_found)?;
        let mut deck = lock_deck(&entry)?;
        if deck.is_empty() {
            return Err(not_found());
        }
        match deck.purge(face) {
            0 => {
                debug!("validated {face} against '{name}'");
                Ok(Validation::Confirmed)
            }
            purged => {
                warn!("removed {purged} undealt copies of dealt card {face} from '{name}'");
                Ok(Validation::Repaired { purged })
            }
        }
    }

    /// Return a card to the back of the deck, creating the deck if needed.
    pub fn discard(&self, name: &str, card: Card) -> Result<(), StoreError> {
        let entry = self.lookup_or_insert(name)?;
        let mut deck = lock_deck(&entry)?;
        deck.discard(card);
        info!("discarded {card} to '{name}' ({} left)", deck.len());
        Ok(())
    }
}
